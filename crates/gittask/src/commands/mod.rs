pub mod init;
pub mod task;
pub mod commit;
pub mod sort;
pub mod import;
