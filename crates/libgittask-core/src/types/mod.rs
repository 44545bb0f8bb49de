pub mod ids;
pub mod record;
pub mod state;

pub use ids::{generate_task_id, is_well_formed_id};
pub use record::Record;
pub use state::{SyncState, TrackedRecord};
