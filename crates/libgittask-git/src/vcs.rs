use std::path::Path;

use libgittask_core::{TaskError, Vcs};

use crate::GitRepo;

impl Vcs for GitRepo {
    fn stage(&self, path: &Path) -> Result<(), TaskError> {
        GitRepo::stage(self, path).map_err(|e| TaskError::vcs("add", path.display().to_string(), e))
    }

    fn unstage(&self, path: &Path) -> Result<(), TaskError> {
        GitRepo::unstage(self, path)
            .map_err(|e| TaskError::vcs("reset", path.display().to_string(), e))
    }

    fn revert(&self, path: &Path) -> Result<(), TaskError> {
        GitRepo::revert(self, path)
            .map_err(|e| TaskError::vcs("checkout", path.display().to_string(), e))
    }

    fn status(&self, path: &Path) -> Result<Vec<String>, TaskError> {
        self.status_lines(path)
            .map_err(|e| TaskError::vcs("status", path.display().to_string(), e))
    }
}
