//! Working-tree operations on task files via libgit2.

use std::path::{Path, PathBuf};

use git2::build::CheckoutBuilder;
use git2::{
    ErrorCode, Index, IndexAddOption, Repository, Signature, Status, StatusEntry, StatusOptions,
};
use libgittask_core::config;
use tracing::debug;

use crate::GitError;

const FALLBACK_SIGNATURE_NAME: &str = "gittask";
const FALLBACK_SIGNATURE_EMAIL: &str = "gittask@localhost";

/// A non-bare repository and its canonical working directory
pub struct GitRepo {
    repo: Repository,
    workdir: PathBuf,
}

impl GitRepo {
    /// Find the repository containing `path`
    pub fn discover(path: &Path) -> Result<Self, GitError> {
        let repo = Repository::discover(path).map_err(|e| match e.code() {
            ErrorCode::NotFound => GitError::NotARepo,
            _ => GitError::Git(e),
        })?;
        Self::from_repository(repo)
    }

    /// Open the repository whose working tree is exactly `path`
    pub fn open(path: &Path) -> Result<Self, GitError> {
        let repo = Repository::open(path).map_err(|e| match e.code() {
            ErrorCode::NotFound => GitError::NotARepo,
            _ => GitError::Git(e),
        })?;
        Self::from_repository(repo)
    }

    fn from_repository(repo: Repository) -> Result<Self, GitError> {
        let workdir = repo.workdir().ok_or(GitError::BareRepo)?;
        let workdir = std::fs::canonicalize(workdir)?;
        Ok(Self { repo, workdir })
    }

    pub fn workdir(&self) -> &Path {
        &self.workdir
    }

    /// `<workdir>/.tasks`
    pub fn tasks_dir(&self) -> PathBuf {
        config::tasks_dir(&self.workdir)
    }

    /// `<workdir>/.tasks/data`
    pub fn data_dir(&self) -> PathBuf {
        config::data_dir(&self.workdir)
    }

    /// Path relative to the working tree, as libgit2 expects
    pub fn relative(&self, path: &Path) -> Result<PathBuf, GitError> {
        if path.is_relative() {
            return Ok(path.to_path_buf());
        }
        if let Ok(rel) = path.strip_prefix(&self.workdir) {
            return Ok(rel.to_path_buf());
        }
        // Symlinked temp dirs and the like: compare canonical forms
        let canonical = match (path.parent(), path.file_name()) {
            (Some(parent), Some(name)) if !path.exists() => {
                std::fs::canonicalize(parent).map(|p| p.join(name))
            }
            _ => std::fs::canonicalize(path),
        }
        .map_err(|_| GitError::OutsideWorkdir(path.to_path_buf()))?;
        canonical
            .strip_prefix(&self.workdir)
            .map(Path::to_path_buf)
            .map_err(|_| GitError::OutsideWorkdir(path.to_path_buf()))
    }

    /// `git add <path>`
    pub fn stage(&self, path: &Path) -> Result<(), GitError> {
        let rel = self.relative(path)?;
        let mut index = self.repo.index()?;
        index.add_path(&rel)?;
        index.write()?;
        debug!(path = %rel.display(), "staged");
        Ok(())
    }

    /// `git reset HEAD <path>`; on an unborn branch the path just leaves the index
    pub fn unstage(&self, path: &Path) -> Result<(), GitError> {
        let rel = self.relative(path)?;
        match self.repo.head() {
            Ok(head) => {
                let commit = head.peel_to_commit()?;
                self.repo.reset_default(Some(commit.as_object()), [rel.as_path()])?;
            }
            Err(e) if is_unborn(&e) => {
                let mut index = self.repo.index()?;
                index.remove_path(&rel)?;
                index.write()?;
            }
            Err(e) => return Err(e.into()),
        }
        debug!(path = %rel.display(), "unstaged");
        Ok(())
    }

    /// `git checkout -- <path>`: restore the indexed content
    pub fn revert(&self, path: &Path) -> Result<(), GitError> {
        let rel = self.relative(path)?;
        let mut index = self.repo.index()?;
        if index.get_path(&rel, 0).is_none() {
            return Err(GitError::NotTracked(rel.display().to_string()));
        }
        let mut checkout = CheckoutBuilder::new();
        checkout.force().disable_pathspec_match(true).path(rel.as_path());
        self.repo.checkout_index(Some(&mut index), Some(&mut checkout))?;
        debug!(path = %rel.display(), "reverted");
        Ok(())
    }

    /// `git status --porcelain <path>` lines (`XY path`)
    pub fn status_lines(&self, path: &Path) -> Result<Vec<String>, GitError> {
        let rel = self.relative(path)?;
        let mut opts = StatusOptions::new();
        opts.include_untracked(true)
            .recurse_untracked_dirs(true)
            .include_ignored(false)
            .pathspec(rel.as_path());
        let statuses = self.repo.statuses(Some(&mut opts))?;
        Ok(statuses.iter().filter_map(|entry| porcelain_line(&entry)).collect())
    }

    /// `git rm --force <path>`
    pub fn remove(&self, path: &Path) -> Result<(), GitError> {
        let rel = self.relative(path)?;
        let mut index = self.repo.index()?;
        if index.get_path(&rel, 0).is_some() {
            index.remove_path(&rel)?;
            index.write()?;
        }
        let absolute = self.workdir.join(&rel);
        if absolute.exists() {
            std::fs::remove_file(&absolute)?;
        }
        debug!(path = %rel.display(), "removed");
        Ok(())
    }

    /// Stage everything under `dir` and commit only that directory.
    ///
    /// Changes staged elsewhere in the repository stay staged and are not
    /// part of the commit.
    pub fn commit_paths(&self, message: &str, dir: &Path) -> Result<git2::Oid, GitError> {
        let rel_dir = self.relative(dir)?;
        let mut index = self.repo.index()?;
        index.add_all([rel_dir.as_path()], IndexAddOption::DEFAULT, None)?;
        index.update_all([rel_dir.as_path()], None)?;
        index.write()?;

        let parent = match self.repo.head() {
            Ok(head) => Some(head.peel_to_commit()?),
            Err(e) if is_unborn(&e) => None,
            Err(e) => return Err(e.into()),
        };

        // HEAD's tree with the directory replaced by its indexed content
        let mut partial = Index::new()?;
        if let Some(parent) = &parent {
            partial.read_tree(&parent.tree()?)?;
        }
        partial.remove_dir(&rel_dir, 0)?;
        let prefix = format!("{}/", rel_dir.to_string_lossy().replace('\\', "/"));
        for entry in index.iter() {
            if entry.path.starts_with(prefix.as_bytes()) {
                partial.add(&entry)?;
            }
        }
        let tree_oid = partial.write_tree_to(&self.repo)?;

        let unchanged = match &parent {
            Some(parent) => parent.tree_id() == tree_oid,
            None => partial.is_empty(),
        };
        if unchanged {
            return Err(GitError::NothingToCommit(rel_dir.display().to_string()));
        }

        let tree = self.repo.find_tree(tree_oid)?;
        let sig = self.signature()?;
        let parents: Vec<&git2::Commit> = parent.iter().collect();
        let oid = self
            .repo
            .commit(Some("HEAD"), &sig, &sig, message, &tree, &parents)?;
        debug!(commit = %oid, dir = %rel_dir.display(), "committed tasks");
        Ok(oid)
    }

    /// Short name of the checked-out branch; empty when HEAD is detached
    pub fn current_branch(&self) -> Result<String, GitError> {
        match self.repo.head() {
            Ok(head) if head.is_branch() => Ok(head.shorthand().unwrap_or_default().to_string()),
            Ok(_) => Ok(String::new()),
            Err(e) if is_unborn(&e) => {
                let head = self.repo.find_reference("HEAD")?;
                Ok(head
                    .symbolic_target()
                    .map(|target| target.trim_start_matches("refs/heads/").to_string())
                    .unwrap_or_default())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Lightweight tag `<prefix><short id>` on HEAD; returns the tag name
    pub fn tag_head(&self, prefix: &str) -> Result<String, GitError> {
        let commit = self.repo.head()?.peel_to_commit()?;
        let short = commit.as_object().short_id()?;
        let name = format!("{}{}", prefix, short.as_str().unwrap_or_default());
        self.repo.tag_lightweight(&name, commit.as_object(), false)?;
        debug!(tag = %name, "tagged HEAD");
        Ok(name)
    }

    fn signature(&self) -> Result<Signature<'static>, GitError> {
        match self.repo.signature() {
            Ok(sig) => Ok(sig.to_owned()),
            Err(_) => Ok(Signature::now(FALLBACK_SIGNATURE_NAME, FALLBACK_SIGNATURE_EMAIL)?),
        }
    }
}

fn is_unborn(err: &git2::Error) -> bool {
    matches!(err.code(), ErrorCode::UnbornBranch | ErrorCode::NotFound)
}

/// Porcelain v1 rendering of one status entry
fn porcelain_line(entry: &StatusEntry<'_>) -> Option<String> {
    let status = entry.status();
    let path = entry.path()?;
    if status.is_ignored() || status.is_empty() {
        return None;
    }
    let code = if status.is_conflicted() {
        "UU".to_string()
    } else if status == Status::WT_NEW {
        "??".to_string()
    } else {
        let x = if status.is_index_new() {
            'A'
        } else if status.is_index_modified() {
            'M'
        } else if status.is_index_deleted() {
            'D'
        } else if status.is_index_renamed() {
            'R'
        } else if status.is_index_typechange() {
            'T'
        } else {
            ' '
        };
        let y = if status.is_wt_modified() {
            'M'
        } else if status.is_wt_deleted() {
            'D'
        } else if status.is_wt_renamed() {
            'R'
        } else if status.is_wt_typechange() {
            'T'
        } else {
            ' '
        };
        format!("{}{}", x, y)
    };
    Some(format!("{} {}", code, path))
}
