//! Integration tests for task-file git operations against real repositories.

use std::fs;
use std::path::Path;

use git2::{Repository, RepositoryInitOptions, Signature};
use libgittask_core::sync_state::apply_persistence_policy;
use libgittask_core::tasks::read_tasks;
use libgittask_core::{Record, SyncState, TaskStore};
use libgittask_git::{GitError, GitRepo};
use serde_json::json;
use tempfile::{tempdir, TempDir};

fn init_git_repo(path: &Path) {
    let mut opts = RepositoryInitOptions::new();
    opts.initial_head("main");
    let repo = Repository::init_opts(path, &opts).expect("Failed to init git repo");
    let mut config = repo.config().unwrap();
    config.set_str("user.name", "Test").unwrap();
    config.set_str("user.email", "test@example.com").unwrap();

    fs::write(path.join("README.md"), "readme\n").unwrap();
    let mut index = repo.index().unwrap();
    index.add_path(Path::new("README.md")).unwrap();
    index.write().unwrap();
    let tree_id = index.write_tree().unwrap();
    let tree = repo.find_tree(tree_id).unwrap();
    let sig = Signature::now("Test", "test@example.com").unwrap();
    repo.commit(Some("HEAD"), &sig, &sig, "Initial commit", &tree, &[])
        .expect("Failed to create initial commit");
}

fn setup() -> (TempDir, GitRepo, TaskStore) {
    let dir = tempdir().unwrap();
    init_git_repo(dir.path());
    let repo = GitRepo::open(dir.path()).unwrap();
    let store = TaskStore::new(repo.data_dir());
    store.ensure_data_dir().unwrap();
    (dir, repo, store)
}

fn record(value: serde_json::Value) -> Record {
    Record::from_value(value).unwrap()
}

fn state_of(repo: &GitRepo, path: &Path) -> String {
    repo.status_lines(path)
        .unwrap()
        .last()
        .map(|line| line[..2].to_string())
        .unwrap_or_else(|| "  ".to_string())
}

#[test]
fn test_discover_from_subdirectory() {
    let (dir, repo, _store) = setup();
    let nested = dir.path().join("src").join("deep");
    fs::create_dir_all(&nested).unwrap();

    let found = GitRepo::discover(&nested).unwrap();
    assert_eq!(found.workdir(), repo.workdir());
    assert!(repo.data_dir().ends_with(".tasks/data"));
}

#[test]
fn test_discover_outside_repo_fails() {
    let dir = tempdir().unwrap();
    match GitRepo::open(dir.path()) {
        Err(GitError::NotARepo) => {}
        Err(other) => panic!("unexpected error: {other}"),
        Ok(_) => panic!("opened a repository in an empty directory"),
    }
}

#[test]
fn test_stage_unstage_and_status_lines() {
    let (_dir, repo, store) = setup();
    let path = store.write(&mut record(json!({ "id": "t1" }))).unwrap();

    assert_eq!(state_of(&repo, &path), "??");
    repo.stage(&path).unwrap();
    assert_eq!(state_of(&repo, &path), "A ");

    fs::write(&path, "{\"id\": \"t1\", \"x\": 1}").unwrap();
    assert_eq!(state_of(&repo, &path), "AM");

    repo.unstage(&path).unwrap();
    assert_eq!(state_of(&repo, &path), "??");

    let lines = repo.status_lines(&path).unwrap();
    assert_eq!(lines, vec!["?? .tasks/data/t1".to_string()]);
}

#[test]
fn test_commit_paths_only_commits_tasks_dir() {
    let (dir, repo, store) = setup();
    let task = store.write(&mut record(json!({ "id": "t1" }))).unwrap();

    fs::write(dir.path().join("README.md"), "changed\n").unwrap();
    repo.stage(&dir.path().join("README.md")).unwrap();

    repo.commit_paths("Tasks update", &repo.tasks_dir()).unwrap();

    assert_eq!(state_of(&repo, &task), "  ");
    assert_eq!(state_of(&repo, &dir.path().join("README.md")), "M ");

    match repo.commit_paths("again", &repo.tasks_dir()) {
        Err(GitError::NothingToCommit(_)) => {}
        other => panic!("expected NothingToCommit, got {:?}", other.map(|oid| oid.to_string())),
    }
}

#[test]
fn test_revert_restores_committed_content() {
    let (_dir, repo, store) = setup();
    let path = store.write(&mut record(json!({ "id": "t1", "v": 1 }))).unwrap();
    repo.commit_paths("add t1", &repo.tasks_dir()).unwrap();

    fs::write(&path, "{\"id\": \"t1\", \"v\": 2}").unwrap();
    assert_eq!(state_of(&repo, &path), " M");

    repo.revert(&path).unwrap();
    assert_eq!(state_of(&repo, &path), "  ");
    assert_eq!(store.read("t1").unwrap().get("v"), Some(&json!(1)));
}

#[test]
fn test_revert_untracked_file_is_not_tracked() {
    let (_dir, repo, store) = setup();
    let path = store.write(&mut record(json!({ "id": "t1" }))).unwrap();
    assert!(matches!(repo.revert(&path), Err(GitError::NotTracked(_))));
}

#[test]
fn test_remove_deletes_and_unindexes() {
    let (_dir, repo, store) = setup();
    let path = store.write(&mut record(json!({ "id": "t1" }))).unwrap();
    repo.commit_paths("add t1", &repo.tasks_dir()).unwrap();

    repo.remove(&path).unwrap();
    assert!(!path.exists());
    assert_eq!(state_of(&repo, &path), "D ");
}

#[test]
fn test_current_branch_and_tag_head() {
    let (_dir, repo, _store) = setup();
    assert_eq!(repo.current_branch().unwrap(), "main");

    let tag = repo.tag_head("sorted_fields_").unwrap();
    assert!(tag.starts_with("sorted_fields_"));
    assert!(tag.len() > "sorted_fields_".len());
}

#[test]
fn test_current_branch_on_unborn_repo() {
    let dir = tempdir().unwrap();
    let mut opts = RepositoryInitOptions::new();
    opts.initial_head("trunk");
    Repository::init_opts(dir.path(), &opts).unwrap();

    let repo = GitRepo::open(dir.path()).unwrap();
    assert_eq!(repo.current_branch().unwrap(), "trunk");
}

#[test]
fn test_persistence_policy_against_git() {
    let (_dir, repo, store) = setup();

    let staged = apply_persistence_policy(
        &store,
        record(json!({ "id": "t1", "title": "first", "updatedAt": 1 })),
        SyncState::STAGED_ADDED,
        &repo,
    )
    .unwrap();
    assert_eq!(staged.state, SyncState::STAGED_ADDED);

    repo.commit_paths("add t1", &repo.tasks_dir()).unwrap();

    let discarded = apply_persistence_policy(
        &store,
        record(json!({ "id": "t1", "title": "edited", "updatedAt": 2 })),
        SyncState::DISCARD,
        &repo,
    )
    .unwrap();
    assert!(discarded.state.is_clean());
    assert_eq!(discarded.record.get("title"), Some(&json!("first")));

    let untracked = apply_persistence_policy(
        &store,
        record(json!({ "id": "t2", "title": "draft" })),
        SyncState::UNTRACKED,
        &repo,
    )
    .unwrap();
    assert_eq!(untracked.state, SyncState::UNTRACKED);

    let listing = read_tasks(&store, &repo).unwrap();
    let states: Vec<(String, String)> = listing
        .tasks
        .iter()
        .map(|t| (t.record.id().unwrap_or_default().to_string(), t.state.to_string()))
        .collect();
    assert_eq!(
        states,
        vec![("t1".to_string(), "  ".to_string()), ("t2".to_string(), "??".to_string())]
    );
}
