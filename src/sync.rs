//! # Repository Lifecycle Management
//!
//! [`RepositorySync`] clones, syncs and updates every repository listed for a
//! system, and runs the same operation across all systems.
//!
//! ## Operations
//!
//! - **clone**: refuse when the directory exists, otherwise clone.
//! - **sync**: refuse when the directory is missing, otherwise check out the
//!   target branch and pull it; report whether HEAD moved.
//! - **update**: sync when the directory exists, clone when it does not.
//!
//! ## Failure isolation
//!
//! A failing repository becomes a [`RepoOutcome::Failed`] row; the batch
//! keeps going. A system that cannot be read (missing directory or
//! repository list) is raised from the per-system call, and becomes a
//! [`SystemResult`] with `error` set in the all-systems variants, so one
//! broken system never hides the others.
//!
//! Repositories are processed one at a time in list order, and systems in
//! name order.

use serde::Serialize;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use crate::branch::{resolve_default_branch, BranchSpec};
use crate::config::Config;
use crate::defaults::{FALLBACK_BRANCH, REMOTE_NAME, SECONDARY_CLONE_BRANCH};
use crate::error::{Error, Result, VcsFailureKind};
use crate::names::find_duplicate_names;
use crate::reporter::{NoopReporter, Reporter};
use crate::repository::{GitOperations, SystemGit};
use crate::repository_list::RepositoryEntry;

/// The batch operation being run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Operation {
    Clone,
    Sync,
    Update,
}

impl Operation {
    /// Present participle used in progress messages, e.g. "Cloning".
    pub fn progressive(&self) -> &'static str {
        match self {
            Operation::Clone => "Cloning",
            Operation::Sync => "Syncing",
            Operation::Update => "Updating",
        }
    }

    /// Past tense used in summaries, e.g. "Cloned".
    pub fn past(&self) -> &'static str {
        match self {
            Operation::Clone => "Cloned",
            Operation::Sync => "Synced",
            Operation::Update => "Updated",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Operation::Clone => "clone",
            Operation::Sync => "sync",
            Operation::Update => "update",
        };
        f.write_str(name)
    }
}

/// What a successful repository operation actually did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Action {
    /// A fresh clone was made.
    Cloned,
    /// An existing clone received new commits.
    Synced,
    /// An existing clone was already current.
    UpToDate,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Action::Cloned => "cloned",
            Action::Synced => "synced",
            Action::UpToDate => "up-to-date",
        };
        f.write_str(label)
    }
}

/// Category of a per-repository failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum FailureKind {
    AlreadyExists,
    NotCloned,
    NotARepository,
    BranchNotFound,
    AuthFailure,
    NetworkError,
    MergeConflict,
    Vcs,
    Io,
    Other,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            FailureKind::AlreadyExists => "already-exists",
            FailureKind::NotCloned => "not-cloned",
            FailureKind::NotARepository => "not-a-repository",
            FailureKind::BranchNotFound => "branch-not-found",
            FailureKind::AuthFailure => "auth-failure",
            FailureKind::NetworkError => "network-error",
            FailureKind::MergeConflict => "merge-conflict",
            FailureKind::Vcs => "vcs",
            FailureKind::Io => "io",
            FailureKind::Other => "other",
        };
        f.write_str(label)
    }
}

impl From<&Error> for FailureKind {
    fn from(error: &Error) -> Self {
        match error {
            Error::AlreadyExists { .. } => FailureKind::AlreadyExists,
            Error::NotCloned { .. } => FailureKind::NotCloned,
            Error::NotARepository { .. } => FailureKind::NotARepository,
            Error::Vcs { kind, .. } => match kind {
                VcsFailureKind::BranchNotFound => FailureKind::BranchNotFound,
                VcsFailureKind::AuthFailure => FailureKind::AuthFailure,
                VcsFailureKind::NetworkError => FailureKind::NetworkError,
                VcsFailureKind::MergeConflict => FailureKind::MergeConflict,
                VcsFailureKind::Other => FailureKind::Vcs,
            },
            Error::Io(_) => FailureKind::Io,
            _ => FailureKind::Other,
        }
    }
}

/// Outcome of one operation on one repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "kebab-case")]
pub enum RepoOutcome {
    Success { action: Action, had_changes: bool },
    Failed { kind: FailureKind, error: String },
}

impl RepoOutcome {
    fn from_error(error: &Error) -> Self {
        RepoOutcome::Failed {
            kind: FailureKind::from(error),
            error: error.to_string(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, RepoOutcome::Success { .. })
    }
}

/// Result row for one configured repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RepoResult {
    pub name: String,
    pub url: String,
    pub path: PathBuf,
    #[serde(flatten)]
    pub outcome: RepoOutcome,
}

impl RepoResult {
    /// Whether the operation changed anything on disk.
    pub fn had_changes(&self) -> bool {
        matches!(
            self.outcome,
            RepoOutcome::Success {
                had_changes: true,
                ..
            }
        )
    }
}

/// Results of one operation over one system.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SystemResult {
    pub system: String,
    pub operation: Operation,
    pub repos: Vec<RepoResult>,
    /// Set when the system itself could not be processed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SystemResult {
    fn new(system: &str, operation: Operation) -> Self {
        Self {
            system: system.to_string(),
            operation,
            repos: Vec::new(),
            error: None,
        }
    }

    fn system_error(system: &str, operation: Operation, error: &Error) -> Self {
        Self {
            error: Some(error.to_string()),
            ..Self::new(system, operation)
        }
    }

    pub fn succeeded(&self) -> usize {
        self.repos.iter().filter(|r| r.outcome.is_success()).count()
    }

    pub fn failed(&self) -> usize {
        self.repos.len() - self.succeeded()
    }

    pub fn changed(&self) -> usize {
        self.repos.iter().filter(|r| r.had_changes()).count()
    }
}

/// Results of one operation over every system.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AllSystemsResult {
    pub operation: Operation,
    pub systems: Vec<SystemResult>,
}

impl AllSystemsResult {
    pub fn succeeded(&self) -> usize {
        self.systems.iter().map(SystemResult::succeeded).sum()
    }

    pub fn failed(&self) -> usize {
        self.systems.iter().map(SystemResult::failed).sum()
    }

    /// Systems that could not be processed at all.
    pub fn system_errors(&self) -> usize {
        self.systems.iter().filter(|s| s.error.is_some()).count()
    }
}

struct Change {
    action: Action,
    had_changes: bool,
}

/// Runs clone / sync / update over the repositories of a PKM root.
pub struct RepositorySync<'a> {
    config: &'a Config,
    git: &'a dyn GitOperations,
    reporter: &'a dyn Reporter,
}

impl<'a> RepositorySync<'a> {
    /// A manager using the system `git` and no progress output.
    pub fn new(config: &'a Config) -> Self {
        Self {
            config,
            git: &SystemGit,
            reporter: &NoopReporter,
        }
    }

    /// A manager using the given git implementation.
    pub fn with_operations(config: &'a Config, git: &'a dyn GitOperations) -> Self {
        Self {
            config,
            git,
            reporter: &NoopReporter,
        }
    }

    /// Send progress events to `reporter`.
    pub fn with_reporter(mut self, reporter: &'a dyn Reporter) -> Self {
        self.reporter = reporter;
        self
    }

    pub fn clone_system(&self, system: &str, branch: &BranchSpec) -> Result<SystemResult> {
        self.run_system(Operation::Clone, system, branch)
    }

    pub fn sync_system(&self, system: &str, branch: &BranchSpec) -> Result<SystemResult> {
        self.run_system(Operation::Sync, system, branch)
    }

    pub fn update_system(&self, system: &str, branch: &BranchSpec) -> Result<SystemResult> {
        self.run_system(Operation::Update, system, branch)
    }

    pub fn clone_all_systems(&self, branch: &BranchSpec) -> Result<AllSystemsResult> {
        self.run_all(Operation::Clone, branch)
    }

    pub fn sync_all_systems(&self, branch: &BranchSpec) -> Result<AllSystemsResult> {
        self.run_all(Operation::Sync, branch)
    }

    pub fn update_all_systems(&self, branch: &BranchSpec) -> Result<AllSystemsResult> {
        self.run_all(Operation::Update, branch)
    }

    /// Run `operation` for every system. Only failing to list the systems
    /// is raised.
    pub fn run_all(&self, operation: Operation, branch: &BranchSpec) -> Result<AllSystemsResult> {
        let systems = self.config.list_systems()?;
        if systems.is_empty() {
            log::warn!("No systems found in {}", self.config.systems_dir().display());
        }

        let mut result = AllSystemsResult {
            operation,
            systems: Vec::with_capacity(systems.len()),
        };
        for system in &systems {
            log::info!("Processing system: {}", system);
            match self.run_system(operation, system, branch) {
                Ok(system_result) => result.systems.push(system_result),
                Err(e) => {
                    log::error!("Failed to {} system {}: {}", operation, system, e);
                    let system_result = SystemResult::system_error(system, operation, &e);
                    self.reporter.emit_result(&system_result);
                    result.systems.push(system_result);
                }
            }
        }
        Ok(result)
    }

    /// Run `operation` for every repository configured for `system`.
    pub fn run_system(
        &self,
        operation: Operation,
        system: &str,
        branch: &BranchSpec,
    ) -> Result<SystemResult> {
        log::info!(
            "{} repositories for system {} ({})",
            operation.progressive(),
            system,
            branch
        );
        let repos_dir = self.config.repositories_dir(system)?;
        let entries = self.config.system_entries(system)?;

        if entries.is_empty() {
            log::warn!("No repositories configured for system {}", system);
        }
        let urls: Vec<String> = entries.iter().map(|e| e.url.clone()).collect();
        for (name, urls) in find_duplicate_names(&urls) {
            log::warn!(
                "System {}: {} URLs share the directory name '{}': {}",
                system,
                urls.len(),
                name,
                urls.join(", ")
            );
        }

        let mut result = SystemResult::new(system, operation);
        for entry in &entries {
            self.reporter.start_operation(operation, system, &entry.name);
            let path = repos_dir.join(&entry.name);

            let outcome = match self.run_entry(operation, entry, &path, branch) {
                Ok(change) => {
                    log::info!("{} {}: {}", operation.past(), entry.name, change.action);
                    RepoOutcome::Success {
                        action: change.action,
                        had_changes: change.had_changes,
                    }
                }
                Err(e) => {
                    log::error!("Failed to {} {}: {}", operation, entry.name, e);
                    RepoOutcome::from_error(&e)
                }
            };

            let repo_result = RepoResult {
                name: entry.name.clone(),
                url: entry.url.clone(),
                path,
                outcome,
            };
            self.reporter
                .finish_operation(operation, system, &repo_result);
            result.repos.push(repo_result);
        }

        self.reporter.emit_result(&result);
        Ok(result)
    }

    fn run_entry(
        &self,
        operation: Operation,
        entry: &RepositoryEntry,
        path: &Path,
        branch: &BranchSpec,
    ) -> Result<Change> {
        match operation {
            Operation::Clone => self.clone_repository(entry, path, branch),
            Operation::Sync => self.sync_repository(entry, path, branch),
            Operation::Update if path.exists() => self.sync_repository(entry, path, branch),
            Operation::Update => self.clone_repository(entry, path, branch),
        }
    }

    fn clone_repository(
        &self,
        entry: &RepositoryEntry,
        path: &Path,
        branch: &BranchSpec,
    ) -> Result<Change> {
        if path.exists() {
            return Err(Error::AlreadyExists {
                name: entry.name.clone(),
                path: path.to_path_buf(),
            });
        }

        match branch {
            BranchSpec::Explicit(name) => self.clone_once(entry, path, name)?,
            BranchSpec::AutoDetect => match self.clone_once(entry, path, FALLBACK_BRANCH) {
                Ok(()) => {}
                Err(e) if e.vcs_kind() == Some(VcsFailureKind::BranchNotFound) => {
                    log::info!(
                        "{} has no branch {}, retrying with {}",
                        entry.name,
                        FALLBACK_BRANCH,
                        SECONDARY_CLONE_BRANCH
                    );
                    self.clone_once(entry, path, SECONDARY_CLONE_BRANCH)?
                }
                Err(e) => return Err(e),
            },
        }

        Ok(Change {
            action: Action::Cloned,
            had_changes: true,
        })
    }

    /// One clone attempt. A failed attempt leaves no directory behind.
    fn clone_once(&self, entry: &RepositoryEntry, path: &Path, branch: &str) -> Result<()> {
        log::debug!("Cloning {} ({}) into {}", entry.url, branch, path.display());
        let result =
            self.git
                .clone_branch(&entry.url, branch, path, self.config.git_ssh_command());
        if result.is_err() && path.exists() {
            log::debug!("Removing partial clone at {}", path.display());
            if let Err(e) = fs::remove_dir_all(path) {
                log::warn!(
                    "Could not remove partial clone at {}: {}",
                    path.display(),
                    e
                );
            }
        }
        result
    }

    fn sync_repository(
        &self,
        entry: &RepositoryEntry,
        path: &Path,
        branch: &BranchSpec,
    ) -> Result<Change> {
        if !path.exists() {
            return Err(Error::NotCloned {
                name: entry.name.clone(),
                path: path.to_path_buf(),
            });
        }
        if !self.git.is_work_tree_root(path)? {
            return Err(Error::NotARepository {
                name: entry.name.clone(),
                path: path.to_path_buf(),
            });
        }

        let old_commit = self.git.head_commit(path)?;
        let target = match branch {
            BranchSpec::Explicit(name) => name.clone(),
            BranchSpec::AutoDetect => resolve_default_branch(self.git, path),
        };

        let current = self.git.current_branch(path).ok();
        if current.as_deref() != Some(target.as_str()) {
            log::debug!("{}: checking out {}", entry.name, target);
            self.git.checkout(path, &target)?;
        }

        self.git
            .pull(path, REMOTE_NAME, &target, self.config.git_ssh_command())?;
        let new_commit = self.git.head_commit(path)?;

        let had_changes = old_commit != new_commit;
        Ok(Change {
            action: if had_changes {
                Action::Synced
            } else {
                Action::UpToDate
            },
            had_changes,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::defaults::{REPOSITORIES_DIR_NAME, REPOSITORY_LIST_FILENAME, SYSTEMS_DIR_NAME};
    use crate::repository::mock::{MockGit, MockRepo};
    use std::cell::RefCell;
    use tempfile::TempDir;

    const URL_A: &str = "https://h/org/a.git";
    const URL_B: &str = "https://h/org/b.git";

    fn setup(systems: &[(&str, Option<&str>)]) -> (TempDir, Config) {
        let temp_dir = TempDir::new().unwrap();
        for (system, list) in systems {
            let dir = temp_dir
                .path()
                .join(SYSTEMS_DIR_NAME)
                .join(system)
                .join(REPOSITORIES_DIR_NAME);
            fs::create_dir_all(&dir).unwrap();
            if let Some(content) = list {
                fs::write(dir.join(REPOSITORY_LIST_FILENAME), content).unwrap();
            }
        }
        let config = Config::load(temp_dir.path()).unwrap();
        (temp_dir, config)
    }

    fn repo_path(config: &Config, system: &str, name: &str) -> PathBuf {
        config.repositories_dir(system).unwrap().join(name)
    }

    fn existing(head: &str, incoming: Option<&str>) -> MockRepo {
        MockRepo {
            branch: Some("main".to_string()),
            head: head.to_string(),
            remote_head: Some("main".to_string()),
            remote_branches: vec!["main".to_string(), "develop".to_string()],
            local_branches: vec!["main".to_string()],
            incoming: incoming.map(str::to_string),
            ..MockRepo::default()
        }
    }

    #[test]
    fn test_clone_system_clones_every_entry() {
        let list = format!("{}\n# comment\n\n{}\n", URL_A, URL_B);
        let (_tmp, config) = setup(&[("demo", Some(&list))]);
        let git = MockGit::new()
            .with_remote(URL_A, &["main"])
            .with_remote(URL_B, &["main"]);

        let result = RepositorySync::with_operations(&config, &git)
            .clone_system("demo", &BranchSpec::AutoDetect)
            .unwrap();

        assert_eq!(result.repos.len(), 2);
        assert_eq!(result.succeeded(), 2);
        assert_eq!(result.failed(), 0);
        assert_eq!(result.repos[0].name, "a");
        assert_eq!(result.repos[1].name, "b");
        assert_eq!(
            result.repos[0].outcome,
            RepoOutcome::Success {
                action: Action::Cloned,
                had_changes: true
            }
        );
    }

    #[test]
    fn test_clone_existing_path_fails_without_touching_it() {
        let (_tmp, config) = setup(&[("demo", Some(URL_A))]);
        let path = repo_path(&config, "demo", "a");
        fs::create_dir_all(&path).unwrap();
        fs::write(path.join("keep.txt"), "local work").unwrap();
        let git = MockGit::new().with_remote(URL_A, &["main"]);

        let result = RepositorySync::with_operations(&config, &git)
            .clone_system("demo", &BranchSpec::AutoDetect)
            .unwrap();

        assert_eq!(result.failed(), 1);
        match &result.repos[0].outcome {
            RepoOutcome::Failed { kind, error } => {
                assert_eq!(*kind, FailureKind::AlreadyExists);
                assert!(error.contains("already exists"));
            }
            other => panic!("expected failure, got {:?}", other),
        }
        assert!(git.calls().is_empty());
        assert_eq!(
            fs::read_to_string(path.join("keep.txt")).unwrap(),
            "local work"
        );
        assert_eq!(fs::read_dir(&path).unwrap().count(), 1);
    }

    #[test]
    fn test_clone_auto_detect_falls_back_to_master() {
        let (_tmp, config) = setup(&[("demo", Some(URL_A))]);
        let git = MockGit::new().with_remote(URL_A, &["master"]);

        let result = RepositorySync::with_operations(&config, &git)
            .clone_system("demo", &BranchSpec::AutoDetect)
            .unwrap();

        assert_eq!(result.succeeded(), 1);
        assert_eq!(
            git.calls(),
            vec![
                format!("clone {} main ssh=-", URL_A),
                format!("clone {} master ssh=-", URL_A),
            ]
        );
        let path = repo_path(&config, "demo", "a");
        assert_eq!(git.repo(&path).branch.as_deref(), Some("master"));
    }

    #[test]
    fn test_clone_explicit_branch_does_not_fall_back() {
        let (_tmp, config) = setup(&[("demo", Some(URL_A))]);
        let git = MockGit::new().with_remote(URL_A, &["master"]);

        let result = RepositorySync::with_operations(&config, &git)
            .clone_system("demo", &BranchSpec::Explicit("release".to_string()))
            .unwrap();

        assert_eq!(result.failed(), 1);
        assert_eq!(git.calls().len(), 1);
        assert!(matches!(
            result.repos[0].outcome,
            RepoOutcome::Failed {
                kind: FailureKind::BranchNotFound,
                ..
            }
        ));
        // the partial directory from the failed attempt is gone
        assert!(!repo_path(&config, "demo", "a").exists());
    }

    #[test]
    fn test_clone_network_failure_does_not_retry() {
        let (_tmp, config) = setup(&[("demo", Some(URL_A))]);
        let git = MockGit::new().with_unreachable(URL_A);

        let result = RepositorySync::with_operations(&config, &git)
            .clone_system("demo", &BranchSpec::AutoDetect)
            .unwrap();

        assert_eq!(git.calls().len(), 1);
        assert!(matches!(
            result.repos[0].outcome,
            RepoOutcome::Failed {
                kind: FailureKind::NetworkError,
                ..
            }
        ));
    }

    #[test]
    fn test_clone_passes_ssh_command() {
        let (tmp, _) = setup(&[("demo", Some(URL_A))]);
        let config = Config::load(tmp.path())
            .unwrap()
            .with_git_ssh_command(Some("ssh -i key".to_string()));
        let git = MockGit::new().with_remote(URL_A, &["main"]);

        RepositorySync::with_operations(&config, &git)
            .clone_system("demo", &BranchSpec::AutoDetect)
            .unwrap();

        assert_eq!(git.calls(), vec![format!("clone {} main ssh=ssh -i key", URL_A)]);
    }

    #[test]
    fn test_sync_missing_path_fails_and_creates_nothing() {
        let (_tmp, config) = setup(&[("demo", Some(URL_A))]);
        let git = MockGit::new().with_remote(URL_A, &["main"]);

        let result = RepositorySync::with_operations(&config, &git)
            .sync_system("demo", &BranchSpec::AutoDetect)
            .unwrap();

        assert!(matches!(
            result.repos[0].outcome,
            RepoOutcome::Failed {
                kind: FailureKind::NotCloned,
                ..
            }
        ));
        assert!(!repo_path(&config, "demo", "a").exists());
        assert!(git.calls().is_empty());
    }

    #[test]
    fn test_clone_failure_survives_cleanup_failure() {
        let (_tmp, config) = setup(&[("demo", Some(URL_A))]);
        let git = MockGit::new()
            .with_remote(URL_A, &["main"])
            .leaving_file_on_failure();

        let result = RepositorySync::with_operations(&config, &git)
            .clone_system("demo", &BranchSpec::Explicit("release".to_string()))
            .unwrap();

        assert!(matches!(
            result.repos[0].outcome,
            RepoOutcome::Failed {
                kind: FailureKind::BranchNotFound,
                ..
            }
        ));
    }

    #[test]
    fn test_sync_plain_directory_is_not_a_repository() {
        let (_tmp, config) = setup(&[("demo", Some(URL_A))]);
        // a leftover directory with no clone in it
        fs::create_dir_all(repo_path(&config, "demo", "a")).unwrap();
        let git = MockGit::new().with_remote(URL_A, &["main"]);

        let result = RepositorySync::with_operations(&config, &git)
            .sync_system("demo", &BranchSpec::Explicit("main".to_string()))
            .unwrap();

        assert!(matches!(
            result.repos[0].outcome,
            RepoOutcome::Failed {
                kind: FailureKind::NotARepository,
                ..
            }
        ));
        assert!(git.calls().is_empty());
        assert!(repo_path(&config, "demo", "a").is_dir());
    }

    #[test]
    fn test_update_plain_directory_is_not_cloned_over() {
        let (_tmp, config) = setup(&[("demo", Some(URL_A))]);
        fs::create_dir_all(repo_path(&config, "demo", "a")).unwrap();
        let git = MockGit::new().with_remote(URL_A, &["main"]);

        let result = RepositorySync::with_operations(&config, &git)
            .update_system("demo", &BranchSpec::AutoDetect)
            .unwrap();

        assert_eq!(result.failed(), 1);
        assert!(git.calls().is_empty());
    }

    #[test]
    fn test_unusable_repository_name_fails_the_system() {
        let (_tmp, config) = setup(&[("demo", Some("https://h/org/.git\n"))]);
        let git = MockGit::new();

        let err = RepositorySync::with_operations(&config, &git)
            .sync_system("demo", &BranchSpec::AutoDetect)
            .unwrap_err();

        assert!(matches!(err, Error::InvalidRepositoryName { .. }));
        assert!(git.calls().is_empty());
    }

    #[test]
    fn test_sync_reports_changes_then_up_to_date() {
        let (_tmp, config) = setup(&[("demo", Some(URL_A))]);
        let path = repo_path(&config, "demo", "a");
        let git = MockGit::new().with_repo(&path, existing("c1", Some("c2")));
        let manager = RepositorySync::with_operations(&config, &git);

        let first = manager.sync_system("demo", &BranchSpec::AutoDetect).unwrap();
        assert_eq!(
            first.repos[0].outcome,
            RepoOutcome::Success {
                action: Action::Synced,
                had_changes: true
            }
        );

        let second = manager.sync_system("demo", &BranchSpec::AutoDetect).unwrap();
        assert_eq!(
            second.repos[0].outcome,
            RepoOutcome::Success {
                action: Action::UpToDate,
                had_changes: false
            }
        );
        assert_eq!(second.changed(), 0);
    }

    #[test]
    fn test_sync_checks_out_explicit_branch() {
        let (_tmp, config) = setup(&[("demo", Some(URL_A))]);
        let path = repo_path(&config, "demo", "a");
        let git = MockGit::new().with_repo(&path, existing("c1", None));

        RepositorySync::with_operations(&config, &git)
            .sync_system("demo", &BranchSpec::Explicit("develop".to_string()))
            .unwrap();

        assert_eq!(git.calls(), vec!["checkout develop", "pull origin develop"]);
        assert_eq!(git.repo(&path).branch.as_deref(), Some("develop"));
    }

    #[test]
    fn test_sync_skips_checkout_when_already_on_branch() {
        let (_tmp, config) = setup(&[("demo", Some(URL_A))]);
        let path = repo_path(&config, "demo", "a");
        let git = MockGit::new().with_repo(&path, existing("c1", None));

        RepositorySync::with_operations(&config, &git)
            .sync_system("demo", &BranchSpec::AutoDetect)
            .unwrap();

        assert_eq!(git.calls(), vec!["pull origin main"]);
    }

    #[test]
    fn test_sync_failure_does_not_stop_batch() {
        let list = format!("{}\n{}\n", URL_A, URL_B);
        let (_tmp, config) = setup(&[("demo", Some(&list))]);
        let path_a = repo_path(&config, "demo", "a");
        let path_b = repo_path(&config, "demo", "b");
        let mut conflicted = existing("c1", None);
        conflicted.pull_error = Some((
            VcsFailureKind::MergeConflict,
            "CONFLICT (content): Merge conflict in README.md".to_string(),
        ));
        let git = MockGit::new()
            .with_repo(&path_a, conflicted)
            .with_repo(&path_b, existing("c1", Some("c9")));

        let result = RepositorySync::with_operations(&config, &git)
            .sync_system("demo", &BranchSpec::AutoDetect)
            .unwrap();

        assert_eq!(result.repos.len(), 2);
        assert_eq!(result.succeeded() + result.failed(), 2);
        assert!(matches!(
            result.repos[0].outcome,
            RepoOutcome::Failed {
                kind: FailureKind::MergeConflict,
                ..
            }
        ));
        assert!(result.repos[1].had_changes());
    }

    #[test]
    fn test_sync_unknown_branch_fails() {
        let (_tmp, config) = setup(&[("demo", Some(URL_A))]);
        let path = repo_path(&config, "demo", "a");
        let git = MockGit::new().with_repo(&path, existing("c1", None));

        let result = RepositorySync::with_operations(&config, &git)
            .sync_system("demo", &BranchSpec::Explicit("nope".to_string()))
            .unwrap();

        assert!(matches!(
            result.repos[0].outcome,
            RepoOutcome::Failed {
                kind: FailureKind::BranchNotFound,
                ..
            }
        ));
        assert!(!git.calls().iter().any(|c| c.starts_with("pull")));
    }

    #[test]
    fn test_update_clones_missing_and_syncs_existing() {
        let list = format!("{}\n{}\n", URL_A, URL_B);
        let (_tmp, config) = setup(&[("demo", Some(&list))]);
        let path_b = repo_path(&config, "demo", "b");
        let git = MockGit::new()
            .with_remote(URL_A, &["main"])
            .with_repo(&path_b, existing("c1", None));

        let result = RepositorySync::with_operations(&config, &git)
            .update_system("demo", &BranchSpec::AutoDetect)
            .unwrap();

        assert_eq!(
            result.repos[0].outcome,
            RepoOutcome::Success {
                action: Action::Cloned,
                had_changes: true
            }
        );
        assert_eq!(
            result.repos[1].outcome,
            RepoOutcome::Success {
                action: Action::UpToDate,
                had_changes: false
            }
        );
    }

    #[test]
    fn test_missing_repository_list_is_raised_per_system() {
        let (_tmp, config) = setup(&[("broken", None)]);
        let git = MockGit::new();

        let err = RepositorySync::with_operations(&config, &git)
            .sync_system("broken", &BranchSpec::AutoDetect)
            .unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn test_update_all_systems_isolates_broken_system() {
        let (_tmp, config) = setup(&[
            ("alpha", Some(URL_A)),
            ("broken", None),
            ("gamma", Some(URL_B)),
        ]);
        let git = MockGit::new()
            .with_remote(URL_A, &["main"])
            .with_remote(URL_B, &["master"]);

        let result = RepositorySync::with_operations(&config, &git)
            .update_all_systems(&BranchSpec::AutoDetect)
            .unwrap();

        let names: Vec<&str> = result.systems.iter().map(|s| s.system.as_str()).collect();
        assert_eq!(names, vec!["alpha", "broken", "gamma"]);
        assert_eq!(result.systems[0].succeeded(), 1);
        assert!(result.systems[1].error.is_some());
        assert!(result.systems[1].repos.is_empty());
        assert_eq!(result.systems[2].succeeded(), 1);
        assert_eq!(result.system_errors(), 1);
        assert_eq!(result.succeeded(), 2);
    }

    #[test]
    fn test_all_systems_with_no_systems() {
        let (_tmp, config) = setup(&[]);
        let git = MockGit::new();

        let result = RepositorySync::with_operations(&config, &git)
            .clone_all_systems(&BranchSpec::AutoDetect)
            .unwrap();
        assert!(result.systems.is_empty());
    }

    #[derive(Default)]
    struct RecordingReporter {
        events: RefCell<Vec<String>>,
    }

    impl Reporter for RecordingReporter {
        fn start_operation(&self, operation: Operation, system: &str, repo: &str) {
            self.events
                .borrow_mut()
                .push(format!("start {} {} {}", operation, system, repo));
        }

        fn finish_operation(&self, _operation: Operation, _system: &str, result: &RepoResult) {
            self.events
                .borrow_mut()
                .push(format!("finish {} {}", result.name, result.outcome.is_success()));
        }

        fn emit_result(&self, result: &SystemResult) {
            self.events
                .borrow_mut()
                .push(format!("result {} {}", result.system, result.repos.len()));
        }
    }

    #[test]
    fn test_reporter_receives_events_in_order() {
        let (_tmp, config) = setup(&[("demo", Some(URL_A))]);
        let git = MockGit::new().with_remote(URL_A, &["main"]);
        let reporter = RecordingReporter::default();

        RepositorySync::with_operations(&config, &git)
            .with_reporter(&reporter)
            .clone_system("demo", &BranchSpec::AutoDetect)
            .unwrap();

        assert_eq!(
            *reporter.events.borrow(),
            vec!["start clone demo a", "finish a true", "result demo 1"]
        );
    }

    #[test]
    fn test_results_serialize_to_json() {
        let result = SystemResult {
            system: "demo".to_string(),
            operation: Operation::Sync,
            repos: vec![RepoResult {
                name: "a".to_string(),
                url: URL_A.to_string(),
                path: PathBuf::from("/pkm/a"),
                outcome: RepoOutcome::Success {
                    action: Action::UpToDate,
                    had_changes: false,
                },
            }],
            error: None,
        };

        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["operation"], "sync");
        assert_eq!(json["repos"][0]["status"], "success");
        assert_eq!(json["repos"][0]["action"], "up-to-date");
        assert_eq!(json["repos"][0]["had_changes"], false);
        assert!(json.get("error").is_none());
    }
}
