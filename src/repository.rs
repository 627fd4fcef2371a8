//! # Git Operations Seam
//!
//! The lifecycle manager, the status reporter and the pull-request resolver
//! never call `git` directly. They go through the [`GitOperations`] trait,
//! which names every repository action the tool needs:
//!
//! - network actions: clone, fetch, pull;
//! - local inspection: work-tree detection, HEAD commit, current branch,
//!   remote HEAD, ref existence, working-tree status, ahead/behind counts;
//! - local mutation: checkout, creating a tracking branch.
//!
//! [`SystemGit`] implements it with the installed `git` binary (see
//! [`crate::git`]). Tests substitute an in-memory implementation to drive
//! the state machine without touching a real repository.

use std::path::Path;

use crate::error::Result;
use crate::git::{self, WorkingTreeStatus};

/// Trait for git operations - allows mocking in tests
pub trait GitOperations {
    /// Clone `url` into `target_dir` with `branch` checked out.
    ///
    /// A failure caused by the branch not existing on the remote carries
    /// [`crate::error::VcsFailureKind::BranchNotFound`].
    fn clone_branch(
        &self,
        url: &str,
        branch: &str,
        target_dir: &Path,
        ssh_command: Option<&str>,
    ) -> Result<()>;

    /// Fetch all branches of `remote`.
    fn fetch(&self, repo_dir: &Path, remote: &str, ssh_command: Option<&str>) -> Result<()>;

    /// Fetch and merge `remote/branch` into the current branch.
    fn pull(
        &self,
        repo_dir: &Path,
        remote: &str,
        branch: &str,
        ssh_command: Option<&str>,
    ) -> Result<()>;

    /// Whether `repo_dir` is the top level of a git work tree.
    fn is_work_tree_root(&self, repo_dir: &Path) -> Result<bool>;

    /// Full id of HEAD.
    fn head_commit(&self, repo_dir: &Path) -> Result<String>;

    /// Abbreviated id of HEAD.
    fn short_commit(&self, repo_dir: &Path) -> Result<String>;

    /// Checked-out branch; fails on a detached HEAD.
    fn current_branch(&self, repo_dir: &Path) -> Result<String>;

    /// Branch the remote HEAD points to, if recorded.
    fn remote_head_branch(&self, repo_dir: &Path, remote: &str) -> Result<Option<String>>;

    /// Whether a fully qualified ref exists.
    fn has_ref(&self, repo_dir: &Path, full_ref: &str) -> Result<bool>;

    /// Check out an existing branch.
    fn checkout(&self, repo_dir: &Path, branch: &str) -> Result<()>;

    /// Create `branch` tracking `upstream` and check it out.
    fn create_tracking_branch(&self, repo_dir: &Path, branch: &str, upstream: &str)
        -> Result<()>;

    /// Dirty and untracked flags.
    fn working_tree_status(&self, repo_dir: &Path) -> Result<WorkingTreeStatus>;

    /// `(ahead, behind)` of `local` relative to `upstream`.
    fn ahead_behind(&self, repo_dir: &Path, local: &str, upstream: &str) -> Result<(u32, u32)>;
}

/// The default implementation of `GitOperations`, which uses the system's
/// `git` command to perform real Git operations.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemGit;

impl GitOperations for SystemGit {
    fn clone_branch(
        &self,
        url: &str,
        branch: &str,
        target_dir: &Path,
        ssh_command: Option<&str>,
    ) -> Result<()> {
        git::clone_branch(url, branch, target_dir, ssh_command)
    }

    fn fetch(&self, repo_dir: &Path, remote: &str, ssh_command: Option<&str>) -> Result<()> {
        git::fetch(repo_dir, remote, ssh_command)
    }

    fn pull(
        &self,
        repo_dir: &Path,
        remote: &str,
        branch: &str,
        ssh_command: Option<&str>,
    ) -> Result<()> {
        git::pull(repo_dir, remote, branch, ssh_command)
    }

    fn is_work_tree_root(&self, repo_dir: &Path) -> Result<bool> {
        git::is_work_tree_root(repo_dir)
    }

    fn head_commit(&self, repo_dir: &Path) -> Result<String> {
        git::head_commit(repo_dir)
    }

    fn short_commit(&self, repo_dir: &Path) -> Result<String> {
        git::short_commit(repo_dir)
    }

    fn current_branch(&self, repo_dir: &Path) -> Result<String> {
        git::current_branch(repo_dir)
    }

    fn remote_head_branch(&self, repo_dir: &Path, remote: &str) -> Result<Option<String>> {
        git::remote_head_branch(repo_dir, remote)
    }

    fn has_ref(&self, repo_dir: &Path, full_ref: &str) -> Result<bool> {
        git::has_ref(repo_dir, full_ref)
    }

    fn checkout(&self, repo_dir: &Path, branch: &str) -> Result<()> {
        git::checkout(repo_dir, branch)
    }

    fn create_tracking_branch(
        &self,
        repo_dir: &Path,
        branch: &str,
        upstream: &str,
    ) -> Result<()> {
        git::create_tracking_branch(repo_dir, branch, upstream)
    }

    fn working_tree_status(&self, repo_dir: &Path) -> Result<WorkingTreeStatus> {
        git::working_tree_status(repo_dir)
    }

    fn ahead_behind(&self, repo_dir: &Path, local: &str, upstream: &str) -> Result<(u32, u32)> {
        git::ahead_behind(repo_dir, local, upstream)
    }
}
