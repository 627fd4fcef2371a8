//! Read-only inspection of cloned repositories.
//!
//! [`StatusReporter`] never mutates a working tree and never touches the
//! network. A repository that cannot be inspected gets a row with `error`
//! set; it does not abort the report.

use serde::Serialize;
use std::path::{Path, PathBuf};

use crate::branch::resolve_default_branch;
use crate::config::Config;
use crate::defaults::REMOTE_NAME;
use crate::error::{Error, Result};
use crate::repository::{GitOperations, SystemGit};
use crate::repository_list::RepositoryEntry;

/// Working-tree status of one configured repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RepositoryStatus {
    pub name: String,
    pub url: String,
    pub path: PathBuf,
    pub exists: bool,
    pub branch: Option<String>,
    pub dirty: Option<bool>,
    pub untracked: Option<bool>,
    /// Abbreviated HEAD commit.
    pub commit: Option<String>,
    pub error: Option<String>,
}

/// Branch position of one configured repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BranchStatus {
    pub name: String,
    pub url: String,
    pub path: PathBuf,
    pub exists: bool,
    pub branch: Option<String>,
    pub default_branch: Option<String>,
    /// Commits on the local branch not on its remote counterpart.
    pub ahead: Option<u32>,
    /// Commits on the remote counterpart not on the local branch.
    pub behind: Option<u32>,
    pub error: Option<String>,
}

/// A report for one system. `error` is set when the system itself could not
/// be read, in which case `repos` is empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SystemReport<T> {
    pub system: String,
    pub repos: Vec<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

pub struct StatusReporter<'a> {
    config: &'a Config,
    git: &'a dyn GitOperations,
}

impl<'a> StatusReporter<'a> {
    pub fn new(config: &'a Config) -> Self {
        Self {
            config,
            git: &SystemGit,
        }
    }

    pub fn with_operations(config: &'a Config, git: &'a dyn GitOperations) -> Self {
        Self { config, git }
    }

    /// Working-tree status of every repository configured for `system`.
    pub fn repository_status(&self, system: &str) -> Result<Vec<RepositoryStatus>> {
        let repos_dir = self.config.repositories_dir(system)?;
        let entries = self.config.system_entries(system)?;

        Ok(entries
            .into_iter()
            .map(|entry| {
                let path = repos_dir.join(&entry.name);
                self.inspect_status(entry, path)
            })
            .collect())
    }

    /// Branch position of every repository configured for `system`.
    pub fn branches(&self, system: &str) -> Result<Vec<BranchStatus>> {
        let repos_dir = self.config.repositories_dir(system)?;
        let entries = self.config.system_entries(system)?;

        Ok(entries
            .into_iter()
            .map(|entry| {
                let path = repos_dir.join(&entry.name);
                self.inspect_branches(entry, path)
            })
            .collect())
    }

    pub fn status_all_systems(&self) -> Result<Vec<SystemReport<RepositoryStatus>>> {
        self.for_all_systems(|system| self.repository_status(system))
    }

    pub fn branches_all_systems(&self) -> Result<Vec<SystemReport<BranchStatus>>> {
        self.for_all_systems(|system| self.branches(system))
    }

    fn for_all_systems<T>(
        &self,
        report: impl Fn(&str) -> Result<Vec<T>>,
    ) -> Result<Vec<SystemReport<T>>> {
        let mut reports = Vec::new();
        for system in self.config.list_systems()? {
            let (repos, error) = match report(&system) {
                Ok(repos) => (repos, None),
                Err(e) => {
                    log::warn!("Skipping system {}: {}", system, e);
                    (Vec::new(), Some(e.to_string()))
                }
            };
            reports.push(SystemReport {
                system,
                repos,
                error,
            });
        }
        Ok(reports)
    }

    fn inspect_status(&self, entry: RepositoryEntry, path: PathBuf) -> RepositoryStatus {
        let mut status = RepositoryStatus {
            name: entry.name,
            url: entry.url,
            exists: path.exists(),
            path,
            branch: None,
            dirty: None,
            untracked: None,
            commit: None,
            error: None,
        };
        if !status.exists {
            return status;
        }

        if let Err(e) = self.fill_status(&mut status) {
            log::debug!("Inspecting {} failed: {}", status.name, e);
            status.error = Some(e.to_string());
        }
        status
    }

    fn fill_status(&self, status: &mut RepositoryStatus) -> Result<()> {
        let path = status.path.clone();
        self.require_work_tree(&status.name, &path)?;
        let tree = self.git.working_tree_status(&path)?;
        status.dirty = Some(tree.dirty);
        status.untracked = Some(tree.untracked);
        status.commit = Some(self.git.short_commit(&path)?);
        status.branch = Some(self.git.current_branch(&path)?);
        Ok(())
    }

    fn inspect_branches(&self, entry: RepositoryEntry, path: PathBuf) -> BranchStatus {
        let mut status = BranchStatus {
            name: entry.name,
            url: entry.url,
            exists: path.exists(),
            path,
            branch: None,
            default_branch: None,
            ahead: None,
            behind: None,
            error: None,
        };
        if !status.exists {
            return status;
        }
        if let Err(e) = self.require_work_tree(&status.name, &status.path) {
            status.error = Some(e.to_string());
            return status;
        }

        status.default_branch = Some(resolve_default_branch(self.git, &status.path));
        match self.git.current_branch(&status.path) {
            Ok(branch) => {
                if let Some((ahead, behind)) = self.divergence(&status.path, &branch) {
                    status.ahead = Some(ahead);
                    status.behind = Some(behind);
                }
                status.branch = Some(branch);
            }
            Err(e) => status.error = Some(e.to_string()),
        }
        status
    }

    fn require_work_tree(&self, name: &str, path: &Path) -> Result<()> {
        if self.git.is_work_tree_root(path)? {
            Ok(())
        } else {
            Err(Error::NotARepository {
                name: name.to_string(),
                path: path.to_path_buf(),
            })
        }
    }

    /// Ahead/behind against `origin/<branch>`, when that ref exists.
    fn divergence(&self, path: &Path, branch: &str) -> Option<(u32, u32)> {
        let upstream_ref = format!("refs/remotes/{}/{}", REMOTE_NAME, branch);
        match self.git.has_ref(path, &upstream_ref) {
            Ok(true) => {}
            Ok(false) => return None,
            Err(e) => {
                log::debug!("{}: checking {} failed: {}", path.display(), upstream_ref, e);
                return None;
            }
        }

        let upstream = format!("{}/{}", REMOTE_NAME, branch);
        self.git
            .ahead_behind(path, branch, &upstream)
            .map_err(|e| log::debug!("{}: ahead/behind failed: {}", path.display(), e))
            .ok()
    }
}
