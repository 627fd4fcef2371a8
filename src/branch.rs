//! Branch selection and default-branch detection.

use serde::Serialize;
use std::fmt;
use std::path::Path;

use crate::defaults::{BRANCH_CANDIDATES, FALLBACK_BRANCH, REMOTE_NAME};
use crate::repository::GitOperations;

/// Which branch an operation should act on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "mode", content = "name", rename_all = "kebab-case")]
pub enum BranchSpec {
    /// Use exactly this branch.
    Explicit(String),
    /// Work out the branch per repository.
    AutoDetect,
}

impl BranchSpec {
    /// `Some(name)` becomes `Explicit`, `None` becomes `AutoDetect`.
    pub fn from_option(branch: Option<String>) -> Self {
        match branch {
            Some(name) if !name.trim().is_empty() => BranchSpec::Explicit(name),
            _ => BranchSpec::AutoDetect,
        }
    }
}

impl fmt::Display for BranchSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BranchSpec::Explicit(name) => f.write_str(name),
            BranchSpec::AutoDetect => f.write_str("default branch"),
        }
    }
}

/// Determine the default branch of a cloned repository.
///
/// Precedence, first hit wins:
/// 1. the branch `origin/HEAD` points to;
/// 2. the first of `main`, `master`, `develop` present as `origin/<name>`;
/// 3. the checked-out branch;
/// 4. `main`.
///
/// An error at any step is logged and the next step is tried, so this never
/// fails.
pub fn resolve_default_branch(git: &dyn GitOperations, repo_dir: &Path) -> String {
    match git.remote_head_branch(repo_dir, REMOTE_NAME) {
        Ok(Some(branch)) => return branch,
        Ok(None) => log::debug!("{}: remote HEAD not recorded", repo_dir.display()),
        Err(e) => log::debug!("{}: reading remote HEAD failed: {}", repo_dir.display(), e),
    }

    for candidate in BRANCH_CANDIDATES {
        let remote_ref = format!("refs/remotes/{}/{}", REMOTE_NAME, candidate);
        match git.has_ref(repo_dir, &remote_ref) {
            Ok(true) => return candidate.to_string(),
            Ok(false) => {}
            Err(e) => log::debug!("{}: checking {} failed: {}", repo_dir.display(), remote_ref, e),
        }
    }

    match git.current_branch(repo_dir) {
        Ok(branch) => branch,
        Err(e) => {
            log::debug!(
                "{}: no current branch ({}), using {}",
                repo_dir.display(),
                e,
                FALLBACK_BRANCH
            );
            FALLBACK_BRANCH.to_string()
        }
    }
}
