//! # Error Handling
//!
//! This module defines the centralized error type for `pkm-tools`. It uses
//! `thiserror` to build a single `Error` enum covering every failure the
//! library can report, with enough context (paths, URLs, git commands) to
//! explain the failure without a backtrace.
//!
//! ## Key Components
//!
//! - **`Error`**: The main enum. Variants fall into three groups:
//!   - configuration errors (`Configuration`, `SystemNotFound`,
//!     `RepositoryListNotFound`, `InvalidRepositoryName`, `Settings`), which
//!     are fatal for one system;
//!   - per-repository errors (`AlreadyExists`, `NotCloned`,
//!     `NotARepository`, `Vcs`), which the lifecycle manager records in a
//!     result row instead of raising;
//!   - pull-request checkout errors (`InvalidUrl`, `MissingCredential`,
//!     `Api`, `Parse`, `RepositoryNotFound`), raised to the caller.
//!
//! - **`VcsFailureKind`**: The structured reason attached to a failed git
//!   invocation. Fallback logic (for example retrying a clone with `master`)
//!   branches on this value rather than on message text.
//!
//! - **`Result<T>`**: A type alias for `std::result::Result<T, Error>`.

use serde::Serialize;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Classification of a failed git invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum VcsFailureKind {
    /// The requested branch or ref does not exist on the remote.
    BranchNotFound,
    /// The remote rejected our credentials.
    AuthFailure,
    /// The remote could not be reached.
    NetworkError,
    /// A pull could not be merged cleanly.
    MergeConflict,
    /// Any other git failure.
    Other,
}

impl VcsFailureKind {
    /// A short hint shown next to the git message, if one applies.
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            VcsFailureKind::BranchNotFound => {
                Some("pass --branch with a branch that exists on the remote")
            }
            VcsFailureKind::AuthFailure => Some(
                "check your SSH key or credential helper, or set PKM_GIT_SSH_COMMAND",
            ),
            VcsFailureKind::NetworkError => Some("check the remote host is reachable"),
            VcsFailureKind::MergeConflict => {
                Some("resolve the conflict in the working tree, then sync again")
            }
            VcsFailureKind::Other => None,
        }
    }
}

impl fmt::Display for VcsFailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            VcsFailureKind::BranchNotFound => "branch not found",
            VcsFailureKind::AuthFailure => "authentication failure",
            VcsFailureKind::NetworkError => "network error",
            VcsFailureKind::MergeConflict => "merge conflict",
            VcsFailureKind::Other => "git error",
        };
        f.write_str(label)
    }
}

/// Main error type for pkm-tools operations
#[derive(Error, Debug)]
pub enum Error {
    /// The configuration is unusable, for example the root directory is
    /// missing or the settings file holds invalid values.
    #[error("Configuration error: {message}{}", hint.as_ref().map(|h| format!("\n  hint: {}", h)).unwrap_or_default())]
    Configuration {
        message: String,
        /// Optional hint for how to fix the configuration issue
        hint: Option<String>,
    },

    /// The named system has no directory under the systems root.
    #[error("System directory does not exist: {}", path.display())]
    SystemNotFound { system: String, path: PathBuf },

    /// The system exists but its repository list file is missing.
    #[error("Repository list file does not exist: {}", path.display())]
    RepositoryListNotFound { path: PathBuf },

    /// A clone was attempted where a directory already exists.
    #[error("Repository {name} already exists at {}. Use 'sync' to update it.", path.display())]
    AlreadyExists { name: String, path: PathBuf },

    /// A sync, status or checkout was attempted on a repository that has not
    /// been cloned.
    #[error("Repository {name} does not exist at {}. Use 'clone' to clone it first.", path.display())]
    NotCloned { name: String, path: PathBuf },

    /// The repository directory exists but is not the top of a git work
    /// tree.
    #[error("Repository {name} at {} is not a git repository. Move the directory away and clone again.", path.display())]
    NotARepository { name: String, path: PathBuf },

    /// A repository list entry does not yield a usable directory name.
    #[error("Cannot derive a repository name from {url}")]
    InvalidRepositoryName { url: String },

    /// A git command failed.
    #[error("git {command} failed ({kind}): {message}")]
    Vcs {
        kind: VcsFailureKind,
        command: String,
        message: String,
    },

    /// The pull-request URL does not have the expected shape.
    #[error("Invalid pull request URL {url}: {reason}")]
    InvalidUrl { url: String, reason: String },

    /// The bearer token for the code-review server is not set.
    #[error("Missing credential: environment variable {var} is not set")]
    MissingCredential { var: String },

    /// The code-review REST call failed.
    #[error("Code review API request to {url} failed: {message}")]
    Api { url: String, message: String },

    /// The code-review REST response lacked required fields.
    #[error("Could not parse pull request response: {message}")]
    Parse { message: String },

    /// No configured system lists the pull request's repository.
    #[error("Repository {repo} is not listed in any system")]
    RepositoryNotFound { repo: String },

    /// An I/O error, wrapped from `std::io::Error`.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The settings file is not valid TOML or has unexpected fields.
    #[error("Settings file error: {0}")]
    Settings(#[from] toml::de::Error),

    /// A regular expression error, wrapped from `regex::Error`.
    #[error("Regex error: {0}")]
    Regex(#[from] regex::Error),
}

impl Error {
    /// Whether this error means a system is misconfigured rather than a
    /// single repository having failed.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Error::Configuration { .. }
                | Error::SystemNotFound { .. }
                | Error::RepositoryListNotFound { .. }
                | Error::InvalidRepositoryName { .. }
                | Error::Settings(_)
        )
    }

    /// The git failure classification, when this is a git error.
    pub fn vcs_kind(&self) -> Option<VcsFailureKind> {
        match self {
            Error::Vcs { kind, .. } => Some(*kind),
            _ => None,
        }
    }
}

/// A convenient type alias for `Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;
