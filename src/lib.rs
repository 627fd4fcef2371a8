//! # PKM Tools Library
//!
//! This library keeps a fleet of git repositories, grouped into named
//! *systems*, cloned and current on the local machine. It is used by the
//! `pkm` command-line tool but can be driven by any caller that builds a
//! [`config::Config`].
//!
//! ## Quick Example
//!
//! ```
//! use pkm_tools::names::repo_name_from_url;
//! use pkm_tools::repository_list::parse_repository_list;
//!
//! let urls = parse_repository_list(
//!     "https://h/org/a.git\n# comment\n\nhttps://h/org/b.git\n",
//! );
//! assert_eq!(urls, vec!["https://h/org/a.git", "https://h/org/b.git"]);
//! assert_eq!(repo_name_from_url(&urls[0]), "a");
//! ```
//!
//! ## Core Concepts
//!
//! - **Systems (`config`)**: each system lives in
//!   `<root>/systems/<system>/service-repositories/`, which holds a
//!   `repository-list.txt` and one clone per listed URL.
//! - **Repository lists (`repository_list`, `names`)**: clone URLs, one per
//!   line, each mapped to the short directory name it is cloned under.
//! - **Lifecycle (`sync`)**: clone, sync and update a system or every system,
//!   with per-repository failures recorded instead of aborting the batch.
//! - **Branches (`branch`)**: an explicit branch or the repository's default
//!   branch as advertised by its remote.
//! - **Inspection (`status`)**: working-tree state and ahead/behind counts,
//!   read-only.
//! - **Pull requests (`pull_request`)**: resolve a code-review URL to a local
//!   checkout of its source branch.
//! - **Git (`git`, `repository`)**: the installed `git` binary behind the
//!   `GitOperations` trait.
//!
//! ## Execution Flow
//!
//! 1. The caller builds a `Config` for a PKM root.
//! 2. A `RepositorySync` reads a system's repository list.
//! 3. Each entry is cloned, synced or updated through `GitOperations`,
//!    announcing progress to a `Reporter`.
//! 4. Results come back as `SystemResult` / `AllSystemsResult`, ready to
//!    render or serialize.

pub mod branch;
pub mod config;
pub mod defaults;
pub mod error;
pub mod git;
pub mod names;
pub mod output;
pub mod pull_request;
pub mod reporter;
pub mod repository;
pub mod repository_list;
pub mod status;
pub mod suggestions;
pub mod sync;
