//! Default values for pkm-tools configuration.
//!
//! This module provides centralized default values used across commands,
//! ensuring consistency and avoiding duplication.

use std::path::PathBuf;

/// Directory under the PKM root that holds one subdirectory per system.
pub const SYSTEMS_DIR_NAME: &str = "systems";

/// Directory inside a system that holds the repository list and the clones.
pub const REPOSITORIES_DIR_NAME: &str = "service-repositories";

/// File inside [`REPOSITORIES_DIR_NAME`] listing one clone URL per line.
pub const REPOSITORY_LIST_FILENAME: &str = "repository-list.txt";

/// Optional settings file at the PKM root.
pub const SETTINGS_FILENAME: &str = "pkm.toml";

/// Environment variable holding the code-review bearer token.
pub const DEFAULT_TOKEN_ENV: &str = "BITBUCKET_TOKEN";

/// REST API prefix of the code-review server, relative to its base URL.
pub const DEFAULT_REST_API_PATH: &str = "rest/api/1.0";

/// Remote name every managed repository is expected to use.
pub const REMOTE_NAME: &str = "origin";

/// Conventional default branch names, tried in order when the remote does
/// not advertise its HEAD.
pub const BRANCH_CANDIDATES: [&str; 3] = ["main", "master", "develop"];

/// Branch used when nothing else can be determined.
pub const FALLBACK_BRANCH: &str = "main";

/// Branch tried when a clone on the first candidate finds no such branch.
pub const SECONDARY_CLONE_BRANCH: &str = "master";

/// Returns the default PKM root directory.
///
/// Uses `~/pkm`, falling back to `pkm` in the current directory if the home
/// directory cannot be determined.
///
/// This can be overridden by the `--root` CLI flag or the `PKM_ROOT`
/// environment variable.
pub fn default_root() -> PathBuf {
    dirs::home_dir()
        .map(|home| home.join("pkm"))
        .unwrap_or_else(|| PathBuf::from("pkm"))
}
