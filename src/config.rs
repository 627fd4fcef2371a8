//! # Configuration
//!
//! `Config` is the single, immutable description of where the PKM root lives
//! and how git and the code-review server are reached. It is built once by
//! the caller (the CLI builds it from flags and environment variables) and
//! passed by reference into every component; nothing below this module reads
//! the process environment.
//!
//! ## Layout
//!
//! ```text
//! <root>/
//!   pkm.toml                          optional settings file
//!   systems/
//!     <system>/
//!       service-repositories/
//!         repository-list.txt         one clone URL per line
//!         <short-name>/               clones land here
//! ```
//!
//! ## Settings file
//!
//! ```toml
//! [git]
//! ssh_command = "ssh -i ~/.ssh/work_key"
//!
//! [review]
//! token_env = "BITBUCKET_TOKEN"
//! api_path = "rest/api/1.0"
//! ```
//!
//! Values given explicitly to the builder methods win over the settings file,
//! which wins over the built-in defaults.

use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::defaults::{
    DEFAULT_REST_API_PATH, DEFAULT_TOKEN_ENV, REPOSITORIES_DIR_NAME, REPOSITORY_LIST_FILENAME,
    SETTINGS_FILENAME, SYSTEMS_DIR_NAME,
};
use crate::error::{Error, Result};
use crate::repository_list::{read_entries, RepositoryEntry};

/// How the code-review server is reached for pull-request checkout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewSettings {
    /// Environment variable holding the bearer token.
    pub token_env: String,
    /// REST prefix joined onto the server base URL.
    pub api_path: String,
}

impl Default for ReviewSettings {
    fn default() -> Self {
        Self {
            token_env: DEFAULT_TOKEN_ENV.to_string(),
            api_path: DEFAULT_REST_API_PATH.to_string(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct SettingsFile {
    #[serde(default)]
    git: GitSection,
    #[serde(default)]
    review: ReviewSection,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct GitSection {
    ssh_command: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ReviewSection {
    token_env: Option<String>,
    api_path: Option<String>,
}

/// Validated configuration for a PKM root.
#[derive(Debug, Clone)]
pub struct Config {
    root: PathBuf,
    systems_dir: PathBuf,
    git_ssh_command: Option<String>,
    review: ReviewSettings,
}

impl Config {
    /// Load the configuration for `root`.
    ///
    /// The root must exist; it is canonicalised. `pkm.toml` is read when
    /// present.
    pub fn load(root: &Path) -> Result<Self> {
        if !root.is_dir() {
            return Err(Error::Configuration {
                message: format!("PKM root directory does not exist: {}", root.display()),
                hint: Some("Set PKM_ROOT or pass --root <DIR>".to_string()),
            });
        }
        let root = root.canonicalize()?;

        let settings_path = root.join(SETTINGS_FILENAME);
        let settings = if settings_path.is_file() {
            log::debug!("Reading settings from {}", settings_path.display());
            toml::from_str::<SettingsFile>(&fs::read_to_string(&settings_path)?)?
        } else {
            SettingsFile::default()
        };

        let defaults = ReviewSettings::default();
        let review = ReviewSettings {
            token_env: settings.review.token_env.unwrap_or(defaults.token_env),
            api_path: settings.review.api_path.unwrap_or(defaults.api_path),
        };
        if review.token_env.trim().is_empty() {
            return Err(Error::Configuration {
                message: "review.token_env must not be empty".to_string(),
                hint: Some(format!("Fix or remove the entry in {}", settings_path.display())),
            });
        }

        Ok(Self {
            systems_dir: root.join(SYSTEMS_DIR_NAME),
            root,
            git_ssh_command: settings.git.ssh_command.filter(|cmd| !cmd.trim().is_empty()),
            review,
        })
    }

    /// Override the SSH command used for git network operations.
    ///
    /// `None` keeps whatever the settings file provided.
    pub fn with_git_ssh_command(mut self, ssh_command: Option<String>) -> Self {
        if let Some(cmd) = ssh_command.filter(|cmd| !cmd.trim().is_empty()) {
            self.git_ssh_command = Some(cmd);
        }
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn systems_dir(&self) -> &Path {
        &self.systems_dir
    }

    pub fn git_ssh_command(&self) -> Option<&str> {
        self.git_ssh_command.as_deref()
    }

    pub fn review(&self) -> &ReviewSettings {
        &self.review
    }

    /// Directory of a system. Fails if it does not exist.
    pub fn system_dir(&self, system: &str) -> Result<PathBuf> {
        let path = self.systems_dir.join(system);
        if !path.is_dir() {
            return Err(Error::SystemNotFound {
                system: system.to_string(),
                path,
            });
        }
        Ok(path)
    }

    /// Directory holding a system's repository list and clones.
    pub fn repositories_dir(&self, system: &str) -> Result<PathBuf> {
        let path = self.system_dir(system)?.join(REPOSITORIES_DIR_NAME);
        if !path.is_dir() {
            return Err(Error::Configuration {
                message: format!(
                    "Service repositories directory does not exist: {}",
                    path.display()
                ),
                hint: Some(format!(
                    "Create it and add a {} listing the system's repositories",
                    REPOSITORY_LIST_FILENAME
                )),
            });
        }
        Ok(path)
    }

    /// A system's repository list file. Fails if it does not exist.
    pub fn repository_list_file(&self, system: &str) -> Result<PathBuf> {
        let path = self
            .repositories_dir(system)?
            .join(REPOSITORY_LIST_FILENAME);
        if !path.is_file() {
            return Err(Error::RepositoryListNotFound { path });
        }
        Ok(path)
    }

    /// The configured repositories of a system, in list order.
    pub fn system_entries(&self, system: &str) -> Result<Vec<RepositoryEntry>> {
        read_entries(&self.repository_list_file(system)?)
    }

    /// Names of all systems, sorted. An absent systems directory yields none.
    pub fn list_systems(&self) -> Result<Vec<String>> {
        if !self.systems_dir.is_dir() {
            return Ok(Vec::new());
        }

        let mut systems = Vec::new();
        for entry in fs::read_dir(&self.systems_dir)? {
            let entry = entry?;
            if !entry.file_type()?.is_dir() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().to_string();
            if name.starts_with('.') {
                continue;
            }
            systems.push(name);
        }
        systems.sort();
        Ok(systems)
    }
}
