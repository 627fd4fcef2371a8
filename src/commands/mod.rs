//! # CLI Command Implementations
//!
//! This module contains the implementation for each subcommand of the `pkm`
//! command-line tool. Each subcommand is defined in its own file to keep the
//! logic separated and maintainable.
//!
//! ## Structure
//!
//! Each command module typically contains:
//! - An `Args` struct that defines the command-specific arguments and options,
//!   derived using `clap`.
//! - An `execute` function that takes the shared [`Context`] and the parsed
//!   `Args` and performs the command's logic.
//!
//! The `execute` function is the main entry point for the command and is
//! responsible for orchestrating the necessary operations, calling into the
//! `pkm_tools` library to perform the core logic.

pub mod branches;
pub mod checkout;
pub mod completions;
pub mod lifecycle;
pub mod list;
pub mod status;

use anyhow::Result;
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use pkm_tools::config::Config;
use pkm_tools::output::OutputConfig;
use pkm_tools::suggestions;

/// Options shared by every command, resolved from global flags and the
/// environment.
#[derive(Debug)]
pub struct Context {
    pub root: PathBuf,
    pub git_ssh_command: Option<String>,
    pub output: OutputConfig,
}

impl Context {
    /// Load and validate the configuration for the PKM root.
    pub fn load_config(&self) -> Result<Config> {
        let config = Config::load(&self.root).map_err(suggestions::explain)?;
        Ok(config.with_git_ssh_command(self.git_ssh_command.clone()))
    }

    /// Check that `name` is a discovered system.
    pub fn resolve_system(&self, config: &Config, name: &str) -> Result<String> {
        let systems = config.list_systems()?;
        if systems.iter().any(|s| s == name) {
            return Ok(name.to_string());
        }
        if systems.is_empty() {
            return Err(suggestions::no_systems_found(config.systems_dir()));
        }
        Err(suggestions::unknown_system(name, &systems))
    }
}

/// A single system or every system.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SystemSelector {
    All,
    Named(String),
}

impl FromStr for SystemSelector {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err("system name must not be empty".to_string());
        }
        if s.eq_ignore_ascii_case("all") {
            Ok(SystemSelector::All)
        } else {
            Ok(SystemSelector::Named(s.to_string()))
        }
    }
}

impl fmt::Display for SystemSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SystemSelector::All => f.write_str("all"),
            SystemSelector::Named(name) => f.write_str(name),
        }
    }
}

/// Print `value` as pretty JSON on stdout.
pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Placeholder for an absent table cell.
pub fn cell<T: ToString>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_else(|| "-".to_string())
}
