//! CLI argument parsing and command dispatch

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use pkm_tools::defaults::default_root;
use pkm_tools::output::OutputConfig;
use pkm_tools::sync::Operation;

use crate::commands::{self, Context};

/// PKM tools - keep fleets of git repositories, grouped into systems, cloned and current
#[derive(Parser, Debug)]
#[command(name = "pkm")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,

    /// PKM root directory (defaults to ~/pkm)
    #[arg(long, global = true, value_name = "DIR", env = "PKM_ROOT")]
    root: Option<PathBuf>,

    /// SSH command git uses for network operations (exported as GIT_SSH_COMMAND)
    #[arg(long, global = true, value_name = "COMMAND", env = "PKM_GIT_SSH_COMMAND")]
    git_ssh_command: Option<String>,

    /// Colorize output (always, never, auto)
    #[arg(
        long,
        global = true,
        value_name = "WHEN",
        default_value = "auto",
        value_parser = ["auto", "always", "never"]
    )]
    color: String,

    /// Set log level (off, error, warn, info, debug, trace)
    #[arg(
        long,
        global = true,
        value_name = "LEVEL",
        default_value = "warn",
        env = "PKM_LOG_LEVEL",
        value_parser = ["off", "error", "warn", "info", "debug", "trace"]
    )]
    log_level: String,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Clone the repositories of a system that are not cloned yet
    Clone(commands::lifecycle::BatchArgs),

    /// Pull the latest changes into already cloned repositories
    Sync(commands::lifecycle::BatchArgs),

    /// Clone missing repositories and sync the rest
    Update(commands::lifecycle::BatchArgs),

    /// Show working-tree status of each repository
    Status(commands::status::StatusArgs),

    /// Show current and default branches with ahead/behind counts
    Branches(commands::branches::BranchesArgs),

    /// List the systems under the PKM root
    ListSystems(commands::list::ListSystemsArgs),

    /// List the repositories configured for a system
    ListRepos(commands::list::ListReposArgs),

    /// Check out the source branch of a pull request
    Checkout(commands::checkout::CheckoutArgs),

    /// Generate shell completion scripts
    Completions(commands::completions::CompletionsArgs),
}

impl Cli {
    /// Execute the CLI command
    pub fn execute(self) -> Result<()> {
        init_logging(&self.log_level);

        let ctx = Context {
            root: self.root.unwrap_or_else(default_root),
            git_ssh_command: self.git_ssh_command,
            output: OutputConfig::from_env_and_flag(&self.color),
        };
        log::debug!("Using PKM root {}", ctx.root.display());

        match self.command {
            Commands::Clone(args) => commands::lifecycle::execute(&ctx, Operation::Clone, args),
            Commands::Sync(args) => commands::lifecycle::execute(&ctx, Operation::Sync, args),
            Commands::Update(args) => commands::lifecycle::execute(&ctx, Operation::Update, args),
            Commands::Status(args) => commands::status::execute(&ctx, args),
            Commands::Branches(args) => commands::branches::execute(&ctx, args),
            Commands::ListSystems(args) => commands::list::execute_systems(&ctx, args),
            Commands::ListRepos(args) => commands::list::execute_repos(&ctx, args),
            Commands::Checkout(args) => commands::checkout::execute(&ctx, args),
            Commands::Completions(args) => commands::completions::execute(args),
        }
    }
}

/// Logs go to stderr so tables and JSON on stdout stay clean.
fn init_logging(level: &str) {
    let filter = level
        .parse::<log::LevelFilter>()
        .unwrap_or(log::LevelFilter::Warn);
    let _ = env_logger::Builder::new()
        .filter_level(filter)
        .format_timestamp(None)
        .target(env_logger::Target::Stderr)
        .try_init();
}
