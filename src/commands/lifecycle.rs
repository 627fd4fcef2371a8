//! # Clone, Sync and Update Commands
//!
//! The three batch commands share their arguments and flow; only the
//! [`Operation`] differs.
//!
//! - **clone**: clone repositories that are not on disk yet; existing
//!   directories are reported as failures and left alone.
//! - **sync**: pull the selected (or default) branch into existing clones.
//! - **update**: clone what is missing and sync what is there.
//!
//! A batch always runs to completion and exits successfully; per-repository
//! failures are shown in the result table (or the JSON output).

use anyhow::Result;
use clap::Args;

use pkm_tools::branch::BranchSpec;
use pkm_tools::output::{format_all_systems_summary, SpinnerReporter};
use pkm_tools::reporter::{NoopReporter, Reporter};
use pkm_tools::suggestions;
use pkm_tools::sync::{Operation, RepositorySync};

use super::{print_json, Context, SystemSelector};

/// Arguments shared by `clone`, `sync` and `update`
#[derive(Args, Debug)]
pub struct BatchArgs {
    /// System to process, or "all"
    #[arg(short, long, value_name = "SYSTEM", default_value = "all")]
    pub system: SystemSelector,

    /// Branch to clone or sync (defaults to each repository's default branch)
    #[arg(short, long, value_name = "BRANCH")]
    pub branch: Option<String>,

    /// Print results as JSON instead of tables
    #[arg(long)]
    pub json: bool,
}

/// Execute a batch command.
pub fn execute(ctx: &Context, operation: Operation, args: BatchArgs) -> Result<()> {
    let config = ctx.load_config()?;
    let branch = BranchSpec::from_option(args.branch);

    let spinner = SpinnerReporter::new(ctx.output);
    let reporter: &dyn Reporter = if args.json { &NoopReporter } else { &spinner };
    let manager = RepositorySync::new(&config).with_reporter(reporter);

    match args.system {
        SystemSelector::All => {
            let result = manager
                .run_all(operation, &branch)
                .map_err(suggestions::explain)?;
            if args.json {
                print_json(&result)?;
            } else if result.systems.is_empty() {
                eprintln!("{}", suggestions::no_systems_found(config.systems_dir()));
            } else {
                println!("{}", format_all_systems_summary(&result));
            }
        }
        SystemSelector::Named(name) => {
            let system = ctx.resolve_system(&config, &name)?;
            let result = manager
                .run_system(operation, &system, &branch)
                .map_err(suggestions::explain)?;
            if args.json {
                print_json(&result)?;
            }
        }
    }
    Ok(())
}
