//! # Branches Command Implementation
//!
//! Shows the checked-out branch, the default branch and how far the local
//! branch has diverged from `origin/<branch>`. Counts reflect the last fetch;
//! this command does not touch the network.

use anyhow::Result;
use clap::Args;
use console::Style;

use pkm_tools::output::{render_table, OutputConfig};
use pkm_tools::status::{BranchStatus, StatusReporter, SystemReport};
use pkm_tools::suggestions;

use super::{cell, print_json, Context, SystemSelector};

/// Show current and default branches with ahead/behind counts
#[derive(Args, Debug)]
pub struct BranchesArgs {
    /// System to inspect, or "all"
    #[arg(short, long, value_name = "SYSTEM", default_value = "all")]
    pub system: SystemSelector,

    /// Print results as JSON instead of tables
    #[arg(long)]
    pub json: bool,
}

/// Execute the `branches` command.
pub fn execute(ctx: &Context, args: BranchesArgs) -> Result<()> {
    let config = ctx.load_config()?;
    let reporter = StatusReporter::new(&config);

    let reports = match args.system {
        SystemSelector::All => reporter
            .branches_all_systems()
            .map_err(suggestions::explain)?,
        SystemSelector::Named(name) => {
            let system = ctx.resolve_system(&config, &name)?;
            let repos = reporter.branches(&system).map_err(suggestions::explain)?;
            vec![SystemReport {
                system,
                repos,
                error: None,
            }]
        }
    };

    if args.json {
        return print_json(&reports);
    }
    for report in &reports {
        println!("{}\n", format_report(&ctx.output, report));
    }
    Ok(())
}

fn branch_cell(config: &OutputConfig, status: &BranchStatus) -> String {
    match (&status.branch, &status.default_branch) {
        (Some(branch), Some(default)) if branch != default => {
            config.paint(Style::new().yellow(), branch)
        }
        (Some(branch), _) => branch.clone(),
        (None, _) if !status.exists => config.paint(Style::new().dim(), "not cloned"),
        (None, _) => config.paint(
            Style::new().red(),
            status.error.as_deref().unwrap_or("unknown"),
        ),
    }
}

fn format_report(config: &OutputConfig, report: &SystemReport<BranchStatus>) -> String {
    let title = config.paint(Style::new().bold(), &report.system);
    if let Some(error) = &report.error {
        return format!("{}\n{}", title, config.paint(Style::new().red(), error));
    }

    let rows: Vec<Vec<String>> = report
        .repos
        .iter()
        .map(|r| {
            vec![
                r.name.clone(),
                branch_cell(config, r),
                cell(r.default_branch.as_deref()),
                cell(r.ahead),
                cell(r.behind),
            ]
        })
        .collect();
    format!(
        "{}\n{}",
        title,
        render_table(
            &["REPOSITORY", "BRANCH", "DEFAULT", "AHEAD", "BEHIND"],
            &rows
        )
    )
}
