//! # Status Command Implementation
//!
//! Shows, per configured repository, whether it is cloned, which branch is
//! checked out, whether the working tree has changes and the HEAD commit.
//! This command is read-only.

use anyhow::Result;
use clap::Args;
use console::Style;

use pkm_tools::output::{emoji, render_table, OutputConfig};
use pkm_tools::status::{RepositoryStatus, StatusReporter, SystemReport};
use pkm_tools::suggestions;

use super::{cell, print_json, Context, SystemSelector};

/// Show working-tree status of each repository
#[derive(Args, Debug)]
pub struct StatusArgs {
    /// System to inspect, or "all"
    #[arg(short, long, value_name = "SYSTEM", default_value = "all")]
    pub system: SystemSelector,

    /// Print results as JSON instead of tables
    #[arg(long)]
    pub json: bool,
}

/// Execute the `status` command.
pub fn execute(ctx: &Context, args: StatusArgs) -> Result<()> {
    let config = ctx.load_config()?;
    let reporter = StatusReporter::new(&config);

    let reports = match args.system {
        SystemSelector::All => reporter
            .status_all_systems()
            .map_err(suggestions::explain)?,
        SystemSelector::Named(name) => {
            let system = ctx.resolve_system(&config, &name)?;
            let repos = reporter
                .repository_status(&system)
                .map_err(suggestions::explain)?;
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

fn state(config: &OutputConfig, status: &RepositoryStatus) -> String {
    if !status.exists {
        return config.paint(Style::new().dim(), "not cloned");
    }
    if let Some(error) = &status.error {
        return config.paint(Style::new().red(), &format!("error: {}", error));
    }

    let mut parts = Vec::new();
    if status.dirty == Some(true) {
        parts.push("modified");
    }
    if status.untracked == Some(true) {
        parts.push("untracked");
    }
    if parts.is_empty() {
        config.paint(Style::new().green(), emoji(config, "✓ clean", "clean"))
    } else {
        config.paint(Style::new().yellow(), &parts.join(", "))
    }
}

fn format_report(config: &OutputConfig, report: &SystemReport<RepositoryStatus>) -> String {
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
                cell(r.branch.as_deref()),
                state(config, r),
                cell(r.commit.as_deref()),
            ]
        })
        .collect();
    format!(
        "{}\n{}",
        title,
        render_table(&["REPOSITORY", "BRANCH", "STATE", "COMMIT"], &rows)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn status(name: &str, exists: bool) -> RepositoryStatus {
        RepositoryStatus {
            name: name.to_string(),
            url: format!("https://h/org/{}.git", name),
            path: PathBuf::from(name),
            exists,
            branch: None,
            dirty: None,
            untracked: None,
            commit: None,
            error: None,
        }
    }

    #[test]
    fn test_state_labels() {
        let config = OutputConfig::without_color();
        assert_eq!(state(&config, &status("a", false)), "not cloned");

        let mut clean = status("b", true);
        clean.dirty = Some(false);
        clean.untracked = Some(false);
        assert_eq!(state(&config, &clean), "clean");

        let mut busy = status("c", true);
        busy.dirty = Some(true);
        busy.untracked = Some(true);
        assert_eq!(state(&config, &busy), "modified, untracked");

        let mut broken = status("d", true);
        broken.error = Some("HEAD is detached".to_string());
        assert_eq!(state(&config, &broken), "error: HEAD is detached");
    }

    #[test]
    fn test_format_report_lists_every_repository() {
        let report = SystemReport {
            system: "shop".to_string(),
            repos: vec![status("api", false), status("web", false)],
            error: None,
        };
        let text = format_report(&OutputConfig::without_color(), &report);
        assert!(text.starts_with("shop\n"));
        assert!(text.contains("api"));
        assert!(text.contains("web"));
        assert_eq!(text.matches("not cloned").count(), 2);
    }
}
