//! # List Commands
//!
//! `list-systems` prints the systems discovered under the PKM root;
//! `list-repos` prints the repositories each system is configured with and
//! whether they are cloned. Both are read-only.

use anyhow::Result;
use clap::Args;
use serde::Serialize;
use std::path::PathBuf;

use pkm_tools::config::Config;
use pkm_tools::output::render_table;
use pkm_tools::suggestions;

use super::{print_json, Context, SystemSelector};

/// List the systems under the PKM root
#[derive(Args, Debug)]
pub struct ListSystemsArgs {
    /// Print the systems as a JSON array
    #[arg(long)]
    pub json: bool,
}

/// List the repositories configured for a system
#[derive(Args, Debug)]
pub struct ListReposArgs {
    /// System to list, or "all"
    #[arg(short, long, value_name = "SYSTEM", default_value = "all")]
    pub system: SystemSelector,

    /// Print the repositories as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Serialize)]
struct RepoListing {
    system: String,
    name: String,
    url: String,
    path: PathBuf,
    cloned: bool,
}

/// Execute the `list-systems` command.
pub fn execute_systems(ctx: &Context, args: ListSystemsArgs) -> Result<()> {
    let config = ctx.load_config()?;
    let systems = config.list_systems()?;

    if args.json {
        return print_json(&systems);
    }
    if systems.is_empty() {
        eprintln!("{}", suggestions::no_systems_found(config.systems_dir()));
    }
    for system in systems {
        println!("{}", system);
    }
    Ok(())
}

/// Execute the `list-repos` command.
pub fn execute_repos(ctx: &Context, args: ListReposArgs) -> Result<()> {
    let config = ctx.load_config()?;

    let listings = match args.system {
        SystemSelector::All => {
            let mut listings = Vec::new();
            for system in config.list_systems()? {
                match listings_for(&config, &system) {
                    Ok(mut found) => listings.append(&mut found),
                    Err(e) => log::warn!("Skipping system {}: {}", system, e),
                }
            }
            listings
        }
        SystemSelector::Named(name) => {
            let system = ctx.resolve_system(&config, &name)?;
            listings_for(&config, &system).map_err(suggestions::explain)?
        }
    };

    if args.json {
        return print_json(&listings);
    }
    let rows: Vec<Vec<String>> = listings
        .iter()
        .map(|l| {
            vec![
                l.system.clone(),
                l.name.clone(),
                if l.cloned { "yes" } else { "no" }.to_string(),
                l.url.clone(),
            ]
        })
        .collect();
    println!(
        "{}",
        render_table(&["SYSTEM", "REPOSITORY", "CLONED", "URL"], &rows)
    );
    Ok(())
}

fn listings_for(config: &Config, system: &str) -> pkm_tools::error::Result<Vec<RepoListing>> {
    let repos_dir = config.repositories_dir(system)?;
    Ok(config
        .system_entries(system)?
        .into_iter()
        .map(|entry| {
            let path = repos_dir.join(&entry.name);
            RepoListing {
                system: system.to_string(),
                cloned: path.exists(),
                name: entry.name,
                url: entry.url,
                path,
            }
        })
        .collect())
}
