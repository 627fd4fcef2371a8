//! # Checkout Command Implementation
//!
//! Checks out the source branch of a code-review pull request in the local
//! clone of its repository. The bearer token comes from `--token` or from the
//! environment variable named in the settings file (`BITBUCKET_TOKEN` by
//! default).

use anyhow::Result;
use clap::Args;
use console::Style;
use std::env;

use pkm_tools::output::{emoji, OutputConfig};
use pkm_tools::pull_request::{CheckoutResult, PullRequestResolver, RestReviewApi};
use pkm_tools::suggestions;

use super::{print_json, Context};

/// Check out the source branch of a pull request
#[derive(Args, Debug)]
pub struct CheckoutArgs {
    /// Pull request URL, e.g. https://host/projects/KEY/repos/repo/pull-requests/42
    #[arg(value_name = "PR_URL")]
    pub url: String,

    /// Bearer token for the code-review server (overrides the environment)
    #[arg(long, value_name = "TOKEN")]
    pub token: Option<String>,

    /// Print the result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Execute the `checkout` command.
pub fn execute(ctx: &Context, args: CheckoutArgs) -> Result<()> {
    let config = ctx.load_config()?;
    let token = args
        .token
        .or_else(|| env::var(&config.review().token_env).ok());

    let api = RestReviewApi::new();
    let result = PullRequestResolver::new(&config, &api)
        .checkout(&args.url, token.as_deref())
        .map_err(suggestions::explain)?;

    if args.json {
        return print_json(&result);
    }
    println!("{}", format_checkout(&ctx.output, &result));
    Ok(())
}

fn format_checkout(config: &OutputConfig, result: &CheckoutResult) -> String {
    let pr = &result.pull_request;
    let how = if result.created {
        "new tracking branch"
    } else {
        "existing branch updated"
    };
    let headline = format!(
        "{} Checked out {} in {}/{} ({})",
        emoji(config, "✓", "OK"),
        result.branch,
        result.system,
        result.repo,
        how
    );

    [
        config.paint(Style::new().green().bold(), &headline),
        format!("  Pull request #{}: {}", pr.id, pr.title),
        format!("  Author: {}", pr.author),
        format!("  {} -> {}", pr.source_branch, pr.target_branch),
        format!("  Path: {}", result.path.display()),
    ]
    .join("\n")
}
