//! # Output
//!
//! Terminal presentation for the `pkm` binary: colour detection, a spinner
//! that follows batch progress, and plain-text tables.
//!
//! ## Respecting User Preferences
//!
//! The module respects the following environment variables and flags:
//! - `--color=never|always|auto` - CLI flag for color control
//! - `NO_COLOR` - Disables colors when set (per https://no-color.org/)
//! - `CLICOLOR=0` - Disables colors
//! - `CLICOLOR_FORCE=1` - Forces colors even in non-TTY
//! - `TERM=dumb` - Disables colors for dumb terminals
//!
//! ## Usage
//!
//! ```rust,ignore
//! use pkm_tools::output::{OutputConfig, SpinnerReporter};
//!
//! let output = OutputConfig::from_env_and_flag("auto");
//! let reporter = SpinnerReporter::new(output);
//! let manager = RepositorySync::new(&config).with_reporter(&reporter);
//! ```

use console::{measure_text_width, pad_str, Alignment, Style};
use indicatif::{ProgressBar, ProgressStyle};
use std::cell::RefCell;
use std::env;
use std::time::Duration;

use crate::reporter::Reporter;
use crate::sync::{Action, AllSystemsResult, Operation, RepoOutcome, RepoResult, SystemResult};

const SPINNER_CHARS: &str = "⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏ ";

/// Output configuration for controlling colors and emojis.
#[derive(Debug, Clone, Copy)]
pub struct OutputConfig {
    /// Whether colors and emojis should be used in output.
    pub use_color: bool,
}

impl OutputConfig {
    /// Create an output configuration from environment and CLI flag.
    ///
    /// # Arguments
    /// * `color_flag` - The value of the --color CLI flag: "always", "never", or "auto"
    ///
    /// In auto mode, colors are disabled if:
    /// - `NO_COLOR` environment variable is set (any value, including empty)
    /// - `CLICOLOR=0` is set
    /// - `TERM=dumb` is set
    /// - stdout is not a TTY (unless `CLICOLOR_FORCE=1`)
    pub fn from_env_and_flag(color_flag: &str) -> Self {
        let use_color = match color_flag.to_lowercase().as_str() {
            "always" => true,
            "never" => false,
            _ => Self::detect_color_support(),
        };

        Self { use_color }
    }

    fn detect_color_support() -> bool {
        // The presence of the variable (even if empty) disables colors
        if env::var_os("NO_COLOR").is_some() {
            return false;
        }

        if env::var("CLICOLOR").is_ok_and(|v| v == "0") {
            return false;
        }

        if env::var("CLICOLOR_FORCE").is_ok_and(|v| v != "0" && !v.is_empty()) {
            return true;
        }

        if env::var("TERM").is_ok_and(|v| v == "dumb") {
            return false;
        }

        console::Term::stdout().features().colors_supported()
    }

    pub fn with_color() -> Self {
        Self { use_color: true }
    }

    pub fn without_color() -> Self {
        Self { use_color: false }
    }

    /// Apply `style` to `text` when colors are enabled.
    pub fn paint(&self, style: Style, text: &str) -> String {
        style.force_styling(self.use_color).apply_to(text).to_string()
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self::from_env_and_flag("auto")
    }
}

/// Returns the emoji when colors are enabled, the plain text otherwise.
pub fn emoji<'a>(config: &OutputConfig, emoji_str: &'a str, plain: &'a str) -> &'a str {
    if config.use_color {
        emoji_str
    } else {
        plain
    }
}

/// Render rows as a left-aligned table with a header and a rule.
///
/// Column widths are measured ignoring ANSI escapes, so painted cells line
/// up.
pub fn render_table(headers: &[&str], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = headers.iter().map(|h| measure_text_width(h)).collect();
    for row in rows {
        for (i, cell) in row.iter().enumerate() {
            if let Some(width) = widths.get_mut(i) {
                *width = (*width).max(measure_text_width(cell));
            }
        }
    }

    let format_row = |cells: Vec<&str>| -> String {
        cells
            .iter()
            .zip(&widths)
            .map(|(cell, width)| pad_str(cell, *width, Alignment::Left, None).into_owned())
            .collect::<Vec<_>>()
            .join("  ")
            .trim_end()
            .to_string()
    };

    let mut lines = Vec::with_capacity(rows.len() + 2);
    lines.push(format_row(headers.to_vec()));
    lines.push(
        widths
            .iter()
            .map(|w| "-".repeat(*w))
            .collect::<Vec<_>>()
            .join("  "),
    );
    for row in rows {
        lines.push(format_row(row.iter().map(String::as_str).collect()));
    }
    lines.join("\n")
}

/// Status cell for one repository result.
pub fn outcome_label(config: &OutputConfig, outcome: &RepoOutcome) -> String {
    match outcome {
        RepoOutcome::Success { action, .. } => {
            let text = format!("{} {}", emoji(config, "✓", "ok"), action);
            config.paint(Style::new().green(), &text)
        }
        RepoOutcome::Failed { kind, .. } => {
            let text = format!("{} {}", emoji(config, "✗", "FAILED"), kind);
            config.paint(Style::new().red(), &text)
        }
    }
}

fn detail(result: &RepoResult) -> String {
    match &result.outcome {
        RepoOutcome::Success {
            action: Action::Synced,
            ..
        } => "new commits pulled".to_string(),
        RepoOutcome::Success { .. } => String::new(),
        RepoOutcome::Failed { error, .. } => error.lines().next().unwrap_or_default().to_string(),
    }
}

/// Table and summary line for one system's results.
pub fn format_system_result(config: &OutputConfig, result: &SystemResult) -> String {
    let title = config.paint(
        Style::new().bold(),
        &format!("{} {}", capitalize(&result.operation.to_string()), result.system),
    );

    if let Some(error) = &result.error {
        return format!(
            "{}\n{} {}",
            title,
            config.paint(Style::new().red(), emoji(config, "✗", "ERROR")),
            error
        );
    }
    if result.repos.is_empty() {
        return format!("{}\n(no repositories configured)", title);
    }

    let rows: Vec<Vec<String>> = result
        .repos
        .iter()
        .map(|r| vec![r.name.clone(), outcome_label(config, &r.outcome), detail(r)])
        .collect();

    format!(
        "{}\n{}\n{}",
        title,
        render_table(&["REPOSITORY", "RESULT", "DETAIL"], &rows),
        summary_line(
            result.operation,
            result.succeeded(),
            result.failed(),
            result.changed()
        )
    )
}

/// Totals line for an all-systems run.
pub fn format_all_systems_summary(result: &AllSystemsResult) -> String {
    let changed: usize = result.systems.iter().map(SystemResult::changed).sum();
    let mut line = format!(
        "{} systems: {}",
        result.systems.len(),
        summary_line(result.operation, result.succeeded(), result.failed(), changed)
    );
    if result.system_errors() > 0 {
        line.push_str(&format!(", {} system(s) could not be read", result.system_errors()));
    }
    line
}

fn summary_line(operation: Operation, succeeded: usize, failed: usize, changed: usize) -> String {
    format!(
        "{}: {} succeeded, {} failed, {} changed",
        operation.past(),
        succeeded,
        failed,
        changed
    )
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// [`Reporter`] showing a spinner per repository and printing each system's
/// table when it completes.
///
/// The spinner draws on stderr and hides itself when stderr is not a
/// terminal; tables go to stdout.
pub struct SpinnerReporter {
    config: OutputConfig,
    spinner: RefCell<Option<ProgressBar>>,
}

impl SpinnerReporter {
    pub fn new(config: OutputConfig) -> Self {
        Self {
            config,
            spinner: RefCell::new(None),
        }
    }

    fn style(&self) -> ProgressStyle {
        let template = if self.config.use_color {
            "{spinner:.cyan} {msg}"
        } else {
            "{spinner} {msg}"
        };
        ProgressStyle::default_spinner()
            .tick_chars(SPINNER_CHARS)
            .template(template)
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
    }

    fn clear(&self) {
        if let Some(spinner) = self.spinner.borrow_mut().take() {
            spinner.finish_and_clear();
        }
    }
}

impl Reporter for SpinnerReporter {
    fn start_operation(&self, operation: Operation, system: &str, repo: &str) {
        self.clear();
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(self.style());
        spinner.set_message(format!("{} {}/{}", operation.progressive(), system, repo));
        spinner.enable_steady_tick(Duration::from_millis(80));
        *self.spinner.borrow_mut() = Some(spinner);
    }

    fn finish_operation(&self, _operation: Operation, _system: &str, _result: &RepoResult) {
        self.clear();
    }

    fn emit_result(&self, result: &SystemResult) {
        self.clear();
        println!("{}\n", format_system_result(&self.config, result));
    }
}

impl Drop for SpinnerReporter {
    fn drop(&mut self) {
        self.clear();
    }
}
