//! Progress reporting seam.
//!
//! The lifecycle manager announces each repository action through a
//! [`Reporter`] it is given, instead of printing. The CLI plugs in a
//! terminal spinner ([`crate::output::SpinnerReporter`]); tests and JSON
//! output use [`NoopReporter`] or their own recorder.

use crate::sync::{Operation, RepoResult, SystemResult};

/// Receives progress events from batch operations.
pub trait Reporter {
    /// An action on one repository is about to start.
    fn start_operation(&self, operation: Operation, system: &str, repo: &str);

    /// The action on one repository finished, successfully or not.
    fn finish_operation(&self, operation: Operation, system: &str, result: &RepoResult);

    /// A whole system has been processed.
    fn emit_result(&self, result: &SystemResult);
}

/// A reporter that ignores every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopReporter;

impl Reporter for NoopReporter {
    fn start_operation(&self, _operation: Operation, _system: &str, _repo: &str) {}

    fn finish_operation(&self, _operation: Operation, _system: &str, _result: &RepoResult) {}

    fn emit_result(&self, _result: &SystemResult) {}
}
