use log::{debug, warn};

use crate::prelude::OverlayError;

/// Collects per-item issues for a single pipeline call and mirrors them to
/// the `log` facade.
#[derive(Debug, Default)]
pub struct DiagnosticLog {
    stage: &'static str,
    issues: Vec<OverlayError>,
    processed: usize,
}

impl DiagnosticLog {
    pub fn new(stage: &'static str) -> Self {
        Self {
            stage,
            issues: Vec::new(),
            processed: 0,
        }
    }

    pub fn record(&self, message: &str) {
        debug!("[{}] {}", self.stage, message);
    }

    pub fn record_processed(&mut self) {
        self.processed += 1;
    }

    pub fn record_issue(&mut self, issue: OverlayError) {
        warn!("[{}] {}", self.stage, issue);
        self.issues.push(issue);
    }

    pub fn extend(&mut self, issues: impl IntoIterator<Item = OverlayError>) {
        for issue in issues {
            self.record_issue(issue);
        }
    }

    /// `(processed, issues)` counts so far.
    pub fn snapshot(&self) -> (usize, usize) {
        (self.processed, self.issues.len())
    }

    pub fn into_issues(self) -> Vec<OverlayError> {
        self.issues
    }
}
