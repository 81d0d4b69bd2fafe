//! Scan result aggregation.
//!
//! Collects per-finding outcomes into the `ScanResult` the driver consumes.
//! One `Change` per finding in a fixed candidate (a grouped candidate fans
//! out into several changes at the same line), one `UnfixedFinding` per
//! finding that stayed unfixed.

use crate::engine::search::Candidate;
use crate::model::{Change, Finding, ScanResult, UnfixedFinding};
use std::fmt::Display;

#[derive(Debug)]
pub struct ResultAggregator {
    path: String,
    result: ScanResult,
}

impl ResultAggregator {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            result: ScanResult::default(),
        }
    }

    /// Record a fixed candidate: one change per grouped finding, at the
    /// candidate node's line.
    pub fn fixed(&mut self, candidate: &Candidate) {
        let line = candidate.anchor.span.start_line();
        for finding in &candidate.findings {
            self.result.changes.push(Change {
                line,
                finding_key: finding.key.clone(),
            });
        }
    }

    /// Record one unfixed finding with a diagnostic reason.
    pub fn unfixed(&mut self, finding: &Finding, reason: impl Display) {
        self.result.unfixed.push(UnfixedFinding {
            finding_key: finding.key.clone(),
            rule_id: finding.rule_id.clone(),
            path: self.path.clone(),
            line: finding.start_line,
            reason: reason.to_string(),
        });
    }

    /// Record every finding of a candidate as unfixed with one shared reason.
    pub fn unfixed_candidate(&mut self, candidate: &Candidate, reason: impl Display) {
        let reason = reason.to_string();
        for finding in &candidate.findings {
            self.unfixed(finding, &reason);
        }
    }

    pub fn into_result(self) -> ScanResult {
        self.result
    }
}
