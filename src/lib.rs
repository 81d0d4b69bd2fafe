//! Finding-to-fix remediation engine.
//!
//! Correlates externally detected vulnerability findings with a parsed,
//! mutable source unit and either applies a localized hardening edit or
//! explains why no edit could be made. "Could not fix, here is why" is a
//! first-class outcome, not an error.
//!
//! Boundaries: parsing into a unit and printing it back, fixer selection,
//! report aggregation across files, and file I/O all belong to the driver.
//! This crate is handed one already-parsed unit plus the findings for one
//! (file, rule) pair, works purely in memory, and returns a [`ScanResult`]
//! that partitions the findings into changes and unfixed entries.

pub mod engine;
pub mod errors;
pub mod model;
pub mod mutate;
pub mod rules;
pub mod unit;

pub use engine::{RegionPolicy, SearchSpec, Strategy, StrategyChain};
pub use errors::{Error, Result};
pub use model::{Change, Finding, FixFailure, FixOutcome, Rule, ScanResult, UnfixedFinding};
pub use unit::{NodeAnchor, ParsedUnit, TextEdit};

use tracing::warn;

/// Remediate one file's findings for one rule.
///
/// Findings are assumed pre-filtered by the driver to `path` and `rule`.
/// A rule with no registered fix family leaves every finding unfixed (data,
/// not an error); the `Err` channel only reports collaborator-contract
/// violations such as an edit batch that no longer fits the unit.
#[tracing::instrument(level = "debug", skip_all, fields(path = %path, rule = %rule.id, findings = findings.len()))]
pub fn remediate(
    unit: &mut ParsedUnit,
    path: &str,
    rule: &Rule,
    findings: &[Finding],
) -> Result<ScanResult> {
    match rules::family_for(&rule.id) {
        Some(family) => family.remediate(unit, path, findings),
        None => {
            warn!(rule = %rule.id, "no fix family registered");
            let mut aggregator = engine::aggregate::ResultAggregator::new(path);
            let reason = format!("no fix family registered for rule {}", rule.id);
            for finding in findings {
                aggregator.unfixed(finding, &reason);
            }
            Ok(aggregator.into_result())
        }
    }
}
