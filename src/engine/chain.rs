//! Strategy chain remediation — the central algorithm.
//!
//! A family owns an ordered strategy list; for each finding the first
//! strategy whose search claims its location wins, and no later strategy
//! reconsiders it. Invariants:
//!
//! - *Ownership exclusivity*: a finding consumed by one strategy (resolved
//!   or unmatchable) is never revisited, so two strategies cannot both claim
//!   one call site and double-mutate it.
//! - *Totality*: every input finding ends in exactly one of
//!   `changes`/`unfixed`.
//! - *Determinism*: strategy order and candidate order are fixed inputs;
//!   identical input yields identical output.
//!
//! Edits from every `Fixed` outcome are planned against the pristine tree
//! and applied in a single batch after the loop. This is observably
//! equivalent to mutating per strategy, but immune to the line shifting an
//! early insertion would otherwise impose on later searches, and it lets
//! `ParsedUnit::apply_edits` enforce the non-overlap invariant in one place.

use crate::engine::aggregate::ResultAggregator;
use crate::engine::search::search;
use crate::engine::strategy::Strategy;
use crate::errors::Result;
use crate::model::{Finding, FixOutcome, ScanResult};
use crate::unit::{ParsedUnit, TextEdit};
use tracing::{debug, warn};

/// Reason attached to findings no strategy in the family recognized.
pub const NO_COVERAGE_REASON: &str = "unsupported code pattern";

/// Ordered strategies for one vulnerability family.
#[derive(Debug, Clone)]
pub struct StrategyChain {
    /// Rule id this family repairs.
    pub rule_id: &'static str,
    /// Priority order; first responsible strategy wins.
    pub strategies: Vec<Strategy>,
}

impl StrategyChain {
    /// Run the family over one file's findings.
    ///
    /// Findings are assumed pre-filtered to this file and rule by the
    /// driver. Single-threaded by design: AST mutation is not safe to
    /// parallelize within one tree.
    pub fn remediate(
        &self,
        unit: &mut ParsedUnit,
        path: &str,
        findings: &[Finding],
    ) -> Result<ScanResult> {
        let mut remaining: Vec<Finding> = findings.to_vec();
        let mut aggregator = ResultAggregator::new(path);
        let mut edits: Vec<TextEdit> = Vec::new();

        for strategy in &self.strategies {
            if remaining.is_empty() {
                break;
            }
            let pass = search(unit, &strategy.search, &remaining, false);
            debug!(
                strategy = strategy.name,
                candidates = pass.candidates.len(),
                unmatchable = pass.unmatchable.len(),
                untouched = pass.untouched.len(),
                "search pass"
            );

            let mut next_remaining = pass.untouched;

            for candidate in &pass.candidates {
                match (strategy.fix)(unit, &candidate.anchor) {
                    FixOutcome::Fixed(batch) => {
                        debug!(
                            strategy = strategy.name,
                            line = candidate.anchor.span.start_line(),
                            edits = batch.len(),
                            "fixed"
                        );
                        edits.extend(batch);
                        aggregator.fixed(candidate);
                    }
                    FixOutcome::FailedWithReason(reason) => {
                        debug!(
                            strategy = strategy.name,
                            line = candidate.anchor.span.start_line(),
                            %reason,
                            "recognized but not fixable"
                        );
                        aggregator.unfixed_candidate(candidate, reason);
                    }
                    FixOutcome::NotResponsible => {
                        // The shape filter already gated candidate search, so
                        // this indicates a strategy whose fix disagrees with
                        // its own match. Hand the findings back to the chain.
                        warn!(
                            strategy = strategy.name,
                            line = candidate.anchor.span.start_line(),
                            "fix declined a matched candidate"
                        );
                        next_remaining.extend(candidate.findings.iter().cloned());
                    }
                }
            }

            for (finding, reason) in &pass.unmatchable {
                aggregator.unfixed(finding, reason);
            }

            remaining = next_remaining;
        }

        for finding in &remaining {
            aggregator.unfixed(finding, NO_COVERAGE_REASON);
        }

        unit.apply_edits(edits)?;
        Ok(aggregator.into_result())
    }
}
