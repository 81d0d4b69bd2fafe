//! Fix strategies.
//!
//! One strategy handles one concrete vulnerable-code shape within a family.
//! Instead of a subclass per shape, a strategy is a value: its candidate
//! search configuration (kinds + shape predicate + region policy) plus a fix
//! routine. The shape predicate is the fast structural `match`; the fix
//! routine may still discover a deeper reason to decline and report it as
//! `FailedWithReason` — "recognized the pattern, but a safe mutation was not
//! derivable".
//!
//! A fix routine only *plans* edits; it never splices the unit itself, so a
//! strategy that did not report `Fixed` cannot have mutated anything.

use crate::engine::search::SearchSpec;
use crate::model::FixOutcome;
use crate::unit::{NodeAnchor, ParsedUnit};

/// Fix routine: plan edits for one anchored candidate node.
pub type FixFn = fn(&ParsedUnit, &NodeAnchor) -> FixOutcome;

/// One (match, fix) pair for one vulnerable-code shape.
#[derive(Debug, Clone)]
pub struct Strategy {
    /// Short name used in logs.
    pub name: &'static str,
    /// Candidate search configuration; its shape predicate is the `match`.
    pub search: SearchSpec,
    /// Mutation planner, invoked only for nodes the shape predicate passed.
    pub fix: FixFn,
}
