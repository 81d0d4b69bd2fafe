//! Outcome types: what a strategy reports, and what the driver receives.
//!
//! `FixOutcome` is the only channel a strategy uses to communicate a result.
//! `Fixed` carries the planned edit batch, so a strategy that did not report
//! `Fixed` cannot have produced edits — the illegal states of the
//! two-booleans-plus-nullable-reason encoding are unrepresentable here.

use crate::unit::TextEdit;
use serde::Serialize;
use std::fmt;

/// Result of one strategy's `fix` attempt on one candidate node.
#[derive(Debug)]
pub enum FixOutcome {
    /// The node is not a shape this strategy handles. Never reached through
    /// candidate search (its shape filter already gated), but part of the
    /// strategy contract for direct callers.
    NotResponsible,
    /// The pattern was fixed; the payload is the edit batch to apply.
    Fixed(Vec<TextEdit>),
    /// The pattern was recognized, but a safe mutation was not derivable.
    FailedWithReason(FixFailure),
}

/// Why a recognized pattern could not be fixed.
///
/// The `Display` impls below are the canonical reason strings surfaced in
/// [`UnfixedFinding::reason`]; tests assert against them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FixFailure {
    /// The anchor has no block ancestor to splice statements into
    /// (e.g. it lives in a lambda body).
    NoEnclosingBlock,
    /// The anchor node could not be relocated in the parsed unit.
    AnchorLost,
    /// The construction result is not bound to a plain variable.
    NotASimpleVariable,
    /// No declaration of the named variable was found in the enclosing block.
    UnresolvedDeclaration(String),
    /// A declaration was found but its initializer is not a construction the
    /// family knows how to harden.
    UnclassifiedConstruction(String),
    /// The factory call result is consumed inline, with no variable to
    /// attach hardening calls to.
    InlineFactoryConsumption,
}

impl fmt::Display for FixFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoEnclosingBlock => write!(f, "no enclosing block found for anchor"),
            Self::AnchorLost => write!(f, "anchor node no longer present in the parsed unit"),
            Self::NotASimpleVariable => {
                write!(f, "construction result is not assigned to a simple variable")
            }
            Self::UnresolvedDeclaration(var) => write!(
                f,
                "no resolvable declaration for variable `{var}` in the enclosing block"
            ),
            Self::UnclassifiedConstruction(var) => {
                write!(f, "could not classify the construction of variable `{var}`")
            }
            Self::InlineFactoryConsumption => write!(
                f,
                "factory result is consumed inline; no variable to attach hardening calls to"
            ),
        }
    }
}

/// One successfully repaired finding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Change {
    /// 1-based line of the fixed node.
    pub line: usize,
    /// Key of the finding this change repairs.
    pub finding_key: String,
}

/// One finding that could not be repaired, with the reason why.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnfixedFinding {
    pub finding_key: String,
    pub rule_id: String,
    /// Repo-relative path of the processed file.
    pub path: String,
    /// 1-based line the detector reported.
    pub line: usize,
    /// Human-readable diagnostic, one of the canonical reason strings.
    pub reason: String,
}

/// Result of one `remediate` call.
///
/// Completeness invariant: every input finding appears in exactly one of the
/// two lists, so `changes.len() + unfixed.len()` equals the input size.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ScanResult {
    pub changes: Vec<Change>,
    pub unfixed: Vec<UnfixedFinding>,
}

impl ScanResult {
    /// Total number of findings this result accounts for.
    pub fn total(&self) -> usize {
        self.changes.len() + self.unfixed.len()
    }

    /// Fold another per-call result into this one (driver-side merging of
    /// several rule families over the same file).
    pub fn merge(&mut self, other: ScanResult) {
        self.changes.extend(other.changes);
        self.unfixed.extend(other.unfixed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reason_strings_are_stable() {
        assert_eq!(
            FixFailure::NoEnclosingBlock.to_string(),
            "no enclosing block found for anchor"
        );
        assert_eq!(
            FixFailure::UnresolvedDeclaration("p".into()).to_string(),
            "no resolvable declaration for variable `p` in the enclosing block"
        );
    }

    #[test]
    fn merge_accumulates_both_sides() {
        let mut a = ScanResult::default();
        a.changes.push(Change {
            line: 3,
            finding_key: "k1".into(),
        });
        let mut b = ScanResult::default();
        b.unfixed.push(UnfixedFinding {
            finding_key: "k2".into(),
            rule_id: "S2755".into(),
            path: "app.py".into(),
            line: 9,
            reason: "no enclosing block found for anchor".into(),
        });
        a.merge(b);
        assert_eq!(a.total(), 2);
    }
}
