//! Detector-side input types.
//!
//! Findings are produced by an external vulnerability detector and arrive
//! already filtered to one file and one rule family. They are never mutated
//! here; the engine only decides which single outcome each finding maps to.
//!
//! Coordinate convention (fixed, do not change silently): `start_line` and
//! `end_line` are 1-based; `column` is a 0-based character column, matching
//! what tree-sitter reports for node positions.

use serde::{Deserialize, Serialize};

/// The rule a remediation call is running for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rule {
    /// Stable rule identifier (e.g. "S2755").
    pub id: String,
    /// Human-readable rule name for reports.
    pub name: String,
}

/// One externally detected vulnerability occurrence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finding {
    /// Stable key identifying this occurrence across scans.
    pub key: String,
    /// Rule identifier this finding was raised for.
    pub rule_id: String,
    /// Rule name, carried through for reporting.
    pub rule_name: String,
    /// 1-based line the detector reported.
    pub start_line: usize,
    /// Optional 1-based end line; absent when the detector reports a point.
    pub end_line: Option<usize>,
    /// Optional 0-based column; many detectors omit it.
    pub column: Option<usize>,
}

impl Finding {
    /// Convenience constructor for a line-only finding.
    pub fn at_line(key: impl Into<String>, rule: &Rule, line: usize) -> Self {
        Self {
            key: key.into(),
            rule_id: rule.id.clone(),
            rule_name: rule.name.clone(),
            start_line: line,
            end_line: None,
            column: None,
        }
    }

    /// Same as [`Finding::at_line`] with a 0-based column attached.
    pub fn at_point(key: impl Into<String>, rule: &Rule, line: usize, column: usize) -> Self {
        Self {
            column: Some(column),
            ..Self::at_line(key, rule, line)
        }
    }
}
