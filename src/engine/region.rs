//! Region matching policies.
//!
//! One shared answer to "does this node's span satisfy the reported
//! location?", used by every strategy and by unrelated finding-driven
//! codemods alike. Detector lines are 1-based; the conversion from 0-based
//! node rows happens here and nowhere else.

use crate::model::Span;

/// What the detector reported for one finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportedRegion {
    /// 1-based start line.
    pub start_line: usize,
    /// Optional 1-based end line; point reports leave it out.
    pub end_line: Option<usize>,
    /// Optional 0-based column.
    pub column: Option<usize>,
}

impl ReportedRegion {
    pub fn line(start_line: usize) -> Self {
        Self {
            start_line,
            end_line: None,
            column: None,
        }
    }
}

/// How strictly a node span must agree with a reported region.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegionPolicy {
    /// All reported bounds must coincide with the span.
    Exact,
    /// Start line (and column, when reported) must coincide.
    StartOnly,
    /// The line ranges must intersect.
    Overlap,
}

impl RegionPolicy {
    /// Whether `span` satisfies `reported` under this policy. Pure.
    pub fn matches(&self, span: &Span, reported: &ReportedRegion) -> bool {
        let reported_end = reported.end_line.unwrap_or(reported.start_line);
        match self {
            Self::Exact => {
                span.start_line() == reported.start_line
                    && span.end_line() == reported_end
                    && reported.column.is_none_or(|c| span.start_col == c)
            }
            Self::StartOnly => {
                span.start_line() == reported.start_line
                    && reported.column.is_none_or(|c| span.start_col == c)
            }
            Self::Overlap => {
                span.start_line() <= reported_end && span.end_line() >= reported.start_line
            }
        }
    }
}
