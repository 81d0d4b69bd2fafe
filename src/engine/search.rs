//! Candidate search: resolve reported locations to concrete AST nodes.
//!
//! Resolution is two-phase — lines first, then columns, and the column phase
//! only runs when the line alone is ambiguous. Requiring column agreement
//! unconditionally would break findings whose detector omits columns.
//!
//! The engine never guesses among structurally identical candidates:
//! ambiguity is always a failure, since a wrong pick could silently corrupt
//! unrelated code.

use crate::engine::region::{RegionPolicy, ReportedRegion};
use crate::model::Finding;
use crate::unit::{NodeAnchor, ParsedUnit, span_of};
use std::collections::BTreeMap;
use std::fmt;
use tracing::{debug, trace};

/// Shape predicate over a node: "is this a shape the strategy handles?".
pub type ShapeFilter = fn(&ParsedUnit, tree_sitter::Node) -> bool;

/// Search configuration owned by one strategy.
#[derive(Debug, Clone)]
pub struct SearchSpec {
    /// Node kinds of interest (tree-sitter grammar kinds).
    pub node_kinds: &'static [&'static str],
    /// Structural gate, side-effect free.
    pub shape: ShapeFilter,
    /// How node spans are compared against reported locations.
    pub policy: RegionPolicy,
}

/// One resolved AST location plus every finding that resolved to it.
///
/// Several findings land on one candidate only when the detector emitted
/// duplicates; the mutation is still applied exactly once per node.
#[derive(Debug, Clone)]
pub struct Candidate {
    pub anchor: NodeAnchor,
    pub findings: Vec<Finding>,
}

/// Why a finding consumed by a search could not be resolved to one node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnmatchReason {
    /// No eligible node at the reported location.
    NoEligibleNode,
    /// More than one equally valid node at the reported location.
    AmbiguousLocation,
}

impl fmt::Display for UnmatchReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoEligibleNode => write!(f, "no eligible node at the reported location"),
            Self::AmbiguousLocation => {
                write!(f, "multiple eligible nodes at the reported location, ambiguous")
            }
        }
    }
}

/// Outcome of one search pass over a finding set.
#[derive(Debug, Default)]
pub struct SearchResult {
    /// Resolved candidates in source order, findings grouped per node.
    pub candidates: Vec<Candidate>,
    /// Findings this search consumed without resolving.
    pub unmatchable: Vec<(Finding, UnmatchReason)>,
    /// Findings this search did not consume (no shape-eligible node on the
    /// reported line). Only populated when `strict` is off.
    pub untouched: Vec<Finding>,
}

/// Resolve `findings` against the nodes selected by `spec`.
///
/// `strict` controls what happens to a finding whose reported line hosts no
/// shape-eligible node at all: strict searches consume it as unmatchable
/// ("no eligible node"); non-strict searches (a chain interior pass) leave
/// it in `untouched` for a later strategy. A finding whose line *did* host
/// eligible nodes is always consumed, even when column narrowing then
/// eliminated every one of them — the strategy's node type occurred there,
/// so no other strategy may reinterpret that location.
pub fn search(
    unit: &ParsedUnit,
    spec: &SearchSpec,
    findings: &[Finding],
    strict: bool,
) -> SearchResult {
    let nodes = unit.collect_nodes(spec.node_kinds, spec.shape);
    trace!(eligible = nodes.len(), kinds = ?spec.node_kinds, "shape pass");

    // Findings grouped per resolved node, keyed by byte range for stable order.
    let mut grouped: BTreeMap<(usize, usize), Candidate> = BTreeMap::new();
    let mut result = SearchResult::default();

    for finding in findings {
        let line_only = ReportedRegion {
            start_line: finding.start_line,
            end_line: finding.end_line,
            column: None,
        };
        let on_line: Vec<_> = nodes
            .iter()
            .filter(|n| spec.policy.matches(&span_of(**n), &line_only))
            .collect();

        if on_line.is_empty() {
            if strict {
                result
                    .unmatchable
                    .push((finding.clone(), UnmatchReason::NoEligibleNode));
            } else {
                result.untouched.push(finding.clone());
            }
            continue;
        }

        // Column narrowing, only when the line alone is ambiguous.
        let narrowed: Vec<_> = match (on_line.len(), finding.column) {
            (2.., Some(col)) => on_line
                .into_iter()
                .filter(|n| span_of(**n).contains_point(finding.start_line - 1, col))
                .collect(),
            _ => on_line,
        };

        match narrowed.as_slice() {
            [] => {
                debug!(key = %finding.key, line = finding.start_line, "column eliminated all candidates");
                result
                    .unmatchable
                    .push((finding.clone(), UnmatchReason::NoEligibleNode));
            }
            [node] => {
                let key = (node.start_byte(), node.end_byte());
                grouped
                    .entry(key)
                    .or_insert_with(|| Candidate {
                        anchor: NodeAnchor::of(**node),
                        findings: Vec::new(),
                    })
                    .findings
                    .push(finding.clone());
            }
            _ => {
                debug!(key = %finding.key, line = finding.start_line, n = narrowed.len(), "ambiguous location");
                result
                    .unmatchable
                    .push((finding.clone(), UnmatchReason::AmbiguousLocation));
            }
        }
    }

    result.candidates = grouped.into_values().collect();
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Rule;
    use crate::unit::dotted_name;

    fn rule() -> Rule {
        Rule {
            id: "S2755".into(),
            name: "XXE".into(),
        }
    }

    fn is_make_parser(unit: &ParsedUnit, node: tree_sitter::Node) -> bool {
        node.child_by_field_name("function")
            .and_then(|f| dotted_name(unit, f))
            .is_some_and(|name| name == "make_parser" || name.ends_with(".make_parser"))
    }

    fn spec() -> SearchSpec {
        SearchSpec {
            node_kinds: &["call"],
            shape: is_make_parser,
            policy: RegionPolicy::StartOnly,
        }
    }

    #[test]
    fn resolves_a_single_node() {
        let unit = ParsedUnit::parse_python("p = xml.sax.make_parser()\np.parse(\"a\")\n").unwrap();
        let findings = vec![Finding::at_line("k1", &rule(), 1)];
        let res = search(&unit, &spec(), &findings, false);
        assert_eq!(res.candidates.len(), 1);
        assert!(res.unmatchable.is_empty());
        assert!(res.untouched.is_empty());
        assert_eq!(res.candidates[0].findings[0].key, "k1");
    }

    #[test]
    fn duplicate_findings_group_onto_one_candidate() {
        let unit = ParsedUnit::parse_python("p = xml.sax.make_parser()\n").unwrap();
        let findings = vec![
            Finding::at_line("k1", &rule(), 1),
            Finding::at_line("k2", &rule(), 1),
        ];
        let res = search(&unit, &spec(), &findings, false);
        assert_eq!(res.candidates.len(), 1);
        assert_eq!(res.candidates[0].findings.len(), 2);
    }

    #[test]
    fn two_nodes_on_one_line_without_column_is_ambiguous() {
        let unit =
            ParsedUnit::parse_python("a = xml.sax.make_parser(); b = xml.sax.make_parser()\n")
                .unwrap();
        let findings = vec![Finding::at_line("k1", &rule(), 1)];
        let res = search(&unit, &spec(), &findings, false);
        assert!(res.candidates.is_empty());
        assert_eq!(
            res.unmatchable,
            vec![(findings[0].clone(), UnmatchReason::AmbiguousLocation)]
        );
    }

    #[test]
    fn column_narrows_an_ambiguous_line() {
        let source = "a = xml.sax.make_parser(); b = xml.sax.make_parser()\n";
        let unit = ParsedUnit::parse_python(source).unwrap();
        let second_call = source.rfind("xml.sax").unwrap();
        let findings = vec![Finding::at_point("k1", &rule(), 1, second_call + 1)];
        let res = search(&unit, &spec(), &findings, false);
        assert_eq!(res.candidates.len(), 1);
        assert_eq!(res.candidates[0].anchor.span.start_col, second_call);
    }

    #[test]
    fn column_can_eliminate_every_candidate() {
        let unit =
            ParsedUnit::parse_python("a = xml.sax.make_parser(); b = xml.sax.make_parser()\n")
                .unwrap();
        // Column 0 points at `a`, inside neither call.
        let findings = vec![Finding::at_point("k1", &rule(), 1, 0)];
        let res = search(&unit, &spec(), &findings, false);
        assert_eq!(
            res.unmatchable,
            vec![(findings[0].clone(), UnmatchReason::NoEligibleNode)]
        );
    }

    #[test]
    fn strictness_decides_the_fate_of_unmatched_lines() {
        let unit = ParsedUnit::parse_python("p = xml.sax.make_parser()\n").unwrap();
        let findings = vec![Finding::at_line("k1", &rule(), 99)];

        let lax = search(&unit, &spec(), &findings, false);
        assert_eq!(lax.untouched, findings);
        assert!(lax.unmatchable.is_empty());

        let strict = search(&unit, &spec(), &findings, true);
        assert!(strict.untouched.is_empty());
        assert_eq!(
            strict.unmatchable,
            vec![(findings[0].clone(), UnmatchReason::NoEligibleNode)]
        );
    }
}
