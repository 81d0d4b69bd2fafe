//! XML external entity expansion (XXE) family for Python `xml.sax`.
//!
//! Rule S2755: XML parsers should not be vulnerable to XXE attacks.
//!
//! A parser built with `xml.sax.make_parser()` resolves external general and
//! parameter entities by default. The repair disables both right where the
//! parser comes into existence:
//!
//! ```python
//! parser = xml.sax.make_parser()
//! parser.setFeature(xml.sax.handler.feature_external_ges, False)
//! parser.setFeature(xml.sax.handler.feature_external_pes, False)
//! ```
//!
//! Strategies in priority order, each anchored to a different call shape of
//! the same family:
//! 1. the factory-construction assignment itself,
//! 2. a parse-time call on a parser variable (construction resolved through
//!    the enclosing block),
//! 3. a factory call consumed inline as an argument — recognized, but there
//!    is no variable to attach the hardening calls to.
//!
//! Strategies test only "is this the known vulnerable shape", not "was this
//! already guarded"; re-running against already-fixed code re-inserts the
//! guards. See DESIGN.md for why that stays as is.

use crate::engine::{RegionPolicy, SearchSpec, Strategy, StrategyChain};
use crate::model::{FixFailure, FixOutcome};
use crate::mutate::{
    enclosing_statement, insert_hardening_statements, is_call_to, preceding_assignment,
    remove_contradicting_configuration,
};
use crate::unit::{NodeAnchor, ParsedUnit};
use tree_sitter::Node;

pub const RULE_ID: &str = "S2755";

/// Factory entry point of the `xml.sax` API.
const FACTORY: &str = "make_parser";

/// Hardening calls appended to the anchor variable, in insertion order.
const HARDENING_CALLS: &[&str] = &[
    "setFeature(xml.sax.handler.feature_external_ges, False)",
    "setFeature(xml.sax.handler.feature_external_pes, False)",
];

/// Methods whose `..., True` form re-enables the dangerous behavior.
const CONTRADICTING_METHODS: &[&str] = &["setFeature"];

/// The ordered strategy chain for this family.
pub fn family() -> StrategyChain {
    StrategyChain {
        rule_id: RULE_ID,
        strategies: vec![
            Strategy {
                name: "sax-factory-construction",
                search: SearchSpec {
                    node_kinds: &["call"],
                    shape: factory_assignment_shape,
                    policy: RegionPolicy::StartOnly,
                },
                fix: fix_factory_assignment,
            },
            Strategy {
                name: "sax-parse-call",
                search: SearchSpec {
                    node_kinds: &["call"],
                    shape: parse_call_shape,
                    policy: RegionPolicy::StartOnly,
                },
                fix: fix_parse_call,
            },
            Strategy {
                name: "sax-inline-factory",
                search: SearchSpec {
                    node_kinds: &["call"],
                    shape: inline_factory_shape,
                    policy: RegionPolicy::StartOnly,
                },
                fix: fix_inline_factory,
            },
        ],
    }
}

// ---------- shapes ----------

/// `v = [xml.sax.]make_parser()` — the factory call on an assignment's RHS.
fn factory_assignment_shape(unit: &ParsedUnit, node: Node) -> bool {
    is_call_to(unit, node, FACTORY)
        && node
            .parent()
            .is_some_and(|p| p.kind() == "assignment")
}

/// `v.parse(...)` / `v.parseString(...)` on a plain variable.
fn parse_call_shape(unit: &ParsedUnit, node: Node) -> bool {
    let Some(function) = node.child_by_field_name("function") else {
        return false;
    };
    if function.kind() != "attribute" {
        return false;
    }
    let (Some(object), Some(attribute)) = (
        function.child_by_field_name("object"),
        function.child_by_field_name("attribute"),
    ) else {
        return false;
    };
    object.kind() == "identifier"
        && matches!(unit.text_of(attribute), "parse" | "parseString")
}

/// `[xml.sax.]make_parser()` consumed directly as a call argument.
fn inline_factory_shape(unit: &ParsedUnit, node: Node) -> bool {
    is_call_to(unit, node, FACTORY)
        && node
            .parent()
            .is_some_and(|p| p.kind() == "argument_list")
}

// ---------- fixes ----------

/// Guard right after the construction statement and drop contradicting
/// `setFeature(..., True)` calls in the same block.
fn fix_factory_assignment(unit: &ParsedUnit, anchor: &NodeAnchor) -> FixOutcome {
    let Some(node) = unit.node_at(anchor) else {
        return FixOutcome::FailedWithReason(FixFailure::AnchorLost);
    };
    let assignment = match node.parent() {
        Some(p) if p.kind() == "assignment" => p,
        _ => return FixOutcome::NotResponsible,
    };
    let variable = match assignment.child_by_field_name("left") {
        Some(left) if left.kind() == "identifier" => unit.text_of(left).to_string(),
        _ => return FixOutcome::FailedWithReason(FixFailure::NotASimpleVariable),
    };
    let stmt = match enclosing_statement(node) {
        Ok(stmt) => stmt,
        Err(failure) => return FixOutcome::FailedWithReason(failure),
    };

    let mut edits = remove_contradicting_configuration(unit, stmt, &variable, CONTRADICTING_METHODS);
    edits.extend(insert_hardening_statements(
        unit,
        stmt,
        &variable,
        HARDENING_CALLS,
        false,
    ));
    FixOutcome::Fixed(edits)
}

/// Resolve the parser variable's construction in the enclosing block and
/// guard there. The parse call itself stays untouched.
fn fix_parse_call(unit: &ParsedUnit, anchor: &NodeAnchor) -> FixOutcome {
    let Some(node) = unit.node_at(anchor) else {
        return FixOutcome::FailedWithReason(FixFailure::AnchorLost);
    };
    let variable = match node
        .child_by_field_name("function")
        .and_then(|f| f.child_by_field_name("object"))
    {
        Some(object) if object.kind() == "identifier" => unit.text_of(object).to_string(),
        _ => return FixOutcome::NotResponsible,
    };
    let parse_stmt = match enclosing_statement(node) {
        Ok(stmt) => stmt,
        Err(failure) => return FixOutcome::FailedWithReason(failure),
    };
    let Some((decl_stmt, rhs)) = preceding_assignment(unit, parse_stmt, &variable) else {
        return FixOutcome::FailedWithReason(FixFailure::UnresolvedDeclaration(variable));
    };
    if !is_call_to(unit, rhs, FACTORY) {
        return FixOutcome::FailedWithReason(FixFailure::UnclassifiedConstruction(variable));
    }

    let mut edits =
        remove_contradicting_configuration(unit, parse_stmt, &variable, CONTRADICTING_METHODS);
    edits.extend(insert_hardening_statements(
        unit,
        decl_stmt,
        &variable,
        HARDENING_CALLS,
        false,
    ));
    FixOutcome::Fixed(edits)
}

/// The factory result never touches a variable, so there is nothing to
/// anchor the hardening calls to. Recognized, not derivable.
fn fix_inline_factory(unit: &ParsedUnit, anchor: &NodeAnchor) -> FixOutcome {
    if unit.node_at(anchor).is_none() {
        return FixOutcome::FailedWithReason(FixFailure::AnchorLost);
    }
    FixOutcome::FailedWithReason(FixFailure::InlineFactoryConsumption)
}
