//! Shared mutation primitives.
//!
//! Strategies build their fixes from two operations: splicing hardening
//! statements next to an anchor statement, and deleting statements that
//! would negate the inserted guard. Both work in plan space ([`TextEdit`]),
//! so nothing touches the unit until the chain applies the whole batch.
//!
//! Statement granularity is whole lines: inserted guards reuse the anchor
//! line's indentation, and removals take the statement's full line range, so
//! surrounding formatting is untouched.

use crate::model::FixFailure;
use crate::unit::{ParsedUnit, TextEdit, dotted_name};
use tracing::trace;
use tree_sitter::Node;

// Node kinds whose direct children are statements.
const STATEMENT_CARRIERS: &[&str] = &["block", "module"];

/// Climb from `node` to the statement whose parent is a block (or the
/// module). Refuses to cross a lambda boundary: a lambda body has no
/// statement list to splice into.
pub fn enclosing_statement(node: Node<'_>) -> Result<Node<'_>, FixFailure> {
    let mut current = node;
    loop {
        if current.kind() == "lambda" {
            return Err(FixFailure::NoEnclosingBlock);
        }
        match current.parent() {
            Some(parent) if STATEMENT_CARRIERS.contains(&parent.kind()) => return Ok(current),
            Some(parent) => current = parent,
            None => return Err(FixFailure::NoEnclosingBlock),
        }
    }
}

/// Plan guard statements adjacent to `anchor_stmt`.
///
/// Each entry in `calls` is a method invocation suffix
/// (e.g. `setFeature(..., False)`); the spliced line is
/// `{indent}{variable}.{call}`. `before` selects the insertion side.
pub fn insert_hardening_statements(
    unit: &ParsedUnit,
    anchor_stmt: Node,
    variable: &str,
    calls: &[&str],
    before: bool,
) -> Vec<TextEdit> {
    let indent = unit.indent_at(anchor_stmt.start_byte());
    let at = if before {
        unit.line_start(anchor_stmt.start_byte())
    } else {
        unit.line_end(anchor_stmt.end_byte().saturating_sub(1))
    };

    let mut text = String::new();
    // Inserting past an unterminated final line: open our own line first and
    // leave the file unterminated, as it was.
    let unterminated_tail = at == unit.source().len() && !unit.source().ends_with('\n');
    if unterminated_tail {
        text.push('\n');
    }
    for call in calls {
        text.push_str(&format!("{indent}{variable}.{call}\n"));
    }
    if unterminated_tail {
        text.pop();
    }

    trace!(at, variable, n = calls.len(), "plan hardening insert");
    vec![TextEdit::insert(at, text)]
}

/// Plan removal of statements in the anchor's block that re-enable the
/// dangerous behavior on `variable`: calls to one of `methods` whose final
/// argument is the boolean literal `True`. Leaving them in place would
/// silently undo the inserted guard.
pub fn remove_contradicting_configuration(
    unit: &ParsedUnit,
    anchor_stmt: Node,
    variable: &str,
    methods: &[&str],
) -> Vec<TextEdit> {
    let Some(scope) = anchor_stmt.parent() else {
        return Vec::new();
    };

    let mut edits = Vec::new();
    for i in 0..scope.named_child_count() {
        let Some(stmt) = scope.named_child(i) else {
            continue;
        };
        if stmt.kind() != "expression_statement" {
            continue;
        }
        let Some(call) = stmt.named_child(0).filter(|n| n.kind() == "call") else {
            continue;
        };
        if !is_contradicting_call(unit, call, variable, methods) {
            continue;
        }
        let start = unit.line_start(stmt.start_byte());
        let end = unit.line_end(stmt.end_byte().saturating_sub(1));
        trace!(line = stmt.start_position().row + 1, variable, "plan contradiction removal");
        edits.push(TextEdit::delete(start, end));
    }
    edits
}

/// `variable.method(..., True)` with `method` in `methods`.
fn is_contradicting_call(
    unit: &ParsedUnit,
    call: Node,
    variable: &str,
    methods: &[&str],
) -> bool {
    let Some(function) = call.child_by_field_name("function") else {
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
    if object.kind() != "identifier"
        || unit.text_of(object) != variable
        || !methods.contains(&unit.text_of(attribute))
    {
        return false;
    }
    let Some(arguments) = call.child_by_field_name("arguments") else {
        return false;
    };
    let n = arguments.named_child_count();
    n > 0
        && arguments
            .named_child(n - 1)
            .is_some_and(|last| last.kind() == "true")
}

/// Nearest preceding assignment to `variable` among the anchor statement's
/// block siblings, returned as (statement, right-hand side).
pub fn preceding_assignment<'t>(
    unit: &ParsedUnit,
    anchor_stmt: Node<'t>,
    variable: &str,
) -> Option<(Node<'t>, Node<'t>)> {
    let scope = anchor_stmt.parent()?;
    let mut hit = None;
    for i in 0..scope.named_child_count() {
        let stmt = scope.named_child(i)?;
        if stmt.start_byte() >= anchor_stmt.start_byte() {
            break;
        }
        if stmt.kind() != "expression_statement" {
            continue;
        }
        let Some(assignment) = stmt.named_child(0).filter(|n| n.kind() == "assignment") else {
            continue;
        };
        let Some(left) = assignment.child_by_field_name("left") else {
            continue;
        };
        if left.kind() == "identifier" && unit.text_of(left) == variable {
            if let Some(right) = assignment.child_by_field_name("right") {
                hit = Some((stmt, right));
            }
        }
    }
    hit
}

/// Whether `node` is a call whose callee's dotted name is `name` or ends in
/// `.name`.
pub fn is_call_to(unit: &ParsedUnit, node: Node, name: &str) -> bool {
    if node.kind() != "call" {
        return false;
    }
    node.child_by_field_name("function")
        .and_then(|f| dotted_name(unit, f))
        .is_some_and(|dotted| dotted == name || dotted.ends_with(&format!(".{name}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::unit::ParsedUnit;

    const GUARDS: &[&str] = &["setFeature(handler.f_ges, False)"];

    fn call_node<'t>(unit: &'t ParsedUnit, nth: usize) -> Node<'t> {
        unit.collect_nodes(&["call"], |_, _| true)[nth]
    }

    #[test]
    fn guards_follow_the_anchor_with_its_indentation() {
        let unit = ParsedUnit::parse_python(
            "def load():\n    p = make_parser()\n    return p\n",
        )
        .unwrap();
        let stmt = enclosing_statement(call_node(&unit, 0)).unwrap();
        let edits = insert_hardening_statements(&unit, stmt, "p", GUARDS, false);
        assert_eq!(edits.len(), 1);
        let at = edits[0].start;
        assert_eq!(&unit.source()[..at], "def load():\n    p = make_parser()\n");
        assert_eq!(edits[0].replacement, "    p.setFeature(handler.f_ges, False)\n");
    }

    #[test]
    fn before_insertion_lands_on_the_anchor_line_start() {
        let unit = ParsedUnit::parse_python("p = make_parser()\np.parse(src)\n").unwrap();
        let stmt = enclosing_statement(call_node(&unit, 1)).unwrap();
        let edits = insert_hardening_statements(&unit, stmt, "p", GUARDS, true);
        assert_eq!(edits[0].start, unit.source().find("p.parse").unwrap());
    }

    #[test]
    fn unterminated_final_line_stays_unterminated() {
        let mut unit = ParsedUnit::parse_python("p = make_parser()").unwrap();
        let stmt = enclosing_statement(call_node(&unit, 0)).unwrap();
        let edits = insert_hardening_statements(&unit, stmt, "p", GUARDS, false);
        unit.apply_edits(edits).unwrap();
        assert_eq!(
            unit.source(),
            "p = make_parser()\np.setFeature(handler.f_ges, False)"
        );
    }

    #[test]
    fn lambda_bodies_have_no_enclosing_block() {
        let unit = ParsedUnit::parse_python("run = lambda src: p.parse(src)\n").unwrap();
        let inner = call_node(&unit, 0);
        assert_eq!(
            enclosing_statement(inner),
            Err(FixFailure::NoEnclosingBlock)
        );
    }

    #[test]
    fn contradicting_true_calls_are_removed_whole_line() {
        let source = "\
p = make_parser()
p.setFeature(handler.f_ges, True)
p.setFeature(handler.f_pes, False)
p.parse(src)
";
        let mut unit = ParsedUnit::parse_python(source).unwrap();
        let stmt = enclosing_statement(call_node(&unit, 0)).unwrap();
        let edits =
            remove_contradicting_configuration(&unit, stmt, "p", &["setFeature"]);
        assert_eq!(edits.len(), 1);
        unit.apply_edits(edits).unwrap();
        assert!(!unit.source().contains("True"));
        assert!(unit.source().contains("p.setFeature(handler.f_pes, False)"));
    }

    #[test]
    fn other_variables_are_left_alone() {
        let source = "p = make_parser()\nq.setFeature(handler.f_ges, True)\n";
        let unit = ParsedUnit::parse_python(source).unwrap();
        let stmt = enclosing_statement(call_node(&unit, 0)).unwrap();
        let edits =
            remove_contradicting_configuration(&unit, stmt, "p", &["setFeature"]);
        assert!(edits.is_empty());
    }

    #[test]
    fn preceding_assignment_picks_the_nearest_one() {
        let source = "p = old()\np = make_parser()\np.parse(src)\n";
        let unit = ParsedUnit::parse_python(source).unwrap();
        let parse_stmt = enclosing_statement(call_node(&unit, 2)).unwrap();
        let (_, rhs) = preceding_assignment(&unit, parse_stmt, "p").unwrap();
        assert!(is_call_to(&unit, rhs, "make_parser"));
    }

    #[test]
    fn call_tail_matching_accepts_qualified_names() {
        let unit = ParsedUnit::parse_python("a = xml.sax.make_parser()\nb = make_parser()\n")
            .unwrap();
        assert!(is_call_to(&unit, call_node(&unit, 0), "make_parser"));
        assert!(is_call_to(&unit, call_node(&unit, 1), "make_parser"));
        assert!(!is_call_to(&unit, call_node(&unit, 0), "parse"));
    }
}
