//! Statement walk that discovers `t.Run` registration calls.
//!
//! While descending a function body the walk accumulates a chain of
//! declaration facts: iteration bindings introduced by `for … range` loops
//! and table declarations (a named slice/map-of-struct composite literal
//! assigned earlier in the same scope). The chain is extended per branch and
//! never leaks sideways between sibling branches or upward to the caller.

use tree_sitter::Node;

use super::node_text;
use super::resolve::{classify, UnresolvedSubTest};

/// One declaration fact visible at a call site.
#[derive(Debug, Clone)]
pub(crate) enum Context<'tree> {
    /// `for key, value := range source`, all three plain identifiers.
    Iteration {
        key_ident: String,
        value_ident: String,
        source_ident: String,
    },
    /// `ident := []T{...}` or `ident := map[K]V{...}`. The composite literal
    /// node is kept so field extraction can walk its rows on demand.
    Table { ident: String, literal: Node<'tree> },
}

/// Walks a block's statement list and yields one record per registration
/// call, with nested discoveries attached.
pub(crate) fn find_sub_tests<'tree>(
    block: Node<'tree>,
    src: &[u8],
    chain: &[Context<'tree>],
) -> Vec<UnresolvedSubTest> {
    // Own copy: table declarations extend the chain for the statements that
    // follow them, but nothing escapes back to the caller.
    let mut chain = chain.to_vec();
    let mut subs = Vec::new();
    let mut cursor = block.walk();
    for stmt in block.named_children(&mut cursor) {
        match stmt.kind() {
            // A `t.Run(...)` line sits inside an expression_statement
            // wrapper; the call itself is its single named child.
            "expression_statement" => {
                let Some(expr) = stmt.named_child(0) else {
                    continue;
                };
                if expr.kind() != "call_expression" {
                    continue;
                }
                if let Some(sub) = sub_test_from_call(expr, src, &chain) {
                    subs.push(sub);
                }
            }
            "block" => {
                subs.extend(find_sub_tests(stmt, src, &chain));
            }
            "for_statement" => {
                let Some(body) = stmt.child_by_field_name("body") else {
                    continue;
                };
                if let Some(ctx) = iteration_context(stmt, src) {
                    let mut extended = chain.clone();
                    extended.push(ctx);
                    subs.extend(find_sub_tests(body, src, &extended));
                } else {
                    // Counting loop: the loop variable is not tied to a named
                    // collection, so no binding is registered.
                    subs.extend(find_sub_tests(body, src, &chain));
                }
            }
            "short_var_declaration" | "assignment_statement" => {
                if let Some(ctx) = table_from_assignment(stmt, src) {
                    chain.push(ctx);
                }
            }
            "var_declaration" => {
                if let Some(ctx) = table_from_var_declaration(stmt, src) {
                    chain.push(ctx);
                }
            }
            _ => {}
        }
    }
    subs
}

/// Recognizes `receiver.Run(name, body, ...)` with at least two arguments.
/// The closure body is discovered with a fresh empty context: nested closures
/// do not inherit the enclosing scope's table or iteration bindings.
fn sub_test_from_call<'tree>(
    call: Node<'tree>,
    src: &[u8],
    chain: &[Context<'tree>],
) -> Option<UnresolvedSubTest> {
    let func = call.child_by_field_name("function")?;
    if func.kind() != "selector_expression" {
        return None;
    }
    let method = func.child_by_field_name("field")?;
    if node_text(method, src) != "Run" {
        return None;
    }

    let arg_list = call.child_by_field_name("arguments")?;
    let mut cursor = arg_list.walk();
    let args: Vec<Node> = arg_list.named_children(&mut cursor).collect();
    if args.len() < 2 {
        return None;
    }

    let name = classify(args[0], src, chain);
    let subs = match args[1].kind() {
        "func_literal" => args[1]
            .child_by_field_name("body")
            .map(|body| find_sub_tests(body, src, &[]))
            .unwrap_or_default(),
        _ => Vec::new(),
    };

    Some(UnresolvedSubTest { name, subs })
}

/// `for key, value := range source` where key, value, and source are all
/// plain identifiers. Anything more complex (index expressions, selector
/// sources, single-variable range) yields no binding.
fn iteration_context<'tree>(stmt: Node<'tree>, src: &[u8]) -> Option<Context<'tree>> {
    let mut cursor = stmt.walk();
    let range = stmt
        .named_children(&mut cursor)
        .find(|n| n.kind() == "range_clause")?;
    let left = range.child_by_field_name("left")?;
    if left.kind() != "expression_list" {
        return None;
    }
    let mut left_cursor = left.walk();
    let idents: Vec<Node> = left.named_children(&mut left_cursor).collect();
    if idents.len() != 2 || idents.iter().any(|n| n.kind() != "identifier") {
        return None;
    }
    let source = range.child_by_field_name("right")?;
    if source.kind() != "identifier" {
        return None;
    }
    Some(Context::Iteration {
        key_ident: node_text(idents[0], src),
        value_ident: node_text(idents[1], src),
        source_ident: node_text(source, src),
    })
}

/// `ident := composite{...}` or `ident = composite{...}` with exactly one
/// identifier on the left and one slice/array/map composite literal on the
/// right.
fn table_from_assignment<'tree>(stmt: Node<'tree>, src: &[u8]) -> Option<Context<'tree>> {
    let left = stmt.child_by_field_name("left")?;
    let right = stmt.child_by_field_name("right")?;
    if left.named_child_count() != 1 || right.named_child_count() != 1 {
        return None;
    }
    let ident = left.named_child(0)?;
    if ident.kind() != "identifier" {
        return None;
    }
    table_context(node_text(ident, src), right.named_child(0)?)
}

/// `var ident = composite{...}` with a single spec and a single name.
fn table_from_var_declaration<'tree>(stmt: Node<'tree>, src: &[u8]) -> Option<Context<'tree>> {
    let mut cursor = stmt.walk();
    let specs: Vec<Node> = stmt
        .named_children(&mut cursor)
        .filter(|n| n.kind() == "var_spec")
        .collect();
    if specs.len() != 1 {
        return None;
    }
    let spec = specs[0];
    let mut name_cursor = spec.walk();
    let names: Vec<Node> = spec
        .children_by_field_name("name", &mut name_cursor)
        .collect();
    if names.len() != 1 {
        return None;
    }
    let value = spec.child_by_field_name("value")?;
    if value.named_child_count() != 1 {
        return None;
    }
    table_context(node_text(names[0], src), value.named_child(0)?)
}

fn table_context(ident: String, candidate: Node) -> Option<Context> {
    if candidate.kind() != "composite_literal" {
        return None;
    }
    let ty = candidate.child_by_field_name("type")?;
    if !matches!(ty.kind(), "slice_type" | "array_type" | "map_type") {
        return None;
    }
    Some(Context::Table {
        ident,
        literal: candidate,
    })
}
