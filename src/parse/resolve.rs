//! Name classification and resolution for registration call sites.
//!
//! The classifier sorts the call's first argument into one of the recognized
//! expression shapes; resolution combines that verdict with the context chain
//! to produce candidate names. "Unknown name" is an expected outcome carried
//! as data, never an error: downstream prefix matching depends on it.

use tree_sitter::Node;

use super::discover::Context;
use super::node_text;
use crate::model::{SubTest, UNRESOLVED_NAME};

/// Classifier verdict for a registration call's first argument.
#[derive(Debug, Clone)]
pub(crate) enum SubTestName {
    /// Plain string literal: exactly one known name.
    Literal(String),
    /// `row.field` traced through an iteration binding to a declared table.
    /// Empty `cases` means some link of the chain broke.
    Selector { cases: Vec<String> },
    /// Bare identifier. Resolvable only as the key of a map-table iteration;
    /// empty `cases` otherwise.
    Ident { cases: Vec<String> },
    /// String concatenation, e.g. `"test" + suffix`: runtime-only.
    Binary,
    /// A call such as `fmt.Sprintf("test%d", i)`: runtime-only.
    Call,
    /// Any expression shape not enumerated above.
    Unknown,
}

impl SubTestName {
    /// Candidate literal names for this call site, plus whether they are the
    /// real runtime names. Always yields at least one candidate.
    fn resolve(&self) -> (Vec<String>, bool) {
        let cases = match self {
            SubTestName::Literal(name) => return (vec![name.clone()], true),
            SubTestName::Selector { cases } | SubTestName::Ident { cases } => cases,
            SubTestName::Binary | SubTestName::Call | SubTestName::Unknown => {
                return (vec![UNRESOLVED_NAME.to_string()], false);
            }
        };
        if cases.is_empty() {
            (vec![UNRESOLVED_NAME.to_string()], false)
        } else {
            (cases.clone(), true)
        }
    }
}

/// A registration call as discovered in source, before candidate names have
/// been expanded into `SubTest` nodes.
#[derive(Debug)]
pub(crate) struct UnresolvedSubTest {
    pub(crate) name: SubTestName,
    pub(crate) subs: Vec<UnresolvedSubTest>,
}

impl UnresolvedSubTest {
    /// Expands this record into one `SubTest` per candidate name. Children
    /// resolve first; every sibling emitted from an ambiguous call site
    /// carries an identical copy of the resolved child subtree.
    pub(crate) fn resolve(&self) -> Vec<SubTest> {
        let children: Vec<SubTest> = self.subs.iter().flat_map(|s| s.resolve()).collect();
        let (names, resolved) = self.name.resolve();
        names
            .into_iter()
            .map(|name| SubTest {
                name,
                subs: children.clone(),
                is_unresolved: !resolved,
            })
            .collect()
    }
}

pub(crate) fn classify(expr: Node, src: &[u8], chain: &[Context]) -> SubTestName {
    match expr.kind() {
        "interpreted_string_literal" | "raw_string_literal" => {
            SubTestName::Literal(unquote(&node_text(expr, src)))
        }
        "selector_expression" => selector_cases(expr, src, chain),
        "identifier" => ident_cases(expr, src, chain),
        "binary_expression" => SubTestName::Binary,
        "call_expression" => SubTestName::Call,
        _ => SubTestName::Unknown,
    }
}

/// Full chain: the receiver must be the value identifier of an iteration
/// binding, whose source identifier must name a declared slice/array table;
/// the table's rows then supply the candidates for `field`.
fn selector_cases(sel: Node, src: &[u8], chain: &[Context]) -> SubTestName {
    let mut cases = Vec::new();
    let receiver = match sel.child_by_field_name("operand") {
        Some(n) if n.kind() == "identifier" => node_text(n, src),
        _ => return SubTestName::Selector { cases },
    };
    let field = match sel.child_by_field_name("field") {
        Some(n) => node_text(n, src),
        None => return SubTestName::Selector { cases },
    };

    for ctx in chain {
        let Context::Iteration {
            value_ident,
            source_ident,
            ..
        } = ctx
        else {
            continue;
        };
        if *value_ident != receiver {
            continue;
        }
        for table in chain {
            let Context::Table { ident, literal } = table else {
                continue;
            };
            if ident != source_ident {
                continue;
            }
            cases = slice_field_cases(*literal, src, &field);
        }
    }
    SubTestName::Selector { cases }
}

/// Map-key-as-name idiom: a bare identifier resolves iff it is the key
/// identifier of an iteration binding over a declared map-of-struct literal.
/// The literal's string keys become the candidates; their runtime iteration
/// order is undefined, so no ordering is imposed here.
fn ident_cases(ident_node: Node, src: &[u8], chain: &[Context]) -> SubTestName {
    let name = node_text(ident_node, src);
    let mut cases = Vec::new();
    for ctx in chain {
        let Context::Iteration {
            key_ident,
            source_ident,
            ..
        } = ctx
        else {
            continue;
        };
        if *key_ident != name {
            continue;
        }
        for table in chain {
            let Context::Table { ident, literal } = table else {
                continue;
            };
            if ident != source_ident {
                continue;
            }
            cases = map_key_cases(*literal, src);
        }
    }
    SubTestName::Ident { cases }
}

/// Extracts the string values of `field` from every row of a slice/array
/// composite literal, in literal row order. Keyed rows match on the key;
/// unkeyed rows match on the field's declared position. Rows that are not
/// composite literals and values that are not string literals are skipped.
/// Zero names is a valid outcome.
fn slice_field_cases(literal: Node, src: &[u8], field: &str) -> Vec<String> {
    let Some(ty) = literal.child_by_field_name("type") else {
        return Vec::new();
    };
    if !matches!(ty.kind(), "slice_type" | "array_type") {
        return Vec::new();
    }
    let position = field_position(ty, src, field);
    let Some(body) = literal.child_by_field_name("body") else {
        return Vec::new();
    };

    let mut cases = Vec::new();
    let mut cursor = body.walk();
    for row in body.named_children(&mut cursor) {
        let Some(entries) = row_value(row) else {
            continue;
        };
        let mut entry_cursor = entries.walk();
        for (i, entry) in entries.named_children(&mut entry_cursor).enumerate() {
            if entry.kind() == "keyed_element" {
                // Key and value are the first and second named children, on
                // either side of the colon.
                let (Some(key), Some(value)) = (entry.named_child(0), entry.named_child(1)) else {
                    continue;
                };
                let key = unwrap_element(key);
                let value = unwrap_element(value);
                if matches!(key.kind(), "identifier" | "field_identifier")
                    && node_text(key, src) == field
                    && is_string_literal(value)
                {
                    cases.push(unquote(&node_text(value, src)));
                }
            } else {
                let value = unwrap_element(entry);
                if Some(i) == position && is_string_literal(value) {
                    cases.push(unquote(&node_text(value, src)));
                }
            }
        }
    }
    cases
}

/// Extracts the string-literal keys of a map composite literal.
fn map_key_cases(literal: Node, src: &[u8]) -> Vec<String> {
    let Some(ty) = literal.child_by_field_name("type") else {
        return Vec::new();
    };
    if ty.kind() != "map_type" {
        return Vec::new();
    }
    let Some(body) = literal.child_by_field_name("body") else {
        return Vec::new();
    };

    let mut cases = Vec::new();
    let mut cursor = body.walk();
    for entry in body.named_children(&mut cursor) {
        if entry.kind() != "keyed_element" {
            continue;
        }
        let Some(key) = entry.named_child(0) else {
            continue;
        };
        let key = unwrap_element(key);
        if is_string_literal(key) {
            cases.push(unquote(&node_text(key, src)));
        }
    }
    cases
}

/// Zero-based position of `field` among the declared fields of the slice's
/// inline struct element type, used for positional unkeyed rows.
fn field_position(slice_ty: Node, src: &[u8], field: &str) -> Option<usize> {
    let elem = slice_ty.child_by_field_name("element")?;
    if elem.kind() != "struct_type" {
        return None;
    }
    let mut cursor = elem.walk();
    let list = elem
        .named_children(&mut cursor)
        .find(|n| n.kind() == "field_declaration_list")?;
    let mut list_cursor = list.walk();
    for (i, decl) in list
        .named_children(&mut list_cursor)
        .filter(|n| n.kind() == "field_declaration")
        .enumerate()
    {
        let mut name_cursor = decl.walk();
        let names: Vec<Node> = decl
            .children_by_field_name("name", &mut name_cursor)
            .collect();
        if names.len() == 1 && node_text(names[0], src) == field {
            return Some(i);
        }
    }
    None
}

/// A table row must itself be a composite literal; typed rows carry their own
/// `composite_literal` node, elided rows are a bare `literal_value`.
fn row_value(row: Node) -> Option<Node> {
    if row.kind() != "literal_element" {
        return None;
    }
    let inner = row.named_child(0)?;
    match inner.kind() {
        "literal_value" => Some(inner),
        "composite_literal" => inner.child_by_field_name("body"),
        _ => None,
    }
}

fn unwrap_element(node: Node) -> Node {
    if node.kind() == "literal_element" {
        node.named_child(0).unwrap_or(node)
    } else {
        node
    }
}

fn is_string_literal(node: Node) -> bool {
    matches!(
        node.kind(),
        "interpreted_string_literal" | "raw_string_literal"
    )
}

fn unquote(text: &str) -> String {
    let text = text.trim();
    let quoted = (text.starts_with('"') && text.ends_with('"') && text.len() >= 2)
        || (text.starts_with('`') && text.ends_with('`') && text.len() >= 2);
    if quoted {
        text[1..text.len() - 1].to_string()
    } else {
        text.to_string()
    }
}
