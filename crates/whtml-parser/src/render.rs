//! Indented debug rendering of a node and its subtree.
//!
//! ```text
//! <div t="a%vb" hidden={{x}} disabled ...{{attrs}}>
//!   text
//!   {{expr}}
//! </div>
//! ```
//!
//! Void elements get no closing tag, and text and attribute values are
//! re-escaped, so the output parses again. Raw-text bodies are written as is.

use std::fmt::{self, Write};

use whtml_lexer::entity::escape;
use whtml_lexer::{is_raw_text_element, is_void_element, Attribute, AttributeKind};

use crate::node::{NodeId, NodeKind, Tree};

/// Render `id` and its subtree into a string.
pub fn render(tree: &Tree, id: NodeId) -> String {
    Rendered { tree, id }.to_string()
}

/// Render `id` and its subtree into any formatter sink.
pub fn render_to<W: Write>(tree: &Tree, id: NodeId, out: &mut W) -> fmt::Result {
    write_node(out, tree, id, 0, false)
}

/// A node's rendering, produced on `Display`.
pub struct Rendered<'a> {
    pub tree: &'a Tree,
    pub id: NodeId,
}

impl fmt::Display for Rendered<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_node(f, self.tree, self.id, 0, false)
    }
}

/// `raw` marks the children of a raw-text element.
fn write_node<W: Write>(
    out: &mut W,
    tree: &Tree,
    id: NodeId,
    depth: usize,
    raw: bool,
) -> fmt::Result {
    let indent = "  ".repeat(depth);

    match &tree[id].kind {
        NodeKind::Element { name, attributes } => {
            write!(out, "{indent}<{name}")?;
            for attribute in attributes {
                out.write_char(' ')?;
                write_attribute(out, attribute)?;
            }
            out.write_str(">\n")?;

            if is_void_element(name) {
                return Ok(());
            }
            let raw = is_raw_text_element(name);
            for child in tree.children(id) {
                write_node(out, tree, child, depth + 1, raw)?;
            }
            writeln!(out, "{indent}</{name}>")
        }
        NodeKind::Text(text) if raw => writeln!(out, "{indent}{text}"),
        NodeKind::Text(text) => writeln!(out, "{indent}{}", escape(text, false)),
        NodeKind::Mustache(expression) => writeln!(out, "{indent}{{{{{expression}}}}}"),
        // The implicit root: its children stand at the top level.
        NodeKind::Error => {
            for child in tree.children(id) {
                write_node(out, tree, child, depth, raw)?;
            }
            Ok(())
        }
    }
}

fn write_attribute<W: Write>(out: &mut W, attribute: &Attribute) -> fmt::Result {
    match &attribute.kind {
        AttributeKind::String { key, value, .. } => {
            write!(out, "{key}=\"{}\"", escape(value, true))
        }
        AttributeKind::Mustache { key, expression } => write!(out, "{key}={{{{{expression}}}}}"),
        AttributeKind::Bool { key } => out.write_str(key),
        AttributeKind::Variadic { expression } => write!(out, "...{{{{{expression}}}}}"),
    }
}
