//! whtml Parser
//!
//! Builds a node tree from the whtml token stream: elements, text, and
//! standalone mustaches, linked parent/child/sibling in an arena.
//! Parsing is all-or-nothing: the first error ends it.
//!
//! # Example
//!
//! ```
//! let doc = whtml_parser::parse("<ul><li>{{item}}</li></ul>").unwrap();
//! assert_eq!(doc.len(), 1);
//! assert_eq!(doc.render(), "<ul>\n  <li>\n    {{item}}\n  </li>\n</ul>\n");
//! ```

pub mod node;
pub mod parser;
pub mod render;

pub use node::{Children, Node, NodeId, NodeKind, Tree};
pub use parser::{Document, Parser};
pub use render::{render, render_to, Rendered};
pub use whtml_lexer::{Attribute, AttributeKind, Position, SyntaxError};

/// Parse a source string into a document.
pub fn parse(source: &str) -> Result<Document, SyntaxError> {
    Parser::parse(source)
}

/// Parse any character source into a document.
pub fn parse_chars<S>(source: S) -> Result<Document, SyntaxError>
where
    S: IntoIterator<Item = char>,
{
    Parser::from_chars(source).parse_document()
}
