//! Tree builder for whtml.
//!
//! Pulls tokens from the scanner and builds a [`Tree`], keeping a stack of
//! open elements. Closing tags are matched by name against the innermost
//! open element only; there is no implicit closing and no error recovery.

use std::str::Chars;

use whtml_lexer::{Position, Scanner, SyntaxError, Token, TokenKind};

use crate::node::{Node, NodeId, NodeKind, Tree};
use crate::render::render;

/// The result of a successful parse: the top-level nodes and their subtrees.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    tree: Tree,
}

impl Document {
    pub fn tree(&self) -> &Tree {
        &self.tree
    }

    pub fn into_tree(self) -> Tree {
        self.tree
    }

    /// Top-level nodes in source order.
    pub fn nodes(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.tree.children(NodeId::ROOT)
    }

    /// Number of top-level nodes.
    pub fn len(&self) -> usize {
        self.nodes().count()
    }

    pub fn is_empty(&self) -> bool {
        self.tree[NodeId::ROOT].first_child().is_none()
    }

    /// Render every top-level node with the debug renderer.
    pub fn render(&self) -> String {
        self.nodes().map(|id| render(&self.tree, id)).collect()
    }
}

/// whtml document parser.
pub struct Parser<I: Iterator<Item = char>> {
    scanner: Scanner<I>,
    tree: Tree,
    open: Vec<NodeId>,
}

impl<'a> Parser<Chars<'a>> {
    /// Create a new parser for the given source.
    pub fn new(source: &'a str) -> Self {
        Self::from_chars(source.chars())
    }

    /// Parse source code into a document.
    pub fn parse(source: &str) -> Result<Document, SyntaxError> {
        Parser::new(source).parse_document()
    }
}

impl<I: Iterator<Item = char>> Parser<I> {
    /// Create a parser over any character source.
    pub fn from_chars<S>(source: S) -> Self
    where
        S: IntoIterator<IntoIter = I>,
    {
        Self {
            scanner: Scanner::from_chars(source),
            tree: Tree::new(),
            open: Vec::new(),
        }
    }

    /// Parse a full document, failing on the first error.
    pub fn parse_document(mut self) -> Result<Document, SyntaxError> {
        match self.build() {
            Ok(()) => {
                tracing::debug!(
                    nodes = self.tree.children(NodeId::ROOT).count(),
                    "parsed document"
                );
                Ok(Document { tree: self.tree })
            }
            Err(err) => {
                tracing::debug!(%err, "parse failed");
                Err(err)
            }
        }
    }

    fn build(&mut self) -> Result<(), SyntaxError> {
        loop {
            let token = self.scanner.scan();
            tracing::trace!(kind = ?token.kind, line = token.position.line, "token");
            let Token { kind, position } = token;

            match kind {
                TokenKind::Error => return Err(self.first_error(position)),

                TokenKind::EndOfInput => {
                    if let Some(name) = self.innermost_open_name() {
                        return Err(SyntaxError::new(
                            format!("unexpected end of input, expecting closing tag for `{name}`"),
                            position,
                        ));
                    }
                    return Ok(());
                }

                TokenKind::StartTag { name, attributes } => {
                    let id = self.add_child(Node::element(name, attributes, position));
                    self.open.push(id);
                }

                TokenKind::SelfClosingTag { name, attributes } => {
                    self.add_child(Node::element(name, attributes, position));
                }

                TokenKind::Text(text) => {
                    self.add_child(Node::new(NodeKind::Text(text), position));
                }

                TokenKind::Mustache(expression) => {
                    self.add_child(Node::new(NodeKind::Mustache(expression), position));
                }

                TokenKind::EndTag(name) => {
                    if self.innermost_open_name() != Some(name.as_str()) {
                        return Err(SyntaxError::new(
                            format!("closing tag `{name}` not matching"),
                            position,
                        ));
                    }
                    self.open.pop();
                }

                TokenKind::Comment(_) => {}
            }
        }
    }

    /// Allocate `node` and append it to the innermost open element, or to
    /// the root when nothing is open.
    fn add_child(&mut self, node: Node) -> NodeId {
        let parent = self.open.last().copied().unwrap_or(NodeId::ROOT);
        let id = self.tree.alloc(node);
        self.tree.append_child(parent, id);
        id
    }

    fn innermost_open_name(&self) -> Option<&str> {
        self.open.last().and_then(|&id| self.tree[id].name())
    }

    /// The scanner's first recorded error is the one reported.
    fn first_error(&self, position: Position) -> SyntaxError {
        self.scanner
            .errors()
            .first()
            .cloned()
            .unwrap_or_else(|| SyntaxError::new("syntax error", position))
    }
}
