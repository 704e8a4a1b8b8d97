//! whtml Lexer
//!
//! Tokenizes whtml templates: HTML markup with `{{expression}}` mustaches in
//! text, attribute values and attribute spreads.
//! Handles line-ending normalization, void and raw-text elements, comments,
//! and character references.
//!
//! # Example
//!
//! ```
//! use whtml_lexer::{Scanner, TokenKind};
//!
//! let tokens = Scanner::tokenize("<br>").unwrap();
//! assert_eq!(tokens.len(), 2);
//! assert_eq!(tokens[1].kind, TokenKind::EndOfInput);
//! ```

use std::fmt;

pub mod entity;
pub mod reader;
pub mod scanner;
pub mod token;

pub use reader::{Reader, LOOKAHEAD};
pub use scanner::Scanner;
pub use token::{
    is_raw_text_element, is_void_element, Attribute, AttributeKind, Position, Token, TokenKind,
    MUSTACHE_PLACEHOLDER, RAW_TEXT_ELEMENTS, VOID_ELEMENTS,
};

/// Syntax error with position information.
///
/// Displays as `line:column: message`, with the line counted from 1.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{}:{}: {message}", .position.line + 1, .position.column)]
pub struct SyntaxError {
    pub message: String,
    pub position: Position,
}

impl SyntaxError {
    pub fn new(message: impl Into<String>, position: Position) -> Self {
        Self {
            message: message.into(),
            position,
        }
    }

    /// An unexpected code point, or end of input when `ch` is `None`.
    pub fn unexpected(ch: Option<char>, position: Position) -> Self {
        let message = match ch {
            None => "unexpected end of input".to_string(),
            Some('\n') => "unexpected end of line".to_string(),
            Some(ch) => format!("unexpected {ch:?}"),
        };
        Self::new(message, position)
    }
}

/// Syntax errors in the order they were found.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErrorList(Vec<SyntaxError>);

impl ErrorList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, error: SyntaxError) {
        self.0.push(error);
    }

    pub fn first(&self) -> Option<&SyntaxError> {
        self.0.first()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, SyntaxError> {
        self.0.iter()
    }
}

impl fmt::Display for ErrorList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0.as_slice() {
            [] => f.write_str("no errors"),
            [only] => write!(f, "{only}"),
            [first, rest @ ..] => write!(f, "{first} (and {} more errors)", rest.len()),
        }
    }
}

impl std::error::Error for ErrorList {}

impl<'a> IntoIterator for &'a ErrorList {
    type Item = &'a SyntaxError;
    type IntoIter = std::slice::Iter<'a, SyntaxError>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
