/// A zero-based position in source text.
///
/// The reader starts at `(0, 0)`. Consuming a line feed moves to the next
/// line at column zero; consuming anything else advances the column, so the
/// first character of a line sits at column 1.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

impl Position {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

/// Placeholder left in a string attribute value where a `{{mustache}}` was.
///
/// The expressions themselves are kept, in order, in the attribute's
/// `mustaches` list.
pub const MUSTACHE_PLACEHOLDER: &str = "%v";

/// Token classification for whtml source.
///
/// Data-carrying variants embed their value directly (no separate `value` field on Token).
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    /// A syntax error was recorded; see [`crate::Scanner::errors`].
    Error,
    EndOfInput,
    Text(String),
    Mustache(String),
    /// `<name attr*>`
    StartTag {
        name: String,
        attributes: Vec<Attribute>,
    },
    /// `</name>`
    EndTag(String),
    /// `<name attr*/>`, or a void element written as `<name attr*>`.
    SelfClosingTag {
        name: String,
        attributes: Vec<Attribute>,
    },
    /// `<!-- ... -->`, carrying the text between the delimiters.
    Comment(String),
}

/// A token produced by the whtml scanner.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub position: Position,
}

impl Token {
    pub fn new(kind: TokenKind, position: Position) -> Self {
        Self { kind, position }
    }

    /// Tag name for start, end and self-closing tags.
    pub fn tag_name(&self) -> Option<&str> {
        match &self.kind {
            TokenKind::StartTag { name, .. }
            | TokenKind::SelfClosingTag { name, .. }
            | TokenKind::EndTag(name) => Some(name),
            _ => None,
        }
    }

    pub fn is_error(&self) -> bool {
        self.kind == TokenKind::Error
    }
}

/// Attribute classification.
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeKind {
    /// `key="value"` or `key='value'`.
    ///
    /// `value` is entity-decoded, with every embedded mustache replaced by
    /// [`MUSTACHE_PLACEHOLDER`]; `mustaches` holds the raw expressions left to right.
    String {
        key: String,
        value: String,
        mustaches: Vec<String>,
    },
    /// `key={{expr}}`
    Mustache { key: String, expression: String },
    /// `key` with no value, treated as boolean true.
    Bool { key: String },
    /// `...{{expr}}`, a spread of attributes supplied by an expression.
    Variadic { expression: String },
}

/// An attribute on a start or self-closing tag.
#[derive(Debug, Clone, PartialEq)]
pub struct Attribute {
    pub kind: AttributeKind,
    pub position: Position,
}

impl Attribute {
    pub fn new(kind: AttributeKind, position: Position) -> Self {
        Self { kind, position }
    }

    /// The attribute key. Variadic attributes have none.
    pub fn key(&self) -> Option<&str> {
        match &self.kind {
            AttributeKind::String { key, .. }
            | AttributeKind::Mustache { key, .. }
            | AttributeKind::Bool { key } => Some(key),
            AttributeKind::Variadic { .. } => None,
        }
    }
}

/// HTML void elements (self-closing, no children, no closing tag).
pub const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "keygen", "link", "meta",
    "param", "source", "track", "wbr",
];

/// Elements whose content is captured verbatim up to the matching closing tag.
pub const RAW_TEXT_ELEMENTS: &[&str] = &[
    "iframe", "noembed", "noframes", "noscript", "script", "style", "textarea", "title", "xmp",
];

/// Check if a tag name is an HTML void element.
pub fn is_void_element(tag: &str) -> bool {
    VOID_ELEMENTS.contains(&tag)
}

/// Check if a tag name is a raw-text element.
pub fn is_raw_text_element(tag: &str) -> bool {
    RAW_TEXT_ELEMENTS.contains(&tag)
}
