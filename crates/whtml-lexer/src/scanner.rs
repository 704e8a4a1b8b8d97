use std::mem;
use std::str::Chars;

use crate::entity::unescape;
use crate::reader::Reader;
use crate::token::{
    is_raw_text_element, is_void_element, Attribute, AttributeKind, Position, Token, TokenKind,
    MUSTACHE_PLACEHOLDER,
};
use crate::{ErrorList, SyntaxError};

/// What the next call to [`Scanner::scan`] reads.
///
/// Positions are those of the opening delimiter, which has already been
/// consumed when the mode is entered.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Mode {
    Text,
    /// After `<`; the first name character is still unread.
    StartTag(Position),
    /// After `</`.
    EndTag(Position),
    /// After `<!--`.
    Comment(Position),
    /// After `{{`.
    Mustache(Position),
    /// Inside a raw-text element with the given name.
    RawText(String),
    EndOfInput,
}

/// whtml template scanner.
///
/// Pull-based: every call to [`scan`](Self::scan) produces exactly one token.
/// Text scanning decides what comes next by switching the mode when it meets
/// `<` or `{{`; a raw-text body stashes its closing tag so the following call
/// returns it.
///
/// Syntax errors are appended to [`errors`](Self::errors) and reported as a
/// [`TokenKind::Error`] token. Scanning may continue afterwards in text mode.
pub struct Scanner<I: Iterator<Item = char>> {
    reader: Reader<I>,
    mode: Mode,
    pending: Option<Token>,
    last: Option<Token>,
    replay: bool,
    errors: ErrorList,
}

impl<'a> Scanner<Chars<'a>> {
    /// Create a new scanner for the given source.
    pub fn new(source: &'a str) -> Self {
        Self::from_chars(source.chars())
    }

    /// Tokenize the entire source, up to and including `EndOfInput`.
    pub fn tokenize(source: &str) -> Result<Vec<Token>, SyntaxError> {
        let mut scanner = Scanner::new(source);
        let mut tokens = Vec::new();
        loop {
            let token = scanner.scan();
            match token.kind {
                TokenKind::Error => {
                    return Err(scanner
                        .errors
                        .first()
                        .cloned()
                        .unwrap_or_else(|| SyntaxError::new("syntax error", token.position)));
                }
                TokenKind::EndOfInput => {
                    tokens.push(token);
                    return Ok(tokens);
                }
                _ => tokens.push(token),
            }
        }
    }
}

impl<I: Iterator<Item = char>> Scanner<I> {
    /// Create a scanner over any character source.
    pub fn from_chars<S>(source: S) -> Self
    where
        S: IntoIterator<IntoIter = I>,
    {
        Self {
            reader: Reader::new(source),
            mode: Mode::Text,
            pending: None,
            last: None,
            replay: false,
            errors: ErrorList::new(),
        }
    }

    /// Errors recorded so far, in the order they occurred.
    pub fn errors(&self) -> &ErrorList {
        &self.errors
    }

    /// The most recently scanned token.
    pub fn current(&self) -> Option<&Token> {
        self.last.as_ref()
    }

    /// Return the next token.
    ///
    /// After [`unscan`](Self::unscan), returns the previous token again instead.
    pub fn scan(&mut self) -> Token {
        if self.replay {
            self.replay = false;
            if let Some(token) = &self.last {
                return token.clone();
            }
        }

        let token = self.step();
        self.last = Some(token.clone());
        token
    }

    /// Make the next [`scan`](Self::scan) replay the most recent token.
    ///
    /// # Panics
    ///
    /// Panics if nothing has been scanned yet, or if called twice without a
    /// `scan` in between.
    pub fn unscan(&mut self) {
        assert!(self.last.is_some(), "unscan called before any token was scanned");
        assert!(!self.replay, "unscan called twice without an intervening scan");
        self.replay = true;
    }

    // --- Mode dispatch ---

    fn step(&mut self) -> Token {
        if let Some(token) = self.pending.take() {
            return token;
        }

        loop {
            let result = match mem::replace(&mut self.mode, Mode::Text) {
                Mode::Text => match self.scan_text() {
                    Some(token) => Ok(token),
                    None => continue,
                },
                Mode::StartTag(start) => self.scan_start_tag(start),
                Mode::EndTag(start) => self.scan_end_tag(start),
                Mode::Comment(start) => Ok(self.scan_comment(start)),
                Mode::Mustache(start) => self
                    .scan_mustache()
                    .map(|expr| Token::new(TokenKind::Mustache(expr), start)),
                Mode::RawText(name) => self.scan_raw_text(name),
                Mode::EndOfInput => {
                    self.mode = Mode::EndOfInput;
                    Ok(Token::new(TokenKind::EndOfInput, self.reader.position()))
                }
            };

            return result.unwrap_or_else(|err| self.fail(err));
        }
    }

    fn fail(&mut self, err: SyntaxError) -> Token {
        tracing::debug!(%err, "syntax error");
        let position = err.position;
        self.errors.push(err);
        Token::new(TokenKind::Error, position)
    }

    // --- Scanners ---

    /// Scan a text run up to the next markup or mustache, switching the mode.
    ///
    /// Returns `None` when the run is empty; the new mode is then scanned
    /// directly.
    fn scan_text(&mut self) -> Option<Token> {
        let mut text = String::new();
        let mut start = None;

        loop {
            let Some(ch) = self.reader.read() else {
                return self.end_text(text, start, Mode::EndOfInput);
            };
            let position = self.reader.position();

            let next_mode = match ch {
                // A line feed and the indentation after it vanish entirely.
                '\n' => {
                    self.skip_whitespace();
                    continue;
                }
                '<' => self.scan_markup_open(position),
                '{' => {
                    if self.reader.read() == Some('{') {
                        Some(Mode::Mustache(position))
                    } else {
                        self.reader.pushback(1);
                        None
                    }
                }
                _ => None,
            };

            if let Some(mode) = next_mode {
                return self.end_text(text, start, mode);
            }

            start.get_or_insert(position);
            text.push(ch);
        }
    }

    fn end_text(&mut self, text: String, start: Option<Position>, mode: Mode) -> Option<Token> {
        self.mode = mode;
        let start = start?;
        let text = unescape(&text, false).into_owned();
        Some(Token::new(TokenKind::Text(text), start))
    }

    /// Decide what a `<` opens. `None` means it is plain text.
    fn scan_markup_open(&mut self, start: Position) -> Option<Mode> {
        match self.reader.read() {
            Some('/') => Some(Mode::EndTag(start)),
            Some(ch) if is_name_start(ch) => {
                self.reader.pushback(1);
                Some(Mode::StartTag(start))
            }
            Some('!') => {
                let first = self.reader.read();
                let second = self.reader.read();
                if first == Some('-') && second == Some('-') {
                    Some(Mode::Comment(start))
                } else {
                    self.reader.pushback(3);
                    None
                }
            }
            _ => {
                self.reader.pushback(1);
                None
            }
        }
    }

    fn scan_start_tag(&mut self, start: Position) -> Result<Token, SyntaxError> {
        let name = self.scan_name();
        let mut attributes = Vec::new();

        loop {
            let ch = self.reader.read();
            let position = self.reader.position();

            match ch {
                Some('/') => {
                    let next = self.reader.read();
                    if next == Some('>') {
                        return Ok(Token::new(
                            TokenKind::SelfClosingTag { name, attributes },
                            start,
                        ));
                    }
                    self.reader.pushback(1);
                    return Err(SyntaxError::new(
                        format!("'>' expected, got {} instead", describe(next)),
                        position,
                    ));
                }
                Some('>') => {
                    if is_void_element(&name) {
                        return Ok(Token::new(
                            TokenKind::SelfClosingTag { name, attributes },
                            start,
                        ));
                    }
                    if is_raw_text_element(&name) {
                        tracing::debug!(element = %name, "entering raw-text mode");
                        self.mode = Mode::RawText(name.clone());
                    }
                    return Ok(Token::new(TokenKind::StartTag { name, attributes }, start));
                }
                Some(ch) if is_whitespace(ch) => self.scan_attributes(&mut attributes)?,
                ch => return Err(SyntaxError::unexpected(ch, position)),
            }
        }
    }

    /// Scan whitespace-separated attributes, stopping before `>` or `/`.
    fn scan_attributes(&mut self, attributes: &mut Vec<Attribute>) -> Result<(), SyntaxError> {
        loop {
            self.skip_whitespace();
            let ch = self.reader.read();
            let position = self.reader.position();

            match ch {
                None => return Ok(()),
                Some('.') => attributes.push(self.scan_variadic(position)?),
                Some(ch) if is_name_start(ch) => {
                    self.reader.pushback(1);
                    attributes.push(self.scan_attribute(position)?);
                }
                Some('>' | '/') => {
                    self.reader.pushback(1);
                    return Ok(());
                }
                ch => return Err(SyntaxError::unexpected(ch, position)),
            }
        }
    }

    /// Scan `...{{expr}}`; the first `.` has been consumed.
    fn scan_variadic(&mut self, start: Position) -> Result<Attribute, SyntaxError> {
        let second = self.reader.read();
        let third = self.reader.read();
        if second != Some('.') || third != Some('.') {
            self.reader.pushback(2);
            return Err(SyntaxError::unexpected(Some('.'), start));
        }

        self.expect('{')?;
        self.expect('{')?;
        let expression = self.scan_mustache()?;
        Ok(Attribute::new(AttributeKind::Variadic { expression }, start))
    }

    /// Scan `key`, `key="value"`, `key='value'` or `key={{expr}}`.
    fn scan_attribute(&mut self, start: Position) -> Result<Attribute, SyntaxError> {
        let key = self.scan_name();

        if self.reader.read() != Some('=') {
            self.reader.pushback(1);
            return Ok(Attribute::new(AttributeKind::Bool { key }, start));
        }

        let ch = self.reader.read();
        let position = self.reader.position();
        let kind = match ch {
            Some('{') => {
                self.expect('{')?;
                let expression = self.scan_mustache()?;
                AttributeKind::Mustache { key, expression }
            }
            Some(quote @ ('"' | '\'')) => {
                let (value, mustaches) = self.scan_string(quote)?;
                AttributeKind::String {
                    key,
                    value,
                    mustaches,
                }
            }
            ch => return Err(SyntaxError::unexpected(ch, position)),
        };

        Ok(Attribute::new(kind, start))
    }

    /// Scan a quoted attribute value; the opening quote has been consumed.
    fn scan_string(&mut self, quote: char) -> Result<(String, Vec<String>), SyntaxError> {
        let start = self.reader.position();
        let mut value = String::new();
        let mut mustaches = Vec::new();

        loop {
            match self.reader.read() {
                ch @ (None | Some('\n')) => return Err(SyntaxError::unexpected(ch, start)),
                Some(ch) if ch == quote => break,
                Some('{') => {
                    if self.reader.read() == Some('{') {
                        mustaches.push(self.scan_mustache()?);
                        value.push_str(MUSTACHE_PLACEHOLDER);
                    } else {
                        self.reader.pushback(1);
                        value.push('{');
                    }
                }
                Some(ch) => value.push(ch),
            }
        }

        Ok((unescape(&value, true).into_owned(), mustaches))
    }

    /// Scan a mustache body up to `}}`; the opening `{{` has been consumed.
    fn scan_mustache(&mut self) -> Result<String, SyntaxError> {
        let start = self.reader.position();
        let mut expression = String::new();

        loop {
            match self.reader.read() {
                ch @ (None | Some('\n')) => return Err(SyntaxError::unexpected(ch, start)),
                Some('}') => {
                    if self.reader.read() == Some('}') {
                        if expression.is_empty() {
                            return Err(SyntaxError::new(
                                "empty mustache",
                                self.reader.position(),
                            ));
                        }
                        return Ok(expression);
                    }
                    self.reader.pushback(1);
                    expression.push('}');
                }
                Some(ch) => expression.push(ch),
            }
        }
    }

    /// Scan `name>` after `</`.
    ///
    /// Both the token and a void-element error sit at the `<` of the closing
    /// tag, so `<br></br>` reports `1:5`.
    fn scan_end_tag(&mut self, start: Position) -> Result<Token, SyntaxError> {
        let name = self.scan_name();
        self.expect('>')?;

        if is_void_element(&name) {
            return Err(SyntaxError::new(
                format!("void element `{name}` cannot have closing tag"),
                start,
            ));
        }
        Ok(Token::new(TokenKind::EndTag(name), start))
    }

    /// Consume everything up to and including `-->`.
    fn scan_comment(&mut self, start: Position) -> Token {
        let mut text = String::new();

        while let Some(ch) = self.reader.read() {
            if ch == '-' {
                let first = self.reader.read();
                let second = self.reader.read();
                if first == Some('-') && second == Some('>') {
                    break;
                }
                self.reader.pushback(2);
            }
            text.push(ch);
        }

        Token::new(TokenKind::Comment(text), start)
    }

    /// Copy a raw-text body verbatim up to `</name>`.
    ///
    /// The closing tag is stashed for the next scan. An empty body yields the
    /// closing tag directly.
    fn scan_raw_text(&mut self, name: String) -> Result<Token, SyntaxError> {
        let mut text = String::new();
        let mut start = None;

        loop {
            let Some(ch) = self.reader.read() else {
                return Err(SyntaxError::unexpected(None, self.reader.position()));
            };
            let position = self.reader.position();

            if ch == '<' {
                if self.reader.read() == Some('/') {
                    let candidate = self.scan_name();
                    if candidate == name {
                        if self.reader.read() == Some('>') {
                            let end = Token::new(TokenKind::EndTag(candidate), position);
                            let Some(start) = start else {
                                return Ok(end);
                            };
                            self.pending = Some(end);
                            return Ok(Token::new(TokenKind::Text(text), start));
                        }
                        self.reader.pushback(1);
                    }

                    start.get_or_insert(position);
                    text.push_str("</");
                    text.push_str(&candidate);
                    continue;
                }
                self.reader.pushback(1);
            }

            start.get_or_insert(position);
            text.push(ch);
        }
    }

    // --- Helpers ---

    fn scan_name(&mut self) -> String {
        let mut name = String::new();
        loop {
            match self.reader.read() {
                Some(ch) if is_name(ch) => name.push(ch),
                _ => {
                    self.reader.pushback(1);
                    return name;
                }
            }
        }
    }

    /// Skip whitespace, leaving the first non-whitespace code point unread.
    fn skip_whitespace(&mut self) {
        while let Some(ch) = self.reader.read() {
            if !is_whitespace(ch) {
                self.reader.pushback(1);
                break;
            }
        }
    }

    fn expect(&mut self, expected: char) -> Result<(), SyntaxError> {
        let ch = self.reader.read();
        if ch == Some(expected) {
            Ok(())
        } else {
            Err(SyntaxError::unexpected(ch, self.reader.position()))
        }
    }
}

fn describe(ch: Option<char>) -> String {
    match ch {
        Some(ch) => format!("{ch:?}"),
        None => "end of input".to_string(),
    }
}

fn is_whitespace(ch: char) -> bool {
    matches!(ch, ' ' | '\t' | '\n')
}

fn is_name_start(ch: char) -> bool {
    ch.is_ascii_alphabetic() || ch == '_'
}

/// Name characters. Digits are not accepted.
fn is_name(ch: char) -> bool {
    is_name_start(ch) || matches!(ch, '-' | ':' | '.')
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    /// Helper: tokenize and return token kinds (ignoring positions).
    fn kinds(source: &str) -> Vec<TokenKind> {
        Scanner::tokenize(source)
            .unwrap()
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    fn text(s: &str) -> TokenKind {
        TokenKind::Text(s.into())
    }

    fn start(name: &str, attributes: Vec<AttributeKind>) -> TokenKind {
        TokenKind::StartTag {
            name: name.into(),
            attributes: with_dummy_positions(attributes),
        }
    }

    fn self_closing(name: &str, attributes: Vec<AttributeKind>) -> TokenKind {
        TokenKind::SelfClosingTag {
            name: name.into(),
            attributes: with_dummy_positions(attributes),
        }
    }

    fn end(name: &str) -> TokenKind {
        TokenKind::EndTag(name.into())
    }

    fn with_dummy_positions(kinds: Vec<AttributeKind>) -> Vec<Attribute> {
        kinds
            .into_iter()
            .map(|kind| Attribute::new(kind, Position::default()))
            .collect()
    }

    /// Helper: tokenize, blanking attribute positions so kinds compare structurally.
    fn kinds_ignoring_attr_positions(source: &str) -> Vec<TokenKind> {
        kinds(source)
            .into_iter()
            .map(|kind| match kind {
                TokenKind::StartTag { name, attributes } => TokenKind::StartTag {
                    name,
                    attributes: blank(attributes),
                },
                TokenKind::SelfClosingTag { name, attributes } => TokenKind::SelfClosingTag {
                    name,
                    attributes: blank(attributes),
                },
                other => other,
            })
            .collect()
    }

    fn blank(attributes: Vec<Attribute>) -> Vec<Attribute> {
        attributes
            .into_iter()
            .map(|a| Attribute::new(a.kind, Position::default()))
            .collect()
    }

    fn error(source: &str) -> String {
        Scanner::tokenize(source).unwrap_err().to_string()
    }

    // =========================================================================
    // Structure: empty, text, end of input
    // =========================================================================

    #[test]
    fn test_empty_source() {
        assert_eq!(kinds(""), vec![TokenKind::EndOfInput]);
    }

    #[test]
    fn test_plain_text() {
        assert_eq!(kinds("hello world"), vec![text("hello world"), TokenKind::EndOfInput]);
    }

    #[test]
    fn test_newline_and_indentation_removed() {
        assert_eq!(kinds("a\n   b"), vec![text("ab"), TokenKind::EndOfInput]);
    }

    #[test]
    fn test_whitespace_only_lines_produce_nothing() {
        assert_eq!(
            kinds("<p>\n    \n  </p>"),
            vec![start("p", vec![]), end("p"), TokenKind::EndOfInput]
        );
    }

    #[test]
    fn test_end_of_input_repeats() {
        let mut scanner = Scanner::new("x");
        assert_eq!(scanner.scan().kind, text("x"));
        assert_eq!(scanner.scan().kind, TokenKind::EndOfInput);
        assert_eq!(scanner.scan().kind, TokenKind::EndOfInput);
    }

    #[test]
    fn test_text_entities_decoded() {
        assert_eq!(
            kinds("&nbsp; a &amp; b"),
            vec![text("\u{00A0} a & b"), TokenKind::EndOfInput]
        );
    }

    #[test]
    fn test_lone_delimiters_are_text() {
        assert_eq!(
            kinds("a < b { c } <!x> <1"),
            vec![text("a < b { c } <!x> <1"), TokenKind::EndOfInput]
        );
    }

    // =========================================================================
    // Tags
    // =========================================================================

    #[test]
    fn test_start_and_end_tag() {
        assert_eq!(
            kinds("<div></div>"),
            vec![start("div", vec![]), end("div"), TokenKind::EndOfInput]
        );
    }

    #[test]
    fn test_text_between_tags() {
        assert_eq!(
            kinds("<b>bold</b>"),
            vec![start("b", vec![]), text("bold"), end("b"), TokenKind::EndOfInput]
        );
    }

    #[test]
    fn test_self_closing_tag() {
        assert_eq!(kinds("<x/>"), vec![self_closing("x", vec![]), TokenKind::EndOfInput]);
    }

    #[test]
    fn test_void_element_forced_self_closing() {
        assert_eq!(kinds("<br>"), vec![self_closing("br", vec![]), TokenKind::EndOfInput]);
    }

    #[test]
    fn test_name_characters() {
        assert_eq!(
            kinds("<fk.Fck_x-y:z/>"),
            vec![self_closing("fk.Fck_x-y:z", vec![]), TokenKind::EndOfInput]
        );
    }

    #[test]
    fn test_tag_positions() {
        let tokens = Scanner::tokenize("<a>\n  <b></b>").unwrap();
        assert_eq!(tokens[0].position, Position::new(0, 1));
        assert_eq!(tokens[1].position, Position::new(1, 3));
        assert_eq!(tokens[2].position, Position::new(1, 6));
        assert_eq!(tokens[3].kind, TokenKind::EndOfInput);
        assert_eq!(tokens[3].position, Position::new(1, 9));
    }

    #[test]
    fn test_text_position_is_first_character() {
        let tokens = Scanner::tokenize("<p>  hi</p>").unwrap();
        assert_eq!(tokens[1].kind, text("  hi"));
        assert_eq!(tokens[1].position, Position::new(0, 4));
    }

    // =========================================================================
    // Attributes
    // =========================================================================

    #[test]
    fn test_bool_attribute() {
        assert_eq!(
            kinds_ignoring_attr_positions("<input disabled>"),
            vec![
                self_closing("input", vec![AttributeKind::Bool { key: "disabled".into() }]),
                TokenKind::EndOfInput,
            ]
        );
    }

    #[test]
    fn test_string_attribute_with_mustache() {
        assert_eq!(
            kinds_ignoring_attr_positions("<div t=\"a{{x}}b\">"),
            vec![
                start(
                    "div",
                    vec![AttributeKind::String {
                        key: "t".into(),
                        value: format!("a{MUSTACHE_PLACEHOLDER}b"),
                        mustaches: vec!["x".into()],
                    }]
                ),
                TokenKind::EndOfInput,
            ]
        );
    }

    #[test]
    fn test_string_attribute_multiple_mustaches_in_order() {
        let tokens = kinds_ignoring_attr_positions("<a href='/{{ a }}/{{b}}?q={c}'>");
        assert_eq!(
            tokens[0],
            start(
                "a",
                vec![AttributeKind::String {
                    key: "href".into(),
                    value: "/%v/%v?q={c}".into(),
                    mustaches: vec![" a ".into(), "b".into()],
                }]
            )
        );
    }

    #[test]
    fn test_string_attribute_entities_decoded() {
        let tokens = kinds_ignoring_attr_positions("<div t=\"a &lt b\">");
        assert_eq!(
            tokens[0],
            start(
                "div",
                vec![AttributeKind::String {
                    key: "t".into(),
                    value: "a < b".into(),
                    mustaches: vec![],
                }]
            )
        );
    }

    #[test]
    fn test_mustache_attribute() {
        let tokens = kinds_ignoring_attr_positions("<div hidden={{this.Hidden}} Enabled>");
        assert_eq!(
            tokens[0],
            start(
                "div",
                vec![
                    AttributeKind::Mustache {
                        key: "hidden".into(),
                        expression: "this.Hidden".into(),
                    },
                    AttributeKind::Bool { key: "Enabled".into() },
                ]
            )
        );
    }

    #[test]
    fn test_variadic_attribute() {
        assert_eq!(
            kinds_ignoring_attr_positions("<div ...{{props}} />"),
            vec![
                self_closing(
                    "div",
                    vec![AttributeKind::Variadic {
                        expression: "props".into()
                    }]
                ),
                TokenKind::EndOfInput,
            ]
        );
    }

    #[test]
    fn test_attributes_without_separating_space() {
        let tokens = kinds_ignoring_attr_positions("<a x=\"1\"y>");
        assert_eq!(
            tokens[0],
            start(
                "a",
                vec![
                    AttributeKind::String {
                        key: "x".into(),
                        value: "1".into(),
                        mustaches: vec![],
                    },
                    AttributeKind::Bool { key: "y".into() },
                ]
            )
        );
    }

    #[test]
    fn test_attributes_across_lines() {
        let tokens = kinds_ignoring_attr_positions("<a\n  x\n  y\n>");
        assert_eq!(
            tokens[0],
            start(
                "a",
                vec![
                    AttributeKind::Bool { key: "x".into() },
                    AttributeKind::Bool { key: "y".into() },
                ]
            )
        );
    }

    #[test]
    fn test_attribute_positions() {
        let tokens = Scanner::tokenize("<input disabled ...{{a}}>").unwrap();
        match &tokens[0].kind {
            TokenKind::SelfClosingTag { attributes, .. } => {
                assert_eq!(attributes[0].position, Position::new(0, 8));
                assert_eq!(attributes[1].position, Position::new(0, 17));
            }
            other => panic!("Expected self-closing tag, got {other:?}"),
        }
    }

    // =========================================================================
    // Mustaches and comments
    // =========================================================================

    #[test]
    fn test_standalone_mustache() {
        assert_eq!(
            kinds("a {b} {{c}}"),
            vec![
                text("a {b} "),
                TokenKind::Mustache("c".into()),
                TokenKind::EndOfInput,
            ]
        );
    }

    #[test]
    fn test_mustache_keeps_inner_brace() {
        assert_eq!(
            kinds("{{ {a: 1} }}"),
            vec![TokenKind::Mustache(" {a: 1} ".into()), TokenKind::EndOfInput]
        );
    }

    #[test]
    fn test_mustache_position() {
        let tokens = Scanner::tokenize("<p>\n  {{x}}").unwrap();
        assert_eq!(tokens[1].kind, TokenKind::Mustache("x".into()));
        assert_eq!(tokens[1].position, Position::new(1, 3));
    }

    #[test]
    fn test_comment() {
        assert_eq!(
            kinds("<!-- note -->"),
            vec![TokenKind::Comment(" note ".into()), TokenKind::EndOfInput]
        );
    }

    #[test]
    fn test_comment_with_dashes() {
        assert_eq!(
            kinds("<!-- a - b -> c --->x"),
            vec![
                TokenKind::Comment(" a - b -> c -".into()),
                text("x"),
                TokenKind::EndOfInput,
            ]
        );
    }

    #[test]
    fn test_unterminated_comment_runs_to_end() {
        assert_eq!(
            kinds("<!-- open"),
            vec![TokenKind::Comment(" open".into()), TokenKind::EndOfInput]
        );
    }

    // =========================================================================
    // Raw-text elements
    // =========================================================================

    #[test]
    fn test_script_content_is_raw() {
        assert_eq!(
            kinds("<script>if (a<b) {}</script>"),
            vec![
                start("script", vec![]),
                text("if (a<b) {}"),
                end("script"),
                TokenKind::EndOfInput,
            ]
        );
    }

    #[test]
    fn test_raw_text_keeps_other_closing_tags() {
        assert_eq!(
            kinds("<style>a</b></styl></stylex>{{x}}&amp;\n  b</style>"),
            vec![
                start("style", vec![]),
                text("a</b></styl></stylex>{{x}}&amp;\n  b"),
                end("style"),
                TokenKind::EndOfInput,
            ]
        );
    }

    #[test]
    fn test_raw_text_closing_tag_needs_bracket() {
        assert_eq!(
            kinds("<title></title x></title>"),
            vec![
                start("title", vec![]),
                text("</title x>"),
                end("title"),
                TokenKind::EndOfInput,
            ]
        );
    }

    #[test]
    fn test_empty_raw_text() {
        assert_eq!(
            kinds("<textarea></textarea>"),
            vec![start("textarea", vec![]), end("textarea"), TokenKind::EndOfInput]
        );
    }

    #[test]
    fn test_raw_text_positions() {
        let tokens = Scanner::tokenize("<xmp>ab</xmp>").unwrap();
        assert_eq!(tokens[1].position, Position::new(0, 6));
        assert_eq!(tokens[2].position, Position::new(0, 8));
    }

    #[test]
    fn test_self_closing_raw_element_is_not_raw() {
        assert_eq!(
            kinds("<script/><b></b>"),
            vec![
                self_closing("script", vec![]),
                start("b", vec![]),
                end("b"),
                TokenKind::EndOfInput,
            ]
        );
    }

    // =========================================================================
    // Errors
    // =========================================================================

    #[rstest]
    #[case("<div", "1:4: unexpected end of input")]
    #[case("<div %>", "1:6: unexpected '%'")]
    #[case("<h1>", "1:3: unexpected '1'")]
    #[case("<br/ >", "1:4: '>' expected, got ' ' instead")]
    #[case("<a/", "1:3: '>' expected, got end of input instead")]
    #[case("{{}}", "1:4: empty mustache")]
    #[case("{{a\n}}", "1:2: unexpected end of line")]
    #[case("{{abc", "1:2: unexpected end of input")]
    #[case("<a t=\"x", "1:6: unexpected end of input")]
    #[case("<a t=\"x\ny\">", "1:6: unexpected end of line")]
    #[case("<a t=x>", "1:6: unexpected 'x'")]
    #[case("<a t={x}>", "1:7: unexpected 'x'")]
    #[case("<a t={{}}>", "1:9: empty mustache")]
    #[case("<a ..{{x}}>", "1:4: unexpected '.'")]
    #[case("<a ...x>", "1:7: unexpected 'x'")]
    #[case("</br>", "1:1: void element `br` cannot have closing tag")]
    #[case("<br></br>", "1:5: void element `br` cannot have closing tag")]
    #[case("</div x>", "1:6: unexpected ' '")]
    #[case("<script>abc", "1:11: unexpected end of input")]
    fn test_errors(#[case] source: &str, #[case] expected: &str) {
        assert_eq!(error(source), expected);
    }

    #[test]
    fn test_error_token_and_list() {
        let mut scanner = Scanner::new("<a %>");
        let token = scanner.scan();
        assert!(token.is_error());
        assert_eq!(token.position, Position::new(0, 4));
        assert_eq!(scanner.errors().len(), 1);
        assert_eq!(scanner.errors().to_string(), "1:4: unexpected '%'");
    }

    #[test]
    fn test_errors_accumulate_when_scanning_continues() {
        let mut scanner = Scanner::new("{{}} {{}}");
        let mut error_tokens = 0;
        loop {
            let token = scanner.scan();
            match token.kind {
                TokenKind::Error => error_tokens += 1,
                TokenKind::EndOfInput => break,
                _ => {}
            }
        }
        assert_eq!(error_tokens, 2);
        assert_eq!(scanner.errors().len(), 2);
        assert!(scanner.errors().to_string().ends_with("(and 1 more errors)"));
    }

    // =========================================================================
    // Unscan
    // =========================================================================

    #[test]
    fn test_unscan_replays_once() {
        let mut scanner = Scanner::new("<a>b");
        let first = scanner.scan();
        scanner.unscan();
        assert_eq!(scanner.scan(), first);
        assert_eq!(scanner.scan().kind, text("b"));
        assert_eq!(scanner.current().map(|t| &t.kind), Some(&text("b")));
    }

    #[test]
    fn test_unscan_replays_stashed_sequence() {
        let mut scanner = Scanner::new("<script>x</script>");
        scanner.scan();
        assert_eq!(scanner.scan().kind, text("x"));
        scanner.unscan();
        assert_eq!(scanner.scan().kind, text("x"));
        assert_eq!(scanner.scan().kind, end("script"));
    }

    #[test]
    #[should_panic(expected = "unscan called twice")]
    fn test_double_unscan_panics() {
        let mut scanner = Scanner::new("<a>");
        scanner.scan();
        scanner.unscan();
        scanner.unscan();
    }

    #[test]
    #[should_panic(expected = "before any token")]
    fn test_unscan_before_scan_panics() {
        let mut scanner = Scanner::new("<a>");
        scanner.unscan();
    }

    // =========================================================================
    // Line endings
    // =========================================================================

    #[test]
    fn test_windows_line_endings() {
        let tokens = Scanner::tokenize("<a>\r\n<b/>").unwrap();
        assert_eq!(tokens[1].kind, self_closing("b", vec![]));
        assert_eq!(tokens[1].position, Position::new(1, 1));
    }

    #[test]
    fn test_from_chars_source() {
        let source: Vec<char> = "<i/>".chars().collect();
        let mut scanner = Scanner::from_chars(source);
        assert_eq!(scanner.scan().kind, self_closing("i", vec![]));
        assert_eq!(scanner.scan().kind, TokenKind::EndOfInput);
    }
}
