//! Token stream tests through the public API.

use pretty_assertions::assert_eq;
use rstest::rstest;
use whtml_lexer::{AttributeKind, Position, Scanner, Token, TokenKind};

fn kinds(source: &str) -> Vec<TokenKind> {
    Scanner::tokenize(source)
        .unwrap()
        .into_iter()
        .map(|t| t.kind)
        .collect()
}

/// Tag tokens reduced to `(name, attribute kinds)` for structural checks.
fn tags(tokens: &[Token]) -> Vec<(String, Vec<AttributeKind>)> {
    tokens
        .iter()
        .filter_map(|t| match &t.kind {
            TokenKind::StartTag { name, attributes }
            | TokenKind::SelfClosingTag { name, attributes } => Some((
                name.clone(),
                attributes.iter().map(|a| a.kind.clone()).collect(),
            )),
            _ => None,
        })
        .collect()
}

const TEMPLATE: &str = r#"<div t="a &lt b">
	<!-- sldflowoef o o ae-> -->
	<div hidden={{this.Hidden}} Enabled><div>&nbsp; ksdkfk</div></div>
	<br><fk.Fck xxx:ren="aa" ...{{this.Attrs()}} />
</div>"#;

#[test]
fn test_template_token_sequence() {
    let tokens = Scanner::tokenize(TEMPLATE).unwrap();
    let summary: Vec<String> = tokens
        .iter()
        .map(|t| match &t.kind {
            TokenKind::StartTag { name, .. } => format!("start {name}"),
            TokenKind::SelfClosingTag { name, .. } => format!("self-closing {name}"),
            TokenKind::EndTag(name) => format!("end {name}"),
            TokenKind::Text(text) => format!("text {text}"),
            TokenKind::Mustache(expr) => format!("mustache {expr}"),
            TokenKind::Comment(text) => format!("comment {text}"),
            TokenKind::EndOfInput => "eof".to_string(),
            TokenKind::Error => "error".to_string(),
        })
        .collect();

    assert_eq!(
        summary,
        vec![
            "start div",
            "comment  sldflowoef o o ae-> ",
            "start div",
            "start div",
            "text \u{00A0} ksdkfk",
            "end div",
            "end div",
            "self-closing br",
            "self-closing fk.Fck",
            "end div",
            "eof",
        ]
    );
}

#[test]
fn test_template_attributes() {
    let tokens = Scanner::tokenize(TEMPLATE).unwrap();
    assert_eq!(
        tags(&tokens),
        vec![
            (
                "div".to_string(),
                vec![AttributeKind::String {
                    key: "t".into(),
                    value: "a < b".into(),
                    mustaches: vec![],
                }]
            ),
            (
                "div".to_string(),
                vec![
                    AttributeKind::Mustache {
                        key: "hidden".into(),
                        expression: "this.Hidden".into(),
                    },
                    AttributeKind::Bool {
                        key: "Enabled".into()
                    },
                ]
            ),
            ("div".to_string(), vec![]),
            ("br".to_string(), vec![]),
            (
                "fk.Fck".to_string(),
                vec![
                    AttributeKind::String {
                        key: "xxx:ren".into(),
                        value: "aa".into(),
                        mustaches: vec![],
                    },
                    AttributeKind::Variadic {
                        expression: "this.Attrs()".into()
                    },
                ]
            ),
        ]
    );
}

#[test]
fn test_template_positions() {
    let tokens = Scanner::tokenize(TEMPLATE).unwrap();
    // Outer div, comment, then the second-line div.
    assert_eq!(tokens[0].position, Position::new(0, 1));
    assert_eq!(tokens[1].position, Position::new(1, 2));
    assert_eq!(tokens[2].position, Position::new(2, 2));
    // Closing tag on the last line.
    assert_eq!(tokens[9].position, Position::new(4, 1));
}

#[test]
fn test_tokens_are_in_source_order() {
    let tokens = Scanner::tokenize(TEMPLATE).unwrap();
    let positions: Vec<Position> = tokens.iter().map(|t| t.position).collect();
    let mut sorted = positions.clone();
    sorted.sort();
    assert_eq!(positions, sorted);
}

#[rstest]
#[case("<div></div>", 3)]
#[case("<input disabled>", 2)]
#[case("text {{x}} more", 4)]
#[case("<script>a<b</script>", 4)]
#[case("<!-- c -->", 2)]
fn test_token_counts(#[case] source: &str, #[case] count: usize) {
    assert_eq!(kinds(source).len(), count);
}

#[test]
fn test_raw_text_body_untouched() {
    assert_eq!(
        kinds("<script>\n  if (a && b) { x = '{{y}}' }\n</script>"),
        vec![
            TokenKind::StartTag {
                name: "script".into(),
                attributes: vec![],
            },
            TokenKind::Text("\n  if (a && b) { x = '{{y}}' }\n".into()),
            TokenKind::EndTag("script".into()),
            TokenKind::EndOfInput,
        ]
    );
}

#[test]
fn test_scanning_continues_after_error() {
    let mut scanner = Scanner::new("<a %>ok");
    assert!(scanner.scan().is_error());
    let rest: Vec<TokenKind> = std::iter::from_fn(|| {
        let token = scanner.scan();
        (token.kind != TokenKind::EndOfInput).then_some(token.kind)
    })
    .collect();
    assert!(rest.contains(&TokenKind::Text(">ok".into())));
    assert_eq!(scanner.errors().len(), 1);
}

#[test]
fn test_tokenize_reports_first_error() {
    let err = Scanner::tokenize("<a>\n{{}}").unwrap_err();
    assert_eq!(err.position, Position::new(1, 4));
    assert_eq!(err.to_string(), "2:4: empty mustache");
}

#[test]
fn test_char_iterator_source() {
    let source = "<p>{{x}}</p>";
    let mut scanner = Scanner::from_chars(source.chars().collect::<Vec<_>>());
    let mut streamed = Vec::new();
    loop {
        let token = scanner.scan();
        let done = token.kind == TokenKind::EndOfInput;
        streamed.push(token);
        if done {
            break;
        }
    }
    assert_eq!(streamed, Scanner::tokenize(source).unwrap());
}
