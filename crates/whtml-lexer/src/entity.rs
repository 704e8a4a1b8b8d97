//! Character reference decoding for text and attribute values.
//!
//! Handles numeric references (`&#169;`, `&#xA9;`) and a subset of the HTML
//! named references: markup escapes, Latin-1 symbols and letters, general
//! punctuation, Greek, arrows, math operators and card suits. Names outside
//! the table pass through undecoded; numeric references cover every code
//! point. Names without a trailing semicolon are only recognized for the
//! legacy set that HTML allows unterminated (`&amp`, `&lt`, `&nbsp`, ...).
//!
//! [`escape`] is the inverse used by the debug renderer.

use std::borrow::Cow;
use std::collections::HashMap;
use std::sync::LazyLock;

/// Maps entity names (without the leading '&') to their replacement strings.
///
/// Terminated names carry their `;`. Legacy names appear a second time
/// without it.
static NAMED_ENTITIES: LazyLock<HashMap<&'static str, &'static str>> = LazyLock::new(|| {
    HashMap::from([
        ("amp;", "&"),
        ("amp", "&"),
        ("lt;", "<"),
        ("lt", "<"),
        ("gt;", ">"),
        ("gt", ">"),
        ("quot;", "\""),
        ("quot", "\""),
        ("apos;", "'"),
        ("nbsp;", "\u{00A0}"),
        ("nbsp", "\u{00A0}"),
        // Punctuation and symbols
        ("copy;", "\u{00A9}"),
        ("copy", "\u{00A9}"),
        ("reg;", "\u{00AE}"),
        ("reg", "\u{00AE}"),
        ("not;", "\u{00AC}"),
        ("not", "\u{00AC}"),
        ("shy;", "\u{00AD}"),
        ("shy", "\u{00AD}"),
        ("sect;", "\u{00A7}"),
        ("sect", "\u{00A7}"),
        ("para;", "\u{00B6}"),
        ("para", "\u{00B6}"),
        ("middot;", "\u{00B7}"),
        ("middot", "\u{00B7}"),
        ("laquo;", "\u{00AB}"),
        ("laquo", "\u{00AB}"),
        ("raquo;", "\u{00BB}"),
        ("raquo", "\u{00BB}"),
        ("iexcl;", "\u{00A1}"),
        ("iexcl", "\u{00A1}"),
        ("iquest;", "\u{00BF}"),
        ("iquest", "\u{00BF}"),
        ("trade;", "\u{2122}"),
        ("mdash;", "\u{2014}"),
        ("ndash;", "\u{2013}"),
        ("hellip;", "\u{2026}"),
        ("bull;", "\u{2022}"),
        ("lsquo;", "\u{2018}"),
        ("rsquo;", "\u{2019}"),
        ("ldquo;", "\u{201C}"),
        ("rdquo;", "\u{201D}"),
        // Currency
        ("cent;", "\u{00A2}"),
        ("cent", "\u{00A2}"),
        ("pound;", "\u{00A3}"),
        ("pound", "\u{00A3}"),
        ("yen;", "\u{00A5}"),
        ("yen", "\u{00A5}"),
        ("euro;", "\u{20AC}"),
        // Math
        ("times;", "\u{00D7}"),
        ("times", "\u{00D7}"),
        ("divide;", "\u{00F7}"),
        ("divide", "\u{00F7}"),
        ("plusmn;", "\u{00B1}"),
        ("plusmn", "\u{00B1}"),
        ("deg;", "\u{00B0}"),
        ("deg", "\u{00B0}"),
        ("frac12;", "\u{00BD}"),
        ("frac12", "\u{00BD}"),
        ("frac14;", "\u{00BC}"),
        ("frac14", "\u{00BC}"),
        ("frac34;", "\u{00BE}"),
        ("frac34", "\u{00BE}"),
        ("ne;", "\u{2260}"),
        ("le;", "\u{2264}"),
        ("ge;", "\u{2265}"),
        // Arrows
        ("larr;", "\u{2190}"),
        ("rarr;", "\u{2192}"),
        ("uarr;", "\u{2191}"),
        ("darr;", "\u{2193}"),
        // Greek
        ("alpha;", "\u{03B1}"),
        ("beta;", "\u{03B2}"),
        ("gamma;", "\u{03B3}"),
        ("delta;", "\u{03B4}"),
        ("pi;", "\u{03C0}"),
        ("sigma;", "\u{03C3}"),
        ("omega;", "\u{03C9}"),
        // Accented letters
        ("Agrave;", "\u{00C0}"),
        ("Agrave", "\u{00C0}"),
        ("Aacute;", "\u{00C1}"),
        ("Aacute", "\u{00C1}"),
        ("Auml;", "\u{00C4}"),
        ("Auml", "\u{00C4}"),
        ("agrave;", "\u{00E0}"),
        ("agrave", "\u{00E0}"),
        ("aacute;", "\u{00E1}"),
        ("aacute", "\u{00E1}"),
        ("auml;", "\u{00E4}"),
        ("auml", "\u{00E4}"),
        ("Eacute;", "\u{00C9}"),
        ("Eacute", "\u{00C9}"),
        ("eacute;", "\u{00E9}"),
        ("eacute", "\u{00E9}"),
        ("egrave;", "\u{00E8}"),
        ("egrave", "\u{00E8}"),
        ("iacute;", "\u{00ED}"),
        ("iacute", "\u{00ED}"),
        ("oacute;", "\u{00F3}"),
        ("oacute", "\u{00F3}"),
        ("ouml;", "\u{00F6}"),
        ("ouml", "\u{00F6}"),
        ("Ouml;", "\u{00D6}"),
        ("Ouml", "\u{00D6}"),
        ("uacute;", "\u{00FA}"),
        ("uacute", "\u{00FA}"),
        ("uuml;", "\u{00FC}"),
        ("uuml", "\u{00FC}"),
        ("Uuml;", "\u{00DC}"),
        ("Uuml", "\u{00DC}"),
        ("ntilde;", "\u{00F1}"),
        ("ntilde", "\u{00F1}"),
        ("ccedil;", "\u{00E7}"),
        ("ccedil", "\u{00E7}"),
        ("szlig;", "\u{00DF}"),
        ("szlig", "\u{00DF}"),
        // More Greek
        ("Alpha;", "\u{0391}"),
        ("Beta;", "\u{0392}"),
        ("Gamma;", "\u{0393}"),
        ("Delta;", "\u{0394}"),
        ("Epsilon;", "\u{0395}"),
        ("Zeta;", "\u{0396}"),
        ("Eta;", "\u{0397}"),
        ("Theta;", "\u{0398}"),
        ("Iota;", "\u{0399}"),
        ("Kappa;", "\u{039A}"),
        ("Lambda;", "\u{039B}"),
        ("Mu;", "\u{039C}"),
        ("Nu;", "\u{039D}"),
        ("Xi;", "\u{039E}"),
        ("Omicron;", "\u{039F}"),
        ("Pi;", "\u{03A0}"),
        ("Rho;", "\u{03A1}"),
        ("Sigma;", "\u{03A3}"),
        ("Tau;", "\u{03A4}"),
        ("Upsilon;", "\u{03A5}"),
        ("Phi;", "\u{03A6}"),
        ("Chi;", "\u{03A7}"),
        ("Psi;", "\u{03A8}"),
        ("Omega;", "\u{03A9}"),
        ("epsilon;", "\u{03B5}"),
        ("zeta;", "\u{03B6}"),
        ("eta;", "\u{03B7}"),
        ("theta;", "\u{03B8}"),
        ("iota;", "\u{03B9}"),
        ("kappa;", "\u{03BA}"),
        ("lambda;", "\u{03BB}"),
        ("mu;", "\u{03BC}"),
        ("nu;", "\u{03BD}"),
        ("xi;", "\u{03BE}"),
        ("omicron;", "\u{03BF}"),
        ("rho;", "\u{03C1}"),
        ("sigmaf;", "\u{03C2}"),
        ("tau;", "\u{03C4}"),
        ("upsilon;", "\u{03C5}"),
        ("phi;", "\u{03C6}"),
        ("chi;", "\u{03C7}"),
        ("psi;", "\u{03C8}"),
        // General punctuation, arrows, math and symbols
        ("thetasym;", "\u{03D1}"),
        ("piv;", "\u{03D6}"),
        ("ensp;", "\u{2002}"),
        ("emsp;", "\u{2003}"),
        ("thinsp;", "\u{2009}"),
        ("zwnj;", "\u{200C}"),
        ("zwj;", "\u{200D}"),
        ("lrm;", "\u{200E}"),
        ("rlm;", "\u{200F}"),
        ("sbquo;", "\u{201A}"),
        ("bdquo;", "\u{201E}"),
        ("dagger;", "\u{2020}"),
        ("Dagger;", "\u{2021}"),
        ("permil;", "\u{2030}"),
        ("prime;", "\u{2032}"),
        ("Prime;", "\u{2033}"),
        ("lsaquo;", "\u{2039}"),
        ("rsaquo;", "\u{203A}"),
        ("oline;", "\u{203E}"),
        ("frasl;", "\u{2044}"),
        ("harr;", "\u{2194}"),
        ("crarr;", "\u{21B5}"),
        ("lArr;", "\u{21D0}"),
        ("uArr;", "\u{21D1}"),
        ("rArr;", "\u{21D2}"),
        ("dArr;", "\u{21D3}"),
        ("hArr;", "\u{21D4}"),
        ("rarrw;", "\u{219D}"),
        ("forall;", "\u{2200}"),
        ("part;", "\u{2202}"),
        ("exist;", "\u{2203}"),
        ("empty;", "\u{2205}"),
        ("nabla;", "\u{2207}"),
        ("isin;", "\u{2208}"),
        ("notin;", "\u{2209}"),
        ("ni;", "\u{220B}"),
        ("prod;", "\u{220F}"),
        ("sum;", "\u{2211}"),
        ("minus;", "\u{2212}"),
        ("lowast;", "\u{2217}"),
        ("radic;", "\u{221A}"),
        ("prop;", "\u{221D}"),
        ("infin;", "\u{221E}"),
        ("ang;", "\u{2220}"),
        ("and;", "\u{2227}"),
        ("or;", "\u{2228}"),
        ("cap;", "\u{2229}"),
        ("cup;", "\u{222A}"),
        ("int;", "\u{222B}"),
        ("there4;", "\u{2234}"),
        ("sim;", "\u{223C}"),
        ("cong;", "\u{2245}"),
        ("asymp;", "\u{2248}"),
        ("equiv;", "\u{2261}"),
        ("sub;", "\u{2282}"),
        ("sup;", "\u{2283}"),
        ("nsub;", "\u{2284}"),
        ("sube;", "\u{2286}"),
        ("supe;", "\u{2287}"),
        ("oplus;", "\u{2295}"),
        ("otimes;", "\u{2297}"),
        ("perp;", "\u{22A5}"),
        ("sdot;", "\u{22C5}"),
        ("lceil;", "\u{2308}"),
        ("rceil;", "\u{2309}"),
        ("lfloor;", "\u{230A}"),
        ("rfloor;", "\u{230B}"),
        ("loz;", "\u{25CA}"),
        ("spades;", "\u{2660}"),
        ("clubs;", "\u{2663}"),
        ("hearts;", "\u{2665}"),
        ("diams;", "\u{2666}"),
        ("circ;", "\u{02C6}"),
        ("tilde;", "\u{02DC}"),
        ("fnof;", "\u{0192}"),
        ("OElig;", "\u{0152}"),
        ("oelig;", "\u{0153}"),
        ("Scaron;", "\u{0160}"),
        ("scaron;", "\u{0161}"),
        ("Yuml;", "\u{0178}"),
        // Remaining Latin-1
        ("curren;", "\u{00A4}"),
        ("curren", "\u{00A4}"),
        ("brvbar;", "\u{00A6}"),
        ("brvbar", "\u{00A6}"),
        ("uml;", "\u{00A8}"),
        ("uml", "\u{00A8}"),
        ("ordf;", "\u{00AA}"),
        ("ordf", "\u{00AA}"),
        ("macr;", "\u{00AF}"),
        ("macr", "\u{00AF}"),
        ("sup2;", "\u{00B2}"),
        ("sup2", "\u{00B2}"),
        ("sup3;", "\u{00B3}"),
        ("sup3", "\u{00B3}"),
        ("acute;", "\u{00B4}"),
        ("acute", "\u{00B4}"),
        ("micro;", "\u{00B5}"),
        ("micro", "\u{00B5}"),
        ("cedil;", "\u{00B8}"),
        ("cedil", "\u{00B8}"),
        ("sup1;", "\u{00B9}"),
        ("sup1", "\u{00B9}"),
        ("ordm;", "\u{00BA}"),
        ("ordm", "\u{00BA}"),
        ("Acirc;", "\u{00C2}"),
        ("Acirc", "\u{00C2}"),
        ("Atilde;", "\u{00C3}"),
        ("Atilde", "\u{00C3}"),
        ("Aring;", "\u{00C5}"),
        ("Aring", "\u{00C5}"),
        ("AElig;", "\u{00C6}"),
        ("AElig", "\u{00C6}"),
        ("Ccedil;", "\u{00C7}"),
        ("Ccedil", "\u{00C7}"),
        ("Egrave;", "\u{00C8}"),
        ("Egrave", "\u{00C8}"),
        ("Ecirc;", "\u{00CA}"),
        ("Ecirc", "\u{00CA}"),
        ("Euml;", "\u{00CB}"),
        ("Euml", "\u{00CB}"),
        ("Igrave;", "\u{00CC}"),
        ("Igrave", "\u{00CC}"),
        ("Iacute;", "\u{00CD}"),
        ("Iacute", "\u{00CD}"),
        ("Icirc;", "\u{00CE}"),
        ("Icirc", "\u{00CE}"),
        ("Iuml;", "\u{00CF}"),
        ("Iuml", "\u{00CF}"),
        ("ETH;", "\u{00D0}"),
        ("ETH", "\u{00D0}"),
        ("Ntilde;", "\u{00D1}"),
        ("Ntilde", "\u{00D1}"),
        ("Ograve;", "\u{00D2}"),
        ("Ograve", "\u{00D2}"),
        ("Oacute;", "\u{00D3}"),
        ("Oacute", "\u{00D3}"),
        ("Ocirc;", "\u{00D4}"),
        ("Ocirc", "\u{00D4}"),
        ("Otilde;", "\u{00D5}"),
        ("Otilde", "\u{00D5}"),
        ("Oslash;", "\u{00D8}"),
        ("Oslash", "\u{00D8}"),
        ("Ugrave;", "\u{00D9}"),
        ("Ugrave", "\u{00D9}"),
        ("Uacute;", "\u{00DA}"),
        ("Uacute", "\u{00DA}"),
        ("Ucirc;", "\u{00DB}"),
        ("Ucirc", "\u{00DB}"),
        ("Yacute;", "\u{00DD}"),
        ("Yacute", "\u{00DD}"),
        ("THORN;", "\u{00DE}"),
        ("THORN", "\u{00DE}"),
        ("acirc;", "\u{00E2}"),
        ("acirc", "\u{00E2}"),
        ("atilde;", "\u{00E3}"),
        ("atilde", "\u{00E3}"),
        ("aring;", "\u{00E5}"),
        ("aring", "\u{00E5}"),
        ("aelig;", "\u{00E6}"),
        ("aelig", "\u{00E6}"),
        ("ecirc;", "\u{00EA}"),
        ("ecirc", "\u{00EA}"),
        ("euml;", "\u{00EB}"),
        ("euml", "\u{00EB}"),
        ("igrave;", "\u{00EC}"),
        ("igrave", "\u{00EC}"),
        ("icirc;", "\u{00EE}"),
        ("icirc", "\u{00EE}"),
        ("iuml;", "\u{00EF}"),
        ("iuml", "\u{00EF}"),
        ("eth;", "\u{00F0}"),
        ("eth", "\u{00F0}"),
        ("ograve;", "\u{00F2}"),
        ("ograve", "\u{00F2}"),
        ("ocirc;", "\u{00F4}"),
        ("ocirc", "\u{00F4}"),
        ("otilde;", "\u{00F5}"),
        ("otilde", "\u{00F5}"),
        ("oslash;", "\u{00F8}"),
        ("oslash", "\u{00F8}"),
        ("ugrave;", "\u{00F9}"),
        ("ugrave", "\u{00F9}"),
        ("ucirc;", "\u{00FB}"),
        ("ucirc", "\u{00FB}"),
        ("yacute;", "\u{00FD}"),
        ("yacute", "\u{00FD}"),
        ("thorn;", "\u{00FE}"),
        ("thorn", "\u{00FE}"),
        ("yuml;", "\u{00FF}"),
        ("yuml", "\u{00FF}"),
    ])
});

/// Code points 0x80..=0x9F in numeric references are read as Windows-1252.
const WINDOWS_1252: [char; 32] = [
    '\u{20AC}', '\u{0081}', '\u{201A}', '\u{0192}', '\u{201E}', '\u{2026}', '\u{2020}',
    '\u{2021}', '\u{02C6}', '\u{2030}', '\u{0160}', '\u{2039}', '\u{0152}', '\u{008D}',
    '\u{017D}', '\u{008F}', '\u{0090}', '\u{2018}', '\u{2019}', '\u{201C}', '\u{201D}',
    '\u{2022}', '\u{2013}', '\u{2014}', '\u{02DC}', '\u{2122}', '\u{0161}', '\u{203A}',
    '\u{0153}', '\u{009D}', '\u{017E}', '\u{0178}',
];

/// Look up a named character reference.
///
/// The `name` should NOT include the leading '&'.
pub fn lookup_entity(name: &str) -> Option<&'static str> {
    NAMED_ENTITIES.get(name).copied()
}

/// Decode character references in `input`.
///
/// `attribute` selects attribute-value rules: an unterminated name followed by
/// `=` is left alone, and unknown names are never split into a legacy prefix.
/// Anything that does not decode is copied through unchanged.
pub fn unescape(input: &str, attribute: bool) -> Cow<'_, str> {
    if !input.contains('&') {
        return Cow::Borrowed(input);
    }

    let mut out = String::with_capacity(input.len());
    let mut rest = input;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let after = &rest[amp + 1..];
        match decode_reference(after, attribute, &mut out) {
            Some(consumed) => rest = &after[consumed..],
            None => {
                out.push('&');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    Cow::Owned(out)
}

/// Escape `input` so that scanning it back and calling [`unescape`] in the
/// same mode yields `input` again.
///
/// Always escapes `&`, line breaks, and a `{` that would open a mustache.
/// Attribute values also escape `"`. Text also escapes `<` and a leading
/// space or tab, which would otherwise be dropped after an indented line.
pub fn escape(input: &str, attribute: bool) -> Cow<'_, str> {
    let mut out: Option<String> = None;
    let mut chars = input.char_indices().peekable();

    while let Some((i, ch)) = chars.next() {
        let replacement = match ch {
            '&' => Some("&amp;"),
            '{' if chars.peek().map(|&(_, next)| next) == Some('{') => Some("&#123;"),
            '\n' => Some("&#10;"),
            '\r' => Some("&#13;"),
            '\u{000C}' => Some("&#12;"),
            '"' if attribute => Some("&quot;"),
            '<' if !attribute => Some("&lt;"),
            ' ' if !attribute && i == 0 => Some("&#32;"),
            '\t' if !attribute && i == 0 => Some("&#9;"),
            _ => None,
        };

        match replacement {
            Some(escaped) => out
                .get_or_insert_with(|| input[..i].to_string())
                .push_str(escaped),
            None => {
                if let Some(out) = &mut out {
                    out.push(ch);
                }
            }
        }
    }

    match out {
        Some(out) => Cow::Owned(out),
        None => Cow::Borrowed(input),
    }
}

/// Decode the reference starting right after an `&`, returning the number of
/// bytes consumed.
fn decode_reference(s: &str, attribute: bool, out: &mut String) -> Option<usize> {
    if let Some(numeric) = s.strip_prefix('#') {
        return decode_numeric(numeric, out).map(|consumed| consumed + 1);
    }

    let name_len = s.bytes().take_while(u8::is_ascii_alphanumeric).count();
    if name_len == 0 {
        return None;
    }
    let terminated = s[name_len..].starts_with(';');

    if attribute && !terminated && s[name_len..].starts_with('=') {
        return None;
    }

    let name = &s[..name_len + usize::from(terminated)];
    if let Some(replacement) = lookup_entity(name) {
        out.push_str(replacement);
        return Some(name.len());
    }

    if attribute {
        return None;
    }

    // `&notit;` reads as `&not` followed by `it;`.
    (2..=name_len).rev().find_map(|len| {
        lookup_entity(&s[..len]).map(|replacement| {
            out.push_str(replacement);
            len
        })
    })
}

fn decode_numeric(s: &str, out: &mut String) -> Option<usize> {
    let (radix, start) = match s.as_bytes().first() {
        Some(b'x' | b'X') => (16, 1),
        _ => (10, 0),
    };
    let digits_len = s[start..]
        .chars()
        .take_while(|c| c.is_digit(radix))
        .count();
    if digits_len == 0 {
        return None;
    }

    let digits = &s[start..start + digits_len];
    let mut end = start + digits_len;
    if s[end..].starts_with(';') {
        end += 1;
    }

    let value = u32::from_str_radix(digits, radix).unwrap_or(u32::MAX);
    out.push(numeric_char(value));
    Some(end)
}

fn numeric_char(value: u32) -> char {
    match value {
        0x80..=0x9F => WINDOWS_1252[(value - 0x80) as usize],
        0 => char::REPLACEMENT_CHARACTER,
        _ => char::from_u32(value).unwrap_or(char::REPLACEMENT_CHARACTER),
    }
}
