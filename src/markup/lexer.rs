/// Tags recognized by the markup grammar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Tag {
    Bold,
    Italic,
    Underline,
    Break,
    /// Any other well-formed tag; treated as transparent by the parser.
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Token {
    Text(String),
    Open(Tag),
    Close(Tag),
    /// `<tag/>` form.
    SelfClosing(Tag),
}

/// Split markup into text and tag tokens.
///
/// A `<` that does not start a well-formed tag is kept as literal text, so plain comparisons such
/// as `a < b` survive. Entities in text are decoded.
pub(crate) fn lex(input: &str) -> Vec<Token> {
    let mut out = Vec::new();
    let mut text = String::new();
    let mut rest = input;

    while let Some(lt) = rest.find('<') {
        text.push_str(&rest[..lt]);
        let after = &rest[lt..];
        match lex_tag(after) {
            Some((tok, consumed)) => {
                flush_text(&mut text, &mut out);
                out.push(tok);
                rest = &after[consumed..];
            }
            None => {
                text.push('<');
                rest = &after[1..];
            }
        }
    }
    text.push_str(rest);
    flush_text(&mut text, &mut out);
    out
}

fn flush_text(text: &mut String, out: &mut Vec<Token>) {
    if text.is_empty() {
        return;
    }
    let decoded = decode_entities(text);
    text.clear();
    if let Some(Token::Text(prev)) = out.last_mut() {
        prev.push_str(&decoded);
    } else {
        out.push(Token::Text(decoded));
    }
}

// `s` starts with '<'. Returns the token and the number of bytes consumed.
fn lex_tag(s: &str) -> Option<(Token, usize)> {
    let bytes = s.as_bytes();
    let mut i = 1usize;
    let closing = bytes.get(i) == Some(&b'/');
    if closing {
        i += 1;
    }

    let name_start = i;
    if !bytes.get(i).is_some_and(u8::is_ascii_alphabetic) {
        return None;
    }
    while bytes.get(i).is_some_and(u8::is_ascii_alphanumeric) {
        i += 1;
    }
    let name = &s[name_start..i];

    // Attributes are tolerated and ignored; quoted values may contain '>'.
    let mut quote: Option<u8> = None;
    let mut self_closing = false;
    loop {
        let &c = bytes.get(i)?;
        match quote {
            Some(q) if c == q => quote = None,
            Some(_) => {}
            None => match c {
                b'"' | b'\'' => quote = Some(c),
                b'<' => return None,
                b'>' => break,
                b'/' => self_closing = true,
                c if !c.is_ascii_whitespace() => self_closing = false,
                _ => {}
            },
        }
        i += 1;
    }
    let consumed = i + 1;

    let tag = match name.to_ascii_lowercase().as_str() {
        "b" => Tag::Bold,
        "i" => Tag::Italic,
        "u" => Tag::Underline,
        "br" => Tag::Break,
        _ => Tag::Unknown,
    };
    let tok = if closing {
        Token::Close(tag)
    } else if self_closing {
        Token::SelfClosing(tag)
    } else {
        Token::Open(tag)
    };
    Some((tok, consumed))
}

/// Decode the small set of HTML entities that commonly appear in slide text.
///
/// Unknown or malformed entities are left as written.
pub(crate) fn decode_entities(s: &str) -> String {
    if !s.contains('&') {
        return s.to_string();
    }

    let mut out = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let after = &rest[amp..];
        let decoded = after
            .find(';')
            .filter(|&semi| semi <= 10)
            .and_then(|semi| decode_entity(&after[1..semi]).map(|c| (c, semi + 1)));
        match decoded {
            Some((c, consumed)) => {
                out.push(c);
                rest = &after[consumed..];
            }
            None => {
                out.push('&');
                rest = &after[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

fn decode_entity(name: &str) -> Option<char> {
    if let Some(num) = name.strip_prefix('#') {
        let code = match num.strip_prefix(['x', 'X']) {
            Some(hex) => u32::from_str_radix(hex, 16).ok()?,
            None => num.parse::<u32>().ok()?,
        };
        return char::from_u32(code);
    }
    match name.to_ascii_lowercase().as_str() {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        "nbsp" => Some('\u{a0}'),
        _ => None,
    }
}

#[cfg(test)]
#[path = "../../tests/unit/markup/lexer.rs"]
mod tests;
