use super::*;

fn text(s: &str) -> Token {
    Token::Text(s.to_string())
}

#[test]
fn lexes_closed_tag_set() {
    assert_eq!(
        lex("a<b>b</b><i>c</i><u>d</u><br>e"),
        vec![
            text("a"),
            Token::Open(Tag::Bold),
            text("b"),
            Token::Close(Tag::Bold),
            Token::Open(Tag::Italic),
            text("c"),
            Token::Close(Tag::Italic),
            Token::Open(Tag::Underline),
            text("d"),
            Token::Close(Tag::Underline),
            Token::Open(Tag::Break),
            text("e"),
        ]
    );
}

#[test]
fn tags_are_case_insensitive_and_allow_self_closing_break() {
    assert_eq!(
        lex("<B>x</B><BR/><br />"),
        vec![
            Token::Open(Tag::Bold),
            text("x"),
            Token::Close(Tag::Bold),
            Token::SelfClosing(Tag::Break),
            Token::SelfClosing(Tag::Break),
        ]
    );
}

#[test]
fn unknown_tags_and_attributes() {
    assert_eq!(
        lex("<span class=\"a>b\">x</span>"),
        vec![
            Token::Open(Tag::Unknown),
            text("x"),
            Token::Close(Tag::Unknown),
        ]
    );
}

#[test]
fn stray_angle_brackets_stay_literal() {
    assert_eq!(lex("1 < 2 and 3 > 2"), vec![text("1 < 2 and 3 > 2")]);
    assert_eq!(lex("<<b>x"), vec![text("<"), Token::Open(Tag::Bold), text("x")]);
    assert_eq!(lex("trailing <b"), vec![text("trailing <b")]);
}

#[test]
fn entities_decode_in_text() {
    assert_eq!(decode_entities("a &amp; b &lt;c&gt;"), "a & b <c>");
    assert_eq!(decode_entities("&#65;&#x42;&AMP;"), "AB&");
    assert_eq!(decode_entities("fish & chips"), "fish & chips");
    assert_eq!(decode_entities("&bogus;"), "&bogus;");
    assert_eq!(lex("&lt;b&gt;"), vec![text("<b>")]);
}
