use crate::markup::lexer::{Tag, Token, lex};

/// Markup AST over the closed tag set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    /// Literal text (entities already decoded).
    Text(String),
    /// `<b>…</b>`.
    Bold(Vec<Node>),
    /// `<i>…</i>`.
    Italic(Vec<Node>),
    /// `<u>…</u>`.
    Underline(Vec<Node>),
    /// `<br>`.
    Break,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Container {
    Bold,
    Italic,
    Underline,
}

impl Container {
    fn from_tag(tag: Tag) -> Option<Self> {
        match tag {
            Tag::Bold => Some(Self::Bold),
            Tag::Italic => Some(Self::Italic),
            Tag::Underline => Some(Self::Underline),
            Tag::Break | Tag::Unknown => None,
        }
    }

    fn wrap(self, children: Vec<Node>) -> Node {
        match self {
            Self::Bold => Node::Bold(children),
            Self::Italic => Node::Italic(children),
            Self::Underline => Node::Underline(children),
        }
    }
}

/// Parse slide markup into an AST.
///
/// Parsing is total: unknown tags are transparent, unclosed tags close at end of input, stray
/// closing tags are dropped, and closing an outer tag closes everything opened inside it.
pub fn parse_markup(src: &str) -> Vec<Node> {
    let mut p = Parser {
        stack: vec![(None, Vec::new())],
    };
    for tok in lex(src) {
        p.feed(tok);
    }
    p.finish()
}

struct Parser {
    // Root frame has no container.
    stack: Vec<(Option<Container>, Vec<Node>)>,
}

impl Parser {
    fn top(&mut self) -> &mut Vec<Node> {
        let last = self.stack.len() - 1;
        &mut self.stack[last].1
    }

    fn feed(&mut self, tok: Token) {
        match tok {
            Token::Text(s) => self.top().push(Node::Text(s)),
            Token::Open(Tag::Break) | Token::SelfClosing(Tag::Break) => {
                self.top().push(Node::Break);
            }
            Token::Open(tag) => {
                if let Some(c) = Container::from_tag(tag) {
                    self.stack.push((Some(c), Vec::new()));
                }
            }
            // `<b/>` opens and closes nothing.
            Token::SelfClosing(_) => {}
            Token::Close(tag) => {
                if let Some(c) = Container::from_tag(tag) {
                    self.close(c);
                }
            }
        }
    }

    fn close(&mut self, target: Container) {
        let Some(depth) = self.stack.iter().rposition(|(c, _)| *c == Some(target)) else {
            return;
        };
        while self.stack.len() > depth {
            self.pop_frame();
        }
    }

    fn pop_frame(&mut self) {
        if self.stack.len() <= 1 {
            return;
        }
        if let Some((Some(c), children)) = self.stack.pop() {
            self.top().push(c.wrap(children));
        }
    }

    fn finish(mut self) -> Vec<Node> {
        while self.stack.len() > 1 {
            self.pop_frame();
        }
        self.stack.pop().map(|(_, nodes)| nodes).unwrap_or_default()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/markup/parser.rs"]
mod tests;
