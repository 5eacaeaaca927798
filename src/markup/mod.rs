//! Inline markup: a closed `<b> <i> <u> <br>` grammar lexed, parsed into a tagged AST, and
//! flattened into styled runs.

pub(crate) mod lexer;
pub(crate) mod parser;
pub(crate) mod runs;
