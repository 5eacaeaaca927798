//! Script parsing: one slide per line, options after `--` separators.

pub(crate) mod color;
pub(crate) mod parse;
