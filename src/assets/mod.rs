pub(crate) mod fonts;
