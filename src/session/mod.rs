pub(crate) mod deck;
pub(crate) mod export;
