pub(crate) mod cache;
pub(crate) mod cpu;
pub(crate) mod fingerprint;
pub(crate) mod surface;
