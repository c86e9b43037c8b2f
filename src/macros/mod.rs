//! Internal macros, mostly conditional compilation helpers for cargo features.
#[macro_use]
pub(crate) mod feature_cfg;
