//! Filter sets.

#[cfg(feature = "filters")]
pub use tamis_filters::*;
