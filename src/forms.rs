//! Form fields and query-string binding.
//!
//! # Examples
//!
//! ```rust
//! # #[cfg(feature = "forms")]
//! # {
//! use tamis::forms::QueryDict;
//!
//! let data = QueryDict::parse("tag=a&tag=b").unwrap();
//! assert_eq!(data.get_list("tag"), ["a", "b"]);
//! # }
//! ```

#[cfg(feature = "forms")]
pub use tamis_forms::*;
