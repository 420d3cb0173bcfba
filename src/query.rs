//! Querysets, lookups and conditions.
//!
//! # Examples
//!
//! ```rust
//! use tamis::query::{Condition, Lookup};
//!
//! let cheap = Condition::new("price", Lookup::Lt, 100);
//! assert_eq!(cheap.to_string(), "price__lt=100");
//! ```

pub use tamis_query::*;
