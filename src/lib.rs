//! # Tamis
//!
//! Declarative, Django-filter style query filtering for Rust.
//!
//! A filter set turns user-facing query parameters (`?price=100&order_by=-price`)
//! into constraints on a lazily evaluated queryset. Filters are declared
//! once with a builder, bound per request, validated through form fields,
//! and composed in declaration order with the chosen ordering applied last.
//!
//! ## Feature Flags
//!
//! - `minimal` - Querysets, lookups and conditions only
//! - `forms` - Form fields, `Form` and `QueryDict`
//! - `filters` - Filter sets (implies `forms`)
//! - `full` (default) - Everything
//!
//! ## Quick Example
//!
//! ```rust
//! use tamis::prelude::*;
//!
//! #[derive(Clone)]
//! struct Book {
//!     id: i64,
//!     title: &'static str,
//!     pages: i64,
//! }
//!
//! impl Record for Book {
//!     fn field(&self, name: &str) -> Option<FieldRef<'_>> {
//!         match name {
//!             "id" => Some(FieldRef::Value(self.id.into())),
//!             "title" => Some(FieldRef::Value(self.title.into())),
//!             "pages" => Some(FieldRef::Value(self.pages.into())),
//!             _ => None,
//!         }
//!     }
//!
//!     fn primary_key(&self) -> Value {
//!         self.id.into()
//!     }
//! }
//!
//! impl Model for Book {
//!     fn schema() -> Schema {
//!         Schema::new("book", "id")
//!             .field(FieldInfo::new("id", FieldKind::AutoField))
//!             .field(FieldInfo::new("title", FieldKind::Char))
//!             .field(FieldInfo::new("pages", FieldKind::Integer))
//!     }
//! }
//!
//! let books = Manager::new(vec![
//!     Book { id: 1, title: "Dune", pages: 412 },
//!     Book { id: 2, title: "Emma", pages: 474 },
//!     Book { id: 3, title: "Ubik", pages: 202 },
//! ]);
//!
//! let spec = FilterSetBuilder::<Book>::new()
//!     .filter(Filter::number("pages").with_lookup(Lookup::Gte))
//!     .fields(&["title", "pages"])
//!     .order_by(OrderBy::All)
//!     .build()
//!     .unwrap();
//!
//! let long_reads = spec.bind_query_string("pages=400&order_by=-title", &books).unwrap();
//! let titles: Vec<&str> = long_reads.iter().map(|b| b.title).collect();
//! assert_eq!(titles, vec!["Emma", "Dune"]);
//! ```

pub mod filters;
pub mod forms;
pub mod query;

// Re-export queryset layer
pub use tamis_query::{
	Condition, FieldInfo, FieldKind, FieldRef, Lookup, Manager, Model, OrderingTerm, QueryError,
	QueryResult, QuerySet, Record, RecordExt, Schema, Value,
};

// Re-export forms
#[cfg(feature = "forms")]
pub use tamis_forms::{
	BoundField, Choices, FieldError, FieldResult, Form, FormError, FormField, FormResult, QueryDict,
	Widget,
};

// Re-export filter sets
#[cfg(feature = "filters")]
pub use tamis_filters::{
	BoundFilterSet, ConfigResult, ConfigurationError, Filter, FilterForm, FilterKind,
	FilterSetBuilder, FilterSetConfig, FilterSetSpec, FilterSetState, FilterValue, LookupChoice,
	OrderBy,
};

/// Prelude module for convenient imports
///
/// Import commonly used types with:
/// ```rust
/// use tamis::prelude::*;
/// ```
pub mod prelude {
	// Queryset layer - always available
	pub use crate::{
		Condition, FieldInfo, FieldKind, FieldRef, Lookup, Manager, Model, QuerySet, Record,
		RecordExt, Schema, Value,
	};

	#[cfg(feature = "forms")]
	pub use crate::{FormField, QueryDict};

	#[cfg(feature = "filters")]
	pub use crate::{
		BoundFilterSet, Filter, FilterKind, FilterSetBuilder, FilterSetSpec, FilterValue, OrderBy,
	};
}
