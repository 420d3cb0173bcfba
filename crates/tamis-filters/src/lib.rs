//! Declarative filter sets for Tamis
//!
//! A filter set maps user-facing parameters onto queryset constraints:
//!
//! - [`Filter`] declares one parameter: the model path, the lookup, the kind
//!   of form field it binds through
//! - [`FilterSetBuilder`] collects declared and generated filters into an
//!   immutable [`FilterSetSpec`], shareable across threads
//! - [`BoundFilterSet`] binds one request's [`QueryDict`](tamis_forms::QueryDict),
//!   validates it through a [`FilterForm`] and composes the queryset
//! - [`OrderBy`] adds an optional sort parameter, applied last
//!
//! Invalid input never filters: the queryset falls back to the base
//! queryset and the errors stay on the form for display.
//!
//! # Examples
//!
//! ```
//! use tamis_filters::{Filter, FilterSetBuilder, OrderBy};
//! use tamis_query::{FieldInfo, FieldKind, FieldRef, Lookup, Manager, Model, Record, Schema, Value};
//!
//! #[derive(Clone)]
//! struct Product {
//!     id: i64,
//!     name: &'static str,
//!     price: i64,
//! }
//!
//! impl Record for Product {
//!     fn field(&self, name: &str) -> Option<FieldRef<'_>> {
//!         match name {
//!             "id" => Some(FieldRef::Value(self.id.into())),
//!             "name" => Some(FieldRef::Value(self.name.into())),
//!             "price" => Some(FieldRef::Value(self.price.into())),
//!             _ => None,
//!         }
//!     }
//!
//!     fn primary_key(&self) -> Value {
//!         self.id.into()
//!     }
//! }
//!
//! impl Model for Product {
//!     fn schema() -> Schema {
//!         Schema::new("product", "id")
//!             .field(FieldInfo::new("id", FieldKind::AutoField))
//!             .field(FieldInfo::new("name", FieldKind::Char))
//!             .field(FieldInfo::new("price", FieldKind::Integer))
//!     }
//! }
//!
//! let products = Manager::new(vec![
//!     Product { id: 1, name: "Anvil", price: 120 },
//!     Product { id: 2, name: "Rocket", price: 80 },
//!     Product { id: 3, name: "Kite", price: 15 },
//! ]);
//!
//! let spec = FilterSetBuilder::<Product>::new()
//!     .filter(Filter::number("price").with_lookup(Lookup::Lt))
//!     .fields(&["name", "price"])
//!     .order_by(OrderBy::All)
//!     .build()
//!     .unwrap();
//!
//! let filtered = spec.bind_query_string("price=100&order_by=-price", &products).unwrap();
//! let names: Vec<&str> = filtered.iter().map(|p| p.name).collect();
//! assert_eq!(names, vec!["Rocket", "Kite"]);
//! ```

pub mod bound;
pub mod config;
pub mod error;
pub mod filter;
pub mod filterset;
pub mod kind;
pub mod ordering;

pub use bound::{BoundFilterSet, FilterForm, FilterSetState};
pub use config::{ALL_FIELDS, ANY_LOOKUP, FieldsSetting, FilterConfig, FilterSetConfig, LookupSetting, OrderBySetting};
pub use error::{ConfigResult, ConfigurationError};
pub use filter::{ChoiceSource, Filter, FilterAction, LookupChoice};
pub use filterset::{FieldSelection, FilterSetBuilder, FilterSetSpec};
pub use kind::{DATE_RANGE_OPTIONS, FilterKind, FilterValue, NON_LETTER};
pub use ordering::{DEFAULT_ORDER_BY_PARAM, OrderBy, OrderingFieldFactory, default_ordering_field};
