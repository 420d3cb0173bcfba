//! Lazy querysets for Tamis
//!
//! This crate provides the query layer the filter sets compose over:
//! - Django-style field lookups (`exact`, `icontains`, `range`, `isnull`, ...)
//! - Relationship paths (`manufacturer__country__code`) resolved against a static [`Schema`]
//! - Composable conditions with `&`, `|` and `!`
//! - A lazily evaluated [`QuerySet`] over an in-memory [`Manager`] table

pub mod condition;
pub mod error;
pub mod lookup;
pub mod manager;
pub mod model;
pub mod queryset;
pub mod schema;
pub mod value;

pub use condition::Condition;
pub use error::{QueryError, QueryResult};
pub use lookup::{LOOKUP_SEP, Lookup};
pub use manager::Manager;
pub use model::{FieldRef, Model, Record, RecordExt, resolve_path};
pub use queryset::{OrderingTerm, QuerySet, Step};
pub use schema::{FieldInfo, FieldKind, ResolvedField, Schema};
pub use value::Value;
