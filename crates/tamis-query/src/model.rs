//! Record access for in-memory evaluation.

use crate::lookup::LOOKUP_SEP;
use crate::schema::Schema;
use crate::value::Value;

/// What a record holds under one field name.
pub enum FieldRef<'a> {
	Value(Value),
	/// Many-to-one relation, `None` when the foreign key is null.
	One(Option<&'a dyn Record>),
	/// Many-to-many or reverse relation.
	Many(Vec<&'a dyn Record>),
}

/// Object-safe field access, so relation hops can return any related model.
pub trait Record {
	/// Look up a field by its schema name. `None` for unknown names.
	fn field(&self, name: &str) -> Option<FieldRef<'_>>;

	fn primary_key(&self) -> Value;
}

/// A model type the queryset layer can filter.
///
/// # Examples
///
/// ```
/// use tamis_query::{FieldInfo, FieldKind, FieldRef, Model, Record, RecordExt, Schema, Value};
///
/// #[derive(Clone)]
/// struct Tag {
///     id: i64,
///     label: String,
/// }
///
/// impl Record for Tag {
///     fn field(&self, name: &str) -> Option<FieldRef<'_>> {
///         match name {
///             "id" => Some(FieldRef::Value(self.id.into())),
///             "label" => Some(FieldRef::Value(self.label.as_str().into())),
///             _ => None,
///         }
///     }
///
///     fn primary_key(&self) -> Value {
///         self.id.into()
///     }
/// }
///
/// impl Model for Tag {
///     fn schema() -> Schema {
///         Schema::new("tag", "id")
///             .field(FieldInfo::new("id", FieldKind::AutoField))
///             .field(FieldInfo::new("label", FieldKind::Char))
///     }
/// }
///
/// let tag = Tag { id: 1, label: "rust".into() };
/// assert_eq!(tag.values_at("label"), vec![Value::from("rust")]);
/// ```
pub trait Model: Record + Clone + Send + Sync + 'static {
	fn schema() -> Schema;
}

/// Extension available on every record: resolve a `a__b__c` path.
pub trait RecordExt: Record {
	/// All values reachable through `path`.
	///
	/// A path ending on a relation yields the related primary keys. A
	/// multi-valued hop can produce several values; an empty relation yields a
	/// single `Null` so that `isnull` keeps working.
	fn values_at(&self, path: &str) -> Vec<Value>;
}

impl<T: Record> RecordExt for T {
	fn values_at(&self, path: &str) -> Vec<Value> {
		resolve_path(self, path)
	}
}

/// Same as [`RecordExt::values_at`], for trait objects.
pub fn resolve_path(record: &dyn Record, path: &str) -> Vec<Value> {
	let segments: Vec<&str> = path.split(LOOKUP_SEP).collect();
	let mut values = Vec::new();
	collect_values(record, &segments, &mut values);
	if values.is_empty() {
		values.push(Value::Null);
	}
	values
}

fn collect_values(record: &dyn Record, segments: &[&str], out: &mut Vec<Value>) {
	let Some((head, rest)) = segments.split_first() else {
		return;
	};
	let Some(field) = record.field(head) else {
		return;
	};
	match field {
		FieldRef::Value(value) => {
			if rest.is_empty() {
				out.push(value);
			}
		}
		FieldRef::One(related) => match (related, rest.is_empty()) {
			(None, _) => out.push(Value::Null),
			(Some(related), true) => out.push(related.primary_key()),
			(Some(related), false) => collect_values(related, rest, out),
		},
		FieldRef::Many(related) => {
			for item in related {
				if rest.is_empty() {
					out.push(item.primary_key());
				} else {
					collect_values(item, rest, out);
				}
			}
		}
	}
}
