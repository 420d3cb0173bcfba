//! Static model metadata used to resolve field names and relationship paths.

use crate::error::{QueryError, QueryResult};
use crate::lookup::LOOKUP_SEP;
use crate::value::Value;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use rust_decimal::Decimal;
use std::str::FromStr;

/// Column type of a model field.
#[derive(Debug, Clone, Copy)]
pub enum FieldKind {
	AutoField,
	Char,
	Text,
	Integer,
	Decimal,
	Float,
	Boolean,
	Date,
	DateTime,
	Time,
	/// Many-to-one relation; the function returns the target model's schema.
	ForeignKey(fn() -> Schema),
	ManyToMany(fn() -> Schema),
}

impl FieldKind {
	pub fn is_relation(&self) -> bool {
		matches!(self, FieldKind::ForeignKey(_) | FieldKind::ManyToMany(_))
	}

	pub fn related_schema(&self) -> Option<Schema> {
		match self {
			FieldKind::ForeignKey(target) | FieldKind::ManyToMany(target) => Some(target()),
			_ => None,
		}
	}

	pub fn as_str(&self) -> &'static str {
		match self {
			FieldKind::AutoField => "auto",
			FieldKind::Char => "char",
			FieldKind::Text => "text",
			FieldKind::Integer => "integer",
			FieldKind::Decimal => "decimal",
			FieldKind::Float => "float",
			FieldKind::Boolean => "boolean",
			FieldKind::Date => "date",
			FieldKind::DateTime => "datetime",
			FieldKind::Time => "time",
			FieldKind::ForeignKey(_) => "foreign key",
			FieldKind::ManyToMany(_) => "many-to-many",
		}
	}

	/// Convert submitted text into a value of this column type.
	///
	/// Relations parse as the primary key type of the related model.
	///
	/// # Examples
	///
	/// ```
	/// use tamis_query::{FieldKind, Value};
	///
	/// assert_eq!(FieldKind::Integer.parse_value("42").unwrap(), Value::Integer(42));
	/// assert_eq!(FieldKind::Char.parse_value("42").unwrap(), Value::from("42"));
	/// assert!(FieldKind::Integer.parse_value("4.2").is_err());
	/// ```
	pub fn parse_value(&self, text: &str) -> QueryResult<Value> {
		let invalid = || QueryError::InvalidValue {
			kind: self.as_str(),
			value: text.to_string(),
		};
		let value = match self {
			FieldKind::Char | FieldKind::Text => Value::String(text.to_string()),
			FieldKind::AutoField | FieldKind::Integer => {
				Value::Integer(text.parse().map_err(|_| invalid())?)
			}
			FieldKind::Decimal => Value::Decimal(Decimal::from_str(text).map_err(|_| invalid())?),
			FieldKind::Float => Value::Float(text.parse().map_err(|_| invalid())?),
			FieldKind::Boolean => match text.to_ascii_lowercase().as_str() {
				"true" | "1" => Value::Boolean(true),
				"false" | "0" => Value::Boolean(false),
				_ => return Err(invalid()),
			},
			FieldKind::Date => {
				Value::Date(NaiveDate::parse_from_str(text, "%Y-%m-%d").map_err(|_| invalid())?)
			}
			FieldKind::DateTime => Value::DateTime(
				NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S")
					.or_else(|_| NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S"))
					.map_err(|_| invalid())?,
			),
			FieldKind::Time => {
				Value::Time(NaiveTime::parse_from_str(text, "%H:%M:%S").map_err(|_| invalid())?)
			}
			FieldKind::ForeignKey(target) | FieldKind::ManyToMany(target) => {
				let schema = target();
				let pk = schema.get(schema.primary_key).ok_or_else(invalid)?;
				return pk.kind.parse_value(text);
			}
		};
		Ok(value)
	}
}

#[derive(Debug, Clone)]
pub struct FieldInfo {
	pub name: &'static str,
	pub kind: FieldKind,
	pub verbose_name: Option<&'static str>,
	pub choices: Option<&'static [(&'static str, &'static str)]>,
}

impl FieldInfo {
	pub const fn new(name: &'static str, kind: FieldKind) -> Self {
		Self {
			name,
			kind,
			verbose_name: None,
			choices: None,
		}
	}

	pub const fn with_verbose_name(mut self, verbose_name: &'static str) -> Self {
		self.verbose_name = Some(verbose_name);
		self
	}

	pub const fn with_choices(mut self, choices: &'static [(&'static str, &'static str)]) -> Self {
		self.choices = Some(choices);
		self
	}

	/// Human readable label, falling back to the field name with underscores
	/// turned into spaces.
	pub fn label(&self) -> String {
		match self.verbose_name {
			Some(name) => name.to_string(),
			None => self.name.replace('_', " "),
		}
	}
}

/// Description of one model: its name, primary key and fields.
///
/// # Examples
///
/// ```
/// use tamis_query::{FieldInfo, FieldKind, Schema};
///
/// let schema = Schema::new("book", "id")
///     .field(FieldInfo::new("id", FieldKind::AutoField))
///     .field(FieldInfo::new("title", FieldKind::Char));
///
/// assert!(schema.get("title").is_some());
/// assert!(schema.get("isbn").is_none());
/// ```
#[derive(Debug, Clone)]
pub struct Schema {
	pub model: &'static str,
	pub primary_key: &'static str,
	pub fields: Vec<FieldInfo>,
}

/// A field reached by walking a (possibly multi-hop) path.
#[derive(Debug, Clone)]
pub struct ResolvedField {
	/// Path as written by the caller, e.g. `manufacturer__name`.
	pub path: String,
	/// Model that owns the final field.
	pub model: &'static str,
	pub field: FieldInfo,
	/// Whether at least one relation was traversed.
	pub through_relation: bool,
}

impl Schema {
	pub fn new(model: &'static str, primary_key: &'static str) -> Self {
		Self {
			model,
			primary_key,
			fields: Vec::new(),
		}
	}

	pub fn field(mut self, field: FieldInfo) -> Self {
		self.fields.push(field);
		self
	}

	pub fn get(&self, name: &str) -> Option<&FieldInfo> {
		self.fields.iter().find(|f| f.name == name)
	}

	/// Names of all fields that are not relations, in declaration order.
	pub fn concrete_field_names(&self) -> Vec<&'static str> {
		self.fields
			.iter()
			.filter(|f| !f.kind.is_relation())
			.map(|f| f.name)
			.collect()
	}

	/// Resolve `path` (`name` or `relation__name`) to its final field.
	///
	/// Returns `None` when any hop is unknown or when a non-relation field is
	/// followed by another hop.
	pub fn resolve(&self, path: &str) -> Option<ResolvedField> {
		let mut segments = path.split(LOOKUP_SEP).peekable();
		let mut current = self.clone();
		let mut through_relation = false;

		while let Some(segment) = segments.next() {
			let field = current.get(segment)?.clone();
			if segments.peek().is_none() {
				return Some(ResolvedField {
					path: path.to_string(),
					model: current.model,
					field,
					through_relation,
				});
			}
			current = field.kind.related_schema()?;
			through_relation = true;
		}
		None
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	fn country() -> Schema {
		Schema::new("country", "code").field(FieldInfo::new("code", FieldKind::Char))
	}

	fn manufacturer() -> Schema {
		Schema::new("manufacturer", "id")
			.field(FieldInfo::new("id", FieldKind::AutoField))
			.field(FieldInfo::new("name", FieldKind::Char))
			.field(FieldInfo::new("country", FieldKind::ForeignKey(country)))
	}

	fn product() -> Schema {
		Schema::new("product", "id")
			.field(FieldInfo::new("id", FieldKind::AutoField))
			.field(FieldInfo::new("unit_price", FieldKind::Decimal))
			.field(FieldInfo::new("manufacturer", FieldKind::ForeignKey(manufacturer)))
	}

	#[rstest]
	fn test_resolve_direct() {
		let resolved = product().resolve("unit_price").unwrap();
		assert_eq!(resolved.model, "product");
		assert!(!resolved.through_relation);
		assert_eq!(resolved.field.label(), "unit price");
	}

	#[rstest]
	fn test_resolve_relation_path() {
		let resolved = product().resolve("manufacturer__country__code").unwrap();
		assert_eq!(resolved.model, "country");
		assert_eq!(resolved.field.name, "code");
		assert!(resolved.through_relation);
	}

	#[rstest]
	#[case("missing")]
	#[case("manufacturer__missing")]
	#[case("unit_price__name")]
	#[case("")]
	fn test_resolve_unknown(#[case] path: &str) {
		assert!(product().resolve(path).is_none());
	}

	#[rstest]
	#[case(FieldKind::Decimal, "10.5", Value::Decimal(Decimal::new(105, 1)))]
	#[case(FieldKind::Boolean, "True", Value::Boolean(true))]
	#[case(FieldKind::Date, "2024-02-29", Value::Date(NaiveDate::from_ymd_opt(2024, 2, 29).unwrap()))]
	#[case(FieldKind::ForeignKey(manufacturer), "7", Value::Integer(7))]
	#[case(FieldKind::ForeignKey(country), "FR", Value::from("FR"))]
	fn test_parse_value(#[case] kind: FieldKind, #[case] text: &str, #[case] expected: Value) {
		assert_eq!(kind.parse_value(text).unwrap(), expected);
	}

	#[rstest]
	fn test_parse_value_error() {
		assert_eq!(
			FieldKind::Date.parse_value("2023-02-30"),
			Err(QueryError::InvalidValue {
				kind: "date",
				value: "2023-02-30".to_string()
			})
		);
	}

	#[rstest]
	fn test_concrete_field_names() {
		assert_eq!(product().concrete_field_names(), vec!["id", "unit_price"]);
	}
}
