//! Filter kinds and the values they bind to.

use serde::{Deserialize, Serialize};
use tamis_query::{FieldInfo, FieldKind, Lookup, Value};

/// What kind of input a filter takes, and so which form field it binds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterKind {
	Char,
	Boolean,
	Choice,
	MultipleChoice,
	Date,
	#[serde(rename = "datetime")]
	DateTime,
	Time,
	ModelChoice,
	ModelMultipleChoice,
	Number,
	Range,
	DateRange,
	AllValues,
	Abc,
}

impl FilterKind {
	/// Kind used for a model field that has no explicit declaration.
	pub fn infer(field: &FieldInfo) -> FilterKind {
		if field.choices.is_some() {
			return FilterKind::Choice;
		}
		match field.kind {
			FieldKind::Char | FieldKind::Text => FilterKind::Char,
			FieldKind::AutoField
			| FieldKind::Integer
			| FieldKind::Decimal
			| FieldKind::Float
			| FieldKind::ForeignKey(_)
			| FieldKind::ManyToMany(_) => FilterKind::Number,
			FieldKind::Boolean => FilterKind::Boolean,
			FieldKind::Date => FilterKind::Date,
			FieldKind::DateTime => FilterKind::DateTime,
			FieldKind::Time => FilterKind::Time,
		}
	}

	/// Kinds whose choices are offered from a list.
	pub fn has_choices(&self) -> bool {
		matches!(
			self,
			FilterKind::Choice
				| FilterKind::MultipleChoice
				| FilterKind::ModelChoice
				| FilterKind::ModelMultipleChoice
				| FilterKind::AllValues
		)
	}

	pub fn is_multiple(&self) -> bool {
		matches!(
			self,
			FilterKind::MultipleChoice | FilterKind::ModelMultipleChoice
		)
	}
}

/// Option values of a date range filter.
pub const DATE_RANGE_OPTIONS: [(&str, &str); 5] = [
	("", "Any Date"),
	("1", "Today"),
	("2", "Past 7 days"),
	("3", "This month"),
	("4", "This year"),
];

/// Default marker an ABC filter uses for "starts with a non-letter".
pub const NON_LETTER: &str = "#";

/// A cleaned, typed filter input.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterValue {
	/// Nothing submitted.
	Empty,
	Single(Value),
	Multiple(Vec<Value>),
	/// Either bound may be missing.
	Range {
		start: Option<Value>,
		stop: Option<Value>,
	},
	/// A value with the lookup picked by the user.
	WithLookup { value: Value, lookup: Lookup },
}

impl FilterValue {
	/// Whether the value imposes no constraint. `false` is not empty.
	pub fn is_empty(&self) -> bool {
		match self {
			FilterValue::Empty => true,
			FilterValue::Single(value) | FilterValue::WithLookup { value, .. } => value.is_empty(),
			FilterValue::Multiple(values) => values.is_empty(),
			FilterValue::Range { start, stop } => start.is_none() && stop.is_none(),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	fn category() -> tamis_query::Schema {
		tamis_query::Schema::new("category", "id")
	}

	const STATUS: &[(&str, &str)] = &[("d", "Draft"), ("p", "Published")];

	#[rstest]
	#[case(FieldInfo::new("name", FieldKind::Char), FilterKind::Char)]
	#[case(FieldInfo::new("body", FieldKind::Text), FilterKind::Char)]
	#[case(FieldInfo::new("price", FieldKind::Decimal), FilterKind::Number)]
	#[case(FieldInfo::new("active", FieldKind::Boolean), FilterKind::Boolean)]
	#[case(FieldInfo::new("created", FieldKind::DateTime), FilterKind::DateTime)]
	#[case(FieldInfo::new("category", FieldKind::ForeignKey(category)), FilterKind::Number)]
	#[case(FieldInfo::new("status", FieldKind::Char).with_choices(STATUS), FilterKind::Choice)]
	fn test_infer(#[case] field: FieldInfo, #[case] expected: FilterKind) {
		assert_eq!(FilterKind::infer(&field), expected);
	}

	#[rstest]
	fn test_kind_names() {
		let kind: FilterKind = serde_json::from_str("\"datetime\"").unwrap();
		assert_eq!(kind, FilterKind::DateTime);
		let kind: FilterKind = serde_json::from_str("\"multiple_choice\"").unwrap();
		assert_eq!(kind, FilterKind::MultipleChoice);
	}

	#[rstest]
	fn test_filter_value_emptiness() {
		assert!(FilterValue::Empty.is_empty());
		assert!(FilterValue::Single(Value::from("")).is_empty());
		assert!(!FilterValue::Single(Value::Boolean(false)).is_empty());
		assert!(FilterValue::Range { start: None, stop: None }.is_empty());
		assert!(
			!FilterValue::Range {
				start: None,
				stop: Some(Value::Integer(1))
			}
			.is_empty()
		);
	}
}
