//! Field lookups (`exact`, `lt`, `icontains`, ...).
//!
//! Names follow the Django query terms so that `price__lt` and
//! `name__icontains` read the same as they would in a Django project.

use crate::error::QueryError;
use crate::value::Value;
use once_cell::sync::Lazy;
use parking_lot::RwLock;
use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// Separator between relationship hops and the trailing lookup name.
pub const LOOKUP_SEP: &str = "__";

/// Compiled `regex` / `iregex` patterns, case-sensitive first. `None` marks a
/// pattern that failed to compile.
static COMPILED_PATTERNS: Lazy<[RwLock<HashMap<String, Option<Regex>>>; 2]> =
	Lazy::new(|| [RwLock::new(HashMap::new()), RwLock::new(HashMap::new())]);

/// Patterns kept per table before it is cleared.
const COMPILED_PATTERNS_LIMIT: usize = 256;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Lookup {
	#[default]
	Exact,
	IExact,
	Contains,
	IContains,
	In,
	Gt,
	Gte,
	Lt,
	Lte,
	StartsWith,
	IStartsWith,
	EndsWith,
	IEndsWith,
	Range,
	Year,
	Month,
	Day,
	IsNull,
	Regex,
	IRegex,
}

impl Lookup {
	/// Every supported lookup, sorted by name.
	pub const ALL: [Lookup; 20] = [
		Lookup::Contains,
		Lookup::Day,
		Lookup::EndsWith,
		Lookup::Exact,
		Lookup::Gt,
		Lookup::Gte,
		Lookup::IContains,
		Lookup::IEndsWith,
		Lookup::IExact,
		Lookup::In,
		Lookup::IRegex,
		Lookup::IsNull,
		Lookup::IStartsWith,
		Lookup::Lt,
		Lookup::Lte,
		Lookup::Month,
		Lookup::Range,
		Lookup::Regex,
		Lookup::StartsWith,
		Lookup::Year,
	];

	pub fn as_str(&self) -> &'static str {
		match self {
			Lookup::Exact => "exact",
			Lookup::IExact => "iexact",
			Lookup::Contains => "contains",
			Lookup::IContains => "icontains",
			Lookup::In => "in",
			Lookup::Gt => "gt",
			Lookup::Gte => "gte",
			Lookup::Lt => "lt",
			Lookup::Lte => "lte",
			Lookup::StartsWith => "startswith",
			Lookup::IStartsWith => "istartswith",
			Lookup::EndsWith => "endswith",
			Lookup::IEndsWith => "iendswith",
			Lookup::Range => "range",
			Lookup::Year => "year",
			Lookup::Month => "month",
			Lookup::Day => "day",
			Lookup::IsNull => "isnull",
			Lookup::Regex => "regex",
			Lookup::IRegex => "iregex",
		}
	}

	/// Evaluate `field <lookup> operand` for a single resolved field value.
	pub fn matches(&self, field: &Value, operand: &Value) -> bool {
		match self {
			Lookup::Exact => field.loose_eq(operand),
			Lookup::IExact => match (field.to_text(), operand.to_text()) {
				(Some(a), Some(b)) => a.to_lowercase() == b.to_lowercase(),
				_ => field.loose_eq(operand),
			},
			Lookup::Contains => text_op(field, operand, false, |a, b| a.contains(b)),
			Lookup::IContains => text_op(field, operand, true, |a, b| a.contains(b)),
			Lookup::StartsWith => text_op(field, operand, false, |a, b| a.starts_with(b)),
			Lookup::IStartsWith => text_op(field, operand, true, |a, b| a.starts_with(b)),
			Lookup::EndsWith => text_op(field, operand, false, |a, b| a.ends_with(b)),
			Lookup::IEndsWith => text_op(field, operand, true, |a, b| a.ends_with(b)),
			Lookup::In => match operand {
				Value::List(items) => items.iter().any(|item| field.loose_eq(item)),
				single => field.loose_eq(single),
			},
			Lookup::Gt => field.compare(operand) == Some(Ordering::Greater),
			Lookup::Gte => matches!(
				field.compare(operand),
				Some(Ordering::Greater | Ordering::Equal)
			),
			Lookup::Lt => field.compare(operand) == Some(Ordering::Less),
			Lookup::Lte => matches!(
				field.compare(operand),
				Some(Ordering::Less | Ordering::Equal)
			),
			Lookup::Range => match operand.as_list() {
				Some([low, high]) => {
					Lookup::Gte.matches(field, low) && Lookup::Lte.matches(field, high)
				}
				_ => false,
			},
			Lookup::Year => date_part(field.year(), operand),
			Lookup::Month => date_part(field.month(), operand),
			Lookup::Day => date_part(field.day(), operand),
			Lookup::IsNull => match operand {
				Value::Boolean(expected) => field.is_null() == *expected,
				_ => false,
			},
			Lookup::Regex => regex_op(field, operand, false),
			Lookup::IRegex => regex_op(field, operand, true),
		}
	}
}

fn text_op(field: &Value, operand: &Value, fold: bool, op: impl Fn(&str, &str) -> bool) -> bool {
	match (field.to_text(), operand.to_text()) {
		(Some(a), Some(b)) if fold => op(&a.to_lowercase(), &b.to_lowercase()),
		(Some(a), Some(b)) => op(&a, &b),
		_ => false,
	}
}

fn date_part(part: Option<i64>, operand: &Value) -> bool {
	part.is_some_and(|p| Value::Integer(p).loose_eq(operand))
}

fn regex_op(field: &Value, operand: &Value, case_insensitive: bool) -> bool {
	let (Some(text), Some(pattern)) = (field.to_text(), operand.as_str()) else {
		return false;
	};
	compiled_pattern(pattern, case_insensitive).is_some_and(|re| re.is_match(&text))
}

/// Compile `pattern` once; later rows reuse it.
fn compiled_pattern(pattern: &str, case_insensitive: bool) -> Option<Regex> {
	let table = &COMPILED_PATTERNS[usize::from(case_insensitive)];
	if let Some(compiled) = table.read().get(pattern) {
		return compiled.clone();
	}

	let compiled = match RegexBuilder::new(pattern)
		.case_insensitive(case_insensitive)
		.build()
	{
		Ok(re) => Some(re),
		Err(e) => {
			tracing::debug!(pattern = %pattern, error = %e, "invalid regex lookup never matches");
			None
		}
	};
	let mut table = table.write();
	if table.len() >= COMPILED_PATTERNS_LIMIT {
		table.clear();
	}
	table.insert(pattern.to_string(), compiled.clone());
	compiled
}

impl fmt::Display for Lookup {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

impl FromStr for Lookup {
	type Err = QueryError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Lookup::ALL
			.iter()
			.copied()
			.find(|lookup| lookup.as_str() == s)
			.ok_or_else(|| QueryError::UnknownLookup(s.to_string()))
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use chrono::NaiveDate;
	use rstest::rstest;

	#[rstest]
	fn test_all_is_sorted() {
		let names: Vec<&str> = Lookup::ALL.iter().map(Lookup::as_str).collect();
		let mut sorted = names.clone();
		sorted.sort();
		assert_eq!(names, sorted);
	}

	#[rstest]
	#[case("exact", Lookup::Exact)]
	#[case("icontains", Lookup::IContains)]
	#[case("isnull", Lookup::IsNull)]
	fn test_parse(#[case] name: &str, #[case] expected: Lookup) {
		assert_eq!(name.parse::<Lookup>().unwrap(), expected);
		assert_eq!(expected.to_string(), name);
	}

	#[rstest]
	fn test_parse_unknown() {
		assert_eq!(
			"like".parse::<Lookup>(),
			Err(QueryError::UnknownLookup("like".to_string()))
		);
	}

	#[rstest]
	#[case(Lookup::Lt, 50, true)]
	#[case(Lookup::Lt, 100, false)]
	#[case(Lookup::Lte, 100, true)]
	#[case(Lookup::Gt, 100, false)]
	#[case(Lookup::Gte, 100, true)]
	#[case(Lookup::Exact, 100, true)]
	fn test_comparisons(#[case] lookup: Lookup, #[case] field: i64, #[case] expected: bool) {
		assert_eq!(
			lookup.matches(&Value::Integer(field), &Value::Integer(100)),
			expected
		);
	}

	#[rstest]
	fn test_text_lookups() {
		let name = Value::from("Acme Widgets");
		assert!(Lookup::Contains.matches(&name, &Value::from("Widget")));
		assert!(!Lookup::Contains.matches(&name, &Value::from("widget")));
		assert!(Lookup::IContains.matches(&name, &Value::from("widget")));
		assert!(Lookup::IStartsWith.matches(&name, &Value::from("acme")));
		assert!(Lookup::EndsWith.matches(&name, &Value::from("gets")));
		assert!(Lookup::IExact.matches(&name, &Value::from("ACME WIDGETS")));
	}

	#[rstest]
	fn test_in_and_range() {
		let operand = Value::from(vec![1i64, 3, 5]);
		assert!(Lookup::In.matches(&Value::Integer(3), &operand));
		assert!(!Lookup::In.matches(&Value::Integer(4), &operand));

		let range = Value::from(vec![10i64, 20]);
		assert!(Lookup::Range.matches(&Value::Integer(10), &range));
		assert!(Lookup::Range.matches(&Value::Integer(20), &range));
		assert!(!Lookup::Range.matches(&Value::Integer(21), &range));
	}

	#[rstest]
	fn test_date_parts() {
		let date = Value::Date(NaiveDate::from_ymd_opt(2023, 7, 14).unwrap());
		assert!(Lookup::Year.matches(&date, &Value::Integer(2023)));
		assert!(Lookup::Month.matches(&date, &Value::Integer(7)));
		assert!(Lookup::Day.matches(&date, &Value::Integer(14)));
		assert!(!Lookup::Day.matches(&Value::from("2023-07-14"), &Value::Integer(14)));
	}

	#[rstest]
	fn test_regex_compiled_once_per_pattern() {
		// Arrange
		let pattern = r"^tamis-cache-\d+$";
		let rows: Vec<Value> = (0..50).map(|i| Value::from(format!("tamis-cache-{}", i))).collect();

		// Act
		let matched = rows
			.iter()
			.filter(|row| Lookup::Regex.matches(row, &Value::from(pattern)))
			.count();

		// Assert
		assert_eq!(matched, 50);
		assert!(COMPILED_PATTERNS[0].read().contains_key(pattern));
		assert!(!COMPILED_PATTERNS[1].read().contains_key(pattern));
	}

	#[rstest]
	fn test_invalid_regex_is_remembered() {
		assert!(!Lookup::IRegex.matches(&Value::from("abc"), &Value::from("tamis[")));
		assert!(matches!(COMPILED_PATTERNS[1].read().get("tamis["), Some(None)));
	}

	#[rstest]
	fn test_isnull_and_regex() {
		assert!(Lookup::IsNull.matches(&Value::Null, &Value::Boolean(true)));
		assert!(Lookup::IsNull.matches(&Value::Integer(1), &Value::Boolean(false)));
		assert!(Lookup::Regex.matches(&Value::from("abc123"), &Value::from(r"^\w+\d{3}$")));
		assert!(Lookup::IRegex.matches(&Value::from("ABC"), &Value::from("^abc$")));
		assert!(!Lookup::Regex.matches(&Value::from("abc"), &Value::from("(")));
	}
}
