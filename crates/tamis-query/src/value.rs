//! Scalar values stored in records and carried by lookups.

use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime};
use rust_decimal::Decimal;
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// A single field value.
///
/// Numeric variants compare with each other (`Integer(1)` equals
/// `Decimal(1.0)`), everything else only compares within its own variant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
	Null,
	Boolean(bool),
	Integer(i64),
	Decimal(Decimal),
	Float(f64),
	String(String),
	Date(NaiveDate),
	DateTime(NaiveDateTime),
	Time(NaiveTime),
	List(Vec<Value>),
}

impl Value {
	pub fn is_null(&self) -> bool {
		matches!(self, Value::Null)
	}

	/// Whether the value counts as "no constraint" when it comes from user input.
	///
	/// `false` and `0` are real values; only null, empty strings and empty
	/// lists are considered empty.
	pub fn is_empty(&self) -> bool {
		match self {
			Value::Null => true,
			Value::String(s) => s.is_empty(),
			Value::List(items) => items.is_empty(),
			_ => false,
		}
	}

	pub fn as_str(&self) -> Option<&str> {
		match self {
			Value::String(s) => Some(s),
			_ => None,
		}
	}

	pub fn as_list(&self) -> Option<&[Value]> {
		match self {
			Value::List(items) => Some(items),
			_ => None,
		}
	}

	fn as_decimal(&self) -> Option<Decimal> {
		match self {
			Value::Integer(i) => Some(Decimal::from(*i)),
			Value::Decimal(d) => Some(*d),
			Value::Float(f) => Decimal::from_f64(*f),
			_ => None,
		}
	}

	fn as_f64(&self) -> Option<f64> {
		match self {
			Value::Integer(i) => Some(*i as f64),
			Value::Decimal(d) => d.to_f64(),
			Value::Float(f) => Some(*f),
			_ => None,
		}
	}

	fn is_numeric(&self) -> bool {
		matches!(self, Value::Integer(_) | Value::Decimal(_) | Value::Float(_))
	}

	/// Compare two values the way the database would.
	///
	/// Returns `None` when the values are not comparable (null on either side,
	/// or mismatched types).
	pub fn compare(&self, other: &Value) -> Option<Ordering> {
		match (self, other) {
			(Value::Null, _) | (_, Value::Null) => None,
			(Value::Float(_), _) | (_, Value::Float(_))
				if self.is_numeric() && other.is_numeric() =>
			{
				self.as_f64()?.partial_cmp(&other.as_f64()?)
			}
			(a, b) if a.is_numeric() && b.is_numeric() => Some(a.as_decimal()?.cmp(&b.as_decimal()?)),
			(Value::Boolean(a), Value::Boolean(b)) => Some(a.cmp(b)),
			(Value::String(a), Value::String(b)) => Some(a.cmp(b)),
			(Value::Date(a), Value::Date(b)) => Some(a.cmp(b)),
			(Value::DateTime(a), Value::DateTime(b)) => Some(a.cmp(b)),
			// A datetime column compared against a date uses the date part.
			(Value::DateTime(a), Value::Date(b)) => Some(a.date().cmp(b)),
			(Value::Date(a), Value::DateTime(b)) => Some(a.cmp(&b.date())),
			(Value::Time(a), Value::Time(b)) => Some(a.cmp(b)),
			_ => None,
		}
	}

	/// Total order for sorting.
	///
	/// Values group by kind first: null, booleans, numbers, strings, dates,
	/// times, lists. Dates sort as midnight of that day among datetimes and
	/// floats use [`f64::total_cmp`], so NaN sorts after every number.
	pub fn total_cmp(&self, other: &Value) -> Ordering {
		let by_kind = self.kind_rank().cmp(&other.kind_rank());
		if by_kind.is_ne() {
			return by_kind;
		}
		match (self, other) {
			(Value::Boolean(a), Value::Boolean(b)) => a.cmp(b),
			(Value::String(a), Value::String(b)) => a.cmp(b),
			(Value::Time(a), Value::Time(b)) => a.cmp(b),
			(Value::List(a), Value::List(b)) => a
				.iter()
				.zip(b)
				.map(|(x, y)| x.total_cmp(y))
				.find(|o| o.is_ne())
				.unwrap_or_else(|| a.len().cmp(&b.len())),
			(Value::Float(_), _) | (_, Value::Float(_)) => {
				let left = self.as_f64().unwrap_or(f64::NAN);
				let right = other.as_f64().unwrap_or(f64::NAN);
				left.total_cmp(&right)
			}
			(a, b) if a.is_numeric() => a.as_decimal().cmp(&b.as_decimal()),
			(a, b) => a.as_datetime().cmp(&b.as_datetime()),
		}
	}

	fn kind_rank(&self) -> u8 {
		match self {
			Value::Null => 0,
			Value::Boolean(_) => 1,
			Value::Integer(_) | Value::Decimal(_) | Value::Float(_) => 2,
			Value::String(_) => 3,
			Value::Date(_) | Value::DateTime(_) => 4,
			Value::Time(_) => 5,
			Value::List(_) => 6,
		}
	}

	fn as_datetime(&self) -> Option<NaiveDateTime> {
		match self {
			Value::Date(d) => Some(d.and_time(NaiveTime::MIN)),
			Value::DateTime(dt) => Some(*dt),
			_ => None,
		}
	}

	/// Equality with numeric coercion. Null equals null.
	pub fn loose_eq(&self, other: &Value) -> bool {
		match (self, other) {
			(Value::Null, Value::Null) => true,
			(Value::List(a), Value::List(b)) => {
				a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.loose_eq(y))
			}
			_ => self.compare(other) == Some(Ordering::Equal),
		}
	}

	/// Text used by the string lookups (`contains`, `startswith`, ...).
	pub fn to_text(&self) -> Option<String> {
		match self {
			Value::Null | Value::List(_) => None,
			Value::String(s) => Some(s.clone()),
			other => Some(other.to_string()),
		}
	}

	pub(crate) fn year(&self) -> Option<i64> {
		match self {
			Value::Date(d) => Some(i64::from(d.year())),
			Value::DateTime(dt) => Some(i64::from(dt.year())),
			_ => None,
		}
	}

	pub(crate) fn month(&self) -> Option<i64> {
		match self {
			Value::Date(d) => Some(i64::from(d.month())),
			Value::DateTime(dt) => Some(i64::from(dt.month())),
			_ => None,
		}
	}

	pub(crate) fn day(&self) -> Option<i64> {
		match self {
			Value::Date(d) => Some(i64::from(d.day())),
			Value::DateTime(dt) => Some(i64::from(dt.day())),
			_ => None,
		}
	}
}

impl fmt::Display for Value {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Value::Null => write!(f, "None"),
			Value::Boolean(b) => write!(f, "{}", b),
			Value::Integer(i) => write!(f, "{}", i),
			Value::Decimal(d) => write!(f, "{}", d),
			Value::Float(x) => write!(f, "{}", x),
			Value::String(s) => write!(f, "{}", s),
			Value::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
			Value::DateTime(dt) => write!(f, "{}", dt.format("%Y-%m-%d %H:%M:%S")),
			Value::Time(t) => write!(f, "{}", t.format("%H:%M:%S")),
			Value::List(items) => {
				write!(f, "[")?;
				for (i, item) in items.iter().enumerate() {
					if i > 0 {
						write!(f, ", ")?;
					}
					write!(f, "{}", item)?;
				}
				write!(f, "]")
			}
		}
	}
}

impl From<bool> for Value {
	fn from(v: bool) -> Self {
		Value::Boolean(v)
	}
}

impl From<i64> for Value {
	fn from(v: i64) -> Self {
		Value::Integer(v)
	}
}

impl From<i32> for Value {
	fn from(v: i32) -> Self {
		Value::Integer(i64::from(v))
	}
}

impl From<u32> for Value {
	fn from(v: u32) -> Self {
		Value::Integer(i64::from(v))
	}
}

impl From<f64> for Value {
	fn from(v: f64) -> Self {
		Value::Float(v)
	}
}

impl From<Decimal> for Value {
	fn from(v: Decimal) -> Self {
		Value::Decimal(v)
	}
}

impl From<&str> for Value {
	fn from(v: &str) -> Self {
		Value::String(v.to_string())
	}
}

impl From<String> for Value {
	fn from(v: String) -> Self {
		Value::String(v)
	}
}

impl From<NaiveDate> for Value {
	fn from(v: NaiveDate) -> Self {
		Value::Date(v)
	}
}

impl From<NaiveDateTime> for Value {
	fn from(v: NaiveDateTime) -> Self {
		Value::DateTime(v)
	}
}

impl From<NaiveTime> for Value {
	fn from(v: NaiveTime) -> Self {
		Value::Time(v)
	}
}

impl<T: Into<Value>> From<Option<T>> for Value {
	fn from(v: Option<T>) -> Self {
		v.map(Into::into).unwrap_or(Value::Null)
	}
}

impl<T: Into<Value>> From<Vec<T>> for Value {
	fn from(v: Vec<T>) -> Self {
		Value::List(v.into_iter().map(Into::into).collect())
	}
}
