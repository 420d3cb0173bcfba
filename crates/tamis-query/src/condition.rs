//! Composable filter conditions (the `Q` object of Django).

use crate::lookup::{LOOKUP_SEP, Lookup};
use crate::model::{Record, resolve_path};
use crate::value::Value;
use std::fmt;
use std::ops::{BitAnd, BitOr, Not};

/// A predicate tree over record fields.
///
/// `Condition::Empty` is the identity: it matches everything and disappears
/// when combined with another condition.
///
/// # Examples
///
/// ```
/// use tamis_query::{Condition, Lookup};
///
/// let cheap = Condition::new("price", Lookup::Lt, 100);
/// let acme = Condition::from_kwarg("manufacturer__name__iexact", "acme");
/// let both = cheap & acme;
/// assert_eq!(both.to_string(), "(price__lt=100 AND manufacturer__name__iexact=acme)");
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Condition {
	#[default]
	Empty,
	Lookup {
		path: String,
		lookup: Lookup,
		value: Value,
	},
	And(Vec<Condition>),
	Or(Vec<Condition>),
	Not(Box<Condition>),
}

impl Condition {
	pub fn new(path: impl Into<String>, lookup: Lookup, value: impl Into<Value>) -> Self {
		Condition::Lookup {
			path: path.into(),
			lookup,
			value: value.into(),
		}
	}

	/// Build a condition from a Django-style keyword such as `price__lt`.
	///
	/// The trailing segment is taken as the lookup when it names one;
	/// otherwise the whole key is the path and the lookup is `exact`.
	pub fn from_kwarg(key: &str, value: impl Into<Value>) -> Self {
		if let Some((path, last)) = key.rsplit_once(LOOKUP_SEP)
			&& let Ok(lookup) = last.parse::<Lookup>()
		{
			return Condition::new(path, lookup, value);
		}
		Condition::new(key, Lookup::Exact, value)
	}

	pub fn is_empty(&self) -> bool {
		matches!(self, Condition::Empty)
	}

	pub fn and(self, other: Condition) -> Condition {
		match (self, other) {
			(Condition::Empty, c) | (c, Condition::Empty) => c,
			(Condition::And(mut left), Condition::And(right)) => {
				left.extend(right);
				Condition::And(left)
			}
			(Condition::And(mut left), c) => {
				left.push(c);
				Condition::And(left)
			}
			(c, Condition::And(mut right)) => {
				right.insert(0, c);
				Condition::And(right)
			}
			(a, b) => Condition::And(vec![a, b]),
		}
	}

	pub fn or(self, other: Condition) -> Condition {
		match (self, other) {
			(Condition::Empty, c) | (c, Condition::Empty) => c,
			(Condition::Or(mut left), Condition::Or(right)) => {
				left.extend(right);
				Condition::Or(left)
			}
			(Condition::Or(mut left), c) => {
				left.push(c);
				Condition::Or(left)
			}
			(c, Condition::Or(mut right)) => {
				right.insert(0, c);
				Condition::Or(right)
			}
			(a, b) => Condition::Or(vec![a, b]),
		}
	}

	pub fn negate(self) -> Condition {
		match self {
			Condition::Empty => Condition::Empty,
			Condition::Not(inner) => *inner,
			c => Condition::Not(Box::new(c)),
		}
	}

	/// Evaluate against one record. A lookup over a multi-valued path
	/// matches when any reachable value matches.
	pub fn matches(&self, record: &dyn Record) -> bool {
		match self {
			Condition::Empty => true,
			Condition::Lookup {
				path,
				lookup,
				value,
			} => resolve_path(record, path)
				.iter()
				.any(|field| lookup.matches(field, value)),
			Condition::And(conditions) => conditions.iter().all(|c| c.matches(record)),
			Condition::Or(conditions) => conditions.iter().any(|c| c.matches(record)),
			Condition::Not(inner) => !inner.matches(record),
		}
	}
}

impl BitAnd for Condition {
	type Output = Condition;

	fn bitand(self, rhs: Condition) -> Condition {
		self.and(rhs)
	}
}

impl BitOr for Condition {
	type Output = Condition;

	fn bitor(self, rhs: Condition) -> Condition {
		self.or(rhs)
	}
}

impl Not for Condition {
	type Output = Condition;

	fn not(self) -> Condition {
		self.negate()
	}
}

impl fmt::Display for Condition {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Condition::Empty => write!(f, "()"),
			Condition::Lookup {
				path,
				lookup,
				value,
			} => write!(f, "{}{}{}={}", path, LOOKUP_SEP, lookup, value),
			Condition::And(conditions) => write_joined(f, conditions, " AND "),
			Condition::Or(conditions) => write_joined(f, conditions, " OR "),
			Condition::Not(inner) => write!(f, "NOT {}", inner),
		}
	}
}

fn write_joined(f: &mut fmt::Formatter<'_>, conditions: &[Condition], sep: &str) -> fmt::Result {
	write!(f, "(")?;
	for (i, c) in conditions.iter().enumerate() {
		if i > 0 {
			f.write_str(sep)?;
		}
		write!(f, "{}", c)?;
	}
	write!(f, ")")
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	#[case("price__lt", "price", Lookup::Lt)]
	#[case("manufacturer__name", "manufacturer__name", Lookup::Exact)]
	#[case("manufacturer__name__icontains", "manufacturer__name", Lookup::IContains)]
	#[case("name", "name", Lookup::Exact)]
	fn test_from_kwarg(#[case] key: &str, #[case] path: &str, #[case] lookup: Lookup) {
		assert_eq!(
			Condition::from_kwarg(key, 1),
			Condition::new(path, lookup, 1)
		);
	}

	#[rstest]
	fn test_empty_is_identity() {
		let c = Condition::new("a", Lookup::Exact, 1);
		assert_eq!(Condition::Empty & c.clone(), c);
		assert_eq!(c.clone() | Condition::Empty, c);
		assert_eq!(!Condition::Empty, Condition::Empty);
	}

	#[rstest]
	fn test_flattening() {
		let a = Condition::new("a", Lookup::Exact, 1);
		let b = Condition::new("b", Lookup::Exact, 2);
		let c = Condition::new("c", Lookup::Exact, 3);
		let all = a.clone() & b.clone() & c.clone();
		assert_eq!(all, Condition::And(vec![a.clone(), b.clone(), c.clone()]));
		let any = a.clone() | b.clone() | c.clone();
		assert_eq!(any, Condition::Or(vec![a.clone(), b, c]));
		assert_eq!(!!a.clone(), a);
	}

	#[rstest]
	fn test_display() {
		let c = !(Condition::new("name", Lookup::IStartsWith, "a")
			| Condition::new("name", Lookup::IStartsWith, "b"));
		assert_eq!(
			c.to_string(),
			"NOT (name__istartswith=a OR name__istartswith=b)"
		);
	}
}
