//! Lazy querysets.
//!
//! A [`QuerySet`] is a description of a query: the table it reads from plus an
//! ordered list of [`Step`]s. Building one never touches the rows; only
//! [`QuerySet::results`], [`QuerySet::count`] and friends evaluate it.

use crate::condition::Condition;
use crate::error::{QueryError, QueryResult};
use crate::model::{Model, RecordExt};
use crate::value::Value;
use parking_lot::RwLock;
use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

/// One `ORDER BY` term. `-price` parses as descending `price`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderingTerm {
	pub path: String,
	pub descending: bool,
}

impl OrderingTerm {
	pub fn asc(path: impl Into<String>) -> Self {
		Self {
			path: path.into(),
			descending: false,
		}
	}

	pub fn desc(path: impl Into<String>) -> Self {
		Self {
			path: path.into(),
			descending: true,
		}
	}

	pub fn parse(term: &str) -> QueryResult<Self> {
		let (path, descending) = match term.strip_prefix('-') {
			Some(rest) => (rest, true),
			None => (term, false),
		};
		if path.is_empty() || path.starts_with('-') {
			return Err(QueryError::InvalidOrdering(term.to_string()));
		}
		Ok(Self {
			path: path.to_string(),
			descending,
		})
	}
}

impl fmt::Display for OrderingTerm {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		if self.descending {
			write!(f, "-{}", self.path)
		} else {
			f.write_str(&self.path)
		}
	}
}

/// A recorded queryset operation, applied in order at evaluation time.
#[derive(Debug, Clone, PartialEq)]
pub enum Step {
	Filter(Condition),
	Exclude(Condition),
	OrderBy(Vec<OrderingTerm>),
	Distinct,
	Slice { offset: usize, limit: Option<usize> },
}

impl fmt::Display for Step {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Step::Filter(c) => write!(f, "filter({})", c),
			Step::Exclude(c) => write!(f, "exclude({})", c),
			Step::OrderBy(terms) => {
				let terms: Vec<String> = terms.iter().map(ToString::to_string).collect();
				write!(f, "order_by({})", terms.join(", "))
			}
			Step::Distinct => write!(f, "distinct()"),
			Step::Slice { offset, limit } => match limit {
				Some(limit) => write!(f, "[{}:{}]", offset, offset + limit),
				None => write!(f, "[{}:]", offset),
			},
		}
	}
}

pub(crate) type Table<M> = Arc<RwLock<Vec<M>>>;

/// Lazily evaluated query over a model table.
///
/// Cloning a queryset is cheap: the table is shared and only the step list
/// is copied.
///
/// # Examples
///
/// ```
/// use tamis_query::{Condition, Lookup, Manager};
/// # use tamis_query::{FieldInfo, FieldKind, FieldRef, Model, Record, Schema, Value};
/// # #[derive(Clone, Debug, PartialEq)]
/// # struct Item { id: i64, price: i64 }
/// # impl Record for Item {
/// #     fn field(&self, name: &str) -> Option<FieldRef<'_>> {
/// #         match name {
/// #             "id" => Some(FieldRef::Value(self.id.into())),
/// #             "price" => Some(FieldRef::Value(self.price.into())),
/// #             _ => None,
/// #         }
/// #     }
/// #     fn primary_key(&self) -> Value { self.id.into() }
/// # }
/// # impl Model for Item {
/// #     fn schema() -> Schema {
/// #         Schema::new("item", "id")
/// #             .field(FieldInfo::new("id", FieldKind::AutoField))
/// #             .field(FieldInfo::new("price", FieldKind::Integer))
/// #     }
/// # }
///
/// let items = Manager::new(vec![
///     Item { id: 1, price: 30 },
///     Item { id: 2, price: 120 },
///     Item { id: 3, price: 80 },
/// ]);
///
/// let cheap = items
///     .all()
///     .filter(Condition::new("price", Lookup::Lt, 100))
///     .order_by(&["-price"])
///     .unwrap();
///
/// let ids: Vec<i64> = cheap.results().iter().map(|i| i.id).collect();
/// assert_eq!(ids, vec![3, 1]);
/// ```
pub struct QuerySet<M: Model> {
	table: Table<M>,
	steps: Vec<Step>,
}

impl<M: Model> Clone for QuerySet<M> {
	fn clone(&self) -> Self {
		Self {
			table: Arc::clone(&self.table),
			steps: self.steps.clone(),
		}
	}
}

impl<M: Model> QuerySet<M> {
	pub(crate) fn from_table(table: Table<M>) -> Self {
		Self {
			table,
			steps: Vec::new(),
		}
	}

	/// Query over a fixed set of rows, without a manager.
	pub fn from_rows(rows: Vec<M>) -> Self {
		Self::from_table(Arc::new(RwLock::new(rows)))
	}

	/// An empty queryset over an empty table (Django's `none()`).
	pub fn none() -> Self {
		Self::from_rows(Vec::new())
	}

	pub fn model_name(&self) -> &'static str {
		M::schema().model
	}

	pub fn steps(&self) -> &[Step] {
		&self.steps
	}

	pub fn is_unfiltered(&self) -> bool {
		self.steps.is_empty()
	}

	/// Same table, no steps.
	pub fn unfiltered(&self) -> Self {
		Self::from_table(Arc::clone(&self.table))
	}

	fn push(mut self, step: Step) -> Self {
		self.steps.push(step);
		self
	}

	/// Narrow the queryset. An empty condition is a no-op and records no step.
	pub fn filter(self, condition: Condition) -> Self {
		if condition.is_empty() {
			return self;
		}
		self.push(Step::Filter(condition))
	}

	pub fn exclude(self, condition: Condition) -> Self {
		if condition.is_empty() {
			return self;
		}
		self.push(Step::Exclude(condition))
	}

	/// Sort by the given terms (`"name"`, `"-price"`).
	pub fn order_by(self, terms: &[&str]) -> QueryResult<Self> {
		let terms = terms
			.iter()
			.map(|t| OrderingTerm::parse(t))
			.collect::<QueryResult<Vec<_>>>()?;
		Ok(self.order_by_terms(terms))
	}

	pub fn order_by_terms(self, terms: Vec<OrderingTerm>) -> Self {
		self.push(Step::OrderBy(terms))
	}

	pub fn distinct(self) -> Self {
		self.push(Step::Distinct)
	}

	/// Keep at most `limit` rows (`qs[:limit]`).
	pub fn limit(self, limit: usize) -> Self {
		self.push(Step::Slice {
			offset: 0,
			limit: Some(limit),
		})
	}

	pub fn slice(self, offset: usize, limit: Option<usize>) -> Self {
		self.push(Step::Slice { offset, limit })
	}

	/// Whether both querysets read the same table with the same steps.
	pub fn same_query(&self, other: &Self) -> bool {
		Arc::ptr_eq(&self.table, &other.table) && self.steps == other.steps
	}

	/// Evaluate the queryset.
	pub fn results(&self) -> Vec<M> {
		let table = self.table.read();
		let mut rows: Vec<&M> = table.iter().collect();
		for step in &self.steps {
			rows = apply_step(rows, step);
		}
		tracing::trace!(model = M::schema().model, query = %self, rows = rows.len(), "evaluated queryset");
		rows.into_iter().cloned().collect()
	}

	pub fn count(&self) -> usize {
		self.results().len()
	}

	pub fn exists(&self) -> bool {
		self.count() > 0
	}

	pub fn first(&self) -> Option<M> {
		self.results().into_iter().next()
	}

	/// Flat list of the values at `path` (`values_list(path, flat=True)`).
	pub fn values_list(&self, path: &str) -> Vec<Value> {
		self.results()
			.iter()
			.flat_map(|row| row.values_at(path))
			.collect()
	}

	/// Distinct, sorted, non-null values at `path`.
	pub fn distinct_values(&self, path: &str) -> Vec<Value> {
		let mut values: Vec<Value> = Vec::new();
		for value in self.values_list(path) {
			if !value.is_null() && !values.iter().any(|v| v.loose_eq(&value)) {
				values.push(value);
			}
		}
		values.sort_by(Value::total_cmp);
		values
	}
}

fn apply_step<'a, M: Model>(rows: Vec<&'a M>, step: &Step) -> Vec<&'a M> {
	match step {
		Step::Filter(condition) => rows.into_iter().filter(|r| condition.matches(*r)).collect(),
		Step::Exclude(condition) => rows.into_iter().filter(|r| !condition.matches(*r)).collect(),
		Step::OrderBy(terms) => {
			let mut rows = rows;
			rows.sort_by(|a, b| compare_rows(*a, *b, terms));
			rows
		}
		Step::Distinct => {
			let mut seen: Vec<Value> = Vec::new();
			rows.into_iter()
				.filter(|r| {
					let pk = r.primary_key();
					if pk.is_null() {
						return true;
					}
					if seen.iter().any(|s| s.loose_eq(&pk)) {
						false
					} else {
						seen.push(pk);
						true
					}
				})
				.collect()
		}
		Step::Slice { offset, limit } => {
			let iter = rows.into_iter().skip(*offset);
			match limit {
				Some(limit) => iter.take(*limit).collect(),
				None => iter.collect(),
			}
		}
	}
}

/// Nulls sort last ascending and first descending, like PostgreSQL.
fn compare_rows<M: Model>(a: &M, b: &M, terms: &[OrderingTerm]) -> Ordering {
	for term in terms {
		let left = a.values_at(&term.path).into_iter().next().unwrap_or(Value::Null);
		let right = b.values_at(&term.path).into_iter().next().unwrap_or(Value::Null);
		let ordering = match (left.is_null(), right.is_null()) {
			(true, true) => Ordering::Equal,
			(true, false) => Ordering::Greater,
			(false, true) => Ordering::Less,
			(false, false) => left.total_cmp(&right),
		};
		let ordering = if term.descending {
			ordering.reverse()
		} else {
			ordering
		};
		if ordering != Ordering::Equal {
			return ordering;
		}
	}
	Ordering::Equal
}

impl<M: Model> PartialEq for QuerySet<M> {
	fn eq(&self, other: &Self) -> bool {
		self.same_query(other)
	}
}

impl<M: Model> fmt::Debug for QuerySet<M> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("QuerySet")
			.field("model", &M::schema().model)
			.field("steps", &self.steps)
			.finish()
	}
}

impl<M: Model> fmt::Display for QuerySet<M> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}.objects.all()", M::schema().model)?;
		for step in &self.steps {
			match step {
				Step::Slice { .. } => write!(f, "{}", step)?,
				_ => write!(f, ".{}", step)?,
			}
		}
		Ok(())
	}
}
