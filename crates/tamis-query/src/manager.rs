use crate::condition::Condition;
use crate::model::Model;
use crate::queryset::{QuerySet, Table};
use parking_lot::RwLock;
use std::sync::Arc;

/// Model manager (similar to Django's `Model.objects`).
///
/// Owns the in-memory table a model's querysets read from. Querysets
/// created before an [`insert`](Manager::insert) see the new row, the same
/// way a lazy Django queryset sees rows committed before evaluation.
pub struct Manager<M: Model> {
	table: Table<M>,
}

impl<M: Model> Manager<M> {
	pub fn new(rows: Vec<M>) -> Self {
		Self {
			table: Arc::new(RwLock::new(rows)),
		}
	}

	pub fn insert(&self, row: M) {
		self.table.write().push(row);
		tracing::trace!(model = M::schema().model, "inserted row");
	}

	pub fn len(&self) -> usize {
		self.table.read().len()
	}

	pub fn is_empty(&self) -> bool {
		self.table.read().is_empty()
	}

	/// Get all records
	pub fn all(&self) -> QuerySet<M> {
		QuerySet::from_table(Arc::clone(&self.table))
	}

	pub fn filter(&self, condition: Condition) -> QuerySet<M> {
		self.all().filter(condition)
	}

	/// Single record by primary key.
	pub fn get(&self, pk: impl Into<crate::Value>) -> Option<M> {
		let pk = pk.into();
		self.table
			.read()
			.iter()
			.find(|row| row.primary_key().loose_eq(&pk))
			.cloned()
	}
}

impl<M: Model> Default for Manager<M> {
	fn default() -> Self {
		Self::new(Vec::new())
	}
}

impl<M: Model> Clone for Manager<M> {
	fn clone(&self) -> Self {
		Self {
			table: Arc::clone(&self.table),
		}
	}
}

impl<M: Model> From<&Manager<M>> for QuerySet<M> {
	fn from(manager: &Manager<M>) -> Self {
		manager.all()
	}
}
