//! A filter set bound to one request's parameters.

use crate::filterset::FilterSetSpec;
use crate::kind::FilterValue;
use crate::ordering::resolve_choice;
use indexmap::IndexMap;
use once_cell::sync::OnceCell;
use std::collections::HashMap;
use tamis_forms::{BoundField, Choices, Form, FormError, FormField, QueryDict};
use tamis_query::{Model, OrderingTerm, QuerySet};

/// Where a bound filter set is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterSetState {
	/// No data submitted.
	Unbound,
	Valid,
	/// At least one field failed; the queryset falls back to the base.
	Invalid,
	/// The queryset has been composed and cached.
	Composed,
}

/// The form behind a bound filter set: one field per filter plus the
/// optional ordering field.
///
/// The ordering field is cleaned on its own so that a bad ordering choice
/// never invalidates the filters.
pub struct FilterForm {
	form: Form,
	ordering_field: Option<Box<dyn FormField>>,
	ordering_data: Option<serde_json::Value>,
	ordering: Option<OrderingTerm>,
	values: IndexMap<String, FilterValue>,
	valid: bool,
}

impl FilterForm {
	pub fn is_bound(&self) -> bool {
		self.form.is_bound()
	}

	/// Whether every filter field cleaned. Unbound forms are not valid.
	pub fn is_valid(&self) -> bool {
		self.valid
	}

	/// Per-field error messages, keyed by filter name.
	pub fn errors(&self) -> &HashMap<String, Vec<String>> {
		self.form.errors()
	}

	pub fn cleaned_data(&self) -> &HashMap<String, serde_json::Value> {
		self.form.cleaned_data()
	}

	/// Typed value of one filter. `None` for unknown names.
	pub fn value(&self, name: &str) -> Option<&FilterValue> {
		self.values.get(name)
	}

	/// Filter values in declaration order.
	pub fn values(&self) -> impl Iterator<Item = (&str, &FilterValue)> {
		self.values.iter().map(|(name, value)| (name.as_str(), value))
	}

	/// Ordering picked by the user, already mapped to a model path.
	pub fn ordering(&self) -> Option<&OrderingTerm> {
		self.ordering.as_ref()
	}

	/// Filter fields first, then the ordering field.
	pub fn fields(&self) -> impl Iterator<Item = &dyn FormField> {
		self.form
			.fields()
			.iter()
			.map(|f| f.as_ref())
			.chain(self.ordering_field.as_deref())
	}

	pub fn bound_field(&self, name: &str) -> Option<BoundField<'_>> {
		if let Some(field) = self.ordering_field.as_deref()
			&& field.name() == name
		{
			return Some(BoundField::new(
				field,
				self.ordering_data.as_ref(),
				&[],
				self.form.prefix(),
			));
		}
		self.form.get_bound_field(name)
	}

	pub fn bound_fields(&self) -> impl Iterator<Item = BoundField<'_>> {
		self.fields().filter_map(|field| self.bound_field(field.name()))
	}

	pub fn prefix(&self) -> &str {
		self.form.prefix()
	}
}

/// A [`FilterSetSpec`] bound to submitted data and a base queryset.
///
/// The form, the composed queryset and its rows are each computed once, on
/// first use.
pub struct BoundFilterSet<'s, M: Model> {
	spec: &'s FilterSetSpec<M>,
	data: Option<QueryDict>,
	base: QuerySet<M>,
	form: OnceCell<FilterForm>,
	qs: OnceCell<QuerySet<M>>,
	results: OnceCell<Vec<M>>,
}

impl<'s, M: Model> BoundFilterSet<'s, M> {
	pub(crate) fn new(spec: &'s FilterSetSpec<M>, data: Option<QueryDict>, base: QuerySet<M>) -> Self {
		Self {
			spec,
			data,
			base,
			form: OnceCell::new(),
			qs: OnceCell::new(),
			results: OnceCell::new(),
		}
	}

	pub fn spec(&self) -> &'s FilterSetSpec<M> {
		self.spec
	}

	pub fn is_bound(&self) -> bool {
		self.data.is_some()
	}

	pub fn data(&self) -> Option<&QueryDict> {
		self.data.as_ref()
	}

	/// The queryset filters are applied to.
	pub fn base(&self) -> &QuerySet<M> {
		&self.base
	}

	pub fn form(&self) -> &FilterForm {
		self.form.get_or_init(|| self.build_form())
	}

	pub fn is_valid(&self) -> bool {
		self.form().is_valid()
	}

	pub fn errors(&self) -> &HashMap<String, Vec<String>> {
		self.form().errors()
	}

	pub fn state(&self) -> FilterSetState {
		if self.qs.get().is_some() {
			FilterSetState::Composed
		} else if !self.is_bound() {
			FilterSetState::Unbound
		} else if self.is_valid() {
			FilterSetState::Valid
		} else {
			FilterSetState::Invalid
		}
	}

	/// The composed queryset. Not evaluated.
	///
	/// Filters run in declaration order, ordering last. Invalid input yields
	/// the base queryset untouched.
	pub fn qs(&self) -> &QuerySet<M> {
		self.qs.get_or_init(|| self.compose())
	}

	/// Rows of the composed queryset, evaluated once.
	pub fn results(&self) -> &[M] {
		self.results.get_or_init(|| self.qs().results())
	}

	pub fn count(&self) -> usize {
		self.results().len()
	}

	pub fn iter(&self) -> std::slice::Iter<'_, M> {
		self.results().iter()
	}

	fn compose(&self) -> QuerySet<M> {
		if !self.is_bound() {
			return self.base.clone();
		}
		let form = self.form();
		if !form.is_valid() {
			tracing::debug!(
				model = self.base.model_name(),
				errors = ?form.errors(),
				"invalid filter input, returning base queryset"
			);
			return self.base.clone();
		}

		let mut qs = self.base.clone();
		for filter in self.spec.filters() {
			let Some(value) = form.value(filter.name()) else {
				continue;
			};
			if value.is_empty() {
				continue;
			}
			tracing::debug!(filter = filter.name(), path = filter.field_name(), ?value, "applying filter");
			qs = filter.apply(qs, value);
		}

		match form.ordering() {
			Some(term) => qs.order_by_terms(vec![term.clone()]),
			None => qs,
		}
	}

	fn build_form(&self) -> FilterForm {
		let mut form = match self.spec.prefix() {
			Some(prefix) => Form::with_prefix(prefix),
			None => Form::new(),
		};
		let choices: Vec<Choices> = self
			.spec
			.filters()
			.iter()
			.map(|filter| filter.choices(&self.base))
			.collect();
		for (filter, choices) in self.spec.filters().iter().zip(&choices) {
			form.add_field(filter.form_field(choices.clone()));
		}
		let offered = self.spec.ordering_choices();
		let ordering_field = self.spec.ordering_field(offered.clone());

		let mut values: IndexMap<String, FilterValue> = self
			.spec
			.filters()
			.iter()
			.map(|filter| (filter.name().to_string(), FilterValue::Empty))
			.collect();

		let Some(data) = &self.data else {
			return FilterForm {
				form,
				ordering_field,
				ordering_data: None,
				ordering: None,
				values,
				valid: false,
			};
		};

		form.bind_query(data);
		let mut valid = form.is_valid();
		for (filter, choices) in self.spec.filters().iter().zip(&choices) {
			let Some(cleaned) = form.cleaned_data().get(filter.name()) else {
				continue;
			};
			match filter.to_value(cleaned, choices) {
				Ok(value) => {
					values.insert(filter.name().to_string(), value);
				}
				Err(error) => {
					form.add_error(FormError::Field {
						field: filter.name().to_string(),
						error,
					});
					valid = false;
				}
			}
		}

		let ordering_data = ordering_field
			.as_deref()
			.and_then(|field| field.value_from_data(data, &form.add_prefix_to_field_name(field.name())));
		let ordering = ordering_field
			.as_deref()
			.and_then(|field| self.resolve_ordering(field, ordering_data.as_ref(), &offered));

		FilterForm {
			form,
			ordering_field,
			ordering_data,
			ordering,
			values,
			valid,
		}
	}

	fn resolve_ordering(
		&self,
		field: &dyn FormField,
		raw: Option<&serde_json::Value>,
		offered: &[(String, String)],
	) -> Option<OrderingTerm> {
		let cleaned = match field.clean(raw) {
			Ok(cleaned) => cleaned,
			Err(error) => {
				tracing::debug!(param = field.name(), %error, "ignoring ordering choice");
				return None;
			}
		};
		let choice = cleaned.as_str().filter(|c| !c.is_empty())?;
		let term = resolve_choice(choice, offered, |name| {
			self.spec
				.filter(name)
				.filter(|f| f.target().is_some())
				.map(|f| f.field_name())
		});
		if term.is_none() {
			tracing::debug!(param = field.name(), choice, "ignoring ordering choice");
		}
		term
	}
}

impl<'a, 's, M: Model> IntoIterator for &'a BoundFilterSet<'s, M> {
	type Item = &'a M;
	type IntoIter = std::slice::Iter<'a, M>;

	fn into_iter(self) -> Self::IntoIter {
		self.iter()
	}
}
