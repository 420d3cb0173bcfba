//! Collecting filters into an immutable, reusable filter set.

use crate::bound::BoundFilterSet;
use crate::error::{ConfigResult, ConfigurationError};
use crate::filter::{Filter, LookupChoice};
use crate::kind::FilterKind;
use crate::ordering::{
	DEFAULT_ORDER_BY_PARAM, OrderBy, OrderingFieldFactory, default_ordering_field, ordering_choices,
};
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use tamis_forms::{Choices, FormField, FormResult, QueryDict};
use tamis_query::{LOOKUP_SEP, Lookup, Model, QuerySet};

/// Which model fields get a generated filter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum FieldSelection {
	/// Only the explicitly declared filters.
	#[default]
	Declared,
	/// These model paths, in this order.
	Names(Vec<String>),
	/// Every non-relation field of the model.
	All,
}

/// Builder for [`FilterSetSpec`].
///
/// # Examples
///
/// ```
/// use tamis_filters::{Filter, FilterSetBuilder, OrderBy};
/// use tamis_query::Lookup;
/// # use tamis_query::{FieldInfo, FieldKind, FieldRef, Model, Record, Schema, Value};
/// # #[derive(Clone)]
/// # struct Product;
/// # impl Record for Product {
/// #     fn field(&self, _: &str) -> Option<FieldRef<'_>> { None }
/// #     fn primary_key(&self) -> Value { Value::Null }
/// # }
/// # impl Model for Product {
/// #     fn schema() -> Schema {
/// #         Schema::new("product", "id")
/// #             .field(FieldInfo::new("id", FieldKind::AutoField))
/// #             .field(FieldInfo::new("name", FieldKind::Char))
/// #             .field(FieldInfo::new("price", FieldKind::Decimal))
/// #     }
/// # }
///
/// let spec = FilterSetBuilder::<Product>::new()
///     .filter(Filter::number("price").with_lookup(Lookup::Lt))
///     .fields(&["name", "price"])
///     .order_by(OrderBy::All)
///     .build()
///     .unwrap();
///
/// let names: Vec<&str> = spec.filters().iter().map(|f| f.name()).collect();
/// assert_eq!(names, vec!["name", "price"]);
/// ```
pub struct FilterSetBuilder<M: Model> {
	filters: Vec<Filter<M>>,
	selection: FieldSelection,
	exclude: Vec<String>,
	order_by: OrderBy,
	order_by_param: String,
	ordering_field: Option<OrderingFieldFactory>,
	prefix: Option<String>,
}

impl<M: Model> Default for FilterSetBuilder<M> {
	fn default() -> Self {
		Self::new()
	}
}

impl<M: Model> FilterSetBuilder<M> {
	pub fn new() -> Self {
		Self {
			filters: Vec::new(),
			selection: FieldSelection::Declared,
			exclude: Vec::new(),
			order_by: OrderBy::Disabled,
			order_by_param: DEFAULT_ORDER_BY_PARAM.to_string(),
			ordering_field: None,
			prefix: None,
		}
	}

	/// Declare a filter explicitly.
	pub fn filter(mut self, filter: Filter<M>) -> Self {
		self.filters.push(filter);
		self
	}

	/// Model paths to filter on. Names without an explicit declaration get
	/// a generated `exact` filter.
	pub fn fields(mut self, names: &[&str]) -> Self {
		self.selection = FieldSelection::Names(names.iter().map(|n| n.to_string()).collect());
		self
	}

	/// Generate filters for every non-relation field.
	pub fn all_fields(mut self) -> Self {
		self.selection = FieldSelection::All;
		self
	}

	pub fn with_selection(mut self, selection: FieldSelection) -> Self {
		self.selection = selection;
		self
	}

	/// Skip generating filters for these names.
	pub fn exclude(mut self, names: &[&str]) -> Self {
		self.exclude.extend(names.iter().map(|n| n.to_string()));
		self
	}

	pub fn order_by(mut self, order_by: OrderBy) -> Self {
		self.order_by = order_by;
		self
	}

	/// Query parameter carrying the ordering choice.
	pub fn order_by_param(mut self, param: impl Into<String>) -> Self {
		self.order_by_param = param.into();
		self
	}

	/// Replace the form field used for the ordering choice.
	pub fn ordering_field<F>(mut self, factory: F) -> Self
	where
		F: Fn(&str, Choices) -> Box<dyn FormField> + Send + Sync + 'static,
	{
		self.ordering_field = Some(Arc::new(factory));
		self
	}

	/// Prefix input names with `<prefix>-`.
	pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
		self.prefix = Some(prefix.into());
		self
	}

	/// Validate the declaration and produce the final filter sequence.
	pub fn build(self) -> ConfigResult<FilterSetSpec<M>> {
		let schema = M::schema();

		let mut seen = HashSet::new();
		for filter in &self.filters {
			if !seen.insert(filter.name().to_string()) {
				return Err(ConfigurationError::DuplicateFilter(filter.name().to_string()));
			}
			if let LookupChoice::Fixed(lookup @ (Lookup::IsNull | Lookup::In | Lookup::Range)) = filter.lookup()
				&& matches!(
					filter.kind(),
					FilterKind::Choice | FilterKind::ModelChoice | FilterKind::AllValues
				)
			{
				return Err(ConfigurationError::ConflictingOptions(format!(
					"filter '{}' offers a single choice and cannot use lookup '{}'",
					filter.name(),
					lookup
				)));
			}
		}

		let names: Vec<String> = match &self.selection {
			FieldSelection::Declared => Vec::new(),
			FieldSelection::Names(names) => {
				if let Some(name) = names.iter().find(|n| self.exclude.contains(n)) {
					return Err(ConfigurationError::ConflictingOptions(format!(
						"'{}' is both in fields and exclude",
						name
					)));
				}
				names.clone()
			}
			FieldSelection::All => schema
				.concrete_field_names()
				.into_iter()
				.map(str::to_string)
				.filter(|name| !self.exclude.contains(name))
				.collect(),
		};

		let mut declared: Vec<Option<Filter<M>>> = self.filters.into_iter().map(Some).collect();
		let mut filters = Vec::with_capacity(names.len() + declared.len());
		for name in &names {
			let explicit = declared
				.iter_mut()
				.find(|slot| slot.as_ref().is_some_and(|f| f.name() == name.as_str()))
				.and_then(Option::take);
			match explicit {
				Some(filter) => filters.push(filter),
				None => filters.push(generate_filter::<M>(name)?),
			}
		}
		filters.extend(declared.into_iter().flatten());

		for filter in &mut filters {
			match schema.resolve(filter.field_name()) {
				Some(resolved) => filter.set_target(Some(resolved.field)),
				None if filter.has_action() => filter.set_target(None),
				None => {
					return Err(ConfigurationError::UnknownField {
						model: schema.model.to_string(),
						name: filter.field_name().to_string(),
					});
				}
			}
		}

		if let OrderBy::Fields(ordering) = &self.order_by
			&& let Some(name) = ordering
				.iter()
				.find(|n| !filters.iter().any(|f| f.name() == n.as_str() && f.target().is_some()))
		{
			return Err(ConfigurationError::UnknownField {
				model: schema.model.to_string(),
				name: name.clone(),
			});
		}
		if self.order_by.is_enabled() && filters.iter().any(|f| f.name() == self.order_by_param) {
			return Err(ConfigurationError::ConflictingOptions(format!(
				"ordering parameter '{}' is also a filter name",
				self.order_by_param
			)));
		}

		tracing::debug!(
			model = schema.model,
			filters = filters.len(),
			ordering = self.order_by.is_enabled(),
			"built filter set"
		);

		Ok(FilterSetSpec {
			filters,
			order_by: self.order_by,
			order_by_param: self.order_by_param,
			ordering_field: self
				.ordering_field
				.unwrap_or_else(|| Arc::new(default_ordering_field) as OrderingFieldFactory),
			prefix: self.prefix,
		})
	}
}

/// Filter for a configured name that has no explicit declaration.
fn generate_filter<M: Model>(name: &str) -> ConfigResult<Filter<M>> {
	let schema = M::schema();
	let resolved = schema
		.resolve(name)
		.ok_or_else(|| ConfigurationError::UnknownField {
			model: schema.model.to_string(),
			name: name.to_string(),
		})?;
	let kind = FilterKind::infer(&resolved.field);
	let filter = Filter::new(name, kind);
	Ok(match resolved.field.kind.related_schema() {
		Some(related) => {
			filter.with_field_name(format!("{}{}{}", name, LOOKUP_SEP, related.primary_key))
		}
		None => filter,
	})
}

/// An immutable filter set: the final filters plus ordering configuration.
///
/// Built once and shared; bind it per request with [`bind`](Self::bind).
pub struct FilterSetSpec<M: Model> {
	filters: Vec<Filter<M>>,
	order_by: OrderBy,
	order_by_param: String,
	ordering_field: OrderingFieldFactory,
	prefix: Option<String>,
}

impl<M: Model> FilterSetSpec<M> {
	pub fn builder() -> FilterSetBuilder<M> {
		FilterSetBuilder::new()
	}

	pub fn filters(&self) -> &[Filter<M>] {
		&self.filters
	}

	pub fn filter(&self, name: &str) -> Option<&Filter<M>> {
		self.filters.iter().find(|f| f.name() == name)
	}

	pub fn order_by(&self) -> &OrderBy {
		&self.order_by
	}

	pub fn order_by_param(&self) -> &str {
		&self.order_by_param
	}

	pub fn prefix(&self) -> Option<&str> {
		self.prefix.as_deref()
	}

	/// Ordering options, `(value, label)`. Filters without a model field
	/// cannot sort.
	pub fn ordering_choices(&self) -> Choices {
		let names: Vec<(String, String)> = self
			.filters
			.iter()
			.filter(|f| f.target().is_some())
			.map(|f| {
				let label = f.label().unwrap_or_else(|| pretty_name(f.name()));
				(f.name().to_string(), label)
			})
			.collect();
		ordering_choices(&self.order_by, &names)
	}

	pub(crate) fn ordering_field(&self, choices: Choices) -> Option<Box<dyn FormField>> {
		self.order_by
			.is_enabled()
			.then(|| (self.ordering_field)(self.order_by_param.as_str(), choices))
	}

	/// Bind submitted parameters over `base`.
	pub fn bind(&self, data: QueryDict, base: impl Into<QuerySet<M>>) -> BoundFilterSet<'_, M> {
		BoundFilterSet::new(self, Some(data), base.into())
	}

	/// Bind a raw query string (`price=10&order_by=-name`).
	pub fn bind_query_string(
		&self,
		query: &str,
		base: impl Into<QuerySet<M>>,
	) -> FormResult<BoundFilterSet<'_, M>> {
		let data = QueryDict::parse(query)?;
		Ok(self.bind(data, base))
	}

	/// A filter set without submitted data. Its queryset is `base`.
	pub fn unbound(&self, base: impl Into<QuerySet<M>>) -> BoundFilterSet<'_, M> {
		BoundFilterSet::new(self, None, base.into())
	}
}

impl<M: Model> fmt::Debug for FilterSetSpec<M> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("FilterSetSpec")
			.field("model", &M::schema().model)
			.field("filters", &self.filters)
			.field("order_by", &self.order_by)
			.field("order_by_param", &self.order_by_param)
			.field("prefix", &self.prefix)
			.finish()
	}
}

/// `manufacturer__name` -> `Manufacturer name`.
fn pretty_name(name: &str) -> String {
	let spaced = name.replace(LOOKUP_SEP, " ").replace('_', " ");
	let mut chars = spaced.chars();
	match chars.next() {
		Some(first) => first.to_uppercase().chain(chars).collect(),
		None => String::new(),
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::filter::LookupChoice;
	use rstest::rstest;
	use tamis_query::{FieldInfo, FieldKind, FieldRef, Lookup, Record, Schema, Value};

	#[derive(Clone)]
	struct Book;

	fn author() -> Schema {
		Schema::new("author", "id")
			.field(FieldInfo::new("id", FieldKind::AutoField))
			.field(FieldInfo::new("name", FieldKind::Char))
	}

	impl Record for Book {
		fn field(&self, _: &str) -> Option<FieldRef<'_>> {
			None
		}

		fn primary_key(&self) -> Value {
			Value::Null
		}
	}

	impl Model for Book {
		fn schema() -> Schema {
			Schema::new("book", "id")
				.field(FieldInfo::new("id", FieldKind::AutoField))
				.field(FieldInfo::new("title", FieldKind::Char).with_verbose_name("Book title"))
				.field(FieldInfo::new("pages", FieldKind::Integer))
				.field(FieldInfo::new("published", FieldKind::Date))
				.field(FieldInfo::new("author", FieldKind::ForeignKey(author)))
		}
	}

	fn names(spec: &FilterSetSpec<Book>) -> Vec<&str> {
		spec.filters().iter().map(|f| f.name()).collect()
	}

	#[rstest]
	fn test_explicit_replaces_generated_in_place() {
		// Arrange
		let builder = FilterSetBuilder::<Book>::new()
			.filter(Filter::number("pages").with_lookup(Lookup::Gte))
			.filter(Filter::char("q").with_field_name("title").with_lookup(Lookup::IContains))
			.fields(&["title", "pages", "published"]);

		// Act
		let spec = builder.build().unwrap();

		// Assert
		assert_eq!(names(&spec), vec!["title", "pages", "published", "q"]);
		assert_eq!(
			spec.filter("pages").unwrap().lookup(),
			&LookupChoice::Fixed(Lookup::Gte)
		);
		assert_eq!(
			spec.filter("title").unwrap().lookup(),
			&LookupChoice::Fixed(Lookup::Exact)
		);
	}

	#[rstest]
	fn test_generated_kinds_and_targets() {
		let spec = FilterSetBuilder::<Book>::new()
			.fields(&["title", "published", "author", "author__name"])
			.build()
			.unwrap();

		assert_eq!(spec.filter("title").unwrap().kind(), FilterKind::Char);
		assert_eq!(spec.filter("published").unwrap().kind(), FilterKind::Date);
		let author = spec.filter("author").unwrap();
		assert_eq!(author.kind(), FilterKind::Number);
		assert_eq!(author.field_name(), "author__id");
		let author_name = spec.filter("author__name").unwrap();
		assert_eq!(author_name.field_name(), "author__name");
		assert_eq!(author_name.target().map(|t| t.name), Some("name"));
	}

	#[rstest]
	fn test_all_fields_skips_relations_and_excluded() {
		let spec = FilterSetBuilder::<Book>::new()
			.all_fields()
			.exclude(&["id"])
			.build()
			.unwrap();

		assert_eq!(names(&spec), vec!["title", "pages", "published"]);
	}

	#[rstest]
	#[case(
		FilterSetBuilder::<Book>::new().fields(&["isbn"]),
		ConfigurationError::UnknownField { model: "book".into(), name: "isbn".into() }
	)]
	#[case(
		FilterSetBuilder::<Book>::new().filter(Filter::char("title")).filter(Filter::char("title")),
		ConfigurationError::DuplicateFilter("title".into())
	)]
	#[case(
		FilterSetBuilder::<Book>::new().filter(Filter::char("q").with_field_name("title__isbn")),
		ConfigurationError::UnknownField { model: "book".into(), name: "title__isbn".into() }
	)]
	#[case(
		FilterSetBuilder::<Book>::new().fields(&["title"]).order_by(OrderBy::Fields(vec!["pages".into()])),
		ConfigurationError::UnknownField { model: "book".into(), name: "pages".into() }
	)]
	fn test_configuration_errors(
		#[case] builder: FilterSetBuilder<Book>,
		#[case] expected: ConfigurationError,
	) {
		assert_eq!(builder.build().unwrap_err(), expected);
	}

	#[rstest]
	fn test_conflicting_options() {
		let both = FilterSetBuilder::<Book>::new()
			.fields(&["title", "pages"])
			.exclude(&["pages"])
			.build();
		assert!(matches!(both, Err(ConfigurationError::ConflictingOptions(_))));

		let param_clash = FilterSetBuilder::<Book>::new()
			.fields(&["title"])
			.order_by(OrderBy::All)
			.order_by_param("title")
			.build();
		assert!(matches!(param_clash, Err(ConfigurationError::ConflictingOptions(_))));
	}

	#[rstest]
	fn test_action_filter_needs_no_field() {
		let spec = FilterSetBuilder::<Book>::new()
			.filter(Filter::char("search").with_action(|qs, _| qs))
			.build()
			.unwrap();

		assert!(spec.filter("search").unwrap().target().is_none());
	}

	#[rstest]
	fn test_ordering_labels() {
		// Arrange
		let spec = FilterSetBuilder::<Book>::new()
			.fields(&["title", "author__name"])
			.order_by(OrderBy::All)
			.build()
			.unwrap();

		// Act
		let choices = spec.ordering_choices();

		// Assert
		assert_eq!(
			choices,
			vec![
				("title".to_string(), "Book title".to_string()),
				("-title".to_string(), "Book title (descending)".to_string()),
				("author__name".to_string(), "Author name".to_string()),
				("-author__name".to_string(), "Author name (descending)".to_string()),
			]
		);
	}

	#[rstest]
	fn test_spec_is_shareable() {
		fn assert_send_sync<T: Send + Sync>() {}
		assert_send_sync::<FilterSetSpec<Book>>();
	}
}
