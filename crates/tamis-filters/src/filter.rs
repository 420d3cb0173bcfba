//! A single declared filter.

use crate::kind::{DATE_RANGE_OPTIONS, FilterKind, FilterValue, NON_LETTER};
use chrono::{Datelike, Days, Local, NaiveDate, NaiveDateTime, NaiveTime};
use rust_decimal::Decimal;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use tamis_forms::{
	CharField, ChoiceField, Choices, DATE_FORMAT, DATETIME_FORMAT, DateField, DateTimeField,
	DecimalField, FieldError, FieldResult, FormField, LookupTypeField, MultipleChoiceField,
	NullBooleanField, RangeField, TIME_FORMAT, TimeField,
};
use tamis_query::{Condition, FieldInfo, FieldKind, Lookup, Model, QuerySet, RecordExt, Value};

/// Which lookup a filter applies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupChoice {
	Fixed(Lookup),
	/// The user picks one of these alongside the value.
	Choosable(Vec<Lookup>),
}

impl LookupChoice {
	/// Let the user pick any supported lookup.
	pub fn any() -> Self {
		LookupChoice::Choosable(Lookup::ALL.to_vec())
	}
}

impl Default for LookupChoice {
	fn default() -> Self {
		LookupChoice::Fixed(Lookup::Exact)
	}
}

/// Where a choice filter gets its options.
#[derive(Clone)]
pub enum ChoiceSource {
	Static(Choices),
	/// Computed each time a filter set is bound.
	Dynamic(Arc<dyn Fn() -> Choices + Send + Sync>),
}

impl ChoiceSource {
	pub fn resolve(&self) -> Choices {
		match self {
			ChoiceSource::Static(choices) => choices.clone(),
			ChoiceSource::Dynamic(f) => f(),
		}
	}
}

impl fmt::Debug for ChoiceSource {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			ChoiceSource::Static(choices) => f.debug_tuple("Static").field(choices).finish(),
			ChoiceSource::Dynamic(_) => f.write_str("Dynamic(..)"),
		}
	}
}

/// Custom filtering step replacing the default predicate.
pub type FilterAction<M> = Arc<dyn Fn(QuerySet<M>, &FilterValue) -> QuerySet<M> + Send + Sync>;

/// One user-facing filter parameter.
///
/// # Examples
///
/// ```
/// use tamis_filters::{Filter, FilterKind, LookupChoice};
/// use tamis_query::Lookup;
/// # use tamis_query::{FieldRef, Model, Record, Schema, Value};
/// # #[derive(Clone)]
/// # struct Product;
/// # impl Record for Product {
/// #     fn field(&self, _: &str) -> Option<FieldRef<'_>> { None }
/// #     fn primary_key(&self) -> Value { Value::Null }
/// # }
/// # impl Model for Product {
/// #     fn schema() -> Schema { Schema::new("product", "id") }
/// # }
///
/// let cheaper_than = Filter::<Product>::number("max_price")
///     .with_field_name("price")
///     .with_lookup(Lookup::Lt)
///     .with_label("Cheaper than");
///
/// assert_eq!(cheaper_than.name(), "max_price");
/// assert_eq!(cheaper_than.field_name(), "price");
/// assert_eq!(cheaper_than.kind(), FilterKind::Number);
/// assert_eq!(cheaper_than.lookup(), &LookupChoice::Fixed(Lookup::Lt));
/// ```
pub struct Filter<M: Model> {
	name: String,
	field_name: String,
	kind: FilterKind,
	lookup: LookupChoice,
	label: Option<String>,
	required: bool,
	extra: serde_json::Map<String, serde_json::Value>,
	choices: Option<ChoiceSource>,
	action: Option<FilterAction<M>>,
	reference_date: Option<NaiveDate>,
	non_letter: String,
	target: Option<FieldInfo>,
}

impl<M: Model> Clone for Filter<M> {
	fn clone(&self) -> Self {
		Self {
			name: self.name.clone(),
			field_name: self.field_name.clone(),
			kind: self.kind,
			lookup: self.lookup.clone(),
			label: self.label.clone(),
			required: self.required,
			extra: self.extra.clone(),
			choices: self.choices.clone(),
			action: self.action.clone(),
			reference_date: self.reference_date,
			non_letter: self.non_letter.clone(),
			target: self.target.clone(),
		}
	}
}

impl<M: Model> fmt::Debug for Filter<M> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Filter")
			.field("name", &self.name)
			.field("field_name", &self.field_name)
			.field("kind", &self.kind)
			.field("lookup", &self.lookup)
			.field("required", &self.required)
			.field("has_action", &self.action.is_some())
			.finish()
	}
}

impl<M: Model> Filter<M> {
	/// A filter on the model field of the same name, with lookup `exact`.
	pub fn new(name: impl Into<String>, kind: FilterKind) -> Self {
		let name = name.into();
		Self {
			field_name: name.clone(),
			name,
			kind,
			lookup: LookupChoice::default(),
			label: None,
			required: false,
			extra: serde_json::Map::new(),
			choices: None,
			action: None,
			reference_date: None,
			non_letter: NON_LETTER.to_string(),
			target: None,
		}
	}

	pub fn char(name: impl Into<String>) -> Self {
		Self::new(name, FilterKind::Char)
	}

	pub fn boolean(name: impl Into<String>) -> Self {
		Self::new(name, FilterKind::Boolean)
	}

	pub fn number(name: impl Into<String>) -> Self {
		Self::new(name, FilterKind::Number)
	}

	pub fn date(name: impl Into<String>) -> Self {
		Self::new(name, FilterKind::Date)
	}

	pub fn datetime(name: impl Into<String>) -> Self {
		Self::new(name, FilterKind::DateTime)
	}

	pub fn time(name: impl Into<String>) -> Self {
		Self::new(name, FilterKind::Time)
	}

	pub fn range(name: impl Into<String>) -> Self {
		Self::new(name, FilterKind::Range)
	}

	/// "Any date / today / past 7 days / this month / this year".
	pub fn date_range(name: impl Into<String>) -> Self {
		Self::new(name, FilterKind::DateRange)
	}

	/// Choices are every distinct value the column currently holds.
	pub fn all_values(name: impl Into<String>) -> Self {
		Self::new(name, FilterKind::AllValues)
	}

	/// Filter by first letter.
	pub fn abc(name: impl Into<String>) -> Self {
		Self::new(name, FilterKind::Abc)
	}

	pub fn choice(name: impl Into<String>, choices: Choices) -> Self {
		Self::new(name, FilterKind::Choice).with_choices(choices)
	}

	/// Matches any of the selected values.
	pub fn multiple_choice(name: impl Into<String>, choices: Choices) -> Self {
		Self::new(name, FilterKind::MultipleChoice).with_choices(choices)
	}

	/// Pick one related object. Choices are the rows of `related`, labelled
	/// by the value at `label_path`.
	pub fn model_choice<R: Model>(
		name: impl Into<String>,
		related: QuerySet<R>,
		label_path: &str,
	) -> Self {
		Self::new(name, FilterKind::ModelChoice)
			.with_choice_source(related_choices(related, label_path))
	}

	pub fn model_multiple_choice<R: Model>(
		name: impl Into<String>,
		related: QuerySet<R>,
		label_path: &str,
	) -> Self {
		Self::new(name, FilterKind::ModelMultipleChoice)
			.with_choice_source(related_choices(related, label_path))
	}

	/// Model path the predicate applies to (`price`, `manufacturer__name`).
	pub fn with_field_name(mut self, field_name: impl Into<String>) -> Self {
		self.field_name = field_name.into();
		self
	}

	pub fn with_lookup(mut self, lookup: Lookup) -> Self {
		self.lookup = LookupChoice::Fixed(lookup);
		self
	}

	/// Let the user choose among `lookups`.
	pub fn with_lookups(mut self, lookups: Vec<Lookup>) -> Self {
		self.lookup = LookupChoice::Choosable(lookups);
		self
	}

	pub fn with_lookup_choice(mut self, lookup: LookupChoice) -> Self {
		self.lookup = lookup;
		self
	}

	pub fn with_label(mut self, label: impl Into<String>) -> Self {
		self.label = Some(label.into());
		self
	}

	pub fn required(mut self) -> Self {
		self.required = true;
		self
	}

	/// Extra form field parameter (`max_length`, `decimal_places`,
	/// `help_text`, `choices`, ...).
	pub fn with_extra(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
		self.extra.insert(key.into(), value.into());
		self
	}

	pub fn with_choices(self, choices: Choices) -> Self {
		self.with_choice_source(ChoiceSource::Static(choices))
	}

	pub fn with_choice_source(mut self, source: ChoiceSource) -> Self {
		self.choices = Some(source);
		self
	}

	/// Replace the default predicate with a custom queryset step. Filters
	/// with an action need not name a model field.
	pub fn with_action<F>(mut self, action: F) -> Self
	where
		F: Fn(QuerySet<M>, &FilterValue) -> QuerySet<M> + Send + Sync + 'static,
	{
		self.action = Some(Arc::new(action));
		self
	}

	/// Pin "today" for date range filters.
	pub fn with_reference_date(mut self, date: NaiveDate) -> Self {
		self.reference_date = Some(date);
		self
	}

	/// Marker an ABC filter offers for "not starting with a letter".
	pub fn with_non_letter(mut self, marker: impl Into<String>) -> Self {
		self.non_letter = marker.into();
		self
	}

	pub fn name(&self) -> &str {
		&self.name
	}

	pub fn field_name(&self) -> &str {
		&self.field_name
	}

	pub fn kind(&self) -> FilterKind {
		self.kind
	}

	pub fn lookup(&self) -> &LookupChoice {
		&self.lookup
	}

	pub fn is_required(&self) -> bool {
		self.required
	}

	pub fn extra(&self) -> &serde_json::Map<String, serde_json::Value> {
		&self.extra
	}

	pub fn has_action(&self) -> bool {
		self.action.is_some()
	}

	/// The model field this filter was resolved to when its set was built.
	pub fn target(&self) -> Option<&FieldInfo> {
		self.target.as_ref()
	}

	pub(crate) fn set_target(&mut self, target: Option<FieldInfo>) {
		self.target = target;
	}

	/// Explicit label, else the model field's verbose name.
	pub fn label(&self) -> Option<String> {
		self.label
			.clone()
			.or_else(|| self.target.as_ref().and_then(|t| t.verbose_name.map(str::to_string)))
	}

	fn today(&self) -> NaiveDate {
		self.reference_date
			.unwrap_or_else(|| Local::now().date_naive())
	}

	/// Options offered by choice-like kinds. `base` supplies the rows of an
	/// all-values filter.
	pub fn choices(&self, base: &QuerySet<M>) -> Choices {
		match self.kind {
			FilterKind::DateRange => DATE_RANGE_OPTIONS
				.iter()
				.map(|(value, label)| (value.to_string(), label.to_string()))
				.collect(),
			FilterKind::Abc => ('A'..='Z')
				.map(|c| c.to_string())
				.chain(std::iter::once(self.non_letter.clone()))
				.map(|c| (c.clone(), c))
				.collect(),
			FilterKind::AllValues if self.choices.is_none() => base
				.unfiltered()
				.distinct_values(&self.field_name)
				.iter()
				.filter_map(Value::to_text)
				.map(|text| (text.clone(), text))
				.collect(),
			kind if !kind.has_choices() => Vec::new(),
			_ => {
				if let Some(source) = &self.choices {
					return source.resolve();
				}
				if let Some(choices) = self.extra.get("choices").and_then(choices_from_json) {
					return choices;
				}
				self.target
					.as_ref()
					.and_then(|t| t.choices)
					.map(|choices| {
						choices
							.iter()
							.map(|(value, label)| (value.to_string(), label.to_string()))
							.collect()
					})
					.unwrap_or_default()
			}
		}
	}

	/// Build the form field this filter binds through.
	pub fn form_field(&self, choices: Choices) -> Box<dyn FormField> {
		let label = self.label();
		let inner: Box<dyn FormField> = match self.operand_lookup() {
			Some(Lookup::IsNull) => {
				let mut field = NullBooleanField::new(self.name.as_str());
				field.help_text = self.help_text();
				field.label = label.clone();
				Box::new(field)
			}
			// Comma separated: `in` takes any number of values, `range` two.
			Some(_) => {
				let mut field = CharField::new(self.name.as_str());
				field.help_text = self.help_text();
				field.required = self.required;
				field.label = label.clone();
				Box::new(field)
			}
			None => self.kind_field(choices, label.clone()),
		};

		match &self.lookup {
			LookupChoice::Fixed(_) => inner,
			LookupChoice::Choosable(lookups) => {
				let lookups = lookups
					.iter()
					.map(|l| (l.as_str().to_string(), l.as_str().to_string()))
					.collect();
				let field = LookupTypeField::new(inner, lookups);
				Box::new(match label {
					Some(label) => field.with_label(label),
					None => field,
				})
			}
		}
	}

	/// The fixed lookup of a single-value kind when its operand is not one
	/// value of that kind.
	fn operand_lookup(&self) -> Option<Lookup> {
		match (&self.lookup, self.kind) {
			(
				LookupChoice::Fixed(lookup @ (Lookup::IsNull | Lookup::In | Lookup::Range)),
				FilterKind::Char
				| FilterKind::Number
				| FilterKind::Date
				| FilterKind::DateTime
				| FilterKind::Time,
			) => Some(*lookup),
			_ => None,
		}
	}

	fn kind_field(&self, choices: Choices, label: Option<String>) -> Box<dyn FormField> {
		match self.kind {
			FilterKind::Char => {
				let mut field = CharField::new(self.name.as_str());
				if let Some(max_length) = self.extra_usize("max_length") {
					field = field.with_max_length(max_length);
				}
				if let Some(min_length) = self.extra_usize("min_length") {
					field = field.with_min_length(min_length);
				}
				field.help_text = self.help_text();
				field.required = self.required;
				field.label = label.clone();
				Box::new(field)
			}
			FilterKind::Boolean => {
				let mut field = NullBooleanField::new(self.name.as_str());
				field.help_text = self.help_text();
				field.label = label.clone();
				Box::new(field)
			}
			FilterKind::Choice
			| FilterKind::ModelChoice
			| FilterKind::AllValues
			| FilterKind::DateRange
			| FilterKind::Abc => {
				let mut field = ChoiceField::new(self.name.as_str(), choices);
				field.help_text = self.help_text();
				field.required = self.required;
				field.label = label.clone();
				Box::new(field)
			}
			FilterKind::MultipleChoice | FilterKind::ModelMultipleChoice => {
				let mut field = MultipleChoiceField::new(self.name.as_str(), choices);
				field.help_text = self.help_text();
				field.required = self.required;
				field.label = label.clone();
				Box::new(field)
			}
			FilterKind::Date => {
				let mut field = DateField::new(self.name.as_str());
				if let Some(formats) = self.extra_strings("input_formats") {
					field = field.with_input_formats(formats);
				}
				field.help_text = self.help_text();
				field.required = self.required;
				field.label = label.clone();
				Box::new(field)
			}
			FilterKind::DateTime => {
				let mut field = DateTimeField::new(self.name.as_str());
				field.help_text = self.help_text();
				field.required = self.required;
				field.label = label.clone();
				Box::new(field)
			}
			FilterKind::Time => {
				let mut field = TimeField::new(self.name.as_str());
				field.help_text = self.help_text();
				field.required = self.required;
				field.label = label.clone();
				Box::new(field)
			}
			FilterKind::Number => {
				let mut field = self.decimal_field();
				field.label = label.clone();
				Box::new(field)
			}
			FilterKind::Range => {
				let mut bound = self.decimal_field();
				bound.required = false;
				let mut field = RangeField::new(self.name.as_str()).with_bound_field(bound);
				field.help_text = self.help_text();
				field.required = self.required;
				field.label = label;
				Box::new(field)
			}
		}
	}

	fn decimal_field(&self) -> DecimalField {
		let mut field = DecimalField::new(self.name.as_str());
		field.max_digits = self.extra_usize("max_digits").map(|n| n as u32);
		field.decimal_places = self.extra_usize("decimal_places").map(|n| n as u32);
		field.min_value = self.extra_decimal("min_value");
		field.max_value = self.extra_decimal("max_value");
		field.help_text = self.help_text();
		field.required = self.required;
		field
	}

	fn help_text(&self) -> Option<String> {
		self.extra
			.get("help_text")
			.and_then(|v| v.as_str())
			.map(str::to_string)
	}

	fn extra_strings(&self, key: &str) -> Option<Vec<String>> {
		self.extra
			.get(key)?
			.as_array()?
			.iter()
			.map(|v| v.as_str().map(str::to_string))
			.collect()
	}

	fn extra_usize(&self, key: &str) -> Option<usize> {
		self.extra
			.get(key)
			.and_then(|v| v.as_u64())
			.map(|n| n as usize)
	}

	fn extra_decimal(&self, key: &str) -> Option<Decimal> {
		match self.extra.get(key)? {
			serde_json::Value::String(s) => Decimal::from_str(s).ok(),
			serde_json::Value::Number(n) => Decimal::from_str(&n.to_string()).ok(),
			_ => None,
		}
	}

	/// Turn the form's cleaned value into a typed filter value.
	///
	/// Selecting every option of a multiple choice filter is the same as
	/// selecting none.
	pub fn to_value(&self, cleaned: &serde_json::Value, choices: &[(String, String)]) -> FieldResult<FilterValue> {
		if let LookupChoice::Choosable(_) = self.lookup {
			let serde_json::Value::Object(parts) = cleaned else {
				return Ok(FilterValue::Empty);
			};
			let lookup = match parts.get("lookup").and_then(|l| l.as_str()) {
				None | Some("") => Lookup::Exact,
				Some(name) => name
					.parse()
					.map_err(|_| FieldError::InvalidChoice(name.to_string()))?,
			};
			let raw = parts.get("value").unwrap_or(&serde_json::Value::Null);
			let value = match lookup {
				Lookup::IsNull => match raw {
					serde_json::Value::String(s) => FieldKind::Boolean
						.parse_value(s)
						.map_err(|e| FieldError::Invalid(e.to_string()))?,
					_ => Value::Null,
				},
				Lookup::In | Lookup::Range => self.operand_list(lookup, raw)?,
				_ => self.scalar(raw)?,
			};
			return Ok(FilterValue::WithLookup { value, lookup });
		}

		match self.operand_lookup() {
			Some(Lookup::IsNull) => {
				return Ok(match cleaned {
					serde_json::Value::Bool(b) => FilterValue::Single(Value::Boolean(*b)),
					_ => FilterValue::Empty,
				});
			}
			Some(lookup) => return Ok(FilterValue::Single(self.operand_list(lookup, cleaned)?)),
			None => {}
		}

		match self.kind {
			FilterKind::Boolean => Ok(match cleaned {
				serde_json::Value::Bool(b) => FilterValue::Single(Value::Boolean(*b)),
				_ => FilterValue::Empty,
			}),
			FilterKind::Range => {
				let serde_json::Value::Object(bounds) = cleaned else {
					return Ok(FilterValue::Empty);
				};
				let bound = |key: &str| -> FieldResult<Option<Value>> {
					let value = self.scalar(bounds.get(key).unwrap_or(&serde_json::Value::Null))?;
					Ok((!value.is_empty()).then_some(value))
				};
				Ok(FilterValue::Range {
					start: bound("start")?,
					stop: bound("stop")?,
				})
			}
			kind if kind.is_multiple() => {
				let selected = cleaned.as_array().map(Vec::as_slice).unwrap_or_default();
				if selected.is_empty() || selected.len() == choices.len() {
					return Ok(FilterValue::Empty);
				}
				let values = selected
					.iter()
					.map(|item| self.scalar(item))
					.collect::<FieldResult<Vec<_>>>()?;
				Ok(FilterValue::Multiple(values))
			}
			FilterKind::DateRange => match cleaned.as_str() {
				None | Some("") => Ok(FilterValue::Empty),
				Some(option) => option
					.parse::<i64>()
					.map(|n| FilterValue::Single(Value::Integer(n)))
					.map_err(|_| FieldError::InvalidChoice(option.to_string())),
			},
			_ => Ok(FilterValue::Single(self.scalar(cleaned)?)),
		}
	}

	/// Comma separated values of an `in` or `range` lookup. A range takes
	/// exactly two.
	fn operand_list(&self, lookup: Lookup, cleaned: &serde_json::Value) -> FieldResult<Value> {
		let values = match cleaned {
			serde_json::Value::Null => return Ok(Value::Null),
			serde_json::Value::String(text) => text
				.split(',')
				.map(str::trim)
				.filter(|part| !part.is_empty())
				.map(|part| self.scalar(&serde_json::Value::String(part.to_string())))
				.collect::<FieldResult<Vec<_>>>()?,
			other => vec![self.scalar(other)?],
		};
		if values.is_empty() {
			return Ok(Value::Null);
		}
		if lookup == Lookup::Range && values.len() != 2 {
			return Err(FieldError::Invalid("Range query expects two values.".to_string()));
		}
		Ok(Value::List(values))
	}

	fn scalar(&self, cleaned: &serde_json::Value) -> FieldResult<Value> {
		let text = match cleaned {
			serde_json::Value::Null => return Ok(Value::Null),
			serde_json::Value::Bool(b) => return Ok(Value::Boolean(*b)),
			serde_json::Value::String(s) if s.is_empty() => return Ok(Value::String(String::new())),
			serde_json::Value::String(s) => s.clone(),
			serde_json::Value::Number(n) => n.to_string(),
			_ => return Err(FieldError::Invalid("Enter a single value.".to_string())),
		};
		let invalid = |message: &str| FieldError::Invalid(message.to_string());

		match self.kind {
			FilterKind::Number | FilterKind::Range => Decimal::from_str(&text)
				.map(Value::Decimal)
				.map_err(|_| invalid("Enter a number.")),
			FilterKind::Date => NaiveDate::parse_from_str(&text, DATE_FORMAT)
				.map(Value::Date)
				.map_err(|_| invalid("Enter a valid date.")),
			FilterKind::DateTime => NaiveDateTime::parse_from_str(&text, DATETIME_FORMAT)
				.map(Value::DateTime)
				.map_err(|_| invalid("Enter a valid date/time.")),
			FilterKind::Time => NaiveTime::parse_from_str(&text, TIME_FORMAT)
				.map(Value::Time)
				.map_err(|_| invalid("Enter a valid time.")),
			FilterKind::Choice
			| FilterKind::MultipleChoice
			| FilterKind::ModelChoice
			| FilterKind::ModelMultipleChoice
			| FilterKind::AllValues => match &self.target {
				Some(target) => target
					.kind
					.parse_value(&text)
					.map_err(|_| FieldError::InvalidChoice(text)),
				None => Ok(Value::String(text)),
			},
			FilterKind::Char | FilterKind::Boolean | FilterKind::DateRange | FilterKind::Abc => {
				Ok(Value::String(text))
			}
		}
	}

	/// The predicate this filter contributes for `value`.
	pub fn condition(&self, value: &FilterValue) -> Condition {
		if value.is_empty() {
			return Condition::Empty;
		}
		let path = self.field_name.as_str();

		match (self.kind, value) {
			(_, FilterValue::WithLookup { value, lookup }) => Condition::new(path, *lookup, value.clone()),
			(FilterKind::Boolean, FilterValue::Single(v)) => Condition::new(path, Lookup::Exact, v.clone()),
			(FilterKind::DateRange, FilterValue::Single(Value::Integer(option))) => {
				self.date_range_condition(*option)
			}
			(FilterKind::Abc, FilterValue::Single(v)) => {
				let letter = v.to_text().unwrap_or_default();
				if letter == self.non_letter {
					('a'..='z').fold(Condition::Empty, |acc, c| {
						acc & !Condition::new(path, Lookup::IStartsWith, c.to_string())
					})
				} else {
					Condition::new(path, Lookup::IStartsWith, letter)
				}
			}
			(_, FilterValue::Multiple(values)) => values.iter().fold(Condition::Empty, |acc, v| {
				acc | Condition::new(path, Lookup::Exact, v.clone())
			}),
			(_, FilterValue::Range { start, stop }) => match (start, stop) {
				(Some(start), Some(stop)) => Condition::new(
					path,
					Lookup::Range,
					Value::List(vec![start.clone(), stop.clone()]),
				),
				(Some(start), None) => Condition::new(path, Lookup::Gte, start.clone()),
				(None, Some(stop)) => Condition::new(path, Lookup::Lte, stop.clone()),
				(None, None) => Condition::Empty,
			},
			(_, FilterValue::Single(v)) => {
				let lookup = match &self.lookup {
					LookupChoice::Fixed(lookup) => *lookup,
					LookupChoice::Choosable(_) => Lookup::Exact,
				};
				Condition::new(path, lookup, v.clone())
			}
			(_, FilterValue::Empty) => Condition::Empty,
		}
	}

	fn date_range_condition(&self, option: i64) -> Condition {
		let path = self.field_name.as_str();
		let today = self.today();
		let year = || Condition::new(path, Lookup::Year, i64::from(today.year()));
		let month = || Condition::new(path, Lookup::Month, i64::from(today.month()));
		let day = || Condition::new(path, Lookup::Day, i64::from(today.day()));

		match option {
			1 => year() & month() & day(),
			2 => match (
				today.checked_sub_days(Days::new(7)),
				today.checked_add_days(Days::new(1)),
			) {
				(Some(week_ago), Some(tomorrow)) => {
					Condition::new(path, Lookup::Gte, week_ago) & Condition::new(path, Lookup::Lt, tomorrow)
				}
				_ => Condition::Empty,
			},
			3 => year() & month(),
			4 => year(),
			_ => Condition::Empty,
		}
	}

	/// Apply this filter to `qs`: the custom action if there is one, else
	/// the predicate.
	pub fn apply(&self, qs: QuerySet<M>, value: &FilterValue) -> QuerySet<M> {
		match &self.action {
			Some(action) => action(qs, value),
			None => qs.filter(self.condition(value)),
		}
	}
}

fn related_choices<R: Model>(related: QuerySet<R>, label_path: &str) -> ChoiceSource {
	let label_path = label_path.to_string();
	ChoiceSource::Dynamic(Arc::new(move || {
		related
			.results()
			.iter()
			.filter_map(|row| {
				let key = row.primary_key().to_text()?;
				let label = row
					.values_at(&label_path)
					.into_iter()
					.next()
					.and_then(|v| v.to_text())
					.unwrap_or_else(|| key.clone());
				Some((key, label))
			})
			.collect()
	}))
}

/// `[["a", "A"], ...]` or `["a", ...]`.
fn choices_from_json(value: &serde_json::Value) -> Option<Choices> {
	value
		.as_array()?
		.iter()
		.map(|item| match item {
			serde_json::Value::String(s) => Some((s.clone(), s.clone())),
			serde_json::Value::Array(pair) => match pair.as_slice() {
				[key, label] => Some((json_text(key)?, json_text(label)?)),
				_ => None,
			},
			other => json_text(other).map(|s| (s.clone(), s)),
		})
		.collect()
}

fn json_text(value: &serde_json::Value) -> Option<String> {
	match value {
		serde_json::Value::String(s) => Some(s.clone()),
		serde_json::Value::Number(n) => Some(n.to_string()),
		serde_json::Value::Bool(b) => Some(b.to_string()),
		_ => None,
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;
	use serde_json::json;
	use tamis_forms::Widget;
	use tamis_query::{FieldRef, Record, Schema};

	#[derive(Clone)]
	struct Event;

	impl Record for Event {
		fn field(&self, _: &str) -> Option<FieldRef<'_>> {
			None
		}

		fn primary_key(&self) -> Value {
			Value::Null
		}
	}

	impl Model for Event {
		fn schema() -> Schema {
			Schema::new("event", "id")
		}
	}

	fn choices(keys: &[&str]) -> Choices {
		keys.iter().map(|k| (k.to_string(), k.to_string())).collect()
	}

	fn date(y: i32, m: u32, d: u32) -> NaiveDate {
		NaiveDate::from_ymd_opt(y, m, d).unwrap()
	}

	#[rstest]
	#[case(FilterKind::Char, Widget::TextInput)]
	#[case(FilterKind::Boolean, Widget::NullBooleanSelect)]
	#[case(FilterKind::Number, Widget::NumberInput)]
	#[case(FilterKind::Date, Widget::DateInput)]
	#[case(FilterKind::Range, Widget::MultiWidget(vec![Widget::NumberInput, Widget::NumberInput]))]
	fn test_form_field_widget(#[case] kind: FilterKind, #[case] expected: Widget) {
		let field = Filter::<Event>::new("x", kind).form_field(Vec::new());
		assert_eq!(field.widget(), &expected);
	}

	#[rstest]
	fn test_choosable_lookup_wraps_field() {
		// Arrange
		let filter = Filter::<Event>::number("price")
			.with_lookups(vec![Lookup::Lt, Lookup::Gt])
			.with_label("Price");

		// Act
		let field = filter.form_field(Vec::new());

		// Assert
		assert_eq!(field.label(), Some("Price"));
		assert_eq!(
			field.widget(),
			&Widget::MultiWidget(vec![
				Widget::NumberInput,
				Widget::Select { choices: choices(&["lt", "gt"]) },
			])
		);
		assert_eq!(
			field.clean(Some(&json!(["10", "gt"]))).unwrap(),
			json!({"value": "10", "lookup": "gt"})
		);
	}

	#[rstest]
	fn test_extra_params_reach_field() {
		let filter = Filter::<Event>::char("code")
			.with_extra("max_length", 3)
			.with_extra("help_text", "Three letters");
		let field = filter.form_field(Vec::new());

		assert_eq!(field.help_text(), Some("Three letters"));
		assert!(field.clean(Some(&json!("ABCD"))).is_err());
		assert_eq!(field.clean(Some(&json!("ABC"))).unwrap(), json!("ABC"));
	}

	#[rstest]
	fn test_choices_precedence() {
		let base = QuerySet::<Event>::none();

		let from_extra = Filter::<Event>::new("size", FilterKind::Choice)
			.with_extra("choices", json!([["s", "Small"], ["l", "Large"]]));
		assert_eq!(
			from_extra.choices(&base),
			vec![
				("s".to_string(), "Small".to_string()),
				("l".to_string(), "Large".to_string())
			]
		);

		let explicit = from_extra.with_choices(choices(&["m"]));
		assert_eq!(explicit.choices(&base), choices(&["m"]));
	}

	#[rstest]
	fn test_abc_choices_end_with_marker() {
		let filter = Filter::<Event>::abc("title").with_non_letter("0-9");
		let offered = filter.choices(&QuerySet::none());

		assert_eq!(offered.len(), 27);
		assert_eq!(offered[0].0, "A");
		assert_eq!(offered[26].0, "0-9");
	}

	#[rstest]
	fn test_blank_lookup_defaults_to_exact() {
		let filter = Filter::<Event>::char("title").with_lookups(vec![Lookup::IContains]);
		let value = filter
			.to_value(&json!({"value": "rust", "lookup": ""}), &[])
			.unwrap();

		assert_eq!(
			filter.condition(&value),
			Condition::new("title", Lookup::Exact, "rust")
		);
	}

	#[rstest]
	fn test_isnull_lookup_takes_boolean() {
		let filter = Filter::<Event>::char("venue").with_lookups(vec![Lookup::IsNull]);
		let value = filter
			.to_value(&json!({"value": "true", "lookup": "isnull"}), &[])
			.unwrap();

		assert_eq!(
			value,
			FilterValue::WithLookup { value: Value::Boolean(true), lookup: Lookup::IsNull }
		);
	}

	#[rstest]
	#[case(Lookup::IsNull, Widget::NullBooleanSelect)]
	#[case(Lookup::In, Widget::TextInput)]
	#[case(Lookup::Range, Widget::TextInput)]
	#[case(Lookup::Lt, Widget::NumberInput)]
	fn test_fixed_lookup_picks_field(#[case] lookup: Lookup, #[case] expected: Widget) {
		let field = Filter::<Event>::number("seats")
			.with_lookup(lookup)
			.form_field(Vec::new());
		assert_eq!(field.widget(), &expected);
	}

	#[rstest]
	#[case(json!(true), FilterValue::Single(Value::Boolean(true)))]
	#[case(json!(false), FilterValue::Single(Value::Boolean(false)))]
	#[case(json!(null), FilterValue::Empty)]
	fn test_fixed_isnull_value(#[case] cleaned: serde_json::Value, #[case] expected: FilterValue) {
		let filter = Filter::<Event>::date("starts").with_lookup(Lookup::IsNull);

		let value = filter.to_value(&cleaned, &[]).unwrap();

		assert_eq!(value, expected);
		if let FilterValue::Single(flag) = &expected {
			assert_eq!(filter.condition(&value), Condition::new("starts", Lookup::IsNull, flag.clone()));
		}
	}

	#[rstest]
	fn test_fixed_in_value_is_a_list() {
		// Arrange
		let filter = Filter::<Event>::number("seats").with_lookup(Lookup::In);

		// Act
		let value = filter.to_value(&json!("10, 20,,30"), &[]).unwrap();

		// Assert
		let expected = Value::List(vec![
			Value::Decimal(Decimal::from(10)),
			Value::Decimal(Decimal::from(20)),
			Value::Decimal(Decimal::from(30)),
		]);
		assert_eq!(value, FilterValue::Single(expected.clone()));
		assert_eq!(filter.condition(&value), Condition::new("seats", Lookup::In, expected));
	}

	#[rstest]
	#[case("2024-01-01,2024-01-31", true)]
	#[case("2024-01-01", false)]
	#[case("2024-01-01,2024-01-15,2024-01-31", false)]
	#[case("2024-01-01,someday", false)]
	fn test_fixed_range_value_needs_two_bounds(#[case] raw: &str, #[case] ok: bool) {
		let filter = Filter::<Event>::date("starts").with_lookup(Lookup::Range);

		let value = filter.to_value(&json!(raw), &[]);

		assert_eq!(value.is_ok(), ok);
		if ok {
			assert_eq!(
				value.unwrap(),
				FilterValue::Single(Value::List(vec![
					Value::Date(date(2024, 1, 1)),
					Value::Date(date(2024, 1, 31)),
				]))
			);
		}
	}

	#[rstest]
	fn test_single_value_kinds_offer_no_choices() {
		let filter = Filter::<Event>::char("size").with_extra("choices", json!(["s", "l"]));

		assert!(filter.choices(&QuerySet::none()).is_empty());
	}

	#[rstest]
	fn test_input_formats_extra() {
		let filter = Filter::<Event>::date("starts").with_extra("input_formats", json!(["%d.%m.%Y"]));
		let field = filter.form_field(Vec::new());

		assert_eq!(field.clean(Some(&json!("14.07.2023"))).unwrap(), json!("2023-07-14"));
		assert!(field.clean(Some(&json!("2023-07-14"))).is_err());
	}

	#[rstest]
	fn test_boolean_false_filters() {
		let filter = Filter::<Event>::boolean("public");
		let value = filter.to_value(&json!(false), &[]).unwrap();

		assert_eq!(value, FilterValue::Single(Value::Boolean(false)));
		assert_eq!(
			filter.condition(&value),
			Condition::new("public", Lookup::Exact, false)
		);
		assert_eq!(filter.to_value(&json!(null), &[]).unwrap(), FilterValue::Empty);
	}

	#[rstest]
	#[case(json!(["a"]), Condition::new("tier", Lookup::Exact, "a"))]
	#[case(
		json!(["a", "b"]),
		Condition::new("tier", Lookup::Exact, "a") | Condition::new("tier", Lookup::Exact, "b")
	)]
	#[case(json!(["a", "b", "c"]), Condition::Empty)]
	#[case(json!([]), Condition::Empty)]
	fn test_multiple_choice(#[case] cleaned: serde_json::Value, #[case] expected: Condition) {
		// Arrange
		let offered = choices(&["a", "b", "c"]);
		let filter = Filter::<Event>::multiple_choice("tier", offered.clone());

		// Act
		let value = filter.to_value(&cleaned, &offered).unwrap();

		// Assert
		assert_eq!(filter.condition(&value), expected);
	}

	#[rstest]
	#[case(json!({"start": "1", "stop": "5"}), Condition::new("seats", Lookup::Range, vec![Decimal::from(1), Decimal::from(5)]))]
	#[case(json!({"start": "1", "stop": null}), Condition::new("seats", Lookup::Gte, Decimal::from(1)))]
	#[case(json!({"start": null, "stop": "5"}), Condition::new("seats", Lookup::Lte, Decimal::from(5)))]
	#[case(json!(null), Condition::Empty)]
	fn test_range(#[case] cleaned: serde_json::Value, #[case] expected: Condition) {
		let filter = Filter::<Event>::range("seats");
		let value = filter.to_value(&cleaned, &[]).unwrap();
		assert_eq!(filter.condition(&value), expected);
	}

	#[rstest]
	fn test_date_range_options() {
		// Arrange
		let filter = Filter::<Event>::date_range("starts").with_reference_date(date(2024, 3, 1));
		let condition = |option: &str| {
			let value = filter.to_value(&json!(option), &[]).unwrap();
			filter.condition(&value)
		};
		let year = Condition::new("starts", Lookup::Year, 2024i64);
		let month = Condition::new("starts", Lookup::Month, 3i64);
		let day = Condition::new("starts", Lookup::Day, 1i64);

		// Act & Assert
		assert_eq!(condition(""), Condition::Empty);
		assert_eq!(condition("1"), year.clone() & month.clone() & day);
		assert_eq!(
			condition("2"),
			Condition::new("starts", Lookup::Gte, date(2024, 2, 23))
				& Condition::new("starts", Lookup::Lt, date(2024, 3, 2))
		);
		assert_eq!(condition("3"), year.clone() & month);
		assert_eq!(condition("4"), year);
		assert!(filter.to_value(&json!("9x"), &[]).is_err());
	}

	#[rstest]
	fn test_abc_conditions() {
		let filter = Filter::<Event>::abc("title");

		let letter = filter.to_value(&json!("K"), &[]).unwrap();
		assert_eq!(
			filter.condition(&letter),
			Condition::new("title", Lookup::IStartsWith, "K")
		);

		let other = filter.to_value(&json!("#"), &[]).unwrap();
		let Condition::And(parts) = filter.condition(&other) else {
			panic!("expected a conjunction");
		};
		assert_eq!(parts.len(), 26);
		assert_eq!(parts[0], !Condition::new("title", Lookup::IStartsWith, "a"));
	}

	#[rstest]
	fn test_action_replaces_predicate() {
		// Arrange
		let filter = Filter::<Event>::char("q").with_action(|qs, value| match value {
			FilterValue::Single(v) => qs.filter(Condition::new("title", Lookup::IContains, v.clone())),
			_ => qs,
		});
		let value = FilterValue::Single(Value::from("jazz"));

		// Act
		let qs = filter.apply(QuerySet::none(), &value);

		// Assert
		assert_eq!(qs.to_string(), "event.objects.all().filter(title__icontains=jazz)");
	}

	#[rstest]
	fn test_invalid_typed_value() {
		let filter = Filter::<Event>::date("on");
		assert!(filter.to_value(&json!("yesterday"), &[]).is_err());
		assert_eq!(
			filter.to_value(&json!("2024-03-01"), &[]).unwrap(),
			FilterValue::Single(Value::Date(date(2024, 3, 1)))
		);
	}
}
