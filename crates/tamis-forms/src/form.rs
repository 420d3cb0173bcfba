use crate::bound_field::BoundField;
use crate::field::{FieldError, FormField};
use crate::querydict::QueryDict;
use std::collections::HashMap;

#[derive(Debug, thiserror::Error)]
pub enum FormError {
	#[error("Field error in {field}: {error}")]
	Field { field: String, error: FieldError },
	#[error("Validation error: {0}")]
	Validation(String),
	#[error("Malformed query string: {0}")]
	QueryString(String),
}

pub type FormResult<T> = Result<T, FormError>;

/// Key for form-level (non-field-specific) errors.
pub const ALL_FIELDS_KEY: &str = "_all";

/// An ordered set of fields validated together.
///
/// Field failures are collected into [`errors`](Form::errors); one bad field
/// never stops the others from being cleaned.
pub struct Form {
	fields: Vec<Box<dyn FormField>>,
	data: HashMap<String, serde_json::Value>,
	cleaned_data: HashMap<String, serde_json::Value>,
	errors: HashMap<String, Vec<String>>,
	is_bound: bool,
	prefix: String,
}

impl Form {
	/// Create a new empty form
	///
	/// # Examples
	///
	/// ```
	/// use tamis_forms::Form;
	///
	/// let form = Form::new();
	/// assert!(!form.is_bound());
	/// assert!(form.fields().is_empty());
	/// ```
	pub fn new() -> Self {
		Self::with_prefix(String::new())
	}

	/// Create a new form whose inputs are named `<prefix>-<field>`
	///
	/// # Examples
	///
	/// ```
	/// use tamis_forms::Form;
	///
	/// let form = Form::with_prefix("product");
	/// assert_eq!(form.prefix(), "product");
	/// assert_eq!(form.add_prefix_to_field_name("price"), "product-price");
	/// ```
	pub fn with_prefix(prefix: impl Into<String>) -> Self {
		Self {
			fields: vec![],
			data: HashMap::new(),
			cleaned_data: HashMap::new(),
			errors: HashMap::new(),
			is_bound: false,
			prefix: prefix.into(),
		}
	}

	pub fn add_field(&mut self, field: Box<dyn FormField>) {
		self.fields.push(field);
	}

	/// Bind raw values keyed by field name.
	pub fn bind(&mut self, data: HashMap<String, serde_json::Value>) {
		self.data = data;
		self.is_bound = true;
		self.cleaned_data.clear();
		self.errors.clear();
	}

	/// Bind submitted request parameters, letting each field's widget pick
	/// its own keys.
	///
	/// # Examples
	///
	/// ```
	/// use tamis_forms::{CharField, Form, QueryDict};
	/// use serde_json::json;
	///
	/// let mut form = Form::with_prefix("f");
	/// form.add_field(Box::new(CharField::new("name")));
	/// form.bind_query(&QueryDict::parse("f-name=Anvil&name=ignored").unwrap());
	///
	/// assert!(form.is_valid());
	/// assert_eq!(form.cleaned_data().get("name"), Some(&json!("Anvil")));
	/// ```
	pub fn bind_query(&mut self, query: &QueryDict) {
		let data = self
			.fields
			.iter()
			.filter_map(|field| {
				let html_name = self.add_prefix_to_field_name(field.name());
				field
					.value_from_data(query, &html_name)
					.map(|value| (field.name().to_string(), value))
			})
			.collect();
		self.bind(data);
	}

	/// Clean every field and report whether all of them passed.
	///
	/// Unbound forms are never valid.
	pub fn is_valid(&mut self) -> bool {
		if !self.is_bound {
			return false;
		}
		self.full_clean();
		self.errors.is_empty()
	}

	fn full_clean(&mut self) {
		self.errors.clear();
		self.cleaned_data.clear();

		for field in &self.fields {
			match field.clean(self.data.get(field.name())) {
				Ok(cleaned) => {
					self.cleaned_data.insert(field.name().to_string(), cleaned);
				}
				Err(error) => {
					tracing::debug!(field = field.name(), error = %error, "form field failed validation");
					self.errors
						.entry(field.name().to_string())
						.or_default()
						.push(error.to_string());
				}
			}
		}
	}

	/// Record an error raised outside field cleaning.
	pub fn add_error(&mut self, error: FormError) {
		match error {
			FormError::Field { field, error } => {
				self.cleaned_data.remove(&field);
				self.errors.entry(field).or_default().push(error.to_string());
			}
			other => self
				.errors
				.entry(ALL_FIELDS_KEY.to_string())
				.or_default()
				.push(other.to_string()),
		}
	}

	/// Values of the fields that cleaned successfully.
	pub fn cleaned_data(&self) -> &HashMap<String, serde_json::Value> {
		&self.cleaned_data
	}

	pub fn errors(&self) -> &HashMap<String, Vec<String>> {
		&self.errors
	}

	pub fn data(&self) -> &HashMap<String, serde_json::Value> {
		&self.data
	}

	pub fn is_bound(&self) -> bool {
		self.is_bound
	}

	pub fn fields(&self) -> &[Box<dyn FormField>] {
		&self.fields
	}

	pub fn get_field(&self, name: &str) -> Option<&dyn FormField> {
		self.fields
			.iter()
			.find(|f| f.name() == name)
			.map(|f| f.as_ref())
	}

	pub fn prefix(&self) -> &str {
		&self.prefix
	}

	pub fn add_prefix_to_field_name(&self, field_name: &str) -> String {
		if self.prefix.is_empty() {
			field_name.to_string()
		} else {
			format!("{}-{}", self.prefix, field_name)
		}
	}

	pub fn get_bound_field<'a>(&'a self, name: &str) -> Option<BoundField<'a>> {
		let field = self.get_field(name)?;
		let data = self.data.get(name);
		let errors = self.errors.get(name).map(|e| e.as_slice()).unwrap_or(&[]);
		Some(BoundField::new(field, data, errors, &self.prefix))
	}

	pub fn bound_fields(&self) -> impl Iterator<Item = BoundField<'_>> {
		self.fields
			.iter()
			.filter_map(|field| self.get_bound_field(field.name()))
	}
}

impl Default for Form {
	fn default() -> Self {
		Self::new()
	}
}
