use crate::field::{FieldError, FieldResult, FormField, Widget, raw_text};
use chrono::{Datelike, NaiveDate};

/// Format of a cleaned date value.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Calendar date. Cleans to an ISO `YYYY-MM-DD` string, or `null` when blank.
///
/// # Examples
///
/// ```
/// use tamis_forms::{DateField, FormField};
/// use serde_json::json;
///
/// let field = DateField::new("released");
/// assert_eq!(field.clean(Some(&json!("07/14/2023"))).unwrap(), json!("2023-07-14"));
/// assert_eq!(field.clean(Some(&json!(""))).unwrap(), json!(null));
/// assert!(field.clean(Some(&json!("2023-02-30"))).is_err());
/// ```
#[derive(Debug, Clone)]
pub struct DateField {
	pub name: String,
	pub label: Option<String>,
	pub required: bool,
	pub help_text: Option<String>,
	pub widget: Widget,
	pub input_formats: Vec<String>,
}

impl DateField {
	pub fn new(name: impl Into<String>) -> Self {
		Self {
			name: name.into(),
			label: None,
			required: false,
			help_text: None,
			widget: Widget::DateInput,
			input_formats: vec![
				DATE_FORMAT.to_string(), // 2025-01-15
				"%m/%d/%Y".to_string(),  // 01/15/2025
				"%b %d %Y".to_string(),  // Jan 15 2025
				"%b %d, %Y".to_string(), // Jan 15, 2025
				"%d %B %Y".to_string(),  // 15 January 2025
			],
		}
	}

	pub fn required(mut self) -> Self {
		self.required = true;
		self
	}

	pub fn with_label(mut self, label: impl Into<String>) -> Self {
		self.label = Some(label.into());
		self
	}

	pub fn with_input_formats(mut self, formats: Vec<String>) -> Self {
		self.input_formats = formats;
		self
	}

	fn parse_date(&self, s: &str) -> FieldResult<NaiveDate> {
		self.input_formats
			.iter()
			.filter_map(|format| NaiveDate::parse_from_str(s, format).ok())
			// Two-digit years are ambiguous.
			.find(|date| (1000..=9999).contains(&date.year()))
			.ok_or_else(|| FieldError::Invalid("Enter a valid date.".to_string()))
	}
}

impl FormField for DateField {
	fn name(&self) -> &str {
		&self.name
	}

	fn label(&self) -> Option<&str> {
		self.label.as_deref()
	}

	fn required(&self) -> bool {
		self.required
	}

	fn help_text(&self) -> Option<&str> {
		self.help_text.as_deref()
	}

	fn widget(&self) -> &Widget {
		&self.widget
	}

	fn clean(&self, value: Option<&serde_json::Value>) -> FieldResult<serde_json::Value> {
		match raw_text(value)? {
			None if self.required => Err(FieldError::Required(self.name.clone())),
			None => Ok(serde_json::Value::Null),
			Some(s) => {
				let date = self.parse_date(&s)?;
				Ok(serde_json::Value::String(
					date.format(DATE_FORMAT).to_string(),
				))
			}
		}
	}
}
