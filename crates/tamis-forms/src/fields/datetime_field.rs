use crate::field::{FieldError, FieldResult, FormField, Widget, raw_text};
use chrono::{NaiveDate, NaiveDateTime};

/// Format of a cleaned datetime value.
pub const DATETIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Date and time without zone. A bare date means midnight.
#[derive(Debug, Clone)]
pub struct DateTimeField {
	pub name: String,
	pub label: Option<String>,
	pub required: bool,
	pub help_text: Option<String>,
	pub widget: Widget,
	pub input_formats: Vec<String>,
}

impl DateTimeField {
	pub fn new(name: impl Into<String>) -> Self {
		Self {
			name: name.into(),
			label: None,
			required: false,
			help_text: None,
			widget: Widget::DateTimeInput,
			input_formats: vec![
				DATETIME_FORMAT.to_string(),
				"%Y-%m-%d %H:%M:%S".to_string(),
				"%Y-%m-%d %H:%M".to_string(),
				"%Y-%m-%dT%H:%M".to_string(),
				"%m/%d/%Y %H:%M:%S".to_string(),
				"%m/%d/%Y %H:%M".to_string(),
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

	fn parse_datetime(&self, s: &str) -> Option<NaiveDateTime> {
		self.input_formats
			.iter()
			.find_map(|format| NaiveDateTime::parse_from_str(s, format).ok())
			.or_else(|| {
				NaiveDate::parse_from_str(s, "%Y-%m-%d")
					.ok()
					.and_then(|d| d.and_hms_opt(0, 0, 0))
			})
	}
}

impl FormField for DateTimeField {
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
		let Some(s) = raw_text(value)? else {
			if self.required {
				return Err(FieldError::Required(self.name.clone()));
			}
			return Ok(serde_json::Value::Null);
		};
		let datetime = self
			.parse_datetime(&s)
			.ok_or_else(|| FieldError::Invalid("Enter a valid date/time.".to_string()))?;
		Ok(serde_json::Value::String(
			datetime.format(DATETIME_FORMAT).to_string(),
		))
	}
}
