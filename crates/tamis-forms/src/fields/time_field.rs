use crate::field::{FieldError, FieldResult, FormField, Widget, raw_text};
use chrono::NaiveTime;

/// Format of a cleaned time value.
pub const TIME_FORMAT: &str = "%H:%M:%S";

/// Time of day. Cleans to `HH:MM:SS`.
#[derive(Debug, Clone)]
pub struct TimeField {
	pub name: String,
	pub label: Option<String>,
	pub required: bool,
	pub help_text: Option<String>,
	pub widget: Widget,
}

impl TimeField {
	pub fn new(name: impl Into<String>) -> Self {
		Self {
			name: name.into(),
			label: None,
			required: false,
			help_text: None,
			widget: Widget::TimeInput,
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
}

impl FormField for TimeField {
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
		let time = [TIME_FORMAT, "%H:%M"]
			.iter()
			.find_map(|format| NaiveTime::parse_from_str(&s, format).ok())
			.ok_or_else(|| FieldError::Invalid("Enter a valid time.".to_string()))?;
		Ok(serde_json::Value::String(time.format(TIME_FORMAT).to_string()))
	}
}
