//! Single and multiple choice fields

use crate::field::{Choices, FieldError, FieldResult, FormField, Widget, raw_text};

fn is_valid_choice(choices: &[(String, String)], value: &str) -> bool {
	choices.iter().any(|(key, _)| key == value)
}

/// One value out of a fixed list of `(value, label)` pairs.
///
/// # Examples
///
/// ```
/// use tamis_forms::{ChoiceField, FormField};
/// use serde_json::json;
///
/// let field = ChoiceField::new("status", vec![
///     ("draft".to_string(), "Draft".to_string()),
///     ("live".to_string(), "Live".to_string()),
/// ]);
/// assert_eq!(field.clean(Some(&json!("live"))).unwrap(), json!("live"));
/// assert_eq!(field.clean(None).unwrap(), json!(""));
/// assert!(field.clean(Some(&json!("gone"))).is_err());
/// ```
#[derive(Debug, Clone)]
pub struct ChoiceField {
	pub name: String,
	pub label: Option<String>,
	pub required: bool,
	pub help_text: Option<String>,
	pub widget: Widget,
}

impl ChoiceField {
	pub fn new(name: impl Into<String>, choices: Choices) -> Self {
		Self {
			name: name.into(),
			label: None,
			required: false,
			help_text: None,
			widget: Widget::Select { choices },
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

	pub fn choices(&self) -> &[(String, String)] {
		self.widget.choices().unwrap_or_default()
	}
}

impl FormField for ChoiceField {
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
		let Some(text) = raw_text(value)? else {
			if self.required {
				return Err(FieldError::Required(self.name.clone()));
			}
			return Ok(serde_json::Value::String(String::new()));
		};
		if !is_valid_choice(self.choices(), &text) {
			return Err(FieldError::InvalidChoice(text));
		}
		Ok(serde_json::Value::String(text))
	}
}

/// Any number of values out of a fixed list. Cleans to a JSON array.
#[derive(Debug, Clone)]
pub struct MultipleChoiceField {
	pub name: String,
	pub label: Option<String>,
	pub required: bool,
	pub help_text: Option<String>,
	pub widget: Widget,
}

impl MultipleChoiceField {
	pub fn new(name: impl Into<String>, choices: Choices) -> Self {
		Self {
			name: name.into(),
			label: None,
			required: false,
			help_text: None,
			widget: Widget::SelectMultiple { choices },
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

	pub fn choices(&self) -> &[(String, String)] {
		self.widget.choices().unwrap_or_default()
	}
}

impl FormField for MultipleChoiceField {
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
		let items: Vec<&serde_json::Value> = match value {
			None | Some(serde_json::Value::Null) => Vec::new(),
			Some(serde_json::Value::Array(items)) => items.iter().collect(),
			Some(single) => vec![single],
		};

		let mut selected = Vec::with_capacity(items.len());
		for item in items {
			let Some(text) = raw_text(Some(item))? else {
				continue;
			};
			if !is_valid_choice(self.choices(), &text) {
				return Err(FieldError::InvalidChoice(text));
			}
			if !selected.contains(&text) {
				selected.push(text);
			}
		}

		if selected.is_empty() && self.required {
			return Err(FieldError::Required(self.name.clone()));
		}
		Ok(serde_json::Value::Array(
			selected.into_iter().map(serde_json::Value::String).collect(),
		))
	}
}
