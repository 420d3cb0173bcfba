use crate::field::{FieldResult, FormField, Widget};

/// Three-state boolean: `true`, `false` or unknown (`null`).
///
/// Never fails to validate; anything unrecognised is "unknown", which is how
/// a filter says "don't constrain this field".
///
/// # Examples
///
/// ```
/// use tamis_forms::{FormField, NullBooleanField};
/// use serde_json::json;
///
/// let field = NullBooleanField::new("in_stock");
/// assert_eq!(field.clean(Some(&json!("yes"))).unwrap(), json!(true));
/// assert_eq!(field.clean(Some(&json!("0"))).unwrap(), json!(false));
/// assert_eq!(field.clean(Some(&json!("maybe"))).unwrap(), json!(null));
/// ```
#[derive(Debug, Clone)]
pub struct NullBooleanField {
	pub name: String,
	pub label: Option<String>,
	pub help_text: Option<String>,
	pub widget: Widget,
}

impl NullBooleanField {
	pub fn new(name: impl Into<String>) -> Self {
		Self {
			name: name.into(),
			label: None,
			help_text: None,
			widget: Widget::NullBooleanSelect,
		}
	}

	pub fn with_label(mut self, label: impl Into<String>) -> Self {
		self.label = Some(label.into());
		self
	}
}

impl FormField for NullBooleanField {
	fn name(&self) -> &str {
		&self.name
	}

	fn label(&self) -> Option<&str> {
		self.label.as_deref()
	}

	fn required(&self) -> bool {
		false
	}

	fn help_text(&self) -> Option<&str> {
		self.help_text.as_deref()
	}

	fn widget(&self) -> &Widget {
		&self.widget
	}

	fn clean(&self, value: Option<&serde_json::Value>) -> FieldResult<serde_json::Value> {
		let cleaned = match value {
			Some(serde_json::Value::Bool(b)) => Some(*b),
			// "2"/"3" are the option values of the null-boolean select.
			Some(serde_json::Value::String(s)) => match s.trim().to_ascii_lowercase().as_str() {
				"true" | "1" | "2" | "yes" | "on" => Some(true),
				"false" | "0" | "3" | "no" | "off" => Some(false),
				_ => None,
			},
			_ => None,
		};
		Ok(cleaned.map_or(serde_json::Value::Null, serde_json::Value::Bool))
	}
}
