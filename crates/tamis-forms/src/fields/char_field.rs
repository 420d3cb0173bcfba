//! Character field for text input

use crate::field::{FieldError, FieldResult, FormField, Widget};

/// Free text with optional length bounds. Blank optional input cleans to `""`.
#[derive(Debug, Clone)]
pub struct CharField {
	pub name: String,
	pub label: Option<String>,
	pub required: bool,
	pub help_text: Option<String>,
	pub widget: Widget,
	pub max_length: Option<usize>,
	pub min_length: Option<usize>,
	pub strip: bool,
}

impl CharField {
	/// Create a new optional CharField
	///
	/// # Examples
	///
	/// ```
	/// use tamis_forms::fields::CharField;
	///
	/// let field = CharField::new("name").with_max_length(30);
	/// assert_eq!(field.name, "name");
	/// assert!(!field.required);
	/// assert_eq!(field.max_length, Some(30));
	/// ```
	pub fn new(name: impl Into<String>) -> Self {
		Self {
			name: name.into(),
			label: None,
			required: false,
			help_text: None,
			widget: Widget::TextInput,
			max_length: None,
			min_length: None,
			strip: true,
		}
	}

	pub fn required(mut self) -> Self {
		self.required = true;
		self
	}

	pub fn with_max_length(mut self, max_length: usize) -> Self {
		self.max_length = Some(max_length);
		self
	}

	pub fn with_min_length(mut self, min_length: usize) -> Self {
		self.min_length = Some(min_length);
		self
	}

	pub fn with_label(mut self, label: impl Into<String>) -> Self {
		self.label = Some(label.into());
		self
	}

	pub fn no_strip(mut self) -> Self {
		self.strip = false;
		self
	}
}

impl FormField for CharField {
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
		let text = match value {
			None | Some(serde_json::Value::Null) => "",
			Some(v) => v
				.as_str()
				.ok_or_else(|| FieldError::Validation("Value must be a string".to_string()))?,
		};
		let text = if self.strip { text.trim() } else { text };

		if text.is_empty() {
			if self.required {
				return Err(FieldError::Required(self.name.clone()));
			}
			return Ok(serde_json::Value::String(String::new()));
		}

		// Lengths count characters, not bytes.
		let char_count = text.chars().count();
		if let Some(max_length) = self.max_length
			&& char_count > max_length
		{
			return Err(FieldError::Validation(format!(
				"Ensure this value has at most {} characters (it has {}).",
				max_length, char_count
			)));
		}
		if let Some(min_length) = self.min_length
			&& char_count < min_length
		{
			return Err(FieldError::Validation(format!(
				"Ensure this value has at least {} characters (it has {}).",
				min_length, char_count
			)));
		}

		Ok(serde_json::Value::String(text.to_string()))
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;
	use serde_json::json;

	#[rstest]
	fn test_blank_optional_cleans_to_empty_string() {
		// Arrange
		let field = CharField::new("name");

		// Act & Assert
		assert_eq!(field.clean(None).unwrap(), json!(""));
		assert_eq!(field.clean(Some(&json!("   "))).unwrap(), json!(""));
		assert_eq!(field.clean(Some(&json!(" Anvil "))).unwrap(), json!("Anvil"));
	}

	#[rstest]
	fn test_required() {
		let field = CharField::new("name").required();
		assert_eq!(
			field.clean(Some(&json!(""))),
			Err(FieldError::Required("name".to_string()))
		);
	}

	#[rstest]
	#[case("ab", false)]
	#[case("abc", true)]
	#[case("abcde", true)]
	#[case("abcdef", false)]
	#[case("éèêëē", true)]
	fn test_length_bounds(#[case] input: &str, #[case] ok: bool) {
		let field = CharField::new("code").with_min_length(3).with_max_length(5);
		assert_eq!(field.clean(Some(&json!(input))).is_ok(), ok);
	}

	#[rstest]
	fn test_no_strip_keeps_whitespace() {
		let field = CharField::new("raw").no_strip();
		assert_eq!(field.clean(Some(&json!(" a "))).unwrap(), json!(" a "));
	}
}
