//! The form field contract shared by every concrete field.

use crate::querydict::QueryDict;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FieldError {
	#[error("This field is required.")]
	Required(String),
	#[error("{0}")]
	Invalid(String),
	#[error("{0}")]
	Validation(String),
	#[error("Select a valid choice. {0} is not one of the available choices.")]
	InvalidChoice(String),
}

impl FieldError {
	/// `Required` error for an optional field name.
	pub fn required(name: Option<&str>) -> Self {
		FieldError::Required(name.unwrap_or_default().to_string())
	}
}

pub type FieldResult<T> = Result<T, FieldError>;

pub type Choices = Vec<(String, String)>;

/// How a field reads its raw value out of submitted data.
///
/// Rendering is left to the template layer; the widget only decides which
/// keys of the query string belong to the field.
#[derive(Debug, Clone, PartialEq)]
pub enum Widget {
	TextInput,
	NumberInput,
	DateInput,
	DateTimeInput,
	TimeInput,
	NullBooleanSelect,
	Select { choices: Choices },
	SelectMultiple { choices: Choices },
	/// Several sub-inputs named `<name>_0`, `<name>_1`, ...
	MultiWidget(Vec<Widget>),
}

impl Widget {
	/// Extract this widget's raw value from `data`.
	///
	/// Returns `None` when nothing was submitted for the field, which the
	/// field's `clean` treats the same as a blank value.
	///
	/// # Examples
	///
	/// ```
	/// use tamis_forms::{QueryDict, Widget};
	/// use serde_json::json;
	///
	/// let data = QueryDict::parse("price_0=10&price_1=20&tag=a&tag=b").unwrap();
	///
	/// let range = Widget::MultiWidget(vec![Widget::NumberInput, Widget::NumberInput]);
	/// assert_eq!(range.value_from_data(&data, "price"), Some(json!(["10", "20"])));
	///
	/// let tags = Widget::SelectMultiple { choices: vec![] };
	/// assert_eq!(tags.value_from_data(&data, "tag"), Some(json!(["a", "b"])));
	/// assert_eq!(Widget::TextInput.value_from_data(&data, "missing"), None);
	/// ```
	pub fn value_from_data(&self, data: &QueryDict, name: &str) -> Option<serde_json::Value> {
		match self {
			Widget::SelectMultiple { .. } => {
				let values = data.get_list(name);
				if values.is_empty() {
					return None;
				}
				Some(serde_json::Value::Array(
					values
						.iter()
						.map(|v| serde_json::Value::String(v.clone()))
						.collect(),
				))
			}
			Widget::MultiWidget(widgets) => {
				let values: Vec<Option<serde_json::Value>> = widgets
					.iter()
					.enumerate()
					.map(|(i, w)| w.value_from_data(data, &format!("{}_{}", name, i)))
					.collect();
				if values.iter().all(Option::is_none) {
					return None;
				}
				Some(serde_json::Value::Array(
					values
						.into_iter()
						.map(|v| v.unwrap_or(serde_json::Value::Null))
						.collect(),
				))
			}
			_ => data
				.get(name)
				.map(|v| serde_json::Value::String(v.to_string())),
		}
	}

	pub fn choices(&self) -> Option<&[(String, String)]> {
		match self {
			Widget::Select { choices } | Widget::SelectMultiple { choices } => Some(choices),
			_ => None,
		}
	}
}

/// A validating form field.
///
/// `clean` receives the raw submitted value (`None` when absent) and returns
/// the normalized value or a validation error. Empty optional input cleans to
/// an "empty" value (`null`, `""` or `[]`) rather than failing.
pub trait FormField: Send + Sync {
	fn name(&self) -> &str;

	fn label(&self) -> Option<&str>;

	fn required(&self) -> bool;

	fn help_text(&self) -> Option<&str> {
		None
	}

	fn widget(&self) -> &Widget;

	fn initial(&self) -> Option<&serde_json::Value> {
		None
	}

	fn clean(&self, value: Option<&serde_json::Value>) -> FieldResult<serde_json::Value>;

	fn value_from_data(&self, data: &QueryDict, html_name: &str) -> Option<serde_json::Value> {
		self.widget().value_from_data(data, html_name)
	}
}

/// Whether a cleaned value means "no constraint".
pub fn is_empty_value(value: &serde_json::Value) -> bool {
	match value {
		serde_json::Value::Null => true,
		serde_json::Value::String(s) => s.is_empty(),
		serde_json::Value::Array(items) => items.is_empty(),
		serde_json::Value::Object(map) => map.is_empty(),
		_ => false,
	}
}

/// Raw string out of a submitted value, trimmed. `None` for null and blanks.
pub(crate) fn raw_text(value: Option<&serde_json::Value>) -> FieldResult<Option<String>> {
	match value {
		None | Some(serde_json::Value::Null) => Ok(None),
		Some(serde_json::Value::String(s)) => {
			let s = s.trim();
			Ok((!s.is_empty()).then(|| s.to_string()))
		}
		Some(serde_json::Value::Number(n)) => Ok(Some(n.to_string())),
		Some(serde_json::Value::Bool(b)) => Ok(Some(b.to_string())),
		Some(_) => Err(FieldError::Invalid("Enter a single value.".to_string())),
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;
	use serde_json::json;

	#[rstest]
	#[case(json!(null), true)]
	#[case(json!(""), true)]
	#[case(json!([]), true)]
	#[case(json!({}), true)]
	#[case(json!(false), false)]
	#[case(json!(0), false)]
	#[case(json!("a"), false)]
	fn test_is_empty_value(#[case] value: serde_json::Value, #[case] expected: bool) {
		assert_eq!(is_empty_value(&value), expected);
	}

	#[rstest]
	fn test_raw_text() {
		assert_eq!(raw_text(None), Ok(None));
		assert_eq!(raw_text(Some(&json!("   "))), Ok(None));
		assert_eq!(raw_text(Some(&json!(" x "))), Ok(Some("x".to_string())));
		assert_eq!(raw_text(Some(&json!(12))), Ok(Some("12".to_string())));
		assert!(raw_text(Some(&json!(["a"]))).is_err());
	}

	#[rstest]
	fn test_multi_widget_partial_input() {
		// Arrange
		let data = QueryDict::parse("price_1=20").unwrap();
		let widget = Widget::MultiWidget(vec![Widget::NumberInput, Widget::NumberInput]);

		// Act & Assert
		assert_eq!(
			widget.value_from_data(&data, "price"),
			Some(json!([null, "20"]))
		);
	}
}
