use crate::field::{FieldError, FieldResult, FormField, Widget, is_empty_value};
use crate::fields::DecimalField;
use serde_json::json;

/// A pair of numbers submitted as `<name>_0` (start) and `<name>_1` (stop).
///
/// Cleans to `{"start": .., "stop": ..}` where a missing bound is `null`, or
/// to `null` when both bounds are blank.
///
/// # Examples
///
/// ```
/// use tamis_forms::{FormField, QueryDict, RangeField};
/// use serde_json::json;
///
/// let field = RangeField::new("price");
/// let data = QueryDict::parse("price_0=10&price_1=20").unwrap();
/// let raw = field.value_from_data(&data, "price");
/// assert_eq!(
///     field.clean(raw.as_ref()).unwrap(),
///     json!({"start": "10", "stop": "20"})
/// );
/// ```
#[derive(Debug, Clone)]
pub struct RangeField {
	pub name: String,
	pub label: Option<String>,
	pub required: bool,
	pub help_text: Option<String>,
	pub widget: Widget,
	bound: DecimalField,
}

impl RangeField {
	pub fn new(name: impl Into<String>) -> Self {
		let name = name.into();
		Self {
			bound: DecimalField::new(name.clone()),
			name,
			label: None,
			required: false,
			help_text: None,
			widget: Widget::MultiWidget(vec![Widget::NumberInput, Widget::NumberInput]),
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

	/// Validation applied to each bound (digits, decimal places, limits).
	pub fn with_bound_field(mut self, bound: DecimalField) -> Self {
		self.bound = bound;
		self
	}
}

impl FormField for RangeField {
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
		let (start, stop) = match value {
			None | Some(serde_json::Value::Null) => (None, None),
			Some(serde_json::Value::Array(parts)) if parts.len() <= 2 => (parts.first(), parts.get(1)),
			Some(_) => return Err(FieldError::Invalid("Enter a list of values.".to_string())),
		};
		let start = self.bound.clean(start)?;
		let stop = self.bound.clean(stop)?;

		if is_empty_value(&start) && is_empty_value(&stop) {
			if self.required {
				return Err(FieldError::Required(self.name.clone()));
			}
			return Ok(serde_json::Value::Null);
		}
		Ok(json!({ "start": start, "stop": stop }))
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	#[case(json!(["1", "5"]), json!({"start": "1", "stop": "5"}))]
	#[case(json!([null, "5"]), json!({"start": null, "stop": "5"}))]
	#[case(json!(["1", ""]), json!({"start": "1", "stop": null}))]
	#[case(json!(["", ""]), json!(null))]
	fn test_clean(#[case] input: serde_json::Value, #[case] expected: serde_json::Value) {
		let field = RangeField::new("price");
		assert_eq!(field.clean(Some(&input)).unwrap(), expected);
	}

	#[rstest]
	fn test_invalid_bound() {
		let field = RangeField::new("price");
		assert!(field.clean(Some(&json!(["one", "5"]))).is_err());
		assert!(field.clean(Some(&json!("5"))).is_err());
	}

	#[rstest]
	fn test_bound_field_rules_apply() {
		let field = RangeField::new("price")
			.with_bound_field(DecimalField::new("price").with_decimal_places(0));
		assert!(field.clean(Some(&json!(["1.5", "2"]))).is_err());
	}
}
