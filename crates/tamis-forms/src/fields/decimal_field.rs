use crate::field::{FieldError, FieldResult, FormField, Widget, raw_text};
use rust_decimal::Decimal;
use std::str::FromStr;

/// Exact decimal number.
///
/// The cleaned value is the normalized decimal as a string (`"10.50"` stays
/// `"10.50"`) so no precision is lost on the way to the query layer.
///
/// # Examples
///
/// ```
/// use tamis_forms::{DecimalField, FormField};
/// use serde_json::json;
///
/// let field = DecimalField::new("price").with_decimal_places(2);
/// assert_eq!(field.clean(Some(&json!("19.99"))).unwrap(), json!("19.99"));
/// assert!(field.clean(Some(&json!("19.999"))).is_err());
/// assert!(field.clean(Some(&json!("cheap"))).is_err());
/// ```
#[derive(Debug, Clone)]
pub struct DecimalField {
	pub name: String,
	pub label: Option<String>,
	pub required: bool,
	pub help_text: Option<String>,
	pub widget: Widget,
	pub max_value: Option<Decimal>,
	pub min_value: Option<Decimal>,
	pub max_digits: Option<u32>,
	pub decimal_places: Option<u32>,
}

impl DecimalField {
	pub fn new(name: impl Into<String>) -> Self {
		Self {
			name: name.into(),
			label: None,
			required: false,
			help_text: None,
			widget: Widget::NumberInput,
			max_value: None,
			min_value: None,
			max_digits: None,
			decimal_places: None,
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

	pub fn with_max_value(mut self, max_value: Decimal) -> Self {
		self.max_value = Some(max_value);
		self
	}

	pub fn with_min_value(mut self, min_value: Decimal) -> Self {
		self.min_value = Some(min_value);
		self
	}

	pub fn with_max_digits(mut self, max_digits: u32) -> Self {
		self.max_digits = Some(max_digits);
		self
	}

	pub fn with_decimal_places(mut self, decimal_places: u32) -> Self {
		self.decimal_places = Some(decimal_places);
		self
	}

	/// Parse and validate one number.
	pub fn to_decimal(&self, s: &str) -> FieldResult<Decimal> {
		let number = Decimal::from_str(s)
			.or_else(|_| Decimal::from_scientific(s))
			.map_err(|_| FieldError::Invalid("Enter a number.".to_string()))?;

		let scale = number.scale();
		let integer_digits = {
			let trunc = number.trunc().abs();
			if trunc.is_zero() {
				0
			} else {
				trunc.to_string().len() as u32
			}
		};

		if let Some(max_digits) = self.max_digits
			&& integer_digits + scale > max_digits
		{
			return Err(FieldError::Validation(format!(
				"Ensure that there are no more than {} digits in total.",
				max_digits
			)));
		}
		if let Some(decimal_places) = self.decimal_places
			&& scale > decimal_places
		{
			return Err(FieldError::Validation(format!(
				"Ensure that there are no more than {} decimal places.",
				decimal_places
			)));
		}
		if let Some(max_value) = self.max_value
			&& number > max_value
		{
			return Err(FieldError::Validation(format!(
				"Ensure this value is less than or equal to {}.",
				max_value
			)));
		}
		if let Some(min_value) = self.min_value
			&& number < min_value
		{
			return Err(FieldError::Validation(format!(
				"Ensure this value is greater than or equal to {}.",
				min_value
			)));
		}
		Ok(number)
	}
}

impl FormField for DecimalField {
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
				let number = self.to_decimal(&s)?;
				Ok(serde_json::Value::String(number.to_string()))
			}
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use proptest::prelude::*;
	use rstest::rstest;
	use serde_json::json;

	#[rstest]
	#[case("100", json!("100"))]
	#[case(" 10.50 ", json!("10.50"))]
	#[case("-0.5", json!("-0.5"))]
	#[case("", json!(null))]
	fn test_clean(#[case] input: &str, #[case] expected: serde_json::Value) {
		let field = DecimalField::new("price");
		assert_eq!(field.clean(Some(&json!(input))).unwrap(), expected);
	}

	#[rstest]
	fn test_json_number_input() {
		let field = DecimalField::new("price");
		assert_eq!(field.clean(Some(&json!(42))).unwrap(), json!("42"));
	}

	#[rstest]
	#[case("123456.7", false)]
	#[case("1234.56", true)]
	#[case("0.123", true)]
	#[case("0.1234", false)]
	fn test_max_digits(#[case] input: &str, #[case] ok: bool) {
		let field = DecimalField::new("price").with_max_digits(6);
		let field = if input.starts_with("0.") {
			field.with_decimal_places(3)
		} else {
			field
		};
		assert_eq!(field.clean(Some(&json!(input))).is_ok(), ok);
	}

	#[rstest]
	fn test_bounds() {
		let field = DecimalField::new("qty")
			.with_min_value(Decimal::ZERO)
			.with_max_value(Decimal::from(10));
		assert!(field.clean(Some(&json!("10"))).is_ok());
		assert!(field.clean(Some(&json!("10.01"))).is_err());
		assert!(field.clean(Some(&json!("-1"))).is_err());
	}

	proptest! {
		#[test]
		fn prop_cleaned_value_parses_back(input in "\\PC{0,12}") {
			let field = DecimalField::new("n");
			if let Ok(serde_json::Value::String(cleaned)) = field.clean(Some(&json!(input))) {
				prop_assert_eq!(
					Decimal::from_str(&cleaned).ok(),
					field.to_decimal(input.trim()).ok()
				);
			}
		}
	}
}
