use crate::field::{Choices, FieldError, FieldResult, FormField, Widget, is_empty_value, raw_text};
use serde_json::json;

/// A value plus the lookup to apply to it, submitted as `<name>_0` and
/// `<name>_1`.
///
/// The inner field validates the value. The lookup must be one of the
/// offered choices; a blank lookup is passed through as `""` and left for
/// the caller to default.
///
/// # Examples
///
/// ```
/// use tamis_forms::{DecimalField, FormField, LookupTypeField};
/// use serde_json::json;
///
/// let field = LookupTypeField::new(
///     Box::new(DecimalField::new("price")),
///     vec![("lt".to_string(), "lt".to_string()), ("gt".to_string(), "gt".to_string())],
/// );
/// assert_eq!(
///     field.clean(Some(&json!(["100", "lt"]))).unwrap(),
///     json!({"value": "100", "lookup": "lt"})
/// );
/// assert!(field.clean(Some(&json!(["100", "regex"]))).is_err());
/// ```
pub struct LookupTypeField {
	inner: Box<dyn FormField>,
	lookups: Choices,
	widget: Widget,
	pub label: Option<String>,
}

impl LookupTypeField {
	pub fn new(inner: Box<dyn FormField>, lookups: Choices) -> Self {
		let widget = Widget::MultiWidget(vec![
			inner.widget().clone(),
			Widget::Select {
				choices: lookups.clone(),
			},
		]);
		let label = inner.label().map(str::to_string);
		Self {
			inner,
			lookups,
			widget,
			label,
		}
	}

	pub fn with_label(mut self, label: impl Into<String>) -> Self {
		self.label = Some(label.into());
		self
	}

	pub fn lookups(&self) -> &[(String, String)] {
		&self.lookups
	}
}

impl FormField for LookupTypeField {
	fn name(&self) -> &str {
		self.inner.name()
	}

	fn label(&self) -> Option<&str> {
		self.label.as_deref()
	}

	fn required(&self) -> bool {
		self.inner.required()
	}

	fn help_text(&self) -> Option<&str> {
		self.inner.help_text()
	}

	fn widget(&self) -> &Widget {
		&self.widget
	}

	fn clean(&self, value: Option<&serde_json::Value>) -> FieldResult<serde_json::Value> {
		let (raw_value, raw_lookup) = match value {
			None | Some(serde_json::Value::Null) => (None, None),
			Some(serde_json::Value::Array(parts)) if parts.len() <= 2 => (parts.first(), parts.get(1)),
			Some(_) => return Err(FieldError::Invalid("Enter a list of values.".to_string())),
		};

		let cleaned = self.inner.clean(raw_value)?;
		let lookup = raw_text(raw_lookup)?.unwrap_or_default();
		if !lookup.is_empty() && !self.lookups.iter().any(|(key, _)| *key == lookup) {
			return Err(FieldError::InvalidChoice(lookup));
		}

		if is_empty_value(&cleaned) {
			return Ok(serde_json::Value::Null);
		}
		Ok(json!({ "value": cleaned, "lookup": lookup }))
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::fields::CharField;
	use rstest::rstest;

	fn field() -> LookupTypeField {
		LookupTypeField::new(
			Box::new(CharField::new("name").with_label("Name")),
			vec![
				("exact".to_string(), "exact".to_string()),
				("icontains".to_string(), "icontains".to_string()),
			],
		)
	}

	#[rstest]
	fn test_blank_lookup_passes_through() {
		assert_eq!(
			field().clean(Some(&json!(["anvil", ""]))).unwrap(),
			json!({"value": "anvil", "lookup": ""})
		);
		assert_eq!(
			field().clean(Some(&json!(["anvil"]))).unwrap(),
			json!({"value": "anvil", "lookup": ""})
		);
	}

	#[rstest]
	fn test_blank_value_is_no_constraint() {
		assert_eq!(
			field().clean(Some(&json!(["", "icontains"]))).unwrap(),
			json!(null)
		);
		assert_eq!(field().clean(None).unwrap(), json!(null));
	}

	#[rstest]
	fn test_delegates_to_inner() {
		let f = field();
		assert_eq!(f.name(), "name");
		assert_eq!(f.label(), Some("Name"));
		assert!(matches!(f.widget(), Widget::MultiWidget(w) if w.len() == 2));
	}
}
