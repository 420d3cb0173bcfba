//! Filter sets declared in TOML.
//!
//! ```toml
//! fields = ["name", "manufacturer__name"]
//! order_by = true
//!
//! [[filters]]
//! name = "max_price"
//! field_name = "price"
//! kind = "number"
//! lookup = "lt"
//!
//! [filters.extra]
//! decimal_places = 2
//! ```

use crate::error::{ConfigResult, ConfigurationError};
use crate::filter::{Filter, LookupChoice};
use crate::filterset::{FieldSelection, FilterSetBuilder};
use crate::kind::FilterKind;
use crate::ordering::OrderBy;
use serde::Deserialize;
use tamis_query::{Lookup, Model};

/// Field list value meaning "every field".
pub const ALL_FIELDS: &str = "__all__";

/// Lookup value meaning "let the user pick any lookup".
pub const ANY_LOOKUP: &str = "*";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FilterSetConfig {
	#[serde(default)]
	pub fields: Option<FieldsSetting>,
	#[serde(default)]
	pub exclude: Vec<String>,
	#[serde(default)]
	pub order_by: Option<OrderBySetting>,
	#[serde(default)]
	pub order_by_param: Option<String>,
	#[serde(default)]
	pub prefix: Option<String>,
	#[serde(default)]
	pub filters: Vec<FilterConfig>,
}

/// `fields = "__all__"` or `fields = ["a", "b"]`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum FieldsSetting {
	One(String),
	Many(Vec<String>),
}

/// `order_by = true` or `order_by = ["price", "name"]`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum OrderBySetting {
	Enabled(bool),
	Fields(Vec<String>),
}

/// `lookup = "lt"`, `lookup = ["lt", "gt"]` or `lookup = "*"`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum LookupSetting {
	One(String),
	Many(Vec<String>),
}

/// One `[[filters]]` table.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FilterConfig {
	pub name: String,
	#[serde(default)]
	pub field_name: Option<String>,
	/// Inferred from the model field when omitted.
	#[serde(default)]
	pub kind: Option<FilterKind>,
	#[serde(default)]
	pub lookup: Option<LookupSetting>,
	#[serde(default)]
	pub label: Option<String>,
	#[serde(default)]
	pub required: bool,
	#[serde(default)]
	pub choices: Option<Vec<(String, String)>>,
	#[serde(default)]
	pub extra: serde_json::Map<String, serde_json::Value>,
}

impl FilterSetConfig {
	pub fn from_toml_str(source: &str) -> ConfigResult<Self> {
		toml::from_str(source).map_err(|e| ConfigurationError::InvalidConfig(e.to_string()))
	}
}

fn parse_lookup(name: &str) -> ConfigResult<Lookup> {
	name.parse()
		.map_err(|_| ConfigurationError::UnknownLookup(name.to_string()))
}

impl LookupSetting {
	fn to_choice(&self) -> ConfigResult<LookupChoice> {
		match self {
			LookupSetting::One(name) if name == ANY_LOOKUP => Ok(LookupChoice::any()),
			LookupSetting::One(name) => parse_lookup(name).map(LookupChoice::Fixed),
			LookupSetting::Many(names) => names
				.iter()
				.map(|n| parse_lookup(n))
				.collect::<ConfigResult<Vec<_>>>()
				.map(LookupChoice::Choosable),
		}
	}
}

impl FilterConfig {
	fn into_filter<M: Model>(self) -> ConfigResult<Filter<M>> {
		let field_name = self.field_name.unwrap_or_else(|| self.name.clone());
		let kind = match self.kind {
			Some(kind) => kind,
			None if self.choices.is_some() => FilterKind::Choice,
			None => {
				let schema = M::schema();
				let resolved = schema
					.resolve(&field_name)
					.ok_or_else(|| ConfigurationError::UnknownField {
						model: schema.model.to_string(),
						name: field_name.clone(),
					})?;
				FilterKind::infer(&resolved.field)
			}
		};

		let mut filter = Filter::new(self.name, kind).with_field_name(field_name);
		if let Some(lookup) = &self.lookup {
			filter = filter.with_lookup_choice(lookup.to_choice()?);
		}
		if let Some(label) = self.label {
			filter = filter.with_label(label);
		}
		if self.required {
			filter = filter.required();
		}
		if let Some(choices) = self.choices {
			filter = filter.with_choices(choices);
		}
		for (key, value) in self.extra {
			filter = filter.with_extra(key, value);
		}
		Ok(filter)
	}
}

impl<M: Model> FilterSetBuilder<M> {
	/// Builder pre-filled from a parsed configuration. More filters can be
	/// added before [`build`](Self::build).
	///
	/// # Examples
	///
	/// ```
	/// use tamis_filters::{FilterSetBuilder, FilterSetConfig, LookupChoice};
	/// use tamis_query::Lookup;
	/// # use tamis_query::{FieldInfo, FieldKind, FieldRef, Model, Record, Schema, Value};
	/// # #[derive(Clone)]
	/// # struct Product;
	/// # impl Record for Product {
	/// #     fn field(&self, _: &str) -> Option<FieldRef<'_>> { None }
	/// #     fn primary_key(&self) -> Value { Value::Null }
	/// # }
	/// # impl Model for Product {
	/// #     fn schema() -> Schema {
	/// #         Schema::new("product", "id")
	/// #             .field(FieldInfo::new("id", FieldKind::AutoField))
	/// #             .field(FieldInfo::new("price", FieldKind::Decimal))
	/// #     }
	/// # }
	///
	/// let config = FilterSetConfig::from_toml_str(r#"
	///     fields = ["price"]
	///     order_by = true
	///
	///     [[filters]]
	///     name = "price"
	///     lookup = "lt"
	/// "#).unwrap();
	///
	/// let spec = FilterSetBuilder::<Product>::from_config(config).unwrap().build().unwrap();
	/// assert_eq!(spec.filter("price").unwrap().lookup(), &LookupChoice::Fixed(Lookup::Lt));
	/// assert_eq!(spec.ordering_choices().len(), 2);
	/// ```
	pub fn from_config(config: FilterSetConfig) -> ConfigResult<Self> {
		let mut builder = FilterSetBuilder::new();

		builder = match config.fields {
			None => builder,
			Some(FieldsSetting::One(all)) if all == ALL_FIELDS => builder.all_fields(),
			Some(FieldsSetting::One(name)) => builder.with_selection(FieldSelection::Names(vec![name])),
			Some(FieldsSetting::Many(names)) if names.iter().any(|n| n == ALL_FIELDS) => {
				builder.all_fields()
			}
			Some(FieldsSetting::Many(names)) => builder.with_selection(FieldSelection::Names(names)),
		};
		let exclude: Vec<&str> = config.exclude.iter().map(String::as_str).collect();
		builder = builder.exclude(&exclude);

		builder = builder.order_by(match config.order_by {
			None | Some(OrderBySetting::Enabled(false)) => OrderBy::Disabled,
			Some(OrderBySetting::Enabled(true)) => OrderBy::All,
			Some(OrderBySetting::Fields(names)) => OrderBy::Fields(names),
		});
		if let Some(param) = config.order_by_param {
			builder = builder.order_by_param(param);
		}
		if let Some(prefix) = config.prefix {
			builder = builder.prefix(prefix);
		}

		for filter in config.filters {
			builder = builder.filter(filter.into_filter()?);
		}
		Ok(builder)
	}

	/// Parse TOML and build the builder in one go.
	pub fn from_toml_str(source: &str) -> ConfigResult<Self> {
		Self::from_config(FilterSetConfig::from_toml_str(source)?)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;
	use tamis_query::{FieldInfo, FieldKind, FieldRef, Record, Schema, Value};

	#[derive(Clone)]
	struct Listing;

	impl Record for Listing {
		fn field(&self, _: &str) -> Option<FieldRef<'_>> {
			None
		}

		fn primary_key(&self) -> Value {
			Value::Null
		}
	}

	impl Model for Listing {
		fn schema() -> Schema {
			Schema::new("listing", "id")
				.field(FieldInfo::new("id", FieldKind::AutoField))
				.field(FieldInfo::new("title", FieldKind::Char))
				.field(FieldInfo::new("rent", FieldKind::Decimal))
				.field(FieldInfo::new("listed", FieldKind::Date))
		}
	}

	#[rstest]
	fn test_full_config() {
		// Arrange
		let source = r#"
			fields = ["title", "rent"]
			order_by = ["rent"]
			order_by_param = "sort"
			prefix = "search"

			[[filters]]
			name = "rent"
			lookup = ["lt", "gt"]
			label = "Monthly rent"

			[filters.extra]
			decimal_places = 2
			help_text = "In euros"

			[[filters]]
			name = "since"
			field_name = "listed"
			kind = "date"
			lookup = "gte"
			required = true
		"#;

		// Act
		let spec = FilterSetBuilder::<Listing>::from_toml_str(source)
			.unwrap()
			.build()
			.unwrap();

		// Assert
		let names: Vec<&str> = spec.filters().iter().map(|f| f.name()).collect();
		assert_eq!(names, vec!["title", "rent", "since"]);
		let rent = spec.filter("rent").unwrap();
		assert_eq!(rent.kind(), FilterKind::Number);
		assert_eq!(
			rent.lookup(),
			&LookupChoice::Choosable(vec![Lookup::Lt, Lookup::Gt])
		);
		assert_eq!(rent.label().as_deref(), Some("Monthly rent"));
		assert_eq!(rent.extra().get("decimal_places"), Some(&serde_json::json!(2)));
		let since = spec.filter("since").unwrap();
		assert_eq!(since.field_name(), "listed");
		assert!(since.is_required());
		assert_eq!(spec.order_by(), &OrderBy::Fields(vec!["rent".to_string()]));
		assert_eq!(spec.order_by_param(), "sort");
		assert_eq!(spec.prefix(), Some("search"));
	}

	#[rstest]
	#[case(r#"fields = "__all__""#, vec!["id", "title", "rent", "listed"])]
	#[case(r#"fields = ["__all__"]"#, vec!["id", "title", "rent", "listed"])]
	#[case(r#"fields = "__all__"
exclude = ["id", "listed"]"#, vec!["title", "rent"])]
	#[case(r#"fields = "title""#, vec!["title"])]
	fn test_field_selection(#[case] source: &str, #[case] expected: Vec<&str>) {
		let spec = FilterSetBuilder::<Listing>::from_toml_str(source)
			.unwrap()
			.build()
			.unwrap();
		let names: Vec<&str> = spec.filters().iter().map(|f| f.name()).collect();
		assert_eq!(names, expected);
	}

	#[rstest]
	fn test_choices_make_a_choice_filter() {
		let spec = FilterSetBuilder::<Listing>::from_toml_str(
			r#"
			[[filters]]
			name = "title"
			choices = [["loft", "Loft"], ["studio", "Studio"]]
			"#,
		)
		.unwrap()
		.build()
		.unwrap();

		let title = spec.filter("title").unwrap();
		assert_eq!(title.kind(), FilterKind::Choice);
		assert_eq!(title.choices(&tamis_query::QuerySet::none()).len(), 2);
	}

	#[rstest]
	fn test_any_lookup() {
		let config = FilterSetConfig::from_toml_str(
			r#"
			[[filters]]
			name = "title"
			lookup = "*"
			"#,
		)
		.unwrap();
		let spec = FilterSetBuilder::<Listing>::from_config(config)
			.unwrap()
			.build()
			.unwrap();
		assert_eq!(spec.filter("title").unwrap().lookup(), &LookupChoice::any());
	}

	#[rstest]
	#[case(
		"[[filters]]\nname = \"title\"\nlookup = \"like\"",
		ConfigurationError::UnknownLookup("like".into())
	)]
	#[case(
		"[[filters]]\nname = \"floor\"",
		ConfigurationError::UnknownField { model: "listing".into(), name: "floor".into() }
	)]
	fn test_builder_errors(#[case] source: &str, #[case] expected: ConfigurationError) {
		let result = FilterSetBuilder::<Listing>::from_toml_str(source);
		assert_eq!(result.err(), Some(expected));
	}

	#[rstest]
	#[case("fields = 3")]
	#[case("unknown_option = true")]
	#[case("[[filters]]\nname = \"title\"\nkind = \"slider\"")]
	fn test_invalid_config(#[case] source: &str) {
		assert!(matches!(
			FilterSetConfig::from_toml_str(source),
			Err(ConfigurationError::InvalidConfig(_))
		));
	}
}
