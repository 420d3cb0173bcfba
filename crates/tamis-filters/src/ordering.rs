//! The optional ordering parameter of a filter set.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tamis_forms::{ChoiceField, Choices, FormField};
use tamis_query::OrderingTerm;

/// Query parameter the ordering choice is read from unless configured.
pub const DEFAULT_ORDER_BY_PARAM: &str = "order_by";

/// Which orderings a filter set offers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderBy {
	#[default]
	Disabled,
	/// Ascending ordering on each of these filter names.
	Fields(Vec<String>),
	/// Every filter, ascending and descending.
	All,
}

impl OrderBy {
	pub fn is_enabled(&self) -> bool {
		!matches!(self, OrderBy::Disabled)
	}
}

/// Builds the form field that carries the ordering choice.
pub type OrderingFieldFactory = Arc<dyn Fn(&str, Choices) -> Box<dyn FormField> + Send + Sync>;

/// A select labelled "Ordering".
pub fn default_ordering_field(name: &str, choices: Choices) -> Box<dyn FormField> {
	Box::new(ChoiceField::new(name, choices).with_label("Ordering"))
}

/// Ordering choices offered for `names` (filter names paired with their
/// labels). `All` adds a descending `-name` option after each ascending one.
pub(crate) fn ordering_choices(order_by: &OrderBy, names: &[(String, String)]) -> Choices {
	match order_by {
		OrderBy::Disabled => Vec::new(),
		OrderBy::Fields(fields) => fields
			.iter()
			.map(|field| {
				let label = names
					.iter()
					.find(|(name, _)| name == field)
					.map(|(_, label)| label.clone())
					.unwrap_or_else(|| field.clone());
				(field.clone(), label)
			})
			.collect(),
		OrderBy::All => names
			.iter()
			.flat_map(|(name, label)| {
				[
					(name.clone(), label.clone()),
					(format!("-{}", name), format!("{} (descending)", label)),
				]
			})
			.collect(),
	}
}

/// Turn a submitted choice into an ordering term on the model path of the
/// named filter.
///
/// `lookup_path` maps a filter name to its model path; `None` means the
/// choice names no filter.
pub(crate) fn resolve_choice<'a>(
	choice: &str,
	offered: &[(String, String)],
	lookup_path: impl Fn(&str) -> Option<&'a str>,
) -> Option<OrderingTerm> {
	if !offered.iter().any(|(key, _)| key == choice) {
		return None;
	}
	let term = OrderingTerm::parse(choice).ok()?;
	let path = lookup_path(&term.path)?;
	Some(OrderingTerm {
		path: path.to_string(),
		descending: term.descending,
	})
}
