//! Multi-valued request parameters.

use crate::form::{FormError, FormResult};
use indexmap::IndexMap;

/// Ordered multi-map of submitted parameters, like Django's `QueryDict`.
///
/// A key may carry several values (`?tag=a&tag=b`). [`get`](QueryDict::get)
/// returns the last one, [`get_list`](QueryDict::get_list) all of them.
///
/// # Examples
///
/// ```
/// use tamis_forms::QueryDict;
///
/// let data = QueryDict::parse("name=Anvil&tag=a&tag=b&empty=").unwrap();
/// assert_eq!(data.get("name"), Some("Anvil"));
/// assert_eq!(data.get("tag"), Some("b"));
/// assert_eq!(data.get_list("tag"), ["a", "b"]);
/// assert_eq!(data.get("empty"), Some(""));
/// assert!(data.get("missing").is_none());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryDict {
	inner: IndexMap<String, Vec<String>>,
}

impl QueryDict {
	pub fn new() -> Self {
		Self::default()
	}

	/// Parse an `application/x-www-form-urlencoded` string. A leading `?` is
	/// ignored.
	pub fn parse(query: &str) -> FormResult<Self> {
		let query = query.strip_prefix('?').unwrap_or(query);
		let pairs: Vec<(String, String)> = serde_urlencoded::from_str(query)
			.map_err(|e| FormError::QueryString(e.to_string()))?;
		Ok(pairs.into_iter().collect())
	}

	pub fn to_query_string(&self) -> FormResult<String> {
		let pairs: Vec<(&str, &str)> = self
			.inner
			.iter()
			.flat_map(|(k, values)| values.iter().map(move |v| (k.as_str(), v.as_str())))
			.collect();
		serde_urlencoded::to_string(pairs).map_err(|e| FormError::QueryString(e.to_string()))
	}

	pub fn get(&self, key: &str) -> Option<&str> {
		self.inner
			.get(key)
			.and_then(|values| values.last())
			.map(String::as_str)
	}

	pub fn get_list(&self, key: &str) -> &[String] {
		self.inner.get(key).map(Vec::as_slice).unwrap_or(&[])
	}

	/// Replace every value of `key`.
	pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
		self.inner.insert(key.into(), vec![value.into()]);
	}

	pub fn append(&mut self, key: impl Into<String>, value: impl Into<String>) {
		self.inner.entry(key.into()).or_default().push(value.into());
	}

	pub fn remove(&mut self, key: &str) -> Option<Vec<String>> {
		self.inner.shift_remove(key)
	}

	pub fn contains_key(&self, key: &str) -> bool {
		self.inner.contains_key(key)
	}

	pub fn keys(&self) -> impl Iterator<Item = &str> {
		self.inner.keys().map(String::as_str)
	}

	pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
		self.inner.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
	}

	pub fn len(&self) -> usize {
		self.inner.len()
	}

	pub fn is_empty(&self) -> bool {
		self.inner.is_empty()
	}
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for QueryDict {
	fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
		let mut dict = QueryDict::new();
		for (k, v) in iter {
			dict.append(k, v);
		}
		dict
	}
}

impl<K: Into<String>, V: Into<String>, const N: usize> From<[(K, V); N]> for QueryDict {
	fn from(pairs: [(K, V); N]) -> Self {
		pairs.into_iter().collect()
	}
}
