use thiserror::Error;

/// Problems in a filter set definition. Raised when the set is built, never
/// while binding user input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigurationError {
	#[error("'{name}' is neither a declared filter nor a field of model '{model}'")]
	UnknownField { model: String, name: String },
	#[error("Unknown lookup type: {0}")]
	UnknownLookup(String),
	#[error("Filter '{0}' is declared more than once")]
	DuplicateFilter(String),
	#[error("Conflicting options: {0}")]
	ConflictingOptions(String),
	#[error("Invalid filter set configuration: {0}")]
	InvalidConfig(String),
}

pub type ConfigResult<T> = Result<T, ConfigurationError>;
