use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum QueryError {
	#[error("Unknown lookup type: {0}")]
	UnknownLookup(String),
	#[error("Cannot resolve keyword '{path}' into field of model '{model}'")]
	UnknownField { model: String, path: String },
	#[error("Invalid ordering term: {0}")]
	InvalidOrdering(String),
	#[error("'{value}' is not a valid {kind} value")]
	InvalidValue { kind: &'static str, value: String },
}

pub type QueryResult<T> = Result<T, QueryError>;
