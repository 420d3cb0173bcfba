//! Form processing and validation for Tamis
//!
//! This crate provides what a filter set needs from a form library:
//! - Validating fields (`clean`) for text, choices, numbers, dates and ranges
//! - A [`Form`] that binds submitted data and collects per-field errors
//! - [`QueryDict`], the multi-valued query-string mapping forms bind from
//! - [`BoundField`] for the template layer

pub mod bound_field;
pub mod field;
pub mod fields;
pub mod form;
pub mod querydict;

pub use bound_field::BoundField;
pub use field::{Choices, FieldError, FieldResult, FormField, Widget, is_empty_value};
pub use fields::{
	CharField, ChoiceField, DATE_FORMAT, DATETIME_FORMAT, DateField, DateTimeField, DecimalField,
	LookupTypeField, MultipleChoiceField, NullBooleanField, RangeField, TIME_FORMAT, TimeField,
};
pub use form::{ALL_FIELDS_KEY, Form, FormError, FormResult};
pub use querydict::QueryDict;
