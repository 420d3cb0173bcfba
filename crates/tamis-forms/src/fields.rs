// Basic fields
pub mod boolean_field;
pub mod char_field;
pub mod choice_field;
pub mod decimal_field;

// Temporal fields
pub mod date_field;
pub mod datetime_field;
pub mod time_field;

// Multi-value fields
pub mod lookup_type_field;
pub mod range_field;

pub use boolean_field::NullBooleanField;
pub use char_field::CharField;
pub use choice_field::{ChoiceField, MultipleChoiceField};
pub use date_field::{DATE_FORMAT, DateField};
pub use datetime_field::{DATETIME_FORMAT, DateTimeField};
pub use decimal_field::DecimalField;
pub use lookup_type_field::LookupTypeField;
pub use range_field::RangeField;
pub use time_field::{TIME_FORMAT, TimeField};
