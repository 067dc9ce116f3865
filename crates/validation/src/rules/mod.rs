mod fields_on_correct_type;
mod known_fragment_names;
mod known_type_names;
mod no_undefined_variables;
mod single_field_subscriptions;

pub use fields_on_correct_type::FieldsOnCorrectType;
pub use known_fragment_names::KnownFragmentNames;
pub use known_type_names::KnownTypeNames;
pub use no_undefined_variables::NoUndefinedVariables;
pub use single_field_subscriptions::SingleFieldSubscriptions;
