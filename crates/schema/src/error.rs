use thiserror::Error;

/// Error returned when a composed schema document cannot be turned into a
/// usable [`ComposedSchema`](crate::ComposedSchema).
#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("invalid schema document: {0}")]
    Syntax(#[from] parser::Error),

    #[error("inconsistent composed schema: {}", format_issues(.0))]
    Validation(Vec<SchemaIssue>),
}

/// A single inconsistency found while checking a composed schema.
///
/// Issues are collected as a batch so that one pass over the schema reports
/// everything that is wrong with it.
#[derive(Debug, Error, Eq, PartialEq)]
pub enum SchemaIssue {
    #[error("field '{type_name}.{field_name}' has no owning service")]
    MissingOwner { type_name: String, field_name: String },

    #[error("'@{directive}' on '{type_name}' names unknown field '{field_name}'")]
    UnknownFieldInFieldSet {
        directive: &'static str,
        type_name: String,
        field_name: String,
    },

    #[error("'@key' is not allowed on {kind} type '{type_name}'")]
    InvalidKeyLocation { kind: &'static str, type_name: String },

    #[error("field '{type_name}.{field_name}' is external but '{type_name}' has no owner to resolve it")]
    ExternalWithoutOwner { type_name: String, field_name: String },
}

fn format_issues(issues: &[SchemaIssue]) -> String {
    issues
        .iter()
        .map(|issue| issue.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}
