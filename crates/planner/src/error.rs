use fusegraph_validation::RuleError;
use thiserror::Error;

/// Errors the planner can return before or instead of a plan.
///
/// Validation failures are collected and surfaced as one batch; everything
/// else aborts planning outright so that a broken split can never leak a
/// partial plan.
#[derive(Debug, Error)]
pub enum PlanError {
    #[error("operation validation failed: {}", format_errors(.0))]
    Validation(Vec<RuleError>),

    #[error("unknown operation named '{name}'")]
    NoMatchingOperation { name: String },

    #[error("document defines multiple operations and no operation name was given")]
    AmbiguousOperation,

    #[error("no key of entity '{type_name}' is resolvable by service '{service}' for a fetch from '{target}'")]
    UnsatisfiableKey {
        type_name: String,
        service: String,
        target: String,
    },

    #[error("planner invariant violated: {0}")]
    Internal(&'static str),
}

impl PlanError {
    pub(crate) fn single(location: parser::Pos, message: impl Into<String>) -> Self {
        PlanError::Validation(vec![RuleError::new(vec![location], message)])
    }
}

fn format_errors(errors: &[RuleError]) -> String {
    errors
        .iter()
        .map(|err| err.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}
