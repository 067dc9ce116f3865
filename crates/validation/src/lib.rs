//! Operation validation for the fusegraph planner.
//!
//! A small rule set focused on the failures the planner cannot tolerate:
//! unknown types, unknown fragments, fields that do not exist on their parent
//! type, undefined variables and multi-field subscriptions. Rules are
//! implemented as visitors over the parsed operation and report their errors
//! into a shared context, so one call returns the whole batch.

mod rules;
mod visitor;

use fusegraph_schema::ComposedSchema;
use parser::types::ExecutableDocument;

pub use visitor::{visit, RuleError, Visitor, VisitorContext, VisitorCons, VisitorNil};

/// Run all validation rules against `document`, returning every error found.
pub fn check_rules(schema: &ComposedSchema, document: &ExecutableDocument) -> Vec<RuleError> {
    let mut ctx = VisitorContext::new(schema, &document.fragments);
    let mut visitor = VisitorNil
        .with(rules::KnownTypeNames)
        .with(rules::KnownFragmentNames)
        .with(rules::FieldsOnCorrectType)
        .with(rules::NoUndefinedVariables::default())
        .with(rules::SingleFieldSubscriptions);
    visit(&mut visitor, &mut ctx, document);
    ctx.into_errors()
}
