use std::collections::HashSet;

use fusegraph_schema::ValueExt;
use parser::{
    types::{Directive, ExecutableDocument, Field},
    Positioned,
};
use value::Name;

use crate::{Visitor, VisitorContext};

/// Every variable used in an argument must be declared by an operation.
#[derive(Default)]
pub struct NoUndefinedVariables {
    defined: HashSet<Name>,
}

impl<'a> Visitor<'a> for NoUndefinedVariables {
    fn enter_document(&mut self, _ctx: &mut VisitorContext<'a>, document: &'a ExecutableDocument) {
        let operations: Vec<_> = match &document.operations {
            parser::types::DocumentOperations::Single(operation) => vec![operation],
            parser::types::DocumentOperations::Multiple(operations) => operations.values().collect(),
        };
        for operation in operations {
            for variable_definition in &operation.node.variable_definitions {
                self.defined.insert(variable_definition.node.name.node.clone());
            }
        }
    }

    fn enter_field(&mut self, ctx: &mut VisitorContext<'a>, field: &'a Positioned<Field>) {
        for (_, value) in &field.node.arguments {
            self.check_value(ctx, value);
        }
    }

    fn enter_directive(&mut self, ctx: &mut VisitorContext<'a>, directive: &'a Positioned<Directive>) {
        for (_, value) in &directive.node.arguments {
            self.check_value(ctx, value);
        }
    }
}

impl NoUndefinedVariables {
    fn check_value(&self, ctx: &mut VisitorContext<'_>, value: &Positioned<value::Value>) {
        for variable in value.node.referenced_variables() {
            if !self.defined.contains(variable) {
                ctx.report_error(vec![value.pos], format!("Variable \"${}\" is not defined", variable));
            }
        }
    }
}
