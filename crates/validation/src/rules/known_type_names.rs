use parser::{
    types::{FragmentDefinition, InlineFragment, VariableDefinition},
    Positioned,
};
use value::Name;

use crate::{Visitor, VisitorContext};
use fusegraph_schema::TypeExt;

/// Every type named by a fragment condition or a variable definition must be
/// defined in the schema.
#[derive(Default)]
pub struct KnownTypeNames;

impl<'a> Visitor<'a> for KnownTypeNames {
    fn enter_fragment_definition(
        &mut self,
        ctx: &mut VisitorContext<'a>,
        _name: &'a Name,
        fragment: &'a Positioned<FragmentDefinition>,
    ) {
        let condition = &fragment.node.type_condition;
        validate(ctx, &condition.node.on.node, condition.pos);
    }

    fn enter_variable_definition(
        &mut self,
        ctx: &mut VisitorContext<'a>,
        variable_definition: &'a Positioned<VariableDefinition>,
    ) {
        validate(
            ctx,
            variable_definition.node.var_type.node.concrete_typename(),
            variable_definition.pos,
        );
    }

    fn enter_inline_fragment(&mut self, ctx: &mut VisitorContext<'a>, inline_fragment: &'a Positioned<InlineFragment>) {
        if let Some(condition) = &inline_fragment.node.type_condition {
            validate(ctx, &condition.node.on.node, condition.pos);
        }
    }
}

fn validate(ctx: &mut VisitorContext<'_>, type_name: &str, pos: parser::Pos) {
    if ctx.schema.type_by_name(type_name).is_none() {
        ctx.report_error(vec![pos], format!("Unknown type \"{}\"", type_name));
    }
}
