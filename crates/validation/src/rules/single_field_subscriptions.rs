use parser::{
    types::{OperationDefinition, OperationType},
    Positioned,
};

use crate::{Visitor, VisitorContext};

/// Subscription operations must select exactly one root field.
#[derive(Default)]
pub struct SingleFieldSubscriptions;

impl<'a> Visitor<'a> for SingleFieldSubscriptions {
    fn enter_operation_definition(
        &mut self,
        ctx: &mut VisitorContext<'a>,
        operation: &'a Positioned<OperationDefinition>,
    ) {
        if operation.node.ty != OperationType::Subscription {
            return;
        }
        if operation.node.selection_set.node.items.len() != 1 {
            ctx.report_error(
                vec![operation.pos],
                "Subscription operations must select exactly one root field",
            );
        }
    }
}
