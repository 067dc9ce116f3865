use parser::{types::Field, Positioned};

use crate::{Visitor, VisitorContext};

/// Every field must be defined on the type its selection set applies to.
///
/// `__typename` is allowed on any composite type; `__schema` and `__type` are
/// present on the query root, so they pass the plain lookup.
#[derive(Default)]
pub struct FieldsOnCorrectType;

impl<'a> Visitor<'a> for FieldsOnCorrectType {
    fn enter_field(&mut self, ctx: &mut VisitorContext<'a>, field: &'a Positioned<Field>) {
        let parent = match ctx.current_type() {
            Some(parent) => parent,
            None => return,
        };
        let name = field.node.name.node.as_str();

        if !parent.is_composite() || name == "__typename" {
            return;
        }

        if parent.field_by_name(name).is_none() {
            ctx.report_error(
                vec![field.pos],
                format!("Unknown field \"{}\" on type \"{}\"", name, parent.name),
            );
        }
    }
}
