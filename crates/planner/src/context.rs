use fusegraph_schema::{ComposedSchema, MetaType};
use parser::{
    types::{
        DocumentOperations,
        ExecutableDocument,
        InlineFragment,
        OperationDefinition,
        OperationType,
        Selection,
        SelectionSet,
        VariableDefinition,
    },
    Positioned,
};
use tracing::instrument;

use crate::error::PlanError;

/// A normalized operation paired with the composed schema, ready to split.
///
/// Construction resolves the requested operation, runs the validation batch,
/// and inlines every fragment spread into an inline fragment carrying the
/// original type condition, so the splitter only ever sees fields and inline
/// fragments.
#[derive(Debug)]
pub struct OperationContext<'a> {
    pub schema: &'a ComposedSchema,
    pub kind: OperationType,
    pub variable_definitions: &'a [Positioned<VariableDefinition>],
    pub root_type: &'a MetaType,
    pub selection_set: SelectionSet,
}

impl<'a> OperationContext<'a> {
    #[instrument(skip(schema, document), err(Debug), level = "trace")]
    pub fn build(
        schema: &'a ComposedSchema,
        document: &'a ExecutableDocument,
        operation_name: Option<&str>,
    ) -> Result<Self, PlanError> {
        let errors = fusegraph_validation::check_rules(schema, document);
        if !errors.is_empty() {
            return Err(PlanError::Validation(errors));
        }

        let operation = resolve_operation(document, operation_name)?;
        let kind = operation.node.ty;

        let root_type_name = match kind {
            OperationType::Query => schema.query_type(),
            OperationType::Mutation => schema
                .mutation_type()
                .ok_or_else(|| PlanError::single(operation.pos, "Schema does not define a mutation root"))?,
            OperationType::Subscription => schema
                .subscription_type()
                .ok_or_else(|| PlanError::single(operation.pos, "Schema does not define a subscription root"))?,
        };
        let root_type = schema
            .type_by_name(root_type_name)
            .ok_or(PlanError::Internal("root operation type is missing from the schema"))?;

        let mut spread_stack = Vec::new();
        let selection_set = inline_fragments(document, &operation.node.selection_set.node, &mut spread_stack);

        Ok(Self {
            schema,
            kind,
            variable_definitions: &operation.node.variable_definitions,
            root_type,
            selection_set,
        })
    }
}

fn resolve_operation<'a>(
    document: &'a ExecutableDocument,
    operation_name: Option<&str>,
) -> Result<&'a Positioned<OperationDefinition>, PlanError> {
    match operation_name {
        Some(name) => {
            let operation = match &document.operations {
                DocumentOperations::Single(_) => None,
                DocumentOperations::Multiple(operations) => operations.get(name),
            };
            operation.ok_or_else(|| PlanError::NoMatchingOperation { name: name.to_string() })
        }
        None => match &document.operations {
            DocumentOperations::Single(operation) => Ok(operation),
            DocumentOperations::Multiple(operations) if operations.len() == 1 => {
                Ok(operations.values().next().expect("len was checked"))
            }
            DocumentOperations::Multiple(_) => Err(PlanError::AmbiguousOperation),
        },
    }
}

/// Rewrite a selection set so fragment spreads become inline fragments.
///
/// Unknown fragments were already rejected by validation; a spread that is
/// part of a cycle is dropped rather than expanded forever.
fn inline_fragments<'a>(
    document: &'a ExecutableDocument,
    selection_set: &'a SelectionSet,
    spread_stack: &mut Vec<&'a str>,
) -> SelectionSet {
    let mut items = Vec::with_capacity(selection_set.items.len());

    for selection in &selection_set.items {
        match &selection.node {
            Selection::Field(field) => {
                let mut new_field = field.node.clone();
                new_field.selection_set = Positioned::new(
                    inline_fragments(document, &field.node.selection_set.node, spread_stack),
                    field.node.selection_set.pos,
                );
                items.push(Positioned::new(
                    Selection::Field(Positioned::new(new_field, field.pos)),
                    selection.pos,
                ));
            }
            Selection::InlineFragment(fragment) => {
                let mut new_fragment = fragment.node.clone();
                new_fragment.selection_set = Positioned::new(
                    inline_fragments(document, &fragment.node.selection_set.node, spread_stack),
                    fragment.node.selection_set.pos,
                );
                items.push(Positioned::new(
                    Selection::InlineFragment(Positioned::new(new_fragment, fragment.pos)),
                    selection.pos,
                ));
            }
            Selection::FragmentSpread(spread) => {
                let name = spread.node.fragment_name.node.as_str();
                if spread_stack.contains(&name) {
                    continue;
                }
                if let Some(fragment) = document.fragments.get(name) {
                    spread_stack.push(name);
                    let inlined = inline_fragments(document, &fragment.node.selection_set.node, spread_stack);
                    spread_stack.pop();

                    let inline = InlineFragment {
                        type_condition: Some(fragment.node.type_condition.clone()),
                        directives: spread.node.directives.clone(),
                        selection_set: Positioned::new(inlined, fragment.node.selection_set.pos),
                    };
                    items.push(Positioned::new(
                        Selection::InlineFragment(Positioned::new(inline, spread.pos)),
                        selection.pos,
                    ));
                }
            }
        }
    }

    SelectionSet { items }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schema() -> ComposedSchema {
        ComposedSchema::parse(
            r#"
            schema { query: Query }
            type Query {
                me: User @resolve(service: "accounts")
            }
            type User @owner(service: "accounts") @key(fields: "id", service: "accounts") {
                id: ID!
                name: String
            }
            "#,
        )
        .unwrap()
    }

    #[test]
    fn spreads_are_inlined_with_their_condition() {
        let schema = schema();
        let document = parser::parse_query("{ me { ...userFields } } fragment userFields on User { name }").unwrap();
        let ctx = OperationContext::build(&schema, &document, None).unwrap();

        let me = match &ctx.selection_set.items[0].node {
            Selection::Field(field) => &field.node,
            _ => panic!("expected a field"),
        };
        match &me.selection_set.node.items[0].node {
            Selection::InlineFragment(fragment) => {
                assert_eq!(
                    fragment.node.type_condition.as_ref().unwrap().node.on.node.as_str(),
                    "User"
                );
            }
            _ => panic!("expected the spread to become an inline fragment"),
        }
    }

    #[test]
    fn unnamed_operation_must_be_unique() {
        let schema = schema();
        let document = parser::parse_query("query A { me { name } } query B { me { name } }").unwrap();
        assert!(matches!(
            OperationContext::build(&schema, &document, None),
            Err(PlanError::AmbiguousOperation)
        ));
        assert!(matches!(
            OperationContext::build(&schema, &document, Some("C")),
            Err(PlanError::NoMatchingOperation { .. })
        ));
        assert!(OperationContext::build(&schema, &document, Some("B")).is_ok());
    }
}
