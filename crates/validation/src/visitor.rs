use std::collections::HashMap;
use std::fmt;

use fusegraph_schema::{ComposedSchema, MetaType};
use parser::{
    types::{
        Directive,
        DocumentOperations,
        ExecutableDocument,
        Field,
        FragmentDefinition,
        FragmentSpread,
        InlineFragment,
        OperationDefinition,
        OperationType,
        Selection,
        SelectionSet,
        VariableDefinition,
    },
    Pos,
    Positioned,
};
use value::Name;

/// A single validation failure with the source positions it applies to.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct RuleError {
    pub locations: Vec<Pos>,
    pub message: String,
}

impl RuleError {
    pub fn new(locations: Vec<Pos>, message: impl Into<String>) -> Self {
        Self {
            locations,
            message: message.into(),
        }
    }
}

impl fmt::Display for RuleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, loc) in self.locations.iter().enumerate() {
            if idx == 0 {
                write!(f, "[")?;
            } else {
                write!(f, ", ")?;
            }
            write!(f, "{}:{}", loc.line, loc.column)?;
            if idx == self.locations.len() - 1 {
                write!(f, "] ")?;
            }
        }
        write!(f, "{}", self.message)
    }
}

/// State shared by all rules while a document is being walked.
pub struct VisitorContext<'a> {
    pub schema: &'a ComposedSchema,
    pub fragments: &'a HashMap<Name, Positioned<FragmentDefinition>>,
    errors: Vec<RuleError>,
    type_stack: Vec<Option<&'a MetaType>>,
}

impl<'a> VisitorContext<'a> {
    pub fn new(schema: &'a ComposedSchema, fragments: &'a HashMap<Name, Positioned<FragmentDefinition>>) -> Self {
        Self {
            schema,
            fragments,
            errors: Vec::new(),
            type_stack: Vec::new(),
        }
    }

    pub fn report_error(&mut self, locations: Vec<Pos>, message: impl Into<String>) {
        self.errors.push(RuleError::new(locations, message));
    }

    pub fn into_errors(self) -> Vec<RuleError> {
        self.errors
    }

    /// The type the currently visited selection set applies to.
    pub fn current_type(&self) -> Option<&'a MetaType> {
        self.type_stack.last().copied().flatten()
    }

    pub fn parent_type(&self) -> Option<&'a MetaType> {
        if self.type_stack.len() >= 2 {
            self.type_stack[self.type_stack.len() - 2]
        } else {
            None
        }
    }

    pub fn fragment(&self, name: &str) -> Option<&'a Positioned<FragmentDefinition>> {
        self.fragments.get(name)
    }

    fn push_type(&mut self, ty: Option<&'a MetaType>) {
        self.type_stack.push(ty);
    }

    fn pop_type(&mut self) {
        self.type_stack.pop();
    }
}

/// A validation rule. Every method has a default empty body so rules only
/// implement the callbacks they care about.
#[allow(unused_variables)]
pub trait Visitor<'a> {
    fn enter_document(&mut self, ctx: &mut VisitorContext<'a>, document: &'a ExecutableDocument) {}
    fn exit_document(&mut self, ctx: &mut VisitorContext<'a>, document: &'a ExecutableDocument) {}

    fn enter_operation_definition(
        &mut self,
        ctx: &mut VisitorContext<'a>,
        operation: &'a Positioned<OperationDefinition>,
    ) {
    }
    fn exit_operation_definition(
        &mut self,
        ctx: &mut VisitorContext<'a>,
        operation: &'a Positioned<OperationDefinition>,
    ) {
    }

    fn enter_fragment_definition(
        &mut self,
        ctx: &mut VisitorContext<'a>,
        name: &'a Name,
        fragment: &'a Positioned<FragmentDefinition>,
    ) {
    }
    fn exit_fragment_definition(
        &mut self,
        ctx: &mut VisitorContext<'a>,
        name: &'a Name,
        fragment: &'a Positioned<FragmentDefinition>,
    ) {
    }

    fn enter_variable_definition(
        &mut self,
        ctx: &mut VisitorContext<'a>,
        variable_definition: &'a Positioned<VariableDefinition>,
    ) {
    }

    fn enter_selection_set(&mut self, ctx: &mut VisitorContext<'a>, selection_set: &'a Positioned<SelectionSet>) {}
    fn exit_selection_set(&mut self, ctx: &mut VisitorContext<'a>, selection_set: &'a Positioned<SelectionSet>) {}

    fn enter_field(&mut self, ctx: &mut VisitorContext<'a>, field: &'a Positioned<Field>) {}
    fn exit_field(&mut self, ctx: &mut VisitorContext<'a>, field: &'a Positioned<Field>) {}

    fn enter_fragment_spread(&mut self, ctx: &mut VisitorContext<'a>, fragment_spread: &'a Positioned<FragmentSpread>) {
    }

    fn enter_inline_fragment(&mut self, ctx: &mut VisitorContext<'a>, inline_fragment: &'a Positioned<InlineFragment>) {
    }
    fn exit_inline_fragment(&mut self, ctx: &mut VisitorContext<'a>, inline_fragment: &'a Positioned<InlineFragment>) {}

    fn enter_directive(&mut self, ctx: &mut VisitorContext<'a>, directive: &'a Positioned<Directive>) {}
}

/// Terminator of a rule chain.
pub struct VisitorNil;

impl VisitorNil {
    pub fn with<V>(self, visitor: V) -> VisitorCons<V, VisitorNil> {
        VisitorCons(visitor, self)
    }
}

impl<'a> Visitor<'a> for VisitorNil {}

/// Two rules chained together; `check_rules` builds the full chain with this.
pub struct VisitorCons<A, B>(A, B);

impl<A, B> VisitorCons<A, B> {
    pub fn with<V>(self, visitor: V) -> VisitorCons<V, Self> {
        VisitorCons(visitor, self)
    }
}

macro_rules! forward {
    ($name:ident, $($arg:ident: $ty:ty),*) => {
        fn $name(&mut self, ctx: &mut VisitorContext<'a>, $($arg: $ty),*) {
            self.0.$name(ctx, $($arg),*);
            self.1.$name(ctx, $($arg),*);
        }
    };
}

impl<'a, A: Visitor<'a>, B: Visitor<'a>> Visitor<'a> for VisitorCons<A, B> {
    forward!(enter_document, document: &'a ExecutableDocument);
    forward!(exit_document, document: &'a ExecutableDocument);
    forward!(enter_operation_definition, operation: &'a Positioned<OperationDefinition>);
    forward!(exit_operation_definition, operation: &'a Positioned<OperationDefinition>);
    forward!(enter_fragment_definition, name: &'a Name, fragment: &'a Positioned<FragmentDefinition>);
    forward!(exit_fragment_definition, name: &'a Name, fragment: &'a Positioned<FragmentDefinition>);
    forward!(enter_variable_definition, variable_definition: &'a Positioned<VariableDefinition>);
    forward!(enter_selection_set, selection_set: &'a Positioned<SelectionSet>);
    forward!(exit_selection_set, selection_set: &'a Positioned<SelectionSet>);
    forward!(enter_field, field: &'a Positioned<Field>);
    forward!(exit_field, field: &'a Positioned<Field>);
    forward!(enter_fragment_spread, fragment_spread: &'a Positioned<FragmentSpread>);
    forward!(enter_inline_fragment, inline_fragment: &'a Positioned<InlineFragment>);
    forward!(exit_inline_fragment, inline_fragment: &'a Positioned<InlineFragment>);
    forward!(enter_directive, directive: &'a Positioned<Directive>);
}

pub fn visit<'a, V: Visitor<'a>>(
    visitor: &mut V,
    ctx: &mut VisitorContext<'a>,
    document: &'a ExecutableDocument,
) {
    visitor.enter_document(ctx, document);

    match &document.operations {
        DocumentOperations::Single(operation) => visit_operation(visitor, ctx, operation),
        DocumentOperations::Multiple(operations) => {
            for operation in operations.values() {
                visit_operation(visitor, ctx, operation);
            }
        }
    }

    for (name, fragment) in document.fragments.iter() {
        visit_fragment_definition(visitor, ctx, name, fragment);
    }

    visitor.exit_document(ctx, document);
}

fn visit_operation<'a, V: Visitor<'a>>(
    visitor: &mut V,
    ctx: &mut VisitorContext<'a>,
    operation: &'a Positioned<OperationDefinition>,
) {
    visitor.enter_operation_definition(ctx, operation);

    let root_type = match operation.node.ty {
        OperationType::Query => Some(ctx.schema.query_type()),
        OperationType::Mutation => ctx.schema.mutation_type(),
        OperationType::Subscription => ctx.schema.subscription_type(),
    }
    .and_then(|name| ctx.schema.type_by_name(name));

    ctx.push_type(root_type);
    for variable_definition in &operation.node.variable_definitions {
        visitor.enter_variable_definition(ctx, variable_definition);
    }
    visit_selection_set(visitor, ctx, &operation.node.selection_set);
    ctx.pop_type();

    visitor.exit_operation_definition(ctx, operation);
}

fn visit_fragment_definition<'a, V: Visitor<'a>>(
    visitor: &mut V,
    ctx: &mut VisitorContext<'a>,
    name: &'a Name,
    fragment: &'a Positioned<FragmentDefinition>,
) {
    visitor.enter_fragment_definition(ctx, name, fragment);
    ctx.push_type(ctx.schema.type_by_name(&fragment.node.type_condition.node.on.node));
    visit_selection_set(visitor, ctx, &fragment.node.selection_set);
    ctx.pop_type();
    visitor.exit_fragment_definition(ctx, name, fragment);
}

fn visit_selection_set<'a, V: Visitor<'a>>(
    visitor: &mut V,
    ctx: &mut VisitorContext<'a>,
    selection_set: &'a Positioned<SelectionSet>,
) {
    visitor.enter_selection_set(ctx, selection_set);

    for selection in &selection_set.node.items {
        match &selection.node {
            Selection::Field(field) => visit_field(visitor, ctx, field),
            Selection::FragmentSpread(fragment_spread) => {
                for directive in &fragment_spread.node.directives {
                    visitor.enter_directive(ctx, directive);
                }
                visitor.enter_fragment_spread(ctx, fragment_spread);
            }
            Selection::InlineFragment(inline_fragment) => {
                visitor.enter_inline_fragment(ctx, inline_fragment);
                for directive in &inline_fragment.node.directives {
                    visitor.enter_directive(ctx, directive);
                }

                let condition_type = match &inline_fragment.node.type_condition {
                    Some(condition) => ctx.schema.type_by_name(&condition.node.on.node),
                    None => ctx.current_type(),
                };
                ctx.push_type(condition_type);
                visit_selection_set(visitor, ctx, &inline_fragment.node.selection_set);
                ctx.pop_type();

                visitor.exit_inline_fragment(ctx, inline_fragment);
            }
        }
    }

    visitor.exit_selection_set(ctx, selection_set);
}

fn visit_field<'a, V: Visitor<'a>>(visitor: &mut V, ctx: &mut VisitorContext<'a>, field: &'a Positioned<Field>) {
    visitor.enter_field(ctx, field);
    for directive in &field.node.directives {
        visitor.enter_directive(ctx, directive);
    }

    let field_type = ctx
        .current_type()
        .and_then(|parent| parent.field_by_name(&field.node.name.node))
        .and_then(|field_definition| ctx.schema.concrete_type(&field_definition.ty));
    ctx.push_type(field_type);
    visit_selection_set(visitor, ctx, &field.node.selection_set);
    ctx.pop_type();

    visitor.exit_field(ctx, field);
}
