//! Compact GraphQL text generation: the `query` each fetch sends downstream
//! and the single-line selection form used in the serialized plan.

use std::fmt::Write;

use parser::{
    types::{OperationType, VariableDefinition},
    Positioned,
};
use value::{Name, Value};

use crate::{
    plan::FetchNode,
    types::{SelectionRef, SelectionRefSet},
};

pub(crate) fn selection_set_text(set: &SelectionRefSet<'_>) -> String {
    let mut text = String::new();
    write_selection_set(set, &mut text);
    text
}

/// The executable document the executor sends for a fetch. Entity fetches are
/// wrapped in the `_entities` protocol; internal fragments are appended after
/// the operation.
pub(crate) fn fetch_query(fetch: &FetchNode<'_>) -> String {
    let mut selections = String::new();
    write_selection_set(&fetch.selection_set, &mut selections);

    let mut query = String::new();
    if fetch.entity_type.is_some() {
        query.push_str("query($representations:[_Any!]!");
        for variable_definition in &fetch.variable_definitions {
            query.push(',');
            write_variable_definition(variable_definition, &mut query);
        }
        query.push(')');
        query.push_str("{_entities(representations:$representations)");
        query.push_str(&selections);
        query.push('}');
    } else {
        let keyword = match fetch.operation_kind {
            OperationType::Query => "query",
            OperationType::Mutation => "mutation",
            OperationType::Subscription => "subscription",
        };
        if fetch.variable_definitions.is_empty() {
            if fetch.operation_kind != OperationType::Query {
                query.push_str(keyword);
            }
        } else {
            query.push_str(keyword);
            query.push('(');
            for (idx, variable_definition) in fetch.variable_definitions.iter().enumerate() {
                if idx > 0 {
                    query.push(',');
                }
                write_variable_definition(variable_definition, &mut query);
            }
            query.push(')');
        }
        query.push_str(&selections);
    }

    for fragment in &fetch.internal_fragments {
        let _ = write!(query, " fragment {} on {}", fragment.name, fragment.type_condition);
        write_selection_set(&fragment.selection_set, &mut query);
    }

    query
}

fn write_variable_definition(variable_definition: &VariableDefinition, out: &mut String) {
    let _ = write!(out, "${}:{}", variable_definition.name.node, variable_definition.var_type.node);
    if let Some(default_value) = &variable_definition.default_value {
        let _ = write!(out, "={}", default_value.node);
    }
}

fn write_selection_set(set: &SelectionRefSet<'_>, out: &mut String) {
    out.push('{');
    for (idx, selection) in set.ordered().enumerate() {
        if idx > 0 {
            out.push(' ');
        }
        match selection {
            SelectionRef::IntrospectionTypename => out.push_str("__typename"),
            SelectionRef::FieldRef(field) => {
                if let Some(alias) = &field.field.alias {
                    let _ = write!(out, "{}:", alias.node);
                }
                out.push_str(field.field.name.node.as_str());
                write_arguments(&field.field.arguments, out);
                for directive in &field.field.directives {
                    let _ = write!(out, " @{}", directive.node.name.node);
                    write_arguments(&directive.node.arguments, out);
                }
                if !field.selection_set.is_empty() {
                    write_selection_set(&field.selection_set, out);
                }
            }
            SelectionRef::RequiredField(field) => {
                out.push_str(field.name.as_str());
                if !field.selection_set.is_empty() {
                    write_selection_set(&field.selection_set, out);
                }
            }
            SelectionRef::InlineFragment(fragment) => {
                let _ = write!(out, "...on {}", fragment.type_condition);
                write_selection_set(&fragment.selection_set, out);
            }
            SelectionRef::FragmentSpread(name) => {
                let _ = write!(out, "...{}", name);
            }
        }
    }
    out.push('}');
}

fn write_arguments(arguments: &[(Positioned<Name>, Positioned<Value>)], out: &mut String) {
    if arguments.is_empty() {
        return;
    }
    out.push('(');
    for (idx, (name, value)) in arguments.iter().enumerate() {
        if idx > 0 {
            out.push(',');
        }
        let _ = write!(out, "{}:{}", name.node, value.node);
    }
    out.push(')');
}
