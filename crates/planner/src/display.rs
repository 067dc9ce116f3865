//! Stable, human-readable rendering of query plans, used by snapshots and
//! the CLI. The shape is fixed: two-space indentation, every child of a
//! container node followed by a comma, `__typename` first within a selection,
//! inline fragments after fields.

use std::fmt::{self, Write};

use parser::Positioned;
use value::{Name, Value};

use crate::{
    plan::{FetchNode, PlanNode, QueryPlan},
    types::{SelectionRef, SelectionRefSet},
};

impl fmt::Display for QueryPlan<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.node {
            Some(node) => {
                writeln!(f, "QueryPlan {{")?;
                write_node(f, node, 1)?;
                writeln!(f, ",")?;
                write!(f, "}}")
            }
            None => write!(f, "QueryPlan {{}}"),
        }
    }
}

impl fmt::Display for PlanNode<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_node(f, self, 0)
    }
}

fn pad(f: &mut fmt::Formatter<'_>, indent: usize) -> fmt::Result {
    write!(f, "{:width$}", "", width = indent * 2)
}

fn write_node(f: &mut fmt::Formatter<'_>, node: &PlanNode<'_>, indent: usize) -> fmt::Result {
    match node {
        PlanNode::Sequence(sequence) => {
            pad(f, indent)?;
            writeln!(f, "Sequence {{")?;
            for node in &sequence.nodes {
                write_node(f, node, indent + 1)?;
                writeln!(f, ",")?;
            }
            pad(f, indent)?;
            write!(f, "}}")
        }
        PlanNode::Parallel(parallel) => {
            pad(f, indent)?;
            writeln!(f, "Parallel {{")?;
            for node in &parallel.nodes {
                write_node(f, node, indent + 1)?;
                writeln!(f, ",")?;
            }
            pad(f, indent)?;
            write!(f, "}}")
        }
        PlanNode::Flatten(flatten) => {
            pad(f, indent)?;
            writeln!(f, "Flatten(path: \"{}\") {{", flatten.path)?;
            write_node(f, &flatten.node, indent + 1)?;
            writeln!(f, ",")?;
            pad(f, indent)?;
            write!(f, "}}")
        }
        PlanNode::Fetch(fetch) => write_fetch(f, fetch, indent),
    }
}

fn write_fetch(f: &mut fmt::Formatter<'_>, fetch: &FetchNode<'_>, indent: usize) -> fmt::Result {
    pad(f, indent)?;
    writeln!(f, "Fetch(service: \"{}\") {{", fetch.service)?;

    if let Some(requires) = &fetch.requires {
        write_selection_block(f, requires, indent + 1)?;
        writeln!(f, " =>")?;
    }
    write_selection_block(f, &fetch.selection_set, indent + 1)?;
    writeln!(f)?;

    for fragment in &fetch.internal_fragments {
        pad(f, indent + 1)?;
        writeln!(f, "fragment {} on {} {{", fragment.name, fragment.type_condition)?;
        write_selections(f, &fragment.selection_set, indent + 2)?;
        pad(f, indent + 1)?;
        writeln!(f, "}}")?;
    }

    pad(f, indent)?;
    write!(f, "}}")
}

fn write_selection_block(f: &mut fmt::Formatter<'_>, set: &SelectionRefSet<'_>, indent: usize) -> fmt::Result {
    pad(f, indent)?;
    writeln!(f, "{{")?;
    write_selections(f, set, indent + 1)?;
    pad(f, indent)?;
    write!(f, "}}")
}

fn write_selections(f: &mut fmt::Formatter<'_>, set: &SelectionRefSet<'_>, indent: usize) -> fmt::Result {
    for selection in set.ordered() {
        match selection {
            SelectionRef::IntrospectionTypename => {
                pad(f, indent)?;
                writeln!(f, "__typename")?;
            }
            SelectionRef::FieldRef(field) => {
                pad(f, indent)?;
                if let Some(alias) = &field.field.alias {
                    write!(f, "{}: ", alias.node)?;
                }
                f.write_str(field.field.name.node.as_str())?;
                write_arguments(f, &field.field.arguments)?;
                for directive in &field.field.directives {
                    write!(f, " @{}", directive.node.name.node)?;
                    write_arguments(f, &directive.node.arguments)?;
                }
                if field.selection_set.is_empty() {
                    writeln!(f)?;
                } else {
                    writeln!(f, " {{")?;
                    write_selections(f, &field.selection_set, indent + 1)?;
                    pad(f, indent)?;
                    writeln!(f, "}}")?;
                }
            }
            SelectionRef::RequiredField(field) => {
                pad(f, indent)?;
                f.write_str(field.name.as_str())?;
                if field.selection_set.is_empty() {
                    writeln!(f)?;
                } else {
                    writeln!(f, " {{")?;
                    write_selections(f, &field.selection_set, indent + 1)?;
                    pad(f, indent)?;
                    writeln!(f, "}}")?;
                }
            }
            SelectionRef::InlineFragment(fragment) => {
                pad(f, indent)?;
                writeln!(f, "... on {} {{", fragment.type_condition)?;
                write_selections(f, &fragment.selection_set, indent + 1)?;
                pad(f, indent)?;
                writeln!(f, "}}")?;
            }
            SelectionRef::FragmentSpread(name) => {
                pad(f, indent)?;
                writeln!(f, "...{}", name)?;
            }
        }
    }
    Ok(())
}

fn write_arguments(f: &mut fmt::Formatter<'_>, arguments: &[(Positioned<Name>, Positioned<Value>)]) -> fmt::Result {
    if arguments.is_empty() {
        return Ok(());
    }
    f.write_char('(')?;
    for (idx, (name, value)) in arguments.iter().enumerate() {
        if idx > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{}: {}", name.node, value.node)?;
    }
    f.write_char(')')
}
