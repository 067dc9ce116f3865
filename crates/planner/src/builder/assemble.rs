use std::collections::HashSet;

use fusegraph_schema::ValueExt;
use indexmap::IndexSet;
use parser::types::OperationType;

use super::groups::{GroupArena, GroupId};
use crate::{
    context::OperationContext,
    error::PlanError,
    plan::{FetchNode, FlattenNode, PlanNode},
    types::{SelectionRef, SelectionRefSet},
};

/// Turn the group DAG into the plan tree: a fetch per group, `Flatten` around
/// non-root paths, dependents layered into `Sequence` of `Parallel` levels,
/// single-child collections collapsed.
pub(crate) fn assemble<'a>(
    ctx: &'a OperationContext<'a>,
    arena: &mut GroupArena<'a>,
    roots: Vec<GroupId>,
) -> Result<Option<PlanNode<'a>>, PlanError> {
    let mut nodes = Vec::with_capacity(roots.len());
    for id in roots {
        nodes.push(node_for_group(ctx, arena, id)?);
    }

    Ok(match ctx.kind {
        OperationType::Mutation => PlanNode::sequence(nodes),
        _ => PlanNode::parallel(nodes),
    })
}

fn node_for_group<'a>(
    ctx: &'a OperationContext<'a>,
    arena: &mut GroupArena<'a>,
    id: GroupId,
) -> Result<PlanNode<'a>, PlanError> {
    let selections = std::mem::take(&mut arena[id].selections);
    let requires = std::mem::take(&mut arena[id].requires);
    let service = arena[id].service;
    let parent_type = arena[id].parent_type;
    let path = arena[id].path.clone();
    let dependents = arena[id].dependents.clone();

    let variable_usages = collect_variable_usages(&selections);
    let variable_definitions = ctx
        .variable_definitions
        .iter()
        .filter(|definition| variable_usages.contains(definition.node.name.node.as_str()))
        .map(|definition| &definition.node)
        .collect();

    let fetch = if requires.is_empty() {
        FetchNode {
            service,
            entity_type: None,
            operation_kind: ctx.kind,
            variable_usages: variable_usages.into_iter().collect(),
            variable_definitions,
            requires: None,
            selection_set: selections,
            internal_fragments: Vec::new(),
        }
    } else {
        // An entity fetch selects on the entity type, and its representation
        // block mirrors that shape.
        let mut selection_set = SelectionRefSet::default();
        selection_set.push_inline_fragment(parent_type.name.as_str(), selections);
        let mut requires_set = SelectionRefSet::default();
        requires_set.push_inline_fragment(parent_type.name.as_str(), requires);

        FetchNode {
            service,
            entity_type: Some(parent_type.name.as_str()),
            operation_kind: OperationType::Query,
            variable_usages: variable_usages.into_iter().collect(),
            variable_definitions,
            requires: Some(requires_set),
            selection_set,
            internal_fragments: Vec::new(),
        }
    };

    let mut node = PlanNode::Fetch(fetch);
    if !path.is_empty() {
        node = PlanNode::Flatten(FlattenNode {
            path,
            node: Box::new(node),
        });
    }

    if dependents.is_empty() {
        return Ok(node);
    }

    let mut nodes = vec![node];
    for level in dependency_levels(arena, &dependents)? {
        let mut level_nodes = Vec::with_capacity(level.len());
        for dependent in level {
            level_nodes.push(node_for_group(ctx, arena, dependent)?);
        }
        if let Some(level_node) = PlanNode::parallel(level_nodes) {
            nodes.push(level_node);
        }
    }
    PlanNode::sequence(nodes).ok_or(PlanError::Internal("a group with dependents lost its own fetch"))
}

/// Layer sibling groups so that each level only depends on earlier levels.
fn dependency_levels(arena: &GroupArena<'_>, dependents: &[GroupId]) -> Result<Vec<Vec<GroupId>>, PlanError> {
    let mut remaining: Vec<GroupId> = dependents.to_vec();
    let mut done: HashSet<GroupId> = HashSet::new();
    let mut levels = Vec::new();

    while !remaining.is_empty() {
        let (ready, rest): (Vec<GroupId>, Vec<GroupId>) = remaining.into_iter().partition(|&id| {
            arena[id]
                .after
                .iter()
                .all(|dependency| done.contains(dependency) || !dependents.contains(dependency))
        });

        if ready.is_empty() {
            return Err(PlanError::Internal("cyclic dependency between fetch groups"));
        }
        done.extend(ready.iter().copied());
        levels.push(ready);
        remaining = rest;
    }

    Ok(levels)
}

/// One pass over a final fetch's selections, collecting variable names in
/// usage order.
fn collect_variable_usages<'a>(set: &SelectionRefSet<'a>) -> IndexSet<&'a str> {
    let mut usages = IndexSet::new();
    collect_rec(set, &mut usages);
    usages
}

fn collect_rec<'a>(set: &SelectionRefSet<'a>, usages: &mut IndexSet<&'a str>) {
    for selection in &set.0 {
        match selection {
            SelectionRef::FieldRef(field) => {
                for (_, value) in &field.field.arguments {
                    usages.extend(value.node.referenced_variables());
                }
                for directive in &field.field.directives {
                    for (_, value) in &directive.node.arguments {
                        usages.extend(value.node.referenced_variables());
                    }
                }
                collect_rec(&field.selection_set, usages);
            }
            SelectionRef::InlineFragment(fragment) => collect_rec(&fragment.selection_set, usages),
            SelectionRef::RequiredField(field) => collect_rec(&field.selection_set, usages),
            _ => {}
        }
    }
}
