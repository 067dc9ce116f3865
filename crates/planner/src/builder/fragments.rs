use std::collections::HashMap;

use fusegraph_schema::MetaType;

use crate::{
    context::OperationContext,
    plan::{FetchNode, InternalFragment, PlanNode},
    stringify,
    types::{SelectionRef, SelectionRefSet},
};

/// Hoist repeated or heavy sub-selections of every fetch into numbered
/// internal fragments.
///
/// The counter spans the whole plan: fetches are visited in pre-order,
/// selections depth-first, and the counter only advances when a new fragment
/// is emitted, which keeps the numbering dense and deterministic.
pub(crate) fn factorize<'a>(ctx: &OperationContext<'a>, node: &mut PlanNode<'a>) {
    let mut counter = 0usize;
    walk(ctx, node, &mut counter);
}

fn walk<'a>(ctx: &OperationContext<'a>, node: &mut PlanNode<'a>, counter: &mut usize) {
    match node {
        PlanNode::Sequence(sequence) => {
            for node in &mut sequence.nodes {
                walk(ctx, node, counter);
            }
        }
        PlanNode::Parallel(parallel) => {
            for node in &mut parallel.nodes {
                walk(ctx, node, counter);
            }
        }
        PlanNode::Flatten(flatten) => walk(ctx, &mut flatten.node, counter),
        PlanNode::Fetch(fetch) => factorize_fetch(ctx, fetch, counter),
    }
}

fn factorize_fetch<'a>(ctx: &OperationContext<'a>, fetch: &mut FetchNode<'a>, counter: &mut usize) {
    let root_type = match fetch.entity_type {
        Some(name) => ctx.schema.type_by_name(name),
        None => Some(ctx.root_type),
    };
    let root_type = match root_type {
        Some(root_type) => root_type,
        None => return,
    };

    let mut occurrences = HashMap::new();
    count_sets(ctx, root_type, &fetch.selection_set, &mut occurrences);

    let mut hoister = Hoister {
        ctx,
        counter,
        occurrences,
        fragments: Vec::new(),
        by_text: HashMap::new(),
    };
    hoister.rewrite_children(root_type, &mut fetch.selection_set);
    fetch.internal_fragments = hoister.fragments;
}

struct Hoister<'h, 'a> {
    ctx: &'h OperationContext<'a>,
    counter: &'h mut usize,
    /// How often each sub-selection (by pre-rewrite text) occurs in the fetch.
    occurrences: HashMap<String, usize>,
    fragments: Vec<InternalFragment<'a>>,
    /// Pre-rewrite text to fragment name, so identical sites share a name.
    by_text: HashMap<String, String>,
}

impl<'h, 'a> Hoister<'h, 'a> {
    /// Rewrite the sub-selections nested under `set` without touching `set`
    /// itself; the fetch's top-level selection is the operation body and
    /// never becomes a fragment.
    fn rewrite_children(&mut self, parent: &'a MetaType, set: &mut SelectionRefSet<'a>) {
        for selection in &mut set.0 {
            match selection {
                SelectionRef::FieldRef(field) => {
                    if field.selection_set.is_empty() {
                        continue;
                    }
                    let return_type = parent
                        .field_by_name(field.field.name.node.as_str())
                        .and_then(|definition| self.ctx.schema.concrete_type(&definition.ty));
                    if let Some(return_type) = return_type {
                        if return_type.is_composite() {
                            self.rewrite_one(return_type, &mut field.selection_set);
                        }
                    }
                }
                SelectionRef::InlineFragment(fragment) => {
                    if let Some(condition_type) = self.ctx.schema.type_by_name(fragment.type_condition) {
                        self.rewrite_one(condition_type, &mut fragment.selection_set);
                    }
                }
                _ => {}
            }
        }
    }

    fn rewrite_one(&mut self, ty: &'a MetaType, set: &mut SelectionRefSet<'a>) {
        let text = stringify::selection_set_text(set);
        self.rewrite_children(ty, set);

        if !self.eligible(set, &text) {
            return;
        }

        if let Some(name) = self.by_text.get(&text) {
            let name = name.clone();
            *set = SelectionRefSet(vec![SelectionRef::FragmentSpread(name)]);
            return;
        }

        let name = format!("__QueryPlanFragment_{}__", *self.counter);
        *self.counter += 1;
        self.by_text.insert(text, name.clone());

        let body = std::mem::take(set);
        self.fragments.push(InternalFragment {
            name: name.clone(),
            type_condition: ty.name.as_str(),
            selection_set: body,
        });
        set.0.push(SelectionRef::FragmentSpread(name));
    }

    /// A sub-selection is worth a fragment when it has more than one leaf,
    /// repeats within the fetch, or contains inline fragments.
    fn eligible(&self, set: &SelectionRefSet<'a>, text: &str) -> bool {
        if set.len() == 1 && matches!(set.0[0], SelectionRef::FragmentSpread(_)) {
            return false;
        }
        set.leaf_count() > 1
            || self.occurrences.get(text).copied().unwrap_or(0) >= 2
            || set.contains_inline_fragment()
    }
}

/// Pre-pass recording how often each nested sub-selection occurs, keyed by
/// its text before any rewriting.
fn count_sets<'a>(
    ctx: &OperationContext<'a>,
    parent: &'a MetaType,
    set: &SelectionRefSet<'a>,
    occurrences: &mut HashMap<String, usize>,
) {
    for selection in &set.0 {
        match selection {
            SelectionRef::FieldRef(field) => {
                if field.selection_set.is_empty() {
                    continue;
                }
                let return_type = parent
                    .field_by_name(field.field.name.node.as_str())
                    .and_then(|definition| ctx.schema.concrete_type(&definition.ty));
                if let Some(return_type) = return_type {
                    if return_type.is_composite() {
                        *occurrences
                            .entry(stringify::selection_set_text(&field.selection_set))
                            .or_default() += 1;
                        count_sets(ctx, return_type, &field.selection_set, occurrences);
                    }
                }
            }
            SelectionRef::InlineFragment(fragment) => {
                if let Some(condition_type) = ctx.schema.type_by_name(fragment.type_condition) {
                    *occurrences
                        .entry(stringify::selection_set_text(&fragment.selection_set))
                        .or_default() += 1;
                    count_sets(ctx, condition_type, &fragment.selection_set, occurrences);
                }
            }
            _ => {}
        }
    }
}
