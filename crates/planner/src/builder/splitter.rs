use fusegraph_schema::{ComposedSchema, KeyFields, MetaField, MetaType, TypeExt};
use parser::types::{Field, OperationType, Selection, SelectionSet};

use super::groups::{GroupArena, GroupId, MutationRootGroups, PendingSelection, QueryRootGroups, RootGroups};
use crate::{
    context::OperationContext,
    error::PlanError,
    plan::{PathSegment, ResponsePath},
    types::SelectionRefSet,
};

/// Recursive selection-set splitter.
///
/// Walks the operation, keeps every field in the group of the service that
/// can resolve it, and cuts an entity hop wherever ownership changes: the
/// current group gains `__typename` plus a key usable by its service, and a
/// dependent group keyed by `(service, parent type, path)` picks the field
/// up. Groups are built in arena order; building one group may append more.
pub(crate) struct Splitter<'a> {
    ctx: &'a OperationContext<'a>,
    arena: GroupArena<'a>,
}

impl<'a> Splitter<'a> {
    pub fn new(ctx: &'a OperationContext<'a>) -> Self {
        Self {
            ctx,
            arena: GroupArena::default(),
        }
    }

    pub fn into_arena(self) -> GroupArena<'a> {
        self.arena
    }

    pub fn split_roots(&mut self) -> Result<Vec<GroupId>, PlanError> {
        match self.ctx.kind {
            OperationType::Mutation => self.split_root_fields(MutationRootGroups::default()),
            _ => self.split_root_fields(QueryRootGroups::default()),
        }
    }

    fn split_root_fields<G: RootGroups<'a>>(&mut self, mut groups: G) -> Result<Vec<GroupId>, PlanError> {
        let root_type = self.ctx.root_type;

        let mut fields = Vec::new();
        collect_root_fields(&self.ctx.selection_set, root_type, &mut fields);

        // Meta fields are answerable by any service: they stay with the group
        // of the preceding field, or move into the first group that exists.
        let mut leading_meta = Vec::new();
        let mut last = None;

        for field in fields {
            let name = field.name.node.as_str();
            if ComposedSchema::is_meta_field(name) {
                match last {
                    Some(group) => self.arena[group].pending.push(PendingSelection::Field(field)),
                    None => leading_meta.push(field),
                }
                continue;
            }

            let field_definition = match root_type.field_by_name(name) {
                Some(field_definition) => field_definition,
                None => continue,
            };
            let service = match field_definition.service.as_deref() {
                Some(service) => service,
                None => continue,
            };

            let group = groups.group_for(&mut self.arena, service, root_type);
            self.arena[group].pending.push(PendingSelection::Field(field));
            last = Some(group);
        }

        let ids = groups.into_ids();
        if let Some(&first) = ids.first() {
            for (idx, field) in leading_meta.into_iter().enumerate() {
                self.arena[first].pending.insert(idx, PendingSelection::Field(field));
            }
        }
        Ok(ids)
    }

    /// Build every group's selection set, in creation order. Hops discovered
    /// while building append new groups past the cursor.
    pub fn build_groups(&mut self) -> Result<(), PlanError> {
        let mut next = 0;
        while next < self.arena.len() {
            let id = next;
            next += 1;

            let pending = std::mem::take(&mut self.arena[id].pending);
            let service = self.arena[id].service;
            let parent_type = self.arena[id].parent_type;
            let mut path = self.arena[id].path.clone();
            let mut out = std::mem::take(&mut self.arena[id].selections);

            for selection in pending {
                match selection {
                    PendingSelection::Field(field) => {
                        self.build_field(id, service, parent_type, &mut path, None, &mut out, field)?
                    }
                    PendingSelection::Required(name, children) => out.add_required_field(name, children),
                }
            }

            self.arena[id].selections = out;
        }
        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    fn build_field(
        &mut self,
        group: GroupId,
        service: &'a str,
        parent_type: &'a MetaType,
        path: &mut ResponsePath<'a>,
        provides: Option<&'a KeyFields>,
        out: &mut SelectionRefSet<'a>,
        field: &'a Field,
    ) -> Result<(), PlanError> {
        let name = field.name.node.as_str();

        if name == "__typename" && field.alias.is_none() {
            out.add_typename();
            return Ok(());
        }

        let field_definition = match parent_type.field_by_name(name) {
            Some(field_definition) => field_definition,
            // Validation already rejected unknown fields.
            None => return Ok(()),
        };

        let provided = provides.and_then(|fields| fields.get(name));
        let owner = if provided.is_some() {
            service
        } else {
            field_owner(parent_type, field_definition).unwrap_or(service)
        };

        // A field with `@requires` stays put only when the group's own
        // representation already carries the required fields.
        let requires_satisfied = match &field_definition.requires {
            Some(requires) => self.arena[group].requires.covers_key_fields(requires),
            None => true,
        };

        if owner == service && requires_satisfied {
            return self.build_field_in_group(group, service, parent_type, path, provided, out, field, field_definition);
        }

        // The field leaves the current service, either because another
        // service owns it or because its `@requires` fields must arrive
        // first. The parent entity is re-fetched from `owner` at this path.
        let key = self.select_key(parent_type, service, owner)?;
        let dependent = self.arena.dependent_group(group, owner, parent_type, path.clone());

        if dependent == group {
            // The hop lands on this very group; fold the requirement into its
            // representation instead of spawning a self-dependency.
            if let Some(requires) = &field_definition.requires {
                self.arena[group].requires.add_key_fields(requires);
            }
            return self.build_field_in_group(group, service, parent_type, path, provided, out, field, field_definition);
        }

        out.add_typename();
        out.add_key_fields(key);
        self.arena[dependent].requires.add_typename();
        self.arena[dependent].requires.add_key_fields(key);

        if let Some(requires) = &field_definition.requires {
            self.add_required_fields(group, dependent, service, parent_type, path, out, requires)?;
        }

        self.arena[dependent].pending.push(PendingSelection::Field(field));
        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    fn build_field_in_group(
        &mut self,
        group: GroupId,
        service: &'a str,
        parent_type: &'a MetaType,
        path: &mut ResponsePath<'a>,
        provided: Option<&'a KeyFields>,
        out: &mut SelectionRefSet<'a>,
        field: &'a Field,
        field_definition: &'a MetaField,
    ) -> Result<(), PlanError> {
        let child_provides = match provided {
            Some(children) if !children.is_empty() => Some(children),
            Some(_) => None,
            None => field_definition.provides.as_ref(),
        };

        path.push(PathSegment {
            name: field.response_key().node.as_str(),
            is_list: field_definition.ty.is_list(),
        });
        let mut sub = SelectionRefSet::default();
        if !field.selection_set.node.items.is_empty() {
            if let Some(return_type) = self.ctx.schema.concrete_type(&field_definition.ty) {
                if return_type.is_abstract() {
                    self.build_abstract_selection_set(
                        group,
                        service,
                        return_type,
                        path,
                        child_provides,
                        &mut sub,
                        &field.selection_set.node,
                    )?;
                } else {
                    self.build_selection_set(
                        group,
                        service,
                        return_type,
                        path,
                        child_provides,
                        &mut sub,
                        &field.selection_set.node,
                    )?;
                }
            }
        }
        out.push_field(field, sub);
        path.pop();
        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    fn build_selection_set(
        &mut self,
        group: GroupId,
        service: &'a str,
        parent_type: &'a MetaType,
        path: &mut ResponsePath<'a>,
        provides: Option<&'a KeyFields>,
        out: &mut SelectionRefSet<'a>,
        selection_set: &'a SelectionSet,
    ) -> Result<(), PlanError> {
        for selection in &selection_set.items {
            match &selection.node {
                Selection::Field(field) => {
                    self.build_field(group, service, parent_type, path, provides, out, &field.node)?
                }
                Selection::InlineFragment(fragment) => {
                    let applies = match &fragment.node.type_condition {
                        Some(condition) => {
                            let on = condition.node.on.node.as_str();
                            on == parent_type.name.as_str()
                                || self
                                    .ctx
                                    .schema
                                    .type_by_name(on)
                                    .is_some_and(|ty| ty.is_possible_type(&parent_type.name))
                        }
                        None => true,
                    };
                    if applies {
                        self.build_selection_set(
                            group,
                            service,
                            parent_type,
                            path,
                            provides,
                            out,
                            &fragment.node.selection_set.node,
                        )?;
                    }
                }
                Selection::FragmentSpread(_) => {
                    // Spreads were inlined when the context was built.
                }
            }
        }
        Ok(())
    }

    /// Expand a selection under an interface or union into one branch per
    /// concrete member. Every branch classifies independently, so members
    /// with different field owners split into different groups; `__typename`
    /// always accompanies the branches.
    #[allow(clippy::too_many_arguments)]
    fn build_abstract_selection_set(
        &mut self,
        group: GroupId,
        service: &'a str,
        parent_type: &'a MetaType,
        path: &mut ResponsePath<'a>,
        provides: Option<&'a KeyFields>,
        out: &mut SelectionRefSet<'a>,
        selection_set: &'a SelectionSet,
    ) -> Result<(), PlanError> {
        out.add_typename();

        for possible_type in &parent_type.possible_types {
            let member = match self.ctx.schema.type_by_name(possible_type) {
                Some(member) => member,
                None => continue,
            };
            let mut branch = SelectionRefSet::default();
            self.build_member_selections(group, service, member, path, provides, &mut branch, selection_set)?;
            if !branch.is_empty() {
                out.push_inline_fragment(member.name.as_str(), branch);
            }
        }
        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    fn build_member_selections(
        &mut self,
        group: GroupId,
        service: &'a str,
        member: &'a MetaType,
        path: &mut ResponsePath<'a>,
        provides: Option<&'a KeyFields>,
        out: &mut SelectionRefSet<'a>,
        selection_set: &'a SelectionSet,
    ) -> Result<(), PlanError> {
        for selection in &selection_set.items {
            match &selection.node {
                Selection::Field(field) => {
                    // The shared `__typename` already sits next to the
                    // branches.
                    if field.node.name.node.as_str() == "__typename" && field.node.alias.is_none() {
                        continue;
                    }
                    self.build_field(group, service, member, path, provides, out, &field.node)?;
                }
                Selection::InlineFragment(fragment) => {
                    let applies = match &fragment.node.type_condition {
                        Some(condition) => {
                            let on = condition.node.on.node.as_str();
                            on == member.name.as_str()
                                || self
                                    .ctx
                                    .schema
                                    .type_by_name(on)
                                    .is_some_and(|ty| ty.is_abstract() && ty.is_possible_type(&member.name))
                        }
                        None => true,
                    };
                    if applies {
                        self.build_member_selections(
                            group,
                            service,
                            member,
                            path,
                            provides,
                            out,
                            &fragment.node.selection_set.node,
                        )?;
                    }
                }
                Selection::FragmentSpread(_) => {}
            }
        }
        Ok(())
    }

    /// Merge `@requires` fields into the parent group so they are fetched
    /// before `dependent` runs, and mirror them into the representation
    /// `dependent` receives. A required field the parent's service cannot
    /// resolve is routed to a further group that `dependent` then waits on.
    #[allow(clippy::too_many_arguments)]
    fn add_required_fields(
        &mut self,
        group: GroupId,
        dependent: GroupId,
        service: &'a str,
        parent_type: &'a MetaType,
        path: &ResponsePath<'a>,
        out: &mut SelectionRefSet<'a>,
        requires: &'a KeyFields,
    ) -> Result<(), PlanError> {
        for (name, children) in requires.iter() {
            self.arena[dependent].requires.add_required_field(name, children);

            let field_definition = parent_type
                .field_by_name(name)
                .ok_or(PlanError::Internal("'@requires' names a field missing from its type"))?;
            let owner = field_owner(parent_type, field_definition).unwrap_or(service);

            if owner == service {
                out.add_required_field(name, children);
                continue;
            }

            let key = self.select_key(parent_type, service, owner)?;
            let supplier = self.arena.dependent_group(group, owner, parent_type, path.clone());
            out.add_typename();
            out.add_key_fields(key);
            self.arena[supplier].requires.add_typename();
            self.arena[supplier].requires.add_key_fields(key);
            self.arena[supplier].pending.push(PendingSelection::Required(name, children));

            if supplier != dependent && !self.arena[dependent].after.contains(&supplier) {
                self.arena[dependent].after.push(supplier);
            }
        }
        Ok(())
    }

    /// Pick the key used to re-fetch `parent_type` from `target`: the first
    /// declaration-order key among those `target` declares whose fields the
    /// current service can produce, falling back to any declared key.
    fn select_key(&self, parent_type: &'a MetaType, service: &str, target: &str) -> Result<&'a KeyFields, PlanError> {
        let declared = parent_type.keys_for_service(target);
        let candidates: Vec<&'a KeyFields> = if declared.is_empty() {
            parent_type.keys.values().flatten().collect()
        } else {
            declared.iter().collect()
        };

        candidates
            .into_iter()
            .find(|key| self.key_resolvable_by(parent_type, key, service))
            .ok_or_else(|| PlanError::UnsatisfiableKey {
                type_name: parent_type.name.to_string(),
                service: service.to_string(),
                target: target.to_string(),
            })
    }

    fn key_resolvable_by(&self, ty: &MetaType, key: &KeyFields, service: &str) -> bool {
        key.iter().all(|(name, children)| match ty.field_by_name(name) {
            Some(field) => {
                let resolvable = ty.is_key_field(name)
                    || field.service.as_deref() == Some(service)
                    || (field.service.is_none() && ty.owner.as_deref().map_or(true, |owner| owner == service));
                resolvable
                    && (children.is_empty()
                        || self
                            .ctx
                            .schema
                            .concrete_type(&field.ty)
                            .is_some_and(|field_type| self.key_resolvable_by(field_type, children, service)))
            }
            None => false,
        })
    }
}

/// The service resolving a field: an explicit per-field service wins, an
/// external field falls back to the type's owner, otherwise the type's owner
/// applies.
fn field_owner<'a>(parent_type: &'a MetaType, field: &'a MetaField) -> Option<&'a str> {
    if field.external {
        parent_type.owner.as_deref()
    } else {
        field.service.as_deref().or(parent_type.owner.as_deref())
    }
}

/// Top-level fields in source order, looking through inline fragments on the
/// root type.
fn collect_root_fields<'a>(selection_set: &'a SelectionSet, root_type: &MetaType, out: &mut Vec<&'a Field>) {
    for selection in &selection_set.items {
        match &selection.node {
            Selection::Field(field) => out.push(&field.node),
            Selection::InlineFragment(fragment) => {
                let applies = fragment
                    .node
                    .type_condition
                    .as_ref()
                    .map(|condition| condition.node.on.node.as_str() == root_type.name.as_str())
                    .unwrap_or(true);
                if applies {
                    collect_root_fields(&fragment.node.selection_set.node, root_type, out);
                }
            }
            Selection::FragmentSpread(_) => {}
        }
    }
}
