use std::collections::HashMap;
use std::ops::{Index, IndexMut};

use fusegraph_schema::{KeyFields, MetaType};
use indexmap::IndexMap;
use parser::types::Field;
use value::Name;

use crate::{plan::ResponsePath, types::SelectionRefSet};

pub(crate) type GroupId = usize;

/// A fetch in the making: everything bound for one service at one response
/// path under one parent type.
///
/// Groups live in an arena and refer to each other by id, so the dependency
/// graph between them can be cyclic-shaped data without self-referential
/// ownership; merging two hops into one group is a map lookup.
pub(crate) struct FetchGroup<'a> {
    pub service: &'a str,
    pub parent_type: &'a MetaType,
    pub path: ResponsePath<'a>,
    /// Selections waiting to be classified under this group.
    pub pending: Vec<PendingSelection<'a>>,
    /// Outgoing selections, filled when the group is built.
    pub selections: SelectionRefSet<'a>,
    /// Representation shape this group needs; empty for root groups.
    pub requires: SelectionRefSet<'a>,
    /// Groups whose representations are gathered from this group's output.
    pub dependents: Vec<GroupId>,
    /// Sibling groups whose output this group's representation references.
    pub after: Vec<GroupId>,
}

pub(crate) enum PendingSelection<'a> {
    /// A field from the operation document.
    Field(&'a Field),
    /// A `@requires` field routed here because the parent's service cannot
    /// resolve it.
    Required(&'a Name, &'a KeyFields),
}

#[derive(Default)]
pub(crate) struct GroupArena<'a> {
    groups: Vec<FetchGroup<'a>>,
    index: HashMap<(&'a str, &'a str, String), GroupId>,
}

impl<'a> GroupArena<'a> {
    #[inline]
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    /// A new root group; root groups are keyed by their caller, not the
    /// arena index.
    pub fn root_group(&mut self, service: &'a str, parent_type: &'a MetaType) -> GroupId {
        self.insert(FetchGroup {
            service,
            parent_type,
            path: ResponsePath::default(),
            pending: Vec::new(),
            selections: SelectionRefSet::default(),
            requires: SelectionRefSet::default(),
            dependents: Vec::new(),
            after: Vec::new(),
        })
    }

    /// Find or create the dependent group for `(service, parent type, path)`.
    /// Two hops to the same coordinates land in the same group, which is what
    /// merges their selections and representation requirements.
    pub fn dependent_group(
        &mut self,
        parent: GroupId,
        service: &'a str,
        parent_type: &'a MetaType,
        path: ResponsePath<'a>,
    ) -> GroupId {
        let key = (service, parent_type.name.as_str(), path.to_string());
        if let Some(&id) = self.index.get(&key) {
            return id;
        }

        let id = self.insert(FetchGroup {
            service,
            parent_type,
            path,
            pending: Vec::new(),
            selections: SelectionRefSet::default(),
            requires: SelectionRefSet::default(),
            dependents: Vec::new(),
            after: Vec::new(),
        });
        self.index.insert(key, id);
        self.groups[parent].dependents.push(id);
        id
    }

    fn insert(&mut self, group: FetchGroup<'a>) -> GroupId {
        let id = self.groups.len();
        self.groups.push(group);
        id
    }
}

impl<'a> Index<GroupId> for GroupArena<'a> {
    type Output = FetchGroup<'a>;

    fn index(&self, id: GroupId) -> &Self::Output {
        &self.groups[id]
    }
}

impl IndexMut<GroupId> for GroupArena<'_> {
    fn index_mut(&mut self, id: GroupId) -> &mut Self::Output {
        &mut self.groups[id]
    }
}

/// How top-level fields map onto root groups.
pub(crate) trait RootGroups<'a> {
    fn group_for(&mut self, arena: &mut GroupArena<'a>, service: &'a str, root_type: &'a MetaType) -> GroupId;

    fn into_ids(self) -> Vec<GroupId>;
}

/// Query roots: one group per service, siblings may run in parallel.
#[derive(Default)]
pub(crate) struct QueryRootGroups<'a> {
    groups: IndexMap<&'a str, GroupId>,
}

impl<'a> RootGroups<'a> for QueryRootGroups<'a> {
    fn group_for(&mut self, arena: &mut GroupArena<'a>, service: &'a str, root_type: &'a MetaType) -> GroupId {
        if let Some(&id) = self.groups.get(service) {
            return id;
        }
        let id = arena.root_group(service, root_type);
        self.groups.insert(service, id);
        id
    }

    fn into_ids(self) -> Vec<GroupId> {
        self.groups.into_values().collect()
    }
}

/// Mutation roots: source order is execution order, so a new group starts
/// whenever the owning service changes.
#[derive(Default)]
pub(crate) struct MutationRootGroups {
    groups: Vec<GroupId>,
}

impl<'a> RootGroups<'a> for MutationRootGroups {
    fn group_for(&mut self, arena: &mut GroupArena<'a>, service: &'a str, root_type: &'a MetaType) -> GroupId {
        match self.groups.last() {
            Some(&last) if arena[last].service == service => last,
            _ => {
                let id = arena.root_group(service, root_type);
                self.groups.push(id);
                id
            }
        }
    }

    fn into_ids(self) -> Vec<GroupId> {
        self.groups
    }
}
