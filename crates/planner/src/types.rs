use fusegraph_schema::KeyFields;
use parser::types::Field;
use value::Name;

/// One selection inside a planner-built selection set.
///
/// Selections either borrow a field straight from the operation document or
/// are synthesized by the planner: the `__typename` discriminator and the
/// key/`@requires` fields an entity hop needs. Fragment spreads only appear
/// after factorization replaced a hoisted sub-selection.
#[derive(Debug)]
pub enum SelectionRef<'a> {
    FieldRef(FieldRef<'a>),
    IntrospectionTypename,
    RequiredField(RequiredFieldRef<'a>),
    InlineFragment(InlineFragmentRef<'a>),
    FragmentSpread(String),
}

#[derive(Debug)]
pub struct FieldRef<'a> {
    pub field: &'a Field,
    pub selection_set: SelectionRefSet<'a>,
}

#[derive(Debug)]
pub struct RequiredFieldRef<'a> {
    pub name: &'a Name,
    pub selection_set: SelectionRefSet<'a>,
}

#[derive(Debug)]
pub struct InlineFragmentRef<'a> {
    pub type_condition: &'a str,
    pub selection_set: SelectionRefSet<'a>,
}

/// An ordered selection set with union-merge semantics.
#[derive(Debug, Default)]
pub struct SelectionRefSet<'a>(pub Vec<SelectionRef<'a>>);

impl<'a> SelectionRefSet<'a> {
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Add a field from the operation, merging with a previous selection of
    /// the same response key. An unaliased `__typename` collapses into the
    /// planner-injected marker.
    pub fn push_field(&mut self, field: &'a Field, selection_set: SelectionRefSet<'a>) {
        if field.alias.is_none() && field.name.node.as_str() == "__typename" {
            self.add_typename();
            return;
        }

        let key = field.response_key().node.as_str();
        if let Some(existing) = self.0.iter_mut().find_map(|selection| match selection {
            SelectionRef::FieldRef(existing) if existing.field.response_key().node.as_str() == key => Some(existing),
            _ => None,
        }) {
            existing.selection_set.merge(selection_set);
            return;
        }

        self.0.push(SelectionRef::FieldRef(FieldRef { field, selection_set }));
    }

    pub fn add_typename(&mut self) {
        if !self
            .0
            .iter()
            .any(|selection| matches!(selection, SelectionRef::IntrospectionTypename))
        {
            self.0.push(SelectionRef::IntrospectionTypename);
        }
    }

    /// Add one planner-injected field, deduplicated against both previously
    /// injected fields and equivalent fields the operation already selects.
    pub fn add_required_field(&mut self, name: &'a Name, children: &'a KeyFields) {
        if children.is_empty()
            && self.0.iter().any(|selection| {
                matches!(selection, SelectionRef::FieldRef(existing)
                    if existing.field.alias.is_none()
                        && existing.field.arguments.is_empty()
                        && existing.field.name.node.as_str() == name.as_str())
            })
        {
            return;
        }

        if let Some(existing) = self.0.iter_mut().find_map(|selection| match selection {
            SelectionRef::RequiredField(existing) if existing.name.as_str() == name.as_str() => Some(existing),
            _ => None,
        }) {
            existing.selection_set.add_key_fields(children);
            return;
        }

        self.0.push(SelectionRef::RequiredField(RequiredFieldRef {
            name,
            selection_set: required_set(children),
        }));
    }

    /// Add a whole key field set, deduplicated field by field.
    pub fn add_key_fields(&mut self, fields: &'a KeyFields) {
        for (name, children) in fields.iter() {
            self.add_required_field(name, children);
        }
    }

    /// Whether every field of `fields` is already selected here.
    pub fn covers_key_fields(&self, fields: &KeyFields) -> bool {
        fields.iter().all(|(name, children)| {
            self.0.iter().any(|selection| match selection {
                SelectionRef::RequiredField(existing) if existing.name.as_str() == name.as_str() => {
                    children.is_empty() || existing.selection_set.covers_key_fields(children)
                }
                SelectionRef::FieldRef(existing)
                    if existing.field.alias.is_none() && existing.field.name.node.as_str() == name.as_str() =>
                {
                    children.is_empty()
                }
                _ => false,
            })
        })
    }

    /// Add an inline fragment branch, merging with an existing branch on the
    /// same type condition.
    pub fn push_inline_fragment(&mut self, type_condition: &'a str, selection_set: SelectionRefSet<'a>) {
        if let Some(existing) = self.0.iter_mut().find_map(|selection| match selection {
            SelectionRef::InlineFragment(existing) if existing.type_condition == type_condition => Some(existing),
            _ => None,
        }) {
            existing.selection_set.merge(selection_set);
            return;
        }

        self.0.push(SelectionRef::InlineFragment(InlineFragmentRef {
            type_condition,
            selection_set,
        }));
    }

    /// Union-merge another set into this one.
    pub fn merge(&mut self, other: SelectionRefSet<'a>) {
        for selection in other.0 {
            match selection {
                SelectionRef::FieldRef(field) => self.push_field(field.field, field.selection_set),
                SelectionRef::IntrospectionTypename => self.add_typename(),
                SelectionRef::RequiredField(field) => self.merge_required(field),
                SelectionRef::InlineFragment(fragment) => {
                    self.push_inline_fragment(fragment.type_condition, fragment.selection_set)
                }
                SelectionRef::FragmentSpread(name) => {
                    if !self
                        .0
                        .iter()
                        .any(|selection| matches!(selection, SelectionRef::FragmentSpread(existing) if *existing == name))
                    {
                        self.0.push(SelectionRef::FragmentSpread(name));
                    }
                }
            }
        }
    }

    fn merge_required(&mut self, field: RequiredFieldRef<'a>) {
        if let Some(existing) = self.0.iter_mut().find_map(|selection| match selection {
            SelectionRef::RequiredField(existing) if existing.name.as_str() == field.name.as_str() => Some(existing),
            _ => None,
        }) {
            existing.selection_set.merge(field.selection_set);
            return;
        }
        self.0.push(SelectionRef::RequiredField(field));
    }

    /// Selections in canonical output order: `__typename` first, fields in
    /// insertion order, inline fragments last.
    pub fn ordered(&self) -> impl Iterator<Item = &SelectionRef<'a>> {
        let typename = self
            .0
            .iter()
            .filter(|selection| matches!(selection, SelectionRef::IntrospectionTypename));
        let fields = self.0.iter().filter(|selection| {
            matches!(
                selection,
                SelectionRef::FieldRef(_) | SelectionRef::RequiredField(_) | SelectionRef::FragmentSpread(_)
            )
        });
        let fragments = self
            .0
            .iter()
            .filter(|selection| matches!(selection, SelectionRef::InlineFragment(_)));
        typename.chain(fields).chain(fragments)
    }

    /// Number of leaf selections in the whole subtree.
    pub fn leaf_count(&self) -> usize {
        self.0
            .iter()
            .map(|selection| match selection {
                SelectionRef::IntrospectionTypename | SelectionRef::FragmentSpread(_) => 1,
                SelectionRef::FieldRef(field) => {
                    if field.selection_set.is_empty() {
                        1
                    } else {
                        field.selection_set.leaf_count()
                    }
                }
                SelectionRef::RequiredField(field) => {
                    if field.selection_set.is_empty() {
                        1
                    } else {
                        field.selection_set.leaf_count()
                    }
                }
                SelectionRef::InlineFragment(fragment) => fragment.selection_set.leaf_count(),
            })
            .sum()
    }

    pub fn contains_inline_fragment(&self) -> bool {
        self.0
            .iter()
            .any(|selection| matches!(selection, SelectionRef::InlineFragment(_)))
    }
}

fn required_set<'a>(fields: &'a KeyFields) -> SelectionRefSet<'a> {
    SelectionRefSet(
        fields
            .iter()
            .map(|(name, children)| {
                SelectionRef::RequiredField(RequiredFieldRef {
                    name,
                    selection_set: required_set(children),
                })
            })
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use parser::types::{DocumentOperations, ExecutableDocument, Selection};

    use super::*;

    fn top_fields(document: &ExecutableDocument) -> Vec<&Field> {
        let operation = match &document.operations {
            DocumentOperations::Single(operation) => operation,
            DocumentOperations::Multiple(_) => unreachable!(),
        };
        operation
            .node
            .selection_set
            .node
            .items
            .iter()
            .filter_map(|selection| match &selection.node {
                Selection::Field(field) => Some(&field.node),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn same_response_key_merges() {
        let document = parser::parse_query("{ me { name } me { id } }").unwrap();
        let mut set = SelectionRefSet::default();

        for me in top_fields(&document) {
            let mut sub = SelectionRefSet::default();
            for item in &me.selection_set.node.items {
                if let Selection::Field(field) = &item.node {
                    sub.push_field(&field.node, SelectionRefSet::default());
                }
            }
            set.push_field(me, sub);
        }

        assert_eq!(set.len(), 1);
        match &set.0[0] {
            SelectionRef::FieldRef(me) => assert_eq!(me.selection_set.len(), 2),
            _ => panic!("expected a single merged field"),
        }
    }

    #[test]
    fn queried_fields_cover_injected_keys() {
        let schema = fusegraph_schema::ComposedSchema::parse(
            r#"
            schema { query: Query }
            type Query { user: User @resolve(service: "accounts") }
            type User @owner(service: "accounts") @key(fields: "id", service: "accounts") {
                id: ID!
            }
            "#,
        )
        .unwrap();
        let key = &schema.type_by_name("User").unwrap().keys_for_service("accounts")[0];

        let document = parser::parse_query("{ id }").unwrap();
        let mut set = SelectionRefSet::default();
        set.push_field(top_fields(&document)[0], SelectionRefSet::default());

        set.add_typename();
        set.add_key_fields(key);

        // the queried `id` satisfies the key, so nothing new is injected
        assert_eq!(set.len(), 2);
        assert!(set.covers_key_fields(key));
    }
}
