use fusegraph_planner::{
    FetchNode,
    FieldRef,
    FlattenNode,
    InlineFragmentRef,
    PathSegment,
    PlanNode,
    QueryPlan,
    RequiredFieldRef,
    ResponsePath,
    SelectionRef,
    SelectionRefSet,
    SequenceNode,
};
use parser::types::{DocumentOperations, ExecutableDocument, Field, OperationType, Selection};
use pretty_assertions::assert_eq;
use value::Name;

fn operation_fields(document: &ExecutableDocument) -> Vec<&Field> {
    let operation = match &document.operations {
        DocumentOperations::Single(operation) => operation,
        DocumentOperations::Multiple(_) => panic!("expected a single operation"),
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

fn field_set<'a>(field: &'a Field, sub: SelectionRefSet<'a>) -> SelectionRefSet<'a> {
    SelectionRefSet(vec![SelectionRef::FieldRef(FieldRef {
        field,
        selection_set: sub,
    })])
}

fn root_fetch<'a>(service: &'a str, selection_set: SelectionRefSet<'a>) -> PlanNode<'a> {
    PlanNode::Fetch(FetchNode {
        service,
        entity_type: None,
        operation_kind: OperationType::Query,
        variable_usages: vec![],
        variable_definitions: vec![],
        requires: None,
        selection_set,
        internal_fragments: vec![],
    })
}

#[test]
fn simple_query_plan() {
    let document = parser::parse_query("{ me { name } }").unwrap();
    let me = operation_fields(&document)[0];
    let name = match &me.selection_set.node.items[0].node {
        Selection::Field(field) => &field.node,
        _ => panic!("expected a field"),
    };

    let fetch = || root_fetch("accounts", field_set(me, field_set(name, SelectionRefSet::default())));

    let plan = QueryPlan {
        node: Some(PlanNode::Sequence(SequenceNode {
            nodes: vec![fetch(), fetch()],
        })),
    };

    assert_eq!(
        plan.to_string(),
        "\
QueryPlan {
  Sequence {
    Fetch(service: \"accounts\") {
      {
        me {
          name
        }
      }
    },
    Fetch(service: \"accounts\") {
      {
        me {
          name
        }
      }
    },
  },
}"
    );
}

#[test]
fn entity_fetch_with_requires() {
    let document = parser::parse_query("{ me { name } }").unwrap();
    let me = operation_fields(&document)[0];

    let id = Name::new("id");
    let number_of_reviews = Name::new("numberOfReviews");

    fn representation(name: &Name) -> SelectionRefSet<'_> {
        SelectionRefSet(vec![SelectionRef::InlineFragment(InlineFragmentRef {
            type_condition: "User",
            selection_set: SelectionRefSet(vec![
                SelectionRef::IntrospectionTypename,
                SelectionRef::RequiredField(RequiredFieldRef {
                    name,
                    selection_set: SelectionRefSet::default(),
                }),
            ]),
        })])
    }

    let mut key_selection = SelectionRefSet::default();
    key_selection.add_typename();
    key_selection.0.push(SelectionRef::RequiredField(RequiredFieldRef {
        name: &id,
        selection_set: SelectionRefSet::default(),
    }));

    let mut path = ResponsePath::default();
    path.push(PathSegment {
        name: "me",
        is_list: false,
    });

    let plan = QueryPlan {
        node: Some(PlanNode::Sequence(SequenceNode {
            nodes: vec![
                root_fetch("accounts", field_set(me, key_selection)),
                PlanNode::Flatten(FlattenNode {
                    path,
                    node: Box::new(PlanNode::Fetch(FetchNode {
                        service: "reviews",
                        entity_type: Some("User"),
                        operation_kind: OperationType::Query,
                        variable_usages: vec![],
                        variable_definitions: vec![],
                        requires: Some(representation(&id)),
                        selection_set: representation(&number_of_reviews),
                        internal_fragments: vec![],
                    })),
                }),
            ],
        })),
    };

    assert_eq!(
        plan.to_string(),
        "\
QueryPlan {
  Sequence {
    Fetch(service: \"accounts\") {
      {
        me {
          __typename
          id
        }
      }
    },
    Flatten(path: \"me\") {
      Fetch(service: \"reviews\") {
        {
          ... on User {
            __typename
            id
          }
        } =>
        {
          ... on User {
            __typename
            numberOfReviews
          }
        }
      },
    },
  },
}"
    );
}

#[test]
fn empty_plan() {
    let plan = QueryPlan { node: None };
    assert_eq!(plan.to_string(), "QueryPlan {}");
}
