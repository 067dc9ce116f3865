use fusegraph_planner::{build_query_plan, OperationContext, QueryPlanOptions};
use fusegraph_schema::ComposedSchema;
use pretty_assertions::assert_eq;

/// Factorization hoists the abstract product selection and the repeated
/// leaf-heavy sub-selections, numbering fragments depth-first across the
/// whole plan.
#[test]
fn fragments_are_numbered_across_fetches() {
    let schema = ComposedSchema::parse(include_str!("schema.graphql")).unwrap();
    let document = parser::parse_query("{ me { name } topProducts { name } }").unwrap();
    let ctx = OperationContext::build(&schema, &document, None).unwrap();
    let plan = build_query_plan(&ctx, QueryPlanOptions {
        auto_fragmentization: true,
    })
    .unwrap();

    assert_eq!(
        plan.to_string(),
        "\
QueryPlan {
  Parallel {
    Fetch(service: \"accounts\") {
      {
        me {
          name
        }
      }
    },
    Sequence {
      Fetch(service: \"product\") {
        {
          topProducts {
            ...__QueryPlanFragment_1__
          }
        }
        fragment __QueryPlanFragment_0__ on Book {
          __typename
          isbn
        }
        fragment __QueryPlanFragment_1__ on Product {
          __typename
          ... on Book {
            ...__QueryPlanFragment_0__
          }
          ... on Furniture {
            name
          }
        }
      },
      Flatten(path: \"topProducts.@\") {
        Fetch(service: \"books\") {
          {
            ... on Book {
              __typename
              isbn
            }
          } =>
          {
            ... on Book {
              ...__QueryPlanFragment_2__
            }
          }
          fragment __QueryPlanFragment_2__ on Book {
            title
            year
          }
        },
      },
      Flatten(path: \"topProducts.@\") {
        Fetch(service: \"product\") {
          {
            ... on Book {
              __typename
              isbn
              title
              year
            }
          } =>
          {
            ... on Book {
              name
            }
          }
        },
      },
    },
  },
}"
    );
}

/// The same sub-selection at two sites within one fetch shares one fragment.
#[test]
fn repeated_sub_selections_share_a_fragment() {
    let schema = ComposedSchema::parse(include_str!("schema.graphql")).unwrap();
    let document = parser::parse_query("{ topReviews { author { username } product { __typename } } }").unwrap();
    let ctx = OperationContext::build(&schema, &document, None).unwrap();
    let plan = build_query_plan(&ctx, QueryPlanOptions {
        auto_fragmentization: true,
    })
    .unwrap();

    let text = plan.to_string();
    let spreads = text.matches("...__QueryPlanFragment_0__").count();
    let definitions = text.matches("fragment __QueryPlanFragment_0__").count();
    assert_eq!(definitions, 1);
    assert!(spreads >= 1, "hoisted fragment must be spread at least once:\n{text}");
}
