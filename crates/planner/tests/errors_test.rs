use fusegraph_planner::{build_query_plan, OperationContext, PlanError, QueryPlanOptions};
use fusegraph_schema::ComposedSchema;

#[test]
fn unreachable_entity_key_is_an_error() {
    // `banner` lives in another service but `Settings` declares no key, so
    // there is no representation to hop with.
    let schema = ComposedSchema::parse(
        r#"
        schema { query: Query }
        type Query {
            settings: Settings @resolve(service: "core")
        }
        type Settings @owner(service: "core") {
            theme: String
            banner: String @resolve(service: "branding")
        }
        "#,
    )
    .unwrap();

    let document = parser::parse_query("{ settings { banner } }").unwrap();
    let ctx = OperationContext::build(&schema, &document, None).unwrap();
    let err = build_query_plan(&ctx, QueryPlanOptions::default()).unwrap_err();

    assert!(matches!(err, PlanError::UnsatisfiableKey { .. }), "{err}");
}

#[test]
fn validation_failures_are_batched_before_planning() {
    let schema = ComposedSchema::parse(include_str!("schema.graphql")).unwrap();
    let document = parser::parse_query("{ me { nickname } oops }").unwrap();

    match OperationContext::build(&schema, &document, None) {
        Err(PlanError::Validation(errors)) => assert_eq!(errors.len(), 2),
        other => panic!("expected a validation batch, got {other:?}"),
    }
}
