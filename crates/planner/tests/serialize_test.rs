use fusegraph_planner::{build_query_plan, OperationContext, QueryPlanOptions};
use fusegraph_schema::ComposedSchema;
use pretty_assertions::assert_eq;
use serde_json::json;
use test_case::test_case;

fn plan_json(query: &str) -> serde_json::Value {
    let schema = ComposedSchema::parse(include_str!("schema.graphql")).unwrap();
    let document = parser::parse_query(query).unwrap();
    let ctx = OperationContext::build(&schema, &document, None).unwrap();
    let plan = build_query_plan(&ctx, QueryPlanOptions::default()).unwrap();
    serde_json::to_value(&plan).unwrap()
}

#[test]
fn entity_fetch_serializes_representation_query() {
    assert_eq!(
        plan_json("{ me { reviews { body } numberOfReviews } }"),
        json!({
            "node": {
                "type": "sequence",
                "nodes": [
                    {
                        "type": "fetch",
                        "service": "accounts",
                        "variableUsages": [],
                        "query": "{me{__typename id}}"
                    },
                    {
                        "type": "flatten",
                        "path": "me",
                        "node": {
                            "type": "fetch",
                            "service": "reviews",
                            "variableUsages": [],
                            "requires": "{...on User{__typename id}}",
                            "query": "query($representations:[_Any!]!){_entities(representations:$representations){...on User{reviews{body} numberOfReviews}}}"
                        }
                    }
                ]
            }
        })
    );
}

#[test]
fn variable_definitions_survive_into_the_fetch_query() {
    assert_eq!(
        plan_json("query($locale: String) { me { birthDate(locale: $locale) } }"),
        json!({
            "node": {
                "type": "fetch",
                "service": "accounts",
                "variableUsages": ["locale"],
                "query": "query($locale:String){me{birthDate(locale:$locale)}}"
            }
        })
    );
}

#[test_case("mutation { addReview(body: \"x\") { id } }", "mutation{addReview(body:\"x\"){id}}"; "mutation keyword kept")]
#[test_case("{ me { name } }", "{me{name}}"; "bare query body")]
fn root_fetch_query_text(query: &str, expected: &str) {
    let value = plan_json(query);
    assert_eq!(value["node"]["query"], json!(expected));
}

#[test]
fn empty_operation_serializes_null_node() {
    assert_eq!(plan_json("{ __typename }"), json!({ "node": null }));
}
