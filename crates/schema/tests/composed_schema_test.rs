use fusegraph_schema::{ComposedSchema, SchemaError, SchemaIssue, TypeKind};
use pretty_assertions::assert_eq;

const SDL: &str = r#"
schema {
    query: Query
}

type Query {
    me: User @resolve(service: "accounts")
    topProducts: [Product] @resolve(service: "product")
}

type User
    @owner(service: "accounts")
    @key(fields: "id", service: "accounts")
    @key(fields: "id", service: "reviews")
{
    id: ID!
    name: String
    reviews: [Review] @resolve(service: "reviews")
    goodDescription: Boolean @resolve(service: "reviews") @requires(fields: "metadata { description }")
    metadata: Metadata
}

type Metadata {
    description: String
}

type Review @owner(service: "reviews") @key(fields: "id", service: "reviews") {
    id: ID!
    body: String
    author: User @provides(fields: "name")
}

interface Product @owner(service: "product") {
    name: String
}

type Furniture implements Product @owner(service: "product") @key(fields: "upc", service: "product") {
    upc: String!
    name: String @external
}
"#;

#[test]
fn federation_metadata_is_extracted() {
    let schema = ComposedSchema::parse(SDL).unwrap();

    let user = schema.type_by_name("User").unwrap();
    assert_eq!(user.kind, TypeKind::Object);
    assert_eq!(user.owner.as_deref(), Some("accounts"));
    assert!(user.is_entity());
    assert_eq!(user.keys.len(), 2);
    assert!(user.keys_for_service("reviews")[0].contains_key("id"));

    let reviews = user.field_by_name("reviews").unwrap();
    assert_eq!(reviews.service.as_deref(), Some("reviews"));

    let good_description = user.field_by_name("goodDescription").unwrap();
    let requires = good_description.requires.as_ref().unwrap();
    assert!(requires.get("metadata").unwrap().contains_key("description"));

    let author = schema
        .type_by_name("Review")
        .unwrap()
        .field_by_name("author")
        .unwrap();
    assert!(author.provides.as_ref().unwrap().contains_key("name"));

    let furniture_name = schema
        .type_by_name("Furniture")
        .unwrap()
        .field_by_name("name")
        .unwrap();
    assert!(furniture_name.external);
}

#[test]
fn possible_types_are_computed_for_interfaces() {
    let schema = ComposedSchema::parse(SDL).unwrap();
    let product = schema.type_by_name("Product").unwrap();
    assert!(product.is_abstract());
    assert!(product.is_possible_type("Furniture"));
    assert!(!product.is_possible_type("User"));
}

#[test]
fn introspection_surface_is_installed() {
    let schema = ComposedSchema::parse(SDL).unwrap();
    assert!(schema.type_by_name("__Schema").is_some());

    let query = schema.type_by_name("Query").unwrap();
    assert!(query.field_by_name("__schema").is_some());
    assert!(query.field_by_name("__type").is_some());
}

#[test]
fn root_field_without_service_is_rejected() {
    let err = ComposedSchema::parse(
        r#"
        schema { query: Query }
        type Query {
            me: String
        }
        "#,
    )
    .unwrap_err();

    match err {
        SchemaError::Validation(issues) => assert_eq!(issues, vec![SchemaIssue::MissingOwner {
            type_name: "Query".to_string(),
            field_name: "me".to_string(),
        }]),
        _ => panic!("expected a validation batch"),
    }
}

#[test]
fn field_set_issues_are_batched() {
    let err = ComposedSchema::parse(
        r#"
        schema { query: Query }
        type Query {
            user: User @resolve(service: "accounts")
        }
        type User
            @owner(service: "accounts")
            @key(fields: "uuid", service: "accounts")
        {
            id: ID!
            email: String @resolve(service: "emails") @requires(fields: "handle")
        }
        "#,
    )
    .unwrap_err();

    match err {
        SchemaError::Validation(issues) => {
            assert_eq!(issues.len(), 2);
            assert!(issues.iter().any(|issue| matches!(
                issue,
                SchemaIssue::UnknownFieldInFieldSet { directive: "key", .. }
            )));
            assert!(issues.iter().any(|issue| matches!(
                issue,
                SchemaIssue::UnknownFieldInFieldSet { directive: "requires", .. }
            )));
        }
        _ => panic!("expected a validation batch"),
    }
}
