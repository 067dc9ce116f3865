use fusegraph_schema::ComposedSchema;
use fusegraph_validation::check_rules;
use pretty_assertions::assert_eq;

fn schema() -> ComposedSchema {
    ComposedSchema::parse(
        r#"
        schema {
            query: Query
            subscription: Subscription
        }

        type Query {
            me: User @resolve(service: "accounts")
        }

        type Subscription {
            userUpdated: User @resolve(service: "accounts")
            userRemoved: User @resolve(service: "accounts")
        }

        type User @owner(service: "accounts") @key(fields: "id", service: "accounts") {
            id: ID!
            name: String
            birthDate(locale: String): String
        }
        "#,
    )
    .unwrap()
}

fn check(query: &str) -> Vec<String> {
    let schema = schema();
    let document = parser::parse_query(query).unwrap();
    check_rules(&schema, &document)
        .into_iter()
        .map(|err| err.message)
        .collect()
}

#[test]
fn valid_operation_passes() {
    assert_eq!(check("{ me { id name __typename } }"), Vec::<String>::new());
    assert_eq!(check("{ __schema { queryType { name } } }"), Vec::<String>::new());
}

#[test]
fn unknown_field_is_reported() {
    assert_eq!(check("{ me { nickname } }"), vec![
        "Unknown field \"nickname\" on type \"User\"".to_string()
    ]);
}

#[test]
fn unknown_fragment_is_reported() {
    assert_eq!(check("{ me { ...userFields } }"), vec![
        "Unknown fragment \"userFields\"".to_string()
    ]);
}

#[test]
fn unknown_type_is_reported() {
    let errors = check("{ me { ... on Admin { id } } }");
    assert!(errors.contains(&"Unknown type \"Admin\"".to_string()), "{errors:?}");
}

#[test]
fn undefined_variable_is_reported() {
    assert_eq!(check("{ me { birthDate(locale: $locale) } }"), vec![
        "Variable \"$locale\" is not defined".to_string()
    ]);
    assert_eq!(
        check("query($locale: String) { me { birthDate(locale: $locale) } }"),
        Vec::<String>::new()
    );
}

#[test]
fn subscriptions_select_one_root_field() {
    assert_eq!(check("subscription { userUpdated { id } userRemoved { id } }"), vec![
        "Subscription operations must select exactly one root field".to_string()
    ]);
    assert_eq!(check("subscription { userUpdated { id } }"), Vec::<String>::new());
}

#[test]
fn errors_are_collected_as_a_batch() {
    let errors = check("{ me { nickname favouriteColour } }");
    assert_eq!(errors.len(), 2);
}
