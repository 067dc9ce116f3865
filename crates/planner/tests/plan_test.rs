use std::fs;

use fusegraph_planner::{build_query_plan, OperationContext, QueryPlanOptions};
use fusegraph_schema::ComposedSchema;
use globset::GlobBuilder;
use pretty_assertions::assert_eq;

/// Walks tests/plans/*.txt; each file is a sequence of
/// `query --- expected plan text` blocks separated by `---` lines.
#[test]
fn test_plans() {
    let schema = ComposedSchema::parse(include_str!("schema.graphql")).unwrap();
    let glob = GlobBuilder::new("./tests/plans/*.txt")
        .literal_separator(true)
        .build()
        .unwrap()
        .compile_matcher();

    for entry in fs::read_dir("./tests/plans").unwrap() {
        let entry = entry.unwrap();
        if !glob.is_match(entry.path()) {
            continue;
        }

        println!("{}", entry.path().display());

        let data = fs::read_to_string(entry.path()).unwrap();
        let mut blocks = data.split("---");
        let mut n = 1;

        loop {
            let query = match blocks.next() {
                Some(query) if !query.trim().is_empty() => query,
                _ => break,
            };
            let expected = blocks.next().expect("every query needs an expected plan");

            println!("\tcase {}", n);

            let document = parser::parse_query(query).unwrap();
            let ctx = OperationContext::build(&schema, &document, None).unwrap();
            let plan = build_query_plan(&ctx, QueryPlanOptions::default()).unwrap();

            assert_eq!(plan.to_string(), expected.trim());

            n += 1;
        }
    }
}
