//! The fusegraph query planner.
//!
//! Given a composed supergraph schema and a parsed operation, the planner
//! produces a tree of per-service fetches that a gateway executor can run:
//! `Fetch` issues one GraphQL request, `Flatten` attaches a fetch's output at
//! a nested (possibly array) response path, and `Sequence`/`Parallel` express
//! the data dependencies between fetches. Planning is pure computation; the
//! emitted plan is immutable and can be shared across threads.
//!
//! ```no_run
//! use fusegraph_planner::{build_query_plan, OperationContext, QueryPlanOptions};
//! use fusegraph_schema::ComposedSchema;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let schema = ComposedSchema::parse(include_str!("../tests/schema.graphql"))?;
//! let document = parser::parse_query("{ me { name } }")?;
//! let ctx = OperationContext::build(&schema, &document, None)?;
//! let plan = build_query_plan(&ctx, QueryPlanOptions::default())?;
//! println!("{plan}");
//! # Ok(())
//! # }
//! ```

mod builder;
mod context;
mod display;
mod error;
mod plan;
mod stringify;
mod types;

pub use builder::{build_query_plan, QueryPlanOptions};
pub use context::OperationContext;
pub use error::PlanError;
pub use fusegraph_validation::RuleError;
pub use plan::{
    FetchNode,
    FlattenNode,
    InternalFragment,
    ParallelNode,
    PathSegment,
    PlanNode,
    QueryPlan,
    ResponsePath,
    SequenceNode,
};
pub use types::{FieldRef, InlineFragmentRef, RequiredFieldRef, SelectionRef, SelectionRefSet};
