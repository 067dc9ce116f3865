#![forbid(unsafe_code)]

mod options;

use anyhow::{Context, Result};
use clap::Parser;
use fusegraph_planner::{build_query_plan, OperationContext, QueryPlanOptions};
use fusegraph_schema::ComposedSchema;
use options::{Format, Options};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn init_tracing() {
    tracing_subscriber::registry()
        .with(fmt::layer().compact().with_target(false))
        .with(
            EnvFilter::try_from_default_env()
                .or_else(|_| EnvFilter::try_new("info"))
                .unwrap(),
        )
        .init();
}

fn main() -> Result<()> {
    let options = Options::parse();
    init_tracing();

    let schema_sdl = std::fs::read_to_string(&options.schema)
        .with_context(|| format!("Failed to load schema file '{}'.", options.schema))?;
    let schema = ComposedSchema::parse(&schema_sdl)
        .with_context(|| format!("Failed to parse schema file '{}'.", options.schema))?;
    tracing::debug!(schema = %options.schema, types = schema.types.len(), "Loaded composed schema.");

    let query = std::fs::read_to_string(&options.query)
        .with_context(|| format!("Failed to load query file '{}'.", options.query))?;
    let document = parser::parse_query(&query).context("Failed to parse the operation document.")?;

    let ctx = OperationContext::build(&schema, &document, options.operation_name.as_deref())
        .context("Failed to prepare the operation.")?;
    let plan = build_query_plan(&ctx, QueryPlanOptions {
        auto_fragmentization: options.auto_fragmentization,
    })
    .context("Failed to plan the operation.")?;

    match options.format {
        Format::Text => println!("{plan}"),
        Format::Json => println!("{}", serde_json::to_string_pretty(&plan)?),
    }

    Ok(())
}
