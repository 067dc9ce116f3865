use clap::{Parser, ValueEnum};

#[derive(Parser, Debug)]
#[command(about = "Plan a GraphQL operation against a composed supergraph schema")]
pub struct Options {
    /// Path of the composed schema SDL
    #[clap(long, env = "SCHEMA_FILE", default_value = "supergraph.graphql")]
    pub schema: String,

    /// Path of the file containing the operation to plan
    pub query: String,

    /// Operation to plan when the document contains more than one
    #[clap(long)]
    pub operation_name: Option<String>,

    /// Output format
    #[clap(long, value_enum, default_value = "text")]
    pub format: Format,

    /// Compress repeated sub-selections into numbered fragments
    #[clap(long)]
    pub auto_fragmentization: bool,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// Stable human-readable plan form
    Text,
    /// Executor-facing JSON
    Json,
}
