mod assemble;
mod fragments;
mod groups;
mod splitter;

use tracing::instrument;

use crate::{context::OperationContext, error::PlanError, plan::QueryPlan};

/// Options controlling plan generation.
#[derive(Debug, Default, Clone)]
pub struct QueryPlanOptions {
    /// Compress repeated sub-selections of each fetch into numbered internal
    /// fragments.
    pub auto_fragmentization: bool,
}

/// Build the query plan for a prepared operation context.
///
/// The context is split into fetch groups per service, the groups are
/// assembled into a tree of fetches with `Sequence`/`Parallel` scheduling and
/// `Flatten` around array paths, and optionally each fetch's selections are
/// factorized into internal fragments.
#[instrument(skip_all, err(Debug), level = "trace")]
pub fn build_query_plan<'a>(
    ctx: &'a OperationContext<'a>,
    options: QueryPlanOptions,
) -> Result<QueryPlan<'a>, PlanError> {
    let mut splitter = splitter::Splitter::new(ctx);
    let roots = splitter.split_roots()?;
    splitter.build_groups()?;

    let mut arena = splitter.into_arena();
    let mut node = assemble::assemble(ctx, &mut arena, roots)?;

    if options.auto_fragmentization {
        if let Some(node) = node.as_mut() {
            fragments::factorize(ctx, node);
        }
    }

    Ok(QueryPlan { node })
}
