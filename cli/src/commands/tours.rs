//! `tourdesk tours ...`

use anyhow::{Result, bail};
use tourdesk_business::{TourCatalog, tours_key};
use tracing::instrument;

use crate::cli::ListArgs;
use crate::commands::list::list_view;
use crate::context::CliContext;
use crate::output::Output;

#[instrument(skip_all, name = "tours_list", fields(page = args.page))]
pub async fn run_tours_list(ctx: &CliContext, args: &ListArgs, out: &Output) -> Result<()> {
    let mut catalog = TourCatalog::new(ctx.client.clone(), ctx.config.controller_config());
    let (model, warnings) = list_view(catalog.registry_mut(), tours_key(), args).await?;
    for warning in warnings {
        out.warning(warning);
    }
    out.table(&model);
    Ok(())
}

#[instrument(skip_all, name = "tours_delete", fields(count = ids.len()))]
pub async fn run_tours_delete(ctx: &CliContext, ids: &[String], out: &Output) -> Result<()> {
    let mut catalog = TourCatalog::new(ctx.client.clone(), ctx.config.controller_config());
    let outcome = catalog.delete(ids).await;
    catalog.settle().await;
    out.mutation(&outcome, catalog.mutation());
    if !outcome.is_complete() {
        bail!("{} of {} tour(s) could not be deleted", outcome.failed.len(), ids.len());
    }
    Ok(())
}
