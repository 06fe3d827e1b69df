//! Shared `list` flow: apply flags to a view, load it once, return its table.

use anyhow::{Context as _, Result, bail};
use tourdesk_states::{TableModel, TableRow, ViewAction, ViewKey, ViewPatch, ViewRegistry, VisibleColumns};
use tracing::{debug, instrument};

use crate::cli::ListArgs;

/// Writes the list flags into the view without fetching.
///
/// Returns a warning for every flag that could not be honoured.
pub fn apply_list_args<R: TableRow>(
    registry: &mut ViewRegistry<R>,
    key: ViewKey,
    args: &ListArgs,
) -> Vec<String> {
    let mut warnings = Vec::new();
    let mut patch = ViewPatch::default();

    if let Some(search) = &args.search {
        patch = patch.raw_filter(search.clone()).committed_filter(search.clone());
    }
    match args.size {
        Some(0) => warnings.push("--size must be at least 1; using the default".to_owned()),
        Some(size) => patch = patch.page_size(size),
        None => {}
    }
    if !args.columns.is_empty() {
        let (known, unknown): (Vec<&String>, Vec<&String>) = args.columns.iter().partition(|name| {
            registry
                .columns(key)
                .iter()
                .any(|column| column.id.as_str() == name.as_str())
        });
        for name in unknown {
            warnings.push(format!("unknown column `{name}` ignored"));
        }
        if !known.is_empty() {
            patch = patch.visible_columns(VisibleColumns::only(known.iter().map(|name| name.as_str())));
        }
    }
    registry.update_view(key, patch);

    if let Some(sort) = args.sort {
        registry.dispatch(key, ViewAction::SetSort(Some(sort)));
        if registry.view(key).and_then(|view| view.sort) != Some(sort) {
            warnings.push(format!("cannot sort by `{}`; keeping the default order", sort.column));
        }
    }
    if args.page > 1 {
        registry.dispatch(key, ViewAction::SetPage(args.page));
    }
    warnings
}

/// Activates `key`, waits for its fetches, and returns the loaded table.
#[instrument(skip_all, name = "load_view", fields(view = %key))]
pub async fn load_view<R: TableRow>(registry: &mut ViewRegistry<R>, key: ViewKey) -> Result<TableModel> {
    registry.select_active(key);
    registry.settle().await;
    debug!(stats = ?registry.stats(), "view settled");

    let model = registry
        .table(key)
        .with_context(|| format!("view {key} is not registered"))?;
    if let Some(error) = &model.error {
        bail!("Failed to load {key}: {error}");
    }
    Ok(model)
}

/// Applies `args`, loads the view and notes when the requested page moved.
pub async fn list_view<R: TableRow>(
    registry: &mut ViewRegistry<R>,
    key: ViewKey,
    args: &ListArgs,
) -> Result<(TableModel, Vec<String>)> {
    let mut warnings = apply_list_args(registry, key, args);
    let model = load_view(registry, key).await?;
    if model.page != args.page.max(1) {
        warnings.push(format!(
            "page {} does not exist; showing page {}",
            args.page, model.page
        ));
    }
    registry.shutdown();
    Ok((model, warnings))
}
