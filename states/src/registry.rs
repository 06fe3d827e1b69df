use std::collections::{BTreeSet, HashMap};
use std::fmt::{Debug, Formatter};
use std::sync::Arc;

use chrono::Utc;
use flume::Receiver;
use log::{debug, info, trace, warn};

use crate::debounce::Debouncer;
use crate::event::Event;
use crate::fetch::FetchCoordinator;
use crate::refresh::{RefreshBatches, Staging, merge_affected, predict_page};
use crate::selection::clear_selection;
use crate::{
    AffectedView, ColumnDescriptor, ColumnId, ControllerConfig, FetchError, FetchStats, PageFetcher,
    PageRequest, PageResult, RowKey, SelectablePredicate, SelectionPolicy, SortDescriptor, SortMode,
    TableModel, TableRow, TaskId, ViewChanges, ViewKey, ViewPatch, ViewProfile, ViewState, ViewStore,
    VisibleColumns, clamp_page, next_sort,
};

/// Static configuration of a view, supplied at registration.
pub struct ViewSpec<R> {
    fetcher: Arc<dyn PageFetcher<R>>,
    columns: Vec<ColumnDescriptor>,
    page_size: Option<u32>,
    sort: Option<SortDescriptor>,
    sort_mode: SortMode,
    visible_columns: VisibleColumns,
    selectable: Option<SelectablePredicate<R>>,
}

impl<R> ViewSpec<R> {
    pub fn new(fetcher: Arc<dyn PageFetcher<R>>, columns: Vec<ColumnDescriptor>) -> Self {
        Self {
            fetcher,
            columns,
            page_size: None,
            sort: None,
            sort_mode: SortMode::Local,
            visible_columns: VisibleColumns::All,
            selectable: None,
        }
    }

    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = Some(page_size);
        self
    }

    pub fn with_sort(mut self, sort: SortDescriptor) -> Self {
        self.sort = Some(sort);
        self
    }

    /// Sends the sort to the fetcher instead of sorting the loaded page.
    pub fn server_sorted(mut self) -> Self {
        self.sort_mode = SortMode::Server;
        self
    }

    pub fn with_visible_columns(mut self, visible: VisibleColumns) -> Self {
        self.visible_columns = visible;
        self
    }

    pub fn with_selectable(mut self, predicate: impl Fn(&R) -> bool + Send + Sync + 'static) -> Self {
        self.selectable = Some(Arc::new(predicate));
        self
    }
}

impl<R> Debug for ViewSpec<R> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ViewSpec")
            .field("columns", &self.columns)
            .field("page_size", &self.page_size)
            .field("sort", &self.sort)
            .field("sort_mode", &self.sort_mode)
            .field("visible_columns", &self.visible_columns)
            .finish_non_exhaustive()
    }
}

/// A user intent scoped to one view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewAction {
    /// Keystroke in the search box; committed after the debounce interval.
    Search(String),
    /// Empties the search box and commits immediately.
    Clear,
    SetPage(u32),
    NextPage,
    PrevPage,
    SetPageSize(u32),
    SetSort(Option<SortDescriptor>),
    /// Header click: ascending, descending, unsorted.
    ToggleSort(ColumnId),
    SetVisibleColumns(VisibleColumns),
    SetSelection(BTreeSet<RowKey>),
    ToggleRow(RowKey),
    /// Selects every selectable row of the loaded page.
    SelectPage,
    ClearSelection,
}

struct Binding<R> {
    fetcher: Arc<dyn PageFetcher<R>>,
    columns: Vec<ColumnDescriptor>,
    sort_mode: SortMode,
}

/// Owner of every view sharing one dashboard shell.
///
/// All state transitions happen synchronously on `&mut self`. Fetches and
/// debounce timers run on spawned tokio tasks and report back over a channel;
/// their results land in view state only when the owner calls [`sync`],
/// [`next_event`] or [`settle`].
///
/// Scheduling work requires a running tokio runtime.
///
/// [`sync`]: ViewRegistry::sync
/// [`next_event`]: ViewRegistry::next_event
/// [`settle`]: ViewRegistry::settle
pub struct ViewRegistry<R: TableRow> {
    config: ControllerConfig,
    store: ViewStore<R>,
    bindings: HashMap<ViewKey, Binding<R>>,
    active: Option<ViewKey>,
    debouncer: Debouncer<R>,
    fetch: FetchCoordinator<R>,
    batches: RefreshBatches<R>,
    receiver: Receiver<Event<R>>,
}

impl<R: TableRow> ViewRegistry<R> {
    pub fn new(config: ControllerConfig) -> Self {
        let (sender, receiver) = flume::unbounded();
        Self {
            config,
            store: ViewStore::new(config.default_page_size),
            bindings: HashMap::new(),
            active: None,
            debouncer: Debouncer::new(config.debounce, sender.clone()),
            fetch: FetchCoordinator::new(sender),
            batches: RefreshBatches::new(),
            receiver,
        }
    }

    pub fn config(&self) -> ControllerConfig {
        self.config
    }

    /// Binds `key` to a fetcher and column catalog, resetting its state.
    pub fn register(&mut self, key: ViewKey, spec: ViewSpec<R>) {
        let ViewSpec {
            fetcher,
            columns,
            page_size,
            sort,
            sort_mode,
            visible_columns,
            selectable,
        } = spec;

        if self.bindings.contains_key(&key) {
            debug!("Re-registering view {key}");
        }
        self.debouncer.cancel(key);
        self.store.install(
            key,
            ViewProfile {
                page_size: page_size.unwrap_or(self.config.default_page_size).max(1),
                sort,
                visible_columns,
                selectable,
            },
        );
        self.bindings.insert(
            key,
            Binding {
                fetcher,
                columns,
                sort_mode,
            },
        );
    }

    pub fn is_registered(&self, key: ViewKey) -> bool {
        self.bindings.contains_key(&key)
    }

    /// Column catalog of `key`; empty for views created on first access.
    pub fn columns(&self, key: ViewKey) -> &[ColumnDescriptor] {
        self.bindings
            .get(&key)
            .map(|binding| binding.columns.as_slice())
            .unwrap_or_default()
    }

    pub fn sort_mode(&self, key: ViewKey) -> SortMode {
        self.bindings
            .get(&key)
            .map(|binding| binding.sort_mode)
            .unwrap_or_default()
    }

    pub fn active(&self) -> Option<ViewKey> {
        self.active
    }

    /// Makes `key` the visible view.
    ///
    /// The previously active view is left exactly as it was. The new one is
    /// fetched only if it has never loaded or went stale. Re-selecting the
    /// active view applies the same check.
    /// Returns the id of the fetch this started, if any.
    pub fn select_active(&mut self, key: ViewKey) -> Option<TaskId> {
        let previous = self.active.replace(key);
        if previous != Some(key) {
            debug!("Active view {previous:?} -> {key}");
        }

        let in_flight = self.fetch.is_in_flight(key);
        let state = self.store.get_or_create(key);
        let needs_fetch = state.stale || (!state.is_loaded() && !in_flight);
        if needs_fetch {
            self.ensure_fresh(key)
        } else {
            None
        }
    }

    /// Applies `action` to `key`, fetching if the active view's parameters
    /// moved. Returns the id of the fetch this started, if any.
    pub fn dispatch(&mut self, key: ViewKey, action: ViewAction) -> Option<TaskId> {
        trace!("Dispatching {action:?} to {key}");
        match action {
            ViewAction::Search(text) => {
                self.on_filter_input(key, text);
                None
            }
            ViewAction::Clear => self.on_clear(key),
            ViewAction::SetPage(page) => self.set_page(key, page),
            ViewAction::NextPage => {
                let page = self.store.get_or_create(key).page.saturating_add(1);
                self.set_page(key, page)
            }
            ViewAction::PrevPage => {
                let page = self.store.get_or_create(key).page.saturating_sub(1);
                self.set_page(key, page)
            }
            ViewAction::SetPageSize(0) => {
                warn!("Ignoring page size 0 for {key}");
                None
            }
            ViewAction::SetPageSize(page_size) => {
                self.apply_patch(key, ViewPatch::default().page_size(page_size))
            }
            ViewAction::SetSort(sort) => self.set_sort(key, sort),
            ViewAction::ToggleSort(column) => {
                let current = self.store.get_or_create(key).sort;
                self.set_sort(key, next_sort(current, column))
            }
            ViewAction::SetVisibleColumns(visible) => {
                self.apply_patch(key, ViewPatch::default().visible_columns(visible))
            }
            ViewAction::SetSelection(selection) => {
                self.apply_patch(key, ViewPatch::default().selection(selection))
            }
            ViewAction::ToggleRow(row) => {
                self.toggle_row(key, row);
                None
            }
            ViewAction::SelectPage => {
                let (state, policy) = self.store.state_and_policy(key);
                policy.select_page(state);
                None
            }
            ViewAction::ClearSelection => {
                self.clear_selection(key);
                None
            }
        }
    }

    /// Updates the search box and restarts the view's debounce timer.
    pub fn on_filter_input(&mut self, key: ViewKey, text: String) {
        self.store.update(key, ViewPatch::default().raw_filter(text.clone()));
        self.debouncer.schedule(key, text);
    }

    /// Cancels any pending search commit and commits the empty filter now.
    pub fn on_clear(&mut self, key: ViewKey) -> Option<TaskId> {
        self.debouncer.cancel(key);
        self.apply_patch(
            key,
            ViewPatch::default()
                .raw_filter("")
                .committed_filter("")
                .page(1),
        )
    }

    fn set_page(&mut self, key: ViewKey, page: u32) -> Option<TaskId> {
        let state = self.store.get_or_create(key);
        let page = if state.is_loaded() {
            clamp_page(page, state.total_pages)
        } else {
            page.max(1)
        };
        self.apply_patch(key, ViewPatch::default().page(page))
    }

    fn set_sort(&mut self, key: ViewKey, sort: Option<SortDescriptor>) -> Option<TaskId> {
        if let Some(sort) = sort
            && !self.is_sortable(key, sort.column)
        {
            debug!("Ignoring sort on {key}: column {} is not sortable", sort.column);
            return None;
        }
        self.apply_patch(key, ViewPatch::default().sort(sort))
    }

    fn is_sortable(&self, key: ViewKey, column: ColumnId) -> bool {
        match self.bindings.get(&key) {
            Some(binding) => binding
                .columns
                .iter()
                .any(|descriptor| descriptor.id == column && descriptor.sortable),
            None => true,
        }
    }

    fn apply_patch(&mut self, key: ViewKey, patch: ViewPatch) -> Option<TaskId> {
        let changes = self.store.update(key, patch);
        self.react(key, changes)
    }

    /// Fetches the active view when its parameters moved; marks others stale.
    fn react(&mut self, key: ViewKey, changes: ViewChanges) -> Option<TaskId> {
        if !changes.requires_fetch(self.sort_mode(key)) {
            return None;
        }
        if self.active == Some(key) {
            self.ensure_fresh(key)
        } else {
            debug!("View {key} is hidden; deferring fetch until it is selected");
            self.store.get_or_create(key).stale = true;
            None
        }
    }

    /// Issues a fetch for `key` with its current parameters.
    ///
    /// Views without a fetcher are only marked stale.
    pub fn ensure_fresh(&mut self, key: ViewKey) -> Option<TaskId> {
        let Some(binding) = self.bindings.get(&key) else {
            warn!("No fetcher bound to view {key}; marking it stale");
            self.store.get_or_create(key).stale = true;
            return None;
        };
        let fetcher = Arc::clone(&binding.fetcher);
        let sort_mode = binding.sort_mode;

        let state = self.store.get_or_create(key);
        state.loading = true;
        state.error = None;
        state.stale = false;
        let request = PageRequest {
            key,
            page_index: state.page_index(),
            page_size: state.page_size,
            filter: state.committed_filter.clone(),
            sort: state.sort,
            sort_mode,
        };

        let flushed = self.batches.supersede(key);
        let id = self.fetch.issue(&fetcher, request);
        self.apply_outcomes(flushed);
        Some(id)
    }

    /// Refetches every view a mutation touched.
    ///
    /// Each loaded view is fetched once with its current filter, page size
    /// and sort. A removal first moves the page to where it will land after
    /// the shrink. The fetches form one batch and are applied together.
    /// Views that never loaded are marked stale instead.
    pub fn after_mutation(&mut self, affected: &[AffectedView]) -> Vec<TaskId> {
        let mut issued = Vec::new();
        for view in merge_affected(affected) {
            let key = view.key;
            let bound = self.bindings.contains_key(&key);
            let in_flight = self.fetch.is_in_flight(key);
            let state = self.store.get_or_create(key);
            if !bound || (!state.is_loaded() && !in_flight) {
                debug!("View {key} has not loaded; marking it stale");
                state.stale = true;
                continue;
            }
            predict_page(state, view.impact);
            if let Some(id) = self.ensure_fresh(key) {
                issued.push(id);
            }
        }
        self.batches.open(issued.iter().copied());
        info!("Refreshing {} view(s) after mutation", issued.len());
        issued
    }

    pub fn toggle_row(&mut self, key: ViewKey, row: RowKey) -> bool {
        let (state, policy) = self.store.state_and_policy(key);
        policy.toggle(state, row)
    }

    /// Adds the selectable keys among `rows`. Returns how many were added.
    pub fn select_all(&mut self, key: ViewKey, rows: &[RowKey]) -> usize {
        let (state, policy) = self.store.state_and_policy(key);
        policy.select_all(state, rows)
    }

    pub fn clear_selection(&mut self, key: ViewKey) -> bool {
        clear_selection(self.store.get_or_create(key))
    }

    pub fn is_selectable(&self, key: ViewKey, row: &R) -> bool {
        let predicate = self
            .store
            .profile(key)
            .and_then(|profile| profile.selectable.as_ref());
        SelectionPolicy::new(predicate).is_selectable(row)
    }

    /// Rows of the current selection, in page order.
    pub fn selected_rows(&self, key: ViewKey) -> Vec<R> {
        self.store
            .get(key)
            .map(|state| {
                state
                    .rows
                    .iter()
                    .filter(|row| state.selection.contains(&row.row_key()))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn view(&self, key: ViewKey) -> Option<&ViewState<R>> {
        self.store.get(key)
    }

    /// State for `key`, created with defaults if the key is unknown.
    pub fn get_view(&mut self, key: ViewKey) -> &ViewState<R> {
        self.store.get_or_create(key)
    }

    /// Edits a view without fetching. See [`ViewState::apply`].
    pub fn update_view(&mut self, key: ViewKey, patch: ViewPatch) -> ViewChanges {
        self.store.update(key, patch)
    }

    /// Restores a view's registration defaults without fetching.
    pub fn reset_view(&mut self, key: ViewKey) -> ViewChanges {
        self.debouncer.cancel(key);
        self.store.reset(key)
    }

    /// Render-ready snapshot of `key`, if the view exists.
    pub fn table(&self, key: ViewKey) -> Option<TableModel> {
        let state = self.store.get(key)?;
        let predicate = self
            .store
            .profile(key)
            .and_then(|profile| profile.selectable.as_ref());
        Some(TableModel::build(
            key,
            state,
            self.columns(key),
            self.sort_mode(key),
            &SelectionPolicy::new(predicate),
        ))
    }

    /// Whether a debounce timer is pending or a fetch is outstanding.
    pub fn is_busy(&self) -> bool {
        self.debouncer.pending_count() > 0 || self.fetch.outstanding() > 0
    }

    pub fn is_search_pending(&self, key: ViewKey) -> bool {
        self.debouncer.is_pending(key)
    }

    pub fn stats(&self) -> FetchStats {
        self.fetch.stats()
    }

    /// Applies every event that has already arrived. Returns how many.
    pub fn sync(&mut self) -> usize {
        let mut handled = 0;
        while let Ok(event) = self.receiver.try_recv() {
            self.handle_event(event);
            handled += 1;
        }
        handled
    }

    /// Waits for and applies the next event.
    ///
    /// Returns `false` without waiting when nothing is pending.
    pub async fn next_event(&mut self) -> bool {
        if !self.is_busy() {
            return false;
        }
        match self.receiver.recv_async().await {
            Ok(event) => {
                self.handle_event(event);
                true
            }
            Err(_) => false,
        }
    }

    /// Drives events until no timer is pending and no fetch is outstanding.
    pub async fn settle(&mut self) {
        while self.next_event().await {}
    }

    /// Cancels every pending timer and in-flight fetch.
    ///
    /// Views whose fetch was cancelled stop loading and turn stale. The
    /// registry stays usable afterwards.
    pub fn shutdown(&mut self) {
        info!("Shutting down view registry");
        self.debouncer.shutdown();
        for key in self.fetch.shutdown() {
            let state = self.store.get_or_create(key);
            state.loading = false;
            state.stale = true;
        }
        self.batches.clear();
    }

    fn handle_event(&mut self, event: Event<R>) {
        match event {
            Event::DebounceElapsed { id, text } => self.commit_filter(id, text),
            Event::FetchResolved { id, result } => {
                self.fetch.settle(id);
                match self.batches.stage(id, result) {
                    Staging::Direct((id, result)) => self.apply_fetch(id, result),
                    Staging::Held => trace!("Holding {id:?} until its refresh batch completes"),
                    Staging::Flush(outcomes) => self.apply_outcomes(outcomes),
                }
            }
        }
    }

    fn commit_filter(&mut self, id: TaskId, text: String) {
        if !self.debouncer.accept(id) {
            trace!("Dropping superseded search timer {id:?}");
            return;
        }
        let key = id.key();
        let changes = self.store.update(key, ViewPatch::default().committed_filter(text));
        if !changes.filter {
            debug!("Search for {key} unchanged; not fetching");
            return;
        }
        self.react(key, changes);
    }

    fn apply_outcomes(&mut self, outcomes: Vec<(TaskId, Result<PageResult<R>, FetchError>)>) {
        for (id, result) in outcomes {
            self.apply_fetch(id, result);
        }
    }

    fn apply_fetch(&mut self, id: TaskId, result: Result<PageResult<R>, FetchError>) {
        if !self.fetch.admit(id) {
            return;
        }
        let key = id.key();
        let state = self.store.get_or_create(key);
        state.loading = false;

        match result {
            Ok(page) => {
                debug!(
                    "Loaded {key} page {}: {} rows, {} total across {} pages",
                    state.page,
                    page.rows.len(),
                    page.total_elements,
                    page.total_pages
                );
                state.rows = page.rows;
                state.total_pages = page.total_pages;
                state.total_elements = page.total_elements;
                state.error = None;
                state.last_loaded = Some(Utc::now());
                clear_selection(state);
                self.fetch.record_applied();

                let last_page = state.last_page();
                if state.page > last_page {
                    info!("Page {} of {key} no longer exists; moving to {last_page}", state.page);
                    state.page = last_page;
                    self.ensure_fresh(key);
                }
            }
            Err(error) => {
                warn!("Fetch for {key} failed: {error}");
                state.error = Some(error.to_string());
                self.fetch.record_failed();
            }
        }
    }
}

impl<R: TableRow> Debug for ViewRegistry<R> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ViewRegistry")
            .field("config", &self.config)
            .field("active", &self.active)
            .field("views", &self.store.keys().collect::<Vec<_>>())
            .field("stats", &self.fetch.stats())
            .finish_non_exhaustive()
    }
}
