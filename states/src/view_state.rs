use std::collections::BTreeSet;

use chrono::{DateTime, Utc};

use crate::{RowKey, SortDescriptor, SortMode, VisibleColumns};

/// Number of pages needed for `total_elements` rows at `page_size` per page.
pub fn total_pages(total_elements: u64, page_size: u32) -> u32 {
    if page_size == 0 {
        return 0;
    }
    let pages = total_elements.div_ceil(u64::from(page_size));
    u32::try_from(pages).unwrap_or(u32::MAX)
}

/// Clamps a 1-based page into `[1, max(total_pages, 1)]`.
pub fn clamp_page(page: u32, total_pages: u32) -> u32 {
    page.clamp(1, total_pages.max(1))
}

/// Everything the controller knows about one view.
///
/// Owned by the registry and mutated only on the owner's thread. Rows are
/// replaced as a whole on every successful fetch.
#[derive(Debug, Clone)]
pub struct ViewState<R> {
    /// What the search box currently shows.
    pub raw_filter: String,
    /// Filter sent with fetches; lags `raw_filter` by the debounce interval.
    pub committed_filter: String,
    /// 1-based.
    pub page: u32,
    pub page_size: u32,
    pub sort: Option<SortDescriptor>,
    pub visible_columns: VisibleColumns,
    pub selection: BTreeSet<RowKey>,
    pub loading: bool,
    pub rows: Vec<R>,
    pub total_pages: u32,
    pub total_elements: u64,
    pub error: Option<String>,
    pub last_loaded: Option<DateTime<Utc>>,
    /// Set when the view needs a fetch the next time it becomes active.
    pub stale: bool,
}

impl<R> ViewState<R> {
    pub fn new(page_size: u32, sort: Option<SortDescriptor>, visible_columns: VisibleColumns) -> Self {
        Self {
            raw_filter: String::new(),
            committed_filter: String::new(),
            page: 1,
            page_size: page_size.max(1),
            sort,
            visible_columns,
            selection: BTreeSet::new(),
            loading: false,
            rows: Vec::new(),
            total_pages: 0,
            total_elements: 0,
            error: None,
            last_loaded: None,
            stale: false,
        }
    }

    /// Whether a fetch for this view has ever succeeded.
    pub fn is_loaded(&self) -> bool {
        self.last_loaded.is_some()
    }

    /// Zero-based page index as sent to the server.
    pub fn page_index(&self) -> u32 {
        self.page.saturating_sub(1)
    }

    /// Upper bound for `page`, treating an empty collection as one page.
    pub fn last_page(&self) -> u32 {
        self.total_pages.max(1)
    }

    pub fn row_keys(&self) -> Vec<RowKey>
    where
        R: crate::TableRow,
    {
        self.rows.iter().map(crate::TableRow::row_key).collect()
    }

    /// Shallow-merges `patch`, enforcing the page reset.
    ///
    /// If the committed filter, page size or sort actually changes, `page`
    /// becomes 1 regardless of what the patch says about it.
    pub fn apply(&mut self, patch: ViewPatch) -> ViewChanges {
        let mut changes = ViewChanges::default();

        if let Some(raw) = patch.raw_filter {
            changes.raw_filter = raw != self.raw_filter;
            self.raw_filter = raw;
        }
        if let Some(committed) = patch.committed_filter
            && committed != self.committed_filter
        {
            self.committed_filter = committed;
            changes.filter = true;
        }
        if let Some(page_size) = patch.page_size
            && page_size > 0
            && page_size != self.page_size
        {
            self.page_size = page_size;
            changes.page_size = true;
        }
        if let Some(sort) = patch.sort
            && sort != self.sort
        {
            self.sort = sort;
            changes.sort = true;
        }
        if let Some(visible) = patch.visible_columns
            && visible != self.visible_columns
        {
            self.visible_columns = visible;
            changes.visible_columns = true;
        }
        if let Some(selection) = patch.selection
            && selection != self.selection
        {
            self.selection = selection;
            changes.selection = true;
        }

        let target = if changes.filter || changes.page_size || changes.sort {
            Some(1)
        } else {
            patch.page.map(|page| page.max(1))
        };
        if let Some(page) = target
            && page != self.page
        {
            self.page = page;
            changes.page = true;
        }

        changes
    }
}

/// Partial update for a `ViewState`; `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViewPatch {
    pub raw_filter: Option<String>,
    pub committed_filter: Option<String>,
    pub page: Option<u32>,
    pub page_size: Option<u32>,
    /// `Some(None)` clears the sort.
    #[expect(clippy::option_option, reason = "distinguishes keep from clear")]
    pub sort: Option<Option<SortDescriptor>>,
    pub visible_columns: Option<VisibleColumns>,
    pub selection: Option<BTreeSet<RowKey>>,
}

impl ViewPatch {
    pub fn raw_filter(mut self, text: impl Into<String>) -> Self {
        self.raw_filter = Some(text.into());
        self
    }

    pub fn committed_filter(mut self, text: impl Into<String>) -> Self {
        self.committed_filter = Some(text.into());
        self
    }

    pub fn page(mut self, page: u32) -> Self {
        self.page = Some(page);
        self
    }

    pub fn page_size(mut self, page_size: u32) -> Self {
        self.page_size = Some(page_size);
        self
    }

    pub fn sort(mut self, sort: Option<SortDescriptor>) -> Self {
        self.sort = Some(sort);
        self
    }

    pub fn visible_columns(mut self, visible: VisibleColumns) -> Self {
        self.visible_columns = Some(visible);
        self
    }

    pub fn selection(mut self, selection: BTreeSet<RowKey>) -> Self {
        self.selection = Some(selection);
        self
    }
}

/// Which fields a patch actually changed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ViewChanges {
    pub raw_filter: bool,
    pub filter: bool,
    pub page: bool,
    pub page_size: bool,
    pub sort: bool,
    pub visible_columns: bool,
    pub selection: bool,
}

impl ViewChanges {
    /// Whether the view's fetch parameters moved.
    ///
    /// A sort change alone only matters when the server does the sorting; in
    /// local mode a sort change that left page 1 is caught by `page`.
    pub fn requires_fetch(&self, mode: SortMode) -> bool {
        self.filter || self.page || self.page_size || (self.sort && mode == SortMode::Server)
    }

    pub fn any(&self) -> bool {
        self.raw_filter
            || self.filter
            || self.page
            || self.page_size
            || self.sort
            || self.visible_columns
            || self.selection
    }
}
