//! Controller for dashboards that show several server-paginated tables.
//!
//! Each table is a *view* identified by a [`ViewKey`]. A [`ViewRegistry`]
//! tracks every view's search text, page, page size, sort, visible columns
//! and selection, and decides when to call the view's [`PageFetcher`]. It
//! never fetches on its own initiative beyond that.

mod column;
mod config;
mod debounce;
mod error;
mod event;
mod fetch;
mod refresh;
mod registry;
mod row;
mod selection;
mod sort;
mod store;
mod table;
mod task;
mod view_key;
mod view_state;

#[cfg(test)]
mod test_utils;

pub use column::{ColumnDescriptor, ColumnId, VisibleColumns, visible_columns};
pub use config::{ControllerConfig, DEFAULT_DEBOUNCE, DEFAULT_PAGE_SIZE};
pub use error::FetchError;
pub use fetch::{FetchFuture, FetchStats, PageFetcher, PageRequest};
pub use refresh::{AffectedView, MutationImpact};
pub use registry::{ViewAction, ViewRegistry, ViewSpec};
pub use row::{CellValue, PageResult, RowKey, TableRow};
pub use selection::{SelectablePredicate, SelectionPolicy, clear_selection};
pub use sort::{SortDescriptor, SortDirection, SortMode, compare_rows, next_sort, sort_rows};
pub use store::{ViewProfile, ViewStore};
pub use table::{TableModel, TableRowModel};
pub use task::{TaskHandle, TaskId};
pub use view_key::ViewKey;
pub use view_state::{ViewChanges, ViewPatch, ViewState, clamp_page, total_pages};
