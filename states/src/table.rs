use crate::{
    CellValue, ColumnDescriptor, RowKey, SelectionPolicy, SortDescriptor, SortMode, TableRow,
    ViewKey, ViewState, compare_rows, visible_columns,
};

/// One rendered row of a `TableModel`.
#[derive(Debug, Clone, PartialEq)]
pub struct TableRowModel {
    pub key: RowKey,
    /// One cell per projected column, in column order.
    pub cells: Vec<CellValue>,
    pub selected: bool,
    pub selectable: bool,
}

/// Render-ready snapshot of a view.
#[derive(Debug, Clone, PartialEq)]
pub struct TableModel {
    pub key: ViewKey,
    pub columns: Vec<ColumnDescriptor>,
    pub rows: Vec<TableRowModel>,
    pub page: u32,
    pub page_size: u32,
    pub total_pages: u32,
    pub total_elements: u64,
    pub loading: bool,
    pub error: Option<String>,
    pub filter: String,
    pub sort: Option<SortDescriptor>,
    pub selected_count: usize,
}

impl TableModel {
    pub(crate) fn build<R: TableRow>(
        key: ViewKey,
        state: &ViewState<R>,
        catalog: &[ColumnDescriptor],
        sort_mode: SortMode,
        policy: &SelectionPolicy<'_, R>,
    ) -> Self {
        let columns: Vec<ColumnDescriptor> = visible_columns(catalog, &state.visible_columns)
            .into_iter()
            .cloned()
            .collect();

        let mut ordered: Vec<&R> = state.rows.iter().collect();
        if sort_mode == SortMode::Local
            && let Some(sort) = state.sort
        {
            ordered.sort_by(|left, right| compare_rows(*left, *right, sort));
        }

        let rows = ordered
            .into_iter()
            .map(|row| {
                let key = row.row_key();
                TableRowModel {
                    key,
                    cells: columns.iter().map(|column| row.cell(column.id)).collect(),
                    selected: state.selection.contains(&key),
                    selectable: policy.is_selectable(row),
                }
            })
            .collect();

        Self {
            key,
            columns,
            rows,
            page: state.page,
            page_size: state.page_size,
            total_pages: state.total_pages,
            total_elements: state.total_elements,
            loading: state.loading,
            error: state.error.clone(),
            filter: state.raw_filter.clone(),
            sort: state.sort,
            selected_count: state.selection.len(),
        }
    }

    /// Footer text such as `page 2/5 (48 rows)`.
    pub fn pagination_label(&self) -> String {
        format!(
            "page {}/{} ({} rows)",
            self.page,
            self.total_pages.max(1),
            self.total_elements
        )
    }
}
