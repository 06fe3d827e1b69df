//! Styled terminal output.

use std::fmt::Display;

use console::{Term, style};
use tabled::builder::Builder;
use tabled::settings::Style;
use tourdesk_business::{MutationOutcome, MutationState};
use tourdesk_states::{SortDirection, TableModel};

/// Longest cell printed before truncation.
const MAX_CELL_WIDTH: usize = 32;

pub struct Output {
    term: Term,
}

impl Default for Output {
    fn default() -> Self {
        Self::new()
    }
}

impl Output {
    pub fn new() -> Self {
        Self {
            term: Term::stdout(),
        }
    }

    pub fn success(&self, message: impl Display) {
        drop(
            self.term
                .write_line(&format!("{} {}", style("✓").green().bold(), message)),
        );
    }

    pub fn error(&self, message: impl Display) {
        drop(
            self.term
                .write_line(&format!("{} {}", style("✗").red().bold(), message)),
        );
    }

    pub fn warning(&self, message: impl Display) {
        drop(
            self.term
                .write_line(&format!("{} {}", style("⚠").yellow().bold(), message)),
        );
    }

    pub fn print(&self, message: impl Display) {
        drop(self.term.write_line(&message.to_string()));
    }

    pub fn dim(&self, message: impl Display) {
        drop(self.term.write_line(&style(message).dim().to_string()));
    }

    /// Prints a table model followed by its pagination footer.
    pub fn table(&self, model: &TableModel) {
        if let Some(error) = &model.error {
            self.error(format!("Failed to load {}: {error}", model.key));
        }
        if model.rows.is_empty() {
            self.dim(format!("No rows in {}.", model.key));
        } else {
            self.print(render_table(model));
        }
        self.dim(footer(model));
    }

    /// Prints one line per target of a mutation.
    pub fn mutation(&self, outcome: &MutationOutcome, state: &MutationState) {
        for target in &outcome.succeeded {
            self.success(target);
        }
        for (target, reason) in &outcome.failed {
            self.error(format!("{target}: {reason}"));
        }
        if let MutationState::Error {
            kind, succeeded, ..
        } = state
        {
            self.warning(format!(
                "{} finished with {} failure(s), {succeeded} succeeded",
                kind.label(),
                outcome.failed.len()
            ));
        }
    }
}

fn truncate_str(s: &str, max_len: usize) -> String {
    if s.chars().count() > max_len {
        let truncated: String = s.chars().take(max_len - 3).collect();
        format!("{truncated}...")
    } else {
        s.to_owned()
    }
}

/// Renders the visible columns and rows of `model` as a rounded table.
pub fn render_table(model: &TableModel) -> String {
    let mut builder = Builder::default();
    builder.push_record(model.columns.iter().map(|column| {
        match model.sort {
            Some(sort) if sort.column == column.id => {
                let arrow = match sort.direction {
                    SortDirection::Ascending => "↑",
                    SortDirection::Descending => "↓",
                };
                format!("{} {arrow}", column.label)
            }
            _ => column.label.clone(),
        }
    }));
    for row in &model.rows {
        builder.push_record(
            row.cells
                .iter()
                .map(|cell| truncate_str(&cell.to_string(), MAX_CELL_WIDTH)),
        );
    }

    let mut table = builder.build();
    table.with(Style::rounded());
    table.to_string()
}

pub fn footer(model: &TableModel) -> String {
    let mut footer = model.pagination_label();
    if !model.filter.is_empty() {
        footer.push_str(&format!(", search \"{}\"", model.filter));
    }
    footer
}

#[cfg(test)]
mod tests {
    use tourdesk_states::{CellValue, ColumnDescriptor, RowKey, SortDescriptor, TableRowModel, ViewKey};

    use super::*;

    fn model() -> TableModel {
        TableModel {
            key: ViewKey::new("tours"),
            columns: vec![
                ColumnDescriptor::new("title", "Title"),
                ColumnDescriptor::new("price", "Price"),
            ],
            rows: vec![TableRowModel {
                key: RowKey::new("t1"),
                cells: vec![CellValue::text("Lake Bled"), CellValue::Decimal(420.5)],
                selected: false,
                selectable: true,
            }],
            page: 2,
            page_size: 10,
            total_pages: 3,
            total_elements: 21,
            loading: false,
            error: None,
            filter: "lake".to_owned(),
            sort: Some(SortDescriptor::descending("price")),
            selected_count: 0,
        }
    }

    #[test]
    fn table_has_headers_sort_marker_and_cells() {
        let rendered = render_table(&model());
        assert!(rendered.contains("Title"));
        assert!(rendered.contains("Price ↓"));
        assert!(rendered.contains("Lake Bled"));
        assert!(rendered.contains("420.50"));
    }

    #[test]
    fn footer_shows_page_and_search() {
        assert_eq!(footer(&model()), "page 2/3 (21 rows), search \"lake\"");
    }

    #[test]
    fn long_cells_are_truncated() {
        assert_eq!(truncate_str("abcdefgh", 6), "abc...");
        assert_eq!(truncate_str("abc", 6), "abc");
    }
}
