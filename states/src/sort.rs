use std::cmp::Ordering;

use crate::{ColumnId, TableRow};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SortDirection {
    Ascending,
    Descending,
}

impl SortDirection {
    /// Wire form used in `sort=<column>,<direction>` query parameters.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ascending => "asc",
            Self::Descending => "desc",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SortDescriptor {
    pub column: ColumnId,
    pub direction: SortDirection,
}

impl SortDescriptor {
    pub fn ascending(column: &str) -> Self {
        Self {
            column: ColumnId::new(column),
            direction: SortDirection::Ascending,
        }
    }

    pub fn descending(column: &str) -> Self {
        Self {
            column: ColumnId::new(column),
            direction: SortDirection::Descending,
        }
    }
}

/// Where a view's sort is applied.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortMode {
    /// Only the loaded page is reordered; changing the sort needs no fetch
    /// unless it moves the view off page 1.
    #[default]
    Local,
    /// The sort is part of the fetch parameters.
    Server,
}

/// Header-click cycle: unsorted, ascending, descending, unsorted.
///
/// Clicking a different column starts that column at ascending.
pub fn next_sort(current: Option<SortDescriptor>, column: ColumnId) -> Option<SortDescriptor> {
    match current {
        Some(sort) if sort.column == column => match sort.direction {
            SortDirection::Ascending => Some(SortDescriptor {
                column,
                direction: SortDirection::Descending,
            }),
            SortDirection::Descending => None,
        },
        _ => Some(SortDescriptor {
            column,
            direction: SortDirection::Ascending,
        }),
    }
}

/// Stable in-place sort of a loaded page.
pub fn sort_rows<R: TableRow>(rows: &mut [R], sort: SortDescriptor) {
    rows.sort_by(|left, right| compare_rows(left, right, sort));
}
pub fn compare_rows<R: TableRow>(left: &R, right: &R, sort: SortDescriptor) -> Ordering {
    let ordering = left.cell(sort.column).compare(&right.cell(sort.column));
    match sort.direction {
        SortDirection::Ascending => ordering,
        SortDirection::Descending => ordering.reverse(),
    }
}
