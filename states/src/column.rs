use std::collections::BTreeSet;
use std::fmt::{Display, Formatter};

use ustr::Ustr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ColumnId(Ustr);

impl ColumnId {
    pub fn new(name: &str) -> Self {
        Self(Ustr::from(name))
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl From<&str> for ColumnId {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl Display for ColumnId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One entry of a view's static column catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDescriptor {
    pub id: ColumnId,
    pub label: String,
    pub sortable: bool,
}

impl ColumnDescriptor {
    pub fn new(id: &str, label: impl Into<String>) -> Self {
        Self {
            id: ColumnId::new(id),
            label: label.into(),
            sortable: true,
        }
    }

    /// Marks the column as not sortable; sort requests for it are ignored.
    pub fn unsortable(mut self) -> Self {
        self.sortable = false;
        self
    }
}

/// Which catalog columns a view shows.
///
/// `All` is a sentinel rather than a snapshot of ids, so columns added to the
/// catalog later are visible without touching the view.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum VisibleColumns {
    #[default]
    All,
    Only(BTreeSet<ColumnId>),
}

impl VisibleColumns {
    pub fn only<'a>(ids: impl IntoIterator<Item = &'a str>) -> Self {
        Self::Only(ids.into_iter().map(ColumnId::new).collect())
    }

    pub fn contains(&self, id: ColumnId) -> bool {
        match self {
            Self::All => true,
            Self::Only(ids) => ids.contains(&id),
        }
    }
}

/// Projects a column catalog through a visibility setting.
///
/// Output keeps catalog order. Ids in `Only` that the catalog does not know
/// are dropped.
pub fn visible_columns<'a>(
    catalog: &'a [ColumnDescriptor],
    visible: &VisibleColumns,
) -> Vec<&'a ColumnDescriptor> {
    catalog
        .iter()
        .filter(|column| visible.contains(column.id))
        .collect()
}
