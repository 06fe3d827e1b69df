use std::cmp::Ordering;
use std::fmt::{Display, Formatter};

use chrono::{DateTime, Utc};
use ustr::Ustr;

use crate::ColumnId;

/// Stable identity of a row within its view.
///
/// Derived from the row itself: the server id when present, otherwise a
/// composite of fields that never change. Never positional.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RowKey(Ustr);

impl RowKey {
    pub fn new(value: &str) -> Self {
        Self(Ustr::from(value))
    }

    /// Builds a key from several immutable fields.
    ///
    /// Parts are joined with a unit separator, which does not appear in
    /// user-entered text, so `("a|b", "c")` and `("a", "b|c")` stay distinct.
    pub fn composite(parts: &[&str]) -> Self {
        Self(Ustr::from(&parts.join("\u{1f}")))
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl From<&str> for RowKey {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl Display for RowKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.as_str().replace('\u{1f}', "/"))
    }
}

/// A single table cell, as seen by the local sort and by renderers.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Empty,
    Text(String),
    Integer(i64),
    Decimal(f64),
    Bool(bool),
    Timestamp(DateTime<Utc>),
}

impl CellValue {
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }

    fn rank(&self) -> u8 {
        match self {
            Self::Empty => 0,
            Self::Bool(_) => 1,
            Self::Integer(_) | Self::Decimal(_) => 2,
            Self::Timestamp(_) => 3,
            Self::Text(_) => 4,
        }
    }

    /// Total order used when sorting a loaded page.
    ///
    /// Empty cells sort first. Integers and decimals compare numerically with
    /// each other. Text compares case-insensitively, falling back to a
    /// byte-wise comparison so the order stays total.
    pub fn compare(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Empty, Self::Empty) => Ordering::Equal,
            (Self::Bool(a), Self::Bool(b)) => a.cmp(b),
            (Self::Integer(a), Self::Integer(b)) => a.cmp(b),
            (Self::Decimal(a), Self::Decimal(b)) => a.total_cmp(b),
            (Self::Integer(a), Self::Decimal(b)) => (*a as f64).total_cmp(b),
            (Self::Decimal(a), Self::Integer(b)) => a.total_cmp(&(*b as f64)),
            (Self::Timestamp(a), Self::Timestamp(b)) => a.cmp(b),
            (Self::Text(a), Self::Text(b)) => a
                .to_lowercase()
                .cmp(&b.to_lowercase())
                .then_with(|| a.cmp(b)),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

impl Display for CellValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty => Ok(()),
            Self::Text(value) => f.write_str(value),
            Self::Integer(value) => write!(f, "{value}"),
            Self::Decimal(value) => write!(f, "{value:.2}"),
            Self::Bool(true) => f.write_str("yes"),
            Self::Bool(false) => f.write_str("no"),
            Self::Timestamp(value) => write!(f, "{}", value.format("%Y-%m-%d %H:%M")),
        }
    }
}

impl From<Option<String>> for CellValue {
    fn from(value: Option<String>) -> Self {
        value.map_or(Self::Empty, Self::Text)
    }
}

/// A row that a view can cache, select, sort and render.
pub trait TableRow: Clone + Send + Sync + 'static {
    fn row_key(&self) -> RowKey;

    /// Cell for `column`; unknown columns yield `CellValue::Empty`.
    fn cell(&self, column: ColumnId) -> CellValue;
}

/// One page of a server-side collection.
#[derive(Debug, Clone, PartialEq)]
pub struct PageResult<R> {
    pub rows: Vec<R>,
    pub total_pages: u32,
    pub total_elements: u64,
}

impl<R> PageResult<R> {
    pub fn new(rows: Vec<R>, total_pages: u32, total_elements: u64) -> Self {
        Self {
            rows,
            total_pages,
            total_elements,
        }
    }

    pub fn empty() -> Self {
        Self::new(Vec::new(), 0, 0)
    }
}
