//! Row types returned by the admin API.
//!
//! All of them deserialize from camelCase JSON. The `id` field is optional
//! on the wire and may be a string or an integer; rows without one fall back
//! to a key made of their other identifying fields so selection still works.

use std::fmt::{self, Display};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use tourdesk_states::{CellValue, ColumnDescriptor, ColumnId, RowKey, TableRow};

fn rfc3339(at: &DateTime<Utc>) -> String {
    at.to_rfc3339()
}

#[derive(Deserialize)]
#[serde(untagged)]
enum WireId {
    Text(String),
    Number(i64),
}

/// Reads an optional id sent either as `"42"` or `42`.
fn optional_id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    Ok(Option::<WireId>::deserialize(deserializer)?.map(|id| match id {
        WireId::Text(text) => text,
        WireId::Number(number) => number.to_string(),
    }))
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TourRow {
    #[serde(default, deserialize_with = "optional_id")]
    pub id: Option<String>,
    pub title: String,
    #[serde(default)]
    pub destination: String,
    pub price: f64,
    #[serde(default)]
    pub duration_days: u32,
    #[serde(default)]
    pub status: String,
    pub created_at: DateTime<Utc>,
}

impl TableRow for TourRow {
    fn row_key(&self) -> RowKey {
        match &self.id {
            Some(id) => RowKey::new(id),
            None => RowKey::composite(&[&self.title, &rfc3339(&self.created_at)]),
        }
    }

    fn cell(&self, column: ColumnId) -> CellValue {
        match column.as_str() {
            "id" => CellValue::from(self.id.clone()),
            "title" => CellValue::text(self.title.clone()),
            "destination" => CellValue::text(self.destination.clone()),
            "price" => CellValue::Decimal(self.price),
            "duration_days" => CellValue::Integer(i64::from(self.duration_days)),
            "status" => CellValue::text(self.status.clone()),
            "created_at" => CellValue::Timestamp(self.created_at),
            _ => CellValue::Empty,
        }
    }
}

pub fn tour_columns() -> Vec<ColumnDescriptor> {
    vec![
        ColumnDescriptor::new("id", "ID").unsortable(),
        ColumnDescriptor::new("title", "Title"),
        ColumnDescriptor::new("destination", "Destination"),
        ColumnDescriptor::new("price", "Price"),
        ColumnDescriptor::new("duration_days", "Days"),
        ColumnDescriptor::new("status", "Status"),
        ColumnDescriptor::new("created_at", "Created"),
    ]
}

/// Body of tour create and update requests.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TourDraft {
    pub title: String,
    pub destination: String,
    pub price: f64,
    pub duration_days: u32,
    pub status: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserStatus {
    Active,
    Pending,
    Deactivated,
    Rejected,
}

impl UserStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Active => "ACTIVE",
            Self::Pending => "PENDING",
            Self::Deactivated => "DEACTIVATED",
            Self::Rejected => "REJECTED",
        }
    }
}

impl Display for UserStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRow {
    #[serde(default, deserialize_with = "optional_id")]
    pub id: Option<String>,
    pub email: String,
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub role: String,
    pub status: UserStatus,
    pub created_at: DateTime<Utc>,
}

impl TableRow for UserRow {
    fn row_key(&self) -> RowKey {
        match &self.id {
            Some(id) => RowKey::new(id),
            None => RowKey::composite(&["user", &self.email]),
        }
    }

    fn cell(&self, column: ColumnId) -> CellValue {
        match column.as_str() {
            "id" => CellValue::from(self.id.clone()),
            "email" => CellValue::text(self.email.clone()),
            "full_name" => CellValue::text(self.full_name.clone()),
            "role" => CellValue::text(self.role.clone()),
            "status" => CellValue::text(self.status.as_str()),
            "created_at" => CellValue::Timestamp(self.created_at),
            _ => CellValue::Empty,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComplaintRow {
    #[serde(default, deserialize_with = "optional_id")]
    pub id: Option<String>,
    pub reporter_email: String,
    pub subject: String,
    #[serde(default)]
    pub status: String,
    pub created_at: DateTime<Utc>,
}

impl TableRow for ComplaintRow {
    fn row_key(&self) -> RowKey {
        match &self.id {
            Some(id) => RowKey::new(id),
            None => RowKey::composite(&["complaint", &self.reporter_email, &rfc3339(&self.created_at)]),
        }
    }

    fn cell(&self, column: ColumnId) -> CellValue {
        match column.as_str() {
            "id" => CellValue::from(self.id.clone()),
            "reporter_email" => CellValue::text(self.reporter_email.clone()),
            "subject" => CellValue::text(self.subject.clone()),
            "status" => CellValue::text(self.status.clone()),
            "created_at" => CellValue::Timestamp(self.created_at),
            _ => CellValue::Empty,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TagRow {
    #[serde(default, deserialize_with = "optional_id")]
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub usage_count: u32,
}

impl TableRow for TagRow {
    fn row_key(&self) -> RowKey {
        match &self.id {
            Some(id) => RowKey::new(id),
            None => RowKey::composite(&["tag", &self.name]),
        }
    }

    fn cell(&self, column: ColumnId) -> CellValue {
        match column.as_str() {
            "id" => CellValue::from(self.id.clone()),
            "name" => CellValue::text(self.name.clone()),
            "usage_count" => CellValue::Integer(i64::from(self.usage_count)),
            _ => CellValue::Empty,
        }
    }
}

/// Any row shown on the user-management screen.
///
/// The six tabs share one registry, so their rows share one type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ManagementRow {
    User(UserRow),
    Complaint(ComplaintRow),
    Tag(TagRow),
}

impl ManagementRow {
    /// Server id, if the API sent one.
    pub fn id(&self) -> Option<&str> {
        match self {
            Self::User(row) => row.id.as_deref(),
            Self::Complaint(row) => row.id.as_deref(),
            Self::Tag(row) => row.id.as_deref(),
        }
    }

    pub fn as_user(&self) -> Option<&UserRow> {
        match self {
            Self::User(row) => Some(row),
            _ => None,
        }
    }
}

impl TableRow for ManagementRow {
    fn row_key(&self) -> RowKey {
        match self {
            Self::User(row) => row.row_key(),
            Self::Complaint(row) => row.row_key(),
            Self::Tag(row) => row.row_key(),
        }
    }

    fn cell(&self, column: ColumnId) -> CellValue {
        match self {
            Self::User(row) => row.cell(column),
            Self::Complaint(row) => row.cell(column),
            Self::Tag(row) => row.cell(column),
        }
    }
}

pub fn user_columns() -> Vec<ColumnDescriptor> {
    vec![
        ColumnDescriptor::new("id", "ID").unsortable(),
        ColumnDescriptor::new("email", "Email"),
        ColumnDescriptor::new("full_name", "Name"),
        ColumnDescriptor::new("role", "Role"),
        ColumnDescriptor::new("status", "Status").unsortable(),
        ColumnDescriptor::new("created_at", "Registered"),
    ]
}

pub fn complaint_columns() -> Vec<ColumnDescriptor> {
    vec![
        ColumnDescriptor::new("id", "ID").unsortable(),
        ColumnDescriptor::new("reporter_email", "Reporter"),
        ColumnDescriptor::new("subject", "Subject"),
        ColumnDescriptor::new("status", "Status"),
        ColumnDescriptor::new("created_at", "Filed"),
    ]
}

pub fn tag_columns() -> Vec<ColumnDescriptor> {
    vec![
        ColumnDescriptor::new("id", "ID").unsortable(),
        ColumnDescriptor::new("name", "Tag"),
        ColumnDescriptor::new("usage_count", "Used by"),
    ]
}
