//! Admin dashboard screens built on `tourdesk-states`.
//!
//! Talks to the admin REST API, maps its pages into table rows, and wires
//! the tour catalog and user management screens to view registries.

pub mod api;
pub mod config;
pub mod http;
pub mod model;
pub mod mutation;
pub mod tours;
pub mod user_management;

pub use api::{ApiClient, ApiError, ApiResult, PageResponse, RestPageFetcher, page_query};
pub use config::{BusinessConfig, ConfigError, ENV_PREFIX};
pub use model::{
    ComplaintRow, ManagementRow, TagRow, TourDraft, TourRow, UserRow, UserStatus, complaint_columns,
    tag_columns, tour_columns, user_columns,
};
pub use mutation::{MutationKind, MutationOutcome, MutationState, MutationTracker};
pub use tours::{TOURS_VIEW, TourCatalog, tours_key};
pub use user_management::{ManagementAction, ManagementTab, UnknownTab, UserManagement};
