//! Command implementations for the tourdesk CLI.

pub mod list;
pub mod tours;
pub mod users;

pub use tours::{run_tours_delete, run_tours_list};
pub use users::{run_moderation, run_users_list};
