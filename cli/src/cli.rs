use clap::{Args, Parser, Subcommand};
use tourdesk_business::ManagementTab;
use tourdesk_states::SortDescriptor;

#[derive(Parser)]
#[command(name = "tourdesk")]
#[command(about = "Admin dashboard tables from the terminal", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Admin API base URL (overrides TOURDESK_API_BASE_URL)
    #[arg(long, global = true)]
    pub api_url: Option<String>,

    /// Bearer token (overrides TOURDESK_API_TOKEN)
    #[arg(long, global = true)]
    pub token: Option<String>,

    /// Show timing/latency information
    #[arg(long, global = true)]
    pub timing: bool,

    /// Enable verbose debug output
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Browse and manage the tour catalog
    Tours {
        #[command(subcommand)]
        command: TourCommands,
    },
    /// Moderate users, complaints and tags
    Users {
        #[command(subcommand)]
        command: UserCommands,
    },
}

#[derive(Subcommand)]
pub enum TourCommands {
    /// List one page of tours
    List(ListArgs),
    /// Delete tours by id
    Delete {
        #[arg(required = true)]
        ids: Vec<String>,
    },
}

#[derive(Subcommand)]
pub enum UserCommands {
    /// List one page of a user-management tab
    List {
        /// active, pending, deactivated, rejected, complaints or tags
        #[arg(long, short = 't', default_value = "pending")]
        tab: ManagementTab,

        #[command(flatten)]
        list: ListArgs,
    },
    /// Approve pending users
    Approve {
        #[arg(required = true)]
        ids: Vec<String>,
    },
    /// Reject pending users
    Reject {
        #[arg(required = true)]
        ids: Vec<String>,
    },
    /// Deactivate active users
    Deactivate {
        #[arg(required = true)]
        ids: Vec<String>,
    },
    /// Reactivate deactivated users
    Reactivate {
        #[arg(required = true)]
        ids: Vec<String>,
    },
    /// Mark complaints as resolved
    ResolveComplaint {
        #[arg(required = true)]
        ids: Vec<String>,
    },
    /// Delete tags
    DeleteTag {
        #[arg(required = true)]
        ids: Vec<String>,
    },
}

#[derive(Args, Debug, Clone, Default)]
pub struct ListArgs {
    /// Page number, starting at 1
    #[arg(long, short = 'p', default_value = "1")]
    pub page: u32,

    /// Rows per page
    #[arg(long, short = 's')]
    pub size: Option<u32>,

    /// Search text
    #[arg(long, short = 'q')]
    pub search: Option<String>,

    /// Sort column, optionally suffixed with `:desc` or `:asc`
    #[arg(long, value_parser = parse_sort)]
    pub sort: Option<SortDescriptor>,

    /// Comma-separated columns to show
    #[arg(long, value_delimiter = ',')]
    pub columns: Vec<String>,
}

pub fn parse_sort(value: &str) -> Result<SortDescriptor, String> {
    let (column, direction) = value.split_once(':').unwrap_or((value, "asc"));
    let column = column.trim();
    if column.is_empty() {
        return Err("sort column must not be empty".to_owned());
    }
    match direction.trim().to_ascii_lowercase().as_str() {
        "asc" => Ok(SortDescriptor::ascending(column)),
        "desc" => Ok(SortDescriptor::descending(column)),
        other => Err(format!("unknown sort direction `{other}`; use asc or desc")),
    }
}
