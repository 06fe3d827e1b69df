//! User management screen: six tabs sharing one registry.
//!
//! The four user tabs list `/admin/users` filtered by status. Complaints and
//! tags have their own endpoints. Moderating a user moves them between tabs,
//! so every action names the tabs it drains and fills and those are refreshed
//! together once the action completes.

use std::fmt::{self, Display};
use std::str::FromStr;
use std::sync::Arc;

use log::{info, warn};
use serde::Serialize;
use thiserror::Error;
use tourdesk_states::{
    AffectedView, ControllerConfig, SortDescriptor, TableModel, TableRow as _, TaskId, ViewKey, ViewRegistry,
    ViewSpec,
};

use crate::api::{ApiClient, ApiResult, RestPageFetcher};
use crate::model::{
    ComplaintRow, ManagementRow, TagRow, UserRow, UserStatus, complaint_columns, tag_columns, user_columns,
};
use crate::mutation::{MutationKind, MutationOutcome, MutationState, MutationTracker};

const USERS_PATH: &str = "/admin/users";
const COMPLAINTS_PATH: &str = "/admin/complaints";
const TAGS_PATH: &str = "/admin/tags";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ManagementTab {
    Active,
    Pending,
    Deactivated,
    Rejected,
    Complaints,
    Tags,
}

impl ManagementTab {
    pub const ALL: [Self; 6] = [
        Self::Active,
        Self::Pending,
        Self::Deactivated,
        Self::Rejected,
        Self::Complaints,
        Self::Tags,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Pending => "pending",
            Self::Deactivated => "deactivated",
            Self::Rejected => "rejected",
            Self::Complaints => "complaints",
            Self::Tags => "tags",
        }
    }

    pub fn key(self) -> ViewKey {
        ViewKey::new(self.as_str())
    }

    /// Status filter of a user tab; `None` for complaints and tags.
    pub fn user_status(self) -> Option<UserStatus> {
        match self {
            Self::Active => Some(UserStatus::Active),
            Self::Pending => Some(UserStatus::Pending),
            Self::Deactivated => Some(UserStatus::Deactivated),
            Self::Rejected => Some(UserStatus::Rejected),
            Self::Complaints | Self::Tags => None,
        }
    }
}

impl Display for ManagementTab {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown tab `{0}`; expected one of active, pending, deactivated, rejected, complaints, tags")]
pub struct UnknownTab(pub String);

impl FromStr for ManagementTab {
    type Err = UnknownTab;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|tab| tab.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UnknownTab(s.to_owned()))
    }
}

/// A moderation action and its targets (server ids, or a tag name).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ManagementAction {
    Approve(Vec<String>),
    Reject(Vec<String>),
    Deactivate(Vec<String>),
    Reactivate(Vec<String>),
    DeleteUser { tab: ManagementTab, ids: Vec<String> },
    ResolveComplaint(Vec<String>),
    DeleteTag(Vec<String>),
    CreateTag(String),
}

#[derive(Debug, Serialize)]
struct NewTag<'a> {
    name: &'a str,
}

impl ManagementAction {
    pub fn kind(&self) -> MutationKind {
        match self {
            Self::Approve(_) => MutationKind::Approve,
            Self::Reject(_) => MutationKind::Reject,
            Self::Deactivate(_) => MutationKind::Deactivate,
            Self::Reactivate(_) => MutationKind::Reactivate,
            Self::DeleteUser { .. } => MutationKind::DeleteUser,
            Self::ResolveComplaint(_) => MutationKind::ResolveComplaint,
            Self::DeleteTag(_) => MutationKind::DeleteTag,
            Self::CreateTag(_) => MutationKind::CreateTag,
        }
    }

    fn targets(&self) -> Vec<String> {
        match self {
            Self::Approve(ids)
            | Self::Reject(ids)
            | Self::Deactivate(ids)
            | Self::Reactivate(ids)
            | Self::DeleteUser { ids, .. }
            | Self::ResolveComplaint(ids)
            | Self::DeleteTag(ids) => ids.clone(),
            Self::CreateTag(name) => vec![name.clone()],
        }
    }

    fn moderates_users(&self) -> bool {
        matches!(
            self,
            Self::Approve(_)
                | Self::Reject(_)
                | Self::Deactivate(_)
                | Self::Reactivate(_)
                | Self::DeleteUser { .. }
        )
    }

    /// Views to refresh after `count` targets succeeded.
    pub fn affected(&self, count: u64) -> Vec<AffectedView> {
        if count == 0 {
            return Vec::new();
        }
        let moved = |from: ManagementTab, to: ManagementTab| {
            vec![
                AffectedView::removed(from.key(), count),
                AffectedView::added(to.key(), count),
            ]
        };
        match self {
            Self::Approve(_) => moved(ManagementTab::Pending, ManagementTab::Active),
            Self::Reject(_) => moved(ManagementTab::Pending, ManagementTab::Rejected),
            Self::Deactivate(_) => moved(ManagementTab::Active, ManagementTab::Deactivated),
            Self::Reactivate(_) => moved(ManagementTab::Deactivated, ManagementTab::Active),
            Self::DeleteUser { tab, .. } => vec![AffectedView::removed(tab.key(), count)],
            Self::ResolveComplaint(_) => {
                vec![AffectedView::removed(ManagementTab::Complaints.key(), count)]
            }
            Self::DeleteTag(_) => vec![AffectedView::removed(ManagementTab::Tags.key(), count)],
            Self::CreateTag(_) => vec![AffectedView::added(ManagementTab::Tags.key(), 1)],
        }
    }

    async fn send(&self, client: &ApiClient, target: &str) -> ApiResult<()> {
        match self {
            Self::Approve(_) => client.post(&format!("{USERS_PATH}/{target}/approve")).await,
            Self::Reject(_) => client.post(&format!("{USERS_PATH}/{target}/reject")).await,
            Self::Deactivate(_) => client.post(&format!("{USERS_PATH}/{target}/deactivate")).await,
            Self::Reactivate(_) => client.post(&format!("{USERS_PATH}/{target}/reactivate")).await,
            Self::DeleteUser { .. } => client.delete(&format!("{USERS_PATH}/{target}")).await,
            Self::ResolveComplaint(_) => {
                client.post(&format!("{COMPLAINTS_PATH}/{target}/resolve")).await
            }
            Self::DeleteTag(_) => client.delete(&format!("{TAGS_PATH}/{target}")).await,
            Self::CreateTag(_) => client.post_json(TAGS_PATH, &NewTag { name: target }).await,
        }
    }
}

fn tab_spec(
    client: &ApiClient,
    tab: ManagementTab,
    acting_user_id: Option<&str>,
) -> ViewSpec<ManagementRow> {
    match tab.user_status() {
        Some(status) => {
            let fetcher: RestPageFetcher<UserRow, ManagementRow> =
                RestPageFetcher::new(client.clone(), USERS_PATH, "user page", ManagementRow::User)
                    .with_query("status", status.as_str());
            let acting = acting_user_id.map(str::to_owned);
            ViewSpec::new(Arc::new(fetcher), user_columns())
                .with_sort(SortDescriptor::descending("created_at"))
                .server_sorted()
                .with_selectable(move |row: &ManagementRow| {
                    row.as_user()
                        .is_none_or(|user| acting.is_none() || user.id != acting)
                })
        }
        None if tab == ManagementTab::Complaints => {
            let fetcher: RestPageFetcher<ComplaintRow, ManagementRow> =
                RestPageFetcher::new(client.clone(), COMPLAINTS_PATH, "complaint page", ManagementRow::Complaint);
            ViewSpec::new(Arc::new(fetcher), complaint_columns())
                .with_sort(SortDescriptor::descending("created_at"))
                .server_sorted()
        }
        None => {
            let fetcher: RestPageFetcher<TagRow, ManagementRow> =
                RestPageFetcher::new(client.clone(), TAGS_PATH, "tag page", ManagementRow::Tag);
            ViewSpec::new(Arc::new(fetcher), tag_columns()).with_sort(SortDescriptor::ascending("name"))
        }
    }
}

pub struct UserManagement {
    client: ApiClient,
    registry: ViewRegistry<ManagementRow>,
    tracker: MutationTracker,
    acting_user_id: Option<String>,
}

impl UserManagement {
    pub fn new(client: ApiClient, config: ControllerConfig, acting_user_id: Option<String>) -> Self {
        let mut registry = ViewRegistry::new(config);
        for tab in ManagementTab::ALL {
            registry.register(tab.key(), tab_spec(&client, tab, acting_user_id.as_deref()));
        }
        Self {
            client,
            registry,
            tracker: MutationTracker::default(),
            acting_user_id,
        }
    }

    /// Switches to `tab`, loading it if it never loaded or went stale.
    pub fn open(&mut self, tab: ManagementTab) -> Option<TaskId> {
        info!("Opening {tab} tab");
        self.registry.select_active(tab.key())
    }

    pub fn active_tab(&self) -> Option<ManagementTab> {
        let active = self.registry.active()?;
        ManagementTab::ALL.into_iter().find(|tab| tab.key() == active)
    }

    pub fn registry(&self) -> &ViewRegistry<ManagementRow> {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut ViewRegistry<ManagementRow> {
        &mut self.registry
    }

    pub fn table(&self, tab: ManagementTab) -> Option<TableModel> {
        self.registry.table(tab.key())
    }

    pub fn mutation(&self) -> &MutationState {
        self.tracker.state()
    }

    /// Server ids of the selected rows on `tab`.
    pub fn selected_ids(&self, tab: ManagementTab) -> Vec<String> {
        let rows = self.registry.selected_rows(tab.key());
        let mut ids = Vec::with_capacity(rows.len());
        for row in rows {
            match row.id() {
                Some(id) => ids.push(id.to_owned()),
                None => warn!("Selected row {} on {tab} has no id; skipping", row.row_key()),
            }
        }
        ids
    }

    /// Runs `action`, then refreshes the tabs it touched.
    ///
    /// The acting administrator is never a target of a user moderation.
    pub async fn perform(&mut self, action: &ManagementAction) -> MutationOutcome {
        let mut refused = MutationOutcome::default();
        let mut targets = action.targets();
        if action.moderates_users()
            && let Some(me) = self.acting_user_id.as_deref()
        {
            targets.retain(|id| {
                let own = id == me;
                if own {
                    refused.refuse(id, "cannot moderate your own account");
                }
                !own
            });
        }

        let client = &self.client;
        let outcome = self
            .tracker
            .run(action.kind(), &targets, refused, move |target| async move {
                action.send(client, &target).await
            })
            .await;

        let affected = action.affected(outcome.succeeded_count());
        if !affected.is_empty() {
            self.registry.after_mutation(&affected);
        }
        outcome
    }

    /// Runs the action built from the current selection on `tab`.
    pub async fn perform_on_selection(
        &mut self,
        tab: ManagementTab,
        build: impl FnOnce(Vec<String>) -> ManagementAction,
    ) -> MutationOutcome {
        let ids = self.selected_ids(tab);
        self.perform(&build(ids)).await
    }

    pub async fn settle(&mut self) {
        self.registry.settle().await;
    }
}
