//! Tour catalog screen: one server-sorted `tours` table plus CRUD.

use std::sync::Arc;

use log::info;
use tourdesk_states::{
    AffectedView, ControllerConfig, SortDescriptor, TableModel, TaskId, ViewKey, ViewRegistry, ViewSpec,
};

use crate::api::{ApiClient, RestPageFetcher};
use crate::model::{TourDraft, TourRow, tour_columns};
use crate::mutation::{MutationKind, MutationOutcome, MutationState, MutationTracker};

pub const TOURS_VIEW: &str = "tours";
const TOURS_PATH: &str = "/admin/tours";

pub fn tours_key() -> ViewKey {
    ViewKey::new(TOURS_VIEW)
}

pub struct TourCatalog {
    client: ApiClient,
    registry: ViewRegistry<TourRow>,
    tracker: MutationTracker,
}

impl TourCatalog {
    pub fn new(client: ApiClient, config: ControllerConfig) -> Self {
        let mut registry = ViewRegistry::new(config);
        let fetcher = RestPageFetcher::new(client.clone(), TOURS_PATH, "tour page", |row: TourRow| row);
        registry.register(
            tours_key(),
            ViewSpec::new(Arc::new(fetcher), tour_columns())
                .with_sort(SortDescriptor::descending("created_at"))
                .server_sorted(),
        );
        Self {
            client,
            registry,
            tracker: MutationTracker::default(),
        }
    }

    /// Makes the tours table active, loading it if needed.
    pub fn open(&mut self) -> Option<TaskId> {
        self.registry.select_active(tours_key())
    }

    pub fn registry(&self) -> &ViewRegistry<TourRow> {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut ViewRegistry<TourRow> {
        &mut self.registry
    }

    pub fn table(&self) -> Option<TableModel> {
        self.registry.table(tours_key())
    }

    pub fn mutation(&self) -> &MutationState {
        self.tracker.state()
    }

    pub async fn create(&mut self, draft: &TourDraft) -> MutationOutcome {
        let client = &self.client;
        let targets = [draft.title.clone()];
        let outcome = self
            .tracker
            .run(MutationKind::CreateTour, &targets, MutationOutcome::default(), |_| {
                client.post_json(TOURS_PATH, draft)
            })
            .await;
        if outcome.succeeded_count() > 0 {
            self.registry.after_mutation(&[AffectedView::added(tours_key(), 1)]);
        }
        outcome
    }

    pub async fn update(&mut self, id: &str, draft: &TourDraft) -> MutationOutcome {
        let client = &self.client;
        let outcome = self
            .tracker
            .run(MutationKind::UpdateTour, &[id.to_owned()], MutationOutcome::default(), |id| async move {
                client.put_json(&format!("{TOURS_PATH}/{id}"), draft).await
            })
            .await;
        if outcome.succeeded_count() > 0 {
            self.registry.after_mutation(&[AffectedView::changed(tours_key())]);
        }
        outcome
    }

    pub async fn delete(&mut self, ids: &[String]) -> MutationOutcome {
        let client = &self.client;
        let outcome = self
            .tracker
            .run(MutationKind::DeleteTour, ids, MutationOutcome::default(), |id| async move {
                client.delete(&format!("{TOURS_PATH}/{id}")).await
            })
            .await;
        let removed = outcome.succeeded_count();
        if removed > 0 {
            info!("Deleted {removed} tour(s)");
            self.registry
                .after_mutation(&[AffectedView::removed(tours_key(), removed)]);
        }
        outcome
    }

    /// Deletes every selected tour that has a server id.
    pub async fn delete_selected(&mut self) -> MutationOutcome {
        let ids: Vec<String> = self
            .registry
            .selected_rows(tours_key())
            .into_iter()
            .filter_map(|row| row.id)
            .collect();
        self.delete(&ids).await
    }

    pub async fn settle(&mut self) {
        self.registry.settle().await;
    }
}
