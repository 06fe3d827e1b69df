//! Refreshing views after a mutation.
//!
//! A mutation names the views it touched and how their row counts moved. The
//! registry refetches each of them with its current parameters, clamping the
//! page first when rows were removed. Fetches started by one
//! `after_mutation` call form a batch: their outcomes are held back until the
//! whole batch has answered and then applied together, so a moved row never
//! shows up in both tabs or in neither.

use std::collections::HashSet;

use log::debug;

use crate::{FetchError, PageResult, TaskId, ViewKey, ViewState, clamp_page, total_pages};

/// How a mutation changed a view's collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationImpact {
    /// Rows changed in place.
    Changed,
    /// `n` rows left the collection.
    Removed(u64),
    /// `n` rows joined the collection.
    Added(u64),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AffectedView {
    pub key: ViewKey,
    pub impact: MutationImpact,
}

impl AffectedView {
    pub fn changed(key: ViewKey) -> Self {
        Self {
            key,
            impact: MutationImpact::Changed,
        }
    }

    pub fn removed(key: ViewKey, count: u64) -> Self {
        Self {
            key,
            impact: MutationImpact::Removed(count),
        }
    }

    pub fn added(key: ViewKey, count: u64) -> Self {
        Self {
            key,
            impact: MutationImpact::Added(count),
        }
    }
}

/// Folds repeated keys into one entry, keeping first-seen order.
///
/// Removals and additions on the same key net out; a view that lost and
/// gained the same number of rows is only `Changed`.
pub(crate) fn merge_affected(affected: &[AffectedView]) -> Vec<AffectedView> {
    let mut merged: Vec<(ViewKey, i128)> = Vec::new();
    for view in affected {
        let delta = match view.impact {
            MutationImpact::Changed => 0,
            MutationImpact::Removed(count) => -i128::from(count),
            MutationImpact::Added(count) => i128::from(count),
        };
        match merged.iter_mut().find(|(key, _)| *key == view.key) {
            Some((_, total)) => *total += delta,
            None => merged.push((view.key, delta)),
        }
    }
    merged
        .into_iter()
        .map(|(key, delta)| {
            let magnitude = u64::try_from(delta.unsigned_abs()).unwrap_or(u64::MAX);
            let impact = match delta.signum() {
                -1 => MutationImpact::Removed(magnitude),
                1 => MutationImpact::Added(magnitude),
                _ => MutationImpact::Changed,
            };
            AffectedView { key, impact }
        })
        .collect()
}

/// Moves `state.page` to where it will land once `impact` reaches the server.
///
/// Only removals can shrink the page count. Returns whether the page moved.
pub(crate) fn predict_page<R>(state: &mut ViewState<R>, impact: MutationImpact) -> bool {
    let MutationImpact::Removed(count) = impact else {
        return false;
    };
    let predicted_total = state.total_elements.saturating_sub(count);
    let predicted_pages = total_pages(predicted_total, state.page_size);
    let page = clamp_page(state.page, predicted_pages);
    if page == state.page {
        return false;
    }
    debug!(
        "Predicted {} rows after removal; moving from page {} to {page}",
        predicted_total, state.page
    );
    state.page = page;
    true
}

type Outcome<R> = (TaskId, Result<PageResult<R>, FetchError>);

struct Batch<R> {
    waiting: HashSet<TaskId>,
    staged: Vec<Outcome<R>>,
}

/// What to do with an arriving fetch outcome.
pub(crate) enum Staging<R> {
    /// Not part of any batch; apply now.
    Direct(Outcome<R>),
    /// Held until the rest of its batch answers.
    Held,
    /// The batch is complete; apply all of these in order.
    Flush(Vec<Outcome<R>>),
}

pub(crate) struct RefreshBatches<R> {
    batches: Vec<Batch<R>>,
}

impl<R> RefreshBatches<R> {
    pub(crate) fn new() -> Self {
        Self {
            batches: Vec::new(),
        }
    }

    /// Groups `ids` so their outcomes are applied together.
    pub(crate) fn open(&mut self, ids: impl IntoIterator<Item = TaskId>) {
        let waiting: HashSet<TaskId> = ids.into_iter().collect();
        if waiting.len() > 1 {
            debug!("Opened refresh batch of {} views", waiting.len());
            self.batches.push(Batch {
                waiting,
                staged: Vec::new(),
            });
        }
    }

    pub(crate) fn stage(&mut self, id: TaskId, result: Result<PageResult<R>, FetchError>) -> Staging<R> {
        let Some(index) = self
            .batches
            .iter()
            .position(|batch| batch.waiting.contains(&id))
        else {
            return Staging::Direct((id, result));
        };
        let batch = &mut self.batches[index];
        batch.waiting.remove(&id);
        batch.staged.push((id, result));
        if batch.waiting.is_empty() {
            Staging::Flush(self.batches.swap_remove(index).staged)
        } else {
            Staging::Held
        }
    }

    /// Drops members for `key` that a newer request superseded.
    ///
    /// Returns the outcomes of any batch that became complete as a result.
    pub(crate) fn supersede(&mut self, key: ViewKey) -> Vec<Outcome<R>> {
        let mut flushed = Vec::new();
        let mut index = 0;
        while index < self.batches.len() {
            let batch = &mut self.batches[index];
            batch.waiting.retain(|id| id.key() != key);
            if batch.waiting.is_empty() {
                flushed.extend(self.batches.swap_remove(index).staged);
            } else {
                index += 1;
            }
        }
        flushed
    }

    pub(crate) fn clear(&mut self) {
        self.batches.clear();
    }

    pub(crate) fn len(&self) -> usize {
        self.batches.len()
    }
}
