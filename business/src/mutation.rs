//! Outcome tracking for dashboard mutations.
//!
//! A screen runs at most one mutation at a time. The tracker holds the last
//! mutation's state so a renderer can show a spinner, a confirmation or an
//! error banner.

use std::future::Future;

use log::{info, warn};

use crate::api::ApiResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationKind {
    CreateTour,
    UpdateTour,
    DeleteTour,
    Approve,
    Reject,
    Deactivate,
    Reactivate,
    DeleteUser,
    ResolveComplaint,
    DeleteTag,
    CreateTag,
}

impl MutationKind {
    pub fn label(self) -> &'static str {
        match self {
            Self::CreateTour => "create tour",
            Self::UpdateTour => "update tour",
            Self::DeleteTour => "delete tour",
            Self::Approve => "approve",
            Self::Reject => "reject",
            Self::Deactivate => "deactivate",
            Self::Reactivate => "reactivate",
            Self::DeleteUser => "delete user",
            Self::ResolveComplaint => "resolve complaint",
            Self::DeleteTag => "delete tag",
            Self::CreateTag => "create tag",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum MutationState {
    #[default]
    Idle,

    InFlight { kind: MutationKind, targets: usize },

    Success { kind: MutationKind, succeeded: usize },

    /// At least one target failed. `succeeded` targets were still applied.
    Error {
        kind: MutationKind,
        succeeded: usize,
        message: String,
    },
}

/// Result of running one mutation over its targets.
#[derive(Debug, Clone, Default)]
pub struct MutationOutcome {
    pub succeeded: Vec<String>,
    /// Failed targets with the reason each failed.
    pub failed: Vec<(String, String)>,
}

impl MutationOutcome {
    pub fn succeeded_count(&self) -> u64 {
        self.succeeded.len() as u64
    }

    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }

    /// Records a target that was refused before reaching the server.
    pub(crate) fn refuse(&mut self, target: &str, reason: &str) {
        self.failed.push((target.to_owned(), reason.to_owned()));
    }
}

#[derive(Debug, Clone, Default)]
pub struct MutationTracker {
    state: MutationState,
}

impl MutationTracker {
    pub fn is_in_flight(&self) -> bool {
        matches!(self.state, MutationState::InFlight { .. })
    }

    pub fn state(&self) -> &MutationState {
        &self.state
    }

    pub fn reset(&mut self) {
        self.state = MutationState::Idle;
    }

    /// Calls `op` once per target, in order, and records the combined outcome.
    ///
    /// A failing target does not stop the remaining ones.
    pub async fn run<F, Fut>(
        &mut self,
        kind: MutationKind,
        targets: &[String],
        mut outcome: MutationOutcome,
        mut op: F,
    ) -> MutationOutcome
    where
        F: FnMut(String) -> Fut,
        Fut: Future<Output = ApiResult<()>>,
    {
        self.state = MutationState::InFlight {
            kind,
            targets: targets.len() + outcome.failed.len(),
        };

        for target in targets {
            match op(target.clone()).await {
                Ok(()) => outcome.succeeded.push(target.clone()),
                Err(e) => {
                    warn!("{} failed for {target}: {e}", kind.label());
                    outcome.failed.push((target.clone(), e.to_string()));
                }
            }
        }

        self.finish(kind, &outcome);
        outcome
    }

    fn finish(&mut self, kind: MutationKind, outcome: &MutationOutcome) {
        let succeeded = outcome.succeeded.len();
        self.state = if outcome.is_complete() {
            info!("{} succeeded for {succeeded} target(s)", kind.label());
            MutationState::Success { kind, succeeded }
        } else {
            let message = outcome
                .failed
                .iter()
                .map(|(target, e)| format!("{target}: {e}"))
                .collect::<Vec<_>>()
                .join("; ");
            MutationState::Error {
                kind,
                succeeded,
                message,
            }
        };
    }
}
