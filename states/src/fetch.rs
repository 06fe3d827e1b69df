//! Issuing page fetches and deciding which outcomes count.
//!
//! Requests for the same view may overlap: a user can page twice before the
//! first response lands. Every request gets a per-view generation and only the
//! outcome carrying the latest generation is applied. Older outcomes are
//! discarded no matter when they arrive.

use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use flume::Sender;
use log::debug;
use tokio_util::sync::CancellationToken;

use crate::event::Event;
use crate::{FetchError, PageResult, SortDescriptor, SortMode, TaskId, ViewKey};

/// Parameters of a single page fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    pub key: ViewKey,
    /// Zero-based.
    pub page_index: u32,
    pub page_size: u32,
    pub filter: String,
    /// The view's sort, whichever mode it is applied in.
    pub sort: Option<SortDescriptor>,
    pub sort_mode: SortMode,
}

impl PageRequest {
    /// One-based page number.
    pub fn page(&self) -> u32 {
        self.page_index + 1
    }

    /// The sort the server should apply. `None` for locally sorted views,
    /// which expect rows in the server's own order.
    pub fn server_sort(&self) -> Option<SortDescriptor> {
        match self.sort_mode {
            SortMode::Server => self.sort,
            SortMode::Local => None,
        }
    }
}

pub type FetchFuture<R> = Pin<Box<dyn Future<Output = Result<PageResult<R>, FetchError>> + Send>>;

/// Loads one page of a view's collection.
///
/// Implemented for any `Fn(PageRequest) -> impl Future` closure, so tests and
/// small callers do not need a named type.
pub trait PageFetcher<R>: Send + Sync {
    fn fetch_page(&self, request: PageRequest) -> FetchFuture<R>;
}

impl<R, F, Fut> PageFetcher<R> for F
where
    F: Fn(PageRequest) -> Fut + Send + Sync,
    Fut: Future<Output = Result<PageResult<R>, FetchError>> + Send + 'static,
{
    fn fetch_page(&self, request: PageRequest) -> FetchFuture<R> {
        Box::pin(self(request))
    }
}

/// Counters describing what happened to issued fetches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FetchStats {
    pub issued: u64,
    pub applied: u64,
    pub stale_discarded: u64,
    pub failed: u64,
}

pub(crate) struct FetchCoordinator<R> {
    latest: HashMap<ViewKey, u64>,
    in_flight: HashSet<TaskId>,
    stats: FetchStats,
    shutdown: CancellationToken,
    sender: Sender<Event<R>>,
}

impl<R: Send + 'static> FetchCoordinator<R> {
    pub(crate) fn new(sender: Sender<Event<R>>) -> Self {
        Self {
            latest: HashMap::new(),
            in_flight: HashSet::new(),
            stats: FetchStats::default(),
            shutdown: CancellationToken::new(),
            sender,
        }
    }

    /// Starts `fetcher` on a spawned task and returns the request's id.
    ///
    /// Earlier requests for the same key keep running; their outcomes turn
    /// stale. Must be called from within a tokio runtime.
    pub(crate) fn issue(&mut self, fetcher: &Arc<dyn PageFetcher<R>>, request: PageRequest) -> TaskId {
        let key = request.key;
        let generation = self.latest.entry(key).or_insert(0);
        *generation += 1;
        let id = TaskId::new(key, *generation);
        self.in_flight.insert(id);
        self.stats.issued += 1;

        debug!(
            "Fetching {key} page {} (size {}, filter {:?}, sort {:?}) as generation {}",
            request.page(),
            request.page_size,
            request.filter,
            request.sort,
            id.generation()
        );

        let future = fetcher.fetch_page(request);
        let token = self.shutdown.child_token();
        let sender = self.sender.clone();
        tokio::spawn(async move {
            tokio::select! {
                () = token.cancelled() => {
                    debug!("Fetch {id:?} cancelled by shutdown");
                }
                result = future => {
                    drop(sender.send(Event::FetchResolved { id, result }));
                }
            }
        });

        id
    }

    /// Marks `id` as no longer outstanding.
    pub(crate) fn settle(&mut self, id: TaskId) {
        self.in_flight.remove(&id);
    }

    pub(crate) fn is_latest(&self, id: TaskId) -> bool {
        self.latest.get(&id.key()) == Some(&id.generation())
    }

    /// Decides whether an outcome may be applied, counting it as stale if not.
    pub(crate) fn admit(&mut self, id: TaskId) -> bool {
        if self.is_latest(id) {
            true
        } else {
            self.stats.stale_discarded += 1;
            debug!(
                "Discarding stale response for {} (generation {}, latest {:?})",
                id.key(),
                id.generation(),
                self.latest.get(&id.key())
            );
            false
        }
    }

    pub(crate) fn record_applied(&mut self) {
        self.stats.applied += 1;
    }

    pub(crate) fn record_failed(&mut self) {
        self.stats.failed += 1;
    }

    pub(crate) fn outstanding(&self) -> usize {
        self.in_flight.len()
    }

    pub(crate) fn is_in_flight(&self, key: ViewKey) -> bool {
        self.in_flight.iter().any(|id| id.key() == key)
    }

    pub(crate) fn stats(&self) -> FetchStats {
        self.stats
    }

    /// Cancels every in-flight request and returns the views they were for.
    ///
    /// Requests issued afterwards run under a fresh token.
    pub(crate) fn shutdown(&mut self) -> Vec<ViewKey> {
        std::mem::take(&mut self.shutdown).cancel();
        let mut keys: Vec<ViewKey> = self.in_flight.drain().map(|id| id.key()).collect();
        keys.sort_unstable();
        keys.dedup();
        keys
    }
}

impl<R> Drop for FetchCoordinator<R> {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}
