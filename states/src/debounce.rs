//! Per-view debounce timers for search input.
//!
//! Every keystroke restarts the view's timer. When the quiet interval passes,
//! the timer task sends `Event::DebounceElapsed` and the registry commits the
//! text. A timer that loses the race against a newer keystroke may still
//! deliver its event, so arrival is checked against the live handle.

use std::collections::HashMap;
use std::time::Duration;

use flume::Sender;
use log::{debug, trace};
use tokio_util::sync::CancellationToken;

use crate::event::Event;
use crate::{TaskHandle, TaskId, ViewKey};

pub(crate) struct Debouncer<R> {
    delay: Duration,
    pending: HashMap<ViewKey, TaskHandle>,
    generations: HashMap<ViewKey, u64>,
    sender: Sender<Event<R>>,
}

impl<R: Send + 'static> Debouncer<R> {
    pub(crate) fn new(delay: Duration, sender: Sender<Event<R>>) -> Self {
        Self {
            delay,
            pending: HashMap::new(),
            generations: HashMap::new(),
            sender,
        }
    }

    /// Cancels any pending timer for `key` and starts a new one for `text`.
    ///
    /// Must be called from within a tokio runtime.
    pub(crate) fn schedule(&mut self, key: ViewKey, text: String) -> TaskId {
        self.cancel(key);

        let generation = self.generations.entry(key).or_insert(0);
        *generation += 1;
        let id = TaskId::new(key, *generation);
        let token = CancellationToken::new();
        let handle = TaskHandle::new(id, token.clone());
        self.pending.insert(key, handle);

        let delay = self.delay;
        let sender = self.sender.clone();
        tokio::spawn(async move {
            tokio::select! {
                () = token.cancelled() => {
                    trace!("Debounce timer {id:?} cancelled");
                }
                () = tokio::time::sleep(delay) => {
                    // The registry may already be gone; nothing to report to then.
                    drop(sender.send(Event::DebounceElapsed { id, text }));
                }
            }
        });

        debug!("Scheduled search commit for {key} in {delay:?}");
        id
    }

    /// Cancels the pending timer for `key`, if any.
    pub(crate) fn cancel(&mut self, key: ViewKey) -> bool {
        match self.pending.remove(&key) {
            Some(handle) => {
                handle.cancel();
                true
            }
            None => false,
        }
    }

    /// Claims an elapsed timer. Returns `false` when `id` was superseded or
    /// cancelled after it fired.
    pub(crate) fn accept(&mut self, id: TaskId) -> bool {
        match self.pending.get(&id.key()) {
            Some(handle) if handle.id() == id => {
                self.pending.remove(&id.key());
                true
            }
            _ => false,
        }
    }

    pub(crate) fn is_pending(&self, key: ViewKey) -> bool {
        self.pending.contains_key(&key)
    }

    pub(crate) fn pending_count(&self) -> usize {
        self.pending.len()
    }

    pub(crate) fn shutdown(&mut self) {
        for (_, handle) in self.pending.drain() {
            handle.cancel();
        }
    }
}

impl<R> Drop for Debouncer<R> {
    fn drop(&mut self) {
        for handle in self.pending.values() {
            handle.cancel();
        }
    }
}
