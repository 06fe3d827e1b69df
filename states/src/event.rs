use crate::{FetchError, PageResult, TaskId};

/// Message sent by a background task back to the registry's owner.
///
/// Tasks never touch view state; they only report through this channel and
/// the registry applies the event during `sync`, `next_event` or `settle`.
#[derive(Debug)]
pub(crate) enum Event<R> {
    DebounceElapsed {
        id: TaskId,
        text: String,
    },
    FetchResolved {
        id: TaskId,
        result: Result<PageResult<R>, FetchError>,
    },
}
