//! Row type and fetchers shared by the crate's tests.

use std::sync::{Arc, Mutex};

use tokio::sync::oneshot;

use crate::{
    CellValue, ColumnDescriptor, ColumnId, FetchError, FetchFuture, PageFetcher, PageRequest,
    PageResult, RowKey, TableRow, sort_rows, total_pages,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct TestRow {
    pub(crate) id: u32,
    pub(crate) name: String,
    pub(crate) locked: bool,
}

impl TestRow {
    pub(crate) fn new(id: u32, name: &str) -> Self {
        Self {
            id,
            name: name.to_owned(),
            locked: false,
        }
    }

    pub(crate) fn locked(mut self) -> Self {
        self.locked = true;
        self
    }
}

impl TableRow for TestRow {
    fn row_key(&self) -> RowKey {
        RowKey::new(&self.id.to_string())
    }

    fn cell(&self, column: ColumnId) -> CellValue {
        match column.as_str() {
            "id" => CellValue::Integer(i64::from(self.id)),
            "name" => CellValue::text(self.name.clone()),
            "locked" => CellValue::Bool(self.locked),
            _ => CellValue::Empty,
        }
    }
}

pub(crate) fn test_columns() -> Vec<ColumnDescriptor> {
    vec![
        ColumnDescriptor::new("id", "ID"),
        ColumnDescriptor::new("name", "Name"),
        ColumnDescriptor::new("locked", "Locked").unsortable(),
    ]
}

/// Rows `1..=count` named `row-<id>`.
pub(crate) fn numbered_rows(count: u32) -> Vec<TestRow> {
    (1..=count)
        .map(|id| TestRow::new(id, &format!("row-{id}")))
        .collect()
}

struct Dataset {
    rows: Vec<TestRow>,
    requests: Vec<PageRequest>,
    fail_next: Option<FetchError>,
}

/// Serves pages out of a vector and records every request.
///
/// Filters by case-insensitive substring on `name` and applies the request's
/// sort before slicing, like a server-sorted endpoint would.
#[derive(Clone)]
pub(crate) struct InMemoryFetcher {
    dataset: Arc<Mutex<Dataset>>,
}

impl InMemoryFetcher {
    pub(crate) fn new(rows: Vec<TestRow>) -> Self {
        Self {
            dataset: Arc::new(Mutex::new(Dataset {
                rows,
                requests: Vec::new(),
                fail_next: None,
            })),
        }
    }

    pub(crate) fn shared(&self) -> Arc<dyn PageFetcher<TestRow>> {
        Arc::new(self.clone())
    }

    pub(crate) fn request_count(&self) -> usize {
        self.dataset.lock().expect("dataset lock").requests.len()
    }

    pub(crate) fn last_request(&self) -> Option<PageRequest> {
        self.dataset.lock().expect("dataset lock").requests.last().cloned()
    }

    pub(crate) fn remove(&self, ids: &[u32]) {
        self.dataset
            .lock()
            .expect("dataset lock")
            .rows
            .retain(|row| !ids.contains(&row.id));
    }

    pub(crate) fn push(&self, row: TestRow) {
        self.dataset.lock().expect("dataset lock").rows.push(row);
    }

    pub(crate) fn fail_next(&self, error: FetchError) {
        self.dataset.lock().expect("dataset lock").fail_next = Some(error);
    }
}

impl PageFetcher<TestRow> for InMemoryFetcher {
    fn fetch_page(&self, request: PageRequest) -> FetchFuture<TestRow> {
        let mut dataset = self.dataset.lock().expect("dataset lock");
        dataset.requests.push(request.clone());
        if let Some(error) = dataset.fail_next.take() {
            return Box::pin(async move { Err(error) });
        }

        let needle = request.filter.to_lowercase();
        let mut matching: Vec<TestRow> = dataset
            .rows
            .iter()
            .filter(|row| row.name.to_lowercase().contains(&needle))
            .cloned()
            .collect();
        if let Some(sort) = request.server_sort() {
            sort_rows(&mut matching, sort);
        }

        let total_elements = matching.len() as u64;
        let size = request.page_size as usize;
        let start = (request.page_index as usize).saturating_mul(size).min(matching.len());
        let end = start.saturating_add(size).min(matching.len());
        let page = PageResult::new(
            matching[start..end].to_vec(),
            total_pages(total_elements, request.page_size),
            total_elements,
        );
        Box::pin(async move { Ok(page) })
    }
}

type Gate<R> = oneshot::Sender<Result<PageResult<R>, FetchError>>;

struct Gates<R> {
    requests: Vec<PageRequest>,
    senders: Vec<Option<Gate<R>>>,
}

/// Fetcher whose responses are released by the test, in any order.
///
/// Call `n` of `fetch_page` is answered by `release(n, ..)`.
pub(crate) struct GatedFetcher<R> {
    gates: Arc<Mutex<Gates<R>>>,
}

impl<R> Clone for GatedFetcher<R> {
    fn clone(&self) -> Self {
        Self {
            gates: Arc::clone(&self.gates),
        }
    }
}

impl<R: Send + 'static> GatedFetcher<R> {
    pub(crate) fn new() -> Self {
        Self {
            gates: Arc::new(Mutex::new(Gates {
                requests: Vec::new(),
                senders: Vec::new(),
            })),
        }
    }

    pub(crate) fn shared(&self) -> Arc<dyn PageFetcher<R>> {
        Arc::new(self.clone())
    }

    pub(crate) fn requests(&self) -> Vec<PageRequest> {
        self.gates.lock().expect("gate lock").requests.clone()
    }

    pub(crate) fn release(&self, call: usize, result: Result<PageResult<R>, FetchError>) {
        let sender = self.gates.lock().expect("gate lock").senders[call]
            .take()
            .expect("call not yet released");
        // The fetch may have been cancelled; then nobody is listening.
        drop(sender.send(result));
    }
}

impl<R: Send + 'static> PageFetcher<R> for GatedFetcher<R> {
    fn fetch_page(&self, request: PageRequest) -> FetchFuture<R> {
        let (sender, receiver) = oneshot::channel();
        let mut gates = self.gates.lock().expect("gate lock");
        gates.requests.push(request);
        gates.senders.push(Some(sender));
        Box::pin(async move {
            receiver
                .await
                .unwrap_or_else(|_| Err(FetchError::transport("gate dropped")))
        })
    }
}

/// A page of `TestRow`s with the given ids and collection totals.
pub(crate) fn page_of(ids: &[u32], total_pages: u32, total_elements: u64) -> PageResult<TestRow> {
    PageResult::new(
        ids.iter().map(|id| TestRow::new(*id, &format!("row-{id}"))).collect(),
        total_pages,
        total_elements,
    )
}
