//! Client for the admin REST API and the page fetcher built on it.
//!
//! Every list endpoint answers `GET {api_url}{path}?page=&size=[&search=][&sort=]`
//! with a Spring-style page body:
//!
//! ```json
//! { "content": [...], "totalPages": 3, "totalElements": 25 }
//! ```
//!
//! `page` is zero-based on the wire. `sort` is `column,asc` or `column,desc`
//! and is only sent for server-sorted views.

use std::marker::PhantomData;
use std::sync::Arc;

use log::{debug, warn};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tourdesk_states::{FetchError, FetchFuture, PageFetcher, PageRequest, PageResult};
use ustr::Ustr;

use crate::config::BusinessConfig;
use crate::http::{Client, HttpError, RequestBuilder, Response};

/// Longest error body kept in an [`ApiError::Status`].
const MAX_ERROR_BODY: usize = 512;

#[derive(Debug, Clone, Error)]
pub enum ApiError {
    #[error(transparent)]
    Http(#[from] HttpError),
    #[error("API returned status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("failed to parse {what}: {message}")]
    Decode { what: &'static str, message: String },
    #[error("failed to encode request body: {0}")]
    Encode(String),
}

impl ApiError {
    fn from_response(response: &Response) -> Self {
        let mut body = response.text_lossy().trim().to_owned();
        if body.len() > MAX_ERROR_BODY {
            let mut cut = MAX_ERROR_BODY;
            while !body.is_char_boundary(cut) {
                cut -= 1;
            }
            body.truncate(cut);
            body.push('…');
        }
        Self::Status {
            status: response.status,
            body,
        }
    }
}

impl From<ApiError> for FetchError {
    fn from(error: ApiError) -> Self {
        match error {
            ApiError::Http(e) => Self::transport(e.message),
            ApiError::Status { status, body } => Self::status(status, body),
            ApiError::Decode { what, message } => Self::decode(format!("{what}: {message}")),
            ApiError::Encode(message) => Self::transport(message),
        }
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

/// Body of every paginated list endpoint.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageResponse<T> {
    #[serde(default = "Vec::new")]
    pub content: Vec<T>,
    #[serde(default)]
    pub total_pages: u32,
    #[serde(default)]
    pub total_elements: u64,
}

impl<T> PageResponse<T> {
    pub fn into_result<R>(self, map: impl FnMut(T) -> R) -> PageResult<R> {
        PageResult::new(
            self.content.into_iter().map(map).collect(),
            self.total_pages,
            self.total_elements,
        )
    }
}

/// Authenticated access to `{api_base_url}/api`.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: Client,
    api_url: Ustr,
    token: Option<Arc<str>>,
}

impl ApiClient {
    pub fn new(config: &BusinessConfig) -> Self {
        Self {
            http: Client::new(),
            api_url: config.api_url(),
            token: config.api_token().map(Arc::from),
        }
    }

    pub fn api_url(&self) -> Ustr {
        self.api_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.api_url)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => request.bearer(token),
            None => request,
        }
    }

    async fn execute(&self, request: RequestBuilder) -> ApiResult<Response> {
        let response = self.authorize(request).send().await?;
        if !response.is_success() {
            warn!("Admin API returned status {}", response.status);
            return Err(ApiError::from_response(&response));
        }
        Ok(response)
    }

    /// GET `{path}` with query parameters, decoding the body as `T`.
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: Vec<(String, String)>,
        what: &'static str,
    ) -> ApiResult<T> {
        let request = self.http.get(self.url(path)).queries(query);
        let response = self.execute(request).await?;
        response.json().map_err(|e| ApiError::Decode {
            what,
            message: e.to_string(),
        })
    }

    /// POST `{path}` with a JSON body. The response body is ignored.
    pub async fn post_json<B: serde::Serialize>(&self, path: &str, body: &B) -> ApiResult<()> {
        let request = self
            .http
            .post(self.url(path))
            .json(body)
            .map_err(|e| ApiError::Encode(e.to_string()))?;
        self.execute(request).await.map(drop)
    }

    /// POST `{path}` without a body.
    pub async fn post(&self, path: &str) -> ApiResult<()> {
        self.execute(self.http.post(self.url(path))).await.map(drop)
    }

    /// PUT `{path}` with a JSON body. The response body is ignored.
    pub async fn put_json<B: serde::Serialize>(&self, path: &str, body: &B) -> ApiResult<()> {
        let request = self
            .http
            .put(self.url(path))
            .json(body)
            .map_err(|e| ApiError::Encode(e.to_string()))?;
        self.execute(request).await.map(drop)
    }

    pub async fn delete(&self, path: &str) -> ApiResult<()> {
        self.execute(self.http.delete(self.url(path))).await.map(drop)
    }
}

/// Query parameters for one page request, after any fixed ones.
pub fn page_query(request: &PageRequest) -> Vec<(String, String)> {
    let mut query = vec![
        ("page".to_owned(), request.page_index.to_string()),
        ("size".to_owned(), request.page_size.to_string()),
    ];
    let search = request.filter.trim();
    if !search.is_empty() {
        query.push(("search".to_owned(), search.to_owned()));
    }
    if let Some(sort) = request.server_sort() {
        query.push((
            "sort".to_owned(),
            format!("{},{}", sort.column, sort.direction.as_str()),
        ));
    }
    query
}

/// Fetches pages of `T` from one list endpoint and maps them into rows `R`.
pub struct RestPageFetcher<T, R> {
    client: ApiClient,
    path: String,
    fixed_query: Vec<(String, String)>,
    what: &'static str,
    map: fn(T) -> R,
    _item: PhantomData<fn() -> T>,
}

impl<T, R> RestPageFetcher<T, R> {
    pub fn new(client: ApiClient, path: impl Into<String>, what: &'static str, map: fn(T) -> R) -> Self {
        Self {
            client,
            path: path.into(),
            fixed_query: Vec::new(),
            what,
            map,
            _item: PhantomData,
        }
    }

    /// Adds a query parameter sent with every page request, e.g. a status filter.
    pub fn with_query(mut self, name: &str, value: &str) -> Self {
        self.fixed_query.push((name.to_owned(), value.to_owned()));
        self
    }

    pub fn query_for(&self, request: &PageRequest) -> Vec<(String, String)> {
        let mut query = self.fixed_query.clone();
        query.extend(page_query(request));
        query
    }
}

impl<T, R> PageFetcher<R> for RestPageFetcher<T, R>
where
    T: DeserializeOwned + Send + 'static,
    R: Send + 'static,
{
    fn fetch_page(&self, request: PageRequest) -> FetchFuture<R> {
        let client = self.client.clone();
        let path = self.path.clone();
        let query = self.query_for(&request);
        let what = self.what;
        let map = self.map;
        debug!(
            "GET {path} for view {} page {}",
            request.key,
            request.page()
        );
        Box::pin(async move {
            let page: PageResponse<T> = client.get_json(&path, query, what).await?;
            Ok(page.into_result(map))
        })
    }
}

#[cfg(test)]
mod tests {
    use tourdesk_states::{SortDescriptor, SortMode, ViewKey};

    use super::*;

    fn request(filter: &str, sort: Option<SortDescriptor>) -> PageRequest {
        PageRequest {
            key: ViewKey::new("tours"),
            page_index: 2,
            page_size: 25,
            filter: filter.to_owned(),
            sort,
            sort_mode: SortMode::Server,
        }
    }

    fn pairs(query: &[(String, String)]) -> Vec<(&str, &str)> {
        query.iter().map(|(k, v)| (k.as_str(), v.as_str())).collect()
    }

    #[test]
    fn page_query_skips_empty_search_and_sort() {
        let query = page_query(&request("  ", None));
        assert_eq!(pairs(&query), vec![("page", "2"), ("size", "25")]);
    }

    #[test]
    fn page_query_includes_search_and_sort() {
        let query = page_query(&request("lake", Some(SortDescriptor::descending("price"))));
        assert_eq!(
            pairs(&query),
            vec![("page", "2"), ("size", "25"), ("search", "lake"), ("sort", "price,desc")]
        );
    }

    #[test]
    fn local_sort_stays_off_the_wire() {
        let request = PageRequest {
            sort_mode: SortMode::Local,
            ..request("", Some(SortDescriptor::ascending("name")))
        };
        assert_eq!(pairs(&page_query(&request)), vec![("page", "2"), ("size", "25")]);
    }

    #[test]
    fn fixed_query_comes_first() {
        let fetcher: RestPageFetcher<serde_json::Value, serde_json::Value> =
            RestPageFetcher::new(ApiClient::new(&BusinessConfig::default()), "/admin/users", "users", |v| v)
                .with_query("status", "PENDING");
        let query = fetcher.query_for(&request("", None));
        assert_eq!(pairs(&query), vec![("status", "PENDING"), ("page", "2"), ("size", "25")]);
    }

    #[test]
    fn page_response_tolerates_missing_totals() {
        let page: PageResponse<u32> = serde_json::from_str(r#"{"content":[1,2]}"#).expect("valid page");
        let result = page.into_result(|n| n * 10);
        assert_eq!(result.rows, vec![10, 20]);
        assert_eq!(result.total_pages, 0);
        assert_eq!(result.total_elements, 0);
    }

    #[test]
    fn status_errors_keep_their_code() {
        let error: FetchError = ApiError::Status {
            status: 403,
            body: "forbidden".to_owned(),
        }
        .into();
        assert_eq!(error.to_string(), "server returned 403: forbidden");
    }

    #[test]
    fn long_error_bodies_are_truncated() {
        let response = Response {
            status: 500,
            body: "x".repeat(MAX_ERROR_BODY * 2).into_bytes(),
        };
        let ApiError::Status { body, .. } = ApiError::from_response(&response) else {
            panic!("expected a status error");
        };
        assert_eq!(body.chars().count(), MAX_ERROR_BODY + 1);
    }
}
