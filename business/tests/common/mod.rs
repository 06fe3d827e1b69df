use std::time::Duration;

use serde_json::{Value, json};
use tourdesk_business::{ApiClient, BusinessConfig};
use tourdesk_states::ControllerConfig;
use wiremock::MockServer;

pub const TOKEN: &str = "test-token";

pub struct TestCtx {
    pub server: MockServer,
    pub client: ApiClient,
    pub controller: ControllerConfig,
}

impl TestCtx {
    pub async fn new() -> Self {
        let _ = env_logger::builder().is_test(true).try_init();
        let server = MockServer::start().await;
        let mut config = BusinessConfig::new(server.uri())
            .with_token(TOKEN)
            .with_acting_user("admin-1");
        config.search_debounce = Duration::from_millis(20);

        Self {
            client: ApiClient::new(&config),
            controller: config.controller_config(),
            server,
        }
    }
}

pub fn bearer() -> String {
    format!("Bearer {TOKEN}")
}

pub fn page_json(content: Vec<Value>, total_pages: u32, total_elements: u64) -> Value {
    json!({
        "content": content,
        "totalPages": total_pages,
        "totalElements": total_elements,
    })
}

#[allow(unused)]
pub fn tour_json(id: u32) -> Value {
    json!({
        "id": format!("t{id}"),
        "title": format!("Tour {id}"),
        "destination": "Slovenia",
        "price": 100.0 + f64::from(id),
        "durationDays": 3,
        "status": "PUBLISHED",
        "createdAt": "2026-03-01T09:30:00Z",
    })
}

#[allow(unused)]
pub fn tours_json(ids: std::ops::RangeInclusive<u32>) -> Vec<Value> {
    ids.map(tour_json).collect()
}

#[allow(unused)]
pub fn user_json(id: &str, status: &str) -> Value {
    json!({
        "id": id,
        "email": format!("{id}@example.com"),
        "fullName": format!("User {id}"),
        "role": "GUIDE",
        "status": status,
        "createdAt": "2026-01-15T08:00:00Z",
    })
}
