//! Tour catalog against a mocked admin API.

mod common;

use common::{TestCtx, bearer, page_json, tour_json, tours_json};
use tourdesk_business::{MutationState, TourCatalog, TourDraft, tours_key};
use tourdesk_states::{ViewAction, ViewPatch};
use wiremock::matchers::{body_json, header, method, path, query_param, query_param_is_missing};
use wiremock::{Mock, ResponseTemplate};

fn tours_page(page: u32) -> wiremock::MockBuilder {
    Mock::given(method("GET"))
        .and(path("/api/admin/tours"))
        .and(query_param("page", page.to_string()))
        .and(query_param("size", "10"))
}

#[tokio::test]
async fn opening_loads_the_first_page_with_sort_and_token() {
    let ctx = TestCtx::new().await;

    tours_page(0)
        .and(query_param("sort", "created_at,desc"))
        .and(query_param_is_missing("search"))
        .and(header("authorization", bearer().as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(page_json(tours_json(1..=10), 3, 25)))
        .expect(1)
        .mount(&ctx.server)
        .await;

    let mut catalog = TourCatalog::new(ctx.client.clone(), ctx.controller);
    assert!(catalog.open().is_some());
    catalog.settle().await;

    let table = catalog.table().expect("tours view exists");
    assert_eq!(table.rows.len(), 10);
    assert_eq!(table.total_pages, 3);
    assert_eq!(table.total_elements, 25);
    assert!(!table.loading);
    assert_eq!(table.pagination_label(), "page 1/3 (25 rows)");
    assert_eq!(table.rows[0].cells[1].to_string(), "Tour 1");
}

#[tokio::test]
async fn typing_a_search_sends_one_debounced_request() {
    let ctx = TestCtx::new().await;

    tours_page(0)
        .and(query_param_is_missing("search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page_json(tours_json(1..=10), 3, 25)))
        .expect(1)
        .mount(&ctx.server)
        .await;
    tours_page(0)
        .and(query_param("search", "lake"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page_json(vec![tour_json(4)], 1, 1)))
        .expect(1)
        .mount(&ctx.server)
        .await;

    let mut catalog = TourCatalog::new(ctx.client.clone(), ctx.controller);
    catalog.open();
    catalog.settle().await;

    let registry = catalog.registry_mut();
    registry.on_filter_input(tours_key(), "l".to_owned());
    registry.on_filter_input(tours_key(), "la".to_owned());
    registry.on_filter_input(tours_key(), "lake".to_owned());
    catalog.settle().await;

    let view = catalog.registry().view(tours_key()).expect("tours view exists");
    assert_eq!(view.committed_filter, "lake");
    assert_eq!(view.rows.len(), 1);
    assert_eq!(view.page, 1);
}

#[tokio::test]
async fn deleting_the_last_row_of_the_last_page_moves_back_a_page() {
    let ctx = TestCtx::new().await;

    tours_page(0)
        .respond_with(ResponseTemplate::new(200).set_body_json(page_json(tours_json(1..=10), 3, 21)))
        .expect(1)
        .mount(&ctx.server)
        .await;
    tours_page(2)
        .respond_with(ResponseTemplate::new(200).set_body_json(page_json(vec![tour_json(21)], 3, 21)))
        .expect(1)
        .mount(&ctx.server)
        .await;
    tours_page(1)
        .respond_with(ResponseTemplate::new(200).set_body_json(page_json(tours_json(11..=20), 2, 20)))
        .expect(1)
        .mount(&ctx.server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/api/admin/tours/t21"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&ctx.server)
        .await;

    let mut catalog = TourCatalog::new(ctx.client.clone(), ctx.controller);
    catalog.open();
    catalog.settle().await;
    catalog.registry_mut().dispatch(tours_key(), ViewAction::SetPage(3));
    catalog.settle().await;
    assert_eq!(catalog.table().expect("tours view").rows.len(), 1);

    catalog.registry_mut().dispatch(tours_key(), ViewAction::SelectPage);
    let outcome = catalog.delete_selected().await;
    assert_eq!(outcome.succeeded, vec!["t21".to_owned()]);
    catalog.settle().await;

    let view = catalog.registry().view(tours_key()).expect("tours view exists");
    assert_eq!(view.page, 2);
    assert_eq!(view.total_pages, 2);
    assert_eq!(view.rows.len(), 10);
    assert!(view.selection.is_empty());
    assert!(matches!(catalog.mutation(), MutationState::Success { succeeded: 1, .. }));
}

#[tokio::test]
async fn creating_a_tour_refetches_with_the_same_parameters() {
    let ctx = TestCtx::new().await;

    tours_page(0)
        .and(query_param("search", "alps"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page_json(vec![tour_json(1)], 1, 1)))
        .expect(2)
        .mount(&ctx.server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/admin/tours"))
        .and(body_json(serde_json::json!({
            "title": "Alps",
            "destination": "Austria",
            "price": 99.0,
            "durationDays": 2,
            "status": "DRAFT",
        })))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&ctx.server)
        .await;

    let mut catalog = TourCatalog::new(ctx.client.clone(), ctx.controller);
    catalog
        .registry_mut()
        .update_view(tours_key(), ViewPatch::default().raw_filter("alps").committed_filter("alps"));
    catalog.open();
    catalog.settle().await;

    let draft = TourDraft {
        title: "Alps".to_owned(),
        destination: "Austria".to_owned(),
        price: 99.0,
        duration_days: 2,
        status: "DRAFT".to_owned(),
    };
    let outcome = catalog.create(&draft).await;
    assert!(outcome.is_complete());
    catalog.settle().await;

    assert_eq!(catalog.registry().stats().issued, 2);
}

#[tokio::test]
async fn server_errors_are_kept_on_the_view() {
    let ctx = TestCtx::new().await;

    tours_page(0)
        .respond_with(ResponseTemplate::new(500).set_body_string("database unavailable"))
        .expect(1)
        .mount(&ctx.server)
        .await;

    let mut catalog = TourCatalog::new(ctx.client.clone(), ctx.controller);
    catalog.open();
    catalog.settle().await;

    let table = catalog.table().expect("tours view exists");
    assert!(table.rows.is_empty());
    assert!(!table.loading);
    let error = table.error.expect("fetch failed");
    assert!(error.contains("500"), "unexpected error: {error}");
    assert!(error.contains("database unavailable"));
}

#[tokio::test]
async fn failed_delete_does_not_refresh() {
    let ctx = TestCtx::new().await;

    tours_page(0)
        .respond_with(ResponseTemplate::new(200).set_body_json(page_json(tours_json(1..=3), 1, 3)))
        .expect(1)
        .mount(&ctx.server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/api/admin/tours/t2"))
        .respond_with(ResponseTemplate::new(409).set_body_string("tour has bookings"))
        .expect(1)
        .mount(&ctx.server)
        .await;

    let mut catalog = TourCatalog::new(ctx.client.clone(), ctx.controller);
    catalog.open();
    catalog.settle().await;

    let outcome = catalog.delete(&["t2".to_owned()]).await;
    catalog.settle().await;

    assert!(outcome.succeeded.is_empty());
    let MutationState::Error { message, .. } = catalog.mutation() else {
        panic!("expected an error, got {:?}", catalog.mutation());
    };
    assert!(message.contains("tour has bookings"));
    assert_eq!(catalog.registry().stats().issued, 1);
}
