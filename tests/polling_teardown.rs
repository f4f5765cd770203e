//! The course list polls its FAQs; once torn down nothing may change its
//! state any more.

use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tempfile::{tempdir, TempDir};
use ticket_desk::services::StoreMessage;
use ticket_desk::views::ListingView;
use ticket_desk::{AppConfig, AppContext, HistoryNavigator, Route};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn setup(server: &MockServer) -> (TempDir, Arc<AppContext>) {
    let dir = tempdir().unwrap();
    let config = AppConfig {
        api_base_url: server.uri(),
        data_dir: dir.path().to_path_buf(),
        timeout_secs: 5,
        ..Default::default()
    };
    let ctx = AppContext::initialize(config, Arc::new(HistoryNavigator::new()))
        .await
        .unwrap();

    Mock::given(method("GET"))
        .and(path("/kurssi/1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"nimi": "Ohjelmointi 1"})))
        .mount(server)
        .await;

    (dir, ctx)
}

fn faq_rows() -> serde_json::Value {
    json!([
        {"id": 1, "otsikko": "Installing the compiler", "tila": 6,
         "aikaleima": "2023-06-21T09:37:36.124Z", "ukk": true},
        {"id": 2, "otsikko": "Deadline extensions", "tila": 6,
         "aikaleima": "2023-06-22T09:37:36.124Z", "ukk": true}
    ])
}

#[tokio::test]
async fn test_list_loads_and_filters() {
    let server = MockServer::start().await;
    let (_dir, ctx) = setup(&server).await;
    Mock::given(method("GET"))
        .and(path("/kurssi/1/ukk"))
        .respond_with(ResponseTemplate::new(200).set_body_json(faq_rows()))
        .mount(&server)
        .await;

    let view = ListingView::open(ctx, &Route::ListTickets { course_id: 1 }).await;
    let mut states = view.subscribe();
    let loaded = tokio::time::timeout(Duration::from_secs(5), async {
        while let Some(state) = states.next().await {
            if state.is_loaded {
                return state;
            }
        }
        panic!("view state closed before loading");
    })
    .await
    .unwrap();
    assert_eq!(loaded.faqs.len(), 2);

    view.apply_filter("  DEADLINE ");
    let state = view.state();
    let visible: Vec<i64> = state.visible_faqs().iter().map(|t| t.id).collect();
    assert_eq!(visible, vec![2]);
}

#[tokio::test]
async fn test_missing_course_is_an_error() {
    let server = MockServer::start().await;
    let (_dir, ctx) = setup(&server).await;

    let route = Route::Login {
        course_id: None,
        login_id: None,
    };
    let view = ListingView::open(ctx, &route).await;
    let state = view.state();
    assert!(state.is_loaded);
    assert!(state.error_message.is_some());
}

#[tokio::test]
async fn test_late_response_ignored_after_destroy() {
    let server = MockServer::start().await;
    let (_dir, ctx) = setup(&server).await;
    Mock::given(method("GET"))
        .and(path("/kurssi/1/ukk"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(faq_rows())
                .set_delay(Duration::from_millis(300)),
        )
        .mount(&server)
        .await;

    let store = ctx.store.clone();
    let view = ListingView::open(ctx, &Route::ListTickets { course_id: 1 }).await;
    tokio::time::sleep(Duration::from_millis(50)).await;
    view.destroy();
    let before = view.state();

    // A refresh request after teardown must not restart polling either.
    store.send_message(StoreMessage::Refresh);
    tokio::time::sleep(Duration::from_millis(600)).await;

    let after = view.state();
    assert_eq!(before, after);
    assert!(after.faqs.is_empty());
    assert!(!after.is_loaded);
}
