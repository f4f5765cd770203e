//! Viewing, archiving and editing FAQs against a mocked backend.

use serde_json::json;
use std::sync::Arc;
use tempfile::{tempdir, TempDir};
use ticket_desk::views::{FaqView, SubmitFaqView};
use ticket_desk::{AppConfig, AppContext, HistoryNavigator, NavigationState, Navigator, Route};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn setup(server: &MockServer) -> (TempDir, Arc<HistoryNavigator>, Arc<AppContext>) {
    let dir = tempdir().unwrap();
    let config = AppConfig {
        api_base_url: server.uri(),
        data_dir: dir.path().to_path_buf(),
        timeout_secs: 5,
        ..Default::default()
    };
    let navigator = Arc::new(HistoryNavigator::new());
    let ctx = AppContext::initialize(config, navigator.clone()).await.unwrap();
    (dir, navigator, ctx)
}

/// FAQ 7 of course 1: one answer comment carrying an attachment.
async fn mount_faq(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/tiketti/7"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 7,
            "kurssi": 1,
            "otsikko": "How do I submit?",
            "viesti": "Where is the submit button?",
            "tila": 6,
            "aikaleima": "2023-06-21T09:37:36.124Z",
            "ukk": true
        })))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/tiketti/7/kentat"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": 2, "otsikko": "Tehtava", "arvo": "3"}
        ])))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/tiketti/7/kommentit"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {
                "id": 21,
                "viesti": "Top right corner.",
                "tila": 5,
                "liitteet": [{"kommentti": 21, "tiedosto": "abc", "nimi": "shot.png"}]
            }
        ])))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_faq_loads_and_edit_navigates_with_state() {
    let server = MockServer::start().await;
    let (_dir, navigator, ctx) = setup(&server).await;
    mount_faq(&server).await;

    let view = FaqView::open(ctx, 1, 7).await;
    let state = view.state();
    assert!(state.is_loaded);
    assert_eq!(state.error_message, None);
    assert_eq!(state.ticket.map(|t| t.title), Some("How do I submit?".to_string()));

    view.edit_faq();
    let navigation = navigator.current().unwrap();
    assert_eq!(
        navigation.route,
        Route::SubmitFaq {
            course_id: 1,
            ticket_id: Some(7)
        }
    );
    assert!(navigation.state.edit_faq);
}

#[tokio::test]
async fn test_missing_faq_shows_error() {
    let server = MockServer::start().await;
    let (_dir, _navigator, ctx) = setup(&server).await;

    let view = FaqView::open(ctx, 1, 99).await;
    let state = view.state();
    assert!(state.is_loaded);
    assert!(state.ticket.is_none());
    assert!(state.error_message.is_some());
}

#[tokio::test]
async fn test_archive_without_permission() {
    let server = MockServer::start().await;
    let (_dir, navigator, ctx) = setup(&server).await;
    mount_faq(&server).await;
    Mock::given(method("POST"))
        .and(path("/tiketti/7/arkistoiukk"))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({
            "success": false,
            "error": {"tunnus": 1003, "virheilmoitus": "Ei oikeuksia"}
        })))
        .mount(&server)
        .await;

    let expected = ctx.strings.get("error.no-permission");
    let view = FaqView::open(ctx, 1, 7).await;
    assert!(!view.archive_faq().await);
    assert_eq!(view.state().error_message, Some(expected));
    assert!(navigator.history().is_empty());
}

#[tokio::test]
async fn test_archive_returns_to_list() {
    let server = MockServer::start().await;
    let (_dir, navigator, ctx) = setup(&server).await;
    mount_faq(&server).await;
    Mock::given(method("POST"))
        .and(path("/tiketti/7/arkistoiukk"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true})))
        .expect(1)
        .mount(&server)
        .await;

    let view = FaqView::open(ctx, 1, 7).await;
    assert!(view.archive_faq().await);
    assert_eq!(
        navigator.current().map(|n| n.route),
        Some(Route::ListTickets { course_id: 1 })
    );
}

#[tokio::test]
async fn test_edit_form_prefilled_from_faq() {
    let server = MockServer::start().await;
    let (_dir, navigator, ctx) = setup(&server).await;
    mount_faq(&server).await;
    Mock::given(method("PUT"))
        .and(path("/tiketti/7/muokkaaukk"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/tiketti/7/kommentti/21/liite/abc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true})))
        .expect(1)
        .mount(&server)
        .await;

    let view = SubmitFaqView::open(ctx, 1, Some(7), &NavigationState { edit_faq: true }).await;
    let state = view.state();
    assert!(state.edit_existing);
    assert_eq!(state.title, "How do I submit?");
    assert_eq!(state.question, "Where is the submit button?");
    assert_eq!(state.answer, "Top right corner.");
    assert_eq!(state.old_attachments.len(), 1);
    assert_eq!(state.fields[0].value, "3");

    view.remove_old_attachment(0);
    view.set_answer("Bottom left corner.");
    assert!(view.submit().await);
    assert!(view.state().old_attachments.is_empty());
    assert!(view.attachments().pending_removals().is_empty());
    assert_eq!(
        navigator.current().map(|n| n.route),
        Some(Route::ListTickets { course_id: 1 })
    );
}
