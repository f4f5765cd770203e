//! Banners of the course list: not logged in, not a participant, consent,
//! and the scroll offset restored after the first load.

use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tempfile::{tempdir, TempDir};
use ticket_desk::db::storage::{IN_IFRAME_KEY, NO_DATA_CONSENT_KEY};
use ticket_desk::db::StorageScope;
use ticket_desk::services::StoreMessage;
use ticket_desk::views::{ListingState, ListingView};
use ticket_desk::{AppConfig, AppContext, HistoryNavigator, Navigator, Route};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const LIST: Route = Route::ListTickets { course_id: 1 };

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

    Mock::given(method("GET"))
        .and(path("/kurssi/1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"nimi": "Ohjelmointi 1"})))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/kurssi/1/ukk"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": 1, "otsikko": "Installing the compiler", "tila": 6,
             "aikaleima": "2023-06-21T09:37:36.124Z", "ukk": true}
        ])))
        .mount(server)
        .await;

    (dir, navigator, ctx)
}

async fn mock_my_courses(server: &MockServer, course_id: i64) {
    Mock::given(method("GET"))
        .and(path("/minun/kurssit"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([{"kurssi": course_id, "asema": "opiskelija"}])),
        )
        .mount(server)
        .await;
}

async fn wait_for(view: &ListingView, done: impl Fn(&ListingState) -> bool) -> ListingState {
    let mut states = view.subscribe();
    tokio::time::timeout(Duration::from_secs(5), async {
        while let Some(state) = states.next().await {
            if done(&state) {
                return state;
            }
        }
        panic!("view state closed");
    })
    .await
    .unwrap()
}

#[tokio::test]
async fn test_logged_out_banner_leads_to_login() {
    let server = MockServer::start().await;
    let (_dir, navigator, ctx) = setup(&server).await;
    ctx.store.set_logged_out();

    let view = ListingView::open(ctx.clone(), &LIST).await;
    let state = wait_for(&view, |s| s.error.is_some()).await;
    let error = state.error.unwrap();
    assert_eq!(error.title, ctx.strings.get("list.not-logged-in.title"));
    assert_eq!(error.button_text, ctx.strings.get("button.login"));

    view.error_click().await;
    assert_eq!(
        navigator.current().map(|n| n.route),
        Some(Route::Login {
            course_id: Some(1),
            login_id: None,
        })
    );
}

#[tokio::test]
async fn test_declined_consent_in_frame_offers_account() {
    let server = MockServer::start().await;
    let (_dir, navigator, ctx) = setup(&server).await;
    ctx.storage
        .set_item(StorageScope::Local, NO_DATA_CONSENT_KEY, "true")
        .await
        .unwrap();
    ctx.storage
        .set_item(StorageScope::Session, IN_IFRAME_KEY, "true")
        .await
        .unwrap();
    ctx.store.set_logged_out();

    let view = ListingView::open(ctx.clone(), &LIST).await;
    let state = wait_for(&view, |s| s.error.is_some()).await;
    assert!(state.no_data_consent);
    assert_eq!(
        state.error.unwrap().button_text,
        ctx.strings.get("button.create-account")
    );

    view.error_click().await;
    assert!(!view.state().no_data_consent);
    assert!(!ctx
        .storage
        .get_flag(StorageScope::Local, NO_DATA_CONSENT_KEY)
        .await
        .unwrap());
    assert!(navigator.current().is_none());
}

#[tokio::test]
async fn test_logged_out_in_frame_has_no_button() {
    let server = MockServer::start().await;
    let (_dir, navigator, ctx) = setup(&server).await;
    ctx.storage
        .set_item(StorageScope::Session, IN_IFRAME_KEY, "true")
        .await
        .unwrap();
    ctx.store.set_logged_out();

    let view = ListingView::open(ctx, &LIST).await;
    let state = wait_for(&view, |s| s.error.is_some()).await;
    assert!(state.error.unwrap().button_text.is_empty());

    view.error_click().await;
    assert!(navigator.current().is_none());
}

#[tokio::test]
async fn test_not_participant_banner() {
    let server = MockServer::start().await;
    let (_dir, _navigator, ctx) = setup(&server).await;
    mock_my_courses(&server, 2).await;
    ctx.store.set_logged_in();

    let view = ListingView::open(ctx.clone(), &LIST).await;
    let state = wait_for(&view, |s| s.is_participant.is_some()).await;
    assert_eq!(state.is_participant, Some(false));
    assert_eq!(
        state.error.unwrap().title,
        ctx.strings.get("list.not-participant.title")
    );
    assert_eq!(ctx.store.is_participant(), Some(false));
}

#[tokio::test]
async fn test_enrolled_user_sees_no_banner_left_from_another_course() {
    let server = MockServer::start().await;
    let (_dir, _navigator, ctx) = setup(&server).await;
    mock_my_courses(&server, 1).await;
    ctx.store.set_logged_in();
    // Left over from a course the user is not enrolled on.
    ctx.store.set_participant(false);

    let view = ListingView::open(ctx.clone(), &LIST).await;
    wait_for(&view, |s| s.is_participant == Some(true)).await;
    tokio::time::sleep(Duration::from_millis(200)).await;

    let state = view.state();
    assert_eq!(state.is_participant, Some(true));
    assert!(state.error.is_none());
    assert_eq!(ctx.store.is_participant(), Some(true));
}

#[tokio::test]
async fn test_banner_shown_when_flag_was_already_false() {
    let server = MockServer::start().await;
    let (_dir, _navigator, ctx) = setup(&server).await;
    mock_my_courses(&server, 2).await;
    ctx.store.set_logged_in();
    ctx.store.set_participant(false);

    let view = ListingView::open(ctx.clone(), &LIST).await;
    let state = wait_for(&view, |s| s.error.is_some()).await;
    assert_eq!(state.is_participant, Some(false));
    assert_eq!(
        state.error.unwrap().title,
        ctx.strings.get("list.not-participant.title")
    );
}

#[tokio::test]
async fn test_scroll_position_restored_only_once() {
    let server = MockServer::start().await;
    let (_dir, _navigator, ctx) = setup(&server).await;
    ctx.store.set_position(&LIST.to_url(), 120.0);

    let view = ListingView::open(ctx.clone(), &LIST).await;
    let state = wait_for(&view, |s| s.is_loaded).await;
    assert_eq!(state.restore_position, Some(120.0));

    view.on_scroll(300.0);
    ctx.store.send_message(StoreMessage::Refresh);

    tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            let fetches = server
                .received_requests()
                .await
                .unwrap_or_default()
                .iter()
                .filter(|r| r.url.path() == "/kurssi/1/ukk")
                .count();
            if fetches >= 2 && view.state().is_loaded {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .unwrap();

    assert_eq!(view.state().restore_position, Some(120.0));
}
