use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use tower::ServiceExt;
use wiremock::matchers::{method, path, query_param_is_missing};
use wiremock::{Mock, MockServer, ResponseTemplate};

use shelfsync_browser::ScriptedDriver;
use shelfsync_core::ShelfSyncConfig;
use shelfsync_feed::FeedIngester;
use shelfsync_server::routes::build_router;
use shelfsync_server::state::AppState;
use shelfsync_store::{ExternalIdentity, ProfileRoot, SessionStore};
use shelfsync_sync::{ProgressSyncer, SessionManager};

const PROFILE_MENU: &str = ".dropdown__trigger--profileMenu";

struct TestApp {
    _dir: tempfile::TempDir,
    driver: ScriptedDriver,
    store: Arc<SessionStore>,
    state: Arc<AppState>,
    router: Router,
}

/// Build a full router backed by a scripted browser and a local feed host.
fn test_app(feed_url: &str) -> TestApp {
    let dir = tempfile::tempdir().unwrap();
    let config = ShelfSyncConfig::from_env(dir.path().join("data")).unwrap();

    let driver = ScriptedDriver::new();
    let store = Arc::new(SessionStore::open(&config.data_paths.store).unwrap());
    let profiles = ProfileRoot::new(&config.data_paths.sessions);

    let sessions = SessionManager::new(
        Arc::new(driver.clone()),
        store.clone(),
        profiles.clone(),
    );
    let syncer = ProgressSyncer::new(Arc::new(driver.clone()), store.clone(), profiles);
    let feed = FeedIngester::with_base_url(feed_url);

    let state = Arc::new(AppState::new(config, store.clone(), sessions, syncer, feed));
    TestApp {
        _dir: dir,
        driver,
        store,
        state: state.clone(),
        router: build_router(state),
    }
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn feed_page(items: usize) -> String {
    let mut xml = String::from("<?xml version=\"1.0\"?><rss><channel>");
    for i in 0..items {
        xml.push_str(&format!(
            "<item><title>Book {i}</title><book_id>{i}</book_id>\
             <user_shelves>to-read</user_shelves>\
             <author_name>Author</author_name></item>"
        ));
    }
    xml.push_str("</channel></rss>");
    xml
}

#[tokio::test]
async fn connect_without_credentials_is_a_bad_request() {
    let app = test_app("http://127.0.0.1:0");

    let response = app
        .router
        .oneshot(Request::get("/connect?user=jane").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["message"], "Missing user or pass");
    assert_eq!(app.driver.state.launch_count(), 0);
}

#[tokio::test]
async fn connect_returns_the_discovered_user_id() {
    let app = test_app("http://127.0.0.1:0");
    app.driver.state.set_attribute(
        PROFILE_MENU,
        "href",
        "https://www.goodreads.com/user/show/12345-jane-doe",
    );

    let response = app
        .router
        .oneshot(
            Request::get("/connect?user=jane%40example.com&pass=pw&force=true")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["user_id"], "12345");
    assert!(app.store.get("12345").unwrap().is_some());
}

#[tokio::test]
async fn connect_failure_maps_to_internal_error() {
    let app = test_app("http://127.0.0.1:0");
    app.driver.state.fail_attribute_for(PROFILE_MENU);

    let response = app
        .router
        .oneshot(
            Request::get("/connect?user=jane&pass=pw")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = body_json(response).await;
    assert!(body["message"].as_str().unwrap().contains("Authentication failed"));
}

#[tokio::test]
async fn sync_books_for_an_unknown_user_is_not_found() {
    let app = test_app("http://127.0.0.1:0");

    let response = app
        .router
        .oneshot(
            Request::post("/syncBooks")
                .header("content-type", "application/json")
                .body(Body::from(
                    r#"{"user_id":"nope","books_id":["b1"],"books_progress":[10]}"#,
                ))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = body_json(response).await;
    assert_eq!(body["message"], "User not found");
}

#[tokio::test]
async fn sync_books_with_missing_ids_is_a_bad_request() {
    let app = test_app("http://127.0.0.1:0");
    app.store
        .put(&ExternalIdentity {
            external_user_id: "12345".to_string(),
            username: "jane@example.com".to_string(),
            secret: "enc".to_string(),
        })
        .unwrap();

    let response = app
        .router
        .oneshot(
            Request::post("/syncBooks")
                .header("content-type", "application/json")
                .body(Body::from(r#"{"user_id":"12345"}"#))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["message"], "Missing books id");
}

#[tokio::test]
async fn sync_and_connect_serialize_on_the_same_identity() {
    let app = test_app("http://127.0.0.1:0");
    app.store
        .put(&ExternalIdentity {
            external_user_id: "12345".to_string(),
            username: "jane@example.com".to_string(),
            secret: "enc".to_string(),
        })
        .unwrap();

    // Hold the lock a connect for this username would hold.
    let guard = app.state.locks.acquire("jane@example.com").await;

    let router = app.router.clone();
    let pending = tokio::spawn(async move {
        router
            .oneshot(
                Request::post("/syncBooks")
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"user_id":"12345"}"#))
                    .unwrap(),
            )
            .await
            .unwrap()
    });

    // The sync request must resolve "12345" to the username and wait on the
    // same key instead of proceeding under its own lock.
    tokio::time::sleep(std::time::Duration::from_millis(50)).await;
    assert!(!pending.is_finished());

    drop(guard);
    let response = pending.await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn get_books_returns_the_normalized_feed() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/review/list_rss/12345"))
        .and(query_param_is_missing("page"))
        .respond_with(ResponseTemplate::new(200).set_body_string(feed_page(2)))
        .expect(1)
        .mount(&server)
        .await;

    let app = test_app(&server.uri());
    let response = app
        .router
        .oneshot(Request::get("/getBooks/12345").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["books"].as_array().unwrap().len(), 2);
    assert_eq!(body["books"][0]["title"], "Book 0");
    assert_eq!(body["books"][0]["shelve"], "to-read");
    assert_eq!(
        body["shelves"],
        serde_json::json!(["all", "to-read"])
    );
}

#[tokio::test]
async fn get_books_maps_feed_failures_to_internal_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/review/list_rss/12345"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let app = test_app(&server.uri());
    let response = app
        .router
        .oneshot(Request::get("/getBooks/12345").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = body_json(response).await;
    assert!(body["message"].as_str().unwrap().contains("Feed fetch failed"));
}
