//! Integration tests for verse-server API endpoints
//!
//! Each test gets its own temporary data folder.

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::util::ServiceExt; // for `oneshot` method
use verse_server::{build_router, AppState, JsonStore};

const USER: &str = "user_1700000000000_abc123def";

/// Test helper: Create app over a fresh data folder
async fn setup_app() -> (Router, TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let store = JsonStore::open(dir.path()).await.unwrap();
    (build_router(AppState::new(store)), dir)
}

/// Test helper: Create request without a body
fn test_request(method: &str, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

/// Test helper: Create request with a JSON body
fn json_request(method: &str, uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

/// Test helper: Extract JSON body from response
async fn extract_json(body: Body) -> Value {
    let bytes = axum::body::to_bytes(body, usize::MAX)
        .await
        .expect("Should read body");
    serde_json::from_slice(&bytes).expect("Should parse JSON")
}

/// Test helper: Upload a poem and return its id
async fn create_poem(app: &Router, title: &str, author: &str) -> String {
    let body = json!({ "title": title, "author": author, "stanzas": ["Roses are red"] });
    let response = app
        .clone()
        .oneshot(json_request("POST", "/api/poems", &body))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    extract_json(response.into_body()).await["id"]
        .as_str()
        .unwrap()
        .to_string()
}

fn learning_body() -> Value {
    json!({
        "learning": {
            "currentRound": 1,
            "currentStanzaIndex": 0,
            "repeatCount": 2,
            "attempts": [{ "stanzaIndex": 0, "round": 1, "correct": true, "repeat": 1 }],
            "problemWords": { "0": { "3": "click" } },
            "wordHintTries": { "0": { "3": 1 } }
        }
    })
}

// =============================================================================
// Health
// =============================================================================

#[tokio::test]
async fn test_health_endpoint() {
    let (app, _dir) = setup_app().await;

    let response = app.oneshot(test_request("GET", "/api/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["status"], "ok");
    assert!(body["timestamp"].is_string());
}

// =============================================================================
// Poems
// =============================================================================

#[tokio::test]
async fn test_empty_poem_list() {
    let (app, _dir) = setup_app().await;

    let response = app.oneshot(test_request("GET", "/api/poems")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(extract_json(response.into_body()).await, json!([]));
}

#[tokio::test]
async fn test_create_and_list_poem() {
    let (app, _dir) = setup_app().await;

    let body = json!({
        "title": "  Ozymandias ",
        "author": "Percy Bysshe Shelley",
        "year": "1818",
        "stanzas": ["I met a traveller from an antique land"]
    });
    let response = app
        .clone()
        .oneshot(json_request("POST", "/api/poems", &body))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let created = extract_json(response.into_body()).await;
    assert_eq!(created["title"], "Ozymandias");
    assert_eq!(created["year"], "1818");
    assert!(created["createdAt"].is_string());

    let response = app.oneshot(test_request("GET", "/api/poems")).await.unwrap();
    let list = extract_json(response.into_body()).await;
    assert_eq!(list.as_array().unwrap().len(), 1);
    assert_eq!(list[0]["id"], created["id"]);
}

#[tokio::test]
async fn test_create_poem_validation_names_field() {
    let (app, _dir) = setup_app().await;

    let body = json!({ "title": "Title", "author": "", "stanzas": ["one"] });
    let response = app
        .clone()
        .oneshot(json_request("POST", "/api/poems", &body))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let error = extract_json(response.into_body()).await;
    assert_eq!(error["field"], "author");
    assert!(error["error"].is_string());

    let body = json!({ "title": "Title", "author": "A", "stanzas": [] });
    let response = app
        .oneshot(json_request("POST", "/api/poems", &body))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(extract_json(response.into_body()).await["field"], "stanzas");
}

#[tokio::test]
async fn test_create_poem_rejects_malformed_json() {
    let (app, _dir) = setup_app().await;

    let request = Request::builder()
        .method("POST")
        .uri("/api/poems")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{ title:"))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(extract_json(response.into_body()).await["error"].is_string());
}

#[tokio::test]
async fn test_duplicate_poem_is_conflict() {
    let (app, _dir) = setup_app().await;
    create_poem(&app, "Nemzeti dal", "Petőfi Sándor").await;

    let body = json!({ "title": "NEMZETI DAL.", "author": "petofi sandor", "stanzas": ["x"] });
    let response = app
        .oneshot(json_request("POST", "/api/poems", &body))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
    let error = extract_json(response.into_body()).await;
    assert_eq!(error["duplicate"], true);
    assert!(error["error"].is_string());
}

#[tokio::test]
async fn test_delete_poem_cascades_progress() {
    let (app, _dir) = setup_app().await;
    let poem_id = create_poem(&app, "Title", "Author").await;

    let uri = format!("/api/progress/{}/{}", USER, poem_id);
    let response = app
        .clone()
        .oneshot(json_request("PUT", &uri, &learning_body()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .clone()
        .oneshot(test_request("DELETE", &format!("/api/poems/{}", poem_id)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(extract_json(response.into_body()).await["message"].is_string());

    let response = app.clone().oneshot(test_request("GET", &uri)).await.unwrap();
    assert_eq!(extract_json(response.into_body()).await, Value::Null);

    let response = app
        .oneshot(test_request("DELETE", &format!("/api/poems/{}", poem_id)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// =============================================================================
// Progress
// =============================================================================

#[tokio::test]
async fn test_missing_progress_is_null() {
    let (app, _dir) = setup_app().await;

    let uri = format!("/api/progress/{}/nope", USER);
    let response = app.oneshot(test_request("GET", &uri)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(extract_json(response.into_body()).await, Value::Null);
}

#[tokio::test]
async fn test_put_progress_stamps_last_updated() {
    let (app, _dir) = setup_app().await;

    let uri = format!("/api/progress/{}/p1", USER);
    let response = app
        .clone()
        .oneshot(json_request("PUT", &uri, &learning_body()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let stored = extract_json(response.into_body()).await;
    assert!(stored["lastUpdated"].is_string());
    assert_eq!(stored["learning"]["repeatCount"], 2);
    assert_eq!(stored["learning"]["problemWords"]["0"]["3"], "click");

    let response = app
        .oneshot(test_request("GET", &format!("/api/progress/{}", USER)))
        .await
        .unwrap();
    let all = extract_json(response.into_body()).await;
    assert_eq!(all["p1"]["learning"]["currentStanzaIndex"], 0);
}

#[tokio::test]
async fn test_put_replaces_whole_entry() {
    let (app, _dir) = setup_app().await;

    let uri = format!("/api/progress/{}/p1", USER);
    app.clone()
        .oneshot(json_request("PUT", &uri, &learning_body()))
        .await
        .unwrap();

    let test_only = json!({
        "test": {
            "results": [{ "stanzaIndex": 0, "correct": true, "userAnswer": "Roses are red" }],
            "stats": { "totalAnswers": 1, "correctAnswers": 1, "percentage": 100 },
            "completedAt": "2024-05-01T10:00:00Z"
        }
    });
    app.clone()
        .oneshot(json_request("PUT", &uri, &test_only))
        .await
        .unwrap();

    let response = app.oneshot(test_request("GET", &uri)).await.unwrap();
    let stored = extract_json(response.into_body()).await;
    assert!(stored.get("learning").map_or(true, Value::is_null));
    assert_eq!(stored["test"]["stats"]["percentage"], 100);
}

#[tokio::test]
async fn test_invalid_user_id_rejected() {
    let (app, _dir) = setup_app().await;

    let response = app
        .clone()
        .oneshot(test_request("GET", "/api/progress/not-a-user/p1"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .oneshot(json_request("PUT", "/api/progress/USER_1_X/p1", &learning_body()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_malformed_progress_rejected() {
    let (app, _dir) = setup_app().await;

    let uri = format!("/api/progress/{}/p1", USER);
    for body in [
        json!([1, 2, 3]),
        json!({ "learning": { "currentRound": "one" } }),
        json!({ "test": { "results": {} } }),
    ] {
        let response = app
            .clone()
            .oneshot(json_request("PUT", &uri, &body))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "body: {}", body);
    }
}

#[tokio::test]
async fn test_delete_progress() {
    let (app, _dir) = setup_app().await;

    let uri = format!("/api/progress/{}/p1", USER);
    app.clone()
        .oneshot(json_request("PUT", &uri, &learning_body()))
        .await
        .unwrap();

    let response = app.clone().oneshot(test_request("DELETE", &uri)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app.oneshot(test_request("DELETE", &uri)).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert!(extract_json(response.into_body()).await["error"].is_string());
}

#[tokio::test]
async fn test_unknown_route_is_404() {
    let (app, _dir) = setup_app().await;

    let response = app.oneshot(test_request("GET", "/api/nothing")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
