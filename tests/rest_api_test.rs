//! End-to-end tests for the task REST API, driven through the router
//! with tower's `oneshot` — no sockets involved.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use std::sync::Arc;
use tempfile::TempDir;
use tower::util::ServiceExt;

use taskd::config::TaskdConfig;
use taskd::rest::build_router;
use taskd::storage::Storage;
use taskd::AppContext;

/// Fresh router over a fresh temp database. The TempDir must outlive the
/// test body or the database file disappears under the pool.
async fn make_app() -> (Router, TempDir) {
    let dir = tempfile::tempdir().expect("tempdir");
    let storage = Storage::new(dir.path()).await.expect("open storage");
    let config = TaskdConfig {
        port: 0,
        data_dir: dir.path().to_path_buf(),
        log: "error".to_string(),
        bind_address: "127.0.0.1".to_string(),
        database_url: None,
        log_format: "pretty".to_string(),
        api_base_url: "http://127.0.0.1:0".to_string(),
    };
    let ctx = Arc::new(AppContext {
        config: Arc::new(config),
        storage: Arc::new(storage),
        started_at: std::time::Instant::now(),
    });
    (build_router(ctx), dir)
}

async fn request(
    app: &Router,
    method: &str,
    uri: &str,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let req = match body {
        Some(v) => builder
            .header("content-type", "application/json")
            .body(Body::from(v.to_string())),
        None => builder.body(Body::empty()),
    }
    .expect("build request");

    let resp = app.clone().oneshot(req).await.expect("send request");
    let status = resp.status();
    let bytes = resp.into_body().collect().await.expect("read body").to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("json body")
    };
    (status, value)
}

async fn create(app: &Router, title: &str, description: &str, status: Option<&str>) -> Value {
    let mut body = json!({ "title": title, "description": description });
    if let Some(s) = status {
        body["status"] = json!(s);
    }
    let (code, task) = request(app, "POST", "/tasks", Some(body)).await;
    assert_eq!(code, StatusCode::CREATED);
    task
}

#[tokio::test]
async fn health_endpoint_responds() {
    let (app, _dir) = make_app().await;
    let (code, body) = request(&app, "GET", "/health", None).await;
    assert_eq!(code, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn empty_list_is_empty_array() {
    let (app, _dir) = make_app().await;
    let (code, body) = request(&app, "GET", "/tasks", None).await;
    assert_eq!(code, StatusCode::OK);
    assert_eq!(body, json!([]));
}

#[tokio::test]
async fn create_defaults_to_pending() {
    let (app, _dir) = make_app().await;
    let task = create(&app, "Write docs", "Fill in the README", None).await;
    assert_eq!(task["title"], "Write docs");
    assert_eq!(task["status"], "pending");
    assert!(task["id"].is_i64());
    assert!(task["createdAt"].is_string());
}

#[tokio::test]
async fn create_lowercases_status() {
    let (app, _dir) = make_app().await;
    let task = create(&app, "A", "B", Some("DONE")).await;
    assert_eq!(task["status"], "done");
}

#[tokio::test]
async fn create_rejects_invalid_status() {
    let (app, _dir) = make_app().await;
    let body = json!({ "title": "A", "description": "B", "status": "archived" });
    let (code, err) = request(&app, "POST", "/tasks", Some(body)).await;
    assert_eq!(code, StatusCode::BAD_REQUEST);
    assert_eq!(err["error"], "Invalid status. Must be 'pending' or 'done'");
}

#[tokio::test]
async fn create_requires_title_and_description() {
    let (app, _dir) = make_app().await;

    for body in [
        json!({ "description": "no title" }),
        json!({ "title": "no description" }),
        json!({ "title": "", "description": "empty title" }),
        json!({ "title": "empty description", "description": "" }),
    ] {
        let (code, err) = request(&app, "POST", "/tasks", Some(body)).await;
        assert_eq!(code, StatusCode::BAD_REQUEST);
        assert_eq!(err["error"], "Title and description are required");
    }
}

#[tokio::test]
async fn get_returns_created_task() {
    let (app, _dir) = make_app().await;
    let task = create(&app, "Read back", "round trip", Some("done")).await;
    let id = task["id"].as_i64().expect("id");

    let (code, fetched) = request(&app, "GET", &format!("/tasks/{id}"), None).await;
    assert_eq!(code, StatusCode::OK);
    assert_eq!(fetched, task);
}

#[tokio::test]
async fn non_numeric_id_is_rejected() {
    let (app, _dir) = make_app().await;
    for method in ["GET", "DELETE"] {
        let (code, err) = request(&app, method, "/tasks/abc", None).await;
        assert_eq!(code, StatusCode::BAD_REQUEST);
        assert_eq!(err["error"], "Invalid task ID");
    }
    let body = json!({ "title": "A", "description": "B", "status": "pending" });
    let (code, err) = request(&app, "PUT", "/tasks/abc", Some(body)).await;
    assert_eq!(code, StatusCode::BAD_REQUEST);
    assert_eq!(err["error"], "Invalid task ID");
}

#[tokio::test]
async fn unknown_id_is_not_found() {
    let (app, _dir) = make_app().await;

    let (code, err) = request(&app, "GET", "/tasks/999", None).await;
    assert_eq!(code, StatusCode::NOT_FOUND);
    assert_eq!(err["error"], "Task not found");

    let body = json!({ "title": "A", "description": "B", "status": "pending" });
    let (code, _) = request(&app, "PUT", "/tasks/999", Some(body)).await;
    assert_eq!(code, StatusCode::NOT_FOUND);

    let (code, _) = request(&app, "DELETE", "/tasks/999", None).await;
    assert_eq!(code, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn update_replaces_all_fields() {
    let (app, _dir) = make_app().await;
    let task = create(&app, "Before", "old text", None).await;
    let id = task["id"].as_i64().expect("id");

    let body = json!({ "title": "After", "description": "new text", "status": "done" });
    let (code, updated) = request(&app, "PUT", &format!("/tasks/{id}"), Some(body)).await;
    assert_eq!(code, StatusCode::OK);
    assert_eq!(updated["id"], task["id"]);
    assert_eq!(updated["title"], "After");
    assert_eq!(updated["description"], "new text");
    assert_eq!(updated["status"], "done");
    // Creation time never changes on update.
    assert_eq!(updated["createdAt"], task["createdAt"]);
}

#[tokio::test]
async fn update_requires_all_three_fields() {
    let (app, _dir) = make_app().await;
    let task = create(&app, "A", "B", None).await;
    let id = task["id"].as_i64().expect("id");

    for body in [
        json!({ "description": "x", "status": "done" }),
        json!({ "title": "x", "status": "done" }),
        json!({ "title": "x", "description": "y" }),
    ] {
        let (code, err) = request(&app, "PUT", &format!("/tasks/{id}"), Some(body)).await;
        assert_eq!(code, StatusCode::BAD_REQUEST);
        assert_eq!(err["error"], "Title, description, and status are required");
    }
}

#[tokio::test]
async fn update_rejects_invalid_status() {
    let (app, _dir) = make_app().await;
    let task = create(&app, "A", "B", None).await;
    let id = task["id"].as_i64().expect("id");

    let body = json!({ "title": "A", "description": "B", "status": "later" });
    let (code, err) = request(&app, "PUT", &format!("/tasks/{id}"), Some(body)).await;
    assert_eq!(code, StatusCode::BAD_REQUEST);
    assert_eq!(err["error"], "Invalid status. Must be 'pending' or 'done'");
}

#[tokio::test]
async fn delete_removes_the_task() {
    let (app, _dir) = make_app().await;
    let task = create(&app, "Ephemeral", "soon gone", None).await;
    let id = task["id"].as_i64().expect("id");

    let (code, body) = request(&app, "DELETE", &format!("/tasks/{id}"), None).await;
    assert_eq!(code, StatusCode::OK);
    assert_eq!(body["message"], "Task deleted successfully");

    let (code, _) = request(&app, "GET", &format!("/tasks/{id}"), None).await;
    assert_eq!(code, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn list_is_most_recent_first() {
    let (app, _dir) = make_app().await;
    create(&app, "first", "1", None).await;
    create(&app, "second", "2", None).await;
    create(&app, "third", "3", None).await;

    let (code, body) = request(&app, "GET", "/tasks", None).await;
    assert_eq!(code, StatusCode::OK);
    let titles: Vec<&str> = body
        .as_array()
        .expect("array")
        .iter()
        .map(|t| t["title"].as_str().expect("title"))
        .collect();
    assert_eq!(titles, vec!["third", "second", "first"]);
}
