//! End-to-end tests driving the HTTP router against a mocked CouchDB.

use std::sync::Arc;

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Method, Request, StatusCode},
};
use httpmock::{Method::DELETE, Method::GET, Method::POST, Method::PUT, MockServer};
use regex::Regex;
use rosterd::{api, config, roster::RosterService};
use serde_json::{Value, json};
use tokio::sync::OnceCell;
use tower::ServiceExt;

static MOCK_SERVER: OnceCell<&'static MockServer> = OnceCell::const_new();

fn set_env(key: &str, value: &str) {
    // SAFETY: Tests run in a single process and establish deterministic configuration upfront.
    unsafe { std::env::set_var(key, value) }
}

/// Start (once per process) a CouchDB mock and point the configuration at it.
async fn mock_server() -> &'static MockServer {
    MOCK_SERVER
        .get_or_init(|| async {
            let server: &'static MockServer = Box::leak(Box::new(MockServer::start_async().await));

            set_env("COUCHDB_URL", &server.base_url());
            set_env("COUCHDB_DATABASE", "students");
            config::init_config();

            // Startup expectations: database creation and the lastName index.
            server
                .mock_async(|when, then| {
                    when.method(PUT).path("/students");
                    then.status(201).json_body(json!({ "ok": true }));
                })
                .await;
            server
                .mock_async(|when, then| {
                    when.method(POST).path("/students/_index");
                    then.status(200).json_body(json!({
                        "result": "created",
                        "id": "_design/roster-indexes",
                        "name": "lastname-sort"
                    }));
                })
                .await;

            server
        })
        .await
}

async fn router() -> Router {
    let _ = mock_server().await;
    api::create_router(Arc::new(RosterService::new().await))
}

fn student_doc(id: &str, first: &str, last: &str, classes: &[&str]) -> Value {
    json!({
        "_id": id,
        "_rev": "1-abc",
        "firstName": first,
        "lastName": last,
        "grade": 90.0,
        "classes": classes,
        "createdOn": "2025-01-01T00:00:00Z",
        "updatedOn": "2025-01-01T00:00:00Z"
    })
}

async fn send(method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let app = router().await;
    let request = match body {
        Some(value) => Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(value.to_string()))
            .expect("request"),
        None => Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .expect("request"),
    };

    let response = app.oneshot(request).await.expect("router response");
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body bytes");
    let json = serde_json::from_slice(&bytes).expect("json body");
    (status, json)
}

#[tokio::test]
async fn get_student_round_trips_the_envelope() {
    let server = mock_server().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/students/s-100");
            then.status(200)
                .json_body(student_doc("s-100", "Ada", "Lovelace", &["Math"]));
        })
        .await;

    let (status, json) = send(Method::GET, "/api/v1/students/s-100", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["success"], true);
    assert_eq!(json["data"]["_id"], "s-100");
    assert_eq!(json["data"]["firstName"], "Ada");
    assert_eq!(json["data"]["classes"], json!(["Math"]));
}

#[tokio::test]
async fn missing_student_yields_400_envelope() {
    let server = mock_server().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/students/s-missing");
            then.status(404)
                .json_body(json!({ "error": "not_found", "reason": "missing" }));
        })
        .await;

    let (status, json) = send(Method::GET, "/api/v1/students/s-missing", None).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["success"], false);
    assert_eq!(json["message"], "No student found with id s-missing");
}

#[tokio::test]
async fn list_students_applies_sort_and_limit() {
    let server = mock_server().await;
    let find_mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/students/_find")
                .json_body_partial(r#"{ "sort": [{ "lastName": "desc" }], "limit": 2 }"#);
            then.status(200).json_body(json!({
                "docs": [
                    student_doc("s-201", "Steve", "Wozniak", &[]),
                    student_doc("s-202", "Grace", "Hopper", &[])
                ],
                "bookmark": "nil"
            }));
        })
        .await;

    let (status, json) = send(Method::GET, "/api/v1/students?sort=desc&limit=2", None).await;

    find_mock.assert_async().await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["count"], 2);
    assert_eq!(json["data"][0]["lastName"], "Wozniak");
    assert_eq!(json["data"][1]["lastName"], "Hopper");
}

#[tokio::test]
async fn create_student_persists_a_new_document() {
    let server = mock_server().await;
    let put_mock = server
        .mock_async(|when, then| {
            when.method(PUT)
                .path_matches(Regex::new("^/students/[0-9a-f-]{36}$").expect("regex"))
                .body_contains(r#""firstName":"Grace""#);
            then.status(201)
                .json_body(json!({ "ok": true, "id": "ignored", "rev": "1-new" }));
        })
        .await;

    let (status, json) = send(
        Method::POST,
        "/api/v1/students",
        Some(json!({ "firstName": "Grace", "lastName": "Hopper", "grade": 88 })),
    )
    .await;

    put_mock.assert_async().await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(json["success"], true);
    assert_eq!(json["data"]["_rev"], "1-new");
    assert_eq!(json["data"]["lastName"], "Hopper");
    assert!(
        json["data"]["_id"]
            .as_str()
            .is_some_and(|id| !id.is_empty())
    );
}

#[tokio::test]
async fn create_student_rejects_out_of_range_grade() {
    let (status, json) = send(
        Method::POST,
        "/api/v1/students",
        Some(json!({ "firstName": "Grace", "lastName": "Hopper", "grade": 101 })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["success"], false);
    assert_eq!(json["message"], "Maximum grade is 100");
}

#[tokio::test]
async fn update_student_leaves_updated_on_alone() {
    let server = mock_server().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/students/s-upd");
            then.status(200)
                .json_body(student_doc("s-upd", "Ada", "Lovelace", &["Math"]));
        })
        .await;
    let put_mock = server
        .mock_async(|when, then| {
            when.method(PUT)
                .path("/students/s-upd")
                .body_contains(r#""grade":75.0"#);
            then.status(201)
                .json_body(json!({ "ok": true, "id": "s-upd", "rev": "2-upd" }));
        })
        .await;

    let (status, json) = send(
        Method::PUT,
        "/api/v1/students/s-upd",
        Some(json!({ "grade": 75 })),
    )
    .await;

    put_mock.assert_async().await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["grade"], json!(75.0));
    assert_eq!(json["data"]["updatedOn"], "2025-01-01T00:00:00Z");
    assert_eq!(json["data"]["_rev"], "2-upd");
}

#[tokio::test]
async fn delete_student_reports_last_known_state() {
    let server = mock_server().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/students/s-del");
            then.status(200)
                .json_body(student_doc("s-del", "Ada", "Lovelace", &["Art"]));
        })
        .await;
    let delete_mock = server
        .mock_async(|when, then| {
            when.method(DELETE)
                .path("/students/s-del")
                .query_param("rev", "1-abc");
            then.status(200).json_body(json!({ "ok": true }));
        })
        .await;

    let (status, json) = send(Method::DELETE, "/api/v1/students/s-del", None).await;

    delete_mock.assert_async().await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["classes"], json!(["Art"]));
}

#[tokio::test]
async fn add_classes_end_to_end() {
    let server = mock_server().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/students/s-classes");
            then.status(200)
                .json_body(student_doc("s-classes", "Ada", "Lovelace", &["Math"]));
        })
        .await;
    let put_mock = server
        .mock_async(|when, then| {
            when.method(PUT)
                .path("/students/s-classes")
                .body_contains(r#""classes":["Math","Chem Lab"]"#);
            then.status(201)
                .json_body(json!({ "ok": true, "id": "s-classes", "rev": "2-cls" }));
        })
        .await;

    let (status, json) = send(
        Method::POST,
        "/api/v1/students/s-classes/classes",
        Some(json!({ "classes": ["  chem LAB "] })),
    )
    .await;

    put_mock.assert_async().await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(json["success"], true);
    assert_eq!(json["data"], json!(["Math", "Chem Lab"]));
}
