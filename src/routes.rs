//! HTTP routing table.

use crate::handlers;
use crate::repository::Entity;
use crate::types::{AppState, Repo};

use axum::{
    routing::{get, post, put},
    Router,
};
use std::path::Path;
use tower_http::{services::ServeDir, trace::TraceLayer};

/// Build the application routes.
///
/// - `/active-calls`, `/on-calls`, `/priests` - list (GET) and create (POST)
/// - `/active-calls/:id`, `/on-calls/:id`, `/priests/:id` - update (PUT) and delete (DELETE)
/// - `/submit-active-call` - form submission answered with an HTML fragment
/// - `/` - dispatch board
/// - `/static/*` - files under `static_dir`
pub fn build_routes(state: AppState, static_dir: &Path) -> Router {
    let pages = Router::new()
        .route("/", get(handlers::index))
        .route("/submit-active-call", post(handlers::submit_active_call))
        .with_state(state.active_calls.clone());

    Router::new()
        .merge(resource_routes("/active-calls", state.active_calls))
        .merge(resource_routes("/on-calls", state.on_calls))
        .merge(resource_routes("/priests", state.priests))
        .merge(pages)
        .nest_service("/static", ServeDir::new(static_dir))
        .layer(TraceLayer::new_for_http())
}

/// CRUD routes for one entity, rooted at `path`.
fn resource_routes<E: Entity>(path: &str, repo: Repo<E>) -> Router {
    Router::new()
        .route(
            path,
            get(handlers::list_rows::<E>).post(handlers::create_row::<E>),
        )
        .route(
            &format!("{path}/:id"),
            put(handlers::update_row::<E>).delete(handlers::delete_row::<E>),
        )
        .with_state(repo)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db_types::{ActiveCall, OnCall, Priest};
    use crate::repository::memory::{FailingRepository, MemoryRepository, WriteOnlyRepository};

    use axum::{
        body::Body,
        http::{header, Method, Request, StatusCode},
    };
    use serde_json::{json, Value};
    use std::sync::Arc;
    use time::OffsetDateTime;
    use tower::ServiceExt;

    fn memory_state() -> AppState {
        AppState {
            active_calls: Arc::new(MemoryRepository::<ActiveCall>::new()),
            on_calls: Arc::new(MemoryRepository::<OnCall>::new()),
            priests: Arc::new(MemoryRepository::<Priest>::new()),
        }
    }

    fn failing_state() -> AppState {
        AppState {
            active_calls: Arc::new(FailingRepository),
            on_calls: Arc::new(FailingRepository),
            priests: Arc::new(FailingRepository),
        }
    }

    fn app(state: AppState) -> Router {
        build_routes(state, Path::new("static"))
    }

    async fn send(
        app: &Router,
        method: Method,
        uri: &str,
        body: Option<&str>,
    ) -> (StatusCode, String) {
        let mut builder = Request::builder().method(method).uri(uri);
        if body.is_some() {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
        }
        let request = builder
            .body(body.map(|b| Body::from(b.to_string())).unwrap_or_else(Body::empty))
            .unwrap();

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = hyper::body::to_bytes(response.into_body()).await.unwrap();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    async fn list(app: &Router, uri: &str) -> Value {
        let (status, body) = send(app, Method::GET, uri, None).await;
        assert_eq!(status, StatusCode::OK);
        serde_json::from_str(&body).unwrap()
    }

    #[tokio::test]
    async fn test_priest_lifecycle() {
        let app = app(memory_state());

        let (status, body) = send(
            &app,
            Method::POST,
            "/priests",
            Some(r#"{"name":"Fr. Smith"}"#),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            serde_json::from_str::<Value>(&body).unwrap(),
            json!({"id": 1, "name": "Fr. Smith"})
        );

        let (status, body) = send(
            &app,
            Method::PUT,
            "/priests/1",
            Some(r#"{"name":"Fr. John Smith"}"#),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.is_empty());

        assert_eq!(
            list(&app, "/priests").await,
            json!([{"id": 1, "name": "Fr. John Smith"}])
        );

        let (status, body) = send(&app, Method::DELETE, "/priests/1", None).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.is_empty());

        assert_eq!(list(&app, "/priests").await, json!([]));
    }

    #[tokio::test]
    async fn test_create_active_call_stamps_timestamps() {
        let app = app(memory_state());

        let (status, body) = send(
            &app,
            Method::POST,
            "/active-calls",
            Some(r#"{"address":"1 Main St","patient_name":"A. Doe","status":"OPEN","notes":""}"#),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let json: Value = serde_json::from_str(&body).unwrap();
        assert_eq!(json["id"], 1);
        assert_eq!(json["status"], "OPEN");
        assert!(json.get("closed_ts").is_none());
        assert!(json.get("responder_id").is_none());

        let call: ActiveCall = serde_json::from_value(json).unwrap();
        assert_eq!(call.open_ts.unix_timestamp(), call.upd_ts.unix_timestamp());
        assert!(call.open_ts <= OffsetDateTime::now_utc());
    }

    #[tokio::test]
    async fn test_created_rows_get_fresh_ids() {
        let app = app(memory_state());

        let mut ids = Vec::new();
        for name in ["Fr. Brown", "Fr. Green", "Fr. White"] {
            let (_, body) = send(
                &app,
                Method::POST,
                "/priests",
                Some(&json!({ "name": name }).to_string()),
            )
            .await;
            let priest: Priest = serde_json::from_str(&body).unwrap();
            assert!(!ids.contains(&priest.id));
            ids.push(priest.id);
        }

        let listed: Vec<Priest> = serde_json::from_value(list(&app, "/priests").await).unwrap();
        assert_eq!(
            listed.iter().map(|p| p.id).collect::<Vec<i32>>(),
            ids
        );
    }

    #[tokio::test]
    async fn test_update_active_call_replaces_fields() {
        let app = app(memory_state());

        let (_, body) = send(
            &app,
            Method::POST,
            "/active-calls",
            Some(r#"{"address":"1 Main St","patient_name":"A. Doe","status":"OPEN","notes":"ring twice"}"#),
        )
        .await;
        let created: ActiveCall = serde_json::from_str(&body).unwrap();

        let (status, _) = send(
            &app,
            Method::PUT,
            &format!("/active-calls/{}", created.id),
            Some(r#"{"patient_name":"A. Doe","status":"CLOSED"}"#),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let listed: Vec<ActiveCall> =
            serde_json::from_value(list(&app, "/active-calls").await).unwrap();
        let updated = &listed[0];
        assert_eq!(updated.status, "CLOSED");
        assert_eq!(updated.address, "");
        assert_eq!(updated.notes, "");
        assert_eq!(updated.open_ts, created.open_ts);
        assert!(updated.upd_ts >= created.upd_ts);
        // Closing a call does not stamp closed_ts.
        assert_eq!(updated.closed_ts, None);
    }

    #[tokio::test]
    async fn test_on_call_lifecycle() {
        let app = app(memory_state());

        let (status, body) = send(
            &app,
            Method::POST,
            "/on-calls",
            Some(r#"{"priest_id":4,"start_time":"2024-03-01T20:00:00Z","end_time":"2024-03-01T08:00:00Z","status":"SCHEDULED"}"#),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let shift: OnCall = serde_json::from_str(&body).unwrap();
        assert_eq!(shift.priest_id, 4);
        assert_eq!(shift.created_ts, shift.upd_ts);
        // End before start is accepted as-is.
        assert!(shift.end_time < shift.start_time);

        let (status, _) = send(
            &app,
            Method::PUT,
            &format!("/on-calls/{}", shift.id),
            Some(r#"{"priest_id":5,"start_time":"2024-03-02T08:00:00Z","end_time":"2024-03-02T20:00:00Z","status":"ACTIVE"}"#),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let listed: Vec<OnCall> = serde_json::from_value(list(&app, "/on-calls").await).unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].priest_id, 5);
        assert_eq!(listed[0].status, "ACTIVE");
        assert_eq!(listed[0].created_ts, shift.created_ts);
        assert!(listed[0].upd_ts >= shift.upd_ts);

        let (status, _) = send(&app, Method::DELETE, &format!("/on-calls/{}", shift.id), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(list(&app, "/on-calls").await, json!([]));
    }

    #[tokio::test]
    async fn test_on_call_missing_fields_are_stored_as_zero_values() {
        let app = app(memory_state());

        let (status, body) = send(&app, Method::POST, "/on-calls", Some(r#"{"status":"DRAFT"}"#)).await;
        assert_eq!(status, StatusCode::OK);
        let json: Value = serde_json::from_str(&body).unwrap();
        assert_eq!(json["priest_id"], 0);
        assert_eq!(json["start_time"], "0001-01-01T00:00:00Z");
        assert_eq!(json["end_time"], "0001-01-01T00:00:00Z");
        assert_eq!(json["status"], "DRAFT");
    }

    #[tokio::test]
    async fn test_missing_id_is_silent_success() {
        let app = app(memory_state());

        let (status, body) = send(&app, Method::DELETE, "/active-calls/999", None).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.is_empty());

        let (status, _) = send(
            &app,
            Method::PUT,
            "/priests/999",
            Some(r#"{"name":"Fr. Nobody"}"#),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(list(&app, "/priests").await, json!([]));
    }

    #[tokio::test]
    async fn test_malformed_json_is_rejected_without_writes() {
        let app = app(memory_state());

        for uri in ["/active-calls", "/on-calls", "/priests"] {
            let (status, body) = send(&app, Method::POST, uri, Some("{\"name\":")).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
            assert!(body.contains("EOF"), "{uri}: {body}");
            assert_eq!(list(&app, uri).await, json!([]));
        }

        send(&app, Method::POST, "/priests", Some(r#"{"name":"Fr. Smith"}"#)).await;
        let (status, _) = send(&app, Method::PUT, "/priests/1", Some("not json")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            list(&app, "/priests").await,
            json!([{"id": 1, "name": "Fr. Smith"}])
        );
    }

    #[tokio::test]
    async fn test_non_numeric_id_rejected_before_store() {
        // Any store access would answer 500 here.
        let app = app(failing_state());

        for uri in ["/active-calls/abc", "/on-calls/1x", "/priests/-"] {
            let (status, body) = send(&app, Method::DELETE, uri, None).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
            assert_eq!(body, "Invalid ID");

            let (status, _) = send(&app, Method::PUT, uri, Some("{}")).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
        }
    }

    #[tokio::test]
    async fn test_store_errors_expose_raw_message() {
        let app = app(failing_state());

        let (status, body) = send(&app, Method::GET, "/on-calls", None).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, "connection refused");

        let (status, body) = send(&app, Method::DELETE, "/priests/1", None).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, "connection refused");
    }

    #[tokio::test]
    async fn test_submit_active_call_renders_card() {
        let app = app(memory_state());

        let request = Request::builder()
            .method(Method::POST)
            .uri("/submit-active-call")
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from("patientName=B.+Roe&address=2+Elm+%26+Oak&notes=back+door"))
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers()[header::CONTENT_TYPE]
            .to_str()
            .unwrap()
            .starts_with("text/html"));
        let bytes = hyper::body::to_bytes(response.into_body()).await.unwrap();
        let html = String::from_utf8(bytes.to_vec()).unwrap();
        assert!(html.contains("B. Roe"));
        assert!(html.contains("Address: 2 Elm &amp; Oak"));

        let listed: Vec<ActiveCall> =
            serde_json::from_value(list(&app, "/active-calls").await).unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].status, "OPEN");
        assert_eq!(listed[0].notes, "back door");
    }

    #[tokio::test]
    async fn test_submit_active_call_store_failure() {
        let app = app(failing_state());

        let (status, body) = send(
            &app,
            Method::POST,
            "/submit-active-call",
            Some("patientName=A.+Doe"),
        )
        .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, "Error inserting new active call");
    }

    #[tokio::test]
    async fn test_submit_active_call_reread_failure() {
        for find_fails in [true, false] {
            let mut state = memory_state();
            state.active_calls = Arc::new(WriteOnlyRepository { find_fails });
            let app = app(state);

            let (status, body) = send(
                &app,
                Method::POST,
                "/submit-active-call",
                Some("patientName=A.+Doe"),
            )
            .await;
            assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR, "find_fails={find_fails}");
            assert_eq!(body, "Error fetching new active call");
        }
    }

    #[tokio::test]
    async fn test_submit_active_call_rejects_bad_escapes() {
        let app = app(memory_state());

        for (uri, form) in [
            ("/submit-active-call", "patientName=%zz&address=x"),
            ("/submit-active-call", "notes=100%"),
            ("/submit-active-call?patientName=%zz", "address=x"),
        ] {
            let (status, body) = send(&app, Method::POST, uri, Some(form)).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{uri} {form}");
            assert_eq!(body, "Error parsing form");
        }
        assert_eq!(list(&app, "/active-calls").await, json!([]));
    }

    #[tokio::test]
    async fn test_submit_active_call_first_value_wins() {
        let app = app(memory_state());

        let (status, html) = send(
            &app,
            Method::POST,
            "/submit-active-call",
            Some("patientName=A&patientName=B&address=x"),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert!(html.contains(r#"<h5 class="card-title">A</h5>"#), "{html}");
        assert!(!html.contains(r#"<h5 class="card-title">B</h5>"#));
    }

    #[tokio::test]
    async fn test_submit_active_call_reads_query_fields() {
        let app = app(memory_state());

        let (status, _) = send(
            &app,
            Method::POST,
            "/submit-active-call?patientName=Q&address=query",
            Some("address=body"),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let listed: Vec<ActiveCall> =
            serde_json::from_value(list(&app, "/active-calls").await).unwrap();
        assert_eq!(listed[0].patient_name, "Q");
        // Body values take precedence over the query string.
        assert_eq!(listed[0].address, "body");
    }

    #[tokio::test]
    async fn test_submit_active_call_rejects_get() {
        let app = app(memory_state());

        let (status, _) = send(&app, Method::GET, "/submit-active-call", None).await;
        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    }

    #[tokio::test]
    async fn test_index_lists_active_calls() {
        let app = app(memory_state());

        send(
            &app,
            Method::POST,
            "/active-calls",
            Some(r#"{"address":"1 Main St","patient_name":"A. Doe","status":"OPEN","notes":""}"#),
        )
        .await;

        let (status, html) = send(&app, Method::GET, "/", None).await;
        assert_eq!(status, StatusCode::OK);
        assert!(html.contains("A. Doe"));
        assert!(html.contains("<!DOCTYPE html>"));
    }

    #[tokio::test]
    async fn test_index_renders_when_store_fails() {
        let app = app(failing_state());

        let (status, html) = send(&app, Method::GET, "/", None).await;
        assert_eq!(status, StatusCode::OK);
        assert!(html.contains(r#"<div id="active-calls"></div>"#));
    }

    #[tokio::test]
    async fn test_static_files_are_served() {
        let static_dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("static");
        let app = build_routes(memory_state(), &static_dir);

        let (status, body) = send(&app, Method::GET, "/static/pull-to-refresh.js", None).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("touchstart"));

        let (status, _) = send(&app, Method::GET, "/static/missing.js", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
