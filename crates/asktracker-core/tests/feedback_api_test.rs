//! Contract tests for FeedbackApiClient against a mock feedback service.
//!
//! | Method | Path | Test |
//! |--------|------|------|
//! | GET    | `/feedback` | `list_*` |
//! | POST   | `/feedback` | `create_*` |
//! | PUT    | `/feedback/{id}` | `update_*` |
//! | DELETE | `/feedback/{id}` | `delete_*` |
//! | (engine over HTTP) | | `engine_*` |

use std::time::Duration;

use asktracker_core::{
    Credential, EngineSettings, ErrorKind, FeedbackApiClient, FeedbackDraft, FeedbackEngine,
    FeedbackId, FeedbackPatch, FeedbackTransport, Identity, Session, TransportError, UserId,
};
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client(server: &MockServer) -> FeedbackApiClient {
    FeedbackApiClient::new(server.uri().parse().unwrap(), Duration::from_secs(5)).unwrap()
}

fn credential() -> Credential {
    Credential::new("test-token")
}

fn session() -> Session {
    Session::new(
        Identity {
            id: UserId(7),
            display_name: "Ada".into(),
            email: "ada@example.com".into(),
        },
        credential(),
    )
}

fn item(id: i64, owner: i64, title: &str) -> serde_json::Value {
    json!({
        "id": id,
        "user_id": owner,
        "title": title,
        "message": format!("{title} body"),
        "created_at": "2024-05-01T10:00:00.123456",
        "last_modified": "2024-05-01T10:00:00.123456"
    })
}

// ── GET /feedback ────────────────────────────────────────────────────

#[tokio::test]
async fn list_sends_bearer_and_decodes_items() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/feedback"))
        .and(header("authorization", "Bearer test-token"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!([item(2, 7, "Newer"), item(1, 3, "Older")])),
        )
        .expect(1)
        .mount(&server)
        .await;

    let items = client(&server).list_all(&credential()).await.unwrap();
    assert_eq!(items.len(), 2);
    assert_eq!(items[0].id, FeedbackId(2));
    assert_eq!(items[0].owner_id, UserId(7));
    assert_eq!(items[0].body, "Newer body");
    assert!(!items[0].was_modified());
    assert!(!items[1].is_owned_by(UserId(7)));
}

#[tokio::test]
async fn list_keeps_base_path() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/feedback"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let base = format!("{}/api/", server.uri()).parse().unwrap();
    let client = FeedbackApiClient::new(base, Duration::from_secs(5)).unwrap();
    assert!(client.list_all(&credential()).await.unwrap().is_empty());
}

#[tokio::test]
async fn list_unauthorized_carries_detail() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/feedback"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({"detail": "Could not validate credentials"})),
        )
        .mount(&server)
        .await;

    let err = client(&server).list_all(&credential()).await.unwrap_err();
    match &err {
        TransportError::Status { status, .. } => assert_eq!(*status, 401),
        other => panic!("expected Status, got {other:?}"),
    }
    assert_eq!(err.detail(), Some("Could not validate credentials"));
}

#[tokio::test]
async fn list_with_malformed_body_is_decode_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/feedback"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let err = client(&server).list_all(&credential()).await.unwrap_err();
    assert!(matches!(err, TransportError::Decode { .. }));
}

// ── POST /feedback ───────────────────────────────────────────────────

#[tokio::test]
async fn create_posts_wire_fields() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/feedback"))
        .and(header("authorization", "Bearer test-token"))
        .and(body_json(json!({"title": "Bug", "message": "It crashes", "user_id": 7})))
        .respond_with(ResponseTemplate::new(200).set_body_json(item(9, 7, "Bug")))
        .expect(1)
        .mount(&server)
        .await;

    let created = client(&server)
        .create(&credential(), &FeedbackDraft::new("Bug", "It crashes"), UserId(7))
        .await
        .unwrap();
    assert_eq!(created.id, FeedbackId(9));
    assert_eq!(created.title, "Bug");
}

#[tokio::test]
async fn create_validation_failure_joins_messages() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/feedback"))
        .respond_with(ResponseTemplate::new(422).set_body_json(json!({
            "detail": [
                {"loc": ["body", "title"], "msg": "field required", "type": "value_error.missing"}
            ]
        })))
        .mount(&server)
        .await;

    let err = client(&server)
        .create(&credential(), &FeedbackDraft::new("", "x"), UserId(7))
        .await
        .unwrap_err();
    assert_eq!(err.detail(), Some("field required"));
}

// ── PUT /feedback/{id} ───────────────────────────────────────────────

#[tokio::test]
async fn update_puts_title_and_message_only() {
    let server = MockServer::start().await;

    let mut updated = item(4, 7, "Renamed");
    updated["last_modified"] = json!("2024-05-02T08:30:00");

    Mock::given(method("PUT"))
        .and(path("/feedback/4"))
        .and(body_json(json!({"title": "Renamed", "message": "New text"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(updated))
        .expect(1)
        .mount(&server)
        .await;

    let item = client(&server)
        .update(&credential(), FeedbackId(4), &FeedbackPatch::new("Renamed", "New text"))
        .await
        .unwrap();
    assert_eq!(item.title, "Renamed");
    assert!(item.was_modified());
}

#[tokio::test]
async fn update_not_owned_is_forbidden() {
    let server = MockServer::start().await;

    Mock::given(method("PUT"))
        .and(path("/feedback/4"))
        .respond_with(
            ResponseTemplate::new(403).set_body_json(json!({"detail": "Not authorized to update this feedback"})),
        )
        .mount(&server)
        .await;

    let err = client(&server)
        .update(&credential(), FeedbackId(4), &FeedbackPatch::new("a", "b"))
        .await
        .unwrap_err();
    assert_eq!(err.detail(), Some("Not authorized to update this feedback"));
}

// ── DELETE /feedback/{id} ────────────────────────────────────────────

#[tokio::test]
async fn delete_accepts_empty_204() {
    let server = MockServer::start().await;

    Mock::given(method("DELETE"))
        .and(path("/feedback/4"))
        .and(header("authorization", "Bearer test-token"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    client(&server).delete(&credential(), FeedbackId(4)).await.unwrap();
}

#[tokio::test]
async fn delete_missing_is_not_found() {
    let server = MockServer::start().await;

    Mock::given(method("DELETE"))
        .and(path("/feedback/99"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({"detail": "Feedback not found"})))
        .mount(&server)
        .await;

    let err = client(&server).delete(&credential(), FeedbackId(99)).await.unwrap_err();
    assert!(matches!(err, TransportError::Status { status: 404, .. }));
}

#[tokio::test]
async fn unreachable_service_is_http_error() {
    let client =
        FeedbackApiClient::new("http://127.0.0.1:1".parse().unwrap(), Duration::from_secs(2)).unwrap();
    let err = client.list_all(&credential()).await.unwrap_err();
    assert!(matches!(err, TransportError::Http { .. }));
}

// ── Engine over HTTP ─────────────────────────────────────────────────

#[tokio::test]
async fn engine_round_trip_over_http() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/feedback"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([item(1, 7, "First")])))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/feedback"))
        .respond_with(ResponseTemplate::new(200).set_body_json(item(2, 7, "Second")))
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/feedback/1"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;

    let engine = FeedbackEngine::new(client(&server), session(), EngineSettings::default());

    assert_eq!(engine.refresh().await, Ok(1));
    let created = engine
        .create(FeedbackDraft::new("Second", "Second body"))
        .await
        .unwrap();
    assert_eq!(created.id, FeedbackId(2));
    engine.remove(FeedbackId(1)).await.unwrap();

    let ids: Vec<_> = engine.items().await.iter().map(|i| i.id).collect();
    assert_eq!(ids, vec![FeedbackId(2)]);
    assert!(engine.last_error_kind().await.is_none());
    assert!(!engine.is_pending());
}

#[tokio::test]
async fn engine_surfaces_service_detail_as_banner() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/feedback"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([item(1, 7, "First")])))
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/feedback/1"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({"detail": "database is locked"})))
        .mount(&server)
        .await;

    let engine = FeedbackEngine::new(client(&server), session(), EngineSettings::default());
    engine.refresh().await.unwrap();
    let before = engine.items().await;

    let result = engine.update(FeedbackId(1), FeedbackPatch::new("x", "y")).await;

    assert_eq!(result, Err(ErrorKind::UpdateFailed));
    assert_eq!(engine.items().await, before);
    assert_eq!(engine.last_error_banner().await.as_deref(), Some("database is locked"));
}
