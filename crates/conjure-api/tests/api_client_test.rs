#![allow(clippy::unwrap_used)]
// Integration tests for `ApiClient` using wiremock.

use std::sync::Arc;

use secrecy::{ExposeSecret, SecretString};
use serde_json::json;
use url::Url;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

use conjure_api::types::{ConditionWire, EffectUpdate, TriggerCreate};
use conjure_api::{ApiClient, Error, MemoryTokenStore, TokenStore};

// ── Helpers ─────────────────────────────────────────────────────────

async fn setup_with(tokens: Arc<MemoryTokenStore>) -> (MockServer, ApiClient) {
    let server = MockServer::start().await;
    let base_url = Url::parse(&server.uri()).unwrap();
    let client = ApiClient::with_client(reqwest::Client::new(), base_url, tokens);
    (server, client)
}

async fn setup() -> (MockServer, ApiClient) {
    setup_with(Arc::new(MemoryTokenStore::new())).await
}

fn no_auth_header(req: &Request) -> bool {
    !req.headers.contains_key("authorization")
}

// ── Effect tests ────────────────────────────────────────────────────

#[tokio::test]
async fn test_list_effects() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/magic-effects"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "id": "e1", "name": "Ember Burst", "type": "particle",
              "parameters": { "intensity": 0.8, "color": "#FF4400" } },
            { "id": 2, "name": "Chime", "type": "sound", "parameters": {} }
        ])))
        .mount(&server)
        .await;

    let effects = client.list_effects().await.unwrap();

    assert_eq!(effects.len(), 2);
    assert_eq!(effects[0].name, "Ember Burst");
    assert_eq!(effects[0].effect_type, "particle");
    assert_eq!(effects[0].parameters["color"], "#FF4400");
    assert_eq!(effects[1].id, "2");
}

#[tokio::test]
async fn test_get_effect_not_found_uses_body_message() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/magic-effects/missing"))
        .respond_with(
            ResponseTemplate::new(404).set_body_json(json!({ "message": "Effect not found" })),
        )
        .mount(&server)
        .await;

    let err = client.get_effect("missing").await.unwrap_err();

    assert!(err.is_not_found(), "expected 404, got: {err:?}");
    let shape = err.api_error();
    assert_eq!(shape.message, "Effect not found");
    assert_eq!(shape.status, 404);
}

#[tokio::test]
async fn test_error_without_message_is_generic() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/magic-effects"))
        .respond_with(ResponseTemplate::new(503).set_body_string("upstream down"))
        .mount(&server)
        .await;

    let err = client.list_effects().await.unwrap_err();
    let shape = err.api_error();

    assert_eq!(shape.status, 503);
    assert_eq!(shape.message, "An unexpected error occurred");
}

#[tokio::test]
async fn test_network_failure_maps_to_500() {
    // Nothing listens on the discard port.
    let base_url = Url::parse("http://127.0.0.1:9").unwrap();
    let client = ApiClient::with_client(
        reqwest::Client::new(),
        base_url,
        Arc::new(MemoryTokenStore::new()),
    );
    let err = client.list_effects().await.unwrap_err();

    assert!(matches!(err, Error::Transport(_)), "got: {err:?}");
    assert_eq!(err.api_error().status, 500);
}

#[tokio::test]
async fn test_update_effect_sends_partial_body() {
    let (server, client) = setup().await;

    Mock::given(method("PUT"))
        .and(path("/api/magic-effects/e1"))
        .and(body_json(json!({ "name": "Ember Storm" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "e1", "name": "Ember Storm", "type": "particle", "parameters": {}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let update = EffectUpdate {
        name: Some("Ember Storm".into()),
        ..EffectUpdate::default()
    };
    let updated = client.update_effect("e1", &update).await.unwrap();
    assert_eq!(updated.name, "Ember Storm");
}

#[tokio::test]
async fn test_delete_effect_ignores_message_body() {
    let (server, client) = setup().await;

    Mock::given(method("DELETE"))
        .and(path("/api/magic-effects/e1"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "message": "Effect e1 deleted" })),
        )
        .expect(1)
        .mount(&server)
        .await;

    client.delete_effect("e1").await.unwrap();
}

// ── Trigger tests ───────────────────────────────────────────────────

#[tokio::test]
async fn test_bearer_token_attached_when_stored() {
    let tokens = Arc::new(MemoryTokenStore::with_token("tok-123"));
    let (server, client) = setup_with(tokens).await;

    Mock::given(method("GET"))
        .and(path("/api/triggers"))
        .and(header("authorization", "Bearer tok-123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    assert!(client.list_triggers().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_no_bearer_token_without_session() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/triggers"))
        .and(no_auth_header)
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    client.list_triggers().await.unwrap();
}

#[tokio::test]
async fn test_list_triggers_paged_envelope() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/triggers"))
        .and(query_param("limit", "10"))
        .and(query_param("offset", "20"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "triggers": [{ "id": "t21", "name": "Sunset",
                           "condition": { "type": "time", "value": "18:30" } }],
            "total": 21
        })))
        .mount(&server)
        .await;

    let page = client.list_triggers_page(10, 20).await.unwrap();
    assert_eq!(page.total(), 21);
    assert_eq!(page.into_items()[0].id, "t21");
}

#[tokio::test]
async fn test_create_trigger_posts_condition() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/triggers"))
        .and(body_json(json!({
            "name": "On join",
            "type": "event",
            "condition": { "type": "event", "value": "player_join" },
            "effect_id": "e1",
            "enabled": true
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "id": "t1", "name": "On join", "type": "event",
            "condition": { "type": "event", "value": "player_join" },
            "effect_id": "e1", "enabled": true,
            "created_at": "2024-06-15T10:30:00Z"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let body = TriggerCreate {
        name: "On join".into(),
        trigger_type: "event".into(),
        condition: ConditionWire {
            kind: "event".into(),
            value: json!("player_join"),
        },
        effect_id: Some("e1".into()),
        enabled: true,
        description: None,
        parameters: serde_json::Map::new(),
    };
    let created = client.create_trigger(&body).await.unwrap();

    assert_eq!(created.id, "t1");
    assert_eq!(created.created_at.as_deref(), Some("2024-06-15T10:30:00Z"));
}

#[tokio::test]
async fn test_toggle_trigger() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/triggers/t1/toggle"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "t1", "name": "Dusk", "enabled": false
        })))
        .expect(1)
        .mount(&server)
        .await;

    let toggled = client.toggle_trigger("t1").await.unwrap();
    assert!(!toggled.enabled);
}

#[tokio::test]
async fn test_cancel_trigger_is_delete() {
    let (server, client) = setup().await;

    Mock::given(method("DELETE"))
        .and(path("/api/triggers/t9"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    client.cancel_trigger("t9").await.unwrap();
}

// ── Auth tests ──────────────────────────────────────────────────────

#[tokio::test]
async fn test_login_stores_token() {
    let tokens = Arc::new(MemoryTokenStore::new());
    let (server, client) = setup_with(Arc::clone(&tokens)).await;

    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .and(body_json(json!({ "email": "mage@example.com", "password": "hunter2" })))
        .and(no_auth_header)
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "fresh-token",
            "token_type": "bearer",
            "user": { "id": 1, "email": "mage@example.com", "username": "mage" }
        })))
        .mount(&server)
        .await;

    let password = SecretString::from("hunter2".to_string());
    let resp = client.login("mage@example.com", &password).await.unwrap();

    assert_eq!(resp.user.unwrap().username, "mage");
    assert_eq!(tokens.load().unwrap().expose_secret(), "fresh-token");
}

#[tokio::test]
async fn test_login_failure_keeps_store_empty() {
    let tokens = Arc::new(MemoryTokenStore::new());
    let (server, client) = setup_with(Arc::clone(&tokens)).await;

    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({ "message": "Bad credentials" })),
        )
        .mount(&server)
        .await;

    let password = SecretString::from("wrong".to_string());
    let err = client.login("mage@example.com", &password).await.unwrap_err();

    assert!(err.is_unauthorized());
    assert_eq!(err.api_error().message, "Bad credentials");
    assert!(tokens.load().is_none());
}

#[tokio::test]
async fn test_logout_clears_token() {
    let tokens = Arc::new(MemoryTokenStore::with_token("tok"));
    let (server, client) = setup_with(Arc::clone(&tokens)).await;

    Mock::given(method("POST"))
        .and(path("/auth/logout"))
        .and(header("authorization", "Bearer tok"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;

    client.logout().await.unwrap();
    assert!(tokens.load().is_none());
}

#[tokio::test]
async fn test_me_requires_token() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/auth/me"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let err = client.me().await.unwrap_err();
    assert!(matches!(err, Error::MissingToken));
}

#[tokio::test]
async fn test_verify_token_false_without_token() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/auth/verify-token"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    assert!(!client.verify_token().await);
}

#[tokio::test]
async fn test_verify_token_rejected_returns_false_and_clears() {
    let tokens = Arc::new(MemoryTokenStore::with_token("stale"));
    let (server, client) = setup_with(Arc::clone(&tokens)).await;

    Mock::given(method("POST"))
        .and(path("/auth/verify-token"))
        .and(header("authorization", "Bearer stale"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({ "detail": "Invalid token" })),
        )
        .expect(1)
        .mount(&server)
        .await;

    assert!(!client.verify_token().await);
    assert!(tokens.load().is_none());
}

#[tokio::test]
async fn test_verify_token_accepted() {
    let tokens = Arc::new(MemoryTokenStore::with_token("good"));
    let (server, client) = setup_with(Arc::clone(&tokens)).await;

    Mock::given(method("POST"))
        .and(path("/auth/verify-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "valid": true })))
        .mount(&server)
        .await;

    assert!(client.verify_token().await);
    assert!(tokens.load().is_some());
}

#[tokio::test]
async fn test_verify_token_no_content_is_not_valid() {
    let tokens = Arc::new(MemoryTokenStore::with_token("good"));
    let (server, client) = setup_with(Arc::clone(&tokens)).await;

    Mock::given(method("POST"))
        .and(path("/auth/verify-token"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    assert!(!client.verify_token().await);
    assert!(tokens.load().is_some());
}

#[tokio::test]
async fn test_verify_token_unreachable_keeps_token() {
    // Nothing listens on the discard port.
    let tokens = Arc::new(MemoryTokenStore::with_token("kept"));
    let client = ApiClient::with_client(
        reqwest::Client::new(),
        Url::parse("http://127.0.0.1:9").unwrap(),
        Arc::<MemoryTokenStore>::clone(&tokens),
    );

    assert!(!client.verify_token().await);
    assert_eq!(tokens.load().unwrap().expose_secret(), "kept");
}

#[tokio::test]
async fn test_request_password_reset() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/auth/reset-password"))
        .and(body_json(json!({ "email": "mage@example.com" })))
        .respond_with(ResponseTemplate::new(202))
        .expect(1)
        .mount(&server)
        .await;

    client.request_password_reset("mage@example.com").await.unwrap();
}
