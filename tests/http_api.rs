use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::Router;
use chat_relay::config::Config;
use chat_relay::db::{InMemoryMessageStore, MessageStore, StoreError};
use chat_relay::models::{ChatMessage, InboundChatMessage};
use chat_relay::routes::create_app;
use chat_relay::AppState;
use serde_json::{json, Value};
use tower::ServiceExt;

struct DownStore;

#[async_trait]
impl MessageStore for DownStore {
    async fn append(&self, _message: &ChatMessage) -> Result<(), StoreError> {
        Err(StoreError::Unavailable("connection refused".into()))
    }

    async fn query_ordered(&self, _group_id: &str) -> Result<Vec<ChatMessage>, StoreError> {
        Err(StoreError::Unavailable("connection refused".into()))
    }

    async fn is_ready(&self) -> bool {
        false
    }
}

fn app_with(store: Arc<dyn MessageStore>) -> (Router, Arc<AppState>) {
    app_for(&Config::default(), store)
}

fn app_for(config: &Config, store: Arc<dyn MessageStore>) -> (Router, Arc<AppState>) {
    let state = Arc::new(AppState::new(config, store));
    (create_app(state.clone(), config), state)
}

fn app() -> (Router, Arc<AppState>) {
    app_with(Arc::new(InMemoryMessageStore::new()))
}

async fn body_json(response: axum::response::Response) -> Result<Value> {
    let bytes = to_bytes(response.into_body(), usize::MAX).await?;
    Ok(serde_json::from_slice(&bytes)?)
}

fn post_json(uri: &str, body: Value) -> Result<Request<Body>> {
    Ok(Request::post(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))?)
}

#[tokio::test]
async fn trigger_with_no_listeners_succeeds() -> Result<()> {
    let (app, state) = app();

    let response = app
        .oneshot(post_json("/send-notification", json!({"message": "system down"}))?)
        .await?;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        body_json(response).await?,
        json!({"status": "Notification sent", "message": "system down"})
    );
    assert!(state.hub.is_empty());
    Ok(())
}

#[tokio::test]
async fn trigger_reaches_every_hub_connection() -> Result<()> {
    let (app, state) = app();
    let (first, mut first_out) = state.open_connection();
    let (second, mut second_out) = state.open_connection();
    state.hub.connect(&first);
    state.hub.connect(&second);

    let response = app
        .oneshot(post_json("/send-notification", json!({"message": "exam moved"}))?)
        .await?;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(first_out.next().await.as_deref(), Some("exam moved"));
    assert_eq!(second_out.next().await.as_deref(), Some("exam moved"));
    Ok(())
}

#[tokio::test]
async fn trigger_rejects_wrong_shape() -> Result<()> {
    let (app, _state) = app();

    let response = app
        .oneshot(post_json("/send-notification", json!({"text": "nope"}))?)
        .await?;

    assert!(response.status().is_client_error());
    Ok(())
}

#[tokio::test]
async fn history_is_returned_in_send_order() -> Result<()> {
    let (app, state) = app();
    for text in ["m1", "m2", "m3"] {
        let inbound = InboundChatMessage { user: "alice".into(), text: text.into() };
        let message = ChatMessage::stamped("cs101", inbound, state.clock.now());
        state.store.append(&message).await?;
    }
    let other = InboundChatMessage { user: "bob".into(), text: "elsewhere".into() };
    state
        .store
        .append(&ChatMessage::stamped("math", other, state.clock.now()))
        .await?;

    let response = app
        .oneshot(Request::get("/groups/cs101/messages").body(Body::empty())?)
        .await?;

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await?;
    let records = body.as_array().expect("array body");
    let texts: Vec<_> = records.iter().map(|r| r["text"].as_str().unwrap()).collect();
    assert_eq!(texts, vec!["m1", "m2", "m3"]);
    for record in records {
        assert_eq!(record["group_id"], "cs101");
        assert_eq!(record["user"], "alice");
        assert!(record["timestamp"].is_string());
    }
    Ok(())
}

#[tokio::test]
async fn history_of_unknown_group_is_empty() -> Result<()> {
    let (app, _state) = app();

    let response = app
        .oneshot(Request::get("/groups/ghost/messages").body(Body::empty())?)
        .await?;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await?, json!([]));
    Ok(())
}

#[tokio::test]
async fn history_reports_store_outage() -> Result<()> {
    let (app, _state) = app_with(Arc::new(DownStore));

    let response = app
        .oneshot(Request::get("/groups/cs101/messages").body(Body::empty())?)
        .await?;

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    let body = body_json(response).await?;
    assert_eq!(body["code"], 503);
    Ok(())
}

#[tokio::test]
async fn health_and_readiness() -> Result<()> {
    let (app, _state) = app();
    let response = app
        .clone()
        .oneshot(Request::get("/").body(Body::empty())?)
        .await?;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await?, json!({"Hello": "World"}));

    let response = app
        .clone()
        .oneshot(Request::get("/api/health").body(Body::empty())?)
        .await?;
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .oneshot(Request::get("/api/ready").body(Body::empty())?)
        .await?;
    assert_eq!(response.status(), StatusCode::OK);

    let (down, _state) = app_with(Arc::new(DownStore));
    let response = down
        .oneshot(Request::get("/api/ready").body(Body::empty())?)
        .await?;
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    Ok(())
}

#[tokio::test]
async fn swagger_is_not_served_in_production() -> Result<()> {
    let (dev, _state) = app();
    let response = dev
        .oneshot(Request::get("/api-docs/openapi.json").body(Body::empty())?)
        .await?;
    assert_eq!(response.status(), StatusCode::OK);

    let production = Config {
        environment: "production".into(),
        ..Config::default()
    };
    let (prod, _state) = app_for(&production, Arc::new(InMemoryMessageStore::new()));
    let response = prod
        .clone()
        .oneshot(Request::get("/api-docs/openapi.json").body(Body::empty())?)
        .await?;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = prod
        .oneshot(Request::get("/api/health").body(Body::empty())?)
        .await?;
    assert_eq!(response.status(), StatusCode::OK);
    Ok(())
}

#[tokio::test]
async fn diagnostics_counts_connections() -> Result<()> {
    let (app, state) = app();
    let (a, _oa) = state.open_connection();
    let (b, _ob) = state.open_connection();
    let (n, _on) = state.open_connection();
    state.registry.join(&a, "cs101");
    state.registry.join(&b, "math");
    state.hub.connect(&n);

    let response = tokio::time::timeout(
        Duration::from_secs(10),
        app.oneshot(Request::get("/api/v1/diagnostics").body(Body::empty())?),
    )
    .await??;

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await?;
    assert_eq!(body["n_groups"], 2);
    assert_eq!(body["n_group_conn"], 2);
    assert_eq!(body["n_notification_conn"], 1);
    Ok(())
}
