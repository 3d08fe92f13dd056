//! Interaction endpoint tests driven through the router with `oneshot`

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use ed25519_dalek::{Signer, SigningKey};
use food_order_bot::server::{build_router, InteractionResponder, ServerState, SignatureVerifier};
use food_order_bot::transport::{ChannelInfo, InMemoryTransport, TransportError, UserInfo};
use food_order_bot::{BotSettings, FoodOrderBot};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tower::ServiceExt;

const TIMESTAMP: &str = "1700000000";

/// Captures completed interaction replies
struct RecordingResponder {
    sent: mpsc::UnboundedSender<(String, String)>,
}

#[async_trait]
impl InteractionResponder for RecordingResponder {
    async fn complete(&self, interaction_token: &str, content: &str) -> Result<(), TransportError> {
        let _ = self
            .sent
            .send((interaction_token.to_string(), content.to_string()));
        Ok(())
    }
}

struct TestApp {
    key: SigningKey,
    state: Arc<ServerState>,
    transport: Arc<InMemoryTransport>,
    replies: mpsc::UnboundedReceiver<(String, String)>,
}

impl TestApp {
    async fn new() -> Self {
        let key = SigningKey::from_bytes(&[42u8; 32]);
        let transport = Arc::new(InMemoryTransport::new(UserInfo {
            id: 1,
            name: "foodbot".to_string(),
        }));
        transport
            .add_channel(ChannelInfo::new(10, "food-order-lunch"))
            .await;
        let bot = Arc::new(FoodOrderBot::new(transport.clone(), BotSettings::default()));
        let (sent, replies) = mpsc::unbounded_channel();
        let state = Arc::new(ServerState {
            bot,
            verifier: SignatureVerifier::from_key(key.verifying_key()),
            responder: Arc::new(RecordingResponder { sent }),
        });
        Self {
            key,
            state,
            transport,
            replies,
        }
    }

    fn signed_request(&self, body: &Value) -> Request<Body> {
        let body = serde_json::to_vec(body).unwrap();
        let mut message = TIMESTAMP.as_bytes().to_vec();
        message.extend_from_slice(&body);
        let signature = hex::encode(self.key.sign(&message).to_bytes());

        Request::builder()
            .method("POST")
            .uri("/interactions")
            .header("content-type", "application/json")
            .header("x-signature-ed25519", signature)
            .header("x-signature-timestamp", TIMESTAMP)
            .body(Body::from(body))
            .unwrap()
    }

    async fn send(&self, request: Request<Body>) -> (StatusCode, Vec<u8>) {
        let response = build_router(self.state.clone())
            .oneshot(request)
            .await
            .unwrap();
        let status = response.status();
        let body = response.into_body().collect().await.unwrap().to_bytes();
        (status, body.to_vec())
    }

    async fn next_reply(&mut self) -> (String, String) {
        tokio::time::timeout(Duration::from_secs(5), self.replies.recv())
            .await
            .expect("reply was not delivered in time")
            .expect("responder channel closed")
    }
}

fn command(name: &str, options: Value, channel: Value) -> Value {
    json!({
        "type": 2,
        "token": format!("tok-{name}"),
        "channel_id": "10",
        "channel": channel,
        "member": { "user": { "id": "5", "username": "alice" } },
        "data": { "name": name, "options": options },
    })
}

#[tokio::test]
async fn unsigned_requests_are_rejected() {
    let app = TestApp::new().await;
    let request = Request::builder()
        .method("POST")
        .uri("/interactions")
        .body(Body::from(r#"{"type":1}"#))
        .unwrap();

    let (status, _) = app.send(request).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn tampered_body_is_rejected() {
    let app = TestApp::new().await;
    let mut request = app.signed_request(&json!({ "type": 1 }));
    *request.body_mut() = Body::from(r#"{"type":2}"#);

    let (status, _) = app.send(request).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn ping_is_answered_with_pong() {
    let app = TestApp::new().await;
    let (status, body) = app.send(app.signed_request(&json!({ "type": 1 }))).await;

    assert_eq!(status, StatusCode::OK);
    let body: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(body, json!({ "type": 1 }));
}

#[tokio::test]
async fn command_is_deferred_then_completed() {
    let mut app = TestApp::new().await;
    let payload = command(
        "startorder",
        json!([
            { "name": "place", "type": 3, "value": "Pizza Place" },
            { "name": "time", "type": 3, "value": "19:00" }
        ]),
        json!({ "id": "10", "name": "food-order-lunch", "type": 0 }),
    );

    let (status, body) = app.send(app.signed_request(&payload)).await;
    assert_eq!(status, StatusCode::OK);
    let body: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(body, json!({ "type": 5, "data": { "flags": 64 } }));

    let (token, content) = app.next_reply().await;
    assert_eq!(token, "tok-startorder");
    assert_eq!(content, "Order started!");

    let order = app.state.bot.store().active_order(10).await.unwrap();
    assert_eq!(order.place, "Pizza Place");
    assert_eq!(order.starter.name, "alice");
    assert_eq!(app.transport.messages(10).await.len(), 1);
}

#[tokio::test]
async fn channel_name_is_looked_up_when_missing() {
    let mut app = TestApp::new().await;
    let payload = command("restoreorder", json!([]), Value::Null);

    let (status, _) = app.send(app.signed_request(&payload)).await;
    assert_eq!(status, StatusCode::OK);

    let (_, content) = app.next_reply().await;
    assert_eq!(content, "No order available to restore.");
}

#[tokio::test]
async fn missing_required_option_gets_an_immediate_reply() {
    let app = TestApp::new().await;
    let payload = command(
        "addorder",
        json!([]),
        json!({ "id": "10", "name": "food-order-lunch", "type": 0 }),
    );

    let (status, body) = app.send(app.signed_request(&payload)).await;
    assert_eq!(status, StatusCode::OK);
    let body: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(body["type"], 4);
    assert_eq!(body["data"]["flags"], 64);
    assert_eq!(body["data"]["content"], "/addorder needs a value for 'order'");
}

#[tokio::test]
async fn health_reports_active_orders() {
    let app = TestApp::new().await;
    app.state
        .bot
        .store()
        .start(
            10,
            food_order_bot::orders::Member::new(5, "alice"),
            "Sushi Bar",
            "12:00",
        )
        .await
        .unwrap();

    let request = Request::builder()
        .uri("/health")
        .body(Body::empty())
        .unwrap();
    let (status, body) = app.send(request).await;

    assert_eq!(status, StatusCode::OK);
    let body: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(body["ok"], true);
    assert_eq!(body["active_orders"], 1);
}
