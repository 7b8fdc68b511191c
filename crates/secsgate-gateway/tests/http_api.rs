//! HTTP API tests driving the router in-process.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use secsgate_core::item::Capabilities;
use secsgate_core::template::{MemoryTemplateStore, Template};
use secsgate_gateway::app_state::AppState;
use secsgate_gateway::config::{self, ReplyMode};
use secsgate_gateway::router::build_router;
use secsgate_gateway::transport::{Connection, LoopbackConnection};

const CFG: &str = r#"
version: 1
gateway:
  default_timeout_ms: 100
connections:
  - name: eq
"#;

struct Harness {
    state: AppState,
    eq: Arc<LoopbackConnection>,
}

fn harness() -> Harness {
    let store = Arc::new(MemoryTemplateStore::new());
    store.insert(
        "S1F1",
        Template::from_value(json!({ "stream": 1, "func": 1, "replyExpected": true, "items": [] })).unwrap(),
    );
    store.insert(
        "S10F3",
        Template::from_value(json!({
            "stream": 10, "func": 3,
            "items": [{ "type": "A", "name": "text", "value": "{{msg}}" }]
        }))
        .unwrap(),
    );

    let eq = Arc::new(LoopbackConnection::new("eq", Capabilities::full(), ReplyMode::Echo, Duration::ZERO));
    let mute = Arc::new(LoopbackConnection::new("mute", Capabilities::full(), ReplyMode::Silent, Duration::ZERO));
    let conns: Vec<Arc<dyn Connection>> = vec![eq.clone(), mute];

    let cfg = config::load_from_str(CFG).unwrap();
    let state = AppState::with_parts(&cfg, store, conns).unwrap();
    Harness { state, eq }
}

fn app(h: &Harness) -> Router {
    build_router(h.state.clone())
}

async fn call(app: Router, req: Request<Body>) -> (StatusCode, Vec<u8>) {
    let resp = app.oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    (status, bytes.to_vec())
}

async fn get_json(app: Router, uri: &str) -> (StatusCode, Value) {
    let (status, body) = call(app, Request::get(uri).body(Body::empty()).unwrap()).await;
    (status, serde_json::from_slice(&body).unwrap())
}

async fn post_send(app: Router, body: Value) -> (StatusCode, Value) {
    let req = Request::post("/api/send")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    let (status, body) = call(app, req).await;
    (status, serde_json::from_slice(&body).unwrap())
}

#[tokio::test]
async fn lists_and_fetches_templates() {
    let h = harness();

    let (status, v) = get_json(app(&h), "/api/templates").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(v, json!({ "ok": true, "templates": ["S10F3", "S1F1"] }));

    let (status, v) = get_json(app(&h), "/api/templates/S1F1").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(v["template"]["func"], 1);

    let (status, v) = get_json(app(&h), "/api/templates/S7F7").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(v["ok"], false);
    assert_eq!(v["error"]["code"], "NOT_FOUND");
}

#[tokio::test]
async fn send_named_template_and_get_reply() {
    let h = harness();
    let (status, v) = post_send(app(&h), json!({ "template": "S1F1", "from": "eq" })).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(v["ok"], true);
    assert_eq!(v["result"]["status"], "replied");
    assert_eq!(v["result"]["request"]["func"], 1);
    assert_eq!(v["result"]["reply"]["func"], 2);
    assert_eq!(v["result"]["reply"]["token"], v["result"]["request"]["token"]);
}

#[tokio::test]
async fn send_inline_template_fire_and_forget() {
    let h = harness();
    let body = json!({
        "template": { "stream": 6, "func": 11, "items": [{ "type": "U2", "name": "n", "value": "{{n}}" }] },
        "values": { "n": 7 },
        "from": "eq"
    });
    let (status, v) = post_send(app(&h), body).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(v["result"]["status"], "sent");
    assert_eq!(v["result"]["request"]["items"], json!([{ "type": "U2", "name": "n", "value": 7 }]));
    assert_eq!(h.eq.recent_sent().len(), 1);
}

#[tokio::test]
async fn missing_values_are_listed() {
    let h = harness();
    let (status, v) = post_send(app(&h), json!({ "name": "S10F3", "from": "eq" })).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(v["error"]["code"], "BAD_REQUEST");
    assert_eq!(v["error"]["missing"], json!(["msg"]));
    assert!(h.eq.recent_sent().is_empty());
}

#[tokio::test]
async fn silent_peer_times_out_with_504() {
    let h = harness();
    let (status, v) = post_send(
        app(&h),
        json!({ "template": "S1F1", "from": "mute", "timeoutMs": 30 }),
    )
    .await;
    assert_eq!(status, StatusCode::GATEWAY_TIMEOUT);
    assert_eq!(v["error"]["code"], "TIMEOUT");
}

#[tokio::test]
async fn closed_connection_is_502() {
    let h = harness();
    h.eq.close();
    let (status, v) = post_send(app(&h), json!({ "template": "S1F1", "from": "eq" })).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(v["error"]["code"], "TRANSPORT");
}

#[tokio::test]
async fn malformed_bodies_are_400() {
    let h = harness();

    let (status, v) = post_send(app(&h), json!({ "template": "S1F1", "from": "eq", "bogus": 1 })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(v["ok"], false);

    let (status, v) = post_send(app(&h), json!({ "template": "S1F1" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(v["error"]["message"], "bad request: from is required");

    let req = Request::post("/api/send")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let (status, _) = call(app(&h), req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn ops_endpoints() {
    let h = harness();

    let (status, body) = call(app(&h), Request::get("/healthz").body(Body::empty()).unwrap()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, b"ok");

    let deadline = Instant::now() + Duration::from_secs(2);
    while !h.state.is_ready() {
        assert!(Instant::now() < deadline, "links never came up");
        tokio::time::sleep(Duration::from_millis(1)).await;
    }
    let (status, _) = call(app(&h), Request::get("/readyz").body(Body::empty()).unwrap()).await;
    assert_eq!(status, StatusCode::OK);

    let _ = post_send(app(&h), json!({ "template": "S1F1", "from": "eq" })).await;
    let (status, body) = call(app(&h), Request::get("/metrics").body(Body::empty()).unwrap()).await;
    assert_eq!(status, StatusCode::OK);
    let text = String::from_utf8(body).unwrap();
    assert!(text.contains("secsgate_sends_total{from=\"eq\",outcome=\"replied\"} 1"), "{text}");
    assert!(text.contains("secsgate_pending_requests{from=\"mute\"} 0"), "{text}");
    assert!(text.contains("secsgate_reply_latency_micros_count{from=\"eq\"} 1"), "{text}");

    h.eq.close();
    let deadline = Instant::now() + Duration::from_secs(2);
    while h.state.is_ready() {
        assert!(Instant::now() < deadline, "link never went down");
        tokio::time::sleep(Duration::from_millis(1)).await;
    }
    let (status, _) = call(app(&h), Request::get("/readyz").body(Body::empty()).unwrap()).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
}
