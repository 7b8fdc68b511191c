//! Template HTTP API.
//!
//! - `GET  /api/templates`       : stored template names
//! - `GET  /api/templates/:name` : one template
//! - `POST /api/send`            : substitute + build + send (+ await reply)
//!
//! Every response is `{ ok, ... }`; failures carry `error: { code, message }`
//! with the HTTP status derived from the error's client code.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};

use secsgate_core::error::{ClientCode, SecsGateError};

use crate::app_state::AppState;
use crate::dispatch::SendRequest;

fn status_for(code: ClientCode) -> StatusCode {
    match code {
        ClientCode::BadRequest => StatusCode::BAD_REQUEST,
        ClientCode::NotFound => StatusCode::NOT_FOUND,
        ClientCode::Transport => StatusCode::BAD_GATEWAY,
        ClientCode::Timeout => StatusCode::GATEWAY_TIMEOUT,
        ClientCode::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn error_json(e: &SecsGateError) -> Value {
    let mut body = json!({
        "ok": false,
        "error": { "code": e.client_code().as_str(), "message": e.to_string() }
    });
    if let SecsGateError::MissingPlaceholders(keys) = e {
        body["error"]["missing"] = json!(keys);
    }
    body
}

fn error_response(e: &SecsGateError) -> Response {
    (status_for(e.client_code()), Json(error_json(e))).into_response()
}

pub async fn list_templates(State(state): State<AppState>) -> Response {
    match state.orchestrator().list_templates() {
        Ok(names) => Json(json!({ "ok": true, "templates": names })).into_response(),
        Err(e) => error_response(&e),
    }
}

pub async fn get_template(State(state): State<AppState>, Path(name): Path<String>) -> Response {
    match state.orchestrator().get_template(&name) {
        Ok(t) => Json(json!({ "ok": true, "template": t })).into_response(),
        Err(e) => error_response(&e),
    }
}

pub async fn send(
    State(state): State<AppState>,
    body: Result<Json<SendRequest>, JsonRejection>,
) -> Response {
    let req = match body {
        Ok(Json(req)) => req,
        Err(rej) => {
            return error_response(&SecsGateError::BadRequest(format!(
                "invalid send body: {}",
                rej.body_text()
            )))
        }
    };

    match state.orchestrator().send_template(req).await {
        Ok(outcome) => Json(json!({ "ok": true, "result": outcome })).into_response(),
        Err(e) => error_response(&e),
    }
}
