//! Main webhook handler: POST /webhooks/github
//!
//! Steps:
//! 1. Enforce the per-IP rate limit
//! 2. Verify the HMAC-SHA256 signature over the raw body
//! 3. Gate on event type and action
//! 4. Dispatch the qualifying event to the state machine in a background task
//! 5. Return 200 immediately — handler outcomes never reach the response

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    Json,
    body::Bytes,
    extract::{ConnectInfo, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use hmac::{Hmac, Mac};
use serde::Serialize;
use sha2::Sha256;
use tracing::{info, warn};

use pr_gate::github::types::{IssueCommentEvent, PullRequestEvent};
use pr_gate::{handle_issue_comment_event, handle_pull_request_event};

use crate::core::app_state::AppState;

type HmacSha256 = Hmac<Sha256>;

/// PR actions that (re)start a comprehension check.
const QUALIFYING_PR_ACTIONS: &[&str] = &["opened", "synchronize", "reopened"];

#[derive(Serialize)]
struct WebhookAck {
    status: &'static str,
    delivery: Option<String>,
}

pub async fn github_webhook(
    State(state): State<Arc<AppState>>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    // 1. Rate limit per client IP.
    let client_ip = addr.ip().to_string();
    if !state.rate_limiter.check(&client_ip) {
        let retry_after = state.rate_limiter.retry_after_secs(&client_ip);
        warn!(%client_ip, "webhook rate limited");
        return (
            StatusCode::TOO_MANY_REQUESTS,
            [("Retry-After", retry_after.to_string())],
            "rate limited",
        )
            .into_response();
    }

    // 2. Verify signature before any payload processing.
    let signature = headers
        .get("x-hub-signature-256")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");
    if let Err(e) = verify_signature(&body, &state.webhook_secret, signature) {
        warn!(error = %e, "webhook signature verification failed");
        return (StatusCode::UNAUTHORIZED, "signature verification failed").into_response();
    }

    let event = headers
        .get("x-github-event")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");
    let delivery = headers
        .get("x-github-delivery")
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string());

    // 3+4. Gate and dispatch in a background task; the response does not wait.
    match event {
        "pull_request" => {
            let payload: PullRequestEvent = match serde_json::from_slice(&body) {
                Ok(p) => p,
                Err(e) => {
                    warn!(error = %e, "failed to parse pull_request payload");
                    return (StatusCode::BAD_REQUEST, "invalid JSON").into_response();
                }
            };
            if QUALIFYING_PR_ACTIONS.contains(&payload.action.as_str()) {
                info!(
                    action = %payload.action,
                    pr = payload.pull_request.number,
                    "dispatching pull_request event"
                );
                let state = state.clone();
                tokio::spawn(async move {
                    handle_pull_request_event(&state.gate, payload).await;
                });
            }
        }
        "issue_comment" => {
            let payload: IssueCommentEvent = match serde_json::from_slice(&body) {
                Ok(p) => p,
                Err(e) => {
                    warn!(error = %e, "failed to parse issue_comment payload");
                    return (StatusCode::BAD_REQUEST, "invalid JSON").into_response();
                }
            };
            if payload.action == "created" && payload.issue.pull_request.is_some() {
                info!(pr = payload.issue.number, "dispatching issue_comment event");
                let state = state.clone();
                tokio::spawn(async move {
                    handle_issue_comment_event(&state.gate, payload).await;
                });
            }
        }
        other => {
            info!(event = %other, "ignoring webhook event");
        }
    }

    // 5. Acknowledge immediately.
    (
        StatusCode::OK,
        Json(WebhookAck {
            status: "ok",
            delivery,
        }),
    )
        .into_response()
}

/// Verify the HMAC-SHA256 signature from GitHub.
///
/// Compares the provided `sha256=...` header against the HMAC of the request
/// body; the comparison inside `verify_slice` is constant-time.
fn verify_signature(body: &[u8], secret: &str, signature_header: &str) -> Result<(), String> {
    let signature_hex = signature_header
        .strip_prefix("sha256=")
        .ok_or_else(|| "missing sha256= prefix".to_string())?;

    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| format!("invalid HMAC key: {e}"))?;
    mac.update(body);

    let expected =
        hex::decode(signature_hex).map_err(|e| format!("invalid hex in signature: {e}"))?;

    mac.verify_slice(&expected)
        .map_err(|_| "HMAC verification failed".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sign(body: &[u8], secret: &str) -> String {
        let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).unwrap();
        mac.update(body);
        format!("sha256={}", hex::encode(mac.finalize().into_bytes()))
    }

    #[test]
    fn valid_signature_is_accepted() {
        let body = br#"{"action":"opened"}"#;
        let header = sign(body, "topsecret");
        assert!(verify_signature(body, "topsecret", &header).is_ok());
    }

    #[test]
    fn missing_prefix_is_rejected() {
        let body = b"payload";
        let bare = sign(body, "s").trim_start_matches("sha256=").to_string();
        assert!(verify_signature(body, "s", &bare).is_err());
        assert!(verify_signature(body, "s", "").is_err());
    }

    #[test]
    fn malformed_hex_is_rejected() {
        assert!(verify_signature(b"payload", "s", "sha256=zzzz").is_err());
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let body = b"payload";
        let header = sign(body, "right");
        assert!(verify_signature(body, "wrong", &header).is_err());
    }

    #[test]
    fn tampered_body_is_rejected() {
        let header = sign(b"original", "s");
        assert!(verify_signature(b"tampered", "s", &header).is_err());
    }
}
