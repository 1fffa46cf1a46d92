//! Webhook ingress endpoint: POST {gateway.webhook_path}.
//!
//! Accepts WaSender event documents. Only text messages trigger an exchange;
//! every other recognized shape is acknowledged so the provider does not
//! retry it.

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    Json,
};
use hmac::{Hmac, Mac};
use serde_json::{json, Value};
use sha2::Sha256;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::app::AppState;
use relay_channels::{classify, Inbound, WebhookEvent};
use relay_core::config::{WebhookAuthMode, WebhookConfig};

type HmacSha256 = Hmac<Sha256>;

const SIGNATURE_HEADER: &str = "x-webhook-signature";

type Ack = (StatusCode, Json<Value>);

// ── Public handler ────────────────────────────────────────────────────────────

/// POST {webhook_path}
///
/// 200 for every handled case, 400 for an undecodable body or a message
/// without a sender, 401 on auth failure, 500 if the exchange task dies.
pub async fn webhook_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Ack {
    debug!(bytes = body.len(), "webhook arrived");

    if let Err(reason) = verify(&state.config.webhook, &headers, &body) {
        warn!(reason = %reason, "webhook authentication failed");
        return error_ack(StatusCode::UNAUTHORIZED, "Unauthorized");
    }

    let payload: Value = match serde_json::from_slice(&body) {
        Ok(v) => v,
        Err(e) => {
            warn!(error = %e, "invalid JSON in webhook body");
            return error_ack(StatusCode::BAD_REQUEST, "Invalid JSON body");
        }
    };

    let event = match WebhookEvent::from_value(payload) {
        Ok(ev) => ev,
        Err(e) => {
            warn!(error = %e, "unrecognized webhook shape, acknowledging");
            return success(None);
        }
    };

    match classify(event) {
        Inbound::Ignored { event } => {
            debug!(event = ?event, "ignoring non-message event");
            success(None)
        }
        Inbound::SelfSent { id } => {
            info!(message_id = ?id, "ignoring self-sent message");
            success(Some("Self-sent message ignored"))
        }
        Inbound::System {
            sender,
            stub_type,
            params,
        } => {
            info!(
                sender = ?sender,
                stub_type = %stub_type,
                params = ?params,
                "received system message"
            );
            success(Some("System message processed"))
        }
        Inbound::MissingSender => {
            warn!("incoming message without sender");
            error_ack(StatusCode::BAD_REQUEST, "Incomplete sender data")
        }
        Inbound::Unsupported { sender } => {
            info!(sender = %sender, "message without text content, not answering");
            success(None)
        }
        Inbound::Text { sender, text } => {
            info!(sender = %sender, chars = text.chars().count(), "text message received");
            // Spawned so a panic in the exchange surfaces as a JoinError here.
            let pipeline = Arc::clone(&state.pipeline);
            let task = tokio::spawn(async move { pipeline.handle_text(&sender, &text).await });
            match task.await {
                Ok(summary) => {
                    debug!(
                        identity = %summary.identity,
                        delivered = summary.chunks_delivered,
                        total = summary.chunks_total,
                        "exchange finished"
                    );
                    success(None)
                }
                Err(e) => {
                    error!(error = %e, "exchange task failed");
                    error_ack(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
                }
            }
        }
    }
}

// ── Auth helpers ──────────────────────────────────────────────────────────────

fn verify(cfg: &WebhookConfig, headers: &HeaderMap, body: &Bytes) -> Result<(), String> {
    match cfg.auth_mode {
        WebhookAuthMode::None => Ok(()),
        WebhookAuthMode::Signature => verify_signature(headers, cfg.secret.as_deref()),
        WebhookAuthMode::HmacSha256 => verify_hmac_sha256(headers, body, cfg.secret.as_deref()),
    }
}

fn signature_header(headers: &HeaderMap) -> Result<&str, String> {
    headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| "missing X-Webhook-Signature header".to_string())
}

/// Static shared secret echoed in X-Webhook-Signature.
fn verify_signature(headers: &HeaderMap, secret: Option<&str>) -> Result<(), String> {
    let expected = secret.ok_or_else(|| "no webhook secret configured".to_string())?;
    if signature_header(headers)? == expected {
        Ok(())
    } else {
        Err("webhook signature mismatch".to_string())
    }
}

/// Hex HMAC-SHA256 of the raw body in X-Webhook-Signature, `sha256=` prefix optional.
fn verify_hmac_sha256(headers: &HeaderMap, body: &Bytes, secret: Option<&str>) -> Result<(), String> {
    let secret = secret.ok_or_else(|| "no HMAC secret configured".to_string())?;

    let sig_header = signature_header(headers)?;
    let sig_hex = sig_header.strip_prefix("sha256=").unwrap_or(sig_header);

    let expected =
        hex::decode(sig_hex).map_err(|_| "X-Webhook-Signature is not valid hex".to_string())?;

    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|_| "invalid HMAC key length".to_string())?;
    mac.update(body);

    mac.verify_slice(&expected)
        .map_err(|_| "HMAC signature mismatch".to_string())
}

// ── Response helpers ──────────────────────────────────────────────────────────

fn success(message: Option<&str>) -> Ack {
    let body = match message {
        Some(m) => json!({"status": "success", "message": m}),
        None => json!({"status": "success"}),
    };
    (StatusCode::OK, Json(body))
}

fn error_ack(status: StatusCode, message: &str) -> Ack {
    (status, Json(json!({"status": "error", "message": message})))
}
