//! WaSender HTTP API client: outbound WhatsApp delivery.
//!
//! One POST per message: `{"to": "<number>", "text": "..."}` for text, with
//! `imageUrl` / `videoUrl` / `audioUrl` / `documentUrl` for media. Auth is a
//! bearer token.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::{debug, error, info};

use crate::{
    channel::Channel,
    error::ChannelError,
    types::{MediaKind, OutboundMessage},
};

const WHATSAPP_SUFFIX: &str = "@s.whatsapp.net";

pub struct WaSenderChannel {
    client: reqwest::Client,
    api_url: String,
    api_token: Option<String>,
    timeout: Duration,
}

impl WaSenderChannel {
    pub fn new(api_url: impl Into<String>, api_token: Option<String>, timeout: Duration) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_url: api_url.into(),
            api_token: api_token.filter(|t| !t.is_empty()),
            timeout,
        }
    }

    pub fn has_token(&self) -> bool {
        self.api_token.is_some()
    }
}

/// `123@s.whatsapp.net` → `123`. Other addresses (groups, bare numbers) pass through.
pub fn normalize_recipient(recipient: &str) -> &str {
    if recipient.contains(WHATSAPP_SUFFIX) {
        recipient.split('@').next().unwrap_or(recipient)
    } else {
        recipient
    }
}

/// Build the JSON request body for one outbound message.
pub fn build_payload(msg: &OutboundMessage) -> Result<Value, ChannelError> {
    let mut payload = json!({ "to": normalize_recipient(&msg.recipient) });

    match &msg.media {
        None => {
            let text = msg
                .text
                .as_deref()
                .ok_or_else(|| ChannelError::InvalidMessage("text message without text".into()))?;
            payload["text"] = json!(text);
        }
        Some(media) => {
            if media.url.is_empty() {
                return Err(ChannelError::InvalidMessage(format!(
                    "media URL is required for message type '{}'",
                    media.kind
                )));
            }
            let field = match media.kind {
                MediaKind::Image => "imageUrl",
                MediaKind::Video => "videoUrl",
                MediaKind::Audio => "audioUrl",
                MediaKind::Document => "documentUrl",
            };
            payload[field] = json!(media.url);
            // Audio messages cannot carry a caption.
            if media.kind != MediaKind::Audio {
                if let Some(caption) = msg.text.as_deref().filter(|t| !t.is_empty()) {
                    payload["text"] = json!(caption);
                }
            }
        }
    }

    Ok(payload)
}

#[async_trait]
impl Channel for WaSenderChannel {
    fn name(&self) -> &str {
        "whatsapp"
    }

    async fn send(&self, msg: &OutboundMessage) -> Result<(), ChannelError> {
        let token = self.api_token.as_deref().ok_or_else(|| {
            error!("WaSender API token is not set; cannot send");
            ChannelError::AuthFailed("no WaSender API token configured".into())
        })?;

        let payload = build_payload(msg)?;
        debug!(payload = %payload, "sending WhatsApp message");

        let resp = self
            .client
            .post(&self.api_url)
            .bearer_auth(token)
            .timeout(self.timeout)
            .json(&payload)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ChannelError::Timeout {
                        ms: self.timeout.as_millis() as u64,
                    }
                } else {
                    ChannelError::SendFailed(e.to_string())
                }
            })?;

        let status = resp.status().as_u16();
        if !resp.status().is_success() {
            let body = resp.text().await.unwrap_or_default();
            error!(
                recipient = %msg.recipient,
                status,
                body = %body,
                "WaSender rejected message"
            );
            if status == 422 {
                error!(
                    payload = %payload,
                    "WaSender 422: check the 'to' format and message content/URL in the payload"
                );
            }
            return Err(ChannelError::Rejected { status, body });
        }

        let body = resp.text().await.unwrap_or_default();
        info!(recipient = %msg.recipient, status, response = %body, "message sent");
        Ok(())
    }
}
