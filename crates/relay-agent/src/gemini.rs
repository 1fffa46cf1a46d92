//! Google Gemini (Generative Language API) provider with API-key auth.
//!
//! Sends `POST {base_url}/v1beta/models/{model}:generateContent` with the
//! persona as `systemInstruction` and the prior turns plus the new message as
//! `contents`.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, warn};

use relay_core::Role;

use crate::provider::{Candidate, ChatRequest, ChatResponse, LlmProvider, Part, ProviderError};

pub struct GeminiProvider {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    timeout: Duration,
}

impl GeminiProvider {
    pub fn new(api_key: String, base_url: Option<String>, timeout: Duration) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key,
            base_url: base_url
                .unwrap_or_else(|| "https://generativelanguage.googleapis.com".to_string())
                .trim_end_matches('/')
                .to_string(),
            timeout,
        }
    }

    fn endpoint(&self, model: &str) -> String {
        format!("{}/v1beta/models/{}:generateContent", self.base_url, model)
    }

    /// Build the request body for the generateContent endpoint.
    fn build_body(&self, req: &ChatRequest) -> serde_json::Value {
        let mut contents = Vec::with_capacity(req.history.len() + 1);

        for turn in &req.history {
            let role = match turn.role {
                Role::User => "user",
                Role::Model => "model",
            };
            let parts: Vec<_> = turn
                .parts
                .iter()
                .map(|p| serde_json::json!({ "text": p }))
                .collect();
            contents.push(serde_json::json!({ "role": role, "parts": parts }));
        }

        contents.push(serde_json::json!({
            "role": "user",
            "parts": [{ "text": req.message }]
        }));

        let mut body = serde_json::json!({ "contents": contents });

        if !req.system.is_empty() {
            body["systemInstruction"] = serde_json::json!({
                "parts": [{ "text": req.system }]
            });
        }

        body
    }
}

#[async_trait]
impl LlmProvider for GeminiProvider {
    fn name(&self) -> &str {
        "gemini"
    }

    async fn send(&self, req: &ChatRequest) -> Result<ChatResponse, ProviderError> {
        let url = self.endpoint(&req.model);
        let body = self.build_body(req);

        debug!(
            model = %req.model,
            history_turns = req.history.len(),
            "sending request to Gemini"
        );

        let resp = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .timeout(self.timeout)
            .json(&body)
            .send()
            .await?;

        let status = resp.status().as_u16();
        if status == 429 {
            return Err(ProviderError::RateLimited {
                retry_after_ms: 5000,
            });
        }
        if !resp.status().is_success() {
            let text = resp.text().await.unwrap_or_default();
            warn!(status, body = %text, "Gemini API error");
            return Err(ProviderError::Api {
                status,
                message: text,
            });
        }

        let text = resp.text().await?;
        parse_response(&text, &req.model)
    }
}

/// Decode a generateContent response body.
pub(crate) fn parse_response(body: &str, model: &str) -> Result<ChatResponse, ProviderError> {
    let api_resp: GeminiResponse =
        serde_json::from_str(body).map_err(|e| ProviderError::Parse(e.to_string()))?;

    let candidates = api_resp
        .candidates
        .into_iter()
        .map(|c| Candidate {
            parts: c
                .content
                .map(|content| {
                    content
                        .parts
                        .into_iter()
                        .map(|p| Part { text: p.text })
                        .collect()
                })
                .unwrap_or_default(),
            finish_reason: c.finish_reason,
        })
        .collect();

    Ok(ChatResponse {
        candidates,
        model: api_resp.model_version.unwrap_or_else(|| model.to_string()),
        tokens_in: api_resp
            .usage_metadata
            .as_ref()
            .map(|u| u.prompt_token_count)
            .unwrap_or(0),
        tokens_out: api_resp
            .usage_metadata
            .as_ref()
            .map(|u| u.candidates_token_count)
            .unwrap_or(0),
    })
}

// ── Response types ───────────────────────────────────────────────────────────

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
    usage_metadata: Option<GeminiUsage>,
    model_version: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiCandidate {
    content: Option<GeminiContent>,
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct GeminiContent {
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Deserialize)]
struct GeminiPart {
    text: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiUsage {
    #[serde(default)]
    prompt_token_count: u32,
    #[serde(default)]
    candidates_token_count: u32,
}
