use async_trait::async_trait;

use relay_core::Turn;

/// Request to a text-generation provider.
#[derive(Debug, Clone)]
pub struct ChatRequest {
    pub model: String,
    /// Persona system instruction.
    pub system: String,
    /// Prior turns, oldest first. Empty for a first contact.
    pub history: Vec<Turn>,
    /// The new user message.
    pub message: String,
}

/// One part of a candidate. `text` is `None` for non-text parts
/// (function calls, inline data).
#[derive(Debug, Clone, Default)]
pub struct Part {
    pub text: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct Candidate {
    pub parts: Vec<Part>,
    pub finish_reason: Option<String>,
}

/// Raw provider response, kept close to the wire shape so callers can apply
/// their own extraction fallbacks.
#[derive(Debug, Clone, Default)]
pub struct ChatResponse {
    pub candidates: Vec<Candidate>,
    pub model: String,
    pub tokens_in: u32,
    pub tokens_out: u32,
}

impl ChatResponse {
    /// Concatenated text of the first candidate, only when every part is text.
    pub fn text(&self) -> Option<String> {
        let first = self.candidates.first()?;
        if first.parts.is_empty() {
            return None;
        }
        first
            .parts
            .iter()
            .map(|p| p.text.as_deref())
            .collect::<Option<Vec<_>>>()
            .map(|texts| texts.concat())
    }

    /// Text of the first part of the first candidate.
    pub fn first_part_text(&self) -> Option<&str> {
        self.candidates.first()?.parts.first()?.text.as_deref()
    }
}

/// Common interface for text-generation backends.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Provider name for logging and error messages.
    fn name(&self) -> &str;

    /// Send a non-streaming request and wait for the full response.
    async fn send(&self, req: &ChatRequest) -> Result<ChatResponse, ProviderError>;
}

#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Rate limited, retry after {retry_after_ms}ms")]
    RateLimited { retry_after_ms: u64 },

    #[error("Provider unavailable: {0}")]
    Unavailable(String),
}
