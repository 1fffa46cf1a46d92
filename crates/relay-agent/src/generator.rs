//! Reply generation: one provider call per inbound message.
//!
//! The generator never fails: every problem is reported as a
//! [`GenerationOutcome`] variant and the caller decides what the user sees.

use std::sync::Arc;
use std::time::Instant;

use tracing::{error, info};

use relay_core::Turn;

use crate::persona::Persona;
use crate::provider::{ChatRequest, LlmProvider, ProviderError};

/// Longest message prefix written to the log.
const LOG_PREVIEW_CHARS: usize = 200;

#[derive(Debug)]
pub enum GenerationOutcome {
    /// Trimmed reply text. May be empty if the model produced only whitespace.
    Reply(String),
    /// No API key configured; no call was attempted.
    CredentialMissing,
    /// The provider call failed (network, HTTP status, rate limit).
    TransportError(ProviderError),
    /// The provider answered but no reply text could be extracted.
    MalformedResponse(Malformed),
}

/// Why no reply text could be extracted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Malformed {
    /// No candidates at all (blocked prompt, empty body).
    NoCandidates,
    /// A first candidate exists but carries no text part.
    NoTextPart,
}

pub struct ReplyGenerator {
    provider: Option<Box<dyn LlmProvider>>,
    persona: Arc<Persona>,
    model: String,
}

impl ReplyGenerator {
    /// `provider` is `None` when no generation credential is configured.
    pub fn new(
        provider: Option<Box<dyn LlmProvider>>,
        persona: Arc<Persona>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            provider,
            persona,
            model: model.into(),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.provider.is_some()
    }

    pub fn persona(&self) -> &Persona {
        &self.persona
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Produce the next reply given the prior turns (oldest first).
    pub async fn generate(&self, message: &str, history: &[Turn]) -> GenerationOutcome {
        let Some(provider) = self.provider.as_deref() else {
            error!("generation API key is not configured");
            return GenerationOutcome::CredentialMissing;
        };

        let req = ChatRequest {
            model: self.model.clone(),
            system: self.persona.system_instruction(),
            history: history.to_vec(),
            message: message.to_string(),
        };

        let preview: String = message.chars().take(LOG_PREVIEW_CHARS).collect();
        info!(
            model = %req.model,
            provider = provider.name(),
            history_turns = history.len(),
            prompt = %preview,
            "sending prompt with persona"
        );

        let started = Instant::now();
        let resp = match provider.send(&req).await {
            Ok(r) => r,
            Err(e) => {
                error!(
                    provider = provider.name(),
                    model = %req.model,
                    error = %e,
                    details = ?e,
                    "generation request failed"
                );
                return GenerationOutcome::TransportError(e);
            }
        };

        info!(
            model = %resp.model,
            tokens_in = resp.tokens_in,
            tokens_out = resp.tokens_out,
            latency_ms = started.elapsed().as_millis() as u64,
            "generation complete"
        );

        if let Some(text) = resp.text().filter(|t| !t.is_empty()) {
            return GenerationOutcome::Reply(text.trim().to_string());
        }

        if resp.candidates.is_empty() {
            error!(response = ?resp, "provider returned no candidates");
            return GenerationOutcome::MalformedResponse(Malformed::NoCandidates);
        }

        match resp.first_part_text() {
            Some(text) => GenerationOutcome::Reply(text.trim().to_string()),
            None => {
                error!(response = ?resp, "first candidate has no text part");
                GenerationOutcome::MalformedResponse(Malformed::NoTextPart)
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::provider::{Candidate, ChatResponse, Part};
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Provider double: returns queued results and records every request.
    pub(crate) struct ScriptedProvider {
        pub requests: Mutex<Vec<ChatRequest>>,
        reply: Box<dyn Fn() -> Result<ChatResponse, ProviderError> + Send + Sync>,
    }

    impl ScriptedProvider {
        pub(crate) fn new(
            reply: impl Fn() -> Result<ChatResponse, ProviderError> + Send + Sync + 'static,
        ) -> Self {
            Self {
                requests: Mutex::new(Vec::new()),
                reply: Box::new(reply),
            }
        }

        pub(crate) fn text(text: &str) -> Self {
            let text = text.to_string();
            Self::new(move || Ok(text_response(&[Some(&text)])))
        }
    }

    #[async_trait]
    impl LlmProvider for ScriptedProvider {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn send(&self, req: &ChatRequest) -> Result<ChatResponse, ProviderError> {
            self.requests.lock().unwrap().push(req.clone());
            (self.reply)()
        }
    }

    /// Wrapper so a test can keep a handle on the provider it hands over.
    pub(crate) struct Shared(pub Arc<ScriptedProvider>);

    #[async_trait]
    impl LlmProvider for Shared {
        fn name(&self) -> &str {
            self.0.name()
        }

        async fn send(&self, req: &ChatRequest) -> Result<ChatResponse, ProviderError> {
            self.0.send(req).await
        }
    }

    pub(crate) fn text_response(parts: &[Option<&str>]) -> ChatResponse {
        ChatResponse {
            candidates: vec![Candidate {
                parts: parts
                    .iter()
                    .map(|t| Part {
                        text: t.map(String::from),
                    })
                    .collect(),
                finish_reason: Some("STOP".into()),
            }],
            model: "test-model".into(),
            tokens_in: 1,
            tokens_out: 1,
        }
    }

    fn generator(provider: ScriptedProvider) -> (ReplyGenerator, Arc<ScriptedProvider>) {
        let shared = Arc::new(provider);
        let gen = ReplyGenerator::new(
            Some(Box::new(Shared(Arc::clone(&shared)))),
            Arc::new(Persona::default()),
            "gemini-2.0-flash",
        );
        (gen, shared)
    }

    #[tokio::test]
    async fn missing_credential_skips_the_call() {
        let gen = ReplyGenerator::new(None, Arc::new(Persona::default()), "m");
        assert!(!gen.is_configured());
        assert!(matches!(
            gen.generate("hi", &[]).await,
            GenerationOutcome::CredentialMissing
        ));
    }

    #[tokio::test]
    async fn reply_is_trimmed() {
        let (gen, _) = generator(ScriptedProvider::text("  Hello there!\n"));
        match gen.generate("hi", &[]).await {
            GenerationOutcome::Reply(text) => assert_eq!(text, "Hello there!"),
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[tokio::test]
    async fn request_carries_persona_and_history() {
        let (gen, provider) = generator(ScriptedProvider::text("ok"));
        let history = vec![Turn::user("a"), Turn::model("b")];
        gen.generate("c", &history).await;

        let reqs = provider.requests.lock().unwrap();
        assert_eq!(reqs.len(), 1);
        assert_eq!(reqs[0].history, history);
        assert_eq!(reqs[0].message, "c");
        assert_eq!(reqs[0].system, Persona::default().system_instruction());
        assert_eq!(reqs[0].model, "gemini-2.0-flash");
    }

    #[tokio::test]
    async fn first_contact_sends_no_history() {
        let (gen, provider) = generator(ScriptedProvider::text("ok"));
        gen.generate("hello", &[]).await;
        assert!(provider.requests.lock().unwrap()[0].history.is_empty());
    }

    #[tokio::test]
    async fn falls_back_to_first_candidate_part() {
        // A non-text part makes the primary text unavailable.
        let (gen, _) = generator(ScriptedProvider::new(|| {
            Ok(text_response(&[Some(" partial "), None]))
        }));
        match gen.generate("hi", &[]).await {
            GenerationOutcome::Reply(text) => assert_eq!(text, "partial"),
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[tokio::test]
    async fn candidate_without_text_is_malformed() {
        let (gen, _) = generator(ScriptedProvider::new(|| Ok(text_response(&[None]))));
        assert!(matches!(
            gen.generate("hi", &[]).await,
            GenerationOutcome::MalformedResponse(Malformed::NoTextPart)
        ));
    }

    #[tokio::test]
    async fn no_candidates_is_malformed() {
        let (gen, _) = generator(ScriptedProvider::new(|| Ok(ChatResponse::default())));
        assert!(matches!(
            gen.generate("hi", &[]).await,
            GenerationOutcome::MalformedResponse(Malformed::NoCandidates)
        ));
    }

    #[tokio::test]
    async fn provider_error_is_transport_error() {
        let (gen, _) = generator(ScriptedProvider::new(|| {
            Err(ProviderError::Api {
                status: 503,
                message: "overloaded".into(),
            })
        }));
        assert!(matches!(
            gen.generate("hi", &[]).await,
            GenerationOutcome::TransportError(ProviderError::Api { status: 503, .. })
        ));
    }
}
