use crate::generator::{GenerationOutcome, Malformed};

pub const CREDENTIAL_MISSING: &str =
    "Sorry, I'm having trouble connecting to my brain right now (API key issue).";
pub const MALFORMED_RESPONSE: &str =
    "I received an unusual response structure from Gemini. Please try again.";
pub const EMPTY_RESPONSE: &str =
    "I received an empty or unexpected response from Gemini. Please try again.";
pub const TRANSPORT_ERROR: &str =
    "I'm having trouble processing that request with my AI brain. Please try again later.";

/// Text delivered to the user for a generation outcome. Apologies are sent
/// and recorded exactly like a real reply.
pub fn reply_text(outcome: GenerationOutcome) -> String {
    match outcome {
        GenerationOutcome::Reply(text) => text,
        GenerationOutcome::CredentialMissing => CREDENTIAL_MISSING.to_string(),
        GenerationOutcome::MalformedResponse(Malformed::NoTextPart) => MALFORMED_RESPONSE.to_string(),
        GenerationOutcome::MalformedResponse(Malformed::NoCandidates) => EMPTY_RESPONSE.to_string(),
        GenerationOutcome::TransportError(_) => TRANSPORT_ERROR.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::ProviderError;

    #[test]
    fn reply_passes_through() {
        assert_eq!(reply_text(GenerationOutcome::Reply("hi".into())), "hi");
    }

    #[test]
    fn failures_map_to_fixed_apologies() {
        assert_eq!(
            reply_text(GenerationOutcome::CredentialMissing),
            CREDENTIAL_MISSING
        );
        assert_eq!(
            reply_text(GenerationOutcome::MalformedResponse(Malformed::NoTextPart)),
            MALFORMED_RESPONSE
        );
        assert_eq!(
            reply_text(GenerationOutcome::MalformedResponse(Malformed::NoCandidates)),
            EMPTY_RESPONSE
        );
        assert_eq!(
            reply_text(GenerationOutcome::TransportError(ProviderError::Parse(
                "x".into()
            ))),
            TRANSPORT_ERROR
        );
    }
}
