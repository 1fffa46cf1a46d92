pub mod gemini;
pub mod generator;
pub mod persona;
pub mod pipeline;
pub mod provider;

pub use generator::{GenerationOutcome, Malformed, ReplyGenerator};
pub use persona::Persona;
pub use pipeline::{ExchangeSummary, RelayPipeline};
