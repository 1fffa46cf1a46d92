//! Relay pipeline: one inbound text message in, one paced reply out.
//!
//! The webhook handler only classifies the event and calls
//! [`RelayPipeline::handle_text`]. History, generation, segmentation,
//! delivery and persistence all happen here.

pub mod apology;
pub mod process;

pub use apology::reply_text;
pub use process::{ExchangeSummary, RelayPipeline};
