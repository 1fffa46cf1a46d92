//! Sequential chunk delivery with human-like pacing.
//!
//! Chunks go out strictly in order. A randomized pause between consecutive
//! chunks keeps bursts under the transport's spam heuristics; there is no
//! pause after the last chunk. The first failed send stops the rest.

use std::time::Duration;

use rand::Rng;
use tracing::{debug, error};

use crate::{channel::Channel, error::ChannelError, types::OutboundMessage};

/// Uniformly random pause between consecutive chunks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pacing {
    min: Duration,
    max: Duration,
}

impl Pacing {
    pub fn new(min: Duration, max: Duration) -> Self {
        if min <= max {
            Self { min, max }
        } else {
            Self { min: max, max: min }
        }
    }

    pub fn from_millis(min_ms: u64, max_ms: u64) -> Self {
        Self::new(Duration::from_millis(min_ms), Duration::from_millis(max_ms))
    }

    /// No pause at all (tests, local tooling).
    pub fn none() -> Self {
        Self::new(Duration::ZERO, Duration::ZERO)
    }

    pub fn next_delay(&self) -> Duration {
        let min = self.min.as_millis() as u64;
        let max = self.max.as_millis() as u64;
        Duration::from_millis(rand::thread_rng().gen_range(min..=max))
    }
}

impl Default for Pacing {
    fn default() -> Self {
        Self::from_millis(550, 1500)
    }
}

/// What happened to one reply's chunks.
#[derive(Debug)]
pub struct DeliveryReport {
    pub total: usize,
    pub delivered: usize,
    /// The send error that stopped delivery, if any.
    pub error: Option<ChannelError>,
}

impl DeliveryReport {
    pub fn is_complete(&self) -> bool {
        self.error.is_none() && self.delivered == self.total
    }
}

/// Send `chunks` to `recipient` one after another.
///
/// The pause is a `tokio::time::sleep`, so other exchanges keep running
/// while this one waits.
pub async fn send_chunks(
    channel: &dyn Channel,
    recipient: &str,
    chunks: &[String],
    pacing: Pacing,
) -> DeliveryReport {
    let total = chunks.len();
    for (i, chunk) in chunks.iter().enumerate() {
        let msg = OutboundMessage::text(recipient, chunk.as_str());
        if let Err(e) = channel.send(&msg).await {
            error!(
                channel = channel.name(),
                recipient,
                chunk_index = i,
                total,
                error = %e,
                "failed to send message chunk; dropping the rest of this reply"
            );
            return DeliveryReport {
                total,
                delivered: i,
                error: Some(e),
            };
        }

        if i + 1 < total {
            let delay = pacing.next_delay();
            debug!(chunk_index = i, delay_ms = delay.as_millis() as u64, "pausing before next chunk");
            tokio::time::sleep(delay).await;
        }
    }

    DeliveryReport {
        total,
        delivered: total,
        error: None,
    }
}
