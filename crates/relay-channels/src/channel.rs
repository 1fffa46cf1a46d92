use async_trait::async_trait;

use crate::{error::ChannelError, types::OutboundMessage};

/// Outbound side of a messaging channel.
///
/// The relay only needs "deliver this one message, tell me if it worked";
/// a failed send stops the remaining chunks of the current reply.
#[async_trait]
pub trait Channel: Send + Sync {
    /// Stable lowercase identifier for this channel (e.g. `"whatsapp"`).
    fn name(&self) -> &str;

    /// Deliver a single outbound message.
    ///
    /// `&self` so one adapter can serve concurrent exchanges for different users.
    async fn send(&self, msg: &OutboundMessage) -> Result<(), ChannelError>;
}
