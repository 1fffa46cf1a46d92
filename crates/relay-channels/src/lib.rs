pub mod channel;
pub mod error;
pub mod event;
pub mod segment;
pub mod send;
pub mod types;
pub mod wasender;

pub use channel::Channel;
pub use error::ChannelError;
pub use event::{classify, Inbound, WebhookEvent};
pub use segment::{split_message, Segmenter};
pub use send::{send_chunks, DeliveryReport, Pacing};
pub use types::{MediaKind, OutboundMessage};
pub use wasender::WaSenderChannel;
