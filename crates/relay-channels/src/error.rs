use thiserror::Error;

/// Errors that can occur within any channel adapter.
#[derive(Debug, Error)]
pub enum ChannelError {
    /// A message could not be delivered to the remote endpoint.
    #[error("Send failed: {0}")]
    SendFailed(String),

    /// The remote endpoint answered with a non-success status.
    #[error("Send rejected ({status}): {body}")]
    Rejected { status: u16, body: String },

    /// The channel has no credentials, or rejected the ones supplied.
    #[error("Authentication failed: {0}")]
    AuthFailed(String),

    /// An operation exceeded its allowed time budget.
    #[error("Operation timed out after {ms}ms")]
    Timeout { ms: u64 },

    /// The message cannot be expressed on this channel.
    #[error("Invalid message: {0}")]
    InvalidMessage(String),
}
