use serde::{Deserialize, Serialize};

/// Kind of media attached to an outbound message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaKind {
    Image,
    Video,
    Audio,
    Document,
}

impl std::fmt::Display for MediaKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Image => write!(f, "image"),
            Self::Video => write!(f, "video"),
            Self::Audio => write!(f, "audio"),
            Self::Document => write!(f, "document"),
        }
    }
}

/// Media reference carried by an outbound message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Media {
    pub kind: MediaKind,
    pub url: String,
}

/// A message to be delivered to an external channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutboundMessage {
    /// Platform-native recipient address (e.g. `123@s.whatsapp.net`).
    pub recipient: String,

    /// Text body, or caption when `media` is set.
    pub text: Option<String>,

    pub media: Option<Media>,
}

impl OutboundMessage {
    pub fn text(recipient: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            recipient: recipient.into(),
            text: Some(text.into()),
            media: None,
        }
    }

    pub fn media(
        recipient: impl Into<String>,
        kind: MediaKind,
        url: impl Into<String>,
        caption: Option<String>,
    ) -> Self {
        Self {
            recipient: recipient.into(),
            text: caption,
            media: Some(Media {
                kind,
                url: url.into(),
            }),
        }
    }
}
