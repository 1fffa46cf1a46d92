//! Inbound webhook normalization for the WaSender message feed.
//!
//! Only `messages.upsert` events carry something to answer. Everything else
//! (other event types, echoes of our own sends, group/system stubs, media
//! without text) is acknowledged and dropped.

use serde::Deserialize;
use serde_json::Value;

pub const MESSAGES_UPSERT: &str = "messages.upsert";

/// Top-level webhook document.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WebhookEvent {
    pub event: Option<String>,
    pub data: Option<EventData>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct EventData {
    /// Kept raw: an empty or null object means "nothing to answer", not a
    /// message with missing fields.
    pub messages: Option<Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InboundMessage {
    #[serde(default)]
    pub key: MessageKey,
    pub message: Option<MessageBody>,
    /// Present (and non-null) on system notifications. Numeric or textual
    /// depending on the upstream library version.
    pub message_stub_type: Option<Value>,
    #[serde(default)]
    pub message_stub_parameters: Option<Vec<Value>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageKey {
    pub remote_jid: Option<String>,
    pub from_me: Option<bool>,
    pub id: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageBody {
    pub conversation: Option<String>,
    pub extended_text_message: Option<ExtendedText>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExtendedText {
    pub text: Option<String>,
}

/// What the relay should do with one webhook event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inbound {
    /// Not a message upsert (or an upsert without a message object).
    Ignored { event: Option<String> },
    /// Echo of a message the bot itself sent.
    SelfSent { id: Option<String> },
    /// System/stub notification.
    System {
        sender: Option<String>,
        stub_type: String,
        params: Vec<String>,
    },
    /// No sender address on an otherwise valid message.
    MissingSender,
    /// A message we have no text for (media, reactions, unknown shapes).
    Unsupported { sender: String },
    /// A text message to answer.
    Text { sender: String, text: String },
}

impl WebhookEvent {
    /// Decode a raw webhook body. Shapes we do not model decode to an error.
    pub fn from_value(value: Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value(value)
    }
}

impl MessageBody {
    /// Plain conversation text first, then extended (quoted/linked) text.
    pub fn text(&self) -> Option<&str> {
        if let Some(ref c) = self.conversation {
            return Some(c.as_str());
        }
        self.extended_text_message
            .as_ref()
            .and_then(|e| e.text.as_deref())
    }
}

/// Decide how to handle an event. Checks run in a fixed order: event type,
/// echo suppression, stub notifications, sender presence, then text.
pub fn classify(event: WebhookEvent) -> Inbound {
    let is_upsert = event.event.as_deref() == Some(MESSAGES_UPSERT);
    let raw = match event.data.and_then(|d| d.messages) {
        Some(m) if is_upsert && is_truthy(&m) => m,
        _ => return Inbound::Ignored { event: event.event },
    };
    let message: InboundMessage = match serde_json::from_value(raw) {
        Ok(m) => m,
        Err(_) => return Inbound::Ignored { event: event.event },
    };

    if message.key.from_me == Some(true) {
        return Inbound::SelfSent { id: message.key.id };
    }

    let sender = message.key.remote_jid.filter(|s| !s.is_empty());

    if let Some(stub) = message.message_stub_type.as_ref().filter(|v| is_truthy(v)) {
        return Inbound::System {
            sender,
            stub_type: value_to_string(stub),
            params: message
                .message_stub_parameters
                .unwrap_or_default()
                .iter()
                .map(value_to_string)
                .collect(),
        };
    }

    let Some(sender) = sender else {
        return Inbound::MissingSender;
    };

    match message.message.as_ref().and_then(|m| m.text()) {
        Some(text) if !text.is_empty() => Inbound::Text {
            sender,
            text: text.to_string(),
        },
        _ => Inbound::Unsupported { sender },
    }
}

fn is_truthy(v: &Value) -> bool {
    match v {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(true),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

fn value_to_string(v: &Value) -> String {
    match v {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse(v: Value) -> Inbound {
        classify(WebhookEvent::from_value(v).unwrap())
    }

    #[test]
    fn conversation_text_is_extracted() {
        let inbound = parse(json!({
            "event": "messages.upsert",
            "data": {"messages": {
                "key": {"remoteJid": "123@s.whatsapp.net", "fromMe": false, "id": "A1"},
                "message": {"conversation": "Hello"}
            }}
        }));
        assert_eq!(
            inbound,
            Inbound::Text {
                sender: "123@s.whatsapp.net".into(),
                text: "Hello".into()
            }
        );
    }

    #[test]
    fn extended_text_is_extracted() {
        let inbound = parse(json!({
            "event": "messages.upsert",
            "data": {"messages": {
                "key": {"remoteJid": "123@s.whatsapp.net"},
                "message": {"extendedTextMessage": {"text": "quoted reply"}}
            }}
        }));
        assert!(matches!(inbound, Inbound::Text { ref text, .. } if text == "quoted reply"));
    }

    #[test]
    fn own_messages_are_suppressed() {
        let inbound = parse(json!({
            "event": "messages.upsert",
            "data": {"messages": {
                "key": {"remoteJid": "123@s.whatsapp.net", "fromMe": true, "id": "X"},
                "message": {"conversation": "echo"}
            }}
        }));
        assert_eq!(inbound, Inbound::SelfSent { id: Some("X".into()) });
    }

    #[test]
    fn stub_notifications_are_system_messages() {
        let inbound = parse(json!({
            "event": "messages.upsert",
            "data": {"messages": {
                "key": {"remoteJid": "123@g.us"},
                "messageStubType": 27,
                "messageStubParameters": ["456@s.whatsapp.net"]
            }}
        }));
        assert_eq!(
            inbound,
            Inbound::System {
                sender: Some("123@g.us".into()),
                stub_type: "27".into(),
                params: vec!["456@s.whatsapp.net".into()],
            }
        );
    }

    #[test]
    fn stub_check_precedes_sender_check() {
        let inbound = parse(json!({
            "event": "messages.upsert",
            "data": {"messages": {"key": {}, "messageStubType": "REVOKE"}}
        }));
        assert!(matches!(inbound, Inbound::System { sender: None, .. }));
    }

    #[test]
    fn empty_message_object_is_ignored() {
        let inbound = parse(json!({"event": "messages.upsert", "data": {"messages": {}}}));
        assert_eq!(
            inbound,
            Inbound::Ignored {
                event: Some(MESSAGES_UPSERT.into())
            }
        );
    }

    #[test]
    fn missing_sender_is_reported() {
        let inbound = parse(json!({
            "event": "messages.upsert",
            "data": {"messages": {"key": {"fromMe": false}, "message": {"conversation": "hi"}}}
        }));
        assert_eq!(inbound, Inbound::MissingSender);
    }

    #[test]
    fn media_without_text_is_unsupported() {
        let inbound = parse(json!({
            "event": "messages.upsert",
            "data": {"messages": {
                "key": {"remoteJid": "123@s.whatsapp.net"},
                "message": {"imageMessage": {"url": "https://example.com/a.jpg"}}
            }}
        }));
        assert_eq!(
            inbound,
            Inbound::Unsupported {
                sender: "123@s.whatsapp.net".into()
            }
        );
    }

    #[test]
    fn other_events_are_ignored() {
        let inbound = parse(json!({"event": "chats.update", "data": {}}));
        assert_eq!(
            inbound,
            Inbound::Ignored {
                event: Some("chats.update".into())
            }
        );
    }

    #[test]
    fn upsert_without_messages_is_ignored() {
        let inbound = parse(json!({"event": "messages.upsert", "data": {}}));
        assert!(matches!(inbound, Inbound::Ignored { .. }));
    }

    #[test]
    fn empty_document_is_ignored() {
        assert_eq!(parse(json!({})), Inbound::Ignored { event: None });
    }
}
