use serde::{Deserialize, Serialize};
use std::fmt;

/// Character substituted for every non-alphanumeric character of a sender
/// address when deriving a [`UserIdentity`].
pub const IDENTITY_PLACEHOLDER: char = '_';

/// Storage-safe key derived from a raw sender address.
///
/// `123@s.whatsapp.net` becomes `123_s_whatsapp_net`. The mapping is pure, so
/// the same address always lands in the same history record across restarts.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserIdentity(String);

impl UserIdentity {
    pub fn from_address(address: &str) -> Self {
        Self(
            address
                .chars()
                .map(|c| {
                    if c.is_alphanumeric() {
                        c
                    } else {
                        IDENTITY_PLACEHOLDER
                    }
                })
                .collect(),
        )
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Author of a conversation turn. Serialized with the generation API's role
/// names so persisted histories can be replayed verbatim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Model,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::User => write!(f, "user"),
            Self::Model => write!(f, "model"),
        }
    }
}

/// One entry of a conversation history: `{"role": "user", "parts": ["Hello"]}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    pub parts: Vec<String>,
}

impl Turn {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            parts: vec![text.into()],
        }
    }

    pub fn model(text: impl Into<String>) -> Self {
        Self {
            role: Role::Model,
            parts: vec![text.into()],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_replaces_non_alphanumerics() {
        let id = UserIdentity::from_address("123@s.whatsapp.net");
        assert_eq!(id.as_str(), "123_s_whatsapp_net");
    }

    #[test]
    fn identity_is_deterministic() {
        let a = UserIdentity::from_address("+44 7700-900123@c.us");
        let b = UserIdentity::from_address("+44 7700-900123@c.us");
        assert_eq!(a, b);
    }

    #[test]
    fn identity_only_contains_safe_characters() {
        let id = UserIdentity::from_address("../../etc/passwd\0@x y");
        assert!(id
            .as_str()
            .chars()
            .all(|c| c.is_alphanumeric() || c == IDENTITY_PLACEHOLDER));
        assert!(!id.as_str().contains('/'));
    }

    #[test]
    fn turn_serializes_with_generation_role_names() {
        let json = serde_json::to_string(&Turn::model("hi")).unwrap();
        assert_eq!(json, r#"{"role":"model","parts":["hi"]}"#);
    }

    #[test]
    fn turn_rejects_unknown_role() {
        let res: Result<Turn, _> = serde_json::from_str(r#"{"role":"system","parts":["x"]}"#);
        assert!(res.is_err());
    }
}
