use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

pub const DEFAULT_PORT: u16 = 5001;
pub const DEFAULT_BIND: &str = "0.0.0.0";
pub const DEFAULT_WEBHOOK_PATH: &str = "/webhook";
pub const DEFAULT_MODEL: &str = "gemini-2.0-flash";
pub const DEFAULT_CONFIG_PATH: &str = "relay.toml";

/// Top-level config (relay.toml + RELAY_* env overrides).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RelayConfig {
    pub gateway: GatewayConfig,
    pub agent: AgentConfig,
    pub history: HistoryConfig,
    pub whatsapp: WhatsAppConfig,
    pub delivery: DeliveryConfig,
    pub webhook: WebhookConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    pub port: u16,
    pub bind: String,
    /// Route the messaging provider posts events to.
    pub webhook_path: String,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            bind: DEFAULT_BIND.to_string(),
            webhook_path: DEFAULT_WEBHOOK_PATH.to_string(),
        }
    }
}

/// Generation settings. Without `api_key` every reply is the credential apology.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    pub model: String,
    pub api_key: Option<String>,
    pub base_url: String,
    pub persona_path: String,
    pub request_timeout_secs: u64,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            api_key: None,
            base_url: "https://generativelanguage.googleapis.com".to_string(),
            persona_path: "persona.json".to_string(),
            request_timeout_secs: 60,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    /// Directory holding one `<identity>.json` file per user.
    pub dir: String,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            dir: "conversations".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WhatsAppConfig {
    pub api_url: String,
    pub api_token: Option<String>,
    pub timeout_secs: u64,
}

impl Default for WhatsAppConfig {
    fn default() -> Self {
        Self {
            api_url: "https://wasenderapi.com/api/send-message".to_string(),
            api_token: None,
            timeout_secs: 20,
        }
    }
}

/// Reply segmentation and pacing between consecutive chunks.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DeliveryConfig {
    pub max_lines: usize,
    pub max_chars_per_line: usize,
    pub min_delay_ms: u64,
    pub max_delay_ms: u64,
}

impl Default for DeliveryConfig {
    fn default() -> Self {
        Self {
            max_lines: 3,
            max_chars_per_line: 100,
            min_delay_ms: 550,
            max_delay_ms: 1500,
        }
    }
}

/// Authentication mode for the inbound webhook.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum WebhookAuthMode {
    /// Accept every request.
    #[default]
    None,
    /// `X-Webhook-Signature` header must equal the configured secret.
    Signature,
    /// `X-Webhook-Signature` carries a hex HMAC-SHA256 of the raw body.
    HmacSha256,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct WebhookConfig {
    pub auth_mode: WebhookAuthMode,
    pub secret: Option<String>,
}

impl RelayConfig {
    /// Load config: defaults ← TOML file ← `RELAY_*` env ← legacy env names.
    ///
    /// Nested keys use a double underscore: `RELAY_AGENT__MODEL=gemini-1.5-pro`.
    /// `GEMINI_API_KEY` and `WASENDER_API_TOKEN` are still honoured.
    pub fn load(config_path: Option<&str>) -> crate::error::Result<Self> {
        let path = config_path.unwrap_or(DEFAULT_CONFIG_PATH);

        Figment::from(Serialized::defaults(RelayConfig::default()))
            .merge(Toml::file(path))
            .merge(Env::prefixed("RELAY_").split("__"))
            .merge(
                Env::raw()
                    .only(&["GEMINI_API_KEY"])
                    .map(|_| "agent.api_key".into()),
            )
            .merge(
                Env::raw()
                    .only(&["WASENDER_API_TOKEN"])
                    .map(|_| "whatsapp.api_token".into()),
            )
            .extract()
            .map_err(|e| crate::error::RelayError::Config(e.to_string()))
    }
}
