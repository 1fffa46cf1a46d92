use std::path::Path;

use serde::Deserialize;
use tracing::{error, info, warn};

pub const DEFAULT_NAME: &str = "Assistant";
pub const DEFAULT_DESCRIPTION: &str = "You are a helpful assistant.";
pub const DEFAULT_BASE_PROMPT: &str = "You are a helpful and concise AI assistant replying in a WhatsApp chat. \
Do not use Markdown formatting. Keep your answers short, friendly, and easy to read. \
If your response is longer than 3 lines, split it into multiple messages using \\n every 3 lines. \
Each \\n means a new WhatsApp message. Avoid long paragraphs or unnecessary explanations.";

/// Fixed persona shaping every reply. Loaded once at startup, read-only after.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Persona {
    pub name: String,
    pub description: String,
    pub base_prompt: String,
}

/// On-disk shape: every field optional.
#[derive(Debug, Default, Deserialize)]
struct PersonaFile {
    name: Option<String>,
    description: Option<String>,
    base_prompt: Option<String>,
}

impl Default for Persona {
    fn default() -> Self {
        Self {
            name: DEFAULT_NAME.to_string(),
            description: DEFAULT_DESCRIPTION.to_string(),
            base_prompt: DEFAULT_BASE_PROMPT.to_string(),
        }
    }
}

impl Persona {
    /// Load a persona JSON file. A missing or malformed file never aborts
    /// startup; absent fields take their defaults.
    pub fn load(path: &Path) -> Self {
        let data = match std::fs::read_to_string(path) {
            Ok(d) => d,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!(path = %path.display(), "persona file not found, using default persona");
                return Self::default();
            }
            Err(e) => {
                error!(path = %path.display(), error = %e, "cannot read persona file, using default persona");
                return Self::default();
            }
        };

        let file: PersonaFile = match serde_json::from_str(&data) {
            Ok(f) => f,
            Err(e) => {
                error!(path = %path.display(), error = %e, "invalid persona JSON, using default persona");
                return Self::default();
            }
        };

        let defaults = Self::default();
        let persona = Self {
            name: file.name.unwrap_or(defaults.name),
            description: file.description.unwrap_or(defaults.description),
            base_prompt: file.base_prompt.unwrap_or(defaults.base_prompt),
        };
        info!(name = %persona.name, "loaded persona");
        persona
    }

    /// System instruction sent with every generation request.
    pub fn system_instruction(&self) -> String {
        format!("{}\n\n{}", self.base_prompt, self.description)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_persona(content: &str) -> tempfile::NamedTempFile {
        let file = tempfile::NamedTempFile::new().expect("tempfile");
        std::fs::write(file.path(), content).expect("write persona");
        file
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let p = Persona::load(Path::new("/nonexistent/persona.json"));
        assert_eq!(p, Persona::default());
    }

    #[test]
    fn malformed_file_falls_back_to_defaults() {
        let f = write_persona("{ name: nope");
        assert_eq!(Persona::load(f.path()), Persona::default());
    }

    #[test]
    fn full_file_overrides_everything() {
        let f = write_persona(
            r#"{"name": "Luna", "description": "You are Luna, a cheerful barista.", "base_prompt": "Reply in one line."}"#,
        );
        let p = Persona::load(f.path());
        assert_eq!(p.name, "Luna");
        assert_eq!(
            p.system_instruction(),
            "Reply in one line.\n\nYou are Luna, a cheerful barista."
        );
    }

    #[test]
    fn partial_file_keeps_default_base_prompt() {
        let f = write_persona(r#"{"description": "You speak like a pirate."}"#);
        let p = Persona::load(f.path());
        assert_eq!(p.name, DEFAULT_NAME);
        assert!(p.system_instruction().starts_with(DEFAULT_BASE_PROMPT));
        assert!(p.system_instruction().ends_with("You speak like a pirate."));
    }
}
