//! File-backed conversation history: one JSON document per user identity.
//!
//! Layout: `<dir>/<identity>.json`, containing an ordered list of
//! `{"role": "user"|"model", "parts": ["..."]}` records. Writes go to a
//! hidden temp file in the same directory and are renamed into place, so a
//! concurrent `load` sees either the old or the new document, never a torn one.

use std::path::{Path, PathBuf};

use relay_core::{Turn, UserIdentity};
use tokio::io::AsyncWriteExt;
use tracing::{debug, error};

use crate::error::HistoryError;

/// Result of reading a persisted history.
#[derive(Debug)]
pub enum LoadOutcome {
    Found(Vec<Turn>),
    NotFound,
    /// The record exists but could not be read or failed validation.
    Corrupt(HistoryError),
}

impl LoadOutcome {
    /// Collapse to the sequence replayed as context. Anything but `Found` is empty.
    pub fn into_turns(self) -> Vec<Turn> {
        match self {
            LoadOutcome::Found(turns) => turns,
            LoadOutcome::NotFound | LoadOutcome::Corrupt(_) => Vec::new(),
        }
    }
}

pub struct HistoryStore {
    dir: PathBuf,
}

impl HistoryStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Create the storage directory if it does not exist yet.
    pub async fn init(&self) -> Result<(), HistoryError> {
        if !self.dir.exists() {
            tokio::fs::create_dir_all(&self.dir).await?;
            debug!(dir = %self.dir.display(), "created history directory");
        }
        Ok(())
    }

    pub fn path_for(&self, identity: &UserIdentity) -> PathBuf {
        self.dir.join(format!("{}.json", identity.as_str()))
    }

    /// Read the history for `identity`.
    pub async fn load(&self, identity: &UserIdentity) -> LoadOutcome {
        let path = self.path_for(identity);
        let content = match tokio::fs::read_to_string(&path).await {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return LoadOutcome::NotFound,
            Err(e) => return LoadOutcome::Corrupt(HistoryError::Io(e)),
        };

        match parse_history(&content) {
            Ok(turns) => LoadOutcome::Found(turns),
            Err(e) => LoadOutcome::Corrupt(e),
        }
    }

    /// Persist the full sequence, replacing whatever was stored before.
    ///
    /// Failures are logged and dropped: losing context is preferable to
    /// failing the exchange that produced it.
    pub async fn save(&self, identity: &UserIdentity, history: &[Turn]) {
        if let Err(e) = self.try_save(identity, history).await {
            error!(
                identity = %identity,
                path = %self.path_for(identity).display(),
                error = %e,
                "failed to save conversation history"
            );
        }
    }

    /// Fallible variant of [`save`](Self::save).
    pub async fn try_save(
        &self,
        identity: &UserIdentity,
        history: &[Turn],
    ) -> Result<(), HistoryError> {
        self.init().await?;
        let path = self.path_for(identity);
        let content = serde_json::to_string_pretty(history)?;

        let tmp_path = self.dir.join(format!(
            ".{}.{}.tmp",
            identity.as_str(),
            uuid::Uuid::new_v4().simple()
        ));

        let write_result = async {
            let mut file = tokio::fs::File::create(&tmp_path).await?;
            file.write_all(content.as_bytes()).await?;
            file.flush().await?;
            file.sync_all().await?;
            drop(file);
            match tokio::fs::rename(&tmp_path, &path).await {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                    tokio::fs::remove_file(&path).await?;
                    tokio::fs::rename(&tmp_path, &path).await?;
                }
                Err(e) => return Err(e),
            }
            Ok::<(), std::io::Error>(())
        }
        .await;

        if let Err(e) = write_result {
            let _ = tokio::fs::remove_file(&tmp_path).await;
            return Err(HistoryError::Io(e));
        }

        debug!(identity = %identity, turns = history.len(), "conversation history saved");
        Ok(())
    }
}

/// Validate and decode a persisted history document.
///
/// Every element must be an object carrying both `role` and `parts`; a single
/// bad element invalidates the whole record.
fn parse_history(content: &str) -> Result<Vec<Turn>, HistoryError> {
    let value: serde_json::Value = serde_json::from_str(content)?;
    let items = value
        .as_array()
        .ok_or_else(|| HistoryError::InvalidFormat("top-level value is not a list".into()))?;

    for (i, item) in items.iter().enumerate() {
        let ok = item
            .as_object()
            .map(|o| o.contains_key("role") && o.contains_key("parts"))
            .unwrap_or(false);
        if !ok {
            return Err(HistoryError::InvalidFormat(format!(
                "element {i} is missing role or parts"
            )));
        }
    }

    Ok(serde_json::from_value(value)?)
}
