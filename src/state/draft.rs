//! Local draft persistence
//!
//! One draft per form key, stored as a single JSON document:
//!
//! ```text
//! <root>/<form-key>.json   # { "fields": { ... }, "savedAt": "<RFC 3339>" }
//! ```

use crate::state::forms::{FieldId, FieldValue, FieldValues};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
#[cfg(test)]
use std::sync::Mutex;
use std::{fs, io};

/// Errors that can occur while persisting a draft
#[derive(Debug, thiserror::Error)]
pub enum DraftError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Durable snapshot of the form's answers; attachments are never included
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DraftState {
    pub fields: FieldValues,
    #[serde(rename = "savedAt")]
    pub saved_at: DateTime<Utc>,
}

/// Shape on disk, before unknown field names are dropped
#[derive(Deserialize)]
struct StoredDraft {
    fields: BTreeMap<String, FieldValue>,
    #[serde(rename = "savedAt")]
    saved_at: DateTime<Utc>,
}

impl StoredDraft {
    fn into_state(self) -> DraftState {
        let fields = self
            .fields
            .into_iter()
            .filter_map(|(name, value)| match FieldId::from_name(&name) {
                Some(id) => Some((id, value)),
                None => {
                    tracing::debug!("Dropping unknown draft field {name}");
                    None
                }
            })
            .collect();
        DraftState {
            fields,
            saved_at: self.saved_at,
        }
    }
}

fn decode(raw: &str) -> Option<DraftState> {
    match serde_json::from_str::<StoredDraft>(raw) {
        Ok(stored) => Some(stored.into_state()),
        Err(e) => {
            tracing::warn!("Ignoring corrupt draft: {e}");
            None
        }
    }
}

/// Storage backend for drafts of a single form
pub trait DraftStore: Send {
    /// Overwrite the stored draft with `values`
    fn save(&self, values: &FieldValues) -> Result<DraftState, DraftError>;

    /// The stored draft, or `None` when absent or unreadable
    fn load(&self) -> Option<DraftState>;

    /// Remove the stored draft; succeeds when there is none
    fn clear(&self) -> Result<(), DraftError>;
}

/// Draft store backed by one JSON file
#[derive(Debug, Clone)]
pub struct FileDraftStore {
    path: PathBuf,
}

impl FileDraftStore {
    /// Store drafts for `form_key` under `root`; the directory is created on first save
    pub fn new(root: impl AsRef<Path>, form_key: &str) -> Self {
        Self {
            path: root.as_ref().join(format!("{form_key}.json")),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl DraftStore for FileDraftStore {
    fn save(&self, values: &FieldValues) -> Result<DraftState, DraftError> {
        let draft = DraftState {
            fields: values.clone(),
            saved_at: Utc::now(),
        };
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(&draft)?;
        // Replace atomically: write a sibling temp file, then rename over the draft
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json)?;
        if let Err(e) = fs::rename(&tmp, &self.path) {
            let _ = fs::remove_file(&tmp);
            return Err(e.into());
        }
        Ok(draft)
    }

    fn load(&self) -> Option<DraftState> {
        match fs::read_to_string(&self.path) {
            Ok(raw) => decode(&raw),
            Err(e) if e.kind() == io::ErrorKind::NotFound => None,
            Err(e) => {
                tracing::warn!("Failed to read draft {}: {e}", self.path.display());
                None
            }
        }
    }

    fn clear(&self) -> Result<(), DraftError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// In-memory draft store holding the raw serialized document
#[cfg(test)]
#[derive(Debug, Default)]
pub struct MemoryDraftStore {
    raw: Mutex<Option<String>>,
}

#[cfg(test)]
impl MemoryDraftStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store with a pre-existing raw document
    pub fn with_raw(raw: impl Into<String>) -> Self {
        Self {
            raw: Mutex::new(Some(raw.into())),
        }
    }

    pub fn raw(&self) -> Option<String> {
        self.raw.lock().ok().and_then(|raw| raw.clone())
    }
}

#[cfg(test)]
impl DraftStore for MemoryDraftStore {
    fn save(&self, values: &FieldValues) -> Result<DraftState, DraftError> {
        let draft = DraftState {
            fields: values.clone(),
            saved_at: Utc::now(),
        };
        let json = serde_json::to_string(&draft)?;
        if let Ok(mut raw) = self.raw.lock() {
            *raw = Some(json);
        }
        Ok(draft)
    }

    fn load(&self) -> Option<DraftState> {
        self.raw().as_deref().and_then(decode)
    }

    fn clear(&self) -> Result<(), DraftError> {
        if let Ok(mut raw) = self.raw.lock() {
            *raw = None;
        }
        Ok(())
    }
}
