//! Attachment slots and file staging
//!
//! Staged files are tracked by path and display name only. They are never
//! written to a draft, so a restored draft always needs its files picked again.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AttachmentSlotId {
    Cv,
    Transcripts,
    RecommendationLetter,
    AdditionalDocuments,
}

impl AttachmentSlotId {
    pub const ALL: [AttachmentSlotId; 4] = [
        Self::Cv,
        Self::Transcripts,
        Self::RecommendationLetter,
        Self::AdditionalDocuments,
    ];

    /// Multipart part name
    pub fn name(&self) -> &'static str {
        match self {
            Self::Cv => "cv",
            Self::Transcripts => "transcripts",
            Self::RecommendationLetter => "recommendation_letter",
            Self::AdditionalDocuments => "additional_documents",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|id| id.name() == name)
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Cv => "CV (PDF)",
            Self::Transcripts => "Transcripts (PDF)",
            Self::RecommendationLetter => "Recommendation letter (PDF)",
            Self::AdditionalDocuments => "Additional documents (PDF)",
        }
    }
}

/// A declared place for a file upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttachmentSlot {
    pub id: AttachmentSlotId,
    /// Step on which the slot is shown
    pub step: usize,
    pub required: bool,
    /// Accepted extensions, lowercase without the dot; empty accepts anything
    pub accept: &'static [&'static str],
}

impl AttachmentSlot {
    pub fn new(id: AttachmentSlotId, step: usize, required: bool) -> Self {
        Self {
            id,
            step,
            required,
            accept: &["pdf"],
        }
    }

    fn accepts(&self, path: &Path) -> bool {
        if self.accept.is_empty() {
            return true;
        }
        path.extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| self.accept.iter().any(|a| a.eq_ignore_ascii_case(ext)))
    }
}

/// A selected file, held as an opaque handle
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedFile {
    pub path: PathBuf,
    pub display_name: String,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AttachmentError {
    #[error("{} only accepts {}", .slot.label(), .accept.join(", "))]
    NotAccepted {
        slot: AttachmentSlotId,
        accept: Vec<String>,
    },
    #[error("no file at {}", .0.display())]
    NotAFile(PathBuf),
    #[error("{} is not part of this form", .0.label())]
    UndeclaredSlot(AttachmentSlotId),
}

#[derive(Debug, Clone, Default)]
pub struct AttachmentStaging {
    files: BTreeMap<AttachmentSlotId, StagedFile>,
}

impl AttachmentStaging {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stage `path` into `slot`, replacing any earlier selection.
    ///
    /// Only the slot's accept filter and the file's presence are checked,
    /// the contents are never read.
    pub fn stage(
        &mut self,
        slot: &AttachmentSlot,
        path: impl Into<PathBuf>,
    ) -> Result<&StagedFile, AttachmentError> {
        let path = path.into();
        if !slot.accepts(&path) {
            return Err(AttachmentError::NotAccepted {
                slot: slot.id,
                accept: slot.accept.iter().map(|a| format!(".{a}")).collect(),
            });
        }
        if !path.is_file() {
            return Err(AttachmentError::NotAFile(path));
        }
        let display_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        self.files.insert(slot.id, StagedFile { path, display_name });
        Ok(&self.files[&slot.id])
    }

    pub fn remove(&mut self, slot: AttachmentSlotId) -> Option<StagedFile> {
        self.files.remove(&slot)
    }

    pub fn get(&self, slot: AttachmentSlotId) -> Option<&StagedFile> {
        self.files.get(&slot)
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (AttachmentSlotId, &StagedFile)> {
        self.files.iter().map(|(id, file)| (*id, file))
    }

    /// Required slots that have nothing staged
    pub fn missing_required<'a>(
        &'a self,
        slots: &'a [AttachmentSlot],
    ) -> impl Iterator<Item = &'a AttachmentSlot> + 'a {
        slots
            .iter()
            .filter(move |slot| slot.required && !self.files.contains_key(&slot.id))
    }
}
