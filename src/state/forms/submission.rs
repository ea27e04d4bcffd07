//! Final submission payload and its failure modes

use super::attachments::{AttachmentSlotId, StagedFile};
use std::collections::BTreeMap;
use thiserror::Error;

/// Everything sent to the backend on final submit
#[derive(Debug, Clone, PartialEq)]
pub struct SubmissionPayload {
    /// `(wire name, value)` text parts
    pub fields: Vec<(&'static str, String)>,
    pub attachments: Vec<(AttachmentSlotId, StagedFile)>,
}

impl SubmissionPayload {
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, v)| v.as_str())
    }
}

/// Server-side validation messages keyed by wire name
pub type ServerFieldErrors = BTreeMap<String, Vec<String>>;

#[derive(Debug, Error)]
pub enum SubmitError {
    /// The backend rejected specific fields
    #[error("the server rejected {} field(s)", .0.len())]
    Fields(ServerFieldErrors),

    /// Network failure or unexpected server response; safe to retry
    #[error("{0}")]
    Transport(String),
}

/// Why a submission could not start
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitBlocked {
    /// Another submission is still in flight
    InFlight,
    /// A step failed validation; the session moved back to it
    Invalid { step: usize },
    /// Required files for `step` are not staged
    MissingAttachments {
        step: usize,
        slots: Vec<AttachmentSlotId>,
    },
}

impl SubmitBlocked {
    pub fn message(&self) -> String {
        match self {
            Self::InFlight => "A submission is already in progress".to_string(),
            Self::Invalid { step } => {
                format!("Please fix the errors on step {} before submitting", step + 1)
            }
            Self::MissingAttachments { slots, .. } => {
                let names: Vec<&str> = slots.iter().map(|s| s.label()).collect();
                format!("Please attach: {}", names.join(", "))
            }
        }
    }
}
