//! Form domain layer
//!
//! This module provides the multi-step application wizard:
//! - `field`: closed field identifiers and their values
//! - `schema`: steps, constraints and attachment slots
//! - `validator`: per-field and per-step validation
//! - `navigator`: forward-gated step state machine
//! - `attachments`: file staging for upload slots
//! - `session`: one form-filling session tying the above to a draft store

mod attachments;
mod field;
mod navigator;
mod schema;
mod session;
mod submission;
mod validator;

pub use attachments::{AttachmentSlotId, StagedFile};
pub use field::{FieldId, FieldValue, FieldValues};
pub use schema::{ChoiceSource, FieldKind, FormSchema};
pub use session::{DraftSave, SubmitFailure, WizardEvent, WizardSession};
pub use submission::{ServerFieldErrors, SubmissionPayload, SubmitBlocked, SubmitError};
