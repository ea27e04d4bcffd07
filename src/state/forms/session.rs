//! In-memory state of one form-filling session

use super::attachments::{AttachmentError, AttachmentSlotId, AttachmentStaging, StagedFile};
use super::field::{FieldId, FieldValue, FieldValues};
use super::navigator::{Advance, NavigationError, StepNavigator};
use super::schema::{FieldKind, FormSchema};
use super::submission::{SubmissionPayload, SubmitBlocked, SubmitError};
use super::validator::{first_violation, validate_step, FieldErrors};
use crate::state::draft::{DraftError, DraftStore};
use crate::state::{ApplicationRecord, Identity};
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Notifications the surrounding shell can react to
#[derive(Debug, Clone, PartialEq)]
pub enum WizardEvent {
    StepEntered(usize),
    /// The last step validated; the shell should start submission
    ReadyToSubmit,
    SubmitSucceeded(ApplicationRecord),
    SubmitFailed(SubmitFailure),
}

#[derive(Debug, Clone, PartialEq)]
pub enum SubmitFailure {
    /// Field-level rejection; the session moved back to `step`
    Fields { step: usize, general: Vec<String> },
    /// Transport or unexpected server failure
    Retryable(String),
}

/// Outcome of a draft save attempt
#[derive(Debug, Clone, PartialEq)]
pub enum DraftSave {
    Saved(DateTime<Utc>),
    /// Nothing to save
    Skipped,
    /// Persistence failed; the session itself is unaffected
    Failed(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Advanced {
    pub event: WizardEvent,
    pub draft: DraftSave,
}

pub struct WizardSession {
    schema: FormSchema,
    navigator: StepNavigator,
    values: FieldValues,
    attachments: AttachmentStaging,
    errors: FieldErrors,
    attachment_errors: BTreeMap<AttachmentSlotId, String>,
    store: Box<dyn DraftStore>,
    last_saved: Option<DateTime<Utc>>,
    submitting: bool,
}

impl WizardSession {
    pub fn new(schema: FormSchema, store: Box<dyn DraftStore>) -> Self {
        let navigator = StepNavigator::new(schema.total_steps());
        Self {
            schema,
            navigator,
            values: FieldValues::new(),
            attachments: AttachmentStaging::new(),
            errors: FieldErrors::new(),
            attachment_errors: BTreeMap::new(),
            store,
            last_saved: None,
            submitting: false,
        }
    }

    // ── Accessors ──

    pub fn schema(&self) -> &FormSchema {
        &self.schema
    }

    pub fn current_step(&self) -> usize {
        self.navigator.current()
    }

    pub fn total_steps(&self) -> usize {
        self.navigator.total()
    }

    pub fn is_last_step(&self) -> bool {
        self.navigator.is_last()
    }

    pub fn values(&self) -> &FieldValues {
        &self.values
    }

    pub fn value(&self, id: FieldId) -> Option<&FieldValue> {
        self.values.get(id)
    }

    pub fn errors(&self) -> &FieldErrors {
        &self.errors
    }

    pub fn error(&self, id: FieldId) -> Option<&str> {
        self.errors.get(&id).map(String::as_str)
    }

    pub fn attachments(&self) -> &AttachmentStaging {
        &self.attachments
    }

    pub fn attachment_error(&self, slot: AttachmentSlotId) -> Option<&str> {
        self.attachment_errors.get(&slot).map(String::as_str)
    }

    pub fn last_saved(&self) -> Option<DateTime<Utc>> {
        self.last_saved
    }

    pub fn is_submitting(&self) -> bool {
        self.submitting
    }

    // ── Hydration ──

    /// Prefill name and email from the signed-in identity
    pub fn prefill(&mut self, identity: &Identity) {
        if let Some(email) = identity.email.as_deref().filter(|e| !e.is_empty()) {
            self.values.set_text(FieldId::Email, email);
        }
        if let Some(name) = identity.name.as_deref().filter(|n| !n.is_empty()) {
            self.values.set_text(FieldId::FullName, name);
        }
    }

    /// Preselect the scholarship category the user arrived with
    pub fn preselect_type(&mut self, type_id: &str) {
        self.values.set_text(FieldId::ScholarshipTypeId, type_id);
    }

    /// Merge a stored draft over the current values; returns its timestamp
    pub fn restore_draft(&mut self) -> Option<DateTime<Utc>> {
        let draft = self.store.load()?;
        let fields: FieldValues = draft
            .fields
            .iter()
            .filter_map(|(id, value)| {
                let spec = self.schema.field(id)?;
                match spec.kind.coerce(value.clone()) {
                    Some(value) => Some((id, value)),
                    None => {
                        tracing::debug!("Dropping draft value of {} that does not fit", id.name());
                        None
                    }
                }
            })
            .collect();
        self.values.merge(&fields);
        self.last_saved = Some(draft.saved_at);
        tracing::info!("Restored draft with {} field(s)", fields.len());
        Some(draft.saved_at)
    }

    // ── Editing ──

    /// Replace a field's value and revalidate it
    pub fn set_value(&mut self, id: FieldId, value: FieldValue) {
        self.values.set(id, value);
        self.revalidate(id);
    }

    /// Edit a field's value in place and revalidate it
    pub fn edit(&mut self, id: FieldId, f: impl FnOnce(&mut FieldValue)) {
        f(self.values.entry_mut(id));
        self.revalidate(id);
    }

    pub fn toggle(&mut self, id: FieldId) {
        let current = self.values.get(id).is_some_and(FieldValue::as_flag);
        self.set_value(id, FieldValue::Flag(!current));
    }

    /// Single-field validation, run on every change
    fn revalidate(&mut self, id: FieldId) {
        let mut targets = vec![id];
        targets.extend(
            self.schema
                .dependents_of(id)
                .into_iter()
                .filter(|dep| self.values.get(*dep).is_some_and(|v| !v.is_empty())),
        );
        for target in targets {
            let Some(spec) = self.schema.field(target) else {
                continue;
            };
            match first_violation(spec, &self.values) {
                Some(message) => self.errors.insert(target, message),
                None => self.errors.remove(&target),
            };
        }
    }

    pub fn stage_attachment(
        &mut self,
        slot: AttachmentSlotId,
        path: impl Into<PathBuf>,
    ) -> Result<&StagedFile, AttachmentError> {
        let Some(declared) = self.schema.slots().iter().find(|s| s.id == slot) else {
            return Err(AttachmentError::UndeclaredSlot(slot));
        };
        match self.attachments.stage(declared, path) {
            Ok(staged) => {
                self.attachment_errors.remove(&slot);
                Ok(staged)
            }
            Err(e) => {
                self.attachment_errors.insert(slot, e.to_string());
                Err(e)
            }
        }
    }

    pub fn remove_attachment(&mut self, slot: AttachmentSlotId) -> Option<StagedFile> {
        self.attachments.remove(slot)
    }

    // ── Navigation ──

    /// Validate the current step and move forward, saving a draft on success
    pub fn advance(&mut self) -> Result<Advanced, FieldErrors> {
        let step = self.navigator.current();
        match self.navigator.advance(&self.schema, &self.values) {
            Ok(outcome) => {
                self.clear_step_errors(step);
                let draft = self.save_draft();
                let event = match outcome {
                    Advance::Entered(index) => {
                        tracing::debug!("Entered step {index}");
                        WizardEvent::StepEntered(index)
                    }
                    Advance::Completed => WizardEvent::ReadyToSubmit,
                };
                Ok(Advanced { event, draft })
            }
            Err(errors) => {
                self.clear_step_errors(step);
                self.errors.extend(errors.clone());
                Err(errors)
            }
        }
    }

    pub fn retreat(&mut self) -> Option<WizardEvent> {
        self.navigator
            .retreat()
            .then(|| WizardEvent::StepEntered(self.navigator.current()))
    }

    pub fn jump_to(&mut self, index: usize) -> Result<WizardEvent, NavigationError> {
        self.navigator.jump_to(index)?;
        Ok(WizardEvent::StepEntered(index))
    }

    fn clear_step_errors(&mut self, step: usize) {
        if let Some(step) = self.schema.step(step) {
            for id in step.field_ids() {
                self.errors.remove(&id);
            }
        }
    }

    // ── Drafts ──

    /// Persist the current answers; attachments are never included
    pub fn save_draft(&mut self) -> DraftSave {
        let schema = &self.schema;
        let fields = self.values.restricted_to(|id| schema.contains(id));
        match self.store.save(&fields) {
            Ok(draft) => {
                self.last_saved = Some(draft.saved_at);
                DraftSave::Saved(draft.saved_at)
            }
            Err(e) => {
                tracing::warn!("Failed to save draft: {e}");
                DraftSave::Failed(e.to_string())
            }
        }
    }

    /// Timer-driven save; skipped while the form is still empty
    pub fn autosave(&mut self) -> DraftSave {
        if self.values.is_empty() {
            return DraftSave::Skipped;
        }
        self.save_draft()
    }

    /// User-initiated draft deletion
    pub fn delete_draft(&mut self) -> Result<(), DraftError> {
        self.store.clear()?;
        self.last_saved = None;
        Ok(())
    }

    // ── Submission ──

    /// Validate everything and claim the single in-flight slot
    pub fn begin_submit(&mut self) -> Result<SubmissionPayload, SubmitBlocked> {
        if self.submitting {
            return Err(SubmitBlocked::InFlight);
        }

        for (index, step) in self.schema.steps().iter().enumerate() {
            let errors = validate_step(step, &self.values);
            if !errors.is_empty() {
                self.errors.extend(errors);
                self.navigator.rewind_to(index);
                return Err(SubmitBlocked::Invalid { step: index });
            }
        }

        let missing: Vec<_> = self
            .attachments
            .missing_required(self.schema.slots())
            .map(|slot| (slot.id, slot.step))
            .collect();
        if let Some(step) = missing.iter().map(|(_, step)| *step).min() {
            for (slot, _) in &missing {
                self.attachment_errors
                    .insert(*slot, format!("{} is required", slot.label()));
            }
            self.navigator.rewind_to(step);
            return Err(SubmitBlocked::MissingAttachments {
                step,
                slots: missing.into_iter().map(|(slot, _)| slot).collect(),
            });
        }

        self.submitting = true;
        Ok(self.payload())
    }

    fn payload(&self) -> SubmissionPayload {
        let fields = self
            .schema
            .steps()
            .iter()
            .flat_map(|step| step.fields.iter())
            .map(|spec| {
                let value = match (self.values.get(spec.id), spec.kind) {
                    (Some(value), _) => value.to_form_value(),
                    (None, FieldKind::Checkbox) => false.to_string(),
                    (None, _) => String::new(),
                };
                (spec.id.name(), value.trim().to_string())
            })
            .collect();
        let attachments = self
            .attachments
            .iter()
            .map(|(slot, file)| (slot, file.clone()))
            .collect();
        SubmissionPayload {
            fields,
            attachments,
        }
    }

    /// Release the in-flight slot and apply the backend's answer
    pub fn finish_submit(
        &mut self,
        result: Result<ApplicationRecord, SubmitError>,
    ) -> WizardEvent {
        self.submitting = false;
        match result {
            Ok(record) => {
                if let Err(e) = self.store.clear() {
                    tracing::warn!("Submitted, but failed to delete draft: {e}");
                }
                self.last_saved = None;
                tracing::info!("Application {} submitted", record.id);
                WizardEvent::SubmitSucceeded(record)
            }
            Err(SubmitError::Fields(server_errors)) => {
                let mut general = Vec::new();
                let mut first_step: Option<usize> = None;
                for (name, messages) in server_errors {
                    let message = messages.join(" ");
                    if let Some(id) = FieldId::from_name(&name) {
                        if let Some(step) = self.schema.step_of(id) {
                            first_step = Some(first_step.map_or(step, |s| s.min(step)));
                        }
                        self.errors.insert(id, message);
                    } else if let Some(slot) = AttachmentSlotId::from_name(&name) {
                        let declared = self.schema.slots().iter().find(|s| s.id == slot);
                        if let Some(step) = declared.map(|s| s.step) {
                            first_step = Some(first_step.map_or(step, |s| s.min(step)));
                        }
                        self.attachment_errors.insert(slot, message);
                    } else {
                        general.push(format!("{name}: {message}"));
                    }
                }
                let step = first_step.unwrap_or(self.navigator.current());
                self.navigator.rewind_to(step);
                tracing::warn!("Submission rejected; returning to step {step}");
                WizardEvent::SubmitFailed(SubmitFailure::Fields { step, general })
            }
            Err(SubmitError::Transport(message)) => {
                tracing::warn!("Submission failed: {message}");
                WizardEvent::SubmitFailed(SubmitFailure::Retryable(message))
            }
        }
    }
}
