//! Application state and core logic

use crate::api::ApiClientTrait;
use crate::platform::JUMP_MODIFIER;
use crate::state::autosave::AutosaveTask;
use crate::state::forms::{
    AttachmentSlotId, DraftSave, FieldId, FieldKind, FieldValue, SubmissionPayload,
    SubmitBlocked, SubmitFailure, WizardEvent, WizardSession,
};
use crate::state::{AppState, Identity, View};
use anyhow::Result;
use chrono::{DateTime, Local, Utc};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use std::time::Duration;

/// Something on the current step that can take keyboard focus
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Field(FieldId),
    Slot(AttachmentSlotId),
}

/// Main application struct
pub struct App {
    /// Current application state
    pub state: AppState,
    /// The form being filled
    pub session: WizardSession,
    /// Backend client
    api: Box<dyn ApiClientTrait>,
    /// Periodic draft saves; `None` once the session has ended
    autosave: Option<AutosaveTask>,
    /// Validated payload waiting to be sent on the next loop iteration
    pending_submission: Option<SubmissionPayload>,
    /// Whether the app should quit
    quit: bool,
}

/// Local wall-clock rendering of a draft timestamp
pub fn format_saved_at(saved_at: DateTime<Utc>) -> String {
    saved_at
        .with_timezone(&Local)
        .format("%Y-%m-%d %H:%M")
        .to_string()
}

impl App {
    pub fn new(session: WizardSession, api: Box<dyn ApiClientTrait>) -> Self {
        Self {
            state: AppState::default(),
            session,
            api,
            autosave: None,
            pending_submission: None,
            quit: false,
        }
    }

    /// Load lookups and hydrate the form.
    ///
    /// Identity prefill runs first and the preselected type second, so a
    /// restored draft overrides both.
    pub async fn mount(&mut self, identity: &Identity, preselected_type: Option<&str>) {
        match self.api.list_scholarship_types().await {
            Ok(types) => self.state.set_scholarship_types(types),
            Err(e) => {
                tracing::warn!("Failed to load scholarship types: {e}");
                self.push_error(format!("Could not load scholarship types: {e}"));
            }
        }

        self.session.prefill(identity);
        if let Some(type_id) = preselected_type.map(str::trim).filter(|t| !t.is_empty()) {
            self.session.preselect_type(type_id);
        }
        if let Some(saved_at) = self.session.restore_draft() {
            self.state.status_message = Some(format!(
                "Restored your draft from {}",
                format_saved_at(saved_at)
            ));
        }
        tracing::info!("Application form ready");
    }

    /// Start periodic draft saves
    pub fn start_autosave(&mut self, period: Duration) {
        self.autosave = Some(AutosaveTask::spawn(period));
    }

    fn stop_autosave(&mut self) {
        if let Some(task) = self.autosave.take() {
            task.cancel();
        }
    }

    /// Called once per event-loop iteration
    pub fn on_tick(&mut self) {
        let due = self.autosave.as_mut().is_some_and(AutosaveTask::is_due);
        if due && !self.session.is_submitting() {
            let outcome = self.session.autosave();
            self.apply_draft_save(outcome, false);
        }
    }

    /// Check if app should quit
    pub fn should_quit(&self) -> bool {
        self.quit
    }

    pub fn quit(&mut self) {
        self.stop_autosave();
        self.quit = true;
    }

    /// Push an error message to the error queue for display
    pub fn push_error(&mut self, message: impl Into<String>) {
        self.state.push_error(message.into());
    }

    /// Focusable items on the current step: fields, then attachment slots
    pub fn focus_targets(&self) -> Vec<Focus> {
        let step = self.session.current_step();
        let schema = self.session.schema();
        let fields = schema
            .step(step)
            .into_iter()
            .flat_map(|s| s.field_ids())
            .map(Focus::Field);
        let slots = schema.slots_for_step(step).map(|slot| Focus::Slot(slot.id));
        fields.chain(slots).collect()
    }

    pub fn focused(&self) -> Option<Focus> {
        self.focus_targets().get(self.state.active_form_field).copied()
    }

    fn focused_kind(&self) -> Option<(FieldId, FieldKind)> {
        match self.focused()? {
            Focus::Field(id) => self.session.schema().field(id).map(|spec| (id, spec.kind)),
            Focus::Slot(_) => None,
        }
    }

    // ── Key handling ──

    pub fn handle_key(&mut self, key: KeyEvent) -> Result<()> {
        // Handle error dialog dismissal first (modal)
        if self.state.current_error().is_some() {
            if matches!(key.code, KeyCode::Enter | KeyCode::Esc) {
                self.state.dismiss_error();
            }
            return Ok(());
        }

        match self.state.current_view {
            View::Wizard => self.handle_wizard_key(key),
            View::Submitted => self.handle_submitted_key(key),
        }
        Ok(())
    }

    fn handle_submitted_key(&mut self, key: KeyEvent) {
        if matches!(key.code, KeyCode::Enter | KeyCode::Esc | KeyCode::Char('q')) {
            self.quit();
        }
    }

    fn handle_wizard_key(&mut self, key: KeyEvent) {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);

        match key.code {
            KeyCode::Esc => self.quit(),
            KeyCode::Char(c)
                if key.modifiers.contains(JUMP_MODIFIER) && ('1'..='9').contains(&c) =>
            {
                let index = c.to_digit(10).map_or(0, |d| d as usize - 1);
                self.jump(index);
            }
            KeyCode::Char('n') if ctrl => self.next(),
            KeyCode::Char('p') if ctrl => self.previous(),
            KeyCode::Char('s') if ctrl => self.save_draft(),
            KeyCode::Char('d') if ctrl => self.delete_draft(),
            KeyCode::Char('x') if ctrl => self.state.draft_warning = None,
            KeyCode::Tab => self.focus_next(),
            KeyCode::BackTab => self.focus_prev(),
            KeyCode::Left => self.cycle_choice(false),
            KeyCode::Right => self.cycle_choice(true),
            KeyCode::Enter => self.enter(),
            KeyCode::Backspace => self.backspace(),
            KeyCode::Delete => self.remove_focused_attachment(),
            KeyCode::Char(c) if !ctrl => self.input_char(c),
            _ => {}
        }
    }

    fn focus_next(&mut self) {
        let count = self.focus_targets().len();
        if count > 0 {
            self.state.active_form_field = (self.state.active_form_field + 1) % count;
            self.state.attachment_input.clear();
        }
    }

    fn focus_prev(&mut self) {
        let count = self.focus_targets().len();
        if count > 0 {
            self.state.active_form_field = (self.state.active_form_field + count - 1) % count;
            self.state.attachment_input.clear();
        }
    }

    fn input_char(&mut self, c: char) {
        match self.focused() {
            Some(Focus::Slot(_)) => self.state.attachment_input.push(c),
            Some(Focus::Field(_)) => match self.focused_kind() {
                Some((id, FieldKind::Text | FieldKind::Multiline)) => {
                    self.session.edit(id, |value| value.push_char(c));
                }
                Some((id, FieldKind::Checkbox)) if c == ' ' => self.session.toggle(id),
                Some((_, FieldKind::Choice(_))) if c == ' ' => self.cycle_choice(true),
                _ => {}
            },
            None => {}
        }
    }

    fn backspace(&mut self) {
        match self.focused() {
            Some(Focus::Slot(_)) => {
                self.state.attachment_input.pop();
            }
            Some(Focus::Field(_)) => {
                if let Some((id, FieldKind::Text | FieldKind::Multiline)) = self.focused_kind() {
                    self.session.edit(id, FieldValue::pop_char);
                }
            }
            None => {}
        }
    }

    fn enter(&mut self) {
        match self.focused() {
            Some(Focus::Slot(slot)) => self.stage_focused_attachment(slot),
            Some(Focus::Field(_)) => match self.focused_kind() {
                Some((id, FieldKind::Multiline)) => {
                    self.session.edit(id, |value| value.push_char('\n'));
                }
                Some((id, FieldKind::Checkbox)) => self.session.toggle(id),
                _ => self.focus_next(),
            },
            None => {}
        }
    }

    fn cycle_choice(&mut self, forward: bool) {
        let Some((id, FieldKind::Choice(source))) = self.focused_kind() else {
            return;
        };
        let options = self.state.choice_options(source);
        if options.is_empty() {
            return;
        }
        let current = self.session.values().text(id);
        let position = options.iter().position(|(value, _)| value == current);
        let next = match (position, forward) {
            (None, true) => 0,
            (None, false) => options.len() - 1,
            (Some(i), true) => (i + 1) % options.len(),
            (Some(i), false) => (i + options.len() - 1) % options.len(),
        };
        let value = options[next].0.clone();
        self.session.set_value(id, FieldValue::Text(value));
    }

    fn stage_focused_attachment(&mut self, slot: AttachmentSlotId) {
        let path = self.state.attachment_input.trim().to_string();
        if path.is_empty() {
            return;
        }
        match self.session.stage_attachment(slot, &path) {
            Ok(staged) => {
                self.state.status_message = Some(format!("Attached {}", staged.display_name));
                self.state.attachment_input.clear();
            }
            Err(e) => tracing::debug!("Rejected attachment for {}: {e}", slot.name()),
        }
    }

    fn remove_focused_attachment(&mut self) {
        if let Some(Focus::Slot(slot)) = self.focused() {
            if let Some(removed) = self.session.remove_attachment(slot) {
                self.state.status_message = Some(format!("Removed {}", removed.display_name));
            }
        }
    }

    // ── Navigation ──

    /// Advance, or submit when the last step validates
    fn next(&mut self) {
        match self.session.advance() {
            Ok(advanced) => {
                self.apply_draft_save(advanced.draft, false);
                match advanced.event {
                    WizardEvent::ReadyToSubmit => self.submit(),
                    event => self.on_event(event),
                }
            }
            Err(errors) => {
                self.focus_first_error();
                self.state.status_message = Some(format!(
                    "Please correct {} field(s) before continuing",
                    errors.len()
                ));
            }
        }
    }

    fn previous(&mut self) {
        if let Some(event) = self.session.retreat() {
            self.on_event(event);
        }
    }

    fn jump(&mut self, index: usize) {
        match self.session.jump_to(index) {
            Ok(event) => self.on_event(event),
            Err(e) => self.state.status_message = Some(e.to_string()),
        }
    }

    /// Move focus to the first invalid item on the current step
    fn focus_first_error(&mut self) {
        let position = self.focus_targets().iter().position(|target| match target {
            Focus::Field(id) => self.session.error(*id).is_some(),
            Focus::Slot(slot) => self.session.attachment_error(*slot).is_some(),
        });
        self.state.active_form_field = position.unwrap_or(0);
        self.state.attachment_input.clear();
    }

    // ── Drafts ──

    fn save_draft(&mut self) {
        let outcome = self.session.save_draft();
        self.apply_draft_save(outcome, true);
    }

    fn delete_draft(&mut self) {
        match self.session.delete_draft() {
            Ok(()) => {
                self.state.draft_warning = None;
                self.state.status_message = Some("Draft deleted".to_string());
            }
            Err(e) => {
                tracing::warn!("Failed to delete draft: {e}");
                self.state.draft_warning = Some(format!("Draft could not be deleted: {e}"));
            }
        }
    }

    /// Reflect a save attempt; failures never interrupt the user
    fn apply_draft_save(&mut self, outcome: DraftSave, announce: bool) {
        match outcome {
            DraftSave::Saved(saved_at) => {
                self.state.draft_warning = None;
                if announce {
                    self.state.status_message =
                        Some(format!("Draft saved at {}", format_saved_at(saved_at)));
                }
            }
            DraftSave::Skipped => {}
            DraftSave::Failed(message) => {
                self.state.draft_warning = Some(format!("Draft could not be saved: {message}"));
            }
        }
    }

    // ── Submission ──

    /// Validate and queue the submission; it is sent by `send_pending_submission`
    /// so the "Submitting..." state gets drawn first
    fn submit(&mut self) {
        let payload = match self.session.begin_submit() {
            Ok(payload) => payload,
            Err(blocked) => {
                if !matches!(blocked, SubmitBlocked::InFlight) {
                    self.focus_first_error();
                }
                self.state.status_message = Some(blocked.message());
                return;
            }
        };

        self.state.status_message = Some("Submitting...".to_string());
        self.pending_submission = Some(payload);
    }

    pub fn has_pending_submission(&self) -> bool {
        self.pending_submission.is_some()
    }

    /// Send the queued submission and apply the outcome
    pub async fn send_pending_submission(&mut self) {
        let Some(payload) = self.pending_submission.take() else {
            return;
        };
        tracing::info!(
            "Submitting application with {} attachment(s)",
            payload.attachments.len()
        );
        let result = self.api.submit_application(payload).await;
        let event = self.session.finish_submit(result);
        self.on_event(event);
    }

    fn on_event(&mut self, event: WizardEvent) {
        match event {
            WizardEvent::StepEntered(index) => {
                tracing::debug!("Showing step {index}");
                self.state.reset_focus();
            }
            WizardEvent::ReadyToSubmit => {}
            WizardEvent::SubmitSucceeded(record) => {
                self.stop_autosave();
                self.state.status_message = None;
                self.state.draft_warning = None;
                self.state.submitted = Some(record);
                self.state.current_view = View::Submitted;
            }
            WizardEvent::SubmitFailed(SubmitFailure::Fields { step, general }) => {
                self.focus_first_error();
                self.state.status_message = Some(format!(
                    "The server rejected some answers; please review step {}",
                    step + 1
                ));
                for message in general {
                    self.push_error(message);
                }
            }
            WizardEvent::SubmitFailed(SubmitFailure::Retryable(message)) => {
                self.state.status_message = None;
                self.push_error(format!(
                    "Submission failed: {message}. Your answers are kept, please try again."
                ));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{ApiError, MockApiClientTrait};
    use crate::state::draft::{DraftStore, FileDraftStore};
    use crate::state::forms::{FormSchema, ServerFieldErrors, SubmitError};
    use crate::state::{ApplicationRecord, ScholarshipType};
    use pretty_assertions::assert_eq;
    use reqwest::StatusCode;
    use std::fs;
    use tempfile::TempDir;

    fn scholarship_types() -> Vec<ScholarshipType> {
        vec![
            ScholarshipType {
                id: 1,
                name: "Excellence".into(),
                description: String::new(),
                is_active: true,
            },
            ScholarshipType {
                id: 2,
                name: "Mobility".into(),
                description: String::new(),
                is_active: true,
            },
            ScholarshipType {
                id: 3,
                name: "Retired".into(),
                description: String::new(),
                is_active: false,
            },
        ]
    }

    fn record() -> ApplicationRecord {
        ApplicationRecord {
            id: 7,
            status: "pending".into(),
            status_display: Some("Pending".into()),
        }
    }

    fn mock_api() -> MockApiClientTrait {
        let mut api = MockApiClientTrait::new();
        api.expect_list_scholarship_types()
            .returning(|| Ok(scholarship_types()));
        api
    }

    fn app_with(api: MockApiClientTrait, dir: &TempDir) -> App {
        let schema = FormSchema::application().unwrap();
        let store = FileDraftStore::new(dir.path(), schema.key());
        App::new(WizardSession::new(schema, Box::new(store)), Box::new(api))
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn ctrl(c: char) -> KeyEvent {
        KeyEvent::new(KeyCode::Char(c), KeyModifiers::CONTROL)
    }

    fn type_text(app: &mut App, text: &str) {
        for c in text.chars() {
            app.handle_key(key(KeyCode::Char(c))).unwrap();
        }
    }

    fn fill_all(app: &mut App, dir: &TempDir) {
        let answers: &[(FieldId, &str)] = &[
            (FieldId::FullName, "Awa Diop"),
            (FieldId::Email, "awa@example.com"),
            (FieldId::DateOfBirth, "2003-04-12"),
            (FieldId::Gender, "F"),
            (FieldId::PhoneNumber, "+221 77 123 45 67"),
            (FieldId::Address, "Dakar"),
            (FieldId::ScholarshipTypeId, "2"),
            (FieldId::CurrentInstitution, "UCAD"),
            (FieldId::FieldOfStudy, "Physics"),
            (FieldId::CurrentYear, "3"),
            (FieldId::AverageGrade, "15"),
            (FieldId::BacMention, "B"),
            (FieldId::FamilyIncome, "1200000"),
            (FieldId::NumberOfDependents, "4"),
            (
                FieldId::Motivation,
                "I want to study physics abroad and bring that knowledge back home.",
            ),
        ];
        for (id, value) in answers {
            app.session
                .set_value(*id, FieldValue::Text((*value).to_string()));
        }
        for (slot, name) in [
            (AttachmentSlotId::Cv, "cv.pdf"),
            (AttachmentSlotId::Transcripts, "notes.pdf"),
        ] {
            let path = dir.path().join(name);
            fs::write(&path, b"%PDF").unwrap();
            app.session.stage_attachment(slot, path).unwrap();
        }
    }

    fn go_to_last_step(app: &mut App) {
        for _ in 0..3 {
            app.handle_key(ctrl('n')).unwrap();
        }
        assert_eq!(app.session.current_step(), 3);
    }

    mod mounting {
        use super::*;
        use pretty_assertions::assert_eq;

        #[tokio::test]
        async fn test_mount_offers_active_types_and_prefills() {
            let dir = TempDir::new().unwrap();
            let mut app = app_with(mock_api(), &dir);
            let identity = Identity {
                name: Some("Awa Diop".into()),
                email: Some("awa@example.com".into()),
            };
            app.mount(&identity, Some("2")).await;

            assert_eq!(app.state.scholarship_types.len(), 2);
            let values = app.session.values();
            assert_eq!(values.text(FieldId::FullName), "Awa Diop");
            assert_eq!(values.text(FieldId::Email), "awa@example.com");
            assert_eq!(values.text(FieldId::ScholarshipTypeId), "2");
            assert!(app.state.status_message.is_none());
        }

        #[tokio::test]
        async fn test_lookup_failure_is_reported_once() {
            let dir = TempDir::new().unwrap();
            let mut api = MockApiClientTrait::new();
            api.expect_list_scholarship_types().times(1).returning(|| {
                Err(ApiError::Status {
                    status: StatusCode::INTERNAL_SERVER_ERROR,
                    body: "boom".into(),
                })
            });
            let mut app = app_with(api, &dir);
            app.mount(&Identity::default(), None).await;

            assert_eq!(app.state.error_queue.len(), 1);
            assert!(app.state.scholarship_types.is_empty());
            assert_eq!(app.session.current_step(), 0);
        }

        #[tokio::test]
        async fn test_draft_overrides_prefill_and_preselection() {
            let dir = TempDir::new().unwrap();
            let schema = FormSchema::application().unwrap();
            let store = FileDraftStore::new(dir.path(), schema.key());
            let mut saved = crate::state::forms::FieldValues::new();
            saved.set_text(FieldId::FullName, "Draft Name");
            saved.set_text(FieldId::ScholarshipTypeId, "1");
            store.save(&saved).unwrap();

            let mut app = app_with(mock_api(), &dir);
            let identity = Identity {
                name: Some("Session Name".into()),
                email: None,
            };
            app.mount(&identity, Some("2")).await;

            assert_eq!(app.session.values().text(FieldId::FullName), "Draft Name");
            assert_eq!(app.session.values().text(FieldId::ScholarshipTypeId), "1");
            assert!(app
                .state
                .status_message
                .as_deref()
                .is_some_and(|m| m.starts_with("Restored your draft")));
        }
    }

    mod editing {
        use super::*;
        use pretty_assertions::assert_eq;

        #[tokio::test]
        async fn test_typing_updates_focused_field() {
            let dir = TempDir::new().unwrap();
            let mut app = app_with(mock_api(), &dir);
            type_text(&mut app, "Awa");
            app.handle_key(key(KeyCode::Backspace)).unwrap();
            assert_eq!(app.session.values().text(FieldId::FullName), "Aw");
        }

        #[tokio::test]
        async fn test_tab_wraps_around_step() {
            let dir = TempDir::new().unwrap();
            let mut app = app_with(mock_api(), &dir);
            app.handle_key(key(KeyCode::BackTab)).unwrap();
            assert_eq!(app.focused(), Some(Focus::Field(FieldId::Address)));
            app.handle_key(key(KeyCode::Tab)).unwrap();
            assert_eq!(app.focused(), Some(Focus::Field(FieldId::FullName)));
        }

        #[tokio::test]
        async fn test_choice_cycles_through_options() {
            let dir = TempDir::new().unwrap();
            let mut app = app_with(mock_api(), &dir);
            app.state.active_form_field = 3;
            assert_eq!(app.focused(), Some(Focus::Field(FieldId::Gender)));

            app.handle_key(key(KeyCode::Right)).unwrap();
            assert_eq!(app.session.values().text(FieldId::Gender), "M");
            app.handle_key(key(KeyCode::Left)).unwrap();
            assert_eq!(app.session.values().text(FieldId::Gender), "O");
        }

        #[tokio::test]
        async fn test_invalid_email_is_flagged_while_typing() {
            let dir = TempDir::new().unwrap();
            let mut app = app_with(mock_api(), &dir);
            app.handle_key(key(KeyCode::Tab)).unwrap();
            type_text(&mut app, "awa@");
            assert!(app.session.error(FieldId::Email).is_some());
            type_text(&mut app, "example.com");
            assert_eq!(app.session.error(FieldId::Email), None);
        }
    }

    mod navigation {
        use super::*;
        use pretty_assertions::assert_eq;

        #[tokio::test]
        async fn test_next_on_invalid_step_stays_and_focuses_error() {
            let dir = TempDir::new().unwrap();
            let mut app = app_with(mock_api(), &dir);
            app.session
                .set_value(FieldId::FullName, FieldValue::Text("Awa".into()));
            app.handle_key(ctrl('n')).unwrap();
            app.send_pending_submission().await;

            assert_eq!(app.session.current_step(), 0);
            assert_eq!(app.focused(), Some(Focus::Field(FieldId::Email)));
        }

        #[tokio::test]
        async fn test_next_advances_and_saves_draft() {
            let dir = TempDir::new().unwrap();
            let mut app = app_with(mock_api(), &dir);
            app.mount(&Identity::default(), None).await;
            fill_all(&mut app, &dir);
            app.handle_key(ctrl('n')).unwrap();

            assert_eq!(app.session.current_step(), 1);
            assert_eq!(app.state.active_form_field, 0);
            assert!(dir.path().join("application.json").exists());
        }

        #[tokio::test]
        async fn test_jump_back_only() {
            let dir = TempDir::new().unwrap();
            let mut app = app_with(mock_api(), &dir);
            fill_all(&mut app, &dir);
            app.handle_key(ctrl('n')).unwrap();

            let jump = |c| KeyEvent::new(KeyCode::Char(c), JUMP_MODIFIER);
            app.handle_key(jump('3')).unwrap();
            assert_eq!(app.session.current_step(), 1);
            app.handle_key(jump('1')).unwrap();
            assert_eq!(app.session.current_step(), 0);
        }

        #[tokio::test]
        async fn test_previous_keeps_answers() {
            let dir = TempDir::new().unwrap();
            let mut app = app_with(mock_api(), &dir);
            fill_all(&mut app, &dir);
            app.handle_key(ctrl('n')).unwrap();
            app.handle_key(ctrl('p')).unwrap();
            assert_eq!(app.session.current_step(), 0);
            assert_eq!(app.session.values().text(FieldId::FullName), "Awa Diop");
        }
    }

    mod drafts {
        use super::*;
        use pretty_assertions::assert_eq;

        #[tokio::test]
        async fn test_save_and_delete_draft() {
            let dir = TempDir::new().unwrap();
            let mut app = app_with(mock_api(), &dir);
            type_text(&mut app, "Awa");

            app.handle_key(ctrl('s')).unwrap();
            assert!(dir.path().join("application.json").exists());
            assert!(app.session.last_saved().is_some());

            app.handle_key(ctrl('d')).unwrap();
            assert!(!dir.path().join("application.json").exists());
            assert_eq!(app.state.status_message.as_deref(), Some("Draft deleted"));
        }

        #[tokio::test]
        async fn test_save_failure_shows_dismissible_warning() {
            let dir = TempDir::new().unwrap();
            let blocker = dir.path().join("not-a-dir");
            fs::write(&blocker, b"").unwrap();
            let schema = FormSchema::application().unwrap();
            let store = FileDraftStore::new(&blocker, schema.key());
            let mut app = App::new(
                WizardSession::new(schema, Box::new(store)),
                Box::new(mock_api()),
            );

            type_text(&mut app, "Awa");
            app.handle_key(ctrl('s')).unwrap();
            assert!(app.state.draft_warning.is_some());
            assert!(app.state.error_queue.is_empty());

            app.handle_key(ctrl('x')).unwrap();
            assert!(app.state.draft_warning.is_none());
        }

        #[tokio::test(start_paused = true)]
        async fn test_autosave_tick_saves_non_empty_form() {
            let dir = TempDir::new().unwrap();
            let mut app = app_with(mock_api(), &dir);
            app.start_autosave(Duration::from_secs(120));

            tokio::time::sleep(Duration::from_secs(121)).await;
            app.on_tick();
            assert!(!dir.path().join("application.json").exists());

            type_text(&mut app, "Awa");
            tokio::time::sleep(Duration::from_secs(120)).await;
            app.on_tick();
            assert!(dir.path().join("application.json").exists());
        }

        #[tokio::test(start_paused = true)]
        async fn test_quit_stops_autosave() {
            let dir = TempDir::new().unwrap();
            let mut app = app_with(mock_api(), &dir);
            app.start_autosave(Duration::from_secs(1));
            app.handle_key(key(KeyCode::Esc)).unwrap();
            assert!(app.should_quit());
            assert!(app.autosave.is_none());
        }
    }

    mod attachments {
        use super::*;
        use pretty_assertions::assert_eq;

        #[tokio::test]
        async fn test_typed_path_is_staged_on_enter() {
            let dir = TempDir::new().unwrap();
            let mut app = app_with(mock_api(), &dir);
            fill_all(&mut app, &dir);
            app.session.remove_attachment(AttachmentSlotId::Cv);
            go_to_last_step(&mut app);

            app.handle_key(key(KeyCode::Tab)).unwrap();
            assert_eq!(app.focused(), Some(Focus::Slot(AttachmentSlotId::Cv)));
            let path = dir.path().join("cv.pdf");
            type_text(&mut app, &path.display().to_string());
            app.handle_key(key(KeyCode::Enter)).unwrap();

            let staged = app.session.attachments().get(AttachmentSlotId::Cv).unwrap();
            assert_eq!(staged.display_name, "cv.pdf");
            assert!(app.state.attachment_input.is_empty());
        }

        #[tokio::test]
        async fn test_wrong_extension_shows_inline_error() {
            let dir = TempDir::new().unwrap();
            let mut app = app_with(mock_api(), &dir);
            fill_all(&mut app, &dir);
            go_to_last_step(&mut app);

            app.state.active_form_field = 2;
            assert_eq!(
                app.focused(),
                Some(Focus::Slot(AttachmentSlotId::Transcripts))
            );
            let path = dir.path().join("notes.docx");
            fs::write(&path, b"doc").unwrap();
            type_text(&mut app, &path.display().to_string());
            app.handle_key(key(KeyCode::Enter)).unwrap();

            assert!(app
                .session
                .attachment_error(AttachmentSlotId::Transcripts)
                .is_some());
            assert_eq!(
                app.session
                    .attachments()
                    .get(AttachmentSlotId::Transcripts)
                    .unwrap()
                    .display_name,
                "notes.pdf"
            );
        }
    }

    mod submitting {
        use super::*;
        use pretty_assertions::assert_eq;
        use ratatui::{backend::TestBackend, Terminal};

        #[tokio::test]
        async fn test_successful_submit_shows_confirmation() {
            let dir = TempDir::new().unwrap();
            let mut api = mock_api();
            api.expect_submit_application()
                .times(1)
                .withf(|payload| {
                    payload.field("scholarship_type_id") == Some("2")
                        && payload.attachments.len() == 2
                })
                .returning(|_| Ok(record()));
            let mut app = app_with(api, &dir);
            app.start_autosave(Duration::from_secs(120));
            fill_all(&mut app, &dir);
            go_to_last_step(&mut app);

            app.handle_key(ctrl('n')).unwrap();
            assert!(app.has_pending_submission());
            assert!(app.session.is_submitting());
            assert_eq!(app.state.status_message.as_deref(), Some("Submitting..."));

            let mut terminal = Terminal::new(TestBackend::new(100, 40)).unwrap();
            terminal.draw(|frame| crate::ui::draw(frame, &app)).unwrap();
            let screen: String = terminal
                .backend()
                .buffer()
                .content()
                .iter()
                .map(|cell| cell.symbol())
                .collect();
            assert!(screen.contains("Submitting..."));

            app.send_pending_submission().await;

            assert!(!app.has_pending_submission());
            assert_eq!(app.state.current_view, View::Submitted);
            assert_eq!(app.state.submitted, Some(record()));
            assert!(app.autosave.is_none());
            assert!(!dir.path().join("application.json").exists());

            app.handle_key(key(KeyCode::Enter)).unwrap();
            assert!(app.should_quit());
        }

        #[tokio::test]
        async fn test_missing_attachment_blocks_submit() {
            let dir = TempDir::new().unwrap();
            let mut api = mock_api();
            api.expect_submit_application().never();
            let mut app = app_with(api, &dir);
            fill_all(&mut app, &dir);
            app.session.remove_attachment(AttachmentSlotId::Transcripts);
            go_to_last_step(&mut app);

            app.handle_key(ctrl('n')).unwrap();

            assert!(!app.has_pending_submission());
            assert_eq!(app.state.current_view, View::Wizard);
            assert_eq!(
                app.focused(),
                Some(Focus::Slot(AttachmentSlotId::Transcripts))
            );
            assert_eq!(
                app.state.status_message.as_deref(),
                Some("Please attach: Transcripts (PDF)")
            );
        }

        #[tokio::test]
        async fn test_field_rejection_returns_to_step() {
            let dir = TempDir::new().unwrap();
            let mut api = mock_api();
            api.expect_submit_application().times(1).returning(|_| {
                let mut errors = ServerFieldErrors::new();
                errors.insert("email".into(), vec!["Already applied.".into()]);
                errors.insert("detail".into(), vec!["Review needed.".into()]);
                Err(SubmitError::Fields(errors))
            });
            let mut app = app_with(api, &dir);
            fill_all(&mut app, &dir);
            go_to_last_step(&mut app);

            app.handle_key(ctrl('n')).unwrap();

            assert_eq!(app.session.current_step(), 0);
            assert_eq!(app.focused(), Some(Focus::Field(FieldId::Email)));
            assert_eq!(app.session.error(FieldId::Email), Some("Already applied."));
            assert_eq!(app.state.current_error(), Some("detail: Review needed."));
            assert!(!app.session.is_submitting());
        }

        #[tokio::test]
        async fn test_transport_failure_allows_retry() {
            let dir = TempDir::new().unwrap();
            let mut api = mock_api();
            let mut calls = 0;
            api.expect_submit_application().times(2).returning(move |_| {
                calls += 1;
                if calls == 1 {
                    Err(SubmitError::Transport("connection refused".into()))
                } else {
                    Ok(record())
                }
            });
            let mut app = app_with(api, &dir);
            fill_all(&mut app, &dir);
            go_to_last_step(&mut app);

            app.handle_key(ctrl('n')).unwrap();
            app.send_pending_submission().await;
            assert_eq!(app.state.current_view, View::Wizard);
            assert_eq!(app.session.current_step(), 3);
            assert!(app
                .state
                .current_error()
                .is_some_and(|m| m.contains("connection refused")));

            // Dismiss the dialog, then retry
            app.handle_key(key(KeyCode::Enter)).unwrap();
            app.handle_key(ctrl('n')).unwrap();
            app.send_pending_submission().await;
            assert_eq!(app.state.current_view, View::Submitted);
        }

        #[tokio::test]
        async fn test_second_submit_while_queued_is_ignored() {
            let dir = TempDir::new().unwrap();
            let mut api = mock_api();
            api.expect_submit_application()
                .times(1)
                .returning(|_| Ok(record()));
            let mut app = app_with(api, &dir);
            fill_all(&mut app, &dir);
            go_to_last_step(&mut app);

            app.handle_key(ctrl('n')).unwrap();
            app.handle_key(ctrl('n')).unwrap();
            assert_eq!(
                app.state.status_message.as_deref(),
                Some(SubmitBlocked::InFlight.message().as_str())
            );

            app.send_pending_submission().await;
            app.send_pending_submission().await;
            assert_eq!(app.state.current_view, View::Submitted);
        }
    }
}
