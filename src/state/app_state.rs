//! Application state definitions

use crate::state::forms::ChoiceSource;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Current view in the application
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum View {
    #[default]
    Wizard,
    /// Shown once the backend accepted the application
    Submitted,
}

/// A scholarship category offered by the backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScholarshipType {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_active() -> bool {
    true
}

/// The record created by a successful submission
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicationRecord {
    pub id: u64,
    pub status: String,
    #[serde(default)]
    pub status_display: Option<String>,
}

impl ApplicationRecord {
    pub fn status_label(&self) -> &str {
        self.status_display.as_deref().unwrap_or(&self.status)
    }
}

/// Signed-in user details used to prefill the form
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub name: Option<String>,
    pub email: Option<String>,
}

/// Main application state
#[derive(Debug, Default)]
pub struct AppState {
    // Navigation
    pub current_view: View,

    // Data
    pub scholarship_types: Vec<ScholarshipType>,
    pub submitted: Option<ApplicationRecord>,

    // Form focus: step fields first, then the step's attachment slots
    pub active_form_field: usize,
    /// Path being typed for the focused attachment slot
    pub attachment_input: String,

    // Feedback
    pub error_queue: VecDeque<String>,
    pub draft_warning: Option<String>,
    pub status_message: Option<String>,
}

impl AppState {
    /// Queue an error for the modal dialog
    pub fn push_error(&mut self, message: String) {
        self.error_queue.push_back(message);
    }

    pub fn current_error(&self) -> Option<&str> {
        self.error_queue.front().map(String::as_str)
    }

    pub fn dismiss_error(&mut self) {
        self.error_queue.pop_front();
    }

    /// Replace the scholarship list, keeping only active entries
    pub fn set_scholarship_types(&mut self, types: Vec<ScholarshipType>) {
        self.scholarship_types = types.into_iter().filter(|t| t.is_active).collect();
    }

    /// `(value, label)` pairs for a choice field
    pub fn choice_options(&self, source: ChoiceSource) -> Vec<(String, String)> {
        match source {
            ChoiceSource::Static(options) => options
                .iter()
                .map(|(value, label)| ((*value).to_string(), (*label).to_string()))
                .collect(),
            ChoiceSource::ScholarshipTypes => self
                .scholarship_types
                .iter()
                .map(|t| {
                    let label = if t.description.is_empty() {
                        t.name.clone()
                    } else {
                        format!("{} ({})", t.name, t.description)
                    };
                    (t.id.to_string(), label)
                })
                .collect(),
        }
    }

    /// Label shown for a choice value; unknown values are shown as-is
    pub fn choice_label(&self, source: ChoiceSource, value: &str) -> String {
        self.choice_options(source)
            .into_iter()
            .find(|(v, _)| v == value)
            .map(|(_, label)| label)
            .unwrap_or_else(|| value.to_string())
    }

    /// Reset per-step focus when the step changes
    pub fn reset_focus(&mut self) {
        self.active_form_field = 0;
        self.attachment_input.clear();
    }
}
