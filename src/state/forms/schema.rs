//! Static description of the multi-step application form

use super::attachments::{AttachmentSlot, AttachmentSlotId};
use super::field::{FieldId, FieldValue};
use regex::Regex;
use std::collections::BTreeSet;
use std::sync::LazyLock;
use thiserror::Error;

static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}$").unwrap());

static DATE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").unwrap());

static PHONE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\+?[0-9 .()-]{6,20}$").unwrap());

static DECIMAL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*\d+([.,]\d+)?\s*$").unwrap());

static INTEGER_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\s*\d+\s*$").unwrap());

/// Key under which drafts of this form are stored
pub const APPLICATION_FORM_KEY: &str = "application";

/// A single validation rule; a field's rules are checked in declaration order
#[derive(Debug, Clone)]
pub enum Constraint {
    Required { message: String },
    Email { message: String },
    Range { min: f64, max: f64, message: String },
    MinLength { min: usize, message: String },
    EqualTo { other: FieldId, message: String },
    Pattern { regex: Regex, message: String },
}

impl Constraint {
    pub fn required(message: impl Into<String>) -> Self {
        Self::Required {
            message: message.into(),
        }
    }

    pub fn email(message: impl Into<String>) -> Self {
        Self::Email {
            message: message.into(),
        }
    }

    pub fn range(min: f64, max: f64, message: impl Into<String>) -> Self {
        Self::Range {
            min,
            max,
            message: message.into(),
        }
    }

    pub fn min_length(min: usize, message: impl Into<String>) -> Self {
        Self::MinLength {
            min,
            message: message.into(),
        }
    }

    pub fn equal_to(other: FieldId, message: impl Into<String>) -> Self {
        Self::EqualTo {
            other,
            message: message.into(),
        }
    }

    pub fn pattern(regex: &Regex, message: impl Into<String>) -> Self {
        Self::Pattern {
            regex: regex.clone(),
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        match self {
            Self::Required { message }
            | Self::Email { message }
            | Self::Range { message, .. }
            | Self::MinLength { message, .. }
            | Self::EqualTo { message, .. }
            | Self::Pattern { message, .. } => message,
        }
    }

    pub(crate) fn email_regex() -> &'static Regex {
        &EMAIL_RE
    }
}

/// Where the options of a choice field come from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChoiceSource {
    /// Fixed `(value, label)` pairs
    Static(&'static [(&'static str, &'static str)]),
    /// Active scholarship types fetched from the backend
    ScholarshipTypes,
}

/// How a field is edited and rendered
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Multiline,
    Choice(ChoiceSource),
    Checkbox,
}

impl FieldKind {
    /// Reshape a loaded value into what this kind edits, or `None` if it cannot hold it.
    /// Numbers become their text form; flags only fit checkboxes.
    pub fn coerce(self, value: FieldValue) -> Option<FieldValue> {
        match (self, value) {
            (FieldKind::Checkbox, FieldValue::Flag(flag)) => Some(FieldValue::Flag(flag)),
            (FieldKind::Checkbox, FieldValue::Text(text)) => match text.trim() {
                "true" => Some(FieldValue::Flag(true)),
                "false" | "" => Some(FieldValue::Flag(false)),
                _ => None,
            },
            (FieldKind::Checkbox, FieldValue::Number(_)) | (_, FieldValue::Flag(_)) => None,
            (_, value) => Some(FieldValue::Text(value.to_form_value())),
        }
    }
}

#[derive(Debug, Clone)]
pub struct FieldSpec {
    pub id: FieldId,
    pub kind: FieldKind,
    pub constraints: Vec<Constraint>,
}

impl FieldSpec {
    pub fn new(id: FieldId, kind: FieldKind) -> Self {
        Self {
            id,
            kind,
            constraints: Vec::new(),
        }
    }

    pub fn with(mut self, constraint: Constraint) -> Self {
        self.constraints.push(constraint);
        self
    }

    pub fn is_required(&self) -> bool {
        self.constraints
            .iter()
            .any(|c| matches!(c, Constraint::Required { .. }))
    }
}

/// An ordered, named group of fields validated together
#[derive(Debug, Clone)]
pub struct Step {
    pub title: &'static str,
    pub fields: Vec<FieldSpec>,
}

impl Step {
    pub fn new(title: &'static str, fields: Vec<FieldSpec>) -> Self {
        Self { title, fields }
    }

    pub fn field_ids(&self) -> impl Iterator<Item = FieldId> + '_ {
        self.fields.iter().map(|f| f.id)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SchemaError {
    #[error("form has no steps")]
    NoSteps,
    #[error("step {0} declares no fields")]
    EmptyStep(usize),
    #[error("field `{}` is declared more than once", .0.name())]
    DuplicateField(FieldId),
    #[error("attachment slot `{}` is declared more than once", .0.name())]
    DuplicateSlot(AttachmentSlotId),
    #[error("attachment slot `{}` points at missing step {}", .0.name(), .1)]
    SlotStepOutOfRange(AttachmentSlotId, usize),
}

/// Ordered steps plus attachment slots; every field belongs to exactly one step
#[derive(Debug, Clone)]
pub struct FormSchema {
    key: &'static str,
    steps: Vec<Step>,
    slots: Vec<AttachmentSlot>,
}

impl FormSchema {
    pub fn new(
        key: &'static str,
        steps: Vec<Step>,
        slots: Vec<AttachmentSlot>,
    ) -> Result<Self, SchemaError> {
        if steps.is_empty() {
            return Err(SchemaError::NoSteps);
        }
        let mut seen = BTreeSet::new();
        for (index, step) in steps.iter().enumerate() {
            if step.fields.is_empty() {
                return Err(SchemaError::EmptyStep(index));
            }
            for id in step.field_ids() {
                if !seen.insert(id) {
                    return Err(SchemaError::DuplicateField(id));
                }
            }
        }
        let mut seen_slots = BTreeSet::new();
        for slot in &slots {
            if !seen_slots.insert(slot.id) {
                return Err(SchemaError::DuplicateSlot(slot.id));
            }
            if slot.step >= steps.len() {
                return Err(SchemaError::SlotStepOutOfRange(slot.id, slot.step));
            }
        }
        Ok(Self { key, steps, slots })
    }

    /// The four-step scholarship application form
    pub fn application() -> Result<Self, SchemaError> {
        use Constraint as C;
        use FieldId as F;

        const GENDERS: &[(&str, &str)] = &[("M", "Male"), ("F", "Female"), ("O", "Other")];
        const YEARS: &[(&str, &str)] = &[
            ("1", "1st year"),
            ("2", "2nd year"),
            ("3", "3rd year"),
            ("4", "4th year"),
            ("5", "5th year"),
            ("6", "6th year and above"),
        ];
        const MENTIONS: &[(&str, &str)] = &[
            ("P", "Passable"),
            ("AB", "Assez bien"),
            ("B", "Bien"),
            ("TB", "Tres bien"),
        ];

        let personal = Step::new(
            "Personal information",
            vec![
                FieldSpec::new(F::FullName, FieldKind::Text)
                    .with(C::required("Full name is required")),
                FieldSpec::new(F::Email, FieldKind::Text)
                    .with(C::required("Email is required"))
                    .with(C::email("Please enter a valid email address")),
                FieldSpec::new(F::DateOfBirth, FieldKind::Text)
                    .with(C::required("Date of birth is required"))
                    .with(C::pattern(&DATE_RE, "Expected format: YYYY-MM-DD")),
                FieldSpec::new(F::Gender, FieldKind::Choice(ChoiceSource::Static(GENDERS)))
                    .with(C::required("Gender is required")),
                FieldSpec::new(F::PhoneNumber, FieldKind::Text)
                    .with(C::required("Phone number is required"))
                    .with(C::pattern(&PHONE_RE, "Please enter a valid phone number")),
                FieldSpec::new(F::Address, FieldKind::Multiline)
                    .with(C::required("Address is required")),
            ],
        );

        let academic = Step::new(
            "Academic information",
            vec![
                FieldSpec::new(
                    F::ScholarshipTypeId,
                    FieldKind::Choice(ChoiceSource::ScholarshipTypes),
                )
                .with(C::required("Scholarship type is required")),
                FieldSpec::new(F::CurrentInstitution, FieldKind::Text)
                    .with(C::required("Current institution is required")),
                FieldSpec::new(F::FieldOfStudy, FieldKind::Text)
                    .with(C::required("Field of study is required")),
                FieldSpec::new(F::CurrentYear, FieldKind::Choice(ChoiceSource::Static(YEARS)))
                    .with(C::required("Current year of study is required")),
            ],
        );

        let socio_economic = Step::new(
            "Socio-economic situation",
            vec![
                FieldSpec::new(F::AverageGrade, FieldKind::Text)
                    .with(C::required("Average grade is required"))
                    .with(C::pattern(&DECIMAL_RE, "Must be a number"))
                    .with(C::range(0.0, 20.0, "Average grade must be between 0 and 20")),
                FieldSpec::new(F::BacMention, FieldKind::Choice(ChoiceSource::Static(MENTIONS)))
                    .with(C::required("Baccalaureate mention is required")),
                FieldSpec::new(F::FamilyIncome, FieldKind::Text)
                    .with(C::required("Family income is required"))
                    .with(C::pattern(&INTEGER_RE, "Must be a whole number")),
                FieldSpec::new(F::NumberOfDependents, FieldKind::Text)
                    .with(C::required("Number of dependents is required"))
                    .with(C::pattern(&INTEGER_RE, "Must be a whole number"))
                    .with(C::range(0.0, 50.0, "Must be between 0 and 50")),
                FieldSpec::new(F::IsHandicapped, FieldKind::Checkbox),
            ],
        );

        let documents = Step::new(
            "Documents and motivation",
            vec![FieldSpec::new(F::Motivation, FieldKind::Multiline)
                .with(C::required("Motivation letter is required"))
                .with(C::min_length(
                    50,
                    "The motivation letter must contain at least 50 characters",
                ))],
        );

        let slots = vec![
            AttachmentSlot::new(AttachmentSlotId::Cv, 3, true),
            AttachmentSlot::new(AttachmentSlotId::Transcripts, 3, true),
            AttachmentSlot::new(AttachmentSlotId::RecommendationLetter, 3, false),
            AttachmentSlot::new(AttachmentSlotId::AdditionalDocuments, 3, false),
        ];

        Self::new(
            APPLICATION_FORM_KEY,
            vec![personal, academic, socio_economic, documents],
            slots,
        )
    }

    pub fn key(&self) -> &'static str {
        self.key
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn step(&self, index: usize) -> Option<&Step> {
        self.steps.get(index)
    }

    pub fn total_steps(&self) -> usize {
        self.steps.len()
    }

    pub fn slots(&self) -> &[AttachmentSlot] {
        &self.slots
    }

    pub fn slots_for_step(&self, index: usize) -> impl Iterator<Item = &AttachmentSlot> {
        self.slots.iter().filter(move |s| s.step == index)
    }

    pub fn field(&self, id: FieldId) -> Option<&FieldSpec> {
        self.steps
            .iter()
            .flat_map(|s| s.fields.iter())
            .find(|f| f.id == id)
    }

    pub fn contains(&self, id: FieldId) -> bool {
        self.field(id).is_some()
    }

    /// Reverse lookup from a field to the index of the step that owns it
    pub fn step_of(&self, id: FieldId) -> Option<usize> {
        self.steps
            .iter()
            .position(|step| step.field_ids().any(|f| f == id))
    }

    /// Fields whose constraints compare against `id`
    pub fn dependents_of(&self, id: FieldId) -> Vec<FieldId> {
        self.steps
            .iter()
            .flat_map(|s| s.fields.iter())
            .filter(|f| {
                f.constraints
                    .iter()
                    .any(|c| matches!(c, Constraint::EqualTo { other, .. } if *other == id))
            })
            .map(|f| f.id)
            .collect()
    }
}
