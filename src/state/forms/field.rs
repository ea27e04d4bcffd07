//! Form field identifiers and value objects

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Closed set of fields on the scholarship application form
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldId {
    FullName,
    Email,
    DateOfBirth,
    Gender,
    PhoneNumber,
    Address,
    ScholarshipTypeId,
    CurrentInstitution,
    FieldOfStudy,
    CurrentYear,
    AverageGrade,
    BacMention,
    FamilyIncome,
    NumberOfDependents,
    IsHandicapped,
    Motivation,
}

impl FieldId {
    pub const ALL: [FieldId; 16] = [
        Self::FullName,
        Self::Email,
        Self::DateOfBirth,
        Self::Gender,
        Self::PhoneNumber,
        Self::Address,
        Self::ScholarshipTypeId,
        Self::CurrentInstitution,
        Self::FieldOfStudy,
        Self::CurrentYear,
        Self::AverageGrade,
        Self::BacMention,
        Self::FamilyIncome,
        Self::NumberOfDependents,
        Self::IsHandicapped,
        Self::Motivation,
    ];

    /// Wire name, shared by the draft file and the multipart submission
    pub fn name(&self) -> &'static str {
        match self {
            Self::FullName => "full_name",
            Self::Email => "email",
            Self::DateOfBirth => "date_of_birth",
            Self::Gender => "gender",
            Self::PhoneNumber => "phone_number",
            Self::Address => "address",
            Self::ScholarshipTypeId => "scholarship_type_id",
            Self::CurrentInstitution => "current_institution",
            Self::FieldOfStudy => "field_of_study",
            Self::CurrentYear => "current_year",
            Self::AverageGrade => "average_grade",
            Self::BacMention => "bac_mention",
            Self::FamilyIncome => "family_income",
            Self::NumberOfDependents => "number_of_dependents",
            Self::IsHandicapped => "is_handicapped",
            Self::Motivation => "motivation",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|id| id.name() == name)
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::FullName => "Full name *",
            Self::Email => "Email *",
            Self::DateOfBirth => "Date of birth (YYYY-MM-DD) *",
            Self::Gender => "Gender *",
            Self::PhoneNumber => "Phone number *",
            Self::Address => "Address *",
            Self::ScholarshipTypeId => "Scholarship type *",
            Self::CurrentInstitution => "Current institution *",
            Self::FieldOfStudy => "Field of study *",
            Self::CurrentYear => "Current year of study *",
            Self::AverageGrade => "Average grade (/20) *",
            Self::BacMention => "Baccalaureate mention *",
            Self::FamilyIncome => "Annual family income *",
            Self::NumberOfDependents => "Number of dependents *",
            Self::IsHandicapped => "I have a disability",
            Self::Motivation => "Motivation letter *",
        }
    }
}

/// Type-safe field values
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Flag(bool),
    Number(f64),
    Text(String),
}

impl Default for FieldValue {
    fn default() -> Self {
        FieldValue::Text(String::new())
    }
}

impl FieldValue {
    /// Text content, empty for non-text values
    pub fn as_text(&self) -> &str {
        match self {
            FieldValue::Text(s) => s,
            _ => "",
        }
    }

    pub fn as_flag(&self) -> bool {
        matches!(self, FieldValue::Flag(true))
    }

    /// Numeric view of the value; text is parsed with `,` accepted as decimal separator
    pub fn as_number(&self) -> Option<f64> {
        match self {
            FieldValue::Number(n) => Some(*n),
            FieldValue::Text(s) => s.trim().replace(',', ".").parse().ok(),
            FieldValue::Flag(_) => None,
        }
    }

    /// A flag is never empty: unchecked is a valid answer
    pub fn is_empty(&self) -> bool {
        match self {
            FieldValue::Text(s) => s.trim().is_empty(),
            FieldValue::Number(_) | FieldValue::Flag(_) => false,
        }
    }

    /// Value as sent in a multipart text part
    pub fn to_form_value(&self) -> String {
        match self {
            FieldValue::Text(s) => s.clone(),
            FieldValue::Number(n) => n.to_string(),
            FieldValue::Flag(b) => b.to_string(),
        }
    }

    /// Push a character to a text value
    pub fn push_char(&mut self, c: char) {
        match self {
            FieldValue::Text(s) => s.push(c),
            other => *other = FieldValue::Text(c.to_string()),
        }
    }

    /// Remove the last character from a text value
    pub fn pop_char(&mut self) {
        if let FieldValue::Text(s) = self {
            s.pop();
        }
    }
}

/// Current answers keyed by field
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldValues(BTreeMap<FieldId, FieldValue>);

impl FieldValues {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: FieldId) -> Option<&FieldValue> {
        self.0.get(&id)
    }

    pub fn text(&self, id: FieldId) -> &str {
        self.get(id).map(FieldValue::as_text).unwrap_or("")
    }

    pub fn set(&mut self, id: FieldId, value: FieldValue) {
        self.0.insert(id, value);
    }

    pub fn set_text(&mut self, id: FieldId, value: impl Into<String>) {
        self.set(id, FieldValue::Text(value.into()));
    }

    pub fn entry_mut(&mut self, id: FieldId) -> &mut FieldValue {
        self.0.entry(id).or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (FieldId, &FieldValue)> {
        self.0.iter().map(|(id, value)| (*id, value))
    }

    /// Keep only the given fields
    pub fn restricted_to(&self, keep: impl Fn(FieldId) -> bool) -> Self {
        Self(
            self.0
                .iter()
                .filter(|(id, _)| keep(**id))
                .map(|(id, value)| (*id, value.clone()))
                .collect(),
        )
    }

    /// Overwrite every field present in `other`
    pub fn merge(&mut self, other: &FieldValues) {
        for (id, value) in other.iter() {
            self.set(id, value.clone());
        }
    }
}

impl FromIterator<(FieldId, FieldValue)> for FieldValues {
    fn from_iter<I: IntoIterator<Item = (FieldId, FieldValue)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}
