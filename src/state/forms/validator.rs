//! Field validation shared by on-change feedback and step gating

use super::field::{FieldId, FieldValue, FieldValues};
use super::schema::{Constraint, FieldSpec, Step};
use std::collections::BTreeMap;

/// First failing message per field
pub type FieldErrors = BTreeMap<FieldId, String>;

/// Every violated constraint of `spec`, in declaration order.
///
/// Non-required constraints are skipped when the value is empty; equality
/// checks always run.
pub fn validate_field(spec: &FieldSpec, values: &FieldValues) -> Vec<String> {
    let empty = FieldValue::default();
    let value = values.get(spec.id).unwrap_or(&empty);
    spec.constraints
        .iter()
        .filter(|constraint| {
            matches!(constraint, Constraint::Required { .. })
                || matches!(constraint, Constraint::EqualTo { .. })
                || !value.is_empty()
        })
        .filter(|constraint| !satisfies(constraint, value, values))
        .map(|constraint| constraint.message().to_string())
        .collect()
}

/// The message surfaced for a field: the first violated constraint, if any
pub fn first_violation(spec: &FieldSpec, values: &FieldValues) -> Option<String> {
    validate_field(spec, values).into_iter().next()
}

/// Validate every field of a step
pub fn validate_step(step: &Step, values: &FieldValues) -> FieldErrors {
    step.fields
        .iter()
        .filter_map(|spec| first_violation(spec, values).map(|message| (spec.id, message)))
        .collect()
}

fn satisfies(constraint: &Constraint, value: &FieldValue, values: &FieldValues) -> bool {
    match constraint {
        Constraint::Required { .. } => !value.is_empty(),
        Constraint::Email { .. } => {
            Constraint::email_regex().is_match(value.to_form_value().trim())
        }
        Constraint::Range { min, max, .. } => value
            .as_number()
            .is_some_and(|n| n >= *min && n <= *max),
        Constraint::MinLength { min, .. } => {
            value.to_form_value().trim().chars().count() >= *min
        }
        Constraint::EqualTo { other, .. } => {
            let empty = FieldValue::default();
            let other_value = values.get(*other).unwrap_or(&empty);
            value.to_form_value() == other_value.to_form_value()
        }
        Constraint::Pattern { regex, .. } => regex.is_match(&value.to_form_value()),
    }
}
