//! Step navigation with forward gating

use super::field::FieldValues;
use super::schema::FormSchema;
use super::validator::{validate_step, FieldErrors};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum NavigationError {
    #[error("step {target} has not been reached yet (current step is {current})")]
    NotReached { target: usize, current: usize },
}

/// Result of a successful `advance`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Advance {
    /// The index moved to a new step
    Entered(usize),
    /// The last step passed validation; the form is ready to submit
    Completed,
}

/// Integer state machine over `0..total`.
///
/// Forward movement only happens through `advance`, which validates the
/// current step. `jump_to` never moves forward.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepNavigator {
    current: usize,
    total: usize,
}

impl StepNavigator {
    pub fn new(total: usize) -> Self {
        Self {
            current: 0,
            total: total.max(1),
        }
    }

    pub fn current(&self) -> usize {
        self.current
    }

    pub fn total(&self) -> usize {
        self.total
    }

    pub fn is_last(&self) -> bool {
        self.current + 1 == self.total
    }

    /// Validate the current step and move forward when it passes
    pub fn advance(
        &mut self,
        schema: &FormSchema,
        values: &FieldValues,
    ) -> Result<Advance, FieldErrors> {
        let errors = schema
            .step(self.current)
            .map(|step| validate_step(step, values))
            .unwrap_or_default();
        if !errors.is_empty() {
            return Err(errors);
        }
        if self.is_last() {
            return Ok(Advance::Completed);
        }
        self.current += 1;
        Ok(Advance::Entered(self.current))
    }

    /// Move back one step without validating; returns whether the index changed
    pub fn retreat(&mut self) -> bool {
        if self.current == 0 {
            return false;
        }
        self.current -= 1;
        true
    }

    /// Jump back to an already reached step
    pub fn jump_to(&mut self, index: usize) -> Result<(), NavigationError> {
        if index > self.current {
            return Err(NavigationError::NotReached {
                target: index,
                current: self.current,
            });
        }
        self.current = index;
        Ok(())
    }

    /// Move to an earlier step after a failed submission
    pub(crate) fn rewind_to(&mut self, index: usize) {
        self.current = index.min(self.current);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::forms::field::FieldId;
    use crate::state::forms::schema::{Constraint, FieldKind, FieldSpec, Step};
    use pretty_assertions::assert_eq;

    fn two_step_schema() -> FormSchema {
        FormSchema::new(
            "test",
            vec![
                Step::new(
                    "identity",
                    vec![
                        FieldSpec::new(FieldId::Email, FieldKind::Text)
                            .with(Constraint::required("Email is required"))
                            .with(Constraint::email("Invalid email")),
                        FieldSpec::new(FieldId::FullName, FieldKind::Text)
                            .with(Constraint::required("Name is required")),
                    ],
                ),
                Step::new(
                    "motivation",
                    vec![FieldSpec::new(FieldId::Motivation, FieldKind::Multiline)
                        .with(Constraint::required("Motivation is required"))],
                ),
            ],
            vec![],
        )
        .unwrap()
    }

    fn valid_first_step() -> FieldValues {
        let mut values = FieldValues::new();
        values.set_text(FieldId::Email, "a@b.com");
        values.set_text(FieldId::FullName, "A");
        values
    }

    #[test]
    fn test_starts_at_zero() {
        let nav = StepNavigator::new(4);
        assert_eq!(nav.current(), 0);
        assert!(!nav.is_last());
    }

    #[test]
    fn test_advance_fails_with_every_invalid_field() {
        let schema = two_step_schema();
        let mut nav = StepNavigator::new(schema.total_steps());
        let mut values = FieldValues::new();
        values.set_text(FieldId::Email, "bad");
        values.set_text(FieldId::FullName, "");

        let errors = nav.advance(&schema, &values).unwrap_err();
        assert_eq!(errors.len(), 2);
        assert_eq!(errors[&FieldId::Email], "Invalid email");
        assert_eq!(errors[&FieldId::FullName], "Name is required");
        assert_eq!(nav.current(), 0);
    }

    #[test]
    fn test_advance_moves_exactly_one_step() {
        let schema = two_step_schema();
        let mut nav = StepNavigator::new(schema.total_steps());
        assert_eq!(
            nav.advance(&schema, &valid_first_step()),
            Ok(Advance::Entered(1))
        );
        assert_eq!(nav.current(), 1);
    }

    #[test]
    fn test_advance_on_last_step_completes_without_moving() {
        let schema = two_step_schema();
        let mut nav = StepNavigator::new(schema.total_steps());
        let mut values = valid_first_step();
        values.set_text(FieldId::Motivation, "because");
        nav.advance(&schema, &values).unwrap();
        assert_eq!(nav.advance(&schema, &values), Ok(Advance::Completed));
        assert_eq!(nav.current(), 1);
    }

    #[test]
    fn test_retreat_clamps_at_zero() {
        let mut nav = StepNavigator::new(3);
        assert!(!nav.retreat());
        assert_eq!(nav.current(), 0);
    }

    #[test]
    fn test_retreat_then_advance_is_deterministic() {
        let schema = two_step_schema();
        let mut nav = StepNavigator::new(schema.total_steps());
        let values = valid_first_step();
        let first = nav.advance(&schema, &values);
        assert!(nav.retreat());
        let second = nav.advance(&schema, &values);
        assert_eq!(first, second);
    }

    #[test]
    fn test_jump_back_is_allowed() {
        let schema = two_step_schema();
        let mut nav = StepNavigator::new(schema.total_steps());
        nav.advance(&schema, &valid_first_step()).unwrap();
        assert_eq!(nav.jump_to(0), Ok(()));
        assert_eq!(nav.current(), 0);
    }

    #[test]
    fn test_jump_forward_is_refused() {
        let mut nav = StepNavigator::new(4);
        assert_eq!(
            nav.jump_to(2),
            Err(NavigationError::NotReached {
                target: 2,
                current: 0
            })
        );
        assert_eq!(nav.current(), 0);
    }

    #[test]
    fn test_jump_forward_after_retreat_is_refused() {
        let schema = two_step_schema();
        let mut nav = StepNavigator::new(schema.total_steps());
        nav.advance(&schema, &valid_first_step()).unwrap();
        nav.retreat();
        assert!(nav.jump_to(1).is_err());
    }

    #[test]
    fn test_rewind_never_moves_forward() {
        let mut nav = StepNavigator::new(4);
        nav.rewind_to(3);
        assert_eq!(nav.current(), 0);
    }
}
