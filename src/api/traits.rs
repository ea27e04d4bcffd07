//! Trait abstraction for the backend client to enable mocking in tests

use crate::state::forms::{SubmissionPayload, SubmitError};
use crate::state::{ApplicationRecord, ScholarshipType};
use async_trait::async_trait;

use super::client::ApiError;

/// Backend operations used by the wizard
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ApiClientTrait: Send + Sync {
    /// List scholarship categories, active or not
    async fn list_scholarship_types(&self) -> Result<Vec<ScholarshipType>, ApiError>;

    /// Send the completed application with its files
    async fn submit_application(
        &self,
        payload: SubmissionPayload,
    ) -> Result<ApplicationRecord, SubmitError>;
}
