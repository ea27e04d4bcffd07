//! HTTP client for the scholarship backend
//!
//! Talks JSON for lookups and multipart for the final submission.

use crate::state::forms::{ServerFieldErrors, StagedFile, SubmissionPayload, SubmitError};
use crate::state::{ApplicationRecord, ScholarshipType};
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder, StatusCode};
use serde_json::Value;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

use super::traits::ApiClientTrait;

/// Default backend address
pub const DEFAULT_API_URL: &str = "http://localhost:8000/api";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("server returned {status}: {body}")]
    Status { status: StatusCode, body: String },
}

/// Client for the scholarship REST API
pub struct ApiClient {
    http: Client,
    base_url: String,
    access_token: Option<String>,
}

impl ApiClient {
    pub fn new(base_url: &str, access_token: Option<String>) -> Result<Self, ApiError> {
        let http = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            access_token: access_token.filter(|t| !t.is_empty()),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.access_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn form(payload: SubmissionPayload) -> Result<Form, SubmitError> {
        let mut form = Form::new();
        for (name, value) in payload.fields {
            form = form.text(name, value);
        }
        for (slot, file) in payload.attachments {
            form = form.part(slot.name(), file_part(&file).await?);
        }
        Ok(form)
    }
}

async fn file_part(file: &StagedFile) -> Result<Part, SubmitError> {
    let bytes = tokio::fs::read(&file.path).await.map_err(|e| {
        SubmitError::Transport(format!("Failed to read {}: {e}", file.display_name))
    })?;
    Part::bytes(bytes)
        .file_name(file.display_name.clone())
        .mime_str(mime_for(&file.path))
        .map_err(|e| SubmitError::Transport(e.to_string()))
}

fn mime_for(path: &Path) -> &'static str {
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("pdf") => "application/pdf",
        _ => "application/octet-stream",
    }
}

/// Normalize a 400 body into field messages.
///
/// Values may be a single string or a list; anything that is not an object
/// is not a field-error map.
fn field_errors(body: &Value) -> Option<ServerFieldErrors> {
    let map = body.as_object()?;
    let errors = map
        .iter()
        .map(|(key, value)| {
            let messages = match value {
                Value::String(s) => vec![s.clone()],
                Value::Array(items) => items
                    .iter()
                    .map(|item| match item {
                        Value::String(s) => s.clone(),
                        other => other.to_string(),
                    })
                    .collect(),
                other => vec![other.to_string()],
            };
            (key.clone(), messages)
        })
        .collect();
    Some(errors)
}

fn truncate(body: &str) -> String {
    body.chars().take(200).collect()
}

#[async_trait]
impl ApiClientTrait for ApiClient {
    async fn list_scholarship_types(&self) -> Result<Vec<ScholarshipType>, ApiError> {
        let request = self.http.get(self.url("scholarship-types/"));
        let response = self
            .authorized(request)
            .header("Accept", "application/json")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::Status {
                status,
                body: truncate(&body),
            });
        }

        let types: Vec<ScholarshipType> = response.json().await?;
        tracing::debug!("Loaded {} scholarship type(s)", types.len());
        Ok(types)
    }

    async fn submit_application(
        &self,
        payload: SubmissionPayload,
    ) -> Result<ApplicationRecord, SubmitError> {
        let form = Self::form(payload).await?;
        let request = self.http.post(self.url("applications/")).multipart(form);
        let response = self
            .authorized(request)
            .send()
            .await
            .map_err(|e| SubmitError::Transport(format!("Failed to reach the server: {e}")))?;

        let status = response.status();
        if status.is_success() {
            return response
                .json::<ApplicationRecord>()
                .await
                .map_err(|e| SubmitError::Transport(format!("Unexpected response: {e}")));
        }

        let body = response.text().await.unwrap_or_default();
        if status == StatusCode::BAD_REQUEST {
            let parsed = serde_json::from_str::<Value>(&body).ok();
            if let Some(errors) = parsed.as_ref().and_then(field_errors) {
                return Err(SubmitError::Fields(errors));
            }
        }
        Err(SubmitError::Transport(format!(
            "Server returned {status}: {}",
            truncate(&body)
        )))
    }
}
