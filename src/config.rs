//! Configuration handling for the TUI

use crate::api::DEFAULT_API_URL;
use crate::state::autosave::DEFAULT_AUTOSAVE_INTERVAL;
use crate::state::Identity;
use anyhow::Result;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

/// Environment variable overriding the configured backend address
pub const API_URL_ENV: &str = "SCHOLARSHIP_API_URL";

/// User configuration for the TUI
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct TuiConfig {
    /// Backend base address
    pub api_url: Option<String>,
    /// Bearer token sent with every request
    pub access_token: Option<String>,
    /// Seconds between draft autosaves
    pub autosave_interval_secs: Option<u64>,
    /// Directory holding draft files
    pub draft_dir: Option<PathBuf>,
    /// Signed-in user details for prefill
    pub identity: Option<Identity>,
}

impl TuiConfig {
    fn project_dirs() -> Option<ProjectDirs> {
        ProjectDirs::from("org", "scholarship", "scholarship-tui")
    }

    /// Get the config file path
    fn config_path() -> Option<PathBuf> {
        Self::project_dirs().map(|dirs| dirs.config_dir().join("config.json"))
    }

    /// Load configuration from file
    pub fn load() -> Result<Self> {
        if let Some(path) = Self::config_path() {
            if path.exists() {
                let content = fs::read_to_string(&path)?;
                let config: TuiConfig = serde_json::from_str(&content)?;
                return Ok(config);
            }
        }

        Ok(Self::default())
    }

    /// Backend address: environment, then file, then the default
    pub fn api_url(&self) -> String {
        self.resolve_api_url(std::env::var(API_URL_ENV).ok())
    }

    fn resolve_api_url(&self, from_env: Option<String>) -> String {
        from_env
            .filter(|url| !url.trim().is_empty())
            .or_else(|| self.api_url.clone())
            .unwrap_or_else(|| DEFAULT_API_URL.to_string())
    }

    pub fn autosave_interval(&self) -> Duration {
        match self.autosave_interval_secs {
            Some(secs) if secs > 0 => Duration::from_secs(secs),
            _ => DEFAULT_AUTOSAVE_INTERVAL,
        }
    }

    /// Where drafts are stored, if any location is available
    pub fn drafts_dir(&self) -> Option<PathBuf> {
        self.draft_dir
            .clone()
            .or_else(|| Self::project_dirs().map(|dirs| dirs.data_dir().join("drafts")))
    }

    pub fn identity(&self) -> Identity {
        self.identity.clone().unwrap_or_default()
    }
}
