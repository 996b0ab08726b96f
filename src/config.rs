use std::path::PathBuf;

use clap::Args;

use crate::advice::{AdviceConfig, DEFAULT_ENDPOINT, DEFAULT_LANGUAGE, DEFAULT_MODEL};
use crate::persistence::FileStore;

/// Key baked in when the binary was built, used when none is given at runtime.
const BUILD_TIME_API_KEY: Option<&str> = option_env!("GEMINI_API_KEY");

#[derive(Args, Debug, Clone)]
pub struct Settings {
    /// Directory holding the planner storage file
    #[arg(long, env = "HUNDRED_DAYS_DATA_DIR", global = true)]
    pub data_dir: Option<PathBuf>,

    /// API key for the AI coach (Gemini)
    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true, global = true)]
    pub api_key: Option<String>,

    /// Model used for coaching replies
    #[arg(long, env = "HUNDRED_DAYS_MODEL", default_value = DEFAULT_MODEL, global = true)]
    pub model: String,

    /// Base URL of the generative language API
    #[arg(long, env = "HUNDRED_DAYS_ENDPOINT", default_value = DEFAULT_ENDPOINT, global = true)]
    pub endpoint: String,

    /// Language the coach replies in
    #[arg(long, env = "HUNDRED_DAYS_LANGUAGE", default_value = DEFAULT_LANGUAGE, global = true)]
    pub language: String,
}

impl Settings {
    pub fn default_settings() -> Self {
        Self {
            data_dir: None,
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            language: DEFAULT_LANGUAGE.to_string(),
        }
    }

    /// Validate CLI/environment-derived settings.
    pub fn validate(&self) -> Result<(), String> {
        if !(self.endpoint.starts_with("https://") || self.endpoint.starts_with("http://")) {
            return Err(format!(
                "Invalid HUNDRED_DAYS_ENDPOINT '{}': expected an http(s) URL",
                self.endpoint
            ));
        }
        if self.model.trim().is_empty() {
            return Err("HUNDRED_DAYS_MODEL cannot be empty".to_string());
        }
        if self.language.trim().is_empty() {
            return Err("HUNDRED_DAYS_LANGUAGE cannot be empty".to_string());
        }
        if self
            .data_dir
            .as_ref()
            .is_some_and(|dir| dir.as_os_str().is_empty())
        {
            return Err("HUNDRED_DAYS_DATA_DIR cannot be empty".to_string());
        }
        Ok(())
    }

    pub fn resolve_data_dir(&self) -> Result<PathBuf, String> {
        match &self.data_dir {
            Some(dir) => Ok(dir.clone()),
            None => FileStore::default_dir().ok_or_else(|| {
                "Could not locate a home directory; pass --data-dir".to_string()
            }),
        }
    }

    /// Runtime key first, then the build-time one. Blank keys count as absent.
    pub fn api_key(&self) -> Option<String> {
        self.api_key
            .as_deref()
            .or(BUILD_TIME_API_KEY)
            .map(str::trim)
            .filter(|key| !key.is_empty())
            .map(str::to_string)
    }

    pub fn advice_config(&self) -> AdviceConfig {
        AdviceConfig {
            api_key: self.api_key(),
            endpoint: self.endpoint.clone(),
            model: self.model.clone(),
            language: self.language.clone(),
        }
    }
}
