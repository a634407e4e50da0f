//! Client configuration, loaded from YAML.

use std::path::Path;
use std::time::Duration;

use dc_query::{ArrayEncoding, EncodeOptions, PaginationStyle};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};

fn default_api_prefix() -> String {
    "/v1".to_string()
}

fn default_page_size() -> u32 {
    100
}

fn default_connect_timeout_ms() -> u64 {
    30_000
}

/// Backend endpoint, credentials and wire conventions.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ClientConfig {
    pub base_url: String,
    #[serde(default = "default_api_prefix")]
    pub api_prefix: String,
    /// Session token, sent as `Authorization: Token <token>`.
    #[serde(default)]
    pub token: Option<String>,
    /// CSRF cookie value, sent as `X-CSRFToken`.
    #[serde(default)]
    pub csrf_token: Option<String>,
    #[serde(default)]
    pub array_encoding: ArrayEncoding,
    #[serde(default)]
    pub pagination_style: PaginationStyle,
    #[serde(default = "default_page_size")]
    pub default_page_size: u32,
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            api_prefix: default_api_prefix(),
            token: None,
            csrf_token: None,
            array_encoding: ArrayEncoding::default(),
            pagination_style: PaginationStyle::default(),
            default_page_size: default_page_size(),
            connect_timeout_ms: default_connect_timeout_ms(),
        }
    }
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    /// Load from a YAML file. The result is validated.
    pub fn load(path: &Path) -> AppResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| AppError::ConfigFileRead {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::from_yaml(&content)
    }

    pub fn from_yaml(content: &str) -> AppResult<Self> {
        let config: ClientConfig = serde_yaml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> AppResult<()> {
        if self.base_url.trim().is_empty() {
            return Err(AppError::Config("base_url must not be empty".to_string()));
        }
        if self.default_page_size == 0 {
            return Err(AppError::Config(
                "default_page_size must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    pub fn encode_options(&self) -> EncodeOptions {
        EncodeOptions {
            arrays: self.array_encoding,
            pagination: self.pagination_style,
        }
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    /// `{base_url}{api_prefix}{route}` with duplicate slashes at the joins
    /// collapsed.
    pub fn url_for(&self, route: &str) -> String {
        let base = self.base_url.trim_end_matches('/');
        let prefix = self.api_prefix.trim_matches('/');
        let route = route.trim_start_matches('/');
        if prefix.is_empty() {
            format!("{base}/{route}")
        } else {
            format!("{base}/{prefix}/{route}")
        }
    }
}
