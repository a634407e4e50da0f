//! Backend transport.

use async_trait::async_trait;
use dc_query::{EncodeOptions, Query, with_query};
use serde_json::Value;

use crate::config::ClientConfig;
use crate::error::{AppError, AppResult};

/// JSON-over-HTTP access to the model API.
///
/// Routes are relative to the API root (`/load/meter_group/`); the query is
/// encoded by the implementation. Futures are not `Send`: the cache runs on
/// a single-threaded executor.
#[async_trait(?Send)]
pub trait Backend {
    async fn get_json(&self, route: &str, query: Option<&Query>) -> AppResult<Value>;

    async fn delete(&self, route: &str) -> AppResult<()>;
}

/// [`Backend`] over `reqwest`.
pub struct HttpBackend {
    config: ClientConfig,
    http_client: reqwest::Client,
}

impl std::fmt::Debug for HttpBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpBackend")
            .field("base_url", &self.config.base_url)
            .field("api_prefix", &self.config.api_prefix)
            .finish()
    }
}

impl HttpBackend {
    pub fn new(config: ClientConfig) -> AppResult<Self> {
        config.validate()?;
        let http_client = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout())
            .build()?;

        Ok(Self {
            config,
            http_client,
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn encode_options(&self) -> EncodeOptions {
        self.config.encode_options()
    }

    /// Absolute URL for `route` with `query` appended.
    pub fn url(&self, route: &str, query: Option<&Query>) -> String {
        with_query(
            &self.config.url_for(route),
            query,
            self.config.encode_options(),
        )
    }

    fn authorize(&self, mut request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        if let Some(token) = &self.config.token {
            request = request.header("Authorization", format!("Token {}", token));
        }
        if let Some(csrf) = &self.config.csrf_token {
            request = request.header("X-CSRFToken", csrf);
        }
        request
    }
}

#[async_trait(?Send)]
impl Backend for HttpBackend {
    async fn get_json(&self, route: &str, query: Option<&Query>) -> AppResult<Value> {
        let url = self.url(route, query);
        tracing::debug!(url = %url, "GET");

        let request = self
            .authorize(self.http_client.get(&url))
            .header("Accept", "application/json");
        let response = request.send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::Status {
                status,
                route: route.to_string(),
            });
        }

        let body = response.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }

    async fn delete(&self, route: &str) -> AppResult<()> {
        let url = self.url(route, None);
        tracing::debug!(url = %url, "DELETE");

        let response = self.authorize(self.http_client.delete(&url)).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::Status {
                status,
                route: route.to_string(),
            });
        }
        Ok(())
    }
}
