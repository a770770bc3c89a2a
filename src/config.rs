//! Endpoint configuration
//!
//! Describes one cursor-paginated endpoint in YAML (or JSON) and builds the
//! HTTP client, request factory and page parser a
//! [`PagedCollection`](crate::pagination::PagedCollection) needs.

use crate::error::{Error, Result};
use crate::http::{RateLimiterConfig, ReqwestClient, ReqwestClientConfig};
use crate::pagination::{CursorMode, CursorRequestFactory, JsonPageParser, PagedCollection};
use crate::types::{BackoffType, Method};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

// ============================================================================
// Top-Level Config
// ============================================================================

/// A paginated endpoint loaded from YAML
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PagerConfig {
    /// URL of the first page
    pub base_url: String,

    #[serde(default)]
    pub method: Method,

    /// Query parameter carrying the cursor (query mode only)
    #[serde(default = "default_cursor_param")]
    pub cursor_param: String,

    #[serde(default)]
    pub cursor_mode: CursorMode,

    #[serde(default)]
    pub page_size_param: Option<String>,

    #[serde(default)]
    pub page_size: Option<u32>,

    /// Static query parameters sent with every page built from the base URL
    #[serde(default)]
    pub query: HashMap<String, String>,

    #[serde(default)]
    pub headers: HashMap<String, String>,

    /// Path to the records array; the whole body when absent
    #[serde(default)]
    pub records_path: Option<String>,

    /// Path to the next cursor; without it only one page is read
    #[serde(default)]
    pub next_cursor_path: Option<String>,

    #[serde(default)]
    pub stop_on_empty: bool,

    #[serde(default)]
    pub http: HttpSettings,
}

fn default_cursor_param() -> String {
    "cursor".to_string()
}

// ============================================================================
// HTTP Settings
// ============================================================================

/// HTTP client settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HttpSettings {
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    #[serde(default)]
    pub backoff: BackoffType,

    #[serde(default = "default_initial_backoff_ms")]
    pub initial_backoff_ms: u64,

    #[serde(default = "default_max_backoff_ms")]
    pub max_backoff_ms: u64,

    #[serde(default)]
    pub user_agent: Option<String>,

    /// Token bucket limit; unlimited when absent
    #[serde(default)]
    pub rate_limit: Option<RateLimiterConfig>,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout(),
            max_retries: default_max_retries(),
            backoff: BackoffType::default(),
            initial_backoff_ms: default_initial_backoff_ms(),
            max_backoff_ms: default_max_backoff_ms(),
            user_agent: None,
            rate_limit: None,
        }
    }
}

fn default_timeout() -> u64 {
    30
}

fn default_max_retries() -> u32 {
    3
}

fn default_initial_backoff_ms() -> u64 {
    100
}

fn default_max_backoff_ms() -> u64 {
    60000
}

// ============================================================================
// Loading
// ============================================================================

/// Load and validate an endpoint config file
pub fn load_config(path: impl AsRef<Path>) -> Result<PagerConfig> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => Error::FileNotFound {
            path: path.display().to_string(),
        },
        _ => Error::from(e),
    })?;
    load_config_from_str(&content)
}

/// Parse and validate an endpoint config from YAML or JSON text
pub fn load_config_from_str(text: &str) -> Result<PagerConfig> {
    let config: PagerConfig = serde_yaml::from_str(text)?;
    config.validate()?;
    Ok(config)
}

impl PagerConfig {
    /// Config for `base_url` with every other setting at its default
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            method: Method::default(),
            cursor_param: default_cursor_param(),
            cursor_mode: CursorMode::default(),
            page_size_param: None,
            page_size: None,
            query: HashMap::new(),
            headers: HashMap::new(),
            records_path: None,
            next_cursor_path: None,
            stop_on_empty: false,
            http: HttpSettings::default(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.base_url.trim().is_empty() {
            return Err(Error::missing_field("base_url"));
        }
        url::Url::parse(&self.base_url)
            .map_err(|e| Error::invalid_value("base_url", e.to_string()))?;

        if self.cursor_mode == CursorMode::Query && self.cursor_param.trim().is_empty() {
            return Err(Error::invalid_value(
                "cursor_param",
                "required when cursor_mode is query",
            ));
        }

        match (&self.page_size_param, self.page_size) {
            (Some(_), None) => return Err(Error::missing_field("page_size")),
            (None, Some(_)) => return Err(Error::missing_field("page_size_param")),
            (Some(_), Some(0)) => {
                return Err(Error::invalid_value("page_size", "must be greater than 0"))
            }
            _ => {}
        }

        if self.http.max_backoff_ms < self.http.initial_backoff_ms {
            return Err(Error::invalid_value(
                "http.max_backoff_ms",
                "must not be less than initial_backoff_ms",
            ));
        }

        if let Some(limit) = &self.http.rate_limit {
            if limit.requests_per_second == 0 {
                return Err(Error::invalid_value(
                    "http.rate_limit.requests_per_second",
                    "must be greater than 0",
                ));
            }
            if limit.burst_size == 0 {
                return Err(Error::invalid_value(
                    "http.rate_limit.burst_size",
                    "must be greater than 0",
                ));
            }
        }

        Ok(())
    }

    /// HTTP client settings; requests carry absolute URLs so no base URL is set
    pub fn to_client_config(&self) -> ReqwestClientConfig {
        let mut builder = ReqwestClientConfig::builder()
            .timeout(Duration::from_secs(self.http.timeout_secs))
            .max_retries(self.http.max_retries)
            .backoff(
                self.http.backoff,
                Duration::from_millis(self.http.initial_backoff_ms),
                Duration::from_millis(self.http.max_backoff_ms),
            );

        builder = match &self.http.rate_limit {
            Some(limit) => builder.rate_limit(limit.clone()),
            None => builder.no_rate_limit(),
        };
        if let Some(agent) = &self.http.user_agent {
            builder = builder.user_agent(agent.clone());
        }

        builder.build()
    }

    pub fn request_factory(&self) -> CursorRequestFactory {
        let mut factory = match self.cursor_mode {
            CursorMode::Query => {
                CursorRequestFactory::new(self.base_url.clone(), self.cursor_param.clone())
            }
            CursorMode::Url => CursorRequestFactory::next_url(self.base_url.clone()),
        }
        .with_method(self.method);

        if let (Some(param), Some(size)) = (&self.page_size_param, self.page_size) {
            factory = factory.with_page_size(param.clone(), size);
        }
        for (key, value) in &self.query {
            factory = factory.with_query(key.clone(), value.clone());
        }
        for (key, value) in &self.headers {
            factory = factory.with_header(key.clone(), value.clone());
        }

        factory
    }

    pub fn page_parser<T>(&self) -> JsonPageParser<T> {
        let mut parser = JsonPageParser::new().stop_on_empty(self.stop_on_empty);
        if let Some(path) = &self.records_path {
            parser = parser.with_records_path(path.clone());
        }
        if let Some(path) = &self.next_cursor_path {
            parser = parser.with_next_cursor_path(path.clone());
        }
        parser
    }

    /// Build a collection over this endpoint, requesting the first page.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn collection<T>(&self) -> Result<PagedCollection<T>>
    where
        T: DeserializeOwned + Clone + Send + Sync + 'static,
    {
        let client = ReqwestClient::with_config(self.to_client_config())?;
        Ok(PagedCollection::new(
            client,
            self.request_factory(),
            self.page_parser::<T>(),
        ))
    }
}
