//! Ready-made request factories and page parsers
//!
//! These cover the usual shape of a cursor-paginated JSON API: the cursor
//! travels in a query parameter (or is the next page URL itself) and the
//! records sit in an array somewhere in the response body.

use super::types::{Page, PageParser, RequestFactory};
use crate::error::{Error, Result};
use crate::http::HttpRequest;
use crate::types::{Method, OptionStringExt};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::marker::PhantomData;

// ============================================================================
// Cursor Request Factory
// ============================================================================

/// How the page token is put into the request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CursorMode {
    /// `?<cursor_param>=<token>` on the base URL
    #[default]
    Query,
    /// The token is the URL of the next page
    Url,
}

/// Builds page requests against one endpoint (e.g. Stripe, Slack, GitHub)
///
/// Common patterns:
/// - `?cursor=abc123`
/// - `?starting_after=obj_123&limit=50`
/// - `{ "next": "https://api.example.com/items?page=2" }` with [`CursorMode::Url`]
#[derive(Debug, Clone)]
pub struct CursorRequestFactory {
    base_url: String,
    method: Method,
    cursor_param: String,
    mode: CursorMode,
    page_size: Option<(String, u32)>,
    query: HashMap<String, String>,
    headers: HashMap<String, String>,
}

impl CursorRequestFactory {
    /// Cursor passed as a query parameter
    pub fn new(base_url: impl Into<String>, cursor_param: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            method: Method::GET,
            cursor_param: cursor_param.into(),
            mode: CursorMode::Query,
            page_size: None,
            query: HashMap::new(),
            headers: HashMap::new(),
        }
    }

    /// Cursor used as the next page URL
    pub fn next_url(base_url: impl Into<String>) -> Self {
        Self {
            mode: CursorMode::Url,
            ..Self::new(base_url, "")
        }
    }

    #[must_use]
    pub fn with_method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    /// Send `param=size` with every page request built from the base URL
    #[must_use]
    pub fn with_page_size(mut self, param: impl Into<String>, size: u32) -> Self {
        self.page_size = Some((param.into(), size));
        self
    }

    #[must_use]
    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.insert(key.into(), value.into());
        self
    }

    #[must_use]
    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    pub fn mode(&self) -> CursorMode {
        self.mode
    }
}

impl RequestFactory<String> for CursorRequestFactory {
    fn build(&self, token: Option<&String>) -> HttpRequest {
        let mut request = match (self.mode, token) {
            // The next URL already carries its own query string
            (CursorMode::Url, Some(next)) => HttpRequest::new(self.method, next.as_str()),
            _ => {
                let mut request = HttpRequest::new(self.method, self.base_url.as_str());
                request.config.query = self.query.clone();
                if let Some((param, size)) = &self.page_size {
                    request.config.query.insert(param.clone(), size.to_string());
                }
                if let (CursorMode::Query, Some(token)) = (self.mode, token) {
                    request
                        .config
                        .query
                        .insert(self.cursor_param.clone(), token.clone());
                }
                request
            }
        };
        request.config.headers = self.headers.clone();
        request
    }
}

// ============================================================================
// JSON Page Parser
// ============================================================================

/// Parses JSON bodies into pages of `T`
///
/// Records are located with a dot path (`data`, `result.items`,
/// `pages[0].entries`) or a wildcard JSONPath (`$.data[*]`). The next
/// cursor is read from a scalar field; a missing, null or empty value ends
/// pagination.
#[derive(Debug, Clone)]
pub struct JsonPageParser<T> {
    records_path: Option<String>,
    next_cursor_path: Option<String>,
    stop_on_empty: bool,
    _records: PhantomData<fn() -> T>,
}

impl<T> Default for JsonPageParser<T> {
    fn default() -> Self {
        Self {
            records_path: None,
            next_cursor_path: None,
            stop_on_empty: false,
            _records: PhantomData,
        }
    }
}

impl<T> JsonPageParser<T> {
    /// Treats the whole body as the record list, with no next page
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_records_path(mut self, path: impl Into<String>) -> Self {
        self.records_path = Some(path.into());
        self
    }

    #[must_use]
    pub fn with_next_cursor_path(mut self, path: impl Into<String>) -> Self {
        self.next_cursor_path = Some(path.into());
        self
    }

    /// End pagination on an empty page even if a cursor is present
    #[must_use]
    pub fn stop_on_empty(mut self, stop: bool) -> Self {
        self.stop_on_empty = stop;
        self
    }

    fn extract_records(&self, value: &Value) -> Result<Vec<Value>> {
        match &self.records_path {
            Some(path) => {
                if path.contains('*') && !path.contains("[-") {
                    extract_with_jsonpath(value, path)
                } else {
                    match extract_simple_path(value, path) {
                        Some(Value::Array(arr)) => Ok(arr),
                        Some(Value::Null) | None => Ok(vec![]),
                        Some(v) => Ok(vec![v]),
                    }
                }
            }
            None => match value {
                Value::Array(arr) => Ok(arr.clone()),
                Value::Null => Ok(vec![]),
                _ => Ok(vec![value.clone()]),
            },
        }
    }
}

impl<T: DeserializeOwned> PageParser<T, String> for JsonPageParser<T> {
    fn parse(&self, body: &[u8]) -> Result<Page<T, String>> {
        let value: Value = serde_json::from_slice(body)
            .map_err(|e| Error::parse(format!("Failed to parse JSON: {e}")))?;

        let items = self
            .extract_records(&value)?
            .into_iter()
            .enumerate()
            .map(|(i, record)| {
                serde_json::from_value(record)
                    .map_err(|e| Error::parse(format!("Record {i} has unexpected shape: {e}")))
            })
            .collect::<Result<Vec<T>>>()?;

        let mut next_token = self
            .next_cursor_path
            .as_deref()
            .and_then(|path| extract_scalar(&value, path))
            .none_if_empty();

        if self.stop_on_empty && items.is_empty() {
            next_token = None;
        }

        Ok(Page::new(items, next_token))
    }
}

/// Read a scalar at a dot path as a string
fn extract_scalar(value: &Value, path: &str) -> Option<String> {
    match extract_simple_path(value, path)? {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Dot-notation path with optional array indexing (`items[0]`, `items[-1]`)
fn extract_simple_path(value: &Value, path: &str) -> Option<Value> {
    let path = path.strip_prefix("$.").unwrap_or(path);
    if path.is_empty() || path == "$" {
        return Some(value.clone());
    }

    let mut current = value;
    for part in path.split('.') {
        if let Some(bracket_pos) = part.find('[') {
            let name = &part[..bracket_pos];
            let index_str = part[bracket_pos + 1..].strip_suffix(']')?;

            if !name.is_empty() {
                current = current.get(name)?;
            }

            if index_str == "*" {
                return Some(current.clone());
            }
            let index = index_str.parse::<i64>().ok()?;
            let Value::Array(arr) = current else {
                return None;
            };
            #[allow(clippy::cast_possible_wrap)]
            let idx = if index < 0 {
                arr.len() as i64 + index
            } else {
                index
            };
            current = arr.get(usize::try_from(idx).ok()?)?;
        } else {
            current = current.get(part)?;
        }
    }

    Some(current.clone())
}

/// Extract records using jsonpath-rust
fn extract_with_jsonpath(value: &Value, path: &str) -> Result<Vec<Value>> {
    use jsonpath_rust::JsonPath;

    let jp = JsonPath::try_from(path).map_err(|e| Error::JsonPath {
        message: format!("Invalid JSONPath: {e}"),
    })?;

    match jp.find(value) {
        Value::Array(arr) => Ok(arr),
        Value::Null => Ok(vec![]),
        other => Ok(vec![other]),
    }
}
