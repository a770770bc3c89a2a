//! HTTP module
//!
//! The paged collection talks to the network through the [`HttpClient`]
//! trait, which hands back a future per request. [`ReqwestClient`] is the
//! production implementation.
//!
//! # Features
//!
//! - **Automatic Retries**: Configurable retry logic with backoff
//! - **Rate Limiting**: Token bucket rate limiter using governor
//! - **Backoff Strategies**: Constant, linear, and exponential backoff
//! - **Transport Classification**: Failures mapped onto `NetworkError`

mod client;
mod rate_limit;
mod types;

pub use client::{ReqwestClient, ReqwestClientConfig, ReqwestClientConfigBuilder};
pub use rate_limit::{RateLimiter, RateLimiterConfig};
pub use types::{HttpClient, HttpRequest, HttpResponse, RequestConfig};

#[cfg(test)]
mod tests;
