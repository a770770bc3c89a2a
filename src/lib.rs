// Allow common clippy pedantic lints that aren't critical for this codebase
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::unused_self)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::needless_pass_by_value)]

//! # Tethys Pager
//!
//! Lazily-paginated, network-backed collections for cursor-paginated HTTP
//! APIs.
//!
//! ## Features
//!
//! - **Random access over pages**: index into a remote list; pages load on demand
//! - **Prefetching**: the next page is requested once access reaches 75% of the buffer
//! - **Single flight**: at most one page request in flight, pages appended in order
//! - **HTTP client**: retries, backoff and token-bucket rate limiting
//! - **YAML endpoints**: describe an API once, walk it from code or the CLI
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use tethys_pager::{load_config, Result};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let config = load_config("endpoints/items.yaml")?;
//!     let items = config.collection::<serde_json::Value>()?;
//!
//!     // Waits for the first page
//!     let first = items.get(0).await?;
//!
//!     // Loads the remaining pages as iteration advances
//!     let everything = items.collect_all().await?;
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                  PagedCollection<T, Tok>                        │
//! │  get(i)  lookup(i)  get_buffered(i)  stream()  progress()       │
//! └─────────────────────────────────────────────────────────────────┘
//!                                │
//! ┌────────────────┬─────────────┴──────┬────────────┬─────────────┐
//! │ RequestFactory │     HttpClient     │ PageParser │  Publisher  │
//! ├────────────────┼────────────────────┼────────────┼─────────────┤
//! │ Cursor query   │ reqwest            │ JSON path  │ watch-based │
//! │ Next URL       │ Retry / Backoff    │ JSONPath   │ progress    │
//! │ Closures       │ Rate limit         │ Closures   │             │
//! └────────────────┴────────────────────┴────────────┴─────────────┘
//! ```

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::doc_markdown)]

// ============================================================================
// Module declarations
// ============================================================================

/// Error types
pub mod error;

/// Common types and type aliases
pub mod types;

/// Insertion-ordered map
pub mod ordered_map;

/// Latest-value publisher and subscriptions
pub mod publisher;

/// HTTP client with retry and rate limiting
pub mod http;

/// Paged collection and paging strategies
pub mod pagination;

/// Endpoint configuration
pub mod config;

/// Command-line interface
pub mod cli;

// ============================================================================
// Re-exports
// ============================================================================

pub use error::{Error, NetworkError, Result};
pub use types::*;

// Re-export commonly used types
pub use config::{load_config, load_config_from_str, PagerConfig};
pub use pagination::{PagedCollection, PagedIndex};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
