//! Pagination types and traits
//!
//! Defines the strategy traits a [`PagedCollection`](super::PagedCollection)
//! is built from, and the values it reports.

use super::index::PagedIndex;
use crate::error::{Error, Result};
use crate::http::HttpRequest;

/// Fraction of the buffer that must be reached before the next page is
/// requested, as `NUMERATOR / DENOMINATOR`.
const PREFETCH_NUMERATOR: usize = 3;
const PREFETCH_DENOMINATOR: usize = 4;

/// First index whose access prefetches the next page, for a buffer of
/// `buffered` items: `floor(buffered * 3 / 4)`.
pub const fn prefetch_threshold(buffered: usize) -> usize {
    buffered * PREFETCH_NUMERATOR / PREFETCH_DENOMINATOR
}

/// One parsed page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T, Tok> {
    pub items: Vec<T>,
    /// Token of the following page; `None` on the last page
    pub next_token: Option<Tok>,
}

impl<T, Tok> Page<T, Tok> {
    pub fn new(items: Vec<T>, next_token: Option<Tok>) -> Self {
        Self { items, next_token }
    }

    /// A page with no successor
    pub fn last(items: Vec<T>) -> Self {
        Self::new(items, None)
    }
}

/// Where the next fetch starts from
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum PageCursor<Tok> {
    /// Nothing loaded yet; the next request asks for the first page
    #[default]
    First,
    /// The next page is identified by this token
    Next(Tok),
    /// The source reported that no pages remain
    Exhausted,
}

impl<Tok> PageCursor<Tok> {
    pub fn is_exhausted(&self) -> bool {
        matches!(self, Self::Exhausted)
    }

    /// Token to request, or `None` when exhausted.
    ///
    /// The outer option is "can request"; the inner one is the token
    /// (`None` meaning the first page).
    pub fn request_token(&self) -> Option<Option<&Tok>> {
        match self {
            Self::First => Some(None),
            Self::Next(token) => Some(Some(token)),
            Self::Exhausted => None,
        }
    }
}

/// Outcome of a page request, as recorded in the collection's ledger
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchStatus {
    Pending,
    Completed { items: usize },
    Failed,
}

/// Snapshot of a collection's loading state
#[derive(Debug, Clone, PartialEq)]
pub struct LoadProgress {
    /// Items buffered so far
    pub loaded: usize,
    pub end: PagedIndex,
    /// Whether a fetch is in flight
    pub fetching: bool,
    /// Fetches that have finished, successfully or not
    pub fetches_completed: u64,
    /// Error of the most recent fetch, cleared by the next success
    pub last_error: Option<Error>,
}

impl Default for LoadProgress {
    fn default() -> Self {
        Self {
            loaded: 0,
            end: PagedIndex::indefinite(0),
            fetching: false,
            fetches_completed: 0,
            last_error: None,
        }
    }
}

/// Builds the request for a page.
///
/// `token` is `None` for the first page.
pub trait RequestFactory<Tok>: Send + Sync {
    fn build(&self, token: Option<&Tok>) -> HttpRequest;
}

impl<Tok, F> RequestFactory<Tok> for F
where
    F: Fn(Option<&Tok>) -> HttpRequest + Send + Sync,
{
    fn build(&self, token: Option<&Tok>) -> HttpRequest {
        self(token)
    }
}

/// Parses a response body into a page of items.
pub trait PageParser<T, Tok>: Send + Sync {
    fn parse(&self, body: &[u8]) -> Result<Page<T, Tok>>;
}

impl<T, Tok, F> PageParser<T, Tok> for F
where
    F: Fn(&[u8]) -> Result<Page<T, Tok>> + Send + Sync,
{
    fn parse(&self, body: &[u8]) -> Result<Page<T, Tok>> {
        self(body)
    }
}
