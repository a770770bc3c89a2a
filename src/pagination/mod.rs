//! Pagination module
//!
//! A [`PagedCollection`] exposes a remote, cursor-paginated resource as a
//! random-access collection. Pages are requested on demand and the next
//! page is prefetched once access reaches 75% of the buffered items.
//!
//! # Overview
//!
//! - [`RequestFactory`] turns a page token into an [`HttpRequest`](crate::http::HttpRequest)
//! - [`PageParser`] turns a response body into a [`Page`] of items plus the
//!   next token
//! - [`CursorRequestFactory`] and [`JsonPageParser`] cover the common
//!   "cursor in the query string / records in a JSON array" APIs

mod collection;
mod index;
mod strategies;
mod types;

pub use collection::{PageToken, PagedCollection};
pub use index::PagedIndex;
pub use strategies::{CursorMode, CursorRequestFactory, JsonPageParser};
pub use types::{
    prefetch_threshold, FetchStatus, LoadProgress, Page, PageCursor, PageParser, RequestFactory,
};
