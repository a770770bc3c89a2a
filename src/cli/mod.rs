//! CLI module
//!
//! Command-line interface for walking a paginated endpoint.
//!
//! # Commands
//!
//! - `fetch` - Stream records from the endpoint, page by page
//! - `validate` - Check an endpoint config file

mod commands;
mod runner;

pub use commands::{Cli, Commands, OutputFormat};
pub use runner::Runner;
