//! CLI runner - executes commands

use crate::cli::commands::{Cli, Commands, OutputFormat};
use crate::config::{load_config, PagerConfig};
use crate::error::{Error, Result};
use crate::pagination::{CursorMode, PagedIndex};
use futures::StreamExt;
use serde_json::{json, Value};
use std::io::Write;
use std::time::Instant;
use tracing::{debug, info};

/// What a `fetch` run produced
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchSummary {
    pub records: usize,
    pub requests: usize,
    pub end: PagedIndex,
}

/// CLI runner
pub struct Runner {
    cli: Cli,
}

impl Runner {
    /// Create a new runner
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Run the CLI command
    pub async fn run(&self) -> Result<()> {
        match &self.cli.command {
            Commands::Fetch { limit } => {
                let started = Instant::now();
                let stdout = std::io::stdout();
                let summary = self.fetch(&mut stdout.lock(), *limit).await?;
                eprintln!(
                    "Fetched {} records with {} requests in {:.2?} (end: {})",
                    summary.records,
                    summary.requests,
                    started.elapsed(),
                    summary.end
                );
                Ok(())
            }
            Commands::Validate => self.validate(),
        }
    }

    /// Load endpoint config
    fn load_config(&self) -> Result<PagerConfig> {
        let path = self
            .cli
            .config
            .as_ref()
            .ok_or_else(|| Error::config("Config file not specified (use -C flag)"))?;
        load_config(path)
    }

    /// Write records to `out` as the collection loads them
    async fn fetch<W: Write>(&self, out: &mut W, limit: Option<usize>) -> Result<FetchSummary> {
        let config = self.load_config()?;
        let collection = config.collection::<Value>()?;

        let watcher = collection.progress().then(|progress| {
            debug!(
                loaded = progress.loaded,
                end = %progress.end,
                fetching = progress.fetching,
                "Load progress"
            );
        });

        let mut records = std::pin::pin!(collection.stream());
        let mut written = 0;
        while limit.map_or(true, |max| written < max) {
            let Some(record) = records.next().await else {
                break;
            };
            self.write_record(out, &record?)?;
            written += 1;
        }
        watcher.abort();

        let summary = FetchSummary {
            records: written,
            requests: collection.requests_issued().len(),
            end: collection.end_index(),
        };
        info!(
            records = summary.records,
            requests = summary.requests,
            "Fetch finished"
        );
        Ok(summary)
    }

    /// Validate endpoint config
    fn validate(&self) -> Result<()> {
        let config = self.load_config()?;

        let mode = match config.cursor_mode {
            CursorMode::Query => format!("cursor in '{}'", config.cursor_param),
            CursorMode::Url => "cursor is next URL".to_string(),
        };
        let page_size = config
            .page_size
            .map_or_else(|| "server default".to_string(), |size| size.to_string());

        self.write_record(
            &mut std::io::stdout().lock(),
            &json!({
                "type": "LOG",
                "log": {
                    "level": "INFO",
                    "message": format!(
                        "Endpoint '{}' is valid ({mode}, page size {page_size})",
                        config.base_url
                    )
                }
            }),
        )
    }

    /// Output a record
    fn write_record<W: Write>(&self, out: &mut W, record: &Value) -> Result<()> {
        let line = match self.cli.format {
            OutputFormat::Json => serde_json::to_string(record)?,
            OutputFormat::Pretty => serde_json::to_string_pretty(record)?,
        };
        writeln!(out, "{line}")?;
        Ok(())
    }
}
