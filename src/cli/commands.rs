//! CLI commands and argument parsing

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Tethys pager CLI
#[derive(Parser, Debug)]
#[command(name = "tethys-pager")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Endpoint config file (YAML or JSON)
    #[arg(short = 'C', long, global = true)]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(short, long, global = true, default_value = "json")]
    pub format: OutputFormat,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Fetch records, loading pages as the output advances
    Fetch {
        /// Stop after this many records
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Validate the endpoint config
    Validate,
}

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output (one record per line)
    Json,
    /// Indented JSON
    Pretty,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_fetch() {
        let cli = Cli::try_parse_from([
            "tethys-pager",
            "--config",
            "items.yaml",
            "fetch",
            "--limit",
            "25",
            "--format",
            "pretty",
        ])
        .unwrap();

        assert_eq!(cli.config, Some(PathBuf::from("items.yaml")));
        assert_eq!(cli.format, OutputFormat::Pretty);
        assert!(!cli.verbose);
        assert!(matches!(cli.command, Commands::Fetch { limit: Some(25) }));
    }

    #[test]
    fn test_parse_validate_defaults() {
        let cli = Cli::try_parse_from(["tethys-pager", "validate", "-v"]).unwrap();

        assert!(cli.config.is_none());
        assert_eq!(cli.format, OutputFormat::Json);
        assert!(cli.verbose);
        assert!(matches!(cli.command, Commands::Validate));
    }

    #[test]
    fn test_rejects_unknown_format() {
        assert!(Cli::try_parse_from(["tethys-pager", "fetch", "--format", "parquet"]).is_err());
    }
}
