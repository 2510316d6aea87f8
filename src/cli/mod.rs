//! CLI module
//!
//! This module defines the command-line interface using clap and implements
//! the command execution logic.

use crate::config::API_KEY_ENV;
use crate::{Config, Error, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

pub mod commands;
pub mod output;

/// Wallet flow visualizer CLI
#[derive(Parser, Debug)]
#[command(name = "wallet-flow-viz")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Log level (overrides config)
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Data source selection shared by commands that hit a provider
#[derive(clap::Args, Debug, Clone, Default)]
pub struct SourceArgs {
    /// Data source type (defaults to the config file's choice)
    #[arg(short, long, value_enum)]
    pub source: Option<DataSourceType>,

    /// Provider API key (overrides config)
    #[arg(long, env = API_KEY_ENV, hide_env_values = true)]
    pub api_key: Option<String>,

    /// Fixture file for the mock source (overrides config)
    #[arg(long)]
    pub fixtures: Option<PathBuf>,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Trace fund flows from an address
    Trace {
        /// Origin wallet address
        #[arg(short, long)]
        address: String,

        /// Number of breadth-first waves to expand
        #[arg(short, long, value_parser = clap::value_parser!(u32).range(1..))]
        depth: Option<u32>,

        #[command(flatten)]
        source: SourceArgs,

        /// Output format
        #[arg(short, long, value_enum, default_value = "table")]
        output: OutputFormat,

        /// Output file (defaults to stdout, or track_<address>.json for export)
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Prompt for traces repeatedly, keeping the last graph for export
    Interactive {
        #[command(flatten)]
        source: SourceArgs,
    },

    /// Render a previously exported vertex map without network access
    Inspect {
        /// Exported JSON file
        file: PathBuf,

        /// Output format
        #[arg(short, long, value_enum, default_value = "table")]
        output: OutputFormat,
    },
}

/// Data source types
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum DataSourceType {
    /// Fixture data from a JSON file
    Mock,
    /// Blockbook-compatible REST API
    Blockbook,
}

impl DataSourceType {
    /// Resolve the CLI choice, falling back to the config file
    pub fn resolve(choice: Option<Self>, config: &Config) -> Result<Self> {
        match choice {
            Some(source) => Ok(source),
            None => <Self as ValueEnum>::from_str(&config.default.source, true).map_err(|_| {
                Error::Config(format!(
                    "Unknown data source {:?} in config file",
                    config.default.source
                ))
            }),
        }
    }
}

/// Output format types
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Graph model (nodes and edges) as JSON
    Json,
    /// DOT format (Graphviz)
    Dot,
    /// Plain text table
    Table,
    /// Raw vertex map as JSON, keyed by address
    Export,
}

/// Execute the CLI command
pub async fn execute(args: Cli, config: Config) -> Result<()> {
    match args.command {
        Commands::Trace { .. } => commands::trace::execute(args, config).await,
        Commands::Interactive { .. } => commands::interactive::execute(args, config).await,
        Commands::Inspect { file, output } => commands::inspect::execute(file, output),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parsing() {
        let cli = Cli::try_parse_from([
            "wallet-flow-viz",
            "trace",
            "--address",
            "bc1qxyz",
            "--depth",
            "2",
            "--source",
            "mock",
            "--output",
            "dot",
        ])
        .unwrap();

        match cli.command {
            Commands::Trace {
                address,
                depth,
                source,
                output,
                ..
            } => {
                assert_eq!(address, "bc1qxyz");
                assert_eq!(depth, Some(2));
                assert_eq!(source.source, Some(DataSourceType::Mock));
                assert_eq!(output, OutputFormat::Dot);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_zero_depth_rejected() {
        let cli = Cli::try_parse_from([
            "wallet-flow-viz",
            "trace",
            "--address",
            "bc1qxyz",
            "--depth",
            "0",
        ]);
        assert!(cli.is_err());
    }

    #[test]
    fn test_inspect_parsing() {
        let cli =
            Cli::try_parse_from(["wallet-flow-viz", "inspect", "track.json", "-o", "json"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Inspect {
                output: OutputFormat::Json,
                ..
            }
        ));
    }

    #[test]
    fn test_source_resolution() {
        let mut config = Config::default();
        assert_eq!(
            DataSourceType::resolve(None, &config).unwrap(),
            DataSourceType::Blockbook
        );
        assert_eq!(
            DataSourceType::resolve(Some(DataSourceType::Mock), &config).unwrap(),
            DataSourceType::Mock
        );

        config.default.source = "carrier-pigeon".to_string();
        assert!(DataSourceType::resolve(None, &config).is_err());
    }
}
