//! CLI argument definitions for universal-connector

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use universal_connector::{ConvertCommand, DEFAULT_SERVER_ID};

/// Conversion target
#[derive(clap::ValueEnum, Clone, Copy, Debug)]
pub(crate) enum Target {
    Html,
    Markdown,
}

impl From<Target> for ConvertCommand {
    fn from(target: Target) -> Self {
        match target {
            Target::Html => ConvertCommand::ToHtml,
            Target::Markdown => ConvertCommand::ToMarkdown,
        }
    }
}

#[derive(clap::ValueEnum, Clone, Copy, Debug, Default)]
pub(crate) enum ConfigFormat {
    #[default]
    Json,
    Yaml,
    Toml,
}

#[derive(Parser, Debug)]
#[command(name = "universal-connector")]
#[command(about = "Forward document conversions to the Universal Language Connector server", long_about = None)]
#[command(version)]
pub(crate) struct Args {
    #[command(subcommand)]
    pub(crate) command: Command,

    /// Path to configuration file (discovered from the document's directory otherwise)
    #[arg(short, long, global = true)]
    pub(crate) config: Option<PathBuf>,

    /// Server id sessions are registered under
    #[arg(long, default_value = DEFAULT_SERVER_ID, global = true)]
    pub(crate) server_id: String,

    /// Log protocol traffic to stderr
    #[arg(short, long, global = true)]
    pub(crate) verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub(crate) no_color: bool,
}

#[derive(Subcommand, Debug)]
pub(crate) enum Command {
    /// Convert a document through the language server
    Convert {
        /// Target format
        #[arg(short, long, value_enum)]
        to: Target,

        /// Document to convert
        file: PathBuf,

        /// Write the converted document here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// List the conversion commands the editor exposes
    Commands,

    /// Print the effective server configuration
    Config {
        /// Output format
        #[arg(short, long, value_enum, default_value = "json")]
        format: ConfigFormat,
    },
}
