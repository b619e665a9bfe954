//! CLI command definitions for the `parley` binary.
//!
//! Each workflow command runs on a background task and reports back over a
//! channel; the foreground task only renders.

pub mod chat;
pub mod history;
pub mod input;
pub mod render;
pub mod summarize;

use clap::{Parser, Subcommand};
use clap_complete::Shell;

/// Converse with a chat-completion model and summarize web pages.
#[derive(Parser)]
#[command(name = "parley", version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output machine-readable JSON instead of styled text.
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress all output except errors.
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Detailed output (-v for verbose, -vv for debug/trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Write logs as JSON lines.
    #[arg(long, global = true)]
    pub log_json: bool,

    /// Export spans through OpenTelemetry (stdout exporter).
    #[arg(long, global = true, env = "PARLEY_OTEL")]
    pub otel: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Send a message and keep going until the reply is complete.
    Chat {
        /// Message text, or `-` to read stdin.
        message: Option<String>,
    },

    /// Review code. Starts from an empty history and clears it afterwards.
    Review {
        /// File to review, or `-` to read stdin.
        file: Option<String>,
    },

    /// Summarize every URL mentioned in the given text.
    Summarize {
        /// Text containing URLs, or `-` to read stdin.
        text: Option<String>,

        /// Treat the arguments as URLs and skip extraction.
        #[arg(long, num_args = 1..)]
        urls: Vec<String>,
    },

    /// Show or clear the conversation history.
    History {
        #[command(subcommand)]
        action: HistoryCommand,
    },

    /// Show or clear the prompt log.
    Log {
        #[command(subcommand)]
        action: LogCommand,
    },

    /// Print the effective configuration.
    Config,

    /// Generate shell completions.
    Completions {
        /// Shell to generate completions for.
        shell: Shell,
    },
}

#[derive(Subcommand)]
pub enum HistoryCommand {
    /// Print every stored turn.
    Show,
    /// Delete all stored turns.
    Clear,
}

#[derive(Subcommand)]
pub enum LogCommand {
    /// Print the prompt log.
    Show,
    /// Delete the prompt log.
    Clear,
}
