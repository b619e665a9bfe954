//! Parley CLI entry point.
//!
//! Binary name: `parley`
//!
//! Parses CLI arguments, loads configuration and the data directory, then
//! dispatches to the command handler.

mod cli;
mod state;

use clap::Parser;
use clap_complete::generate;

use cli::input::{file_or_stdin, text_or_stdin};
use cli::summarize::SummaryInput;
use cli::{Cli, Commands};
use parley_observe::tracing_setup::{TracingOptions, init_tracing, shutdown_tracing};
use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    init_tracing(&TracingOptions {
        verbosity: cli.verbose,
        quiet: cli.quiet,
        json: cli.log_json,
        otel: cli.otel,
    })
    .map_err(|e| anyhow::anyhow!(e))?;

    // Shell completions don't need app state
    if let Commands::Completions { shell } = &cli.command {
        let mut cmd = <Cli as clap::CommandFactory>::command();
        generate(*shell, &mut cmd, "parley", &mut std::io::stdout());
        return Ok(());
    }

    let result = dispatch(cli).await;
    shutdown_tracing();
    result
}

async fn dispatch(cli: Cli) -> anyhow::Result<()> {
    let state = AppState::init().await?;

    match cli.command {
        Commands::Chat { message } => {
            let message = text_or_stdin(message).await?;
            cli::chat::run(&state, message, false, cli.json).await?;
        }

        Commands::Review { file } => {
            let code = file_or_stdin(file).await?;
            cli::chat::run(&state, code, true, cli.json).await?;
        }

        Commands::Summarize { text, urls } => {
            let input = if urls.is_empty() {
                SummaryInput::Text(text_or_stdin(text).await?)
            } else {
                SummaryInput::Urls(urls)
            };
            cli::summarize::run(&state, input, cli.json).await?;
        }

        Commands::History { action } => {
            cli::history::history(&state, action, cli.json).await?;
        }

        Commands::Log { action } => {
            cli::history::log(&state, action).await?;
        }

        Commands::Config => {
            cli::history::config(&state, cli.json)?;
        }

        // Handled before state init
        Commands::Completions { .. } => {}
    }

    Ok(())
}
