//! `parley history`, `parley log` and `parley config`.

use console::style;

use parley_core::context::{ContextStore, PromptLog};

use super::render;
use super::{HistoryCommand, LogCommand};
use crate::state::AppState;

pub async fn history(state: &AppState, action: HistoryCommand, json: bool) -> anyhow::Result<()> {
    match action {
        HistoryCommand::Show => {
            let context = state.store.load().await;
            if json {
                println!("{}", serde_json::to_string_pretty(&context)?);
            } else if context.is_empty() {
                println!("History not found.");
            } else {
                print!("{}", render::history(&context));
            }
        }
        HistoryCommand::Clear => {
            state.store.clear().await?;
            println!("  {} History cleared.", style("ok").green());
        }
    }
    Ok(())
}

pub async fn log(state: &AppState, action: LogCommand) -> anyhow::Result<()> {
    match action {
        LogCommand::Show => {
            let text = state.prompt_log.read().await?;
            if text.is_empty() {
                println!("Prompt log is empty.");
            } else {
                print!("{text}");
            }
        }
        LogCommand::Clear => {
            state.prompt_log.clear().await?;
            println!("  {} Prompt log cleared.", style("ok").green());
        }
    }
    Ok(())
}

pub fn config(state: &AppState, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(state.config.as_ref())?);
        return Ok(());
    }

    let c = &state.config;
    println!();
    println!("  {} Parley v{}", style("*").cyan().bold(), env!("CARGO_PKG_VERSION"));
    println!();
    let rows: [(&str, String); 13] = [
        ("data dir", state.data_dir.display().to_string()),
        ("model", c.model.clone()),
        ("long message model", c.long_message_model.clone()),
        ("max tokens", c.max_tokens.to_string()),
        ("temperature", c.temperature.to_string()),
        ("language", c.language.clone()),
        ("pivot language", c.pivot_language.clone()),
        ("prior conversation size", c.prior_conversation_size.to_string()),
        ("context history size", c.context_history_size.to_string()),
        ("chunk size", c.chunk_size.to_string()),
        ("model auto select", c.model_auto_select.to_string()),
        ("translate user message", c.translate_user_message.to_string()),
        ("api base url", c.api_base_url.clone()),
    ];
    for (key, value) in rows {
        println!("  {:<24} {}", style(key).dim(), value);
    }
    println!("  {:<24} {}", style("allowed models").dim(), c.allowed_models());
    println!();
    Ok(())
}
