//! Ask command implementation.

use super::resolve_provider;
use crate::agent::{format_question, Agent};
use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use anyhow::Result;

/// Options for a single agent run.
#[derive(Debug, Default)]
pub struct AskOptions {
    pub provider: Option<String>,
    pub model: Option<String>,
    pub task_id: Option<String>,
    pub file_name: Option<String>,
    pub show_tools: bool,
    pub answer_only: bool,
}

/// Run the ask command.
pub async fn run_ask(question: &str, options: AskOptions, settings: Settings) -> Result<()> {
    let provider = resolve_provider(options.provider.as_deref(), &settings)?;

    // Pre-flight checks
    if let Err(e) = preflight::check(Operation::Ask(provider), &settings) {
        Output::error(&format!("{}", e));
        Output::info("Run 'sleuth doctor' for detailed diagnostics.");
        return Err(e.into());
    }

    let agent = Agent::new(provider, &settings, options.model.as_deref())?;
    let question = format_question(
        question,
        options.task_id.as_deref(),
        options.file_name.as_deref(),
    );

    let spinner = Output::spinner("Thinking...");
    let result = agent.run(&question).await;
    spinner.finish_and_clear();

    let response = match result {
        Ok(response) => response,
        Err(e) => {
            Output::error(&format!("Agent run failed: {}", e));
            return Err(e.into());
        }
    };

    if options.show_tools && !response.tool_calls.is_empty() {
        Output::header(&format!("Tool calls ({})", response.tool_calls.len()));
        for record in &response.tool_calls {
            Output::tool_call(record);
        }
        println!();
    }

    if options.answer_only {
        println!("{}", response.final_answer());
    } else {
        println!("\n{}\n", response.content);
    }

    Ok(())
}
