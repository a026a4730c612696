//! Interactive chat command on top of the agent graph.

use super::resolve_provider;
use crate::agent::{Agent, AgentResponse};
use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::error::Result;
use crate::llm::Message;
use console::style;
use std::io::{self, BufRead, Write};
use tracing::debug;

/// Messages kept between turns; older turns are dropped whole.
const MAX_HISTORY: usize = 40;

/// Run the interactive chat command.
pub async fn run_chat(
    provider: Option<String>,
    model: Option<String>,
    settings: Settings,
) -> anyhow::Result<()> {
    let provider = resolve_provider(provider.as_deref(), &settings)?;

    // Pre-flight checks
    if let Err(e) = preflight::check(Operation::Ask(provider), &settings) {
        Output::error(&format!("{}", e));
        Output::info("Run 'sleuth doctor' for detailed diagnostics.");
        return Err(e.into());
    }

    let agent = Agent::new(provider, &settings, model.as_deref())?;
    let mut chat = ChatSession::new(agent);

    println!("\n{}", style("Sleuth Chat").bold().cyan());
    println!(
        "{}\n",
        style("Type your questions, or 'exit' to quit. Use 'clear' to reset conversation.").dim()
    );

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        print!("{} ", style("You:").green().bold());
        stdout.flush()?;

        let mut input = String::new();
        if stdin.lock().read_line(&mut input)? == 0 {
            break;
        }

        let input = input.trim();

        if input.is_empty() {
            continue;
        }

        if input.eq_ignore_ascii_case("exit") || input.eq_ignore_ascii_case("quit") {
            Output::info("Goodbye!");
            break;
        }

        if input.eq_ignore_ascii_case("clear") {
            chat.clear_history();
            Output::info("Conversation history cleared.");
            continue;
        }

        let spinner = Output::spinner("Thinking...");
        let result = chat.send_message(input).await;
        spinner.finish_and_clear();

        match result {
            Ok(response) => {
                for record in &response.tool_calls {
                    println!("{}", style(format!("  [{}]", record.name)).dim());
                }
                println!("\n{} {}\n", style("Sleuth:").cyan().bold(), response.content);
            }
            Err(e) => {
                Output::error(&format!("Error: {}", e));
            }
        }
    }

    Ok(())
}

/// Conversation carried across agent runs.
struct ChatSession {
    agent: Agent,
    messages: Vec<Message>,
}

impl ChatSession {
    fn new(agent: Agent) -> Self {
        Self {
            agent,
            messages: Vec::new(),
        }
    }

    fn clear_history(&mut self) {
        self.messages.clear();
    }

    /// Send a message and return the agent's response, keeping the history.
    async fn send_message(&mut self, user_input: &str) -> Result<AgentResponse> {
        let mut messages = self.messages.clone();
        messages.push(Message::human(user_input));

        let response = self.agent.run_messages(messages).await?;
        self.messages = response.messages.clone();
        trim_history(&mut self.messages, MAX_HISTORY);

        debug!("Chat history at {} message(s)", self.messages.len());
        Ok(response)
    }
}

/// Drop the oldest turns so at most `max` messages remain, cutting only before a human message.
fn trim_history(messages: &mut Vec<Message>, max: usize) {
    messages.retain(|m| !m.is_system());
    if messages.len() <= max {
        return;
    }

    let earliest = messages.len() - max;
    let cut = messages
        .iter()
        .enumerate()
        .skip(earliest)
        .find(|(_, m)| matches!(m, Message::Human { .. }))
        .map(|(i, _)| i)
        .unwrap_or(messages.len());
    messages.drain(..cut);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::ToolInvocation;

    fn turn(question: &str) -> Vec<Message> {
        vec![
            Message::human(question),
            Message::Assistant {
                content: None,
                tool_calls: vec![ToolInvocation {
                    id: format!("id-{}", question),
                    name: "wiki_search".to_string(),
                    arguments: "{}".to_string(),
                }],
            },
            Message::Tool {
                tool_call_id: format!("id-{}", question),
                name: "wiki_search".to_string(),
                content: "result".to_string(),
            },
            Message::assistant("answer"),
        ]
    }

    #[test]
    fn test_trim_history_keeps_whole_turns() {
        let mut messages = vec![Message::system("prompt")];
        for q in ["a", "b", "c"] {
            messages.extend(turn(q));
        }

        trim_history(&mut messages, 6);
        assert_eq!(messages.len(), 4);
        assert_eq!(messages[0], Message::human("c"));
    }

    #[test]
    fn test_trim_history_drops_system_prompt() {
        let mut messages = vec![Message::system("prompt")];
        messages.extend(turn("a"));

        trim_history(&mut messages, MAX_HISTORY);
        assert_eq!(messages.len(), 4);
        assert!(!messages.iter().any(|m| m.is_system()));
    }
}
