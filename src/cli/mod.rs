//! CLI module for Sleuth.

pub mod commands;
mod output;
pub mod preflight;

pub use output::Output;

use clap::{Parser, Subcommand};

/// Sleuth - a tool-calling research agent
///
/// Answers questions with a language model that can do arithmetic, search the
/// web, Wikipedia and arXiv, download task files, and analyze audio and video.
#[derive(Parser, Debug)]
#[command(name = "sleuth")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v for info, -vv for debug, -vvv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Check API keys and configuration
    Doctor,

    /// Ask the agent a question
    Ask {
        /// The question to ask
        question: String,

        /// Model provider (google or groq)
        #[arg(short, long)]
        provider: Option<String>,

        /// Model name, overriding the provider default
        #[arg(short, long)]
        model: Option<String>,

        /// Task ID whose attached file the agent may download
        #[arg(long)]
        task_id: Option<String>,

        /// File name of the task attachment
        #[arg(long, requires = "task_id")]
        file_name: Option<String>,

        /// Print the tool calls made by the agent
        #[arg(long)]
        show_tools: bool,

        /// Print only the text after "FINAL ANSWER:"
        #[arg(long)]
        answer_only: bool,
    },

    /// Start an interactive chat session
    Chat {
        /// Model provider (google or groq)
        #[arg(short, long)]
        provider: Option<String>,

        /// Model name, overriding the provider default
        #[arg(short, long)]
        model: Option<String>,
    },

    /// List the tools available to the agent
    Tools,

    /// Run a single tool directly
    Call {
        /// Tool name (e.g. "add", "wiki_search")
        tool: String,

        /// Tool arguments as a JSON object
        #[arg(default_value = "{}")]
        args: String,
    },

    /// Start HTTP API server for integration with other systems
    Serve {
        /// Host to bind to
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Port to bind to
        #[arg(short, long, default_value = "3000")]
        port: u16,
    },

    /// Start MCP server for AI assistant integration
    Mcp,

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Set a configuration value
    Set {
        /// Configuration key (e.g., "agent.provider")
        key: String,
        /// Configuration value
        value: String,
    },

    /// Open configuration file in editor
    Edit,

    /// Show configuration file path
    Path,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_ask() {
        let cli = Cli::parse_from([
            "sleuth", "-v", "ask", "How many albums?", "--provider", "groq", "--task-id", "abc",
            "--file-name", "abc.mp3",
        ]);
        assert_eq!(cli.verbose, 1);
        match cli.command {
            Commands::Ask {
                question,
                provider,
                task_id,
                file_name,
                ..
            } => {
                assert_eq!(question, "How many albums?");
                assert_eq!(provider.as_deref(), Some("groq"));
                assert_eq!(task_id.as_deref(), Some("abc"));
                assert_eq!(file_name.as_deref(), Some("abc.mp3"));
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_file_name_requires_task_id() {
        let result = Cli::try_parse_from(["sleuth", "ask", "Q?", "--file-name", "a.mp3"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_parse_call_defaults_args() {
        let cli = Cli::parse_from(["sleuth", "call", "reverse_string"]);
        match cli.command {
            Commands::Call { tool, args } => {
                assert_eq!(tool, "reverse_string");
                assert_eq!(args, "{}");
            }
            other => panic!("unexpected command {:?}", other),
        }
    }
}
