//! Sleuth CLI entry point.

use anyhow::Result;
use clap::Parser;
use sleuth::cli::commands::{self, AskOptions};
use sleuth::cli::{Cli, Commands};
use sleuth::config::Settings;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    // API keys may live in a .env file next to the working directory
    dotenv::dotenv().ok();

    let cli = Cli::parse();

    // Load configuration
    let config_path = cli
        .config
        .as_deref()
        .map(Settings::expand_path)
        .unwrap_or_else(Settings::default_config_path);
    let settings = Settings::load_from(Some(&config_path))?;

    // Initialize logging; stdout is reserved for answers and MCP traffic
    let log_level = match cli.verbose {
        0 => settings.general.log_level.clone(),
        1 => "info".to_string(),
        2 => "debug".to_string(),
        _ => "trace".to_string(),
    };

    tracing_subscriber::registry()
        .with(EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| format!("sleuth={}", log_level)),
        ))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();

    // Execute command
    match cli.command {
        Commands::Doctor => {
            commands::run_doctor(&settings, &config_path)?;
        }

        Commands::Ask {
            question,
            provider,
            model,
            task_id,
            file_name,
            show_tools,
            answer_only,
        } => {
            let options = AskOptions {
                provider,
                model,
                task_id,
                file_name,
                show_tools,
                answer_only,
            };
            commands::run_ask(&question, options, settings).await?;
        }

        Commands::Chat { provider, model } => {
            commands::run_chat(provider, model, settings).await?;
        }

        Commands::Tools => {
            commands::run_tools()?;
        }

        Commands::Call { tool, args } => {
            commands::run_call(&tool, &args, settings).await?;
        }

        Commands::Serve { host, port } => {
            commands::run_serve(&host, port, settings).await?;
        }

        Commands::Mcp => {
            commands::run_mcp(settings).await?;
        }

        Commands::Config { action } => {
            commands::run_config(&action, settings, &config_path)?;
        }
    }

    Ok(())
}
