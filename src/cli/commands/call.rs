//! Call command - run one tool directly.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::tools::{parse_tool_call, ToolContext};
use anyhow::Result;

/// Parse `args` as the tool's JSON arguments, run it and print the result.
pub async fn run_call(tool: &str, args: &str, settings: Settings) -> Result<()> {
    let call = parse_tool_call(tool, args)?;
    preflight::check(Operation::CallTool(&call), &settings)?;

    let context = ToolContext::new(&settings)?;

    let spinner = Output::spinner(&format!("Running {}...", call.name()));
    let result = context.execute(&call).await;
    spinner.finish_and_clear();

    match result {
        Ok(output) => {
            println!("{}", output);
            Ok(())
        }
        Err(e) => {
            Output::error(&format!("{} failed: {}", call.name(), e));
            Err(e.into())
        }
    }
}
