//! Tools command - list the agent's tools.

use crate::cli::Output;
use crate::tools::tool_definitions;
use anyhow::Result;

/// Print every tool with its description and arguments.
pub fn run_tools() -> Result<()> {
    let tools = tool_definitions();
    Output::header(&format!("Tools ({})", tools.len()));
    println!();

    for tool in &tools {
        Output::tool_info(tool.name, tool.description);
        let args: Vec<String> = tool.parameters["properties"]
            .as_object()
            .map(|props| {
                props
                    .iter()
                    .map(|(name, schema)| {
                        format!("{}: {}", name, schema["type"].as_str().unwrap_or("any"))
                    })
                    .collect()
            })
            .unwrap_or_default();
        Output::kv("args", &args.join(", "));
    }

    Ok(())
}
