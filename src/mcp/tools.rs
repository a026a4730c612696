//! MCP tool list.

use super::protocol::Tool;
use crate::tools::tool_definitions;
use serde_json::json;

/// Name of the MCP tool that runs the whole agent.
pub const ASK_TOOL: &str = "ask";

/// Every agent tool, plus `ask` for a full agent run.
pub fn get_tools() -> Vec<Tool> {
    let mut tools: Vec<Tool> = tool_definitions()
        .into_iter()
        .map(|def| Tool {
            name: def.name.to_string(),
            description: def.description.to_string(),
            input_schema: def.parameters,
        })
        .collect();

    tools.push(Tool {
        name: ASK_TOOL.to_string(),
        description: "Answer a question with the full agent, which may search the web, \
            Wikipedia and arXiv, download task files and analyze audio or video."
            .to_string(),
        input_schema: json!({
            "type": "object",
            "properties": {
                "question": {
                    "type": "string",
                    "description": "The question to answer"
                },
                "provider": {
                    "type": "string",
                    "description": "Model provider: google or groq",
                    "enum": ["google", "groq"]
                },
                "task_id": {
                    "type": "string",
                    "description": "Task ID whose attached file the agent may download"
                },
                "file_name": {
                    "type": "string",
                    "description": "File name of the task attachment"
                }
            },
            "required": ["question"]
        }),
    });

    tools
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tools_include_agent_tools_and_ask() {
        let tools = get_tools();
        assert_eq!(tools.len(), 13);
        assert!(tools.iter().any(|t| t.name == "wiki_search"));
        assert_eq!(tools.last().map(|t| t.name.as_str()), Some(ASK_TOOL));

        let value = serde_json::to_value(&tools[0]).unwrap();
        assert!(value.get("inputSchema").is_some());
    }
}
