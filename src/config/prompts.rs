//! System prompt for the agent.
//!
//! The prompt can be replaced by pointing `agent.system_prompt_file` at a text
//! file, or by placing `system_prompt.txt` in the working directory.

use super::Settings;
use crate::error::Result;
use std::path::{Path, PathBuf};
use tracing::debug;

/// File name looked up in the working directory when no prompt file is configured.
pub const SYSTEM_PROMPT_FILE: &str = "system_prompt.txt";

/// Built-in system prompt.
pub const DEFAULT_SYSTEM_PROMPT: &str = r#"You are a general AI assistant. I will ask you a question. Report your thoughts, and finish your answer with the following template: FINAL ANSWER: [YOUR FINAL ANSWER].

YOUR FINAL ANSWER should be a number OR as few words as possible OR a comma separated list of numbers and/or strings.
If you are asked for a number, don't use comma to write your number neither use units such as $ or percent sign unless specified otherwise.
If you are asked for a string, don't use articles, neither abbreviations (e.g. for cities), and write the digits in plain text unless specified otherwise.
If you are asked for a comma separated list, apply the above rules depending of whether the element to be put in the list is a number or a string.

You have tools for arithmetic, Wikipedia, web and arXiv search, downloading the file attached to a task, analyzing audio files and analyzing YouTube videos.
When a question mentions an attached file, download it with 'download_file_of_task_id' before analyzing it.
Your answer should only start with "FINAL ANSWER: ", then follows with the answer."#;

/// Resolve the system prompt for the given settings.
///
/// Order: configured file, `./system_prompt.txt`, built-in prompt.
pub fn load_system_prompt(settings: &Settings) -> Result<String> {
    if let Some(path) = &settings.agent.system_prompt_file {
        let path = Settings::expand_path(path);
        debug!("Loading system prompt from {}", path.display());
        return read_prompt(&path);
    }

    let local = PathBuf::from(SYSTEM_PROMPT_FILE);
    if local.exists() {
        debug!("Loading system prompt from ./{}", SYSTEM_PROMPT_FILE);
        return read_prompt(&local);
    }

    Ok(DEFAULT_SYSTEM_PROMPT.to_string())
}

fn read_prompt(path: &Path) -> Result<String> {
    let content = std::fs::read_to_string(path)?;
    Ok(content.trim_end().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configured_prompt_file_wins() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prompt.txt");
        std::fs::write(&path, "Answer briefly.\n\n").unwrap();

        let mut settings = Settings::default();
        settings.agent.system_prompt_file = Some(path.to_string_lossy().into_owned());

        assert_eq!(load_system_prompt(&settings).unwrap(), "Answer briefly.");
    }

    #[test]
    fn test_missing_prompt_file_is_error() {
        let mut settings = Settings::default();
        settings.agent.system_prompt_file = Some("/nonexistent/sleuth/prompt.txt".to_string());
        assert!(load_system_prompt(&settings).is_err());
    }

    #[test]
    fn test_default_prompt_mentions_answer_template() {
        assert!(DEFAULT_SYSTEM_PROMPT.contains("FINAL ANSWER"));
    }
}
