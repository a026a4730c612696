//! Doctor command - verify API keys and configuration.

use crate::cli::Output;
use crate::config::{lookup_api_key, Provider, Settings, SYSTEM_PROMPT_FILE};
use crate::openai::api_key_envs;
use crate::tools::search::TAVILY_API_KEY_ENV;
use console::style;
use std::path::Path;

/// Check result for a single item.
#[derive(Debug)]
pub struct CheckResult {
    pub name: String,
    pub status: CheckStatus,
    pub message: String,
    pub hint: Option<String>,
}

#[derive(Debug, PartialEq)]
pub enum CheckStatus {
    Ok,
    Warning,
    Error,
}

impl CheckResult {
    fn ok(name: &str, message: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Ok,
            message: message.to_string(),
            hint: None,
        }
    }

    fn warning(name: &str, message: &str, hint: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Warning,
            message: message.to_string(),
            hint: Some(hint.to_string()),
        }
    }

    fn error(name: &str, message: &str, hint: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Error,
            message: message.to_string(),
            hint: Some(hint.to_string()),
        }
    }

    fn print(&self) {
        let icon = match self.status {
            CheckStatus::Ok => style("✓").green(),
            CheckStatus::Warning => style("!").yellow(),
            CheckStatus::Error => style("✗").red(),
        };

        println!("  {} {} - {}", icon, style(&self.name).bold(), self.message);

        if let Some(hint) = &self.hint {
            println!("    {} {}", style("→").dim(), style(hint).dim());
        }
    }
}

/// Run all diagnostic checks.
pub fn run_doctor(settings: &Settings, config_path: &Path) -> anyhow::Result<()> {
    Output::header("Sleuth Doctor");
    println!();
    println!("Checking API keys and configuration...\n");

    let mut checks = Vec::new();

    let sections = [
        ("Model Providers", check_providers(settings)),
        ("Tool Services", check_tool_keys(settings)),
        ("Directories", vec![check_temp_dir(settings)]),
        (
            "Configuration",
            vec![check_config_file(config_path), check_system_prompt(settings)],
        ),
    ];

    for (title, results) in sections {
        println!("{}", style(title).bold());
        for check in &results {
            check.print();
        }
        println!();
        checks.extend(results);
    }

    let errors = checks.iter().filter(|c| c.status == CheckStatus::Error).count();
    let warnings = checks.iter().filter(|c| c.status == CheckStatus::Warning).count();

    if errors > 0 {
        Output::error(&format!(
            "{} error(s) found. Please fix them before using Sleuth.",
            errors
        ));
        anyhow::bail!("doctor found {} error(s)", errors);
    } else if warnings > 0 {
        Output::warning(&format!("All checks passed with {} warning(s).", warnings));
    } else {
        Output::success("All checks passed! Sleuth is ready to use.");
    }

    Ok(())
}

/// The default provider's key is required; the other one is optional.
fn check_providers(settings: &Settings) -> Vec<CheckResult> {
    [Provider::Google, Provider::Groq]
        .into_iter()
        .map(|provider| {
            let names = api_key_envs(provider, settings.providers.get(provider));
            let label = format!("{} ({})", provider, names.join(" / "));
            let hint = format!("Set with: export {}='...'", names[0]);

            match lookup_api_key(&names) {
                Some(key) => CheckResult::ok(&label, &format!("configured ({})", mask_key(&key))),
                None if provider == settings.agent.provider => {
                    CheckResult::error(&label, "not set (default provider)", &hint)
                }
                None => CheckResult::warning(&label, "not set", &hint),
            }
        })
        .collect()
}

/// Keys the search and media tools need.
fn check_tool_keys(settings: &Settings) -> Vec<CheckResult> {
    let gemini_env = settings.tools.gemini.api_key_env.as_str();

    let tavily = match lookup_api_key(&[TAVILY_API_KEY_ENV]) {
        Some(key) => CheckResult::ok("web_search", &format!("configured ({})", mask_key(&key))),
        None => CheckResult::warning(
            "web_search",
            &format!("{} not set", TAVILY_API_KEY_ENV),
            "web_search will fail until the key is set",
        ),
    };

    let gemini = match lookup_api_key(&[gemini_env, "GEMINI_API_KEY"]) {
        Some(key) => CheckResult::ok(
            "youtube_analyze / analyze_audio_file",
            &format!("configured ({})", mask_key(&key)),
        ),
        None => CheckResult::warning(
            "youtube_analyze / analyze_audio_file",
            &format!("{} not set", gemini_env),
            "Audio and video analysis will fail until the key is set",
        ),
    };

    vec![tavily, gemini]
}

fn check_temp_dir(settings: &Settings) -> CheckResult {
    let dir = settings.temp_dir();
    if dir.is_dir() {
        let marker = dir.join(format!(".sleuth-doctor-{}", uuid::Uuid::new_v4().simple()));
        match std::fs::write(&marker, b"ok") {
            Ok(()) => {
                let _ = std::fs::remove_file(&marker);
                CheckResult::ok("Download directory", &dir.display().to_string())
            }
            Err(e) => CheckResult::error(
                "Download directory",
                &format!("{} is not writable: {}", dir.display(), e),
                "Set general.temp_dir to a writable directory",
            ),
        }
    } else {
        CheckResult::warning(
            "Download directory",
            &format!("{} (will be created)", dir.display()),
            "Directory will be created on first download",
        )
    }
}

fn check_config_file(config_path: &Path) -> CheckResult {
    if config_path.exists() {
        CheckResult::ok("Config file", &config_path.display().to_string())
    } else {
        CheckResult::warning(
            "Config file",
            "using defaults",
            "Create with: sleuth config edit",
        )
    }
}

fn check_system_prompt(settings: &Settings) -> CheckResult {
    match &settings.agent.system_prompt_file {
        Some(path) if Settings::expand_path(path).is_file() => {
            CheckResult::ok("System prompt", path)
        }
        Some(path) => CheckResult::error(
            "System prompt",
            &format!("{} not found", path),
            "Fix agent.system_prompt_file or remove it to use the built-in prompt",
        ),
        None if Path::new(SYSTEM_PROMPT_FILE).is_file() => {
            CheckResult::ok("System prompt", SYSTEM_PROMPT_FILE)
        }
        None => CheckResult::ok("System prompt", "built-in"),
    }
}

/// Show only the ends of a secret.
fn mask_key(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    if chars.len() <= 12 {
        return "****".to_string();
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}...{}", head, tail)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mask_key() {
        assert_eq!(mask_key("short"), "****");
        assert_eq!(mask_key("gsk_1234567890abcdef"), "gsk_...cdef");
    }

    #[test]
    fn test_missing_config_file_is_warning() {
        let check = check_config_file(Path::new("/nonexistent/sleuth/config.toml"));
        assert_eq!(check.status, CheckStatus::Warning);
    }

    #[test]
    fn test_missing_prompt_file_is_error() {
        let mut settings = Settings::default();
        settings.agent.system_prompt_file = Some("/nonexistent/prompt.txt".to_string());
        assert_eq!(check_system_prompt(&settings).status, CheckStatus::Error);
    }

    #[test]
    fn test_temp_dir_check() {
        let dir = tempfile::tempdir().unwrap();
        let mut settings = Settings::default();
        settings.general.temp_dir = dir.path().to_string_lossy().into_owned();
        assert_eq!(check_temp_dir(&settings).status, CheckStatus::Ok);
    }
}
