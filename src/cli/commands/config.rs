//! Config command implementation.

use crate::cli::{ConfigAction, Output};
use crate::config::Settings;
use crate::error::{Result, SleuthError};
use std::path::Path;

/// Run the config command against the file at `config_path`.
pub fn run_config(
    action: &ConfigAction,
    settings: Settings,
    config_path: &Path,
) -> anyhow::Result<()> {
    let config_path = config_path.to_path_buf();

    match action {
        ConfigAction::Show => {
            let toml_str = toml::to_string_pretty(&settings)
                .map_err(|e| anyhow::anyhow!("Failed to serialize config: {}", e))?;
            println!("{}", toml_str);
        }

        ConfigAction::Set { key, value } => {
            let updated = set_value(&settings, key, value)?;
            updated.save_to(&config_path)?;
            Output::success(&format!("Set {} = {}", key, value));
            Output::kv("File", &config_path.display().to_string());
        }

        ConfigAction::Edit => {
            // Create default config if it doesn't exist
            if !config_path.exists() {
                settings.save_to(&config_path)?;
                Output::info(&format!("Created default config at {}", config_path.display()));
            }

            let editor = std::env::var("EDITOR").unwrap_or_else(|_| "vim".to_string());

            Output::info(&format!("Opening config in {}...", editor));

            let status = std::process::Command::new(&editor)
                .arg(&config_path)
                .status();

            match status {
                Ok(s) if s.success() => {
                    Output::success("Config saved.");
                }
                Ok(_) => {
                    Output::warning("Editor exited with non-zero status.");
                }
                Err(e) => {
                    Output::error(&format!("Failed to open editor: {}", e));
                    Output::info(&format!("Config file is at: {}", config_path.display()));
                }
            }
        }

        ConfigAction::Path => {
            println!("{}", config_path.display());
        }
    }

    Ok(())
}

/// Return a copy of `settings` with the dotted `key` set to `raw`.
///
/// The value is parsed as a TOML scalar when possible and kept as a string
/// otherwise. The result must still deserialize into [`Settings`].
fn set_value(settings: &Settings, key: &str, raw: &str) -> Result<Settings> {
    let mut root = toml::Value::try_from(settings)
        .map_err(|e| SleuthError::Config(format!("Failed to serialize config: {}", e)))?;

    let parts: Vec<&str> = key.split('.').collect();
    let (last, parents) = parts
        .split_last()
        .ok_or_else(|| SleuthError::Config("Empty configuration key".to_string()))?;

    let mut table = root
        .as_table_mut()
        .ok_or_else(|| SleuthError::Config("Configuration is not a table".to_string()))?;
    for part in parents {
        table = table
            .get_mut(*part)
            .and_then(toml::Value::as_table_mut)
            .ok_or_else(|| SleuthError::Config(format!("Unknown configuration key: {}", key)))?;
    }

    let value = match table.get(*last) {
        Some(existing) if existing.is_table() => {
            return Err(SleuthError::Config(format!("'{}' is a section, not a value", key)))
        }
        Some(toml::Value::String(_)) | None => toml::Value::String(raw.to_string()),
        Some(_) => parse_scalar(raw),
    };
    table.insert(last.to_string(), value);

    let updated = root
        .try_into::<Settings>()
        .map_err(|e| SleuthError::Config(format!("Invalid value for {}: {}", key, e)))?;

    // Unset optional keys are absent from the table; reject typos that serde ignored.
    let check = toml::Value::try_from(&updated)
        .map_err(|e| SleuthError::Config(format!("Failed to serialize config: {}", e)))?;
    let known = parts
        .iter()
        .try_fold(&check, |value, part| value.get(*part))
        .is_some();
    if !known {
        return Err(SleuthError::Config(format!("Unknown configuration key: {}", key)));
    }

    Ok(updated)
}

fn parse_scalar(raw: &str) -> toml::Value {
    if let Ok(b) = raw.parse::<bool>() {
        toml::Value::Boolean(b)
    } else if let Ok(i) = raw.parse::<i64>() {
        toml::Value::Integer(i)
    } else if let Ok(f) = raw.parse::<f64>() {
        toml::Value::Float(f)
    } else {
        toml::Value::String(raw.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Provider;

    #[test]
    fn test_set_nested_values() {
        let settings = Settings::default();

        let updated = set_value(&settings, "agent.provider", "groq").unwrap();
        assert_eq!(updated.agent.provider, Provider::Groq);

        let updated = set_value(&updated, "tools.wiki_max_docs", "5").unwrap();
        assert_eq!(updated.tools.wiki_max_docs, 5);

        let updated = set_value(&updated, "providers.groq.temperature", "0.5").unwrap();
        assert!((updated.providers.groq.temperature - 0.5).abs() < f32::EPSILON);
    }

    #[test]
    fn test_set_rejects_bad_keys_and_values() {
        let settings = Settings::default();
        assert!(set_value(&settings, "agent.nope", "1").is_err());
        assert!(set_value(&settings, "agent", "1").is_err());
        assert!(set_value(&settings, "agent.provider", "openai").is_err());
        assert!(set_value(&settings, "tools.wiki_max_docs", "many").is_err());
    }

    #[test]
    fn test_set_unset_optional_key() {
        let updated =
            set_value(&Settings::default(), "agent.system_prompt_file", "~/prompt.txt").unwrap();
        assert_eq!(updated.agent.system_prompt_file.as_deref(), Some("~/prompt.txt"));
    }

    #[test]
    fn test_set_then_save_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let updated = set_value(&Settings::default(), "general.log_level", "debug").unwrap();
        updated.save_to(&path).unwrap();

        let loaded = Settings::load_from(Some(&path)).unwrap();
        assert_eq!(loaded.general.log_level, "debug");
    }
}
