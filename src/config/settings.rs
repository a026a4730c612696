//! Configuration settings for Sleuth.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct Settings {
    pub general: GeneralSettings,
    pub agent: AgentSettings,
    pub providers: ProvidersSettings,
    pub tools: ToolSettings,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    /// Directory that downloaded task files are written to.
    pub temp_dir: String,
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            temp_dir: std::env::temp_dir().to_string_lossy().into_owned(),
            log_level: "warn".to_string(),
        }
    }
}

/// Chat model provider.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    /// Google Gemini through its OpenAI-compatible endpoint.
    #[default]
    Google,
    /// Groq through its OpenAI-compatible endpoint.
    Groq,
}

impl std::str::FromStr for Provider {
    type Err = crate::error::SleuthError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "google" | "gemini" => Ok(Provider::Google),
            "groq" => Ok(Provider::Groq),
            _ => Err(crate::error::SleuthError::Provider(s.to_string())),
        }
    }
}

impl std::fmt::Display for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Provider::Google => write!(f, "google"),
            Provider::Groq => write!(f, "groq"),
        }
    }
}

/// Agent loop settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentSettings {
    /// Provider used when none is given on the command line.
    pub provider: Provider,
    /// Maximum number of graph steps before a run is aborted.
    pub recursion_limit: usize,
    /// File holding the system prompt. Falls back to `./system_prompt.txt`,
    /// then the built-in prompt.
    pub system_prompt_file: Option<String>,
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self {
            provider: Provider::Google,
            recursion_limit: 25,
            system_prompt_file: None,
        }
    }
}

/// Connection settings for one OpenAI-compatible chat endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderSettings {
    /// Model name.
    pub model: String,
    /// Sampling temperature.
    pub temperature: f32,
    /// Base URL of the OpenAI-compatible API.
    pub base_url: String,
    /// Environment variable holding the API key.
    pub api_key_env: String,
}

/// Per-provider settings.
///
/// A provider table in the config file only overrides the keys it names;
/// the rest keep that provider's own defaults.
#[derive(Debug, Clone, Serialize)]
pub struct ProvidersSettings {
    pub google: ProviderSettings,
    pub groq: ProviderSettings,
}

impl Default for ProvidersSettings {
    fn default() -> Self {
        Self {
            google: ProviderSettings {
                model: "gemini-2.5-flash".to_string(),
                temperature: 0.0,
                base_url: "https://generativelanguage.googleapis.com/v1beta/openai".to_string(),
                api_key_env: "GOOGLE_API_KEY".to_string(),
            },
            groq: ProviderSettings {
                model: "qwen-qwq-32b".to_string(),
                temperature: 0.1,
                base_url: "https://api.groq.com/openai/v1".to_string(),
                api_key_env: "GROQ_API_KEY".to_string(),
            },
        }
    }
}

/// Keys present in one `[providers.*]` table.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ProviderOverrides {
    model: Option<String>,
    temperature: Option<f32>,
    base_url: Option<String>,
    api_key_env: Option<String>,
}

impl ProviderOverrides {
    fn apply(self, base: &mut ProviderSettings) {
        if let Some(model) = self.model {
            base.model = model;
        }
        if let Some(temperature) = self.temperature {
            base.temperature = temperature;
        }
        if let Some(base_url) = self.base_url {
            base.base_url = base_url;
        }
        if let Some(api_key_env) = self.api_key_env {
            base.api_key_env = api_key_env;
        }
    }
}

impl<'de> Deserialize<'de> for ProvidersSettings {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Default, Deserialize)]
        #[serde(default)]
        struct Tables {
            google: ProviderOverrides,
            groq: ProviderOverrides,
        }

        let tables = Tables::deserialize(deserializer)?;
        let mut settings = Self::default();
        tables.google.apply(&mut settings.google);
        tables.groq.apply(&mut settings.groq);
        Ok(settings)
    }
}

impl ProvidersSettings {
    /// Settings for the given provider.
    pub fn get(&self, provider: Provider) -> &ProviderSettings {
        match provider {
            Provider::Google => &self.google,
            Provider::Groq => &self.groq,
        }
    }
}

/// Settings for the tool set.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolSettings {
    /// Base URL of the scoring service that hosts task attachments.
    pub scoring_api_url: String,
    /// MediaWiki action API endpoint.
    pub wikipedia_api_url: String,
    /// Tavily search endpoint.
    pub tavily_api_url: String,
    /// arXiv Atom export endpoint.
    pub arxiv_api_url: String,
    /// Maximum Wikipedia articles per search.
    pub wiki_max_docs: usize,
    /// Maximum characters kept from each Wikipedia article.
    pub wiki_doc_chars: usize,
    /// Maximum Tavily results per search.
    pub web_max_results: usize,
    /// Maximum arXiv entries per search.
    pub arxiv_max_docs: usize,
    /// Maximum characters kept from each arXiv abstract.
    pub arxiv_doc_chars: usize,
    /// Timeout for tool HTTP requests in seconds.
    pub http_timeout_secs: u64,
    /// Gemini settings for audio and video analysis.
    pub gemini: GeminiSettings,
}

impl Default for ToolSettings {
    fn default() -> Self {
        Self {
            scoring_api_url: "https://agents-course-unit4-scoring.hf.space".to_string(),
            wikipedia_api_url: "https://en.wikipedia.org/w/api.php".to_string(),
            tavily_api_url: "https://api.tavily.com/search".to_string(),
            arxiv_api_url: "https://export.arxiv.org/api/query".to_string(),
            wiki_max_docs: 2,
            wiki_doc_chars: 4000,
            web_max_results: 3,
            arxiv_max_docs: 3,
            arxiv_doc_chars: 1000,
            http_timeout_secs: 120,
            gemini: GeminiSettings::default(),
        }
    }
}

/// Gemini REST API settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeminiSettings {
    /// Base URL of the Generative Language API.
    pub base_url: String,
    /// Model used to answer questions about YouTube videos.
    pub video_model: String,
    /// Model used to answer questions about audio files.
    pub audio_model: String,
    /// Environment variable holding the API key (GEMINI_API_KEY is tried as a fallback).
    pub api_key_env: String,
}

impl Default for GeminiSettings {
    fn default() -> Self {
        Self {
            base_url: "https://generativelanguage.googleapis.com".to_string(),
            video_model: "gemini-2.5-flash".to_string(),
            audio_model: "gemini-2.0-flash".to_string(),
            api_key_env: "GOOGLE_API_KEY".to_string(),
        }
    }
}

impl Settings {
    /// Load settings from the default configuration file.
    pub fn load() -> crate::error::Result<Self> {
        Self::load_from(None)
    }

    /// Load settings from a specific path, or default location if None.
    pub fn load_from(path: Option<&PathBuf>) -> crate::error::Result<Self> {
        let config_path = match path {
            Some(p) => p.clone(),
            None => Self::default_config_path(),
        };

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let settings: Settings = toml::from_str(&content)?;
            Ok(settings)
        } else {
            Ok(Settings::default())
        }
    }

    /// Save settings to the default configuration file.
    pub fn save(&self) -> crate::error::Result<()> {
        self.save_to(&Self::default_config_path())
    }

    /// Save settings to a specific path.
    pub fn save_to(&self, path: &PathBuf) -> crate::error::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| crate::error::SleuthError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get the default configuration file path.
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("sleuth")
            .join("config.toml")
    }

    /// Expand shell variables in paths (e.g., ~).
    pub fn expand_path(path: &str) -> PathBuf {
        PathBuf::from(shellexpand::tilde(path).to_string())
    }

    /// Get the expanded temp directory path.
    pub fn temp_dir(&self) -> PathBuf {
        Self::expand_path(&self.general.temp_dir)
    }
}

/// Read the first non-empty environment variable from `names`.
pub fn lookup_api_key(names: &[&str]) -> Option<String> {
    names
        .iter()
        .filter_map(|name| std::env::var(name).ok())
        .find(|value| !value.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_from_str() {
        assert_eq!("google".parse::<Provider>().unwrap(), Provider::Google);
        assert_eq!("GROQ".parse::<Provider>().unwrap(), Provider::Groq);
        assert!("openai".parse::<Provider>().is_err());
    }

    #[test]
    fn test_defaults_match_reference_models() {
        let settings = Settings::default();
        assert_eq!(settings.providers.google.model, "gemini-2.5-flash");
        assert_eq!(settings.providers.google.temperature, 0.0);
        assert_eq!(settings.providers.groq.model, "qwen-qwq-32b");
        assert_eq!(settings.tools.wiki_max_docs, 2);
        assert_eq!(settings.tools.web_max_results, 3);
        assert_eq!(settings.tools.arxiv_max_docs, 3);
        assert_eq!(settings.agent.recursion_limit, 25);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let settings: Settings = toml::from_str(
            r#"
            [agent]
            provider = "groq"

            [tools]
            web_max_results = 5
            "#,
        )
        .unwrap();

        assert_eq!(settings.agent.provider, Provider::Groq);
        assert_eq!(settings.agent.recursion_limit, 25);
        assert_eq!(settings.tools.web_max_results, 5);
        assert_eq!(settings.tools.wiki_max_docs, 2);
    }

    #[test]
    fn test_partial_provider_table_keeps_provider_defaults() {
        let settings: Settings = toml::from_str(
            r#"
            [providers.groq]
            model = "llama-3.3-70b-versatile"
            "#,
        )
        .unwrap();

        assert_eq!(settings.providers.groq.model, "llama-3.3-70b-versatile");
        assert_eq!(settings.providers.groq.temperature, 0.1);
        assert_eq!(settings.providers.groq.base_url, "https://api.groq.com/openai/v1");
        assert_eq!(settings.providers.groq.api_key_env, "GROQ_API_KEY");
        assert_eq!(settings.providers.google.model, "gemini-2.5-flash");
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut settings = Settings::default();
        settings.agent.provider = Provider::Groq;
        settings.save_to(&path).unwrap();

        let loaded = Settings::load_from(Some(&path)).unwrap();
        assert_eq!(loaded.agent.provider, Provider::Groq);
    }

    #[test]
    fn test_lookup_api_key_skips_empty() {
        std::env::set_var("SLEUTH_TEST_EMPTY_KEY", "");
        std::env::set_var("SLEUTH_TEST_SET_KEY", "abc");
        assert_eq!(
            lookup_api_key(&["SLEUTH_TEST_EMPTY_KEY", "SLEUTH_TEST_SET_KEY"]),
            Some("abc".to_string())
        );
        assert_eq!(lookup_api_key(&["SLEUTH_TEST_MISSING_KEY"]), None);
    }
}
