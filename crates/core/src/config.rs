//! Configuration management for medassist.
//!
//! This module handles loading and merging configuration from multiple sources:
//! - Built-in defaults
//! - Config file (.medassist/config.yaml)
//! - Environment variables
//! - Command-line flags
//!
//! Later sources win. Dataset paths are resolved against the workspace root.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::error::{AppError, AppResult};
use crate::topic::Topic;

/// Environment variable holding the Gemini key when no provider config names one.
pub const DEFAULT_GEMINI_KEY_ENV: &str = "GEMINI_API_KEY";

/// Environment variable holding the Tavily key by default.
pub const DEFAULT_SEARCH_KEY_ENV: &str = "TAVILY_API_KEY";

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Path to the workspace root (contains .medassist/ and databases/)
    pub workspace: PathBuf,

    /// Optional config file path
    pub config_file: Option<PathBuf>,

    /// LLM provider ("gemini" or "ollama")
    pub provider: String,

    /// Model identifier
    pub model: String,

    /// API key for the LLM provider
    pub api_key: Option<String>,

    /// Log level override
    pub log_level: Option<String>,

    /// Verbose mode (enables debug logging)
    pub verbose: bool,

    /// Disable colored output
    pub no_color: bool,

    /// LLM provider configurations
    pub llm: Option<LlmConfig>,

    /// Web search settings
    pub search: SearchConfig,

    /// Store location per topic
    pub datasets: DatasetPaths,

    /// Limits applied to generated queries
    pub query: QueryLimits,
}

/// LLM configuration from config.yaml.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    #[serde(rename = "activeProvider")]
    pub active_provider: String,

    pub providers: HashMap<String, ProviderConfig>,
}

/// Provider-specific configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ProviderConfig {
    Gemini {
        #[serde(rename = "apiKeyEnv")]
        api_key_env: String,
        model: String,
        endpoint: Option<String>,
        timeout: Option<u64>,
    },
    Ollama {
        endpoint: String,
        model: String,
        timeout: Option<u64>,
    },
}

impl ProviderConfig {
    /// Model configured for this provider.
    pub fn model(&self) -> &str {
        match self {
            Self::Gemini { model, .. } | Self::Ollama { model, .. } => model,
        }
    }

    /// Custom endpoint, if any.
    pub fn endpoint(&self) -> Option<&str> {
        match self {
            Self::Gemini { endpoint, .. } => endpoint.as_deref(),
            Self::Ollama { endpoint, .. } => Some(endpoint),
        }
    }

    /// HTTP timeout in seconds, if any.
    pub fn timeout(&self) -> Option<u64> {
        match self {
            Self::Gemini { timeout, .. } | Self::Ollama { timeout, .. } => *timeout,
        }
    }
}

/// Web search configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Search provider (only "tavily" is supported)
    #[serde(default = "default_search_provider")]
    pub provider: String,

    /// Environment variable holding the provider key
    #[serde(rename = "apiKeyEnv", default = "default_search_key_env")]
    pub api_key_env: String,

    /// Custom endpoint
    #[serde(default)]
    pub endpoint: Option<String>,

    /// Maximum number of results handed to the synthesizer
    #[serde(rename = "maxResults", default = "default_max_results")]
    pub max_results: usize,

    /// HTTP timeout in seconds
    #[serde(default)]
    pub timeout: Option<u64>,
}

fn default_search_provider() -> String {
    "tavily".to_string()
}

fn default_search_key_env() -> String {
    DEFAULT_SEARCH_KEY_ENV.to_string()
}

fn default_max_results() -> usize {
    3
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            provider: default_search_provider(),
            api_key_env: default_search_key_env(),
            endpoint: None,
            max_results: default_max_results(),
            timeout: None,
        }
    }
}

/// SQLite file location for each topic.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetPaths {
    #[serde(default = "default_heart_path")]
    pub heart: PathBuf,

    #[serde(default = "default_cancer_path")]
    pub cancer: PathBuf,

    #[serde(default = "default_diabetes_path")]
    pub diabetes: PathBuf,
}

fn default_heart_path() -> PathBuf {
    PathBuf::from("databases/heart_disease.db")
}

fn default_cancer_path() -> PathBuf {
    PathBuf::from("databases/cancer.db")
}

fn default_diabetes_path() -> PathBuf {
    PathBuf::from("databases/diabetes.db")
}

impl Default for DatasetPaths {
    fn default() -> Self {
        Self {
            heart: default_heart_path(),
            cancer: default_cancer_path(),
            diabetes: default_diabetes_path(),
        }
    }
}

impl DatasetPaths {
    /// Configured path for a topic, as written in config.
    pub fn get(&self, topic: Topic) -> &Path {
        match topic {
            Topic::Heart => &self.heart,
            Topic::Cancer => &self.cancer,
            Topic::Diabetes => &self.diabetes,
        }
    }
}

/// Limits for executing generated SQL.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct QueryLimits {
    /// Rows materialized before the result is marked truncated
    #[serde(rename = "maxRows", default = "default_max_rows")]
    pub max_rows: usize,

    /// Wall-clock budget for a single statement
    #[serde(rename = "timeoutMs", default = "default_query_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_max_rows() -> usize {
    1000
}

fn default_query_timeout_ms() -> u64 {
    5000
}

impl Default for QueryLimits {
    fn default() -> Self {
        Self {
            max_rows: default_max_rows(),
            timeout_ms: default_query_timeout_ms(),
        }
    }
}

/// Full configuration file structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct ConfigFile {
    llm: Option<LlmConfig>,
    workspace: Option<WorkspaceConfig>,
    logging: Option<LoggingConfig>,
    search: Option<SearchConfig>,
    datasets: Option<DatasetPaths>,
    query: Option<QueryLimits>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct WorkspaceConfig {
    path: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct LoggingConfig {
    level: Option<String>,
    color: Option<bool>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            workspace: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            config_file: None,
            provider: "gemini".to_string(),
            model: "gemini-2.5-flash".to_string(),
            api_key: None,
            log_level: None,
            verbose: false,
            no_color: false,
            llm: None,
            search: SearchConfig::default(),
            datasets: DatasetPaths::default(),
            query: QueryLimits::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables and defaults.
    ///
    /// Environment variables:
    /// - `MEDASSIST_WORKSPACE`: Override workspace path
    /// - `MEDASSIST_CONFIG`: Path to config file
    /// - `MEDASSIST_PROVIDER`: LLM provider
    /// - `MEDASSIST_MODEL`: Model identifier
    /// - `MEDASSIST_API_KEY`: API key for the LLM provider
    /// - `RUST_LOG`: Log level
    /// - `NO_COLOR`: Disable colored output
    pub fn load() -> AppResult<Self> {
        let mut config = Self::default();

        if let Ok(workspace) = std::env::var("MEDASSIST_WORKSPACE") {
            config.workspace = PathBuf::from(workspace);
        }

        if let Ok(config_file) = std::env::var("MEDASSIST_CONFIG") {
            config.config_file = Some(PathBuf::from(config_file));
        }

        if !config.workspace.exists() {
            return Err(AppError::Config(format!(
                "Workspace directory does not exist: {:?}",
                config.workspace
            )));
        }

        let config_path = match config.config_file {
            Some(ref cf) => cf.clone(),
            None => config.medassist_dir().join("config.yaml"),
        };

        if config_path.exists() {
            config = config.merge_yaml(&config_path)?;
        }

        // Environment variables override YAML config
        if let Ok(provider) = std::env::var("MEDASSIST_PROVIDER") {
            config.provider = provider;
        }

        if let Ok(model) = std::env::var("MEDASSIST_MODEL") {
            config.model = model;
        }

        config.api_key = std::env::var("MEDASSIST_API_KEY").ok();
        if config.log_level.is_none() {
            config.log_level = std::env::var("RUST_LOG").ok();
        }

        if std::env::var("NO_COLOR").is_ok() {
            config.no_color = true;
        }

        Ok(config)
    }

    /// Merge a YAML configuration file into this config.
    fn merge_yaml(&self, path: &Path) -> AppResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            AppError::Config(format!("Failed to read config file {:?}: {}", path, e))
        })?;

        self.merge_yaml_str(&contents)
            .map_err(|e| AppError::Config(format!("Failed to parse config file {:?}: {}", path, e)))
    }

    fn merge_yaml_str(&self, contents: &str) -> Result<Self, serde_yaml::Error> {
        let config_file: ConfigFile = serde_yaml::from_str(contents)?;
        let mut result = self.clone();

        if let Some(path) = config_file.workspace.and_then(|ws| ws.path) {
            result.workspace = PathBuf::from(path);
        }

        if let Some(logging) = config_file.logging {
            if let Some(level) = logging.level {
                result.log_level = Some(level);
            }
            if let Some(color) = logging.color {
                result.no_color = !color;
            }
        }

        if let Some(llm) = config_file.llm {
            result.provider = llm.active_provider.clone();
            if let Some(provider_config) = llm.providers.get(&llm.active_provider) {
                result.model = provider_config.model().to_string();
            }
            result.llm = Some(llm);
        }

        if let Some(search) = config_file.search {
            result.search = search;
        }

        if let Some(datasets) = config_file.datasets {
            result.datasets = datasets;
        }

        if let Some(query) = config_file.query {
            result.query = query;
        }

        Ok(result)
    }

    /// Apply CLI overrides to the configuration.
    ///
    /// CLI flags take precedence over environment variables and YAML.
    #[allow(clippy::too_many_arguments)]
    pub fn with_overrides(
        mut self,
        workspace: Option<PathBuf>,
        config_file: Option<PathBuf>,
        provider: Option<String>,
        model: Option<String>,
        log_level: Option<String>,
        verbose: bool,
        no_color: bool,
    ) -> Self {
        if let Some(workspace) = workspace {
            self.workspace = workspace;
        }

        if let Some(config_file) = config_file {
            self.config_file = Some(config_file);
        }

        if let Some(provider) = provider {
            self.provider = provider;
        }

        if let Some(model) = model {
            self.model = model;
        }

        if let Some(log_level) = log_level {
            self.log_level = Some(log_level);
        }

        if verbose {
            self.verbose = true;
            if self.log_level.is_none() {
                self.log_level = Some("debug".to_string());
            }
        }

        if no_color {
            self.no_color = true;
        }

        self
    }

    /// Get the path to the .medassist directory.
    pub fn medassist_dir(&self) -> PathBuf {
        self.workspace.join(".medassist")
    }

    /// Absolute location of a topic's store.
    pub fn dataset_path(&self, topic: Topic) -> PathBuf {
        let configured = self.datasets.get(topic);
        if configured.is_absolute() {
            configured.to_path_buf()
        } else {
            self.workspace.join(configured)
        }
    }

    /// Map of every topic to its resolved store path.
    pub fn dataset_paths(&self) -> HashMap<Topic, PathBuf> {
        Topic::ALL
            .iter()
            .map(|topic| (*topic, self.dataset_path(*topic)))
            .collect()
    }

    /// Get the configuration block for a provider.
    pub fn get_provider_config(&self, provider: &str) -> Option<ProviderConfig> {
        self.llm
            .as_ref()
            .and_then(|llm| llm.providers.get(provider).cloned())
    }

    /// Resolve the LLM API key.
    ///
    /// Order: `MEDASSIST_API_KEY`, the provider's `apiKeyEnv`, then
    /// `GEMINI_API_KEY` for the gemini provider.
    pub fn resolve_api_key(&self, provider: &str) -> Option<String> {
        if let Some(ref key) = self.api_key {
            return Some(key.clone());
        }

        let env_var = match self.get_provider_config(provider) {
            Some(ProviderConfig::Gemini { api_key_env, .. }) => Some(api_key_env),
            Some(ProviderConfig::Ollama { .. }) => None,
            None if provider.eq_ignore_ascii_case("gemini") => {
                Some(DEFAULT_GEMINI_KEY_ENV.to_string())
            }
            None => None,
        };

        env_var
            .and_then(|var| std::env::var(var).ok())
            .filter(|key| !key.trim().is_empty())
    }

    /// Resolve the web search key. `None` means search is not configured.
    pub fn resolve_search_api_key(&self) -> Option<String> {
        std::env::var(&self.search.api_key_env)
            .ok()
            .filter(|key| !key.trim().is_empty())
    }

    /// Validate configuration for the active provider.
    pub fn validate(&self) -> AppResult<()> {
        let provider = self.provider.to_lowercase();
        let known_providers = ["gemini", "ollama"];

        if !known_providers.contains(&provider.as_str()) {
            return Err(AppError::Config(format!(
                "Unknown provider: {}. Supported: {}",
                self.provider,
                known_providers.join(", ")
            )));
        }

        if provider == "gemini" && self.resolve_api_key(&provider).is_none() {
            let env_var = match self.get_provider_config(&provider) {
                Some(ProviderConfig::Gemini { api_key_env, .. }) => api_key_env,
                _ => DEFAULT_GEMINI_KEY_ENV.to_string(),
            };
            return Err(AppError::Config(format!(
                "API key not found in environment variable: {}",
                env_var
            )));
        }

        if !self.search.provider.eq_ignore_ascii_case("tavily") {
            return Err(AppError::Config(format!(
                "Unknown search provider: {}. Supported: tavily",
                self.search.provider
            )));
        }

        if self.query.max_rows == 0 {
            return Err(AppError::Config(
                "query.maxRows must be greater than zero".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.provider, "gemini");
        assert_eq!(config.model, "gemini-2.5-flash");
        assert_eq!(config.search.max_results, 3);
        assert_eq!(config.query.max_rows, 1000);
        assert!(!config.verbose);
        assert!(!config.no_color);
    }

    #[test]
    fn test_medassist_dir() {
        let config = AppConfig::default();
        assert!(config.medassist_dir().ends_with(".medassist"));
    }

    #[test]
    fn test_dataset_paths_resolve_against_workspace() {
        let mut config = AppConfig::default();
        config.workspace = PathBuf::from("/srv/medassist");

        assert_eq!(
            config.dataset_path(Topic::Heart),
            PathBuf::from("/srv/medassist/databases/heart_disease.db")
        );
        assert_eq!(
            config.dataset_path(Topic::Diabetes),
            PathBuf::from("/srv/medassist/databases/diabetes.db")
        );
        assert_eq!(config.dataset_paths().len(), 3);
    }

    #[test]
    fn test_with_overrides() {
        let config = AppConfig::default();
        let overridden = config.with_overrides(
            None,
            None,
            Some("ollama".to_string()),
            Some("llama3.2".to_string()),
            None,
            true,
            false,
        );

        assert_eq!(overridden.provider, "ollama");
        assert_eq!(overridden.model, "llama3.2");
        assert!(overridden.verbose);
        assert_eq!(overridden.log_level, Some("debug".to_string()));
    }

    #[test]
    fn test_merge_yaml() {
        let yaml = r#"
llm:
  activeProvider: ollama
  providers:
    ollama:
      endpoint: "http://localhost:11434"
      model: "llama3.2"
    gemini:
      apiKeyEnv: MY_GEMINI_KEY
      model: gemini-2.5-pro
search:
  maxResults: 5
datasets:
  heart: /data/heart.db
query:
  maxRows: 50
logging:
  level: info
  color: false
"#;
        let merged = AppConfig::default().merge_yaml_str(yaml).unwrap();

        assert_eq!(merged.provider, "ollama");
        assert_eq!(merged.model, "llama3.2");
        assert_eq!(merged.search.max_results, 5);
        assert_eq!(merged.search.api_key_env, "TAVILY_API_KEY");
        assert_eq!(merged.dataset_path(Topic::Heart), PathBuf::from("/data/heart.db"));
        assert_eq!(merged.datasets.cancer, PathBuf::from("databases/cancer.db"));
        assert_eq!(merged.query.max_rows, 50);
        assert_eq!(merged.query.timeout_ms, 5000);
        assert_eq!(merged.log_level, Some("info".to_string()));
        assert!(merged.no_color);

        match merged.get_provider_config("gemini") {
            Some(ProviderConfig::Gemini { api_key_env, .. }) => {
                assert_eq!(api_key_env, "MY_GEMINI_KEY")
            }
            other => panic!("Expected gemini config, got {:?}", other),
        }
    }

    #[test]
    fn test_explicit_api_key_wins() {
        let mut config = AppConfig::default();
        config.api_key = Some("explicit".to_string());
        assert_eq!(config.resolve_api_key("gemini"), Some("explicit".to_string()));
    }

    #[test]
    fn test_validate_unknown_provider() {
        let mut config = AppConfig::default();
        config.provider = "unknown".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_ollama() {
        let mut config = AppConfig::default();
        config.provider = "ollama".to_string();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_rows_from_yaml() {
        let mut config = AppConfig::default()
            .merge_yaml_str("query:\n  maxRows: 0\n")
            .unwrap();
        config.provider = "ollama".to_string();

        assert_eq!(config.query.max_rows, 0);
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("maxRows"));
    }

    #[test]
    fn test_validate_unknown_search_provider() {
        let mut config = AppConfig::default();
        config.provider = "ollama".to_string();
        config.search.provider = "bing".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_zero_rows() {
        let mut config = AppConfig::default();
        config.provider = "ollama".to_string();
        config.query.max_rows = 0;
        assert!(config.validate().is_err());
    }
}
