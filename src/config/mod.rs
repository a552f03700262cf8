use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable holding the LLM provider API key
pub const LLM_API_KEY_VAR: &str = "LLM_API_KEY";

/// Environment variable holding the session signing secret
pub const SESSION_SECRET_VAR: &str = "SESSION_SECRET";

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// General settings
    #[serde(default)]
    pub general: GeneralConfig,

    /// Web server settings
    #[serde(default)]
    pub web: WebConfig,

    /// Hosting provider (GitHub) settings
    #[serde(default)]
    pub github: GitHubConfig,

    /// LLM provider settings
    #[serde(default)]
    pub llm: LlmConfig,

    /// Data directory (where the database is stored)
    #[serde(default)]
    pub data_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebConfig {
    /// Port for the web server
    #[serde(default = "default_port")]
    pub port: u16,

    /// Host to bind to
    #[serde(default = "default_host")]
    pub host: String,

    /// Directory served under `/static`
    #[serde(default = "default_static_dir")]
    pub static_dir: PathBuf,

    /// How long a login stays valid
    #[serde(default = "default_session_ttl")]
    pub session_ttl_hours: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitHubConfig {
    /// Base URL of the public REST API
    #[serde(default = "default_github_api_url")]
    pub api_url: String,

    /// Base URL that source archives are downloaded from
    #[serde(default = "default_github_archive_url")]
    pub archive_url: String,

    /// Page size requested from the repository listing
    #[serde(default = "default_per_page")]
    pub per_page: u32,

    /// Timeout for archive downloads
    #[serde(default = "default_archive_timeout")]
    pub archive_timeout_seconds: u64,

    /// User-Agent sent with every request (GitHub rejects requests without one)
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Base URL of the OpenAI-compatible API
    #[serde(default = "default_llm_base_url")]
    pub base_url: String,

    /// Optional timeout for chat completions. Unset means wait indefinitely.
    #[serde(default)]
    pub request_timeout_seconds: Option<u64>,

    /// Repository review settings
    #[serde(default = "CompletionProfile::analysis")]
    pub analysis: CompletionProfile,

    /// Learning roadmap settings
    #[serde(default = "CompletionProfile::roadmap")]
    pub roadmap: CompletionProfile,

    /// Code evaluation settings
    #[serde(default = "CompletionProfile::evaluation")]
    pub evaluation: CompletionProfile,
}

/// Model parameters for one kind of chat completion
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionProfile {
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

const REVIEW_MODEL: &str = "baidu/ernie-4.5-vl-424b-a47b";
const THINKING_MODEL: &str = "baidu/ernie-4.5-21B-a3b-thinking";

impl CompletionProfile {
    pub fn analysis() -> Self {
        Self {
            model: REVIEW_MODEL.to_string(),
            temperature: 0.2,
            max_tokens: 3000,
        }
    }

    pub fn roadmap() -> Self {
        Self {
            model: THINKING_MODEL.to_string(),
            temperature: 0.1,
            max_tokens: 6000,
        }
    }

    pub fn evaluation() -> Self {
        Self {
            model: THINKING_MODEL.to_string(),
            temperature: 0.1,
            max_tokens: 1024,
        }
    }
}

// Default value functions
fn default_log_level() -> String {
    "info".to_string()
}

fn default_port() -> u16 {
    8430
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_static_dir() -> PathBuf {
    PathBuf::from("static")
}

fn default_session_ttl() -> u64 {
    24 * 7
}

fn default_github_api_url() -> String {
    "https://api.github.com".to_string()
}

fn default_github_archive_url() -> String {
    "https://github.com".to_string()
}

fn default_per_page() -> u32 {
    100
}

fn default_archive_timeout() -> u64 {
    30
}

fn default_user_agent() -> String {
    concat!("repolens/", env!("CARGO_PKG_VERSION")).to_string()
}

fn default_llm_base_url() -> String {
    "https://api.novita.ai/openai".to_string()
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

impl WebConfig {
    pub fn session_ttl(&self) -> Duration {
        Duration::from_secs(self.session_ttl_hours.saturating_mul(3600))
    }
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            host: default_host(),
            static_dir: default_static_dir(),
            session_ttl_hours: default_session_ttl(),
        }
    }
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            api_url: default_github_api_url(),
            archive_url: default_github_archive_url(),
            per_page: default_per_page(),
            archive_timeout_seconds: default_archive_timeout(),
            user_agent: default_user_agent(),
        }
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: default_llm_base_url(),
            request_timeout_seconds: None,
            analysis: CompletionProfile::analysis(),
            roadmap: CompletionProfile::roadmap(),
            evaluation: CompletionProfile::evaluation(),
        }
    }
}

impl Config {
    /// Load configuration from file, or use defaults if not found
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config_path = path.map(PathBuf::from).or_else(Self::default_config_path);

        let config = match config_path {
            Some(ref path) if path.exists() => {
                let contents = std::fs::read_to_string(path)
                    .with_context(|| format!("Failed to read config from {:?}", path))?;
                toml::from_str(&contents)
                    .with_context(|| format!("Failed to parse config from {:?}", path))?
            }
            _ => Config::default(),
        };

        Ok(config)
    }

    /// Save configuration to file
    pub fn save(&self, path: Option<&Path>) -> Result<()> {
        let config_path = path
            .map(PathBuf::from)
            .or_else(Self::default_config_path)
            .context("No config path available")?;

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory: {:?}", parent))?;
        }

        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(&config_path, contents)
            .with_context(|| format!("Failed to write config to {:?}", config_path))?;

        Ok(())
    }

    /// Get the default configuration file path
    pub fn default_config_path() -> Option<PathBuf> {
        ProjectDirs::from("com", "repolens", "repolens")
            .map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Get the data directory path
    pub fn data_dir(&self) -> PathBuf {
        self.data_dir.clone().unwrap_or_else(|| {
            ProjectDirs::from("com", "repolens", "repolens")
                .map(|dirs| dirs.data_dir().to_path_buf())
                .unwrap_or_else(|| PathBuf::from(".repolens"))
        })
    }

    /// Get the database file path
    pub fn database_path(&self) -> PathBuf {
        self.data_dir().join("repolens.db")
    }

    /// Where the most recently generated roadmap is exported
    pub fn roadmap_export_path(&self) -> PathBuf {
        self.web.static_dir.join("data").join("skill.json")
    }
}

/// Secrets read from the environment rather than the config file
#[derive(Clone)]
pub struct Secrets {
    pub llm_api_key: String,
    /// Empty when unset; cookies are then signed with a random per-process key
    pub session_secret: String,
}

impl std::fmt::Debug for Secrets {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Secrets")
            .field("llm_api_key", &"<redacted>")
            .field("session_secret", &"<redacted>")
            .finish()
    }
}

impl Secrets {
    /// Read secrets from the process environment
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read secrets through an arbitrary lookup function
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let llm_api_key = lookup(LLM_API_KEY_VAR)
            .filter(|key| !key.trim().is_empty())
            .with_context(|| format!("{} not set", LLM_API_KEY_VAR))?;

        let session_secret = lookup(SESSION_SECRET_VAR).unwrap_or_else(|| {
            tracing::warn!(
                "{} not set; session cookies are signed with a random key",
                SESSION_SECRET_VAR
            );
            String::new()
        });

        Ok(Self {
            llm_api_key,
            session_secret,
        })
    }
}
