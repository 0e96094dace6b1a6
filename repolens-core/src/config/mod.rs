//! Application configuration
//!
//! Configuration is layered: `config/default` file, then an optional
//! environment-specific file selected by `ENV`, then `config/local`, then
//! `REPOLENS__`-prefixed environment variables (highest priority).

use serde::{Deserialize, Serialize};

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub git: GitConfig,
    pub intel: IntelConfig,
    pub llm: LlmConfig,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Whether to expose interactive API docs (Swagger UI).
    pub enable_docs: bool,
    /// Global request timeout in seconds applied at the HTTP layer.
    /// Must cover a clone plus one or two model calls.
    pub request_timeout_seconds: u64,
    /// Allowed CORS origins. Use ["*"] to allow any (development only).
    pub allowed_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            enable_docs: true,
            request_timeout_seconds: 180,
            allowed_origins: vec!["*".to_string()],
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    /// Output format: "json" or "pretty".
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "json".to_string(),
        }
    }
}

/// Git acquisition configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GitConfig {
    /// Parent directory for per-job working directories.
    /// Defaults to `<system temp dir>/repolens` when empty.
    pub workdir_base: String,
    /// Timeout applied to the clone as a whole and to libgit2 network I/O.
    pub clone_timeout_seconds: u64,
}

impl Default for GitConfig {
    fn default() -> Self {
        Self {
            workdir_base: String::new(),
            clone_timeout_seconds: 60,
        }
    }
}

/// Intelligence pipeline configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IntelConfig {
    /// Time-to-live for an analysis job whose documentation stage is never
    /// invoked. The reaper releases the working directory afterwards.
    pub job_ttl_seconds: u64,
    /// Interval between reaper sweeps.
    pub reaper_interval_seconds: u64,
}

impl Default for IntelConfig {
    fn default() -> Self {
        Self {
            job_ttl_seconds: 1800,
            reaper_interval_seconds: 300,
        }
    }
}

/// LLM provider configuration
///
/// The API credential is not configured here: it arrives per request and is
/// forwarded to the provider call (absence degrades gracefully).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Base URL of an OpenAI-compatible chat-completions API.
    pub api_url: String,
    /// Default model to use.
    pub default_model: String,
    /// Temperature for generation (0.0 to 1.0).
    pub temperature: f64,
    /// Maximum tokens to generate.
    pub max_tokens: u32,
    /// Request timeout in seconds.
    pub timeout_seconds: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_url: "https://api.groq.com/openai/v1".to_string(),
            default_model: "llama-3.3-70b-versatile".to_string(),
            temperature: 0.2,
            max_tokens: 4096,
            timeout_seconds: 60,
        }
    }
}

impl Config {
    /// Load configuration from files and environment variables
    pub fn load() -> Result<Self, ConfigLoadError> {
        let mut builder = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false));

        if let Ok(env) = std::env::var("ENV") {
            builder = builder
                .add_source(config::File::with_name(&format!("config/{}", env)).required(false));
        }

        builder = builder
            .add_source(config::File::with_name("config/local").required(false))
            .add_source(config::Environment::with_prefix("REPOLENS").separator("__"));

        let config: Config = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the loaded configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.server.request_timeout_seconds == 0 {
            return Err(ValidationError::new(
                "server.request_timeout_seconds must be > 0",
            ));
        }
        if self.git.clone_timeout_seconds == 0 {
            return Err(ValidationError::new("git.clone_timeout_seconds must be > 0"));
        }
        if self.intel.job_ttl_seconds == 0 {
            return Err(ValidationError::new("intel.job_ttl_seconds must be > 0"));
        }
        if self.intel.reaper_interval_seconds == 0 {
            return Err(ValidationError::new(
                "intel.reaper_interval_seconds must be > 0",
            ));
        }
        if !(0.0..=1.0).contains(&self.llm.temperature) {
            return Err(ValidationError::new(
                "llm.temperature must be between 0.0 and 1.0",
            ));
        }
        if self.llm.max_tokens == 0 {
            return Err(ValidationError::new("llm.max_tokens must be > 0"));
        }
        if self.llm.api_url.is_empty() {
            return Err(ValidationError::new("llm.api_url must not be empty"));
        }
        Ok(())
    }
}

/// Error raised when a configuration value is out of range
#[derive(Debug, thiserror::Error)]
#[error("Configuration validation error: {0}")]
pub struct ValidationError(String);

impl ValidationError {
    fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// Error type for configuration loading
#[derive(Debug, thiserror::Error)]
pub enum ConfigLoadError {
    #[error("Configuration file error: {0}")]
    Config(#[from] config::ConfigError),

    #[error(transparent)]
    Validation(#[from] ValidationError),
}
