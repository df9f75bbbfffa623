//! Application configuration.
//!
//! Precedence, lowest first: built-in defaults, the YAML config file,
//! `DOCINSIGHTS_`-prefixed environment variables (`DOCINSIGHTS_SERVER__PORT`),
//! then command-line flags and their environment aliases (`PORT`).

use std::path::Path;
use std::time::Duration;

use clap::Parser;
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

use crate::insights::DEFAULT_TEMPERATURE;
use crate::llm::{DEFAULT_BASE_URL, LlmSettings, ModelChoice, Provider};

/// Config file read when no path is given.
const DEFAULT_CONFIG_FILE: &str = "config.yaml";

/// API version used for Azure deployments when none is configured.
const DEFAULT_AZURE_API_VERSION: &str = "2024-08-01-preview";

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Config file path
    #[arg(short, long, env = "CONFIG_FILE")]
    pub config: Option<String>,

    /// Address to bind
    #[arg(long, env = "HOST")]
    pub host: Option<String>,

    /// Port to listen on
    #[arg(long, env = "PORT")]
    pub port: Option<u16>,

    /// Base URL of the chat-completion API
    #[arg(long, env = "LLM_BASE_URL")]
    pub llm_base_url: Option<String>,

    /// Fallback API key used when a request does not carry one
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub llm: LlmConfig,
    pub session: SessionConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Request body limit for uploads.
    pub max_upload_bytes: usize,
}

#[derive(Deserialize, Clone)]
pub struct LlmConfig {
    pub base_url: String,
    /// Server-side credential. Requests may supply their own.
    #[serde(default)]
    pub api_key: Option<String>,
    pub default_model: ModelChoice,
    pub default_temperature: f64,
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,
    /// Azure deployment name; defaults to the model id.
    #[serde(default)]
    pub azure_deployment: Option<String>,
    #[serde(default)]
    pub azure_api_version: Option<String>,
}

impl std::fmt::Debug for LlmConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("default_model", &self.default_model)
            .field("default_temperature", &self.default_temperature)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("azure_deployment", &self.azure_deployment)
            .field("azure_api_version", &self.azure_api_version)
            .finish()
    }
}

impl LlmConfig {
    /// Configured credential, ignoring blank values.
    #[must_use]
    pub fn api_key(&self) -> Option<&str> {
        self.api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
    }

    /// Connection settings for the completion driver.
    #[must_use]
    pub fn settings(&self) -> LlmSettings {
        let mut settings = LlmSettings::for_base_url(self.base_url.trim());

        // Both keys set means Azure, even behind a proxy URL.
        let azure_configured =
            present(self.azure_deployment.as_deref()) && present(self.azure_api_version.as_deref());

        if azure_configured || matches!(settings.provider, Provider::AzureOpenAI { .. }) {
            settings.provider = Provider::AzureOpenAI {
                deployment_name: self.azure_deployment.clone().unwrap_or_default(),
                api_version: self
                    .azure_api_version
                    .clone()
                    .unwrap_or_else(|| DEFAULT_AZURE_API_VERSION.to_string()),
            };
        }
        settings.request_timeout = self.request_timeout_secs.map(Duration::from_secs);
        settings
    }
}

fn present(value: Option<&str>) -> bool {
    value.is_some_and(|v| !v.trim().is_empty())
}

#[derive(Debug, Deserialize, Clone)]
pub struct SessionConfig {
    /// Sessions idle longer than this are dropped.
    pub idle_timeout_secs: u64,
}

impl SessionConfig {
    #[must_use]
    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout_secs)
    }
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from_args(std::env::args())
    }

    pub fn load_from_args<I, T>(args: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        let cli = Cli::try_parse_from(args).map_err(|e| ConfigError::Message(e.to_string()))?;

        let mut builder = Config::builder()
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 3000)?
            .set_default("server.max_upload_bytes", 200 * 1024 * 1024)?
            .set_default("llm.base_url", DEFAULT_BASE_URL)?
            .set_default("llm.default_model", ModelChoice::default().id())?
            .set_default("llm.default_temperature", DEFAULT_TEMPERATURE)?
            .set_default("session.idle_timeout_secs", 30 * 60)?;

        builder = match cli.config.as_deref() {
            Some(path) => builder.add_source(File::from(Path::new(path)).required(true)),
            None => builder.add_source(File::with_name(DEFAULT_CONFIG_FILE).required(false)),
        };

        builder = builder.add_source(
            Environment::with_prefix("DOCINSIGHTS")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        if let Some(host) = cli.host {
            builder = builder.set_override("server.host", host)?;
        }
        if let Some(port) = cli.port {
            builder = builder.set_override("server.port", port)?;
        }
        if let Some(base_url) = cli.llm_base_url {
            builder = builder.set_override("llm.base_url", base_url)?;
        }
        if let Some(api_key) = cli.api_key {
            builder = builder.set_override("llm.api_key", api_key)?;
        }

        let config: Self = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let temperature = self.llm.default_temperature;
        if !(0.0..=1.0).contains(&temperature) {
            return Err(ConfigError::Message(format!(
                "llm.default_temperature must be between 0.0 and 1.0, got {temperature}"
            )));
        }
        if self.llm.base_url.trim().is_empty() {
            return Err(ConfigError::Message(
                "llm.base_url cannot be empty".to_string(),
            ));
        }
        if self.server.max_upload_bytes == 0 {
            return Err(ConfigError::Message(
                "server.max_upload_bytes must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}
