use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::fs;
use tracing::{info, warn};

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct Environment {
    #[serde(default = "default_env_type")]
    pub env_type: String,
}

impl Default for Environment {
    fn default() -> Self {
        Self { env_type: default_env_type() }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { host: default_host(), port: default_port() }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct LimitsConfig {
    #[serde(default = "default_max_body_size_mb")]
    pub max_body_size_mb: usize,
    #[serde(default = "default_max_targets_per_request")]
    pub max_targets_per_request: usize,
    #[serde(default = "default_max_stages_per_sequence")]
    pub max_stages_per_sequence: usize,
    #[serde(default = "default_request_timeout_seconds")]
    pub request_timeout_seconds: u64,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_body_size_mb: default_max_body_size_mb(),
            max_targets_per_request: default_max_targets_per_request(),
            max_stages_per_sequence: default_max_stages_per_sequence(),
            request_timeout_seconds: default_request_timeout_seconds(),
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl std::str::FromStr for LogFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pretty" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            other => Err(anyhow::anyhow!("unknown log format '{other}'")),
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct LoggingConfig {
    #[serde(default)]
    pub format: LogFormat,
    /// Default `EnvFilter` directive when `RUST_LOG` is unset
    #[serde(default = "default_log_filter")]
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { format: LogFormat::default(), filter: default_log_filter() }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, Default)]
pub struct CatalogConfig {
    /// JSON file with `items` and `priceTiers` loaded into the in-memory catalog
    #[serde(default)]
    pub seed_path: Option<String>,
}

#[derive(Deserialize, Serialize, Debug, Clone, Default)]
pub struct EstimoConfig {
    #[serde(default)]
    pub environment: Environment,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub limits: LimitsConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub catalog: CatalogConfig,
}

impl EstimoConfig {
    /// Load from `ESTIMO_CONFIG_PATH` (default `estimo.toml`). A missing file
    /// falls back to defaults; a malformed one is an error.
    pub fn load() -> anyhow::Result<Self> {
        let config_path =
            std::env::var("ESTIMO_CONFIG_PATH").unwrap_or_else(|_| "estimo.toml".to_string());

        match fs::read_to_string(&config_path) {
            Ok(config_str) => Self::from_toml(&config_str)
                .with_context(|| format!("Failed to parse configuration file '{config_path}'")),
            Err(_) => {
                warn!(
                    "Configuration file '{}' not found. Using default configuration.",
                    config_path
                );
                Ok(Self::default())
            }
        }
    }

    pub fn from_toml(config_str: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(config_str)?)
    }

    pub fn apply_profile(mut self) -> Self {
        info!(
            "Applying configuration profile for '{}' environment.",
            self.environment.env_type
        );

        if let Ok(host) = std::env::var("ESTIMO_HOST") {
            self.server.host = host;
        }
        if let Ok(port) = std::env::var("ESTIMO_PORT") {
            if let Ok(port_num) = port.parse::<u16>() {
                self.server.port = port_num;
            }
        }
        if let Ok(max_targets) = std::env::var("ESTIMO_MAX_TARGETS_PER_REQUEST") {
            if let Ok(max_targets_num) = max_targets.parse::<usize>() {
                self.limits.max_targets_per_request = max_targets_num;
            }
        }
        if let Ok(timeout) = std::env::var("ESTIMO_REQUEST_TIMEOUT_SECONDS") {
            if let Ok(timeout_num) = timeout.parse::<u64>() {
                self.limits.request_timeout_seconds = timeout_num;
            }
        }
        if let Ok(seed_path) = std::env::var("ESTIMO_CATALOG_SEED") {
            self.catalog.seed_path = Some(seed_path);
        }
        if let Ok(format) = std::env::var("ESTIMO_LOG_FORMAT") {
            match format.parse::<LogFormat>() {
                Ok(format) => self.logging.format = format,
                Err(err) => warn!("Ignoring ESTIMO_LOG_FORMAT: {}", err),
            }
        }

        self
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

fn default_env_type() -> String {
    "default".to_string()
}
fn default_host() -> String {
    "127.0.0.1".to_string()
}
fn default_port() -> u16 {
    3000
}
fn default_max_body_size_mb() -> usize {
    16
}
fn default_max_targets_per_request() -> usize {
    1000
}
fn default_max_stages_per_sequence() -> usize {
    64
}
fn default_request_timeout_seconds() -> u64 {
    60
}
fn default_log_filter() -> String {
    "estimo_api=info,estimo_core=info,tower_http=info".to_string()
}
