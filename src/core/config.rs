use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::PathBuf;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    #[serde(default)]
    pub credentials: CredentialsConfig,
    #[serde(default)]
    pub model: ModelConfig,
    #[serde(default)]
    pub labels: LabelsConfig,
    pub logging: LoggingConfig,
    #[serde(default)]
    pub admin: AdminConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub port: Option<u16>,
    pub unix_socket: Option<PathBuf>,
    #[serde(default = "default_num_threads")]
    pub num_threads: usize,
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CredentialsConfig {
    #[serde(default = "default_credentials_path")]
    pub path: PathBuf,
}

/// Where the classifier artifact comes from and how its input is shaped
#[derive(Debug, Clone, Deserialize)]
pub struct ModelConfig {
    #[serde(default = "default_hub_endpoint")]
    pub hub_endpoint: String,
    #[serde(default = "default_repo_id")]
    pub repo_id: String,
    #[serde(default = "default_revision")]
    pub revision: String,
    #[serde(default = "default_model_filename")]
    pub filename: String,
    #[serde(default = "default_cache_dir")]
    pub cache_dir: PathBuf,
    /// Skips the hub entirely when set
    pub local_path: Option<PathBuf>,
    #[serde(default = "default_input_size")]
    pub input_size: u32,
    #[serde(default)]
    pub layout: InputLayout,
    #[serde(default = "default_download_timeout_secs")]
    pub download_timeout_secs: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputLayout {
    #[default]
    Nhwc,
    Nchw,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LabelsConfig {
    #[serde(default = "default_assets_dir")]
    pub assets_dir: PathBuf,
    /// Optional JSON file replacing the built-in label table
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
    #[serde(default = "default_console")]
    pub console: bool,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct AdminConfig {
    pub api_key: Option<String>,
}

// Default value functions
fn default_num_threads() -> usize {
    num_cpus::get()
}

fn default_max_upload_bytes() -> usize {
    10 * 1024 * 1024
}

fn default_credentials_path() -> PathBuf {
    PathBuf::from("users.json")
}

fn default_hub_endpoint() -> String {
    "https://huggingface.co".to_string()
}

fn default_repo_id() -> String {
    "hiddu2004/hello".to_string()
}

fn default_revision() -> String {
    "main".to_string()
}

fn default_model_filename() -> String {
    "final_model2.onnx".to_string()
}

fn default_cache_dir() -> PathBuf {
    PathBuf::from(".model-cache")
}

fn default_input_size() -> u32 {
    380
}

fn default_download_timeout_secs() -> u64 {
    300
}

fn default_assets_dir() -> PathBuf {
    PathBuf::from("assets")
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "json".to_string()
}

fn default_console() -> bool {
    false
}

impl Default for CredentialsConfig {
    fn default() -> Self {
        Self {
            path: default_credentials_path(),
        }
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            hub_endpoint: default_hub_endpoint(),
            repo_id: default_repo_id(),
            revision: default_revision(),
            filename: default_model_filename(),
            cache_dir: default_cache_dir(),
            local_path: None,
            input_size: default_input_size(),
            layout: InputLayout::default(),
            download_timeout_secs: default_download_timeout_secs(),
        }
    }
}

impl Default for LabelsConfig {
    fn default() -> Self {
        Self {
            assets_dir: default_assets_dir(),
            path: None,
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file(path: &PathBuf) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .context(format!("Failed to read config file: {}", path.display()))?;

        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)
            .context("Failed to parse config file")?;

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.server.port.is_none() && self.server.unix_socket.is_none() {
            bail!("Either port or unix_socket must be specified in server config");
        }

        if let Some(port) = self.server.port {
            if port == 0 {
                bail!("Server port must be greater than 0");
            }
        }

        if self.server.num_threads == 0 {
            bail!("num_threads must be greater than 0");
        }

        if self.server.max_upload_bytes == 0 {
            bail!("max_upload_bytes must be greater than 0");
        }

        if self.model.local_path.is_none() {
            if self.model.hub_endpoint.is_empty() {
                bail!("hub_endpoint must not be empty");
            }

            if self.model.repo_id.is_empty() {
                bail!("repo_id must not be empty");
            }

            if self.model.filename.is_empty() {
                bail!("model filename must not be empty");
            }
        }

        if self.model.input_size == 0 {
            bail!("input_size must be greater than 0");
        }

        if self.model.download_timeout_secs == 0 {
            bail!("download_timeout_secs must be greater than 0");
        }

        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.as_str()) {
            bail!(
                "Invalid log level '{}'. Must be one of: trace, debug, info, warn, error",
                self.logging.level
            );
        }

        let valid_formats = ["json", "console"];
        if !valid_formats.contains(&self.logging.format.as_str()) {
            bail!(
                "Invalid log format '{}'. Must be one of: json, console",
                self.logging.format
            );
        }

        if let Some(api_key) = &self.admin.api_key {
            if api_key.is_empty() {
                bail!("admin api_key must not be empty when set");
            }
        }

        Ok(())
    }
}
