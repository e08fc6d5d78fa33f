//! Configuration loading and management

use anyhow::{Context, Result, bail};
use room_watch_adapters::telegram::{ChatTarget, DEFAULT_API_URL};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Top-level configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub general: GeneralConfig,

    #[serde(default)]
    pub source: SourceConfig,

    #[serde(default)]
    pub telegram: TelegramConfig,

    #[serde(default)]
    pub schedule: ScheduleConfig,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StateBackend {
    #[default]
    File,
    Sqlite,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    #[serde(default = "default_state_path")]
    pub state_path: PathBuf,

    #[serde(default)]
    pub state_backend: StateBackend,

    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub log_format: LogFormat,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default = "default_take")]
    pub take: u32,

    #[serde(default = "default_source_timeout")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramConfig {
    #[serde(default = "default_bot_token_env")]
    pub bot_token_env: String,

    #[serde(default = "default_chat_id_env")]
    pub chat_id_env: String,

    #[serde(default = "default_api_url")]
    pub api_url: String,

    #[serde(default = "default_true")]
    pub echo_enabled: bool,

    #[serde(default = "default_poll_timeout")]
    pub poll_timeout_secs: u64,

    #[serde(default = "default_retry_pause")]
    pub retry_pause_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleConfig {
    #[serde(default = "default_retry_interval")]
    pub retry_interval_secs: u64,

    #[serde(default = "default_send_interval")]
    pub send_interval_secs: u64,
}

// Default value functions
fn default_state_path() -> PathBuf {
    PathBuf::from("./seen.csv")
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_base_url() -> String {
    "https://rooms.vestide.nl".to_string()
}

fn default_take() -> u32 {
    999
}

fn default_source_timeout() -> u64 {
    30
}

fn default_bot_token_env() -> String {
    "TELEGRAM_TOKEN".to_string()
}

fn default_chat_id_env() -> String {
    "TELEGRAM_CHAT_ID".to_string()
}

fn default_api_url() -> String {
    DEFAULT_API_URL.to_string()
}

fn default_true() -> bool {
    true
}

fn default_poll_timeout() -> u64 {
    10
}

fn default_retry_pause() -> u64 {
    5
}

fn default_retry_interval() -> u64 {
    600
}

fn default_send_interval() -> u64 {
    5
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            state_path: default_state_path(),
            state_backend: StateBackend::default(),
            log_level: default_log_level(),
            log_format: LogFormat::default(),
        }
    }
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            take: default_take(),
            timeout_secs: default_source_timeout(),
        }
    }
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            bot_token_env: default_bot_token_env(),
            chat_id_env: default_chat_id_env(),
            api_url: default_api_url(),
            echo_enabled: default_true(),
            poll_timeout_secs: default_poll_timeout(),
            retry_pause_secs: default_retry_pause(),
        }
    }
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            retry_interval_secs: default_retry_interval(),
            send_interval_secs: default_send_interval(),
        }
    }
}

impl AppConfig {
    /// Load configuration from file and environment
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        let mut builder = config::Config::builder();

        // Try default config path if none specified
        let default_path = PathBuf::from("./config.toml");
        let path = config_path.unwrap_or(&default_path);

        if path.exists() {
            builder = builder.add_source(config::File::from(path));
        } else if config_path.is_some() {
            // User specified a path that doesn't exist
            bail!("Config file not found: {}", path.display());
        }

        // Add environment variable overrides
        builder = builder.add_source(
            config::Environment::with_prefix("ROOM_WATCH")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build().context("Failed to build configuration")?;

        config
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }

    /// Generate example configuration as TOML string
    pub fn example_toml() -> String {
        r#"# room-watch configuration

[general]
state_path = "./seen.csv"
state_backend = "file"  # file, sqlite
log_level = "info"
log_format = "text"  # text, json

[source]
base_url = "https://rooms.vestide.nl"
take = 999
timeout_secs = 30

[telegram]
# Names of the environment variables holding the credentials
bot_token_env = "TELEGRAM_TOKEN"
chat_id_env = "TELEGRAM_CHAT_ID"
api_url = "https://api.telegram.org"
echo_enabled = true
poll_timeout_secs = 10
retry_pause_secs = 5

[schedule]
retry_interval_secs = 600
send_interval_secs = 5
"#
        .to_string()
    }
}

/// Read a required secret from the named environment variable
pub fn load_secret(env_var: &str, what: &str) -> Result<SecretString> {
    let value = load_required_env(env_var, what)?;
    Ok(SecretString::new(value.into()))
}

/// Read and parse the target chat from the named environment variable
pub fn load_chat_target(env_var: &str) -> Result<ChatTarget> {
    let value = load_required_env(env_var, "chat id")?;
    value
        .parse()
        .with_context(|| format!("Env var {} does not hold a valid chat id", env_var))
}

fn load_required_env(env_var: &str, what: &str) -> Result<String> {
    if env_var.trim().is_empty() {
        bail!("No env var configured for the {}", what);
    }

    let value = std::env::var(env_var)
        .with_context(|| format!("Missing env var {} for the {}", env_var, what))?;

    if value.trim().is_empty() {
        bail!("Env var {} for the {} is empty", env_var, what);
    }

    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn example_toml_parses_to_defaults() {
        let parsed: AppConfig = config::Config::builder()
            .add_source(config::File::from_str(
                &AppConfig::example_toml(),
                config::FileFormat::Toml,
            ))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(parsed.general.state_backend, StateBackend::File);
        assert_eq!(parsed.general.log_format, LogFormat::Text);
        assert_eq!(parsed.source.take, 999);
        assert_eq!(parsed.telegram.bot_token_env, "TELEGRAM_TOKEN");
        assert!(parsed.telegram.echo_enabled);
        assert_eq!(parsed.schedule.retry_interval_secs, 600);
        assert_eq!(parsed.schedule.send_interval_secs, 5);
    }

    #[test]
    fn empty_sections_fall_back_to_defaults() {
        let parsed: AppConfig = config::Config::builder()
            .add_source(config::File::from_str(
                "[general]\nstate_backend = \"sqlite\"\n",
                config::FileFormat::Toml,
            ))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(parsed.general.state_backend, StateBackend::Sqlite);
        assert_eq!(parsed.general.state_path, PathBuf::from("./seen.csv"));
        assert_eq!(parsed.source.base_url, "https://rooms.vestide.nl");
        assert_eq!(parsed.telegram.chat_id_env, "TELEGRAM_CHAT_ID");
    }

    #[test]
    fn blank_env_var_name_is_rejected() {
        assert!(load_secret("  ", "bot token").is_err());
    }

    #[test]
    fn unset_env_var_is_rejected() {
        let error = load_chat_target("ROOM_WATCH_TEST_SURELY_UNSET_CHAT_ID").unwrap_err();
        assert!(error.to_string().contains("ROOM_WATCH_TEST_SURELY_UNSET_CHAT_ID"));
    }
}
