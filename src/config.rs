use serde::Deserialize;
use std::{
    fmt, fs,
    path::{Path, PathBuf},
};
use url::Url;

use crate::error::{Error, Result};

pub const DEFAULT_TARGET_URL: &str =
    "https://official-goods-store.jp/sumika/v2/product/detail/SMK272";
pub const DEFAULT_BROADCAST_URL: &str = "https://api.line.me/v2/bot/message/broadcast";
pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (compatible; StockWatch/1.0; +https://example.local)";
pub const DEFAULT_STATE_FILE: &str = ".stockwatch_state.json";
pub const DEFAULT_CHECK_INTERVAL_SECS: u64 = 300;
pub const DEFAULT_TIMEOUT_SECS: u64 = 20;

/// Environment variable naming an explicit TOML config file.
pub const CONFIG_PATH_VAR: &str = "STOCKWATCH_CONFIG";

/// Optional on-disk configuration. Every key may be omitted; environment
/// variables take precedence over whatever is set here.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub target_url: Option<String>,
    pub access_token: Option<String>,
    pub check_interval_secs: Option<u64>,
    pub timeout_secs: Option<u64>,
    pub run_once: Option<bool>,
    pub state_file: Option<PathBuf>,
    pub broadcast_url: Option<String>,
    pub user_agent: Option<String>,
}

impl FileConfig {
    /// Reads a TOML config file.
    ///
    /// # Errors
    ///
    /// [`Error::Io`] if the file cannot be read, [`Error::TomlParse`] if it is
    /// not valid TOML for this struct.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<FileConfig> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }
}

/// Validated runtime configuration, built once at startup and handed to each
/// component when it is constructed.
#[derive(Clone)]
pub struct Config {
    pub target_url: Url,
    pub access_token: String,
    pub check_interval_secs: u64,
    pub timeout_secs: u64,
    pub run_once: bool,
    pub state_file: PathBuf,
    pub broadcast_url: Url,
    pub user_agent: String,
}

impl Config {
    /// Loads the configuration from the optional TOML file and the process
    /// environment (including a `.env` file, if present).
    ///
    /// The TOML file is read from `STOCKWATCH_CONFIG` when set, otherwise from
    /// `<config_dir>/stockwatch/config.toml` if that file exists.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] when the access token is missing or a value
    /// fails validation, and I/O or TOML errors for an unreadable config file.
    pub fn load() -> Result<Config> {
        let file = match dotenvy::var(CONFIG_PATH_VAR) {
            Ok(path) => FileConfig::load(path)?,
            Err(_) => match default_config_path() {
                Some(path) if path.is_file() => FileConfig::load(path)?,
                _ => FileConfig::default(),
            },
        };

        Self::from_sources(file, |key| dotenvy::var(key).ok())
    }

    /// Merges `file` with values returned by `env`, the latter winning, and
    /// validates the result.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] or [`Error::UrlParse`] on invalid input.
    pub fn from_sources<F>(file: FileConfig, env: F) -> Result<Config>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = |key: &str| env(key).filter(|value| !value.trim().is_empty());

        let access_token = env("LINE_CHANNEL_ACCESS_TOKEN")
            .or(file.access_token)
            .filter(|token| !token.trim().is_empty())
            .ok_or_else(|| Error::Config("LINE_CHANNEL_ACCESS_TOKEN is not set".to_string()))?;

        let target_url = env("TARGET_URL")
            .or(file.target_url)
            .unwrap_or_else(|| DEFAULT_TARGET_URL.to_string());
        let broadcast_url = env("LINE_BROADCAST_URL")
            .or(file.broadcast_url)
            .unwrap_or_else(|| DEFAULT_BROADCAST_URL.to_string());

        let check_interval_secs = match env("CHECK_INTERVAL_SECONDS") {
            Some(raw) => parse_secs("CHECK_INTERVAL_SECONDS", &raw)?,
            None => file
                .check_interval_secs
                .unwrap_or(DEFAULT_CHECK_INTERVAL_SECS),
        };
        let timeout_secs = match env("REQUEST_TIMEOUT_SECONDS") {
            Some(raw) => parse_secs("REQUEST_TIMEOUT_SECONDS", &raw)?,
            None => file.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS),
        };
        if check_interval_secs == 0 || timeout_secs == 0 {
            return Err(Error::Config(
                "check interval and request timeout must be greater than zero".to_string(),
            ));
        }

        let run_once = match env("RUN_ONCE") {
            Some(raw) => is_truthy(&raw),
            None => file.run_once.unwrap_or(false),
        };

        Ok(Config {
            target_url: Url::parse(&target_url)?,
            access_token,
            check_interval_secs,
            timeout_secs,
            run_once,
            state_file: env("STATE_FILE")
                .map(PathBuf::from)
                .or(file.state_file)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_STATE_FILE)),
            broadcast_url: Url::parse(&broadcast_url)?,
            user_agent: env("USER_AGENT")
                .or(file.user_agent)
                .unwrap_or_else(|| DEFAULT_USER_AGENT.to_string()),
        })
    }
}

// Keeps the access token out of logs.
impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("target_url", &self.target_url.as_str())
            .field("access_token", &"<redacted>")
            .field("check_interval_secs", &self.check_interval_secs)
            .field("timeout_secs", &self.timeout_secs)
            .field("run_once", &self.run_once)
            .field("state_file", &self.state_file)
            .field("broadcast_url", &self.broadcast_url.as_str())
            .field("user_agent", &self.user_agent)
            .finish()
    }
}

fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("stockwatch").join("config.toml"))
}

fn parse_secs(key: &str, raw: &str) -> Result<u64> {
    raw.trim()
        .parse()
        .map_err(|_| Error::Config(format!("{key} must be a whole number of seconds, got {raw:?}")))
}

fn is_truthy(raw: &str) -> bool {
    matches!(raw.trim().to_lowercase().as_str(), "1" | "true" | "yes")
}
