//! Configuration for the wrtfleet CLI.
//!
//! TOML file + `WRTFLEET_` environment overrides, credential resolution
//! (env var → system keyring → plaintext), and translation to the core's
//! `SyncConfig` and `Router` types.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::{BaseDirs, ProjectDirs};
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use ipnetwork::Ipv4Network;
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use wrtfleet_core::{Credentials, Router, SyncConfig};

/// Keyring service name for stored secrets.
const KEYRING_SERVICE: &str = "wrtfleet";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("no credentials configured for router '{router}'")]
    NoCredentials { router: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub sync: SyncSection,

    #[serde(default)]
    pub alerts: AlertsSection,

    /// Managed routers, keyed by router id.
    #[serde(default)]
    pub routers: BTreeMap<String, RouterEntry>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct SyncSection {
    /// Seconds between periodic syncs; 0 disables.
    #[serde(default = "default_interval")]
    pub interval_secs: u64,

    #[serde(default = "default_concurrency")]
    pub command_concurrency: usize,

    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,

    #[serde(default = "default_dns_timeout")]
    pub dns_timeout_ms: u64,

    #[serde(default = "default_true")]
    pub sweep: bool,

    /// CIDR to ping-sweep; defaults to the gateway's /24.
    pub sweep_subnet: Option<String>,

    #[serde(default = "default_register_delay")]
    pub register_sync_delay_secs: u64,

    /// Where router status and client names are persisted.
    pub state_file: Option<PathBuf>,
}

impl Default for SyncSection {
    fn default() -> Self {
        Self {
            interval_secs: default_interval(),
            command_concurrency: default_concurrency(),
            connect_timeout_secs: default_connect_timeout(),
            dns_timeout_ms: default_dns_timeout(),
            sweep: true,
            sweep_subnet: None,
            register_sync_delay_secs: default_register_delay(),
            state_file: None,
        }
    }
}

fn default_interval() -> u64 {
    60
}
fn default_concurrency() -> usize {
    wrtfleet_core::config::DEFAULT_COMMAND_CONCURRENCY
}
fn default_connect_timeout() -> u64 {
    10
}
fn default_dns_timeout() -> u64 {
    1500
}
fn default_true() -> bool {
    true
}
fn default_register_delay() -> u64 {
    3
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct AlertsSection {
    /// Environment variable holding the Telegram bot token.
    pub telegram_bot_token_env: Option<String>,

    /// Bot token (plaintext; prefer keyring or env var).
    pub telegram_bot_token: Option<String>,

    pub telegram_chat_id: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthKind {
    #[default]
    Password,
    Key,
}

/// One managed router.
#[derive(Debug, Deserialize, Serialize)]
pub struct RouterEntry {
    pub address: String,

    /// Display name; defaults to the router id.
    pub name: Option<String>,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_username")]
    pub username: String,

    #[serde(default)]
    pub auth: AuthKind,

    /// Environment variable containing the password.
    pub password_env: Option<String>,

    /// Password (plaintext; prefer keyring or env var).
    pub password: Option<String>,

    /// Private key file for `auth = "key"`. A leading `~/` is expanded.
    pub key_path: Option<PathBuf>,

    /// Environment variable containing the key passphrase.
    pub key_passphrase_env: Option<String>,

    /// DHCP-authoritative gateway.
    #[serde(default)]
    pub gateway: bool,
}

fn default_port() -> u16 {
    22
}
fn default_username() -> String {
    "root".into()
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("dev", "wrtfleet", "wrtfleet").map_or_else(
        || dirs_fallback().join("config.toml"),
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

/// Default state file location, next to other per-user data.
pub fn default_state_path() -> PathBuf {
    ProjectDirs::from("dev", "wrtfleet", "wrtfleet").map_or_else(
        || dirs_fallback().join("state.json"),
        |dirs| dirs.data_dir().join("state.json"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("wrtfleet");
    p
}

// ── Config loading ──────────────────────────────────────────────────

fn file_figment(path: &Path) -> Figment {
    Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
}

/// Load the full Config from `path` + environment.
///
/// A missing file is not an error. Environment keys nest with `__`,
/// e.g. `WRTFLEET_SYNC__INTERVAL_SECS=30`.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let config: Config = file_figment(path)
        .merge(Env::prefixed("WRTFLEET_").split("__"))
        .extract()?;
    Ok(config)
}

/// Load only what is written in `path`, for editing and saving back.
/// Environment overrides are left out so they never end up in the file.
pub fn load_config_file(path: &Path) -> Result<Config, ConfigError> {
    let config: Config = file_figment(path).extract()?;
    Ok(config)
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write it to `path`.
pub fn save_config(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

// ── Translation to core types ───────────────────────────────────────

impl SyncSection {
    pub fn to_sync_config(&self) -> Result<SyncConfig, ConfigError> {
        let sweep_subnet = self
            .sweep_subnet
            .as_deref()
            .map(|cidr| {
                cidr.parse::<Ipv4Network>()
                    .map_err(|e| ConfigError::Validation {
                        field: "sync.sweep_subnet".into(),
                        reason: e.to_string(),
                    })
            })
            .transpose()?;

        if self.command_concurrency == 0 {
            return Err(ConfigError::Validation {
                field: "sync.command_concurrency".into(),
                reason: "must be at least 1".into(),
            });
        }

        Ok(SyncConfig {
            interval: Duration::from_secs(self.interval_secs),
            command_concurrency: self.command_concurrency,
            ready_timeout: Duration::from_secs(self.connect_timeout_secs),
            dns_timeout: Duration::from_millis(self.dns_timeout_ms),
            sweep: self.sweep,
            sweep_subnet,
            register_sync_delay: Duration::from_secs(self.register_sync_delay_secs),
        })
    }

    pub fn state_path(&self) -> PathBuf {
        self.state_file.clone().unwrap_or_else(default_state_path)
    }
}

impl Config {
    /// Every configured router with credentials resolved.
    pub fn routers(&self) -> Result<Vec<Router>, ConfigError> {
        self.routers
            .iter()
            .map(|(id, entry)| entry.to_router(id))
            .collect()
    }
}

impl RouterEntry {
    /// Password-authenticated `root@address:22`, credentials still unset.
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            name: None,
            port: default_port(),
            username: default_username(),
            auth: AuthKind::Password,
            password_env: None,
            password: None,
            key_path: None,
            key_passphrase_env: None,
            gateway: false,
        }
    }

    pub fn with_password_env(mut self, var: impl Into<String>) -> Self {
        self.password_env = Some(var.into());
        self
    }

    /// Switch to key authentication with the given key file.
    pub fn with_key_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.auth = AuthKind::Key;
        self.key_path = Some(path.into());
        self
    }

    pub fn to_router(&self, id: &str) -> Result<Router, ConfigError> {
        if self.address.trim().is_empty() {
            return Err(ConfigError::Validation {
                field: format!("routers.{id}.address"),
                reason: "must not be empty".into(),
            });
        }
        let credentials = resolve_credentials(self, id)?;
        Ok(Router::new(id, self.address.trim(), &self.username, credentials)
            .with_port(self.port)
            .with_name(self.name.as_deref().unwrap_or(id))
            .gateway(self.gateway))
    }
}

// ── Credential resolution ───────────────────────────────────────────

fn keyring_secret(account: &str) -> Option<SecretString> {
    let entry = keyring::Entry::new(KEYRING_SERVICE, account).ok()?;
    entry.get_password().ok().map(SecretString::from)
}

fn env_secret(var: Option<&str>) -> Option<SecretString> {
    var.and_then(|name| std::env::var(name).ok())
        .map(SecretString::from)
}

/// Resolve a router's login credentials.
pub fn resolve_credentials(entry: &RouterEntry, router: &str) -> Result<Credentials, ConfigError> {
    match entry.auth {
        AuthKind::Password => resolve_password(entry, router).map(Credentials::Password),
        AuthKind::Key => {
            let path = entry
                .key_path
                .as_deref()
                .ok_or_else(|| ConfigError::NoCredentials {
                    router: router.into(),
                })?;
            let key = std::fs::read_to_string(expand_home(path))?;
            Ok(Credentials::PrivateKey {
                key: SecretString::from(key),
                passphrase: env_secret(entry.key_passphrase_env.as_deref()),
            })
        }
    }
}

fn resolve_password(entry: &RouterEntry, router: &str) -> Result<SecretString, ConfigError> {
    // 1. Env var named by the entry
    if let Some(secret) = env_secret(entry.password_env.as_deref()) {
        return Ok(secret);
    }

    // 2. System keyring
    if let Some(secret) = keyring_secret(&format!("{router}/password")) {
        return Ok(secret);
    }

    // 3. Plaintext in config
    if let Some(ref pw) = entry.password {
        return Ok(SecretString::from(pw.clone()));
    }

    Err(ConfigError::NoCredentials {
        router: router.into(),
    })
}

/// Telegram bot token and chat id, if alerts are configured.
pub fn resolve_telegram(alerts: &AlertsSection) -> Option<(SecretString, String)> {
    let chat_id = alerts.telegram_chat_id.clone()?;
    let token = env_secret(alerts.telegram_bot_token_env.as_deref())
        .or_else(|| keyring_secret("telegram/bot-token"))
        .or_else(|| alerts.telegram_bot_token.clone().map(SecretString::from))?;
    Some((token, chat_id))
}

fn expand_home(path: &Path) -> PathBuf {
    match (path.strip_prefix("~"), BaseDirs::new()) {
        (Ok(rest), Some(dirs)) => dirs.home_dir().join(rest),
        _ => path.to_path_buf(),
    }
}
