// In crates/app-config/src/types.rs

use serde::Deserialize;
use std::time::Duration;

use crate::{Error, Result};

#[derive(Deserialize, Clone)]
pub struct Settings {
    /// Ingestion API, logging and retry settings.
    pub general: GeneralSettings,
    /// How to reach the local terminal gateway.
    #[serde(default)]
    pub terminal: TerminalSettings,
    /// Accounts in the order they are polled.
    #[serde(default)]
    pub accounts: Vec<AccountSettings>,
    /// Values changed by `load_settings`, to be logged once tracing is up.
    #[serde(skip)]
    pub adjustments: Vec<Adjustment>,
}

/// A configured value that was replaced while loading.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Adjustment {
    /// `poll_interval_secs` was below 1 and has been raised to 1.
    PollIntervalRaised { configured: i64 },
}

impl std::fmt::Display for Adjustment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Adjustment::PollIntervalRaised { configured } => {
                write!(f, "poll_interval_secs = {configured} is below 1; using 1 second")
            }
        }
    }
}

impl Settings {
    /// Accounts that take part in polling, in file order.
    pub fn enabled_accounts(&self) -> impl Iterator<Item = &AccountSettings> {
        self.accounts.iter().filter(|account| account.enabled)
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if self.general.api_base_url.trim().is_empty() {
            return Err(Error::Invalid("general.api_base_url must not be empty".into()));
        }
        if self.general.api_key.trim().is_empty() {
            return Err(Error::Invalid("general.api_key must not be empty".into()));
        }
        if self.terminal.gateway_url.trim().is_empty() {
            return Err(Error::Invalid("terminal.gateway_url must not be empty".into()));
        }
        for (index, account) in self.accounts.iter().enumerate() {
            if account.server.trim().is_empty() {
                return Err(Error::Invalid(format!(
                    "accounts[{index}] (login {}) has an empty server",
                    account.login
                )));
            }
        }
        Ok(())
    }

    pub(crate) fn normalize(&mut self) {
        if self.general.poll_interval_secs < 1 {
            self.adjustments.push(Adjustment::PollIntervalRaised {
                configured: self.general.poll_interval_secs,
            });
            self.general.poll_interval_secs = 1;
        }
    }
}

impl std::fmt::Debug for Settings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Settings")
            .field("general", &self.general)
            .field("terminal", &self.terminal)
            .field("accounts", &self.accounts)
            .field("adjustments", &self.adjustments)
            .finish()
    }
}

#[derive(Deserialize, Clone)]
pub struct GeneralSettings {
    /// Base URL of the ingestion API, e.g. `https://api.example.com`.
    pub api_base_url: String,
    /// Sent as `X-API-KEY` on every push.
    pub api_key: String,
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: i64,
    #[serde(default = "default_lookback_hours")]
    pub lookback_hours_closed_trades: u32,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Optional file that receives a copy of every log line.
    #[serde(default)]
    pub log_file: Option<String>,
    #[serde(default)]
    pub disable_ssl_verification: bool,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_retry_delay_secs")]
    pub retry_delay_secs: u64,
    /// Pause between two accounts within one cycle.
    #[serde(default = "default_account_pause_ms")]
    pub account_pause_ms: u64,
}

impl GeneralSettings {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs.max(1) as u64)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_secs(self.retry_delay_secs)
    }

    pub fn account_pause(&self) -> Duration {
        Duration::from_millis(self.account_pause_ms)
    }

    /// The configured level, or `None` when it is not a valid level name.
    pub fn parsed_log_level(&self) -> Option<tracing::Level> {
        self.log_level.trim().parse().ok()
    }
}

impl std::fmt::Debug for GeneralSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeneralSettings")
            .field("api_base_url", &self.api_base_url)
            .field("api_key", &"[REDACTED]")
            .field("poll_interval_secs", &self.poll_interval_secs)
            .field("lookback_hours_closed_trades", &self.lookback_hours_closed_trades)
            .field("log_level", &self.log_level)
            .field("log_file", &self.log_file)
            .field("disable_ssl_verification", &self.disable_ssl_verification)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("max_retries", &self.max_retries)
            .field("retry_delay_secs", &self.retry_delay_secs)
            .field("account_pause_ms", &self.account_pause_ms)
            .finish()
    }
}

#[derive(Deserialize, Debug, Clone)]
pub struct TerminalSettings {
    /// Base URL of the local terminal gateway.
    #[serde(default = "default_gateway_url")]
    pub gateway_url: String,
    /// Passed to the terminal when opening a session.
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,
}

impl TerminalSettings {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }
}

impl Default for TerminalSettings {
    fn default() -> Self {
        Self {
            gateway_url: default_gateway_url(),
            connect_timeout_ms: default_connect_timeout_ms(),
        }
    }
}

/// One terminal account to poll.
#[derive(Deserialize, Clone)]
pub struct AccountSettings {
    /// Free-form label used in logs.
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub enabled: bool,
    /// The account id on the ingestion side.
    pub trading_account_id: i64,
    /// Terminal login.
    pub login: u64,
    pub password: String,
    pub server: String,
}

impl std::fmt::Debug for AccountSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccountSettings")
            .field("name", &self.name)
            .field("enabled", &self.enabled)
            .field("trading_account_id", &self.trading_account_id)
            .field("login", &self.login)
            .field("password", &"[REDACTED]")
            .field("server", &self.server)
            .finish()
    }
}

/// Helper functions for serde defaults
fn default_poll_interval_secs() -> i64 { 3 }
fn default_lookback_hours() -> u32 { 24 }
fn default_log_level() -> String { "info".into() }
fn default_request_timeout_secs() -> u64 { 30 }
fn default_max_retries() -> u32 { 1 }
fn default_retry_delay_secs() -> u64 { 5 }
fn default_account_pause_ms() -> u64 { 1000 }
fn default_gateway_url() -> String { "http://127.0.0.1:8228".into() }
fn default_connect_timeout_ms() -> u64 { 10_000 }
