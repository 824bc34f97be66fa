// In crates/app-config/src/lib.rs

use config::{Config, Environment, File, FileFormat};
use std::path::Path;

pub mod error;
pub mod types;

// Re-export the most important types for easy access.
pub use error::{Error, Result};
pub use types::{AccountSettings, Adjustment, GeneralSettings, Settings, TerminalSettings};

/// Default location of the bridge configuration file.
pub const DEFAULT_CONFIG_PATH: &str = "config/bridge.toml";

/// Prefix for environment overrides, e.g. `BRIDGE__GENERAL__API_KEY=...`.
pub const ENV_PREFIX: &str = "BRIDGE";

/// Loads the bridge settings.
///
/// This function orchestrates the layered configuration loading:
/// 1. Reads the TOML file at `path` (required).
/// 2. Merges settings from environment variables prefixed with `BRIDGE`.
/// 3. Validates the result and clamps out-of-range values, recording each
///    change in `Settings::adjustments`.
pub fn load_settings(path: impl AsRef<Path>) -> Result<Settings> {
    let path = path.as_ref();
    if !path.is_file() {
        return Err(Error::NotFound(path.display().to_string()));
    }
    let path_str = path
        .to_str()
        .ok_or_else(|| Error::Invalid(format!("config path {} is not valid UTF-8", path.display())))?;

    let settings = Config::builder()
        .add_source(File::new(path_str, FileFormat::Toml))
        .add_source(
            Environment::with_prefix(ENV_PREFIX)
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    let mut settings: Settings = settings.try_deserialize()?;
    settings.validate()?;
    settings.normalize();

    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::time::Duration;

    fn write_config(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    const MINIMAL: &str = r#"
        [general]
        api_base_url = "https://ingest.example.com/"
        api_key = "k-123"

        [[accounts]]
        enabled = true
        trading_account_id = 12
        login = 5550001
        password = "pw"
        server = "Demo-Server"

        [[accounts]]
        trading_account_id = 13
        login = 5550002
        password = "pw2"
        server = "Demo-Server"
    "#;

    #[test]
    fn applies_defaults() {
        let file = write_config(MINIMAL);
        let settings = load_settings(file.path()).unwrap();

        let general = &settings.general;
        assert_eq!(general.poll_interval(), Duration::from_secs(3));
        assert_eq!(general.lookback_hours_closed_trades, 24);
        assert_eq!(general.log_level, "info");
        assert!(!general.disable_ssl_verification);
        assert_eq!(general.request_timeout_secs, 30);
        assert_eq!(general.max_retries, 1);
        assert_eq!(general.retry_delay_secs, 5);
        assert_eq!(general.account_pause_ms, 1000);
        assert_eq!(settings.terminal.gateway_url, "http://127.0.0.1:8228");
        assert_eq!(settings.terminal.connect_timeout_ms, 10_000);
    }

    #[test]
    fn accounts_keep_file_order_and_default_to_disabled() {
        let file = write_config(MINIMAL);
        let settings = load_settings(file.path()).unwrap();

        assert_eq!(settings.accounts.len(), 2);
        assert!(settings.accounts[0].enabled);
        assert!(!settings.accounts[1].enabled);

        let enabled: Vec<i64> = settings.enabled_accounts().map(|a| a.trading_account_id).collect();
        assert_eq!(enabled, vec![12]);
    }

    #[test]
    fn clamps_poll_interval_to_one_second() {
        let file = write_config(&MINIMAL.replace(
            "api_key = \"k-123\"",
            "api_key = \"k-123\"\npoll_interval_secs = 0",
        ));
        let settings = load_settings(file.path()).unwrap();
        assert_eq!(settings.general.poll_interval(), Duration::from_secs(1));
        assert_eq!(settings.general.poll_interval_secs, 1);
        assert_eq!(settings.adjustments, vec![Adjustment::PollIntervalRaised { configured: 0 }]);
    }

    #[test]
    fn valid_poll_interval_is_not_adjusted() {
        let file = write_config(MINIMAL);
        let settings = load_settings(file.path()).unwrap();
        assert!(settings.adjustments.is_empty());
    }

    #[test]
    fn missing_file_is_fatal() {
        let err = load_settings("does/not/exist.toml").unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[test]
    fn missing_required_key_is_fatal() {
        let file = write_config(
            r#"
            [general]
            api_base_url = "https://ingest.example.com"
            "#,
        );
        let err = load_settings(file.path()).unwrap_err();
        assert!(matches!(err, Error::LoadError(_)));
    }

    #[test]
    fn empty_api_key_is_rejected() {
        let file = write_config(&MINIMAL.replace("k-123", ""));
        let err = load_settings(file.path()).unwrap_err();
        assert!(matches!(err, Error::Invalid(_)));
    }

    #[test]
    fn debug_output_redacts_secrets() {
        let file = write_config(MINIMAL);
        let settings = load_settings(file.path()).unwrap();
        let rendered = format!("{:?}", settings);
        assert!(!rendered.contains("k-123"));
        assert!(!rendered.contains("pw2"));
        assert!(rendered.contains("[REDACTED]"));
    }

    #[test]
    fn invalid_log_level_is_reported_as_none() {
        let file = write_config(&MINIMAL.replace(
            "api_key = \"k-123\"",
            "api_key = \"k-123\"\nlog_level = \"chatty\"",
        ));
        let settings = load_settings(file.path()).unwrap();
        assert_eq!(settings.general.parsed_log_level(), None);
    }
}
