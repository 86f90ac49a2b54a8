//! # Application Configuration
//!
//! TOML settings for the estimator. Every field has a default, so a missing
//! file, an empty file or a file naming only one setting are all valid.
//!
//! ```toml
//! [storage]
//! data_dir = "/var/lib/hailnet"
//!
//! [export]
//! dir = "~/quotes"
//!
//! [auth]
//! max_attempts = 5
//! lockout_minutes = 15
//! session_hours = 6
//! initial_password = "change-me"
//!
//! [logging]
//! filter = "hailnet_core=debug,info"
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use chrono::Duration;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::auth::AuthPolicy;
use crate::errors::{CalcError, CalcResult};

/// Directory name under the platform config/data directories
pub const APP_DIR_NAME: &str = "hailnet";
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Upper bounds accepted for the `[auth]` section
pub const MAX_LOGIN_ATTEMPTS: u32 = 100;
pub const MAX_LOCKOUT_MINUTES: i64 = 7 * 24 * 60;
pub const MAX_SESSION_HOURS: i64 = 30 * 24;

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Where parameter and auth documents live; platform data dir if unset
    pub data_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Default directory for PDF quotations; current directory if unset
    pub dir: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    pub max_attempts: u32,
    pub lockout_minutes: i64,
    pub session_hours: i64,
    /// Password set on first use of the gate. No built-in default.
    pub initial_password: Option<String>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        AuthConfig {
            max_attempts: 5,
            lockout_minutes: 15,
            session_hours: 6,
            initial_password: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `EnvFilter` directive used when `RUST_LOG` is not set
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            filter: "info".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub storage: StorageConfig,
    pub export: ExportConfig,
    pub auth: AuthConfig,
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// `<config dir>/hailnet/config.toml`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(APP_DIR_NAME).join(CONFIG_FILE_NAME))
    }

    pub fn from_toml_str(contents: &str) -> CalcResult<Self> {
        Self::parse(contents, "<inline>")
    }

    /// Read `path`. A missing file gives the defaults; a malformed one, or
    /// one with out-of-range values, is a [`CalcError::ConfigError`].
    pub fn load(path: &Path) -> CalcResult<Self> {
        if !path.exists() {
            debug!(path = %path.display(), "no config file, using defaults");
            return Ok(AppConfig::default());
        }

        let origin = path.display().to_string();
        let contents = fs::read_to_string(path).map_err(|e| config_error(&origin, e))?;
        Self::parse(&contents, &origin)
    }

    fn parse(contents: &str, origin: &str) -> CalcResult<Self> {
        let config: AppConfig = toml::from_str(contents).map_err(|e| config_error(origin, e))?;
        config.validate().map_err(|reason| config_error(origin, reason))?;
        Ok(config)
    }

    /// Range check of the auth limits
    pub fn validate(&self) -> Result<(), String> {
        let auth = &self.auth;
        if !(1..=MAX_LOGIN_ATTEMPTS).contains(&auth.max_attempts) {
            return Err(format!(
                "auth.max_attempts must be between 1 and {}, got {}",
                MAX_LOGIN_ATTEMPTS, auth.max_attempts
            ));
        }
        if !(1..=MAX_LOCKOUT_MINUTES).contains(&auth.lockout_minutes) {
            return Err(format!(
                "auth.lockout_minutes must be between 1 and {}, got {}",
                MAX_LOCKOUT_MINUTES, auth.lockout_minutes
            ));
        }
        if !(1..=MAX_SESSION_HOURS).contains(&auth.session_hours) {
            return Err(format!(
                "auth.session_hours must be between 1 and {}, got {}",
                MAX_SESSION_HOURS, auth.session_hours
            ));
        }
        Ok(())
    }

    /// Load from `path`, or from [`AppConfig::default_path`] when `None`
    pub fn load_or_default(path: Option<&Path>) -> CalcResult<Self> {
        match path {
            Some(path) => Self::load(path),
            None => match Self::default_path() {
                Some(path) => Self::load(&path),
                None => Ok(AppConfig::default()),
            },
        }
    }

    /// Store directory: configured, else `<data dir>/hailnet`, else `./.hailnet`
    pub fn data_dir(&self) -> PathBuf {
        self.storage
            .data_dir
            .clone()
            .or_else(|| dirs::data_dir().map(|dir| dir.join(APP_DIR_NAME)))
            .unwrap_or_else(|| PathBuf::from(".hailnet"))
    }

    pub fn export_dir(&self) -> PathBuf {
        self.export.dir.clone().unwrap_or_else(|| PathBuf::from("."))
    }

    /// Gate limits. Fails on values [`AppConfig::validate`] rejects, which
    /// can only get here when fields are set after loading.
    pub fn auth_policy(&self) -> CalcResult<AuthPolicy> {
        self.validate().map_err(|reason| config_error("<auth>", reason))?;
        let lockout = Duration::try_minutes(self.auth.lockout_minutes)
            .ok_or_else(|| config_error("<auth>", "auth.lockout_minutes out of range"))?;
        let session = Duration::try_hours(self.auth.session_hours)
            .ok_or_else(|| config_error("<auth>", "auth.session_hours out of range"))?;
        Ok(AuthPolicy {
            max_attempts: self.auth.max_attempts,
            lockout,
            session,
        })
    }
}

fn config_error(path: &str, reason: impl ToString) -> CalcError {
    CalcError::ConfigError {
        path: path.to_string(),
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults_match_gate_policy() {
        let config = AppConfig::default();
        assert_eq!(config.auth_policy().unwrap(), AuthPolicy::default());
        assert_eq!(config.logging.filter, "info");
        assert!(config.auth.initial_password.is_none());
    }

    #[test]
    fn test_partial_file() {
        let config = AppConfig::from_toml_str(
            r#"
            [auth]
            max_attempts = 3
            initial_password = "s3cret"
            "#,
        )
        .unwrap();
        assert_eq!(config.auth.max_attempts, 3);
        assert_eq!(config.auth.lockout_minutes, 15);
        assert_eq!(config.auth.initial_password.as_deref(), Some("s3cret"));
        assert_eq!(config.storage, StorageConfig::default());
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = TempDir::new().unwrap();
        let config = AppConfig::load(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn test_malformed_file_is_config_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[auth\nmax_attempts = ").unwrap();

        let err = AppConfig::load(&path).unwrap_err();
        assert_eq!(err.error_code(), "CONFIG_ERROR");
    }

    #[test]
    fn test_configured_dirs() {
        let config = AppConfig::from_toml_str(
            r#"
            [storage]
            data_dir = "/srv/hailnet"
            [export]
            dir = "quotes"
            "#,
        )
        .unwrap();
        assert_eq!(config.data_dir(), PathBuf::from("/srv/hailnet"));
        assert_eq!(config.export_dir(), PathBuf::from("quotes"));
    }

    #[test]
    fn test_out_of_range_auth_values_are_config_errors() {
        for toml in [
            "[auth]\nlockout_minutes = 9223372036854775807",
            "[auth]\nsession_hours = 9223372036854775807",
            "[auth]\nlockout_minutes = -5",
            "[auth]\nsession_hours = 0",
            "[auth]\nmax_attempts = 0",
        ] {
            let err = AppConfig::from_toml_str(toml).unwrap_err();
            assert_eq!(err.error_code(), "CONFIG_ERROR", "{}", toml);
        }
    }

    #[test]
    fn test_out_of_range_file_is_config_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[auth]\nlockout_minutes = 9223372036854775807\n").unwrap();

        match AppConfig::load(&path).unwrap_err() {
            CalcError::ConfigError { path: reported, reason } => {
                assert_eq!(reported, path.display().to_string());
                assert!(reason.contains("lockout_minutes"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_auth_policy_rejects_values_set_after_load() {
        let mut config = AppConfig::default();
        config.auth.lockout_minutes = i64::MAX;
        assert_eq!(config.auth_policy().unwrap_err().error_code(), "CONFIG_ERROR");

        config.auth.lockout_minutes = MAX_LOCKOUT_MINUTES;
        config.auth.session_hours = MAX_SESSION_HOURS;
        let policy = config.auth_policy().unwrap();
        assert_eq!(policy.lockout, Duration::days(7));
        assert_eq!(policy.session, Duration::days(30));
    }
}
