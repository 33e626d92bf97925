//! Configuration management
//!
//! Settings come from a TOML file and may be overridden by environment
//! variables. Everything is validated before any network call is made.

use crate::error::ConfigError;
use crate::gong::client::DEFAULT_BASE_URL;
use crate::ingestion::sentinel::DEFAULT_AUTHORITY;
use crate::ingestion::{Credentials, Destination};
use chrono::{Duration, Utc};
use log::LevelFilter;
use serde::Deserialize;
use std::path::Path;
use std::str::FromStr;

/// Default configuration file name
pub const DEFAULT_CONFIG_FILE: &str = "gong2sentinel.toml";

const MIN_VALUE_LEN: usize = 3;

/// Application configuration
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub log: LogConfig,
    pub gong: GongConfig,
    pub microsoft: MicrosoftConfig,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct LogConfig {
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// Gong API credentials and collection window
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct GongConfig {
    pub access_key: String,
    pub access_secret: String,
    /// How many hours of audit logs to request
    pub lookup_hours: i64,
    pub base_url: String,
}

impl Default for GongConfig {
    fn default() -> Self {
        Self {
            access_key: String::new(),
            access_secret: String::new(),
            lookup_hours: 0,
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }
}

/// Service principal and ingestion destination
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct MicrosoftConfig {
    pub app_id: String,
    pub secret_key: String,
    pub tenant_id: String,
    pub authority: String,
    pub dcr: DataCollectionConfig,
}

impl Default for MicrosoftConfig {
    fn default() -> Self {
        Self {
            app_id: String::new(),
            secret_key: String::new(),
            tenant_id: String::new(),
            authority: DEFAULT_AUTHORITY.to_string(),
            dcr: DataCollectionConfig::default(),
        }
    }
}

/// Data collection rule routing
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct DataCollectionConfig {
    pub endpoint: String,
    pub rule_id: String,
    pub stream_name_auditing: String,
    pub stream_name_user_access: String,
}

impl Config {
    /// Load, apply environment overrides and validate
    ///
    /// A missing file is not an error; the environment may supply every value.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let mut config = if path.exists() {
            Self::from_file(path)?
        } else {
            Self::default()
        };

        config.apply_overrides(|name| std::env::var(name).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Parse a TOML configuration file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            ConfigError::ReadError(format!("'{}': {}", path.display(), e))
        })?;
        Ok(toml::from_str(&contents)?)
    }

    /// Override values from variables resolved by `lookup`
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let string_overrides: [(&str, &mut String); 10] = [
            ("LOG_LEVEL", &mut self.log.level),
            ("GONG_ACCESS_KEY", &mut self.gong.access_key),
            ("GONG_ACCESS_SECRET", &mut self.gong.access_secret),
            ("MS_APP_ID", &mut self.microsoft.app_id),
            ("MS_SECRET_KEY", &mut self.microsoft.secret_key),
            ("MS_TENANT_ID", &mut self.microsoft.tenant_id),
            ("MS_DCR_ENDPOINT", &mut self.microsoft.dcr.endpoint),
            ("MS_DCR_RULE", &mut self.microsoft.dcr.rule_id),
            (
                "MS_DCR_STREAM_AUDITING",
                &mut self.microsoft.dcr.stream_name_auditing,
            ),
            (
                "MS_DCR_STREAM_CALL_USER_ACCESS",
                &mut self.microsoft.dcr.stream_name_user_access,
            ),
        ];
        for (name, field) in string_overrides {
            if let Some(value) = lookup(name) {
                *field = value;
            }
        }

        if let Some(value) = lookup("GONG_LOOKUP_HOURS") {
            self.gong.lookup_hours = value.trim().parse().map_err(|_| {
                ConfigError::ParseError(format!("GONG_LOOKUP_HOURS is not a number: {}", value))
            })?;
        }
        Ok(())
    }

    /// Check every required value
    pub fn validate(&self) -> Result<(), ConfigError> {
        let required = [
            ("gong.access_key", &self.gong.access_key),
            ("gong.access_secret", &self.gong.access_secret),
            ("microsoft.app_id", &self.microsoft.app_id),
            ("microsoft.secret_key", &self.microsoft.secret_key),
            ("microsoft.tenant_id", &self.microsoft.tenant_id),
            ("microsoft.dcr.endpoint", &self.microsoft.dcr.endpoint),
            ("microsoft.dcr.rule_id", &self.microsoft.dcr.rule_id),
            (
                "microsoft.dcr.stream_name_auditing",
                &self.microsoft.dcr.stream_name_auditing,
            ),
            (
                "microsoft.dcr.stream_name_user_access",
                &self.microsoft.dcr.stream_name_user_access,
            ),
        ];
        for (name, value) in required {
            if value.trim().len() < MIN_VALUE_LEN {
                return Err(ConfigError::ValidationError(format!(
                    "{} must be at least {} characters",
                    name, MIN_VALUE_LEN
                )));
            }
        }

        self.lookup_window()?;
        self.log_level()?;
        Ok(())
    }

    /// Parsed log level filter
    pub fn log_level(&self) -> Result<LevelFilter, ConfigError> {
        LevelFilter::from_str(self.log.level.trim()).map_err(|_| {
            ConfigError::ValidationError(format!("invalid log level: {}", self.log.level))
        })
    }

    /// Audit log lookup window
    ///
    /// The window must be positive and reach back to a representable instant.
    pub fn lookup_window(&self) -> Result<Duration, ConfigError> {
        let hours = self.gong.lookup_hours;
        Duration::try_hours(hours)
            .filter(|window| *window > Duration::zero())
            .filter(|window| Utc::now().checked_sub_signed(*window).is_some())
            .ok_or_else(|| {
                ConfigError::ValidationError(format!(
                    "invalid lookup hours, should be positive number: {}",
                    hours
                ))
            })
    }

    pub fn credentials(&self) -> Credentials {
        Credentials {
            tenant_id: self.microsoft.tenant_id.clone(),
            client_id: self.microsoft.app_id.clone(),
            client_secret: self.microsoft.secret_key.clone(),
        }
    }

    pub fn destination(&self) -> Destination {
        Destination {
            endpoint: self.microsoft.dcr.endpoint.clone(),
            rule_id: self.microsoft.dcr.rule_id.clone(),
            audit_stream: self.microsoft.dcr.stream_name_auditing.clone(),
            access_stream: self.microsoft.dcr.stream_name_user_access.clone(),
        }
    }
}
