use std::path::Path;

use courier_common::{ConfigError, audit::AuditConfig, config};
use courier_history::HistoryConfig;
use serde::Deserialize;

/// Mailer configuration
///
/// # Example
/// ```toml
/// [history]
/// type = "Memory"
/// capacity = 10000
///
/// [audit]
/// redact_recipients = true
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct MailerConfig {
    /// Where delivery outcomes are recorded
    #[serde(default)]
    pub history: HistoryConfig,

    /// Audit event settings
    #[serde(default)]
    pub audit: AuditConfig,
}

impl MailerConfig {
    /// Parse configuration from TOML.
    ///
    /// # Errors
    /// If the input is not valid TOML or has unexpected values.
    pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
        config::from_toml_str(input)
    }

    /// Read configuration from a TOML file.
    ///
    /// # Errors
    /// If the file cannot be read or does not parse.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        config::load(path)
    }
}
