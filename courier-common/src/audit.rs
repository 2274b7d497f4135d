//! Audit logging for delivery item lifecycle events
//!
//! ## Audit Events
//!
//! - `DeliverySucceeded`: the transport accepted an item
//! - `DeliveryFailed`: a send attempt failed and the failure was recorded on the item
//!
//! Recipient addresses and subjects can be redacted through [`AuditConfig`].

use std::sync::{Arc, OnceLock};

use serde::{Deserialize, Serialize};

use crate::item::DeliveryItem;

/// Audit logging configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditConfig {
    /// Enable audit events
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Redact the local part of recipient addresses
    #[serde(default)]
    pub redact_recipients: bool,

    /// Replace subjects with a placeholder
    #[serde(default)]
    pub redact_subjects: bool,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            redact_recipients: false,
            redact_subjects: false,
        }
    }
}

const fn default_true() -> bool {
    true
}

static AUDIT_CONFIG: OnceLock<Arc<AuditConfig>> = OnceLock::new();

/// Initialize audit logging. The first call wins.
pub fn init(config: AuditConfig) {
    AUDIT_CONFIG.get_or_init(|| Arc::new(config));
}

/// Get the current audit configuration
#[must_use]
pub fn config() -> Arc<AuditConfig> {
    AUDIT_CONFIG
        .get()
        .cloned()
        .unwrap_or_else(|| Arc::new(AuditConfig::default()))
}

/// Redact email address if redaction is enabled
#[must_use]
pub fn redact_email(email: &str, redact: bool) -> String {
    if redact {
        if let Some((_, domain)) = email.split_once('@') {
            format!("[REDACTED]@{domain}")
        } else {
            "[REDACTED]".to_string()
        }
    } else {
        email.to_string()
    }
}

#[must_use]
pub fn redact_subject(subject: &str, redact: bool) -> String {
    if redact {
        "[REDACTED]".to_string()
    } else {
        subject.to_string()
    }
}

/// Log a successful delivery
///
/// # Fields
/// - `delivery_item_id`: item identifier (ULID)
/// - `recipient`: recipient address (redacted if configured)
/// - `subject`: message subject (redacted if configured)
/// - `provider`: transport the item was sent through
/// - `provider_message_id`: identifier assigned by the provider
pub fn log_delivery_succeeded(item: &DeliveryItem) {
    let config = config();
    if !config.enabled {
        return;
    }

    tracing::event!(
        tracing::Level::INFO,
        event = "DeliverySucceeded",
        delivery_item_id = %item.id(),
        recipient = %redact_email(&item.recipient.email, config.redact_recipients),
        subject = %redact_subject(&item.subject, config.redact_subjects),
        provider = item.provider.as_deref().unwrap_or_default(),
        provider_message_id = item.provider_message_id().unwrap_or_default(),
        "Audit: Delivery succeeded"
    );
}

/// Log a failed delivery
///
/// # Fields
/// - `delivery_item_id`: item identifier (ULID)
/// - `recipient`: recipient address (redacted if configured)
/// - `subject`: message subject (redacted if configured)
/// - `exception_message`: the failure recorded on the item
pub fn log_delivery_failed(item: &DeliveryItem) {
    let config = config();
    if !config.enabled {
        return;
    }

    tracing::event!(
        tracing::Level::WARN,
        event = "DeliveryFailed",
        delivery_item_id = %item.id(),
        recipient = %redact_email(&item.recipient.email, config.redact_recipients),
        subject = %redact_subject(&item.subject, config.redact_subjects),
        exception_message = item.exception_message().unwrap_or_default(),
        "Audit: Delivery failed"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redact_email() {
        assert_eq!(
            redact_email("user@example.com", true),
            "[REDACTED]@example.com"
        );
        assert_eq!(redact_email("user@example.com", false), "user@example.com");
        assert_eq!(redact_email("invalid", true), "[REDACTED]");
    }

    #[test]
    fn test_redact_subject() {
        assert_eq!(redact_subject("Password reset", true), "[REDACTED]");
        assert_eq!(redact_subject("Password reset", false), "Password reset");
    }

    #[test]
    fn test_default_config() {
        let config = AuditConfig::default();
        assert!(config.enabled);
        assert!(!config.redact_recipients);
        assert!(!config.redact_subjects);
    }
}
