//! Delivery items: one message bound to one recipient.

use std::{collections::BTreeMap, fmt};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    address::Address,
    message::{Attachment, Body, Message},
};

/// Identifier for a delivery item
///
/// A ULID, so identifiers sort by creation time. Every send attempt gets its
/// own identifier; resending a stored item produces a new one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DeliveryItemId {
    id: ulid::Ulid,
}

impl DeliveryItemId {
    /// Create an identifier from a ULID
    #[must_use]
    pub const fn new(id: ulid::Ulid) -> Self {
        Self { id }
    }

    /// Generate a new unique identifier
    #[must_use]
    pub fn generate() -> Self {
        Self {
            id: ulid::Ulid::new(),
        }
    }

    #[must_use]
    pub const fn ulid(&self) -> ulid::Ulid {
        self.id
    }

    /// Milliseconds since the Unix epoch at which this identifier was generated
    #[must_use]
    pub const fn timestamp_ms(&self) -> u64 {
        self.id.timestamp_ms()
    }
}

impl fmt::Display for DeliveryItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id)
    }
}

impl std::str::FromStr for DeliveryItemId {
    type Err = ulid::DecodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ulid::Ulid::from_string(s).map(Self::new)
    }
}

impl Serialize for DeliveryItemId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.id.to_string())
    }
}

impl<'de> Deserialize<'de> for DeliveryItemId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        let id = ulid::Ulid::from_string(&s).map_err(serde::de::Error::custom)?;
        Ok(Self { id })
    }
}

/// Where a delivery item is in its send lifecycle.
///
/// Being a single value, an item can never be both sent and failed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum DeliveryOutcome {
    /// No send attempt has completed yet
    #[default]
    Pending,
    /// The transport accepted the item
    Sent { provider_message_id: String },
    /// The send attempt failed
    Failed { message: String },
}

impl fmt::Display for DeliveryOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Pending => "pending",
            Self::Sent { .. } => "sent",
            Self::Failed { .. } => "failed",
        })
    }
}

/// One message addressed to exactly one recipient.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryItem {
    id: DeliveryItemId,
    pub subject: String,
    pub sender: Address,
    pub recipient: Address,
    pub body: Body,
    #[serde(default)]
    pub attachments: Vec<Attachment>,
    #[serde(default)]
    pub substitutions: BTreeMap<String, String>,
    /// Name of the transport the item was queued against
    #[serde(default)]
    pub provider: Option<String>,
    outcome: DeliveryOutcome,
    created_at: DateTime<Utc>,
    resendable: bool,
}

impl DeliveryItem {
    /// Bind a message to a single recipient.
    #[must_use]
    pub fn new(message: &Message, sender: Address, recipient: Address) -> Self {
        Self {
            id: DeliveryItemId::generate(),
            subject: message.subject.clone(),
            sender,
            recipient,
            body: message.body.clone(),
            attachments: message.attachments.clone(),
            substitutions: message.substitutions.clone(),
            provider: None,
            outcome: DeliveryOutcome::Pending,
            created_at: Utc::now(),
            resendable: true,
        }
    }

    #[must_use]
    pub const fn id(&self) -> DeliveryItemId {
        self.id
    }

    #[must_use]
    pub const fn outcome(&self) -> &DeliveryOutcome {
        &self.outcome
    }

    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self.outcome, DeliveryOutcome::Sent { .. })
    }

    /// The identifier the provider assigned, present only after a successful send.
    #[must_use]
    pub fn provider_message_id(&self) -> Option<&str> {
        match &self.outcome {
            DeliveryOutcome::Sent {
                provider_message_id,
            } => Some(provider_message_id),
            _ => None,
        }
    }

    /// The failure description, present only after a failed send.
    #[must_use]
    pub fn exception_message(&self) -> Option<&str> {
        match &self.outcome {
            DeliveryOutcome::Failed { message } => Some(message),
            _ => None,
        }
    }

    /// Returns `true` if no send attempt has been recorded.
    #[must_use]
    pub const fn is_untried(&self) -> bool {
        matches!(self.outcome, DeliveryOutcome::Pending)
    }

    /// Returns `true` if enough content was kept to send this item again.
    #[must_use]
    pub const fn is_resendable(&self) -> bool {
        self.resendable
    }

    pub fn mark_sent(&mut self, provider_message_id: impl Into<String>) {
        self.outcome = DeliveryOutcome::Sent {
            provider_message_id: provider_message_id.into(),
        };
    }

    pub fn mark_failed(&mut self, message: impl Into<String>) {
        self.outcome = DeliveryOutcome::Failed {
            message: message.into(),
        };
    }

    /// Drop attachment bytes, keeping their names and types.
    ///
    /// An item that loses attachment content can no longer be resent.
    pub fn strip_attachment_content(&mut self) {
        for attachment in &mut self.attachments {
            if attachment.content.take().is_some() {
                self.resendable = false;
            }
        }
    }

    /// A fresh, untried copy of this item for another send attempt.
    #[must_use]
    pub fn to_resend(&self) -> Self {
        Self {
            id: DeliveryItemId::generate(),
            outcome: DeliveryOutcome::Pending,
            created_at: Utc::now(),
            ..self.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn item() -> DeliveryItem {
        Message::builder()
            .from("sender@example.com")
            .to("rcpt@example.com")
            .subject("Subject")
            .text("Body")
            .attach(Attachment::new("a.bin", "application/octet-stream", vec![1u8, 2, 3]))
            .build()
            .expect("valid message")
            .delivery_items()
            .expect("deliverable")
            .remove(0)
    }

    #[test]
    fn test_outcome_transitions_are_exclusive() {
        let mut item = item();
        assert!(item.is_untried());
        assert!(!item.is_success());
        assert_eq!(item.exception_message(), None);

        item.mark_failed("connection refused");
        assert!(!item.is_success());
        assert_eq!(item.exception_message(), Some("connection refused"));
        assert_eq!(item.provider_message_id(), None);

        item.mark_sent("provider-1");
        assert!(item.is_success());
        assert_eq!(item.exception_message(), None);
        assert_eq!(item.provider_message_id(), Some("provider-1"));
    }

    #[test]
    fn test_to_resend_is_fresh() {
        let mut original = item();
        original.provider = Some("LogTransport".to_string());
        original.mark_failed("timeout");

        let fresh = original.to_resend();

        assert_ne!(fresh.id(), original.id());
        assert!(fresh.is_untried());
        assert_eq!(fresh.provider_message_id(), None);
        assert_eq!(fresh.exception_message(), None);
        assert!(fresh.created_at() >= original.created_at());
        assert_eq!(fresh.recipient, original.recipient);
        assert_eq!(fresh.attachments, original.attachments);
    }

    #[test]
    fn test_strip_attachment_content_marks_not_resendable() {
        let mut item = item();
        item.strip_attachment_content();

        assert!(!item.is_resendable());
        assert_eq!(item.attachments[0].filename, "a.bin");
        assert!(!item.attachments[0].is_retained());
    }

    #[test]
    fn test_strip_without_attachments_keeps_resendable() {
        let mut item = item();
        item.attachments.clear();
        item.strip_attachment_content();
        assert!(item.is_resendable());
    }

    #[test]
    fn test_id_round_trips_through_string() {
        let id = DeliveryItemId::generate();
        let parsed: DeliveryItemId = id.to_string().parse().expect("valid ulid");
        assert_eq!(parsed, id);
        assert!(id.timestamp_ms() > 0);
    }
}
