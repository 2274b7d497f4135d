//! Outgoing message model and builder.
//!
//! A [`Message`] is plain data. Whether it is deliverable (has a sender, a
//! body and at least one recipient) is checked when it is expanded into
//! [`DeliveryItem`]s, not while it is being built.

use std::{collections::BTreeMap, sync::Arc};

use serde::{Deserialize, Serialize};

use crate::{
    address::Address,
    error::{AddressError, ValidationError},
    item::DeliveryItem,
};

/// Body content of a message. Any combination may be set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Body {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub html: Option<String>,
    /// Name of a provider-side template to render instead of inline content
    #[serde(default)]
    pub template: Option<String>,
}

impl Body {
    /// Returns `true` if no representation of the body is present.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.text.is_none() && self.html.is_none() && self.template.is_none()
    }
}

/// A file attached to a message.
///
/// `content` is `None` once the bytes have been dropped, for example by a
/// history store that does not retain attachments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    pub filename: String,
    pub content_type: String,
    #[serde(default)]
    pub content: Option<Arc<[u8]>>,
}

impl Attachment {
    #[must_use]
    pub fn new(
        filename: impl Into<String>,
        content_type: impl Into<String>,
        content: impl Into<Arc<[u8]>>,
    ) -> Self {
        Self {
            filename: filename.into(),
            content_type: content_type.into(),
            content: Some(content.into()),
        }
    }

    /// Returns `true` if the attachment bytes are still present.
    #[must_use]
    pub const fn is_retained(&self) -> bool {
        self.content.is_some()
    }
}

/// A message addressed to one or more recipients.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub subject: String,
    pub sender: Option<Address>,
    pub recipients: Vec<Address>,
    pub body: Body,
    #[serde(default)]
    pub attachments: Vec<Attachment>,
    #[serde(default)]
    pub substitutions: BTreeMap<String, String>,
}

impl Message {
    /// Create a new message builder.
    #[must_use]
    pub fn builder() -> MessageBuilder {
        MessageBuilder::default()
    }

    /// Check that the message has a sender, a body and at least one recipient.
    ///
    /// # Errors
    /// Returns the first missing piece, naming the message subject.
    pub fn ensure_deliverable(&self) -> Result<&Address, ValidationError> {
        let subject = || self.subject.clone();

        let sender = self
            .sender
            .as_ref()
            .ok_or_else(|| ValidationError::MissingSender { subject: subject() })?;

        if self.body.is_empty() {
            return Err(ValidationError::MissingBody { subject: subject() });
        }

        if self.recipients.is_empty() {
            return Err(ValidationError::MissingRecipients { subject: subject() });
        }

        Ok(sender)
    }

    /// Expand the message into one delivery item per recipient, in recipient order.
    ///
    /// # Errors
    /// If the message is not deliverable, see [`Message::ensure_deliverable`].
    pub fn delivery_items(&self) -> Result<Vec<DeliveryItem>, ValidationError> {
        let sender = self.ensure_deliverable()?;

        Ok(self
            .recipients
            .iter()
            .map(|recipient| DeliveryItem::new(self, sender.clone(), recipient.clone()))
            .collect())
    }
}

/// Fluent builder for [`Message`].
///
/// Addresses are parsed as they are added; the first parse failure is
/// reported by [`MessageBuilder::build`].
#[derive(Debug, Default)]
pub struct MessageBuilder {
    message: Message,
    error: Option<AddressError>,
}

impl MessageBuilder {
    fn parse(&mut self, address: &str) -> Option<Address> {
        match address.parse() {
            Ok(address) => Some(address),
            Err(e) => {
                self.error.get_or_insert(e);
                None
            }
        }
    }

    /// Set the sender address.
    #[must_use]
    pub fn from(mut self, address: impl AsRef<str>) -> Self {
        self.message.sender = self.parse(address.as_ref());
        self
    }

    /// Add a recipient.
    #[must_use]
    pub fn to(mut self, address: impl AsRef<str>) -> Self {
        if let Some(address) = self.parse(address.as_ref()) {
            self.message.recipients.push(address);
        }
        self
    }

    /// Add several recipients.
    #[must_use]
    pub fn to_many(self, addresses: impl IntoIterator<Item = impl AsRef<str>>) -> Self {
        addresses.into_iter().fold(self, Self::to)
    }

    #[must_use]
    pub fn subject(mut self, subject: impl Into<String>) -> Self {
        self.message.subject = subject.into();
        self
    }

    #[must_use]
    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.message.body.text = Some(text.into());
        self
    }

    #[must_use]
    pub fn html(mut self, html: impl Into<String>) -> Self {
        self.message.body.html = Some(html.into());
        self
    }

    /// Use a provider-side template as the body.
    #[must_use]
    pub fn template(mut self, name: impl Into<String>) -> Self {
        self.message.body.template = Some(name.into());
        self
    }

    #[must_use]
    pub fn attach(mut self, attachment: Attachment) -> Self {
        self.message.attachments.push(attachment);
        self
    }

    /// Add a substitution variable for template rendering.
    #[must_use]
    pub fn substitute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.message.substitutions.insert(key.into(), value.into());
        self
    }

    /// Finish building.
    ///
    /// # Errors
    /// If any address passed to the builder failed to parse.
    pub fn build(self) -> Result<Message, ValidationError> {
        match self.error {
            Some(e) => Err(e.into()),
            None => Ok(self.message),
        }
    }
}
