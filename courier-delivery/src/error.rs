//! Typed error handling for the mailer.
//!
//! Two families are kept apart:
//! - [`MailerError`]: precondition failures returned to the caller
//!   (validation, unknown or non-resendable items, a disposed mailer)
//! - [`TransportError`]: delivery failures raised by a transport, which the
//!   mailer records on the item instead of returning

use std::{error::Error as StdError, fmt::Write};

use courier_common::{DeliveryItemId, ValidationError};
use courier_history::HistoryError;
use thiserror::Error;

/// Errors returned by [`crate::Mailer`] operations.
#[derive(Debug, Error)]
pub enum MailerError {
    /// The message was not deliverable as composed.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// No stored item has this identifier.
    #[error("Delivery item {0} not found in history")]
    NotFound(DeliveryItemId),

    /// The stored item did not retain enough content to be sent again.
    #[error("Delivery item {0} cannot be resent: its content was not retained")]
    NotResendable(DeliveryItemId),

    /// The mailer was disposed and its pending queue is gone.
    #[error("Mailer has been disposed")]
    Disposed,

    /// The history store failed while reading an item.
    #[error("History store error: {0}")]
    History(#[from] HistoryError),
}

impl MailerError {
    /// Returns `true` if the error is a caller mistake in composing a message.
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}

/// Failures raised by a [`crate::Transport`] while delivering an item.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The cancellation token fired before the provider answered.
    #[error("Delivery cancelled")]
    Cancelled,

    /// The provider could not be reached.
    #[error("Connection failed: {0}")]
    Connection(String),

    /// The provider refused the item.
    #[error("Rejected by provider: {0}")]
    Rejected(String),

    /// Any other provider-specific failure.
    #[error("Provider error")]
    Provider(#[source] Box<dyn StdError + Send + Sync>),
}

/// Render an error and its `source()` chain as a single message.
///
/// This is what ends up as a failed item's exception message.
#[must_use]
pub fn failure_report(error: &(dyn StdError + 'static)) -> String {
    let mut report = error.to_string();
    let mut source = error.source();

    while let Some(cause) = source {
        let _ = write!(report, "\n  caused by: {cause}");
        source = cause.source();
    }

    report
}
