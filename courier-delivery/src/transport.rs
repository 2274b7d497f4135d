//! Provider transports
//!
//! A [`Transport`] performs the actual delivery of one item. The mailer holds
//! a single transport, chosen at construction, and calls it while holding its
//! queue lock, so an implementation never sees two deliveries at once from the
//! same mailer.

use std::{
    fmt::Debug,
    sync::atomic::{AtomicBool, AtomicUsize, Ordering},
};

use async_trait::async_trait;
use courier_common::{DeliveryItem, delivery};
use tokio_util::sync::CancellationToken;

use crate::error::TransportError;

/// Provider-specific delivery capability
#[async_trait]
pub trait Transport: Send + Sync + Debug {
    /// Name recorded on every item queued against this transport
    fn provider_name(&self) -> &'static str {
        std::any::type_name::<Self>()
            .rsplit("::")
            .next()
            .unwrap_or_default()
    }

    /// Deliver a single item, returning the identifier the provider assigned.
    ///
    /// When `auto_close` is false the connection may be kept open for the next
    /// item; the mailer then calls [`Transport::close_connection`] or passes
    /// `auto_close = true` on the last item of a batch.
    ///
    /// # Errors
    /// Any failure to deliver, including cancellation.
    async fn deliver(
        &self,
        item: &DeliveryItem,
        auto_close: bool,
        cancel: &CancellationToken,
    ) -> Result<String, TransportError>;

    /// Close a connection left open by an earlier `deliver`.
    ///
    /// May be called when no connection is open, and must then succeed.
    ///
    /// # Errors
    /// If the connection could not be shut down cleanly.
    async fn close_connection(&self, cancel: &CancellationToken) -> Result<(), TransportError>;
}

/// Transport that logs each item instead of sending it
///
/// Useful in development: every delivery succeeds with a generated provider
/// id, and the open/closed state of the pretend connection is tracked so
/// batching behaviour can be observed.
#[derive(Debug, Default)]
pub struct LogTransport {
    connected: AtomicBool,
    delivered: AtomicUsize,
}

impl LogTransport {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a connection is currently held open
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Acquire)
    }

    /// Number of items delivered so far
    #[must_use]
    pub fn delivered(&self) -> usize {
        self.delivered.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl Transport for LogTransport {
    fn provider_name(&self) -> &'static str {
        "log"
    }

    async fn deliver(
        &self,
        item: &DeliveryItem,
        auto_close: bool,
        cancel: &CancellationToken,
    ) -> Result<String, TransportError> {
        if cancel.is_cancelled() {
            return Err(TransportError::Cancelled);
        }

        if !self.connected.swap(true, Ordering::AcqRel) {
            delivery!(level = DEBUG, "Opening log transport connection");
        }

        let provider_message_id = format!("log-{}", ulid::Ulid::new());
        delivery!(
            level = INFO,
            delivery_item_id = %item.id(),
            sender = %item.sender,
            recipient = %item.recipient,
            subject = %item.subject,
            attachments = item.attachments.len(),
            provider_message_id = %provider_message_id,
            "Logged delivery"
        );
        self.delivered.fetch_add(1, Ordering::Relaxed);

        if auto_close {
            self.close_connection(cancel).await?;
        }

        Ok(provider_message_id)
    }

    async fn close_connection(&self, _cancel: &CancellationToken) -> Result<(), TransportError> {
        if self.connected.swap(false, Ordering::AcqRel) {
            delivery!(level = DEBUG, "Closing log transport connection");
        }
        Ok(())
    }
}
