//! The mailer: queues messages and drives each delivery item through one send
//! attempt.
//!
//! A send attempt runs entirely under the queue lock:
//! 1. locate the item (absent items are not an error)
//! 2. hand it to the transport, racing the cancellation token
//! 3. record the outcome on the item
//! 4. persist it to history, logging and discarding any failure
//! 5. remove it from the queue and return it
//!
//! Sends on one mailer are therefore serialized with each other and with
//! queue changes. Delivery failures end up on the returned item; only
//! precondition failures are returned as errors.

use std::sync::Arc;

use courier_common::{DeliveryItem, DeliveryItemId, Message, audit, delivery, queue};
use courier_history::{HistoryStore, NullHistoryStore};
use tokio_util::sync::CancellationToken;

use crate::{
    config::MailerConfig,
    error::{MailerError, TransportError, failure_report},
    queue::{Pending, PendingQueue, report_undelivered},
    transport::Transport,
};

/// Message queue and delivery orchestrator bound to one transport
#[derive(Debug)]
pub struct Mailer {
    queue: PendingQueue,
    transport: Arc<dyn Transport>,
    history: Arc<dyn HistoryStore>,
}

impl Mailer {
    /// Create a mailer that keeps no history.
    #[must_use]
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            queue: PendingQueue::new(),
            transport,
            history: Arc::new(NullHistoryStore),
        }
    }

    /// Record delivery outcomes in `history`.
    #[must_use]
    pub fn with_history(mut self, history: Arc<dyn HistoryStore>) -> Self {
        self.history = history;
        self
    }

    /// Create a mailer from configuration.
    ///
    /// Also initialises audit logging; the first configuration to do so wins.
    #[must_use]
    pub fn from_config(transport: Arc<dyn Transport>, config: MailerConfig) -> Self {
        audit::init(config.audit);
        Self::new(transport).with_history(config.history.into_store())
    }

    #[must_use]
    pub fn transport(&self) -> &Arc<dyn Transport> {
        &self.transport
    }

    #[must_use]
    pub fn history(&self) -> &Arc<dyn HistoryStore> {
        &self.history
    }

    /// Queue one delivery item per recipient of `message`.
    ///
    /// Returns the new identifiers in recipient order.
    ///
    /// # Errors
    /// - [`MailerError::Validation`] if the message has no sender, body or
    ///   recipients; nothing is queued
    /// - [`MailerError::Disposed`] after [`Mailer::dispose`]
    pub async fn add_message(&self, message: &Message) -> Result<Vec<DeliveryItemId>, MailerError> {
        let items = message.delivery_items().inspect_err(|e| {
            queue!(
                level = ERROR,
                subject = %message.subject,
                error = %e,
                "Message is not deliverable"
            );
        })?;

        let mut pending = self.queue.lock().await?;
        Ok(pending.add(items, self.transport.provider_name()))
    }

    /// Send a single pending item.
    ///
    /// Returns `Ok(None)` if no pending item has this identifier, for example
    /// because it was already sent. Otherwise the returned item carries either
    /// the provider message id or the failure; delivery failures, including
    /// cancellation, are not returned as errors.
    ///
    /// # Errors
    /// [`MailerError::Disposed`] after [`Mailer::dispose`]
    pub async fn send(
        &self,
        id: DeliveryItemId,
        auto_close: bool,
        cancel: &CancellationToken,
    ) -> Result<Option<DeliveryItem>, MailerError> {
        let mut pending = self.queue.lock().await?;
        Ok(self.send_locked(&mut pending, id, auto_close, cancel).await)
    }

    /// Send every item that has not been attempted yet, in queue order.
    ///
    /// The set of items is fixed when the call starts; items queued while the
    /// batch runs wait for the next call. The connection is kept open between
    /// items and closed after the last one. If the token is cancelled during
    /// the batch the connection is closed explicitly.
    ///
    /// If the mailer is disposed part way through, the batch stops and the
    /// items attempted so far are returned.
    ///
    /// # Errors
    /// [`MailerError::Disposed`] if the mailer was disposed before the batch
    /// started
    pub async fn send_all(
        &self,
        cancel: &CancellationToken,
    ) -> Result<Vec<DeliveryItem>, MailerError> {
        let ids = self.queue.lock().await?.sendable_ids();
        let Some(&last) = ids.last() else {
            return Ok(Vec::new());
        };

        delivery!(level = DEBUG, count = ids.len(), "Sending pending items");

        let mut sent = Vec::with_capacity(ids.len());
        let mut closed = false;

        for id in ids {
            let auto_close = id == last;
            match self.send(id, auto_close, cancel).await {
                Ok(Some(item)) => {
                    // A cancelled delivery may never have reached the transport
                    closed = auto_close && !cancel.is_cancelled();
                    sent.push(item);
                }
                Ok(None) => {}
                Err(MailerError::Disposed) => {
                    queue!(
                        level = WARN,
                        attempted = sent.len(),
                        "Mailer disposed during batch, stopping"
                    );
                    break;
                }
                Err(e) => return Err(e),
            }
        }

        if !closed
            && !sent.is_empty()
            && let Err(e) = self.transport.close_connection(cancel).await
        {
            delivery!(
                level = WARN,
                error = %failure_report(&e),
                "Failed to close transport connection after batch"
            );
        }

        Ok(sent)
    }

    /// Send a stored item again as a new delivery item.
    ///
    /// The copy gets a new identifier and timestamp, has no outcome, and is
    /// sent straight away with `auto_close` set.
    ///
    /// # Errors
    /// - [`MailerError::NotFound`] if history has no item with this identifier
    /// - [`MailerError::NotResendable`] if the stored item lost content it
    ///   needs
    /// - [`MailerError::History`] if the history store could not be read
    /// - [`MailerError::Disposed`] after [`Mailer::dispose`]
    pub async fn resend(
        &self,
        id: DeliveryItemId,
        cancel: &CancellationToken,
    ) -> Result<DeliveryItem, MailerError> {
        let stored = self
            .history
            .get(&id, cancel)
            .await?
            .ok_or(MailerError::NotFound(id))?;

        if !stored.is_resendable() {
            return Err(MailerError::NotResendable(id));
        }

        let fresh = stored.to_resend();
        let fresh_id = fresh.id();
        delivery!(
            level = DEBUG,
            delivery_item_id = %fresh_id,
            original_id = %id,
            "Resending stored item"
        );

        let mut pending = self.queue.lock().await?;
        pending.add(vec![fresh], self.transport.provider_name());

        self.send_locked(&mut pending, fresh_id, true, cancel)
            .await
            .ok_or(MailerError::NotFound(fresh_id))
    }

    /// Invalidate the queue, warning about any items that were never attempted.
    ///
    /// Waits for an in-progress send to finish. Further operations fail with
    /// [`MailerError::Disposed`]; disposing twice does nothing.
    pub async fn dispose(&self) {
        if let Some(items) = self.queue.take().await {
            report_undelivered(&items);
        }
    }

    /// Number of items waiting to be sent
    ///
    /// # Errors
    /// [`MailerError::Disposed`] after [`Mailer::dispose`]
    pub async fn pending_count(&self) -> Result<usize, MailerError> {
        Ok(self.queue.lock().await?.len())
    }

    /// Copies of the pending items, in queue order
    ///
    /// # Errors
    /// [`MailerError::Disposed`] after [`Mailer::dispose`]
    pub async fn pending_items(&self) -> Result<Vec<DeliveryItem>, MailerError> {
        Ok(self.queue.lock().await?.iter().cloned().collect())
    }

    /// # Errors
    /// [`MailerError::Disposed`] after [`Mailer::dispose`]
    pub async fn is_pending(&self, id: DeliveryItemId) -> Result<bool, MailerError> {
        Ok(self.queue.lock().await?.contains(id))
    }

    async fn send_locked(
        &self,
        pending: &mut Pending<'_>,
        id: DeliveryItemId,
        auto_close: bool,
        cancel: &CancellationToken,
    ) -> Option<DeliveryItem> {
        let Some(mut in_flight) = pending.begin(id) else {
            delivery!(delivery_item_id = %id, "Item is not pending, nothing to send");
            return None;
        };

        let result = tokio::select! {
            biased;
            () = cancel.cancelled() => Err(TransportError::Cancelled),
            result = self.transport.deliver(in_flight.item(), auto_close, cancel) => result,
        };

        Self::record_outcome(in_flight.item_mut(), result);
        self.persist(in_flight.item(), cancel).await;

        Some(in_flight.complete())
    }

    fn record_outcome(item: &mut DeliveryItem, result: Result<String, TransportError>) {
        match result {
            Ok(provider_message_id) => {
                item.mark_sent(provider_message_id);
                delivery!(
                    level = INFO,
                    delivery_item_id = %item.id(),
                    recipient = %item.recipient,
                    subject = %item.subject,
                    result = %item.outcome(),
                    provider_message_id = item.provider_message_id().unwrap_or_default(),
                    "Delivery succeeded"
                );
                audit::log_delivery_succeeded(item);
            }
            Err(e) => {
                item.mark_failed(failure_report(&e));
                delivery!(
                    level = ERROR,
                    delivery_item_id = %item.id(),
                    recipient = %item.recipient,
                    subject = %item.subject,
                    result = %item.outcome(),
                    exception_message = item.exception_message().unwrap_or_default(),
                    "Delivery failed"
                );
                audit::log_delivery_failed(item);
            }
        }
    }

    async fn persist(&self, item: &DeliveryItem, cancel: &CancellationToken) {
        if let Err(e) = self.history.add(item, cancel).await {
            delivery!(
                level = ERROR,
                delivery_item_id = %item.id(),
                result = %item.outcome(),
                error = %e,
                "Failed to record delivery item in history"
            );
        }
    }
}

impl Drop for Mailer {
    fn drop(&mut self) {
        if let Some(items) = self.queue.take_mut() {
            report_undelivered(&items);
        }
    }
}
