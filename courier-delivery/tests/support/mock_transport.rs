//! Configurable transport for exercising the mailer
//!
//! Records every delivery attempt, can fail chosen recipients, delay each
//! delivery, never complete or cancel the caller's token, and tracks how many
//! deliveries overlap and whether a connection is left open.
//!
//! ```rust,ignore
//! let transport = MockTransport::builder()
//!     .fail_for("bounce@example.com")
//!     .with_delay(Duration::from_millis(5))
//!     .build();
//! ```

use std::{
    collections::HashSet,
    sync::{
        Mutex,
        atomic::{AtomicBool, AtomicUsize, Ordering},
    },
    time::Duration,
};

use async_trait::async_trait;
use courier_common::{DeliveryItem, DeliveryItemId};
use courier_delivery::{Transport, TransportError};
use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;

/// One call to [`Transport::deliver`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Call {
    pub id: DeliveryItemId,
    pub recipient: String,
    pub auto_close: bool,
    /// Whether the item had no outcome when it reached the transport
    pub was_untried: bool,
}

#[derive(Debug, Default)]
pub struct MockTransport {
    fail_for: HashSet<String>,
    delay: Option<Duration>,
    hang: bool,
    cancel_after: Option<usize>,
    calls: Mutex<Vec<Call>>,
    connected: AtomicBool,
    closes: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    entered: Notify,
}

#[derive(Debug, Default)]
pub struct MockTransportBuilder {
    fail_for: HashSet<String>,
    delay: Option<Duration>,
    hang: bool,
    cancel_after: Option<usize>,
}

impl MockTransportBuilder {
    /// Reject deliveries to this recipient
    pub fn fail_for(mut self, email: &str) -> Self {
        self.fail_for.insert(email.to_string());
        self
    }

    /// Sleep before answering each delivery
    pub const fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Never answer; only cancellation ends a delivery
    pub const fn hanging(mut self) -> Self {
        self.hang = true;
        self
    }

    /// Cancel the caller's token once this many deliveries have completed
    pub const fn cancel_after(mut self, deliveries: usize) -> Self {
        self.cancel_after = Some(deliveries);
        self
    }

    pub fn build(self) -> MockTransport {
        MockTransport {
            fail_for: self.fail_for,
            delay: self.delay,
            hang: self.hang,
            cancel_after: self.cancel_after,
            ..MockTransport::default()
        }
    }
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn builder() -> MockTransportBuilder {
        MockTransportBuilder::default()
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().expect("calls lock").clone()
    }

    pub fn recipients(&self) -> Vec<String> {
        self.calls().into_iter().map(|call| call.recipient).collect()
    }

    /// Number of explicit `close_connection` calls
    pub fn closes(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }

    /// Whether a delivery left the connection open
    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    /// Largest number of deliveries that were running at the same time
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    /// Wait until a delivery has started
    pub async fn entered(&self) {
        self.entered.notified().await;
    }
}

#[async_trait]
impl Transport for MockTransport {
    fn provider_name(&self) -> &'static str {
        "mock"
    }

    async fn deliver(
        &self,
        item: &DeliveryItem,
        auto_close: bool,
        cancel: &CancellationToken,
    ) -> Result<String, TransportError> {
        let call_number = {
            let mut calls = self.calls.lock().expect("calls lock");
            calls.push(Call {
                id: item.id(),
                recipient: item.recipient.email.clone(),
                auto_close,
                was_untried: item.is_untried(),
            });
            calls.len()
        };

        let running = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(running, Ordering::SeqCst);
        self.entered.notify_one();

        if self.hang {
            std::future::pending::<()>().await;
        }

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        self.connected.store(!auto_close, Ordering::SeqCst);

        if self.cancel_after.is_some_and(|after| call_number >= after) {
            cancel.cancel();
        }

        if self.fail_for.contains(&item.recipient.email) {
            return Err(TransportError::Rejected(format!(
                "550 mailbox unavailable: {}",
                item.recipient.email
            )));
        }

        Ok(format!("mock-{call_number}"))
    }

    async fn close_connection(&self, _cancel: &CancellationToken) -> Result<(), TransportError> {
        self.closes.fetch_add(1, Ordering::SeqCst);
        self.connected.store(false, Ordering::SeqCst);
        Ok(())
    }
}
