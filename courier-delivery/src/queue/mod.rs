//! Pending delivery queue
//!
//! The queue is a `Vec` behind a task-aware mutex. Every mutation goes
//! through a [`Pending`] guard, and a send keeps that guard for the whole
//! attempt, so queue changes and sends on one mailer happen in lock order.
//! After disposal the collection is gone and locking fails.

use std::fmt::Write;

use courier_common::{DeliveryItem, DeliveryItemId, queue};
use tokio::sync::{MappedMutexGuard, Mutex, MutexGuard};

use crate::error::MailerError;

#[derive(Debug)]
pub struct PendingQueue {
    items: Mutex<Option<Vec<DeliveryItem>>>,
}

impl Default for PendingQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl PendingQueue {
    #[must_use]
    pub fn new() -> Self {
        Self {
            items: Mutex::new(Some(Vec::new())),
        }
    }

    /// Wait for exclusive access to the pending items.
    ///
    /// # Errors
    /// [`MailerError::Disposed`] once the queue has been taken.
    pub async fn lock(&self) -> Result<Pending<'_>, MailerError> {
        MutexGuard::try_map(self.items.lock().await, Option::as_mut)
            .map(|items| Pending { items })
            .map_err(|_| MailerError::Disposed)
    }

    /// Invalidate the queue, returning whatever was still pending.
    ///
    /// Returns `None` if it was already taken.
    pub async fn take(&self) -> Option<Vec<DeliveryItem>> {
        self.items.lock().await.take()
    }

    /// [`PendingQueue::take`] for when the queue is exclusively owned.
    pub fn take_mut(&mut self) -> Option<Vec<DeliveryItem>> {
        self.items.get_mut().take()
    }
}

/// Exclusive access to a live pending collection
#[derive(Debug)]
pub struct Pending<'a> {
    items: MappedMutexGuard<'a, Vec<DeliveryItem>>,
}

impl Pending<'_> {
    /// Append items in order, tagging each with the provider it is queued for.
    pub fn add(&mut self, items: Vec<DeliveryItem>, provider: &str) -> Vec<DeliveryItemId> {
        let mut ids = Vec::with_capacity(items.len());

        for mut item in items {
            item.provider = Some(provider.to_owned());
            queue!(
                level = DEBUG,
                delivery_item_id = %item.id(),
                recipient = %item.recipient,
                subject = %item.subject,
                provider,
                "Queued delivery item"
            );
            ids.push(item.id());
            self.items.push(item);
        }

        ids
    }

    /// Identifiers of items that have never been attempted, in queue order
    #[must_use]
    pub fn sendable_ids(&self) -> Vec<DeliveryItemId> {
        self.items
            .iter()
            .filter(|item| item.is_untried())
            .map(DeliveryItem::id)
            .collect()
    }

    /// Remove an item by identifier. Absent identifiers are ignored.
    pub fn try_remove(&mut self, id: DeliveryItemId) -> Option<DeliveryItem> {
        let index = self.position(id)?;
        Some(self.items.remove(index))
    }

    /// Start a send attempt for `id`, if it is still pending.
    pub fn begin(&mut self, id: DeliveryItemId) -> Option<InFlight<'_>> {
        let index = self.position(id)?;
        Some(InFlight {
            items: &mut *self.items,
            index,
            completed: false,
        })
    }

    #[must_use]
    pub fn contains(&self, id: DeliveryItemId) -> bool {
        self.position(id).is_some()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &DeliveryItem> {
        self.items.iter()
    }

    fn position(&self, id: DeliveryItemId) -> Option<usize> {
        self.items.iter().position(|item| item.id() == id)
    }
}

/// An item being sent
///
/// The item leaves the queue when the attempt completes. If the attempt is
/// abandoned instead (the send future is dropped or panics), dropping this
/// removes it anyway.
#[derive(Debug)]
pub struct InFlight<'a> {
    items: &'a mut Vec<DeliveryItem>,
    index: usize,
    completed: bool,
}

impl InFlight<'_> {
    #[must_use]
    pub fn item(&self) -> &DeliveryItem {
        &self.items[self.index]
    }

    pub fn item_mut(&mut self) -> &mut DeliveryItem {
        &mut self.items[self.index]
    }

    /// Remove the item from the queue and hand it back.
    pub fn complete(mut self) -> DeliveryItem {
        self.completed = true;
        self.items.remove(self.index)
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if self.completed {
            return;
        }

        let item = self.items.remove(self.index);
        queue!(
            level = WARN,
            delivery_item_id = %item.id(),
            recipient = %item.recipient,
            subject = %item.subject,
            "Send attempt abandoned, item removed from pending without an outcome"
        );
    }
}

/// Log the items that were never attempted when a queue is invalidated.
pub fn report_undelivered(items: &[DeliveryItem]) {
    let mut listing = String::new();
    let mut count = 0_usize;

    for item in items.iter().filter(|item| item.is_untried()) {
        let _ = write!(
            listing,
            "\n  {} / {} / {}",
            item.id(),
            item.recipient,
            item.subject
        );
        count += 1;
    }

    if count > 0 {
        queue!(
            level = WARN,
            count,
            "Mailer disposed with undelivered items (id / recipient / subject):{listing}"
        );
    }
}

#[cfg(test)]
mod tests {
    use courier_common::Message;
    use pretty_assertions::assert_eq;

    use super::*;

    fn items(recipients: &[&str]) -> Vec<DeliveryItem> {
        Message::builder()
            .from("sender@example.com")
            .to_many(recipients)
            .subject("Queue test")
            .text("body")
            .build()
            .expect("valid message")
            .delivery_items()
            .expect("deliverable")
    }

    #[tokio::test]
    async fn test_add_tags_provider_and_keeps_order() {
        let queue = PendingQueue::new();
        let mut pending = queue.lock().await.expect("live queue");

        let ids = pending.add(items(&["a@example.com", "b@example.com"]), "mock");

        assert_eq!(pending.len(), 2);
        let queued: Vec<_> = pending.iter().map(DeliveryItem::id).collect();
        assert_eq!(queued, ids);
        assert!(
            pending
                .iter()
                .all(|item| item.provider.as_deref() == Some("mock"))
        );
    }

    #[tokio::test]
    async fn test_sendable_ids_skip_attempted_items() {
        let queue = PendingQueue::new();
        let mut pending = queue.lock().await.expect("live queue");
        let ids = pending.add(
            items(&["a@example.com", "b@example.com", "c@example.com"]),
            "mock",
        );

        let mut in_flight = pending.begin(ids[0]).expect("pending");
        in_flight.item_mut().mark_failed("boom");
        drop(in_flight);

        // Dropping an unfinished attempt still removes the item
        assert!(!pending.contains(ids[0]));

        let mut failed = items(&["d@example.com"]);
        failed[0].mark_failed("earlier failure");
        pending.add(failed, "mock");

        assert_eq!(pending.sendable_ids(), vec![ids[1], ids[2]]);
    }

    #[tokio::test]
    async fn test_try_remove_is_idempotent() {
        let queue = PendingQueue::new();
        let mut pending = queue.lock().await.expect("live queue");
        let ids = pending.add(items(&["a@example.com"]), "mock");

        assert!(pending.try_remove(ids[0]).is_some());
        assert!(pending.try_remove(ids[0]).is_none());
        assert!(pending.is_empty());
    }

    #[tokio::test]
    async fn test_complete_returns_item() {
        let queue = PendingQueue::new();
        let mut pending = queue.lock().await.expect("live queue");
        let ids = pending.add(items(&["a@example.com", "b@example.com"]), "mock");

        let mut in_flight = pending.begin(ids[1]).expect("pending");
        in_flight.item_mut().mark_sent("provider-1");
        let item = in_flight.complete();

        assert_eq!(item.id(), ids[1]);
        assert!(item.is_success());
        assert_eq!(pending.sendable_ids(), vec![ids[0]]);
    }

    #[tokio::test]
    async fn test_take_invalidates_queue() {
        let queue = PendingQueue::new();
        queue
            .lock()
            .await
            .expect("live queue")
            .add(items(&["a@example.com"]), "mock");

        let taken = queue.take().await.expect("first take");
        assert_eq!(taken.len(), 1);
        report_undelivered(&taken);

        assert!(queue.take().await.is_none());
        assert!(matches!(queue.lock().await, Err(MailerError::Disposed)));
    }

    #[test]
    fn test_take_mut() {
        let mut queue = PendingQueue::new();
        assert_eq!(queue.take_mut(), Some(Vec::new()));
        assert_eq!(queue.take_mut(), None);
    }
}
