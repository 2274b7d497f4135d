use async_trait::async_trait;
use courier_common::{DeliveryItem, DeliveryItemId};
use tokio_util::sync::CancellationToken;

use crate::r#trait::HistoryStore;

/// History store that keeps nothing.
///
/// Used when a mailer is built without a store: every add succeeds and every
/// lookup misses, so resends always fail with not-found.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullHistoryStore;

#[async_trait]
impl HistoryStore for NullHistoryStore {
    async fn add(&self, _item: &DeliveryItem, _cancel: &CancellationToken) -> crate::Result<()> {
        Ok(())
    }

    async fn get(
        &self,
        _id: &DeliveryItemId,
        _cancel: &CancellationToken,
    ) -> crate::Result<Option<DeliveryItem>> {
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use courier_common::Message;

    use super::*;

    #[tokio::test]
    async fn test_null_store_forgets() {
        let store = NullHistoryStore;
        let cancel = CancellationToken::new();
        let item = Message::builder()
            .from("s@example.com")
            .to("r@example.com")
            .text("hi")
            .build()
            .expect("valid message")
            .delivery_items()
            .expect("deliverable")
            .remove(0);

        store.add(&item, &cancel).await.expect("add never fails");
        assert!(
            store
                .get(&item.id(), &cancel)
                .await
                .expect("get never fails")
                .is_none()
        );
    }
}
