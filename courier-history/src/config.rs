use std::sync::Arc;

use serde::Deserialize;

use crate::{
    backends::{MemoryHistoryStore, NullHistoryStore},
    r#trait::HistoryStore,
};

/// Configuration for the history store
///
/// # Examples
///
/// No history (the default):
/// ```toml
/// [history]
/// type = "None"
/// ```
///
/// Memory-backed history that drops attachment bytes:
/// ```toml
/// [history]
/// type = "Memory"
/// capacity = 10000
/// retain_attachments = false
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(tag = "type")]
pub enum HistoryConfig {
    /// Keep no history
    #[default]
    None,
    /// In-process history
    Memory(MemoryConfig),
}

/// Configuration for memory-backed history
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct MemoryConfig {
    /// Maximum number of items to store (omit for unlimited)
    #[serde(default)]
    pub capacity: Option<usize>,

    /// Keep attachment bytes so items stay resendable
    #[serde(default = "default_retain_attachments")]
    pub retain_attachments: bool,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            capacity: None,
            retain_attachments: default_retain_attachments(),
        }
    }
}

const fn default_retain_attachments() -> bool {
    true
}

impl HistoryConfig {
    /// Build the configured store as a trait object
    #[must_use]
    pub fn into_store(self) -> Arc<dyn HistoryStore> {
        match self {
            Self::None => Arc::new(NullHistoryStore),
            Self::Memory(config) => {
                let mut store =
                    MemoryHistoryStore::new().retain_attachments(config.retain_attachments);
                if let Some(capacity) = config.capacity {
                    store = store.with_capacity(capacity);
                }
                Arc::new(store)
            }
        }
    }
}
