pub mod backends;
pub mod config;
pub mod error;
pub mod r#trait;

pub use backends::{MemoryHistoryStore, NullHistoryStore, TestHistoryStore};
pub use config::{HistoryConfig, MemoryConfig};
pub use error::{HistoryError, Result};
pub use r#trait::HistoryStore;
