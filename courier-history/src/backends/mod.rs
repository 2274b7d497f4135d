//! History store implementations
//!
//! - `memory`: in-process store with optional capacity and attachment retention
//! - `null`: discards everything, the default when no store is configured
//! - `test`: memory store with synchronization helpers for tests

pub mod memory;
pub mod null;

pub use memory::MemoryHistoryStore;
pub use null::NullHistoryStore;
pub use test::TestHistoryStore;
