//! Shared types for courier
//!
//! - [`message`]: outgoing message model and its fluent builder
//! - [`item`]: per-recipient delivery items and their outcome state
//! - [`logging`] and [`audit`]: tracing setup and structured lifecycle events

pub mod address;
pub mod audit;
pub mod config;
pub mod error;
pub mod item;
pub mod logging;
pub mod message;

pub use address::Address;
pub use error::{AddressError, ConfigError, ValidationError};
pub use item::{DeliveryItem, DeliveryItemId, DeliveryOutcome};
pub use message::{Attachment, Body, Message, MessageBuilder};
pub use tracing;
