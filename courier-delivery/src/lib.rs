//! Pending delivery queue and mailer
//!
//! This crate provides:
//! - [`Mailer`]: queues messages as per-recipient delivery items and sends them
//!   one at a time through a [`Transport`]
//! - [`Transport`]: the provider capability a mailer delivers through, with
//!   [`LogTransport`] for development
//! - [`MailerConfig`]: TOML configuration for history and audit settings
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use courier_common::Message;
//! use courier_delivery::{LogTransport, Mailer};
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let mailer = Mailer::new(Arc::new(LogTransport::new()));
//! let message = Message::builder()
//!     .from("noreply@example.com")
//!     .to_many(["a@example.com", "b@example.com"])
//!     .subject("Welcome")
//!     .text("Hello!")
//!     .build()?;
//!
//! mailer.add_message(&message).await?;
//! for item in mailer.send_all(&CancellationToken::new()).await? {
//!     println!("{}: {}", item.recipient, item.outcome());
//! }
//! # Ok(())
//! # }
//! ```

mod config;
mod error;
mod mailer;
pub mod queue;
mod transport;

pub use config::MailerConfig;
pub use error::{MailerError, TransportError, failure_report};
pub use mailer::Mailer;
pub use transport::{LogTransport, Transport};
