//! Test support utilities for mailer integration tests
#![allow(dead_code)] // Not every test binary uses every helper

pub mod history;
pub mod mock_transport;

use courier_common::Message;
pub use history::FailingHistoryStore;
pub use mock_transport::{Call, MockTransport};

/// A deliverable message addressed to `recipients`
pub fn message_to(recipients: &[&str]) -> Message {
    Message::builder()
        .from("Sender <sender@example.com>")
        .to_many(recipients)
        .subject("Quarterly report")
        .text("Numbers attached")
        .build()
        .expect("valid message")
}
