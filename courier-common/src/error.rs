//! Error types for the courier-common crate.
//!
//! Validation errors describe caller mistakes in composing a message; they
//! are raised before anything is queued. Configuration errors cover loading
//! TOML settings from disk.

use std::io;

use thiserror::Error;

/// An address could not be parsed.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AddressError {
    /// The input did not parse as an RFC 5322 address.
    #[error("Invalid address {input:?}: {reason}")]
    Invalid { input: String, reason: String },

    /// A group or list was supplied where a single mailbox was expected.
    #[error("Expected a single mailbox, found {0:?}")]
    NotSingle(String),
}

/// A message is not deliverable as composed.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    /// No sender address was set.
    #[error("Message '{subject}' has no sender")]
    MissingSender { subject: String },

    /// Neither text, html nor a template was set.
    #[error("Message '{subject}' has no body")]
    MissingBody { subject: String },

    /// The recipient list is empty.
    #[error("Message '{subject}' has no recipients")]
    MissingRecipients { subject: String },

    /// An address given to the builder failed to parse.
    #[error(transparent)]
    Address(#[from] AddressError),
}

impl ValidationError {
    /// The subject of the offending message, if the error concerns a message.
    #[must_use]
    pub fn subject(&self) -> Option<&str> {
        match self {
            Self::MissingSender { subject }
            | Self::MissingBody { subject }
            | Self::MissingRecipients { subject } => Some(subject),
            Self::Address(_) => None,
        }
    }
}

/// Errors raised while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("Unable to read configuration {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: io::Error,
    },

    /// The configuration was not valid TOML for the expected shape.
    #[error("Invalid configuration: {0}")]
    Parse(#[from] toml::de::Error),
}
