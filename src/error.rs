//! Centralized error types for mailscope.

use thiserror::Error;

/// All errors produced by the mailscope library.
#[derive(Error, Debug)]
pub enum MailError {
    /// The server address could not be split into host and port.
    #[error("Invalid server address '{0}'")]
    InvalidAddress(String),

    /// The TCP connection could not be established.
    #[error("Could not connect to {address}: {source}")]
    Connect {
        address: String,
        source: std::io::Error,
    },

    /// TLS setup or handshake failed.
    #[error("TLS error: {0}")]
    Tls(String),

    /// The server rejected the credentials.
    #[error("Login failed for '{user}': {source}")]
    Auth {
        user: String,
        source: async_imap::error::Error,
    },

    /// Any other failure reported by the IMAP library.
    #[error("IMAP error: {0}")]
    Imap(#[from] async_imap::error::Error),

    /// The metadata request failed on the producer side.
    #[error("Fetch failed: {0}")]
    Fetch(String),

    /// The explicit message range could not be parsed.
    #[error("Invalid message range '{input}': {reason}")]
    InvalidSequenceSet { input: String, reason: String },

    /// A fetched message lacks an item the report needs.
    #[error("Message {sequence} has no {field}")]
    MissingData { sequence: u32, field: &'static str },

    /// The controlling terminal could not be opened.
    #[error("Terminal unavailable: {0}")]
    TerminalUnavailable(std::io::Error),

    /// Switching the terminal into raw mode failed.
    #[error("Could not switch terminal mode: {0}")]
    RawMode(std::io::Error),

    /// Reading from the terminal failed mid-capture.
    #[error("Terminal read failed: {0}")]
    TerminalRead(std::io::Error),

    /// Restoring the terminal failed. `prior` holds the error that was
    /// already being returned, if any.
    #[error("Could not restore terminal: {source}{}", describe_prior(.prior))]
    TerminalRestore {
        source: std::io::Error,
        prior: Option<Box<MailError>>,
    },

    /// Releasing the terminal device failed.
    #[error("Could not close terminal: {source}{}", describe_prior(.prior))]
    TerminalClose {
        source: std::io::Error,
        prior: Option<Box<MailError>>,
    },

    /// The user aborted the password prompt.
    #[error("Operation cancelled by user")]
    Cancelled,

    /// Session teardown failed.
    #[error("Logout failed: {0}")]
    Logout(async_imap::error::Error),

    /// Plain I/O error without more specific context.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience alias for `Result<T, MailError>`.
pub type Result<T> = std::result::Result<T, MailError>;

fn describe_prior(prior: &Option<Box<MailError>>) -> String {
    match prior {
        Some(err) => format!(" (after: {err})"),
        None => String::new(),
    }
}

impl MailError {
    /// Build an `InvalidSequenceSet` error for `input`.
    pub fn sequence(input: &str, reason: impl Into<String>) -> Self {
        Self::InvalidSequenceSet {
            input: input.to_string(),
            reason: reason.into(),
        }
    }

    /// Build a `MissingData` error for message `sequence`.
    pub fn missing(sequence: u32, field: &'static str) -> Self {
        Self::MissingData { sequence, field }
    }
}
