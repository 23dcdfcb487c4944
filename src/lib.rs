//! `mailscope` — inspect an IMAP mailbox from the terminal.
//!
//! This crate provides the core library for authenticating to a mail server,
//! fetching envelope and structure metadata for a range of messages, and
//! classifying which MIME parts of each message are attachments.

pub mod config;
pub mod error;
pub mod export;
pub mod imap;
pub mod model;
pub mod parser;
pub mod terminal;
