//! Core data model types: addresses, body structure, envelopes and report rows.

pub mod address;
pub mod attachment;
pub mod message;
pub mod summary;
