//! Parsing: envelope header decoding, sequence sets, and body-structure walking.

pub mod header;
pub mod sequence;
pub mod structure;
