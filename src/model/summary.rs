//! One row of the mailbox report.

use chrono::{DateTime, Utc};

use super::address::EmailAddress;

/// Report metadata for a single message.
///
/// Built once per streamed fetch result and never modified afterwards.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct MessageSummary {
    /// Sequence number the server reported for this message.
    pub sequence: u32,

    /// First `From` address of the envelope.
    pub from: EmailAddress,

    /// First `To` address of the envelope.
    pub to: EmailAddress,

    /// Decoded subject line (may be empty).
    pub subject: String,

    /// Envelope date, if the server sent a parseable one.
    pub date: Option<DateTime<Utc>>,

    /// Declared message size in bytes (`RFC822.SIZE`).
    pub size: u64,

    /// Attachment filenames in document order.
    pub attachment_names: Vec<String>,
}

impl MessageSummary {
    /// Number of attachments. Always equal to `attachment_names.len()`.
    pub fn attachment_count(&self) -> usize {
        self.attachment_names.len()
    }
}
