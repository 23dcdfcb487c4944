//! Attachment metadata derived from a message's body structure.
//!
//! Only the structure is inspected; attachment content is never fetched.

/// A body part classified as an attachment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttachmentRecord {
    /// Resolved filename. Never empty.
    pub filename: String,

    /// Size of the encoded part in bytes, as reported by the server.
    pub size: u64,
}
