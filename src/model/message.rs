//! Per-message metadata as delivered by the server.
//!
//! These types are a protocol-neutral copy of what a metadata FETCH returns:
//! the envelope, the declared size and the body structure tree.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use super::address::EmailAddress;

/// Parameter list of a MIME header (`name=value` pairs, keys lowercased).
pub type Params = BTreeMap<String, String>;

/// One node of a message's body structure tree.
#[derive(Debug, Clone, PartialEq)]
pub enum BodyPart {
    /// A `multipart/*` container. Its disposition is ignored.
    Multipart {
        /// Lowercased subtype (`mixed`, `alternative`, ...).
        subtype: String,
        /// Child parts in document order.
        parts: Vec<BodyPart>,
    },
    /// Any non-multipart part.
    Leaf(LeafPart),
}

/// A non-multipart body part.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LeafPart {
    /// Lowercased `type/subtype`.
    pub media_type: String,

    /// Content-Disposition label (`attachment`, `inline`, ...). Empty when
    /// the part carries no disposition.
    pub disposition: String,

    /// Content-Disposition parameters. `None` when the server sent no
    /// parameter list at all.
    pub disposition_params: Option<Params>,

    /// Content-Type parameters (`charset`, `name`, ...).
    pub type_params: Params,

    /// Encoded size of the part in bytes.
    pub size: u64,
}

impl LeafPart {
    /// Resolve the filename of this part.
    ///
    /// Lookup order: disposition `filename`, then disposition `name`, then
    /// content-type `name`. A `filename` parameter that is present stops the
    /// lookup even when it is empty.
    pub fn filename(&self) -> Option<&str> {
        let disposition = self.disposition_params.as_ref();
        if let Some(filename) = disposition.and_then(|p| p.get("filename")) {
            return Some(filename);
        }
        disposition
            .and_then(|p| p.get("name"))
            .or_else(|| self.type_params.get("name"))
            .map(String::as_str)
    }
}

/// Header-level metadata of a message.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Envelope {
    pub from: Vec<EmailAddress>,
    pub to: Vec<EmailAddress>,
    /// Decoded subject (may be empty).
    pub subject: String,
    /// `None` when the server sent no date or it could not be parsed.
    pub date: Option<DateTime<Utc>>,
}

/// One streamed result of a metadata FETCH.
///
/// Items the server left out of its response are `None`.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchedMessage {
    /// Message sequence number within the selected mailbox.
    pub sequence: u32,
    pub envelope: Option<Envelope>,
    /// `RFC822.SIZE` in bytes.
    pub size: Option<u32>,
    pub structure: Option<BodyPart>,
}
