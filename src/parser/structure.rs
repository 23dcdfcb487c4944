//! Attachment detection over a BODYSTRUCTURE tree.
//!
//! The walk is purely structural: it never fetches content and never fails.
//! Parts that do not look like attachments simply contribute nothing.

use crate::model::attachment::AttachmentRecord;
use crate::model::message::{BodyPart, LeafPart};

use super::header::decode_encoded_words;

/// Maximum multipart nesting that is descended into. Deeper subtrees are ignored.
const MAX_DEPTH: usize = 32;

/// Collect every attachment in `root`, in document order.
///
/// A leaf part is an attachment when its disposition is `attachment`
/// (case-insensitive) and it has a non-empty filename (see
/// [`LeafPart::filename`]). Multipart containers contribute the
/// concatenation of their children's attachments.
pub fn find_attachments(root: &BodyPart) -> Vec<AttachmentRecord> {
    let mut found = Vec::new();
    collect(root, 0, &mut found);
    found
}

fn collect(part: &BodyPart, depth: usize, found: &mut Vec<AttachmentRecord>) {
    match part {
        BodyPart::Multipart { parts, .. } => {
            if depth >= MAX_DEPTH {
                tracing::warn!(depth, "Body structure nested too deeply, skipping subtree");
                return;
            }
            for child in parts {
                collect(child, depth + 1, found);
            }
        }
        BodyPart::Leaf(leaf) => {
            if let Some(record) = attachment_record(leaf) {
                found.push(record);
            }
        }
    }
}

fn attachment_record(leaf: &LeafPart) -> Option<AttachmentRecord> {
    if !leaf.disposition.eq_ignore_ascii_case("attachment") {
        return None;
    }
    let filename = decode_encoded_words(leaf.filename()?);
    if filename.is_empty() {
        return None;
    }
    Some(AttachmentRecord {
        filename,
        size: leaf.size,
    })
}
