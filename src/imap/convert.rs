//! Conversion from `async-imap` / `imap-proto` response types to the model.
//!
//! Response types borrow from the connection's read buffer, so everything is
//! copied into owned model values before it crosses the hand-off channel.

use std::borrow::Cow;

use async_imap::imap_proto::types::{Address, BodyStructure, Envelope as ImapEnvelope};
use async_imap::types::Fetch;

use crate::model::address::EmailAddress;
use crate::model::message::{BodyPart, Envelope, FetchedMessage, LeafPart, Params};
use crate::parser::header::{decode_header_bytes, decode_header_value, parse_date};

/// Copy the metadata items of one FETCH response.
pub fn fetched_message(fetch: &Fetch) -> FetchedMessage {
    FetchedMessage {
        sequence: fetch.message,
        envelope: fetch.envelope().map(envelope),
        size: fetch.size,
        structure: fetch.bodystructure().map(body_part),
    }
}

/// `true` if the response carries any item of the metadata query.
///
/// Servers may interleave unsolicited FETCH responses (flag changes made by
/// other sessions) with the ones answering our request.
pub fn carries_metadata(fetch: &Fetch) -> bool {
    fetch.envelope().is_some() || fetch.size.is_some() || fetch.bodystructure().is_some()
}

/// Convert an IMAP envelope, decoding subject, names and date.
pub fn envelope(env: &ImapEnvelope<'_>) -> Envelope {
    Envelope {
        from: addresses(env.from.as_deref()),
        to: addresses(env.to.as_deref()),
        subject: env
            .subject
            .as_deref()
            .map(decode_header_value)
            .unwrap_or_default(),
        date: env
            .date
            .as_deref()
            .and_then(|raw| parse_date(&decode_header_bytes(raw))),
    }
}

/// Convert an address list, skipping RFC 3501 group markers.
fn addresses(list: Option<&[Address<'_>]>) -> Vec<EmailAddress> {
    list.unwrap_or_default()
        .iter()
        .filter_map(|addr| {
            // Group start has no host, group end has neither mailbox nor host.
            let mailbox = addr.mailbox.as_deref()?;
            let host = addr.host.as_deref()?;
            let name = addr
                .name
                .as_deref()
                .map(decode_header_value)
                .unwrap_or_default();
            Some(EmailAddress::from_parts(
                &name,
                &decode_header_bytes(mailbox),
                &decode_header_bytes(host),
            ))
        })
        .collect()
}

/// Convert a BODYSTRUCTURE tree.
///
/// Single-part bodies of every kind (basic, text, message/rfc822) become
/// leaves; an attached message is not descended into.
pub fn body_part(bs: &BodyStructure<'_>) -> BodyPart {
    match bs {
        BodyStructure::Multipart { common, bodies, .. } => BodyPart::Multipart {
            subtype: common.ty.subtype.to_ascii_lowercase(),
            parts: bodies.iter().map(body_part).collect(),
        },
        BodyStructure::Basic { common, other, .. }
        | BodyStructure::Text { common, other, .. }
        | BodyStructure::Message { common, other, .. } => {
            let disposition = common.disposition.as_ref();
            BodyPart::Leaf(LeafPart {
                media_type: format!("{}/{}", common.ty.ty, common.ty.subtype)
                    .to_ascii_lowercase(),
                disposition: disposition.map(|d| d.ty.to_string()).unwrap_or_default(),
                disposition_params: disposition.and_then(|d| params(d.params.as_ref())),
                type_params: params(common.ty.params.as_ref()).unwrap_or_default(),
                size: u64::from(other.octets),
            })
        }
    }
}

/// Copy a parameter list, lowercasing keys. `None` if the server sent `NIL`.
fn params(list: Option<&Vec<(Cow<'_, str>, Cow<'_, str>)>>) -> Option<Params> {
    list.map(|pairs| {
        pairs
            .iter()
            .map(|(key, value)| (key.to_ascii_lowercase(), value.to_string()))
            .collect()
    })
}
