//! IMAP access: session management, metadata fetching, protocol conversion.
//!
//! [`MailboxSession`] is the seam between the fetch orchestration and the
//! protocol library. [`session::ImapSession`] implements it on top of
//! `async-imap`; tests implement it in memory.

pub mod convert;
pub mod fetch;
pub mod session;

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::error::Result;
use crate::model::message::FetchedMessage;
use crate::parser::sequence::SequenceSet;

/// Items requested for every message of a metadata fetch.
pub const METADATA_QUERY: &str = "(ENVELOPE RFC822.SIZE BODYSTRUCTURE)";

/// State of a mailbox right after it was selected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MailboxStatus {
    /// Number of messages in the mailbox.
    pub exists: u32,
}

/// An authenticated mailbox-access session.
///
/// A session is used by one caller at a time: select, then fetch, then log out.
#[async_trait]
pub trait MailboxSession: Send {
    /// Open `mailbox` read-only.
    async fn examine(&mut self, mailbox: &str) -> Result<MailboxStatus>;

    /// Request envelope, size and body structure for `set` and push each
    /// result into `sink` as it arrives.
    ///
    /// Returns once the server has answered the whole request. Dropping the
    /// receiving side must not make the session unusable.
    async fn fetch_metadata(
        &mut self,
        set: &SequenceSet,
        sink: mpsc::Sender<FetchedMessage>,
    ) -> Result<()>;

    /// End the session.
    async fn logout(&mut self) -> Result<()>;
}
