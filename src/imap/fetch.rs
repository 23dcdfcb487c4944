//! Bulk metadata fetch: select, compute the sequence set, stream, summarize.
//!
//! The FETCH response is produced and consumed concurrently. The producer
//! (the session) pushes each message into a bounded channel; the consumer
//! drains it into [`MessageSummary`] values. The producer's final result
//! travels on a separate oneshot channel and is read only after the bounded
//! channel has been drained to closure.

use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

use super::MailboxSession;
use crate::error::{MailError, Result};
use crate::model::message::FetchedMessage;
use crate::model::summary::MessageSummary;
use crate::parser::sequence::SequenceSet;
use crate::parser::structure::find_attachments;

/// Default capacity of the hand-off channel between producer and consumer.
pub const DEFAULT_BUFFER_CAPACITY: usize = 10;

/// Progress callback: `(messages drained so far, messages targeted)`.
pub type ProgressFn<'a> = &'a dyn Fn(usize, usize);

/// What to fetch.
#[derive(Debug, Clone)]
pub struct FetchRequest<'a> {
    /// Mailbox to examine.
    pub mailbox: &'a str,
    /// Explicit range specification; `None` fetches every message.
    pub range: Option<&'a str>,
    /// Hand-off channel capacity (at least 1).
    pub buffer_capacity: usize,
}

impl<'a> FetchRequest<'a> {
    pub fn new(mailbox: &'a str) -> Self {
        Self {
            mailbox,
            range: None,
            buffer_capacity: DEFAULT_BUFFER_CAPACITY,
        }
    }

    pub fn with_range(mut self, range: Option<&'a str>) -> Self {
        self.range = range;
        self
    }
}

/// Examine the mailbox and return one summary per targeted message, in the
/// order the server delivered them.
///
/// If the server reports a failure for the FETCH, or a message lacks an item
/// the report needs, the whole call fails and nothing already drained is
/// returned.
pub async fn fetch_summaries<S: MailboxSession + ?Sized>(
    session: &mut S,
    request: &FetchRequest<'_>,
    progress: Option<ProgressFn<'_>>,
) -> Result<Vec<MessageSummary>> {
    let status = session.examine(request.mailbox).await?;
    info!(
        mailbox = request.mailbox,
        exists = status.exists,
        "Mailbox selected"
    );

    let set = match request.range {
        None => SequenceSet::all(status.exists),
        Some(spec) => SequenceSet::parse(spec)?,
    };
    // Only numbers that exist go on the wire; servers reject the rest with BAD.
    let targets = set.numbers(status.exists);
    if targets.is_empty() {
        info!(requested = %set, "Nothing to fetch");
        return Ok(Vec::new());
    }
    let total = targets.len();
    let set = SequenceSet::from_numbers(&targets);
    info!(set = %set, total, "Fetching message metadata");

    let (tx, rx) = mpsc::channel(request.buffer_capacity.max(1));
    let (done_tx, done_rx) = oneshot::channel();

    let producer = async move {
        // `tx` is consumed here, so the channel is closed before completion is signalled.
        let result = session.fetch_metadata(&set, tx).await;
        if done_tx.send(result).is_err() {
            debug!("Consumer stopped before fetch completion");
        }
    };
    let consumer = drain(rx, done_rx, total, progress);

    let ((), outcome) = tokio::join!(producer, consumer);
    outcome
}

async fn drain(
    mut rx: mpsc::Receiver<FetchedMessage>,
    done: oneshot::Receiver<Result<()>>,
    total: usize,
    progress: Option<ProgressFn<'_>>,
) -> Result<Vec<MessageSummary>> {
    let mut summaries = Vec::new();
    while let Some(message) = rx.recv().await {
        debug!(sequence = message.sequence, "Received message metadata");
        summaries.push(summarize(message)?);
        if let Some(report) = progress {
            report(summaries.len(), total);
        }
    }

    match done.await {
        Ok(Ok(())) => Ok(summaries),
        Ok(Err(e)) => {
            warn!(
                drained = summaries.len(),
                error = %e,
                "Fetch failed, discarding drained messages"
            );
            Err(e)
        }
        Err(_) => Err(MailError::Fetch(
            "fetch ended without reporting completion".to_string(),
        )),
    }
}

/// Build the report row for one fetched message.
///
/// The first `From` and first `To` addresses are used. A message without
/// either, or without envelope, size or body structure, is an error.
pub fn summarize(message: FetchedMessage) -> Result<MessageSummary> {
    let sequence = message.sequence;
    let envelope = message
        .envelope
        .ok_or_else(|| MailError::missing(sequence, "envelope"))?;
    let size = message
        .size
        .ok_or_else(|| MailError::missing(sequence, "size"))?;
    let structure = message
        .structure
        .ok_or_else(|| MailError::missing(sequence, "body structure"))?;

    let from = envelope
        .from
        .into_iter()
        .next()
        .ok_or_else(|| MailError::missing(sequence, "sender address"))?;
    let to = envelope
        .to
        .into_iter()
        .next()
        .ok_or_else(|| MailError::missing(sequence, "recipient address"))?;

    let attachment_names = find_attachments(&structure)
        .into_iter()
        .map(|attachment| attachment.filename)
        .collect();

    Ok(MessageSummary {
        sequence,
        from,
        to,
        subject: envelope.subject,
        date: envelope.date,
        size: u64::from(size),
        attachment_names,
    })
}
