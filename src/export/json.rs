//! JSON report.

use std::io::Write;

use serde::Serialize;

use crate::model::summary::MessageSummary;

#[derive(Serialize)]
struct JsonReport<'a> {
    message_count: usize,
    messages: Vec<JsonMessage<'a>>,
}

#[derive(Serialize)]
struct JsonMessage<'a> {
    #[serde(flatten)]
    summary: &'a MessageSummary,
    attachment_count: usize,
}

fn report(summaries: &[MessageSummary]) -> JsonReport<'_> {
    JsonReport {
        message_count: summaries.len(),
        messages: summaries
            .iter()
            .map(|summary| JsonMessage {
                summary,
                attachment_count: summary.attachment_count(),
            })
            .collect(),
    }
}

/// Build the JSON document for `summaries`.
pub fn report_json(summaries: &[MessageSummary]) -> serde_json::Result<serde_json::Value> {
    serde_json::to_value(report(summaries))
}

/// Write the pretty-printed JSON report to `out`.
pub fn write_json<W: Write>(out: &mut W, summaries: &[MessageSummary]) -> anyhow::Result<()> {
    serde_json::to_writer_pretty(&mut *out, &report(summaries))?;
    writeln!(out)?;
    Ok(())
}
