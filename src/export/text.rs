//! Tab-separated text report.
//!
//! One header line, then one line per message:
//! recipient, sender, subject, date, size, attachment count, attachment names.

use std::io::Write;

use crate::model::summary::MessageSummary;

/// Header line of the report.
pub const HEADER: [&str; 7] = [
    "To",
    "From",
    "Subject",
    "Date",
    "Size",
    "Attachments",
    "Attachment Names",
];

/// Formatting options for the report.
#[derive(Debug, Clone)]
pub struct ReportOptions {
    /// `strftime` format for the date column.
    pub date_format: String,
    /// Separator between attachment names.
    pub name_separator: String,
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self {
            date_format: "%a, %d %b %Y %H:%M:%S %z".to_string(),
            name_separator: ", ".to_string(),
        }
    }
}

/// Write the report for `summaries` to `out`.
pub fn write_report<W: Write>(
    out: &mut W,
    summaries: &[MessageSummary],
    options: &ReportOptions,
) -> anyhow::Result<()> {
    writeln!(out, "{}", HEADER.join("\t"))?;
    for summary in summaries {
        let date = summary
            .date
            .map(|d| d.format(&options.date_format).to_string())
            .unwrap_or_default();
        let names = summary
            .attachment_names
            .iter()
            .map(|name| field(name))
            .collect::<Vec<_>>()
            .join(&options.name_separator);

        writeln!(
            out,
            "{}\t{}\t{}\t{}\t{}\t{}\t{}",
            field(&summary.to.address),
            field(&summary.from.address),
            field(&summary.subject),
            date,
            summary.size,
            summary.attachment_count(),
            names,
        )?;
    }
    out.flush()?;
    Ok(())
}

/// Keep a value on one line and inside its column.
fn field(value: &str) -> String {
    value.replace(['\t', '\r', '\n'], " ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::address::EmailAddress;
    use chrono::{TimeZone, Utc};

    fn summary(subject: &str, names: &[&str]) -> MessageSummary {
        MessageSummary {
            sequence: 1,
            from: EmailAddress::from_parts("Alice", "alice", "example.com"),
            to: EmailAddress::from_parts("", "bob", "example.org"),
            subject: subject.to_string(),
            date: Some(Utc.with_ymd_and_hms(2024, 1, 4, 10, 0, 0).unwrap()),
            size: 2048,
            attachment_names: names.iter().map(|s| s.to_string()).collect(),
        }
    }

    fn render(summaries: &[MessageSummary]) -> String {
        let mut buf = Vec::new();
        write_report(&mut buf, summaries, &ReportOptions::default()).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn test_header_only_for_empty_report() {
        assert_eq!(
            render(&[]),
            "To\tFrom\tSubject\tDate\tSize\tAttachments\tAttachment Names\n"
        );
    }

    #[test]
    fn test_row_layout() {
        let out = render(&[summary("Q1 numbers", &["a.pdf", "b.xlsx"])]);
        let row = out.lines().nth(1).unwrap();
        assert_eq!(
            row,
            "bob@example.org\talice@example.com\tQ1 numbers\tThu, 04 Jan 2024 10:00:00 +0000\t2048\t2\ta.pdf, b.xlsx"
        );
    }

    #[test]
    fn test_tabs_and_newlines_are_flattened() {
        let out = render(&[summary("split\tsubject\r\nhere", &[])]);
        let row = out.lines().nth(1).unwrap();
        assert_eq!(row.split('\t').count(), 7);
        assert!(row.contains("split subject  here"));
    }

    #[test]
    fn test_missing_date_renders_empty() {
        let mut s = summary("x", &[]);
        s.date = None;
        let out = render(&[s]);
        let row = out.lines().nth(1).unwrap();
        assert_eq!(row.split('\t').nth(3), Some(""));
    }
}
