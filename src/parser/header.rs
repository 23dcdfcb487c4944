//! Decoding of raw envelope values: charsets, RFC 2047 encoded-words, dates.
//!
//! IMAP envelopes carry header values verbatim as bytes, so subjects and
//! display names still contain encoded-words and dates are free-form.

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use mail_parser::MessageParser;
use tracing::warn;

/// Decode raw header bytes to a string.
///
/// Tries UTF-8 first, then falls back to Windows-1252 (which accepts every byte).
pub fn decode_header_bytes(bytes: &[u8]) -> String {
    match std::str::from_utf8(bytes) {
        Ok(s) => s.to_string(),
        Err(_) => {
            let (decoded, _, _) = encoding_rs::WINDOWS_1252.decode(bytes);
            decoded.into_owned()
        }
    }
}

/// Decode RFC 2047 encoded-words in a header value.
///
/// Example: `"=?UTF-8?B?SG9sYQ==?= =?UTF-8?B?IG11bmRv?="` → `"Hola mundo"`
///
/// Values without encoded-words are returned unchanged, as are values
/// `mail-parser` cannot make sense of.
pub fn decode_encoded_words(input: &str) -> String {
    if !input.contains("=?") {
        return input.to_string();
    }

    // Wrap the value in a one-header message so mail-parser decodes it.
    let flat = input.replace(['\r', '\n'], " ");
    let fake_msg = format!("Subject: {flat}\n\n");
    MessageParser::default()
        .parse(fake_msg.as_bytes())
        .and_then(|msg| msg.subject().map(str::to_string))
        .unwrap_or_else(|| input.to_string())
}

/// Decode raw envelope bytes and resolve encoded-words in one step.
pub fn decode_header_value(bytes: &[u8]) -> String {
    decode_encoded_words(&decode_header_bytes(bytes))
}

/// Parse an envelope date in the formats servers actually send.
///
/// Supports RFC 2822, RFC 3339, named time zones and a few broken variants.
pub fn parse_date(date_str: &str) -> Option<DateTime<Utc>> {
    let trimmed = date_str.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc2822(trimmed) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(dt.with_timezone(&Utc));
    }

    // "Thu, 04 Jan 2024 10:00:00 +0000 (UTC)" and friends
    let cleaned = strip_comment(&strip_day_of_week(trimmed));
    let cleaned = replace_named_tz(&cleaned);

    const FORMATS: [&str; 5] = [
        "%d %b %Y %H:%M:%S %z",
        "%d %b %Y %H:%M %z",
        "%d-%b-%Y %H:%M:%S %z",
        "%Y-%m-%d %H:%M:%S %z",
        "%d %b %Y %H:%M:%S",
    ];
    for fmt in FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(&cleaned, fmt) {
            return Some(dt.with_timezone(&Utc));
        }
        if let Ok(ndt) = NaiveDateTime::parse_from_str(&cleaned, fmt) {
            return Some(Utc.from_utc_datetime(&ndt));
        }
    }

    if let Some(dt) = mail_parser_date(trimmed) {
        return Some(dt);
    }

    warn!(date = trimmed, "Could not parse date");
    None
}

/// Last resort: let `mail-parser` interpret the value as a `Date:` header.
fn mail_parser_date(input: &str) -> Option<DateTime<Utc>> {
    let fake_msg = format!("Date: {input}\n\n");
    let parsed = MessageParser::default().parse(fake_msg.as_bytes())?;
    let rfc3339 = parsed.date()?.to_rfc3339();
    DateTime::parse_from_rfc3339(&rfc3339)
        .ok()
        .map(|d| d.with_timezone(&Utc))
}

fn strip_day_of_week(s: &str) -> String {
    match s.split_once(',') {
        Some((day, rest)) if day.len() == 3 && day.chars().all(char::is_alphabetic) => {
            rest.trim().to_string()
        }
        _ => s.to_string(),
    }
}

/// Drop a trailing parenthesised comment such as `(UTC)` or `(PDT)`.
fn strip_comment(s: &str) -> String {
    match s.find('(') {
        Some(pos) => s[..pos].trim().to_string(),
        None => s.to_string(),
    }
}

fn replace_named_tz(s: &str) -> String {
    const ZONES: [(&str, &str); 13] = [
        ("UT", "+0000"),
        ("UTC", "+0000"),
        ("GMT", "+0000"),
        ("EST", "-0500"),
        ("EDT", "-0400"),
        ("CST", "-0600"),
        ("CDT", "-0500"),
        ("MST", "-0700"),
        ("MDT", "-0600"),
        ("PST", "-0800"),
        ("PDT", "-0700"),
        ("CET", "+0100"),
        ("CEST", "+0200"),
    ];
    if let Some((head, zone)) = s.rsplit_once(' ') {
        if let Some((_, offset)) = ZONES.iter().find(|(name, _)| *name == zone) {
            return format!("{head} {offset}");
        }
    }
    s.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_base64_encoded_word() {
        assert_eq!(decode_encoded_words("=?UTF-8?B?SG9sYSBtdW5kbw==?="), "Hola mundo");
    }

    #[test]
    fn test_decode_q_encoded_word() {
        assert_eq!(decode_encoded_words("=?ISO-8859-1?Q?caf=E9?="), "café");
    }

    #[test]
    fn test_plain_value_passes_through() {
        assert_eq!(decode_encoded_words("Quarterly numbers"), "Quarterly numbers");
    }

    #[test]
    fn test_decode_header_bytes_latin1_fallback() {
        // "Müller" in Windows-1252
        assert_eq!(decode_header_bytes(b"M\xfcller"), "Müller");
    }

    #[test]
    fn test_decode_header_value_combines_both_steps() {
        assert_eq!(decode_header_value(b"=?UTF-8?Q?Caf=C3=A9?="), "Café");
    }

    #[test]
    fn test_parse_date_rfc2822() {
        let dt = parse_date("Thu, 04 Jan 2024 10:00:00 +0000").unwrap();
        assert_eq!(dt.format("%Y-%m-%d %H:%M").to_string(), "2024-01-04 10:00");
    }

    #[test]
    fn test_parse_date_with_comment() {
        let dt = parse_date("Thu, 04 Jan 2024 10:00:00 +0000 (UTC)").unwrap();
        assert_eq!(dt.format("%Y-%m-%d").to_string(), "2024-01-04");
    }

    #[test]
    fn test_parse_date_named_tz() {
        let dt = parse_date("Thu, 04 Jan 2024 10:00:00 EST").unwrap();
        assert_eq!(dt.format("%H").to_string(), "15");
    }

    #[test]
    fn test_parse_date_iso8601() {
        assert!(parse_date("2024-01-04T10:00:00Z").is_some());
    }

    #[test]
    fn test_parse_date_empty() {
        assert!(parse_date("   ").is_none());
    }
}
