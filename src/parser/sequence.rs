//! IMAP sequence sets (RFC 3501 §9 `sequence-set`).
//!
//! Examples: `1:3`, `2,4,7:9`, `5:*`, `*`.

use std::fmt;
use std::str::FromStr;

use crate::error::{MailError, Result};

/// One end of a range: a concrete sequence number or `*` (the last message).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeqBound {
    Number(u32),
    Last,
}

impl SeqBound {
    fn resolve(self, last: u32) -> u32 {
        match self {
            Self::Number(n) => n,
            Self::Last => last,
        }
    }
}

impl fmt::Display for SeqBound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Last => f.write_str("*"),
        }
    }
}

/// An inclusive range of sequence numbers. `start == end` for single numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeqRange {
    pub start: SeqBound,
    pub end: SeqBound,
}

/// The set of messages a FETCH targets.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SequenceSet {
    ranges: Vec<SeqRange>,
}

impl SequenceSet {
    /// Every message of a mailbox holding `count` messages (`1:count`).
    ///
    /// Empty when the mailbox is empty.
    pub fn all(count: u32) -> Self {
        if count == 0 {
            return Self::default();
        }
        Self {
            ranges: vec![SeqRange {
                start: SeqBound::Number(1),
                end: SeqBound::Number(count),
            }],
        }
    }

    /// Parse a user-supplied range specification.
    pub fn parse(input: &str) -> Result<Self> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(MailError::sequence(input, "empty range"));
        }

        let ranges = trimmed
            .split(',')
            .map(|item| parse_range(input, item.trim()))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { ranges })
    }

    /// `true` if the set targets no message at all.
    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    pub fn ranges(&self) -> &[SeqRange] {
        &self.ranges
    }

    /// Concrete sequence numbers in ascending order, given the mailbox holds
    /// `last` messages (which `*` resolves to). Numbers above `last` are
    /// dropped and duplicates are removed. Empty when `last` is 0.
    pub fn numbers(&self, last: u32) -> Vec<u32> {
        if last == 0 {
            return Vec::new();
        }
        let mut numbers: Vec<u32> = self
            .ranges
            .iter()
            .flat_map(|range| {
                let a = range.start.resolve(last);
                let b = range.end.resolve(last);
                a.min(b)..=a.max(b).min(last)
            })
            .collect();
        numbers.sort_unstable();
        numbers.dedup();
        numbers
    }

    /// Compact set covering exactly `numbers`, which must be ascending.
    ///
    /// Consecutive runs collapse into ranges: `[1, 2, 3, 7]` becomes `1:3,7`.
    pub fn from_numbers(numbers: &[u32]) -> Self {
        let mut ranges: Vec<SeqRange> = Vec::new();
        for &n in numbers {
            match ranges.last_mut() {
                Some(SeqRange {
                    end: SeqBound::Number(end),
                    ..
                }) if end.checked_add(1) == Some(n) => *end = n,
                _ => ranges.push(SeqRange {
                    start: SeqBound::Number(n),
                    end: SeqBound::Number(n),
                }),
            }
        }
        Self { ranges }
    }
}

impl FromStr for SequenceSet {
    type Err = MailError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

/// Renders in IMAP wire syntax, e.g. `1:3,5,7:*`.
impl fmt::Display for SequenceSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, range) in self.ranges.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            if range.start == range.end {
                write!(f, "{}", range.start)?;
            } else {
                write!(f, "{}:{}", range.start, range.end)?;
            }
        }
        Ok(())
    }
}

fn parse_range(input: &str, item: &str) -> Result<SeqRange> {
    let range = match item.split_once(':') {
        Some((start, end)) => SeqRange {
            start: parse_bound(input, start)?,
            end: parse_bound(input, end)?,
        },
        None => {
            let bound = parse_bound(input, item)?;
            SeqRange {
                start: bound,
                end: bound,
            }
        }
    };

    // "9:3" means the same as "3:9"
    match (range.start, range.end) {
        (SeqBound::Number(a), SeqBound::Number(b)) if a > b => Ok(SeqRange {
            start: range.end,
            end: range.start,
        }),
        (SeqBound::Last, SeqBound::Number(_)) => Ok(SeqRange {
            start: range.end,
            end: range.start,
        }),
        _ => Ok(range),
    }
}

fn parse_bound(input: &str, token: &str) -> Result<SeqBound> {
    let token = token.trim();
    if token == "*" {
        return Ok(SeqBound::Last);
    }
    if token.is_empty() || !token.bytes().all(|b| b.is_ascii_digit()) {
        return Err(MailError::sequence(
            input,
            format!("'{token}' is not a sequence number"),
        ));
    }
    match token.parse::<u32>() {
        Ok(0) => Err(MailError::sequence(input, "sequence numbers start at 1")),
        Ok(n) => Ok(SeqBound::Number(n)),
        Err(_) => Err(MailError::sequence(
            input,
            format!("'{token}' is out of range"),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_covers_whole_mailbox() {
        let set = SequenceSet::all(10);
        assert_eq!(set.to_string(), "1:10");
        assert_eq!(set.numbers(10), (1..=10).collect::<Vec<_>>());
    }

    #[test]
    fn test_all_of_empty_mailbox_is_empty() {
        assert!(SequenceSet::all(0).is_empty());
    }

    #[test]
    fn test_parse_simple_range() {
        let set: SequenceSet = "1:3".parse().unwrap();
        assert_eq!(set.numbers(10), [1, 2, 3]);
        assert_eq!(set.to_string(), "1:3");
    }

    #[test]
    fn test_parse_list_and_star() {
        let set = SequenceSet::parse("2, 4,7:*").unwrap();
        assert_eq!(set.to_string(), "2,4,7:*");
        assert_eq!(set.numbers(9), [2, 4, 7, 8, 9]);
    }

    #[test]
    fn test_reversed_range_is_normalised() {
        let set = SequenceSet::parse("5:2").unwrap();
        assert_eq!(set.to_string(), "2:5");
        let set = SequenceSet::parse("*:8").unwrap();
        assert_eq!(set.to_string(), "8:*");
    }

    #[test]
    fn test_numbers_beyond_mailbox_are_dropped() {
        let set = SequenceSet::parse("3:20,1").unwrap();
        assert_eq!(set.numbers(4), [1, 3, 4]);
    }

    #[test]
    fn test_numbers_of_empty_mailbox_are_empty() {
        for spec in ["*", "1:3", "2,5:*"] {
            let set = SequenceSet::parse(spec).unwrap();
            assert!(set.numbers(0).is_empty(), "{spec:?} on an empty mailbox");
        }
    }

    #[test]
    fn test_range_past_the_end_resolves_to_nothing() {
        let set = SequenceSet::parse("5:9").unwrap();
        assert!(set.numbers(3).is_empty());
    }

    #[test]
    fn test_from_numbers_collapses_runs() {
        assert_eq!(SequenceSet::from_numbers(&[1, 2, 3, 7, 9, 10]).to_string(), "1:3,7,9:10");
        assert_eq!(SequenceSet::from_numbers(&[4]).to_string(), "4");
        assert!(SequenceSet::from_numbers(&[]).is_empty());
    }

    #[test]
    fn test_from_numbers_resolves_star() {
        let set = SequenceSet::parse("3:*").unwrap();
        let wire = SequenceSet::from_numbers(&set.numbers(5));
        assert_eq!(wire.to_string(), "3:5");
    }

    #[test]
    fn test_parse_rejects_garbage() {
        for bad in ["", "abc", "1:", ":3", "1,,2", "0", "1:0", "-1", "1-3", "99999999999"] {
            let err = SequenceSet::parse(bad).unwrap_err();
            assert!(
                matches!(err, MailError::InvalidSequenceSet { .. }),
                "expected parse error for {bad:?}"
            );
        }
    }
}
