//! Password capture from a raw-mode terminal.
//!
//! The terminal is switched to raw mode so typed characters are not echoed.
//! Whatever happens while reading, the terminal is restored and released
//! before [`capture_secret`] returns.

use std::fs::File;
use std::io::{self, BufReader, Read};

use secrecy::SecretString;

use crate::error::{MailError, Result};

const CTRL_C: char = '\u{3}';
const BACKSPACE: char = '\u{8}';
const DELETE: char = '\u{7f}';

/// A terminal device that can be put into raw mode and read char by char.
pub trait RawTerminal {
    /// Disable echo and line buffering.
    fn enter_raw_mode(&mut self) -> io::Result<()>;

    /// Read one character, blocking until it arrives.
    fn read_char(&mut self) -> io::Result<char>;

    /// Return to the mode the terminal was in before [`enter_raw_mode`](Self::enter_raw_mode).
    /// Must be safe to call when raw mode was never entered.
    fn restore(&mut self) -> io::Result<()>;

    /// Release the device handle.
    fn close(&mut self) -> io::Result<()>;
}

/// The controlling terminal, opened through `/dev/tty`.
#[derive(Debug)]
pub struct Tty {
    reader: Option<BufReader<File>>,
    raw: bool,
}

impl Tty {
    /// Open the controlling terminal for reading.
    pub fn open() -> Result<Self> {
        let file = File::open("/dev/tty").map_err(MailError::TerminalUnavailable)?;
        Ok(Self {
            reader: Some(BufReader::new(file)),
            raw: false,
        })
    }
}

impl RawTerminal for Tty {
    fn enter_raw_mode(&mut self) -> io::Result<()> {
        crossterm::terminal::enable_raw_mode()?;
        self.raw = true;
        Ok(())
    }

    fn read_char(&mut self) -> io::Result<char> {
        let reader = self
            .reader
            .as_mut()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotConnected, "terminal closed"))?;
        read_utf8_char(reader)
    }

    fn restore(&mut self) -> io::Result<()> {
        crossterm::terminal::disable_raw_mode()?;
        self.raw = false;
        Ok(())
    }

    fn close(&mut self) -> io::Result<()> {
        self.reader.take();
        Ok(())
    }
}

impl Drop for Tty {
    fn drop(&mut self) {
        // Only reached with raw still set when a panic skipped capture_secret's cleanup.
        if self.raw {
            if let Err(e) = crossterm::terminal::disable_raw_mode() {
                tracing::warn!(error = %e, "Failed to restore terminal on drop");
            }
        }
    }
}

/// Read characters from `terminal` without echo until CR or LF.
///
/// Backspace/Delete erase the previous character; Ctrl-C aborts with
/// [`MailError::Cancelled`]. The terminator is not part of the result.
///
/// The terminal is restored and closed on every path. If restoring or
/// closing fails after an earlier error, the returned error carries both.
pub fn capture_secret<T: RawTerminal + ?Sized>(terminal: &mut T) -> Result<SecretString> {
    let captured = terminal
        .enter_raw_mode()
        .map_err(MailError::RawMode)
        .and_then(|()| read_line(terminal));

    let restored = terminal.restore();
    let closed = terminal.close();

    let outcome = match (captured, restored) {
        (captured, Ok(())) => captured,
        (Ok(_), Err(source)) => Err(MailError::TerminalRestore {
            source,
            prior: None,
        }),
        (Err(prior), Err(source)) => Err(MailError::TerminalRestore {
            source,
            prior: Some(Box::new(prior)),
        }),
    };

    match (outcome, closed) {
        (outcome, Ok(())) => outcome,
        (Ok(_), Err(source)) => Err(MailError::TerminalClose {
            source,
            prior: None,
        }),
        (Err(prior), Err(source)) => Err(MailError::TerminalClose {
            source,
            prior: Some(Box::new(prior)),
        }),
    }
}

fn read_line<T: RawTerminal + ?Sized>(terminal: &mut T) -> Result<SecretString> {
    let mut buf = String::new();
    loop {
        match terminal.read_char().map_err(MailError::TerminalRead)? {
            '\r' | '\n' => break,
            CTRL_C => return Err(MailError::Cancelled),
            BACKSPACE | DELETE => {
                buf.pop();
            }
            ch => buf.push(ch),
        }
    }
    Ok(SecretString::from(buf))
}

/// Decode a single UTF-8 character from `reader`, one byte at a time.
fn read_utf8_char<R: Read>(reader: &mut R) -> io::Result<char> {
    let mut bytes = [0u8; 4];
    reader.read_exact(&mut bytes[..1])?;
    let len = match bytes[0] {
        0x00..=0x7f => 1,
        0xc0..=0xdf => 2,
        0xe0..=0xef => 3,
        0xf0..=0xf7 => 4,
        _ => return Err(invalid_utf8()),
    };
    reader.read_exact(&mut bytes[1..len])?;
    std::str::from_utf8(&bytes[..len])
        .ok()
        .and_then(|s| s.chars().next())
        .ok_or_else(invalid_utf8)
}

fn invalid_utf8() -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, "invalid UTF-8 from terminal")
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    /// Scripted terminal recording every call made to it.
    #[derive(Default)]
    struct ScriptedTerminal {
        input: Vec<io::Result<char>>,
        fail_enter: bool,
        fail_restore: bool,
        fail_close: bool,
        calls: Vec<&'static str>,
    }

    impl ScriptedTerminal {
        fn typing(text: &str) -> Self {
            Self {
                input: text.chars().map(Ok).collect(),
                ..Default::default()
            }
        }
    }

    impl RawTerminal for ScriptedTerminal {
        fn enter_raw_mode(&mut self) -> io::Result<()> {
            self.calls.push("enter");
            if self.fail_enter {
                return Err(io::Error::other("tcgetattr failed"));
            }
            Ok(())
        }

        fn read_char(&mut self) -> io::Result<char> {
            self.calls.push("read");
            if self.input.is_empty() {
                return Err(io::Error::from(io::ErrorKind::UnexpectedEof));
            }
            self.input.remove(0)
        }

        fn restore(&mut self) -> io::Result<()> {
            self.calls.push("restore");
            if self.fail_restore {
                return Err(io::Error::other("tcsetattr failed"));
            }
            Ok(())
        }

        fn close(&mut self) -> io::Result<()> {
            self.calls.push("close");
            if self.fail_close {
                return Err(io::Error::other("close failed"));
            }
            Ok(())
        }
    }

    #[test]
    fn test_reads_until_carriage_return() {
        let mut term = ScriptedTerminal::typing("hunter2\rignored");
        let secret = capture_secret(&mut term).unwrap();
        assert_eq!(secret.expose_secret(), "hunter2");
        assert_eq!(term.calls.last(), Some(&"close"));
    }

    #[test]
    fn test_reads_until_newline() {
        let mut term = ScriptedTerminal::typing("pässwörd\n");
        let secret = capture_secret(&mut term).unwrap();
        assert_eq!(secret.expose_secret(), "pässwörd");
    }

    #[test]
    fn test_backspace_erases() {
        let mut term = ScriptedTerminal::typing("abx\u{7f}c\u{8}d\r");
        let secret = capture_secret(&mut term).unwrap();
        assert_eq!(secret.expose_secret(), "abd");
    }

    #[test]
    fn test_read_error_restores_before_returning() {
        let mut term = ScriptedTerminal {
            input: vec![
                Ok('a'),
                Ok('b'),
                Err(io::Error::new(io::ErrorKind::BrokenPipe, "gone")),
            ],
            ..Default::default()
        };
        let err = capture_secret(&mut term).unwrap_err();
        assert!(matches!(err, MailError::TerminalRead(_)));
        assert_eq!(
            term.calls,
            ["enter", "read", "read", "read", "restore", "close"]
        );
    }

    #[test]
    fn test_ctrl_c_cancels_and_restores() {
        let mut term = ScriptedTerminal::typing("ab\u{3}");
        let err = capture_secret(&mut term).unwrap_err();
        assert!(matches!(err, MailError::Cancelled));
        assert_eq!(&term.calls[term.calls.len() - 2..], ["restore", "close"]);
    }

    #[test]
    fn test_mode_switch_failure_still_releases() {
        let mut term = ScriptedTerminal {
            fail_enter: true,
            ..ScriptedTerminal::typing("secret\r")
        };
        let err = capture_secret(&mut term).unwrap_err();
        assert!(matches!(err, MailError::RawMode(_)));
        assert_eq!(term.calls, ["enter", "restore", "close"]);
    }

    #[test]
    fn test_restore_failure_keeps_prior_error_and_closes() {
        let mut term = ScriptedTerminal {
            input: vec![Ok('x'), Err(io::Error::other("read failed"))],
            fail_restore: true,
            ..Default::default()
        };
        let err = capture_secret(&mut term).unwrap_err();
        match err {
            MailError::TerminalRestore {
                prior: Some(prior), ..
            } => assert!(matches!(*prior, MailError::TerminalRead(_))),
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(term.calls.last(), Some(&"close"));
    }

    #[test]
    fn test_restore_failure_after_success_is_reported() {
        let mut term = ScriptedTerminal {
            fail_restore: true,
            ..ScriptedTerminal::typing("ok\r")
        };
        let err = capture_secret(&mut term).unwrap_err();
        assert!(matches!(err, MailError::TerminalRestore { prior: None, .. }));
        assert_eq!(term.calls.last(), Some(&"close"));
    }

    #[test]
    fn test_close_failure_is_reported() {
        let mut term = ScriptedTerminal {
            fail_close: true,
            ..ScriptedTerminal::typing("ok\r")
        };
        let err = capture_secret(&mut term).unwrap_err();
        assert!(matches!(err, MailError::TerminalClose { prior: None, .. }));
    }

    #[test]
    fn test_read_utf8_char_multibyte() {
        let mut input: &[u8] = "é€".as_bytes();
        assert_eq!(read_utf8_char(&mut input).unwrap(), 'é');
        assert_eq!(read_utf8_char(&mut input).unwrap(), '€');
        assert!(read_utf8_char(&mut input).is_err());
    }

    #[test]
    fn test_read_utf8_char_rejects_stray_continuation() {
        let mut input: &[u8] = &[0x80, b'a'];
        let err = read_utf8_char(&mut input).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }
}
