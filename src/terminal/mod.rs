//! Interactive terminal input.

pub mod password;

use std::io::Write;

use secrecy::SecretString;

use crate::error::Result;

use self::password::{capture_secret, Tty};

/// Prompt on stderr and read a password from the controlling terminal without echo.
pub fn prompt_password(prompt: &str) -> Result<SecretString> {
    let mut stderr = std::io::stderr();
    write!(stderr, "{prompt}")?;
    stderr.flush()?;

    let mut tty = Tty::open()?;
    let secret = capture_secret(&mut tty);

    // Raw mode swallowed the Enter key, so move to a fresh line ourselves.
    writeln!(stderr)?;
    secret
}
