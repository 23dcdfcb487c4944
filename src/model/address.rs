//! Email addresses as delivered in an IMAP envelope.

/// A mailbox address from an envelope.
///
/// IMAP splits addresses into display name, mailbox (local part) and host;
/// `address` holds the joined `mailbox@host` form.
#[derive(Debug, Clone, Default, serde::Serialize, PartialEq, Eq)]
pub struct EmailAddress {
    /// Human-readable display name (may be empty).
    pub display_name: String,
    /// The bare email address (`user@domain`).
    pub address: String,
}

impl EmailAddress {
    /// Build an address from its envelope parts.
    ///
    /// A missing host yields the bare mailbox name.
    pub fn from_parts(display_name: &str, mailbox: &str, host: &str) -> Self {
        let address = if host.is_empty() {
            mailbox.to_string()
        } else {
            format!("{mailbox}@{host}")
        };
        Self {
            display_name: display_name.trim().to_string(),
            address,
        }
    }

    /// Format for display: `"Display Name <address>"` or just `"address"`.
    pub fn display(&self) -> String {
        if self.display_name.is_empty() {
            self.address.clone()
        } else {
            format!("{} <{}>", self.display_name, self.address)
        }
    }
}

impl std::fmt::Display for EmailAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display())
    }
}
