//! Connecting, authenticating and tearing down an IMAP session.

use std::fmt;
use std::sync::Arc;

use async_imap::{Client as AsyncImapClient, Session as AsyncImapSession};
use async_trait::async_trait;
use futures::{AsyncRead, AsyncWrite, TryStreamExt};
use rustls::pki_types::ServerName;
use rustls::{ClientConfig, RootCertStore};
use secrecy::{ExposeSecret, SecretString};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_rustls::TlsConnector;
use tokio_util::compat::TokioAsyncReadCompatExt;
use tracing::{debug, info, warn};

use super::{convert, MailboxSession, MailboxStatus, METADATA_QUERY};
use crate::error::{MailError, Result};
use crate::model::message::FetchedMessage;
use crate::parser::sequence::SequenceSet;

/// Standard port for IMAP without implicit TLS.
pub const DEFAULT_PORT: u16 = 143;

/// Byte stream an IMAP session runs over: plain TCP or TLS.
pub trait ImapStream: AsyncRead + AsyncWrite + Unpin + Send + fmt::Debug {}

impl<T: AsyncRead + AsyncWrite + Unpin + Send + fmt::Debug> ImapStream for T {}

type BoxedStream = Box<dyn ImapStream>;

/// Host and port of the IMAP server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerAddress {
    pub host: String,
    pub port: u16,
}

impl ServerAddress {
    /// Split `host[:port]` (or `[v6addr]:port`), using `default_port` when no
    /// port is given.
    pub fn parse(input: &str, default_port: u16) -> Result<Self> {
        let input = input.trim();
        let invalid = || MailError::InvalidAddress(input.to_string());

        let (host, port) = if let Some(rest) = input.strip_prefix('[') {
            let (host, after) = rest.split_once(']').ok_or_else(invalid)?;
            match after {
                "" => (host, None),
                _ => (host, Some(after.strip_prefix(':').ok_or_else(invalid)?)),
            }
        } else {
            match input.split_once(':') {
                // More than one colon: a bare IPv6 address
                Some((_, rest)) if rest.contains(':') => (input, None),
                Some((host, port)) => (host, Some(port)),
                None => (input, None),
            }
        };

        if host.is_empty() {
            return Err(invalid());
        }
        let port = match port {
            Some(p) => p.parse::<u16>().map_err(|_| invalid())?,
            None => default_port,
        };
        Ok(Self {
            host: host.to_string(),
            port,
        })
    }
}

impl fmt::Display for ServerAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.host.contains(':') {
            write!(f, "[{}]:{}", self.host, self.port)
        } else {
            write!(f, "{}:{}", self.host, self.port)
        }
    }
}

/// Login credentials. The password never appears in `Debug` output.
#[derive(Debug)]
pub struct Credentials {
    pub username: String,
    pub password: SecretString,
}

/// An authenticated IMAP session.
pub struct ImapSession {
    inner: AsyncImapSession<BoxedStream>,
}

impl fmt::Debug for ImapSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImapSession").finish_non_exhaustive()
    }
}

/// Open a connection to `server`, optionally over TLS, and log in.
///
/// Nothing is returned unless both the connection and the login succeed.
pub async fn connect(
    server: &ServerAddress,
    use_tls: bool,
    credentials: &Credentials,
) -> Result<ImapSession> {
    info!(server = %server, tls = use_tls, "Connecting");
    let tcp = TcpStream::connect((server.host.as_str(), server.port))
        .await
        .map_err(|source| MailError::Connect {
            address: server.to_string(),
            source,
        })?;
    debug!("TCP connected");

    let stream: BoxedStream = if use_tls {
        let tls = tls_connector()?
            .connect(server_name(&server.host)?, tcp)
            .await
            .map_err(|e| MailError::Tls(format!("handshake with {server} failed: {e}")))?;
        debug!("TLS handshake successful");
        Box::new(tls.compat())
    } else {
        Box::new(tcp.compat())
    };

    let client = AsyncImapClient::new(stream);
    let inner = client
        .login(&credentials.username, credentials.password.expose_secret())
        .await
        .map_err(|(source, _client)| MailError::Auth {
            user: credentials.username.clone(),
            source,
        })?;
    info!(user = %credentials.username, "Logged in");

    Ok(ImapSession { inner })
}

fn tls_connector() -> Result<TlsConnector> {
    let mut roots = RootCertStore::empty();
    let certs = rustls_native_certs::load_native_certs()
        .map_err(|e| MailError::Tls(format!("could not load native certificates: {e}")))?;
    let (added, ignored) = roots.add_parsable_certificates(certs);
    debug!(added, ignored, "Loaded native certificates");
    if roots.is_empty() {
        warn!("Root certificate store is empty, TLS verification will fail");
    }

    let config = ClientConfig::builder()
        .with_root_certificates(roots)
        .with_no_client_auth();
    Ok(TlsConnector::from(Arc::new(config)))
}

fn server_name(host: &str) -> Result<ServerName<'static>> {
    ServerName::try_from(host.to_string())
        .map_err(|_| MailError::Tls(format!("invalid server name: {host}")))
}

#[async_trait]
impl MailboxSession for ImapSession {
    async fn examine(&mut self, mailbox: &str) -> Result<MailboxStatus> {
        let mailbox = self.inner.examine(mailbox).await?;
        Ok(MailboxStatus {
            exists: mailbox.exists,
        })
    }

    async fn fetch_metadata(
        &mut self,
        set: &SequenceSet,
        sink: mpsc::Sender<FetchedMessage>,
    ) -> Result<()> {
        let mut stream = self.inner.fetch(set.to_string(), METADATA_QUERY).await?;
        let mut forwarding = true;
        while let Some(fetch) = stream.try_next().await? {
            if !forwarding {
                continue;
            }
            if !convert::carries_metadata(&fetch) {
                debug!(sequence = fetch.message, "Skipping unsolicited FETCH response");
                continue;
            }
            if sink.send(convert::fetched_message(&fetch)).await.is_err() {
                // Keep reading so the response is consumed and the session stays usable.
                debug!("Receiver gone, discarding remaining FETCH responses");
                forwarding = false;
            }
        }
        Ok(())
    }

    async fn logout(&mut self) -> Result<()> {
        self.inner.logout().await.map_err(MailError::Logout)?;
        info!("Logged out");
        Ok(())
    }
}

/// Log out of `session` and hand back `outcome` unchanged.
///
/// Logout is always attempted. Its failure is logged but never replaces
/// `outcome`, whether that is a success or an earlier error.
pub async fn conclude<S, T>(session: &mut S, outcome: Result<T>) -> Result<T>
where
    S: MailboxSession + ?Sized,
{
    if let Err(e) = session.logout().await {
        warn!(error = %e, "Failed to logout");
    }
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_host_only_uses_default_port() {
        let addr = ServerAddress::parse("imap.example.com", DEFAULT_PORT).unwrap();
        assert_eq!(addr.host, "imap.example.com");
        assert_eq!(addr.port, 143);
    }

    #[test]
    fn test_parse_host_and_port() {
        let addr = ServerAddress::parse("imap.mail.ru:993", DEFAULT_PORT).unwrap();
        assert_eq!(addr.host, "imap.mail.ru");
        assert_eq!(addr.port, 993);
        assert_eq!(addr.to_string(), "imap.mail.ru:993");
    }

    #[test]
    fn test_parse_bracketed_ipv6() {
        let addr = ServerAddress::parse("[::1]:1143", DEFAULT_PORT).unwrap();
        assert_eq!(addr.host, "::1");
        assert_eq!(addr.port, 1143);
        assert_eq!(addr.to_string(), "[::1]:1143");

        let addr = ServerAddress::parse("[::1]", DEFAULT_PORT).unwrap();
        assert_eq!(addr.port, 143);
    }

    #[test]
    fn test_parse_bare_ipv6() {
        let addr = ServerAddress::parse("fe80::1", DEFAULT_PORT).unwrap();
        assert_eq!(addr.host, "fe80::1");
        assert_eq!(addr.port, 143);
    }

    #[test]
    fn test_parse_rejects_bad_port_and_empty_host() {
        for bad in ["host:abc", "host:70000", ":993", "", "[::1", "[::1]x"] {
            assert!(
                matches!(
                    ServerAddress::parse(bad, DEFAULT_PORT),
                    Err(MailError::InvalidAddress(_))
                ),
                "expected invalid address for {bad:?}"
            );
        }
    }

    #[test]
    fn test_credentials_debug_hides_password() {
        let creds = Credentials {
            username: "me".into(),
            password: SecretString::from("hunter2"),
        };
        assert!(!format!("{creds:?}").contains("hunter2"));
    }
}
