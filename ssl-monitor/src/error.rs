use std::io;

use thiserror::Error;

/// Malformed `host` or `host:port` token.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TargetError {
    /// Host part is empty.
    #[error("empty host name in {0:?}")]
    EmptyHost(String),
    /// Port part is not a number in 1..=65535.
    #[error("invalid port in {0:?}")]
    InvalidPort(String),
}

/// Failure to read the expiration date of a certificate.
#[derive(Error, Debug)]
pub enum FetchError {
    /// Name resolution, TCP connection or transport I/O failed.
    #[error("connection error: {0}")]
    Connection(#[source] io::Error),
    /// TLS negotiation failed.
    #[error("TLS error: {0}")]
    Protocol(#[from] rustls::Error),
    /// Peer certificate is missing or cannot be decoded.
    #[error("certificate error: {0}")]
    Parse(String),
}

impl From<io::Error> for FetchError {
    fn from(e: io::Error) -> Self {
        // rustls reports handshake failures as InvalidData wrapping its own error
        if e.kind() == io::ErrorKind::InvalidData {
            if let Some(tls) = e.get_ref().and_then(|r| r.downcast_ref::<rustls::Error>()) {
                return FetchError::Protocol(tls.clone());
            }
        }
        FetchError::Connection(e)
    }
}

/// Failure to deliver an e-mail notification.
#[derive(Error, Debug)]
pub enum NotificationError {
    /// Sender or recipient is not a valid mailbox.
    #[error("address error: {0}")]
    Address(#[from] lettre::address::AddressError),
    /// Message could not be built.
    #[error("message error: {0}")]
    Message(#[from] lettre::error::Error),
    /// SMTP session failed.
    #[error("mail transport error: {0}")]
    Transport(#[from] lettre::transport::smtp::Error),
}

/// Failure to load SMTP credentials.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Credential file cannot be read.
    #[error("failed to read credentials: {0}")]
    Io(#[from] io::Error),
    /// Credential file is not valid JSON or misses a field.
    #[error("failed to parse credentials: {0}")]
    Json(#[from] serde_json::Error),
}
