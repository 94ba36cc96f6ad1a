use std::fmt;
use std::io;
use std::net::{TcpStream, ToSocketAddrs};
use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime};

use chrono::{DateTime, TimeZone, Utc};
use log::debug;
use once_cell::sync::Lazy;
use rustls::client::{ServerCertVerified, ServerCertVerifier};
use rustls::{Certificate, ClientConfig, OwnedTrustAnchor, RootCertStore, ServerName};
use x509_parser::parse_x509_certificate;

use crate::error::FetchError;
use crate::target::Target;

/// Default connect and handshake timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

static INSECURE_CONFIG: Lazy<Arc<ClientConfig>> = Lazy::new(|| {
    let config = ClientConfig::builder()
        .with_safe_defaults()
        .with_custom_certificate_verifier(Arc::new(AcceptAnyCertificate))
        .with_no_client_auth();
    Arc::new(config)
});

static WEBPKI_CONFIG: Lazy<Arc<ClientConfig>> = Lazy::new(|| {
    let mut root_store = RootCertStore::empty();
    root_store.add_server_trust_anchors(webpki_roots::TLS_SERVER_ROOTS.0.iter().map(|ta| {
        OwnedTrustAnchor::from_subject_spki_name_constraints(
            ta.subject,
            ta.spki,
            ta.name_constraints,
        )
    }));
    let config = ClientConfig::builder()
        .with_safe_defaults()
        .with_root_certificates(root_store)
        .with_no_client_auth();
    Arc::new(config)
});

/// How the peer certificate chain is trusted during the handshake
#[derive(Clone)]
pub enum TrustMode {
    /// Accept any certificate, so expired and self-signed ones can still be read
    Insecure,
    /// Validate against the bundled Mozilla root certificates
    WebPki,
    /// Caller-provided TLS client configuration
    Custom(Arc<ClientConfig>),
}

impl Default for TrustMode {
    fn default() -> Self {
        TrustMode::Insecure
    }
}

impl fmt::Debug for TrustMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrustMode::Insecure => write!(f, "Insecure"),
            TrustMode::WebPki => write!(f, "WebPki"),
            TrustMode::Custom(_) => write!(f, "Custom"),
        }
    }
}

impl TrustMode {
    fn client_config(&self) -> Arc<ClientConfig> {
        match self {
            TrustMode::Insecure => INSECURE_CONFIG.clone(),
            TrustMode::WebPki => WEBPKI_CONFIG.clone(),
            TrustMode::Custom(config) => config.clone(),
        }
    }
}

struct AcceptAnyCertificate;

impl ServerCertVerifier for AcceptAnyCertificate {
    fn verify_server_cert(
        &self,
        _end_entity: &Certificate,
        _intermediates: &[Certificate],
        _server_name: &ServerName,
        _scts: &mut dyn Iterator<Item = &[u8]>,
        _ocsp_response: &[u8],
        _now: SystemTime,
    ) -> Result<ServerCertVerified, rustls::Error> {
        Ok(ServerCertVerified::assertion())
    }
}

/// Expiration of the leaf certificate presented by a peer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CertificateInfo {
    /// Exact expiration time
    pub not_after: DateTime<Utc>,
}

/// Source of certificate information for a target
pub trait CertificateSource {
    /// Retrieve the leaf certificate of the target
    fn fetch(&self, target: &Target) -> Result<CertificateInfo, FetchError>;
}

/// Checker for SSL certificate
#[derive(Debug, Clone)]
pub struct Checker {
    trust: TrustMode,
    /// Connect and handshake timeout
    pub timeout: Duration,
}

impl Default for Checker {
    fn default() -> Checker {
        Checker {
            trust: TrustMode::default(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl Checker {
    /// Create a checker with the given trust mode
    ///
    /// ```
    /// # use ssl_monitor::{Checker, TrustMode};
    /// let checker = Checker::new(TrustMode::WebPki);
    /// ```
    pub fn new(trust: TrustMode) -> Self {
        Checker {
            trust,
            ..Default::default()
        }
    }

    fn connect(&self, target: &Target) -> Result<TcpStream, FetchError> {
        let mut last_error = None;
        for addr in (target.host.as_str(), target.port).to_socket_addrs()? {
            debug!("connect to {target} via {addr}");
            match TcpStream::connect_timeout(&addr, self.timeout) {
                Ok(stream) => return Ok(stream),
                Err(e) => last_error = Some(e),
            }
        }
        Err(FetchError::Connection(last_error.unwrap_or_else(|| {
            io::Error::new(
                io::ErrorKind::NotFound,
                format!("no address found for {}", target.host),
            )
        })))
    }

    fn do_fetch(&self, target: &Target) -> Result<CertificateInfo, FetchError> {
        let server_name = ServerName::try_from(target.host.as_str()).map_err(|e| {
            FetchError::Connection(io::Error::new(io::ErrorKind::InvalidInput, e))
        })?;
        let mut conn = rustls::ClientConnection::new(self.trust.client_config(), server_name)?;

        let mut stream = self.connect(target)?;
        stream.set_read_timeout(Some(self.timeout))?;
        stream.set_write_timeout(Some(self.timeout))?;

        let start = Instant::now();
        while conn.is_handshaking() {
            conn.complete_io(&mut stream)?;
        }
        debug!("handshake with {target} done in {}ms", start.elapsed().as_millis());

        let certificates = conn
            .peer_certificates()
            .ok_or_else(|| FetchError::Parse("no peer certificates found".into()))?;
        let certificate = certificates
            .first()
            .ok_or_else(|| FetchError::Parse("no peer certificate found".into()))?;

        let not_after = parse_not_after(certificate.as_ref())?;
        conn.send_close_notify();
        if let Err(e) = conn.write_tls(&mut stream) {
            debug!("failed to send close_notify to {target}: {e}");
        }

        Ok(CertificateInfo { not_after })
    }
}

impl CertificateSource for Checker {
    fn fetch(&self, target: &Target) -> Result<CertificateInfo, FetchError> {
        self.do_fetch(target)
    }
}

/// Read the expiration time from a DER-encoded X.509 certificate
pub fn parse_not_after(der: &[u8]) -> Result<DateTime<Utc>, FetchError> {
    let (_, cert) = parse_x509_certificate(der).map_err(|e| FetchError::Parse(e.to_string()))?;
    let timestamp = cert.validity().not_after.timestamp();
    Utc.timestamp_opt(timestamp, 0)
        .single()
        .ok_or_else(|| FetchError::Parse(format!("expiration out of range: {timestamp}")))
}
