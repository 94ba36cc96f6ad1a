#![deny(
    missing_docs,
    missing_debug_implementations,
    missing_copy_implementations,
    trivial_casts,
    trivial_numeric_casts,
    unsafe_code,
    unstable_features,
    unused_import_braces,
    unused_qualifications
)]

//! Monitor TLS certificate expiration and send e-mail notifications

pub use checked::{CertificateState, Checked};
pub use checker::{
    parse_not_after, CertificateInfo, CertificateSource, Checker, TrustMode, DEFAULT_TIMEOUT,
};
pub use config::SmtpConfig;
pub use error::{ConfigError, FetchError, NotificationError, TargetError};
pub use expiry::{evaluate, Evaluation};
pub use notifier::{notify, Mail, Notifier, SmtpNotifier};
pub use runner::{Report, Runner};
pub use target::{Target, DEFAULT_PORT};

mod checked;
mod checker;
mod config;
mod error;
mod expiry;
mod notifier;
mod runner;
mod target;
