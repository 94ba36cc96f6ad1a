use std::fmt;

use chrono::{DateTime, Utc};
use num_format::{Locale, ToFormattedString};

/// State of SSL certificate
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CertificateState {
    /// Certificate is valid beyond the threshold
    Valid {
        /// Remaining days to the expiration date
        days: i64,
        /// Exact expiration time
        not_after: DateTime<Utc>,
    },
    /// Certificate expires within the threshold, or already expired
    Expiring {
        /// Remaining days to the expiration date, negative once expired
        days: i64,
        /// Exact expiration time
        not_after: DateTime<Utc>,
    },
    /// Certificate could not be checked
    Failed(String),
}

impl fmt::Display for CertificateState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CertificateState::Valid { .. } => write!(f, "OK"),
            CertificateState::Expiring { days, .. } if *days < 0 => write!(f, "EXPIRED"),
            CertificateState::Expiring { .. } => write!(f, "WARNING"),
            CertificateState::Failed(..) => write!(f, "ERROR"),
        }
    }
}

/// Check result of one domain
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Checked {
    /// Domain name as given on the command line
    pub domain: String,
    /// State of certificate
    pub state: CertificateState,
    /// ASCII only?
    pub ascii: bool,
}

impl Checked {
    /// Check failed before an expiration date was known
    ///
    /// ```
    /// use ssl_monitor::Checked;
    /// Checked::failed("example.invalid", "failed to lookup address information");
    /// ```
    pub fn failed<T, U>(domain: T, e: U) -> Self
    where
        T: Into<String>,
        U: fmt::Display,
    {
        Checked {
            domain: domain.into(),
            state: CertificateState::Failed(e.to_string()),
            ascii: false,
        }
    }

    /// Whether this result warrants an e-mail
    pub fn should_notify(&self) -> bool {
        !matches!(self.state, CertificateState::Valid { .. })
    }

    /// Human-readable sentence of certificate state
    ///
    /// ```
    /// # use ssl_monitor::Checked;
    /// let checked = Checked::failed("example.invalid", "boom");
    /// assert_eq!("failed to check example.invalid: boom", checked.sentence());
    /// ```
    pub fn sentence(&self) -> String {
        let domain = &self.domain;
        match self.state {
            CertificateState::Valid { days, not_after }
            | CertificateState::Expiring { days, not_after } => {
                let r = not_after.to_rfc3339();
                if days < 0 {
                    let days = (-days).to_formatted_string(&Locale::en);
                    format!("certificate of {domain} expired {days} days ago ({r})")
                } else {
                    let days = days.to_formatted_string(&Locale::en);
                    format!("certificate of {domain} expires in {days} days ({r})")
                }
            }
            CertificateState::Failed(ref e) => format!("failed to check {domain}: {e}"),
        }
    }

    /// Icon of certificate state in ASCII or Unicode
    pub fn state_icon(&self) -> &'static str {
        match self.state {
            CertificateState::Valid { .. } => {
                if self.ascii {
                    "[v]"
                } else {
                    "\u{2705}"
                }
            }
            CertificateState::Expiring { .. } => {
                if self.ascii {
                    "[-]"
                } else {
                    "\u{26a0}\u{fe0f}"
                }
            }
            CertificateState::Failed(_) => {
                if self.ascii {
                    "[x]"
                } else {
                    "\u{274c}"
                }
            }
        }
    }
}

impl fmt::Display for Checked {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.state_icon(), self.sentence())
    }
}
