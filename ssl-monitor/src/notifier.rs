use std::time::Duration;

use lettre::message::{Mailbox, MultiPart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};
use log::{debug, error, info};

use crate::checked::{CertificateState, Checked};
use crate::config::SmtpConfig;
use crate::error::NotificationError;

const SMTP_TIMEOUT: u64 = 30;

/// Composed e-mail about one check result
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mail {
    /// Subject line
    pub subject: String,
    /// Plain text body
    pub text: String,
    /// HTML body
    pub html: String,
}

impl Mail {
    /// Compose the e-mail for a check result, [`None`] if it does not warrant one
    ///
    /// ```
    /// # use ssl_monitor::{Checked, Mail};
    /// let checked = Checked::failed("example.com", "connection refused");
    /// let mail = Mail::compose(&checked).unwrap();
    /// assert_eq!("example.com certificate was not verified due to an error", mail.subject);
    /// ```
    pub fn compose(checked: &Checked) -> Option<Mail> {
        let domain = &checked.domain;
        let html_domain = escape_html(domain);
        match checked.state {
            CertificateState::Valid { .. } => None,
            CertificateState::Expiring { days, not_after } => {
                let date = not_after.format("%Y-%m-%d %H:%M:%S UTC");
                Some(Mail {
                    subject: format!("{domain} certificate expires in {days} days"),
                    text: format!(
                        "This is an automatic notification.\n\n\
                        The SSL certificate for the {domain} domain will expire in {days} days.\n\n\
                        Current certificate expiration date is {date}.\n\n\
                        Please take the necessary steps and renew your certificate \
                        to ensure the security of your server.\n"
                    ),
                    html: format!(
                        "<html>\n  <body>\n\
                        \x20   <p>This is an automatic notification.</p>\n\
                        \x20   <p>The SSL certificate for the <b>{html_domain}</b> domain will expire in <b>{days}</b> days.</p>\n\
                        \x20   <p>Current certificate expiration date is <b>{date}</b></p>\n\
                        \x20   <p>Please take the necessary steps and renew your certificate \
                        to ensure the security of your server.</p>\n\
                        \x20 </body>\n</html>\n"
                    ),
                })
            }
            CertificateState::Failed(ref e) => Some(Mail {
                subject: format!("{domain} certificate was not verified due to an error"),
                text: format!(
                    "This is an automatic notification.\n\n\
                    The SSL certificate for the {domain} domain was not verified due to an error:\n\n\
                    {e}\n\n\
                    Please make sure the server is reachable and serves a valid certificate.\n"
                ),
                html: format!(
                    "<html>\n  <body>\n\
                    \x20   <p>This is an automatic notification.</p>\n\
                    \x20   <p>The SSL certificate for the <b>{html_domain}</b> domain was not verified due to an error:</p>\n\
                    \x20   <p><code>{}</code></p>\n\
                    \x20   <p>Please make sure the server is reachable and serves a valid certificate.</p>\n\
                    \x20 </body>\n</html>\n",
                    escape_html(e)
                ),
            }),
        }
    }
}

fn escape_html(s: &str) -> String {
    let mut escaped = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Delivers e-mails to a single recipient
pub trait Notifier {
    /// Send one e-mail to one recipient
    fn send(&self, recipient: &str, mail: &Mail) -> Result<(), NotificationError>;
}

/// [`Notifier`] over SMTP with STARTTLS and login
#[derive(Debug, Clone)]
pub struct SmtpNotifier {
    config: SmtpConfig,
}

impl SmtpNotifier {
    /// Create a notifier from SMTP details
    pub fn new(config: SmtpConfig) -> Self {
        SmtpNotifier { config }
    }

    fn build_message(&self, recipient: &str, mail: &Mail) -> Result<Message, NotificationError> {
        let from: Mailbox = self.config.from_address.parse()?;
        let to: Mailbox = recipient.parse()?;
        let message = Message::builder()
            .from(from)
            .to(to)
            .subject(mail.subject.as_str())
            .multipart(MultiPart::alternative_plain_html(
                mail.text.clone(),
                mail.html.clone(),
            ))?;
        Ok(message)
    }

    fn transport(&self) -> Result<SmtpTransport, NotificationError> {
        let credentials = Credentials::new(self.config.user.clone(), self.config.password.clone());
        let transport = SmtpTransport::starttls_relay(&self.config.host)?
            .port(self.config.port)
            .credentials(credentials)
            .timeout(Some(Duration::from_secs(SMTP_TIMEOUT)))
            .build();
        Ok(transport)
    }
}

impl Notifier for SmtpNotifier {
    fn send(&self, recipient: &str, mail: &Mail) -> Result<(), NotificationError> {
        let message = self.build_message(recipient, mail)?;
        let transport = self.transport()?;
        debug!(
            "send e-mail to {recipient} via {}:{}",
            self.config.host, self.config.port
        );
        let response = transport.send(&message)?;
        debug!("SMTP response {:?}", response.code());
        Ok(())
    }
}

/// Send the e-mail for a check result to every recipient, one message each
///
/// Failures are logged and swallowed. Returns the number of delivered e-mails.
pub fn notify<N, T>(recipients: &[T], checked: &Checked, notifier: &N) -> usize
where
    N: Notifier + ?Sized,
    T: AsRef<str>,
{
    let mail = match Mail::compose(checked) {
        Some(mail) => mail,
        None => return 0,
    };

    let mut sent = 0;
    for recipient in recipients {
        let recipient = recipient.as_ref();
        match notifier.send(recipient, &mail) {
            Ok(()) => {
                info!("notified {recipient}: {}", mail.subject);
                sent += 1;
            }
            Err(e) => error!("failed to notify {recipient} about {}: {e}", checked.domain),
        }
    }
    sent
}

#[cfg(test)]
mod test {
    use super::*;

    use std::cell::RefCell;

    use chrono::{TimeZone, Utc};

    fn expiring(days: i64) -> Checked {
        Checked {
            domain: "example.com".into(),
            state: CertificateState::Expiring {
                days,
                not_after: Utc.with_ymd_and_hms(2025, 1, 11, 8, 30, 0).unwrap(),
            },
            ascii: true,
        }
    }

    fn build_config() -> SmtpConfig {
        SmtpConfig {
            host: "smtp.example.com".into(),
            port: 587,
            user: "monitor".into(),
            password: "secret".into(),
            from_address: "monitor@example.com".into(),
        }
    }

    #[derive(Default)]
    struct Recorder {
        sent: RefCell<Vec<(String, Mail)>>,
        fail_for: Option<&'static str>,
    }

    impl Notifier for Recorder {
        fn send(&self, recipient: &str, mail: &Mail) -> Result<(), NotificationError> {
            if self.fail_for == Some(recipient) {
                let e = "not an address".parse::<Mailbox>().unwrap_err();
                return Err(e.into());
            }
            self.sent
                .borrow_mut()
                .push((recipient.to_string(), mail.clone()));
            Ok(())
        }
    }

    #[test]
    fn t_compose_expiring() {
        let mail = Mail::compose(&expiring(10)).unwrap();
        assert_eq!("example.com certificate expires in 10 days", mail.subject);
        assert!(mail.text.contains("will expire in 10 days"));
        assert!(mail.text.contains("2025-01-11 08:30:00 UTC"));
        assert!(mail.html.contains("<b>example.com</b>"));
        assert!(mail.html.contains("<b>2025-01-11 08:30:00 UTC</b>"));
    }

    #[test]
    fn t_compose_expired() {
        let mail = Mail::compose(&expiring(-3)).unwrap();
        assert_eq!("example.com certificate expires in -3 days", mail.subject);
    }

    #[test]
    fn t_compose_failed() {
        let checked = Checked::failed("example.com", "connection error: <refused>");
        let mail = Mail::compose(&checked).unwrap();
        assert_eq!(
            "example.com certificate was not verified due to an error",
            mail.subject
        );
        assert!(mail.text.contains("connection error: <refused>"));
        assert!(mail.html.contains("connection error: &lt;refused&gt;"));
        assert!(!mail.text.contains("days"));
        assert!(!mail.text.contains("expiration date"));
    }

    #[test]
    fn t_compose_escapes_domain_in_html() {
        let mut checked = expiring(10);
        checked.domain = "<i>example.com</i>".into();
        let mail = Mail::compose(&checked).unwrap();
        assert!(mail.html.contains("<b>&lt;i&gt;example.com&lt;/i&gt;</b>"));
        assert!(!mail.html.contains("<i>example.com</i>"));
        assert!(mail.text.contains("<i>example.com</i>"));

        let checked = Checked::failed("a&b.example.com", "boom");
        let mail = Mail::compose(&checked).unwrap();
        assert!(mail.html.contains("<b>a&amp;b.example.com</b>"));
    }

    #[test]
    fn t_compose_valid() {
        let checked = Checked {
            domain: "example.com".into(),
            state: CertificateState::Valid {
                days: 400,
                not_after: Utc::now(),
            },
            ascii: true,
        };
        assert!(Mail::compose(&checked).is_none());
    }

    #[test]
    fn t_notify_fans_out() {
        let recorder = Recorder::default();
        let sent = notify(&["a@example.com", "b@example.com"], &expiring(10), &recorder);
        assert_eq!(2, sent);
        let sent = recorder.sent.borrow();
        assert_eq!("a@example.com", sent[0].0);
        assert_eq!("b@example.com", sent[1].0);
        assert_eq!(sent[0].1, sent[1].1);
    }

    #[test]
    fn t_notify_continues_after_failure() {
        let recorder = Recorder {
            fail_for: Some("a@example.com"),
            ..Default::default()
        };
        let sent = notify(&["a@example.com", "b@example.com"], &expiring(10), &recorder);
        assert_eq!(1, sent);
        assert_eq!("b@example.com", recorder.sent.borrow()[0].0);
    }

    #[test]
    fn t_build_message() {
        let notifier = SmtpNotifier::new(build_config());
        let mail = Mail::compose(&expiring(10)).unwrap();
        let message = notifier.build_message("admin@example.com", &mail).unwrap();
        let formatted = String::from_utf8_lossy(&message.formatted()).to_string();
        assert!(formatted.contains("Subject: example.com certificate expires in 10 days"));
        assert!(formatted.contains("To: admin@example.com"));
        assert!(formatted.contains("From: monitor@example.com"));
        assert!(formatted.contains("multipart/alternative"));
    }

    #[test]
    fn t_build_message_invalid_recipient() {
        let notifier = SmtpNotifier::new(build_config());
        let mail = Mail::compose(&expiring(10)).unwrap();
        let result = notifier.build_message("not an address", &mail);
        assert!(matches!(result, Err(NotificationError::Address(_))));
    }
}
