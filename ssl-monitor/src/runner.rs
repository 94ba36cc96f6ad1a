use std::time::Instant;

use chrono::{DateTime, SubsecRound as _, Utc};
use log::{info, warn};

use crate::checked::{CertificateState, Checked};
use crate::checker::CertificateSource;
use crate::expiry::evaluate;
use crate::notifier::{notify, Notifier};
use crate::target::Target;

/// Outcome of one sweep over all domain names
#[derive(Debug, Default)]
pub struct Report {
    /// One result per domain name, in input order
    pub results: Vec<Checked>,
    /// Number of e-mails delivered
    pub notifications: usize,
}

/// Checks domain names one by one and notifies recipients
#[derive(Debug)]
pub struct Runner<S, N> {
    source: S,
    notifier: N,
    recipients: Vec<String>,
    /// Notify when fewer days than this are left
    pub threshold: u32,
    /// ASCII only console output?
    pub ascii: bool,
    /// Print one line per domain name to stdout?
    pub print: bool,
}

impl<S, N> Runner<S, N>
where
    S: CertificateSource,
    N: Notifier,
{
    /// Create a runner with the default threshold of 30 days
    pub fn new<T>(source: S, notifier: N, recipients: &[T]) -> Self
    where
        T: AsRef<str>,
    {
        Runner {
            source,
            notifier,
            recipients: recipients.iter().map(|r| r.as_ref().to_string()).collect(),
            threshold: 30,
            ascii: false,
            print: false,
        }
    }

    /// Check one domain name at the given time, without notifying
    pub fn check_one<T>(&self, domain_name: T, now: &DateTime<Utc>) -> Checked
    where
        T: AsRef<str>,
    {
        let domain = domain_name.as_ref().trim();
        let mut checked = match domain.parse::<Target>() {
            Ok(target) => match self.source.fetch(&target) {
                Ok(info) => {
                    let evaluation = evaluate(&info.not_after, now, self.threshold);
                    let days = evaluation.days_left;
                    let not_after = info.not_after;
                    Checked {
                        domain: domain.to_string(),
                        state: if evaluation.should_notify {
                            CertificateState::Expiring { days, not_after }
                        } else {
                            CertificateState::Valid { days, not_after }
                        },
                        ascii: false,
                    }
                }
                Err(e) => Checked::failed(domain, e),
            },
            Err(e) => Checked::failed(domain, e),
        };
        checked.ascii = self.ascii;
        checked
    }

    /// Check every domain name in order and notify when due
    pub fn run<T>(&self, domain_names: &[T]) -> Report
    where
        T: AsRef<str>,
    {
        self.run_at(domain_names, &Utc::now().round_subsecs(0))
    }

    /// Same as [`Runner::run`] with an explicit current time
    pub fn run_at<T>(&self, domain_names: &[T], now: &DateTime<Utc>) -> Report
    where
        T: AsRef<str>,
    {
        let start = Instant::now();
        info!("check {} domain name(s) at {}", domain_names.len(), now.to_rfc3339());

        let mut report = Report::default();
        for domain_name in domain_names {
            let checked = self.check_one(domain_name, now);
            if self.print {
                println!("{checked}");
            }
            if let CertificateState::Failed(ref e) = checked.state {
                warn!("failed to check {}: {e}", checked.domain);
            }
            if checked.should_notify() {
                report.notifications += notify(self.recipients.as_slice(), &checked, &self.notifier);
            }
            report.results.push(checked);
        }

        info!(
            "done in {}ms, {} notification(s) sent",
            start.elapsed().as_millis(),
            report.notifications
        );
        report
    }
}
