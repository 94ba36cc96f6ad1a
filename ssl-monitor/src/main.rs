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

use std::path::PathBuf;
use std::str::FromStr as _;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context as _};
use chrono::Utc;
use clap::Parser;
use cron::Schedule;
use log::{debug, info};

use ssl_monitor::{Checker, Report, Runner, SmtpConfig, SmtpNotifier, TrustMode};

type SmtpRunner = Runner<Checker, SmtpNotifier>;

#[derive(Debug, Parser)]
#[command(author, about, version)]
struct Opts {
    /// Domain names to check, e.g. example.com or example.com:8443
    #[arg(env = "DOMAIN_NAMES", value_delimiter = ',')]
    domain_names: Vec<String>,
    /// Number of days before expiration when notification should be sent
    #[arg(short, long, default_value = "30", env = "THRESHOLD")]
    threshold: u32,
    /// Comma-separated e-mail addresses to receive notifications
    #[arg(short, long, env = "EMAILS")]
    emails: String,
    /// JSON file with SMTP server details (host, port, user, password, from)
    #[arg(short, long, env = "CREDENTIALS")]
    credentials: PathBuf,
    /// Connect and handshake timeout in seconds
    #[arg(long, default_value = "10", value_parser = clap::value_parser!(u64).range(1..))]
    timeout: u64,
    /// Validate certificate chains against Mozilla root certificates
    #[arg(long)]
    verify: bool,
    /// ASCII
    #[arg(long)]
    ascii: bool,
    /// Cron, keep running and check on schedule e.g. "0 0 8 * * *"
    #[arg(long, env = "CRON")]
    cron: Option<String>,
    /// Check once at startup before waiting for the schedule
    #[arg(long, env = "RUN_IMMEDIATELY")]
    run_immediately: bool,
}

impl Opts {
    fn recipients(&self) -> Vec<String> {
        self.emails
            .split(',')
            .map(str::trim)
            .filter(|e| !e.is_empty())
            .map(String::from)
            .collect()
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    pretty_env_logger::init();

    let opts: Opts = Opts::parse();
    let config = SmtpConfig::from_file(&opts.credentials)
        .with_context(|| format!("failed to load {}", opts.credentials.display()))?;
    debug!("SMTP config {config:?}");

    let runner = Arc::new(build_runner(&opts, config)?);
    let domain_names = Arc::new(opts.domain_names.clone());
    match opts.cron {
        Some(ref cron) => daemon_command(runner, domain_names, cron, opts.run_immediately).await?,
        None => {
            check_command(runner, domain_names).await?;
        }
    }
    Ok(())
}

fn build_runner(opts: &Opts, config: SmtpConfig) -> anyhow::Result<SmtpRunner> {
    let recipients = opts.recipients();
    if recipients.is_empty() {
        bail!("no e-mail address given");
    }

    let trust = if opts.verify {
        TrustMode::WebPki
    } else {
        TrustMode::Insecure
    };
    let mut checker = Checker::new(trust);
    checker.timeout = Duration::from_secs(opts.timeout);

    let mut runner = Runner::new(checker, SmtpNotifier::new(config), &recipients);
    runner.threshold = opts.threshold;
    runner.ascii = opts.ascii || !supports_unicode::on(supports_unicode::Stream::Stdout);
    runner.print = true;
    Ok(runner)
}

async fn check_command(
    runner: Arc<SmtpRunner>,
    domain_names: Arc<Vec<String>>,
) -> anyhow::Result<Report> {
    let report = tokio::task::spawn_blocking(move || runner.run(&domain_names)).await?;
    Ok(report)
}

async fn daemon_command<T>(
    runner: Arc<SmtpRunner>,
    domain_names: Arc<Vec<String>>,
    cron: T,
    run_immediately: bool,
) -> anyhow::Result<()>
where
    T: AsRef<str>,
{
    let cron = cron.as_ref();
    let schedule = Schedule::from_str(cron).with_context(|| format!("invalid cron {cron:?}"))?;

    info!("check certificates of {domain_names:?} with cron {cron}");
    if run_immediately {
        info!("run immediately");
        check_command(runner.clone(), domain_names.clone()).await?;
    }

    for next in schedule.upcoming(Utc) {
        debug!("next check at {next:?}");
        loop {
            if Utc::now() >= next {
                break;
            }
            tokio::time::sleep(Duration::from_millis(999)).await;
        }
        check_command(runner.clone(), domain_names.clone()).await?;
    }
    Ok(())
}
