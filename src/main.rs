use anyhow::{Context, Result};
use clap::{ArgAction, Parser};
use gradewatch::{
    config::{Config, CourseConfig, PushoverConfig},
    fetch::HttpFetcher,
    monitor::{run, Monitor},
    notify::{Notifier, Pushover},
};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

/// Watch course grade reports and announce every posted or revised grade.
#[derive(Debug, Parser)]
#[command(name = "gradewatch", version, about)]
struct Cli {
    /// YAML configuration file.
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Seconds between sweeps (overrides the configuration file).
    #[arg(long, value_name = "SECS")]
    interval: Option<u64>,

    /// Pushover app credentials.
    #[arg(long, num_args = 2, value_names = ["TOKEN", "USER"])]
    pushover: Option<Vec<String>>,

    /// Course to watch; use the assessment page (scores.html) for the url.
    #[arg(
        long = "class",
        num_args = 3,
        value_names = ["NAME", "GRADESOURCE_URL", "SECRET_NUMBER"],
        action = ArgAction::Append
    )]
    classes: Vec<String>,

    /// Run a single sweep and exit.
    #[arg(long)]
    once: bool,

    /// More log output (-v debug, -vv trace).
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,

    /// Only log warnings and errors.
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

impl Cli {
    fn default_filter(&self) -> &'static str {
        match (self.quiet, self.verbose) {
            (true, _) => "warn",
            (false, 0) => "info",
            (false, 1) => "debug",
            _ => "trace",
        }
    }

    /// Load the configuration file (if any) and layer the flags on top.
    fn into_config(self) -> Result<Config> {
        let mut cfg = match &self.config {
            Some(path) => Config::load(path)?,
            None => Config::default(),
        };

        if let Some(secs) = self.interval {
            cfg.interval_secs = secs;
        }
        if let Some(creds) = self.pushover {
            if let [token, user] = creds.as_slice() {
                cfg.pushover = Some(PushoverConfig {
                    token: token.clone(),
                    user: user.clone(),
                });
            }
        }
        for chunk in self.classes.chunks_exact(3) {
            cfg.courses.push(CourseConfig {
                name: chunk[0].clone(),
                url: chunk[1].clone(),
                secret: chunk[2].clone(),
            });
        }
        Ok(cfg)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ─── 1) init logging ─────────────────────────────────────────────
    let env = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(cli.default_filter()));
    fmt::Subscriber::builder()
        .with_env_filter(env)
        .with_writer(std::io::stderr)
        .init();

    // ─── 2) configuration ────────────────────────────────────────────
    let once = cli.once;
    let cfg = cli.into_config()?;
    let targets = cfg.targets().context("invalid configuration")?;
    let rule = cfg.row_id.rule()?;
    info!(courses = targets.len(), interval = ?cfg.interval(), "startup");

    // ─── 3) collaborators ────────────────────────────────────────────
    let fetcher = HttpFetcher::new(&cfg.fetch)?;
    let notifier = match &cfg.pushover {
        Some(p) => Notifier::with_pushover(Pushover::new(fetcher.client().clone(), p)),
        None => Notifier::console(),
    };

    // ─── 4) poll until stopped ───────────────────────────────────────
    let mut monitor = Monitor::new(targets, rule);
    run(
        &mut monitor,
        &fetcher,
        &notifier,
        cfg.interval(),
        cfg.course_pause(),
        once,
    )
    .await;

    Ok(())
}
