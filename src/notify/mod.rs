// src/notify/mod.rs

use anyhow::{anyhow, Context, Result};
use chrono::Local;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, trace, warn};

use crate::config::PushoverConfig;
use crate::monitor::CourseReport;

const PUSHOVER_URL: &str = "https://api.pushover.net/1/messages.json";

/// Prefix `line` with the local wall-clock time.
pub fn timestamped(line: &str) -> String {
    format!("{} {}", Local::now().format("%Y-%m-%d %H:%M:%S"), line)
}

/// Outbound push channel for notice lines.
#[allow(async_fn_in_trait)]
pub trait Push {
    async fn push(&self, message: &str) -> Result<()>;
}

#[derive(Debug, Clone)]
pub struct Pushover {
    client: Client,
    token: String,
    user: String,
}

#[derive(Debug, Deserialize)]
struct PushoverReply {
    status: i64,
    #[serde(default)]
    errors: Vec<String>,
}

impl Pushover {
    pub fn new(client: Client, cfg: &PushoverConfig) -> Self {
        Self {
            client,
            token: cfg.token.clone(),
            user: cfg.user.clone(),
        }
    }
}

impl Push for Pushover {
    async fn push(&self, message: &str) -> Result<()> {
        let params = [
            ("token", self.token.as_str()),
            ("user", self.user.as_str()),
            ("message", message),
        ];
        let reply: PushoverReply = self
            .client
            .post(PUSHOVER_URL)
            .form(&params)
            .send()
            .await
            .context("POST pushover message")?
            .error_for_status()
            .context("pushover rejected message")?
            .json()
            .await
            .context("reading pushover reply")?;

        if reply.status != 1 {
            return Err(anyhow!("pushover status {}: {:?}", reply.status, reply.errors));
        }
        debug!("pushed notification");
        Ok(())
    }
}

/// Fans notices out to stdout and, when configured, a push channel.
#[derive(Debug, Clone)]
pub struct Notifier<P = Pushover> {
    push: Option<P>,
}

impl Notifier {
    pub fn console() -> Self {
        Self { push: None }
    }

    pub fn with_pushover(pushover: Pushover) -> Self {
        Self {
            push: Some(pushover),
        }
    }
}

impl<P: Push> Notifier<P> {
    pub fn new(push: Option<P>) -> Self {
        Self { push }
    }

    /// Print every notice; push them too unless this is the course's
    /// baseline poll. Push failures are logged and dropped. Returns how
    /// many lines were pushed.
    pub async fn dispatch(&self, report: &CourseReport) -> usize {
        let mut pushed = 0;
        for notice in &report.notices {
            let line = notice.to_string();
            println!("{}", timestamped(&line));
            trace!(
                course = %report.course,
                assignment = %notice.record().assignment_name,
                "printed notice"
            );

            if report.baseline {
                continue;
            }
            if let Some(push) = &self.push {
                match push.push(&line).await {
                    Ok(()) => pushed += 1,
                    Err(e) => {
                        warn!(course = %report.course, error = %e, "push notification failed")
                    }
                }
            }
        }
        pushed
    }
}
