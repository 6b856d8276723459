//! Monitor configuration: a YAML file, optionally extended from the command
//! line, validated into immutable [`CourseTarget`]s before the first sweep.

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Deserializer};
use std::{collections::HashSet, fs, path::Path, time::Duration};
use url::Url;

use crate::grades::{IdClass, RowIdRule};

/// Page fetched when a course URL points at a directory.
pub const REPORT_PAGE: &str = "scores.html";

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Seconds between sweeps.
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,

    /// Milliseconds to pause between courses inside one sweep.
    #[serde(default)]
    pub course_pause_ms: u64,

    #[serde(default)]
    pub fetch: FetchConfig,

    #[serde(default)]
    pub row_id: RowIdConfig,

    #[serde(default)]
    pub pushover: Option<PushoverConfig>,

    #[serde(default)]
    pub courses: Vec<CourseConfig>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FetchConfig {
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_backoff_ms")]
    pub backoff_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RowIdConfig {
    #[serde(default = "default_row_id_width")]
    pub width: usize,
    #[serde(default)]
    pub class: IdClass,
    /// Overrides `width`/`class` when set.
    #[serde(default)]
    pub pattern: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PushoverConfig {
    pub token: String,
    pub user: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CourseConfig {
    pub name: String,
    pub url: String,
    #[serde(deserialize_with = "string_or_number")]
    pub secret: String,
}

/// A validated course to poll. Immutable for the process lifetime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CourseTarget {
    pub name: String,
    pub source_url: Url,
    pub row_identifier: String,
}

fn default_interval_secs() -> u64 {
    30
}

fn default_timeout_secs() -> u64 {
    20
}

fn default_max_retries() -> u32 {
    2
}

fn default_backoff_ms() -> u64 {
    500
}

fn default_row_id_width() -> usize {
    RowIdRule::DEFAULT_WIDTH
}

impl Default for Config {
    fn default() -> Self {
        Self {
            interval_secs: default_interval_secs(),
            course_pause_ms: 0,
            fetch: FetchConfig::default(),
            row_id: RowIdConfig::default(),
            pushover: None,
            courses: Vec::new(),
        }
    }
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            max_retries: default_max_retries(),
            backoff_ms: default_backoff_ms(),
        }
    }
}

impl Default for RowIdConfig {
    fn default() -> Self {
        Self {
            width: default_row_id_width(),
            class: IdClass::default(),
            pattern: None,
        }
    }
}

impl FetchConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl RowIdConfig {
    pub fn rule(&self) -> Result<RowIdRule> {
        match &self.pattern {
            Some(p) => RowIdRule::from_pattern(p),
            None => RowIdRule::new(self.width, self.class),
        }
    }
}

impl Config {
    pub fn from_yaml_str(text: &str) -> Result<Self> {
        serde_yaml::from_str(text).context("parsing configuration")
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text =
            fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
        Self::from_yaml_str(&text).with_context(|| format!("loading {}", path.display()))
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    pub fn course_pause(&self) -> Duration {
        Duration::from_millis(self.course_pause_ms)
    }

    /// Validate every configured course.
    pub fn targets(&self) -> Result<Vec<CourseTarget>> {
        if self.courses.is_empty() {
            bail!("no courses configured");
        }

        let mut names = HashSet::new();
        let mut targets = Vec::with_capacity(self.courses.len());
        for course in &self.courses {
            let target = course.validate()?;
            if !names.insert(target.name.clone()) {
                bail!("course `{}` is configured more than once", target.name);
            }
            targets.push(target);
        }
        Ok(targets)
    }
}

impl CourseConfig {
    pub fn validate(&self) -> Result<CourseTarget> {
        let name = self.name.trim();
        if name.is_empty() {
            bail!("course with url `{}` has an empty name", self.url);
        }
        let secret = self.secret.trim();
        if secret.is_empty() {
            bail!("course `{}` has an empty secret", name);
        }
        let source_url = resolve_report_url(&self.url)
            .with_context(|| format!("course `{}` has an invalid url", name))?;

        Ok(CourseTarget {
            name: name.to_string(),
            source_url,
            row_identifier: secret.to_string(),
        })
    }
}

/// Parse `raw`; a URL naming a directory resolves to its report page.
pub fn resolve_report_url(raw: &str) -> Result<Url> {
    let url = Url::parse(raw.trim())?;
    if !matches!(url.scheme(), "http" | "https") {
        bail!("unsupported scheme `{}`", url.scheme());
    }
    if url.path().ends_with('/') {
        return Ok(url.join(REPORT_PAGE)?);
    }
    Ok(url)
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StringOrNumber {
    Text(String),
    Number(u64),
}

fn string_or_number<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    Ok(match StringOrNumber::deserialize(d)? {
        StringOrNumber::Text(s) => s,
        StringOrNumber::Number(n) => n.to_string(),
    })
}
