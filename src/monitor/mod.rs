//! Sweep driver: polls each course in turn, diffs against the last good
//! snapshot, and hands the resulting notices to the sinks.
//!
//! A failed poll (fetch, missing table, missing row, odd shape) leaves the
//! course's snapshot untouched and never stops the rest of the sweep.

use anyhow::{Context, Result};
use std::{collections::BTreeSet, time::Duration};
use tokio::time::sleep;
use tracing::{error, info, instrument};

use crate::config::CourseTarget;
use crate::error::failure_kind;
use crate::fetch::Fetch;
use crate::grades::{extract_grades, RowIdRule};
use crate::notify::{Notifier, Push};
use crate::snapshot::{Notice, Snapshot};

/// Result of one successful course poll.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CourseReport {
    pub course: String,
    pub notices: Vec<Notice>,
    /// First successful poll of this course; notices describe the initial state.
    pub baseline: bool,
}

#[derive(Debug)]
pub struct CourseFailure {
    pub course: String,
    pub kind: &'static str,
    pub error: anyhow::Error,
}

#[derive(Debug, Default)]
pub struct SweepReport {
    pub updated: Vec<CourseReport>,
    pub failed: Vec<CourseFailure>,
}

impl SweepReport {
    pub fn notice_count(&self) -> usize {
        self.updated.iter().map(|r| r.notices.len()).sum()
    }
}

/// Owns the course list and the per-course snapshot.
#[derive(Debug)]
pub struct Monitor {
    targets: Vec<CourseTarget>,
    rule: RowIdRule,
    snapshot: Snapshot,
}

impl Monitor {
    pub fn new(targets: Vec<CourseTarget>, rule: RowIdRule) -> Self {
        Self {
            targets,
            rule,
            snapshot: Snapshot::new(),
        }
    }

    pub fn targets(&self) -> &[CourseTarget] {
        &self.targets
    }

    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    /// Fetch, extract and diff one course. The snapshot is replaced only when
    /// every step succeeds.
    #[instrument(level = "debug", skip(self, fetcher))]
    pub async fn poll_course<F: Fetch>(
        &mut self,
        fetcher: &F,
        index: usize,
    ) -> Result<CourseReport> {
        let target = self
            .targets
            .get(index)
            .with_context(|| format!("no course at index {}", index))?;
        let html = fetcher
            .fetch(&target.source_url)
            .await
            .with_context(|| format!("fetching {}", target.source_url))?;
        let records: BTreeSet<_> = extract_grades(&html, &target.row_identifier, &self.rule)?
            .into_iter()
            .collect();

        let course = target.name.clone();
        let baseline = !self.snapshot.contains(&course);
        let delta = self.snapshot.replace(&course, records);

        Ok(CourseReport {
            notices: delta.notices(&course),
            course,
            baseline,
        })
    }

    /// Poll every course once, in order, pausing `pause` between courses.
    pub async fn sweep<F: Fetch>(&mut self, fetcher: &F, pause: Duration) -> SweepReport {
        let mut report = SweepReport::default();

        for index in 0..self.targets.len() {
            if index > 0 && !pause.is_zero() {
                sleep(pause).await;
            }
            match self.poll_course(fetcher, index).await {
                Ok(update) => report.updated.push(update),
                Err(e) => {
                    let course = self.targets[index].name.clone();
                    let kind = failure_kind(&e);
                    let detail = format!("{:#}", e);
                    error!(course = %course, kind, error = %detail, "poll failed");
                    report.failed.push(CourseFailure {
                        course,
                        kind,
                        error: e,
                    });
                }
            }
        }

        report
    }
}

/// Initial sweep, banner, then a sweep every `interval` until the process is
/// stopped (or after the first sweep when `once` is set).
pub async fn run<F: Fetch, P: Push>(
    monitor: &mut Monitor,
    fetcher: &F,
    notifier: &Notifier<P>,
    interval: Duration,
    course_pause: Duration,
    once: bool,
) {
    info!(courses = monitor.targets().len(), "initial sweep");
    let report = monitor.sweep(fetcher, course_pause).await;
    for update in &report.updated {
        notifier.dispatch(update).await;
    }
    println!("{:=^78}", "Initialized");

    if once {
        return;
    }

    loop {
        sleep(interval).await;
        let report = monitor.sweep(fetcher, course_pause).await;
        info!(
            notices = report.notice_count(),
            failed = report.failed.len(),
            "sweep done"
        );
        for update in &report.updated {
            notifier.dispatch(update).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grades::GradeRecord;
    use anyhow::anyhow;
    use std::{cell::RefCell, collections::HashMap};
    use url::Url;

    /// Serves queued pages per URL; an empty queue is a fetch failure.
    #[derive(Default)]
    struct FakeFetcher {
        pages: RefCell<HashMap<String, Vec<Result<String, String>>>>,
    }

    impl FakeFetcher {
        fn push(&self, url: &str, page: Result<String, String>) {
            self.pages
                .borrow_mut()
                .entry(url.to_string())
                .or_default()
                .push(page);
        }
    }

    impl Fetch for FakeFetcher {
        async fn fetch(&self, url: &Url) -> Result<String> {
            let mut pages = self.pages.borrow_mut();
            let queue = pages.entry(url.to_string()).or_default();
            if queue.is_empty() {
                return Err(anyhow!("connection refused"));
            }
            queue.remove(0).map_err(|e| anyhow!(e))
        }
    }

    const A: &str = "https://example.com/a/scores.html";
    const B: &str = "https://example.com/b/scores.html";

    fn page(rows: &[(&str, &str)]) -> String {
        let mut html = String::from(
            "<table>\
             <tr><td>Secret Number</td><td></td><td colspan=\"2\">HW1</td></tr>\
             <tr><td></td><td></td><td>Score</td><td>Rank</td></tr>",
        );
        for (id, score) in rows {
            html.push_str(&format!(
                "<tr><td>{}</td><td></td><td>{}</td><td></td></tr>",
                id, score
            ));
        }
        html.push_str("</table>");
        html
    }

    fn target(name: &str, url: &str, secret: &str) -> CourseTarget {
        CourseTarget {
            name: name.to_string(),
            source_url: Url::parse(url).unwrap(),
            row_identifier: secret.to_string(),
        }
    }

    fn monitor() -> Monitor {
        Monitor::new(
            vec![target("Alpha", A, "1234"), target("Beta", B, "5678")],
            RowIdRule::default(),
        )
    }

    fn lines(report: &CourseReport) -> Vec<String> {
        report.notices.iter().map(|n| n.to_string()).collect()
    }

    #[tokio::test]
    async fn test_baseline_then_change() {
        let fetcher = FakeFetcher::default();
        fetcher.push(A, Ok(page(&[("1234", "90"), ("1111", "95")])));
        fetcher.push(A, Ok(page(&[("1234", "97"), ("1111", "95")])));
        let mut mon = Monitor::new(vec![target("Alpha", A, "1234")], RowIdRule::default());

        let first = mon.poll_course(&fetcher, 0).await.unwrap();
        assert!(first.baseline);
        assert_eq!(lines(&first), vec!["+ Alpha HW1: 90 (Rank 2)"]);

        let second = mon.poll_course(&fetcher, 0).await.unwrap();
        assert!(!second.baseline);
        assert_eq!(
            lines(&second),
            vec!["- Alpha HW1: 90 (Rank 2)", "+ Alpha HW1: 97 (Rank 1)"]
        );
    }

    #[tokio::test]
    async fn test_unchanged_poll_is_quiet() {
        let fetcher = FakeFetcher::default();
        fetcher.push(A, Ok(page(&[("1234", "90")])));
        fetcher.push(A, Ok(page(&[("1234", "90")])));
        let mut mon = Monitor::new(vec![target("Alpha", A, "1234")], RowIdRule::default());

        mon.poll_course(&fetcher, 0).await.unwrap();
        let again = mon.poll_course(&fetcher, 0).await.unwrap();
        assert!(again.notices.is_empty());
    }

    #[tokio::test]
    async fn test_failure_keeps_snapshot_and_other_courses() {
        let fetcher = FakeFetcher::default();
        fetcher.push(A, Ok(page(&[("1234", "90")])));
        fetcher.push(B, Ok(page(&[("5678", "70")])));
        // second sweep: A loses the student row, B has no page at all
        fetcher.push(A, Ok(page(&[("1111", "90")])));
        fetcher.push(A, Ok(page(&[("1234", "90")])));
        fetcher.push(B, Ok(page(&[("5678", "75")])));

        let mut mon = monitor();
        let first = mon.sweep(&fetcher, Duration::ZERO).await;
        assert_eq!(first.updated.len(), 2);
        assert!(first.failed.is_empty());

        let second = mon.sweep(&fetcher, Duration::ZERO).await;
        assert_eq!(second.failed.len(), 1);
        assert_eq!(second.failed[0].course, "Alpha");
        assert_eq!(second.failed[0].kind, "row-not-found");
        assert_eq!(
            mon.snapshot().get("Alpha").unwrap().iter().next(),
            Some(&GradeRecord::new("HW1", "90", "1"))
        );
        assert_eq!(
            lines(&second.updated[0]),
            vec!["- Beta HW1: 70 (Rank 1)", "+ Beta HW1: 75 (Rank 1)"]
        );

        // third sweep: A recovers with unchanged grades, B's fetch fails
        let third = mon.sweep(&fetcher, Duration::ZERO).await;
        assert_eq!(third.updated.len(), 1);
        assert!(third.updated[0].notices.is_empty());
        assert!(!third.updated[0].baseline);
        assert_eq!(third.failed[0].course, "Beta");
        assert_eq!(third.failed[0].kind, "fetch");
        assert!(mon.snapshot().contains("Beta"));
    }

    #[tokio::test]
    async fn test_missing_table_is_reported() {
        let fetcher = FakeFetcher::default();
        fetcher.push(A, Ok("<html><body>Down for maintenance</body></html>".into()));
        fetcher.push(B, Err("502 Bad Gateway".into()));

        let mut mon = monitor();
        let report = mon.sweep(&fetcher, Duration::from_millis(1)).await;
        let kinds: Vec<_> = report.failed.iter().map(|f| f.kind).collect();
        assert_eq!(kinds, vec!["table-not-found", "fetch"]);
        assert!(mon.snapshot().is_empty());
        assert_eq!(report.notice_count(), 0);
    }

    #[tokio::test]
    async fn test_run_once_dispatches_baseline() {
        let fetcher = FakeFetcher::default();
        fetcher.push(A, Ok(page(&[("1234", "90")])));
        fetcher.push(B, Ok(page(&[("5678", "80")])));

        let mut mon = monitor();
        run(
            &mut mon,
            &fetcher,
            &Notifier::console(),
            Duration::from_secs(3600),
            Duration::ZERO,
            true,
        )
        .await;
        assert_eq!(mon.snapshot().len(), 2);
    }
}
