// src/snapshot/mod.rs

use std::collections::{BTreeSet, HashMap};
use std::fmt;

use crate::grades::GradeRecord;

/// Records added and removed between two polls, each sorted by assignment name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Delta {
    pub added: Vec<GradeRecord>,
    pub removed: Vec<GradeRecord>,
}

impl Delta {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }

    /// Notification lines for `course`: all removals, then all additions.
    pub fn notices(&self, course: &str) -> Vec<Notice> {
        let removed = self.removed.iter().map(|r| Notice::Removed {
            course: course.to_string(),
            record: r.clone(),
        });
        let added = self.added.iter().map(|r| Notice::Added {
            course: course.to_string(),
            record: r.clone(),
        });
        removed.chain(added).collect()
    }
}

/// Set difference by value: `added = current - previous`, `removed = previous - current`.
pub fn diff(previous: &BTreeSet<GradeRecord>, current: &BTreeSet<GradeRecord>) -> Delta {
    Delta {
        added: current.difference(previous).cloned().collect(),
        removed: previous.difference(current).cloned().collect(),
    }
}

/// A single line for the notification sinks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Added { course: String, record: GradeRecord },
    Removed { course: String, record: GradeRecord },
}

impl Notice {
    pub fn record(&self) -> &GradeRecord {
        match self {
            Notice::Added { record, .. } | Notice::Removed { record, .. } => record,
        }
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notice::Added { course, record } => write!(f, "+ {} {}", course, record),
            Notice::Removed { course, record } => write!(f, "- {} {}", course, record),
        }
    }
}

/// Last known records per course. Entries are only ever swapped whole.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    courses: HashMap<String, BTreeSet<GradeRecord>>,
}

impl Snapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, course: &str) -> Option<&BTreeSet<GradeRecord>> {
        self.courses.get(course)
    }

    pub fn contains(&self, course: &str) -> bool {
        self.courses.contains_key(course)
    }

    pub fn len(&self) -> usize {
        self.courses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.courses.is_empty()
    }

    /// Diff `current` against the stored set (empty if none) and store it.
    pub fn replace(&mut self, course: &str, current: BTreeSet<GradeRecord>) -> Delta {
        let delta = match self.courses.get(course) {
            Some(previous) => diff(previous, &current),
            None => diff(&BTreeSet::new(), &current),
        };
        self.courses.insert(course.to_string(), current);
        delta
    }
}
