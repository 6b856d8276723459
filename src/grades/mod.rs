// src/grades/mod.rs

pub mod extract;
pub mod header;
pub mod rank;
pub mod row_id;

use std::fmt;

pub use extract::{extract_grades, extract_records, GradeSheet};
pub use header::{decode_headers, HeaderColumn, Headers, Role};
pub use rank::{compute_rank, UNRANKED};
pub use row_id::{IdClass, RowIdRule};

/// One scorable column of the student's row.
///
/// Equality covers all three fields, so a changed score or rank is a
/// different record. Ordering is by assignment name first.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GradeRecord {
    pub assignment_name: String,
    /// Raw score, or `score/max` when the column has a max-score.
    pub score: String,
    /// Numeral, or [`UNRANKED`].
    pub rank: String,
}

impl GradeRecord {
    pub fn new(
        assignment_name: impl Into<String>,
        score: impl Into<String>,
        rank: impl Into<String>,
    ) -> Self {
        Self {
            assignment_name: assignment_name.into(),
            score: score.into(),
            rank: rank.into(),
        }
    }
}

impl fmt::Display for GradeRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} (Rank {})",
            self.assignment_name, self.score, self.rank
        )
    }
}
