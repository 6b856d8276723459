// src/grades/header.rs

use crate::error::GradeError;

/// Number of leading positional columns (row identifier, marker) that carry
/// no assignment data.
pub const LEADING_COLUMNS: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Score,
    Rank,
}

impl Role {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "score" => Some(Role::Score),
            "rank" => Some(Role::Rank),
            _ => None,
        }
    }
}

/// Decoded meaning of one data column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderColumn {
    pub assignment_name: String,
    pub role: Role,
    pub max_score: Option<String>,
}

impl HeaderColumn {
    /// Interpret positional fragments: name, role tag, max-score.
    fn from_fragments(fragments: &[String]) -> Self {
        let name = fragments.first().cloned().unwrap_or_default();
        let role = fragments
            .get(1)
            .and_then(|tag| Role::parse(tag))
            .or_else(|| Role::parse(&name))
            .unwrap_or(Role::Score);
        let max_score = fragments.get(2).filter(|m| !m.is_empty()).cloned();
        Self {
            assignment_name: name,
            role,
            max_score,
        }
    }

    /// Render a raw cell value the way it is reported.
    pub fn format_score(&self, raw: &str) -> String {
        match &self.max_score {
            Some(max) => format!("{}/{}", raw, max),
            None => raw.to_string(),
        }
    }
}

/// Collects fragments from consecutive header rows, aligned by position
/// after the leading columns.
#[derive(Debug, Default)]
pub struct HeaderAccumulator {
    fragments: Vec<Vec<String>>,
    rows_seen: usize,
}

impl HeaderAccumulator {
    pub fn push_row(&mut self, values: &[String]) {
        self.rows_seen += 1;
        let cells = values.get(LEADING_COLUMNS..).unwrap_or(&[]);
        if self.fragments.is_empty() {
            self.fragments = cells.iter().map(|h| vec![h.clone()]).collect();
        } else {
            for (fragment, h) in self.fragments.iter_mut().zip(cells) {
                fragment.push(h.clone());
            }
        }
    }

    pub fn finish(self) -> Result<Headers, GradeError> {
        if self.fragments.is_empty() {
            return Err(GradeError::ParseShape(format!(
                "{} header row(s) produced no columns",
                self.rows_seen
            )));
        }
        let columns = self
            .fragments
            .iter()
            .map(|f| HeaderColumn::from_fragments(f))
            .collect();
        Ok(Headers::new(columns))
    }
}

/// Decoded header columns plus the Score→Rank pairing, built once per table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Headers {
    columns: Vec<HeaderColumn>,
    rank_for: Vec<Option<usize>>,
}

impl Headers {
    pub fn new(columns: Vec<HeaderColumn>) -> Self {
        let rank_for = pair_ranks(&columns);
        Self { columns, rank_for }
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn columns(&self) -> &[HeaderColumn] {
        &self.columns
    }

    /// Index of the Rank column paired with the Score column at `score_idx`.
    pub fn rank_column(&self, score_idx: usize) -> Option<usize> {
        self.rank_for.get(score_idx).copied().flatten()
    }

    /// Score columns with their indices, in table order.
    pub fn scorable(&self) -> impl Iterator<Item = (usize, &HeaderColumn)> {
        self.columns
            .iter()
            .enumerate()
            .filter(|(_, c)| c.role == Role::Score)
    }
}

/// A Rank column pairs with the Score column right before it. Rank columns
/// left over fall back to an unpaired Score column right after them.
fn pair_ranks(columns: &[HeaderColumn]) -> Vec<Option<usize>> {
    let mut rank_for = vec![None; columns.len()];
    let mut leftover = Vec::new();

    for (i, col) in columns.iter().enumerate() {
        if col.role != Role::Rank {
            continue;
        }
        match i.checked_sub(1) {
            Some(prev) if columns[prev].role == Role::Score => rank_for[prev] = Some(i),
            _ => leftover.push(i),
        }
    }

    for i in leftover {
        let next = i + 1;
        if columns.get(next).map(|c| c.role) == Some(Role::Score) && rank_for[next].is_none() {
            rank_for[next] = Some(i);
        }
    }

    rank_for
}

/// Decode a run of already-expanded header rows.
pub fn decode_headers<R: AsRef<[String]>>(rows: &[R]) -> Result<Headers, GradeError> {
    let mut acc = HeaderAccumulator::default();
    for row in rows {
        acc.push_row(row.as_ref());
    }
    acc.finish()
}
