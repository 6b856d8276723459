// src/grades/extract.rs

use tracing::{debug, trace};

use super::header::{HeaderAccumulator, Headers, LEADING_COLUMNS};
use super::rank::{compute_rank, numeric};
use super::row_id::RowIdRule;
use super::GradeRecord;
use crate::error::GradeError;
use crate::table::{locate_table, RawTable};

/// Headers plus every student row of one grade table.
#[derive(Debug, Clone)]
pub struct GradeSheet {
    headers: Headers,
    /// (row identifier, values after the leading columns), in table order.
    rows: Vec<(String, Vec<String>)>,
}

impl GradeSheet {
    /// Walk the table once: rows before the first identifier row feed the
    /// header decoder, identifier rows become grade rows.
    pub fn from_table(table: &RawTable, rule: &RowIdRule) -> Result<Self, GradeError> {
        let mut acc = HeaderAccumulator::default();
        let mut rows: Vec<(String, Vec<String>)> = Vec::new();

        for (idx, raw) in table.rows.iter().enumerate() {
            let values = raw.expand();
            let first = values.first().map(String::as_str).unwrap_or("");

            if rule.is_row_id(first) {
                let data = values.get(LEADING_COLUMNS..).unwrap_or(&[]).to_vec();
                rows.push((first.to_string(), data));
            } else if rows.is_empty() {
                acc.push_row(&values);
            } else {
                trace!(row = idx, "skipping non-identifier row after data");
            }
        }

        let headers = acc.finish()?;
        for (id, values) in &rows {
            if values.len() != headers.len() {
                return Err(GradeError::ParseShape(format!(
                    "row `{}` has {} columns but the header has {}",
                    id,
                    values.len(),
                    headers.len()
                )));
            }
        }

        debug!(columns = headers.len(), rows = rows.len(), "decoded grade sheet");
        Ok(Self { headers, rows })
    }

    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Values of the single row keyed by `row_id`.
    pub fn row(&self, row_id: &str) -> Result<&[String], GradeError> {
        let mut matches = self.rows.iter().filter(|(id, _)| id == row_id);
        let Some((_, values)) = matches.next() else {
            return Err(GradeError::RowNotFound {
                row: row_id.to_string(),
            });
        };
        let extra = matches.count();
        if extra > 0 {
            return Err(GradeError::DuplicateRow {
                row: row_id.to_string(),
                count: extra + 1,
            });
        }
        Ok(values)
    }

    /// Every row's value in column `idx`.
    pub fn column(&self, idx: usize) -> impl Iterator<Item = &str> {
        self.rows
            .iter()
            .filter_map(move |(_, values)| values.get(idx).map(String::as_str))
    }

    /// One record per Score column of `row_id`'s row.
    pub fn records_for(&self, row_id: &str) -> Result<Vec<GradeRecord>, GradeError> {
        let values = self.row(row_id)?;

        let records = self
            .headers
            .scorable()
            .map(|(idx, header)| {
                let raw = &values[idx];
                // a colspan over Score and Rank repeats e.g. "Absent" into the rank cell
                let rank = self
                    .headers
                    .rank_column(idx)
                    .map(|r| values[r].as_str())
                    .filter(|r| numeric(r).is_some())
                    .map(str::to_string)
                    .unwrap_or_else(|| compute_rank(self.column(idx), raw));
                GradeRecord {
                    assignment_name: header.assignment_name.clone(),
                    score: header.format_score(raw),
                    rank,
                }
            })
            .collect();

        Ok(records)
    }
}

/// Extract `row_id`'s records from an already-located table.
pub fn extract_records(
    table: &RawTable,
    row_id: &str,
    rule: &RowIdRule,
) -> Result<Vec<GradeRecord>, GradeError> {
    GradeSheet::from_table(table, rule)?.records_for(row_id)
}

/// Full pipeline from page text to the student's grade records.
pub fn extract_grades(
    html: &str,
    row_id: &str,
    rule: &RowIdRule,
) -> Result<Vec<GradeRecord>, GradeError> {
    let table = locate_table(html)?;
    extract_records(&table, row_id, rule)
}
