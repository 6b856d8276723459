// src/table/mod.rs

pub mod locate;

pub use locate::{locate_table, ANCHOR_MARKER};

/// One `<td>`/`<th>` as read from the page, text already normalized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawCell {
    pub text: String,
    /// Always at least 1.
    pub colspan: usize,
    /// True for `<th>` cells.
    pub is_header_like: bool,
}

impl RawCell {
    pub fn new(text: impl Into<String>, colspan: usize) -> Self {
        Self {
            text: text.into(),
            colspan: colspan.max(1),
            is_header_like: false,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawRow {
    pub cells: Vec<RawCell>,
}

impl RawRow {
    /// Flatten the row into one value per logical column; a cell with
    /// colspan N contributes its text N times.
    pub fn expand(&self) -> Vec<String> {
        let width = self.cells.iter().map(|c| c.colspan).sum();
        let mut out = Vec::with_capacity(width);
        for cell in &self.cells {
            for _ in 0..cell.colspan {
                out.push(cell.text.clone());
            }
        }
        out
    }
}

impl FromIterator<RawCell> for RawRow {
    fn from_iter<I: IntoIterator<Item = RawCell>>(iter: I) -> Self {
        Self {
            cells: iter.into_iter().collect(),
        }
    }
}

/// The grade table as a typed tree, rebuilt on every poll.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawTable {
    pub rows: Vec<RawRow>,
}

impl RawTable {
    /// Build a table from plain rows of `(text, colspan)` pairs.
    pub fn from_cells<R, C, S>(rows: R) -> Self
    where
        R: IntoIterator<Item = C>,
        C: IntoIterator<Item = (S, usize)>,
        S: Into<String>,
    {
        Self {
            rows: rows
                .into_iter()
                .map(|row| {
                    row.into_iter()
                        .map(|(text, span)| RawCell::new(text, span))
                        .collect::<RawRow>()
                })
                .collect(),
        }
    }
}

/// Replace non-breaking spaces, collapse whitespace runs and trim.
pub fn normalize_text(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut prev_space = false;
    for ch in raw.chars() {
        if ch.is_whitespace() || ch == '\u{a0}' {
            if !prev_space {
                out.push(' ');
                prev_space = true;
            }
        } else {
            out.push(ch);
            prev_space = false;
        }
    }
    out.trim().to_string()
}
