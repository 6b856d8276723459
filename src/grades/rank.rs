// src/grades/rank.rs

/// Rank reported when a value cannot be ordered numerically.
pub const UNRANKED: &str = "?";

/// Strip the trailing `*` annotation and parse; empty or non-numeric is `None`.
pub(crate) fn numeric(raw: &str) -> Option<f64> {
    let v = raw.trim().trim_end_matches('*').trim();
    if v.is_empty() {
        return None;
    }
    v.parse::<f64>().ok().filter(|f| f.is_finite())
}

/// 1-based position of `target` among `column` sorted descending.
///
/// Non-numeric entries of other rows are ignored. Ties share the better
/// rank. An unparsable target yields [`UNRANKED`].
pub fn compute_rank<'a, I>(column: I, target: &str) -> String
where
    I: IntoIterator<Item = &'a str>,
{
    let Some(target) = numeric(target) else {
        return UNRANKED.to_string();
    };

    let mut scores: Vec<f64> = column.into_iter().filter_map(numeric).collect();
    scores.sort_by(|a, b| b.total_cmp(a));

    match scores.iter().position(|s| *s == target) {
        Some(pos) => (pos + 1).to_string(),
        None => UNRANKED.to_string(),
    }
}
