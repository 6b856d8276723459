// src/grades/row_id.rs

use anyhow::{Context, Result};
use regex::Regex;
use serde::Deserialize;

/// Characters allowed in a row identifier.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IdClass {
    #[default]
    Digits,
    Alphanumeric,
    Any,
}

impl IdClass {
    fn pattern(self) -> &'static str {
        match self {
            IdClass::Digits => "[0-9]",
            IdClass::Alphanumeric => "[[:alnum:]]",
            IdClass::Any => ".",
        }
    }
}

/// Decides whether a row's first cell is a student identifier (data row)
/// or something else (header row).
#[derive(Debug, Clone)]
pub struct RowIdRule {
    re: Regex,
}

impl RowIdRule {
    pub const DEFAULT_WIDTH: usize = 4;

    pub fn new(width: usize, class: IdClass) -> Result<Self> {
        if width == 0 {
            anyhow::bail!("row identifier width must be at least 1");
        }
        Self::from_pattern(&format!("^{}{{{}}}$", class.pattern(), width))
    }

    /// Use a caller-supplied regex; it is matched against the whole cell.
    pub fn from_pattern(pattern: &str) -> Result<Self> {
        let anchored = format!("^(?:{})$", pattern.trim_start_matches('^').trim_end_matches('$'));
        let re = Regex::new(&anchored)
            .with_context(|| format!("invalid row identifier pattern `{}`", pattern))?;
        Ok(Self { re })
    }

    pub fn is_row_id(&self, cell: &str) -> bool {
        !cell.is_empty() && self.re.is_match(cell)
    }
}

impl Default for RowIdRule {
    fn default() -> Self {
        Self {
            re: Regex::new("^[0-9]{4}$").expect("default row id pattern should compile"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_rule_is_four_digits() {
        let rule = RowIdRule::default();
        assert!(rule.is_row_id("1234"));
        assert!(rule.is_row_id("0007"));
        assert!(!rule.is_row_id("123"));
        assert!(!rule.is_row_id("12345"));
        assert!(!rule.is_row_id("HW1a"));
        assert!(!rule.is_row_id(""));
        assert!(!rule.is_row_id("Secret Number"));
    }

    #[test]
    fn test_alphanumeric_width() {
        let rule = RowIdRule::new(5, IdClass::Alphanumeric).unwrap();
        assert!(rule.is_row_id("ab12Z"));
        assert!(!rule.is_row_id("ab12"));
        assert!(!rule.is_row_id("ab 12"));
    }

    #[test]
    fn test_any_class_checks_width_only() {
        let rule = RowIdRule::new(4, IdClass::Any).unwrap();
        assert!(rule.is_row_id("Mean"));
        assert!(!rule.is_row_id("Median"));
    }

    #[test]
    fn test_custom_pattern_is_anchored() {
        let rule = RowIdRule::from_pattern(r"[A-Z]\d{3}").unwrap();
        assert!(rule.is_row_id("A123"));
        assert!(!rule.is_row_id("xA123"));
        let rule = RowIdRule::from_pattern(r"^\d+$").unwrap();
        assert!(rule.is_row_id("42"));
    }

    #[test]
    fn test_zero_width_rejected() {
        assert!(RowIdRule::new(0, IdClass::Digits).is_err());
    }
}
