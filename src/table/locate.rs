// src/table/locate.rs

use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, trace};

use super::{normalize_text, RawCell, RawRow, RawTable};
use crate::error::GradeError;

/// Literal cell text that identifies the grade table on the page.
pub const ANCHOR_MARKER: &str = "Secret Number";

static TABLE: Lazy<Selector> =
    Lazy::new(|| Selector::parse("table").expect("table selector should parse"));

/// Parse `html` and return the first table (depth-first, document order) that
/// owns a cell whose normalized text is [`ANCHOR_MARKER`].
pub fn locate_table(html: &str) -> Result<RawTable, GradeError> {
    let doc = Html::parse_document(html);

    for (idx, table) in doc.select(&TABLE).enumerate() {
        let rows = own_rows(table);
        let anchored = rows.iter().any(|row| {
            own_cells(*row)
                .any(|cell| normalize_text(&cell.text().collect::<String>()) == ANCHOR_MARKER)
        });
        if !anchored {
            trace!(table = idx, "no anchor cell");
            continue;
        }

        let table = RawTable {
            rows: rows.into_iter().map(read_row).collect(),
        };
        debug!(table = idx, rows = table.rows.len(), "located grade table");
        return Ok(table);
    }

    Err(GradeError::TableNotFound {
        marker: ANCHOR_MARKER.to_string(),
    })
}

/// Rows that belong to `table` itself: direct `tr` children plus those of its
/// own `thead`/`tbody`/`tfoot` sections. Rows of nested tables are excluded.
fn own_rows(table: ElementRef<'_>) -> Vec<ElementRef<'_>> {
    let mut rows = Vec::new();
    for child in table.children().filter_map(ElementRef::wrap) {
        match child.value().name() {
            "tr" => rows.push(child),
            "thead" | "tbody" | "tfoot" => rows.extend(
                child
                    .children()
                    .filter_map(ElementRef::wrap)
                    .filter(|el| el.value().name() == "tr"),
            ),
            _ => {}
        }
    }
    rows
}

fn own_cells(row: ElementRef<'_>) -> impl Iterator<Item = ElementRef<'_>> {
    row.children()
        .filter_map(ElementRef::wrap)
        .filter(|el| matches!(el.value().name(), "td" | "th"))
}

fn read_row(row: ElementRef<'_>) -> RawRow {
    own_cells(row)
        .map(|cell| {
            let colspan = cell
                .value()
                .attr("colspan")
                .and_then(|v| v.trim().parse::<usize>().ok())
                .unwrap_or(1);
            RawCell {
                text: normalize_text(&cell.text().collect::<String>()),
                colspan: colspan.max(1),
                is_header_like: cell.value().name() == "th",
            }
        })
        .collect()
}
