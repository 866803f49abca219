//! `/table <rows> <cols>` command parsing and table markup generation

use std::ops::Range;
use std::sync::LazyLock;

use regex::Regex;

pub const MAX_ROWS: usize = 20;
pub const MAX_COLS: usize = 10;

static TABLE_COMMAND: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^/table\s+(\d+)\s+(\d+)$").expect("valid table command regex"));

/// Size requested by a table command
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TableSize {
    pub rows: usize,
    pub cols: usize,
}

/// Parse `/table r c`. Out of range sizes are rejected.
pub fn parse_table_command(text: &str) -> Option<TableSize> {
    let caps = TABLE_COMMAND.captures(text)?;
    let rows: usize = caps[1].parse().ok()?;
    let cols: usize = caps[2].parse().ok()?;
    in_bounds(rows, cols).then_some(TableSize { rows, cols })
}

/// Markdown for a `rows` x `cols` table with numbered headers and blank cells.
/// Empty when the size is out of range.
pub fn generate_table_markdown(rows: usize, cols: usize) -> String {
    if !in_bounds(rows, cols) {
        return String::new();
    }

    let headers: Vec<String> = (1..=cols).map(|c| format!("Header{}", c)).collect();
    let header_row = format!("| {} |", headers.join(" | "));
    let separator_row = format!("| {} |", vec!["---"; cols].join(" | "));
    let empty_row = format!("| {} |", vec![""; cols].join(" | "));

    let mut lines = vec![header_row, separator_row];
    lines.extend(std::iter::repeat(empty_row).take(rows));
    lines.join("\n").trim().to_string()
}

/// Byte range of the first header label in generated markup, used to select
/// it right after insertion
pub fn first_cell_range() -> Range<usize> {
    2..9
}

fn in_bounds(rows: usize, cols: usize) -> bool {
    (1..=MAX_ROWS).contains(&rows) && (1..=MAX_COLS).contains(&cols)
}
