use crate::engine::SpinGrid;
use itertools::Itertools;
use std::time::Duration;
use unicode_width::UnicodeWidthStr;

/// `1.5K`, `2.0M`, or the plain number below a thousand.
pub fn format_currency(amount: u64) -> String {
    if amount >= 1_000_000 {
        format!("{:.1}M", amount as f64 / 1_000_000.0)
    } else if amount >= 1_000 {
        format!("{:.1}K", amount as f64 / 1_000.0)
    } else {
        amount.to_string()
    }
}

pub fn format_timer(left: Duration) -> String {
    let secs = left.as_secs();
    format!("{}m {}s", secs / 60, secs % 60)
}

pub fn render_row(grid: &SpinGrid, row: usize) -> String {
    grid.rows()[row].iter().map(|s| s.glyph()).join(" ")
}

/// The grid framed by horizontal rules as wide as its widest row.
pub fn render_grid(grid: &SpinGrid) -> Vec<String> {
    let rows: Vec<String> = (0..grid.rows().len())
        .map(|r| format!("  {}", render_row(grid, r)))
        .collect();
    let width = rows.iter().map(|r| r.width()).max().unwrap_or(0) + 2;
    let rule = "━".repeat(width);
    let mut lines = Vec::with_capacity(rows.len() + 2);
    lines.push(rule.clone());
    lines.extend(rows);
    lines.push(rule);
    lines
}
