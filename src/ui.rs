//! Box-drawn tables for listings such as the verbose file registry.
//!
//! ```text
//!   ┌──────────────┬────────┐
//!   │ File         │ Kind   │
//!   ├──────────────┼────────┤
//!   │ src/main.cpp │ source │
//!   └──────────────┴────────┘
//! ```

use colored::*;
use console::{Term, measure_text_width, truncate_str};

pub struct Table {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new(headers: &[&str]) -> Self {
        Self {
            headers: headers.iter().map(|s| s.to_string()).collect(),
            rows: Vec::new(),
        }
    }

    /// Rows with the wrong number of cells are dropped.
    pub fn add_row(&mut self, row: Vec<String>) {
        if row.len() == self.headers.len() {
            self.rows.push(row);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Print sized to the current terminal.
    pub fn print(&self) {
        let (_, width) = Term::stdout().size();
        print!("{}", self.render(width as usize));
    }

    /// Render to at most `max_width` columns, shrinking the widest column
    /// first but never below eight characters.
    pub fn render(&self, max_width: usize) -> String {
        if self.headers.is_empty() {
            return String::new();
        }
        let mut widths: Vec<usize> = self
            .headers
            .iter()
            .map(|h| measure_text_width(h))
            .collect();
        for row in &self.rows {
            for (width, cell) in widths.iter_mut().zip(row) {
                *width = (*width).max(measure_text_width(&flatten(cell)));
            }
        }

        let overhead = 3 + 3 * widths.len();
        let available = max_width.saturating_sub(overhead);
        while widths.iter().sum::<usize>() > available {
            let Some(widest) = widths.iter_mut().filter(|w| **w > 8).max_by_key(|w| **w) else {
                break;
            };
            *widest -= 1;
        }

        let rule = |left: &str, mid: &str, right: &str| -> String {
            let segments: Vec<String> = widths.iter().map(|w| "─".repeat(w + 2)).collect();
            format!("  {}{}{}\n", left, segments.join(mid), right)
        };
        let line = |cells: Vec<String>| -> String {
            let mut out = String::from("  │");
            for (cell, width) in cells.iter().zip(&widths) {
                let shown = truncate_str(cell, *width, "...");
                let pad = width.saturating_sub(measure_text_width(&shown));
                out.push_str(&format!(" {}{} │", shown, " ".repeat(pad)));
            }
            out.push('\n');
            out
        };

        let mut out = rule("┌", "┬", "┐");
        out.push_str(&line(
            self.headers.iter().map(|h| h.bold().to_string()).collect(),
        ));
        out.push_str(&rule("├", "┼", "┤"));
        for row in &self.rows {
            out.push_str(&line(row.iter().map(|c| flatten(c)).collect()));
        }
        out.push_str(&rule("└", "┴", "┘"));
        out
    }
}

fn flatten(cell: &str) -> String {
    cell.replace(['\n', '\r', '\t'], " ")
}
