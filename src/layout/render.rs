//! Text rendering of a stage layout
//!
//! Draws columns left to right, one dependency layer per column. Within a
//! column the first stage gets a straight connector from the previous layer
//! and the rest get branch connectors, mirroring how the stages fan out.
//! Stages marked not visible (e.g. a pending rollback stage) are skipped.

use crate::domain::Stage;
use crate::layout::Layout;

/// Connector for the first stage of a column
const STRAIGHT: &str = " --> ";
/// Connector for the remaining stages of a column
const BRANCH: &str = "  \\> ";

/// Renders a layout as a left-to-right text grid
pub fn render_text(layout: &Layout) -> String {
    let cells: Vec<Vec<String>> = layout
        .columns()
        .iter()
        .map(|col| col.iter().filter(|s| s.visible).map(cell).collect())
        .collect();

    if cells.iter().all(|col| col.is_empty()) {
        return "(no stages)\n".to_string();
    }

    let widths: Vec<usize> = cells
        .iter()
        .map(|col| col.iter().map(String::len).max().unwrap_or(0))
        .collect();
    let rows = cells.iter().map(Vec::len).max().unwrap_or(0);

    let mut out = String::new();
    for row in 0..rows {
        let mut line = String::new();
        for (col_index, col) in cells.iter().enumerate() {
            let connector = if col_index == 0 {
                ""
            } else if row == 0 {
                STRAIGHT
            } else {
                BRANCH
            };

            match col.get(row) {
                Some(text) => {
                    if col_index > 0 {
                        line.push_str(connector);
                    }
                    line.push_str(text);
                    // Pad for alignment, except in the last column
                    if col_index + 1 < cells.len() {
                        for _ in text.len()..widths[col_index] {
                            line.push(' ');
                        }
                    }
                }
                None => {
                    if col_index + 1 < cells.len() {
                        let pad = widths[col_index]
                            + if col_index == 0 { 0 } else { connector.len() };
                        for _ in 0..pad {
                            line.push(' ');
                        }
                    }
                }
            }
        }
        out.push_str(line.trim_end());
        out.push('\n');
    }
    out
}

fn cell(stage: &Stage) -> String {
    format!("[{}] {}", stage.status.glyph(), stage.name)
}
