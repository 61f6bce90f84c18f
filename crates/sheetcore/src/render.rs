use sheetcore_engine::{CellValue, Position};

use crate::sheet::Sheet;

/// The smallest rectangle, anchored at `(0, 0)`, that contains every
/// occupied cell. `(0, 0)` when the sheet has no content at all.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Size {
    pub rows: u32,
    pub cols: u32,
}

impl Sheet {
    /// Bounding box of every non-empty cell, one past its highest
    /// occupied row/column — the shape `render_values`/`render_texts`
    /// iterate over.
    pub fn printable_size(&self) -> Size {
        let mut rows = 0u32;
        let mut cols = 0u32;
        for pos in self.occupied_positions() {
            rows = rows.max(pos.row + 1);
            cols = cols.max(pos.col + 1);
        }
        Size { rows, cols }
    }

    /// Evaluated values over the printable rectangle, row-major.
    pub fn render_values(&self) -> Vec<Vec<CellValue>> {
        let size = self.printable_size();
        (0..size.rows)
            .map(|row| {
                (0..size.cols)
                    .map(|col| {
                        self.get_value(Position::new(row, col))
                            .expect("positions within printable_size are always valid")
                    })
                    .collect()
            })
            .collect()
    }

    /// Raw input text over the printable rectangle, row-major.
    pub fn render_texts(&self) -> Vec<Vec<String>> {
        let size = self.printable_size();
        (0..size.rows)
            .map(|row| {
                (0..size.cols)
                    .map(|col| {
                        self.get_text(Position::new(row, col))
                            .expect("positions within printable_size are always valid")
                    })
                    .collect()
            })
            .collect()
    }

    /// The printable rectangle's evaluated values, serialized as
    /// tab-separated columns with a `\n` terminator on every row —
    /// `PrintValues`'s actual output, not just the grid `render_values`
    /// builds it from.
    pub fn print_values(&self) -> String {
        join_rows(self.render_values(), |value| value.to_string())
    }

    /// The printable rectangle's raw input text, same tab/`\n` shape as
    /// `print_values`.
    pub fn print_texts(&self) -> String {
        join_rows(self.render_texts(), |text| text.clone())
    }

    fn occupied_positions(&self) -> Vec<Position> {
        self.cells_snapshot()
            .into_iter()
            .filter(|(_, empty)| !empty)
            .map(|(pos, _)| pos)
            .collect()
    }
}

fn join_rows<T>(rows: Vec<Vec<T>>, cell_text: impl Fn(&T) -> String) -> String {
    let mut out = String::new();
    for row in &rows {
        for (i, cell) in row.iter().enumerate() {
            if i > 0 {
                out.push('\t');
            }
            out.push_str(&cell_text(cell));
        }
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pos(text: &str) -> Position {
        text.parse().unwrap()
    }

    #[test]
    fn printable_size_tracks_furthest_occupied_cell() {
        let mut sheet = Sheet::new();
        assert_eq!(sheet.printable_size(), Size { rows: 0, cols: 0 });
        sheet.set_cell(pos("B3"), "x").unwrap();
        assert_eq!(sheet.printable_size(), Size { rows: 3, cols: 2 });
    }

    #[test]
    fn render_values_fills_gaps_with_empty_text() {
        let mut sheet = Sheet::new();
        sheet.set_cell(pos("A1"), "1").unwrap();
        sheet.set_cell(pos("B2"), "2").unwrap();
        let grid = sheet.render_values();
        assert_eq!(grid.len(), 2);
        assert_eq!(grid[0].len(), 2);
        assert_eq!(grid[0][1], CellValue::Text(String::new()));
    }

    #[test]
    fn render_texts_reflects_formula_source() {
        let mut sheet = Sheet::new();
        sheet.set_cell(pos("A1"), "=1+1").unwrap();
        let grid = sheet.render_texts();
        assert_eq!(grid[0][0], "=1+1");
    }

    #[test]
    fn print_texts_emits_tab_separated_newline_terminated_rectangle() {
        let mut sheet = Sheet::new();
        sheet.set_cell(pos("A1"), "x").unwrap();
        sheet.set_cell(pos("B2"), "y").unwrap();
        assert_eq!(sheet.print_texts(), "x\t\n\ty\n");
    }

    #[test]
    fn print_values_renders_numbers_in_default_form() {
        let mut sheet = Sheet::new();
        sheet.set_cell(pos("A1"), "1").unwrap();
        sheet.set_cell(pos("B1"), "=A1+2").unwrap();
        assert_eq!(sheet.print_values(), "1\t3\n");
    }

    #[test]
    fn print_values_surfaces_latched_errors() {
        let mut sheet = Sheet::new();
        sheet.set_cell(pos("A1"), "=1/0").unwrap();
        assert_eq!(sheet.print_values(), "#ARITHM!\n");
    }
}
