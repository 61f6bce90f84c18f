use std::cell::{Ref, RefCell};
use std::collections::{HashMap, HashSet};
use std::rc::Rc;

use sheetcore_engine::{
    formula_cached_value, would_cycle, Cell, CellContent, CellValue, Engine, Position,
};

use crate::error::SheetError;

/// An in-memory spreadsheet: a sparse map of occupied cells plus one
/// `rhai` engine shared by every formula cell's evaluation. Dependency
/// edges are owned per-cell (`Cell::upper_references`); `Sheet` is the
/// only thing that ever mutates more than one cell at a time, keeping
/// `sheetcore-engine`'s types free of cross-cell knowledge.
pub struct Sheet {
    cells: Rc<RefCell<HashMap<Position, Cell>>>,
    engine: Engine,
}

impl Sheet {
    pub fn new() -> Sheet {
        let cells: Rc<RefCell<HashMap<Position, Cell>>> = Rc::new(RefCell::new(HashMap::new()));
        let engine = sheetcore_engine::build_engine(cells.clone());
        Sheet { cells, engine }
    }

    /// Parse and install `text` at `pos`. Either fully succeeds or leaves
    /// the sheet exactly as it was: the cycle check runs against the
    /// *candidate* content before any cell is touched.
    pub fn set_cell(&mut self, pos: Position, text: &str) -> Result<(), SheetError> {
        if !pos.is_valid() {
            return Err(SheetError::InvalidPosition(pos));
        }
        let content = CellContent::classify(text)?;
        let new_refs = content.referenced_cells().to_vec();

        if would_cycle(pos, &new_refs, &self.cells.borrow()) {
            return Err(SheetError::CircularDependency(pos));
        }

        let old_refs: Vec<Position> = self
            .cells
            .borrow()
            .get(&pos)
            .map(|c| c.referenced_cells().to_vec())
            .unwrap_or_default();

        {
            let mut cells = self.cells.borrow_mut();
            for old in old_refs.iter().filter(|old| !new_refs.contains(old)) {
                if let Some(dependency) = cells.get_mut(old) {
                    dependency.upper_references.remove(&pos);
                }
            }
            for new_ref in &new_refs {
                cells
                    .entry(*new_ref)
                    .or_insert_with(|| Cell::empty(*new_ref))
                    .upper_references
                    .insert(pos);
            }
            let cell = cells.entry(pos).or_insert_with(|| Cell::empty(pos));
            cell.content = content;
            cell.invalidate_cache();
        }

        self.invalidate_dependents(pos);
        Ok(())
    }

    /// Clear `pos`'s content. A cell still referenced by another formula
    /// stays in the map as an `Empty` placeholder (so `upper_references`
    /// bookkeeping on its dependents remains valid); an unreferenced cell
    /// is dropped entirely.
    pub fn clear_cell(&mut self, pos: Position) -> Result<(), SheetError> {
        if !pos.is_valid() {
            return Err(SheetError::InvalidPosition(pos));
        }

        let old_refs: Vec<Position> = self
            .cells
            .borrow()
            .get(&pos)
            .map(|c| c.referenced_cells().to_vec())
            .unwrap_or_default();

        let keep_as_placeholder = {
            let mut cells = self.cells.borrow_mut();
            for old in &old_refs {
                if let Some(dependency) = cells.get_mut(old) {
                    dependency.upper_references.remove(&pos);
                }
            }
            let is_referenced = cells.get(&pos).map(|c| c.is_referenced()).unwrap_or(false);
            if is_referenced {
                if let Some(cell) = cells.get_mut(&pos) {
                    cell.content = CellContent::Empty;
                    cell.invalidate_cache();
                }
            } else {
                cells.remove(&pos);
            }
            is_referenced
        };
        let _ = keep_as_placeholder;

        self.invalidate_dependents(pos);
        Ok(())
    }

    /// `pos`'s evaluated value: a number, text, or a latched formula
    /// error. An occupied `Empty` cell evaluates to `0.0`, same as any
    /// other spreadsheet's blank-cell arithmetic; a wholly unoccupied
    /// slot (no `Cell` materialized at all) reads as empty text — that's
    /// a render-layer convenience, not part of `Cell::GetValue`'s
    /// contract.
    pub fn get_value(&self, pos: Position) -> Result<CellValue, SheetError> {
        if !pos.is_valid() {
            return Err(SheetError::InvalidPosition(pos));
        }
        let content = self.cells.borrow().get(&pos).map(|c| c.content.clone());
        Ok(match content {
            None => CellValue::Text(String::new()),
            Some(CellContent::Empty) => CellValue::Number(0.0),
            Some(CellContent::Text(s)) => {
                CellValue::Text(CellContent::text_raw_value(&s).to_string())
            }
            Some(CellContent::Formula(_)) => {
                match formula_cached_value(pos, &self.cells, &self.engine) {
                    Ok(value) => CellValue::Number(value),
                    Err(error) => CellValue::Error(error),
                }
            }
        })
    }

    /// `pos`'s raw input text, as `Set` would need to see it again to
    /// reproduce the same content: empty, literal text, or `=<formula>`.
    pub fn get_text(&self, pos: Position) -> Result<String, SheetError> {
        if !pos.is_valid() {
            return Err(SheetError::InvalidPosition(pos));
        }
        Ok(self
            .cells
            .borrow()
            .get(&pos)
            .map(|c| c.display_text())
            .unwrap_or_default())
    }

    /// The cell occupying `pos`, or `None` if the slot is unoccupied —
    /// the null-reference case `spec.md` §4.4 describes. Exposes
    /// `Cell::is_referenced`/`display_text`/`referenced_cells` to callers
    /// without handing out the underlying cell map.
    pub fn get_cell(&self, pos: Position) -> Result<Option<Ref<'_, Cell>>, SheetError> {
        if !pos.is_valid() {
            return Err(SheetError::InvalidPosition(pos));
        }
        Ok(Ref::filter_map(self.cells.borrow(), |cells| cells.get(&pos)).ok())
    }

    /// Every cell `pos`'s formula (if any) reads from.
    pub fn referenced_cells(&self, pos: Position) -> Vec<Position> {
        self.cells
            .borrow()
            .get(&pos)
            .map(|c| c.referenced_cells().to_vec())
            .unwrap_or_default()
    }

    /// Every position the sheet has an entry for, paired with whether
    /// that entry's content is `Empty` (used by `render.rs` to compute
    /// the printable rectangle without exposing the cell map itself).
    pub(crate) fn cells_snapshot(&self) -> Vec<(Position, bool)> {
        self.cells
            .borrow()
            .values()
            .map(|c| (c.position, c.is_empty_content()))
            .collect()
    }

    /// Drop every formula cell's cached value reachable from `start`
    /// through `upper_references` (i.e. everything that transitively
    /// depends on `start`, not `start` itself).
    fn invalidate_dependents(&self, start: Position) {
        let mut stack: Vec<Position> = self
            .cells
            .borrow()
            .get(&start)
            .map(|c| c.upper_references.iter().cloned().collect())
            .unwrap_or_default();
        let mut seen: HashSet<Position> = stack.iter().cloned().collect();

        while let Some(pos) = stack.pop() {
            if let Some(cell) = self.cells.borrow_mut().get_mut(&pos) {
                cell.invalidate_cache();
            }
            let next: Vec<Position> = self
                .cells
                .borrow()
                .get(&pos)
                .map(|c| c.upper_references.iter().cloned().collect())
                .unwrap_or_default();
            for up in next {
                if seen.insert(up) {
                    stack.push(up);
                }
            }
        }
    }
}

impl Default for Sheet {
    fn default() -> Sheet {
        Sheet::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pos(text: &str) -> Position {
        text.parse().unwrap()
    }

    #[test]
    fn set_then_get_text_round_trips() {
        let mut sheet = Sheet::new();
        sheet.set_cell(pos("A1"), "hello").unwrap();
        assert_eq!(sheet.get_text(pos("A1")).unwrap(), "hello");
        assert_eq!(sheet.get_value(pos("A1")).unwrap(), CellValue::Text("hello".to_string()));
    }

    #[test]
    fn formula_reads_referenced_cell() {
        let mut sheet = Sheet::new();
        sheet.set_cell(pos("A1"), "2").unwrap();
        sheet.set_cell(pos("B1"), "=A1*3").unwrap();
        assert_eq!(sheet.get_value(pos("B1")).unwrap(), CellValue::Number(6.0));
    }

    #[test]
    fn rejects_self_reference_without_mutating() {
        let mut sheet = Sheet::new();
        let err = sheet.set_cell(pos("A1"), "=A1+1");
        assert!(matches!(err, Err(SheetError::CircularDependency(_))));
        assert_eq!(sheet.get_text(pos("A1")).unwrap(), "");
    }

    #[test]
    fn rejects_indirect_cycle() {
        let mut sheet = Sheet::new();
        sheet.set_cell(pos("B1"), "=A1").unwrap();
        let err = sheet.set_cell(pos("A1"), "=B1");
        assert!(matches!(err, Err(SheetError::CircularDependency(_))));
    }

    #[test]
    fn edits_invalidate_transitive_dependents() {
        let mut sheet = Sheet::new();
        sheet.set_cell(pos("A1"), "1").unwrap();
        sheet.set_cell(pos("B1"), "=A1+1").unwrap();
        sheet.set_cell(pos("C1"), "=B1+1").unwrap();
        assert_eq!(sheet.get_value(pos("C1")).unwrap(), CellValue::Number(3.0));

        sheet.set_cell(pos("A1"), "10").unwrap();
        assert_eq!(sheet.get_value(pos("C1")).unwrap(), CellValue::Number(12.0));
    }

    #[test]
    fn clear_with_remaining_dependent_keeps_placeholder() {
        let mut sheet = Sheet::new();
        sheet.set_cell(pos("A1"), "1").unwrap();
        sheet.set_cell(pos("B1"), "=A1+1").unwrap();
        sheet.clear_cell(pos("A1")).unwrap();
        assert_eq!(sheet.get_value(pos("B1")).unwrap(), CellValue::Number(1.0));
        assert_eq!(sheet.get_text(pos("A1")).unwrap(), "");
    }

    #[test]
    fn set_then_clear_is_neutral_for_unreferenced_cell() {
        let mut sheet = Sheet::new();
        sheet.set_cell(pos("A1"), "hello").unwrap();
        sheet.clear_cell(pos("A1")).unwrap();
        assert_eq!(sheet.referenced_cells(pos("B1")), Vec::<Position>::new());
        assert_eq!(sheet.get_text(pos("A1")).unwrap(), "");
    }

    #[test]
    fn division_by_zero_is_a_latched_error_value() {
        let mut sheet = Sheet::new();
        sheet.set_cell(pos("A1"), "=1/0").unwrap();
        assert_eq!(
            sheet.get_value(pos("A1")).unwrap(),
            CellValue::Error(sheetcore_engine::FormulaError::Arithmetic)
        );
    }

    #[test]
    fn get_cell_reports_occupancy_and_is_referenced() {
        let mut sheet = Sheet::new();
        assert!(sheet.get_cell(pos("A1")).unwrap().is_none());

        sheet.set_cell(pos("A1"), "1").unwrap();
        sheet.set_cell(pos("B1"), "=A1+1").unwrap();

        let a1 = sheet.get_cell(pos("A1")).unwrap().unwrap();
        assert!(a1.is_referenced());
        assert_eq!(a1.display_text(), "1");
        drop(a1);

        let b1 = sheet.get_cell(pos("B1")).unwrap().unwrap();
        assert!(!b1.is_referenced());
        assert_eq!(b1.referenced_cells(), &[pos("A1")]);
    }

    #[test]
    fn invalid_position_is_rejected() {
        let mut sheet = Sheet::new();
        let bad = Position::new(sheetcore_engine::MAX_ROWS, 0);
        assert!(matches!(sheet.set_cell(bad, "1"), Err(SheetError::InvalidPosition(_))));
        assert!(matches!(sheet.get_value(bad), Err(SheetError::InvalidPosition(_))));
    }
}
