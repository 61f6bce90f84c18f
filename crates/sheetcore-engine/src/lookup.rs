//! The numeric lookup contract every cell reference resolves through
//! (`spec.md` §4.2), and the shared cache-or-evaluate path that keeps a
//! formula cell's value coherent everywhere it's read from — both
//! `Sheet::get_value` and nested `cell()`/range lookups from other
//! formulas funnel through [`formula_cached_value`], so a cell with
//! multiple dependents is evaluated at most once between invalidations.
//! The teacher's `cell()`/`value()` native functions re-evaluate nested
//! formula text from scratch instead; this is a deliberate fix, not a
//! faithful port.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use rhai::Engine;

use crate::cell::{Cell, CellContent};
use crate::error::FormulaError;
use crate::position::Position;

/// The shared, single-threaded cell map every `Sheet` and its `rhai`
/// engine's native functions hold a handle to.
pub type Cells = Rc<RefCell<HashMap<Position, Cell>>>;

/// Resolve one cell reference to a number: invalid position -> `Ref`,
/// absent cell -> `0.0`, numeric/empty content -> that number, text
/// content -> full-string parse (`Value` on failure), a formula cell ->
/// its cached or freshly evaluated value (including a cached error).
pub fn numeric_lookup(pos: Position, cells: &Cells, engine: &Engine) -> Result<f64, FormulaError> {
    if !pos.is_valid() {
        return Err(FormulaError::Ref);
    }

    let needs_eval = matches!(
        cells.borrow().get(&pos).map(|c| &c.content),
        Some(CellContent::Formula(_))
    );
    if needs_eval {
        return formula_cached_value(pos, cells, engine);
    }

    let cells_ref = cells.borrow();
    match cells_ref.get(&pos).map(|c| &c.content) {
        None | Some(CellContent::Empty) => Ok(0.0),
        Some(CellContent::Text(s)) => CellContent::text_raw_value(s)
            .trim()
            .parse::<f64>()
            .map_err(|_| FormulaError::Value),
        Some(CellContent::Formula(_)) => unreachable!("handled above"),
    }
}

/// A formula cell's memoized value, evaluating and caching it on first
/// access. The recursion into `program.evaluate`, and from there back
/// into this function via the engine's `cell`/range native functions,
/// never overlaps an active `RefCell` borrow — every borrow here is
/// dropped before calling into the engine.
pub fn formula_cached_value(pos: Position, cells: &Cells, engine: &Engine) -> Result<f64, FormulaError> {
    if let Some(cached) = cells.borrow().get(&pos).and_then(|c| c.cache.clone()) {
        return cached;
    }

    let program = match cells.borrow().get(&pos).map(|c| c.content.clone()) {
        Some(CellContent::Formula(program)) => program,
        _ => return Ok(0.0),
    };

    let result = program.evaluate(engine);
    if let Some(cell) = cells.borrow_mut().get_mut(&pos) {
        cell.cache = Some(result);
    }
    result
}
