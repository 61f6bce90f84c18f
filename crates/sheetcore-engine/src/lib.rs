//! Cell-local mechanics for the `sheetcore` spreadsheet engine: cell
//! positions, content classification, formula parsing/evaluation, the
//! numeric lookup contract references resolve through, and cycle
//! detection. `Sheet`, in the `sheetcore` crate, owns the cell map and
//! every cross-cell operation built on top of these primitives.

mod builtins;
pub mod cell;
pub mod cycle;
pub mod error;
pub mod formula;
pub mod lookup;
pub mod position;
mod preprocess;

pub use builtins::build_engine;
pub use cell::{Cell, CellContent, CellValue};
pub use cycle::would_cycle;
pub use error::{FormulaError, FormulaSyntaxError};
pub use formula::FormulaProgram;
pub use lookup::{formula_cached_value, numeric_lookup, Cells};
pub use position::{Position, MAX_COLS, MAX_ROWS};

pub use rhai::Engine;
