//! An in-memory spreadsheet engine: a sparse grid of cells holding
//! literal text or `rhai`-backed formulas, with automatic dependency
//! tracking, cycle rejection, and lazy memoized recomputation.
//!
//! ```
//! use sheetcore::Sheet;
//!
//! let mut sheet = Sheet::new();
//! sheet.set_cell("A1".parse().unwrap(), "2").unwrap();
//! sheet.set_cell("B1".parse().unwrap(), "=A1*3").unwrap();
//! assert_eq!(sheet.get_text("B1".parse().unwrap()).unwrap(), "=A1*3");
//! ```

mod error;
mod render;
mod sheet;

pub use error::SheetError;
pub use render::Size;
pub use sheet::Sheet;

pub use sheetcore_engine::{Cell, CellValue, FormulaError, Position};
