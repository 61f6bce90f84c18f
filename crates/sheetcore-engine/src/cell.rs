use std::collections::BTreeSet;
use std::fmt;

use crate::error::{FormulaError, FormulaSyntaxError};
use crate::formula::FormulaProgram;
use crate::position::Position;

/// Tagged content of one cell: nothing, literal text, or a parsed
/// formula. Mirrors the teacher's `CellType`, minus the variants
/// (`Array`, `Spill`) that have no counterpart here.
#[derive(Clone)]
pub enum CellContent {
    Empty,
    Text(String),
    Formula(FormulaProgram),
}

impl CellContent {
    /// Classify raw input text per the `Set` rules: an empty string is
    /// `Empty`; text beginning with `=` and longer than one character is
    /// a `Formula` (a lone `"="` does not count — it's text); anything
    /// else is `Text` verbatim, including a leading `'` escape.
    pub fn classify(input: &str) -> Result<CellContent, FormulaSyntaxError> {
        if input.is_empty() {
            return Ok(CellContent::Empty);
        }
        if input.starts_with('=') && input.len() > 1 {
            let program = FormulaProgram::parse(&input[1..])?;
            return Ok(CellContent::Formula(program));
        }
        Ok(CellContent::Text(input.to_string()))
    }

    /// The text `GetText` would return for this content: empty, the
    /// literal text, or `=<canonical expression>`.
    pub fn display_text(&self) -> String {
        match self {
            CellContent::Empty => String::new(),
            CellContent::Text(s) => s.clone(),
            CellContent::Formula(f) => format!("={}", f.canonical_expression()),
        }
    }

    pub fn referenced_cells(&self) -> &[Position] {
        match self {
            CellContent::Formula(f) => f.referenced_cells(),
            _ => &[],
        }
    }

    /// A `Text` cell's raw value with a single leading escape apostrophe
    /// stripped, used both for display-as-number lookups and as the
    /// `GetValue` result of a text cell.
    pub fn text_raw_value(s: &str) -> &str {
        s.strip_prefix('\'').unwrap_or(s)
    }
}

/// The tagged result of evaluating a cell: a number, literal text, or a
/// latched formula-evaluation failure.
#[derive(Clone, Debug, PartialEq)]
pub enum CellValue {
    Number(f64),
    Text(String),
    Error(FormulaError),
}

impl fmt::Display for CellValue {
    /// A cell's printable rendering: a number in its default `f64`
    /// textual form, literal text verbatim, or an error's `#`-token.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Number(n) => write!(f, "{n}"),
            CellValue::Text(s) => write!(f, "{s}"),
            CellValue::Error(e) => write!(f, "{e}"),
        }
    }
}

/// One occupied grid slot. `Sheet` owns the map of these; `Cell` itself
/// never reaches into sibling cells — all cross-cell orchestration
/// (dependency edges, cycle checks, cache invalidation) lives on `Sheet`.
#[derive(Clone)]
pub struct Cell {
    pub position: Position,
    pub content: CellContent,
    pub(crate) cache: Option<Result<f64, FormulaError>>,
    /// Positions of cells whose formulas reference this one. Owned here,
    /// not in a sheet-wide reverse map, following the original's
    /// per-cell `upper_references_`.
    pub upper_references: BTreeSet<Position>,
}

impl Cell {
    pub fn empty(position: Position) -> Cell {
        Cell {
            position,
            content: CellContent::Empty,
            cache: None,
            upper_references: BTreeSet::new(),
        }
    }

    pub fn display_text(&self) -> String {
        self.content.display_text()
    }

    pub fn referenced_cells(&self) -> &[Position] {
        self.content.referenced_cells()
    }

    pub fn is_referenced(&self) -> bool {
        !self.upper_references.is_empty()
    }

    pub fn is_empty_content(&self) -> bool {
        matches!(self.content, CellContent::Empty)
    }

    /// Drop this cell's memoized value, if any, forcing the next lookup
    /// to re-evaluate. Used by `Sheet` to invalidate dependents on write.
    pub fn invalidate_cache(&mut self) {
        self.cache = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_empty_text_and_formula() {
        assert!(matches!(CellContent::classify("").unwrap(), CellContent::Empty));
        assert!(matches!(CellContent::classify("hello").unwrap(), CellContent::Text(_)));
        assert!(matches!(CellContent::classify("=").unwrap(), CellContent::Text(_)));
        assert!(matches!(
            CellContent::classify("=1+2").unwrap(),
            CellContent::Formula(_)
        ));
    }

    #[test]
    fn rejects_malformed_formula_at_classify_time() {
        assert!(CellContent::classify("=ZZZZ1+1").is_err());
    }

    #[test]
    fn strips_single_leading_apostrophe() {
        assert_eq!(CellContent::text_raw_value("'123"), "123");
        assert_eq!(CellContent::text_raw_value("''123"), "'123");
        assert_eq!(CellContent::text_raw_value("123"), "123");
    }

    #[test]
    fn cell_value_renders_in_default_numeric_form() {
        assert_eq!(CellValue::Number(3.0).to_string(), "3");
        assert_eq!(CellValue::Number(3.5).to_string(), "3.5");
        assert_eq!(CellValue::Text("hi".to_string()).to_string(), "hi");
        assert_eq!(CellValue::Error(FormulaError::Ref).to_string(), "#REF!");
    }
}
