use std::fmt;

/// A latched formula-evaluation failure (`spec.md` §4.2/§4.5). Unlike
/// [`FormulaSyntaxError`], this is a *value*: it is stored in a cell's
/// cache and rendered like any other content, never raised out of
/// `Sheet::get_value`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FormulaError {
    /// A reference resolved to an invalid or out-of-range position.
    Ref,
    /// A referenced cell's text content does not fully parse as a number.
    Value,
    /// Evaluation produced a non-finite result (division by zero, etc).
    Arithmetic,
}

impl FormulaError {
    pub fn token(&self) -> &'static str {
        match self {
            FormulaError::Ref => "#REF!",
            FormulaError::Value => "#VALUE!",
            FormulaError::Arithmetic => "#ARITHM!",
        }
    }
}

impl fmt::Display for FormulaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

/// Raised when formula text fails to parse at `Set` time: malformed
/// syntax, or a reference that is not a well-formed in-range position.
/// Structural, unlike [`FormulaError`] — it is never stored in a cell.
#[derive(Debug, Clone, thiserror::Error)]
#[error("formula syntax error: {0}")]
pub struct FormulaSyntaxError(pub String);
