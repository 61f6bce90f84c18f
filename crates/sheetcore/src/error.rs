use sheetcore_engine::{FormulaSyntaxError, Position};

/// Everything a `Sheet` operation can fail with. `Display` messages are
/// plain and user-facing, matching the teacher's `GridlineError` style.
#[derive(Debug, thiserror::Error)]
pub enum SheetError {
    #[error("position {0} is out of range")]
    InvalidPosition(Position),
    #[error(transparent)]
    FormulaSyntax(#[from] FormulaSyntaxError),
    #[error("setting {0} would create a circular dependency")]
    CircularDependency(Position),
}
