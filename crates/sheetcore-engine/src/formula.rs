//! A parsed, ready-to-evaluate formula.
//!
//! `spec.md` §4.2 specifies `Evaluate` as taking a caller-supplied lookup
//! function. A literal closure parameter doesn't fit `rhai`'s registered
//! native functions (which must be `'static`), so instead `Sheet` builds
//! one `rhai::Engine` whose native `cell`/`sum_range`/etc. functions close
//! over the shared cell map, and `FormulaProgram::evaluate` takes that
//! already-built engine. Same contract, idiomatic shape — see `builtins.rs`.

use rhai::{Dynamic, Engine, EvalAltResult};

use crate::error::{FormulaError, FormulaSyntaxError};
use crate::position::Position;
use crate::preprocess::{coerce_float_literals, extract_references, rewrite_references};

/// A compiled formula plus the information needed without re-parsing: its
/// canonical source text (for `GetText`) and the positions it reads from
/// (for dependency-graph maintenance).
#[derive(Clone)]
pub struct FormulaProgram {
    ast: rhai::AST,
    canonical: String,
    references: Vec<Position>,
}

impl FormulaProgram {
    /// Parse formula text (the part after the leading `=`). Validates
    /// every cell reference and the resulting expression's syntax;
    /// failure is always a [`FormulaSyntaxError`], never a latched value.
    pub fn parse(expr: &str) -> Result<FormulaProgram, FormulaSyntaxError> {
        let canonical = expr.trim().to_string();
        let references = extract_references(&canonical)
            .map_err(|bad| FormulaSyntaxError(format!("invalid cell reference '{bad}'")))?;

        let coerced = coerce_float_literals(&canonical);
        let rewritten = rewrite_references(&coerced);

        let engine = Engine::new();
        let ast = engine
            .compile_expression(&rewritten)
            .map_err(|e| FormulaSyntaxError(e.to_string()))?;

        Ok(FormulaProgram {
            ast,
            canonical,
            references,
        })
    }

    /// The trimmed, verbatim source text this program was parsed from —
    /// what `GetText` prefixes with `=`.
    pub fn canonical_expression(&self) -> &str {
        &self.canonical
    }

    /// Every position this formula reads from, deduplicated and sorted.
    /// Range functions contribute every cell in the range, not just the
    /// endpoints.
    pub fn referenced_cells(&self) -> &[Position] {
        &self.references
    }

    /// Run the program against an already-built engine (see module docs).
    /// A non-finite numeric result (division by zero, etc.) becomes
    /// [`FormulaError::Arithmetic`]; anything the engine raises through a
    /// `cell`/range native function is classified by
    /// [`classify_runtime_error`].
    pub fn evaluate(&self, engine: &Engine) -> Result<f64, FormulaError> {
        let mut scope = rhai::Scope::new();
        let result = engine
            .eval_ast_with_scope::<Dynamic>(&mut scope, &self.ast)
            .map_err(|err| classify_runtime_error(&err))?;
        let value = result.as_float().map_err(|_| FormulaError::Value)?;
        if value.is_finite() {
            Ok(value)
        } else {
            Err(FormulaError::Arithmetic)
        }
    }
}

fn classify_runtime_error(err: &EvalAltResult) -> FormulaError {
    if let EvalAltResult::ErrorRuntime(value, _) = err {
        if let Some(tag) = value.clone().into_string().ok() {
            return match tag.as_str() {
                "#REF!" => FormulaError::Ref,
                "#VALUE!" => FormulaError::Value,
                _ => FormulaError::Arithmetic,
            };
        }
    }
    FormulaError::Value
}

/// Construct the runtime error a `cell`/range native function raises to
/// propagate a [`FormulaError`] back through `rhai`.
pub(crate) fn raise(error: FormulaError) -> Box<EvalAltResult> {
    Box::new(EvalAltResult::ErrorRuntime(
        Dynamic::from(error.token().to_string()),
        rhai::Position::NONE,
    ))
}
