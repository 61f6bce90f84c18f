//! Native `rhai` functions a formula's rewritten source calls into:
//! `cell(row, col)` for a bare reference, and `sum_range`/`avg_range`/
//! `min_range`/`max_range`/`count_range` for the range functions
//! `preprocess::rewrite_references` expands `SUM(A1:B5)` etc. into.
//!
//! Grounded on the teacher's `src/builtins.rs` `register_builtins`, minus
//! the cross-sheet/named-range lookups that have no counterpart here.

use rhai::{Engine, EvalAltResult, NativeCallContext};

use crate::cell::CellContent;
use crate::formula::raise;
use crate::lookup::{numeric_lookup, Cells};
use crate::position::Position;

/// Build a fresh engine with every native function registered against
/// `cells`. One engine is built per `Sheet` and reused for every
/// evaluation, so native closures capture the shared handle once.
pub fn build_engine(cells: Cells) -> Engine {
    let mut engine = Engine::new();
    register(&mut engine, cells);
    engine
}

fn register(engine: &mut Engine, cells: Cells) {
    let lookup_cells = cells.clone();
    engine.register_fn(
        "cell",
        move |ctx: NativeCallContext, row: i64, col: i64| -> Result<f64, Box<EvalAltResult>> {
            numeric_lookup(Position::new(row as u32, col as u32), &lookup_cells, ctx.engine())
                .map_err(raise)
        },
    );

    register_range(engine, cells.clone(), "sum_range", |values| values.iter().sum());
    register_range(engine, cells.clone(), "avg_range", |values| {
        if values.is_empty() {
            0.0
        } else {
            values.iter().sum::<f64>() / values.len() as f64
        }
    });
    register_range(engine, cells.clone(), "min_range", |values| {
        if values.is_empty() {
            0.0
        } else {
            values.iter().cloned().fold(f64::INFINITY, f64::min)
        }
    });
    register_range(engine, cells.clone(), "max_range", |values| {
        if values.is_empty() {
            0.0
        } else {
            values.iter().cloned().fold(f64::NEG_INFINITY, f64::max)
        }
    });
    register_count_range(engine, cells);
}

fn range_values(
    cells: &Cells,
    engine: &Engine,
    r1: i64,
    c1: i64,
    r2: i64,
    c2: i64,
) -> Result<Vec<f64>, Box<EvalAltResult>> {
    let (min_row, max_row) = (r1.min(r2) as u32, r1.max(r2) as u32);
    let (min_col, max_col) = (c1.min(c2) as u32, c1.max(c2) as u32);
    let mut values = Vec::new();
    for row in min_row..=max_row {
        for col in min_col..=max_col {
            let value = numeric_lookup(Position::new(row, col), cells, engine).map_err(raise)?;
            values.push(value);
        }
    }
    Ok(values)
}

fn register_range(
    engine: &mut Engine,
    cells: Cells,
    name: &'static str,
    agg: impl Fn(&[f64]) -> f64 + 'static,
) {
    engine.register_fn(
        name,
        move |ctx: NativeCallContext, r1: i64, c1: i64, r2: i64, c2: i64| -> Result<f64, Box<EvalAltResult>> {
            let values = range_values(&cells, ctx.engine(), r1, c1, r2, c2)?;
            Ok(agg(&values))
        },
    );
}

/// `count_range` counts occupied (non-`Empty`) cells in the range; unlike
/// the other range functions it never reads a value, so it never raises.
fn register_count_range(engine: &mut Engine, cells: Cells) {
    engine.register_fn(
        "count_range",
        move |r1: i64, c1: i64, r2: i64, c2: i64| -> f64 {
            let (min_row, max_row) = (r1.min(r2) as u32, r1.max(r2) as u32);
            let (min_col, max_col) = (c1.min(c2) as u32, c1.max(c2) as u32);
            let cells_ref = cells.borrow();
            let mut count = 0.0;
            for row in min_row..=max_row {
                for col in min_col..=max_col {
                    if let Some(cell) = cells_ref.get(&Position::new(row, col)) {
                        if !matches!(cell.content, CellContent::Empty) {
                            count += 1.0;
                        }
                    }
                }
            }
            count
        },
    );
}
