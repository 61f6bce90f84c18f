//! Cycle detection over the cell dependency graph.

use std::collections::{HashMap, HashSet};

use crate::cell::Cell;
use crate::position::Position;

enum Frame {
    Enter(Position),
    Leave(Position),
}

/// Would installing a cell at `start` with dependencies `candidate_refs`
/// create a cycle, given the dependencies already recorded on `cells`?
/// `start`'s own (not-yet-installed) content is not in `cells`, so its
/// candidate references are supplied separately.
///
/// Iterative DFS over the reachable subgraph: `in_path` is the gray set
/// (ancestors on the current path — a repeat here is a back edge, i.e. a
/// cycle), `done` is the black set (fully explored, safe to skip), giving
/// O(V+E) detection instead of re-exploring shared subgraphs once per
/// incoming path.
pub fn would_cycle(
    start: Position,
    candidate_refs: &[Position],
    cells: &HashMap<Position, Cell>,
) -> bool {
    let mut in_path: HashSet<Position> = HashSet::from([start]);
    let mut done: HashSet<Position> = HashSet::new();
    let mut stack: Vec<Frame> = candidate_refs.iter().map(|&p| Frame::Enter(p)).collect();

    while let Some(frame) = stack.pop() {
        match frame {
            Frame::Enter(pos) => {
                if pos == start || in_path.contains(&pos) {
                    return true;
                }
                if done.contains(&pos) {
                    continue;
                }
                in_path.insert(pos);
                stack.push(Frame::Leave(pos));
                if let Some(cell) = cells.get(&pos) {
                    for &next in cell.referenced_cells() {
                        stack.push(Frame::Enter(next));
                    }
                }
            }
            Frame::Leave(pos) => {
                in_path.remove(&pos);
                done.insert(pos);
            }
        }
    }
    false
}
