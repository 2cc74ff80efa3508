//! Breadth-first reference solver.
//!
//! Explores robot configurations level by level, so the first solved
//! configuration it meets is reached by a shortest move sequence. Visited
//! configurations are packed keys and each node points at its parent by
//! index, so the node list doubles as the queue.

use std::collections::HashSet;

use roboyard_core::{Board, Direction, Move};
use tracing::debug;

use crate::state::{Cell, Key, SearchBoard};
use crate::{CancelFlag, Solve, SolveFailure};

/// Default move limit.
pub const DEFAULT_MAX_DEPTH: usize = 20;

/// Default limit on distinct configurations kept in memory.
pub const DEFAULT_MAX_STATES: usize = 4_000_000;

/// Shortest-path solver over robot configurations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BreadthFirstSolver {
    max_depth: usize,
    max_states: usize,
}

impl BreadthFirstSolver {
    /// Creates a solver that gives up beyond `max_depth` moves.
    #[must_use]
    pub const fn new(max_depth: usize) -> Self {
        Self {
            max_depth,
            max_states: DEFAULT_MAX_STATES,
        }
    }

    /// Caps the number of configurations explored.
    #[must_use]
    pub const fn with_max_states(mut self, max_states: usize) -> Self {
        self.max_states = max_states;
        self
    }

    /// The move limit.
    #[must_use]
    pub const fn max_depth(&self) -> usize {
        self.max_depth
    }
}

impl Default for BreadthFirstSolver {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_DEPTH)
    }
}

#[derive(Clone, Copy)]
struct Node {
    key: Key,
    parent: usize,
    step: Option<(Cell, Direction)>,
    depth: usize,
}

impl Solve for BreadthFirstSolver {
    fn solve(&self, board: &Board, cancel: &CancelFlag) -> Result<Vec<Move>, SolveFailure> {
        if board.targets().is_empty() {
            return Err(SolveFailure::no_solution("board has no targets"));
        }

        let model = SearchBoard::new(board);
        let start = model.start(board);
        if model.is_solved(&start) {
            return Ok(Vec::new());
        }

        let mut seen = HashSet::new();
        seen.insert(SearchBoard::key(&start));
        let mut nodes = vec![Node {
            key: SearchBoard::key(&start),
            parent: 0,
            step: None,
            depth: 0,
        }];

        let mut cursor = 0;
        while let Some(&node) = nodes.get(cursor) {
            if cancel.is_cancelled() {
                debug!(explored = nodes.len(), "Search cancelled");
                return Err(SolveFailure::Cancelled);
            }
            // nodes are ordered by depth
            if node.depth >= self.max_depth {
                break;
            }

            let cells = model.decode(node.key);
            for slot in 0..cells.len() {
                for direction in Direction::ALL {
                    let Some(to) = model.slide(&cells, slot, direction) else {
                        continue;
                    };
                    let mut next = cells.clone();
                    next[slot] = to;
                    model.canonicalize(&mut next);
                    let key = SearchBoard::key(&next);
                    if !seen.insert(key) {
                        continue;
                    }

                    nodes.push(Node {
                        key,
                        parent: cursor,
                        step: Some((cells[slot], direction)),
                        depth: node.depth + 1,
                    });

                    if model.is_solved(&next) {
                        let moves = model.replay(board, &trace(&nodes, nodes.len() - 1))?;
                        debug!(moves = moves.len(), explored = nodes.len(), "Solution found");
                        return Ok(moves);
                    }
                    if nodes.len() >= self.max_states {
                        return Err(SolveFailure::no_solution(format!(
                            "search space exceeds {} states",
                            self.max_states
                        )));
                    }
                }
            }
            cursor += 1;
        }

        Err(SolveFailure::no_solution(format!(
            "no solution within {} moves",
            self.max_depth
        )))
    }
}

fn trace(nodes: &[Node], mut index: usize) -> Vec<(Cell, Direction)> {
    let mut steps = Vec::new();
    while let Some(step) = nodes[index].step {
        steps.push(step);
        index = nodes[index].parent;
    }
    steps.reverse();
    steps
}
