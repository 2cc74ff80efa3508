//! Iterative deepening A* solver.
//!
//! Runs depth-first searches with a growing move bound. A configuration is
//! cut off once the moves made plus the relaxed distance of the closest
//! accepting robot exceed the bound. A table of configurations already
//! exhausted for a given number of remaining moves keeps transpositions
//! from being searched twice. The bound grows one move at a time, so the
//! first solution found is a shortest one.
//!
//! Memory stays proportional to the table, which makes this the solver for
//! full-size boards and deep tiers.

use std::collections::HashMap;

use roboyard_core::{Board, Direction, Move};
use tracing::{debug, trace};

use crate::bfs::{DEFAULT_MAX_DEPTH, DEFAULT_MAX_STATES};
use crate::state::{Cell, Key, SearchBoard, UNREACHABLE};
use crate::{CancelFlag, Solve, SolveFailure};

/// Shortest-path solver guided by a lower bound on the moves left.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IterativeDeepeningSolver {
    max_depth: usize,
    max_states: usize,
}

impl IterativeDeepeningSolver {
    /// Creates a solver that gives up beyond `max_depth` moves.
    #[must_use]
    pub const fn new(max_depth: usize) -> Self {
        Self {
            max_depth,
            max_states: DEFAULT_MAX_STATES,
        }
    }

    /// Caps the number of configurations remembered between iterations.
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

impl Default for IterativeDeepeningSolver {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_DEPTH)
    }
}

impl Solve for IterativeDeepeningSolver {
    fn solve(&self, board: &Board, cancel: &CancelFlag) -> Result<Vec<Move>, SolveFailure> {
        if board.targets().is_empty() {
            return Err(SolveFailure::no_solution("board has no targets"));
        }
        let out_of_reach = || {
            SolveFailure::no_solution(format!("no solution within {} moves", self.max_depth))
        };

        let model = SearchBoard::new(board);
        let start = model.start(board);
        if model.is_solved(&start) {
            return Ok(Vec::new());
        }
        let floor = model.heuristic(&start);
        if floor == UNREACHABLE || usize::from(floor) > self.max_depth {
            return Err(out_of_reach());
        }

        let mut search = Search {
            model: &model,
            cancel,
            max_states: self.max_states,
            exhausted: HashMap::new(),
            path: Vec::new(),
        };
        for bound in usize::from(floor).max(1)..=self.max_depth {
            if search.explore(&start, bound)? {
                let moves = model.replay(board, &search.path)?;
                debug!(
                    moves = moves.len(),
                    remembered = search.exhausted.len(),
                    "Solution found"
                );
                return Ok(moves);
            }
            trace!(bound, remembered = search.exhausted.len(), "Bound exhausted");
        }
        Err(out_of_reach())
    }
}

struct Search<'a> {
    model: &'a SearchBoard,
    cancel: &'a CancelFlag,
    max_states: usize,
    /// Most remaining moves a configuration was searched with, without success.
    exhausted: HashMap<Key, u8>,
    path: Vec<(Cell, Direction)>,
}

impl Search<'_> {
    /// Depth-first search for a solution within `remaining` moves. On
    /// success `path` holds the steps from the root.
    fn explore(&mut self, cells: &[Cell], remaining: usize) -> Result<bool, SolveFailure> {
        if self.cancel.is_cancelled() {
            return Err(SolveFailure::Cancelled);
        }
        if self.model.is_solved(cells) {
            return Ok(true);
        }
        if remaining == 0 {
            return Ok(false);
        }
        let estimate = self.model.heuristic(cells);
        if estimate == UNREACHABLE || usize::from(estimate) > remaining {
            return Ok(false);
        }

        let key = SearchBoard::key(cells);
        if self
            .exhausted
            .get(&key)
            .is_some_and(|&searched| usize::from(searched) >= remaining)
        {
            return Ok(false);
        }

        for slot in 0..cells.len() {
            for direction in Direction::ALL {
                let Some(to) = self.model.slide(cells, slot, direction) else {
                    continue;
                };
                let mut next = cells.to_vec();
                next[slot] = to;
                self.model.canonicalize(&mut next);

                self.path.push((cells[slot], direction));
                if self.explore(&next, remaining - 1)? {
                    return Ok(true);
                }
                self.path.pop();
            }
        }

        if self.exhausted.len() >= self.max_states && !self.exhausted.contains_key(&key) {
            return Err(SolveFailure::no_solution(format!(
                "search space exceeds {} states",
                self.max_states
            )));
        }
        self.exhausted
            .insert(key, u8::try_from(remaining).unwrap_or(u8::MAX));
        Ok(false)
    }
}
