//! Roboyard solvers
//!
//! Solver ports the session controller can drive.
//!
//! This crate provides a [`WorkerSolverPort`] that runs any [`Solve`]
//! implementation on a dedicated thread with cooperative cancellation, and
//! two solvers that find shortest solutions: [`BreadthFirstSolver`] for
//! small boards and as a reference, and [`IterativeDeepeningSolver`] for
//! full-size boards and deep difficulty tiers.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use roboyard_core::{Board, Move};
use thiserror::Error;

pub mod bfs;
pub mod ida;
mod state;
pub mod worker;

pub use bfs::{BreadthFirstSolver, DEFAULT_MAX_DEPTH, DEFAULT_MAX_STATES};
pub use ida::IterativeDeepeningSolver;
pub use worker::WorkerSolverPort;

/// Why a search produced no solution.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SolveFailure {
    /// The cancel flag was raised before the search finished.
    #[error("search cancelled")]
    Cancelled,

    /// The search ended without finding a solution.
    #[error("{0}")]
    NoSolution(String),
}

impl SolveFailure {
    /// Creates a `NoSolution` failure.
    #[must_use]
    pub fn no_solution(reason: impl Into<String>) -> Self {
        Self::NoSolution(reason.into())
    }
}

/// Shared flag a running search polls to learn it should stop.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    /// Creates a lowered flag.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Raises the flag.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    /// Returns `true` once the flag has been raised.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// A blocking search for a sequence of moves that solves a board.
///
/// Implementations should check `cancel` often enough that a cancelled
/// search stops promptly.
pub trait Solve: Send + Sync + 'static {
    /// Searches for a solution of `board`.
    fn solve(&self, board: &Board, cancel: &CancelFlag) -> Result<Vec<Move>, SolveFailure>;
}
