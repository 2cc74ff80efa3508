//! Solver port backed by a dedicated worker thread.
//!
//! Each request spawns one thread that runs the search and answers through
//! the request's [`SolverReply`]. Cancellation is cooperative: the port
//! raises the job's [`CancelFlag`] and the search notices it between
//! expansions.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Instant;

use roboyard_core::{
    Board, Result, RoboyardError, Solution, SolverPort, SolverReply, SolverStatus,
};
use tracing::{debug, info, warn};

use crate::{CancelFlag, Solve, SolveFailure};

/// Status shared with the worker thread. `job` tells the current job apart
/// from a cancelled one that is still winding down.
#[derive(Debug, Default)]
struct JobState {
    job: u64,
    status: SolverStatus,
}

fn lock(shared: &Mutex<JobState>) -> MutexGuard<'_, JobState> {
    shared.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Runs a [`Solve`] implementation off the caller's thread.
///
/// # Example
///
/// ```
/// use roboyard_core::{
///     Board, Color, Position, SolverOutcome, SolverPort, SolverReply, TargetColor,
/// };
/// use roboyard_solver::{BreadthFirstSolver, WorkerSolverPort};
///
/// # async fn example() -> roboyard_core::Result<()> {
/// let mut board = Board::new(4, 4)?;
/// board.add_robot(Color::Red, Position::new(0, 0))?;
/// board.add_target(TargetColor::Solid(Color::Red), Position::new(3, 3))?;
///
/// let mut port = WorkerSolverPort::new(BreadthFirstSolver::default());
/// port.initialize(board);
///
/// let (reply, mut rx) = SolverReply::channel(1);
/// port.solve_async(reply)?;
/// while let Some(message) = rx.recv().await {
///     if let SolverOutcome::Completed(solution) = message.outcome {
///         assert_eq!(solution.len(), 2);
///     }
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct WorkerSolverPort<S: Solve> {
    solver: Arc<S>,
    board: Option<Board>,
    shared: Arc<Mutex<JobState>>,
    cancel: Option<CancelFlag>,
    handle: Option<JoinHandle<()>>,
}

impl<S: Solve> WorkerSolverPort<S> {
    /// Creates an idle port around `solver`.
    pub fn new(solver: S) -> Self {
        Self {
            solver: Arc::new(solver),
            board: None,
            shared: Arc::new(Mutex::new(JobState::default())),
            cancel: None,
            handle: None,
        }
    }

    /// Blocks until the most recent worker thread has exited.
    pub fn join(&mut self) {
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                warn!("Solver worker panicked");
            }
        }
    }
}

impl<S: Solve> SolverPort for WorkerSolverPort<S> {
    fn initialize(&mut self, board: Board) {
        self.board = Some(board);
    }

    fn solve_async(&mut self, reply: SolverReply) -> Result<()> {
        let board = self
            .board
            .clone()
            .ok_or(RoboyardError::SolverNotInitialized)?;

        let job = {
            let mut state = lock(&self.shared);
            if state.status == SolverStatus::Running {
                return Err(RoboyardError::SolverBusy);
            }
            state.job += 1;
            state.status = SolverStatus::Running;
            state.job
        };

        let request = reply.request();
        let cancel = CancelFlag::new();
        let flag = cancel.clone();
        let solver = Arc::clone(&self.solver);
        let shared = Arc::clone(&self.shared);

        let spawned = thread::Builder::new()
            .name(format!("roboyard-solver-{request}"))
            .spawn(move || run_job(solver.as_ref(), board, &flag, &shared, job, reply));

        match spawned {
            Ok(handle) => {
                debug!(request, job, "Solver worker started");
                self.cancel = Some(cancel);
                // a replaced handle belongs to a finished or cancelled job
                self.handle = Some(handle);
                Ok(())
            }
            Err(e) => {
                lock(&self.shared).status = SolverStatus::Failed;
                Err(e.into())
            }
        }
    }

    fn cancel(&mut self) {
        let mut state = lock(&self.shared);
        if state.status == SolverStatus::Running {
            state.status = SolverStatus::Cancelled;
            if let Some(flag) = &self.cancel {
                flag.cancel();
            }
            debug!(job = state.job, "Solver job cancelled");
        }
    }

    fn status(&self) -> SolverStatus {
        lock(&self.shared).status
    }
}

impl<S: Solve> Drop for WorkerSolverPort<S> {
    fn drop(&mut self) {
        self.cancel();
        self.join();
    }
}

fn run_job<S: Solve>(
    solver: &S,
    board: Board,
    cancel: &CancelFlag,
    shared: &Mutex<JobState>,
    job: u64,
    reply: SolverReply,
) {
    reply.started();
    let started = Instant::now();
    let result = solver.solve(&board, cancel);
    let elapsed_ms = started.elapsed().as_millis();

    let result = if cancel.is_cancelled() {
        Err(SolveFailure::Cancelled)
    } else {
        result
    };
    let status = match &result {
        Ok(_) => SolverStatus::Completed,
        Err(SolveFailure::Cancelled) => SolverStatus::Cancelled,
        Err(SolveFailure::NoSolution(_)) => SolverStatus::Failed,
    };
    {
        let mut state = lock(shared);
        if state.job == job && state.status == SolverStatus::Running {
            state.status = status;
        }
    }

    match result {
        Ok(moves) => {
            info!(request = reply.request(), moves = moves.len(), elapsed_ms, "Solver finished");
            reply.completed(Solution::new(board, moves));
        }
        Err(SolveFailure::Cancelled) => {
            debug!(request = reply.request(), elapsed_ms, "Solver stopped after cancel");
            reply.cancelled();
        }
        Err(SolveFailure::NoSolution(reason)) => {
            warn!(request = reply.request(), elapsed_ms, reason = %reason, "Solver found no solution");
            reply.failed(reason);
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use roboyard_core::{Color, Direction, Move, Position, SolverOutcome, TargetColor};

    use super::*;
    use crate::BreadthFirstSolver;

    /// Spins until its flag is raised.
    struct UntilCancelled;

    impl Solve for UntilCancelled {
        fn solve(
            &self,
            _board: &Board,
            cancel: &CancelFlag,
        ) -> std::result::Result<Vec<Move>, SolveFailure> {
            while !cancel.is_cancelled() {
                thread::sleep(Duration::from_millis(1));
            }
            Err(SolveFailure::Cancelled)
        }
    }

    fn corner_board() -> Board {
        let mut board = Board::new(4, 4).unwrap();
        board.add_robot(Color::Red, Position::new(0, 0)).unwrap();
        board
            .add_target(TargetColor::Solid(Color::Red), Position::new(3, 3))
            .unwrap();
        board
    }

    #[tokio::test]
    async fn reports_started_then_solution() {
        let mut port = WorkerSolverPort::new(BreadthFirstSolver::default());
        assert_eq!(port.status(), SolverStatus::Idle);
        port.initialize(corner_board());

        let (reply, mut rx) = SolverReply::channel(5);
        port.solve_async(reply).unwrap();

        let first = rx.recv().await.unwrap();
        assert_eq!(first.request, 5);
        assert_eq!(first.outcome, SolverOutcome::Started);

        let solution = match rx.recv().await.unwrap().outcome {
            SolverOutcome::Completed(solution) => solution,
            other => unreachable!("expected a solution, got {other:?}"),
        };
        assert_eq!(
            solution.moves(),
            &[
                Move::new(Color::Red, Direction::East),
                Move::new(Color::Red, Direction::South),
            ]
        );
        assert_eq!(solution.board(), &corner_board());
        assert_eq!(port.status(), SolverStatus::Completed);
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn reports_failure() {
        let mut port = WorkerSolverPort::new(BreadthFirstSolver::new(1));
        port.initialize(corner_board());
        let (reply, mut rx) = SolverReply::channel(1);
        port.solve_async(reply).unwrap();

        rx.recv().await.unwrap();
        let message = rx.recv().await.unwrap();
        assert_eq!(
            message.outcome,
            SolverOutcome::Failed("no solution within 1 moves".to_string())
        );
        assert_eq!(port.status(), SolverStatus::Failed);
    }

    #[test]
    fn requires_a_board() {
        let mut port = WorkerSolverPort::new(BreadthFirstSolver::default());
        let (reply, _rx) = SolverReply::channel(1);
        assert!(matches!(
            port.solve_async(reply),
            Err(RoboyardError::SolverNotInitialized)
        ));
    }

    #[tokio::test]
    async fn busy_until_cancelled() {
        let mut port = WorkerSolverPort::new(UntilCancelled);
        port.initialize(corner_board());

        let (first, mut rx) = SolverReply::channel(1);
        port.solve_async(first).unwrap();
        assert_eq!(port.status(), SolverStatus::Running);

        let (second, _second_rx) = SolverReply::channel(2);
        assert!(matches!(
            port.solve_async(second),
            Err(RoboyardError::SolverBusy)
        ));

        port.cancel();
        port.cancel();
        assert_eq!(port.status(), SolverStatus::Cancelled);

        assert_eq!(rx.recv().await.unwrap().outcome, SolverOutcome::Started);
        assert_eq!(rx.recv().await.unwrap().outcome, SolverOutcome::Cancelled);
        port.join();
        assert_eq!(port.status(), SolverStatus::Cancelled);
    }

    #[tokio::test]
    async fn cancelled_job_does_not_overwrite_next_status() {
        let mut port = WorkerSolverPort::new(UntilCancelled);
        port.initialize(corner_board());
        let (first, _first_rx) = SolverReply::channel(1);
        port.solve_async(first).unwrap();
        port.cancel();

        let (second, mut rx) = SolverReply::channel(2);
        port.solve_async(second).unwrap();
        assert_eq!(port.status(), SolverStatus::Running);

        // give the first worker time to notice its flag
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(port.status(), SolverStatus::Running);

        port.cancel();
        assert_eq!(rx.recv().await.unwrap().request, 2);
    }
}
