//! The solver port: how the session hands boards to a solver and hears back.
//!
//! A solver runs on its own worker and answers through a [`SolverReply`],
//! a single-shot handle bound to one request id. Answers travel over a
//! tokio channel to the session controller, which processes them on its own
//! context and drops any answer whose request is no longer outstanding.
//!
//! # Example
//!
//! ```
//! use roboyard_core::solver::{SolverOutcome, SolverReply};
//!
//! let (reply, mut rx) = SolverReply::channel(7);
//! reply.started();
//! reply.failed("no solution within depth 20");
//!
//! let first = rx.try_recv().unwrap();
//! assert_eq!(first.request, 7);
//! assert!(matches!(first.outcome, SolverOutcome::Started));
//! assert!(matches!(rx.try_recv().unwrap().outcome, SolverOutcome::Failed(_)));
//! ```

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::debug;

use crate::board::Board;
use crate::error::Result;
use crate::moves::Move;

/// Identifies one solve request.
pub type RequestId = u64;

/// An ordered list of moves solving a specific board.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Solution {
    board: Board,
    moves: Vec<Move>,
}

impl Solution {
    /// Creates a solution for `board`.
    #[must_use]
    pub const fn new(board: Board, moves: Vec<Move>) -> Self {
        Self { board, moves }
    }

    /// The board this solution starts from.
    #[must_use]
    pub const fn board(&self) -> &Board {
        &self.board
    }

    /// The moves in order.
    #[must_use]
    pub fn moves(&self) -> &[Move] {
        &self.moves
    }

    /// Number of moves.
    #[must_use]
    pub fn len(&self) -> usize {
        self.moves.len()
    }

    /// Returns `true` for a zero-move solution.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.moves.is_empty()
    }
}

/// Lifecycle of a solver port.
///
/// `Idle -> Running -> Completed | Failed | Cancelled`; a new request may
/// start from any state except `Running`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SolverStatus {
    /// No request has been made yet.
    #[default]
    Idle,
    /// A request is in flight.
    Running,
    /// The last request produced a solution.
    Completed,
    /// The last request failed.
    Failed,
    /// The last request was cancelled.
    Cancelled,
}

impl SolverStatus {
    /// Returns `true` if no request is in flight.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Cancelled)
    }
}

/// What a solver reported.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SolverOutcome {
    /// Work began. May be sent more than once.
    Started,
    /// A solution was found.
    Completed(Solution),
    /// No solution; the string says why.
    Failed(String),
    /// The request was cancelled before it finished.
    Cancelled,
}

/// A solver report tagged with its request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SolverMessage {
    /// Request the report belongs to.
    pub request: RequestId,
    /// The report itself.
    pub outcome: SolverOutcome,
}

/// Single-shot reply handle for one solve request.
///
/// The terminal methods consume the handle, so each request is answered at
/// most once.
#[derive(Debug)]
pub struct SolverReply {
    request: RequestId,
    sender: mpsc::UnboundedSender<SolverMessage>,
}

impl SolverReply {
    /// Creates a reply handle that reports into `sender`.
    #[must_use]
    pub const fn new(request: RequestId, sender: mpsc::UnboundedSender<SolverMessage>) -> Self {
        Self { request, sender }
    }

    /// Creates a reply handle together with the receiving end of its channel.
    #[must_use]
    pub fn channel(request: RequestId) -> (Self, mpsc::UnboundedReceiver<SolverMessage>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self::new(request, sender), receiver)
    }

    /// The request this handle answers.
    #[must_use]
    pub const fn request(&self) -> RequestId {
        self.request
    }

    /// Reports that work began.
    pub fn started(&self) {
        self.send(SolverOutcome::Started);
    }

    /// Reports a solution.
    pub fn completed(self, solution: Solution) {
        self.send(SolverOutcome::Completed(solution));
    }

    /// Reports a failure.
    pub fn failed(self, reason: impl Into<String>) {
        self.send(SolverOutcome::Failed(reason.into()));
    }

    /// Reports that the request was cancelled.
    pub fn cancelled(self) {
        self.send(SolverOutcome::Cancelled);
    }

    fn send(&self, outcome: SolverOutcome) {
        let message = SolverMessage {
            request: self.request,
            outcome,
        };
        if self.sender.send(message).is_err() {
            debug!(request = self.request, "Solver reply dropped, receiver gone");
        }
    }
}

/// A solver the session controller can drive.
///
/// At most one request is in flight: `solve_async` while `Running` returns
/// `SolverBusy`. `cancel` is idempotent and a no-op when nothing runs.
pub trait SolverPort: Send {
    /// Hands the port its own copy of the board to solve next.
    fn initialize(&mut self, board: Board);

    /// Starts solving the initialized board, answering through `reply`.
    ///
    /// Must not block on the search itself.
    fn solve_async(&mut self, reply: SolverReply) -> Result<()>;

    /// Cancels the in-flight request, if any.
    fn cancel(&mut self);

    /// Current lifecycle state.
    fn status(&self) -> SolverStatus;
}
