//! Session events and their broadcaster.
//!
//! The session controller reports every state change as a [`SessionEvent`]
//! to whoever subscribed: a terminal front end, an autosave task, a
//! statistics uploader. Events serialize as `{"event": ..., "payload": ...}`.
//!
//! # Example
//!
//! ```
//! use roboyard_core::events::{EventBroadcaster, SessionEvent};
//!
//! # async fn example() {
//! let broadcaster = EventBroadcaster::new(16);
//! let mut receiver = broadcaster.subscribe();
//!
//! broadcaster.send(SessionEvent::robots_reset());
//!
//! if let Ok(event) = receiver.recv().await {
//!     assert_eq!(event.event_name(), "robots_reset");
//! }
//! # }
//! ```

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::moves::{Move, MoveResult};
use crate::session::SessionKind;
use crate::solver::RequestId;
use crate::stats::CompletionRecord;
use crate::validator::AcceptReason;

// ============================================================================
// Event Enum
// ============================================================================

/// Something that happened in a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "payload", rename_all = "snake_case")]
pub enum SessionEvent {
    /// A new session began.
    SessionStarted {
        /// How the session was started.
        kind: SessionKind,
    },
    /// The solver began working on a request.
    SolverStarted {
        /// The request being worked on.
        request: RequestId,
    },
    /// A generated candidate was outside the difficulty band.
    BoardRejected {
        /// 1-based rejection count.
        attempt: u32,
        /// Optimal length of the rejected candidate.
        moves: usize,
    },
    /// A procedural board was accepted and play can begin.
    BoardAccepted {
        /// Optimal solution length, if the solver found one.
        optimal_moves: Option<usize>,
        /// Rejections before this board.
        attempts: u32,
        /// Why the board was accepted.
        reason: AcceptReason,
    },
    /// Hints became available for a level or saved game.
    SolutionReady {
        /// Optimal solution length.
        optimal_moves: usize,
    },
    /// The solver gave up; hints are unavailable.
    SolverFailed {
        /// Reason given by the solver.
        reason: String,
    },
    /// A robot moved.
    RobotMoved {
        /// What the move did.
        result: MoveResult,
        /// Moves made so far.
        move_count: u32,
    },
    /// The last move was undone.
    MoveUndone {
        /// Moves made after the undo.
        move_count: u32,
    },
    /// A hint was handed out.
    HintShown {
        /// The suggested move.
        hint: Move,
        /// Hints shown so far.
        hints_shown: u32,
    },
    /// Robots went back to their starting cells.
    RobotsReset,
    /// Every target is covered.
    SessionCompleted {
        /// The statistics record for the finished session.
        record: CompletionRecord,
    },
}

impl SessionEvent {
    /// Creates a `SessionStarted` event.
    #[must_use]
    pub const fn session_started(kind: SessionKind) -> Self {
        Self::SessionStarted { kind }
    }

    /// Creates a `SolverStarted` event.
    #[must_use]
    pub const fn solver_started(request: RequestId) -> Self {
        Self::SolverStarted { request }
    }

    /// Creates a `BoardRejected` event.
    #[must_use]
    pub const fn board_rejected(attempt: u32, moves: usize) -> Self {
        Self::BoardRejected { attempt, moves }
    }

    /// Creates a `BoardAccepted` event.
    #[must_use]
    pub const fn board_accepted(
        optimal_moves: Option<usize>,
        attempts: u32,
        reason: AcceptReason,
    ) -> Self {
        Self::BoardAccepted {
            optimal_moves,
            attempts,
            reason,
        }
    }

    /// Creates a `SolutionReady` event.
    #[must_use]
    pub const fn solution_ready(optimal_moves: usize) -> Self {
        Self::SolutionReady { optimal_moves }
    }

    /// Creates a `SolverFailed` event.
    #[must_use]
    pub fn solver_failed(reason: impl Into<String>) -> Self {
        Self::SolverFailed {
            reason: reason.into(),
        }
    }

    /// Creates a `RobotMoved` event.
    #[must_use]
    pub const fn robot_moved(result: MoveResult, move_count: u32) -> Self {
        Self::RobotMoved { result, move_count }
    }

    /// Creates a `MoveUndone` event.
    #[must_use]
    pub const fn move_undone(move_count: u32) -> Self {
        Self::MoveUndone { move_count }
    }

    /// Creates a `HintShown` event.
    #[must_use]
    pub const fn hint_shown(hint: Move, hints_shown: u32) -> Self {
        Self::HintShown { hint, hints_shown }
    }

    /// Creates a `RobotsReset` event.
    #[must_use]
    pub const fn robots_reset() -> Self {
        Self::RobotsReset
    }

    /// Creates a `SessionCompleted` event.
    #[must_use]
    pub const fn session_completed(record: CompletionRecord) -> Self {
        Self::SessionCompleted { record }
    }

    /// Returns the event name as a string.
    #[must_use]
    pub const fn event_name(&self) -> &'static str {
        match self {
            Self::SessionStarted { .. } => "session_started",
            Self::SolverStarted { .. } => "solver_started",
            Self::BoardRejected { .. } => "board_rejected",
            Self::BoardAccepted { .. } => "board_accepted",
            Self::SolutionReady { .. } => "solution_ready",
            Self::SolverFailed { .. } => "solver_failed",
            Self::RobotMoved { .. } => "robot_moved",
            Self::MoveUndone { .. } => "move_undone",
            Self::HintShown { .. } => "hint_shown",
            Self::RobotsReset => "robots_reset",
            Self::SessionCompleted { .. } => "session_completed",
        }
    }
}

// ============================================================================
// Event Broadcaster
// ============================================================================

/// Broadcasts session events to every subscriber.
///
/// Uses a tokio broadcast channel. Events sent while nobody listens are
/// dropped.
#[derive(Debug, Clone)]
pub struct EventBroadcaster {
    sender: broadcast::Sender<SessionEvent>,
}

impl EventBroadcaster {
    /// Creates a broadcaster buffering up to `capacity` events per subscriber.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Creates a new subscriber.
    ///
    /// A subscriber that falls behind receives a `Lagged` error and misses
    /// the oldest events.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.sender.subscribe()
    }

    /// Broadcasts an event, returning how many subscribers will see it.
    pub fn send(&self, event: SessionEvent) -> usize {
        // send() returns Err only if there are no receivers, which is fine
        self.sender.send(event).unwrap_or(0)
    }

    /// Returns the number of active subscribers.
    #[must_use]
    pub fn receiver_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBroadcaster {
    fn default() -> Self {
        Self::new(100)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::board::{Color, Direction, Position};
    use crate::difficulty::DifficultyTier;
    use crate::moves::Collision;

    #[test]
    fn test_event_serializes_with_tag_and_payload() {
        let event = SessionEvent::board_rejected(3, 2);
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], "board_rejected");
        assert_eq!(json["payload"]["attempt"], 3);
        assert_eq!(json["payload"]["moves"], 2);
    }

    #[test]
    fn test_unit_event_serializes_without_payload() {
        let json = serde_json::to_value(SessionEvent::robots_reset()).unwrap();
        assert_eq!(json["event"], "robots_reset");
    }

    #[test]
    fn test_robot_moved_payload() {
        let result = MoveResult {
            mv: Move::new(Color::Red, Direction::East),
            from: Position::new(0, 0),
            to: Position::new(3, 0),
            squares: 3,
            collision: Collision::None,
        };
        let json = serde_json::to_value(SessionEvent::robot_moved(result, 1)).unwrap();
        assert_eq!(json["payload"]["result"]["mv"]["robot"], "red");
        assert_eq!(json["payload"]["result"]["collision"], "none");
        assert_eq!(json["payload"]["move_count"], 1);
    }

    #[test]
    fn test_event_roundtrip() {
        let event = SessionEvent::session_started(SessionKind::Random {
            tier: DifficultyTier::Insane,
        });
        let json = serde_json::to_string(&event).unwrap();
        let parsed: SessionEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, event);
        assert_eq!(parsed.event_name(), "session_started");
    }

    #[test]
    fn test_send_without_subscribers() {
        let broadcaster = EventBroadcaster::new(4);
        assert_eq!(broadcaster.send(SessionEvent::robots_reset()), 0);
    }

    #[tokio::test]
    async fn test_subscribers_receive_events() {
        let broadcaster = EventBroadcaster::default();
        let mut a = broadcaster.subscribe();
        let mut b = broadcaster.subscribe();
        assert_eq!(broadcaster.receiver_count(), 2);

        assert_eq!(broadcaster.send(SessionEvent::move_undone(2)), 2);
        assert_eq!(a.recv().await.unwrap(), SessionEvent::move_undone(2));
        assert_eq!(b.recv().await.unwrap().event_name(), "move_undone");
    }

    #[test]
    fn test_late_subscriber_misses_earlier_events() {
        let broadcaster = EventBroadcaster::new(4);
        let mut early = broadcaster.subscribe();
        broadcaster.send(SessionEvent::robots_reset());
        let mut late = broadcaster.subscribe();
        broadcaster.send(SessionEvent::move_undone(0));

        let first = tokio_test::block_on(early.recv()).unwrap();
        assert_eq!(first.event_name(), "robots_reset");
        let only = tokio_test::block_on(late.recv()).unwrap();
        assert_eq!(only, SessionEvent::move_undone(0));
    }
}
