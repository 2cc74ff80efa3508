//! The session controller.
//!
//! One controller owns one game at a time: the board, its undo history,
//! the metrics, the accepted solution and the hint cursor. The solver runs
//! elsewhere and reports back over a channel; the controller handles those
//! reports when the caller drives it with [`SessionController::pump`] or
//! [`SessionController::settle`], so all state changes happen on the
//! caller's context.
//!
//! ```text
//! NoSession --new_game--> Validating --board accepted--> Active <--undo--> Complete
//!     |                                                    ^
//!     +--------------load_level / load_saved---------------+
//! ```

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, error, info, warn};

use crate::board::{Board, Color, Direction};
use crate::config::Config;
use crate::difficulty::DifficultyTier;
use crate::error::{Result, RoboyardError};
use crate::events::{EventBroadcaster, SessionEvent};
use crate::generator::{BoardGenerator, GeneratorParams};
use crate::history::History;
use crate::moves::{plan_move, Collision, Move};
use crate::persistence::{LevelSource, SessionSnapshot, SessionStore};
use crate::scoring;
use crate::solver::{
    RequestId, Solution, SolverMessage, SolverOutcome, SolverPort, SolverReply, SolverStatus,
};
use crate::stats::{CompletionRecord, StatisticsSink};
use crate::validator::{AcceptReason, DifficultyValidator, Verdict};

// ============================================================================
// Session Types
// ============================================================================

/// How a session was started.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionKind {
    /// A generated board validated against a tier.
    Random {
        /// Requested difficulty.
        tier: DifficultyTier,
    },
    /// A pre-authored level.
    Level {
        /// Level id.
        id: u32,
    },
    /// A saved game.
    Saved {
        /// Save slot.
        slot: u32,
    },
}

impl SessionKind {
    /// Tier of a random game.
    #[must_use]
    pub const fn tier(&self) -> Option<DifficultyTier> {
        match self {
            Self::Random { tier } => Some(*tier),
            Self::Level { .. } | Self::Saved { .. } => None,
        }
    }
}

/// Where the session is in its lifecycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    /// No game yet.
    #[default]
    NoSession,
    /// A generated board is being checked against its tier.
    Validating,
    /// The game is being played.
    Active,
    /// Every target is covered.
    Complete,
}

impl SessionPhase {
    /// Returns `true` once a board has been handed to the player.
    #[must_use]
    pub const fn has_board(&self) -> bool {
        matches!(self, Self::Active | Self::Complete)
    }
}

/// Counters for the current session.
#[derive(Debug, Clone)]
pub struct SessionMetrics {
    /// Successful moves, less undone ones.
    pub move_count: u32,
    /// Squares travelled by successful moves, less undone ones.
    pub squares_moved: u32,
    /// Hints shown. Never decreases within a session.
    pub hints_shown: u32,
    /// Robots moved at least once.
    pub robots_used: BTreeSet<Color>,
    started_at: Instant,
}

impl SessionMetrics {
    fn new() -> Self {
        Self {
            move_count: 0,
            squares_moved: 0,
            hints_shown: 0,
            robots_used: BTreeSet::new(),
            started_at: Instant::now(),
        }
    }

    /// Time since the board was handed to the player.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.started_at.elapsed()
    }

    /// Number of distinct robots moved.
    #[must_use]
    pub fn robots_used_count(&self) -> u32 {
        u32::try_from(self.robots_used.len()).unwrap_or(u32::MAX)
    }
}

impl Default for SessionMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Result of [`SessionController::try_move`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoveOutcome {
    /// Whether the board changed.
    pub applied: bool,
    /// Squares travelled.
    pub squares: u32,
    /// What stopped the robot.
    pub collision: Collision,
    /// Whether this move completed the session.
    pub completed: bool,
}

impl MoveOutcome {
    const fn rejected() -> Self {
        Self {
            applied: false,
            squares: 0,
            collision: Collision::None,
            completed: false,
        }
    }
}

// ============================================================================
// Session Controller
// ============================================================================

/// Drives one game at a time.
///
/// The generator, solver and optional collaborators are handed in at
/// construction, so tests can substitute any of them.
pub struct SessionController {
    params: GeneratorParams,
    max_generation_attempts: u32,
    generator: Box<dyn BoardGenerator>,
    solver: Box<dyn SolverPort>,
    statistics: Option<Arc<dyn StatisticsSink>>,
    store: Option<Box<dyn SessionStore>>,
    levels: Option<Box<dyn LevelSource>>,
    events: EventBroadcaster,
    replies_tx: mpsc::UnboundedSender<SolverMessage>,
    replies_rx: mpsc::UnboundedReceiver<SolverMessage>,
    next_request: RequestId,
    pending: Option<RequestId>,
    allow_regeneration: bool,
    phase: SessionPhase,
    kind: Option<SessionKind>,
    level_id: Option<u32>,
    board: Option<Board>,
    initial_board: Option<Board>,
    history: History,
    metrics: SessionMetrics,
    solution: Option<Solution>,
    hint_cursor: usize,
    validator: Option<DifficultyValidator>,
    stars: Option<u8>,
}

impl SessionController {
    /// Creates a controller with no session.
    pub fn new(
        config: &Config,
        generator: Box<dyn BoardGenerator>,
        solver: Box<dyn SolverPort>,
    ) -> Self {
        let (replies_tx, replies_rx) = mpsc::unbounded_channel();
        Self {
            params: config.generator_params(),
            max_generation_attempts: config.max_generation_attempts,
            generator,
            solver,
            statistics: None,
            store: None,
            levels: None,
            events: EventBroadcaster::default(),
            replies_tx,
            replies_rx,
            next_request: 1,
            pending: None,
            allow_regeneration: true,
            phase: SessionPhase::NoSession,
            kind: None,
            level_id: None,
            board: None,
            initial_board: None,
            history: History::new(),
            metrics: SessionMetrics::new(),
            solution: None,
            hint_cursor: 0,
            validator: None,
            stars: None,
        }
    }

    /// Sends completion records to `sink`.
    #[must_use]
    pub fn with_statistics(mut self, sink: Arc<dyn StatisticsSink>) -> Self {
        self.statistics = Some(sink);
        self
    }

    /// Saves and loads games through `store`.
    #[must_use]
    pub fn with_store(mut self, store: Box<dyn SessionStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Loads levels from `levels`.
    #[must_use]
    pub fn with_levels(mut self, levels: Box<dyn LevelSource>) -> Self {
        self.levels = Some(levels);
        self
    }

    /// Publishes events on `events` instead of a private broadcaster.
    #[must_use]
    pub fn with_events(mut self, events: EventBroadcaster) -> Self {
        self.events = events;
        self
    }

    // ------------------------------------------------------------------------
    // Starting sessions
    // ------------------------------------------------------------------------

    /// Starts a procedurally generated game of the given tier.
    ///
    /// The session stays in [`SessionPhase::Validating`] until the solver's
    /// answers have been processed and a board accepted.
    pub fn new_game(&mut self, tier: DifficultyTier) -> Result<()> {
        self.begin_session(SessionKind::Random { tier }, None);
        self.phase = SessionPhase::Validating;
        self.validator = Some(DifficultyValidator::new(
            tier.band(),
            self.max_generation_attempts,
        ));
        info!(tier = %tier, band = %tier.band(), "Starting new game");

        if let Err(e) = self.submit_candidate() {
            self.phase = SessionPhase::NoSession;
            self.validator = None;
            return Err(e);
        }
        Ok(())
    }

    /// Starts a pre-authored level. Difficulty validation is skipped.
    pub fn load_level(&mut self, id: u32) -> Result<()> {
        let levels = self
            .levels
            .as_ref()
            .ok_or(RoboyardError::MissingCollaborator {
                name: "level source",
            })?;
        let board = levels.level(id)?;
        self.start_fixed(SessionKind::Level { id }, Some(id), board);
        Ok(())
    }

    /// Resumes a saved game from its board. Difficulty validation is skipped.
    pub fn load_saved(&mut self, slot: u32) -> Result<()> {
        let store = self
            .store
            .as_ref()
            .ok_or(RoboyardError::MissingCollaborator {
                name: "session store",
            })?;
        let snapshot = store
            .load(slot)?
            .ok_or(RoboyardError::SaveNotFound { slot })?;
        self.start_fixed(SessionKind::Saved { slot }, snapshot.level_id, snapshot.board);
        Ok(())
    }

    /// Starts a session on a board the caller already has.
    pub fn start_with_board(&mut self, kind: SessionKind, board: Board) {
        let level_id = match kind {
            SessionKind::Level { id } => Some(id),
            SessionKind::Random { .. } | SessionKind::Saved { .. } => None,
        };
        self.start_fixed(kind, level_id, board);
    }

    fn begin_session(&mut self, kind: SessionKind, level_id: Option<u32>) {
        self.cancel_solver();
        self.phase = SessionPhase::NoSession;
        self.kind = Some(kind);
        self.level_id = level_id;
        self.board = None;
        self.initial_board = None;
        self.history.clear();
        self.metrics = SessionMetrics::new();
        self.solution = None;
        self.hint_cursor = 0;
        self.validator = None;
        self.stars = None;
        self.events.send(SessionEvent::session_started(kind));
    }

    fn start_fixed(&mut self, kind: SessionKind, level_id: Option<u32>, board: Board) {
        self.begin_session(kind, level_id);
        self.install_board(board.clone());
        self.phase = SessionPhase::Active;
        info!(
            kind = ?kind,
            width = board.width(),
            height = board.height(),
            "Session started on a fixed board"
        );
        self.submit_solve(board);
    }

    fn install_board(&mut self, board: Board) {
        self.initial_board = Some(board.clone());
        self.board = Some(board);
        self.history.clear();
    }

    // ------------------------------------------------------------------------
    // Solver coordination
    // ------------------------------------------------------------------------

    fn submit_candidate(&mut self) -> Result<()> {
        let board = self.generator.generate(&self.params)?;
        self.install_board(board.clone());
        if let Some(validator) = self.validator.as_mut() {
            validator.candidate_submitted();
        }
        self.submit_solve(board);
        Ok(())
    }

    fn submit_solve(&mut self, board: Board) {
        let request = self.next_request;
        self.next_request += 1;
        self.solver.initialize(board);
        self.pending = Some(request);
        debug!(request, "Submitting board to solver");

        let reply = SolverReply::new(request, self.replies_tx.clone());
        if let Err(e) = self.solver.solve_async(reply) {
            warn!(request, error = %e, "Solver rejected request");
            self.pending = None;
            self.on_solver_failed(e.to_string());
        }
    }

    fn cancel_solver(&mut self) {
        if let Some(request) = self.pending.take() {
            debug!(request, "Cancelling outstanding solver request");
        }
        self.solver.cancel();
    }

    /// Handles every solver report already received, without waiting.
    ///
    /// Returns the number of reports handled, stale ones included.
    pub fn pump(&mut self) -> usize {
        let mut handled = 0;
        while let Ok(message) = self.replies_rx.try_recv() {
            self.handle_solver_message(message);
            handled += 1;
        }
        handled
    }

    /// Waits until no solver request is outstanding.
    ///
    /// For a new game this returns once a board has been accepted. There is
    /// no timeout; a solver that never answers keeps this pending.
    pub async fn settle(&mut self) {
        while self.pending.is_some() {
            match self.replies_rx.recv().await {
                Some(message) => self.handle_solver_message(message),
                None => break,
            }
        }
    }

    fn handle_solver_message(&mut self, message: SolverMessage) {
        if self.pending != Some(message.request) {
            debug!(
                request = message.request,
                pending = ?self.pending,
                "Ignoring stale solver message"
            );
            return;
        }

        match message.outcome {
            SolverOutcome::Started => {
                self.events.send(SessionEvent::solver_started(message.request));
            }
            SolverOutcome::Completed(solution) => {
                self.pending = None;
                self.on_solution(solution);
            }
            SolverOutcome::Failed(reason) => {
                self.pending = None;
                self.on_solver_failed(reason);
            }
            SolverOutcome::Cancelled => {
                self.pending = None;
                self.on_solver_failed("solver cancelled".to_string());
            }
        }
    }

    fn on_solution(&mut self, solution: Solution) {
        match self.phase {
            SessionPhase::Validating => {
                let moves = solution.len();
                let allow_regeneration = self.allow_regeneration;
                let Some(validator) = self.validator.as_mut() else {
                    self.accept_board(Some(solution), AcceptReason::InBand, 0);
                    return;
                };

                match validator.on_solution(moves, allow_regeneration) {
                    Verdict::Accept { reason, attempts } => {
                        self.accept_board(Some(solution), reason, attempts);
                    }
                    Verdict::Regenerate { attempt } => {
                        self.events.send(SessionEvent::board_rejected(attempt, moves));
                        if let Err(e) = self.submit_candidate() {
                            warn!(error = %e, "No replacement board; keeping the current one");
                            let verdict = self
                                .validator
                                .as_mut()
                                .map(DifficultyValidator::on_generator_failure);
                            if let Some(Verdict::Accept { reason, attempts }) = verdict {
                                self.accept_board(Some(solution), reason, attempts);
                            }
                        }
                    }
                }
            }
            SessionPhase::Active | SessionPhase::Complete => {
                info!(optimal_moves = solution.len(), "Solution ready");
                self.events.send(SessionEvent::solution_ready(solution.len()));
                self.solution = Some(solution);
                self.hint_cursor = 0;
            }
            SessionPhase::NoSession => debug!("Dropping solution outside a session"),
        }
    }

    fn on_solver_failed(&mut self, reason: String) {
        self.solution = None;
        self.events.send(SessionEvent::solver_failed(reason.clone()));
        let failure = RoboyardError::solver_failed(reason);
        warn!(error = %failure, "Hints unavailable");

        if self.phase == SessionPhase::Validating {
            let attempts = match self.validator.as_mut().map(DifficultyValidator::on_failure) {
                Some(Verdict::Accept { attempts, .. }) => attempts,
                _ => 0,
            };
            self.accept_board(None, AcceptReason::SolverFailed, attempts);
        }
    }

    fn accept_board(&mut self, solution: Option<Solution>, reason: AcceptReason, attempts: u32) {
        let optimal_moves = solution.as_ref().map(Solution::len);
        match reason {
            AcceptReason::InBand => {
                info!(optimal_moves = ?optimal_moves, attempts, "Board accepted");
            }
            AcceptReason::CapReached => {
                let exhausted = RoboyardError::GenerationExhausted { attempts };
                warn!(optimal_moves = ?optimal_moves, error = %exhausted, "Accepting board outside difficulty band");
            }
            AcceptReason::SolverFailed
            | AcceptReason::RegenerationStopped
            | AcceptReason::GeneratorFailed => {
                warn!(optimal_moves = ?optimal_moves, attempts, reason = ?reason, "Board accepted without validation");
            }
        }

        self.solution = solution;
        self.hint_cursor = 0;
        self.phase = SessionPhase::Active;
        self.metrics = SessionMetrics::new();
        self.events
            .send(SessionEvent::board_accepted(optimal_moves, attempts, reason));
    }

    /// Stops the difficulty loop: the next solved candidate is accepted as is.
    pub fn stop_regeneration(&mut self) {
        debug!("Board regeneration disabled");
        self.allow_regeneration = false;
    }

    /// Re-enables the difficulty loop.
    pub fn resume_regeneration(&mut self) {
        debug!("Board regeneration enabled");
        self.allow_regeneration = true;
    }

    // ------------------------------------------------------------------------
    // Play
    // ------------------------------------------------------------------------

    /// Slides a robot.
    ///
    /// A move that cannot leave its cell, or any move outside an active
    /// session, leaves everything unchanged and reports `applied == false`.
    ///
    /// # Errors
    ///
    /// Returns `RoboyardError::InvalidRobot` if no robot of that color exists.
    pub fn try_move(&mut self, robot: Color, direction: Direction) -> Result<MoveOutcome> {
        if self.phase != SessionPhase::Active {
            debug!(phase = ?self.phase, "Ignoring move outside an active session");
            return Ok(MoveOutcome::rejected());
        }
        let Some(board) = self.board.as_mut() else {
            return Ok(MoveOutcome::rejected());
        };

        let mv = Move::new(robot, direction);
        let result = match plan_move(board, mv) {
            Ok(result) => result,
            Err(e) if e.is_recoverable() => {
                debug!(robot = %robot, direction = %direction, error = %e, "Move blocked");
                return Ok(MoveOutcome::rejected());
            }
            Err(e) => {
                error!(robot = %robot, error = %e, "Move rejected");
                return Err(e);
            }
        };

        self.history.push(board, self.metrics.squares_moved);
        board.relocate(robot, result.to);
        let completed = board.is_solved();

        self.metrics.move_count += 1;
        self.metrics.squares_moved += result.squares;
        self.metrics.robots_used.insert(robot);
        debug!(
            robot = %robot,
            direction = %direction,
            to = %result.to,
            squares = result.squares,
            collision = ?result.collision,
            "Robot moved"
        );
        self.events
            .send(SessionEvent::robot_moved(result, self.metrics.move_count));

        if completed {
            self.complete();
        }

        Ok(MoveOutcome {
            applied: true,
            squares: result.squares,
            collision: result.collision,
            completed,
        })
    }

    fn complete(&mut self) {
        let optimal_moves = self
            .solution
            .as_ref()
            .map_or(0, |s| u32::try_from(s.len()).unwrap_or(u32::MAX));
        let stars = scoring::stars(
            self.metrics.move_count,
            optimal_moves,
            self.metrics.hints_shown,
        );
        self.phase = SessionPhase::Complete;
        self.stars = Some(stars);

        let record = CompletionRecord {
            level_id: self.level_id,
            stars,
            moves_used: self.metrics.move_count,
            optimal_moves,
            hints_used: self.metrics.hints_shown,
            time_ms: u64::try_from(self.metrics.elapsed().as_millis()).unwrap_or(u64::MAX),
            robots_used: self.metrics.robots_used_count(),
            completed_at: Utc::now(),
        };
        info!(
            stars,
            moves = record.moves_used,
            optimal_moves,
            hints = record.hints_used,
            "Session complete"
        );

        if let Some(sink) = &self.statistics {
            sink.record_completion(&record);
        }
        self.events.send(SessionEvent::session_completed(record));
    }

    /// Undoes the last move. Returns `false` when there is nothing to undo.
    ///
    /// Undoing a completing move re-opens the session.
    pub fn undo(&mut self) -> bool {
        if !self.phase.has_board() {
            return false;
        }
        let Some(entry) = self.history.pop() else {
            return false;
        };

        if self
            .solution
            .as_ref()
            .is_some_and(|s| !s.board().same_layout(&entry.board))
        {
            debug!("Solution no longer matches the board; discarding it");
            self.solution = None;
        }
        self.board = Some(entry.board);
        self.metrics.squares_moved = entry.squares_moved;
        self.metrics.move_count = self.metrics.move_count.saturating_sub(1);
        if self.phase == SessionPhase::Complete {
            self.phase = SessionPhase::Active;
            self.stars = None;
        }

        debug!(move_count = self.metrics.move_count, "Move undone");
        self.events
            .send(SessionEvent::move_undone(self.metrics.move_count));
        true
    }

    /// Returns the next move of the accepted solution.
    ///
    /// `None` while the solver is working, when it failed, outside an active
    /// session, or once every move has been shown.
    pub fn hint(&mut self) -> Option<Move> {
        if self.phase != SessionPhase::Active || self.pending.is_some() {
            return None;
        }
        let mv = *self.solution.as_ref()?.moves().get(self.hint_cursor)?;
        self.hint_cursor += 1;
        self.metrics.hints_shown += 1;
        debug!(hint = %mv, hints_shown = self.metrics.hints_shown, "Hint shown");
        self.events
            .send(SessionEvent::hint_shown(mv, self.metrics.hints_shown));
        Some(mv)
    }

    /// Puts every robot back where the session started.
    ///
    /// Clears history and the move counters and rewinds the hint cursor;
    /// hints already shown stay counted.
    pub fn reset_robots(&mut self) -> bool {
        if !self.phase.has_board() {
            return false;
        }
        let Some(initial) = self.initial_board.clone() else {
            return false;
        };
        self.board = Some(initial);
        self.history.clear();
        self.metrics.move_count = 0;
        self.metrics.squares_moved = 0;
        self.metrics.robots_used.clear();
        self.hint_cursor = 0;
        self.phase = SessionPhase::Active;
        self.stars = None;
        info!("Robots reset to their starting cells");
        self.events.send(SessionEvent::robots_reset());
        true
    }

    // ------------------------------------------------------------------------
    // Persistence
    // ------------------------------------------------------------------------

    /// Captures the current game for saving.
    pub fn snapshot(&self, name: impl Into<String>) -> Option<SessionSnapshot> {
        if !self.phase.has_board() {
            return None;
        }
        Some(SessionSnapshot {
            name: name.into(),
            level_id: self.level_id,
            tier: self.kind.and_then(|k| k.tier()),
            board: self.board.clone()?,
            move_count: self.metrics.move_count,
            hints_shown: self.metrics.hints_shown,
            elapsed_ms: u64::try_from(self.metrics.elapsed().as_millis()).unwrap_or(u64::MAX),
            saved_at: Utc::now(),
        })
    }

    /// Saves the current game into `slot`.
    pub fn save(&self, slot: u32, name: impl Into<String>) -> Result<()> {
        let store = self
            .store
            .as_ref()
            .ok_or(RoboyardError::MissingCollaborator {
                name: "session store",
            })?;
        let snapshot = self.snapshot(name).ok_or(RoboyardError::NoActiveSession)?;
        store.save(slot, &snapshot)
    }

    // ------------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------------

    /// Lifecycle phase.
    #[must_use]
    pub const fn phase(&self) -> SessionPhase {
        self.phase
    }

    /// How the current session was started.
    #[must_use]
    pub const fn kind(&self) -> Option<SessionKind> {
        self.kind
    }

    /// The board being played, or the candidate being validated.
    #[must_use]
    pub const fn board(&self) -> Option<&Board> {
        self.board.as_ref()
    }

    /// The board as the session started.
    #[must_use]
    pub const fn initial_board(&self) -> Option<&Board> {
        self.initial_board.as_ref()
    }

    /// Session counters.
    #[must_use]
    pub const fn metrics(&self) -> &SessionMetrics {
        &self.metrics
    }

    /// The accepted solution, if any.
    #[must_use]
    pub const fn solution(&self) -> Option<&Solution> {
        self.solution.as_ref()
    }

    /// Hints left, `None` when no solution is available.
    #[must_use]
    pub fn hints_remaining(&self) -> Option<usize> {
        self.solution
            .as_ref()
            .map(|s| s.len().saturating_sub(self.hint_cursor))
    }

    /// Moves that can be undone.
    #[must_use]
    pub fn undo_depth(&self) -> usize {
        self.history.len()
    }

    /// Returns `true` once every target is covered.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.phase == SessionPhase::Complete
    }

    /// Star rating; only set while the session is complete.
    #[must_use]
    pub const fn current_stars(&self) -> Option<u8> {
        self.stars
    }

    /// Returns `true` while a solver request is outstanding.
    #[must_use]
    pub const fn is_solver_running(&self) -> bool {
        self.pending.is_some()
    }

    /// The solver port's own view of its state.
    #[must_use]
    pub fn solver_status(&self) -> SolverStatus {
        self.solver.status()
    }

    /// Subscribes to session events.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }
}

impl Drop for SessionController {
    fn drop(&mut self) {
        self.solver.cancel();
    }
}
