//! Roboyard puzzle engine
//!
//! Board model, sliding-move rules, board notation, difficulty validation
//! and the session controller that ties them to an external solver.

pub mod board;
pub mod config;
pub mod difficulty;
pub mod error;
pub mod events;
pub mod generator;
pub mod history;
pub mod moves;
pub mod notation;
pub mod persistence;
pub mod scoring;
pub mod session;
pub mod solver;
pub mod stats;
pub mod validator;

pub use board::{
    Board, Color, Direction, Position, Robot, Target, TargetColor, Wall, WallSide, MAX_BOARD_SIZE,
};
pub use config::Config;
pub use difficulty::{DifficultyBand, DifficultyTier};
pub use error::{Result, RoboyardError};
pub use events::{EventBroadcaster, SessionEvent};
pub use generator::{BoardGenerator, GeneratorParams, RandomBoardGenerator};
pub use history::{History, HistoryEntry};
pub use moves::{apply_move, plan_move, Collision, Move, MoveResult};
pub use notation::{parse_board, serialize_board};
pub use persistence::{FileSessionStore, LevelDirectory, LevelSource, SessionSnapshot, SessionStore};
pub use scoring::{stars, MAX_STARS};
pub use session::{MoveOutcome, SessionController, SessionKind, SessionMetrics, SessionPhase};
pub use solver::{
    RequestId, Solution, SolverMessage, SolverOutcome, SolverPort, SolverReply, SolverStatus,
};
pub use stats::{CompletionRecord, StatisticsSink};
pub use validator::{AcceptReason, DifficultyValidator, ValidationPhase, Verdict};
