//! Error types for the Roboyard engine.
//!
//! This module defines the error hierarchy for board construction, move
//! execution, solver coordination, board notation, persistence and
//! configuration loading.

use std::path::PathBuf;

use crate::board::{Color, Direction};

/// A specialized `Result` type for Roboyard operations.
pub type Result<T> = std::result::Result<T, RoboyardError>;

/// Errors that can occur while building or playing a Roboyard game.
///
/// Variants are organized by subsystem. Variants a player or operator can act
/// on carry a suggestion line.
#[derive(Debug, thiserror::Error)]
pub enum RoboyardError {
    // ========================================================================
    // Move Engine Errors
    // ========================================================================
    /// The move referenced a robot that is not on the board.
    ///
    /// This is a programming error in the caller and is never recovered from.
    #[error("No {color} robot on this board")]
    InvalidRobot {
        /// Color of the missing robot.
        color: Color,
    },

    /// The robot is already flush against an obstacle in that direction.
    #[error("The {color} robot cannot move {direction}")]
    NoMovePossible {
        /// Robot that was asked to move.
        color: Color,
        /// Requested direction.
        direction: Direction,
    },

    // ========================================================================
    // Solver Errors
    // ========================================================================
    /// The solver reported a failure for the current board.
    #[error("Solver failed: {reason}")]
    SolverFailed {
        /// Reason given by the solver.
        reason: String,
    },

    /// A solve request was submitted while another one is still running.
    #[error("Solver is busy with another request\n\nSuggestion: Cancel the running request first")]
    SolverBusy,

    /// The solver was asked to solve before it was given a board.
    #[error("Solver has no board to solve")]
    SolverNotInitialized,

    /// The generator could not produce a board within its attempt budget.
    #[error("Board generation exhausted after {attempts} attempts")]
    GenerationExhausted {
        /// Number of attempts made.
        attempts: u32,
    },

    // ========================================================================
    // Board and Notation Errors
    // ========================================================================
    /// A board violated one of its structural invariants.
    #[error("Invalid board: {message}")]
    InvalidBoard {
        /// Description of the violated invariant.
        message: String,
    },

    /// A line of board notation could not be parsed.
    #[error("Board notation error on line {line}: {message}\n\nSuggestion: Lines look like 'board:16,16;', 'mh3,0;', 'target_red8,11;' or 'robot_blue6,1;'")]
    NotationParse {
        /// 1-based line number of the offending line.
        line: usize,
        /// Description of the problem.
        message: String,
    },

    // ========================================================================
    // Persistence Errors
    // ========================================================================
    /// No level file exists for the requested level.
    #[error("Level {id} not found at '{path}'\n\nSuggestion: Check the 'levelDir' field in roboyard.json")]
    LevelNotFound {
        /// Requested level id.
        id: u32,
        /// Where the level was expected.
        path: PathBuf,
    },

    /// No saved game exists in the requested slot.
    #[error("No saved game in slot {slot}")]
    SaveNotFound {
        /// Requested save slot.
        slot: u32,
    },

    /// A save file exists but its header could not be read.
    #[error("Corrupted save file '{path}': {message}\n\nSuggestion: Delete the save file and save again")]
    SaveCorrupted {
        /// Path to the corrupted save file.
        path: PathBuf,
        /// Description of the corruption.
        message: String,
    },

    // ========================================================================
    // Session Errors
    // ========================================================================
    /// The operation needs a game in progress.
    #[error("No game in progress\n\nSuggestion: Start a new game or load a level first")]
    NoActiveSession,

    /// The session was built without a collaborator the operation needs.
    #[error("No {name} configured for this session")]
    MissingCollaborator {
        /// Which collaborator is missing.
        name: &'static str,
    },

    // ========================================================================
    // Configuration Errors
    // ========================================================================
    /// Invalid JSON syntax in configuration file.
    #[error("Invalid JSON in config file '{path}': {message}\n\nSuggestion: Validate your roboyard.json with a JSON linter")]
    ConfigParseError {
        /// Path to the configuration file.
        path: PathBuf,
        /// Description of the parse error.
        message: String,
    },

    /// Configuration validation failed.
    #[error("Invalid configuration: {message}\n\nSuggestion: {suggestion}")]
    ConfigValidationError {
        /// Description of the validation failure.
        message: String,
        /// Actionable suggestion for the user.
        suggestion: String,
    },

    // ========================================================================
    // General I/O Errors
    // ========================================================================
    /// General I/O error during file operations.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl RoboyardError {
    /// Creates a new `InvalidBoard` error.
    #[must_use]
    pub fn invalid_board(message: impl Into<String>) -> Self {
        Self::InvalidBoard {
            message: message.into(),
        }
    }

    /// Creates a new `NotationParse` error for the given 1-based line.
    #[must_use]
    pub fn notation(line: usize, message: impl Into<String>) -> Self {
        Self::NotationParse {
            line,
            message: message.into(),
        }
    }

    /// Creates a new `SolverFailed` error.
    #[must_use]
    pub fn solver_failed(reason: impl Into<String>) -> Self {
        Self::SolverFailed {
            reason: reason.into(),
        }
    }

    /// Creates a new `LevelNotFound` error.
    #[must_use]
    pub fn level_not_found(id: u32, path: impl Into<PathBuf>) -> Self {
        Self::LevelNotFound {
            id,
            path: path.into(),
        }
    }

    /// Creates a new `SaveCorrupted` error.
    #[must_use]
    pub fn save_corrupted(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::SaveCorrupted {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Creates a new `ConfigParseError` with the given path and message.
    #[must_use]
    pub fn config_parse(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::ConfigParseError {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Creates a new `ConfigValidationError` with the given message and suggestion.
    #[must_use]
    pub fn config_validation(message: impl Into<String>, suggestion: impl Into<String>) -> Self {
        Self::ConfigValidationError {
            message: message.into(),
            suggestion: suggestion.into(),
        }
    }

    /// Returns `true` if the session controller resolves this error itself.
    ///
    /// A blocked move is a silent no-op, solver trouble only disables hints
    /// and generation trouble falls back to the board in hand.
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::NoMovePossible { .. }
                | Self::SolverFailed { .. }
                | Self::SolverBusy
                | Self::SolverNotInitialized
                | Self::GenerationExhausted { .. }
        )
    }
}
