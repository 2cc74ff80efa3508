//! Completion statistics handed to the statistics collaborator.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One finished session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionRecord {
    /// Level id, `None` for a random game.
    pub level_id: Option<u32>,
    /// Star rating, 0 to 4.
    pub stars: u8,
    /// Moves the player made.
    pub moves_used: u32,
    /// Length of the solver's solution, 0 when there was none.
    pub optimal_moves: u32,
    /// Hints shown during the session.
    pub hints_used: u32,
    /// Time from session start to completion.
    pub time_ms: u64,
    /// Distinct robots the player moved.
    pub robots_used: u32,
    /// When the session was completed.
    pub completed_at: DateTime<Utc>,
}

/// Receives a record every time a session becomes complete.
///
/// Implementations decide how records are stored or synced.
pub trait StatisticsSink: Send + Sync {
    /// Called once per transition into the complete state.
    fn record_completion(&self, record: &CompletionRecord);
}
