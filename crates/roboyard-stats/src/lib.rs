//! Roboyard Completion Statistics
//!
//! This crate keeps the player's completion history: the best result per
//! level, the number of random games finished and the total star count.
//! Statistics are persisted as JSON and can be rendered to Markdown for the
//! terminal.
//!
//! # Types
//!
//! - [`StatsSnapshot`] - The persisted statistics document
//! - [`CompletionStore`] - Thread-safe store that implements the session's statistics sink
//! - [`MarkdownSummary`] - Renders a snapshot as a Markdown summary
//!
//! # Example
//!
//! ```rust
//! use chrono::Utc;
//! use roboyard_core::CompletionRecord;
//! use roboyard_stats::{CompletionStore, MarkdownSummary};
//!
//! let store = CompletionStore::in_memory();
//! store.record(&CompletionRecord {
//!     level_id: Some(1),
//!     stars: 3,
//!     moves_used: 2,
//!     optimal_moves: 2,
//!     hints_used: 0,
//!     time_ms: 41_000,
//!     robots_used: 1,
//!     completed_at: Utc::now(),
//! });
//!
//! assert_eq!(store.total_stars(), 3);
//! let markdown = MarkdownSummary::new(&store.snapshot()).generate();
//! assert!(markdown.contains("# Roboyard Statistics"));
//! ```

mod markdown;
mod store;

pub use markdown::MarkdownSummary;
pub use store::CompletionStore;

use std::collections::BTreeMap;

use roboyard_core::CompletionRecord;
use serde::{Deserialize, Serialize};
use thiserror::Error;

// ============================================================================
// Error Types
// ============================================================================

/// Errors that can occur while loading or saving statistics.
#[derive(Debug, Error)]
pub enum StatsError {
    /// The statistics file is not valid JSON.
    #[error("failed to parse statistics: {0}\n\nSuggestion: Delete the statistics file to start over")]
    Serialization(#[from] serde_json::Error),

    /// Failed to read or write the statistics file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The file parsed but holds inconsistent data.
    #[error("invalid statistics data: {0}")]
    InvalidData(String),
}

/// Result type for statistics operations.
pub type Result<T> = std::result::Result<T, StatsError>;

// ============================================================================
// Snapshot
// ============================================================================

/// Everything the store persists.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsSnapshot {
    /// Best record per level id.
    #[serde(default)]
    pub levels: BTreeMap<u32, CompletionRecord>,

    /// Random games completed.
    #[serde(default)]
    pub random_completions: u32,

    /// Every completion, levels and random games alike.
    #[serde(default)]
    pub total_completions: u32,
}

impl StatsSnapshot {
    /// Sum of the best star ratings over all levels.
    #[must_use]
    pub fn total_stars(&self) -> u32 {
        self.levels.values().map(|r| u32::from(r.stars)).sum()
    }

    /// Checks the snapshot for records that could not have been produced.
    pub fn validate(&self) -> Result<()> {
        for (id, record) in &self.levels {
            if record.level_id != Some(*id) {
                return Err(StatsError::InvalidData(format!(
                    "record stored under level {id} belongs to level {:?}",
                    record.level_id
                )));
            }
            if record.stars > roboyard_core::MAX_STARS {
                return Err(StatsError::InvalidData(format!(
                    "level {id} has {} stars",
                    record.stars
                )));
            }
        }
        Ok(())
    }
}

/// Returns `true` if `candidate` should replace `best` for the same level.
///
/// More stars wins, then fewer moves, then less time.
#[must_use]
pub fn is_better(candidate: &CompletionRecord, best: &CompletionRecord) -> bool {
    (
        std::cmp::Reverse(candidate.stars),
        candidate.moves_used,
        candidate.time_ms,
    ) < (std::cmp::Reverse(best.stars), best.moves_used, best.time_ms)
}
