//! Thread-safe completion store.

use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use roboyard_core::{CompletionRecord, StatisticsSink};
use tracing::{debug, info, warn};

use crate::{is_better, Result, StatsSnapshot};

/// Keeps completion statistics, optionally backed by a JSON file.
///
/// As a [`StatisticsSink`] the store records every completion and writes the
/// file straight away; a failed write is logged and the in-memory state
/// kept.
#[derive(Debug)]
pub struct CompletionStore {
    path: Option<PathBuf>,
    state: Mutex<StatsSnapshot>,
}

impl CompletionStore {
    /// Creates an empty store that is never written to disk.
    #[must_use]
    pub fn in_memory() -> Self {
        Self {
            path: None,
            state: Mutex::new(StatsSnapshot::default()),
        }
    }

    /// Opens the store backed by `path`. A missing file starts empty.
    ///
    /// # Errors
    ///
    /// Returns [`crate::StatsError::Serialization`] if the file is not valid
    /// JSON and [`crate::StatsError::InvalidData`] if its records are
    /// inconsistent.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let snapshot = match std::fs::read_to_string(&path) {
            Ok(text) => {
                let snapshot: StatsSnapshot = serde_json::from_str(&text)?;
                snapshot.validate()?;
                debug!(path = %path.display(), levels = snapshot.levels.len(), "Statistics loaded");
                snapshot
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => StatsSnapshot::default(),
            Err(e) => return Err(e.into()),
        };
        Ok(Self {
            path: Some(path),
            state: Mutex::new(snapshot),
        })
    }

    /// The backing file, if any.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn lock(&self) -> MutexGuard<'_, StatsSnapshot> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Adds a completion. Returns `true` if it is a new best for its level.
    ///
    /// Random games only count towards the completion totals.
    pub fn record(&self, record: &CompletionRecord) -> bool {
        let mut state = self.lock();
        state.total_completions += 1;

        let Some(level) = record.level_id else {
            state.random_completions += 1;
            return false;
        };

        let improved = state
            .levels
            .get(&level)
            .map_or(true, |best| is_better(record, best));
        if improved {
            info!(level, stars = record.stars, moves = record.moves_used, "New best result");
            state.levels.insert(level, record.clone());
        }
        improved
    }

    /// Best result for `level`.
    #[must_use]
    pub fn best(&self, level: u32) -> Option<CompletionRecord> {
        self.lock().levels.get(&level).cloned()
    }

    /// Sum of the best star ratings over all levels.
    #[must_use]
    pub fn total_stars(&self) -> u32 {
        self.lock().total_stars()
    }

    /// Number of levels completed at least once.
    #[must_use]
    pub fn levels_completed(&self) -> usize {
        self.lock().levels.len()
    }

    /// Random games completed.
    #[must_use]
    pub fn random_completions(&self) -> u32 {
        self.lock().random_completions
    }

    /// A copy of the current statistics.
    #[must_use]
    pub fn snapshot(&self) -> StatsSnapshot {
        self.lock().clone()
    }

    /// Writes the statistics to the backing file as pretty-printed JSON.
    ///
    /// Does nothing for an in-memory store. Parent directories are created
    /// as needed.
    pub fn save(&self) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let json = serde_json::to_string_pretty(&*self.lock())?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, json)?;
        debug!(path = %path.display(), "Statistics saved");
        Ok(())
    }
}

impl StatisticsSink for CompletionStore {
    fn record_completion(&self, record: &CompletionRecord) {
        self.record(record);
        if let Err(e) = self.save() {
            warn!(error = %e, "Failed to save statistics");
        }
    }
}
