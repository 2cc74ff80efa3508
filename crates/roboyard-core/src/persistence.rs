//! Saved games and level files.
//!
//! A save file is a one-line metadata header followed by the board in
//! notation form:
//!
//! ```text
//! #MAPNAME:Morning puzzle;TIME:73000;MOVES:5;HINTS:1;LEVEL:-;TIER:2;SAVED:2026-01-05T10:00:00+00:00;
//! board:16,16;
//! mh3,0;
//! ...
//! ```
//!
//! The header is a comment as far as the board parser is concerned, so the
//! whole file can be handed to [`parse_board`] as is.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use regex::Regex;
use tracing::{debug, info};

use crate::board::Board;
use crate::difficulty::DifficultyTier;
use crate::error::{Result, RoboyardError};
use crate::notation::{parse_board, serialize_board};

/// Prefix of save file names.
pub const SAVE_FILE_PREFIX: &str = "save_";

/// Extension of save file names.
pub const SAVE_FILE_EXTENSION: &str = "dat";

/// A saved game.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSnapshot {
    /// Display name of the save.
    pub name: String,
    /// Level the game came from, `None` for random games.
    pub level_id: Option<u32>,
    /// Tier of a random game.
    pub tier: Option<DifficultyTier>,
    /// Board as it was when saved.
    pub board: Board,
    /// Moves made so far.
    pub move_count: u32,
    /// Hints shown so far.
    pub hints_shown: u32,
    /// Play time so far.
    pub elapsed_ms: u64,
    /// When the save was made.
    pub saved_at: DateTime<Utc>,
}

impl SessionSnapshot {
    /// Renders the save file contents.
    #[must_use]
    pub fn to_text(&self) -> String {
        let level = self
            .level_id
            .map_or_else(|| "-".to_string(), |id| id.to_string());
        let tier = self
            .tier
            .map_or_else(|| "-".to_string(), |t| t.number().to_string());
        // ';' terminates header fields
        let name = self.name.replace(';', ",");
        format!(
            "#MAPNAME:{name};TIME:{};MOVES:{};HINTS:{};LEVEL:{level};TIER:{tier};SAVED:{};\n{}",
            self.elapsed_ms,
            self.move_count,
            self.hints_shown,
            self.saved_at.to_rfc3339(),
            serialize_board(&self.board)
        )
    }

    /// Parses save file contents. `path` is only used in error messages.
    pub fn from_text(text: &str, path: &Path) -> Result<Self> {
        let Ok(re) = Regex::new(
            r"^#MAPNAME:(?P<name>[^;]*);TIME:(?P<time>\d+);MOVES:(?P<moves>\d+);HINTS:(?P<hints>\d+);LEVEL:(?P<level>\d+|-);TIER:(?P<tier>\d|-);SAVED:(?P<saved>[^;]+);$",
        ) else {
            return Err(RoboyardError::save_corrupted(path, "header pattern failed to compile"));
        };

        let header = text.lines().next().unwrap_or_default().trim();
        let caps = re
            .captures(header)
            .ok_or_else(|| RoboyardError::save_corrupted(path, "missing or malformed header"))?;
        let field = |name: &str| caps.name(name).map_or("", |m| m.as_str());
        let number = |name: &str| -> Result<u64> {
            field(name)
                .parse::<u64>()
                .map_err(|e| RoboyardError::save_corrupted(path, format!("{name}: {e}")))
        };
        let small = |name: &str| -> Result<u32> {
            u32::try_from(number(name)?)
                .map_err(|e| RoboyardError::save_corrupted(path, format!("{name}: {e}")))
        };

        let level_id = match field("level") {
            "-" => None,
            _ => Some(small("level")?),
        };
        let tier = match field("tier") {
            "-" => None,
            t => Some(
                DifficultyTier::from_str_case_insensitive(t)
                    .ok_or_else(|| RoboyardError::save_corrupted(path, format!("unknown tier {t}")))?,
            ),
        };
        let saved_at = DateTime::parse_from_rfc3339(field("saved"))
            .map_err(|e| RoboyardError::save_corrupted(path, format!("saved: {e}")))?
            .with_timezone(&Utc);

        Ok(Self {
            name: field("name").to_string(),
            level_id,
            tier,
            board: parse_board(text)?,
            move_count: small("moves")?,
            hints_shown: small("hints")?,
            elapsed_ms: number("time")?,
            saved_at,
        })
    }
}

// ============================================================================
// Collaborator Interfaces
// ============================================================================

/// Where saved games live.
pub trait SessionStore: Send {
    /// Writes a snapshot into `slot`, replacing what was there.
    fn save(&self, slot: u32, snapshot: &SessionSnapshot) -> Result<()>;

    /// Reads the snapshot in `slot`, `None` if the slot is empty.
    fn load(&self, slot: u32) -> Result<Option<SessionSnapshot>>;
}

/// Where pre-authored levels come from.
pub trait LevelSource: Send {
    /// Loads level `id`.
    fn level(&self, id: u32) -> Result<Board>;
}

// ============================================================================
// File-backed Implementations
// ============================================================================

/// Saves games as `save_<slot>.dat` files in one directory.
#[derive(Debug, Clone)]
pub struct FileSessionStore {
    dir: PathBuf,
}

impl FileSessionStore {
    /// Creates a store rooted at `dir`. The directory is created on first save.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Path of the file backing `slot`.
    #[must_use]
    pub fn slot_path(&self, slot: u32) -> PathBuf {
        self.dir
            .join(format!("{SAVE_FILE_PREFIX}{slot}.{SAVE_FILE_EXTENSION}"))
    }
}

impl SessionStore for FileSessionStore {
    fn save(&self, slot: u32, snapshot: &SessionSnapshot) -> Result<()> {
        std::fs::create_dir_all(&self.dir)?;
        let path = self.slot_path(slot);
        std::fs::write(&path, snapshot.to_text())?;
        info!(slot, path = %path.display(), "Game saved");
        Ok(())
    }

    fn load(&self, slot: u32) -> Result<Option<SessionSnapshot>> {
        let path = self.slot_path(slot);
        let text = match std::fs::read_to_string(&path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(slot, path = %path.display(), "Save slot empty");
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        };
        SessionSnapshot::from_text(&text, &path).map(Some)
    }
}

/// Reads `level_<id>.txt` files in board notation from one directory.
#[derive(Debug, Clone)]
pub struct LevelDirectory {
    dir: PathBuf,
}

impl LevelDirectory {
    /// Creates a level source rooted at `dir`.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Path of the file holding level `id`.
    #[must_use]
    pub fn level_path(&self, id: u32) -> PathBuf {
        self.dir.join(format!("level_{id}.txt"))
    }
}

impl LevelSource for LevelDirectory {
    fn level(&self, id: u32) -> Result<Board> {
        let path = self.level_path(id);
        let text = match std::fs::read_to_string(&path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(RoboyardError::level_not_found(id, path));
            }
            Err(e) => return Err(e.into()),
        };
        parse_board(&text)
    }
}
