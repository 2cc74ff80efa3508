//! Configuration for Roboyard sessions.
//!
//! Settings are read from `roboyard.json`. Every field has a default, so a
//! missing file or a partial file is fine.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::difficulty::DifficultyTier;
use crate::error::{Result, RoboyardError};
use crate::generator::GeneratorParams;
use crate::validator::DEFAULT_MAX_ATTEMPTS;

/// The default config file name.
const CONFIG_FILE_NAME: &str = "roboyard.json";

/// Smallest accepted board side.
pub const MIN_BOARD_SIZE: usize = 4;

/// Largest accepted board side.
pub const MAX_CONFIG_BOARD_SIZE: usize = 32;

const fn default_board_size() -> usize {
    16
}

const fn default_robot_count() -> usize {
    4
}

const fn default_target_count() -> usize {
    1
}

const fn default_wall_density() -> f64 {
    0.12
}

const fn default_true() -> bool {
    true
}

const fn default_max_generation_attempts() -> u32 {
    DEFAULT_MAX_ATTEMPTS
}

fn default_level_dir() -> String {
    "levels".to_string()
}

fn default_save_dir() -> String {
    "saves".to_string()
}

fn default_stats_file() -> String {
    "stats.json".to_string()
}

const fn default_solver_max_depth() -> usize {
    20
}

/// Main configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Width of generated boards.
    #[serde(default = "default_board_size")]
    pub board_width: usize,

    /// Height of generated boards.
    #[serde(default = "default_board_size")]
    pub board_height: usize,

    /// Robots on generated boards.
    #[serde(default = "default_robot_count")]
    pub robot_count: usize,

    /// Targets on generated boards.
    #[serde(default = "default_target_count")]
    pub target_count: usize,

    /// Wall corners per cell on generated boards.
    #[serde(default = "default_wall_density")]
    pub wall_density: f64,

    /// Whether generated boards may have a target any robot can take.
    #[serde(default = "default_true")]
    pub allow_multi_target: bool,

    /// Tier used for new games when none is given.
    #[serde(default)]
    pub difficulty: DifficultyTier,

    /// Regenerations allowed before a board is accepted regardless of difficulty.
    #[serde(default = "default_max_generation_attempts")]
    pub max_generation_attempts: u32,

    /// Directory holding `level_<id>.txt` files.
    #[serde(default = "default_level_dir")]
    pub level_dir: String,

    /// Directory for saved games.
    #[serde(default = "default_save_dir")]
    pub save_dir: String,

    /// File for completion statistics.
    #[serde(default = "default_stats_file")]
    pub stats_file: String,

    /// Move limit for the reference solver.
    #[serde(default = "default_solver_max_depth")]
    pub solver_max_depth: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            board_width: default_board_size(),
            board_height: default_board_size(),
            robot_count: default_robot_count(),
            target_count: default_target_count(),
            wall_density: default_wall_density(),
            allow_multi_target: default_true(),
            difficulty: DifficultyTier::default(),
            max_generation_attempts: default_max_generation_attempts(),
            level_dir: default_level_dir(),
            save_dir: default_save_dir(),
            stats_file: default_stats_file(),
            solver_max_depth: default_solver_max_depth(),
        }
    }
}

impl Config {
    /// Loads configuration from `roboyard.json` in the current directory.
    pub fn load() -> Result<Self> {
        let current_dir = std::env::current_dir().map_err(|e| {
            RoboyardError::config_parse(
                "<current directory>",
                format!("cannot determine current directory: {e}"),
            )
        })?;
        Self::load_from_file(&current_dir.join(CONFIG_FILE_NAME))
    }

    /// Loads configuration from a specific file path.
    ///
    /// A missing file yields the defaults.
    ///
    /// # Errors
    ///
    /// Returns `RoboyardError::ConfigParseError` for unreadable files or bad
    /// JSON, and `RoboyardError::ConfigValidationError` for out-of-range values.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let contents = match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let config = Self::default();
                config.validate()?;
                return Ok(config);
            }
            Err(e) => {
                return Err(RoboyardError::config_parse(
                    path,
                    format!("failed to read file: {e}"),
                ));
            }
        };

        let config: Self = serde_json::from_str(&contents)
            .map_err(|e| RoboyardError::config_parse(path, e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration values.
    pub fn validate(&self) -> Result<()> {
        let sizes = MIN_BOARD_SIZE..=MAX_CONFIG_BOARD_SIZE;
        if !sizes.contains(&self.board_width) || !sizes.contains(&self.board_height) {
            return Err(RoboyardError::config_validation(
                format!(
                    "board size {}x{} outside {MIN_BOARD_SIZE}..={MAX_CONFIG_BOARD_SIZE}",
                    self.board_width, self.board_height
                ),
                "Set boardWidth and boardHeight between 4 and 32 in your roboyard.json",
            ));
        }

        if self.robot_count == 0 || self.robot_count > 9 {
            return Err(RoboyardError::config_validation(
                "robotCount must be between 1 and 9",
                "Set robotCount to a value from 1 to 9 in your roboyard.json",
            ));
        }

        if self.target_count == 0 || self.target_count > self.robot_count {
            return Err(RoboyardError::config_validation(
                "targetCount must be between 1 and robotCount",
                "Lower targetCount or raise robotCount in your roboyard.json",
            ));
        }

        if !(0.0..=1.0).contains(&self.wall_density) {
            return Err(RoboyardError::config_validation(
                "wallDensity must be between 0.0 and 1.0",
                "Set wallDensity to a fraction such as 0.12 in your roboyard.json",
            ));
        }

        if self.max_generation_attempts == 0 {
            return Err(RoboyardError::config_validation(
                "maxGenerationAttempts must be greater than 0",
                "Set maxGenerationAttempts to at least 1 in your roboyard.json",
            ));
        }

        if self.solver_max_depth == 0 {
            return Err(RoboyardError::config_validation(
                "solverMaxDepth must be greater than 0",
                "Set solverMaxDepth to at least 1 in your roboyard.json",
            ));
        }

        for (field, value) in [
            ("levelDir", &self.level_dir),
            ("saveDir", &self.save_dir),
            ("statsFile", &self.stats_file),
        ] {
            if value.trim().is_empty() {
                return Err(RoboyardError::config_validation(
                    format!("{field} must not be empty"),
                    format!("Provide a path for {field} in your roboyard.json"),
                ));
            }
        }

        Ok(())
    }

    /// Generator parameters derived from this configuration.
    #[must_use]
    pub fn generator_params(&self) -> GeneratorParams {
        GeneratorParams {
            width: self.board_width,
            height: self.board_height,
            robot_count: self.robot_count,
            target_count: self.target_count,
            wall_density: self.wall_density,
            allow_multi_target: self.allow_multi_target,
        }
    }
}
