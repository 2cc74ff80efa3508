//! Random board generation.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::board::{Board, Color, Position, TargetColor, Wall};
use crate::error::{Result, RoboyardError};

/// Chance that one target of a generated board accepts any robot.
const MULTI_TARGET_CHANCE: f64 = 0.2;

/// Shape of the boards a generator should produce.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratorParams {
    /// Board width in cells.
    pub width: usize,
    /// Board height in cells.
    pub height: usize,
    /// Robots to place.
    pub robot_count: usize,
    /// Targets to place.
    pub target_count: usize,
    /// Wall corners per cell, between 0 and 1.
    pub wall_density: f64,
    /// Whether a target may accept any robot.
    pub allow_multi_target: bool,
}

impl Default for GeneratorParams {
    fn default() -> Self {
        Self {
            width: 16,
            height: 16,
            robot_count: 4,
            target_count: 1,
            wall_density: 0.12,
            allow_multi_target: true,
        }
    }
}

/// Produces candidate boards for new games.
pub trait BoardGenerator: Send {
    /// Builds a fresh board. Robots never start on a target.
    fn generate(&mut self, params: &GeneratorParams) -> Result<Board>;
}

/// Generator scattering right-angle wall corners, robots and targets at random.
#[derive(Debug)]
pub struct RandomBoardGenerator {
    rng: StdRng,
}

impl RandomBoardGenerator {
    /// Creates a generator seeded from the operating system.
    #[must_use]
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    /// Creates a reproducible generator.
    #[must_use]
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Default for RandomBoardGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl BoardGenerator for RandomBoardGenerator {
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    fn generate(&mut self, params: &GeneratorParams) -> Result<Board> {
        let mut board = Board::new(params.width, params.height)?;
        let cells = params.width * params.height;

        if params.robot_count == 0 || params.robot_count > Color::ALL.len() {
            return Err(RoboyardError::invalid_board(format!(
                "robot count {} outside 1..={}",
                params.robot_count,
                Color::ALL.len()
            )));
        }
        if params.target_count == 0 || params.target_count > params.robot_count {
            return Err(RoboyardError::invalid_board(format!(
                "target count {} outside 1..={}",
                params.target_count, params.robot_count
            )));
        }
        if params.robot_count + params.target_count > cells {
            return Err(RoboyardError::invalid_board(format!(
                "{} robots and {} targets do not fit on {cells} cells",
                params.robot_count, params.target_count
            )));
        }

        let corners = (cells as f64 * params.wall_density.clamp(0.0, 1.0)).round() as usize;
        for _ in 0..corners {
            let x = self.rng.gen_range(0..params.width);
            let y = self.rng.gen_range(0..params.height);
            let horizontal = if self.rng.gen_bool(0.5) {
                Wall::north(x, y)
            } else {
                Wall::north(x, y + 1)
            };
            let vertical = if self.rng.gen_bool(0.5) {
                Wall::west(x, y)
            } else {
                Wall::west(x + 1, y)
            };
            board.add_wall(horizontal)?;
            board.add_wall(vertical)?;
        }

        let mut free: Vec<Position> = (0..params.height)
            .flat_map(|y| (0..params.width).map(move |x| Position::new(x, y)))
            .collect();
        free.shuffle(&mut self.rng);

        let colors = &Color::ALL[..params.robot_count];
        for &color in colors {
            let Some(position) = free.pop() else {
                return Err(RoboyardError::invalid_board("ran out of free cells"));
            };
            board.add_robot(color, position)?;
        }

        let mut target_colors = colors.to_vec();
        target_colors.shuffle(&mut self.rng);
        let multi = params.allow_multi_target && self.rng.gen_bool(MULTI_TARGET_CHANCE);
        for (i, color) in target_colors.into_iter().take(params.target_count).enumerate() {
            let Some(position) = free.pop() else {
                return Err(RoboyardError::invalid_board("ran out of free cells"));
            };
            let target = if multi && i == 0 {
                TargetColor::Multi
            } else {
                TargetColor::Solid(color)
            };
            board.add_target(target, position)?;
        }

        Ok(board)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_generates_requested_shape() {
        let mut generator = RandomBoardGenerator::seeded(7);
        let params = GeneratorParams::default();
        let board = generator.generate(&params).unwrap();

        assert_eq!(board.width(), 16);
        assert_eq!(board.height(), 16);
        assert_eq!(board.robots().len(), 4);
        assert_eq!(board.targets().len(), 1);
        assert!(board.walls().count() > 0);
        assert!(!board.is_solved());
    }

    #[test]
    fn test_robots_never_start_on_targets() {
        let mut generator = RandomBoardGenerator::seeded(11);
        let params = GeneratorParams {
            width: 5,
            height: 5,
            robot_count: 4,
            target_count: 4,
            ..GeneratorParams::default()
        };
        for _ in 0..50 {
            let board = generator.generate(&params).unwrap();
            for target in board.targets() {
                assert!(board.robot_at(target.position).is_none());
            }
        }
    }

    #[test]
    fn test_seeded_generators_agree() {
        let params = GeneratorParams::default();
        let a = RandomBoardGenerator::seeded(3).generate(&params).unwrap();
        let b = RandomBoardGenerator::seeded(3).generate(&params).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_zero_density_has_no_walls() {
        let params = GeneratorParams {
            wall_density: 0.0,
            ..GeneratorParams::default()
        };
        let board = RandomBoardGenerator::seeded(1).generate(&params).unwrap();
        assert_eq!(board.walls().count(), 0);
    }

    #[test]
    fn test_rejects_impossible_counts() {
        let mut generator = RandomBoardGenerator::seeded(1);
        let too_many_targets = GeneratorParams {
            robot_count: 2,
            target_count: 3,
            ..GeneratorParams::default()
        };
        assert!(generator.generate(&too_many_targets).is_err());

        let crowded = GeneratorParams {
            width: 2,
            height: 2,
            robot_count: 3,
            target_count: 2,
            ..GeneratorParams::default()
        };
        assert!(generator.generate(&crowded).is_err());
    }

    #[test]
    fn test_multi_target_disabled() {
        let params = GeneratorParams {
            allow_multi_target: false,
            target_count: 3,
            ..GeneratorParams::default()
        };
        let mut generator = RandomBoardGenerator::seeded(5);
        for _ in 0..30 {
            let board = generator.generate(&params).unwrap();
            assert!(board
                .targets()
                .iter()
                .all(|t| t.color != TargetColor::Multi));
        }
    }
}
