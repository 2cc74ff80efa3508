//! The move engine: robots slide until something stops them.

use serde::{Deserialize, Serialize};

use crate::board::{Board, Color, Direction, Position};
use crate::error::{Result, RoboyardError};

/// A request to slide one robot in one direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Move {
    /// The robot to move.
    pub robot: Color,
    /// Direction of travel.
    pub direction: Direction,
}

impl Move {
    /// Creates a move.
    #[must_use]
    pub const fn new(robot: Color, direction: Direction) -> Self {
        Self { robot, direction }
    }
}

impl std::fmt::Display for Move {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.robot, self.direction)
    }
}

/// What stopped a sliding robot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Collision {
    /// A wall segment.
    HitWall,
    /// Another robot.
    HitRobot,
    /// The edge of the board.
    None,
}

/// Outcome of a slide that moved at least one square.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveResult {
    /// The move that was executed.
    pub mv: Move,
    /// Starting cell.
    pub from: Position,
    /// Resting cell.
    pub to: Position,
    /// Squares travelled, at least 1.
    pub squares: u32,
    /// What ended the slide.
    pub collision: Collision,
}

/// Computes where a move would end without touching the board.
///
/// Returns `InvalidRobot` if the robot is absent and `NoMovePossible` if it
/// cannot leave its cell.
pub fn plan_move(board: &Board, mv: Move) -> Result<MoveResult> {
    let robot = board
        .robot(mv.robot)
        .ok_or(RoboyardError::InvalidRobot { color: mv.robot })?;

    let from = robot.position;
    let mut pos = from;
    let mut squares = 0u32;
    let collision = loop {
        // a wall on the outer boundary is redundant with the edge
        let Some(next) = board.neighbor(pos, mv.direction) else {
            break Collision::None;
        };
        if board.wall_blocks(pos, mv.direction) {
            break Collision::HitWall;
        }
        if board.robot_at(next).is_some() {
            break Collision::HitRobot;
        }
        pos = next;
        squares += 1;
    };

    if squares == 0 {
        return Err(RoboyardError::NoMovePossible {
            color: mv.robot,
            direction: mv.direction,
        });
    }

    Ok(MoveResult {
        mv,
        from,
        to: pos,
        squares,
        collision,
    })
}

/// Slides a robot and updates the board.
///
/// On error the board is left untouched.
pub fn apply_move(board: &mut Board, mv: Move) -> Result<MoveResult> {
    let result = plan_move(board, mv)?;
    board.relocate(mv.robot, result.to);
    Ok(result)
}
