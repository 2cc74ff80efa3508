//! Text notation for boards.
//!
//! One element per line, each terminated by `;`:
//!
//! ```text
//! board:16,16;
//! mh3,0;
//! mv5,2;
//! target_red8,11;
//! robot_blue6,1;
//! ```
//!
//! `mh` is a wall on the north edge of a cell and `mv` one on its west edge.
//! Blank lines and lines starting with `#` are skipped by the parser.

use std::fmt::Write;

use regex::Regex;

use crate::board::{Board, Color, Position, TargetColor, Wall, WallSide};
use crate::error::{Result, RoboyardError};

/// Renders a board in notation form.
///
/// Walls come out north walls first then west walls, each ordered by row
/// then column, followed by targets and robots in board order.
#[must_use]
pub fn serialize_board(board: &Board) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "board:{},{};", board.width(), board.height());
    for wall in board.walls() {
        let tag = match wall.side {
            WallSide::North => 'h',
            WallSide::West => 'v',
        };
        let _ = writeln!(out, "m{tag}{},{};", wall.x, wall.y);
    }
    for target in board.targets() {
        let _ = writeln!(
            out,
            "target_{}{},{};",
            target.color, target.position.x, target.position.y
        );
    }
    for robot in board.robots() {
        let _ = writeln!(
            out,
            "robot_{}{},{};",
            robot.color, robot.position.x, robot.position.y
        );
    }
    out
}

/// Parses a board from notation.
///
/// The first element must be the `board:` line. Errors carry the 1-based
/// line number of the offending line.
pub fn parse_board(text: &str) -> Result<Board> {
    let Ok(re) = Regex::new(
        r"^(?:board:(?P<w>\d+),(?P<h>\d+)|m(?P<side>[hv])(?P<wx>\d+),(?P<wy>\d+)|(?P<kind>target|robot)_(?P<color>[A-Za-z]+)(?P<x>\d+),(?P<y>\d+));$",
    ) else {
        return Err(RoboyardError::notation(0, "notation pattern failed to compile"));
    };

    let mut board: Option<Board> = None;

    for (index, raw) in text.lines().enumerate() {
        let line_no = index + 1;
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let caps = re
            .captures(line)
            .ok_or_else(|| RoboyardError::notation(line_no, format!("unrecognized line '{line}'")))?;
        let number = |name: &str| -> Result<usize> {
            caps.name(name)
                .map_or("", |m| m.as_str())
                .parse::<usize>()
                .map_err(|e| RoboyardError::notation(line_no, format!("bad number: {e}")))
        };

        if caps.name("w").is_some() {
            if board.is_some() {
                return Err(RoboyardError::notation(line_no, "duplicate board line"));
            }
            board = Some(
                Board::new(number("w")?, number("h")?)
                    .map_err(|e| RoboyardError::notation(line_no, e.to_string()))?,
            );
            continue;
        }

        let Some(board) = board.as_mut() else {
            return Err(RoboyardError::notation(
                line_no,
                "element before the board line",
            ));
        };

        let placed = if let Some(side) = caps.name("side") {
            let (x, y) = (number("wx")?, number("wy")?);
            let wall = if side.as_str() == "h" {
                Wall::north(x, y)
            } else {
                Wall::west(x, y)
            };
            board.add_wall(wall)
        } else {
            let color_name = caps.name("color").map_or("", |m| m.as_str());
            let position = Position::new(number("x")?, number("y")?);
            if caps.name("kind").map(|m| m.as_str()) == Some("target") {
                let color = TargetColor::from_name(color_name).ok_or_else(|| {
                    RoboyardError::notation(line_no, format!("unknown color '{color_name}'"))
                })?;
                board.add_target(color, position)
            } else {
                let color = Color::from_name(color_name).ok_or_else(|| {
                    RoboyardError::notation(line_no, format!("unknown robot color '{color_name}'"))
                })?;
                board.add_robot(color, position)
            }
        };
        placed.map_err(|e| RoboyardError::notation(line_no, e.to_string()))?;
    }

    board.ok_or_else(|| RoboyardError::notation(1, "missing board line"))
}
