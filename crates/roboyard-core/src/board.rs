//! The board model: grid dimensions, walls, robots and targets.
//!
//! Coordinates grow east (`x`) and south (`y`) from the north-west corner.
//! Every wall lies on exactly one grid edge: a [`WallSide::North`] wall is the
//! segment above cell `(x, y)` and a [`WallSide::West`] wall is the segment to
//! its left. Walls on the outer boundary are legal and redundant.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Result, RoboyardError};

// ============================================================================
// Colors and Directions
// ============================================================================

/// Robot colors. A robot is identified by its color, so a board holds at
/// most one robot of each.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Color {
    /// Pink robot.
    Pink,
    /// Green robot.
    Green,
    /// Blue robot.
    Blue,
    /// Yellow robot.
    Yellow,
    /// Silver robot.
    Silver,
    /// Red robot.
    Red,
    /// Brown robot.
    Brown,
    /// Orange robot.
    Orange,
    /// White robot.
    White,
}

impl Color {
    /// Every robot color, in placement order.
    pub const ALL: [Self; 9] = [
        Self::Pink,
        Self::Green,
        Self::Blue,
        Self::Yellow,
        Self::Silver,
        Self::Red,
        Self::Brown,
        Self::Orange,
        Self::White,
    ];

    /// Lower-case name used in board notation and the terminal.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Pink => "pink",
            Self::Green => "green",
            Self::Blue => "blue",
            Self::Yellow => "yellow",
            Self::Silver => "silver",
            Self::Red => "red",
            Self::Brown => "brown",
            Self::Orange => "orange",
            Self::White => "white",
        }
    }

    /// Single-letter symbol for ASCII rendering.
    #[must_use]
    pub const fn symbol(self) -> char {
        match self {
            Self::Pink => 'P',
            Self::Green => 'G',
            Self::Blue => 'B',
            Self::Yellow => 'Y',
            Self::Silver => 'S',
            Self::Red => 'R',
            Self::Brown => 'N',
            Self::Orange => 'O',
            Self::White => 'W',
        }
    }

    /// Parses a color name, case-insensitively.
    #[must_use]
    pub fn from_name(s: &str) -> Option<Self> {
        let s = s.to_lowercase();
        Self::ALL.into_iter().find(|c| c.name() == s)
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Color requirement of a target: one specific robot, or any robot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TargetColor {
    /// Only the robot of this color completes the target.
    Solid(Color),
    /// Any robot completes the target.
    Multi,
}

impl TargetColor {
    /// Returns `true` if a robot of `color` satisfies this target.
    #[must_use]
    pub fn accepts(self, color: Color) -> bool {
        match self {
            Self::Solid(c) => c == color,
            Self::Multi => true,
        }
    }

    /// Lower-case name used in board notation.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Solid(c) => c.name(),
            Self::Multi => "multi",
        }
    }

    /// Parses a target color name, case-insensitively.
    #[must_use]
    pub fn from_name(s: &str) -> Option<Self> {
        if s.eq_ignore_ascii_case("multi") {
            return Some(Self::Multi);
        }
        Color::from_name(s).map(Self::Solid)
    }
}

impl fmt::Display for TargetColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl<'de> Deserialize<'de> for TargetColor {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::from_name(&s).ok_or_else(|| {
            serde::de::Error::custom(format!(
                "invalid target color '{s}': expected a robot color or 'multi'"
            ))
        })
    }
}

impl Serialize for TargetColor {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.name())
    }
}

/// The four movement directions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// Towards `y = 0`.
    North,
    /// Towards `x = width - 1`.
    East,
    /// Towards `y = height - 1`.
    South,
    /// Towards `x = 0`.
    West,
}

impl Direction {
    /// All directions in clockwise order starting north.
    pub const ALL: [Self; 4] = [Self::North, Self::East, Self::South, Self::West];

    /// Lower-case name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::North => "north",
            Self::East => "east",
            Self::South => "south",
            Self::West => "west",
        }
    }

    /// Parses a direction from its name or its first letter.
    #[must_use]
    pub fn from_name(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "n" | "north" | "up" => Some(Self::North),
            "e" | "east" | "right" => Some(Self::East),
            "s" | "south" | "down" => Some(Self::South),
            "w" | "west" | "left" => Some(Self::West),
            _ => None,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ============================================================================
// Board Elements
// ============================================================================

/// A cell coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Position {
    /// Column, growing east.
    pub x: usize,
    /// Row, growing south.
    pub y: usize,
}

impl Position {
    /// Creates a position.
    #[must_use]
    pub const fn new(x: usize, y: usize) -> Self {
        Self { x, y }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({},{})", self.x, self.y)
    }
}

/// Which edge of its cell a wall occupies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WallSide {
    /// The horizontal segment above the cell.
    North,
    /// The vertical segment left of the cell.
    West,
}

/// A wall segment on one grid edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Wall {
    /// Edge kind.
    pub side: WallSide,
    /// Row of the owning cell.
    pub y: usize,
    /// Column of the owning cell.
    pub x: usize,
}

impl Wall {
    /// Horizontal wall above cell `(x, y)`.
    #[must_use]
    pub const fn north(x: usize, y: usize) -> Self {
        Self {
            side: WallSide::North,
            y,
            x,
        }
    }

    /// Vertical wall left of cell `(x, y)`.
    #[must_use]
    pub const fn west(x: usize, y: usize) -> Self {
        Self {
            side: WallSide::West,
            y,
            x,
        }
    }
}

/// A robot and where it stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Robot {
    /// Identity of the robot.
    pub color: Color,
    /// Current cell.
    pub position: Position,
}

/// A target cell and the robot color it wants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Target {
    /// Required robot color.
    pub color: TargetColor,
    /// Target cell.
    pub position: Position,
}

// ============================================================================
// Board
// ============================================================================

/// Largest supported side length.
pub const MAX_BOARD_SIZE: usize = 64;

/// A puzzle position: dimensions, walls, robots and targets.
///
/// Mutation goes through methods that keep every element in bounds, one
/// robot per cell and one robot per color. Cloning yields an independent
/// snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Board {
    width: usize,
    height: usize,
    walls: BTreeSet<Wall>,
    robots: Vec<Robot>,
    targets: Vec<Target>,
}

impl Board {
    /// Creates an empty board.
    pub fn new(width: usize, height: usize) -> Result<Self> {
        if width == 0 || height == 0 || width > MAX_BOARD_SIZE || height > MAX_BOARD_SIZE {
            return Err(RoboyardError::invalid_board(format!(
                "dimensions {width}x{height} outside 1..={MAX_BOARD_SIZE}"
            )));
        }
        Ok(Self {
            width,
            height,
            walls: BTreeSet::new(),
            robots: Vec::new(),
            targets: Vec::new(),
        })
    }

    /// Board width in cells.
    #[must_use]
    pub const fn width(&self) -> usize {
        self.width
    }

    /// Board height in cells.
    #[must_use]
    pub const fn height(&self) -> usize {
        self.height
    }

    /// Returns `true` if `pos` lies on the grid.
    #[must_use]
    pub const fn contains(&self, pos: Position) -> bool {
        pos.x < self.width && pos.y < self.height
    }

    /// Adds a wall. Adding the same wall twice is a no-op.
    pub fn add_wall(&mut self, wall: Wall) -> Result<()> {
        let in_bounds = match wall.side {
            WallSide::North => wall.x < self.width && wall.y <= self.height,
            WallSide::West => wall.x <= self.width && wall.y < self.height,
        };
        if !in_bounds {
            return Err(RoboyardError::invalid_board(format!(
                "wall {:?} at ({},{}) is off the {}x{} grid",
                wall.side, wall.x, wall.y, self.width, self.height
            )));
        }
        self.walls.insert(wall);
        Ok(())
    }

    /// Places a robot on a free cell.
    pub fn add_robot(&mut self, color: Color, position: Position) -> Result<()> {
        if !self.contains(position) {
            return Err(RoboyardError::invalid_board(format!(
                "{color} robot at {position} is off the grid"
            )));
        }
        if self.robot(color).is_some() {
            return Err(RoboyardError::invalid_board(format!(
                "duplicate {color} robot"
            )));
        }
        if let Some(other) = self.robot_at(position) {
            return Err(RoboyardError::invalid_board(format!(
                "{color} robot at {position} overlaps the {} robot",
                other.color
            )));
        }
        self.robots.push(Robot { color, position });
        Ok(())
    }

    /// Places a target on a cell without another target.
    pub fn add_target(&mut self, color: TargetColor, position: Position) -> Result<()> {
        if !self.contains(position) {
            return Err(RoboyardError::invalid_board(format!(
                "{color} target at {position} is off the grid"
            )));
        }
        if self.targets.iter().any(|t| t.position == position) {
            return Err(RoboyardError::invalid_board(format!(
                "two targets at {position}"
            )));
        }
        self.targets.push(Target { color, position });
        Ok(())
    }

    /// All walls in `(side, y, x)` order.
    pub fn walls(&self) -> impl Iterator<Item = &Wall> {
        self.walls.iter()
    }

    /// Returns `true` if the board has this exact wall.
    #[must_use]
    pub fn has_wall(&self, wall: Wall) -> bool {
        self.walls.contains(&wall)
    }

    /// Robots in placement order.
    #[must_use]
    pub fn robots(&self) -> &[Robot] {
        &self.robots
    }

    /// Targets in placement order.
    #[must_use]
    pub fn targets(&self) -> &[Target] {
        &self.targets
    }

    /// Looks up a robot by color.
    #[must_use]
    pub fn robot(&self, color: Color) -> Option<&Robot> {
        self.robots.iter().find(|r| r.color == color)
    }

    /// The robot standing on `pos`, if any.
    #[must_use]
    pub fn robot_at(&self, pos: Position) -> Option<&Robot> {
        self.robots.iter().find(|r| r.position == pos)
    }

    /// Positions of all robots in placement order.
    #[must_use]
    pub fn robot_positions(&self) -> Vec<Position> {
        self.robots.iter().map(|r| r.position).collect()
    }

    /// Returns `true` if a wall sits on the edge leaving `pos` towards `dir`.
    #[must_use]
    pub fn wall_blocks(&self, pos: Position, dir: Direction) -> bool {
        let wall = match dir {
            Direction::North => Wall::north(pos.x, pos.y),
            Direction::South => Wall::north(pos.x, pos.y + 1),
            Direction::West => Wall::west(pos.x, pos.y),
            Direction::East => Wall::west(pos.x + 1, pos.y),
        };
        self.walls.contains(&wall)
    }

    /// The neighbouring cell of `pos` towards `dir`, if it is on the grid.
    #[must_use]
    pub fn neighbor(&self, pos: Position, dir: Direction) -> Option<Position> {
        let next = match dir {
            Direction::North => Position::new(pos.x, pos.y.checked_sub(1)?),
            Direction::South => Position::new(pos.x, pos.y + 1),
            Direction::West => Position::new(pos.x.checked_sub(1)?, pos.y),
            Direction::East => Position::new(pos.x + 1, pos.y),
        };
        self.contains(next).then_some(next)
    }

    /// Moves an existing robot. Callers guarantee `to` is free and on the grid.
    pub(crate) fn relocate(&mut self, color: Color, to: Position) {
        if let Some(robot) = self.robots.iter_mut().find(|r| r.color == color) {
            robot.position = to;
        }
    }

    /// Returns `true` once every target has a matching robot on it.
    ///
    /// A board without targets is never solved.
    #[must_use]
    pub fn is_solved(&self) -> bool {
        !self.targets.is_empty()
            && self.targets.iter().all(|t| {
                self.robot_at(t.position)
                    .is_some_and(|r| t.color.accepts(r.color))
            })
    }

    /// Compares everything except robot positions.
    #[must_use]
    pub fn same_layout(&self, other: &Self) -> bool {
        self.width == other.width
            && self.height == other.height
            && self.walls == other.walls
            && self.targets == other.targets
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for y in 0..=self.height {
            let mut top = String::from("+");
            for x in 0..self.width {
                let closed = y == 0 || y == self.height || self.has_wall(Wall::north(x, y));
                top.push_str(if closed { "---+" } else { "   +" });
            }
            writeln!(f, "{top}")?;
            if y == self.height {
                break;
            }

            let mut row = String::new();
            for x in 0..=self.width {
                let closed = x == 0 || x == self.width || self.has_wall(Wall::west(x, y));
                row.push(if closed { '|' } else { ' ' });
                if x == self.width {
                    break;
                }
                let pos = Position::new(x, y);
                let robot = self.robot_at(pos).map_or('.', |r| r.color.symbol());
                let target = self
                    .targets
                    .iter()
                    .find(|t| t.position == pos)
                    .map_or(' ', |t| match t.color {
                        TargetColor::Solid(c) => c.symbol().to_ascii_lowercase(),
                        TargetColor::Multi => '*',
                    });
                row.push(' ');
                row.push(robot);
                row.push(target);
            }
            writeln!(f, "{row}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn small_board() -> Board {
        let mut board = Board::new(4, 4).unwrap();
        board.add_robot(Color::Red, Position::new(0, 0)).unwrap();
        board.add_robot(Color::Blue, Position::new(3, 3)).unwrap();
        board
            .add_target(TargetColor::Solid(Color::Red), Position::new(2, 0))
            .unwrap();
        board
    }

    #[test]
    fn test_color_names_roundtrip() {
        for color in Color::ALL {
            assert_eq!(Color::from_name(color.name()), Some(color));
        }
        assert_eq!(Color::from_name("RED"), Some(Color::Red));
        assert_eq!(Color::from_name("teal"), None);
    }

    #[test]
    fn test_target_color_accepts() {
        assert!(TargetColor::Multi.accepts(Color::Green));
        assert!(TargetColor::Solid(Color::Red).accepts(Color::Red));
        assert!(!TargetColor::Solid(Color::Red).accepts(Color::Blue));
        assert_eq!(TargetColor::from_name("Multi"), Some(TargetColor::Multi));
    }

    #[test]
    fn test_target_color_serializes_as_name() {
        let json = serde_json::to_string(&TargetColor::Solid(Color::Yellow)).unwrap();
        assert_eq!(json, "\"yellow\"");
        let parsed: TargetColor = serde_json::from_str("\"multi\"").unwrap();
        assert_eq!(parsed, TargetColor::Multi);
    }

    #[test]
    fn test_direction_parsing() {
        assert_eq!(Direction::from_name("n"), Some(Direction::North));
        assert_eq!(Direction::from_name("East"), Some(Direction::East));
        assert_eq!(Direction::from_name("down"), Some(Direction::South));
        assert_eq!(Direction::from_name("x"), None);
    }

    #[test]
    fn test_rejects_bad_dimensions() {
        assert!(Board::new(0, 4).is_err());
        assert!(Board::new(4, MAX_BOARD_SIZE + 1).is_err());
    }

    #[test]
    fn test_rejects_overlapping_robots() {
        let mut board = small_board();
        let err = board.add_robot(Color::Green, Position::new(0, 0)).unwrap_err();
        assert!(err.to_string().contains("overlaps the red robot"));
    }

    #[test]
    fn test_rejects_duplicate_color() {
        let mut board = small_board();
        assert!(board.add_robot(Color::Red, Position::new(1, 1)).is_err());
    }

    #[test]
    fn test_rejects_off_grid_elements() {
        let mut board = small_board();
        assert!(board.add_robot(Color::Green, Position::new(4, 0)).is_err());
        assert!(board
            .add_target(TargetColor::Multi, Position::new(0, 9))
            .is_err());
        assert!(board.add_wall(Wall::north(4, 0)).is_err());
        assert!(board.add_wall(Wall::west(0, 4)).is_err());
    }

    #[test]
    fn test_boundary_walls_are_legal() {
        let mut board = small_board();
        board.add_wall(Wall::north(1, 4)).unwrap();
        board.add_wall(Wall::west(4, 1)).unwrap();
        assert_eq!(board.walls().count(), 2);
    }

    #[test]
    fn test_wall_blocks_both_sides() {
        let mut board = small_board();
        board.add_wall(Wall::west(2, 1)).unwrap();
        board.add_wall(Wall::north(0, 2)).unwrap();

        assert!(board.wall_blocks(Position::new(1, 1), Direction::East));
        assert!(board.wall_blocks(Position::new(2, 1), Direction::West));
        assert!(!board.wall_blocks(Position::new(2, 1), Direction::East));
        assert!(board.wall_blocks(Position::new(0, 1), Direction::South));
        assert!(board.wall_blocks(Position::new(0, 2), Direction::North));
    }

    #[test]
    fn test_neighbor_respects_edges() {
        let board = small_board();
        assert_eq!(board.neighbor(Position::new(0, 0), Direction::North), None);
        assert_eq!(board.neighbor(Position::new(0, 0), Direction::West), None);
        assert_eq!(board.neighbor(Position::new(3, 3), Direction::East), None);
        assert_eq!(
            board.neighbor(Position::new(1, 1), Direction::South),
            Some(Position::new(1, 2))
        );
    }

    #[test]
    fn test_is_solved() {
        let mut board = small_board();
        assert!(!board.is_solved());
        board.relocate(Color::Red, Position::new(2, 0));
        assert!(board.is_solved());
    }

    #[test]
    fn test_wrong_color_does_not_solve() {
        let mut board = small_board();
        board.relocate(Color::Blue, Position::new(2, 0));
        assert!(!board.is_solved());
    }

    #[test]
    fn test_board_without_targets_is_never_solved() {
        let mut board = Board::new(3, 3).unwrap();
        board.add_robot(Color::Red, Position::new(1, 1)).unwrap();
        assert!(!board.is_solved());
    }

    #[test]
    fn test_multi_target_accepts_any_robot() {
        let mut board = Board::new(3, 3).unwrap();
        board.add_robot(Color::Green, Position::new(1, 1)).unwrap();
        board.add_target(TargetColor::Multi, Position::new(1, 1)).unwrap();
        assert!(board.is_solved());
    }

    #[test]
    fn test_same_layout_ignores_robots() {
        let board = small_board();
        let mut moved = board.clone();
        moved.relocate(Color::Blue, Position::new(3, 0));
        assert!(board.same_layout(&moved));
        assert_ne!(board, moved);

        let mut walled = board.clone();
        walled.add_wall(Wall::north(1, 1)).unwrap();
        assert!(!board.same_layout(&walled));
    }

    #[test]
    fn test_clone_is_independent() {
        let board = small_board();
        let mut copy = board.clone();
        copy.relocate(Color::Red, Position::new(1, 0));
        assert_eq!(board.robot(Color::Red).unwrap().position, Position::new(0, 0));
    }

    #[test]
    fn test_display_marks_robots_and_targets() {
        let board = small_board();
        let text = board.to_string();
        assert!(text.contains('R'));
        assert!(text.contains('r'));
        assert_eq!(text.lines().count(), 9);
    }
}
