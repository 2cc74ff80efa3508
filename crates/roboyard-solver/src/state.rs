//! Compact search model shared by the solvers.
//!
//! A cell is `y * width + x`, which fits in 12 bits on the largest board. A
//! configuration packs one cell per robot into a `u128` key. Robots that no
//! target accepts only matter as blockers, so their cells are kept sorted
//! and configurations that differ by swapping them share a key.
//!
//! Walls and targets never change during a search, so the wall-only stop of
//! every cell in every direction is computed once, together with a relaxed
//! distance to each target.

use roboyard_core::{apply_move, Board, Color, Direction, Move, Position, TargetColor};

use crate::SolveFailure;

/// A board cell index.
pub type Cell = u16;

/// A packed configuration.
pub type Key = u128;

const CELL_BITS: u32 = 12;
const CELL_MASK: Key = (1 << CELL_BITS) - 1;

/// Distance of a cell that can never reach the target.
pub const UNREACHABLE: u8 = u8::MAX;

const fn direction_index(direction: Direction) -> usize {
    match direction {
        Direction::North => 0,
        Direction::East => 1,
        Direction::South => 2,
        Direction::West => 3,
    }
}

struct TargetCell {
    cell: Cell,
    color: TargetColor,
    /// Fewest moves to the target for a robot that may stop on any cell.
    distance: Vec<u8>,
}

pub struct SearchBoard {
    width: usize,
    /// Robot color per slot. Slots below `relevant` can satisfy a target.
    slots: Vec<Color>,
    relevant: usize,
    /// Wall and edge stops per cell, in `Direction::ALL` order.
    stops: Vec<[Cell; 4]>,
    targets: Vec<TargetCell>,
}

impl SearchBoard {
    pub fn new(board: &Board) -> Self {
        let width = board.width();
        let accepted =
            |color: Color| board.targets().iter().any(|t| t.color.accepts(color));

        let mut slots: Vec<Color> = board
            .robots()
            .iter()
            .map(|r| r.color)
            .filter(|&c| accepted(c))
            .collect();
        let relevant = slots.len();
        slots.extend(
            board
                .robots()
                .iter()
                .map(|r| r.color)
                .filter(|&c| !accepted(c)),
        );

        let mut model = Self {
            width,
            slots,
            relevant,
            stops: Vec::with_capacity(width * board.height()),
            targets: Vec::new(),
        };

        for y in 0..board.height() {
            for x in 0..width {
                let mut stops = [0; 4];
                for direction in Direction::ALL {
                    let mut pos = Position::new(x, y);
                    while let Some(next) = open_step(board, pos, direction) {
                        pos = next;
                    }
                    stops[direction_index(direction)] = model.cell(pos);
                }
                model.stops.push(stops);
            }
        }

        model.targets = board
            .targets()
            .iter()
            .map(|t| TargetCell {
                cell: model.cell(t.position),
                color: t.color,
                distance: relaxed_distance(board, t.position),
            })
            .collect();
        model
    }

    #[allow(clippy::cast_possible_truncation)]
    const fn cell(&self, pos: Position) -> Cell {
        (pos.y * self.width + pos.x) as Cell
    }

    const fn position(&self, cell: Cell) -> Position {
        let cell = cell as usize;
        Position::new(cell % self.width, cell / self.width)
    }

    /// Robot cells of `board` in slot order.
    pub fn start(&self, board: &Board) -> Vec<Cell> {
        let mut cells: Vec<Cell> = self
            .slots
            .iter()
            .filter_map(|&color| board.robot(color))
            .map(|robot| self.cell(robot.position))
            .collect();
        self.canonicalize(&mut cells);
        cells
    }

    pub fn canonicalize(&self, cells: &mut [Cell]) {
        cells[self.relevant..].sort_unstable();
    }

    pub fn key(cells: &[Cell]) -> Key {
        cells
            .iter()
            .fold(0, |key, &cell| (key << CELL_BITS) | Key::from(cell))
    }

    #[allow(clippy::cast_possible_truncation)]
    pub fn decode(&self, mut key: Key) -> Vec<Cell> {
        let mut cells = vec![0; self.slots.len()];
        for cell in cells.iter_mut().rev() {
            *cell = (key & CELL_MASK) as Cell;
            key >>= CELL_BITS;
        }
        cells
    }

    /// Where the robot in `slot` stops when sliding towards `direction`,
    /// `None` if it cannot leave its cell.
    pub fn slide(&self, cells: &[Cell], slot: usize, direction: Direction) -> Option<Cell> {
        let from = cells[slot];
        let mut stop = self.stops[usize::from(from)][direction_index(direction)];
        if stop == from {
            return None;
        }

        let origin = self.position(from);
        for (other_slot, &other) in cells.iter().enumerate() {
            if other_slot == slot {
                continue;
            }
            let other = self.position(other);
            let end = self.position(stop);
            let shortened = match direction {
                Direction::North if other.x == origin.x && end.y <= other.y && other.y < origin.y => {
                    Some(Position::new(origin.x, other.y + 1))
                }
                Direction::South if other.x == origin.x && origin.y < other.y && other.y <= end.y => {
                    Some(Position::new(origin.x, other.y - 1))
                }
                Direction::West if other.y == origin.y && end.x <= other.x && other.x < origin.x => {
                    Some(Position::new(other.x + 1, origin.y))
                }
                Direction::East if other.y == origin.y && origin.x < other.x && other.x <= end.x => {
                    Some(Position::new(other.x - 1, origin.y))
                }
                _ => None,
            };
            if let Some(pos) = shortened {
                stop = self.cell(pos);
            }
        }
        (stop != from).then_some(stop)
    }

    pub fn is_solved(&self, cells: &[Cell]) -> bool {
        !self.targets.is_empty()
            && self.targets.iter().all(|target| {
                cells[..self.relevant]
                    .iter()
                    .zip(&self.slots)
                    .any(|(&cell, &color)| cell == target.cell && target.color.accepts(color))
            })
    }

    /// A lower bound on the moves left. Each target needs at least the
    /// relaxed distance of its closest accepting robot.
    pub fn heuristic(&self, cells: &[Cell]) -> u8 {
        self.targets
            .iter()
            .map(|target| {
                cells[..self.relevant]
                    .iter()
                    .zip(&self.slots)
                    .filter(|&(_, &color)| target.color.accepts(color))
                    .map(|(&cell, _)| target.distance[usize::from(cell)])
                    .min()
                    .unwrap_or(UNREACHABLE)
            })
            .max()
            .unwrap_or(0)
    }

    /// Turns `(from cell, direction)` steps into moves by replaying them on
    /// `board`.
    pub fn replay(
        &self,
        board: &Board,
        steps: &[(Cell, Direction)],
    ) -> Result<Vec<Move>, SolveFailure> {
        let mut board = board.clone();
        steps
            .iter()
            .map(|&(from, direction)| {
                let pos = self.position(from);
                let color = board.robot_at(pos).map(|r| r.color).ok_or_else(|| {
                    SolveFailure::no_solution(format!("no robot on {pos} while replaying"))
                })?;
                let mv = Move::new(color, direction);
                apply_move(&mut board, mv).map_err(|e| SolveFailure::no_solution(e.to_string()))?;
                Ok(mv)
            })
            .collect()
    }
}

/// The next cell towards `direction` if no wall or edge is in the way.
fn open_step(board: &Board, pos: Position, direction: Direction) -> Option<Position> {
    let next = board.neighbor(pos, direction)?;
    (!board.wall_blocks(pos, direction)).then_some(next)
}

/// Breadth-first distances from `target` along wall-free lines. Lines of
/// sight are symmetric, so searching outwards from the target gives the
/// distance towards it.
fn relaxed_distance(board: &Board, target: Position) -> Vec<u8> {
    let width = board.width();
    let mut distance = vec![UNREACHABLE; width * board.height()];
    distance[target.y * width + target.x] = 0;
    let mut frontier = vec![target];
    let mut depth: u8 = 0;

    while !frontier.is_empty() && depth < UNREACHABLE - 1 {
        depth += 1;
        let mut next_frontier = Vec::new();
        for pos in frontier {
            for direction in Direction::ALL {
                let mut cursor = pos;
                while let Some(next) = open_step(board, cursor, direction) {
                    cursor = next;
                    let seen = &mut distance[next.y * width + next.x];
                    if *seen == UNREACHABLE {
                        *seen = depth;
                        next_frontier.push(next);
                    }
                }
            }
        }
        frontier = next_frontier;
    }
    distance
}
