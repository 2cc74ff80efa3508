//! Undo history for a session.

use crate::board::Board;

/// State captured before a move so it can be undone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryEntry {
    /// Board as it was before the move.
    pub board: Board,
    /// Squares-moved counter before the move.
    pub squares_moved: u32,
}

/// Last-in-first-out stack of pre-move snapshots.
///
/// Snapshots are deep copies, so later moves never alter earlier entries.
#[derive(Debug, Clone, Default)]
pub struct History {
    entries: Vec<HistoryEntry>,
}

impl History {
    /// Creates an empty history.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Records the state before a move.
    pub fn push(&mut self, board: &Board, squares_moved: u32) {
        self.entries.push(HistoryEntry {
            board: board.clone(),
            squares_moved,
        });
    }

    /// Removes and returns the most recent snapshot.
    pub fn pop(&mut self) -> Option<HistoryEntry> {
        self.entries.pop()
    }

    /// Drops every snapshot.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Number of snapshots held.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` when there is nothing to undo.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::board::{Color, Position};

    #[test]
    fn test_pop_returns_most_recent() {
        let mut board = Board::new(3, 3).unwrap();
        board.add_robot(Color::Red, Position::new(0, 0)).unwrap();

        let mut history = History::new();
        history.push(&board, 0);
        board.relocate(Color::Red, Position::new(2, 0));
        history.push(&board, 2);

        let last = history.pop().unwrap();
        assert_eq!(last.squares_moved, 2);
        assert_eq!(last.board.robot(Color::Red).unwrap().position, Position::new(2, 0));

        let first = history.pop().unwrap();
        assert_eq!(first.squares_moved, 0);
        assert_eq!(first.board.robot(Color::Red).unwrap().position, Position::new(0, 0));

        assert!(history.pop().is_none());
    }

    #[test]
    fn test_snapshots_are_isolated() {
        let mut board = Board::new(3, 3).unwrap();
        board.add_robot(Color::Red, Position::new(0, 0)).unwrap();
        let mut history = History::new();
        history.push(&board, 0);

        board.relocate(Color::Red, Position::new(1, 1));

        let entry = history.pop().unwrap();
        assert_eq!(entry.board.robot(Color::Red).unwrap().position, Position::new(0, 0));
    }

    #[test]
    fn test_clear() {
        let board = Board::new(3, 3).unwrap();
        let mut history = History::new();
        history.push(&board, 0);
        history.push(&board, 1);
        assert_eq!(history.len(), 2);
        history.clear();
        assert!(history.is_empty());
    }
}
