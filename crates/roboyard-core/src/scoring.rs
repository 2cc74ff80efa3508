//! Star rating for a completed session.

/// Highest rating, awarded for beating the solver's move count.
pub const MAX_STARS: u8 = 4;

/// Rates a completed session from 0 to 4 stars.
///
/// `optimal_moves == 0` means no validated solution exists and always
/// scores 0. Beating the solver's count scores 4, since the solver answer
/// is only the best found when the board was generated.
#[must_use]
pub const fn stars(player_moves: u32, optimal_moves: u32, hints_used: u32) -> u8 {
    if optimal_moves == 0 {
        return 0;
    }
    if player_moves < optimal_moves {
        return MAX_STARS;
    }
    let over = player_moves - optimal_moves;
    match (over, hints_used) {
        (0, 0) => 3,
        (1, 0) | (0, 1) => 2,
        (0, 2) | (2, 0) => 1,
        _ => 0,
    }
}
