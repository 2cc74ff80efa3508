//! Difficulty validation for generated boards.
//!
//! The validator is a small state machine the session controller drives one
//! solver answer at a time:
//!
//! ```text
//! Generating --candidate_submitted--> Solving --on_solution/on_failure--> Accepted
//!     ^                                  |
//!     +------------- Regenerate ---------+
//! ```
//!
//! Every rejection increments an attempt counter and the validator accepts
//! whatever it has once the counter reaches its cap, so a validation run
//! asks for at most `max_attempts + 1` solves.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::difficulty::DifficultyBand;

/// Default cap on regenerations for one new game.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 999;

/// Where the validator is in its cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationPhase {
    /// Waiting for a candidate board.
    Generating,
    /// Waiting for the solver's answer on the candidate.
    Solving,
    /// A board has been accepted; the validator is done.
    Accepted,
}

/// Why a board was accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AcceptReason {
    /// The optimal solution length fell inside the band.
    InBand,
    /// The attempt cap was reached.
    CapReached,
    /// The solver failed; the board is kept without a solution.
    SolverFailed,
    /// Regeneration was switched off by the caller.
    RegenerationStopped,
    /// The generator could not produce a replacement.
    GeneratorFailed,
}

/// The validator's decision on a solved candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// Keep the current candidate.
    Accept {
        /// Why it was kept.
        reason: AcceptReason,
        /// Rejections that preceded it.
        attempts: u32,
    },
    /// Discard the candidate and generate another.
    Regenerate {
        /// 1-based number of this rejection.
        attempt: u32,
    },
}

/// Bounded accept/regenerate loop for one procedural game.
#[derive(Debug, Clone)]
pub struct DifficultyValidator {
    band: DifficultyBand,
    max_attempts: u32,
    attempts: u32,
    phase: ValidationPhase,
}

impl DifficultyValidator {
    /// Creates a validator for `band` that gives up after `max_attempts` rejections.
    #[must_use]
    pub const fn new(band: DifficultyBand, max_attempts: u32) -> Self {
        Self {
            band,
            max_attempts,
            attempts: 0,
            phase: ValidationPhase::Generating,
        }
    }

    /// Current phase.
    #[must_use]
    pub const fn phase(&self) -> ValidationPhase {
        self.phase
    }

    /// Rejections so far.
    #[must_use]
    pub const fn attempts(&self) -> u32 {
        self.attempts
    }

    /// The band candidates are checked against.
    #[must_use]
    pub const fn band(&self) -> DifficultyBand {
        self.band
    }

    /// Records that a candidate went to the solver.
    pub fn candidate_submitted(&mut self) {
        self.phase = ValidationPhase::Solving;
    }

    /// Judges a candidate whose optimal solution has `moves` moves.
    ///
    /// With `allow_regeneration` false the candidate is always accepted.
    pub fn on_solution(&mut self, moves: usize, allow_regeneration: bool) -> Verdict {
        let in_band = self.band.contains(moves);

        if !in_band && allow_regeneration && self.attempts < self.max_attempts {
            self.attempts += 1;
            self.phase = ValidationPhase::Generating;
            debug!(
                moves,
                band = %self.band,
                attempt = self.attempts,
                max_attempts = self.max_attempts,
                "Candidate outside difficulty band"
            );
            return Verdict::Regenerate {
                attempt: self.attempts,
            };
        }

        let reason = if in_band {
            AcceptReason::InBand
        } else if allow_regeneration {
            AcceptReason::CapReached
        } else {
            AcceptReason::RegenerationStopped
        };
        self.accept(reason)
    }

    /// Accepts the candidate without a solution and resets the counter.
    pub fn on_failure(&mut self) -> Verdict {
        let verdict = self.accept(AcceptReason::SolverFailed);
        self.attempts = 0;
        verdict
    }

    /// Accepts the candidate because no replacement could be generated.
    pub fn on_generator_failure(&mut self) -> Verdict {
        self.accept(AcceptReason::GeneratorFailed)
    }

    fn accept(&mut self, reason: AcceptReason) -> Verdict {
        self.phase = ValidationPhase::Accepted;
        Verdict::Accept {
            reason,
            attempts: self.attempts,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::difficulty::DifficultyTier;

    fn beginner(max_attempts: u32) -> DifficultyValidator {
        DifficultyValidator::new(DifficultyTier::Beginner.band(), max_attempts)
    }

    #[test]
    fn test_accepts_in_band_immediately() {
        let mut validator = beginner(DEFAULT_MAX_ATTEMPTS);
        validator.candidate_submitted();
        assert_eq!(validator.phase(), ValidationPhase::Solving);

        let verdict = validator.on_solution(5, true);
        assert_eq!(
            verdict,
            Verdict::Accept {
                reason: AcceptReason::InBand,
                attempts: 0
            }
        );
        assert_eq!(validator.phase(), ValidationPhase::Accepted);
    }

    #[test]
    fn test_rejects_too_easy_and_too_hard() {
        let mut validator = beginner(10);
        assert_eq!(validator.on_solution(3, true), Verdict::Regenerate { attempt: 1 });
        assert_eq!(validator.phase(), ValidationPhase::Generating);
        assert_eq!(validator.on_solution(7, true), Verdict::Regenerate { attempt: 2 });
        assert!(matches!(
            validator.on_solution(6, true),
            Verdict::Accept {
                reason: AcceptReason::InBand,
                attempts: 2
            }
        ));
    }

    #[test]
    fn test_cap_bounds_the_loop() {
        let mut validator = beginner(5);
        let mut solves = 0;
        let verdict = loop {
            validator.candidate_submitted();
            solves += 1;
            match validator.on_solution(2, true) {
                Verdict::Regenerate { .. } => continue,
                accept @ Verdict::Accept { .. } => break accept,
            }
        };
        assert_eq!(solves, 6);
        assert_eq!(
            verdict,
            Verdict::Accept {
                reason: AcceptReason::CapReached,
                attempts: 5
            }
        );
    }

    #[test]
    fn test_band_alone_decides() {
        let open = DifficultyBand {
            min_moves: 0,
            max_moves: None,
        };
        let mut validator = DifficultyValidator::new(open, 3);
        assert_eq!(
            validator.on_solution(1, true),
            Verdict::Accept {
                reason: AcceptReason::InBand,
                attempts: 0
            }
        );

        let mut validator = DifficultyValidator::new(DifficultyTier::Insane.band(), 3);
        assert_eq!(validator.on_solution(9, true), Verdict::Regenerate { attempt: 1 });
        assert!(matches!(
            validator.on_solution(10, true),
            Verdict::Accept {
                reason: AcceptReason::InBand,
                ..
            }
        ));
    }

    #[test]
    fn test_failure_accepts_and_resets_counter() {
        let mut validator = beginner(10);
        validator.on_solution(1, true);
        validator.on_solution(1, true);
        assert_eq!(validator.attempts(), 2);

        let verdict = validator.on_failure();
        assert_eq!(
            verdict,
            Verdict::Accept {
                reason: AcceptReason::SolverFailed,
                attempts: 2
            }
        );
        assert_eq!(validator.attempts(), 0);
        assert_eq!(validator.phase(), ValidationPhase::Accepted);
    }

    #[test]
    fn test_stopped_regeneration_accepts_anything() {
        let mut validator = beginner(10);
        assert!(matches!(
            validator.on_solution(1, false),
            Verdict::Accept {
                reason: AcceptReason::RegenerationStopped,
                ..
            }
        ));
    }

    #[test]
    fn test_generator_failure_accepts() {
        let mut validator = beginner(10);
        validator.on_solution(1, true);
        assert!(matches!(
            validator.on_generator_failure(),
            Verdict::Accept {
                reason: AcceptReason::GeneratorFailed,
                attempts: 1
            }
        ));
    }
}
