//! Computer opponents.
//!
//! All strategies are pure functions of the position and the mark to move:
//! they read the board, never mutate it (Hard searches over cloned
//! scratch copies), and return `None` only when no legal move exists.

mod easy;
mod hard;
mod medium;

use crate::game::{Board, Mark, Move};
use rand::Rng;

/// Strength of the computer opponent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Difficulty {
    /// Random sub-board selection with light local tactics.
    Easy,
    /// Probability-gated win/block cascade with deliberate lapses.
    Medium,
    /// Depth-limited minimax with alpha-beta pruning; deterministic.
    Hard,
}

impl std::fmt::Display for Difficulty {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Difficulty::Easy => write!(f, "easy"),
            Difficulty::Medium => write!(f, "medium"),
            Difficulty::Hard => write!(f, "hard"),
        }
    }
}

/// Picks a move for `mark` at the given difficulty.
///
/// Returns `None` iff the position has no legal move.
pub fn choose_move<R: Rng + ?Sized>(
    board: &Board,
    mark: Mark,
    difficulty: Difficulty,
    rng: &mut R,
) -> Option<Move> {
    match difficulty {
        Difficulty::Easy => easy::choose(board, mark, rng),
        Difficulty::Medium => medium::choose(board, mark, rng),
        Difficulty::Hard => hard::choose(board, mark),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::rules;

    #[test]
    fn test_all_difficulties_return_legal_moves() {
        let mut rng = rand::thread_rng();
        let board = Board::new();
        for difficulty in [Difficulty::Easy, Difficulty::Medium, Difficulty::Hard] {
            for _ in 0..20 {
                let mv = choose_move(&board, Mark::X, difficulty, &mut rng)
                    .expect("open position must yield a move");
                assert!(rules::is_legal(&board, mv), "{difficulty} gave illegal move");
            }
        }
    }
}
