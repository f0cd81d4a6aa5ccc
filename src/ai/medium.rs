//! Medium strategy: a probability-gated priority cascade.
//!
//! Each tier fires only if it has candidates and its coin succeeds, so the
//! opponent cannot rely on the engine always winning or always blocking.

use crate::game::{rules, Board, Mark, Move};
use rand::seq::SliceRandom;
use rand::Rng;

const TAKE_LOCAL_WIN: f64 = 0.90;
const BLOCK_LOCAL_WIN: f64 = 0.90;
const TAKE_GLOBAL_WIN: f64 = 0.85;
const BLOCK_GLOBAL_WIN: f64 = 0.85;
const PREFER_CENTER: f64 = 0.30;
const PREFER_CORNER: f64 = 0.20;
/// Share of top-scored moves the final tier samples from.
const TOP_SHARE: f64 = 0.30;

const CENTER: usize = 4;
const CORNERS: [usize; 4] = [0, 2, 6, 8];

/// Picks a move through the cascade: local win, local block, global win,
/// global block, scored placement, uniform fallback.
pub fn choose<R: Rng + ?Sized>(board: &Board, mark: Mark, rng: &mut R) -> Option<Move> {
    let moves = rules::legal_moves(board);
    if moves.is_empty() {
        return None;
    }
    let opponent = mark.opponent();

    let winning: Vec<Move> = moves
        .iter()
        .copied()
        .filter(|&mv| rules::wins_sub_board(board, mv, mark))
        .collect();
    if !winning.is_empty() && rng.gen_bool(TAKE_LOCAL_WIN) {
        return winning.choose(rng).copied();
    }

    let blocking: Vec<Move> = moves
        .iter()
        .copied()
        .filter(|&mv| rules::wins_sub_board(board, mv, opponent))
        .collect();
    if !blocking.is_empty() && rng.gen_bool(BLOCK_LOCAL_WIN) {
        return blocking.choose(rng).copied();
    }

    let global_winning: Vec<Move> = moves
        .iter()
        .copied()
        .filter(|&mv| rules::wins_global(board, mv, mark))
        .collect();
    if !global_winning.is_empty() && rng.gen_bool(TAKE_GLOBAL_WIN) {
        return global_winning.choose(rng).copied();
    }

    let global_blocking: Vec<Move> = moves
        .iter()
        .copied()
        .filter(|&mv| rules::wins_global(board, mv, opponent))
        .collect();
    if !global_blocking.is_empty() && rng.gen_bool(BLOCK_GLOBAL_WIN) {
        return global_blocking.choose(rng).copied();
    }

    let mut scored: Vec<(Move, i32)> = moves
        .iter()
        .map(|&mv| (mv, score_move(board, mv, mark, rng)))
        .collect();
    scored.sort_by(|a, b| b.1.cmp(&a.1));
    if !scored.is_empty() {
        let top = ((scored.len() as f64 * TOP_SHARE) as usize).max(1);
        return scored[..top].choose(rng).map(|(mv, _)| *mv);
    }

    moves.choose(rng).copied()
}

/// Positional score: center and corner bonuses behind their own coins, plus
/// one point for each of row and column already holding a mover mark with
/// room to grow.
fn score_move<R: Rng + ?Sized>(board: &Board, mv: Move, mark: Mark, rng: &mut R) -> i32 {
    let mut score = 0;
    if mv.cell == CENTER && rng.gen_bool(PREFER_CENTER) {
        score += 2;
    }
    if CORNERS.contains(&mv.cell) && rng.gen_bool(PREFER_CORNER) {
        score += 1;
    }

    let sub = board.sub_board(mv.board);
    let row = mv.cell / 3;
    let col = mv.cell % 3;

    let mut own = 0;
    let mut empty = 0;
    for c in 0..3 {
        match sub.cells()[row * 3 + c].mark() {
            Some(m) if m == mark => own += 1,
            Some(_) => {}
            None => empty += 1,
        }
    }
    if own > 0 && empty > 0 {
        score += 1;
    }

    own = 0;
    empty = 0;
    for r in 0..3 {
        match sub.cells()[r * 3 + col].mark() {
            Some(m) if m == mark => own += 1,
            Some(_) => {}
            None => empty += 1,
        }
    }
    if own > 0 && empty > 0 {
        score += 1;
    }

    score
}
