//! Hard strategy: depth-limited minimax with alpha-beta pruning.
//!
//! Search operates on cloned scratch boards only; live state is never
//! mutated. The strategy holds no randomness, so identical positions give
//! identical moves.

use crate::game::{rules, ActiveBoard, Board, Mark, Move, Outcome, GRID};

/// Plies expanded before falling back to the static evaluation.
const MAX_DEPTH: u32 = 4;
const WIN_SCORE: i32 = 1000;
const WON_BOARD_WEIGHT: i32 = 10;
const THREAT_WEIGHT: i32 = 2;

/// Picks the best move for `mark`, or `None` when no legal move exists.
pub fn choose(board: &Board, mark: Mark) -> Option<Move> {
    let moves = rules::legal_moves(board);
    if moves.is_empty() {
        return None;
    }
    let scratch = board.clone_for_simulation();
    let (_, best) = minimax(&scratch, mark, mark, 0, i32::MIN, i32::MAX);
    // Exhausted search still answers: fall back to the first enumerated move.
    Some(best.unwrap_or(moves[0]))
}

/// Full search: maximizes for `ai`, minimizes for the opponent. Terminal
/// wins score `1000 - depth` (faster wins first), losses `-1000 + depth`
/// (slower losses first), draws zero. Ties keep the first-found move.
fn minimax(
    board: &Board,
    to_move: Mark,
    ai: Mark,
    depth: u32,
    mut alpha: i32,
    mut beta: i32,
) -> (i32, Option<Move>) {
    if let Some(winner) = rules::global_winner(board.outcomes()) {
        return if winner == ai {
            (WIN_SCORE - depth as i32, None)
        } else {
            (-WIN_SCORE + depth as i32, None)
        };
    }
    if (0..GRID).all(|i| !rules::is_playable(board, i)) {
        return (0, None);
    }
    if depth > MAX_DEPTH {
        return (evaluate(board, ai), None);
    }

    let moves = simulation_moves(board);

    if to_move == ai {
        let mut best_score = i32::MIN;
        let mut best_move = None;
        for &mv in &moves {
            let next = simulate(board, mv, to_move);
            let (score, _) = minimax(&next, to_move.opponent(), ai, depth + 1, alpha, beta);
            if score > best_score {
                best_score = score;
                best_move = Some(mv);
            }
            alpha = alpha.max(best_score);
            if beta <= alpha {
                break;
            }
        }
        (best_score, best_move.or_else(|| moves.first().copied()))
    } else {
        let mut best_score = i32::MAX;
        let mut best_move = None;
        for &mv in &moves {
            let next = simulate(board, mv, to_move);
            let (score, _) = minimax(&next, to_move.opponent(), ai, depth + 1, alpha, beta);
            if score < best_score {
                best_score = score;
                best_move = Some(mv);
            }
            beta = beta.min(best_score);
            if beta <= alpha {
                break;
            }
        }
        (best_score, best_move.or_else(|| moves.first().copied()))
    }
}

/// Legal moves ignoring the live status flag; scratch positions track
/// terminal states through the outcome grid alone.
fn simulation_moves(board: &Board) -> Vec<Move> {
    let mut moves = Vec::new();
    for b in rules::playable_boards(board) {
        for c in 0..GRID {
            if board.sub_board(b).is_empty(c) {
                moves.push(Move::new(b, c));
            }
        }
    }
    moves
}

/// Applies `mv` on a fresh scratch copy: write the cell, decide the
/// sub-board if a line completed, then derive the next selector. The
/// local-outcome-then-selector order matches the engine exactly.
fn simulate(board: &Board, mv: Move, mover: Mark) -> Board {
    let mut next = board.clone_for_simulation();
    next.write_cell(mv.board, mv.cell, mover);
    if next.outcome(mv.board) == Outcome::Undecided
        && let Some(winner) = rules::sub_board_winner(next.sub_board(mv.board))
    {
        next.set_outcome(mv.board, Outcome::Won(winner));
    }
    if rules::is_playable(&next, mv.cell) {
        next.set_active(ActiveBoard::Only(mv.cell));
    } else {
        next.set_active(ActiveBoard::Any);
    }
    next.set_to_move(mover.opponent());
    next
}

/// Static evaluation at the depth cutoff: decided-board differential, plus
/// a threat differential over every undecided sub-board.
fn evaluate(board: &Board, ai: Mark) -> i32 {
    let opponent = ai.opponent();
    let own_won = board
        .outcomes()
        .iter()
        .filter(|o| o.winner() == Some(ai))
        .count() as i32;
    let opp_won = board
        .outcomes()
        .iter()
        .filter(|o| o.winner() == Some(opponent))
        .count() as i32;
    let mut score = (own_won - opp_won) * WON_BOARD_WEIGHT;

    for i in 0..GRID {
        if board.outcome(i) == Outcome::Undecided {
            let own = rules::count_threats(board.sub_board(i), ai) as i32;
            let opp = rules::count_threats(board.sub_board(i), opponent) as i32;
            score += (own - opp) * THREAT_WEIGHT;
        }
    }
    score
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deterministic_on_repeat() {
        let mut board = Board::new();
        board.write_cell(4, 4, Mark::X);
        board.set_active(ActiveBoard::Only(4));
        board.set_to_move(Mark::O);
        let first = choose(&board, Mark::O);
        for _ in 0..5 {
            assert_eq!(choose(&board, Mark::O), first);
        }
    }

    #[test]
    fn test_takes_immediate_global_win() {
        let mut board = Board::new();
        board.set_outcome(0, Outcome::Won(Mark::X));
        board.set_outcome(1, Outcome::Won(Mark::X));
        // Board 2: X one move from its top row; completing it wins the game.
        board.write_cell(2, 0, Mark::X);
        board.write_cell(2, 1, Mark::X);
        board.write_cell(2, 4, Mark::O);
        board.set_active(ActiveBoard::Only(2));
        assert_eq!(choose(&board, Mark::X), Some(Move::new(2, 2)));
    }

    #[test]
    fn test_evaluate_counts_boards_and_threats() {
        let mut board = Board::new();
        board.set_outcome(0, Outcome::Won(Mark::X));
        assert_eq!(evaluate(&board, Mark::X), WON_BOARD_WEIGHT);
        board.write_cell(1, 0, Mark::O);
        board.write_cell(1, 1, Mark::O);
        assert_eq!(
            evaluate(&board, Mark::X),
            WON_BOARD_WEIGHT - THREAT_WEIGHT
        );
    }

    #[test]
    fn test_no_move_on_closed_position() {
        let mut board = Board::new();
        for i in 0..GRID {
            board.set_outcome(i, Outcome::Won(Mark::X));
        }
        board.set_status(crate::game::Status::Won(Mark::X));
        assert_eq!(choose(&board, Mark::O), None);
    }
}
