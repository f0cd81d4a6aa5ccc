//! Easy strategy: random sub-board, then light local tactics.

use crate::game::{rules, Board, Mark, Move};
use rand::seq::SliceRandom;
use rand::Rng;

/// Picks a playable sub-board uniformly at random. On an untouched board
/// the cell is uniform too; otherwise a finishing cell is preferred, then
/// any cell on a line already holding a mover mark and no opponent mark,
/// then a uniform fallback.
pub fn choose<R: Rng + ?Sized>(board: &Board, mark: Mark, rng: &mut R) -> Option<Move> {
    let moves = rules::legal_moves(board);
    if moves.is_empty() {
        return None;
    }

    let mut boards: Vec<usize> = moves.iter().map(|m| m.board).collect();
    boards.dedup();
    let &picked = boards.choose(rng)?;
    let in_board: Vec<Move> = moves.iter().copied().filter(|m| m.board == picked).collect();

    if board.sub_board(picked).is_untouched() {
        return in_board.choose(rng).copied();
    }

    if let Some(&winning) = in_board
        .iter()
        .find(|&&mv| rules::wins_sub_board(board, mv, mark))
    {
        return Some(winning);
    }

    let strategic: Vec<Move> = in_board
        .iter()
        .copied()
        .filter(|&mv| builds_toward_line(board, mv, mark))
        .collect();
    if !strategic.is_empty() {
        return strategic.choose(rng).copied();
    }

    in_board.choose(rng).copied()
}

/// True when some line through the cell already holds a mover mark and no
/// opponent mark, so playing here lines pieces up toward a win.
fn builds_toward_line(board: &Board, mv: Move, mark: Mark) -> bool {
    let sub = board.sub_board(mv.board);
    rules::LINES
        .iter()
        .filter(|line| line.contains(&mv.cell))
        .any(|line| {
            let mut own = 0;
            for &i in line {
                match sub.cells()[i].mark() {
                    Some(m) if m == mark => own += 1,
                    Some(_) => return false,
                    None => {}
                }
            }
            own > 0
        })
}
