//! Move legality, win detection, and draw detection.
//!
//! The same 8-line scan serves both levels: cells within a sub-board, and
//! sub-board outcomes across the global grid.

use super::types::{ActiveBoard, Board, Mark, Move, Outcome, SubBoard, GRID};

/// The 8 winning lines of a 3x3 grid, row-major indices.
pub const LINES: [[usize; 3]; 8] = [
    [0, 1, 2],
    [3, 4, 5],
    [6, 7, 8], // rows
    [0, 3, 6],
    [1, 4, 7],
    [2, 5, 8], // columns
    [0, 4, 8],
    [2, 4, 6], // diagonals
];

/// Returns the mark holding three-in-a-row on the sub-board, if any.
pub fn sub_board_winner(sub: &SubBoard) -> Option<Mark> {
    for [a, b, c] in LINES {
        if let Some(m) = sub.cells()[a].mark()
            && sub.cells()[b].mark() == Some(m)
            && sub.cells()[c].mark() == Some(m)
        {
            return Some(m);
        }
    }
    None
}

/// Returns the mark holding three decided sub-boards in a row, if any.
pub fn global_winner(outcomes: &[Outcome; GRID]) -> Option<Mark> {
    for [a, b, c] in LINES {
        if let Some(m) = outcomes[a].winner()
            && outcomes[b].winner() == Some(m)
            && outcomes[c].winner() == Some(m)
        {
            return Some(m);
        }
    }
    None
}

/// A sub-board accepts further play only while undecided and not full.
pub fn is_playable(board: &Board, index: usize) -> bool {
    board.outcome(index) == Outcome::Undecided && !board.sub_board(index).is_full()
}

/// Sub-boards the player to move may play in, honoring the active-board
/// selector and the escape rule (a decided or full target frees play
/// everywhere).
pub fn playable_boards(board: &Board) -> Vec<usize> {
    let everywhere = || (0..GRID).filter(|&i| is_playable(board, i)).collect();
    match board.active() {
        ActiveBoard::Any => everywhere(),
        ActiveBoard::Only(i) if is_playable(board, i) => vec![i],
        ActiveBoard::Only(_) => everywhere(),
    }
}

/// Enumerates every legal move in the position.
pub fn legal_moves(board: &Board) -> Vec<Move> {
    if board.status().is_over() {
        return Vec::new();
    }
    let mut moves = Vec::new();
    for b in playable_boards(board) {
        for c in 0..GRID {
            if board.sub_board(b).is_empty(c) {
                moves.push(Move::new(b, c));
            }
        }
    }
    moves
}

/// Whether the move is legal in the position: in bounds, targeting an empty
/// cell of a permitted sub-board, with the game still in progress.
pub fn is_legal(board: &Board, mv: Move) -> bool {
    mv.board < GRID
        && mv.cell < GRID
        && !board.status().is_over()
        && board.sub_board(mv.board).is_empty(mv.cell)
        && playable_boards(board).contains(&mv.board)
}

/// The game is drawn when every sub-board is decided or full and no global
/// winner exists.
pub fn is_draw(board: &Board) -> bool {
    (0..GRID).all(|i| !is_playable(board, i)) && global_winner(board.outcomes()).is_none()
}

/// Derives the next active-board selector after playing into `cell`: the
/// cell index names the next sub-board, unless that board is decided or
/// full, in which case play opens up everywhere.
pub fn next_active(board: &Board, cell: usize) -> ActiveBoard {
    if is_playable(board, cell) {
        ActiveBoard::Only(cell)
    } else {
        ActiveBoard::Any
    }
}

/// Whether placing `mark` at `mv` completes a line in that sub-board.
pub fn wins_sub_board(board: &Board, mv: Move, mark: Mark) -> bool {
    let mut sub = *board.sub_board(mv.board);
    sub.set(mv.cell, mark);
    sub_board_winner(&sub) == Some(mark)
}

/// Whether placing `mark` at `mv` both wins that sub-board and completes a
/// global line.
pub fn wins_global(board: &Board, mv: Move, mark: Mark) -> bool {
    if !wins_sub_board(board, mv, mark) {
        return false;
    }
    let mut outcomes = *board.outcomes();
    outcomes[mv.board] = Outcome::Won(mark);
    global_winner(&outcomes) == Some(mark)
}

/// Counts threats for `mark` on a sub-board: lines holding exactly two of
/// the mark and one empty cell.
pub fn count_threats(sub: &SubBoard, mark: Mark) -> u32 {
    let mut threats = 0;
    for line in LINES {
        let own = line
            .iter()
            .filter(|&&i| sub.cells()[i].mark() == Some(mark))
            .count();
        let empty = line.iter().filter(|&&i| sub.cells()[i].is_empty()).count();
        if own == 2 && empty == 1 {
            threats += 1;
        }
    }
    threats
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::types::Cell;

    fn sub_with(marks: &[(usize, Mark)]) -> SubBoard {
        let mut sub = SubBoard::default();
        for &(cell, mark) in marks {
            sub.set(cell, mark);
        }
        sub
    }

    #[test]
    fn test_no_winner_on_empty_sub_board() {
        assert_eq!(sub_board_winner(&SubBoard::default()), None);
    }

    #[test]
    fn test_sub_board_row_win() {
        let sub = sub_with(&[(0, Mark::X), (1, Mark::X), (2, Mark::X)]);
        assert_eq!(sub_board_winner(&sub), Some(Mark::X));
    }

    #[test]
    fn test_sub_board_column_and_diagonal_wins() {
        let col = sub_with(&[(1, Mark::O), (4, Mark::O), (7, Mark::O)]);
        assert_eq!(sub_board_winner(&col), Some(Mark::O));
        let diag = sub_with(&[(2, Mark::X), (4, Mark::X), (6, Mark::X)]);
        assert_eq!(sub_board_winner(&diag), Some(Mark::X));
    }

    #[test]
    fn test_two_marks_and_a_gap_is_not_a_win() {
        let sub = sub_with(&[(0, Mark::X), (1, Mark::X)]);
        assert_eq!(sub_board_winner(&sub), None);
        let mixed = sub_with(&[(0, Mark::X), (1, Mark::O), (2, Mark::X)]);
        assert_eq!(sub_board_winner(&mixed), None);
    }

    #[test]
    fn test_global_winner_over_outcomes() {
        let mut outcomes = [Outcome::Undecided; GRID];
        outcomes[0] = Outcome::Won(Mark::O);
        outcomes[4] = Outcome::Won(Mark::O);
        assert_eq!(global_winner(&outcomes), None);
        outcomes[8] = Outcome::Won(Mark::O);
        assert_eq!(global_winner(&outcomes), Some(Mark::O));
    }

    #[test]
    fn test_legal_moves_respect_active_selector() {
        let mut board = Board::new();
        board.set_active(ActiveBoard::Only(4));
        let moves = legal_moves(&board);
        assert_eq!(moves.len(), GRID);
        assert!(moves.iter().all(|m| m.board == 4));
    }

    #[test]
    fn test_escape_rule_when_target_decided() {
        let mut board = Board::new();
        board.set_outcome(4, Outcome::Won(Mark::X));
        board.set_active(ActiveBoard::Only(4));
        let boards = playable_boards(&board);
        assert_eq!(boards.len(), 8);
        assert!(!boards.contains(&4));
    }

    #[test]
    fn test_escape_rule_when_target_full() {
        let mut board = Board::new();
        for cell in 0..GRID {
            let mark = if cell % 2 == 0 { Mark::X } else { Mark::O };
            board.write_cell(2, cell, mark);
        }
        board.set_active(ActiveBoard::Only(2));
        assert_eq!(next_active(&board, 2), ActiveBoard::Any);
        assert!(!playable_boards(&board).contains(&2));
    }

    #[test]
    fn test_is_legal_rejects_occupied_and_out_of_bounds() {
        let mut board = Board::new();
        board.write_cell(0, 0, Mark::X);
        assert!(!is_legal(&board, Move::new(0, 0)));
        assert!(!is_legal(&board, Move::new(9, 0)));
        assert!(!is_legal(&board, Move::new(0, 9)));
        assert!(is_legal(&board, Move::new(0, 1)));
    }

    #[test]
    fn test_draw_requires_all_boards_closed() {
        let mut board = Board::new();
        assert!(!is_draw(&board));
        // Decide boards 0-8 without a global line: X O X / O X X / O X O.
        let pattern = [
            Mark::X,
            Mark::O,
            Mark::X,
            Mark::O,
            Mark::X,
            Mark::X,
            Mark::O,
            Mark::X,
            Mark::O,
        ];
        for (i, &m) in pattern.iter().enumerate() {
            board.set_outcome(i, Outcome::Won(m));
        }
        assert_eq!(global_winner(board.outcomes()), None);
        assert!(is_draw(&board));
    }

    #[test]
    fn test_wins_global_detects_double_completion() {
        let mut board = Board::new();
        board.set_outcome(0, Outcome::Won(Mark::X));
        board.set_outcome(1, Outcome::Won(Mark::X));
        // Board 2 one move from an X win on its top row.
        board.write_cell(2, 0, Mark::X);
        board.write_cell(2, 1, Mark::X);
        let mv = Move::new(2, 2);
        assert!(wins_sub_board(&board, mv, Mark::X));
        assert!(wins_global(&board, mv, Mark::X));
        assert!(!wins_global(&board, mv, Mark::O));
    }

    #[test]
    fn test_count_threats() {
        let mut sub = SubBoard::default();
        assert_eq!(count_threats(&sub, Mark::X), 0);
        sub.set(0, Mark::X);
        sub.set(1, Mark::X);
        assert_eq!(count_threats(&sub, Mark::X), 1);
        // Occupying the gap with the opponent kills the threat.
        sub.set(2, Mark::O);
        assert_eq!(count_threats(&sub, Mark::X), 0);
        assert_eq!(sub.get(2), Some(Cell::Marked(Mark::O)));
    }
}
