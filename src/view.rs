//! Plain-text presentation of positions and clocks.

use crate::game::{ActiveBoard, Board, Cell, Mark, Status};
use crate::timer::Clock;

/// Renders game state for an output surface.
pub trait Presenter {
    /// The full 9x9 position.
    fn render_board(&self, board: &Board) -> String;
    /// One-line clock readout for both players.
    fn render_clocks(&self, clock: &Clock) -> String;
    /// One-line summary of whose turn it is or how the game ended.
    fn describe_status(&self, board: &Board) -> String;
}

/// Terminal presenter: fixed-width grid with `|`/`-` separators.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextPresenter;

fn cell_char(cell: Cell) -> char {
    match cell {
        Cell::Empty => '.',
        Cell::Marked(m) => m.letter(),
    }
}

impl TextPresenter {
    /// Index reference printed alongside the board for move entry.
    pub fn legend(&self) -> String {
        "Boards and cells are numbered 0-8, row by row:\n 0 1 2\n 3 4 5\n 6 7 8\n".to_string()
    }

    fn outcomes_line(&self, board: &Board) -> String {
        let marks: String = board
            .outcomes()
            .iter()
            .map(|o| o.winner().map_or('.', Mark::letter))
            .collect();
        format!("Sub-boards won: {marks}")
    }

    fn active_line(&self, board: &Board) -> String {
        match board.active() {
            ActiveBoard::Any => "Play in: any open board".to_string(),
            ActiveBoard::Only(i) => format!("Play in: board {i}"),
        }
    }
}

impl Presenter for TextPresenter {
    fn render_board(&self, board: &Board) -> String {
        let mut out = String::new();
        for board_row in 0..3 {
            for cell_row in 0..3 {
                let mut line = String::new();
                for board_col in 0..3 {
                    let b = board_row * 3 + board_col;
                    let sub = board.sub_board(b);
                    for cell_col in 0..3 {
                        let c = cell_row * 3 + cell_col;
                        line.push(' ');
                        line.push(cell_char(sub.cells()[c]));
                    }
                    if board_col < 2 {
                        line.push_str(" |");
                    }
                }
                out.push_str(&line);
                out.push('\n');
            }
            if board_row < 2 {
                out.push_str("-------+-------+-------\n");
            }
        }
        out.push_str(&self.outcomes_line(board));
        out.push('\n');
        if !board.status().is_over() {
            out.push_str(&self.active_line(board));
            out.push('\n');
        }
        out
    }

    fn render_clocks(&self, clock: &Clock) -> String {
        format!(
            "X {}  O {}",
            Clock::format(clock.remaining(Mark::X)),
            Clock::format(clock.remaining(Mark::O))
        )
    }

    fn describe_status(&self, board: &Board) -> String {
        match board.status() {
            Status::InProgress => format!("{} to move", board.to_move()),
            Status::Won(m) => format!("{m} wins!"),
            Status::Draw => "Draw.".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::{Game, Move};
    use crate::timer::TimerProfile;
    use std::time::Duration;

    #[test]
    fn test_render_shows_marks_and_active_board() {
        let mut game = Game::new();
        game.apply_move(Move::new(4, 0)).unwrap();
        let p = TextPresenter;
        let text = p.render_board(game.board());
        assert!(text.contains('X'));
        assert!(text.contains("Play in: board 0"));
        assert_eq!(text.matches('|').count(), 18);
    }

    #[test]
    fn test_status_lines() {
        let p = TextPresenter;
        let mut game = Game::new();
        assert_eq!(p.describe_status(game.board()), "X to move");
        game.forfeit_on_timeout(Mark::X);
        assert_eq!(p.describe_status(game.board()), "O wins!");
    }

    #[test]
    fn test_clock_line() {
        let mut clock = Clock::new(TimerProfile::Rapid);
        clock.debit(Mark::O, Duration::from_secs(62));
        let p = TextPresenter;
        assert_eq!(p.render_clocks(&clock), "X 5:00  O 3:58");
    }
}
