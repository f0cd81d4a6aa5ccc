//! The game engine: validated move application and status transitions.

use super::rules;
use super::types::{Board, Mark, Move, Outcome, Status};
use derive_more::{Display, Error};
use tracing::{debug, info, instrument};

/// Rejection reasons for a move request. The position is left untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Error)]
pub enum MoveError {
    /// The game has already ended.
    #[display("game is already over")]
    GameOver,
    /// Board or cell index outside 0-8.
    #[display("board or cell index out of bounds")]
    OutOfBounds,
    /// The targeted cell already holds a mark.
    #[display("cell is already occupied")]
    Occupied,
    /// The targeted sub-board is not permitted by the active selector.
    #[display("move is outside the active sub-board")]
    WrongBoard,
}

/// What a completed move did to the position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoveReport {
    /// The mark that moved.
    pub mover: Mark,
    /// Set if this move decided the target sub-board.
    pub sub_board_won: Option<Mark>,
    /// Status after the move.
    pub status: Status,
}

/// Owns the canonical [`Board`] and applies moves under the rules engine.
///
/// Callers never mutate the board directly; `apply_move` is the single
/// write path, so outcomes and the active selector only change here.
#[derive(Debug, Clone, Default)]
pub struct Game {
    board: Board,
}

impl Game {
    /// Creates a fresh game, X to move anywhere.
    pub fn new() -> Self {
        Self {
            board: Board::new(),
        }
    }

    /// Wraps an existing position (e.g. one loaded from a remote snapshot).
    pub fn from_board(board: Board) -> Self {
        Self { board }
    }

    /// The current position.
    pub fn board(&self) -> &Board {
        &self.board
    }

    /// Mutable access for the session synchronizer's snapshot overwrite.
    pub(crate) fn board_mut(&mut self) -> &mut Board {
        &mut self.board
    }

    /// Applies a move for the player to move.
    ///
    /// Checks run before any mutation, so a rejected move leaves the
    /// position byte-identical. On success the order is fixed: write the
    /// cell, local win check, global win check, draw check, next-selector
    /// derivation, then the turn switch. Reordering would change when
    /// terminal states are detected.
    #[instrument(skip(self), fields(to_move = %self.board.to_move()))]
    pub fn apply_move(&mut self, mv: Move) -> Result<MoveReport, MoveError> {
        if self.board.status().is_over() {
            return Err(MoveError::GameOver);
        }
        if mv.board >= super::types::GRID || mv.cell >= super::types::GRID {
            return Err(MoveError::OutOfBounds);
        }
        if !self.board.sub_board(mv.board).is_empty(mv.cell) {
            return Err(MoveError::Occupied);
        }
        if !rules::playable_boards(&self.board).contains(&mv.board) {
            return Err(MoveError::WrongBoard);
        }

        let mover = self.board.to_move();
        self.board.write_cell(mv.board, mv.cell, mover);
        self.board.set_last_move(Some(mv));

        let mut sub_board_won = None;
        if self.board.outcome(mv.board) == Outcome::Undecided
            && let Some(winner) = rules::sub_board_winner(self.board.sub_board(mv.board))
        {
            debug!(board = mv.board, winner = %winner, "sub-board decided");
            self.board.set_outcome(mv.board, Outcome::Won(winner));
            sub_board_won = Some(winner);
        }

        if let Some(winner) = rules::global_winner(self.board.outcomes()) {
            info!(winner = %winner, "game won");
            self.board.set_status(Status::Won(winner));
        } else if rules::is_draw(&self.board) {
            info!("game drawn");
            self.board.set_status(Status::Draw);
        } else {
            self.board.set_active(rules::next_active(&self.board, mv.cell));
            self.board.set_to_move(mover.opponent());
        }

        Ok(MoveReport {
            mover,
            sub_board_won,
            status: self.board.status(),
        })
    }

    /// Records a timeout loss for `flagged`: the opponent wins immediately.
    #[instrument(skip(self))]
    pub fn forfeit_on_timeout(&mut self, flagged: Mark) {
        if self.board.status().is_over() {
            return;
        }
        info!(flagged = %flagged, "player flagged on time");
        self.board.set_status(Status::Won(flagged.opponent()));
    }
}
