//! Board model and rules engine for ultimate tic-tac-toe.

pub mod engine;
pub mod rules;
pub mod types;

pub use engine::{Game, MoveError, MoveReport};
pub use types::{ActiveBoard, Board, Cell, Mark, Move, Outcome, Status, SubBoard, GRID};
