//! Ultimate tic-tac-toe library - rules, machine opponents, and online play
//!
//! Nine tic-tac-toe boards arranged on a 3x3 grid: winning a sub-board
//! claims its cell on the outer board, and each move constrains where the
//! opponent may answer.
//!
//! # Architecture
//!
//! - **Game**: board model and the rules engine (two-level win detection)
//! - **Ai**: three machine opponents, from random play to minimax search
//! - **Timer**: per-player increment clocks
//! - **Store / Sync**: shared JSON record space and the session
//!   synchronizer that reconciles two peers over it
//!
//! # Example
//!
//! ```
//! use ultimate_ttt::{Game, Move, Status};
//!
//! let mut game = Game::new();
//! game.apply_move(Move::new(4, 4))?;
//! assert_eq!(game.board().status(), Status::InProgress);
//! # Ok::<(), ultimate_ttt::MoveError>(())
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod ai;
pub mod app;
pub mod cli;
pub mod game;
pub mod session;
pub mod store;
pub mod sync;
pub mod timer;
pub mod view;

pub use ai::Difficulty;
pub use game::{
    ActiveBoard, Board, Cell, GRID, Game, Mark, Move, MoveError, MoveReport, Outcome, Status,
    SubBoard,
};
pub use session::{Participant, Seat, SessionRecord};
pub use store::{GameStore, HttpStore, MemoryStore, StoreError};
pub use sync::{SessionError, SessionEvent, SessionSync};
pub use timer::{Clock, TimerProfile};
pub use view::{Presenter, TextPresenter};
