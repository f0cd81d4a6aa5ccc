//! Core domain types for ultimate tic-tac-toe.

use serde::{Deserialize, Serialize};

/// Number of sub-boards on the global grid, and cells per sub-board.
pub const GRID: usize = 9;

/// A player's mark.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Mark {
    /// Mark X (moves first).
    X,
    /// Mark O (moves second).
    O,
}

impl Mark {
    /// Returns the opposing mark.
    pub fn opponent(self) -> Self {
        match self {
            Mark::X => Mark::O,
            Mark::O => Mark::X,
        }
    }

    /// Single-letter display form.
    pub fn letter(self) -> char {
        match self {
            Mark::X => 'X',
            Mark::O => 'O',
        }
    }
}

impl std::fmt::Display for Mark {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.letter())
    }
}

/// A single cell of a sub-board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Cell {
    /// No mark placed yet.
    #[default]
    Empty,
    /// Cell holds a mark. Once set it never reverts.
    Marked(Mark),
}

impl Cell {
    /// The mark in this cell, if any.
    pub fn mark(self) -> Option<Mark> {
        match self {
            Cell::Empty => None,
            Cell::Marked(m) => Some(m),
        }
    }

    /// Whether the cell is still empty.
    pub fn is_empty(self) -> bool {
        matches!(self, Cell::Empty)
    }
}

impl From<Option<Mark>> for Cell {
    fn from(mark: Option<Mark>) -> Self {
        match mark {
            Some(m) => Cell::Marked(m),
            None => Cell::Empty,
        }
    }
}

/// One inner 3x3 board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SubBoard {
    cells: [Cell; GRID],
}

impl SubBoard {
    /// Gets the cell at the given index (0-8, row-major).
    pub fn get(&self, cell: usize) -> Option<Cell> {
        self.cells.get(cell).copied()
    }

    /// All cells as a slice.
    pub fn cells(&self) -> &[Cell; GRID] {
        &self.cells
    }

    /// Whether the given cell is empty.
    pub fn is_empty(&self, cell: usize) -> bool {
        matches!(self.get(cell), Some(Cell::Empty))
    }

    /// Whether every cell holds a mark.
    pub fn is_full(&self) -> bool {
        self.cells.iter().all(|c| !c.is_empty())
    }

    /// Whether no cell holds a mark yet.
    pub fn is_untouched(&self) -> bool {
        self.cells.iter().all(|c| c.is_empty())
    }

    pub(crate) fn set(&mut self, cell: usize, mark: Mark) {
        debug_assert!(cell < GRID);
        self.cells[cell] = Cell::Marked(mark);
    }

    pub(crate) fn overwrite(&mut self, cells: [Cell; GRID]) {
        self.cells = cells;
    }
}

/// Result of a decided or undecided sub-board.
///
/// Set exactly once when a three-in-a-row completes; never cleared. A full
/// sub-board with no winner simply stays `Undecided` and becomes unplayable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Outcome {
    /// Not yet decided.
    #[default]
    Undecided,
    /// Won by the given mark.
    Won(Mark),
}

impl Outcome {
    /// The winning mark, if decided.
    pub fn winner(self) -> Option<Mark> {
        match self {
            Outcome::Undecided => None,
            Outcome::Won(m) => Some(m),
        }
    }
}

/// Constraint on which sub-board the player to move must play in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActiveBoard {
    /// Any playable sub-board is allowed.
    Any,
    /// Play is restricted to the given sub-board index.
    Only(usize),
}

impl ActiveBoard {
    /// The restricted index, if any.
    pub fn index(self) -> Option<usize> {
        match self {
            ActiveBoard::Any => None,
            ActiveBoard::Only(i) => Some(i),
        }
    }
}

/// A move: sub-board index and cell index, both 0-8 row-major.
///
/// The mark placed is always the board's player to move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Move {
    /// Target sub-board (0-8).
    pub board: usize,
    /// Target cell within the sub-board (0-8).
    pub cell: usize,
}

impl Move {
    /// Creates a move.
    pub fn new(board: usize, cell: usize) -> Self {
        Self { board, cell }
    }
}

/// Terminal state of the whole game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Status {
    /// Game is ongoing.
    InProgress,
    /// Global three-in-a-row (or timeout forfeit) for the given mark.
    Won(Mark),
    /// All sub-boards decided or full with no global winner.
    Draw,
}

impl Status {
    /// Whether the game has ended.
    pub fn is_over(self) -> bool {
        !matches!(self, Status::InProgress)
    }

    /// The winning mark, if the game was won.
    pub fn winner(self) -> Option<Mark> {
        match self {
            Status::Won(m) => Some(m),
            _ => None,
        }
    }
}

/// Full game position: 9 sub-boards, their outcomes, the active-board
/// selector, the player to move, and the terminal status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Board {
    sub_boards: [SubBoard; GRID],
    outcomes: [Outcome; GRID],
    active: ActiveBoard,
    to_move: Mark,
    status: Status,
    last_move: Option<Move>,
}

impl Board {
    /// Creates an empty starting position with X to move anywhere.
    pub fn new() -> Self {
        Self {
            sub_boards: [SubBoard::default(); GRID],
            outcomes: [Outcome::Undecided; GRID],
            active: ActiveBoard::Any,
            to_move: Mark::X,
            status: Status::InProgress,
            last_move: None,
        }
    }

    /// The sub-board at the given index.
    pub fn sub_board(&self, board: usize) -> &SubBoard {
        &self.sub_boards[board]
    }

    /// All sub-boards.
    pub fn sub_boards(&self) -> &[SubBoard; GRID] {
        &self.sub_boards
    }

    /// The outcome of the given sub-board.
    pub fn outcome(&self, board: usize) -> Outcome {
        self.outcomes[board]
    }

    /// All sub-board outcomes.
    pub fn outcomes(&self) -> &[Outcome; GRID] {
        &self.outcomes
    }

    /// The active-board selector.
    pub fn active(&self) -> ActiveBoard {
        self.active
    }

    /// The player to move.
    pub fn to_move(&self) -> Mark {
        self.to_move
    }

    /// The terminal status.
    pub fn status(&self) -> Status {
        self.status
    }

    /// The most recently played move, if any.
    pub fn last_move(&self) -> Option<Move> {
        self.last_move
    }

    /// The cell at (board, cell), if in bounds.
    pub fn cell(&self, board: usize, cell: usize) -> Option<Cell> {
        self.sub_boards.get(board).and_then(|b| b.get(cell))
    }

    /// Independent deep copy for AI search. The copy shares no storage with
    /// `self`; search may mutate it freely without touching live state.
    pub fn clone_for_simulation(&self) -> Self {
        self.clone()
    }

    pub(crate) fn write_cell(&mut self, board: usize, cell: usize, mark: Mark) {
        self.sub_boards[board].set(cell, mark);
    }

    pub(crate) fn set_outcome(&mut self, board: usize, outcome: Outcome) {
        self.outcomes[board] = outcome;
    }

    pub(crate) fn set_active(&mut self, active: ActiveBoard) {
        self.active = active;
    }

    pub(crate) fn set_to_move(&mut self, mark: Mark) {
        self.to_move = mark;
    }

    pub(crate) fn set_status(&mut self, status: Status) {
        self.status = status;
    }

    pub(crate) fn set_last_move(&mut self, mv: Option<Move>) {
        self.last_move = mv;
    }

    pub(crate) fn overwrite_sub_board(&mut self, board: usize, cells: [Cell; GRID]) {
        self.sub_boards[board].overwrite(cells);
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}
