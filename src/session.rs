//! Shared-store record schema and defensive normalization.
//!
//! The record layout is the interop contract between peers: field names and
//! value shapes must survive a round trip through the store exactly. The
//! store may hand back arrays as sparse keyed objects (`{"4": "O"}`), so
//! every read normalizes to dense 9-element shape at both levels.

use crate::game::{ActiveBoard, Board, Cell, GRID, Mark, Move, Outcome, Status};
use crate::timer::{Clock, TimerProfile};
use chrono::Utc;
use rand::Rng;
use serde::{Serialize, Serializer};
use serde_json::Value;
use tracing::warn;

/// Length of a session code.
pub const CODE_LEN: usize = 6;
const CODE_CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Generates a 6-character uppercase-alphanumeric session code.
pub fn generate_code<R: Rng + ?Sized>(rng: &mut R) -> String {
    (0..CODE_LEN)
        .map(|_| CODE_CHARSET[rng.gen_range(0..CODE_CHARSET.len())] as char)
        .collect()
}

/// Which record slot a participant occupies. The creator is always
/// player 1 and plays X; the joiner is player 2 and plays O.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Seat {
    /// Session creator, plays X.
    Player1,
    /// Session joiner, plays O.
    Player2,
}

impl Seat {
    /// Record field / participant id for this seat.
    pub fn wire_id(self) -> &'static str {
        match self {
            Seat::Player1 => "player1",
            Seat::Player2 => "player2",
        }
    }

    /// The mark this seat plays.
    pub fn mark(self) -> Mark {
        match self {
            Seat::Player1 => Mark::X,
            Seat::Player2 => Mark::O,
        }
    }

    /// The other seat.
    pub fn opponent(self) -> Seat {
        match self {
            Seat::Player1 => Seat::Player2,
            Seat::Player2 => Seat::Player1,
        }
    }
}

/// A participant descriptor as stored on the record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Participant {
    /// Participant id ("player1" / "player2").
    pub id: String,
    /// The mark this participant plays.
    #[serde(rename = "player")]
    pub mark: Mark,
    /// Whether the participant is currently attached.
    pub connected: bool,
}

impl Participant {
    /// Connected descriptor for a seat.
    pub fn joined(seat: Seat) -> Self {
        Self {
            id: seat.wire_id().to_string(),
            mark: seat.mark(),
            connected: true,
        }
    }
}

/// The last move as stored on the record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LastMove {
    /// Sub-board index 0-8.
    pub board_index: usize,
    /// Cell index 0-8.
    pub cell_index: usize,
}

impl From<Move> for LastMove {
    fn from(mv: Move) -> Self {
        Self {
            board_index: mv.board,
            cell_index: mv.cell,
        }
    }
}

/// Full session record: participants, board snapshot, timers, metadata.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionRecord {
    /// Creator slot.
    pub player1: Option<Participant>,
    /// Joiner slot; absent until someone joins.
    pub player2: Option<Participant>,
    /// Player to move.
    pub current_player: Mark,
    /// Active sub-board index, or null for play-anywhere.
    pub active_board: Option<usize>,
    /// 9 sub-boards of 9 cells.
    pub local_boards: [[Option<Mark>; GRID]; GRID],
    /// Sub-board outcomes.
    pub won_boards: [Option<Mark>; GRID],
    /// Whether the game has ended.
    pub game_over: bool,
    /// Winning mark; null while in progress and on a draw.
    pub winner: Option<Mark>,
    /// Most recent move.
    pub last_move: Option<LastMove>,
    /// Timer preset name; serialized as "none" when timers are disabled.
    #[serde(serialize_with = "ser_timer_type")]
    pub timer_type: Option<TimerProfile>,
    /// Remaining milliseconds for X, null when timers are disabled.
    pub timer_x: Option<u64>,
    /// Remaining milliseconds for O.
    pub timer_o: Option<u64>,
    /// Increment milliseconds per move.
    pub timer_increment: Option<u64>,
    /// Creation time, epoch milliseconds.
    pub created_at: i64,
}

fn ser_timer_type<S: Serializer>(t: &Option<TimerProfile>, s: S) -> Result<S::Ok, S::Error> {
    match t {
        Some(profile) => s.serialize_str(profile.wire_name()),
        None => s.serialize_str("none"),
    }
}

impl SessionRecord {
    /// Snapshots the local board and clocks into record shape. Participant
    /// slots are left empty; the synchronizer owns those.
    pub fn snapshot(board: &Board, timer: Option<(TimerProfile, &Clock)>) -> Self {
        let mut local_boards = [[None; GRID]; GRID];
        for (b, sub) in board.sub_boards().iter().enumerate() {
            for (c, cell) in sub.cells().iter().enumerate() {
                local_boards[b][c] = cell.mark();
            }
        }
        let mut won_boards = [None; GRID];
        for (b, outcome) in board.outcomes().iter().enumerate() {
            won_boards[b] = outcome.winner();
        }
        Self {
            player1: None,
            player2: None,
            current_player: board.to_move(),
            active_board: board.active().index(),
            local_boards,
            won_boards,
            game_over: board.status().is_over(),
            winner: board.status().winner(),
            last_move: board.last_move().map(LastMove::from),
            timer_type: timer.map(|(profile, _)| profile),
            timer_x: timer.map(|(_, clock)| clock.remaining(Mark::X).as_millis() as u64),
            timer_o: timer.map(|(_, clock)| clock.remaining(Mark::O).as_millis() as u64),
            timer_increment: timer.map(|(_, clock)| clock.increment().as_millis() as u64),
            created_at: Utc::now().timestamp_millis(),
        }
    }

    /// Parses a raw store value, normalizing every field to a safe shape.
    /// Nothing here fails: malformed pieces become empty defaults, with a
    /// diagnostic for the shapes that should never occur.
    pub fn from_value(value: &Value) -> Self {
        if !value.is_object() {
            warn!("remote record is not an object, using defaults");
        }
        let last_move = value.get("lastMove").and_then(|lm| {
            let board_index = lm.get("boardIndex")?.as_u64()? as usize;
            let cell_index = lm.get("cellIndex")?.as_u64()? as usize;
            (board_index < GRID && cell_index < GRID).then_some(LastMove {
                board_index,
                cell_index,
            })
        });
        Self {
            player1: participant_from(value.get("player1"), Seat::Player1),
            player2: participant_from(value.get("player2"), Seat::Player2),
            current_player: mark_from(value.get("currentPlayer")).unwrap_or(Mark::X),
            active_board: value
                .get("activeBoard")
                .and_then(Value::as_u64)
                .map(|n| n as usize)
                .filter(|&n| n < GRID),
            local_boards: normalize_grids(value.get("localBoards").unwrap_or(&Value::Null)),
            won_boards: normalize_marks(value.get("wonBoards").unwrap_or(&Value::Null)),
            game_over: value
                .get("gameOver")
                .and_then(Value::as_bool)
                .unwrap_or(false),
            winner: mark_from(value.get("winner")),
            last_move,
            timer_type: value
                .get("timerType")
                .and_then(Value::as_str)
                .and_then(TimerProfile::from_wire),
            timer_x: millis_from(value.get("timerX")),
            timer_o: millis_from(value.get("timerO")),
            timer_increment: millis_from(value.get("timerIncrement")),
            created_at: value
                .get("createdAt")
                .and_then(Value::as_i64)
                .unwrap_or_default(),
        }
    }

    /// Serializes to the wire shape.
    pub fn to_value(&self) -> Result<Value, serde_json::Error> {
        serde_json::to_value(self)
    }

    /// Copies the game-state fields onto an existing record value, leaving
    /// fields this peer does not own (the participant slots, `createdAt`)
    /// exactly as fetched.
    pub fn overlay_onto(&self, current: &mut Value) -> Result<(), serde_json::Error> {
        if !current.is_object() {
            *current = Value::Object(Default::default());
        }
        let mine = self.to_value()?;
        if let (Value::Object(target), Value::Object(source)) = (current, mine) {
            for (key, val) in source {
                if matches!(key.as_str(), "player1" | "player2" | "createdAt") {
                    continue;
                }
                target.insert(key, val);
            }
        }
        Ok(())
    }

    /// Overwrites a local board from this snapshot.
    pub fn write_board(&self, board: &mut Board) {
        for b in 0..GRID {
            let mut cells = [Cell::Empty; GRID];
            for (c, cell) in cells.iter_mut().enumerate() {
                *cell = Cell::from(self.local_boards[b][c]);
            }
            board.overwrite_sub_board(b, cells);
        }
        for b in 0..GRID {
            let outcome = match self.won_boards[b] {
                Some(m) => Outcome::Won(m),
                None => Outcome::Undecided,
            };
            board.set_outcome(b, outcome);
        }
        board.set_active(match self.active_board {
            Some(i) => ActiveBoard::Only(i),
            None => ActiveBoard::Any,
        });
        board.set_to_move(self.current_player);
        board.set_last_move(
            self.last_move
                .map(|lm| Move::new(lm.board_index, lm.cell_index)),
        );
        board.set_status(if self.game_over {
            match self.winner {
                Some(m) => Status::Won(m),
                None => Status::Draw,
            }
        } else {
            Status::InProgress
        });
    }

    /// The participant in the given seat.
    pub fn participant(&self, seat: Seat) -> Option<&Participant> {
        match seat {
            Seat::Player1 => self.player1.as_ref(),
            Seat::Player2 => self.player2.as_ref(),
        }
    }
}

fn participant_from(value: Option<&Value>, seat: Seat) -> Option<Participant> {
    let obj = value?.as_object()?;
    Some(Participant {
        id: obj
            .get("id")
            .and_then(Value::as_str)
            .unwrap_or(seat.wire_id())
            .to_string(),
        mark: obj
            .get("player")
            .and_then(|m| mark_from(Some(m)))
            .unwrap_or(seat.mark()),
        connected: obj
            .get("connected")
            .and_then(Value::as_bool)
            .unwrap_or(false),
    })
}

fn mark_from(value: Option<&Value>) -> Option<Mark> {
    match value?.as_str()? {
        "X" => Some(Mark::X),
        "O" => Some(Mark::O),
        _ => None,
    }
}

fn millis_from(value: Option<&Value>) -> Option<u64> {
    value?.as_f64().map(|ms| ms.max(0.0) as u64)
}

/// Normalizes one 9-slot mark sequence: dense arrays pass through, sparse
/// keyed objects land at their numeric indices, anything else is empty.
pub fn normalize_marks(value: &Value) -> [Option<Mark>; GRID] {
    let mut row = [None; GRID];
    match value {
        Value::Array(items) => {
            for (i, item) in items.iter().take(GRID).enumerate() {
                row[i] = mark_from(Some(item));
            }
        }
        Value::Object(map) => {
            for (key, item) in map {
                if let Ok(i) = key.parse::<usize>()
                    && i < GRID
                {
                    row[i] = mark_from(Some(item));
                }
            }
        }
        Value::Null => {}
        other => {
            warn!(value = %other, "unexpected mark sequence shape");
        }
    }
    row
}

/// Normalizes the two-level 9x9 cell grid; the outer board list and each
/// inner cell list may independently be dense or sparse.
pub fn normalize_grids(value: &Value) -> [[Option<Mark>; GRID]; GRID] {
    let mut grid = [[None; GRID]; GRID];
    match value {
        Value::Array(boards) => {
            for (b, board) in boards.iter().take(GRID).enumerate() {
                grid[b] = normalize_marks(board);
            }
        }
        Value::Object(map) => {
            for (key, board) in map {
                if let Ok(b) = key.parse::<usize>()
                    && b < GRID
                {
                    grid[b] = normalize_marks(board);
                }
            }
        }
        Value::Null => {}
        other => {
            warn!(value = %other, "unexpected board grid shape");
        }
    }
    grid
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_code_shape() {
        let mut rng = rand::thread_rng();
        for _ in 0..50 {
            let code = generate_code(&mut rng);
            assert_eq!(code.len(), CODE_LEN);
            assert!(
                code.chars()
                    .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit())
            );
        }
    }

    #[test]
    fn test_sparse_object_lands_at_indices() {
        let row = normalize_marks(&json!({"4": "O", "8": "X", "banana": "X"}));
        assert_eq!(row[4], Some(Mark::O));
        assert_eq!(row[8], Some(Mark::X));
        assert_eq!(row[0], None);
    }

    #[test]
    fn test_dense_array_passes_through() {
        let row = normalize_marks(&json!(["X", null, "O", null, null, null, null, null, null]));
        assert_eq!(row[0], Some(Mark::X));
        assert_eq!(row[1], None);
        assert_eq!(row[2], Some(Mark::O));
    }

    #[test]
    fn test_garbage_normalizes_to_empty() {
        assert_eq!(normalize_marks(&json!(42)), [None; GRID]);
        assert_eq!(normalize_marks(&json!(["Z", 7, {}])), [None; GRID]);
        let grid = normalize_grids(&json!("nope"));
        assert_eq!(grid, [[None; GRID]; GRID]);
    }

    #[test]
    fn test_snapshot_round_trip() {
        let mut board = Board::new();
        board.write_cell(4, 4, Mark::X);
        board.set_outcome(4, Outcome::Won(Mark::X));
        board.set_active(ActiveBoard::Only(4));
        board.set_to_move(Mark::O);
        board.set_last_move(Some(Move::new(4, 4)));

        let record = SessionRecord::snapshot(&board, None);
        let value = record.to_value().unwrap();
        let parsed = SessionRecord::from_value(&value);

        let mut rebuilt = Board::new();
        parsed.write_board(&mut rebuilt);
        assert_eq!(rebuilt, board);
    }

    #[test]
    fn test_wire_field_names() {
        let record = SessionRecord::snapshot(&Board::new(), None);
        let value = record.to_value().unwrap();
        let obj = value.as_object().unwrap();
        for key in [
            "player1",
            "player2",
            "currentPlayer",
            "activeBoard",
            "localBoards",
            "wonBoards",
            "gameOver",
            "winner",
            "lastMove",
            "timerType",
            "timerX",
            "timerO",
            "timerIncrement",
            "createdAt",
        ] {
            assert!(obj.contains_key(key), "missing wire field {key}");
        }
        assert_eq!(obj["timerType"], json!("none"));
        assert_eq!(obj["currentPlayer"], json!("X"));
    }

    #[test]
    fn test_overlay_preserves_participant_slots() {
        let mut current = json!({
            "player1": {"id": "player1", "player": "X", "connected": true},
            "player2": {"id": "player2", "player": "O", "connected": true},
            "createdAt": 12345,
            "currentPlayer": "X"
        });
        let mut board = Board::new();
        board.set_to_move(Mark::O);
        let record = SessionRecord::snapshot(&board, None);
        record.overlay_onto(&mut current).unwrap();
        assert_eq!(current["player2"]["connected"], json!(true));
        assert_eq!(current["createdAt"], json!(12345));
        assert_eq!(current["currentPlayer"], json!("O"));
    }

    #[test]
    fn test_from_value_defaults_on_missing_fields() {
        let record = SessionRecord::from_value(&json!({}));
        assert_eq!(record.current_player, Mark::X);
        assert!(!record.game_over);
        assert_eq!(record.won_boards, [None; GRID]);
        assert_eq!(record.timer_type, None);
        assert!(record.player1.is_none());
    }

    #[test]
    fn test_unknown_winner_string_reads_as_null() {
        let record = SessionRecord::from_value(&json!({"gameOver": true, "winner": "draw"}));
        assert_eq!(record.winner, None);
        let mut board = Board::new();
        record.write_board(&mut board);
        assert_eq!(board.status(), Status::Draw);
    }
}
