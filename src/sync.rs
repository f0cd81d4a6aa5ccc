//! Session synchronizer: reconciles local game state with a shared store
//! record owned jointly by two peers.
//!
//! The store is eventually consistent and echoes a peer's own writes back
//! through its subscription. Publishing registers the fingerprint of the
//! written state up front, so the echo (and any other snapshot matching
//! the last processed state) is dropped by reconciliation; only genuinely
//! new remote state surfaces.

use crate::game::{Board, Mark};
use crate::session::{self, Participant, Seat, SessionRecord};
use crate::store::{GameStore, StoreError};
use crate::timer::{Clock, TimerProfile};
use derive_more::{Display, Error, From};
use serde_json::Value;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// How many candidate codes creation tries before giving up.
const MAX_CODE_ATTEMPTS: usize = 16;
/// Minimum spacing between timer-only publishes.
const TIMER_PUBLISH_INTERVAL: Duration = Duration::from_secs(1);
/// How long a departing peer waits before deciding the session is dead.
const DISCONNECT_GRACE: Duration = Duration::from_secs(5);

/// Failure establishing or driving a session.
#[derive(Debug, Display, Error, From)]
pub enum SessionError {
    /// No record exists under the given code.
    #[display("no session found under that code")]
    NotFound,
    /// Both seats are already taken.
    #[display("session already has two players")]
    Full,
    /// The creator left before anyone joined.
    #[display("the session host is no longer connected")]
    HostGone,
    /// Every generated code collided with an existing record.
    #[display("could not find a free session code")]
    CodesExhausted,
    /// Underlying store failure.
    #[display("store error: {_0}")]
    Store(StoreError),
    /// Record could not be serialized.
    #[display("record encoding failed: {_0}")]
    Payload(serde_json::Error),
}

/// The fields that identify a distinct game state on the record. Two
/// snapshots with equal fingerprints describe the same position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Fingerprint {
    current_player: Mark,
    last_move: Option<session::LastMove>,
    game_over: bool,
    winner: Option<Mark>,
}

impl Fingerprint {
    fn of(record: &SessionRecord) -> Self {
        Self {
            current_player: record.current_player,
            last_move: record.last_move,
            game_over: record.game_over,
            winner: record.winner,
        }
    }
}

/// What reconciliation extracted from a store snapshot.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// The opponent took their seat; carries the record as of that moment.
    OpponentJoined(SessionRecord),
    /// The opponent flagged themselves disconnected.
    OpponentLeft,
    /// New remote game state to adopt.
    State(SessionRecord),
}

/// One peer's attachment to a shared session record.
pub struct SessionSync<S: GameStore> {
    store: S,
    code: String,
    seat: Seat,
    updates: mpsc::Receiver<Value>,
    last_seen: Option<Fingerprint>,
    opponent_connected: bool,
    last_timer_publish: Option<Instant>,
}

// Manual impl: the store handle itself has nothing useful to show and
// need not be Debug.
impl<S: GameStore> std::fmt::Debug for SessionSync<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionSync")
            .field("code", &self.code)
            .field("seat", &self.seat)
            .field("opponent_connected", &self.opponent_connected)
            .finish_non_exhaustive()
    }
}

impl<S: GameStore> SessionSync<S> {
    /// Creates a fresh session: picks an unused code, writes the initial
    /// record with this peer in the creator seat, and subscribes.
    pub async fn create(
        store: S,
        board: &Board,
        timer: Option<(TimerProfile, &Clock)>,
    ) -> Result<Self, SessionError> {
        let mut picked = None;
        for _ in 0..MAX_CODE_ATTEMPTS {
            let candidate = session::generate_code(&mut rand::thread_rng());
            if store.get(&candidate).await?.is_none() {
                picked = Some(candidate);
                break;
            }
            debug!(code = %candidate, "session code collision, retrying");
        }
        let code = picked.ok_or(SessionError::CodesExhausted)?;

        let mut record = SessionRecord::snapshot(board, timer);
        record.player1 = Some(Participant::joined(Seat::Player1));
        let fingerprint = Fingerprint::of(&record);
        store.put(&code, record.to_value()?).await?;
        let updates = store.subscribe(&code).await?;
        info!(code = %code, "session created");
        Ok(Self {
            store,
            code,
            seat: Seat::Player1,
            updates,
            last_seen: Some(fingerprint),
            opponent_connected: false,
            last_timer_publish: None,
        })
    }

    /// Joins an existing session in the second seat. Returns the
    /// synchronizer plus the record as found, so the caller can adopt the
    /// host's board and timer settings.
    pub async fn join(store: S, code: &str) -> Result<(Self, SessionRecord), SessionError> {
        let mut raw = store.get(code).await?.ok_or(SessionError::NotFound)?;
        let record = SessionRecord::from_value(&raw);
        if record.player2.as_ref().is_some_and(|p| p.connected) {
            return Err(SessionError::Full);
        }
        if !record.player1.as_ref().is_some_and(|p| p.connected) {
            return Err(SessionError::HostGone);
        }

        raw["player2"] = serde_json::to_value(Participant::joined(Seat::Player2))?;
        store.put(code, raw).await?;
        let updates = store.subscribe(code).await?;
        info!(code, "joined session");
        let sync = Self {
            store,
            code: code.to_string(),
            seat: Seat::Player2,
            updates,
            last_seen: Some(Fingerprint::of(&record)),
            opponent_connected: true,
            last_timer_publish: None,
        };
        Ok((sync, record))
    }

    /// The session code peers share out of band.
    pub fn code(&self) -> &str {
        &self.code
    }

    /// This peer's seat.
    pub fn seat(&self) -> Seat {
        self.seat
    }

    /// The mark this peer plays.
    pub fn mark(&self) -> Mark {
        self.seat.mark()
    }

    /// Publishes the local game state onto the record, preserving the
    /// participant slots and creation time as currently stored. The
    /// written state's fingerprint becomes the last-seen state, so the
    /// store's echo of this write is dropped on arrival.
    pub async fn publish(
        &mut self,
        board: &Board,
        timer: Option<(TimerProfile, &Clock)>,
    ) -> Result<(), SessionError> {
        let mut raw = self
            .store
            .get(&self.code)
            .await?
            .unwrap_or_else(|| Value::Object(Default::default()));
        let record = SessionRecord::snapshot(board, timer);
        record.overlay_onto(&mut raw)?;
        // Refresh this peer's own slot; a concurrent whole-record write
        // from the opponent may have carried a stale copy of it.
        raw[self.seat.wire_id()] = serde_json::to_value(Participant::joined(self.seat))?;
        self.last_seen = Some(Fingerprint::of(&record));
        self.store.put(&self.code, raw).await?;
        debug!(code = %self.code, "published state");
        Ok(())
    }

    /// Publishes only to keep remote clocks fresh, at most once per second.
    /// A no-op when called faster or when timers are disabled.
    pub async fn publish_timer(
        &mut self,
        board: &Board,
        timer: Option<(TimerProfile, &Clock)>,
    ) -> Result<(), SessionError> {
        if timer.is_none() {
            return Ok(());
        }
        let now = Instant::now();
        if self
            .last_timer_publish
            .is_some_and(|at| now.duration_since(at) < TIMER_PUBLISH_INTERVAL)
        {
            return Ok(());
        }
        self.last_timer_publish = Some(now);
        self.publish(board, timer).await
    }

    /// Waits for the next snapshot that reconciliation accepts. Returns
    /// `None` when the subscription ends (record purged or store gone).
    pub async fn next_update(&mut self) -> Option<SessionEvent> {
        loop {
            let value = self.updates.recv().await?;
            if let Some(event) = self.reconcile(value) {
                return Some(event);
            }
        }
    }

    /// Decides whether a raw snapshot carries anything new. Opponent seat
    /// transitions pass through first; game state then goes through the
    /// echo/duplicate filter.
    fn reconcile(&mut self, value: Value) -> Option<SessionEvent> {
        let record = SessionRecord::from_value(&value);

        let opponent_here = record
            .participant(self.seat.opponent())
            .is_some_and(|p| p.connected);
        if opponent_here != self.opponent_connected {
            self.opponent_connected = opponent_here;
            return Some(if opponent_here {
                info!(code = %self.code, "opponent joined");
                SessionEvent::OpponentJoined(record)
            } else {
                info!(code = %self.code, "opponent left");
                SessionEvent::OpponentLeft
            });
        }

        let fingerprint = Fingerprint::of(&record);
        if self.last_seen == Some(fingerprint) {
            debug!(code = %self.code, "snapshot matches last state, dropping");
            return None;
        }
        self.last_seen = Some(fingerprint);
        Some(SessionEvent::State(record))
    }

    /// Detaches from the session: flags this seat as disconnected, then
    /// after a grace period purges the record if the opponent is gone too.
    pub async fn disconnect(mut self) -> Result<(), SessionError> {
        self.updates.close();
        if let Some(mut raw) = self.store.get(&self.code).await? {
            if let Some(slot) = raw.get_mut(self.seat.wire_id())
                && slot.is_object()
            {
                slot["connected"] = Value::Bool(false);
            }
            self.store.put(&self.code, raw).await?;
        }
        info!(code = %self.code, "disconnected from session");

        tokio::time::sleep(DISCONNECT_GRACE).await;
        match self.store.get(&self.code).await {
            Ok(Some(raw)) => {
                let record = SessionRecord::from_value(&raw);
                let anyone_connected = record
                    .player1
                    .as_ref()
                    .is_some_and(|p| p.connected)
                    || record.player2.as_ref().is_some_and(|p| p.connected);
                if !anyone_connected {
                    self.store.remove(&self.code).await?;
                    info!(code = %self.code, "session purged");
                }
            }
            Ok(None) => {}
            Err(e) => warn!(code = %self.code, error = %e, "purge check failed"),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::Game;
    use crate::store::MemoryStore;

    #[tokio::test]
    async fn test_create_then_join() {
        let store = MemoryStore::new();
        let board = Board::new();
        let host = SessionSync::create(store.clone(), &board, None)
            .await
            .unwrap();
        assert_eq!(host.seat(), Seat::Player1);

        let (guest, record) = SessionSync::join(store.clone(), host.code()).await.unwrap();
        assert_eq!(guest.mark(), Mark::O);
        assert!(record.player1.unwrap().connected);
        assert_eq!(record.current_player, Mark::X);
    }

    #[tokio::test]
    async fn test_join_missing_session() {
        let store = MemoryStore::new();
        let err = SessionSync::join(store, "NOPE99").await.unwrap_err();
        assert!(matches!(err, SessionError::NotFound));
    }

    #[tokio::test]
    async fn test_join_full_session() {
        let store = MemoryStore::new();
        let board = Board::new();
        let host = SessionSync::create(store.clone(), &board, None)
            .await
            .unwrap();
        let code = host.code().to_string();
        SessionSync::join(store.clone(), &code).await.unwrap();
        let err = SessionSync::join(store, &code).await.unwrap_err();
        assert!(matches!(err, SessionError::Full));
    }

    #[tokio::test]
    async fn test_opponent_move_flows_through() {
        let store = MemoryStore::new();
        let mut host_game = Game::new();
        let mut host =
            SessionSync::create(store.clone(), host_game.board(), None)
                .await
                .unwrap();
        let (mut guest, record) = SessionSync::join(store.clone(), host.code()).await.unwrap();
        let mut guest_game = Game::new();
        record.write_board(guest_game.board_mut());

        host_game
            .apply_move(crate::game::Move::new(4, 4))
            .unwrap();
        host.publish(host_game.board(), None).await.unwrap();

        let SessionEvent::State(update) = guest.next_update().await.unwrap() else {
            panic!("expected a state event");
        };
        assert_eq!(
            update.last_move,
            Some(session::LastMove {
                board_index: 4,
                cell_index: 4
            })
        );
        update.write_board(guest_game.board_mut());
        assert_eq!(guest_game.board(), host_game.board());
    }

    #[tokio::test]
    async fn test_host_sees_opponent_join() {
        let store = MemoryStore::new();
        let board = Board::new();
        let mut host = SessionSync::create(store.clone(), &board, None)
            .await
            .unwrap();
        SessionSync::join(store, host.code()).await.unwrap();
        match host.next_update().await.unwrap() {
            SessionEvent::OpponentJoined(record) => {
                assert!(record.player2.unwrap().connected);
            }
            other => panic!("unexpected event {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_own_echo_is_suppressed() {
        let store = MemoryStore::new();
        let mut game = Game::new();
        let mut host = SessionSync::create(store.clone(), game.board(), None)
            .await
            .unwrap();
        game.apply_move(crate::game::Move::new(0, 0)).unwrap();
        host.publish(game.board(), None).await.unwrap();

        // The subscription delivered our own write; reconcile must drop it.
        let echo = host.updates.recv().await.unwrap();
        assert!(host.reconcile(echo).is_none());
    }

    #[tokio::test]
    async fn test_duplicate_snapshot_is_deduped() {
        let store = MemoryStore::new();
        let board = Board::new();
        let host = SessionSync::create(store.clone(), &board, None)
            .await
            .unwrap();
        let code = host.code().to_string();
        let (mut guest, _) = SessionSync::join(store.clone(), &code).await.unwrap();

        let snapshot = store.get(&code).await.unwrap().unwrap();
        // First delivery of a state the guest already adopted at join.
        assert!(guest.reconcile(snapshot.clone()).is_none());
        assert!(guest.reconcile(snapshot).is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_disconnect_purges_abandoned_record() {
        let store = MemoryStore::new();
        let board = Board::new();
        let host = SessionSync::create(store.clone(), &board, None)
            .await
            .unwrap();
        let code = host.code().to_string();
        host.disconnect().await.unwrap();
        assert!(store.get(&code).await.unwrap().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_disconnect_keeps_record_while_peer_remains() {
        let store = MemoryStore::new();
        let board = Board::new();
        let host = SessionSync::create(store.clone(), &board, None)
            .await
            .unwrap();
        let code = host.code().to_string();
        let (guest, _) = SessionSync::join(store.clone(), &code).await.unwrap();
        drop(guest);
        host.disconnect().await.unwrap();
        // Guest never flagged itself disconnected, so the record survives.
        let raw = store.get(&code).await.unwrap().unwrap();
        let record = SessionRecord::from_value(&raw);
        assert!(!record.player1.unwrap().connected);
        assert!(record.player2.unwrap().connected);
    }

    #[tokio::test]
    async fn test_timer_publish_is_throttled() {
        let store = MemoryStore::new();
        let board = Board::new();
        let clock = Clock::new(TimerProfile::Blitz);
        let mut host = SessionSync::create(
            store.clone(),
            &board,
            Some((TimerProfile::Blitz, &clock)),
        )
        .await
        .unwrap();
        let code = host.code().to_string();

        host.publish_timer(&board, Some((TimerProfile::Blitz, &clock)))
            .await
            .unwrap();
        let first = store.get(&code).await.unwrap().unwrap();
        // Immediate second call is inside the throttle window.
        host.publish_timer(&board, Some((TimerProfile::Blitz, &clock)))
            .await
            .unwrap();
        let second = store.get(&code).await.unwrap().unwrap();
        assert_eq!(first, second);
    }
}
