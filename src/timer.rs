//! Per-player move clocks with increment-on-move.
//!
//! Exactly one clock runs at a time, tied to the player to move. Built on
//! `tokio::time::Instant` so tests can drive the clock with paused time.

use crate::game::Mark;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info};

/// Named time-control presets: (initial time, increment per move).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerProfile {
    /// 5 minutes, +5 seconds per move.
    Rapid,
    /// 3 minutes, +2 seconds per move.
    Blitz,
    /// 2 minutes, +1 second per move.
    Bullet,
}

impl TimerProfile {
    /// Initial time per player.
    pub fn initial(self) -> Duration {
        match self {
            TimerProfile::Rapid => Duration::from_secs(5 * 60),
            TimerProfile::Blitz => Duration::from_secs(3 * 60),
            TimerProfile::Bullet => Duration::from_secs(2 * 60),
        }
    }

    /// Increment credited to the mover after each completed move.
    pub fn increment(self) -> Duration {
        match self {
            TimerProfile::Rapid => Duration::from_secs(5),
            TimerProfile::Blitz => Duration::from_secs(2),
            TimerProfile::Bullet => Duration::from_secs(1),
        }
    }

    /// Name used on the shared-store record ("none" stands for no timer).
    pub fn wire_name(self) -> &'static str {
        match self {
            TimerProfile::Rapid => "rapid",
            TimerProfile::Blitz => "blitz",
            TimerProfile::Bullet => "bullet",
        }
    }

    /// Parses a wire name; "none" and unknown strings yield `None`.
    pub fn from_wire(name: &str) -> Option<Self> {
        match name {
            "rapid" => Some(TimerProfile::Rapid),
            "blitz" => Some(TimerProfile::Blitz),
            "bullet" => Some(TimerProfile::Bullet),
            _ => None,
        }
    }
}

impl std::fmt::Display for TimerProfile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.wire_name())
    }
}

/// Countdown clocks for both players.
#[derive(Debug, Clone)]
pub struct Clock {
    remaining: [Duration; 2],
    increment: Duration,
    running: Option<(Mark, Instant)>,
}

fn slot(mark: Mark) -> usize {
    match mark {
        Mark::X => 0,
        Mark::O => 1,
    }
}

impl Clock {
    /// Fresh clocks from a preset.
    pub fn new(profile: TimerProfile) -> Self {
        Self::from_parts(profile.initial(), profile.initial(), profile.increment())
    }

    /// Clocks from explicit remaining times, e.g. a remote snapshot.
    pub fn from_parts(x: Duration, o: Duration, increment: Duration) -> Self {
        Self {
            remaining: [x, o],
            increment,
            running: None,
        }
    }

    /// Starts ticking for `mark`, stopping any running clock first.
    pub fn start(&mut self, mark: Mark) {
        self.stop();
        debug!(mark = %mark, "clock started");
        self.running = Some((mark, Instant::now()));
    }

    /// Stops the running clock, debiting elapsed time (floored at zero).
    /// Idempotent when nothing is running.
    pub fn stop(&mut self) {
        if let Some((mark, since)) = self.running.take() {
            let elapsed = since.elapsed();
            self.debit(mark, elapsed);
            debug!(mark = %mark, elapsed_ms = elapsed.as_millis() as u64, "clock stopped");
        }
    }

    /// Removes `elapsed` from a player's remaining time, floored at zero.
    pub fn debit(&mut self, mark: Mark, elapsed: Duration) {
        let r = &mut self.remaining[slot(mark)];
        *r = r.saturating_sub(elapsed);
    }

    /// Credits the configured increment to the player who just moved.
    pub fn add_increment(&mut self, mark: Mark) {
        self.remaining[slot(mark)] += self.increment;
    }

    /// Remaining time for `mark`, accounting for a running clock.
    pub fn remaining(&self, mark: Mark) -> Duration {
        let base = self.remaining[slot(mark)];
        match self.running {
            Some((m, since)) if m == mark => base.saturating_sub(since.elapsed()),
            _ => base,
        }
    }

    /// The mark whose clock is ticking, if any.
    pub fn running_for(&self) -> Option<Mark> {
        self.running.map(|(m, _)| m)
    }

    /// The running player whose time has reached zero, if any. The caller
    /// turns this into a terminal game outcome.
    pub fn expired(&self) -> Option<Mark> {
        match self.running {
            Some((mark, _)) if self.remaining(mark) == Duration::ZERO => {
                info!(mark = %mark, "clock expired");
                Some(mark)
            }
            _ => None,
        }
    }

    /// Configured increment per move.
    pub fn increment(&self) -> Duration {
        self.increment
    }

    pub(crate) fn set_remaining(&mut self, mark: Mark, remaining: Duration) {
        self.remaining[slot(mark)] = remaining;
    }

    /// Display string for a remaining duration, minutes:zero-padded seconds.
    pub fn format(remaining: Duration) -> String {
        let total = remaining.as_secs();
        format!("{}:{:02}", total / 60, total % 60)
    }
}
