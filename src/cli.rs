//! Command-line interface definitions.

use crate::ai::Difficulty;
use crate::game::Mark;
use crate::timer::TimerProfile;
use clap::{Parser, Subcommand, ValueEnum};

/// Ultimate tic-tac-toe: local play against the machine or another human,
/// and online play through a shared store server.
#[derive(Parser, Debug)]
#[command(name = "ultimate-ttt")]
#[command(about = "Ultimate tic-tac-toe, local and online", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Subcommand to run
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the shared store server that online sessions meet on
    Serve {
        /// Address to bind
        #[arg(long, default_value = "127.0.0.1")]
        host: String,
        /// Port to bind
        #[arg(long, default_value_t = 8080)]
        port: u16,
    },
    /// Play a local game, hot-seat or against the machine
    Play {
        /// Machine opponent strength; omit for two humans at one keyboard
        #[arg(long, value_enum)]
        difficulty: Option<DifficultyArg>,
        /// Which mark you play against the machine
        #[arg(long, value_enum, default_value_t = SideArg::X)]
        side: SideArg,
        /// Time control; omit for untimed play
        #[arg(long, value_enum)]
        timer: Option<TimerArg>,
    },
    /// Create an online session and wait for an opponent
    Host {
        /// Base URL of the store server
        #[arg(long, default_value = "http://127.0.0.1:8080")]
        server_url: String,
        /// Time control; omit for untimed play
        #[arg(long, value_enum)]
        timer: Option<TimerArg>,
    },
    /// Join an online session by its code
    Join {
        /// Base URL of the store server
        #[arg(long, default_value = "http://127.0.0.1:8080")]
        server_url: String,
        /// Session code shared by the host
        code: String,
    },
}

/// Machine opponent strength.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum DifficultyArg {
    /// Random with basic local tactics
    Easy,
    /// Tactical heuristics with deliberate lapses
    Medium,
    /// Depth-limited minimax search
    Hard,
}

impl From<DifficultyArg> for Difficulty {
    fn from(arg: DifficultyArg) -> Self {
        match arg {
            DifficultyArg::Easy => Difficulty::Easy,
            DifficultyArg::Medium => Difficulty::Medium,
            DifficultyArg::Hard => Difficulty::Hard,
        }
    }
}

/// Which mark the human plays locally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SideArg {
    /// Move first
    X,
    /// Move second
    O,
}

impl From<SideArg> for Mark {
    fn from(arg: SideArg) -> Self {
        match arg {
            SideArg::X => Mark::X,
            SideArg::O => Mark::O,
        }
    }
}

/// Time-control presets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum TimerArg {
    /// 5 minutes, +5 seconds per move
    Rapid,
    /// 3 minutes, +2 seconds per move
    Blitz,
    /// 2 minutes, +1 second per move
    Bullet,
}

impl From<TimerArg> for TimerProfile {
    fn from(arg: TimerArg) -> Self {
        match arg {
            TimerArg::Rapid => TimerProfile::Rapid,
            TimerArg::Blitz => TimerProfile::Blitz,
            TimerArg::Bullet => TimerProfile::Bullet,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_play_with_ai() {
        let cli = Cli::try_parse_from([
            "ultimate-ttt",
            "play",
            "--difficulty",
            "hard",
            "--side",
            "o",
            "--timer",
            "blitz",
        ])
        .unwrap();
        match cli.command {
            Command::Play {
                difficulty,
                side,
                timer,
            } => {
                assert_eq!(difficulty, Some(DifficultyArg::Hard));
                assert_eq!(side, SideArg::O);
                assert_eq!(timer, Some(TimerArg::Blitz));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_parse_join_defaults() {
        let cli = Cli::try_parse_from(["ultimate-ttt", "join", "AB12CD"]).unwrap();
        match cli.command {
            Command::Join { server_url, code } => {
                assert_eq!(server_url, "http://127.0.0.1:8080");
                assert_eq!(code, "AB12CD");
            }
            other => panic!("unexpected command {other:?}"),
        }
    }
}
