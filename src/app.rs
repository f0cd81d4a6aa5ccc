//! Interactive game loops: local play and online sessions.

use crate::ai::{self, Difficulty};
use crate::game::{Game, Mark, Move};
use crate::session::SessionRecord;
use crate::store::{GameStore, HttpStore};
use crate::sync::{SessionEvent, SessionSync};
use crate::timer::{Clock, TimerProfile};
use crate::view::{Presenter, TextPresenter};
use anyhow::Context;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tracing::warn;

/// Pause before a machine move so it reads as deliberate.
const AI_THINK_DELAY: Duration = Duration::from_millis(300);
/// Clock poll cadence while waiting on input or remote updates.
const TICK_INTERVAL: Duration = Duration::from_millis(250);

/// A running time control: the preset plus the live clocks.
struct TimeControl {
    profile: TimerProfile,
    clock: Clock,
}

impl TimeControl {
    fn new(profile: TimerProfile) -> Self {
        Self {
            profile,
            clock: Clock::new(profile),
        }
    }

    fn as_parts(&self) -> (TimerProfile, &Clock) {
        (self.profile, &self.clock)
    }
}

fn timer_parts(timer: &Option<TimeControl>) -> Option<(TimerProfile, &Clock)> {
    timer.as_ref().map(TimeControl::as_parts)
}

fn parse_move(text: &str) -> Option<Move> {
    let mut parts = text.split_whitespace();
    let board = parts.next()?.parse().ok()?;
    let cell = parts.next()?.parse().ok()?;
    parts.next().is_none().then_some(Move::new(board, cell))
}

fn render(presenter: &TextPresenter, game: &Game, timer: &Option<TimeControl>) {
    println!("{}", presenter.render_board(game.board()));
    if let Some(t) = timer {
        println!("{}", presenter.render_clocks(&t.clock));
    }
    println!("{}", presenter.describe_status(game.board()));
}

/// What a human turn produced.
enum TurnInput {
    Move(Move),
    Timeout(Mark),
    Quit,
}

/// Reads one move from stdin, watching the mover's clock in the gaps.
async fn read_move(
    lines: &mut Lines<BufReader<Stdin>>,
    clock: Option<&Clock>,
    to_move: Mark,
) -> anyhow::Result<TurnInput> {
    let mut tick = tokio::time::interval(TICK_INTERVAL);
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(text) = line.context("reading stdin")? else {
                    return Ok(TurnInput::Quit);
                };
                let text = text.trim();
                if text.eq_ignore_ascii_case("quit") {
                    return Ok(TurnInput::Quit);
                }
                match parse_move(text) {
                    Some(mv) => return Ok(TurnInput::Move(mv)),
                    None => println!("Enter a move as: <board> <cell> (e.g. 4 0)"),
                }
            }
            _ = tick.tick() => {
                if let Some(clock) = clock
                    && clock.expired() == Some(to_move)
                {
                    return Ok(TurnInput::Timeout(to_move));
                }
            }
        }
    }
}

/// Runs a local game. With a difficulty set, the machine takes the side
/// opposite `human_side`; otherwise both seats share the keyboard.
pub async fn run_local(
    difficulty: Option<Difficulty>,
    human_side: Mark,
    profile: Option<TimerProfile>,
) -> anyhow::Result<()> {
    let mut game = Game::new();
    let mut timer = profile.map(TimeControl::new);
    let presenter = TextPresenter;
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let machine = difficulty.map(|d| (human_side.opponent(), d));

    println!("{}", presenter.legend());
    if let Some(t) = &mut timer {
        t.clock.start(Mark::X);
    }

    loop {
        render(&presenter, &game, &timer);
        if game.board().status().is_over() {
            break;
        }
        let to_move = game.board().to_move();

        let mv = match machine {
            Some((mark, d)) if mark == to_move => {
                tokio::time::sleep(AI_THINK_DELAY).await;
                match ai::choose_move(game.board(), mark, d, &mut rand::thread_rng()) {
                    Some(mv) => mv,
                    None => {
                        warn!("no legal machine move in a live position");
                        break;
                    }
                }
            }
            _ => {
                match read_move(&mut lines, timer.as_ref().map(|t| &t.clock), to_move).await? {
                    TurnInput::Move(mv) => mv,
                    TurnInput::Timeout(flagged) => {
                        if let Some(t) = &mut timer {
                            t.clock.stop();
                        }
                        game.forfeit_on_timeout(flagged);
                        continue;
                    }
                    TurnInput::Quit => return Ok(()),
                }
            }
        };

        match game.apply_move(mv) {
            Ok(report) => {
                if let Some(t) = &mut timer {
                    t.clock.stop();
                    t.clock.add_increment(report.mover);
                    if !report.status.is_over() {
                        t.clock.start(game.board().to_move());
                    }
                }
            }
            Err(e) => println!("Move rejected: {e}"),
        }
    }
    Ok(())
}

/// Creates an online session, waits for an opponent, then plays as X.
pub async fn run_host(server_url: &str, profile: Option<TimerProfile>) -> anyhow::Result<()> {
    let store = HttpStore::new(server_url);
    let game = Game::new();
    let mut timer = profile.map(TimeControl::new);
    let mut sync = SessionSync::create(store, game.board(), timer_parts(&timer)).await?;

    println!("Session code: {}", sync.code());
    println!(
        "Your opponent joins with: ultimate-ttt join --server-url {} {}",
        server_url,
        sync.code()
    );
    println!("Waiting for an opponent to join...");
    loop {
        match sync.next_update().await {
            Some(SessionEvent::OpponentJoined(_)) => break,
            Some(_) => {}
            None => anyhow::bail!("session ended before an opponent joined"),
        }
    }
    println!("Opponent joined. You play X.");

    if let Some(t) = &mut timer {
        t.clock.start(Mark::X);
    }
    online_loop(sync, game, timer, Mark::X).await
}

/// Joins an existing session by code and plays as O.
pub async fn run_join(server_url: &str, code: &str) -> anyhow::Result<()> {
    let store = HttpStore::new(server_url);
    let (sync, record) = SessionSync::join(store, code).await?;
    println!("Joined session {}. You play O.", sync.code());

    let mut game = Game::new();
    record.write_board(game.board_mut());
    let mut timer = record.timer_type.map(|profile| {
        let clock = clock_from_record(profile, &record);
        TimeControl { profile, clock }
    });
    if let Some(t) = &mut timer
        && !game.board().status().is_over()
    {
        t.clock.start(game.board().to_move());
    }
    online_loop(sync, game, timer, Mark::O).await
}

fn clock_from_record(profile: TimerProfile, record: &SessionRecord) -> Clock {
    let x = record
        .timer_x
        .map_or(profile.initial(), Duration::from_millis);
    let o = record
        .timer_o
        .map_or(profile.initial(), Duration::from_millis);
    let increment = record
        .timer_increment
        .map_or(profile.increment(), Duration::from_millis);
    Clock::from_parts(x, o, increment)
}

async fn online_loop<S: GameStore>(
    mut sync: SessionSync<S>,
    mut game: Game,
    mut timer: Option<TimeControl>,
    my_mark: Mark,
) -> anyhow::Result<()> {
    let presenter = TextPresenter;
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut tick = tokio::time::interval(TICK_INTERVAL);

    println!("{}", presenter.legend());
    render(&presenter, &game, &timer);

    while !game.board().status().is_over() {
        tokio::select! {
            line = lines.next_line() => {
                let Some(text) = line.context("reading stdin")? else { break };
                let text = text.trim();
                if text.eq_ignore_ascii_case("quit") {
                    break;
                }
                if game.board().to_move() != my_mark {
                    println!("Waiting for your opponent's move.");
                    continue;
                }
                let Some(mv) = parse_move(text) else {
                    println!("Enter a move as: <board> <cell> (e.g. 4 0)");
                    continue;
                };
                match game.apply_move(mv) {
                    Ok(report) => {
                        if let Some(t) = &mut timer {
                            t.clock.stop();
                            t.clock.add_increment(report.mover);
                            if !report.status.is_over() {
                                t.clock.start(game.board().to_move());
                            }
                        }
                        sync.publish(game.board(), timer_parts(&timer)).await?;
                        render(&presenter, &game, &timer);
                    }
                    Err(e) => println!("Move rejected: {e}"),
                }
            }
            event = sync.next_update() => {
                match event {
                    Some(SessionEvent::State(record)) => {
                        record.write_board(game.board_mut());
                        if let Some(t) = &mut timer {
                            t.clock.stop();
                            if let (Some(x), Some(o)) = (record.timer_x, record.timer_o) {
                                t.clock.set_remaining(Mark::X, Duration::from_millis(x));
                                t.clock.set_remaining(Mark::O, Duration::from_millis(o));
                            }
                            if !game.board().status().is_over() {
                                t.clock.start(game.board().to_move());
                            }
                        }
                        render(&presenter, &game, &timer);
                    }
                    Some(SessionEvent::OpponentJoined(_)) => {
                        println!("Opponent reconnected.");
                    }
                    Some(SessionEvent::OpponentLeft) => {
                        println!("Opponent disconnected.");
                    }
                    None => {
                        println!("Session ended.");
                        break;
                    }
                }
            }
            _ = tick.tick() => {
                if let Some(t) = &mut timer {
                    if let Some(flagged) = t.clock.expired() {
                        t.clock.stop();
                        game.forfeit_on_timeout(flagged);
                        sync.publish(game.board(), timer_parts(&timer)).await?;
                        render(&presenter, &game, &timer);
                    } else if t.clock.running_for() == Some(my_mark) {
                        sync.publish_timer(game.board(), timer_parts(&timer)).await?;
                    }
                }
            }
        }
    }

    if game.board().status().is_over() {
        println!("{}", presenter.describe_status(game.board()));
    }
    sync.disconnect().await?;
    Ok(())
}
