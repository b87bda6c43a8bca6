mod display;

use std::collections::HashMap;
use std::io::{stdout, BufWriter, Write};
use std::path::PathBuf;
use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use crossterm::{
    cursor,
    event::{
        self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, KeyboardEnhancementFlags,
        PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags,
    },
    style::{self, Color, Print},
    terminal, ExecutableCommand, QueueableCommand,
};
use tracing::{error, info};

use keyblaster::audio;
use keyblaster::config::{Config, MAX_START_LEVEL};
use keyblaster::entities::RoundSignal;
use keyblaster::logging;
use keyblaster::name_input::{NameInput, NameKey, MAX_NAME_LEN};
use keyblaster::replay::{latest_replay, list_replays, load_replay, render_report, ReplayRecorder};
use keyblaster::scores::{
    best, format_row, insert_score, load_or_default, rank_for, save_or_warn, JsonScoreStore,
    ScoreEntry,
};
use keyblaster::session::GameSession;

// ── Command line ──────────────────────────────────────────────────────────────

#[derive(Debug, Parser)]
#[command(name = "keyblaster", version, about = "Type the labels on falling missiles before they reach your cities")]
struct Cli {
    /// Seed for the session's random generator (random when omitted)
    #[arg(long)]
    seed: Option<u64>,

    /// Config file (defaults to <config dir>/keyblaster/config.toml)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Level to start on (1-99)
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..=MAX_START_LEVEL as i64))]
    start_level: Option<u32>,

    /// Do not record a replay file
    #[arg(long)]
    no_replay: bool,

    /// Disable sound cues
    #[arg(long)]
    mute: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print a recorded replay and its debug summary
    Replay {
        /// Replay file (defaults to the most recent one)
        file: Option<PathBuf>,

        /// List the recorded replays, newest first
        #[arg(long)]
        list: bool,

        /// Show the most recent replay
        #[arg(long)]
        latest: bool,
    },
}

// ── Simultaneous-input constants ──────────────────────────────────────────────

/// A key counts as "held" if its last press/repeat event arrived this
/// recently.  Wall-clock rather than frames: turbo shortens frames tenfold
/// and the OS repeat rate does not follow.
const HOLD_WINDOW: Duration = Duration::from_millis(133);

/// Returns true if `key` was seen within the last `HOLD_WINDOW`.
fn is_held(key_seen: &HashMap<KeyCode, Instant>, key: &KeyCode, now: Instant) -> bool {
    key_seen
        .get(key)
        .map(|&last| now.saturating_duration_since(last) <= HOLD_WINDOW)
        .unwrap_or(false)
}

fn is_ctrl_c(code: KeyCode, modifiers: KeyModifiers) -> bool {
    code == KeyCode::Char('c') && modifiers.contains(KeyModifiers::CONTROL)
}

// ── Menu ──────────────────────────────────────────────────────────────────────

enum MenuResult {
    Start,
    HighScores,
    Quit,
}

fn show_menu<W: Write>(
    out: &mut W,
    rx: &mpsc::Receiver<Event>,
    table: &[ScoreEntry],
) -> std::io::Result<MenuResult> {
    out.queue(terminal::Clear(terminal::ClearType::All))?;

    let (width, height) = terminal::size()?;
    let cx = width / 2;
    let cy = height / 2;

    let title = "★  K E Y B L A S T E R  ★";
    out.queue(cursor::MoveTo(
        cx.saturating_sub(title.chars().count() as u16 / 2),
        cy.saturating_sub(8),
    ))?;
    out.queue(style::SetForegroundColor(Color::Cyan))?;
    out.queue(Print(title))?;

    let subtitle = "Type a missile's label to shoot it down";
    out.queue(cursor::MoveTo(
        cx.saturating_sub(subtitle.chars().count() as u16 / 2),
        cy.saturating_sub(7),
    ))?;
    out.queue(style::SetForegroundColor(Color::DarkGrey))?;
    out.queue(Print(subtitle))?;

    // Top three scores
    for (i, entry) in table.iter().take(3).enumerate() {
        let row = format_row(i, entry);
        out.queue(cursor::MoveTo(
            cx.saturating_sub(row.chars().count() as u16 / 2),
            cy.saturating_sub(5) + i as u16,
        ))?;
        out.queue(style::SetForegroundColor(Color::Yellow))?;
        out.queue(Print(&row))?;
    }

    let options: &[(&str, &str, Color)] = &[
        ("ENTER", "Start", Color::Green),
        ("H", "High scores", Color::Yellow),
        ("Q", "Quit", Color::Red),
    ];
    for (i, (key, label, color)) in options.iter().enumerate() {
        let row = cy + i as u16;
        out.queue(cursor::MoveTo(cx.saturating_sub(10), row))?;
        out.queue(style::SetForegroundColor(Color::DarkGrey))?;
        out.queue(Print(format!("[{:^5}] ", key)))?;
        out.queue(style::SetForegroundColor(*color))?;
        out.queue(Print(*label))?;
    }

    let legend: &[&str] = &[
        "Finish a label and the turret fires.",
        "A key found in no label triggers TURBO.",
        "Shoot the <◆> ship for double points.",
    ];
    for (i, line) in legend.iter().enumerate() {
        out.queue(cursor::MoveTo(cx.saturating_sub(20), cy + 4 + i as u16))?;
        out.queue(style::SetForegroundColor(Color::DarkGrey))?;
        out.queue(Print(*line))?;
    }

    out.queue(style::ResetColor)?;
    out.flush()?;

    // Block until the user makes a choice
    loop {
        match rx.recv() {
            Ok(Event::Key(KeyEvent { code, modifiers, kind: KeyEventKind::Press, .. })) => {
                match code {
                    KeyCode::Enter | KeyCode::Char(' ') => return Ok(MenuResult::Start),
                    KeyCode::Char('h') | KeyCode::Char('H') => return Ok(MenuResult::HighScores),
                    KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => {
                        return Ok(MenuResult::Quit);
                    }
                    _ if is_ctrl_c(code, modifiers) => return Ok(MenuResult::Quit),
                    _ => {}
                }
            }
            Ok(_) => {}
            Err(_) => return Ok(MenuResult::Quit),
        }
    }
}

/// Block until any key press.  `false` if the input thread is gone.
fn wait_for_key(rx: &mpsc::Receiver<Event>) -> bool {
    loop {
        match rx.recv() {
            Ok(Event::Key(KeyEvent { kind: KeyEventKind::Press, .. })) => return true,
            Ok(_) => {}
            Err(_) => return false,
        }
    }
}

fn drain(rx: &mpsc::Receiver<Event>) {
    while rx.try_recv().is_ok() {}
}

// ── Game loop ─────────────────────────────────────────────────────────────────

enum GameExit {
    Quit,
    GameOver,
}

/// Blocks on the pause overlay.  Returns `true` when the player quits.
fn pause<W: Write>(out: &mut W, rx: &mpsc::Receiver<Event>) -> std::io::Result<bool> {
    display::draw_pause(out)?;
    loop {
        match rx.recv() {
            Ok(Event::Key(KeyEvent { code, modifiers, kind: KeyEventKind::Press, .. })) => {
                if is_ctrl_c(code, modifiers) {
                    return Ok(true);
                }
                if matches!(code, KeyCode::Char('p') | KeyCode::Char('P')) {
                    return Ok(false);
                }
            }
            Ok(_) => {}
            Err(_) => return Ok(true),
        }
    }
}

/// Input model: typed characters go straight to the session in arrival
/// order at the start of each frame.  Space is the only held key; it is
/// tracked in `key_seen` (last press/repeat instant per key) so holding it
/// fast-forwards the clock until release or until repeats stop arriving.
fn game_loop<W: Write>(
    out: &mut W,
    session: &mut GameSession,
    rx: &mpsc::Receiver<Event>,
    high_score: u32,
) -> std::io::Result<GameExit> {
    let timing = session.config().timing.clone();
    let base_frame = Duration::from_millis(1000 / timing.fps.max(1) as u64);
    let mut key_seen: HashMap<KeyCode, Instant> = HashMap::new();

    loop {
        let frame_start = Instant::now();

        // ── Drain all pending input events (non-blocking) ─────────────────────
        while let Ok(ev) = rx.try_recv() {
            let Event::Key(KeyEvent { code, kind, modifiers, .. }) = ev else {
                continue;
            };
            match kind {
                KeyEventKind::Press => {
                    key_seen.insert(code, Instant::now());
                    match code {
                        _ if is_ctrl_c(code, modifiers) => return Ok(GameExit::Quit),
                        KeyCode::Esc => {
                            if pause(out, rx)? {
                                return Ok(GameExit::Quit);
                            }
                            key_seen.clear();
                        }
                        KeyCode::Char(' ') => {}
                        KeyCode::Char(c) => {
                            session.handle_char(c);
                        }
                        _ => {}
                    }
                }
                KeyEventKind::Repeat => {
                    key_seen.insert(code, Instant::now());
                }
                KeyEventKind::Release => {
                    key_seen.remove(&code);
                }
            }
        }

        let fast_forward = is_held(&key_seen, &KeyCode::Char(' '), Instant::now());
        let speed = session.tick_multiplier(fast_forward).max(1);
        let signal = session.tick();

        display::render(out, session, high_score, fast_forward)?;

        match signal {
            RoundSignal::Running => {}
            RoundSignal::GameOver => return Ok(GameExit::GameOver),
            RoundSignal::NewLevel => {
                display::draw_level_banner(out, session.level().difficulty() + 1)?;
                thread::sleep(Duration::from_millis(timing.level_pause_ms));
                // Keys mashed during the banner would leak into the next level
                drain(rx);
                key_seen.clear();
                session.start_next_level();
                continue;
            }
        }

        let frame = base_frame / speed;
        let elapsed = frame_start.elapsed();
        if elapsed < frame {
            thread::sleep(frame - elapsed);
        }
    }
}

/// Name prompt after a qualifying score.  `None` when the player quits.
fn enter_name<W: Write>(
    out: &mut W,
    rx: &mpsc::Receiver<Event>,
    score: u32,
    rank: usize,
) -> std::io::Result<Option<String>> {
    let mut input = NameInput::new(MAX_NAME_LEN);
    while !input.is_finished() {
        display::draw_name_entry(out, score, rank, &input)?;
        match rx.recv() {
            Ok(Event::Key(KeyEvent { code, modifiers, kind: KeyEventKind::Press, .. })) => {
                match code {
                    _ if is_ctrl_c(code, modifiers) => return Ok(None),
                    KeyCode::Enter => input.handle(NameKey::Enter),
                    KeyCode::Backspace => input.handle(NameKey::Backspace),
                    KeyCode::Char(c) => input.handle(NameKey::Char(c)),
                    _ => {}
                }
            }
            Ok(_) => {}
            Err(_) => return Ok(None),
        }
    }
    Ok(Some(input.value()))
}

// ── Session runner ────────────────────────────────────────────────────────────

struct Launch {
    config: Config,
    seed: Option<u64>,
    record: bool,
    sound: bool,
}

impl Launch {
    fn new_session(&self) -> GameSession {
        let seed = self.seed.unwrap_or_else(rand::random);
        let mut session = GameSession::new(self.config.clone(), seed)
            .with_audio(audio::from_config(self.sound));
        if self.record {
            let dir = self.config.storage.replay_dir();
            let recorder = ReplayRecorder::in_dir(&dir, self.config.timing.fps);
            session = session.with_observer(Box::new(recorder));
        }
        info!(seed, "session started");
        session
    }
}

fn run<W: Write>(out: &mut W, rx: &mpsc::Receiver<Event>, launch: &Launch) -> Result<()> {
    let store = JsonScoreStore::new(launch.config.storage.scores_path());
    let mut table = load_or_default(&store);

    loop {
        match show_menu(out, rx, &table)? {
            MenuResult::Quit => break,
            MenuResult::HighScores => {
                display::draw_high_scores(out, &table, None)?;
                if !wait_for_key(rx) {
                    break;
                }
            }
            MenuResult::Start => {
                let mut session = launch.new_session();
                let exit = game_loop(out, &mut session, rx, best(&table))?;
                session.finish();
                let score = session.score();
                info!(score, level = session.level().difficulty(), "session ended");

                if let GameExit::Quit = exit {
                    break;
                }

                // Let the game-over overlay sink in
                thread::sleep(Duration::from_millis(1500));
                drain(rx);

                let mut highlight = None;
                if let Some(rank) = rank_for(&table, score) {
                    let Some(name) = enter_name(out, rx, score, rank)? else {
                        break;
                    };
                    highlight = insert_score(&mut table, &name, score);
                    save_or_warn(&store, &table);
                }
                display::draw_high_scores(out, &table, highlight)?;
                if !wait_for_key(rx) {
                    break;
                }
            }
        }
    }
    Ok(())
}

// ── Replay viewer ─────────────────────────────────────────────────────────────

fn run_replay_viewer(config: &Config, file: Option<PathBuf>, list: bool, latest: bool) -> Result<()> {
    let dir = config.storage.replay_dir();

    if list {
        let files = list_replays(&dir)
            .with_context(|| format!("listing replays in {}", dir.display()))?;
        if files.is_empty() {
            println!("no replays in {}", dir.display());
        }
        for (i, path) in files.iter().enumerate() {
            println!("{:>3}. {}", i + 1, path.display());
        }
        return Ok(());
    }

    let path = match file {
        Some(path) if !latest => path,
        _ => latest_replay(&dir)?,
    };
    let replay = load_replay(&path).with_context(|| format!("reading replay {}", path.display()))?;
    print!("{}", render_report(&path, &replay));
    Ok(())
}

// ── Entry point ───────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = Config::load(cli.config.as_deref()).context("loading configuration")?;
    if let Some(level) = cli.start_level {
        config.spawning.start_level = level;
    }
    logging::init(&config.storage.log_path());

    if let Some(Command::Replay { file, list, latest }) = cli.command {
        return run_replay_viewer(&config, file, list, latest);
    }

    let launch = Launch {
        record: config.storage.record_replays && !cli.no_replay,
        sound: config.storage.sound && !cli.mute,
        seed: cli.seed,
        config,
    };

    let raw_out = stdout();
    let mut out = BufWriter::new(raw_out);

    terminal::enable_raw_mode().context("enabling raw mode")?;
    out.execute(terminal::EnterAlternateScreen)?;
    out.execute(cursor::Hide)?;

    // Request key-release (and key-repeat) events from the terminal.
    // Kitty-protocol terminals support this; others fall back gracefully.
    let keyboard_enhanced = out
        .execute(PushKeyboardEnhancementFlags(
            KeyboardEnhancementFlags::REPORT_EVENT_TYPES,
        ))
        .is_ok();

    // Dedicate a thread exclusively to blocking event reads, sending them
    // through a channel so the game loop never has to block on I/O.
    let (tx, rx) = mpsc::channel::<Event>();
    thread::spawn(move || loop {
        match event::read() {
            Ok(ev) => {
                if tx.send(ev).is_err() {
                    break; // receiver dropped → program exiting
                }
            }
            Err(_) => break,
        }
    });

    let result = run(&mut out, &rx, &launch);

    // Always restore the terminal
    if keyboard_enhanced {
        let _ = out.execute(PopKeyboardEnhancementFlags);
    }
    let _ = out.execute(cursor::Show);
    let _ = out.execute(terminal::LeaveAlternateScreen);
    let _ = terminal::disable_raw_mode();

    if let Err(err) = &result {
        error!(%err, "exiting with error");
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_parses_replay_subcommand() {
        let cli = Cli::try_parse_from(["keyblaster", "replay", "--latest"]).unwrap();
        assert!(matches!(
            cli.command,
            Some(Command::Replay { latest: true, list: false, file: None })
        ));
    }

    #[test]
    fn cli_parses_game_flags() {
        let cli = Cli::try_parse_from(["keyblaster", "--seed", "42", "--mute", "--start-level", "3"])
            .unwrap();
        assert_eq!(cli.seed, Some(42));
        assert!(cli.mute);
        assert_eq!(cli.start_level, Some(3));
        assert!(cli.command.is_none());
    }

    #[test]
    fn cli_rejects_out_of_range_start_level() {
        assert!(Cli::try_parse_from(["keyblaster", "--start-level", "0"]).is_err());
        assert!(Cli::try_parse_from(["keyblaster", "--start-level", "5000"]).is_err());
        assert!(Cli::try_parse_from(["keyblaster", "--start-level", "99"]).is_ok());
    }

    #[test]
    fn held_key_expires_after_window() {
        let now = Instant::now();
        let mut seen = HashMap::new();
        seen.insert(KeyCode::Char(' '), now);
        assert!(is_held(&seen, &KeyCode::Char(' '), now));
        assert!(!is_held(&seen, &KeyCode::Char(' '), now + HOLD_WINDOW * 2));
        assert!(!is_held(&seen, &KeyCode::Char('a'), now));
    }
}
