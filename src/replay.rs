/// Session observers and the JSON replay recorder.
///
/// The session reports keystrokes, match attempts, level changes and periodic
/// snapshots to an optional [`Observer`].  Observers only listen; with or
/// without one the game plays identically.  [`ReplayRecorder`] writes what it
/// hears to a JSON file together with the session seed and a debug summary,
/// and the helpers at the bottom read those files back for the `replay`
/// subcommand.

use std::collections::HashSet;
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use chrono::Local;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::entities::{Point, TargetKind};
use crate::error::ReplayError;

pub const REPLAY_VERSION: &str = "1.0";

// ── Observer ─────────────────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LabelAt {
    pub label: String,
    pub pos: Point,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub missiles: Vec<LabelAt>,
    pub powerups: Vec<LabelAt>,
    pub typed_sequence: String,
    pub level: u32,
    pub score: u32,
}

pub trait Observer {
    fn session_started(&mut self, _seed: u64) {}
    fn keystroke(&mut self, _frame: u64, _ch: char) {}
    fn word_match(&mut self, _frame: u64, _word: &str, _kind: Option<TargetKind>, _success: bool) {}
    fn level_changed(&mut self, _frame: u64, _level: u32) {}
    fn snapshot(&mut self, _frame: u64, _snapshot: &Snapshot) {}
    /// The session is over (game over or quit).
    fn finish(&mut self) {}
}

// ── Replay file format ───────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum ReplayEventKind {
    Seed { value: u64 },
    Keypress { char: char },
    WordMatch { word: String, kind: Option<TargetKind>, success: bool },
    LevelChange { level: u32 },
    GameState(Snapshot),
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ReplayEvent {
    pub frame: u64,
    pub event: ReplayEventKind,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ReplaySummary {
    pub duration_frames: u64,
    pub total_keystrokes: usize,
    pub keystroke_sequence: String,
    pub successful_matches: Vec<String>,
    pub failed_matches: Vec<String>,
    pub levels_reached: Vec<u32>,
    pub final_state: Option<Snapshot>,
    pub potential_issues: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ReplayFile {
    pub version: String,
    pub seed: u64,
    pub fps: u32,
    pub events: Vec<ReplayEvent>,
    pub summary: ReplaySummary,
}

/// Condense an event log into the debug summary stored alongside it.
pub fn summarize(events: &[ReplayEvent]) -> ReplaySummary {
    let mut summary = ReplaySummary {
        duration_frames: events.last().map_or(0, |e| e.frame),
        ..ReplaySummary::default()
    };

    for event in events {
        match &event.event {
            ReplayEventKind::Keypress { char } => summary.keystroke_sequence.push(*char),
            ReplayEventKind::WordMatch { word, success: true, .. } => {
                summary.successful_matches.push(word.clone())
            }
            ReplayEventKind::WordMatch { word, success: false, .. } => {
                summary.failed_matches.push(word.clone())
            }
            ReplayEventKind::LevelChange { level } => summary.levels_reached.push(*level),
            ReplayEventKind::GameState(snapshot) => summary.final_state = Some(snapshot.clone()),
            ReplayEventKind::Seed { .. } => {}
        }
    }
    summary.total_keystrokes = summary.keystroke_sequence.chars().count();
    summary.potential_issues = find_issues(&summary);
    summary
}

fn find_issues(summary: &ReplaySummary) -> Vec<String> {
    let mut issues = Vec::new();

    let keys: Vec<char> = summary.keystroke_sequence.chars().collect();
    if keys.len() > 10 {
        let mut reported = HashSet::new();
        for window in keys.windows(3) {
            let pattern: String = window.iter().collect();
            if reported.contains(&pattern) {
                continue;
            }
            if summary.keystroke_sequence.matches(pattern.as_str()).count() > 2 {
                issues.push(format!("repeated keystroke pattern: '{pattern}'"));
                reported.insert(pattern);
            }
        }
    }

    if let Some(state) = &summary.final_state {
        let typed = state.typed_sequence.to_lowercase();
        let matched: HashSet<String> =
            summary.successful_matches.iter().map(|w| w.to_lowercase()).collect();
        let available = state.missiles.iter().chain(&state.powerups);
        for word in available.map(|l| l.label.to_lowercase()) {
            if !typed.is_empty() && word.chars().all(|c| typed.contains(c)) && !matched.contains(&word) {
                issues.push(format!(
                    "word '{word}' not matched although all its letters are in '{typed}'"
                ));
            }
        }
    }

    issues
}

// ── Recorder ─────────────────────────────────────────────────────────────────

/// Timestamped replay file name, e.g. `replay_2026-10-19_14-03-59.json`.
pub fn timestamp_filename() -> String {
    Local::now().format("replay_%Y-%m-%d_%H-%M-%S.json").to_string()
}

#[derive(Debug)]
pub struct ReplayRecorder {
    path: PathBuf,
    seed: u64,
    fps: u32,
    events: Vec<ReplayEvent>,
    recording: bool,
}

impl ReplayRecorder {
    pub fn new(path: impl Into<PathBuf>, fps: u32) -> Self {
        Self {
            path: path.into(),
            seed: 0,
            fps,
            events: Vec::new(),
            recording: true,
        }
    }

    /// A recorder writing a freshly named file inside `dir`.
    pub fn in_dir(dir: &Path, fps: u32) -> Self {
        Self::new(dir.join(timestamp_filename()), fps)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn events(&self) -> &[ReplayEvent] {
        &self.events
    }

    fn record(&mut self, frame: u64, event: ReplayEventKind) {
        if self.recording {
            self.events.push(ReplayEvent { frame, event });
        }
    }

    pub fn to_file(&self) -> ReplayFile {
        ReplayFile {
            version: REPLAY_VERSION.to_string(),
            seed: self.seed,
            fps: self.fps,
            events: self.events.clone(),
            summary: summarize(&self.events),
        }
    }

    pub fn save(&self) -> Result<PathBuf, ReplayError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let writer = BufWriter::new(File::create(&self.path)?);
        serde_json::to_writer_pretty(writer, &self.to_file())?;
        Ok(self.path.clone())
    }
}

impl Observer for ReplayRecorder {
    fn session_started(&mut self, seed: u64) {
        self.seed = seed;
        self.record(0, ReplayEventKind::Seed { value: seed });
    }

    fn keystroke(&mut self, frame: u64, ch: char) {
        self.record(frame, ReplayEventKind::Keypress { char: ch });
    }

    fn word_match(&mut self, frame: u64, word: &str, kind: Option<TargetKind>, success: bool) {
        self.record(
            frame,
            ReplayEventKind::WordMatch {
                word: word.to_string(),
                kind,
                success,
            },
        );
    }

    fn level_changed(&mut self, frame: u64, level: u32) {
        self.record(frame, ReplayEventKind::LevelChange { level });
    }

    fn snapshot(&mut self, frame: u64, snapshot: &Snapshot) {
        self.record(frame, ReplayEventKind::GameState(snapshot.clone()));
    }

    fn finish(&mut self) {
        if !self.recording {
            return;
        }
        self.recording = false;
        match self.save() {
            Ok(path) => info!(path = %path.display(), "replay saved"),
            Err(err) => warn!(%err, "replay not saved"),
        }
    }
}

// ── Reading replays back ─────────────────────────────────────────────────────

pub fn load_replay(path: &Path) -> Result<ReplayFile, ReplayError> {
    let text = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&text)?)
}

/// Replay files in `dir`, newest first.
pub fn list_replays(dir: &Path) -> Result<Vec<PathBuf>, ReplayError> {
    let mut found: Vec<(std::time::SystemTime, PathBuf)> = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        let is_replay = path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.starts_with("replay_") && n.ends_with(".json"));
        if is_replay {
            let modified = fs::metadata(&path)?.modified()?;
            found.push((modified, path));
        }
    }
    found.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| b.1.cmp(&a.1)));
    Ok(found.into_iter().map(|(_, p)| p).collect())
}

pub fn latest_replay(dir: &Path) -> Result<PathBuf, ReplayError> {
    list_replays(dir)?
        .into_iter()
        .next()
        .ok_or_else(|| ReplayError::NoReplays(dir.to_path_buf()))
}

fn labels(list: &[LabelAt]) -> String {
    list.iter().map(|l| l.label.as_str()).collect::<Vec<_>>().join(", ")
}

pub fn format_event(event: &ReplayEvent, fps: u32) -> String {
    let seconds = event.frame as f64 / fps.max(1) as f64;
    let stamp = format!("[{seconds:8.3}s]");
    match &event.event {
        ReplayEventKind::Seed { value } => format!("{stamp} seed         {value}"),
        ReplayEventKind::Keypress { char } => format!("{stamp} keypress     '{char}'"),
        ReplayEventKind::WordMatch { word, kind, success } => {
            let mark = if *success { "✓" } else { "✗" };
            let kind = kind.map_or_else(|| "none".to_string(), |k| k.to_string());
            format!("{stamp} word_match   {mark} '{word}' ({kind})")
        }
        ReplayEventKind::LevelChange { level } => format!("{stamp} level_change {level}"),
        ReplayEventKind::GameState(s) => format!(
            "{stamp} game_state   level {} score {} typed '{}' missiles [{}] powerups [{}]",
            s.level,
            s.score,
            s.typed_sequence,
            labels(&s.missiles),
            labels(&s.powerups)
        ),
    }
}

/// Human-readable report for the `replay` subcommand.
pub fn render_report(path: &Path, replay: &ReplayFile) -> String {
    let s = &replay.summary;
    let mut out = String::new();
    out.push_str(&format!("REPLAY {}\n", path.display()));
    out.push_str(&format!("seed {}  version {}\n\n", replay.seed, replay.version));
    out.push_str(&format!(
        "duration    {:.1}s\n",
        s.duration_frames as f64 / replay.fps.max(1) as f64
    ));
    out.push_str(&format!("keystrokes  {}\n", s.total_keystrokes));
    out.push_str(&format!("sequence    '{}'\n", s.keystroke_sequence));
    out.push_str(&format!("matched     {:?}\n", s.successful_matches));
    out.push_str(&format!("missed      {:?}\n", s.failed_matches));
    out.push_str(&format!("levels      {:?}\n", s.levels_reached));
    if !s.potential_issues.is_empty() {
        out.push_str("\nPOTENTIAL ISSUES\n");
        for (i, issue) in s.potential_issues.iter().enumerate() {
            out.push_str(&format!("{:>3}. {issue}\n", i + 1));
        }
    }
    out.push_str("\nEVENTS\n");
    for event in &replay.events {
        out.push_str(&format_event(event, replay.fps));
        out.push('\n');
    }
    out
}
