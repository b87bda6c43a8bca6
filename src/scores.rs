/// High-score table persisted as JSON.
///
/// The table is a ranked list, best first, capped at `MAX_ENTRIES`.  Callers
/// inside the game go through `load_or_default` / `save_or_warn`, which turn
/// every failure into a log line: a broken score file never stops play.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::ScoreError;

pub const MAX_ENTRIES: usize = 10;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreEntry {
    pub name: String,
    pub score: u32,
}

pub trait ScoreStore {
    fn load(&self) -> Result<Vec<ScoreEntry>, ScoreError>;
    fn save(&self, entries: &[ScoreEntry]) -> Result<(), ScoreError>;
}

#[derive(Debug, Clone)]
pub struct JsonScoreStore {
    path: PathBuf,
}

impl JsonScoreStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ScoreStore for JsonScoreStore {
    fn load(&self) -> Result<Vec<ScoreEntry>, ScoreError> {
        let text = fs::read_to_string(&self.path)?;
        let mut entries: Vec<ScoreEntry> = serde_json::from_str(&text)?;
        entries.sort_by(|a, b| b.score.cmp(&a.score));
        entries.truncate(MAX_ENTRIES);
        Ok(entries)
    }

    fn save(&self, entries: &[ScoreEntry]) -> Result<(), ScoreError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(entries)?;
        fs::write(&self.path, json)?;
        Ok(())
    }
}

/// Load the table; any failure reads as "no scores yet".
pub fn load_or_default(store: &dyn ScoreStore) -> Vec<ScoreEntry> {
    store.load().unwrap_or_else(|err| {
        warn!(%err, "high scores unavailable");
        Vec::new()
    })
}

/// Save the table; failure only means the scores do not persist.
pub fn save_or_warn(store: &dyn ScoreStore, entries: &[ScoreEntry]) {
    if let Err(err) = store.save(entries) {
        warn!(%err, "high scores not saved");
    }
}

/// 0-based rank `score` would take, if it makes the table.
pub fn rank_for(table: &[ScoreEntry], score: u32) -> Option<usize> {
    if score == 0 {
        return None;
    }
    match table.iter().position(|e| score > e.score) {
        Some(pos) => Some(pos),
        None if table.len() < MAX_ENTRIES => Some(table.len()),
        None => None,
    }
}

/// Insert a result, keeping the table ranked and capped.  Returns the rank.
pub fn insert_score(table: &mut Vec<ScoreEntry>, name: &str, score: u32) -> Option<usize> {
    let rank = rank_for(table, score)?;
    table.insert(
        rank,
        ScoreEntry {
            name: name.to_string(),
            score,
        },
    );
    table.truncate(MAX_ENTRIES);
    Some(rank)
}

pub fn best(table: &[ScoreEntry]) -> u32 {
    table.first().map_or(0, |e| e.score)
}

/// `1234567` → `"1,234,567"`.
pub fn group_thousands(n: u32) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

/// One table row, e.g. `" 1. ACE          12,500"`.
pub fn format_row(rank: usize, entry: &ScoreEntry) -> String {
    format!(
        "{:>2}. {:<12} {:>8}",
        rank + 1,
        entry.name.trim(),
        group_thousands(entry.score)
    )
}
