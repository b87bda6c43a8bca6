use std::fs;

use keyblaster::scores::*;

fn entry(name: &str, score: u32) -> ScoreEntry {
    ScoreEntry {
        name: name.to_string(),
        score,
    }
}

fn full_table() -> Vec<ScoreEntry> {
    (1..=MAX_ENTRIES as u32).rev().map(|i| entry("AAA", i * 100)).collect()
}

// ── Persistence ───────────────────────────────────────────────────────────────

#[test]
fn scores_survive_a_save_and_load() {
    let dir = tempfile::tempdir().unwrap();
    let store = JsonScoreStore::new(dir.path().join("nested").join("scores.json"));

    let table = vec![entry("ACE", 5000), entry("BOB", 1200)];
    store.save(&table).unwrap();
    assert_eq!(store.load().unwrap(), table);
}

#[test]
fn loaded_table_is_ranked_and_capped() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("scores.json");
    let mut scrambled: Vec<ScoreEntry> = (0..15).map(|i| entry("X", i * 10)).collect();
    scrambled.reverse();
    scrambled.swap(0, 7);
    fs::write(&path, serde_json::to_string(&scrambled).unwrap()).unwrap();

    let table = JsonScoreStore::new(&path).load().unwrap();
    assert_eq!(table.len(), MAX_ENTRIES);
    assert_eq!(table[0].score, 140);
    assert!(table.windows(2).all(|w| w[0].score >= w[1].score));
}

#[test]
fn missing_file_reads_as_empty() {
    let dir = tempfile::tempdir().unwrap();
    let store = JsonScoreStore::new(dir.path().join("none.json"));
    assert!(store.load().is_err());
    assert!(load_or_default(&store).is_empty());
}

#[test]
fn corrupt_file_reads_as_empty() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("scores.json");
    fs::write(&path, "not json at all").unwrap();
    let store = JsonScoreStore::new(&path);

    assert!(matches!(store.load(), Err(keyblaster::error::ScoreError::Json(_))));
    assert!(load_or_default(&store).is_empty());
}

#[test]
fn failed_save_is_not_fatal() {
    let dir = tempfile::tempdir().unwrap();
    // A directory where the file should be
    let store = JsonScoreStore::new(dir.path());
    save_or_warn(&store, &[entry("ACE", 1)]);
    assert!(store.save(&[entry("ACE", 1)]).is_err());
}

// ── Ranking ───────────────────────────────────────────────────────────────────

#[test]
fn rank_for_finds_the_slot() {
    let table = vec![entry("A", 300), entry("B", 200), entry("C", 100)];
    assert_eq!(rank_for(&table, 400), Some(0));
    assert_eq!(rank_for(&table, 250), Some(1));
    // Ties rank below the existing entry
    assert_eq!(rank_for(&table, 200), Some(2));
    assert_eq!(rank_for(&table, 50), Some(3));
    assert_eq!(rank_for(&table, 0), None);
}

#[test]
fn full_table_rejects_low_scores() {
    let table = full_table();
    assert_eq!(rank_for(&table, 100), None);
    assert_eq!(rank_for(&table, 101), Some(9));
}

#[test]
fn insert_keeps_table_capped() {
    let mut table = full_table();
    assert_eq!(insert_score(&mut table, "NEW", 550), Some(5));
    assert_eq!(table.len(), MAX_ENTRIES);
    assert_eq!(table[5], entry("NEW", 550));
    assert_eq!(table.last().map(|e| e.score), Some(200));
    assert_eq!(best(&table), 1000);

    assert_eq!(insert_score(&mut table, "LOW", 10), None);
    assert!(table.iter().all(|e| e.name != "LOW"));
}

#[test]
fn empty_table_has_no_best() {
    assert_eq!(best(&[]), 0);
}

// ── Formatting ────────────────────────────────────────────────────────────────

#[test]
fn thousands_are_grouped() {
    assert_eq!(group_thousands(0), "0");
    assert_eq!(group_thousands(999), "999");
    assert_eq!(group_thousands(1000), "1,000");
    assert_eq!(group_thousands(1234567), "1,234,567");
}

#[test]
fn rows_are_aligned() {
    let row = format_row(0, &entry("ACE", 12500));
    assert_eq!(row, " 1. ACE            12,500");
}
