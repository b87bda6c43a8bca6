use std::fs;

use keyblaster::entities::{Point, TargetKind};
use keyblaster::error::ReplayError;
use keyblaster::replay::*;

fn snapshot(missiles: &[&str], typed: &str, level: u32, score: u32) -> Snapshot {
    Snapshot {
        missiles: missiles
            .iter()
            .map(|label| LabelAt {
                label: label.to_string(),
                pos: Point::new(100.0, 200.0),
            })
            .collect(),
        powerups: Vec::new(),
        typed_sequence: typed.to_string(),
        level,
        score,
    }
}

fn event(frame: u64, event: ReplayEventKind) -> ReplayEvent {
    ReplayEvent { frame, event }
}

fn keys(start: u64, typed: &str) -> Vec<ReplayEvent> {
    typed
        .chars()
        .enumerate()
        .map(|(i, c)| event(start + i as u64, ReplayEventKind::Keypress { char: c }))
        .collect()
}

// ── Recorder ──────────────────────────────────────────────────────────────────

#[test]
fn recorder_saves_what_it_heard() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("replays").join("replay_test.json");
    let mut rec = ReplayRecorder::new(&path, 30);

    rec.session_started(99);
    rec.keystroke(3, 'g');
    rec.keystroke(4, 'o');
    rec.word_match(4, "go", Some(TargetKind::Missile), true);
    rec.level_changed(90, 2);
    rec.snapshot(120, &snapshot(&["cat"], "", 2, 10));
    rec.finish();

    let replay = load_replay(&path).unwrap();
    assert_eq!(replay.seed, 99);
    assert_eq!(replay.fps, 30);
    assert_eq!(replay.version, REPLAY_VERSION);
    assert_eq!(replay.events.len(), 6);
    assert_eq!(replay.events[0], event(0, ReplayEventKind::Seed { value: 99 }));
    assert_eq!(replay.summary.keystroke_sequence, "go");
    assert_eq!(replay.summary.successful_matches, vec!["go"]);
    assert_eq!(replay.summary.levels_reached, vec![2]);
    assert_eq!(replay.summary.duration_frames, 120);
    assert_eq!(replay.summary.final_state.as_ref().map(|s| s.score), Some(10));
}

#[test]
fn recorder_stops_after_finish() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("replay_once.json");
    let mut rec = ReplayRecorder::new(&path, 30);
    rec.session_started(1);
    rec.finish();
    rec.keystroke(5, 'a');
    rec.finish();

    assert_eq!(rec.events().len(), 1);
    assert_eq!(load_replay(&path).unwrap().events.len(), 1);
}

#[test]
fn events_use_tagged_json() {
    let json = serde_json::to_value(event(7, ReplayEventKind::Keypress { char: 'k' })).unwrap();
    assert_eq!(json["frame"], 7);
    assert_eq!(json["event"]["type"], "keypress");
    assert_eq!(json["event"]["data"]["char"], "k");

    let json = serde_json::to_value(event(
        8,
        ReplayEventKind::WordMatch {
            word: "x".into(),
            kind: None,
            success: false,
        },
    ))
    .unwrap();
    assert_eq!(json["event"]["type"], "word_match");
    assert!(json["event"]["data"]["kind"].is_null());
}

#[test]
fn in_dir_uses_a_timestamped_name() {
    let dir = tempfile::tempdir().unwrap();
    let rec = ReplayRecorder::in_dir(dir.path(), 30);
    let name = rec.path().file_name().and_then(|n| n.to_str()).unwrap();
    assert!(name.starts_with("replay_"));
    assert!(name.ends_with(".json"));
    assert_eq!(name.len(), "replay_2026-01-01_00-00-00.json".len());
}

// ── Summary ───────────────────────────────────────────────────────────────────

#[test]
fn summary_splits_matches() {
    let mut events = keys(1, "gox");
    events.push(event(2, ReplayEventKind::WordMatch {
        word: "go".into(),
        kind: Some(TargetKind::Missile),
        success: true,
    }));
    events.push(event(3, ReplayEventKind::WordMatch {
        word: "x".into(),
        kind: None,
        success: false,
    }));

    let summary = summarize(&events);
    assert_eq!(summary.total_keystrokes, 3);
    assert_eq!(summary.successful_matches, vec!["go"]);
    assert_eq!(summary.failed_matches, vec!["x"]);
    assert!(summary.potential_issues.is_empty());
}

#[test]
fn summary_flags_repeated_patterns() {
    let summary = summarize(&keys(1, "abcabcabcab"));
    assert!(summary
        .potential_issues
        .iter()
        .any(|issue| issue.contains("'abc'")));
}

#[test]
fn short_sequences_are_not_flagged() {
    let summary = summarize(&keys(1, "abcabcabc"));
    assert!(summary.potential_issues.is_empty());
}

#[test]
fn summary_flags_words_typed_but_not_matched() {
    let mut events = keys(1, "tac");
    events.push(event(4, ReplayEventKind::GameState(snapshot(&["cat", "dog"], "tac", 1, 0))));

    let summary = summarize(&events);
    assert_eq!(summary.potential_issues.len(), 1);
    assert!(summary.potential_issues[0].contains("'cat'"));
}

// ── Viewer ────────────────────────────────────────────────────────────────────

#[test]
fn replays_listed_newest_first() {
    let dir = tempfile::tempdir().unwrap();
    for name in ["replay_2026-01-01_10-00-00.json", "replay_2026-01-02_10-00-00.json"] {
        fs::write(dir.path().join(name), "{}").unwrap();
        std::thread::sleep(std::time::Duration::from_millis(20));
    }
    fs::write(dir.path().join("scores.json"), "[]").unwrap();

    let listed = list_replays(dir.path()).unwrap();
    let names: Vec<_> = listed
        .iter()
        .filter_map(|p| p.file_name().and_then(|n| n.to_str()))
        .collect();
    assert_eq!(
        names,
        vec!["replay_2026-01-02_10-00-00.json", "replay_2026-01-01_10-00-00.json"]
    );
    assert_eq!(latest_replay(dir.path()).unwrap(), listed[0]);
}

#[test]
fn no_replays_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    assert!(matches!(
        latest_replay(dir.path()),
        Err(ReplayError::NoReplays(_))
    ));
}

#[test]
fn garbage_replay_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("replay_bad.json");
    fs::write(&path, "{ nope").unwrap();
    assert!(matches!(load_replay(&path), Err(ReplayError::Json(_))));
}

#[test]
fn report_shows_events_and_issues() {
    let mut events = vec![event(0, ReplayEventKind::Seed { value: 5 })];
    events.extend(keys(30, "abcabcabcab"));
    events.push(event(60, ReplayEventKind::WordMatch {
        word: "go".into(),
        kind: Some(TargetKind::Powerup),
        success: true,
    }));
    let replay = ReplayFile {
        version: REPLAY_VERSION.to_string(),
        seed: 5,
        fps: 30,
        summary: summarize(&events),
        events,
    };

    let report = render_report(std::path::Path::new("replay_x.json"), &replay);
    assert!(report.contains("seed 5"));
    assert!(report.contains("POTENTIAL ISSUES"));
    assert!(report.contains("'go' (powerup)"));
    assert!(report.contains("[   1.000s] keypress     'a'"));
}
