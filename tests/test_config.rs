use std::fs;
use std::path::{Path, PathBuf};

use keyblaster::config::*;
use keyblaster::error::ConfigError;

#[test]
fn defaults_match_the_arcade_tuning() {
    let config = Config::default();
    assert_eq!(config.timing.fps, 30);
    assert_eq!(config.timing.turbo_multiplier, 10);
    assert_eq!(config.timing.turbo_frames, 150);
    assert_eq!(config.scoring.multiplier_frames, 300);
    assert_eq!(config.scoring.powerup_multiplier, 2.0);
    assert_eq!(config.spawning.powerup_interval_min, 450);
    assert_eq!(config.spawning.powerup_interval_max, 900);
    assert_eq!(config.spawning.start_level, 1);
    assert_eq!(config.world.ground_y(), 540.0);
    assert!(config.storage.record_replays);
}

#[test]
fn partial_file_keeps_other_defaults() {
    let text = r#"
        [timing]
        fps = 60

        [spawning]
        start_level = 4
    "#;
    let config = Config::from_toml_str(text, Path::new("inline.toml")).unwrap();
    assert_eq!(config.timing.fps, 60);
    assert_eq!(config.timing.turbo_multiplier, 10);
    assert_eq!(config.spawning.start_level, 4);
    assert_eq!(config.world, WorldConfig::default());
}

#[test]
fn empty_file_is_all_defaults() {
    let config = Config::from_toml_str("", Path::new("empty.toml")).unwrap();
    assert_eq!(config, Config::default());
}

#[test]
fn bad_toml_names_the_file() {
    let err = Config::from_toml_str("[timing\nfps = ", Path::new("broken.toml")).unwrap_err();
    assert!(matches!(err, ConfigError::Parse { .. }));
    assert!(err.to_string().contains("broken.toml"));

    let err = Config::from_toml_str("[timing]\nfps = \"fast\"", Path::new("typed.toml")).unwrap_err();
    assert!(matches!(err, ConfigError::Parse { .. }));
}

#[test]
fn explicit_file_is_loaded() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(&path, "[world]\ncities = 4\n\n[storage]\nsound = false\n").unwrap();

    let config = Config::load(Some(&path)).unwrap();
    assert_eq!(config.world.cities, 4);
    assert!(!config.storage.sound);
}

#[test]
fn missing_explicit_file_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = Config::load(Some(&dir.path().join("nope.toml"))).unwrap_err();
    assert!(matches!(err, ConfigError::Read { .. }));
}

#[test]
fn first_level_is_clamped() {
    let mut spawning = SpawningConfig::default();
    assert_eq!(spawning.first_level(), 1);
    spawning.start_level = 0;
    assert_eq!(spawning.first_level(), 1);
    spawning.start_level = u32::MAX;
    assert_eq!(spawning.first_level(), MAX_START_LEVEL);
}

#[test]
fn storage_paths_can_be_overridden() {
    let storage = StorageConfig {
        scores_path: Some(PathBuf::from("/tmp/kb/scores.json")),
        replay_dir: Some(PathBuf::from("/tmp/kb/replays")),
        ..StorageConfig::default()
    };
    assert_eq!(storage.scores_path(), PathBuf::from("/tmp/kb/scores.json"));
    assert_eq!(storage.replay_dir(), PathBuf::from("/tmp/kb/replays"));
    assert!(storage.log_path().ends_with("keyblaster.log"));
}

#[test]
fn default_storage_lives_in_the_data_dir() {
    let storage = StorageConfig::default();
    assert!(storage.scores_path().starts_with(data_dir()));
    assert!(storage.replay_dir().ends_with("replays"));
}
