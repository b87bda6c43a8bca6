/// Difficulty progression and the three game timers.
///
/// The controller owns the level counter and everything derived from it
/// (wave size, spawn cadence, missile speed), the power-up score multiplier,
/// the turbo timer that follows a dead keystroke, and the random power-up
/// spawn timer.  It never touches entities; the session asks it questions.

use rand::Rng;
use tracing::info;

use crate::config::Config;
use crate::entities::{City, Explosion, Missile, RoundSignal};

// ── Difficulty tables ────────────────────────────────────────────────────────

const FIRST_WAVE: u32 = 8;
const FIRST_INCREMENT: u32 = 3;

/// Frames between missile launches on level 1, shrinking per level.
const SPAWN_BASE: u32 = 45;
const SPAWN_STEP: u32 = 3;
const SPAWN_FLOOR: u32 = 10;

/// World units per frame for a missile launched at `level`.
pub fn missile_speed(level: u32) -> f32 {
    match level {
        0 | 1 => 0.5,
        2..=3 => 0.7,
        4..=6 => 1.0,
        7..=10 => 1.3,
        11..=15 => 1.7,
        16..=20 => 2.2,
        _ => 2.5 + (level - 20) as f32 * 0.2,
    }
}

pub fn spawn_interval(level: u32) -> u32 {
    SPAWN_BASE
        .saturating_sub(SPAWN_STEP * level.saturating_sub(1))
        .max(SPAWN_FLOOR)
}

// ── Controller ───────────────────────────────────────────────────────────────

/// What expired or fell due during one timer tick.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TimerEvents {
    pub multiplier_expired: bool,
    pub powerup_due: bool,
}

#[derive(Debug, Clone)]
pub struct LevelController {
    difficulty: u32,
    wave_size: u32,
    spawned: u32,
    increment: u32,
    spawn_cooldown: u32,

    multiplier: f32,
    multiplier_timer: u32,
    powerup_multiplier: f32,
    multiplier_frames: u32,

    turbo_timer: u32,
    turbo_frames: u32,
    turbo_multiplier: u32,

    powerup_timer: u32,
    powerup_interval: (u32, u32),
}

impl LevelController {
    pub fn new(config: &Config, rng: &mut impl Rng) -> Self {
        let spawning = &config.spawning;
        let lo = spawning.powerup_interval_min.max(1);
        let hi = spawning.powerup_interval_max.max(lo);
        let mut level = Self {
            difficulty: 1,
            wave_size: FIRST_WAVE,
            spawned: 0,
            increment: FIRST_INCREMENT,
            spawn_cooldown: 0,
            multiplier: 1.0,
            multiplier_timer: 0,
            powerup_multiplier: config.scoring.powerup_multiplier,
            multiplier_frames: config.scoring.multiplier_frames,
            turbo_timer: 0,
            turbo_frames: config.timing.turbo_frames,
            turbo_multiplier: config.timing.turbo_multiplier.max(1),
            powerup_timer: 0,
            powerup_interval: (lo, hi),
        };
        level.reset_powerup_timer(rng);
        while level.difficulty < spawning.first_level() {
            level.step();
        }
        level
    }

    pub fn difficulty(&self) -> u32 {
        self.difficulty
    }

    pub fn wave_size(&self) -> u32 {
        self.wave_size
    }

    pub fn spawned(&self) -> u32 {
        self.spawned
    }

    pub fn wave_complete(&self) -> bool {
        self.spawned >= self.wave_size
    }

    pub fn missile_speed(&self) -> f32 {
        missile_speed(self.difficulty)
    }

    /// Called once per frame; `true` when a missile should launch now.
    pub fn should_spawn_missile(&mut self) -> bool {
        if self.wave_complete() {
            return false;
        }
        if self.spawn_cooldown > 0 {
            self.spawn_cooldown -= 1;
            return false;
        }
        self.spawn_cooldown = spawn_interval(self.difficulty);
        self.spawned += 1;
        true
    }

    /// Start the next level: bigger wave, faster cadence, timers kept.
    pub fn advance(&mut self) {
        self.step();
        info!(level = self.difficulty, wave = self.wave_size, "level up");
    }

    fn step(&mut self) {
        self.wave_size = self.wave_size.saturating_add(self.increment);
        self.difficulty = self.difficulty.saturating_add(1);
        self.increment = self.increment.saturating_add(self.difficulty);
        self.spawned = 0;
        self.spawn_cooldown = 0;
    }

    // ── Score multiplier ─────────────────────────────────────────────────────

    pub fn score_multiplier(&self) -> f32 {
        self.multiplier
    }

    pub fn multiplier_frames_left(&self) -> u32 {
        self.multiplier_timer
    }

    pub fn activate_multiplier(&mut self) {
        self.multiplier = self.powerup_multiplier;
        self.multiplier_timer = self.multiplier_frames;
    }

    /// `points` under the current multiplier.
    pub fn scaled(&self, points: u32) -> u32 {
        (points as f32 * self.multiplier).round() as u32
    }

    // ── Turbo ────────────────────────────────────────────────────────────────

    pub fn trigger_turbo(&mut self) {
        self.turbo_timer = self.turbo_frames;
    }

    pub fn turbo_active(&self) -> bool {
        self.turbo_timer > 0
    }

    pub fn turbo_frames_left(&self) -> u32 {
        self.turbo_timer
    }

    /// How many times faster than normal the next frame should tick.
    pub fn tick_multiplier(&self, fast_forward: bool) -> u32 {
        if self.turbo_active() || fast_forward {
            self.turbo_multiplier
        } else {
            1
        }
    }

    // ── Power-up spawning ────────────────────────────────────────────────────

    pub fn powerup_frames_left(&self) -> u32 {
        self.powerup_timer
    }

    fn reset_powerup_timer(&mut self, rng: &mut impl Rng) {
        let (lo, hi) = self.powerup_interval;
        self.powerup_timer = rng.gen_range(lo..=hi);
    }

    /// Advance every timer by one frame.
    pub fn tick_timers(&mut self, rng: &mut impl Rng) -> TimerEvents {
        let mut events = TimerEvents::default();

        if self.multiplier_timer > 0 {
            self.multiplier_timer -= 1;
            if self.multiplier_timer == 0 {
                self.multiplier = 1.0;
                events.multiplier_expired = true;
            }
        }

        self.turbo_timer = self.turbo_timer.saturating_sub(1);

        self.powerup_timer = self.powerup_timer.saturating_sub(1);
        if self.powerup_timer == 0 {
            events.powerup_due = true;
            self.reset_powerup_timer(rng);
        }

        events
    }

    // ── Round transitions ────────────────────────────────────────────────────

    /// Game over as soon as the last city falls; a new level once the whole
    /// wave has launched and every missile and explosion has cleared.
    pub fn update(
        &self,
        missiles: &[Missile],
        explosions: &[Explosion],
        cities: &[City],
    ) -> RoundSignal {
        if cities.is_empty() {
            return RoundSignal::GameOver;
        }
        if self.wave_complete() && missiles.is_empty() && explosions.is_empty() {
            return RoundSignal::NewLevel;
        }
        RoundSignal::Running
    }
}
