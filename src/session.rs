/// One game from first missile to last city.
///
/// `GameSession` owns every piece of mutable game state (entities, typed
/// buffer, prefix claims, destruction queue, turret and timers) and is driven
/// by the frame loop through two calls:
///
///   * `handle_char` for each typed character, drained at the start of the
///     frame in arrival order;
///   * `tick` once per frame afterwards.
///
/// A keystroke only schedules a destruction.  The target keeps moving until
/// the turret is on it and the scheduler finalises it in a later `tick`.
/// All randomness comes from the session's single seeded generator.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info};

use crate::audio::{Audio, Effect, Silent};
use crate::compute::{
    advance_explosion, advance_missile, advance_powerup, check_collisions, future_position,
    layout_cities, new_explosion, new_missile, new_powerup, LEAD_DISTANCE,
};
use crate::config::Config;
use crate::entities::{
    City, Explosion, ExplosionKind, GameStatus, Missile, Point, Powerup, RoundSignal, Side,
    TargetId, TargetKind,
};
use crate::labels::{LabelAllocator, POWERUP_WORDS};
use crate::level::LevelController;
use crate::matcher::{highlight_len, Candidate, KeyOutcome, TypingMatcher};
use crate::replay::{LabelAt, Observer, Snapshot};
use crate::scheduler::{DestructionRecord, DestructionScheduler};
use crate::target::{find_target, typeable, Target};
use crate::turret::Turret;

/// Power-ups stay this far above the ground.
const POWERUP_GROUND_CLEARANCE: f32 = 100.0;

pub struct GameSession {
    pub missiles: Vec<Missile>,
    pub powerups: Vec<Powerup>,
    pub cities: Vec<City>,
    pub explosions: Vec<Explosion>,
    pub turret: Turret,

    config: Config,
    seed: u64,
    rng: StdRng,
    matcher: TypingMatcher,
    labels: LabelAllocator,
    scheduler: DestructionScheduler,
    level: LevelController,

    score: u32,
    status: GameStatus,
    frame: u64,
    next_id: u64,

    audio: Box<dyn Audio>,
    observer: Option<Box<dyn Observer>>,
}

impl GameSession {
    pub fn new(config: Config, seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let world = &config.world;
        let ground_y = world.ground_y();
        let turret = Turret::new(
            Point::new(world.width / 2.0, ground_y),
            world.sky_level,
            config.timing.aim_frames,
            config.timing.laser_frames,
        );
        let cities = layout_cities(world.cities, world.width, ground_y);
        let level = LevelController::new(&config, &mut rng);
        let labels = LabelAllocator::new(config.spawning.label_attempts);

        Self {
            missiles: Vec::new(),
            powerups: Vec::new(),
            cities,
            explosions: Vec::new(),
            turret,
            config,
            seed,
            rng,
            matcher: TypingMatcher::new(),
            labels,
            scheduler: DestructionScheduler::new(),
            level,
            score: 0,
            status: GameStatus::Playing,
            frame: 0,
            next_id: 1,
            audio: Box::new(Silent),
            observer: None,
        }
    }

    pub fn with_audio(mut self, audio: Box<dyn Audio>) -> Self {
        self.audio = audio;
        self
    }

    pub fn with_observer(mut self, mut observer: Box<dyn Observer>) -> Self {
        observer.session_started(self.seed);
        self.observer = Some(observer);
        self
    }

    // ── Accessors ────────────────────────────────────────────────────────────

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn status(&self) -> GameStatus {
        self.status
    }

    pub fn frame(&self) -> u64 {
        self.frame
    }

    pub fn buffer(&self) -> &str {
        self.matcher.buffer()
    }

    pub fn level(&self) -> &LevelController {
        &self.level
    }

    pub fn labels(&self) -> &LabelAllocator {
        &self.labels
    }

    pub fn scheduler(&self) -> &DestructionScheduler {
        &self.scheduler
    }

    /// Frame-clock multiplier for the coming frame.
    pub fn tick_multiplier(&self, fast_forward: bool) -> u32 {
        self.level.tick_multiplier(fast_forward)
    }

    // ── Spawning ─────────────────────────────────────────────────────────────

    fn next_target_id(&mut self) -> TargetId {
        let id = TargetId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Place a missile with a given label; the label's prefix is claimed.
    pub fn insert_missile(&mut self, origin: Point, impact: Point, label: &str) -> TargetId {
        self.labels.claim(label);
        let id = self.next_target_id();
        let speed = self.level.missile_speed();
        let points = self.config.scoring.missile_points;
        self.missiles
            .push(new_missile(id, origin, impact, speed, points, Some(label.to_string())));
        id
    }

    /// Place a power-up with a given label entering from `side`.
    pub fn insert_powerup(&mut self, side: Side, label: &str) -> TargetId {
        self.labels.claim(label);
        let id = self.next_target_id();
        let world = &self.config.world;
        let powerup = new_powerup(
            id,
            side,
            world.width,
            world.height,
            world.ground_y() - POWERUP_GROUND_CLEARANCE,
            self.config.scoring.powerup_points,
            label.to_string(),
            &mut self.rng,
        );
        self.powerups.push(powerup);
        id
    }

    fn spawn_missile(&mut self) -> TargetId {
        let world = &self.config.world;
        let origin = Point::new(self.rng.gen_range(0.0..=world.width), world.sky_level);
        let impact = Point::new(self.rng.gen_range(0.0..=world.width), world.ground_y());
        let label = self.labels.allocate(self.level.difficulty(), &mut self.rng);
        let id = self.next_target_id();
        let speed = self.level.missile_speed();
        let points = self.config.scoring.missile_points;
        self.missiles
            .push(new_missile(id, origin, impact, speed, points, Some(label)));
        id
    }

    fn spawn_powerup(&mut self) -> Option<TargetId> {
        let live = self.powerups.iter().filter(|p| !p.destroyed).count();
        if live >= self.config.spawning.max_powerups {
            return None;
        }
        let side = if self.rng.gen_bool(0.5) { Side::Left } else { Side::Right };
        let label = self.labels.allocate_from(POWERUP_WORDS, &mut self.rng);
        let id = self.next_target_id();
        let world = &self.config.world;
        let powerup = new_powerup(
            id,
            side,
            world.width,
            world.height,
            world.ground_y() - POWERUP_GROUND_CLEARANCE,
            self.config.scoring.powerup_points,
            label,
            &mut self.rng,
        );
        debug!(id = id.0, "power-up launched");
        self.powerups.push(powerup);
        Some(id)
    }

    // ── Input ────────────────────────────────────────────────────────────────

    /// Every live label on screen; targets already waiting for the turret
    /// are held so they can not be matched twice.
    fn candidates(&self) -> Vec<Candidate> {
        typeable(&self.missiles, &self.powerups)
            .filter_map(|t| {
                let candidate = Candidate::from_target(t)?;
                Some(if self.scheduler.contains(t.id()) {
                    candidate.held()
                } else {
                    candidate
                })
            })
            .collect()
    }

    /// Feed one typed character.  Non-typing keys are ignored untouched.
    pub fn handle_char(&mut self, c: char) -> KeyOutcome {
        if self.status != GameStatus::Playing {
            return KeyOutcome::Ignored;
        }
        let candidates = self.candidates();
        let outcome = self.matcher.on_char(c, &candidates);
        if outcome == KeyOutcome::Ignored {
            return outcome;
        }
        if let Some(obs) = self.observer.as_mut() {
            obs.keystroke(self.frame, c);
        }

        match &outcome {
            KeyOutcome::Matched(matches) => {
                for matched in matches {
                    self.on_match(matched);
                }
            }
            KeyOutcome::Miss { typed, dead_key } => {
                if *dead_key {
                    debug!(key = %c, "dead key, turbo");
                    self.level.trigger_turbo();
                }
                if let Some(obs) = self.observer.as_mut() {
                    obs.word_match(self.frame, typed, None, false);
                }
                self.audio.play(Effect::Miss);
            }
            KeyOutcome::Pending | KeyOutcome::Ignored => {}
        }

        self.refresh_highlights();
        outcome
    }

    fn on_match(&mut self, matched: &Candidate) {
        if let Some(obs) = self.observer.as_mut() {
            obs.word_match(self.frame, &matched.label, Some(matched.kind), true);
        }
        if matched.kind == TargetKind::Missile {
            if let Some(m) = self.missiles.iter().find(|m| m.id == matched.id) {
                self.score += self.level.scaled(m.points);
            }
        }
        let record = DestructionRecord {
            id: matched.id,
            kind: matched.kind,
        };
        let (missiles, powerups) = (&self.missiles, &self.powerups);
        self.scheduler.submit(record, &mut self.turret, |id| {
            find_target(missiles, powerups, id).map(|t| t.position())
        });
    }

    fn refresh_highlights(&mut self) {
        let buffer = self.matcher.buffer().to_string();
        let targets = self
            .missiles
            .iter_mut()
            .map(|m| m as &mut dyn Target)
            .chain(self.powerups.iter_mut().map(|p| p as &mut dyn Target));
        for target in targets {
            let typed = target
                .label()
                .map(|label| {
                    let n = highlight_len(label, &buffer);
                    label.chars().take(n).collect::<String>()
                })
                .unwrap_or_default();
            target.set_typed_chars(&typed);
        }
    }

    // ── Frame update ─────────────────────────────────────────────────────────

    /// Advance one frame and report the round state.
    pub fn tick(&mut self) -> RoundSignal {
        if self.status == GameStatus::GameOver {
            return RoundSignal::GameOver;
        }
        self.frame += 1;

        // 1. timers and spawns
        let timers = self.level.tick_timers(&mut self.rng);
        if timers.multiplier_expired {
            self.turret.set_powered(false);
        }
        if timers.powerup_due {
            self.spawn_powerup();
        }
        if self.level.should_spawn_missile() {
            self.spawn_missile();
        }

        // 2. motion
        for missile in &mut self.missiles {
            if let Some(blast) = advance_missile(missile) {
                self.explosions.push(blast);
            }
        }
        let width = self.config.world.width;
        for powerup in &mut self.powerups {
            if !advance_powerup(powerup, width) {
                powerup.destroyed = true;
            }
        }

        // 3. turret and the destruction queue
        self.run_scheduler();

        // 4. blasts
        for explosion in &mut self.explosions {
            advance_explosion(explosion);
        }
        let report = check_collisions(&mut self.missiles, &self.explosions, &mut self.cities);
        self.score += report.score;
        for _ in 0..report.cities_lost {
            self.audio.play(Effect::CityLost);
        }

        // 5. end-of-frame removal
        self.sweep();

        let interval = self.config.timing.snapshot_interval;
        if interval > 0 && self.frame % interval == 0 {
            self.emit_snapshot();
        }

        let signal = self
            .level
            .update(&self.missiles, &self.explosions, &self.cities);
        if signal == RoundSignal::GameOver {
            info!(score = self.score, level = self.level.difficulty(), "game over");
            self.status = GameStatus::GameOver;
            self.scheduler.clear(&mut self.turret);
            self.emit_snapshot();
        }
        signal
    }

    fn run_scheduler(&mut self) {
        {
            let (missiles, powerups) = (&self.missiles, &self.powerups);
            let locate = |id| find_target(missiles, powerups, id).map(|t| t.position());
            self.scheduler.track(&mut self.turret, locate);
        }
        self.turret.update();

        if let Some(record) = self.scheduler.ready(&self.turret) {
            self.finalize(record);
            let (missiles, powerups) = (&self.missiles, &self.powerups);
            let locate = |id| find_target(missiles, powerups, id).map(|t| t.position());
            self.scheduler.finish(&mut self.turret, locate);
        }
    }

    fn finalize(&mut self, record: DestructionRecord) {
        match record.kind {
            TargetKind::Missile => {
                let Some(missile) = self.missiles.iter_mut().find(|m| m.id == record.id) else {
                    return;
                };
                let lead = future_position(missile, LEAD_DISTANCE);
                if let Some(label) = missile.take_label() {
                    self.labels.release(&label);
                }
                self.turret.fire_laser(lead);
                self.explosions.push(new_explosion(lead, ExplosionKind::Intercept));
                self.audio.play(Effect::Shoot);
                self.audio.play(Effect::Intercept);
            }
            TargetKind::Powerup => {
                let Some(powerup) = self.powerups.iter_mut().find(|p| p.id == record.id) else {
                    return;
                };
                let pos = powerup.pos;
                let points = powerup.points;
                powerup.destroy();
                if let Some(label) = powerup.take_label() {
                    self.labels.release(&label);
                }
                self.turret.fire_laser(pos);
                self.explosions.push(new_explosion(pos, ExplosionKind::Flash));
                self.level.activate_multiplier();
                self.turret.set_powered(true);
                self.score += self.level.scaled(points);
                self.audio.play(Effect::Shoot);
                self.audio.play(Effect::Powerup);
            }
        }
    }

    /// Drop destroyed targets and finished blasts, releasing label claims.
    fn sweep(&mut self) {
        let labels = &mut self.labels;
        self.missiles.retain_mut(|m| {
            if m.destroyed {
                if let Some(label) = m.take_label() {
                    labels.release(&label);
                }
            }
            !m.destroyed
        });
        self.powerups.retain_mut(|p| {
            if p.destroyed {
                if let Some(label) = p.take_label() {
                    labels.release(&label);
                }
            }
            !p.destroyed
        });
        self.explosions.retain(|e| !e.complete);
    }

    fn emit_snapshot(&mut self) {
        let Some(obs) = self.observer.as_mut() else {
            return;
        };
        let labelled = |t: &dyn Target| {
            t.label().map(|label| LabelAt {
                label: label.to_string(),
                pos: t.position(),
            })
        };
        let snapshot = Snapshot {
            missiles: self.missiles.iter().filter_map(|m| labelled(m)).collect(),
            powerups: self.powerups.iter().filter_map(|p| labelled(p)).collect(),
            typed_sequence: self.matcher.buffer().to_string(),
            level: self.level.difficulty(),
            score: self.score,
        };
        obs.snapshot(self.frame, &snapshot);
    }

    // ── Round transitions ────────────────────────────────────────────────────

    /// Move to the next level after a `NewLevel` signal.
    pub fn start_next_level(&mut self) {
        self.level.advance();
        self.matcher.clear();
        self.scheduler.clear(&mut self.turret);
        for powerup in &mut self.powerups {
            powerup.destroyed = true;
        }
        self.sweep();
        if let Some(obs) = self.observer.as_mut() {
            obs.level_changed(self.frame, self.level.difficulty());
        }
    }

    /// Close the session: observers flush whatever they recorded.
    pub fn finish(&mut self) {
        if let Some(obs) = self.observer.as_mut() {
            obs.finish();
        }
    }
}
