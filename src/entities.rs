/// All game entity types: pure data, no logic.
///
/// World coordinates are floating point with the origin at the top-left,
/// `y` growing downwards (the renderer scales them to terminal cells).

use std::fmt;

use serde::{Deserialize, Serialize};

// ── Geometry ──────────────────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn distance(self, other: Point) -> f32 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }

    /// Linear interpolation; `t = 0` yields `self`, `t = 1` yields `to`.
    pub fn lerp(self, to: Point, t: f32) -> Point {
        Point {
            x: self.x + (to.x - self.x) * t,
            y: self.y + (to.y - self.y) * t,
        }
    }
}

// ── Targets ───────────────────────────────────────────────────────────────────

/// Stable identity of a labelled target, unique for the whole session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TargetId(pub u64);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetKind {
    Missile,
    Powerup,
}

impl fmt::Display for TargetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Missile => write!(f, "missile"),
            Self::Powerup => write!(f, "powerup"),
        }
    }
}

/// An incoming warhead travelling in a straight line from `origin` to `impact`.
#[derive(Clone, Debug)]
pub struct Missile {
    pub id: TargetId,
    pub origin: Point,
    /// Ground point the warhead detonates on.
    pub impact: Point,
    pub pos: Point,
    /// World units travelled per frame.
    pub speed: f32,
    pub points: u32,
    /// Distance already travelled along the trajectory.
    pub travel_dist: f32,
    /// Full length of the trajectory.
    pub dist_to_target: f32,
    pub label: Option<String>,
    /// Typed progress for highlighting only; matching never reads it.
    pub typed_chars: String,
    pub destroyed: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Side {
    Left,
    Right,
}

/// A bonus ship drifting horizontally across the sky.
#[derive(Clone, Debug)]
pub struct Powerup {
    pub id: TargetId,
    /// Centre of the ship's hull.
    pub pos: Point,
    /// +1.0 when moving right, -1.0 when moving left.
    pub direction: f32,
    pub speed: f32,
    pub points: u32,
    pub label: Option<String>,
    pub typed_chars: String,
    pub destroyed: bool,
    /// Frames alive, drives the hull flashing.
    pub flash_timer: u32,
}

// ── Ground & effects ──────────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq)]
pub struct City {
    pub pos: Point,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExplosionKind {
    /// Warhead reaching the ground: wrecks cities, scores nothing.
    Nuke,
    /// Laser interception: knocks out missiles for points, spares cities.
    Intercept,
    /// Power-up kill: visual only.
    Flash,
}

#[derive(Clone, Debug)]
pub struct Explosion {
    pub center: Point,
    pub kind: ExplosionKind,
    pub radius: f32,
    pub max_radius: f32,
    /// `true` while expanding, `false` once shrinking back.
    pub growing: bool,
    pub complete: bool,
}

// ── Session state ─────────────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GameStatus {
    Playing,
    GameOver,
}

/// What the level controller reports after each frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RoundSignal {
    Running,
    NewLevel,
    GameOver,
}
