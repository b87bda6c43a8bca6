/// Motion and collision rules.
///
/// Free functions over the plain data in `entities`.  Nothing here touches
/// labels, scoring state or the turret; randomness always comes through an
/// injected `rng` so callers control determinism.

use rand::Rng;

use crate::entities::{
    City, Explosion, ExplosionKind, Missile, Point, Powerup, Side, TargetId,
};

// ── Tunables ─────────────────────────────────────────────────────────────────

/// How far ahead of a missile the interception blast is placed.
pub const LEAD_DISTANCE: f32 = 20.0;

pub const NUKE_RADIUS: f32 = 60.0;
pub const INTERCEPT_RADIUS: f32 = 45.0;
pub const FLASH_RADIUS: f32 = 25.0;

/// Radius change per frame while an explosion grows or shrinks.
pub const EXPLOSION_STEP: f32 = 2.0;

pub const POWERUP_SPEED: f32 = 1.5;
/// Half the hull width; a power-up is gone once its hull clears the edge.
pub const POWERUP_HALF_WIDTH: f32 = 20.0;

// ── Constructors ─────────────────────────────────────────────────────────────

pub fn new_missile(
    id: TargetId,
    origin: Point,
    impact: Point,
    speed: f32,
    points: u32,
    label: Option<String>,
) -> Missile {
    Missile {
        id,
        origin,
        impact,
        pos: origin,
        speed,
        points,
        travel_dist: 0.0,
        dist_to_target: origin.distance(impact),
        label,
        typed_chars: String::new(),
        destroyed: false,
    }
}

/// Build a power-up just outside the given screen edge, at a random altitude
/// between the upper third of the sky and `max_y`.
pub fn new_powerup(
    id: TargetId,
    side: Side,
    world_width: f32,
    world_height: f32,
    max_y: f32,
    points: u32,
    label: String,
    rng: &mut impl Rng,
) -> Powerup {
    let min_y = world_height / 3.0;
    let y = if max_y > min_y { rng.gen_range(min_y..max_y) } else { min_y };
    let (x, direction) = match side {
        Side::Left => (-POWERUP_HALF_WIDTH, 1.0),
        Side::Right => (world_width + POWERUP_HALF_WIDTH, -1.0),
    };
    Powerup {
        id,
        pos: Point::new(x, y),
        direction,
        speed: POWERUP_SPEED,
        points,
        label: Some(label),
        typed_chars: String::new(),
        destroyed: false,
        flash_timer: 0,
    }
}

pub fn new_explosion(center: Point, kind: ExplosionKind) -> Explosion {
    let max_radius = match kind {
        ExplosionKind::Nuke => NUKE_RADIUS,
        ExplosionKind::Intercept => INTERCEPT_RADIUS,
        ExplosionKind::Flash => FLASH_RADIUS,
    };
    Explosion {
        center,
        kind,
        radius: 0.0,
        max_radius,
        growing: true,
        complete: false,
    }
}

/// Cities evenly spaced along the ground, leaving the centre slot for the turret.
pub fn layout_cities(count: usize, world_width: f32, ground_y: f32) -> Vec<City> {
    let slots = count + 2;
    let centre = slots / 2;
    (1..slots)
        .filter(|&slot| slot != centre)
        .take(count)
        .map(|slot| City {
            pos: Point::new(slot as f32 * world_width / slots as f32, ground_y),
        })
        .collect()
}

// ── Missiles ─────────────────────────────────────────────────────────────────

/// Point on the missile's trajectory `dist` units from its origin.
pub fn position_along(missile: &Missile, dist: f32) -> Point {
    if missile.dist_to_target <= f32::EPSILON {
        return missile.impact;
    }
    let t = (dist / missile.dist_to_target).clamp(0.0, 1.0);
    missile.origin.lerp(missile.impact, t)
}

/// Predict a future position along the trajectory, clamped to the impact point.
pub fn future_position(missile: &Missile, ahead: f32) -> Point {
    let dist = (missile.travel_dist + ahead.max(0.0)).min(missile.dist_to_target);
    position_along(missile, dist)
}

/// Advance one frame.  Returns the ground-impact explosion when the missile
/// arrives; the missile is then flagged destroyed.
pub fn advance_missile(missile: &mut Missile) -> Option<Explosion> {
    if missile.destroyed {
        return None;
    }
    missile.travel_dist += missile.speed;
    if missile.travel_dist >= missile.dist_to_target {
        missile.travel_dist = missile.dist_to_target;
        missile.pos = missile.impact;
        missile.destroyed = true;
        return Some(new_explosion(missile.impact, ExplosionKind::Nuke));
    }
    missile.pos = position_along(missile, missile.travel_dist);
    None
}

// ── Power-ups ────────────────────────────────────────────────────────────────

/// Drift one frame.  Returns `false` once the ship has left the screen.
pub fn advance_powerup(powerup: &mut Powerup, world_width: f32) -> bool {
    if powerup.destroyed {
        return false;
    }
    powerup.pos.x += powerup.speed * powerup.direction;
    powerup.flash_timer = powerup.flash_timer.wrapping_add(1);

    let gone_right = powerup.direction > 0.0 && powerup.pos.x > world_width + POWERUP_HALF_WIDTH;
    let gone_left = powerup.direction < 0.0 && powerup.pos.x < -POWERUP_HALF_WIDTH;
    !(gone_right || gone_left)
}

// ── Explosions ───────────────────────────────────────────────────────────────

/// Grow to `max_radius`, then shrink back to nothing.
pub fn advance_explosion(explosion: &mut Explosion) {
    if explosion.complete {
        return;
    }
    if explosion.growing {
        explosion.radius += EXPLOSION_STEP;
        if explosion.radius >= explosion.max_radius {
            explosion.radius = explosion.max_radius;
            explosion.growing = false;
        }
    } else {
        explosion.radius -= EXPLOSION_STEP;
        if explosion.radius <= 0.0 {
            explosion.radius = 0.0;
            explosion.complete = true;
        }
    }
}

/// Score awarded per missile caught in this kind of blast.
pub fn points_multiplier(kind: ExplosionKind) -> u32 {
    match kind {
        ExplosionKind::Nuke => 0,
        ExplosionKind::Intercept => 1,
        ExplosionKind::Flash => 0,
    }
}

// ── Collisions ───────────────────────────────────────────────────────────────

#[derive(Debug, Default, Clone, PartialEq)]
pub struct CollisionReport {
    pub score: u32,
    /// Missiles knocked out by blasts this frame.
    pub missiles_hit: Vec<TargetId>,
    pub cities_lost: usize,
}

/// Resolve blast-radius hits.  Missiles inside any live blast are flagged
/// destroyed; cities inside a ground-impact blast are removed.
pub fn check_collisions(
    missiles: &mut [Missile],
    explosions: &[Explosion],
    cities: &mut Vec<City>,
) -> CollisionReport {
    let mut report = CollisionReport::default();

    for explosion in explosions.iter().filter(|e| !e.complete) {
        if explosion.kind == ExplosionKind::Flash {
            continue;
        }
        for missile in missiles.iter_mut().filter(|m| !m.destroyed) {
            if explosion.radius > explosion.center.distance(missile.pos) {
                missile.destroyed = true;
                report.score += missile.points * points_multiplier(explosion.kind);
                report.missiles_hit.push(missile.id);
            }
        }
        if explosion.kind == ExplosionKind::Nuke {
            let before = cities.len();
            cities.retain(|city| explosion.radius <= explosion.center.distance(city.pos));
            report.cities_lost += before - cities.len();
        }
    }

    report
}
