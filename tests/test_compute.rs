use keyblaster::compute::*;
use keyblaster::entities::*;

use rand::rngs::StdRng;
use rand::SeedableRng;

fn seeded_rng() -> StdRng {
    StdRng::seed_from_u64(42)
}

fn vertical_missile(x: f32, speed: f32) -> Missile {
    // 500 units straight down from the sky line to the ground
    new_missile(
        TargetId(1),
        Point::new(x, 40.0),
        Point::new(x, 540.0),
        speed,
        10,
        Some("asdf".to_string()),
    )
}

fn blast(center: Point, kind: ExplosionKind, radius: f32) -> Explosion {
    let mut e = new_explosion(center, kind);
    e.radius = radius;
    e
}

// ── new_missile ───────────────────────────────────────────────────────────────

#[test]
fn new_missile_starts_at_origin() {
    let m = vertical_missile(100.0, 0.5);
    assert_eq!(m.pos, Point::new(100.0, 40.0));
    assert_eq!(m.travel_dist, 0.0);
    assert!((m.dist_to_target - 500.0).abs() < 1e-3);
    assert!(!m.destroyed);
    assert!(m.typed_chars.is_empty());
}

// ── advance_missile ───────────────────────────────────────────────────────────

#[test]
fn missile_moves_speed_units_per_frame() {
    let mut m = vertical_missile(100.0, 2.0);
    assert!(advance_missile(&mut m).is_none());
    assert!((m.pos.y - 42.0).abs() < 1e-3);
    assert!((m.pos.x - 100.0).abs() < 1e-3);
    assert!((m.travel_dist - 2.0).abs() < 1e-3);
}

#[test]
fn missile_detonates_on_arrival() {
    let mut m = vertical_missile(100.0, 100.0);
    let mut blast = None;
    for _ in 0..5 {
        blast = advance_missile(&mut m);
    }
    let blast = blast.expect("fifth step reaches the ground");
    assert_eq!(blast.kind, ExplosionKind::Nuke);
    assert_eq!(blast.center, Point::new(100.0, 540.0));
    assert_eq!(blast.max_radius, NUKE_RADIUS);
    assert!(m.destroyed);

    // A destroyed missile never detonates twice
    assert!(advance_missile(&mut m).is_none());
}

#[test]
fn future_position_leads_along_trajectory() {
    let mut m = vertical_missile(100.0, 10.0);
    advance_missile(&mut m);
    let lead = future_position(&m, LEAD_DISTANCE);
    assert!((lead.y - (50.0 + LEAD_DISTANCE)).abs() < 1e-3);
}

#[test]
fn future_position_clamps_to_impact() {
    let mut m = vertical_missile(100.0, 495.0);
    advance_missile(&mut m);
    assert_eq!(future_position(&m, LEAD_DISTANCE), Point::new(100.0, 540.0));
}

// ── Cities ────────────────────────────────────────────────────────────────────

#[test]
fn cities_skip_the_turret_slot() {
    let cities = layout_cities(6, 800.0, 540.0);
    let xs: Vec<f32> = cities.iter().map(|c| c.pos.x).collect();
    assert_eq!(xs, vec![100.0, 200.0, 300.0, 500.0, 600.0, 700.0]);
    assert!(cities.iter().all(|c| c.pos.y == 540.0));
}

// ── Power-ups ─────────────────────────────────────────────────────────────────

#[test]
fn powerup_enters_from_chosen_side() {
    let mut rng = seeded_rng();
    let left = new_powerup(TargetId(1), Side::Left, 800.0, 600.0, 440.0, 1000, "ufo".into(), &mut rng);
    let right = new_powerup(TargetId(2), Side::Right, 800.0, 600.0, 440.0, 1000, "ufo".into(), &mut rng);

    assert!(left.pos.x < 0.0);
    assert_eq!(left.direction, 1.0);
    assert!(right.pos.x > 800.0);
    assert_eq!(right.direction, -1.0);
    for p in [&left, &right] {
        assert!(p.pos.y >= 200.0 && p.pos.y < 440.0, "altitude {}", p.pos.y);
        assert_eq!(p.label.as_deref(), Some("ufo"));
    }
}

#[test]
fn powerup_leaves_screen() {
    let mut rng = seeded_rng();
    let mut p = new_powerup(TargetId(1), Side::Left, 800.0, 600.0, 440.0, 1000, "ufo".into(), &mut rng);
    assert!(advance_powerup(&mut p, 800.0));
    assert_eq!(p.flash_timer, 1);

    p.pos.x = 800.0 + POWERUP_HALF_WIDTH;
    assert!(!advance_powerup(&mut p, 800.0));
}

// ── Explosions ────────────────────────────────────────────────────────────────

#[test]
fn explosion_grows_then_shrinks_to_completion() {
    let mut e = new_explosion(Point::new(0.0, 0.0), ExplosionKind::Intercept);
    let mut peak: f32 = 0.0;
    let mut frames = 0;
    while !e.complete {
        advance_explosion(&mut e);
        peak = peak.max(e.radius);
        frames += 1;
        assert!(frames < 200, "explosion never completes");
    }
    assert_eq!(peak, INTERCEPT_RADIUS);
    assert_eq!(e.radius, 0.0);
    assert!(!e.growing);
}

#[test]
fn blast_kinds_score_differently() {
    assert_eq!(points_multiplier(ExplosionKind::Nuke), 0);
    assert_eq!(points_multiplier(ExplosionKind::Intercept), 1);
    assert_eq!(points_multiplier(ExplosionKind::Flash), 0);
}

// ── check_collisions ──────────────────────────────────────────────────────────

#[test]
fn intercept_destroys_missiles_and_spares_cities() {
    let mut missiles = vec![vertical_missile(100.0, 1.0)];
    let mut cities = layout_cities(6, 800.0, 540.0);
    let explosions = vec![
        blast(Point::new(100.0, 50.0), ExplosionKind::Intercept, 20.0),
        blast(Point::new(100.0, 540.0), ExplosionKind::Intercept, 45.0),
    ];

    let report = check_collisions(&mut missiles, &explosions, &mut cities);
    assert!(missiles[0].destroyed);
    assert_eq!(report.score, 10);
    assert_eq!(report.missiles_hit, vec![TargetId(1)]);
    assert_eq!(report.cities_lost, 0);
    assert_eq!(cities.len(), 6);
}

#[test]
fn nuke_wrecks_cities_in_radius() {
    let mut missiles = Vec::new();
    let mut cities = layout_cities(6, 800.0, 540.0);
    let explosions = vec![blast(Point::new(110.0, 540.0), ExplosionKind::Nuke, 60.0)];

    let report = check_collisions(&mut missiles, &explosions, &mut cities);
    assert_eq!(report.cities_lost, 1);
    assert_eq!(cities.len(), 5);
    assert!(cities.iter().all(|c| c.pos.x != 100.0));
}

#[test]
fn nuke_catches_missiles_without_score() {
    let mut missiles = vec![vertical_missile(100.0, 1.0)];
    let mut cities = Vec::new();
    let explosions = vec![blast(Point::new(100.0, 45.0), ExplosionKind::Nuke, 30.0)];

    let report = check_collisions(&mut missiles, &explosions, &mut cities);
    assert!(missiles[0].destroyed);
    assert_eq!(report.score, 0);
}

#[test]
fn flash_and_finished_blasts_are_harmless() {
    let mut missiles = vec![vertical_missile(100.0, 1.0)];
    let mut cities = layout_cities(6, 800.0, 540.0);
    let mut spent = blast(Point::new(100.0, 540.0), ExplosionKind::Nuke, 60.0);
    spent.complete = true;
    let explosions = vec![
        blast(Point::new(100.0, 40.0), ExplosionKind::Flash, 25.0),
        spent,
    ];

    let report = check_collisions(&mut missiles, &explosions, &mut cities);
    assert!(!missiles[0].destroyed);
    assert_eq!(report, CollisionReport::default());
    assert_eq!(cities.len(), 6);
}
