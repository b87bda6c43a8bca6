/// The interceptor turret: aim animation plus a transient laser beam.
///
/// Aiming and the laser are independent one-shot timers.  Aiming eases the
/// barrel's facing point from wherever it was towards the target over a fixed
/// number of frames; the laser fades out linearly over its own, shorter span
/// and can be (re)fired at any time.

use std::f32::consts::PI;

use crate::entities::Point;

/// Default aim duration, in frames (half a second at 30 FPS).
pub const AIM_FRAMES: u32 = 15;
/// Default laser duration, in frames.
pub const LASER_FRAMES: u32 = 10;
/// Barrel length in world units.
pub const BARREL_LENGTH: f32 = 28.0;

/// Cubic ease-out: fast start, gentle settle.
pub fn ease_out_cubic(t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    1.0 - (1.0 - t).powi(3)
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct Aim {
    start: Point,
    target: Point,
    elapsed: u32,
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct Laser {
    target: Point,
    elapsed: u32,
}

#[derive(Clone, Debug)]
pub struct Turret {
    base: Point,
    facing: Point,
    aim: Option<Aim>,
    aim_frames: u32,
    laser: Option<Laser>,
    laser_frames: u32,
    powered: bool,
}

impl Turret {
    /// A turret at `base`, initially pointing straight up at `sky_y`.
    pub fn new(base: Point, sky_y: f32, aim_frames: u32, laser_frames: u32) -> Self {
        Self {
            base,
            facing: Point::new(base.x, sky_y),
            aim: None,
            aim_frames: aim_frames.max(1),
            laser: None,
            laser_frames: laser_frames.max(1),
            powered: false,
        }
    }

    pub fn base(&self) -> Point {
        self.base
    }

    pub fn facing(&self) -> Point {
        self.facing
    }

    /// Begin turning towards `point`.  Re-aiming at the point already being
    /// aimed at keeps the animation going instead of restarting it.
    pub fn aim_at(&mut self, point: Point) {
        if let Some(aim) = &self.aim {
            if aim.target == point {
                return;
            }
        }
        self.aim = Some(Aim {
            start: self.facing,
            target: point,
            elapsed: 0,
        });
    }

    /// Move the aim destination (e.g. to follow a moving target) without
    /// touching the animation clock.
    pub fn retarget(&mut self, point: Point) {
        if let Some(aim) = &mut self.aim {
            aim.target = point;
            if aim.elapsed >= self.aim_frames {
                self.facing = point;
            }
        }
    }

    pub fn stop_aiming(&mut self) {
        self.aim = None;
    }

    pub fn is_aiming(&self) -> bool {
        self.aim.is_some()
    }

    pub fn is_aiming_complete(&self) -> bool {
        self.aim.is_some_and(|aim| aim.elapsed >= self.aim_frames)
    }

    /// Point the current aim is heading for, if any.
    pub fn aim_target(&self) -> Option<Point> {
        self.aim.map(|aim| aim.target)
    }

    pub fn fire_laser(&mut self, point: Point) {
        self.laser = Some(Laser {
            target: point,
            elapsed: 0,
        });
    }

    /// Laser end point and opacity (1.0 fresh, fading to 0.0).
    pub fn laser(&self) -> Option<(Point, f32)> {
        self.laser.map(|laser| {
            let opacity = 1.0 - laser.elapsed as f32 / self.laser_frames as f32;
            (laser.target, opacity.clamp(0.0, 1.0))
        })
    }

    pub fn is_powered(&self) -> bool {
        self.powered
    }

    pub fn set_powered(&mut self, powered: bool) {
        self.powered = powered;
    }

    /// Advance both timers by one frame.
    pub fn update(&mut self) {
        if let Some(aim) = &mut self.aim {
            if aim.elapsed < self.aim_frames {
                aim.elapsed += 1;
            }
            if aim.elapsed >= self.aim_frames {
                self.facing = aim.target;
            } else {
                let progress = aim.elapsed as f32 / self.aim_frames as f32;
                self.facing = aim.start.lerp(aim.target, ease_out_cubic(progress));
            }
        }

        if let Some(laser) = &mut self.laser {
            laser.elapsed += 1;
            if laser.elapsed >= self.laser_frames {
                self.laser = None;
            }
        }
    }

    /// Barrel angle derived from the facing point; a level target (zero
    /// vertical delta) counts as slope 0.
    pub fn barrel_angle(&self) -> f32 {
        let dx = self.facing.x - self.base.x;
        let dy = self.facing.y - self.base.y;
        let slope = if dy != 0.0 { dx / dy } else { 0.0 };
        slope.atan() + PI
    }

    pub fn barrel_end(&self, length: f32) -> Point {
        let angle = self.barrel_angle();
        Point::new(
            self.base.x + length * angle.sin(),
            self.base.y + length * angle.cos(),
        )
    }
}
