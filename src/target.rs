/// The capability every typeable on-screen entity exposes.
///
/// Missiles and power-ups differ in how they move and what destroying them
/// yields, but the matcher, the scheduler and the turret only ever need this
/// view of them.

use crate::entities::{Missile, Point, Powerup, TargetId, TargetKind};

pub trait Target {
    fn id(&self) -> TargetId;
    fn kind(&self) -> TargetKind;
    /// The text still to be typed, `None` once consumed.
    fn label(&self) -> Option<&str>;
    /// Where the turret should aim.
    fn position(&self) -> Point;
    fn is_destroyed(&self) -> bool;
    fn destroy(&mut self);
    /// Record typed progress for highlighting.
    fn set_typed_chars(&mut self, typed: &str);
    /// Give up the label; returns it so its prefix claim can be released.
    fn take_label(&mut self) -> Option<String>;

    /// Live and still carrying a label, i.e. eligible for matching.
    fn is_typeable(&self) -> bool {
        !self.is_destroyed() && self.label().is_some_and(|l| !l.is_empty())
    }
}

impl Target for Missile {
    fn id(&self) -> TargetId {
        self.id
    }

    fn kind(&self) -> TargetKind {
        TargetKind::Missile
    }

    fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    fn position(&self) -> Point {
        self.pos
    }

    fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    fn destroy(&mut self) {
        self.destroyed = true;
    }

    fn set_typed_chars(&mut self, typed: &str) {
        self.typed_chars.clear();
        self.typed_chars.push_str(typed);
    }

    fn take_label(&mut self) -> Option<String> {
        self.typed_chars.clear();
        self.label.take()
    }
}

impl Target for Powerup {
    fn id(&self) -> TargetId {
        self.id
    }

    fn kind(&self) -> TargetKind {
        TargetKind::Powerup
    }

    fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    fn position(&self) -> Point {
        self.pos
    }

    fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    fn destroy(&mut self) {
        self.destroyed = true;
    }

    fn set_typed_chars(&mut self, typed: &str) {
        self.typed_chars.clear();
        self.typed_chars.push_str(typed);
    }

    fn take_label(&mut self) -> Option<String> {
        self.typed_chars.clear();
        self.label.take()
    }
}

/// Find a live target by id across both collections.
pub fn find_target<'a>(
    missiles: &'a [Missile],
    powerups: &'a [Powerup],
    id: TargetId,
) -> Option<&'a dyn Target> {
    missiles
        .iter()
        .map(|m| m as &dyn Target)
        .chain(powerups.iter().map(|p| p as &dyn Target))
        .find(|t| t.id() == id && !t.is_destroyed())
}

/// Every typeable target, missiles first, in collection order.
pub fn typeable<'a>(
    missiles: &'a [Missile],
    powerups: &'a [Powerup],
) -> impl Iterator<Item = &'a dyn Target> {
    missiles
        .iter()
        .map(|m| m as &dyn Target)
        .chain(powerups.iter().map(|p| p as &dyn Target))
        .filter(|t| t.is_typeable())
}
