/// Serialises the visual destruction of matched targets.
///
/// Exactly one record is active at a time: the turret aims at it and, once
/// the aim completes, the session finalises it.  Anything matched meanwhile
/// waits in FIFO order and is activated the moment the previous one is
/// finished.  A target is never held by more than one record.

use std::collections::VecDeque;

use tracing::debug;

use crate::entities::{Point, TargetId, TargetKind};
use crate::turret::Turret;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DestructionRecord {
    pub id: TargetId,
    pub kind: TargetKind,
}

#[derive(Debug, Default, Clone)]
pub struct DestructionScheduler {
    active: Option<DestructionRecord>,
    queue: VecDeque<DestructionRecord>,
}

impl DestructionScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn active(&self) -> Option<DestructionRecord> {
        self.active
    }

    pub fn queued(&self) -> impl Iterator<Item = &DestructionRecord> {
        self.queue.iter()
    }

    pub fn is_idle(&self) -> bool {
        self.active.is_none() && self.queue.is_empty()
    }

    pub fn contains(&self, id: TargetId) -> bool {
        self.active.is_some_and(|r| r.id == id) || self.queue.iter().any(|r| r.id == id)
    }

    /// Hand over a matched target.  Activates it straight away when the
    /// turret is free, queues it otherwise.  Returns `false` if the target
    /// already has a record.
    pub fn submit(
        &mut self,
        record: DestructionRecord,
        turret: &mut Turret,
        locate: impl Fn(TargetId) -> Option<Point>,
    ) -> bool {
        if self.contains(record.id) {
            return false;
        }
        if self.active.is_some() {
            self.queue.push_back(record);
        } else {
            self.queue.push_front(record);
            self.activate_next(turret, &locate);
        }
        true
    }

    /// Keep the turret on the active target as it moves.  Records whose
    /// target vanished (e.g. detonated on the ground) are dropped.
    pub fn track(&mut self, turret: &mut Turret, locate: impl Fn(TargetId) -> Option<Point>) {
        let Some(record) = self.active else {
            return;
        };
        match locate(record.id) {
            Some(point) => turret.retarget(point),
            None => {
                debug!(id = record.id.0, "target vanished before destruction");
                self.active = None;
                turret.stop_aiming();
                self.activate_next(turret, &locate);
            }
        }
    }

    /// The active record, once the turret is on target.
    pub fn ready(&self, turret: &Turret) -> Option<DestructionRecord> {
        self.active.filter(|_| turret.is_aiming_complete())
    }

    /// Close the active record and start aiming at the next queued one.
    pub fn finish(&mut self, turret: &mut Turret, locate: impl Fn(TargetId) -> Option<Point>) {
        self.active = None;
        turret.stop_aiming();
        self.activate_next(turret, &locate);
    }

    /// Drop everything (level change / session end).
    pub fn clear(&mut self, turret: &mut Turret) {
        self.active = None;
        self.queue.clear();
        turret.stop_aiming();
    }

    fn activate_next(&mut self, turret: &mut Turret, locate: &impl Fn(TargetId) -> Option<Point>) {
        while let Some(record) = self.queue.pop_front() {
            if let Some(point) = locate(record.id) {
                turret.aim_at(point);
                self.active = Some(record);
                return;
            }
            debug!(id = record.id.0, "skipping queued target that no longer exists");
        }
    }
}
