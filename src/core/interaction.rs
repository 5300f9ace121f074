//! Deferred door verdict state machine.
//!
//! ```text
//! Idle ─record─► WishSubmitted ─verdict─► ObjectPendingPickup ◄─drop / rejected─┐
//!                                              │ pickup                         │
//!                                              ▼                                │
//!                                          ObjectHeld ─use on door─► UsedSuccessfully
//!                                              └──────────────────────────────────┘
//! ```
//!
//! The single action input does whatever fits the moment: use the held
//! object on a door, drop it, or pick up a nearby one. Using beats dropping.

use std::collections::HashMap;

use tracing::debug;

use crate::domain::{DoorCheck, DoorId, ObjectId, PendingObject};

/// Coarse state of the player's interaction with doors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Nothing to do but wish
    Idle,
    /// A wish is in flight
    WishSubmitted,
    /// At least one object is lying around, none held
    ObjectPendingPickup,
    /// The player carries an object
    ObjectHeld,
}

/// What the action input did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionOutcome {
    PickedUp(ObjectId),
    Dropped(ObjectId),
    /// The door accepted the object; it has been consumed
    UsedSuccessfully(PendingObject),
    /// The door refused the object; it can be picked up again
    UsedAndRejected(ObjectId),
    NoOp,
}

/// Interaction ranges in world units
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ranges {
    pub pickup: f32,
    pub door: f32,
}

/// Minimal world position
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec3 {
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    pub fn distance(self, other: Vec3) -> f32 {
        let (dx, dy, dz) = (self.x - other.x, self.y - other.y, self.z - other.z);
        (dx * dx + dy * dy + dz * dz).sqrt()
    }
}

/// What the player is close enough to interact with
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Proximity {
    pub near_door: bool,
    pub nearby_object: Option<ObjectId>,
}

impl Proximity {
    pub fn near_door() -> Self {
        Self {
            near_door: true,
            nearby_object: None,
        }
    }

    pub fn near_object(object: ObjectId) -> Self {
        Self {
            near_door: false,
            nearby_object: Some(object),
        }
    }
}

/// Live objects and the held slot
#[derive(Debug, Default)]
pub struct Interaction {
    objects: HashMap<ObjectId, PendingObject>,
    held: Option<ObjectId>,
}

impl Interaction {
    pub fn new() -> Self {
        Self::default()
    }

    /// Track a freshly spawned object
    pub fn register(&mut self, object: PendingObject) {
        debug!(object = %object.id.short(), kind = %object.kind, "Registered pending object");
        self.objects.insert(object.id, object);
    }

    pub fn get(&self, id: ObjectId) -> Option<&PendingObject> {
        self.objects.get(&id)
    }

    pub fn held(&self) -> Option<&PendingObject> {
        self.held.and_then(|id| self.objects.get(&id))
    }

    pub fn objects(&self) -> impl Iterator<Item = &PendingObject> {
        self.objects.values()
    }

    /// Forget an object the scene removed on its own (despawn, fell out of the world)
    pub fn remove(&mut self, id: ObjectId) -> Option<PendingObject> {
        if self.held == Some(id) {
            self.held = None;
        }
        self.objects.remove(&id)
    }

    pub fn phase(&self, submitting: bool) -> Phase {
        if self.held.is_some() {
            Phase::ObjectHeld
        } else if submitting {
            Phase::WishSubmitted
        } else if self.objects.values().any(|o| o.is_pickupable()) {
            Phase::ObjectPendingPickup
        } else {
            Phase::Idle
        }
    }

    /// Work out proximity from world positions.
    ///
    /// `objects` lists the positions the scene knows about; only pickupable
    /// ones within range count, and the closest wins.
    pub fn resolve_proximity(
        &self,
        player: Vec3,
        door: Option<Vec3>,
        objects: &[(ObjectId, Vec3)],
        ranges: Ranges,
    ) -> Proximity {
        let near_door = door
            .map(|d| player.distance(d) <= ranges.door)
            .unwrap_or(false);

        let nearby_object = objects
            .iter()
            .filter(|(id, _)| self.objects.get(id).map(|o| o.is_pickupable()).unwrap_or(false))
            .map(|(id, pos)| (*id, player.distance(*pos)))
            .filter(|(_, d)| *d <= ranges.pickup)
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(id, _)| id);

        Proximity {
            near_door,
            nearby_object,
        }
    }

    /// Handle one press of the action input. `active` is the door the
    /// player is standing at when `proximity.near_door` is set.
    pub fn act(&mut self, proximity: &Proximity, active: DoorId) -> ActionOutcome {
        if let Some(id) = self.held {
            return if proximity.near_door {
                self.use_on_door(id, active)
            } else {
                self.drop_held(id)
            };
        }

        match proximity.nearby_object {
            Some(id) => self.pick_up(id),
            None => ActionOutcome::NoOp,
        }
    }

    fn use_on_door(&mut self, id: ObjectId, active: DoorId) -> ActionOutcome {
        let Some(object) = self.objects.get_mut(&id) else {
            self.held = None;
            return ActionOutcome::NoOp;
        };

        self.held = None;
        match object.try_use_on_door(active) {
            DoorCheck::Accepted => {
                object.consume();
                match self.objects.remove(&id) {
                    Some(object) => ActionOutcome::UsedSuccessfully(object),
                    None => ActionOutcome::NoOp,
                }
            }
            DoorCheck::Rejected => {
                object.release();
                ActionOutcome::UsedAndRejected(id)
            }
        }
    }

    fn drop_held(&mut self, id: ObjectId) -> ActionOutcome {
        self.held = None;
        if let Some(object) = self.objects.get_mut(&id) {
            object.release();
        }
        ActionOutcome::Dropped(id)
    }

    fn pick_up(&mut self, id: ObjectId) -> ActionOutcome {
        match self.objects.get_mut(&id) {
            Some(object) if object.is_pickupable() => {
                object.pick_up();
                self.held = Some(id);
                ActionOutcome::PickedUp(id)
            }
            _ => ActionOutcome::NoOp,
        }
    }
}
