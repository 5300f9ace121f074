//! Session events.
//!
//! The orchestrator reports everything observable (spawns, narration,
//! door progress, failures) as events so a front end can react to actual
//! completions rather than guessing how long a step takes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::object::{ObjectId, ObjectKind};
use super::rules::DoorId;

/// A single observable occurrence during a session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionEvent {
    /// Unique identifier for this event
    pub id: Uuid,

    /// When this event occurred
    pub timestamp: DateTime<Utc>,

    /// What happened
    pub kind: SessionEventKind,
}

impl SessionEvent {
    /// Create a new event with the current timestamp
    pub fn new(kind: SessionEventKind) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            kind,
        }
    }
}

/// Types of session events
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "event")]
pub enum SessionEventKind {
    /// Rule book is ready; `from_service` is false when defaults were used
    RulesLoaded { from_service: bool },

    /// A wish was sent to the service
    WishSubmitted { door: DoorId, fingerprint: String },

    /// The wish exchange failed; the player may record again
    WishFailed { door: DoorId, reason: String },

    /// A wish arrived while another was still in flight
    WishIgnored,

    ObjectSpawned {
        object: ObjectId,
        kind: ObjectKind,
        label: String,
    },

    /// The verdict named an object the catalog does not know
    ObjectUnavailable { name: String },

    ObjectPickedUp { object: ObjectId },

    ObjectDropped { object: ObjectId },

    /// The object was shown to the door and refused
    ObjectRejected { object: ObjectId, door: DoorId },

    DoorOpened { door: DoorId },

    /// The player moved on to a new room
    RoomAdvanced { door: DoorId },

    /// The last door was opened
    EscapeCompleted,

    NarrationStarted { subtitle: String },

    NarrationFinished { interrupted: bool },

    HintReceived {
        door: DoorId,
        hint: String,
        level: u32,
        remaining: u32,
    },
}
