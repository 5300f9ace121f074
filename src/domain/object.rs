//! Conjured objects.
//!
//! A pending object carries the genie's verdict for the door it was wished
//! for. The verdict is decided once, remotely, when the wish is submitted;
//! the object only decides *when* it is revealed.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use super::rules::DoorId;
use super::verdict::WishVerdict;

/// Every object the genie can conjure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectKind {
    // Weapons
    Sword,
    Shield,
    Bomb,
    Hammer,
    Potion,
    // Furniture
    Chair,
    Table,
    Bed,
    Toilet,
    Lamp,
    Door,
    Chest,
    // Nature
    Tree,
    Rock,
    Mushroom,
    Flower,
    Cloud,
    Fire,
    // Food
    Pizza,
    Burger,
    Banana,
    Cheese,
    Cake,
    // Animals
    Duck,
    Spider,
    Fish,
    Cat,
    // Tools
    Key,
    Ladder,
    Coin,
    // Shapes
    Box,
    Ball,
}

impl ObjectKind {
    pub const ALL: [ObjectKind; 32] = [
        ObjectKind::Sword,
        ObjectKind::Shield,
        ObjectKind::Bomb,
        ObjectKind::Hammer,
        ObjectKind::Potion,
        ObjectKind::Chair,
        ObjectKind::Table,
        ObjectKind::Bed,
        ObjectKind::Toilet,
        ObjectKind::Lamp,
        ObjectKind::Door,
        ObjectKind::Chest,
        ObjectKind::Tree,
        ObjectKind::Rock,
        ObjectKind::Mushroom,
        ObjectKind::Flower,
        ObjectKind::Cloud,
        ObjectKind::Fire,
        ObjectKind::Pizza,
        ObjectKind::Burger,
        ObjectKind::Banana,
        ObjectKind::Cheese,
        ObjectKind::Cake,
        ObjectKind::Duck,
        ObjectKind::Spider,
        ObjectKind::Fish,
        ObjectKind::Cat,
        ObjectKind::Key,
        ObjectKind::Ladder,
        ObjectKind::Coin,
        ObjectKind::Box,
        ObjectKind::Ball,
    ];

    /// The identifier the service uses for this object
    pub fn code_name(self) -> &'static str {
        match self {
            ObjectKind::Sword => "sword",
            ObjectKind::Shield => "shield",
            ObjectKind::Bomb => "bomb",
            ObjectKind::Hammer => "hammer",
            ObjectKind::Potion => "potion",
            ObjectKind::Chair => "chair",
            ObjectKind::Table => "table",
            ObjectKind::Bed => "bed",
            ObjectKind::Toilet => "toilet",
            ObjectKind::Lamp => "lamp",
            ObjectKind::Door => "door",
            ObjectKind::Chest => "chest",
            ObjectKind::Tree => "tree",
            ObjectKind::Rock => "rock",
            ObjectKind::Mushroom => "mushroom",
            ObjectKind::Flower => "flower",
            ObjectKind::Cloud => "cloud",
            ObjectKind::Fire => "fire",
            ObjectKind::Pizza => "pizza",
            ObjectKind::Burger => "burger",
            ObjectKind::Banana => "banana",
            ObjectKind::Cheese => "cheese",
            ObjectKind::Cake => "cake",
            ObjectKind::Duck => "duck",
            ObjectKind::Spider => "spider",
            ObjectKind::Fish => "fish",
            ObjectKind::Cat => "cat",
            ObjectKind::Key => "key",
            ObjectKind::Ladder => "ladder",
            ObjectKind::Coin => "coin",
            ObjectKind::Box => "box",
            ObjectKind::Ball => "ball",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown object identifier: {0}")]
pub struct UnknownObject(pub String);

impl FromStr for ObjectKind {
    type Err = UnknownObject;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        ObjectKind::ALL
            .into_iter()
            .find(|kind| kind.code_name().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| UnknownObject(s.to_string()))
    }
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code_name())
    }
}

/// Identity of a spawned object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ObjectId(pub Uuid);

impl ObjectId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// First 8 characters, for logs
    pub fn short(&self) -> String {
        self.0.to_string()[..8].to_string()
    }
}

impl Default for ObjectId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The slice of a verdict an object keeps until it reaches a door
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeferredVerdict {
    door_open: bool,
    pub drop_voice: String,
    pub congrats_voice: String,
    pub audio_url_congrats: String,
}

impl DeferredVerdict {
    pub fn from_verdict(verdict: &WishVerdict) -> Self {
        Self {
            door_open: verdict.door_open,
            drop_voice: verdict.drop_voice.clone(),
            congrats_voice: verdict.congrats_voice.clone(),
            audio_url_congrats: verdict.audio_url_congrats.clone(),
        }
    }

    pub fn door_open(&self) -> bool {
        self.door_open
    }
}

/// Result of presenting an object to a door
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DoorCheck {
    Accepted,
    Rejected,
}

/// A conjured object waiting to be carried to a door
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingObject {
    pub id: ObjectId,
    pub kind: ObjectKind,
    pub label: String,

    /// Door that was active when the wish was made
    pub door: DoorId,

    verdict: DeferredVerdict,
    held: bool,
    pickupable: bool,
}

impl PendingObject {
    pub fn new(kind: ObjectKind, label: impl Into<String>, door: DoorId, verdict: &WishVerdict) -> Self {
        Self {
            id: ObjectId::new(),
            kind,
            label: label.into(),
            door,
            verdict: DeferredVerdict::from_verdict(verdict),
            held: false,
            pickupable: true,
        }
    }

    pub fn verdict(&self) -> &DeferredVerdict {
        &self.verdict
    }

    /// Reveal the cached verdict at the `active` door.
    ///
    /// The verdict was judged against the law of `self.door` only, so any
    /// other door refuses the object. Always the same answer for a given door.
    pub fn try_use_on_door(&self, active: DoorId) -> DoorCheck {
        if self.verdict.door_open && self.door == active {
            DoorCheck::Accepted
        } else {
            DoorCheck::Rejected
        }
    }

    pub fn is_held(&self) -> bool {
        self.held
    }

    pub fn is_pickupable(&self) -> bool {
        self.pickupable && !self.held
    }

    pub(crate) fn pick_up(&mut self) {
        self.held = true;
    }

    pub(crate) fn release(&mut self) {
        self.held = false;
        self.pickupable = true;
    }

    pub(crate) fn consume(&mut self) {
        self.held = false;
        self.pickupable = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn verdict(door_open: bool) -> WishVerdict {
        WishVerdict {
            object_name: "key".to_string(),
            door_open,
            ..Default::default()
        }
    }

    #[test]
    fn test_object_kind_parse_is_case_insensitive() {
        assert_eq!("SWORD".parse::<ObjectKind>().unwrap(), ObjectKind::Sword);
        assert_eq!(" pizza ".parse::<ObjectKind>().unwrap(), ObjectKind::Pizza);
        assert!("laser".parse::<ObjectKind>().is_err());
    }

    #[test]
    fn test_code_names_round_trip() {
        for kind in ObjectKind::ALL {
            assert_eq!(kind.code_name().parse::<ObjectKind>().unwrap(), kind);
        }
    }

    #[test]
    fn test_accepting_object_always_accepts() {
        let object = PendingObject::new(ObjectKind::Key, "Key", DoorId::FIRST, &verdict(true));
        for _ in 0..10 {
            assert_eq!(object.try_use_on_door(DoorId::FIRST), DoorCheck::Accepted);
        }
    }

    #[test]
    fn test_verdict_only_holds_for_its_own_door() {
        let object = PendingObject::new(ObjectKind::Key, "Key", DoorId::FIRST, &verdict(true));
        let second = DoorId::new(2).unwrap();
        assert_eq!(object.try_use_on_door(second), DoorCheck::Rejected);
        assert_eq!(object.try_use_on_door(DoorId::LAST), DoorCheck::Rejected);
        assert_eq!(object.try_use_on_door(DoorId::FIRST), DoorCheck::Accepted);
    }

    #[test]
    fn test_rejecting_object_always_rejects() {
        let mut object = PendingObject::new(ObjectKind::Key, "Key", DoorId::FIRST, &verdict(false));
        object.pick_up();
        assert_eq!(object.try_use_on_door(DoorId::FIRST), DoorCheck::Rejected);
        object.release();
        assert_eq!(object.try_use_on_door(DoorId::FIRST), DoorCheck::Rejected);
        assert!(object.is_pickupable());
    }

    #[test]
    fn test_consumed_object_is_not_pickupable() {
        let mut object = PendingObject::new(ObjectKind::Key, "Key", DoorId::FIRST, &verdict(true));
        object.pick_up();
        assert!(!object.is_pickupable());
        object.consume();
        assert!(!object.is_held());
        assert!(!object.is_pickupable());
    }
}
