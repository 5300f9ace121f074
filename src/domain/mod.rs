//! Domain types for the genie client.
//!
//! This module contains the core data structures:
//! - Rules: door identifiers and their hidden laws
//! - Verdict: the service's decision on a wish
//! - Object: conjured objects awaiting a door
//! - Events: observable session occurrences

pub mod events;
pub mod object;
pub mod rules;
pub mod verdict;

// Re-export commonly used types
pub use events::{SessionEvent, SessionEventKind};
pub use object::{DeferredVerdict, DoorCheck, ObjectId, ObjectKind, PendingObject, UnknownObject};
pub use rules::{DoorId, DoorRule, InvalidDoor, RuleBook, RuleBookError, RulesResponse};
pub use verdict::{ColorParseError, Hint, Narration, Rgba, VfxKind, WishVerdict};
