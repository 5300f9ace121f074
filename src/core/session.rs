//! Session state: the active room and the rule book.

use tracing::info;

use crate::adapters::GenieBackend;
use crate::domain::{DoorId, RuleBook};

/// Result of opening the active door
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Progress {
    /// The player moved into the next room
    Advanced(DoorId),
    /// The last door is open
    Finished,
}

/// In-memory session, rebuilt from the service on every run
#[derive(Debug, Clone)]
pub struct Session {
    door: DoorId,
    rules: RuleBook,
    rules_from_service: bool,
    escaped: bool,
}

impl Session {
    pub fn new(rules: RuleBook) -> Self {
        Self {
            door: DoorId::FIRST,
            rules,
            rules_from_service: false,
            escaped: false,
        }
    }

    /// Fetch rules once, falling back to the hardcoded book on any failure
    pub async fn load(backend: &dyn GenieBackend) -> Self {
        let (rules, rules_from_service) = RuleBook::from_response(backend.get_rules().await);
        if rules_from_service {
            info!(backend = backend.name(), "Loaded door rules");
        }
        Self {
            rules_from_service,
            ..Self::new(rules)
        }
    }

    pub fn door(&self) -> DoorId {
        self.door
    }

    pub fn rules(&self) -> &RuleBook {
        &self.rules
    }

    pub fn rules_from_service(&self) -> bool {
        self.rules_from_service
    }

    pub fn escaped(&self) -> bool {
        self.escaped
    }

    /// The `door_rules` text for the active door
    pub fn active_law(&self) -> String {
        self.rules.law_text(self.door)
    }

    /// Record that the active door was opened. Never moves backwards.
    pub fn record_door_opened(&mut self) -> Progress {
        if self.door.is_last() {
            self.escaped = true;
            Progress::Finished
        } else {
            self.door = self.door.advance();
            Progress::Advanced(self.door)
        }
    }

    /// Like `record_door_opened`, but only if `door` is still the active,
    /// unopened door. Returns `None` when that progress was already recorded.
    pub fn record_opened(&mut self, door: DoorId) -> Option<Progress> {
        if door != self.door || self.escaped {
            return None;
        }
        Some(self.record_door_opened())
    }
}
