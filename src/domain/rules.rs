//! Door identifiers and the per-door rule book.
//!
//! Rules are fetched once per session. If the service returns anything that
//! does not describe exactly one well-formed rule per door, the hardcoded
//! book is used instead.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

/// Number of clues every rule carries
pub const CLUES_PER_RULE: usize = 3;

/// A door (and its room), 1-based
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct DoorId(u8);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Door id out of range: {0} (expected {min}..={max})", min = DoorId::FIRST.0, max = DoorId::LAST.0)]
pub struct InvalidDoor(pub i64);

impl DoorId {
    pub const FIRST: DoorId = DoorId(1);
    pub const LAST: DoorId = DoorId(3);

    /// Build a door id, rejecting anything outside 1..=3
    pub fn new(n: i64) -> Result<Self, InvalidDoor> {
        if n < Self::FIRST.0 as i64 || n > Self::LAST.0 as i64 {
            return Err(InvalidDoor(n));
        }
        Ok(Self(n as u8))
    }

    pub fn get(self) -> u8 {
        self.0
    }

    /// Next door, saturating at the last one
    pub fn advance(self) -> Self {
        if self.is_last() {
            self
        } else {
            Self(self.0 + 1)
        }
    }

    pub fn is_last(self) -> bool {
        self == Self::LAST
    }

    /// All doors in order
    pub fn all() -> impl Iterator<Item = DoorId> {
        (Self::FIRST.0..=Self::LAST.0).map(DoorId)
    }

    fn index(self) -> usize {
        (self.0 - 1) as usize
    }
}

impl Default for DoorId {
    fn default() -> Self {
        Self::FIRST
    }
}

impl TryFrom<u8> for DoorId {
    type Error = InvalidDoor;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value as i64)
    }
}

impl From<DoorId> for u8 {
    fn from(door: DoorId) -> Self {
        door.0
    }
}

impl fmt::Display for DoorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Hidden acceptance criterion for a door, plus its progressive hints
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DoorRule {
    /// Text description of what the door accepts
    pub law: String,

    /// Hints, from vague to explicit
    #[serde(default)]
    pub clues: Vec<String>,
}

impl DoorRule {
    pub fn new(law: impl Into<String>, clues: [&str; CLUES_PER_RULE]) -> Self {
        Self {
            law: law.into(),
            clues: clues.iter().map(|c| c.to_string()).collect(),
        }
    }
}

/// Response body of `GET /get_rules`
#[derive(Debug, Clone, Deserialize)]
pub struct RulesResponse {
    pub doors: Vec<DoorRule>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuleBookError {
    #[error("Expected {expected} door rules, got {actual}")]
    WrongDoorCount { expected: usize, actual: usize },

    #[error("Door {door} has an empty law")]
    EmptyLaw { door: usize },

    #[error("Door {door} has {actual} clues, expected {expected}")]
    WrongClueCount {
        door: usize,
        actual: usize,
        expected: usize,
    },
}

/// Exactly one rule per door, immutable once built
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleBook {
    rules: Vec<DoorRule>,
}

impl RuleBook {
    /// Validate a list of rules (ordered by door)
    pub fn from_doors(doors: Vec<DoorRule>) -> Result<Self, RuleBookError> {
        let expected = DoorId::LAST.get() as usize;
        if doors.len() != expected {
            return Err(RuleBookError::WrongDoorCount {
                expected,
                actual: doors.len(),
            });
        }

        for (i, rule) in doors.iter().enumerate() {
            if rule.law.trim().is_empty() {
                return Err(RuleBookError::EmptyLaw { door: i + 1 });
            }
            if rule.clues.len() != CLUES_PER_RULE {
                return Err(RuleBookError::WrongClueCount {
                    door: i + 1,
                    actual: rule.clues.len(),
                    expected: CLUES_PER_RULE,
                });
            }
        }

        Ok(Self { rules: doors })
    }

    /// Validate, falling back to the hardcoded book on failure
    pub fn from_doors_or_default(doors: Vec<DoorRule>) -> Self {
        Self::from_response(Ok::<_, RuleBookError>(doors)).0
    }

    /// Build from the result of fetching rules. The flag is true when the
    /// service's own rules were used.
    pub fn from_response<E: fmt::Display>(response: Result<Vec<DoorRule>, E>) -> (Self, bool) {
        let doors = match response {
            Ok(doors) => doors,
            Err(e) => {
                warn!(error = %e, "Failed to fetch rules, using defaults");
                return (Self::defaults(), false);
            }
        };

        match Self::from_doors(doors) {
            Ok(book) => (book, true),
            Err(e) => {
                warn!(error = %e, "Rejected rules from service, using defaults");
                (Self::defaults(), false)
            }
        }
    }

    /// Hardcoded rules used when the service is unreachable
    pub fn defaults() -> Self {
        Self {
            rules: vec![
                DoorRule::new(
                    "The object must be red.",
                    [
                        "This door has a hot temper.",
                        "Think of fire trucks, roses and ripe tomatoes.",
                        "Wish for anything that is red.",
                    ],
                ),
                DoorRule::new(
                    "The object must be something you can eat.",
                    [
                        "This door has been waiting a long time for dinner.",
                        "Your stomach might know the answer.",
                        "Wish for food.",
                    ],
                ),
                DoorRule::new(
                    "The object must be bigger than the door itself.",
                    [
                        "This door respects only what towers over it.",
                        "Size matters here. Think enormous.",
                        "Wish for something giant.",
                    ],
                ),
            ],
        }
    }

    pub fn rule(&self, door: DoorId) -> &DoorRule {
        &self.rules[door.index()]
    }

    /// The `door_rules` form field: "Door N Law: <law>"
    pub fn law_text(&self, door: DoorId) -> String {
        format!("Door {} Law: {}", door, self.rule(door).law)
    }

    pub fn iter(&self) -> impl Iterator<Item = (DoorId, &DoorRule)> {
        DoorId::all().zip(self.rules.iter())
    }
}

impl Default for RuleBook {
    fn default() -> Self {
        Self::defaults()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule(law: &str, clues: usize) -> DoorRule {
        DoorRule {
            law: law.to_string(),
            clues: (0..clues).map(|i| format!("clue {}", i)).collect(),
        }
    }

    #[test]
    fn test_door_id_bounds() {
        assert!(DoorId::new(0).is_err());
        assert!(DoorId::new(4).is_err());
        assert_eq!(DoorId::new(2).unwrap().get(), 2);
    }

    #[test]
    fn test_door_advance_saturates() {
        let door = DoorId::FIRST;
        assert_eq!(door.advance().get(), 2);
        assert_eq!(door.advance().advance().get(), 3);
        assert_eq!(DoorId::LAST.advance(), DoorId::LAST);
    }

    #[test]
    fn test_door_id_deserialize_rejects_out_of_range() {
        assert!(serde_json::from_str::<DoorId>("3").is_ok());
        assert!(serde_json::from_str::<DoorId>("7").is_err());
    }

    #[test]
    fn test_parse_rules_response() {
        let json = r#"{
            "doors": [
                {"law": "must be red", "clues": ["a", "b", "c"]},
                {"law": "must be edible", "clues": ["d", "e", "f"]},
                {"law": "must be huge", "clues": ["g", "h", "i"]}
            ]
        }"#;
        let response: RulesResponse = serde_json::from_str(json).unwrap();
        let book = RuleBook::from_doors(response.doors).unwrap();

        for (door, rule) in book.iter() {
            assert!(!rule.law.is_empty(), "door {} has empty law", door);
            assert_eq!(rule.clues.len(), CLUES_PER_RULE);
        }
        assert_eq!(book.law_text(DoorId::FIRST), "Door 1 Law: must be red");
    }

    #[test]
    fn test_rejects_wrong_door_count() {
        let result = RuleBook::from_doors(vec![rule("a", 3), rule("b", 3)]);
        assert!(matches!(
            result,
            Err(RuleBookError::WrongDoorCount { actual: 2, .. })
        ));
    }

    #[test]
    fn test_rejects_bad_rules() {
        let empty_law = RuleBook::from_doors(vec![rule("a", 3), rule("  ", 3), rule("c", 3)]);
        assert_eq!(empty_law, Err(RuleBookError::EmptyLaw { door: 2 }));

        let short = RuleBook::from_doors(vec![rule("a", 3), rule("b", 3), rule("c", 2)]);
        assert!(matches!(
            short,
            Err(RuleBookError::WrongClueCount { door: 3, actual: 2, .. })
        ));
    }

    #[test]
    fn test_fallback_to_defaults() {
        let book = RuleBook::from_doors_or_default(vec![rule("only one", 3)]);
        assert_eq!(book, RuleBook::defaults());
    }

    #[test]
    fn test_from_response() {
        let doors = vec![rule("a", 3), rule("b", 3), rule("c", 3)];
        let (book, from_service) = RuleBook::from_response(Ok::<_, String>(doors));
        assert!(from_service);
        assert_eq!(book.rule(DoorId::LAST).law, "c");

        let (book, from_service) =
            RuleBook::from_response(Err::<Vec<DoorRule>, _>("connection refused"));
        assert!(!from_service);
        assert_eq!(book, RuleBook::defaults());

        let (book, from_service) = RuleBook::from_response(Ok::<_, String>(vec![rule("a", 1)]));
        assert!(!from_service);
        assert_eq!(book, RuleBook::defaults());
    }

    #[test]
    fn test_defaults_are_valid() {
        let defaults = RuleBook::defaults();
        let revalidated = RuleBook::from_doors(defaults.rules.clone()).unwrap();
        assert_eq!(revalidated, defaults);
    }
}
