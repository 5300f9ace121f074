//! Core game logic.
//!
//! This module contains:
//! - Session: active room, rule book and progress
//! - Interaction: the deferred door verdict state machine
//! - Orchestrator: wish submission, door sequences, hints and narration

pub mod interaction;
pub mod orchestrator;
pub mod session;

// Re-export commonly used types
pub use interaction::{ActionOutcome, Interaction, Phase, Proximity, Ranges, Vec3};
pub use orchestrator::{wish_fingerprint, Orchestrator, SubmitOutcome};
pub use session::{Progress, Session};
