//! genie - client for a voice-driven escape room
//!
//! The player speaks a wish, a remote genie service decides what to conjure
//! and whether it satisfies the active door's hidden law, and the client
//! turns that verdict into objects in the scene. The door's answer is
//! deferred: it is only revealed when the player carries the object to the
//! door and uses it.
//!
//! # Architecture
//!
//! - One wish in flight at a time; a verdict spawns at most one object
//! - Each object carries its own door verdict until it is used
//! - Narration shares a single last-writer-wins output channel
//! - The service, the scene and the audio device are traits, so the whole
//!   session runs headless in tests
//!
//! # Modules
//!
//! - `adapters`: Genie service integration (HTTP)
//! - `audio`: Wish capture and narration playback
//! - `core`: Session, interaction state machine, orchestrator
//! - `domain`: Data structures (rules, verdicts, objects, events)
//! - `scene`: Engine-facing scene trait and asset catalog
//! - `cli`: Command-line interface
//!
//! # Usage
//!
//! ```bash
//! # Show the door laws
//! genie rules
//!
//! # Send a single wish
//! genie wish sword.wav --door 1
//!
//! # Play a session from stdin
//! genie play
//! ```

pub mod adapters;
pub mod audio;
pub mod cli;
pub mod config;
pub mod core;
pub mod domain;
pub mod scene;

// Re-export main types at crate root for convenience
pub use adapters::{BackendError, GenieBackend, HttpBackend, WishRequest};
pub use audio::{AudioSink, NarrationChannel, Recorder, Utterance};
pub use core::{ActionOutcome, Orchestrator, Phase, Proximity, SubmitOutcome};
pub use domain::{DoorId, ObjectKind, PendingObject, RuleBook, SessionEvent, SessionEventKind, WishVerdict};
pub use scene::{AssetCatalog, Scene};
