//! Adapter interfaces for the genie service.
//!
//! The genie's reasoning (speech understanding, rule evaluation, voice
//! synthesis) lives in a remote service. Adapters give the rest of the crate
//! one interface to it, whatever the transport.

pub mod http;

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::{DoorId, DoorRule, Hint, Narration, WishVerdict};

// Re-export the HTTP adapter
pub use http::HttpBackend;

/// Errors from talking to the genie service
#[derive(Debug, Error)]
pub enum BackendError {
    /// Connection refused, timeout, or any other transport failure
    #[error("Transport error on {endpoint}: {source}")]
    Transport {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },

    /// The service answered with a non-2xx status
    #[error("{endpoint} returned {status}: {body}")]
    Status {
        endpoint: String,
        status: u16,
        body: String,
    },

    /// The response body could not be parsed
    #[error("Malformed response from {endpoint}: {source}")]
    Decode {
        endpoint: String,
        #[source]
        source: serde_json::Error,
    },

    /// The backend cannot serve requests right now
    #[error("Backend unavailable: {0}")]
    Unavailable(String),
}

/// A wish ready to be sent
#[derive(Debug, Clone)]
pub struct WishRequest {
    /// Active door, 1-based
    pub door: DoorId,

    /// "Door N Law: <law>" for the active door
    pub door_rules: String,

    /// WAV-encoded utterance
    pub audio: Vec<u8>,
}

/// The genie service, one method per endpoint
#[async_trait]
pub trait GenieBackend: Send + Sync {
    /// Human-readable backend name
    fn name(&self) -> &str;

    /// `GET /get_rules`
    async fn get_rules(&self) -> Result<Vec<DoorRule>, BackendError>;

    /// `POST /process_wish`
    async fn process_wish(&self, request: WishRequest) -> Result<WishVerdict, BackendError>;

    /// `GET /room_transition?door_id=N`
    async fn room_transition(&self, door: DoorId) -> Result<Narration, BackendError>;

    /// `GET /get_hint?door_id=N`. Each call advances the hint level server-side.
    async fn get_hint(&self, door: DoorId) -> Result<Hint, BackendError>;

    /// `GET /intro`
    async fn intro(&self) -> Result<Narration, BackendError>;

    /// Download narrated audio referenced by an `audio_url*` field
    async fn fetch_audio(&self, path: &str) -> Result<Vec<u8>, BackendError>;
}
