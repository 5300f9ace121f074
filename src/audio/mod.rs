//! Audio in and out.
//!
//! - `capture`: bounded wish recording and WAV encoding
//! - `playback`: the single last-writer-wins narration channel

pub mod capture;
pub mod playback;

use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use tracing::info;

pub use capture::{CaptureError, Recorder, Utterance};
pub use playback::{AudioSink, NarrationChannel, NarrationClip, Playback, PlaybackOutcome};

/// Sink that only logs what would be played
#[derive(Debug, Default)]
pub struct LoggingSink;

#[async_trait]
impl AudioSink for LoggingSink {
    async fn play(&self, clip: NarrationClip) -> Result<Option<Duration>> {
        info!(source = %clip.source, bytes = clip.bytes.len(), subtitle = %clip.subtitle, "🔊 Narration");
        Ok(None)
    }

    async fn stop(&self) -> Result<()> {
        Ok(())
    }
}
