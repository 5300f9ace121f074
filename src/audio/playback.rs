//! The single narration output channel.
//!
//! Last writer wins: starting a clip replaces whatever was playing, and the
//! replaced clip's [`Playback`] resolves as interrupted. Completion is driven
//! by the clip's real duration when the sink knows it.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::watch;
use tracing::debug;

/// A narrated line ready for output
#[derive(Debug, Clone)]
pub struct NarrationClip {
    /// Where the audio came from (for logs)
    pub source: String,

    /// Subtitle text, possibly empty
    pub subtitle: String,

    /// Compressed audio as served
    pub bytes: Vec<u8>,
}

/// Audio output device
#[async_trait]
pub trait AudioSink: Send + Sync {
    /// Start playing `clip`, replacing anything currently playing.
    ///
    /// Returns the clip's length if the sink can tell.
    async fn play(&self, clip: NarrationClip) -> Result<Option<Duration>>;

    /// Stop the current clip
    async fn stop(&self) -> Result<()>;
}

/// How a playback ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackOutcome {
    Finished,
    Interrupted,
}

/// Shared, unarbitrated narration channel
pub struct NarrationChannel {
    sink: Arc<dyn AudioSink>,
    generation: watch::Sender<u64>,
    fallback: Duration,
}

impl NarrationChannel {
    /// `fallback` stands in for the clip length when the sink cannot report it
    pub fn new(sink: Arc<dyn AudioSink>, fallback: Duration) -> Self {
        let (generation, _) = watch::channel(0);
        Self {
            sink,
            generation,
            fallback,
        }
    }

    /// Start a clip, cutting off the current one
    pub async fn play(&self, clip: NarrationClip) -> Result<Playback> {
        let mut generation = 0;
        self.generation.send_modify(|g| {
            *g += 1;
            generation = *g;
        });
        let changes = self.generation.subscribe();

        let source = clip.source.clone();
        let duration = self.sink.play(clip).await?.unwrap_or(self.fallback);
        debug!(%source, generation, ?duration, "Narration started");

        Ok(Playback {
            generation,
            changes,
            duration,
        })
    }

    /// Cut off whatever is playing
    pub async fn stop(&self) -> Result<()> {
        self.generation.send_modify(|g| *g += 1);
        self.sink.stop().await
    }
}

/// Handle to one clip on the channel
#[derive(Debug)]
pub struct Playback {
    generation: u64,
    changes: watch::Receiver<u64>,
    duration: Duration,
}

impl Playback {
    pub fn duration(&self) -> Duration {
        self.duration
    }

    /// Wait until the clip ends or something else takes the channel
    pub async fn finished(mut self) -> PlaybackOutcome {
        if *self.changes.borrow_and_update() != self.generation {
            return PlaybackOutcome::Interrupted;
        }

        let ended = tokio::time::sleep(self.duration);
        tokio::pin!(ended);

        loop {
            tokio::select! {
                _ = &mut ended => return PlaybackOutcome::Finished,
                changed = self.changes.changed() => {
                    if changed.is_err() || *self.changes.borrow_and_update() != self.generation {
                        return PlaybackOutcome::Interrupted;
                    }
                }
            }
        }
    }
}
