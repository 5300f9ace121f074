//! Wish recording.
//!
//! Mirrors a non-looping microphone clip: a buffer sized for the maximum
//! recording length, filled until the player stops talking, then trimmed to
//! what was actually captured.

use std::io::Cursor;
use std::path::Path;
use std::time::Duration;

use hound::{SampleFormat, WavReader, WavSpec, WavWriter};
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("WAV error: {0}")]
    Wav(#[from] hound::Error),

    #[error("Unsupported WAV layout: {0}")]
    Unsupported(String),
}

/// Bounded capture buffer for one wish at a time
#[derive(Debug)]
pub struct Recorder {
    sample_rate: u32,
    channels: u16,
    capacity: usize,
    buffer: Vec<f32>,
    recording: bool,
}

impl Recorder {
    pub fn new(max_seconds: u32, sample_rate: u32, channels: u16) -> Self {
        let channels = channels.max(1);
        let capacity = max_seconds as usize * sample_rate as usize * channels as usize;
        Self {
            sample_rate,
            channels,
            capacity,
            buffer: Vec::new(),
            recording: false,
        }
    }

    pub fn is_recording(&self) -> bool {
        self.recording
    }

    /// Maximum number of interleaved samples one recording can hold
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Begin a recording. Returns false if one is already running.
    pub fn start(&mut self) -> bool {
        if self.recording {
            return false;
        }
        self.buffer.clear();
        self.buffer.reserve(self.capacity);
        self.recording = true;
        info!("Recording wish");
        true
    }

    /// Append interleaved samples. Anything past the capacity is dropped.
    pub fn push(&mut self, samples: &[f32]) {
        if !self.recording {
            return;
        }
        let room = self.capacity.saturating_sub(self.buffer.len());
        if samples.len() > room {
            debug!(dropped = samples.len() - room, "Recording buffer full");
        }
        self.buffer.extend_from_slice(&samples[..samples.len().min(room)]);
    }

    /// End the recording, trimmed to the captured frames
    pub fn stop(&mut self) -> Option<Utterance> {
        if !self.recording {
            return None;
        }
        self.recording = false;

        // Drop any trailing partial frame
        let frames = self.buffer.len() / self.channels as usize;
        if frames == 0 {
            warn!("Recording was empty");
            return None;
        }

        let mut samples = std::mem::take(&mut self.buffer);
        samples.truncate(frames * self.channels as usize);

        let utterance = Utterance {
            samples,
            channels: self.channels,
            sample_rate: self.sample_rate,
        };
        info!(seconds = utterance.duration().as_secs_f32(), "Recorded wish");
        Some(utterance)
    }
}

/// A trimmed recording, interleaved f32 samples in [-1, 1]
#[derive(Debug, Clone, PartialEq)]
pub struct Utterance {
    pub samples: Vec<f32>,
    pub channels: u16,
    pub sample_rate: u32,
}

impl Utterance {
    pub fn frames(&self) -> usize {
        self.samples.len() / self.channels.max(1) as usize
    }

    pub fn duration(&self) -> Duration {
        if self.sample_rate == 0 {
            return Duration::ZERO;
        }
        Duration::from_secs_f64(self.frames() as f64 / self.sample_rate as f64)
    }

    /// Encode as a 16-bit PCM WAV container
    pub fn to_wav(&self) -> Result<Vec<u8>, CaptureError> {
        let spec = WavSpec {
            channels: self.channels,
            sample_rate: self.sample_rate,
            bits_per_sample: 16,
            sample_format: SampleFormat::Int,
        };

        let mut cursor = Cursor::new(Vec::with_capacity(44 + self.samples.len() * 2));
        {
            let mut writer = WavWriter::new(&mut cursor, spec)?;
            for sample in &self.samples {
                writer.write_sample((sample.clamp(-1.0, 1.0) * i16::MAX as f32) as i16)?;
            }
            writer.finalize()?;
        }
        Ok(cursor.into_inner())
    }

    /// Load a WAV file as if it had been spoken into the microphone
    pub fn from_wav_file(path: &Path) -> Result<Self, CaptureError> {
        let reader = WavReader::open(path)?;
        Self::from_reader(reader)
    }

    /// Decode WAV bytes
    pub fn from_wav_bytes(bytes: &[u8]) -> Result<Self, CaptureError> {
        let reader = WavReader::new(Cursor::new(bytes))?;
        Self::from_reader(reader)
    }

    fn from_reader<R: std::io::Read>(mut reader: WavReader<R>) -> Result<Self, CaptureError> {
        let spec = reader.spec();

        let samples = match spec.sample_format {
            SampleFormat::Float => reader.samples::<f32>().collect::<Result<Vec<_>, _>>()?,
            SampleFormat::Int if (8..=32).contains(&spec.bits_per_sample) => {
                let max = ((1_i64 << (spec.bits_per_sample - 1)) - 1) as f32;
                reader
                    .samples::<i32>()
                    .map(|s| s.map(|v| v as f32 / max))
                    .collect::<Result<Vec<_>, _>>()?
            }
            SampleFormat::Int => {
                return Err(CaptureError::Unsupported(format!(
                    "{} bits per sample",
                    spec.bits_per_sample
                )))
            }
        };

        Ok(Self {
            samples,
            channels: spec.channels,
            sample_rate: spec.sample_rate,
        })
    }
}
