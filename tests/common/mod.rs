//! Shared fakes for session integration tests.

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use genie::adapters::{BackendError, GenieBackend, WishRequest};
use genie::audio::{AudioSink, NarrationClip};
use genie::config::GameSettings;
use genie::domain::{DoorId, DoorRule, Hint, Narration, ObjectId, Rgba, SessionEvent, SessionEventKind, WishVerdict};
use genie::scene::{AssetCatalog, AssetHandle, Scene};
use genie::Orchestrator;
use tokio::sync::mpsc;

/// Wish as the backend received it
#[derive(Debug, Clone)]
pub struct ReceivedWish {
    pub door: DoorId,
    pub door_rules: String,
    pub audio: Vec<u8>,
}

/// Backend answering from a script
#[derive(Default)]
pub struct ScriptedBackend {
    /// `None` makes `get_rules` fail
    pub rules: Option<Vec<DoorRule>>,
    /// Answers to successive wishes; an exhausted or `None` entry fails
    pub verdicts: Mutex<VecDeque<Option<WishVerdict>>>,
    pub wish_delay: Duration,
    pub wishes: Mutex<Vec<ReceivedWish>>,
    pub transitions: Mutex<Vec<DoorId>>,
    pub fetched: Mutex<Vec<String>>,
    pub hint_levels: Mutex<HashMap<u8, u32>>,
}

impl ScriptedBackend {
    pub fn new(verdicts: Vec<WishVerdict>) -> Self {
        Self {
            rules: Some(default_rules()),
            verdicts: Mutex::new(verdicts.into_iter().map(Some).collect()),
            ..Default::default()
        }
    }

    pub fn wishes(&self) -> Vec<ReceivedWish> {
        self.wishes.lock().unwrap().clone()
    }

    pub fn transitions(&self) -> Vec<DoorId> {
        self.transitions.lock().unwrap().clone()
    }

    pub fn fetched(&self) -> Vec<String> {
        self.fetched.lock().unwrap().clone()
    }
}

#[async_trait]
impl GenieBackend for ScriptedBackend {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn get_rules(&self) -> Result<Vec<DoorRule>, BackendError> {
        self.rules
            .clone()
            .ok_or_else(|| BackendError::Unavailable("no rules scripted".to_string()))
    }

    async fn process_wish(&self, request: WishRequest) -> Result<WishVerdict, BackendError> {
        self.wishes.lock().unwrap().push(ReceivedWish {
            door: request.door,
            door_rules: request.door_rules,
            audio: request.audio,
        });

        if !self.wish_delay.is_zero() {
            tokio::time::sleep(self.wish_delay).await;
        }

        self.verdicts
            .lock()
            .unwrap()
            .pop_front()
            .flatten()
            .ok_or_else(|| BackendError::Status {
                endpoint: "/process_wish".to_string(),
                status: 500,
                body: "genie is confused".to_string(),
            })
    }

    async fn room_transition(&self, door: DoorId) -> Result<Narration, BackendError> {
        self.transitions.lock().unwrap().push(door);
        Ok(Narration {
            audio_url: format!("/audio/transition_{}.mp3", door),
            subtitle: format!("Welcome past door {}", door),
        })
    }

    async fn get_hint(&self, door: DoorId) -> Result<Hint, BackendError> {
        let mut levels = self.hint_levels.lock().unwrap();
        let level = levels.entry(door.get()).or_insert(0);
        *level = (*level + 1).min(3);
        Ok(Hint {
            hint: format!("Hint {} for door {}", level, door),
            audio_url: format!("/audio/hint_{}_{}.mp3", door, level),
            hint_level: *level,
            hints_remaining: 3 - *level,
        })
    }

    async fn intro(&self) -> Result<Narration, BackendError> {
        Ok(Narration {
            audio_url: "/audio/intro.mp3".to_string(),
            subtitle: "I am the genie".to_string(),
        })
    }

    async fn fetch_audio(&self, path: &str) -> Result<Vec<u8>, BackendError> {
        self.fetched.lock().unwrap().push(path.to_string());
        Ok(path.as_bytes().to_vec())
    }
}

pub fn default_rules() -> Vec<DoorRule> {
    vec![
        DoorRule::new("Must be red", ["warm", "blood", "fire"]),
        DoorRule::new("Must be edible", ["hungry", "taste", "kitchen"]),
        DoorRule::new("Must be bigger than the door", ["huge", "giant", "tall"]),
    ]
}

/// What the scene was asked to do
#[derive(Debug, Clone, PartialEq)]
pub enum SceneCall {
    Spawn { object: ObjectId, asset: String, label: String },
    Recolor(ObjectId, Rgba),
    Rescale(ObjectId, f32),
    Vfx(ObjectId, String),
    Destroy(ObjectId),
    OpenDoor(DoorId),
}

#[derive(Default)]
pub struct RecordingScene {
    calls: Mutex<Vec<SceneCall>>,
}

impl RecordingScene {
    pub fn calls(&self) -> Vec<SceneCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn opened_doors(&self) -> Vec<DoorId> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                SceneCall::OpenDoor(door) => Some(door),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: SceneCall) {
        self.calls.lock().unwrap().push(call);
    }
}

impl Scene for RecordingScene {
    fn spawn(&self, object: ObjectId, asset: &AssetHandle, label: &str) {
        self.record(SceneCall::Spawn {
            object,
            asset: asset.0.clone(),
            label: label.to_string(),
        });
    }

    fn recolor(&self, object: ObjectId, color: Rgba) {
        self.record(SceneCall::Recolor(object, color));
    }

    fn rescale(&self, object: ObjectId, factor: f32) {
        self.record(SceneCall::Rescale(object, factor));
    }

    fn attach_vfx(&self, object: ObjectId, vfx: &AssetHandle) {
        self.record(SceneCall::Vfx(object, vfx.0.clone()));
    }

    fn destroy(&self, object: ObjectId) {
        self.record(SceneCall::Destroy(object));
    }

    fn open_door(&self, door: DoorId) {
        self.record(SceneCall::OpenDoor(door));
    }
}

/// Sink whose clips all last the same time
pub struct TimedSink(pub Duration);

#[async_trait]
impl AudioSink for TimedSink {
    async fn play(&self, _clip: NarrationClip) -> anyhow::Result<Option<Duration>> {
        Ok(Some(self.0))
    }

    async fn stop(&self) -> anyhow::Result<()> {
        Ok(())
    }
}

pub fn settings() -> GameSettings {
    GameSettings {
        narration_fallback_secs: 0.01,
        sample_rate: 16_000,
        recording_length_secs: 1,
        ..Default::default()
    }
}

pub struct Harness {
    pub game: Arc<Orchestrator>,
    pub events: mpsc::UnboundedReceiver<SessionEvent>,
    pub backend: Arc<ScriptedBackend>,
    pub scene: Arc<RecordingScene>,
}

impl Harness {
    pub async fn start(backend: ScriptedBackend) -> Self {
        Self::start_with_clip(backend, Duration::from_millis(5)).await
    }

    /// Start with every narration clip lasting `clip`
    pub async fn start_with_clip(backend: ScriptedBackend, clip: Duration) -> Self {
        let backend = Arc::new(backend);
        let scene = Arc::new(RecordingScene::default());
        let (game, events) = Orchestrator::start_with_catalog(
            backend.clone(),
            scene.clone(),
            Arc::new(TimedSink(clip)),
            AssetCatalog::default(),
            settings(),
        )
        .await;

        Self {
            game,
            events,
            backend,
            scene,
        }
    }

    /// Every event emitted so far
    pub fn drain_events(&mut self) -> Vec<SessionEventKind> {
        let mut kinds = Vec::new();
        while let Ok(event) = self.events.try_recv() {
            kinds.push(event.kind);
        }
        kinds
    }
}

pub fn verdict(object: &str, door_open: bool) -> WishVerdict {
    WishVerdict {
        object_name: object.to_string(),
        display_name: object.to_string(),
        door_open,
        drop_voice: format!("Behold, a {}!", object),
        congrats_voice: if door_open {
            "The door yields!".to_string()
        } else {
            "The door does not care for that.".to_string()
        },
        audio_url_drop: format!("/audio/drop_{}.mp3", object),
        audio_url_congrats: format!("/audio/congrats_{}.mp3", object),
        ..Default::default()
    }
}

pub fn fake_wav() -> Vec<u8> {
    b"RIFF....WAVEfake".to_vec()
}
