//! Client-side orchestration of a genie session.
//!
//! Coordinates wish recording and submission, verdict application, the
//! deferred door check, hints and narration. One `Orchestrator` is built per
//! session and shared as an `Arc` with whatever drives the frame loop.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::{Context, Result};
use sha2::{Digest, Sha256};
use tokio::sync::{mpsc, Mutex, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, instrument, warn};

use crate::adapters::{GenieBackend, WishRequest};
use crate::audio::{AudioSink, NarrationChannel, NarrationClip, Playback, PlaybackOutcome, Recorder};
use crate::config::GameSettings;
use crate::domain::{
    DoorId, Hint, ObjectId, PendingObject, RuleBook, SessionEvent, SessionEventKind, WishVerdict,
};
use crate::scene::{AssetCatalog, Scene};

use super::interaction::{ActionOutcome, Interaction, Phase, Proximity, Ranges, Vec3};
use super::session::{Progress, Session};

/// Result of handing a wish to the service
#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    /// The genie answered; `object` is set when something was spawned
    Granted {
        verdict: WishVerdict,
        object: Option<ObjectId>,
    },
    /// Another wish is still in flight
    Busy,
    /// The recording held no audio
    Empty,
}

/// Short, stable identifier for a submitted wish (door + audio)
pub fn wish_fingerprint(door: DoorId, audio: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update([door.get()]);
    hasher.update(audio);
    hex::encode(hasher.finalize())[..12].to_string()
}

/// Clears the in-flight flag when the submission ends, however it ends
struct SubmissionGuard<'a>(&'a AtomicBool);

impl<'a> SubmissionGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for SubmissionGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Main session orchestrator
pub struct Orchestrator {
    backend: Arc<dyn GenieBackend>,
    scene: Arc<dyn Scene>,
    catalog: AssetCatalog,
    narration: NarrationChannel,
    settings: GameSettings,
    session: RwLock<Session>,
    interaction: Mutex<Interaction>,
    recorder: Mutex<Recorder>,
    submitting: AtomicBool,
    sequence: Mutex<Option<JoinHandle<()>>>,
    events: mpsc::UnboundedSender<SessionEvent>,
}

impl Orchestrator {
    /// Build a session, loading the asset catalog named in `settings`
    pub async fn start(
        backend: Arc<dyn GenieBackend>,
        scene: Arc<dyn Scene>,
        sink: Arc<dyn AudioSink>,
        settings: GameSettings,
    ) -> Result<(Arc<Self>, mpsc::UnboundedReceiver<SessionEvent>)> {
        let catalog = match settings.assets {
            Some(ref path) => AssetCatalog::load(path)
                .with_context(|| format!("Failed to load asset catalog: {}", path.display()))?,
            None => AssetCatalog::default(),
        };
        Ok(Self::start_with_catalog(backend, scene, sink, catalog, settings).await)
    }

    /// Build a session with an explicit catalog. Rules are fetched once here.
    pub async fn start_with_catalog(
        backend: Arc<dyn GenieBackend>,
        scene: Arc<dyn Scene>,
        sink: Arc<dyn AudioSink>,
        catalog: AssetCatalog,
        settings: GameSettings,
    ) -> (Arc<Self>, mpsc::UnboundedReceiver<SessionEvent>) {
        let (events, rx) = mpsc::unbounded_channel();

        let session = Session::load(backend.as_ref()).await;
        let from_service = session.rules_from_service();

        let orchestrator = Arc::new(Self {
            narration: NarrationChannel::new(sink, settings.narration_fallback()),
            recorder: Mutex::new(Recorder::new(
                settings.recording_length_secs,
                settings.sample_rate,
                settings.channels,
            )),
            backend,
            scene,
            catalog,
            settings,
            session: RwLock::new(session),
            interaction: Mutex::new(Interaction::new()),
            submitting: AtomicBool::new(false),
            sequence: Mutex::new(None),
            events,
        });

        orchestrator.emit(SessionEventKind::RulesLoaded { from_service });
        (orchestrator, rx)
    }

    fn emit(&self, kind: SessionEventKind) {
        // Nobody listening is fine
        let _ = self.events.send(SessionEvent::new(kind));
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    pub async fn door(&self) -> DoorId {
        self.session.read().await.door()
    }

    pub async fn rules(&self) -> RuleBook {
        self.session.read().await.rules().clone()
    }

    pub async fn escaped(&self) -> bool {
        self.session.read().await.escaped()
    }

    pub fn is_submitting(&self) -> bool {
        self.submitting.load(Ordering::Acquire)
    }

    pub async fn phase(&self) -> Phase {
        self.interaction.lock().await.phase(self.is_submitting())
    }

    pub async fn held_object(&self) -> Option<PendingObject> {
        self.interaction.lock().await.held().cloned()
    }

    pub async fn object(&self, id: ObjectId) -> Option<PendingObject> {
        self.interaction.lock().await.get(id).cloned()
    }

    /// Objects lying around that can be picked up
    pub async fn pickupable_objects(&self) -> Vec<ObjectId> {
        self.interaction
            .lock()
            .await
            .objects()
            .filter(|o| o.is_pickupable())
            .map(|o| o.id)
            .collect()
    }

    /// Proximity from world positions, using the configured ranges
    pub async fn resolve_proximity(
        &self,
        player: Vec3,
        door: Option<Vec3>,
        objects: &[(ObjectId, Vec3)],
    ) -> Proximity {
        let ranges = Ranges {
            pickup: self.settings.pickup_range,
            door: self.settings.door_range,
        };
        self.interaction
            .lock()
            .await
            .resolve_proximity(player, door, objects, ranges)
    }

    // ------------------------------------------------------------------
    // Recording and submission
    // ------------------------------------------------------------------

    /// Start recording a wish. Returns false if already recording.
    pub async fn begin_recording(&self) -> bool {
        self.recorder.lock().await.start()
    }

    pub async fn push_audio(&self, samples: &[f32]) {
        self.recorder.lock().await.push(samples);
    }

    /// Stop recording and send whatever was captured
    pub async fn finish_recording(self: &Arc<Self>) -> Result<SubmitOutcome> {
        let utterance = self.recorder.lock().await.stop();
        let Some(utterance) = utterance else {
            return Ok(SubmitOutcome::Empty);
        };

        let wav = utterance.to_wav().context("Failed to encode wish")?;
        self.submit_wish(wav).await
    }

    /// Send an encoded wish and apply the verdict.
    ///
    /// Only one submission is in flight at a time. Failures are reported as
    /// `WishFailed` and returned; there is no retry, the player can simply
    /// wish again.
    #[instrument(skip(self, wav), fields(bytes = wav.len()))]
    pub async fn submit_wish(self: &Arc<Self>, wav: Vec<u8>) -> Result<SubmitOutcome> {
        let Some(_guard) = SubmissionGuard::acquire(&self.submitting) else {
            warn!("Wish ignored, another one is in flight");
            self.emit(SessionEventKind::WishIgnored);
            return Ok(SubmitOutcome::Busy);
        };

        let (door, door_rules) = {
            let session = self.session.read().await;
            (session.door(), session.active_law())
        };

        let fingerprint = wish_fingerprint(door, &wav);
        info!(%door, %fingerprint, "Sending wish to the genie");
        self.emit(SessionEventKind::WishSubmitted {
            door,
            fingerprint: fingerprint.clone(),
        });

        let request = WishRequest {
            door,
            door_rules,
            audio: wav,
        };

        let verdict = match self.backend.process_wish(request).await {
            Ok(verdict) => verdict,
            Err(e) => {
                error!(%door, %fingerprint, error = %e, "Wish failed");
                self.emit(SessionEventKind::WishFailed {
                    door,
                    reason: e.to_string(),
                });
                return Err(e).context("Wish submission failed");
            }
        };

        info!(
            object = %verdict.object_name,
            door_open = verdict.door_open,
            "Genie answered"
        );

        let object = self.apply_verdict(door, &verdict).await;
        Ok(SubmitOutcome::Granted { verdict, object })
    }

    /// Spawn and decorate the conjured object and start the drop narration.
    /// The door itself is left alone.
    async fn apply_verdict(self: &Arc<Self>, door: DoorId, verdict: &WishVerdict) -> Option<ObjectId> {
        let spawned = match verdict.object_kind() {
            Ok(Some(kind)) => {
                let object = PendingObject::new(kind, verdict.label(), door, verdict);
                let id = object.id;

                self.scene.spawn(id, self.catalog.object(kind), &object.label);
                if let Some(color) = verdict.color() {
                    self.scene.recolor(id, color);
                }
                if let Some(factor) = verdict.scale_factor() {
                    self.scene.rescale(id, factor);
                }
                if let Some(vfx) = self.catalog.vfx(verdict.vfx()) {
                    self.scene.attach_vfx(id, vfx);
                }

                self.emit(SessionEventKind::ObjectSpawned {
                    object: id,
                    kind,
                    label: object.label.clone(),
                });
                self.interaction.lock().await.register(object);
                Some(id)
            }
            Ok(None) => {
                debug!("Verdict named no object");
                None
            }
            Err(e) => {
                warn!(error = %e, "Cannot spawn conjured object");
                self.emit(SessionEventKind::ObjectUnavailable {
                    name: verdict.object_name.clone(),
                });
                None
            }
        };

        self.spawn_narration(verdict.audio_url_drop.clone(), verdict.drop_voice.clone());
        spawned
    }

    // ------------------------------------------------------------------
    // Action input
    // ------------------------------------------------------------------

    /// Handle one press of the action input.
    ///
    /// An accepted object opens its door and advances the session before
    /// this returns; only the narration that follows runs in the background.
    pub async fn perform_action(self: &Arc<Self>, proximity: &Proximity) -> ActionOutcome {
        let mut session = self.session.write().await;
        if session.escaped() {
            debug!("Action input ignored, escape already complete");
            return ActionOutcome::NoOp;
        }
        let active = session.door();
        let outcome = self.interaction.lock().await.act(proximity, active);

        let progress = match &outcome {
            ActionOutcome::UsedSuccessfully(object) => {
                self.scene.destroy(object.id);
                self.scene.open_door(object.door);
                session.record_opened(object.door)
            }
            _ => None,
        };
        drop(session);

        match &outcome {
            ActionOutcome::PickedUp(id) => {
                info!(object = %id.short(), "🤚 Picked up");
                self.emit(SessionEventKind::ObjectPickedUp { object: *id });
            }
            ActionOutcome::Dropped(id) => {
                info!(object = %id.short(), "📦 Dropped");
                self.emit(SessionEventKind::ObjectDropped { object: *id });
            }
            ActionOutcome::UsedSuccessfully(object) => {
                let door = object.door;
                info!(object = %object.id.short(), %door, "Door accepted the object");
                self.emit(SessionEventKind::DoorOpened { door });

                match progress {
                    Some(Progress::Advanced(next)) => {
                        info!(door = %next, "Entering next room");
                        self.emit(SessionEventKind::RoomAdvanced { door: next });
                    }
                    Some(Progress::Finished) => {
                        info!("Final door opened");
                        self.emit(SessionEventKind::EscapeCompleted);
                    }
                    None => warn!(%door, "Door progress already recorded"),
                }

                self.start_door_sequence(door, object.clone()).await;
            }
            ActionOutcome::UsedAndRejected(id) => {
                info!(object = %id.short(), door = %active, "Door rejected the object");
                self.emit(SessionEventKind::ObjectRejected {
                    object: *id,
                    door: active,
                });

                let line = self
                    .object(*id)
                    .await
                    .map(|o| (o.verdict().audio_url_congrats.clone(), o.verdict().congrats_voice.clone()));
                if let Some((url, subtitle)) = line {
                    self.spawn_narration(url, subtitle);
                }
            }
            ActionOutcome::NoOp => debug!("Action input ignored"),
        }

        outcome
    }

    /// Forget an object the engine removed on its own
    pub async fn object_despawned(&self, id: ObjectId) -> Option<PendingObject> {
        let removed = self.interaction.lock().await.remove(id);
        if removed.is_some() {
            debug!(object = %id.short(), "Object left the scene");
        }
        removed
    }

    /// Run the narration that follows an opened door, superseding any
    /// sequence still running
    async fn start_door_sequence(self: &Arc<Self>, door: DoorId, object: PendingObject) {
        let mut sequence = self.sequence.lock().await;
        if let Some(previous) = sequence.take() {
            if !previous.is_finished() {
                debug!("Cancelling previous door sequence");
                previous.abort();
            }
        }

        let this = Arc::clone(self);
        *sequence = Some(tokio::spawn(async move {
            this.run_door_sequence(door, object).await
        }));
    }

    /// Congratulations, then the next room's introduction. Door state is
    /// already settled, so aborting this only cuts narration short.
    #[instrument(skip(self, object), fields(object = %object.id.short()))]
    async fn run_door_sequence(self: Arc<Self>, door: DoorId, object: PendingObject) {
        let verdict = object.verdict();
        let playback = self
            .start_narration(&verdict.audio_url_congrats, &verdict.congrats_voice)
            .await;

        // Let the congratulations finish before moving on
        match playback {
            Some(playback) => {
                self.finish_narration(playback).await;
            }
            None => tokio::time::sleep(self.settings.narration_fallback()).await,
        }

        self.play_room_transition(door).await;
    }

    async fn play_room_transition(&self, door: DoorId) {
        match self.backend.room_transition(door).await {
            Ok(narration) => {
                if let Some(playback) = self
                    .start_narration(&narration.audio_url, &narration.subtitle)
                    .await
                {
                    self.finish_narration(playback).await;
                }
            }
            Err(e) => warn!(%door, error = %e, "Failed to fetch room transition"),
        }
    }

    /// Abort any running door sequence
    pub async fn cancel_sequences(&self) {
        if let Some(handle) = self.sequence.lock().await.take() {
            handle.abort();
        }
    }

    /// Wait for the current door sequence, if any, to run to completion
    pub async fn wait_for_sequence(&self) {
        let handle = self.sequence.lock().await.take();
        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                if !e.is_cancelled() {
                    error!(error = %e, "Door sequence panicked");
                }
            }
        }
    }

    // ------------------------------------------------------------------
    // Hints, intro, narration
    // ------------------------------------------------------------------

    /// Fetch the next hint for the active door and narrate it
    #[instrument(skip(self))]
    pub async fn request_hint(self: &Arc<Self>) -> Result<Hint> {
        let door = self.door().await;

        let hint = match self.backend.get_hint(door).await {
            Ok(hint) => hint,
            Err(e) => {
                warn!(%door, error = %e, "Failed to fetch hint");
                return Err(e).context("Hint request failed");
            }
        };

        info!(%door, level = hint.hint_level, remaining = hint.hints_remaining, "💡 Hint");
        self.emit(SessionEventKind::HintReceived {
            door,
            hint: hint.hint.clone(),
            level: hint.hint_level,
            remaining: hint.hints_remaining,
        });
        self.spawn_narration(hint.audio_url.clone(), hint.hint.clone());

        Ok(hint)
    }

    /// Play the genie's opening monologue to the end
    #[instrument(skip(self))]
    pub async fn play_intro(&self) -> Result<()> {
        let intro = self.backend.intro().await.context("Failed to fetch intro")?;
        if let Some(playback) = self.start_narration(&intro.audio_url, &intro.subtitle).await {
            self.finish_narration(playback).await;
        }
        Ok(())
    }

    /// Narrate in the background
    fn spawn_narration(self: &Arc<Self>, path: String, subtitle: String) {
        if path.trim().is_empty() {
            return;
        }
        let this = Arc::clone(self);
        tokio::spawn(async move {
            if let Some(playback) = this.start_narration(&path, &subtitle).await {
                this.finish_narration(playback).await;
            }
        });
    }

    /// Fetch a narrated line and put it on the channel.
    ///
    /// Failures are logged and swallowed; narration is never critical.
    async fn start_narration(&self, path: &str, subtitle: &str) -> Option<Playback> {
        if path.trim().is_empty() {
            return None;
        }

        let bytes = match self.backend.fetch_audio(path).await {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!(%path, error = %e, "Failed to load narration");
                return None;
            }
        };

        let clip = NarrationClip {
            source: path.to_string(),
            subtitle: subtitle.to_string(),
            bytes,
        };

        match self.narration.play(clip).await {
            Ok(playback) => {
                self.emit(SessionEventKind::NarrationStarted {
                    subtitle: subtitle.to_string(),
                });
                Some(playback)
            }
            Err(e) => {
                warn!(%path, error = %e, "Failed to play narration");
                None
            }
        }
    }

    async fn finish_narration(&self, playback: Playback) -> PlaybackOutcome {
        let outcome = playback.finished().await;
        self.emit(SessionEventKind::NarrationFinished {
            interrupted: outcome == PlaybackOutcome::Interrupted,
        });
        outcome
    }
}
