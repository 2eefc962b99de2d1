//! Deterministic scripted audio engine.

use async_trait::async_trait;
use bridge_traits::error::{BridgeError, Result};
use bridge_traits::playback::{
    AudioEngine, EngineNotification, EngineProgress, EngineState, EngineTrack, RemoteCommand,
};
use parking_lot::Mutex;
use tokio::sync::broadcast;
use tracing::trace;

const NOTIFICATION_CAPACITY: usize = 64;

/// Command observed by the scripted engine, in issue order.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineCommand {
    Reset,
    Add { track_id: String },
    Play,
    Pause,
    /// Raw seek target in seconds, before clamping.
    SeekTo(f64),
    SetRate(f32),
}

struct Inner {
    state: EngineState,
    track: Option<EngineTrack>,
    position: f64,
    duration: f64,
    rate: f32,
    commands: Vec<EngineCommand>,
    hold_loading: bool,
    transport_fails: bool,
}

/// Single-slot [`AudioEngine`] with scripted behavior.
///
/// The engine never advances position on its own; tests drive it with
/// [`advance`](Self::advance), [`complete_loading`](Self::complete_loading)
/// and [`remote`](Self::remote). Every command is recorded verbatim,
/// including out-of-range seek targets (which are clamped internally, the
/// way platform players do).
pub struct ScriptedAudioEngine {
    inner: Mutex<Inner>,
    notifications: broadcast::Sender<EngineNotification>,
}

impl Default for ScriptedAudioEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptedAudioEngine {
    pub fn new() -> Self {
        let (notifications, _) = broadcast::channel(NOTIFICATION_CAPACITY);
        Self {
            inner: Mutex::new(Inner {
                state: EngineState::None,
                track: None,
                position: 0.0,
                duration: 0.0,
                rate: 1.0,
                commands: Vec::new(),
                hold_loading: false,
                transport_fails: false,
            }),
            notifications,
        }
    }

    /// Keep newly added tracks in [`EngineState::Loading`] until
    /// [`complete_loading`](Self::complete_loading) is called.
    pub fn hold_loading(&self, hold: bool) {
        self.inner.lock().hold_loading = hold;
    }

    /// Make `play`/`pause` fail while queries keep working, to exercise
    /// optimistic-update correction paths.
    pub fn fail_transport(&self, fail: bool) {
        self.inner.lock().transport_fails = fail;
    }

    /// Finish a held load: `Loading` becomes `Ready`, `Buffering` (load
    /// with play intent) becomes `Playing`.
    pub fn complete_loading(&self) {
        let state = {
            let mut inner = self.inner.lock();
            inner.state = match inner.state {
                EngineState::Loading => EngineState::Ready,
                EngineState::Buffering => EngineState::Playing,
                other => other,
            };
            inner.state
        };
        self.emit(EngineNotification::StateChanged(state));
    }

    /// Advance the play head, clamped to the duration when one is known.
    pub fn advance(&self, seconds: f64) {
        let mut inner = self.inner.lock();
        let mut position = inner.position + seconds;
        if inner.duration > 0.0 {
            position = position.min(inner.duration);
        }
        inner.position = position.max(0.0);
    }

    /// Inject a remote transport-control notification, as the platform
    /// would for a lock-screen or headset button press.
    pub fn remote(&self, command: RemoteCommand) {
        self.emit(EngineNotification::Remote(command));
    }

    /// Commands issued so far, in order.
    pub fn commands(&self) -> Vec<EngineCommand> {
        self.inner.lock().commands.clone()
    }

    /// Raw seek targets issued so far, in order.
    pub fn seeks(&self) -> Vec<f64> {
        self.inner
            .lock()
            .commands
            .iter()
            .filter_map(|c| match c {
                EngineCommand::SeekTo(target) => Some(*target),
                _ => None,
            })
            .collect()
    }

    /// Id of the currently loaded track, if any.
    pub fn loaded_track_id(&self) -> Option<String> {
        self.inner.lock().track.as_ref().map(|t| t.id.clone())
    }

    /// Current playback rate as last set on the engine.
    pub fn rate(&self) -> f32 {
        self.inner.lock().rate
    }

    fn emit(&self, notification: EngineNotification) {
        trace!(?notification, "scripted engine notification");
        // No subscribers is fine; the notification is simply dropped.
        let _ = self.notifications.send(notification);
    }

    fn check_transport(inner: &Inner) -> Result<()> {
        if inner.transport_fails {
            Err(BridgeError::Engine("transport failure injected".into()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl AudioEngine for ScriptedAudioEngine {
    async fn reset(&self) -> Result<()> {
        {
            let mut inner = self.inner.lock();
            inner.commands.push(EngineCommand::Reset);
            inner.track = None;
            inner.position = 0.0;
            inner.duration = 0.0;
            inner.state = EngineState::None;
        }
        self.emit(EngineNotification::StateChanged(EngineState::None));
        Ok(())
    }

    async fn add(&self, track: EngineTrack) -> Result<()> {
        let state = {
            let mut inner = self.inner.lock();
            if inner.track.is_some() {
                return Err(BridgeError::Engine(
                    "single-slot player: reset before adding".into(),
                ));
            }
            inner.commands.push(EngineCommand::Add {
                track_id: track.id.clone(),
            });
            inner.duration = track.duration.unwrap_or(0.0);
            inner.track = Some(track);
            inner.state = if inner.hold_loading {
                EngineState::Loading
            } else {
                EngineState::Ready
            };
            inner.state
        };
        self.emit(EngineNotification::StateChanged(state));
        Ok(())
    }

    async fn play(&self) -> Result<()> {
        let state = {
            let mut inner = self.inner.lock();
            Self::check_transport(&inner)?;
            if inner.track.is_none() {
                return Err(BridgeError::Engine("no track loaded".into()));
            }
            inner.commands.push(EngineCommand::Play);
            inner.state = match inner.state {
                EngineState::Loading | EngineState::Buffering => EngineState::Buffering,
                _ => EngineState::Playing,
            };
            inner.state
        };
        self.emit(EngineNotification::StateChanged(state));
        Ok(())
    }

    async fn pause(&self) -> Result<()> {
        {
            let mut inner = self.inner.lock();
            Self::check_transport(&inner)?;
            inner.commands.push(EngineCommand::Pause);
            if inner.track.is_some() {
                inner.state = EngineState::Paused;
            }
        }
        self.emit(EngineNotification::StateChanged(EngineState::Paused));
        Ok(())
    }

    async fn seek_to(&self, seconds: f64) -> Result<()> {
        let mut inner = self.inner.lock();
        inner.commands.push(EngineCommand::SeekTo(seconds));
        let mut target = seconds.max(0.0);
        if inner.duration > 0.0 {
            target = target.min(inner.duration);
        }
        inner.position = target;
        Ok(())
    }

    async fn set_rate(&self, rate: f32) -> Result<()> {
        let mut inner = self.inner.lock();
        inner.commands.push(EngineCommand::SetRate(rate));
        inner.rate = rate;
        Ok(())
    }

    async fn progress(&self) -> Result<EngineProgress> {
        let inner = self.inner.lock();
        Ok(EngineProgress {
            position: inner.position,
            duration: inner.duration,
        })
    }

    async fn playback_state(&self) -> Result<EngineState> {
        Ok(self.inner.lock().state)
    }

    fn subscribe(&self) -> broadcast::Receiver<EngineNotification> {
        self.notifications.subscribe()
    }
}
