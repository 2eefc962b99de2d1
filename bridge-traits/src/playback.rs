//! Audio engine bridge trait and transport types.
//!
//! The engine is modeled after platform media players with lock-screen and
//! notification integration: a single-slot queue (`reset` then `add`), plain
//! transport controls, and an out-of-band notification stream through which
//! both internal state transitions and externally triggered remote commands
//! (lock-screen buttons, OS interruptions) arrive.
//!
//! Positions and durations cross this boundary in the engine's native unit,
//! seconds. The core converts to milliseconds at its own surface.

use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Track descriptor handed to the engine when loading an episode.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineTrack {
    /// Stable identifier, reused as the persistence key for the episode.
    pub id: String,
    /// Resolved playback source. May be a remote URL or a local file URI.
    pub url: String,
    pub title: String,
    pub artist: String,
    /// Artwork URL surfaced on the platform media session, when available.
    pub artwork: Option<String>,
    /// Duration hint in seconds. Authoritative only until the engine reports
    /// a live duration for the loaded stream.
    pub duration: Option<f64>,
}

/// Transport state as reported by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EngineState {
    /// Nothing loaded.
    None,
    /// A track is loading.
    Loading,
    /// Playback stalled waiting for data.
    Buffering,
    /// Loaded and ready, not playing.
    Ready,
    Playing,
    Paused,
    /// The loaded track played to its end.
    Ended,
}

/// Live position/duration pair, in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct EngineProgress {
    pub position: f64,
    pub duration: f64,
}

/// Transport-control command triggered outside the app UI, e.g. from the
/// lock screen, a notification, or headset buttons.
#[derive(Debug, Clone, PartialEq)]
pub enum RemoteCommand {
    Play,
    Pause,
    Stop,
    /// Absolute seek, position in seconds.
    Seek { position: f64 },
    Next,
    Previous,
    /// Relative jump. The interval (seconds) is supplied by the platform
    /// when the surface exposes a configurable jump size.
    JumpForward { interval: Option<f64> },
    JumpBackward { interval: Option<f64> },
}

/// Notification emitted on the engine's broadcast stream.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineNotification {
    StateChanged(EngineState),
    Remote(RemoteCommand),
}

/// Trait for host-provided audio engines.
///
/// The engine is a single-slot player: `add` is only meaningful after the
/// previous `reset` has completed, so callers must await these calls in
/// order. Out-of-range seek targets are the engine's responsibility to
/// clamp.
#[async_trait]
pub trait AudioEngine: Send + Sync {
    /// Clear the loaded track and return to [`EngineState::None`].
    async fn reset(&self) -> Result<()>;

    /// Load a track into the (now empty) slot without starting playback.
    async fn add(&self, track: EngineTrack) -> Result<()>;

    async fn play(&self) -> Result<()>;

    async fn pause(&self) -> Result<()>;

    /// Seek to an absolute position, in seconds. Implementations clamp
    /// targets outside the stream bounds.
    async fn seek_to(&self, seconds: f64) -> Result<()>;

    /// Set the playback rate (1.0 = normal speed).
    async fn set_rate(&self, rate: f32) -> Result<()>;

    /// Query live position and duration.
    async fn progress(&self) -> Result<EngineProgress>;

    /// Query the engine's current transport state.
    async fn playback_state(&self) -> Result<EngineState>;

    /// Subscribe to state-change and remote-control notifications.
    ///
    /// Each call returns an independent receiver; past notifications are
    /// not replayed.
    fn subscribe(&self) -> broadcast::Receiver<EngineNotification>;
}
