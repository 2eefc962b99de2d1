//! Session state and its engine-state projection.

use crate::model::{Episode, Podcast};
use bridge_traits::playback::EngineState;
use std::collections::VecDeque;

/// Three-way projection of the engine's transport state onto what the UI
/// cares about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Transport {
    Playing,
    /// Buffering, or not yet loaded while the intent is to play.
    Loading,
    Paused,
}

impl Transport {
    pub(crate) fn project(state: EngineState, intent_to_play: bool) -> Self {
        match state {
            EngineState::Playing => Transport::Playing,
            EngineState::Loading | EngineState::Buffering => Transport::Loading,
            EngineState::None if intent_to_play => Transport::Loading,
            _ => Transport::Paused,
        }
    }
}

/// Convert engine seconds to milliseconds, clamping invalid readings to 0.
pub(crate) fn clamp_ms(seconds: f64) -> u64 {
    if seconds.is_finite() && seconds > 0.0 {
        (seconds * 1000.0) as u64
    } else {
        0
    }
}

/// The mutable session owned by the manager.
///
/// Mutated only under the manager's lock; the UI observes it through
/// cloned [`PlayerSnapshot`]s. `is_playing` is the session's intent and
/// converges with the engine's actual state through reconciliation.
#[derive(Debug, Default)]
pub(crate) struct SessionState {
    pub current_episode: Option<Episode>,
    pub current_podcast: Option<Podcast>,
    /// Upcoming episodes, FIFO: insertion order is playback order.
    pub queue: VecDeque<Episode>,
    pub is_playing: bool,
    pub is_loading: bool,
    pub position_ms: u64,
    pub duration_ms: u64,
    pub playback_rate: f32,
    /// Armed sleep timer length in minutes; `None` when disabled.
    pub sleep_timer: Option<u32>,
    /// Restored position (seconds) waiting to be applied once the engine
    /// finishes loading the restored track.
    pub pending_seek: Option<f64>,
}

impl SessionState {
    pub fn new() -> Self {
        Self {
            playback_rate: 1.0,
            ..Self::default()
        }
    }

    /// Install the episode/podcast pair. They are only ever set together.
    pub fn set_current(&mut self, episode: Episode, podcast: Podcast) {
        self.current_episode = Some(episode);
        self.current_podcast = Some(podcast);
    }

    pub fn apply_transport(&mut self, transport: Transport) {
        self.is_playing = transport == Transport::Playing;
        self.is_loading = transport == Transport::Loading;
    }

    pub fn snapshot(&self) -> PlayerSnapshot {
        PlayerSnapshot {
            current_episode: self.current_episode.clone(),
            current_podcast: self.current_podcast.clone(),
            queue: self.queue.iter().cloned().collect(),
            is_playing: self.is_playing,
            is_loading: self.is_loading,
            position_ms: self.position_ms,
            duration_ms: self.duration_ms,
            playback_rate: self.playback_rate,
            sleep_timer: self.sleep_timer,
        }
    }
}

/// Read-only copy of the session state handed to presentation layers.
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerSnapshot {
    pub current_episode: Option<Episode>,
    pub current_podcast: Option<Podcast>,
    pub queue: Vec<Episode>,
    pub is_playing: bool,
    pub is_loading: bool,
    pub position_ms: u64,
    pub duration_ms: u64,
    pub playback_rate: f32,
    /// Minutes the armed sleep timer was started with; `None` when off.
    pub sleep_timer: Option<u32>,
}
