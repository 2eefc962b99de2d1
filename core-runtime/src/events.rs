//! # Player Event Bus
//!
//! Broadcast channel through which the player core notifies host UI layers
//! (now-playing screen, mini-player, menu sheets) of state changes, built on
//! `tokio::sync::broadcast`.
//!
//! Events are intentionally payload-light: identifiers and scalars rather
//! than full records, since every event is cloned per subscriber. Consumers
//! that need the full session state fetch a snapshot from the player after
//! receiving an event.
//!
//! Subscribers that fall behind receive `RecvError::Lagged` and can keep
//! consuming; `RecvError::Closed` signals shutdown.

use serde::{Deserialize, Serialize};
use std::fmt;
use tokio::sync::broadcast;

pub use tokio::sync::broadcast::error::{RecvError, SendError};
pub use tokio::sync::broadcast::Receiver;

/// Default buffer size for the event bus channel.
pub const DEFAULT_EVENT_BUFFER_SIZE: usize = 100;

/// Externally observable player state changes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "event")]
pub enum PlayerEvent {
    /// Session restoration finished. Fired exactly once per process.
    Restored {
        /// Whether a persisted episode was reinstated.
        has_episode: bool,
    },
    /// The current episode/podcast pair changed.
    EpisodeChanged {
        episode_id: String,
        title: String,
    },
    /// Playback started or resumed.
    Started {
        episode_id: String,
    },
    /// Playback paused.
    Paused {
        position_ms: u64,
    },
    /// Play head moved (seek or natural progression).
    PositionChanged {
        position_ms: u64,
        duration_ms: u64,
    },
    /// Playback rate changed.
    RateChanged {
        rate: f32,
    },
    /// The upcoming-episode queue changed.
    QueueUpdated {
        len: usize,
    },
    SleepTimerArmed {
        minutes: u32,
    },
    SleepTimerCancelled,
    /// The sleep timer expired and playback was paused.
    SleepTimerFired,
}

impl PlayerEvent {
    /// Human-readable description of the event.
    pub fn description(&self) -> &str {
        match self {
            PlayerEvent::Restored { .. } => "Session restored",
            PlayerEvent::EpisodeChanged { .. } => "Episode changed",
            PlayerEvent::Started { .. } => "Playback started",
            PlayerEvent::Paused { .. } => "Playback paused",
            PlayerEvent::PositionChanged { .. } => "Playback position changed",
            PlayerEvent::RateChanged { .. } => "Playback rate changed",
            PlayerEvent::QueueUpdated { .. } => "Queue updated",
            PlayerEvent::SleepTimerArmed { .. } => "Sleep timer armed",
            PlayerEvent::SleepTimerCancelled => "Sleep timer cancelled",
            PlayerEvent::SleepTimerFired => "Sleep timer fired",
        }
    }
}

/// Central event bus for publishing and subscribing to player events.
///
/// Cloning the bus yields another producer handle; each `subscribe()`
/// creates an independent receiver. Sends never block.
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<PlayerEvent>,
}

impl EventBus {
    /// Create an event bus buffering up to `capacity` events per subscriber.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event to all subscribers.
    ///
    /// Returns the number of subscribers that received it; an error means
    /// there are currently no subscribers, which callers typically ignore.
    pub fn emit(&self, event: PlayerEvent) -> Result<usize, SendError<PlayerEvent>> {
        self.sender.send(event)
    }

    /// Create a new subscriber. Past events are not replayed.
    pub fn subscribe(&self) -> Receiver<PlayerEvent> {
        self.sender.subscribe()
    }

    /// Number of active subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_BUFFER_SIZE)
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("subscriber_count", &self.subscriber_count())
            .finish()
    }
}
