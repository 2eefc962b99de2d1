//! # Core Configuration
//!
//! Builder-based configuration for the player core. The config holds the
//! two required bridge implementations plus the timing knobs of the
//! session manager, and enforces fail-fast validation so a misconfigured
//! host is caught at startup rather than mid-playback.
//!
//! ## Required bridges
//!
//! - [`AudioEngine`] — the platform media player
//! - [`KeyValueStore`] — persistent session/preference storage
//!
//! ## Usage
//!
//! ```ignore
//! use core_runtime::config::CoreConfig;
//! use std::sync::Arc;
//!
//! let config = CoreConfig::builder()
//!     .engine(Arc::new(MyEngine::new()))
//!     .store(Arc::new(MyStore::new()))
//!     .build()?;
//! # Ok::<(), core_runtime::Error>(())
//! ```

use crate::error::{Error, Result};
use crate::events::DEFAULT_EVENT_BUFFER_SIZE;
use bridge_traits::{AudioEngine, KeyValueStore};
use std::sync::Arc;
use std::time::Duration;

/// Configuration for the player core.
///
/// Use [`CoreConfig::builder`] to construct instances.
#[derive(Clone)]
pub struct CoreConfig {
    /// Platform audio engine (required).
    pub engine: Arc<dyn AudioEngine>,

    /// Persistent key-value storage (required).
    pub store: Arc<dyn KeyValueStore>,

    /// Interval of the reconciliation poll that re-derives session state
    /// from the engine. Acts as a backstop for missed notifications.
    pub poll_interval: Duration,

    /// Minimum spacing between position writes while playing. The exact
    /// stop position is always written on pause regardless of this.
    pub position_save_interval: Duration,

    /// Delay before re-verifying an optimistic play/pause flag against the
    /// engine's actual state.
    pub verify_delay: Duration,

    /// Seconds skipped by `skip_forward`/`skip_backward` when the remote
    /// event carries no interval of its own.
    pub skip_step_secs: f64,

    /// `play_previous` restarts the episode when the play head is past
    /// this many seconds; earlier than that it is a no-op.
    pub previous_restart_secs: f64,

    /// Buffer size of the player event bus, per subscriber.
    pub event_capacity: usize,
}

impl std::fmt::Debug for CoreConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoreConfig")
            .field("engine", &"AudioEngine { ... }")
            .field("store", &"KeyValueStore { ... }")
            .field("poll_interval", &self.poll_interval)
            .field("position_save_interval", &self.position_save_interval)
            .field("verify_delay", &self.verify_delay)
            .field("skip_step_secs", &self.skip_step_secs)
            .field("previous_restart_secs", &self.previous_restart_secs)
            .field("event_capacity", &self.event_capacity)
            .finish()
    }
}

impl CoreConfig {
    /// Create a new builder.
    pub fn builder() -> CoreConfigBuilder {
        CoreConfigBuilder::default()
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.poll_interval.is_zero() {
            return Err(Error::Config(
                "Reconciliation poll interval must be non-zero".to_string(),
            ));
        }

        if !self.skip_step_secs.is_finite() || self.skip_step_secs <= 0.0 {
            return Err(Error::Config(
                "Skip step must be a positive number of seconds".to_string(),
            ));
        }

        if !self.previous_restart_secs.is_finite() || self.previous_restart_secs < 0.0 {
            return Err(Error::Config(
                "Previous-restart threshold must be zero or more seconds".to_string(),
            ));
        }

        if self.event_capacity == 0 {
            return Err(Error::Config(
                "Event bus capacity must be greater than zero".to_string(),
            ));
        }

        Ok(())
    }
}

/// Builder for [`CoreConfig`] instances.
#[derive(Default)]
pub struct CoreConfigBuilder {
    engine: Option<Arc<dyn AudioEngine>>,
    store: Option<Arc<dyn KeyValueStore>>,
    poll_interval: Option<Duration>,
    position_save_interval: Option<Duration>,
    verify_delay: Option<Duration>,
    skip_step_secs: Option<f64>,
    previous_restart_secs: Option<f64>,
    event_capacity: Option<usize>,
}

impl CoreConfigBuilder {
    /// Set the audio engine implementation (required).
    pub fn engine(mut self, engine: Arc<dyn AudioEngine>) -> Self {
        self.engine = Some(engine);
        self
    }

    /// Set the key-value store implementation (required).
    pub fn store(mut self, store: Arc<dyn KeyValueStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Set the reconciliation poll interval. Default: 1 second.
    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = Some(interval);
        self
    }

    /// Set the position save interval. Default: 5 seconds.
    pub fn position_save_interval(mut self, interval: Duration) -> Self {
        self.position_save_interval = Some(interval);
        self
    }

    /// Set the optimistic-update verification delay. Default: 500 ms.
    pub fn verify_delay(mut self, delay: Duration) -> Self {
        self.verify_delay = Some(delay);
        self
    }

    /// Set the default skip step in seconds. Default: 10.
    pub fn skip_step_secs(mut self, seconds: f64) -> Self {
        self.skip_step_secs = Some(seconds);
        self
    }

    /// Set the previous-restart threshold in seconds. Default: 5.
    pub fn previous_restart_secs(mut self, seconds: f64) -> Self {
        self.previous_restart_secs = Some(seconds);
        self
    }

    /// Set the event bus capacity. Default: 100.
    pub fn event_capacity(mut self, capacity: usize) -> Self {
        self.event_capacity = Some(capacity);
        self
    }

    /// Build the final [`CoreConfig`].
    ///
    /// Returns an actionable error when a required bridge is missing or a
    /// tunable is out of range.
    pub fn build(self) -> Result<CoreConfig> {
        let engine = self.engine.ok_or_else(|| Error::CapabilityMissing {
            capability: "AudioEngine".to_string(),
            message: "An AudioEngine implementation is required for playback. \
                     Inject the platform media player bridge, or use \
                     bridge_memory::ScriptedAudioEngine in tests."
                .to_string(),
        })?;

        let store = self.store.ok_or_else(|| Error::CapabilityMissing {
            capability: "KeyValueStore".to_string(),
            message: "A KeyValueStore implementation is required for session \
                     persistence. Inject the platform preference storage bridge, \
                     or use bridge_memory::MemoryKeyValueStore in tests."
                .to_string(),
        })?;

        let config = CoreConfig {
            engine,
            store,
            poll_interval: self.poll_interval.unwrap_or(Duration::from_secs(1)),
            position_save_interval: self
                .position_save_interval
                .unwrap_or(Duration::from_secs(5)),
            verify_delay: self.verify_delay.unwrap_or(Duration::from_millis(500)),
            skip_step_secs: self.skip_step_secs.unwrap_or(10.0),
            previous_restart_secs: self.previous_restart_secs.unwrap_or(5.0),
            event_capacity: self.event_capacity.unwrap_or(DEFAULT_EVENT_BUFFER_SIZE),
        };

        config.validate()?;

        Ok(config)
    }
}
