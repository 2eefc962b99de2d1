//! # Bridge Traits
//!
//! Platform-boundary abstractions for the podcast player core.
//!
//! The core never talks to a concrete audio engine or storage backend
//! directly. Host applications (mobile, desktop, tests) inject
//! implementations of the traits defined here:
//!
//! - [`AudioEngine`] — the single-slot media player (load, transport
//!   control, progress queries) plus its asynchronous notification stream.
//! - [`KeyValueStore`] — string-keyed persistent storage for session state
//!   and preferences.
//!
//! All operations are async and fallible; the core treats every failure as
//! non-fatal and recovers on the next user action or reconciliation tick.

pub mod error;
pub mod playback;
pub mod storage;

pub use error::{BridgeError, Result};
pub use playback::{
    AudioEngine, EngineNotification, EngineProgress, EngineState, EngineTrack, RemoteCommand,
};
pub use storage::KeyValueStore;
