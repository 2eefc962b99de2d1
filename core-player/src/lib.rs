//! # Player Core
//!
//! The playback session manager for the podcast client.
//!
//! ## Overview
//!
//! [`PlayerManager`] owns the mutable session state shared across the app:
//! the current episode/podcast pair, the upcoming-episode queue, playback
//! intent, rate and sleep timer. It keeps that state consistent with an
//! external audio engine whose changes arrive both from direct calls and
//! from out-of-band notifications (lock-screen buttons, OS interruptions),
//! persists the session across process restarts, and restores it on
//! startup without ever auto-playing.
//!
//! The engine is the source of truth for transport state and live
//! position; the manager derives its `is_playing`/`is_loading` flags from
//! engine state through a single re-derivation routine fed by both the
//! engine's notification stream and a periodic backstop poll.
//!
//! All engine and storage failures are logged and swallowed: no operation
//! surfaces an error to the presentation layer, and the next user action
//! or poll tick is the implicit recovery path.

pub mod error;
pub mod manager;
pub mod model;
pub mod persistence;
pub mod session;

pub use error::{PlayerError, Result};
pub use manager::PlayerManager;
pub use model::{Episode, Podcast};
pub use session::PlayerSnapshot;
