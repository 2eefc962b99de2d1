//! # Memory Bridges
//!
//! In-process implementations of the bridge traits.
//!
//! The real audio engine and settings storage live in the host application;
//! this crate provides memory-backed stand-ins with the same contracts:
//!
//! - [`MemoryKeyValueStore`] — a HashMap-backed [`bridge_traits::KeyValueStore`].
//! - [`ScriptedAudioEngine`] — a deterministic [`bridge_traits::AudioEngine`]
//!   that records every command it receives, advances position only when
//!   told to, and can emit notifications and injected failures on demand.
//!
//! Both are used as the test doubles for `core-player` and double as
//! development shims when no platform bridge is wired up yet.

pub mod engine;
pub mod store;

pub use engine::{EngineCommand, ScriptedAudioEngine};
pub use store::MemoryKeyValueStore;
