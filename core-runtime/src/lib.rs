//! # Core Runtime
//!
//! Foundational runtime infrastructure for the podcast player core:
//! - Logging and tracing setup
//! - Configuration management with fail-fast validation
//! - Event bus for notifying host UI layers of player state changes
//!
//! This crate establishes the async runtime patterns, logging conventions
//! and event broadcasting mechanisms used by `core-player`.

pub mod config;
pub mod error;
pub mod events;
pub mod logging;

pub use error::{Error, Result};
