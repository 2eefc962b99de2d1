//! Startup errors.
//!
//! The player core is fail-fast only while it is being assembled: once a
//! [`CoreConfig`](crate::config::CoreConfig) builds, nothing in the runtime
//! surfaces these again. Playback-time failures are logged and swallowed by
//! the session manager instead.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// A tunable was out of range.
    #[error("Configuration error: {0}")]
    Config(String),

    /// A required bridge implementation was not injected.
    #[error("Capability missing: {capability} - {message}")]
    CapabilityMissing { capability: String, message: String },
}

pub type Result<T> = std::result::Result<T, Error>;
