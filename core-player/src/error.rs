//! Player error types.
//!
//! These errors never cross the manager's public surface: operations catch
//! them at the terminal point, log, and degrade to "state unchanged". The
//! type exists so internal helpers can compose with `?`.

use bridge_traits::BridgeError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PlayerError {
    /// An engine or storage bridge call failed.
    #[error(transparent)]
    Bridge(#[from] BridgeError),

    /// A persisted record could not be serialized or parsed.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, PlayerError>;
