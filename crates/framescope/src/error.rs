//! Error types for the engine.

use thiserror::Error;

use crate::snapshot::DecodeError;

/// Engine-wide error type.
#[derive(Error, Debug)]
pub enum Error {
    /// Registration beyond the fixed registry capacity. A
    /// configuration error: raise `MAX_SCOPES` or instrument fewer
    /// call sites.
    #[error("scope registry full: all {0} slots in use")]
    RegistryFull(usize),

    /// `begin_frame` called while a frame is already active.
    #[error("begin_frame called while a frame is already active")]
    FrameAlreadyActive,

    /// `end_frame` called with no active frame.
    #[error("end_frame called with no active frame")]
    FrameNotActive,

    /// Handle does not refer to a registered scope.
    #[error("unknown scope handle {0}")]
    UnknownScope(usize),

    /// Snapshot encoding failed.
    #[error("snapshot encode failed: {0}")]
    Encode(#[from] bincode::Error),

    /// Snapshot decoding failed.
    #[error("snapshot decode failed: {0}")]
    Decode(#[from] DecodeError),
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;
