//! In-process, frame-oriented instrumentation and sampling engine.
//!
//! Application code marks function scopes (or allocation sites) for
//! measurement; the engine records one aggregated sample per scope per
//! frame, keeps a bounded rolling history plus lifetime statistics per
//! scope, and can snapshot a scope's history to a portable binary image
//! so a run can serve as a performance baseline for later comparison.
//!
//! # Usage
//!
//! Build one process-lifetime [`FrameController`] at startup and pass
//! it by reference to instrumentation points:
//!
//! ```ignore
//! use framescope::{profile_scope, FrameController};
//!
//! fn update(profiler: &FrameController) {
//!     profile_scope!(profiler, "Update");
//!     // ... work measured until end of scope
//! }
//!
//! fn main() -> framescope::Result<()> {
//!     framescope::raise_thread_priority();
//!     let profiler = FrameController::new();
//!     loop {
//!         profiler.begin_frame()?;
//!         update(&profiler);
//!         profiler.end_frame()?;
//!     }
//! }
//! ```
//!
//! Between frames, readers walk [`FrameController::handles`] for
//! display, and [`FrameController::encode_scope`] /
//! [`snapshot::decode`] persist and reload baselines.

mod error;
mod frame;
mod macros;
mod priority;
mod registry;
mod scope;
mod series;
pub mod snapshot;

// Re-export public API
pub use error::{Error, Result};
pub use frame::FrameController;
pub use macros::{CallSite, ProbeScope, ScopeTimer};
pub use priority::raise_thread_priority;
pub use registry::{ScopeHandle, ScopeRegistry};
pub use scope::{MetricKind, ScopeRecord};
pub use series::{LifetimeStats, SampleSeries, WindowedStats};
pub use snapshot::{DecodeError, SNAPSHOT_VERSION};

/// Compile-time limits shared by the engine and any snapshot reader.
pub mod limits {
    /// Maximum scope-name length in bytes; longer names are truncated.
    pub const MAX_SCOPE_NAME_LEN: usize = 64;
    /// Maximum number of registrable scopes.
    pub const MAX_SCOPES: usize = 64;
    /// Physical ring capacity of every sample series.
    pub const SAMPLE_CAPACITY: usize = 1000;
}
