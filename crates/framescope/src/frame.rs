//! Frame state machine and commit protocol.

use parking_lot::Mutex;

use crate::error::{Error, Result};
use crate::registry::{ScopeHandle, ScopeRegistry};
use crate::scope::{MetricKind, ScopeRecord};
use crate::series::{LifetimeStats, WindowedStats};
use crate::snapshot;

/// Frame protocol state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FrameState {
    Idle,
    Active,
    Committing,
}

struct Inner {
    state: FrameState,
    registry: ScopeRegistry,
}

/// Drives the begin/measure/commit frame cycle and owns the scope
/// registry.
///
/// The intended convention is one process-lifetime controller
/// constructed at startup and passed by reference to instrumentation
/// points. All state sits behind one brief mutex, so guards recorded
/// from the owning thread and readers on a display thread both see
/// consistent scope state; the frame commit itself is the natural
/// synchronization point.
///
/// ```ignore
/// let profiler = FrameController::new();
/// loop {
///     profiler.begin_frame()?;
///     run_frame(&profiler);
///     profiler.end_frame()?;
/// }
/// ```
pub struct FrameController {
    inner: Mutex<Inner>,
}

impl Default for FrameController {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameController {
    /// Create a controller with an empty registry, in the idle state.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                state: FrameState::Idle,
                registry: ScopeRegistry::new(),
            }),
        }
    }

    /// Register a scope with the owned registry.
    pub fn register(&self, name: &str, kind: MetricKind) -> Result<ScopeHandle> {
        self.inner.lock().registry.register(name, kind)
    }

    /// Open a frame.
    ///
    /// Zeroes every registered scope's per-frame fields. Calling while
    /// a frame is already active is a usage error and leaves the frame
    /// state unchanged.
    pub fn begin_frame(&self) -> Result<()> {
        let mut inner = self.inner.lock();
        if inner.state != FrameState::Idle {
            return Err(Error::FrameAlreadyActive);
        }
        for record in inner.registry.records_mut() {
            record.reset_frame();
        }
        inner.state = FrameState::Active;
        Ok(())
    }

    /// Close the current frame, committing one sample per touched
    /// scope.
    ///
    /// Scopes untouched during the frame keep their previous samples
    /// unchanged; no zero-filling. Calling without an active frame is a
    /// usage error and leaves the frame state unchanged.
    pub fn end_frame(&self) -> Result<()> {
        let mut inner = self.inner.lock();
        if inner.state != FrameState::Active {
            return Err(Error::FrameNotActive);
        }
        inner.state = FrameState::Committing;
        for record in inner.registry.records_mut() {
            record.commit_frame();
        }
        inner.state = FrameState::Idle;
        Ok(())
    }

    /// Fold one invocation's metric into a scope's frame accumulator.
    ///
    /// This is the scope-guard drop path; it is also usable directly
    /// when the caller already holds a measurement.
    pub fn record(&self, handle: ScopeHandle, value: f64) {
        if let Some(record) = self.inner.lock().registry.get_mut(handle) {
            record.accumulate(value);
        }
    }

    /// Set a scope's windowed-statistics limit (settings surface).
    pub fn set_window_limit(&self, handle: ScopeHandle, limit: usize) {
        if let Some(record) = self.inner.lock().registry.get_mut(handle) {
            record.samples_mut().set_window_limit(limit);
        }
    }

    /// Registered handles in stable registration order.
    #[must_use]
    pub fn handles(&self) -> Vec<ScopeHandle> {
        self.inner.lock().registry.handles().collect()
    }

    /// Number of registered scopes.
    #[must_use]
    pub fn scope_count(&self) -> usize {
        self.inner.lock().registry.len()
    }

    /// Run a closure against a scope record under the lock.
    ///
    /// The read surface for the presentation layer; returns `None` for
    /// an unknown handle.
    pub fn read_scope<R>(&self, handle: ScopeHandle, f: impl FnOnce(&ScopeRecord) -> R) -> Option<R> {
        self.inner.lock().registry.get(handle).map(f)
    }

    /// Scope name as truncated at registration.
    #[must_use]
    pub fn scope_name(&self, handle: ScopeHandle) -> Option<String> {
        self.read_scope(handle, |record| record.name().to_owned())
    }

    /// Scope metric kind.
    #[must_use]
    pub fn scope_kind(&self, handle: ScopeHandle) -> Option<MetricKind> {
        self.read_scope(handle, ScopeRecord::kind)
    }

    /// Windowed statistics for a scope.
    #[must_use]
    pub fn windowed(&self, handle: ScopeHandle) -> Option<WindowedStats> {
        self.read_scope(handle, |record| record.samples().windowed())
    }

    /// Lifetime statistics for a scope.
    #[must_use]
    pub fn lifetime(&self, handle: ScopeHandle) -> Option<LifetimeStats> {
        self.read_scope(handle, |record| record.samples().lifetime())
    }

    /// Invocations accumulated by the current frame so far.
    #[must_use]
    pub fn invocations_this_frame(&self, handle: ScopeHandle) -> Option<u32> {
        self.read_scope(handle, ScopeRecord::invocations_this_frame)
    }

    /// Invocation count committed by the most recent frame in which the
    /// scope ran.
    #[must_use]
    pub fn last_invocations(&self, handle: ScopeHandle) -> Option<u32> {
        self.read_scope(handle, ScopeRecord::last_invocations)
    }

    /// Encode a scope's snapshot image for baseline persistence.
    ///
    /// Linearizes the scope's sample ring as a side effect.
    pub fn encode_scope(&self, handle: ScopeHandle) -> Result<Vec<u8>> {
        let mut inner = self.inner.lock();
        let record = inner
            .registry
            .get_mut(handle)
            .ok_or(Error::UnknownScope(handle.index()))?;
        Ok(snapshot::encode(record)?)
    }

    /// Decode a baseline image into a standalone record, substituting
    /// the stored name with `override_name`.
    pub fn load_baseline(bytes: &[u8], override_name: &str) -> Result<ScopeRecord> {
        Ok(snapshot::decode(bytes, override_name)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_commit_aggregates_invocations() {
        let profiler = FrameController::new();
        let scope = profiler.register("A", MetricKind::Duration).unwrap();

        profiler.begin_frame().unwrap();
        profiler.record(scope, 10.0);
        profiler.record(scope, 20.0);
        profiler.record(scope, 30.0);
        assert_eq!(profiler.invocations_this_frame(scope), Some(3));
        profiler.end_frame().unwrap();

        assert_eq!(profiler.invocations_this_frame(scope), Some(0));
        assert_eq!(profiler.last_invocations(scope), Some(3));

        let windowed = profiler.windowed(scope).unwrap();
        assert_eq!(windowed.last, 60.0);

        let lifetime = profiler.lifetime(scope).unwrap();
        assert_eq!(lifetime.total_count, 1);
        assert!((lifetime.average - 60.0).abs() < 1e-6);
    }

    #[test]
    fn untouched_scopes_get_no_sample() {
        let profiler = FrameController::new();
        let touched = profiler.register("touched", MetricKind::Duration).unwrap();
        let idle = profiler.register("idle", MetricKind::Duration).unwrap();

        profiler.begin_frame().unwrap();
        profiler.record(touched, 1.0);
        profiler.end_frame().unwrap();

        assert_eq!(profiler.lifetime(touched).unwrap().total_count, 1);
        assert_eq!(profiler.lifetime(idle).unwrap().total_count, 0);
    }

    #[test]
    fn double_begin_frame_is_an_error_and_frame_stays_active() {
        let profiler = FrameController::new();
        let scope = profiler.register("A", MetricKind::Duration).unwrap();

        profiler.begin_frame().unwrap();
        assert!(matches!(
            profiler.begin_frame(),
            Err(Error::FrameAlreadyActive)
        ));

        // The first frame is still active and commits normally.
        profiler.record(scope, 5.0);
        profiler.end_frame().unwrap();
        assert_eq!(profiler.lifetime(scope).unwrap().total_count, 1);
    }

    #[test]
    fn end_frame_without_begin_is_an_error() {
        let profiler = FrameController::new();
        assert!(matches!(profiler.end_frame(), Err(Error::FrameNotActive)));
    }

    #[test]
    fn begin_frame_discards_stale_accumulation() {
        let profiler = FrameController::new();
        let scope = profiler.register("A", MetricKind::Duration).unwrap();

        // Recorded outside any frame; the next begin_frame discards it.
        profiler.record(scope, 99.0);
        profiler.begin_frame().unwrap();
        assert_eq!(profiler.invocations_this_frame(scope), Some(0));
        profiler.end_frame().unwrap();

        assert_eq!(profiler.lifetime(scope).unwrap().total_count, 0);
    }

    #[test]
    fn window_limit_is_forwarded_to_the_series() {
        let profiler = FrameController::new();
        let scope = profiler.register("A", MetricKind::Duration).unwrap();

        profiler.set_window_limit(scope, 2);
        for value in [1.0, 2.0, 3.0, 4.0] {
            profiler.begin_frame().unwrap();
            profiler.record(scope, value);
            profiler.end_frame().unwrap();
        }

        let windowed = profiler.windowed(scope).unwrap();
        assert!((windowed.average - 3.5).abs() < 1e-6);
        assert_eq!(profiler.lifetime(scope).unwrap().total_count, 4);
    }
}
