//! Call-site registration and RAII scope guards.

use std::sync::OnceLock;
use std::time::Instant;

use crate::error::Result;
use crate::frame::FrameController;
use crate::registry::ScopeHandle;
use crate::scope::MetricKind;

/// One instrumentation point's cached registration.
///
/// A `CallSite` is declared `static` at the instrumentation point (the
/// [`profile_scope!`] macro does this); the first [`bind`] registers
/// the scope and every later call returns the cached handle without
/// touching the name again, so identity is the call site, not the name
/// text.
///
/// [`bind`]: CallSite::bind
pub struct CallSite {
    name: &'static str,
    kind: MetricKind,
    slot: OnceLock<ScopeHandle>,
}

impl CallSite {
    /// Declare a call site. Usable in `static` position.
    #[must_use]
    pub const fn new(name: &'static str, kind: MetricKind) -> Self {
        Self {
            name,
            kind,
            slot: OnceLock::new(),
        }
    }

    /// Resolve the handle, registering on first use.
    pub fn try_bind(&self, profiler: &FrameController) -> Result<ScopeHandle> {
        if let Some(handle) = self.slot.get() {
            return Ok(*handle);
        }
        let handle = profiler.register(self.name, self.kind)?;
        Ok(*self.slot.get_or_init(|| handle))
    }

    /// Resolve the handle, registering on first use.
    ///
    /// # Panics
    ///
    /// Panics if the registry is full. That is a configuration error,
    /// not a runtime condition: the registry must be sized for the
    /// instrumentation density, and scopes are never silently dropped.
    pub fn bind(&self, profiler: &FrameController) -> ScopeHandle {
        match self.try_bind(profiler) {
            Ok(handle) => handle,
            Err(e) => panic!("failed to register scope '{}': {e}", self.name),
        }
    }
}

/// RAII guard measuring wall-clock duration of a scope.
///
/// The measurement is recorded into the scope's frame accumulator on
/// `Drop`, so it runs exactly once on every exit path: normal return,
/// early return, or unwind.
pub struct ScopeTimer<'a> {
    profiler: &'a FrameController,
    handle: ScopeHandle,
    start: Instant,
}

impl<'a> ScopeTimer<'a> {
    /// Enter a scope through its call site.
    #[inline]
    #[must_use]
    pub fn enter(profiler: &'a FrameController, site: &CallSite) -> Self {
        Self::with_handle(profiler, site.bind(profiler))
    }

    /// Enter a scope with an already resolved handle.
    #[inline]
    #[must_use]
    pub fn with_handle(profiler: &'a FrameController, handle: ScopeHandle) -> Self {
        Self {
            profiler,
            handle,
            start: Instant::now(),
        }
    }
}

impl Drop for ScopeTimer<'_> {
    #[inline]
    fn drop(&mut self) {
        let elapsed_ms = self.start.elapsed().as_secs_f64() * 1e3;
        self.profiler.record(self.handle, elapsed_ms);
    }
}

/// RAII guard measuring a probe delta across a scope.
///
/// The counterpart of [`ScopeTimer`] for [`MetricKind::MemoryDelta`]
/// scopes: the probe (typically current allocated bytes) is read at
/// entry and again on `Drop`, and the difference is recorded. The
/// engine does not hook an allocator itself; the probe is supplied by
/// the caller.
pub struct ProbeScope<'a, P: Fn() -> f64> {
    profiler: &'a FrameController,
    handle: ScopeHandle,
    probe: P,
    start: f64,
}

impl<'a, P: Fn() -> f64> ProbeScope<'a, P> {
    /// Enter a scope, reading the probe's starting value.
    #[inline]
    pub fn enter(profiler: &'a FrameController, site: &CallSite, probe: P) -> Self {
        let handle = site.bind(profiler);
        let start = probe();
        Self {
            profiler,
            handle,
            probe,
            start,
        }
    }
}

impl<P: Fn() -> f64> Drop for ProbeScope<'_, P> {
    #[inline]
    fn drop(&mut self) {
        let delta = (self.probe)() - self.start;
        self.profiler.record(self.handle, delta);
    }
}

/// Open a duration scope that measures until the end of the enclosing
/// block.
///
/// With one argument the scope is named after the call site
/// (`file:line`); an optional second argument gives an explicit name.
///
/// # Examples
///
/// ```ignore
/// use framescope::{profile_scope, FrameController};
///
/// fn build_chunk(profiler: &FrameController) {
///     profile_scope!(profiler, "Build Chunk");
///     // ... work ...
/// } // timing recorded here
/// ```
#[macro_export]
macro_rules! profile_scope {
    ($profiler:expr) => {
        let _scope_timer = {
            static SITE: $crate::CallSite = $crate::CallSite::new(
                concat!(file!(), ":", line!()),
                $crate::MetricKind::Duration,
            );
            $crate::ScopeTimer::enter($profiler, &SITE)
        };
    };
    ($profiler:expr, $name:expr) => {
        let _scope_timer = {
            static SITE: $crate::CallSite =
                $crate::CallSite::new($name, $crate::MetricKind::Duration);
            $crate::ScopeTimer::enter($profiler, &SITE)
        };
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::limits::MAX_SCOPES;

    #[test]
    fn call_site_binds_once() {
        static SITE: CallSite = CallSite::new("cached", MetricKind::Duration);
        let profiler = FrameController::new();

        let first = SITE.bind(&profiler);
        let second = SITE.bind(&profiler);
        assert_eq!(first, second);
        assert_eq!(profiler.scope_count(), 1);
    }

    #[test]
    fn try_bind_surfaces_registry_overflow() {
        static SITE: CallSite = CallSite::new("late", MetricKind::Duration);
        let profiler = FrameController::new();
        for i in 0..MAX_SCOPES {
            profiler
                .register(&format!("scope-{i}"), MetricKind::Duration)
                .unwrap();
        }

        assert!(SITE.try_bind(&profiler).is_err());
    }

    #[test]
    fn timer_records_on_every_exit_path() {
        fn measured(profiler: &FrameController, site: &CallSite, early: bool) -> u32 {
            let _timer = ScopeTimer::enter(profiler, site);
            if early {
                return 1;
            }
            2
        }

        static SITE: CallSite = CallSite::new("exits", MetricKind::Duration);
        let profiler = FrameController::new();

        profiler.begin_frame().unwrap();
        measured(&profiler, &SITE, true);
        measured(&profiler, &SITE, false);
        let handle = SITE.bind(&profiler);
        assert_eq!(profiler.invocations_this_frame(handle), Some(2));
        profiler.end_frame().unwrap();

        assert_eq!(profiler.last_invocations(handle), Some(2));
        assert_eq!(profiler.lifetime(handle).unwrap().total_count, 1);
    }

    #[test]
    fn nested_scopes_record_independently() {
        static OUTER: CallSite = CallSite::new("outer", MetricKind::Duration);
        static INNER: CallSite = CallSite::new("inner", MetricKind::Duration);
        let profiler = FrameController::new();

        profiler.begin_frame().unwrap();
        {
            let _outer = ScopeTimer::enter(&profiler, &OUTER);
            for _ in 0..3 {
                let _inner = ScopeTimer::enter(&profiler, &INNER);
            }
        }
        profiler.end_frame().unwrap();

        assert_eq!(profiler.last_invocations(OUTER.bind(&profiler)), Some(1));
        assert_eq!(profiler.last_invocations(INNER.bind(&profiler)), Some(3));
    }

    #[test]
    fn probe_scope_records_the_delta() {
        use std::cell::Cell;

        static SITE: CallSite = CallSite::new("heap", MetricKind::MemoryDelta);
        let profiler = FrameController::new();
        let level = Cell::new(1000.0_f64);

        profiler.begin_frame().unwrap();
        {
            let _probe = ProbeScope::enter(&profiler, &SITE, || level.get());
            level.set(1512.0);
        }
        profiler.end_frame().unwrap();

        let handle = SITE.bind(&profiler);
        assert_eq!(profiler.windowed(handle).unwrap().last, 512.0);
    }

    #[test]
    fn macro_scopes_share_their_call_site() {
        let profiler = FrameController::new();

        profiler.begin_frame().unwrap();
        for _ in 0..4 {
            profile_scope!(&profiler, "macro scope");
        }
        profiler.end_frame().unwrap();

        let handle = profiler.handles()[0];
        assert_eq!(profiler.scope_count(), 1);
        assert_eq!(profiler.scope_name(handle).as_deref(), Some("macro scope"));
        assert_eq!(profiler.last_invocations(handle), Some(4));
    }
}
