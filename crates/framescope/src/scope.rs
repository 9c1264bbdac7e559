//! Scope identity and per-frame accumulation.

use crate::limits::MAX_SCOPE_NAME_LEN;
use crate::series::SampleSeries;

/// What a scope measures.
///
/// Fixed for the lifetime of a scope, set at first registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricKind {
    /// Wall-clock duration, stored in milliseconds.
    Duration,
    /// Allocation delta, stored in bytes.
    MemoryDelta,
}

impl MetricKind {
    /// Display name for this kind.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Duration => "Duration",
            Self::MemoryDelta => "Memory",
        }
    }

    /// Wire tag used by the snapshot codec.
    pub(crate) const fn tag(self) -> u8 {
        match self {
            Self::Duration => 0,
            Self::MemoryDelta => 1,
        }
    }

    pub(crate) const fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            0 => Some(Self::Duration),
            1 => Some(Self::MemoryDelta),
            _ => None,
        }
    }
}

/// Truncate a scope name to [`MAX_SCOPE_NAME_LEN`] bytes without
/// splitting a UTF-8 sequence.
pub(crate) fn truncate_name(name: &str) -> String {
    if name.len() <= MAX_SCOPE_NAME_LEN {
        return name.to_owned();
    }
    let mut end = MAX_SCOPE_NAME_LEN;
    while !name.is_char_boundary(end) {
        end -= 1;
    }
    name[..end].to_owned()
}

/// One instrumented scope: identity, per-frame accumulation state, and
/// the committed sample history.
///
/// Per-frame fields collect many sub-frame measurements; the frame
/// controller folds them into exactly one committed sample at frame
/// end.
pub struct ScopeRecord {
    name: String,
    kind: MetricKind,
    invocations: u32,
    accumulator: f64,
    last_invocations: u32,
    samples: SampleSeries,
}

impl ScopeRecord {
    /// Create a record with an empty sample history.
    ///
    /// The name is truncated to [`MAX_SCOPE_NAME_LEN`] bytes.
    #[must_use]
    pub fn new(name: &str, kind: MetricKind) -> Self {
        Self {
            name: truncate_name(name),
            kind,
            invocations: 0,
            accumulator: 0.0,
            last_invocations: 0,
            samples: SampleSeries::new(),
        }
    }

    pub(crate) fn from_parts(name: &str, kind: MetricKind, samples: SampleSeries) -> Self {
        Self {
            name: truncate_name(name),
            kind,
            invocations: 0,
            accumulator: 0.0,
            last_invocations: 0,
            samples,
        }
    }

    /// Scope name, as truncated at registration.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Metric kind fixed at registration.
    #[must_use]
    pub fn kind(&self) -> MetricKind {
        self.kind
    }

    /// Scope entries accumulated since the last commit.
    #[must_use]
    pub fn invocations_this_frame(&self) -> u32 {
        self.invocations
    }

    /// Invocation count committed by the most recent frame in which
    /// this scope ran.
    #[must_use]
    pub fn last_invocations(&self) -> u32 {
        self.last_invocations
    }

    pub(crate) fn accumulator_this_frame(&self) -> f64 {
        self.accumulator
    }

    /// Committed sample history.
    #[must_use]
    pub fn samples(&self) -> &SampleSeries {
        &self.samples
    }

    pub(crate) fn samples_mut(&mut self) -> &mut SampleSeries {
        &mut self.samples
    }

    /// Fold one invocation's metric into the frame accumulator.
    pub(crate) fn accumulate(&mut self, value: f64) {
        self.accumulator += value;
        self.invocations += 1;
    }

    /// Commit the frame accumulator as one sample if the scope was
    /// invoked this frame, then zero the per-frame fields.
    ///
    /// Returns whether a sample was committed. Untouched scopes commit
    /// nothing, so their statistics only ever see frames in which the
    /// scope actually ran.
    pub(crate) fn commit_frame(&mut self) -> bool {
        if self.invocations == 0 {
            return false;
        }
        #[allow(clippy::cast_possible_truncation)]
        self.samples.push(self.accumulator as f32);
        self.last_invocations = self.invocations;
        self.invocations = 0;
        self.accumulator = 0.0;
        true
    }

    /// Zero the per-frame fields without committing.
    pub(crate) fn reset_frame(&mut self) {
        self.invocations = 0;
        self.accumulator = 0.0;
    }
}
