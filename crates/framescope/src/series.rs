//! Fixed-capacity sample storage with windowed and lifetime statistics.

use crate::limits::SAMPLE_CAPACITY;

/// Statistics over the most recent `window_limit` committed samples.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct WindowedStats {
    /// Minimum over the window.
    pub min: f32,
    /// Maximum over the window.
    pub max: f32,
    /// Arithmetic mean over the window.
    pub average: f32,
    /// Most recently committed sample.
    pub last: f32,
}

/// Statistics over every sample ever committed, including samples
/// since evicted from the ring.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LifetimeStats {
    /// Minimum of all committed samples.
    pub min: f32,
    /// Maximum of all committed samples.
    pub max: f32,
    /// Arithmetic mean of all committed samples.
    pub average: f32,
    /// Number of samples ever committed.
    pub total_count: u64,
}

/// Circular buffer of scalar samples with incrementally maintained
/// windowed and lifetime aggregates.
///
/// The backing storage is allocated once at creation and never grows.
/// `write_offset` is the next slot to write; after [`linearize`] on a
/// wrapped ring it equals the capacity (the linear end position), and
/// the next push wraps it back into range.
///
/// [`linearize`]: SampleSeries::linearize
pub struct SampleSeries {
    data: Box<[f32]>,
    write_offset: usize,
    window_limit: usize,
    total_count: u64,
    total_min: f32,
    total_max: f32,
    total_sum: f64,
    windowed: WindowedStats,
}

impl Default for SampleSeries {
    fn default() -> Self {
        Self::new()
    }
}

impl SampleSeries {
    /// Create a series with the engine-wide [`SAMPLE_CAPACITY`].
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(SAMPLE_CAPACITY)
    }

    /// Create a series with an explicit capacity.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        assert!(capacity > 0, "sample capacity must be non-zero");
        Self {
            data: vec![0.0; capacity].into_boxed_slice(),
            write_offset: 0,
            window_limit: capacity,
            total_count: 0,
            total_min: f32::INFINITY,
            total_max: f32::NEG_INFINITY,
            total_sum: 0.0,
            windowed: WindowedStats::default(),
        }
    }

    /// Reassemble a series from decoded snapshot fields.
    ///
    /// The windowed cache is not part of the wire image; it is rebuilt
    /// here from the stored buffer.
    pub(crate) fn from_parts(
        data: Box<[f32]>,
        write_offset: usize,
        window_limit: usize,
        total_count: u64,
        total_min: f32,
        total_max: f32,
        total_sum: f64,
    ) -> Self {
        let capacity = data.len();
        let mut series = Self {
            data,
            write_offset,
            window_limit: window_limit.clamp(1, capacity),
            total_count,
            total_min,
            total_max,
            total_sum,
            windowed: WindowedStats::default(),
        };
        series.recompute_window();
        series
    }

    /// Physical ring capacity.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    /// Index of the next slot to write.
    ///
    /// Consumers combine this with [`raw_view`] to read samples in
    /// chronological order, unless [`linearize`] was called first.
    ///
    /// [`raw_view`]: SampleSeries::raw_view
    /// [`linearize`]: SampleSeries::linearize
    #[must_use]
    pub fn write_offset(&self) -> usize {
        self.write_offset
    }

    /// Number of samples over which windowed statistics are computed.
    #[must_use]
    pub fn window_limit(&self) -> usize {
        self.window_limit
    }

    /// Number of samples ever pushed.
    #[must_use]
    pub fn total_count(&self) -> u64 {
        self.total_count
    }

    pub(crate) fn total_min(&self) -> f32 {
        self.total_min
    }

    pub(crate) fn total_max(&self) -> f32 {
        self.total_max
    }

    pub(crate) fn total_sum(&self) -> f64 {
        self.total_sum
    }

    /// Commit one sample.
    ///
    /// Updates lifetime aggregates and recomputes the windowed
    /// aggregates over the most recent `min(total_count, window_limit)`
    /// samples.
    pub fn push(&mut self, value: f32) {
        let capacity = self.data.len();
        let slot = self.write_offset % capacity;
        self.data[slot] = value;
        self.write_offset = (slot + 1) % capacity;
        self.total_count += 1;
        self.total_sum += f64::from(value);
        self.total_min = self.total_min.min(value);
        self.total_max = self.total_max.max(value);
        self.recompute_window();
    }

    /// Set the windowed-statistics limit, clamped to `[1, capacity]`.
    ///
    /// Takes effect on future pushes; stored samples are never
    /// discarded.
    pub fn set_window_limit(&mut self, limit: usize) {
        self.window_limit = limit.clamp(1, self.data.len());
    }

    /// Current windowed statistics.
    #[must_use]
    pub fn windowed(&self) -> WindowedStats {
        self.windowed
    }

    /// Lifetime statistics over every sample ever pushed.
    #[must_use]
    pub fn lifetime(&self) -> LifetimeStats {
        if self.total_count == 0 {
            return LifetimeStats::default();
        }
        #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
        let average = (self.total_sum / self.total_count as f64) as f32;
        LifetimeStats {
            min: self.total_min,
            max: self.total_max,
            average,
            total_count: self.total_count,
        }
    }

    /// Rotate the backing storage so index 0 holds the oldest retained
    /// sample and the highest occupied index the newest, then move
    /// `write_offset` to the linear end.
    ///
    /// A ring that never wrapped, or that was already linearized, is
    /// left untouched, so repeated calls are safe.
    pub fn linearize(&mut self) {
        let capacity = self.data.len();
        if self.total_count < capacity as u64 || self.write_offset == capacity {
            return;
        }
        self.data.rotate_left(self.write_offset);
        self.write_offset = capacity;
    }

    /// Read-only view over the full capacity window, in physical order.
    #[must_use]
    pub fn raw_view(&self) -> &[f32] {
        &self.data
    }

    fn recompute_window(&mut self) {
        if self.total_count == 0 {
            self.windowed = WindowedStats::default();
            return;
        }
        let capacity = self.data.len();
        #[allow(clippy::cast_possible_truncation)]
        let retained = self.total_count.min(capacity as u64) as usize;
        let span = self.window_limit.min(retained);
        let newest = (self.write_offset + capacity - 1) % capacity;

        let mut min = f32::INFINITY;
        let mut max = f32::NEG_INFINITY;
        let mut sum = 0.0_f64;
        for back in 0..span {
            let idx = (self.write_offset + capacity - 1 - back) % capacity;
            let value = self.data[idx];
            min = min.min(value);
            max = max.max(value);
            sum += f64::from(value);
        }

        #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
        let average = (sum / span as f64) as f32;
        self.windowed = WindowedStats {
            min,
            max,
            average,
            last: self.data[newest],
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lifetime_tracks_every_push() {
        let mut series = SampleSeries::with_capacity(4);

        for (i, value) in [10.0, 1.0, 2.0, 3.0, 4.0].into_iter().enumerate() {
            series.push(value);
            assert_eq!(series.total_count(), i as u64 + 1);
        }

        // 10.0 was evicted from the ring but stays in the lifetime stats.
        let lifetime = series.lifetime();
        assert_eq!(lifetime.min, 1.0);
        assert_eq!(lifetime.max, 10.0);
        assert_eq!(lifetime.total_count, 5);
        assert!((lifetime.average - 4.0).abs() < 1e-6);
    }

    #[test]
    fn windowed_mean_covers_exactly_the_last_k() {
        let mut series = SampleSeries::with_capacity(8);
        series.set_window_limit(3);

        for value in 1..=6 {
            series.push(value as f32);
        }

        let windowed = series.windowed();
        assert_eq!(windowed.min, 4.0);
        assert_eq!(windowed.max, 6.0);
        assert_eq!(windowed.last, 6.0);
        assert!((windowed.average - 5.0).abs() < 1e-6);
    }

    #[test]
    fn windowed_before_window_fills() {
        let mut series = SampleSeries::with_capacity(8);
        series.set_window_limit(4);

        series.push(2.0);
        series.push(6.0);

        let windowed = series.windowed();
        assert_eq!(windowed.min, 2.0);
        assert_eq!(windowed.max, 6.0);
        assert!((windowed.average - 4.0).abs() < 1e-6);
    }

    #[test]
    fn wrap_around_keeps_last_capacity_values() {
        let mut series = SampleSeries::with_capacity(4);

        for value in 1..=5 {
            series.push(value as f32);
        }

        assert_eq!(series.raw_view(), &[5.0, 2.0, 3.0, 4.0]);
        assert_eq!(series.write_offset(), 1);
    }

    #[test]
    fn linearize_restores_chronological_order() {
        let mut series = SampleSeries::with_capacity(4);

        for value in 1..=5 {
            series.push(value as f32);
        }

        series.linearize();
        assert_eq!(series.raw_view(), &[2.0, 3.0, 4.0, 5.0]);
        assert_eq!(series.write_offset(), 4);

        // Second call is a no-op.
        series.linearize();
        assert_eq!(series.raw_view(), &[2.0, 3.0, 4.0, 5.0]);
        assert_eq!(series.write_offset(), 4);
    }

    #[test]
    fn linearize_on_unwrapped_ring_is_a_no_op() {
        let mut series = SampleSeries::with_capacity(4);
        series.push(1.0);
        series.push(2.0);

        series.linearize();
        assert_eq!(series.raw_view(), &[1.0, 2.0, 0.0, 0.0]);
        assert_eq!(series.write_offset(), 2);
    }

    #[test]
    fn push_after_linearize_overwrites_oldest() {
        let mut series = SampleSeries::with_capacity(4);
        for value in 1..=5 {
            series.push(value as f32);
        }
        series.linearize();

        series.push(6.0);
        assert_eq!(series.raw_view(), &[6.0, 3.0, 4.0, 5.0]);
        assert_eq!(series.write_offset(), 1);
        assert_eq!(series.windowed().last, 6.0);
    }

    #[test]
    fn window_limit_is_clamped() {
        let mut series = SampleSeries::with_capacity(8);

        series.set_window_limit(0);
        assert_eq!(series.window_limit(), 1);

        series.set_window_limit(100);
        assert_eq!(series.window_limit(), 8);
    }

    #[test]
    fn shrinking_window_limit_keeps_stored_data() {
        let mut series = SampleSeries::with_capacity(8);
        for value in 1..=6 {
            series.push(value as f32);
        }

        series.set_window_limit(2);
        series.push(7.0);

        let windowed = series.windowed();
        assert!((windowed.average - 6.5).abs() < 1e-6);
        assert_eq!(series.total_count(), 7);
        assert_eq!(series.lifetime().min, 1.0);
    }
}
