//! Versioned binary snapshot codec for baseline persistence.
//!
//! A snapshot is one scope's complete image: name, metric kind,
//! per-frame fields (carried but ignored on load), the full
//! capacity-sized sample buffer in chronological order, window limit,
//! total count, and lifetime aggregates. The image starts with a magic
//! plus version header so old baseline files stay readable across
//! format evolution.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::limits::{MAX_SCOPE_NAME_LEN, SAMPLE_CAPACITY};
use crate::scope::{MetricKind, ScopeRecord};
use crate::series::SampleSeries;

/// File magic for snapshot images.
const MAGIC: [u8; 4] = *b"FSCP";

/// Snapshot format version for compatibility checking.
pub const SNAPSHOT_VERSION: u8 = 1;

const HEADER_LEN: usize = MAGIC.len() + 1;

/// Why a snapshot image failed to decode.
///
/// A missing or corrupt baseline file is a common, recoverable
/// situation; callers fall back to a default record rather than
/// treating any of these as fatal.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// Image shorter than the header.
    #[error("snapshot image truncated")]
    Truncated,

    /// Header magic does not match.
    #[error("not a snapshot image (bad magic)")]
    BadMagic,

    /// Image written by an incompatible format version.
    #[error("unsupported snapshot version {0}")]
    UnsupportedVersion(u8),

    /// Metric-kind tag outside the known range.
    #[error("unknown metric kind tag {0}")]
    BadMetricKind(u8),

    /// Body failed structural validation.
    #[error("malformed snapshot body: {0}")]
    Malformed(String),
}

/// Wire image of one scope record. Field order is the on-disk order.
#[derive(Serialize, Deserialize)]
struct SnapshotImage {
    /// Fixed-width name, NUL-padded to [`MAX_SCOPE_NAME_LEN`].
    name: Vec<u8>,
    kind: u8,
    invocations: u32,
    accumulator: f64,
    /// Full capacity-sized buffer, oldest first.
    samples: Vec<f32>,
    window_limit: u32,
    total_count: u64,
    total_min: f32,
    total_max: f32,
    total_sum: f64,
}

/// Encode a scope record as a snapshot image.
///
/// Linearizes the record's sample ring first so the stored buffer needs
/// no offset metadata to replay in chronological order.
pub fn encode(record: &mut ScopeRecord) -> Result<Vec<u8>, bincode::Error> {
    record.samples_mut().linearize();

    let mut name = vec![0u8; MAX_SCOPE_NAME_LEN];
    let bytes = record.name().as_bytes();
    let len = bytes.len().min(MAX_SCOPE_NAME_LEN);
    name[..len].copy_from_slice(&bytes[..len]);

    let series = record.samples();
    #[allow(clippy::cast_possible_truncation)]
    let image = SnapshotImage {
        name,
        kind: record.kind().tag(),
        invocations: record.invocations_this_frame(),
        accumulator: record.accumulator_this_frame(),
        samples: series.raw_view().to_vec(),
        window_limit: series.window_limit() as u32,
        total_count: series.total_count(),
        total_min: series.total_min(),
        total_max: series.total_max(),
        total_sum: series.total_sum(),
    };

    let body = bincode::serialize(&image)?;
    let mut out = Vec::with_capacity(HEADER_LEN + body.len());
    out.extend_from_slice(&MAGIC);
    out.push(SNAPSHOT_VERSION);
    out.extend(body);
    Ok(out)
}

/// Decode a snapshot image into a standalone record.
///
/// The stored name is replaced with `override_name` so a renamed
/// baseline file can be compared against a differently-named current
/// scope; everything else is taken literally, with no recomputation of
/// the stored aggregates. Failure never yields a partially populated
/// record.
pub fn decode(bytes: &[u8], override_name: &str) -> Result<ScopeRecord, DecodeError> {
    if bytes.len() < HEADER_LEN {
        return Err(DecodeError::Truncated);
    }
    if bytes[..MAGIC.len()] != MAGIC {
        return Err(DecodeError::BadMagic);
    }
    let version = bytes[MAGIC.len()];
    if version != SNAPSHOT_VERSION {
        return Err(DecodeError::UnsupportedVersion(version));
    }

    let image: SnapshotImage = bincode::deserialize(&bytes[HEADER_LEN..])
        .map_err(|e| DecodeError::Malformed(e.to_string()))?;

    if image.name.len() != MAX_SCOPE_NAME_LEN {
        return Err(DecodeError::Malformed(format!(
            "name field is {} bytes, expected {MAX_SCOPE_NAME_LEN}",
            image.name.len()
        )));
    }
    if image.samples.len() != SAMPLE_CAPACITY {
        return Err(DecodeError::Malformed(format!(
            "sample buffer holds {} values, expected {SAMPLE_CAPACITY}",
            image.samples.len()
        )));
    }
    let kind = MetricKind::from_tag(image.kind).ok_or(DecodeError::BadMetricKind(image.kind))?;

    // The buffer was linearized at encode time, so the write offset is
    // the linear end of the retained data.
    #[allow(clippy::cast_possible_truncation)]
    let write_offset = image.total_count.min(SAMPLE_CAPACITY as u64) as usize;
    let series = SampleSeries::from_parts(
        image.samples.into_boxed_slice(),
        write_offset,
        image.window_limit as usize,
        image.total_count,
        image.total_min,
        image.total_max,
        image.total_sum,
    );

    Ok(ScopeRecord::from_parts(override_name, kind, series))
}
