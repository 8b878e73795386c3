// SPDX-License-Identifier: MIT OR Apache-2.0
//! Clip errors.

use crate::sample::{SampleId, SampleKind};

/// Error raised by clip persistence and explicit validation.
///
/// Evaluation never fails: degenerate input is clamped instead.
#[derive(Debug, thiserror::Error)]
pub enum ClipError {
    /// RON serialization failed
    #[error("Failed to serialize clip: {0}")]
    Serialize(#[from] ron::Error),

    /// RON parsing failed
    #[error("Failed to parse clip: {0}")]
    Parse(#[from] ron::error::SpannedError),

    /// Key index past the end of a keyed sample
    #[error("Key index {index} out of range ({count} keys)")]
    KeyOutOfRange {
        /// Requested key
        index: usize,
        /// Number of keys in the sample
        count: usize,
    },

    /// Control point index past the end of a camera path
    #[error("Control point {index} out of range ({count} keys)")]
    PointOutOfRange {
        /// Requested point
        index: usize,
        /// Number of keys in the sample
        count: usize,
    },

    /// A sample does not carry the minimum number of keys for its type
    #[error("{kind:?} sample {id:?} has {count} keys, needs at least {min}")]
    TooFewKeys {
        /// Sample variant
        kind: SampleKind,
        /// Offending sample
        id: SampleId,
        /// Keys present
        count: usize,
        /// Keys required
        min: usize,
    },
}
