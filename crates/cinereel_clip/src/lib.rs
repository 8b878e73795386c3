// SPDX-License-Identifier: MIT OR Apache-2.0
//! Clip model and editing engine for Cinereel.
//!
//! This crate provides the data side of cinematic sequencing:
//! - Track-based sample collections (camera paths, animations, follow
//!   paths, particles, movements)
//! - Pair queries with crossfade overlap and gap fallback
//! - Curve math for camera and path evaluation
//! - Tag-based clip merging with master/slave re-timing
//!
//! ## Architecture
//!
//! A [`Clip`] owns one typed collection per sample variant. Generic
//! operations go through the [`SampleVariant`] trait, which maps each
//! variant to its collection. Nothing here talks to a scene; per-tick
//! evaluation lives in `cinereel_scrub`.

pub mod clip;
pub mod error;
pub mod merge;
pub mod query;
pub mod sample;
pub mod spline;

pub use clip::{Clip, Moment, SampleLocation, SHIFT_EPSILON_SQ};
pub use error::ClipError;
pub use merge::FADE_EPSILON;
pub use query::{Fades, SamplePair};
pub use sample::{
    CameraPathKey, CameraPathSample, FollowPathKey, FollowPathSample, KeyedSample,
    MecanimInternals, MecanimSample, MovementKey, MovementSample, ParticleSample, Pose, Sample,
    SampleBase, SampleId, SampleKind, SampleVariant, DEFAULT_CHASE_POINT_OFFSET, UNKNOWN_ACTOR,
    UNKNOWN_STATE, UNSET_TAG,
};
pub use spline::{clamped_local_time, local_time, Interpolation};
