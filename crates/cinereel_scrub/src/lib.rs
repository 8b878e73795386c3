// SPDX-License-Identifier: MIT OR Apache-2.0
//! Scrub engine for Cinereel clips.
//!
//! This crate turns a clip and a time window into what the host should
//! apply this tick:
//! - Camera position and look-at point
//! - Two-layer animation crossfades
//! - Actor positions and facings from movements and follow paths
//! - Particle seek requests
//! - Edge-triggered enter events
//!
//! ## Architecture
//!
//! Evaluation is stateless. The caller supplies `(prev_time, current_time)`
//! on every call and an [`ActorResolver`] that maps actor names to host
//! handles. Actors that cannot be resolved are logged and skipped.

pub mod evaluate;
pub mod resolver;
pub mod settings;

pub use evaluate::{
    camera_sample_at_time, crossfade, evaluate, normalized_time, AnimationBlend, AnimationLayer,
    CameraPose, Crossfade, EvaluationResult, ParticleCue, ParticlePhase, ScrubEvent, Scrubber,
};
pub use resolver::{ActorHints, ActorResolver, ANY_ANIMATED_ACTOR};
pub use settings::{ScrubError, ScrubSettings, FACING_EPSILON_SQ};
