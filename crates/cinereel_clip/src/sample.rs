// SPDX-License-Identifier: MIT OR Apache-2.0
//! Sample definitions for the sequencer.
//!
//! A sample is a timed cue on a numbered track. Every variant carries the
//! same [`SampleBase`] record; variant payloads hold keys and playback data.

use crate::clip::Clip;
use crate::error::ClipError;
use crate::spline::{clamped_local_time, local_time, Interpolation};
use glam::{Mat4, Vec3};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Tag of a sample that is not bound to anything
pub const UNSET_TAG: &str = "__NOT_SET__";

/// Actor name of a freshly created sample
pub const UNKNOWN_ACTOR: &str = "UNKNOWN";

/// Animation state of a freshly created animation sample
pub const UNKNOWN_STATE: &str = "UNKNOWN";

/// Default chase point offset of a follow path, in seconds
pub const DEFAULT_CHASE_POINT_OFFSET: f32 = 0.1;

/// Offsets at or below this magnitude count as "not set"
const CHASE_OFFSET_EPSILON: f32 = 0.00001;

fn unset_tag() -> String {
    UNSET_TAG.to_string()
}

fn unknown_actor() -> String {
    UNKNOWN_ACTOR.to_string()
}

fn unknown_state() -> String {
    UNKNOWN_STATE.to_string()
}

fn default_chase_point_offset() -> f32 {
    DEFAULT_CHASE_POINT_OFFSET
}

fn one() -> f32 {
    1.0
}

/// Unique identifier for a sample
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SampleId(pub Uuid);

impl SampleId {
    /// Create a new random sample ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SampleId {
    fn default() -> Self {
        Self::new()
    }
}

/// Variant of a sample
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SampleKind {
    /// Camera position or look-at curve
    CameraPath,
    /// Skeletal animation cue
    Mecanim,
    /// Path-following motion
    FollowPath,
    /// Particle cue
    Particle,
    /// Point-to-point movement
    Movement,
}

impl SampleKind {
    /// Get the display name
    pub fn name(&self) -> &'static str {
        match self {
            Self::CameraPath => "Camera Path",
            Self::Mecanim => "Animation",
            Self::FollowPath => "Follow Path",
            Self::Particle => "Particle",
            Self::Movement => "Movement",
        }
    }

    /// Get all sample kinds
    pub fn all() -> &'static [SampleKind] {
        &[
            SampleKind::CameraPath,
            SampleKind::Mecanim,
            SampleKind::FollowPath,
            SampleKind::Particle,
            SampleKind::Movement,
        ]
    }
}

/// Fields shared by every sample variant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SampleBase {
    /// Unique sample ID
    #[serde(default)]
    pub id: SampleId,
    /// Track index; lower tracks are masters
    pub track: u32,
    /// Start time in seconds from clip start
    pub start_time: f32,
    /// Duration in seconds
    pub duration: f32,
    /// Binding tag linking slaves to a master animation
    #[serde(default = "unset_tag")]
    pub tag: String,
    /// Logical actor, resolved by the host
    #[serde(default = "unknown_actor")]
    pub actor_prefab: String,
}

impl SampleBase {
    /// Create base fields for a new sample
    pub fn new(track: u32, start_time: f32, duration: f32) -> Self {
        Self {
            id: SampleId::new(),
            track,
            start_time,
            duration,
            tag: unset_tag(),
            actor_prefab: unknown_actor(),
        }
    }

    /// Set the binding tag
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = tag.into();
        self
    }

    /// Set the actor
    pub fn with_actor(mut self, actor: impl Into<String>) -> Self {
        self.actor_prefab = actor.into();
        self
    }

    /// End time (`start_time + duration`)
    pub fn end_time(&self) -> f32 {
        self.start_time + self.duration
    }

    /// Whether the sample carries a real tag
    pub fn is_tagged(&self) -> bool {
        self.tag != UNSET_TAG
    }

    /// Whether `time` falls inside `[start_time, end_time]`
    pub fn contains(&self, time: f32) -> bool {
        self.start_time <= time && time <= self.end_time()
    }
}

/// Behavior shared by the five sample variants.
///
/// Each variant owns one typed collection inside [`Clip`]; `collection`
/// and `collection_mut` are the static registry from variant to container.
pub trait SampleVariant: Clone + std::fmt::Debug + Sized {
    /// Variant tag
    const KIND: SampleKind;

    /// Shared fields
    fn base(&self) -> &SampleBase;

    /// Shared fields, mutable
    fn base_mut(&mut self) -> &mut SampleBase;

    /// The clip collection holding this variant
    fn collection(clip: &Clip) -> &Vec<Self>;

    /// The clip collection holding this variant, mutable
    fn collection_mut(clip: &mut Clip) -> &mut Vec<Self>;

    /// Wrap into the closed sample enum
    fn into_sample(self) -> Sample;

    /// Drop keyed payload
    fn clear(&mut self) {}

    /// Deep copy with a fresh ID
    fn duplicate(&self) -> Self {
        let mut clone = self.clone();
        clone.base_mut().id = SampleId::new();
        clone
    }

    /// Copy with a new duration
    fn clone_resize(&self, duration: f32) -> Self {
        let mut clone = self.duplicate();
        clone.base_mut().duration = duration;
        clone
    }

    /// Copy with the duration grown by `extension`
    fn clone_extend(&self, extension: f32) -> Self {
        let mut clone = self.duplicate();
        clone.base_mut().duration += extension;
        clone
    }

    /// Copy moved by `offset` seconds
    fn clone_shift(&self, offset: f32) -> Self {
        let mut clone = self.duplicate();
        clone.base_mut().start_time += offset;
        clone
    }

    /// Copy starting at `start_time`
    fn clone_set_start(&self, start_time: f32) -> Self {
        let mut clone = self.duplicate();
        clone.base_mut().start_time = start_time;
        clone
    }

    /// Copy moved down by `baseline_track` tracks
    fn clone_rebase(&self, baseline_track: u32) -> Self {
        let mut clone = self.duplicate();
        clone.base_mut().track += baseline_track;
        clone
    }
}

/// Samples with an editable list of normalized key times
pub trait KeyedSample {
    /// Number of keys
    fn key_count(&self) -> usize;

    /// Normalized time of every key
    fn key_times(&self) -> Vec<f32>;

    /// Set the normalized time of a key
    fn set_key_time(&mut self, key: usize, time: f32) -> Result<(), ClipError>;

    /// Remove a key
    fn remove_key(&mut self, key: usize) -> Result<(), ClipError>;
}

/// Position with an optional explicit facing
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pose {
    /// World position
    pub position: Vec3,
    /// Facing direction; `None` means "derive it from motion"
    pub facing: Option<Vec3>,
}

// ---------------------------------------------------------------------------
// Camera paths
// ---------------------------------------------------------------------------

/// A camera path key: incoming tangent, anchor, outgoing tangent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CameraPathKey {
    /// `[incoming tangent, anchor, outgoing tangent]`
    pub nodes: [Vec3; 3],
    /// Normalized time inside the sample
    pub time_norm: f32,
}

impl CameraPathKey {
    /// Create a key with explicit tangents
    pub fn new(time_norm: f32, in_tangent: Vec3, anchor: Vec3, out_tangent: Vec3) -> Self {
        Self {
            nodes: [in_tangent, anchor, out_tangent],
            time_norm,
        }
    }

    /// Create a key whose tangents sit on the anchor
    pub fn at(time_norm: f32, anchor: Vec3) -> Self {
        Self::new(time_norm, anchor, anchor, anchor)
    }

    /// Incoming tangent
    pub fn in_tangent(&self) -> Vec3 {
        self.nodes[0]
    }

    /// Anchor point
    pub fn anchor(&self) -> Vec3 {
        self.nodes[1]
    }

    /// Outgoing tangent
    pub fn out_tangent(&self) -> Vec3 {
        self.nodes[2]
    }
}

/// Camera position or look-at curve
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CameraPathSample {
    /// Base sample data
    pub base: SampleBase,
    /// Look-at target curve instead of a camera position curve
    #[serde(default)]
    pub is_lookat_path: bool,
    /// Legacy flat control run, converted to keys on load or clone
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub legacy_points: Vec<Vec3>,
    /// Curve keys
    #[serde(default)]
    pub keys: Vec<CameraPathKey>,
}

impl CameraPathSample {
    /// Create an empty camera path
    pub fn new(base: SampleBase, is_lookat_path: bool) -> Self {
        Self {
            base,
            is_lookat_path,
            legacy_points: Vec::new(),
            keys: Vec::new(),
        }
    }

    /// Set the keys
    pub fn with_keys(mut self, keys: Vec<CameraPathKey>) -> Self {
        self.keys = keys;
        self
    }

    /// Key owning a point of the flat control run
    pub fn key_from_point(point_index: usize) -> usize {
        (point_index + 1) / 3
    }

    /// Flat control run for drawing and [`Interpolation::spline`]
    ///
    /// `3n - 2` points for `n` keys; empty below two keys.
    pub fn points(&self) -> Vec<Vec3> {
        let n = self.keys.len();
        if n < 2 {
            return Vec::new();
        }
        let mut points = Vec::with_capacity(n * 3 - 2);
        points.push(self.keys[0].anchor());
        points.push(self.keys[0].out_tangent());
        for key in &self.keys[1..n - 1] {
            points.extend_from_slice(&key.nodes);
        }
        points.push(self.keys[n - 1].in_tangent());
        points.push(self.keys[n - 1].anchor());
        points
    }

    /// Replace the curve with a flat control run.
    ///
    /// Keys are rebuilt at even normalized times when the point count does
    /// not match the current key count.
    pub fn set_points(&mut self, points: &[Vec3]) {
        let key_count = (2 + points.len()) / 3;
        if self.keys.len() != key_count {
            self.keys = (0..key_count)
                .map(|i| {
                    let t = if key_count > 1 {
                        i as f32 / (key_count - 1) as f32
                    } else {
                        0.0
                    };
                    CameraPathKey::at(t, Vec3::ZERO)
                })
                .collect();
            tracing::debug!("Importing {} camera points into {} keys", points.len(), key_count);
        }
        for (i, point) in points.iter().enumerate() {
            let key = Self::key_from_point(i);
            if let Some(k) = self.keys.get_mut(key) {
                k.nodes[(i + 1) % 3] = *point;
            }
        }
    }

    /// Move one point of the flat control run
    pub fn update_point(&mut self, point_index: usize, value: Vec3) -> Result<(), ClipError> {
        let count = self.keys.len();
        let key = self
            .keys
            .get_mut(Self::key_from_point(point_index))
            .ok_or(ClipError::PointOutOfRange { index: point_index, count })?;
        key.nodes[(point_index + 1) % 3] = value;
        Ok(())
    }

    /// Convert legacy flat points into keys. Returns whether anything was ported.
    pub fn port_legacy_points(&mut self) -> bool {
        if self.legacy_points.is_empty() {
            return false;
        }
        let points = std::mem::take(&mut self.legacy_points);
        self.set_points(&points);
        true
    }

    /// Curve point at an absolute clip time
    pub fn evaluate(&self, time: f32) -> Vec3 {
        self.evaluate_with_segment(time).0
    }

    /// Curve point at an absolute clip time and the index of its segment.
    ///
    /// Fewer than two keys yields `Vec3::ZERO`.
    pub fn evaluate_with_segment(&self, time: f32) -> (Vec3, usize) {
        let n = self.keys.len();
        if n < 2 {
            return (Vec3::ZERO, 0);
        }
        let norm = clamped_local_time(time, self.base.start_time, self.base.duration, false, 1.0);
        let first = &self.keys[0];
        let last = &self.keys[n - 1];
        if norm <= first.time_norm {
            return (first.anchor(), 0);
        }
        if norm >= last.time_norm {
            return (last.anchor(), n - 1);
        }
        for (i, pair) in self.keys.windows(2).enumerate() {
            let (k0, k1) = (&pair[0], &pair[1]);
            if norm >= k0.time_norm && norm < k1.time_norm {
                let t = (norm - k0.time_norm) / (k1.time_norm - k0.time_norm);
                let pos = Interpolation::bezier(
                    k0.anchor(),
                    k0.out_tangent(),
                    k1.in_tangent(),
                    k1.anchor(),
                    t,
                );
                return (pos, i);
            }
        }
        // Keys out of order
        (Vec3::ZERO, 0)
    }

    /// Insert a key on the curve at an absolute clip time. Returns its index.
    pub fn insert_key_at(&mut self, time: f32) -> usize {
        let (pos, segment) = self.evaluate_with_segment(time);
        let time_norm =
            clamped_local_time(time, self.base.start_time, self.base.duration, false, 1.0);
        let index = (segment + 1).min(self.keys.len());
        self.keys.insert(index, CameraPathKey::at(time_norm, pos));
        index
    }

    /// Apply an affine transform to every control point
    pub fn transform(&mut self, m: &Mat4) {
        for key in &mut self.keys {
            for node in &mut key.nodes {
                *node = m.transform_point3(*node);
            }
        }
        for point in &mut self.legacy_points {
            *point = m.transform_point3(*point);
        }
    }
}

impl SampleVariant for CameraPathSample {
    const KIND: SampleKind = SampleKind::CameraPath;

    fn base(&self) -> &SampleBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut SampleBase {
        &mut self.base
    }

    fn collection(clip: &Clip) -> &Vec<Self> {
        &clip.camera_paths
    }

    fn collection_mut(clip: &mut Clip) -> &mut Vec<Self> {
        &mut clip.camera_paths
    }

    fn into_sample(self) -> Sample {
        Sample::CameraPath(self)
    }

    fn clear(&mut self) {
        self.legacy_points.clear();
        self.keys.clear();
    }

    fn duplicate(&self) -> Self {
        let mut clone = self.clone();
        clone.base.id = SampleId::new();
        clone.port_legacy_points();
        clone
    }
}

impl KeyedSample for CameraPathSample {
    fn key_count(&self) -> usize {
        self.keys.len()
    }

    fn key_times(&self) -> Vec<f32> {
        self.keys.iter().map(|k| k.time_norm).collect()
    }

    fn set_key_time(&mut self, key: usize, time: f32) -> Result<(), ClipError> {
        let count = self.keys.len();
        let k = self
            .keys
            .get_mut(key)
            .ok_or(ClipError::KeyOutOfRange { index: key, count })?;
        k.time_norm = time;
        Ok(())
    }

    fn remove_key(&mut self, key: usize) -> Result<(), ClipError> {
        if key >= self.keys.len() {
            return Err(ClipError::KeyOutOfRange { index: key, count: self.keys.len() });
        }
        self.keys.remove(key);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Animation
// ---------------------------------------------------------------------------

/// Animation data captured from the source animation for offline use
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct MecanimInternals {
    /// Source animation length in seconds
    pub duration: f32,
    /// Root motion over the whole animation
    pub offset: Vec3,
    /// Root motion speed
    pub speed: f32,
    /// Source animation loops natively
    pub is_looping: bool,
}

/// Skeletal animation cue
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MecanimSample {
    /// Base sample data
    pub base: SampleBase,
    /// Animation state name
    #[serde(default = "unknown_state")]
    pub state: String,
    /// Loop the take over the sample duration
    #[serde(default)]
    pub looped: bool,
    /// Start of the used take, normalized into the source animation
    #[serde(default)]
    pub take_start_norm: f32,
    /// Length of the used take, normalized into the source animation
    #[serde(default = "one")]
    pub take_duration_norm: f32,
    /// Captured source animation data
    #[serde(default)]
    pub internals: MecanimInternals,
}

impl MecanimSample {
    /// Create an animation cue
    pub fn new(base: SampleBase, state: impl Into<String>) -> Self {
        Self {
            base,
            state: state.into(),
            looped: false,
            take_start_norm: 0.0,
            take_duration_norm: 1.0,
            internals: MecanimInternals::default(),
        }
    }

    /// Set looping with captured internals
    pub fn looped(mut self, internals: MecanimInternals) -> Self {
        self.looped = true;
        self.internals = internals;
        self
    }

    /// Length of one loop iteration in seconds
    pub fn one_shot_duration(&self) -> f32 {
        self.take_duration_norm * self.internals.duration
    }

    /// Normalized time into the source animation at an absolute clip time
    pub fn sampling_time(&self, current_time: f32) -> f32 {
        let local = clamped_local_time(
            current_time,
            self.base.start_time,
            self.base.duration,
            self.looped,
            self.one_shot_duration(),
        );
        self.take_start_norm + self.take_duration_norm * local
    }
}

impl SampleVariant for MecanimSample {
    const KIND: SampleKind = SampleKind::Mecanim;

    fn base(&self) -> &SampleBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut SampleBase {
        &mut self.base
    }

    fn collection(clip: &Clip) -> &Vec<Self> {
        &clip.mecanims
    }

    fn collection_mut(clip: &mut Clip) -> &mut Vec<Self> {
        &mut clip.mecanims
    }

    fn into_sample(self) -> Sample {
        Sample::Mecanim(self)
    }
}

// ---------------------------------------------------------------------------
// Follow paths
// ---------------------------------------------------------------------------

/// A follow path key
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FollowPathKey {
    /// Key position
    pub position: Vec3,
    /// Explicit facing; zero means "derive from motion"
    #[serde(default)]
    pub facing: Vec3,
    /// Normalized time inside the sample
    pub time_norm: f32,
    /// Chase point offset used while on the segment starting here
    #[serde(default)]
    pub chase_point_offset_override: Option<f32>,
}

impl FollowPathKey {
    /// Create a key without an explicit facing
    pub fn new(time_norm: f32, position: Vec3) -> Self {
        Self {
            position,
            facing: Vec3::ZERO,
            time_norm,
            chase_point_offset_override: None,
        }
    }

    /// Set the explicit facing
    pub fn with_facing(mut self, facing: Vec3) -> Self {
        self.facing = facing;
        self
    }
}

/// Path-following motion
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FollowPathSample {
    /// Base sample data
    pub base: SampleBase,
    /// Default look-ahead in seconds for the chase point
    #[serde(default = "default_chase_point_offset")]
    pub chase_point_offset: f32,
    /// Path keys
    #[serde(default)]
    pub keys: Vec<FollowPathKey>,
}

impl FollowPathSample {
    /// Create an empty follow path
    pub fn new(base: SampleBase) -> Self {
        Self {
            base,
            chase_point_offset: DEFAULT_CHASE_POINT_OFFSET,
            keys: Vec::new(),
        }
    }

    /// Set the keys
    pub fn with_keys(mut self, keys: Vec<FollowPathKey>) -> Self {
        self.keys = keys;
        self
    }

    /// Key positions
    pub fn positions(&self) -> Vec<Vec3> {
        self.keys.iter().map(|k| k.position).collect()
    }

    /// Overwrite key positions, pairwise up to the shorter length
    pub fn update_positions(&mut self, positions: &[Vec3]) {
        for (key, pos) in self.keys.iter_mut().zip(positions) {
            key.position = *pos;
        }
    }

    /// Overwrite key times, pairwise up to the shorter length
    pub fn update_times(&mut self, times: &[f32]) {
        for (key, t) in self.keys.iter_mut().zip(times) {
            key.time_norm = *t;
        }
    }

    /// Length of the segment starting at `index`; 0 past the last segment
    pub fn segment_length(&self, index: usize) -> f32 {
        if index + 1 >= self.keys.len() {
            return 0.0;
        }
        self.keys[index + 1].position.distance(self.keys[index].position)
    }

    /// Segment index and segment-local parameter for a normalized time
    fn locate(&self, norm: f32) -> Option<(usize, f32)> {
        let n = self.keys.len();
        if n == 0 {
            return None;
        }
        if n == 1 || norm <= 0.0 {
            return Some((0, 0.0));
        }
        if norm >= 1.0 {
            return Some((n - 2, 1.0));
        }
        for (i, pair) in self.keys.windows(2).enumerate() {
            let (t0, t1) = (pair[0].time_norm, pair[1].time_norm);
            if norm >= t0 && norm < t1 {
                return Some((i, (norm - t0) / (t1 - t0)));
            }
        }
        if norm >= self.keys[n - 1].time_norm {
            Some((n - 2, 1.0))
        } else {
            Some((0, 0.0))
        }
    }

    /// Point on the path at a normalized time and its segment index
    pub fn point_on_path(&self, norm: f32) -> (Vec3, usize) {
        match self.locate(norm) {
            None => (Vec3::ZERO, 0),
            Some((i, t)) => {
                let p0 = self.keys[i].position;
                let p1 = self.keys.get(i + 1).map_or(p0, |k| k.position);
                (p0.lerp(p1, t), i)
            }
        }
    }

    /// Pose at an absolute clip time.
    ///
    /// Facing is interpolated between the segment's keys only when both
    /// carry an explicit facing.
    pub fn evaluate(&self, time: f32) -> Pose {
        let norm = clamped_local_time(time, self.base.start_time, self.base.duration, false, 1.0);
        let Some((i, t)) = self.locate(norm) else {
            return Pose { position: Vec3::ZERO, facing: None };
        };
        let k0 = &self.keys[i];
        let k1 = self.keys.get(i + 1).unwrap_or(k0);
        let facing = (Interpolation::has_direction(k0.facing)
            && Interpolation::has_direction(k1.facing))
        .then(|| Interpolation::slerp_direction(k0.facing, k1.facing, t));
        Pose {
            position: k0.position.lerp(k1.position, t),
            facing,
        }
    }

    /// Look-ahead point used to derive facing from motion.
    ///
    /// The offset comes from the current segment's key override, else the
    /// sample default, else `fallback_offset`.
    pub fn chase_point(&self, time: f32, fallback_offset: f32) -> Vec3 {
        if self.keys.is_empty() {
            return Vec3::ZERO;
        }
        let norm = local_time(time, self.base.start_time, self.base.duration).clamp(0.0, 1.0);
        let norm = if norm.is_nan() { 0.0 } else { norm };
        let (_, segment) = self.point_on_path(norm);
        let offset = self.keys[segment]
            .chase_point_offset_override
            .filter(|o| o.abs() > CHASE_OFFSET_EPSILON)
            .or_else(|| {
                (self.chase_point_offset.abs() > CHASE_OFFSET_EPSILON)
                    .then_some(self.chase_point_offset)
            })
            .unwrap_or(fallback_offset);
        let ahead = if self.base.duration > 0.0 {
            norm + offset / self.base.duration
        } else {
            norm
        };
        self.point_on_path(ahead).0
    }
}

impl SampleVariant for FollowPathSample {
    const KIND: SampleKind = SampleKind::FollowPath;

    fn base(&self) -> &SampleBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut SampleBase {
        &mut self.base
    }

    fn collection(clip: &Clip) -> &Vec<Self> {
        &clip.follow_paths
    }

    fn collection_mut(clip: &mut Clip) -> &mut Vec<Self> {
        &mut clip.follow_paths
    }

    fn into_sample(self) -> Sample {
        Sample::FollowPath(self)
    }

    fn clear(&mut self) {
        self.keys.clear();
    }
}

impl KeyedSample for FollowPathSample {
    fn key_count(&self) -> usize {
        self.keys.len()
    }

    fn key_times(&self) -> Vec<f32> {
        self.keys.iter().map(|k| k.time_norm).collect()
    }

    fn set_key_time(&mut self, key: usize, time: f32) -> Result<(), ClipError> {
        let count = self.keys.len();
        let k = self
            .keys
            .get_mut(key)
            .ok_or(ClipError::KeyOutOfRange { index: key, count })?;
        k.time_norm = time;
        Ok(())
    }

    fn remove_key(&mut self, key: usize) -> Result<(), ClipError> {
        if key >= self.keys.len() {
            return Err(ClipError::KeyOutOfRange { index: key, count: self.keys.len() });
        }
        self.keys.remove(key);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Particles
// ---------------------------------------------------------------------------

/// Particle cue
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParticleSample {
    /// Base sample data
    pub base: SampleBase,
}

impl ParticleSample {
    /// Create a particle cue
    pub fn new(base: SampleBase) -> Self {
        Self { base }
    }
}

impl SampleVariant for ParticleSample {
    const KIND: SampleKind = SampleKind::Particle;

    fn base(&self) -> &SampleBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut SampleBase {
        &mut self.base
    }

    fn collection(clip: &Clip) -> &Vec<Self> {
        &clip.particles
    }

    fn collection_mut(clip: &mut Clip) -> &mut Vec<Self> {
        &mut clip.particles
    }

    fn into_sample(self) -> Sample {
        Sample::Particle(self)
    }
}

// ---------------------------------------------------------------------------
// Movement
// ---------------------------------------------------------------------------

/// Movement endpoint
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct MovementKey {
    /// Position
    pub position: Vec3,
    /// Facing; zero means "derive from motion"
    pub facing: Vec3,
}

impl MovementKey {
    /// Create a movement endpoint
    pub fn new(position: Vec3, facing: Vec3) -> Self {
        Self { position, facing }
    }

    /// Apply an affine transform
    pub fn transform(&mut self, m: &Mat4) {
        self.position = m.transform_point3(self.position);
        self.facing = m.transform_vector3(self.facing);
    }
}

/// Point-to-point movement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovementSample {
    /// Base sample data
    pub base: SampleBase,
    /// Start endpoint
    pub start: MovementKey,
    /// End endpoint
    pub end: MovementKey,
}

impl MovementSample {
    /// Create a movement
    pub fn new(base: SampleBase, start: MovementKey, end: MovementKey) -> Self {
        Self { base, start, end }
    }

    /// Apply an affine transform to both endpoints
    pub fn transform(&mut self, m: &Mat4) {
        self.start.transform(m);
        self.end.transform(m);
    }

    /// Copy with new facings
    pub fn clone_face(&self, start_facing: Vec3, end_facing: Vec3) -> Self {
        let mut clone = self.duplicate();
        clone.start.facing = start_facing;
        clone.end.facing = end_facing;
        clone
    }

    /// Copy moved by `offset` seconds with new facings
    pub fn clone_offset_face(&self, offset: f32, start_facing: Vec3, end_facing: Vec3) -> Self {
        let mut clone = self.clone_shift(offset);
        clone.start.facing = start_facing;
        clone.end.facing = end_facing;
        clone
    }

    /// Copy moved by `offset` seconds and transformed
    pub fn clone_offset_transformed(&self, offset: f32, m: &Mat4) -> Self {
        let mut clone = self.clone_shift(offset);
        clone.transform(m);
        clone
    }

    /// Pose at an absolute clip time
    pub fn evaluate(&self, time: f32) -> Pose {
        let t = clamped_local_time(time, self.base.start_time, self.base.duration, false, 1.0);
        let facing = (Interpolation::has_direction(self.start.facing)
            && Interpolation::has_direction(self.end.facing))
        .then(|| Interpolation::slerp_direction(self.start.facing, self.end.facing, t));
        Pose {
            position: self.start.position.lerp(self.end.position, t),
            facing,
        }
    }
}

impl SampleVariant for MovementSample {
    const KIND: SampleKind = SampleKind::Movement;

    fn base(&self) -> &SampleBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut SampleBase {
        &mut self.base
    }

    fn collection(clip: &Clip) -> &Vec<Self> {
        &clip.movements
    }

    fn collection_mut(clip: &mut Clip) -> &mut Vec<Self> {
        &mut clip.movements
    }

    fn into_sample(self) -> Sample {
        Sample::Movement(self)
    }
}

// ---------------------------------------------------------------------------
// Closed sample enum
// ---------------------------------------------------------------------------

/// Any sample
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Sample {
    /// Camera path
    CameraPath(CameraPathSample),
    /// Animation
    Mecanim(MecanimSample),
    /// Follow path
    FollowPath(FollowPathSample),
    /// Particle cue
    Particle(ParticleSample),
    /// Movement
    Movement(MovementSample),
}

impl Sample {
    /// Variant tag
    pub fn kind(&self) -> SampleKind {
        match self {
            Self::CameraPath(_) => SampleKind::CameraPath,
            Self::Mecanim(_) => SampleKind::Mecanim,
            Self::FollowPath(_) => SampleKind::FollowPath,
            Self::Particle(_) => SampleKind::Particle,
            Self::Movement(_) => SampleKind::Movement,
        }
    }

    /// Shared fields
    pub fn base(&self) -> &SampleBase {
        match self {
            Self::CameraPath(s) => &s.base,
            Self::Mecanim(s) => &s.base,
            Self::FollowPath(s) => &s.base,
            Self::Particle(s) => &s.base,
            Self::Movement(s) => &s.base,
        }
    }

    /// Shared fields, mutable
    pub fn base_mut(&mut self) -> &mut SampleBase {
        match self {
            Self::CameraPath(s) => &mut s.base,
            Self::Mecanim(s) => &mut s.base,
            Self::FollowPath(s) => &mut s.base,
            Self::Particle(s) => &mut s.base,
            Self::Movement(s) => &mut s.base,
        }
    }

    /// Sample ID
    pub fn id(&self) -> SampleId {
        self.base().id
    }

    /// Deep copy with a fresh ID
    pub fn duplicate(&self) -> Self {
        match self {
            Self::CameraPath(s) => Self::CameraPath(s.duplicate()),
            Self::Mecanim(s) => Self::Mecanim(s.duplicate()),
            Self::FollowPath(s) => Self::FollowPath(s.duplicate()),
            Self::Particle(s) => Self::Particle(s.duplicate()),
            Self::Movement(s) => Self::Movement(s.duplicate()),
        }
    }

    /// Drop keyed payload
    pub fn clear(&mut self) {
        match self {
            Self::CameraPath(s) => s.clear(),
            Self::Mecanim(s) => s.clear(),
            Self::FollowPath(s) => s.clear(),
            Self::Particle(s) => s.clear(),
            Self::Movement(s) => s.clear(),
        }
    }
}

impl From<CameraPathSample> for Sample {
    fn from(s: CameraPathSample) -> Self {
        Self::CameraPath(s)
    }
}

impl From<MecanimSample> for Sample {
    fn from(s: MecanimSample) -> Self {
        Self::Mecanim(s)
    }
}

impl From<FollowPathSample> for Sample {
    fn from(s: FollowPathSample) -> Self {
        Self::FollowPath(s)
    }
}

impl From<ParticleSample> for Sample {
    fn from(s: ParticleSample) -> Self {
        Self::Particle(s)
    }
}

impl From<MovementSample> for Sample {
    fn from(s: MovementSample) -> Self {
        Self::Movement(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close_vec(a: Vec3, b: Vec3) -> bool {
        a.distance(b) < 1e-4
    }

    fn two_key_camera(duration: f32) -> CameraPathSample {
        CameraPathSample::new(SampleBase::new(0, 0.0, duration), false).with_keys(vec![
            CameraPathKey::new(0.0, Vec3::ZERO, Vec3::ZERO, Vec3::new(0.0, 1.0, 0.0)),
            CameraPathKey::new(1.0, Vec3::new(1.0, 1.0, 0.0), Vec3::new(1.0, 0.0, 0.0), Vec3::ZERO),
        ])
    }

    #[test]
    fn test_end_time_is_derived() {
        let mut base = SampleBase::new(2, 1.5, 3.0);
        assert_eq!(base.end_time(), 4.5);
        base.duration = 1.0;
        assert_eq!(base.end_time(), 2.5);
        assert!(!base.is_tagged());
        assert_eq!(base.actor_prefab, UNKNOWN_ACTOR);
    }

    #[test]
    fn test_camera_path_midpoint() {
        let cam = two_key_camera(4.0);
        let expected = Interpolation::bezier(
            Vec3::ZERO,
            Vec3::new(0.0, 1.0, 0.0),
            Vec3::new(1.0, 1.0, 0.0),
            Vec3::new(1.0, 0.0, 0.0),
            0.5,
        );
        assert!(close_vec(cam.evaluate(2.0), expected));
        assert!(close_vec(cam.evaluate(0.0), Vec3::ZERO));
        assert!(close_vec(cam.evaluate(4.0), Vec3::X));
        assert_eq!(cam.evaluate_with_segment(4.0).1, 1);
    }

    #[test]
    fn test_camera_path_degenerate() {
        let cam = CameraPathSample::new(SampleBase::new(0, 0.0, 1.0), true)
            .with_keys(vec![CameraPathKey::at(0.0, Vec3::ONE)]);
        assert_eq!(cam.evaluate(0.5), Vec3::ZERO);
        let empty = CameraPathSample::new(SampleBase::new(0, 0.0, 0.0), true);
        assert_eq!(empty.evaluate(0.0), Vec3::ZERO);
    }

    #[test]
    fn test_camera_points_round_trip() {
        let cam = two_key_camera(4.0);
        let points = cam.points();
        assert_eq!(points.len(), 4);
        assert_eq!(points[0], Vec3::ZERO);
        assert_eq!(points[3], Vec3::X);

        // flat run evaluates like the keyed curve when key times are even
        assert!(close_vec(Interpolation::spline(&points, 0.5), cam.evaluate(2.0)));

        let mut rebuilt = CameraPathSample::new(SampleBase::new(0, 0.0, 4.0), false);
        rebuilt.set_points(&points);
        assert_eq!(rebuilt.keys.len(), 2);
        assert_eq!(rebuilt.keys[1].time_norm, 1.0);
        assert_eq!(rebuilt.points(), points);
    }

    #[test]
    fn test_legacy_points_port_on_duplicate() {
        let mut cam = CameraPathSample::new(SampleBase::new(0, 0.0, 2.0), false);
        cam.legacy_points = vec![
            Vec3::ZERO,
            Vec3::X,
            Vec3::Y,
            Vec3::Z,
            Vec3::ONE,
            Vec3::NEG_X,
            Vec3::NEG_Y,
        ];
        let clone = cam.duplicate();
        assert_ne!(clone.base.id, cam.base.id);
        assert!(clone.legacy_points.is_empty());
        assert_eq!(clone.keys.len(), 3);
        assert_eq!(clone.keys[1].time_norm, 0.5);
        assert_eq!(clone.keys[1].nodes, [Vec3::Y, Vec3::Z, Vec3::ONE]);
        // the source is untouched
        assert_eq!(cam.legacy_points.len(), 7);
    }

    #[test]
    fn test_insert_key_at() {
        let mut cam = two_key_camera(4.0);
        let on_curve = cam.evaluate(1.0);
        let index = cam.insert_key_at(1.0);
        assert_eq!(index, 1);
        assert_eq!(cam.keys.len(), 3);
        assert_eq!(cam.keys[1].time_norm, 0.25);
        assert!(close_vec(cam.keys[1].anchor(), on_curve));
    }

    #[test]
    fn test_update_point_out_of_range() {
        let mut cam = two_key_camera(1.0);
        assert!(cam.update_point(2, Vec3::ONE).is_ok());
        assert_eq!(cam.keys[1].in_tangent(), Vec3::ONE);
        assert!(matches!(
            cam.update_point(9, Vec3::ONE),
            Err(ClipError::PointOutOfRange { index: 9, count: 2 })
        ));
    }

    #[test]
    fn test_keyed_sample_ops() {
        let mut cam = two_key_camera(1.0);
        cam.set_key_time(1, 0.8).unwrap();
        assert_eq!(cam.key_times(), vec![0.0, 0.8]);
        assert!(cam.remove_key(5).is_err());
        cam.remove_key(0).unwrap();
        assert_eq!(cam.key_count(), 1);
    }

    #[test]
    fn test_duplicate_does_not_alias_keys() {
        let path = FollowPathSample::new(SampleBase::new(0, 0.0, 1.0)).with_keys(vec![
            FollowPathKey::new(0.0, Vec3::ZERO),
            FollowPathKey::new(1.0, Vec3::X),
        ]);
        let mut clone = path.duplicate();
        clone.keys[0].position = Vec3::ONE;
        assert_eq!(path.keys[0].position, Vec3::ZERO);
    }

    #[test]
    fn test_clone_helpers() {
        let anim = MecanimSample::new(SampleBase::new(1, 2.0, 3.0), "Idle");
        assert_eq!(anim.clone_resize(5.0).base.duration, 5.0);
        assert_eq!(anim.clone_extend(1.0).base.duration, 4.0);
        assert_eq!(anim.clone_shift(1.0).base.start_time, 3.0);
        assert_eq!(anim.clone_set_start(7.0).base.start_time, 7.0);
        assert_eq!(anim.clone_rebase(3).base.track, 4);
        assert_eq!(anim.clone_rebase(3).state, "Idle");
    }

    #[test]
    fn test_mecanim_sampling_time() {
        let mut anim = MecanimSample::new(SampleBase::new(0, 1.0, 2.0), "Run");
        anim.take_start_norm = 0.25;
        anim.take_duration_norm = 0.5;
        assert!((anim.sampling_time(2.0) - 0.5).abs() < 1e-5);
        assert!((anim.sampling_time(10.0) - 0.75).abs() < 1e-5);

        let looped = MecanimSample::new(SampleBase::new(0, 0.0, 4.0), "Walk").looped(
            MecanimInternals { duration: 2.0, ..Default::default() },
        );
        assert_eq!(looped.one_shot_duration(), 2.0);
        assert!((looped.sampling_time(3.0) - 0.5).abs() < 1e-5);
    }

    #[test]
    fn test_follow_path_evaluate() {
        let path = FollowPathSample::new(SampleBase::new(0, 0.0, 2.0)).with_keys(vec![
            FollowPathKey::new(0.0, Vec3::ZERO).with_facing(Vec3::X),
            FollowPathKey::new(0.5, Vec3::new(2.0, 0.0, 0.0)).with_facing(Vec3::Z),
            FollowPathKey::new(1.0, Vec3::new(2.0, 0.0, 2.0)),
        ]);
        let pose = path.evaluate(0.5);
        assert!(close_vec(pose.position, Vec3::new(1.0, 0.0, 0.0)));
        let facing = pose.facing.unwrap();
        assert!(close_vec(facing, Vec3::new(1.0, 0.0, 1.0).normalize()));

        // last key has no facing
        let pose = path.evaluate(1.5);
        assert!(close_vec(pose.position, Vec3::new(2.0, 0.0, 1.0)));
        assert!(pose.facing.is_none());

        assert!(close_vec(path.evaluate(9.0).position, Vec3::new(2.0, 0.0, 2.0)));
        assert_eq!(path.segment_length(0), 2.0);
        assert_eq!(path.segment_length(2), 0.0);
    }

    #[test]
    fn test_follow_path_chase_point() {
        let mut path = FollowPathSample::new(SampleBase::new(0, 0.0, 1.0)).with_keys(vec![
            FollowPathKey::new(0.0, Vec3::ZERO),
            FollowPathKey::new(1.0, Vec3::new(10.0, 0.0, 0.0)),
        ]);
        assert!(close_vec(path.chase_point(0.0, 0.5), Vec3::new(1.0, 0.0, 0.0)));
        path.keys[0].chase_point_offset_override = Some(0.3);
        assert!(close_vec(path.chase_point(0.0, 0.5), Vec3::new(3.0, 0.0, 0.0)));
        path.keys[0].chase_point_offset_override = None;
        path.chase_point_offset = 0.0;
        assert!(close_vec(path.chase_point(0.0, 0.5), Vec3::new(5.0, 0.0, 0.0)));
    }

    #[test]
    fn test_movement_evaluate() {
        let movement = MovementSample::new(
            SampleBase::new(0, 1.0, 2.0),
            MovementKey::new(Vec3::ZERO, Vec3::X),
            MovementKey::new(Vec3::new(0.0, 0.0, 4.0), Vec3::Z),
        );
        let pose = movement.evaluate(2.0);
        assert!(close_vec(pose.position, Vec3::new(0.0, 0.0, 2.0)));
        assert!(close_vec(pose.facing.unwrap(), Vec3::new(1.0, 0.0, 1.0).normalize()));

        let no_facing = movement.clone_face(Vec3::ZERO, Vec3::Z);
        assert!(no_facing.evaluate(2.0).facing.is_none());
        assert_ne!(no_facing.base.id, movement.base.id);
    }

    #[test]
    fn test_movement_transform() {
        let mut movement = MovementSample::new(
            SampleBase::new(0, 0.0, 1.0),
            MovementKey::new(Vec3::ZERO, Vec3::X),
            MovementKey::new(Vec3::X, Vec3::X),
        );
        movement.transform(&Mat4::from_translation(Vec3::Y));
        assert_eq!(movement.start.position, Vec3::Y);
        assert_eq!(movement.end.position, Vec3::new(1.0, 1.0, 0.0));
        // vectors ignore translation
        assert_eq!(movement.start.facing, Vec3::X);
    }

    #[test]
    fn test_sample_enum() {
        let sample: Sample = ParticleSample::new(SampleBase::new(3, 0.0, 1.0)).into();
        assert_eq!(sample.kind(), SampleKind::Particle);
        assert_eq!(sample.base().track, 3);
        assert_ne!(sample.duplicate().id(), sample.id());
    }
}
