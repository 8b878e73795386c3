// SPDX-License-Identifier: MIT OR Apache-2.0
//! Clip container holding every sample and moment of a sequence.

use crate::error::ClipError;
use crate::sample::{
    CameraPathSample, FollowPathSample, MecanimSample, MovementSample, ParticleSample, Sample,
    SampleBase, SampleId, SampleKind, SampleVariant, UNSET_TAG,
};
use glam::Mat4;
use serde::{Deserialize, Serialize};

/// Shifts with `shift * shift` below this are ignored
pub const SHIFT_EPSILON_SQ: f32 = 0.00001;

/// A named instant on the clip timeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Moment {
    /// Moment name
    pub name: String,
    /// Time in seconds from clip start
    pub time: f32,
}

/// Where a sample lives inside a clip
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SampleLocation {
    /// Variant collection
    pub kind: SampleKind,
    /// Index in that collection
    pub index: usize,
}

/// A cinematic clip
///
/// Each variant lives in its own collection. Insertion order carries no
/// meaning; call [`Clip::sort_by_time`] after edits that move start times
/// and before any prev/next-on-track query.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Clip {
    #[serde(default)]
    pub(crate) camera_paths: Vec<CameraPathSample>,
    #[serde(default)]
    pub(crate) mecanims: Vec<MecanimSample>,
    #[serde(default)]
    pub(crate) follow_paths: Vec<FollowPathSample>,
    #[serde(default)]
    pub(crate) particles: Vec<ParticleSample>,
    #[serde(default)]
    pub(crate) movements: Vec<MovementSample>,
    /// Named instants
    #[serde(default)]
    pub moments: Vec<Moment>,
    /// Clip length, independent of sample extents
    #[serde(default)]
    pub duration: f32,
}

impl Clip {
    /// Create an empty clip
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty clip with a duration
    pub fn with_duration(duration: f32) -> Self {
        Self {
            duration,
            ..Self::default()
        }
    }

    /// All samples of one variant
    pub fn samples<T: SampleVariant>(&self) -> &[T] {
        T::collection(self)
    }

    /// All samples of one variant, mutable
    pub fn samples_mut<T: SampleVariant>(&mut self) -> &mut [T] {
        T::collection_mut(self)
    }

    /// Add a typed sample
    pub fn add<T: SampleVariant>(&mut self, sample: T) -> SampleId {
        let id = sample.base().id;
        T::collection_mut(self).push(sample);
        id
    }

    /// Add any sample
    pub fn add_sample(&mut self, sample: Sample) -> SampleId {
        match sample {
            Sample::CameraPath(s) => self.add(s),
            Sample::Mecanim(s) => self.add(s),
            Sample::FollowPath(s) => self.add(s),
            Sample::Particle(s) => self.add(s),
            Sample::Movement(s) => self.add(s),
        }
    }

    /// Shared fields of every sample
    pub fn bases(&self) -> impl Iterator<Item = &SampleBase> + '_ {
        self.camera_paths
            .iter()
            .map(|s| &s.base)
            .chain(self.mecanims.iter().map(|s| &s.base))
            .chain(self.follow_paths.iter().map(|s| &s.base))
            .chain(self.particles.iter().map(|s| &s.base))
            .chain(self.movements.iter().map(|s| &s.base))
    }

    /// Shared fields of every sample, mutable
    pub fn bases_mut(&mut self) -> impl Iterator<Item = &mut SampleBase> + '_ {
        self.camera_paths
            .iter_mut()
            .map(|s| &mut s.base)
            .chain(self.mecanims.iter_mut().map(|s| &mut s.base))
            .chain(self.follow_paths.iter_mut().map(|s| &mut s.base))
            .chain(self.particles.iter_mut().map(|s| &mut s.base))
            .chain(self.movements.iter_mut().map(|s| &mut s.base))
    }

    /// Total number of samples
    pub fn sample_count(&self) -> usize {
        self.bases().count()
    }

    /// Whether the clip holds no samples
    pub fn is_empty(&self) -> bool {
        self.sample_count() == 0
    }

    /// Find which collection holds a sample
    pub fn locate(&self, id: SampleId) -> Option<SampleLocation> {
        fn find<T: SampleVariant>(clip: &Clip, id: SampleId) -> Option<SampleLocation> {
            T::collection(clip)
                .iter()
                .position(|s| s.base().id == id)
                .map(|index| SampleLocation { kind: T::KIND, index })
        }

        find::<CameraPathSample>(self, id)
            .or_else(|| find::<MecanimSample>(self, id))
            .or_else(|| find::<FollowPathSample>(self, id))
            .or_else(|| find::<ParticleSample>(self, id))
            .or_else(|| find::<MovementSample>(self, id))
    }

    /// Shared fields of a sample
    pub fn base(&self, id: SampleId) -> Option<&SampleBase> {
        self.bases().find(|b| b.id == id)
    }

    /// Shared fields of a sample, mutable
    pub fn base_mut(&mut self, id: SampleId) -> Option<&mut SampleBase> {
        self.bases_mut().find(|b| b.id == id)
    }

    /// Copy of a sample
    pub fn sample(&self, id: SampleId) -> Option<Sample> {
        fn cloned<T: SampleVariant>(clip: &Clip, index: usize) -> Option<Sample> {
            T::collection(clip).get(index).cloned().map(T::into_sample)
        }

        let loc = self.locate(id)?;
        match loc.kind {
            SampleKind::CameraPath => cloned::<CameraPathSample>(self, loc.index),
            SampleKind::Mecanim => cloned::<MecanimSample>(self, loc.index),
            SampleKind::FollowPath => cloned::<FollowPathSample>(self, loc.index),
            SampleKind::Particle => cloned::<ParticleSample>(self, loc.index),
            SampleKind::Movement => cloned::<MovementSample>(self, loc.index),
        }
    }

    /// Duplicate a sample into its own collection
    pub fn clone_sample(&mut self, id: SampleId) -> Option<SampleId> {
        let copy = self.sample(id)?.duplicate();
        Some(self.add_sample(copy))
    }

    /// Remove a sample
    pub fn remove(&mut self, id: SampleId) -> Option<Sample> {
        self.remove_from::<CameraPathSample>(id)
            .or_else(|| self.remove_from::<MecanimSample>(id))
            .or_else(|| self.remove_from::<FollowPathSample>(id))
            .or_else(|| self.remove_from::<ParticleSample>(id))
            .or_else(|| self.remove_from::<MovementSample>(id))
    }

    fn remove_from<T: SampleVariant>(&mut self, id: SampleId) -> Option<Sample> {
        let list = T::collection_mut(self);
        let index = list.iter().position(|s| s.base().id == id)?;
        Some(list.remove(index).into_sample())
    }

    /// Remove every sample matching a predicate. Returns how many were removed.
    pub fn remove_where<F: FnMut(&SampleBase) -> bool>(&mut self, mut condition: F) -> usize {
        self.remove_where_in::<CameraPathSample, _>(|s| condition(s.base()))
            + self.remove_where_in::<MecanimSample, _>(|s| condition(s.base()))
            + self.remove_where_in::<FollowPathSample, _>(|s| condition(s.base()))
            + self.remove_where_in::<ParticleSample, _>(|s| condition(s.base()))
            + self.remove_where_in::<MovementSample, _>(|s| condition(s.base()))
    }

    /// Remove samples of one variant matching a predicate
    pub fn remove_where_in<T: SampleVariant, F: FnMut(&T) -> bool>(
        &mut self,
        mut condition: F,
    ) -> usize {
        let list = T::collection_mut(self);
        let before = list.len();
        list.retain(|s| !condition(s));
        before - list.len()
    }

    /// Remove every sample without a tag
    pub fn remove_untagged(&mut self) -> usize {
        self.remove_where(|b| b.tag == UNSET_TAG)
    }

    /// Remove samples of one variant without a tag
    pub fn remove_untagged_in<T: SampleVariant>(&mut self) -> usize {
        self.remove_where_in::<T, _>(|s| s.base().tag == UNSET_TAG)
    }

    /// Remove all samples and moments, optionally resetting the duration
    pub fn clear(&mut self, clear_duration: bool) {
        self.camera_paths.clear();
        self.mecanims.clear();
        self.follow_paths.clear();
        self.particles.clear();
        self.movements.clear();
        self.moments.clear();
        if clear_duration {
            self.duration = 0.0;
        }
    }

    /// Stable ascending sort of every collection by start time
    pub fn sort_by_time(&mut self) {
        self.sort_by_time_in::<CameraPathSample>();
        self.sort_by_time_in::<MecanimSample>();
        self.sort_by_time_in::<FollowPathSample>();
        self.sort_by_time_in::<ParticleSample>();
        self.sort_by_time_in::<MovementSample>();
    }

    /// Stable ascending sort of one collection by start time
    pub fn sort_by_time_in<T: SampleVariant>(&mut self) {
        T::collection_mut(self)
            .sort_by(|a, b| a.base().start_time.total_cmp(&b.base().start_time));
    }

    /// Index of a sample in its collection
    pub fn index_of<T: SampleVariant>(&self, id: SampleId) -> Option<usize> {
        T::collection(self).iter().position(|s| s.base().id == id)
    }

    /// Nearest earlier sample on the same track, by start time
    pub fn prev_on_track<T: SampleVariant>(&self, index: usize) -> Option<&T> {
        self.samples_around::<T>(index).0
    }

    /// Nearest later sample on the same track, by start time
    pub fn next_on_track<T: SampleVariant>(&self, index: usize) -> Option<&T> {
        self.samples_around::<T>(index).1
    }

    /// Previous and next sample of one variant on the same track.
    ///
    /// Neighbors are found by start time, ties broken by position, so on a
    /// sorted collection these are the adjacent same-track entries.
    pub fn samples_around<T: SampleVariant>(&self, index: usize) -> (Option<&T>, Option<&T>) {
        let list = T::collection(self);
        let Some(track) = list.get(index).map(|s| s.base().track) else {
            return (None, None);
        };
        let by_time = |a: &usize, b: &usize| {
            let (sa, sb) = (list[*a].base(), list[*b].base());
            sa.start_time.total_cmp(&sb.start_time).then(a.cmp(b))
        };
        let same_track =
            (0..list.len()).filter(|&j| j != index && list[j].base().track == track);
        let prev = same_track
            .clone()
            .filter(|j| by_time(j, &index).is_lt())
            .max_by(by_time);
        let next = same_track
            .filter(|j| by_time(j, &index).is_gt())
            .min_by(by_time);
        (prev.map(|j| &list[j]), next.map(|j| &list[j]))
    }

    /// Previous and next sample of any variant on the same track, by start time
    pub fn samples_around_sample(
        &self,
        id: SampleId,
    ) -> (Option<&SampleBase>, Option<&SampleBase>) {
        let Some(src) = self.base(id) else {
            return (None, None);
        };
        let mut prev: Option<&SampleBase> = None;
        let mut next: Option<&SampleBase> = None;
        for b in self.bases().filter(|b| b.track == src.track) {
            if b.start_time < src.start_time && prev.map_or(true, |p| b.start_time > p.start_time)
            {
                prev = Some(b);
            }
            if b.start_time > src.start_time && next.map_or(true, |n| b.start_time < n.start_time)
            {
                next = Some(b);
            }
        }
        (prev, next)
    }

    /// First sample of one variant with a tag
    pub fn find_by_tag<T: SampleVariant>(&self, tag: &str) -> Option<&T> {
        T::collection(self).iter().find(|s| s.base().tag == tag)
    }

    /// Index of the first sample of one variant with a tag
    pub fn index_by_tag<T: SampleVariant>(&self, tag: &str) -> Option<usize> {
        T::collection(self).iter().position(|s| s.base().tag == tag)
    }

    /// Index of the tagged sample on the numerically smallest track
    pub fn top_track_index_by_tag<T: SampleVariant>(&self, tag: &str) -> Option<usize> {
        let mut best: Option<(usize, u32)> = None;
        for (i, s) in T::collection(self).iter().enumerate() {
            let base = s.base();
            if base.tag == tag && best.map_or(true, |(_, track)| base.track < track) {
                best = Some((i, base.track));
            }
        }
        best.map(|(i, _)| i)
    }

    /// Tagged sample on the numerically smallest track
    pub fn find_top_track_by_tag<T: SampleVariant>(&self, tag: &str) -> Option<&T> {
        let index = self.top_track_index_by_tag::<T>(tag)?;
        T::collection(self).get(index)
    }

    /// First sample of one variant on a track
    pub fn first_by_track<T: SampleVariant>(&self, track: u32) -> Option<&T> {
        T::collection(self).iter().find(|s| s.base().track == track)
    }

    /// First sample of any variant matching a predicate
    pub fn find_first<F: FnMut(&SampleBase) -> bool>(
        &self,
        mut condition: F,
    ) -> Option<&SampleBase> {
        self.bases().find(|&b| condition(b))
    }

    /// Samples of one variant matching a predicate
    pub fn find_in<T: SampleVariant, F: FnMut(&T) -> bool>(
        &self,
        mut condition: F,
    ) -> Vec<&T> {
        T::collection(self).iter().filter(|&s| condition(s)).collect()
    }

    /// Samples of one variant starting inside `[start, start + duration]`
    pub fn samples_starting_in_range<T: SampleVariant>(
        &self,
        start: f32,
        duration: f32,
    ) -> Vec<&T> {
        self.find_in::<T, _>(|s| {
            let t = s.base().start_time;
            t >= start && t <= start + duration
        })
    }

    /// `max(track) + 1` over every sample; 0 for an empty clip
    pub fn number_of_tracks(&self) -> u32 {
        self.bases().map(|b| b.track + 1).max().unwrap_or(0)
    }

    /// Latest end time over every sample
    pub fn calculate_end(&self) -> f32 {
        self.bases().map(SampleBase::end_time).fold(0.0, f32::max)
    }

    /// Move samples on `track` starting at or after `cursor_time` by `shift`.
    ///
    /// With `stretch_prev`, a sample straddling the cursor grows by `shift`
    /// instead. Tiny shifts are ignored.
    pub fn shift_samples_right_of_cursor(
        &mut self,
        cursor_time: f32,
        track: u32,
        shift: f32,
        stretch_prev: bool,
    ) {
        if shift * shift < SHIFT_EPSILON_SQ {
            return;
        }
        for base in self.bases_mut().filter(|b| b.track == track) {
            if base.start_time >= cursor_time {
                base.start_time += shift;
            } else if stretch_prev && base.end_time() >= cursor_time {
                base.duration += shift;
            }
        }
    }

    /// Move every sample by `time`
    pub fn shift(&mut self, time: f32) {
        for base in self.bases_mut() {
            base.start_time += time;
        }
    }

    /// Copy start time and duration from one sample onto another
    pub fn align_to(&mut self, id: SampleId, align_to: SampleId) -> bool {
        let Some((start, duration)) = self.base(align_to).map(|b| (b.start_time, b.duration))
        else {
            return false;
        };
        match self.base_mut(id) {
            Some(base) => {
                base.start_time = start;
                base.duration = duration;
                true
            }
            None => false,
        }
    }

    /// Add a moment
    pub fn add_moment(&mut self, name: impl Into<String>, time: f32) {
        self.moments.push(Moment {
            name: name.into(),
            time,
        });
    }

    /// First moment with a name
    pub fn find_first_moment(&self, name: &str) -> Option<&Moment> {
        self.moments.iter().find(|m| m.name == name)
    }

    /// Apply an affine transform to every spatial key
    pub fn apply_transform(&mut self, m: &Mat4) {
        for cam in &mut self.camera_paths {
            cam.transform(m);
        }
        for path in &mut self.follow_paths {
            for key in &mut path.keys {
                key.position = m.transform_point3(key.position);
                key.facing = m.transform_vector3(key.facing);
            }
        }
        for movement in &mut self.movements {
            movement.transform(m);
        }
    }

    /// Convert legacy camera points into keys. Returns how many samples changed.
    pub fn port_legacy_points(&mut self) -> usize {
        self.camera_paths
            .iter_mut()
            .map(CameraPathSample::port_legacy_points)
            .filter(|ported| *ported)
            .count()
    }

    /// Check that every path has at least two keys
    pub fn validate(&self) -> Result<(), ClipError> {
        const MIN_PATH_KEYS: usize = 2;
        let camera = self
            .camera_paths
            .iter()
            .map(|s| (SampleKind::CameraPath, s.base.id, s.keys.len()));
        let follow = self
            .follow_paths
            .iter()
            .map(|s| (SampleKind::FollowPath, s.base.id, s.keys.len()));
        for (kind, id, count) in camera.chain(follow) {
            if count < MIN_PATH_KEYS {
                return Err(ClipError::TooFewKeys {
                    kind,
                    id,
                    count,
                    min: MIN_PATH_KEYS,
                });
            }
        }
        Ok(())
    }

    /// Serialize to RON
    pub fn to_ron(&self) -> Result<String, ClipError> {
        Ok(ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())?)
    }

    /// Deserialize from RON, porting legacy camera points
    pub fn from_ron(s: &str) -> Result<Self, ClipError> {
        let mut clip: Clip = ron::from_str(s)?;
        let ported = clip.port_legacy_points();
        if ported > 0 {
            tracing::debug!("Ported legacy points of {} camera paths", ported);
        }
        Ok(clip)
    }
}
