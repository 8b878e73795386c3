// SPDX-License-Identifier: MIT OR Apache-2.0
//! Clip merging.
//!
//! An override clip is spliced into a base clip sample by sample. A base
//! sample is a merge template for an override sample when both sit on the
//! same track and carry the same tag. The merged sample takes the
//! template's place, keeping the template's track, actor and ID, and the
//! fades around it are carried over so neighbors keep blending.
//!
//! Non-animation samples sharing a tag with an animation are slaves of the
//! animation on the lowest track (the master). After a merge, slaves are
//! re-timed against their master.

use crate::clip::Clip;
use crate::query::Fades;
use crate::sample::{
    CameraPathSample, FollowPathSample, MecanimSample, MovementSample, ParticleSample, SampleBase,
    SampleId, SampleVariant,
};

/// Fades at or below this are treated as not authored
pub const FADE_EPSILON: f32 = 0.001;

fn is_merge_match(template: &SampleBase, to_merge: &SampleBase) -> bool {
    template.track == to_merge.track && template.is_tagged() && template.tag == to_merge.tag
}

fn pick_fade(authored: f32, template: f32) -> f32 {
    if authored > FADE_EPSILON {
        authored
    } else {
        template
    }
}

impl Clip {
    /// Merge one override sample into the matching template.
    ///
    /// Returns false when no template matches; the clip is then unchanged.
    pub fn merge_into<T: SampleVariant>(
        &mut self,
        overrides: &Clip,
        override_index: usize,
    ) -> bool {
        let Some(to_merge) = T::collection(overrides).get(override_index) else {
            return false;
        };
        let Some(index) = T::collection(self)
            .iter()
            .position(|t| is_merge_match(t.base(), to_merge.base()))
        else {
            return false;
        };

        let template = T::collection(self)[index].base().clone();
        let (prev, next) = self.samples_around::<T>(index);
        let prev_end = prev.map(|p| p.base().end_time());
        let next_start = next.map(|n| n.base().start_time);
        let template_fades =
            Fades::between(&template, prev.map(T::base), next.map(T::base));
        let authored = overrides.sample_overlaps::<T>(override_index);
        let fade_in = pick_fade(authored.fade_in, template_fades.fade_in);
        let fade_out = pick_fade(authored.fade_out, template_fades.fade_out);

        let mut merged = to_merge.duplicate();
        {
            let base = merged.base_mut();
            base.id = template.id;
            base.track = template.track;
            base.actor_prefab = template.actor_prefab.clone();
            if fade_in > FADE_EPSILON {
                base.start_time = match prev_end {
                    Some(end) => end - fade_in,
                    None => template.start_time,
                };
            }
        }

        if fade_out > FADE_EPSILON {
            if let Some(next_start) = next_start {
                let shift = merged.base().end_time() - fade_out - next_start;
                self.shift_samples_right_of_cursor(next_start, template.track, shift, false);
            }
        }

        tracing::debug!("Merged {} '{}'", T::KIND.name(), template.tag);
        T::collection_mut(self)[index] = merged;
        true
    }

    /// Merge every override sample of one variant; returns how many matched
    pub fn merge_list<T: SampleVariant>(&mut self, overrides: &Clip) -> usize {
        (0..T::collection(overrides).len())
            .filter(|&i| self.merge_into::<T>(overrides, i))
            .count()
    }

    /// Merge a whole override clip, then re-time slaves against their masters.
    ///
    /// The pre-merge clip is used as the template source for slaves whose
    /// master/template pair is not present in `overrides`.
    pub fn merge_clip(&mut self, overrides: &Clip) -> usize {
        let mut overrides = overrides.clone();
        overrides.sort_by_time();
        self.sort_by_time();
        let fallback = self.clone();

        let merged = self.merge_list::<MecanimSample>(&overrides)
            + self.merge_list::<MovementSample>(&overrides)
            + self.merge_list::<ParticleSample>(&overrides)
            + self.merge_list::<FollowPathSample>(&overrides)
            + self.merge_list::<CameraPathSample>(&overrides);
        self.sort_by_time();

        let aligned = self.align_slaves_after_merge::<MovementSample>(&fallback, &overrides)
            + self.align_slaves_after_merge::<ParticleSample>(&fallback, &overrides)
            + self.align_slaves_after_merge::<FollowPathSample>(&fallback, &overrides)
            + self.align_slaves_after_merge::<CameraPathSample>(&fallback, &overrides);
        self.sort_by_time();

        tracing::debug!("Merged {} samples, aligned {} slaves", merged, aligned);
        merged
    }

    /// Animation on the lowest track sharing the slave's tag.
    ///
    /// Untagged samples have no master, and no sample is its own master.
    pub fn bind_master(&self, slave: &SampleBase) -> Option<&MecanimSample> {
        if !slave.is_tagged() {
            return None;
        }
        self.find_top_track_by_tag::<MecanimSample>(&slave.tag)
            .filter(|master| master.base.id != slave.id)
    }

    /// Non-animation samples sharing the master's tag
    pub fn binds(&self, master: &MecanimSample) -> Vec<SampleId> {
        if !master.base.is_tagged() {
            return Vec::new();
        }
        self.camera_paths
            .iter()
            .map(SampleVariant::base)
            .chain(self.follow_paths.iter().map(SampleVariant::base))
            .chain(self.particles.iter().map(SampleVariant::base))
            .chain(self.movements.iter().map(SampleVariant::base))
            .filter(|b| b.tag == master.base.tag)
            .map(|b| b.id)
            .collect()
    }

    /// Re-time slaves of one variant after their masters were merged.
    ///
    /// The slave's offset from its master is read from the template pair in
    /// `overrides`, else in `fallback`. The slave moves to its master's
    /// start plus that offset, carrying the samples after it on its track,
    /// and its duration follows the master's change in duration. Returns
    /// how many slaves were re-timed.
    pub fn align_slaves_after_merge<T: SampleVariant>(
        &mut self,
        fallback: &Clip,
        overrides: &Clip,
    ) -> usize {
        let mut aligned = 0;
        for index in 0..T::collection(self).len() {
            let slave = T::collection(self)[index].base().clone();
            let template_pair = |clip: &Clip| {
                let master = clip.bind_master(&slave)?;
                let template = clip.find_top_track_by_tag::<T>(&slave.tag)?;
                Some((master.base.clone(), template.base().start_time))
            };
            let Some((template_master, template_start)) =
                template_pair(overrides).or_else(|| template_pair(fallback))
            else {
                continue;
            };
            let Some((master_start, master_duration)) = self
                .bind_master(&slave)
                .map(|m| (m.base.start_time, m.base.duration))
            else {
                continue;
            };

            let offset = template_start - template_master.start_time;
            let delta = master_start + offset - slave.start_time;
            self.shift_samples_right_of_cursor(slave.start_time, slave.track, delta, false);
            T::collection_mut(self)[index].base_mut().duration +=
                master_duration - template_master.duration;
            aligned += 1;
        }
        aligned
    }

    /// Copy every sample of `other` into this clip, moved down by `baseline_track`
    pub fn import(&mut self, other: &Clip, baseline_track: u32) {
        self.import_list::<CameraPathSample>(other, baseline_track);
        self.import_list::<MecanimSample>(other, baseline_track);
        self.import_list::<FollowPathSample>(other, baseline_track);
        self.import_list::<ParticleSample>(other, baseline_track);
        self.import_list::<MovementSample>(other, baseline_track);
    }

    fn import_list<T: SampleVariant>(&mut self, other: &Clip, baseline_track: u32) {
        let imported: Vec<T> = T::collection(other)
            .iter()
            .map(|s| s.clone_rebase(baseline_track))
            .collect();
        T::collection_mut(self).extend(imported);
    }

    /// Import `other` onto fresh tracks below the existing ones
    pub fn import_after_last_track(&mut self, other: &Clip) {
        let tracks = self.number_of_tracks();
        self.import(other, tracks);
    }

    /// Move the earliest sample to time 0 and fit the duration to the samples.
    ///
    /// Returns the applied shift. An empty clip gets a zero duration.
    pub fn trim(&mut self) -> f32 {
        let Some(earliest) = self.bases().map(|b| b.start_time).min_by(f32::total_cmp) else {
            self.duration = 0.0;
            return 0.0;
        };
        self.shift(-earliest);
        self.duration = self.calculate_end();
        -earliest
    }
}
