// SPDX-License-Identifier: MIT OR Apache-2.0
//! Overlap and pair queries.
//!
//! For a track and a time window, find the one or two samples active at the
//! window's end, with the crossfade overlap between them. When nothing is
//! active, the nearest sample behind the direction of travel is returned
//! with a negative overlap so callers can still pose from it.
//!
//! Queries scan collections in stored order and assume at most two samples
//! overlap on a track; a third overlapping sample is not seen.

use crate::clip::Clip;
use crate::sample::{SampleBase, SampleId, SampleVariant};

/// Fade-in and fade-out of a sample against its track neighbors
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Fades {
    /// Overlap with the previous sample
    pub fade_in: f32,
    /// Overlap with the next sample
    pub fade_out: f32,
}

impl Fades {
    /// Overlaps of `sample` with optional neighbors, clamped to be non-negative
    pub fn between(
        sample: &SampleBase,
        prev: Option<&SampleBase>,
        next: Option<&SampleBase>,
    ) -> Self {
        Self {
            fade_in: prev.map_or(0.0, |p| (p.end_time() - sample.start_time).max(0.0)),
            fade_out: next.map_or(0.0, |n| (sample.end_time() - n.start_time).max(0.0)),
        }
    }
}

/// The samples active on one track at a query time
#[derive(Debug)]
pub struct SamplePair<'a, T> {
    /// First active sample, or the fallback sample
    pub first: &'a T,
    /// Second active sample
    pub second: Option<&'a T>,
    /// Crossfade overlap between the two; negative distance for a fallback
    pub overlap: f32,
}

impl<'a, T> SamplePair<'a, T> {
    /// Number of samples (1 or 2)
    pub fn len(&self) -> usize {
        if self.second.is_some() {
            2
        } else {
            1
        }
    }

    /// Always false; a pair holds at least one sample
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Whether the query time missed every sample
    pub fn is_fallback(&self) -> bool {
        self.overlap < 0.0
    }

    /// Distance to the fallback sample, 0 for genuine hits
    pub fn fallback_distance(&self) -> f32 {
        (-self.overlap).max(0.0)
    }

    /// Iterate over the samples in the pair
    pub fn iter(&self) -> impl Iterator<Item = &'a T> + '_ {
        std::iter::once(self.first).chain(self.second)
    }
}

impl Clip {
    /// Active samples of one variant on `track` at `t`
    pub fn pair_at_time<T: SampleVariant>(
        &self,
        t: f32,
        track: u32,
    ) -> Option<SamplePair<'_, T>> {
        self.pair_at_time_delta::<T>(t, t, track)
    }

    /// Active samples of one variant on `track` at `t1`, moving from `t0`
    pub fn pair_at_time_delta<T: SampleVariant>(
        &self,
        t0: f32,
        t1: f32,
        track: u32,
    ) -> Option<SamplePair<'_, T>> {
        self.pair_at_time_delta_where::<T, _>(t0, t1, track, |_| true)
    }

    /// Like [`Clip::pair_at_time_delta`], considering only samples accepted by `accept`.
    ///
    /// A sample is hit when `t1` lies in `[start, end]`. Two hits are
    /// ordered by start time whatever their stored order. With no hit, the
    /// sample whose start or end is nearest behind `t1` (looking back
    /// towards `t0`) is returned with `overlap = -distance`.
    pub fn pair_at_time_delta_where<T: SampleVariant, F: FnMut(&T) -> bool>(
        &self,
        t0: f32,
        t1: f32,
        track: u32,
        mut accept: F,
    ) -> Option<SamplePair<'_, T>> {
        let dir = if t0 - t1 > 0.0 { 1.0 } else { -1.0 };
        let mut hits: [Option<&T>; 2] = [None, None];
        let mut count = 0;
        let mut fallback: Option<(&T, f32)> = None;

        for s in T::collection(self)
            .iter()
            .filter(|&s| s.base().track == track && accept(s))
        {
            let base = s.base();
            let start = base.start_time;
            let end = base.end_time();
            if start <= t1 && t1 <= end {
                hits[count] = Some(s);
                count += 1;
            }
            let dist = [(start - t1) * dir, (end - t1) * dir]
                .into_iter()
                .filter(|d| *d >= 0.0)
                .fold(f32::INFINITY, f32::min);
            if dist.is_finite() && fallback.map_or(true, |(_, best)| dist < best) {
                fallback = Some((s, dist));
            }
            if count == 2 {
                break;
            }
        }

        match count {
            0 => fallback.map(|(first, dist)| SamplePair {
                first,
                second: None,
                overlap: -dist,
            }),
            1 => Some(SamplePair {
                first: hits[0]?,
                second: None,
                overlap: 0.0,
            }),
            _ => {
                let (mut a, mut b) = (hits[0]?, hits[1]?);
                if b.base().start_time < a.base().start_time {
                    std::mem::swap(&mut a, &mut b);
                }
                let (a_base, b_base) = (a.base(), b.base());
                let overlap = if a_base.start_time < b_base.start_time
                    && a_base.end_time() < b_base.end_time()
                {
                    (a_base.end_time() - b_base.start_time).max(0.0)
                } else {
                    0.0
                };
                Some(SamplePair {
                    first: a,
                    second: Some(b),
                    overlap,
                })
            }
        }
    }

    /// Static fades of the sample at `index` against its same-track neighbors
    pub fn sample_overlaps<T: SampleVariant>(&self, index: usize) -> Fades {
        let Some(sample) = T::collection(self).get(index) else {
            return Fades::default();
        };
        let (prev, next) = self.samples_around::<T>(index);
        Fades::between(sample.base(), prev.map(T::base), next.map(T::base))
    }

    /// Static fades of a sample against neighbors of any variant on its track.
    ///
    /// A neighbor only counts when it does not swallow the sample's end.
    pub fn samples_overlaps(&self, id: SampleId) -> Fades {
        let Some(src) = self.base(id) else {
            return Fades::default();
        };
        let (prev, next) = self.samples_around_sample(id);
        let prev = prev.filter(|p| p.end_time() < src.end_time());
        let next = next.filter(|n| n.end_time() > src.end_time());
        Fades::between(src, prev, next)
    }
}
