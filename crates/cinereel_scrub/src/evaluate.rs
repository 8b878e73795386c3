// SPDX-License-Identifier: MIT OR Apache-2.0
//! Per-tick clip evaluation.
//!
//! Each call takes an explicit `(prev_time, current_time)` window and keeps
//! no state between calls, so time may run backwards or jump. Tracks are
//! evaluated in this order: camera look-at, camera position, animations,
//! particles, movements, follow paths.

use crate::resolver::ActorResolver;
use crate::settings::ScrubSettings;
use cinereel_clip::{
    local_time, CameraPathSample, Clip, FollowPathSample, MecanimSample, MovementSample,
    ParticleSample, SampleBase, SamplePair,
};
use glam::Vec3;
use indexmap::IndexMap;

/// Edge-triggered event raised when playback crosses a sample's start
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScrubEvent {
    /// An animation sample started
    EnterAnimation {
        /// Tag of the sample
        tag: String,
    },
    /// A particle sample started
    EnterParticle {
        /// Tag of the sample
        tag: String,
    },
}

impl ScrubEvent {
    /// Tag of the sample that raised the event
    pub fn tag(&self) -> &str {
        match self {
            ScrubEvent::EnterAnimation { tag } | ScrubEvent::EnterParticle { tag } => tag,
        }
    }
}

/// One weighted animation layer
#[derive(Debug, Clone, PartialEq)]
pub struct AnimationLayer {
    /// Animation state name
    pub state: String,
    /// Normalized time into the source animation
    pub normalized_time: f32,
    /// Layer weight
    pub weight: f32,
}

/// Two-layer crossfade for one actor
#[derive(Debug, Clone, PartialEq)]
pub struct Crossfade {
    /// Actor name from the lead sample
    pub actor: String,
    /// Layers 0 and 1; weights sum to 1
    pub layers: [AnimationLayer; 2],
}

impl Crossfade {
    /// Layer weights
    pub fn weights(&self) -> [f32; 2] {
        [self.layers[0].weight, self.layers[1].weight]
    }
}

/// Crossfade bound to a host actor
#[derive(Debug, Clone, PartialEq)]
pub struct AnimationBlend<H> {
    /// Animated actor
    pub actor: H,
    /// Track the blend came from
    pub track: u32,
    /// Layers 0 and 1 for the actor's animation player
    pub layers: [AnimationLayer; 2],
}

/// Where a particle sample is relative to the current time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParticlePhase {
    /// Not started yet; the system should be stopped and rewound
    Before,
    /// Playing; seek to the local time
    Active,
    /// Finished; the system should be stopped at its end
    After,
}

/// Seek request for a particle system
#[derive(Debug, Clone, PartialEq)]
pub struct ParticleCue<H> {
    /// Particle system actor
    pub system: H,
    /// Tag of the sample
    pub tag: String,
    /// Unclamped normalized time inside the sample
    pub local_time: f32,
}

impl<H> ParticleCue<H> {
    /// Phase derived from the local time
    pub fn phase(&self) -> ParticlePhase {
        if self.local_time < 0.0 {
            ParticlePhase::Before
        } else if self.local_time > 1.0 {
            ParticlePhase::After
        } else {
            ParticlePhase::Active
        }
    }
}

/// Camera placement for this tick
#[derive(Debug, Clone, PartialEq)]
pub struct CameraPose<H> {
    /// Camera actor
    pub camera: H,
    /// Position from the active position path
    pub position: Option<Vec3>,
    /// Point to look at from the active look-at path
    pub look_at: Option<Vec3>,
}

/// Everything one tick produced
#[derive(Debug, Clone)]
pub struct EvaluationResult<H> {
    /// `current_time / clip.duration`; may exceed 1
    pub normalized_time: f32,
    /// Actor positions from movements and follow paths
    pub positions: IndexMap<H, Vec3>,
    /// Actor facings where the samples define one
    pub facings: IndexMap<H, Vec3>,
    /// Animation blends, one per track with an active animation
    pub animations: Vec<AnimationBlend<H>>,
    /// Particle seek requests
    pub particles: Vec<ParticleCue<H>>,
    /// Camera placement, when a camera path is active and its camera resolved
    pub camera: Option<CameraPose<H>>,
    /// Look-ahead points for follow-path actors without an explicit facing
    pub chase_points: IndexMap<H, Vec3>,
    /// Edge-triggered events, in evaluation order
    pub events: Vec<ScrubEvent>,
}

impl<H> EvaluationResult<H> {
    fn new(normalized_time: f32) -> Self {
        Self {
            normalized_time,
            positions: IndexMap::new(),
            facings: IndexMap::new(),
            animations: Vec::new(),
            particles: Vec::new(),
            camera: None,
            chase_points: IndexMap::new(),
            events: Vec::new(),
        }
    }
}

/// Clip progress at `current_time`; 0 for a clip without duration
pub fn normalized_time(clip: &Clip, current_time: f32) -> f32 {
    if clip.duration > 0.0 {
        current_time / clip.duration
    } else {
        0.0
    }
}

/// Whether playback moving from `prev_time` to `current_time` crossed the start
fn entered(base: &SampleBase, prev_time: f32, current_time: f32) -> bool {
    prev_time < base.start_time && base.start_time <= current_time
}

fn layer(sample: &MecanimSample, current_time: f32, weight: f32) -> AnimationLayer {
    AnimationLayer {
        state: sample.state.clone(),
        normalized_time: sample.sampling_time(current_time),
        weight,
    }
}

/// Blend weights and sampling times for an animation pair.
///
/// Two samples of the same actor fade linearly over their overlap. A
/// single sample, or two samples of different actors, give the lead
/// sample full weight on layer 0.
pub fn crossfade(pair: &SamplePair<'_, MecanimSample>, current_time: f32) -> Crossfade {
    let first = pair.first;
    let actor = first.base.actor_prefab.clone();
    match pair.second {
        Some(second) if second.base.actor_prefab == first.base.actor_prefab => {
            let weight0 = if pair.overlap <= 0.0 {
                1.0
            } else {
                ((first.base.end_time() - current_time) / pair.overlap).clamp(0.0, 1.0)
            };
            Crossfade {
                actor,
                layers: [
                    layer(first, current_time, weight0),
                    layer(second, current_time, 1.0 - weight0),
                ],
            }
        }
        _ => {
            let lead = layer(first, current_time, 1.0);
            let idle = AnimationLayer {
                weight: 0.0,
                ..lead.clone()
            };
            Crossfade {
                actor,
                layers: [lead, idle],
            }
        }
    }
}

/// Camera path driving the camera at `current_time`.
///
/// The first track with a direct hit wins; otherwise the nearest fallback
/// over all tracks. Look-at and position paths are searched separately.
pub fn camera_sample_at_time(
    clip: &Clip,
    num_tracks: u32,
    prev_time: f32,
    current_time: f32,
    lookat: bool,
) -> Option<&CameraPathSample> {
    let mut nearest: Option<(&CameraPathSample, f32)> = None;
    for track in 0..num_tracks {
        let Some(pair) = clip.pair_at_time_delta_where::<CameraPathSample, _>(
            prev_time,
            current_time,
            track,
            |s| s.is_lookat_path == lookat,
        ) else {
            continue;
        };
        if !pair.is_fallback() {
            return Some(pair.first);
        }
        let offset = pair.fallback_distance();
        if nearest.map_or(true, |(_, best)| offset < best) {
            nearest = Some((pair.first, offset));
        }
    }
    nearest.map(|(sample, _)| sample)
}

/// Evaluates clips against a host's actors
pub struct Scrubber<'a, R: ActorResolver> {
    resolver: &'a R,
    settings: ScrubSettings,
}

impl<'a, R: ActorResolver> Scrubber<'a, R> {
    /// Create a scrubber with default settings
    pub fn new(resolver: &'a R) -> Self {
        Self {
            resolver,
            settings: ScrubSettings::default(),
        }
    }

    /// Replace the settings
    pub fn with_settings(mut self, settings: ScrubSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Current settings
    pub fn settings(&self) -> &ScrubSettings {
        &self.settings
    }

    /// Evaluate `num_tracks` tracks of a clip for the window `prev_time..current_time`.
    ///
    /// Samples whose actor cannot be resolved are logged and skipped.
    pub fn evaluate(
        &self,
        clip: &Clip,
        num_tracks: u32,
        prev_time: f32,
        current_time: f32,
    ) -> EvaluationResult<R::Handle> {
        let mut result = EvaluationResult::new(normalized_time(clip, current_time));
        if !self.settings.skip_camera {
            result.camera = self.scrub_camera(clip, num_tracks, prev_time, current_time);
        }
        self.scrub_animations(clip, num_tracks, prev_time, current_time, &mut result);
        self.scrub_particles(clip, num_tracks, prev_time, current_time, &mut result);
        self.scrub_movements(clip, num_tracks, prev_time, current_time, &mut result);
        self.scrub_follow_paths(clip, num_tracks, prev_time, current_time, &mut result);
        result
    }

    fn camera_actor(&self, name: &str) -> Option<R::Handle> {
        let camera = self.resolver.resolve(name).or_else(|| {
            self.settings
                .fallback_to_main_camera
                .then(|| self.resolver.main_camera())
                .flatten()
        });
        if camera.is_none() {
            tracing::warn!("Can't find main camera or camera called '{}'", name);
        }
        camera
    }

    fn animated_actor(&self, name: &str) -> Option<R::Handle> {
        self.resolver
            .resolve(name)
            .or_else(|| self.resolver.any_animated_actor())
    }

    fn scrub_camera(
        &self,
        clip: &Clip,
        num_tracks: u32,
        prev_time: f32,
        current_time: f32,
    ) -> Option<CameraPose<R::Handle>> {
        // Look-at first; the position camera aims at it
        let look_at = camera_sample_at_time(clip, num_tracks, prev_time, current_time, true)
            .map(|s| (s, s.evaluate(current_time)));
        let mut pose = look_at.and_then(|(sample, point)| {
            self.camera_actor(&sample.base.actor_prefab)
                .map(|camera| CameraPose {
                    camera,
                    position: None,
                    look_at: Some(point),
                })
        });

        if let Some(sample) =
            camera_sample_at_time(clip, num_tracks, prev_time, current_time, false)
        {
            if let Some(camera) = self.camera_actor(&sample.base.actor_prefab) {
                pose = Some(CameraPose {
                    camera,
                    position: Some(sample.evaluate(current_time)),
                    look_at: look_at.map(|(_, point)| point),
                });
            }
        }
        pose
    }

    fn scrub_animations(
        &self,
        clip: &Clip,
        num_tracks: u32,
        prev_time: f32,
        current_time: f32,
        result: &mut EvaluationResult<R::Handle>,
    ) {
        for track in 0..num_tracks {
            let Some(pair) =
                clip.pair_at_time_delta::<MecanimSample>(prev_time, current_time, track)
            else {
                continue;
            };
            let fade = crossfade(&pair, current_time);
            match self.animated_actor(&fade.actor) {
                Some(actor) => result.animations.push(AnimationBlend {
                    actor,
                    track,
                    layers: fade.layers,
                }),
                None => tracing::warn!(
                    "Clip scrub needs animated actor '{}' on track {}, none found",
                    fade.actor,
                    track
                ),
            }
            for sample in pair.iter() {
                if entered(&sample.base, prev_time, current_time) {
                    result.events.push(ScrubEvent::EnterAnimation {
                        tag: sample.base.tag.clone(),
                    });
                }
            }
        }
    }

    fn scrub_particles(
        &self,
        clip: &Clip,
        num_tracks: u32,
        prev_time: f32,
        current_time: f32,
        result: &mut EvaluationResult<R::Handle>,
    ) {
        for track in 0..num_tracks {
            let Some(pair) =
                clip.pair_at_time_delta::<ParticleSample>(prev_time, current_time, track)
            else {
                continue;
            };
            let lead = &pair.first.base;
            match self.resolver.resolve(&lead.actor_prefab) {
                Some(system) => result.particles.push(ParticleCue {
                    system,
                    tag: lead.tag.clone(),
                    local_time: particle_local_time(lead, current_time),
                }),
                None => tracing::debug!("No particle system called '{}'", lead.actor_prefab),
            }
            for sample in pair.iter() {
                if entered(&sample.base, prev_time, current_time) {
                    result.events.push(ScrubEvent::EnterParticle {
                        tag: sample.base.tag.clone(),
                    });
                }
            }
        }
    }

    fn scrub_movements(
        &self,
        clip: &Clip,
        num_tracks: u32,
        prev_time: f32,
        current_time: f32,
        result: &mut EvaluationResult<R::Handle>,
    ) {
        for track in 0..num_tracks {
            let Some(pair) =
                clip.pair_at_time_delta::<MovementSample>(prev_time, current_time, track)
            else {
                continue;
            };
            let lead = pair.first;
            let Some(actor) = self.animated_actor(&lead.base.actor_prefab) else {
                tracing::warn!("Can't find actor '{}' for movement", lead.base.actor_prefab);
                continue;
            };
            let pose = lead.evaluate(current_time);
            let facing = pose.facing.filter(|_| {
                self.settings.has_facing(lead.start.facing)
                    && self.settings.has_facing(lead.end.facing)
            });
            if let Some(facing) = facing {
                result.facings.insert(actor.clone(), facing);
            }
            result.positions.insert(actor, pose.position);
        }
    }

    fn scrub_follow_paths(
        &self,
        clip: &Clip,
        num_tracks: u32,
        prev_time: f32,
        current_time: f32,
        result: &mut EvaluationResult<R::Handle>,
    ) {
        for track in 0..num_tracks {
            let Some(pair) =
                clip.pair_at_time_delta::<FollowPathSample>(prev_time, current_time, track)
            else {
                continue;
            };
            let lead = pair.first;
            if lead.keys.is_empty() {
                continue;
            }
            let Some(actor) = self.resolver.resolve(&lead.base.actor_prefab) else {
                tracing::warn!("Can't find actor '{}' for follow path", lead.base.actor_prefab);
                continue;
            };
            let pose = lead.evaluate(current_time);
            match pose.facing.filter(|f| self.settings.has_facing(*f)) {
                Some(facing) => {
                    result.facings.insert(actor.clone(), facing);
                }
                None => {
                    let chase =
                        lead.chase_point(current_time, self.settings.default_chase_point_offset);
                    result.chase_points.insert(actor.clone(), chase);
                }
            }
            result.positions.insert(actor, pose.position);
        }
    }
}

fn particle_local_time(base: &SampleBase, current_time: f32) -> f32 {
    if base.duration > 0.0 {
        local_time(current_time, base.start_time, base.duration)
    } else if current_time >= base.start_time {
        1.0
    } else {
        -1.0
    }
}

/// Evaluate a clip with default settings
pub fn evaluate<R: ActorResolver>(
    clip: &Clip,
    num_tracks: u32,
    prev_time: f32,
    current_time: f32,
    resolver: &R,
) -> EvaluationResult<R::Handle> {
    Scrubber::new(resolver).evaluate(clip, num_tracks, prev_time, current_time)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::{ActorHints, ANY_ANIMATED_ACTOR};
    use cinereel_clip::{CameraPathKey, FollowPathKey, MovementKey};

    fn close(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-4
    }

    fn close_vec(a: Vec3, b: Vec3) -> bool {
        a.distance(b) < 1e-4
    }

    fn base(track: u32, start: f32, duration: f32, actor: &str) -> SampleBase {
        SampleBase::new(track, start, duration).with_actor(actor)
    }

    fn anim(track: u32, start: f32, duration: f32, state: &str, actor: &str) -> MecanimSample {
        MecanimSample::new(base(track, start, duration, actor), state)
    }

    fn hints() -> ActorHints<u32> {
        ActorHints::new()
            .with("Hero", 1)
            .with("Villain", 2)
            .with("Cam", 10)
            .with("Sparks", 20)
    }

    fn crossfade_clip() -> Clip {
        let mut clip = Clip::with_duration(10.0);
        clip.add(anim(0, 0.0, 2.0, "Idle", "Hero"));
        clip.add(anim(0, 1.5, 2.0, "Run", "Hero"));
        clip
    }

    #[test]
    fn test_crossfade_midpoint() {
        let clip = crossfade_clip();
        let result = evaluate(&clip, clip.number_of_tracks(), 1.7, 1.75, &hints());

        assert_eq!(result.animations.len(), 1);
        let blend = &result.animations[0];
        assert_eq!(blend.actor, 1);
        assert_eq!(blend.track, 0);
        assert_eq!(blend.layers[0].state, "Idle");
        assert_eq!(blend.layers[1].state, "Run");
        assert!(close(blend.layers[0].weight, 0.5));
        assert!(close(blend.layers[1].weight, 0.5));
        assert!(close(blend.layers[0].normalized_time, 0.875));
        assert!(close(blend.layers[1].normalized_time, 0.125));
        assert!(close(result.normalized_time, 0.175));
    }

    #[test]
    fn test_crossfade_unsorted_clip() {
        let mut clip = Clip::with_duration(10.0);
        clip.add(anim(0, 1.5, 2.0, "Run", "Hero"));
        clip.add(anim(0, 0.0, 2.0, "Idle", "Hero"));
        let result = evaluate(&clip, 1, 1.7, 1.75, &hints());

        let blend = &result.animations[0];
        assert_eq!(blend.layers[0].state, "Idle");
        assert_eq!(blend.layers[1].state, "Run");
        assert!(close(blend.layers[0].weight, 0.5));
        assert!(close(blend.layers[1].weight, 0.5));
    }

    #[test]
    fn test_crossfade_weights_conserved_and_monotonic() {
        let clip = crossfade_clip();
        let mut last = f32::INFINITY;
        for i in 0..10 {
            let t = 1.5 + i as f32 * 0.05;
            let pair = clip.pair_at_time::<MecanimSample>(t, 0).unwrap();
            let [w0, w1] = crossfade(&pair, t).weights();
            assert!(close(w0 + w1, 1.0));
            assert!(w0 <= last);
            last = w0;
        }
    }

    #[test]
    fn test_crossfade_different_actors() {
        let mut clip = Clip::new();
        clip.add(anim(0, 0.0, 2.0, "Idle", "Hero"));
        clip.add(anim(0, 1.5, 2.0, "Taunt", "Villain"));
        let pair = clip.pair_at_time::<MecanimSample>(1.75, 0).unwrap();
        let fade = crossfade(&pair, 1.75);
        assert_eq!(fade.actor, "Hero");
        assert_eq!(fade.weights(), [1.0, 0.0]);
        assert_eq!(fade.layers[1].state, "Idle");
    }

    #[test]
    fn test_crossfade_fallback_sample() {
        let mut clip = Clip::new();
        clip.add(anim(0, 0.0, 2.0, "Idle", "Hero"));
        let pair = clip.pair_at_time_delta::<MecanimSample>(2.9, 3.0, 0).unwrap();
        assert!(pair.is_fallback());
        let fade = crossfade(&pair, 3.0);
        assert_eq!(fade.weights(), [1.0, 0.0]);
        assert!(close(fade.layers[0].normalized_time, 1.0));
    }

    #[test]
    fn test_any_animated_actor_fallback() {
        let mut clip = Clip::new();
        clip.add(anim(0, 0.0, 2.0, "Idle", "Stranger"));

        let result = evaluate(&clip, 1, 0.0, 1.0, &hints());
        assert!(result.animations.is_empty());

        let with_any = hints().with(ANY_ANIMATED_ACTOR, 99);
        let result = evaluate(&clip, 1, 0.0, 1.0, &with_any);
        assert_eq!(result.animations[0].actor, 99);
    }

    #[test]
    fn test_enter_events_are_edge_triggered() {
        let mut clip = Clip::new();
        clip.add(MecanimSample::new(
            base(0, 1.0, 2.0, "Hero").with_tag("wave"),
            "Wave",
        ));
        clip.add(ParticleSample::new(base(1, 2.0, 1.0, "Sparks").with_tag("boom")));

        let crossing = evaluate(&clip, 2, 0.9, 1.0, &hints());
        assert_eq!(
            crossing.events,
            vec![ScrubEvent::EnterAnimation {
                tag: "wave".to_string()
            }]
        );

        let inside = evaluate(&clip, 2, 1.0, 1.1, &hints());
        assert!(inside.events.is_empty());

        let particle = evaluate(&clip, 2, 1.5, 2.5, &hints());
        assert_eq!(particle.events.len(), 1);
        assert_eq!(particle.events[0].tag(), "boom");
    }

    #[test]
    fn test_no_events_when_rewinding() {
        let mut clip = Clip::new();
        clip.add(MecanimSample::new(
            base(0, 1.0, 2.0, "Hero").with_tag("wave"),
            "Wave",
        ));
        clip.add(ParticleSample::new(base(1, 2.0, 1.0, "Sparks").with_tag("boom")));
        let result = evaluate(&clip, 2, 2.5, 0.5, &hints());
        assert!(result.events.is_empty());
    }

    #[test]
    fn test_particle_event_survives_large_step() {
        let mut clip = Clip::new();
        clip.add(ParticleSample::new(base(0, 2.0, 1.0, "Sparks").with_tag("boom")));
        let result = evaluate(&clip, 1, 0.0, 10.0, &hints());
        assert_eq!(result.events.len(), 1);
        assert_eq!(result.particles[0].phase(), ParticlePhase::After);
    }

    #[test]
    fn test_particle_cue() {
        let mut clip = Clip::new();
        clip.add(ParticleSample::new(base(0, 2.0, 4.0, "Sparks")));
        let result = evaluate(&clip, 1, 2.9, 3.0, &hints());
        let cue = &result.particles[0];
        assert_eq!(cue.system, 20);
        assert!(close(cue.local_time, 0.25));
        assert_eq!(cue.phase(), ParticlePhase::Active);

        let before = evaluate(&clip, 1, 1.1, 1.0, &hints());
        assert_eq!(before.particles[0].phase(), ParticlePhase::Before);
    }

    fn camera_clip() -> Clip {
        let mut clip = Clip::with_duration(4.0);
        clip.add(
            CameraPathSample::new(base(0, 0.0, 4.0, "Cam"), false).with_keys(vec![
                CameraPathKey::at(0.0, Vec3::ZERO),
                CameraPathKey::at(1.0, Vec3::new(4.0, 0.0, 0.0)),
            ]),
        );
        clip.add(
            CameraPathSample::new(base(1, 0.0, 4.0, "Cam"), true).with_keys(vec![
                CameraPathKey::at(0.0, Vec3::new(0.0, 0.0, 10.0)),
                CameraPathKey::at(1.0, Vec3::new(0.0, 4.0, 10.0)),
            ]),
        );
        clip
    }

    #[test]
    fn test_camera_pose() {
        let clip = camera_clip();
        let result = evaluate(&clip, 2, 1.9, 2.0, &hints());
        let pose = result.camera.unwrap();
        assert_eq!(pose.camera, 10);
        assert!(close_vec(pose.position.unwrap(), Vec3::new(2.0, 0.0, 0.0)));
        assert!(close_vec(pose.look_at.unwrap(), Vec3::new(0.0, 2.0, 10.0)));
    }

    #[test]
    fn test_skip_camera() {
        let clip = camera_clip();
        let resolver = hints();
        let settings = ScrubSettings {
            skip_camera: true,
            ..ScrubSettings::default()
        };
        let result = Scrubber::new(&resolver)
            .with_settings(settings)
            .evaluate(&clip, 2, 1.9, 2.0);
        assert!(result.camera.is_none());
    }

    #[test]
    fn test_camera_main_camera_fallback() {
        let mut clip = camera_clip();
        for s in clip.samples_mut::<CameraPathSample>() {
            s.base.actor_prefab = "MissingCam".to_string();
        }
        let resolver = ActorHints::new().with_main_camera(5u32);

        let result = evaluate(&clip, 2, 1.9, 2.0, &resolver);
        assert!(result.camera.is_none());

        let result = Scrubber::new(&resolver)
            .with_settings(ScrubSettings::editor())
            .evaluate(&clip, 2, 1.9, 2.0);
        assert_eq!(result.camera.unwrap().camera, 5);
    }

    #[test]
    fn test_camera_sample_prefers_direct_hit() {
        let mut clip = Clip::new();
        let near = clip.add(CameraPathSample::new(base(0, 0.0, 1.0, "Cam"), false));
        let hit = clip.add(CameraPathSample::new(base(2, 2.0, 2.0, "Cam"), false));
        clip.add(CameraPathSample::new(base(1, 0.0, 0.5, "Cam"), false));

        let found = camera_sample_at_time(&clip, 3, 2.9, 3.0, false).unwrap();
        assert_eq!(found.base.id, hit);

        let found = camera_sample_at_time(&clip, 3, 1.4, 1.5, false).unwrap();
        assert_eq!(found.base.id, near);

        assert!(camera_sample_at_time(&clip, 3, 1.4, 1.5, true).is_none());
    }

    #[test]
    fn test_movement_pose() {
        let mut clip = Clip::new();
        clip.add(MovementSample::new(
            base(0, 0.0, 2.0, "Hero"),
            MovementKey::new(Vec3::ZERO, Vec3::X),
            MovementKey::new(Vec3::new(2.0, 0.0, 0.0), Vec3::Z),
        ));
        clip.add(MovementSample::new(
            base(1, 0.0, 2.0, "Villain"),
            MovementKey::new(Vec3::ZERO, Vec3::ZERO),
            MovementKey::new(Vec3::new(0.0, 0.0, 4.0), Vec3::X),
        ));

        let result = evaluate(&clip, 2, 0.9, 1.0, &hints());
        assert!(close_vec(result.positions[&1], Vec3::new(1.0, 0.0, 0.0)));
        assert!(close_vec(
            result.facings[&1],
            Vec3::new(1.0, 0.0, 1.0).normalize()
        ));
        assert!(close_vec(result.positions[&2], Vec3::new(0.0, 0.0, 2.0)));
        assert!(!result.facings.contains_key(&2));
    }

    #[test]
    fn test_missing_actor_does_not_abort_tick() {
        let _ = tracing_subscriber::fmt().with_test_writer().try_init();
        let mut clip = Clip::new();
        clip.add(MovementSample::new(
            base(0, 0.0, 2.0, "Ghost"),
            MovementKey::default(),
            MovementKey::new(Vec3::X, Vec3::ZERO),
        ));
        clip.add(MovementSample::new(
            base(1, 0.0, 2.0, "Hero"),
            MovementKey::default(),
            MovementKey::new(Vec3::X, Vec3::ZERO),
        ));
        let result = evaluate(&clip, 2, 0.0, 2.0, &hints());
        assert_eq!(result.positions.len(), 1);
        assert!(close_vec(result.positions[&1], Vec3::X));
    }

    #[test]
    fn test_follow_path() {
        let mut clip = Clip::new();
        clip.add(
            FollowPathSample::new(base(0, 0.0, 2.0, "Hero")).with_keys(vec![
                FollowPathKey::new(0.0, Vec3::ZERO),
                FollowPathKey::new(1.0, Vec3::new(2.0, 0.0, 0.0)),
            ]),
        );
        clip.add(
            FollowPathSample::new(base(1, 0.0, 2.0, "Villain")).with_keys(vec![
                FollowPathKey::new(0.0, Vec3::ZERO).with_facing(Vec3::X),
                FollowPathKey::new(1.0, Vec3::Z).with_facing(Vec3::X),
            ]),
        );

        let result = evaluate(&clip, 2, 0.9, 1.0, &hints());
        assert!(close_vec(result.positions[&1], Vec3::new(1.0, 0.0, 0.0)));
        assert!(close_vec(result.chase_points[&1], Vec3::new(1.1, 0.0, 0.0)));
        assert!(!result.facings.contains_key(&1));

        assert!(close_vec(result.facings[&2], Vec3::X));
        assert!(!result.chase_points.contains_key(&2));
    }

    #[test]
    fn test_normalized_time() {
        let clip = Clip::with_duration(10.0);
        assert!(close(normalized_time(&clip, 5.0), 0.5));
        assert!(close(normalized_time(&clip, 12.0), 1.2));
        assert_eq!(normalized_time(&Clip::new(), 5.0), 0.0);
    }

    #[test]
    fn test_empty_clip() {
        let clip = Clip::new();
        let result = evaluate(&clip, 0, 0.0, 1.0, &hints());
        assert!(result.camera.is_none());
        assert!(result.animations.is_empty());
        assert!(result.positions.is_empty());
        assert!(result.events.is_empty());
    }

    #[test]
    fn test_evaluation_is_stateless() {
        let clip = crossfade_clip();
        let resolver = hints();
        let scrubber = Scrubber::new(&resolver);
        let forward = scrubber.evaluate(&clip, 1, 1.7, 1.75);
        scrubber.evaluate(&clip, 1, 3.0, 0.0);
        let again = scrubber.evaluate(&clip, 1, 1.7, 1.75);
        assert_eq!(forward.animations, again.animations);
        assert_eq!(forward.events, again.events);
    }
}
