// SPDX-License-Identifier: MIT OR Apache-2.0
//! Actor lookup supplied by the host.
//!
//! Samples name their actor by string. The scrubber asks an
//! [`ActorResolver`] to turn that name into whatever handle the host uses
//! for scene objects, and reports results keyed by those handles.

use indexmap::IndexMap;
use std::fmt::Debug;
use std::hash::Hash;

/// Hint name for "any actor with an animation player"
pub const ANY_ANIMATED_ACTOR: &str = "AnyAnimatedActor";

/// Maps actor names from a clip to host handles
pub trait ActorResolver {
    /// Host handle for a scene object
    type Handle: Clone + Eq + Hash + Debug;

    /// Look up an actor by name
    fn resolve(&self, name: &str) -> Option<Self::Handle>;

    /// Actor used for animation and movement samples whose actor is not found
    fn any_animated_actor(&self) -> Option<Self::Handle> {
        self.resolve(ANY_ANIMATED_ACTOR)
    }

    /// The host's main camera
    fn main_camera(&self) -> Option<Self::Handle> {
        None
    }
}

/// Name to handle table, in insertion order
#[derive(Debug, Clone)]
pub struct ActorHints<H> {
    hints: IndexMap<String, H>,
    main_camera: Option<H>,
}

impl<H> ActorHints<H> {
    /// Create an empty table
    pub fn new() -> Self {
        Self {
            hints: IndexMap::new(),
            main_camera: None,
        }
    }

    /// Add a hint, builder style
    pub fn with(mut self, name: impl Into<String>, handle: H) -> Self {
        self.insert(name, handle);
        self
    }

    /// Set the main camera, builder style
    pub fn with_main_camera(mut self, handle: H) -> Self {
        self.main_camera = Some(handle);
        self
    }

    /// Add or replace a hint
    pub fn insert(&mut self, name: impl Into<String>, handle: H) -> Option<H> {
        self.hints.insert(name.into(), handle)
    }

    /// Hint for a name
    pub fn get(&self, name: &str) -> Option<&H> {
        self.hints.get(name)
    }

    /// Number of hints
    pub fn len(&self) -> usize {
        self.hints.len()
    }

    /// Whether there are no hints
    pub fn is_empty(&self) -> bool {
        self.hints.is_empty()
    }
}

impl<H> Default for ActorHints<H> {
    fn default() -> Self {
        Self::new()
    }
}

impl<H: Clone + Eq + Hash + Debug> ActorResolver for ActorHints<H> {
    type Handle = H;

    fn resolve(&self, name: &str) -> Option<H> {
        self.hints.get(name).cloned()
    }

    fn main_camera(&self) -> Option<H> {
        self.main_camera.clone()
    }
}
