// SPDX-License-Identifier: MIT OR Apache-2.0
//! Scrub configuration.

use cinereel_clip::DEFAULT_CHASE_POINT_OFFSET;
use serde::{Deserialize, Serialize};

/// Squared length below which a movement facing is treated as "derive from motion"
pub const FACING_EPSILON_SQ: f32 = 0.0001;

/// Error loading or saving scrub settings
#[derive(Debug, thiserror::Error)]
pub enum ScrubError {
    /// RON serialization failed
    #[error("Serialization error: {0}")]
    Serialize(#[from] ron::Error),

    /// RON parsing failed
    #[error("Parse error: {0}")]
    Parse(#[from] ron::error::SpannedError),
}

/// Knobs for one scrub pass
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScrubSettings {
    /// Skip camera look-at and position paths
    pub skip_camera: bool,
    /// Drive the host's main camera when a camera actor is not found
    pub fallback_to_main_camera: bool,
    /// Chase point lead in seconds when neither key nor sample overrides it
    pub default_chase_point_offset: f32,
    /// Facings shorter than this (squared) are left to the host
    pub facing_epsilon_sq: f32,
}

impl Default for ScrubSettings {
    fn default() -> Self {
        Self {
            skip_camera: false,
            fallback_to_main_camera: false,
            default_chase_point_offset: DEFAULT_CHASE_POINT_OFFSET,
            facing_epsilon_sq: FACING_EPSILON_SQ,
        }
    }
}

impl ScrubSettings {
    /// Settings for an editor preview, which falls back to the main camera
    pub fn editor() -> Self {
        Self {
            fallback_to_main_camera: true,
            ..Self::default()
        }
    }

    /// Whether a facing is long enough to be applied
    pub fn has_facing(&self, facing: glam::Vec3) -> bool {
        facing.length_squared() > self.facing_epsilon_sq
    }

    /// Serialize to RON
    pub fn to_ron(&self) -> Result<String, ScrubError> {
        let config = ron::ser::PrettyConfig::default()
            .struct_names(true)
            .enumerate_arrays(false);
        Ok(ron::ser::to_string_pretty(self, config)?)
    }

    /// Deserialize from RON; missing fields take their defaults
    pub fn from_ron(s: &str) -> Result<Self, ScrubError> {
        Ok(ron::from_str(s)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = ScrubSettings::default();
        assert!(!settings.skip_camera);
        assert!(!settings.fallback_to_main_camera);
        assert_eq!(settings.default_chase_point_offset, 0.1);
        assert_eq!(settings.facing_epsilon_sq, 0.0001);
        assert!(ScrubSettings::editor().fallback_to_main_camera);
    }

    #[test]
    fn test_has_facing() {
        let settings = ScrubSettings::default();
        assert!(settings.has_facing(glam::Vec3::X));
        assert!(!settings.has_facing(glam::Vec3::splat(0.001)));
    }

    #[test]
    fn test_serialization() {
        let mut settings = ScrubSettings::default();
        settings.skip_camera = true;
        settings.default_chase_point_offset = 0.25;
        let ron_str = settings.to_ron().unwrap();
        let loaded = ScrubSettings::from_ron(&ron_str).unwrap();
        assert_eq!(loaded, settings);
    }

    #[test]
    fn test_partial_settings() {
        let loaded = ScrubSettings::from_ron("(skip_camera: true)").unwrap();
        assert!(loaded.skip_camera);
        assert_eq!(loaded.default_chase_point_offset, DEFAULT_CHASE_POINT_OFFSET);
        assert!(ScrubSettings::from_ron("(skip_camera: 12").is_err());
    }
}
