// Copyright @yucwang 2026

use crate::core::error::{NeeCacheError, Result};
use crate::math::constants::Float;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplacementPolicy {
    /// Evict the lowest scoring candidate, only if the newcomer beats it.
    Greedy,
    /// Evict a uniformly chosen candidate regardless of scores.
    Random,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MisHeuristic {
    Balance,
    Power,
}

impl MisHeuristic {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "balance" => Some(MisHeuristic::Balance),
            "power" => Some(MisHeuristic::Power),
            _ => None,
        }
    }
}

// 64^3 cells at the largest capacity stay within a few hundred megabytes.
pub const MAX_RESOLUTION: usize = 64;
pub const MAX_CANDIDATE_CAPACITY: usize = 64;

/// Snapshot of the NEE cache options. The driver reads one snapshot per frame,
/// so options may change between frames but never during one.
#[derive(Debug, Clone, PartialEq)]
pub struct NeeCacheConfig {
    pub enable: bool,
    pub enable_importance_sampling: bool,
    pub enable_mis: bool,
    pub enable_jittering: bool,
    pub enable_in_first_bounce: bool,
    pub enable_in_second_and_more_bounces: bool,
    pub enable_random_replacement: bool,
    /// Half extent of the cached volume along each axis, in world units.
    pub range: Float,
    pub emissive_texture_sample_footprint_size: Float,
    /// Per-frame decay slope applied to candidates that were not observed.
    pub age_culling_speed: Float,

    pub resolution: usize,
    pub candidate_capacity: usize,
    /// Weight of a new observation when a known candidate is reinforced.
    pub score_blend_factor: Float,
    pub cull_threshold: Float,
    pub mis_heuristic: MisHeuristic,
}

impl Default for NeeCacheConfig {
    fn default() -> Self {
        Self {
            enable: true,
            enable_importance_sampling: true,
            enable_mis: true,
            enable_jittering: true,
            enable_in_first_bounce: true,
            enable_in_second_and_more_bounces: true,
            enable_random_replacement: false,
            range: 3000.0,
            emissive_texture_sample_footprint_size: 1.0,
            age_culling_speed: 0.02,
            resolution: 32,
            candidate_capacity: 15,
            score_blend_factor: 0.25,
            cull_threshold: 1e-6,
            mis_heuristic: MisHeuristic::Balance,
        }
    }
}

impl NeeCacheConfig {
    pub fn replacement_policy(&self) -> ReplacementPolicy {
        if self.enable_random_replacement {
            ReplacementPolicy::Random
        } else {
            ReplacementPolicy::Greedy
        }
    }

    pub fn cell_count(&self) -> usize {
        self.resolution * self.resolution * self.resolution
    }

    /// Whether the sampler may run for a path vertex at `bounce` (0 = primary hit).
    pub fn sampling_enabled_for_bounce(&self, bounce: u32) -> bool {
        if bounce == 0 {
            self.enable_in_first_bounce
        } else {
            self.enable_in_second_and_more_bounces
        }
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.range.is_finite() && self.range > 0.0) {
            return Err(invalid("range", format!("must be a positive finite number, got {}", self.range)));
        }
        if !(self.age_culling_speed.is_finite() && self.age_culling_speed > 0.0) {
            return Err(invalid(
                "ageCullingSpeed",
                format!("must be a positive finite number, got {}", self.age_culling_speed),
            ));
        }
        let footprint = self.emissive_texture_sample_footprint_size;
        if !(footprint.is_finite() && footprint >= 0.0) {
            return Err(invalid(
                "emissiveTextureSampleFootprintSize",
                format!("must be a non-negative finite number, got {}", footprint),
            ));
        }
        if self.resolution == 0 || self.resolution > MAX_RESOLUTION {
            return Err(invalid(
                "resolution",
                format!("must be in 1..={}, got {}", MAX_RESOLUTION, self.resolution),
            ));
        }
        if self.candidate_capacity == 0 || self.candidate_capacity > MAX_CANDIDATE_CAPACITY {
            return Err(invalid(
                "candidateCapacity",
                format!("must be in 1..={}, got {}", MAX_CANDIDATE_CAPACITY, self.candidate_capacity),
            ));
        }
        if !(self.score_blend_factor > 0.0 && self.score_blend_factor <= 1.0) {
            return Err(invalid(
                "scoreBlendFactor",
                format!("must be in (0, 1], got {}", self.score_blend_factor),
            ));
        }
        if !(self.cull_threshold.is_finite() && self.cull_threshold >= 0.0) {
            return Err(invalid(
                "cullThreshold",
                format!("must be a non-negative finite number, got {}", self.cull_threshold),
            ));
        }

        Ok(())
    }
}

fn invalid(option: &'static str, reason: String) -> NeeCacheError {
    NeeCacheError::InvalidConfig { option, reason }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = NeeCacheConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.replacement_policy(), ReplacementPolicy::Greedy);
        assert_eq!(config.cell_count(), 32 * 32 * 32);
    }

    #[test]
    fn test_rejects_non_positive_range() {
        let mut config = NeeCacheConfig::default();
        config.range = 0.0;
        match config.validate() {
            Err(NeeCacheError::InvalidConfig { option, .. }) => assert_eq!(option, "range"),
            other => panic!("unexpected result: {:?}", other),
        }
        config.range = Float::NAN;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_non_positive_age_culling_speed() {
        let mut config = NeeCacheConfig::default();
        config.age_culling_speed = -0.5;
        match config.validate() {
            Err(NeeCacheError::InvalidConfig { option, .. }) => assert_eq!(option, "ageCullingSpeed"),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_rejects_bad_tuning_values() {
        let mut config = NeeCacheConfig::default();
        config.candidate_capacity = 0;
        assert!(config.validate().is_err());

        let mut config = NeeCacheConfig::default();
        config.score_blend_factor = 0.0;
        assert!(config.validate().is_err());

        let mut config = NeeCacheConfig::default();
        config.resolution = MAX_RESOLUTION + 1;
        assert!(config.validate().is_err());

        let mut config = NeeCacheConfig::default();
        config.resolution = 256;
        assert!(config.validate().is_err());
        config.resolution = MAX_RESOLUTION;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_bounce_gating() {
        let mut config = NeeCacheConfig::default();
        config.enable_in_first_bounce = false;
        assert!(!config.sampling_enabled_for_bounce(0));
        assert!(config.sampling_enabled_for_bounce(1));
        assert!(config.sampling_enabled_for_bounce(4));

        config.enable_in_first_bounce = true;
        config.enable_in_second_and_more_bounces = false;
        assert!(config.sampling_enabled_for_bounce(0));
        assert!(!config.sampling_enabled_for_bounce(3));
    }
}
