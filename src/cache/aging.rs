// Copyright @yucwang 2026

use crate::cache::candidate::CandidateSet;
use crate::cache::score::sanitize_score;
use crate::core::config::NeeCacheConfig;
use crate::math::constants::Float;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TickStats {
    pub aged: usize,
    pub culled: usize,
}

impl std::ops::Add for TickStats {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self { aged: self.aged + rhs.aged, culled: self.culled + rhs.culled }
    }
}

pub fn decay_factor(age: u32, age_culling_speed: Float) -> Float {
    (1.0 - age_culling_speed * age as Float).clamp(0.0, 1.0)
}

/// Upper bound on the number of consecutive unobserved frames a candidate survives.
pub fn max_unobserved_frames(age_culling_speed: Float) -> u32 {
    (1.0 / age_culling_speed).ceil() as u32
}

/// Ends a frame for one cell: ages and decays every candidate that was not
/// observed since the last tick, then drops candidates whose score reached the
/// cull threshold.
pub fn tick(set: &mut CandidateSet, config: &NeeCacheConfig) -> TickStats {
    let mut stats = TickStats::default();
    let candidates = set.candidates_mut();

    for candidate in candidates.iter_mut() {
        if candidate.reinforced {
            candidate.reinforced = false;
            continue;
        }
        candidate.age = candidate.age.saturating_add(1);
        candidate.score = sanitize_score(candidate.score * decay_factor(candidate.age, config.age_culling_speed));
        stats.aged += 1;
    }

    let before = candidates.len();
    candidates.retain(|c| c.score > config.cull_threshold);
    stats.culled = before - candidates.len();

    stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::emitter::TriangleId;
    use crate::core::rng::LcgRng;

    fn config_with_speed(speed: Float) -> NeeCacheConfig {
        let mut config = NeeCacheConfig::default();
        config.age_culling_speed = speed;
        config
    }

    #[test]
    fn test_decay_factor_is_non_increasing() {
        let mut last = 1.0;
        for age in 0..200 {
            let f = decay_factor(age, 0.02);
            assert!(f <= last);
            assert!(f >= 0.0);
            last = f;
        }
        assert_eq!(decay_factor(50, 0.02), 0.0);
    }

    #[test]
    fn test_unobserved_candidate_decays_then_disappears() {
        let config = config_with_speed(0.1);
        let mut set = CandidateSet::new(4);
        let mut rng = LcgRng::new(0);
        set.offer(TriangleId::new(0, 1), 100.0, &config, &mut rng);

        // the frame it was observed in does not age it
        let stats = tick(&mut set, &config);
        assert_eq!(stats, TickStats { aged: 0, culled: 0 });
        assert_eq!(set.get(TriangleId::new(0, 1)).map(|c| c.score), Some(100.0));

        let limit = max_unobserved_frames(config.age_culling_speed);
        let mut last = 100.0;
        let mut frames = 0;
        while let Some(c) = set.get(TriangleId::new(0, 1)) {
            assert!(c.score <= last);
            last = c.score;
            tick(&mut set, &config);
            frames += 1;
            assert!(frames <= limit, "candidate outlived {} frames", limit);
        }
        assert!(set.is_empty());
    }

    #[test]
    fn test_reinforced_candidates_survive() {
        let config = config_with_speed(0.5);
        let mut set = CandidateSet::new(4);
        let mut rng = LcgRng::new(0);
        let kept = TriangleId::new(0, 1);
        let dropped = TriangleId::new(0, 2);
        set.offer(kept, 1.0, &config, &mut rng);
        set.offer(dropped, 1.0, &config, &mut rng);
        tick(&mut set, &config);

        for _ in 0..10 {
            set.offer(kept, 1.0, &config, &mut rng);
            tick(&mut set, &config);
        }
        assert!(set.get(kept).is_some());
        assert!(set.get(dropped).is_none());
        assert_eq!(set.get(kept).map(|c| c.age), Some(0));
    }

    #[test]
    fn test_negative_speed_never_grows_scores() {
        let config = config_with_speed(-1.0);
        let mut set = CandidateSet::new(4);
        let mut rng = LcgRng::new(0);
        set.offer(TriangleId::new(0, 1), 3.0, &config, &mut rng);
        for _ in 0..60 {
            tick(&mut set, &config);
        }
        let score = set.get(TriangleId::new(0, 1)).map(|c| c.score);
        assert_eq!(score, Some(3.0));
        assert_eq!(decay_factor(10, -1.0), 1.0);
    }

    #[test]
    fn test_zero_scores_are_culled() {
        let config = NeeCacheConfig::default();
        let mut set = CandidateSet::new(4);
        let mut rng = LcgRng::new(0);
        set.offer(TriangleId::new(0, 1), 0.0, &config, &mut rng);
        set.offer(TriangleId::new(0, 2), 1.0, &config, &mut rng);
        let stats = tick(&mut set, &config);
        assert_eq!(stats.culled, 1);
        assert_eq!(set.len(), 1);
    }
}
