// Copyright @yucwang 2026

use crate::cache::candidate::CandidateSet;
use crate::core::emitter::TriangleId;
use crate::math::constants::Float;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SampleResult {
    pub triangle_id: TriangleId,
    /// Probability of having picked this triangle, in (0, 1].
    pub selection_probability: Float,
}

fn usable_total(set: &CandidateSet) -> Option<Float> {
    let total = set.total_score();
    if total > 0.0 && total.is_finite() { Some(total) } else { None }
}

/// Draws one candidate with the uniform number `u` in [0, 1).
///
/// With `importance`, candidates are picked in proportion to their scores; a
/// set whose scores sum to zero is sampled uniformly instead.
pub fn sample(set: &CandidateSet, importance: bool, u: Float) -> Option<SampleResult> {
    let candidates = set.as_slice();
    if candidates.is_empty() {
        return None;
    }

    let total = if importance { usable_total(set) } else { None };
    match total {
        Some(total) => {
            let target = u * total;
            let mut cdf = 0.0;
            let mut picked = None;
            for candidate in candidates.iter() {
                if candidate.score <= 0.0 {
                    continue;
                }
                cdf += candidate.score;
                picked = Some(candidate);
                if cdf > target {
                    break;
                }
            }
            // rounding may leave `target` past the last cdf step; keep the last positive entry
            picked.map(|c| SampleResult {
                triangle_id: c.triangle_id,
                selection_probability: c.score / total,
            })
        }
        None => {
            let n = candidates.len();
            let idx = ((u * n as Float) as usize).min(n - 1);
            Some(SampleResult {
                triangle_id: candidates[idx].triangle_id,
                selection_probability: 1.0 / n as Float,
            })
        }
    }
}

/// Probability that `sample` returns `triangle_id`; zero when the triangle is not cached.
pub fn selection_probability(set: &CandidateSet, triangle_id: TriangleId, importance: bool) -> Float {
    let candidate = match set.get(triangle_id) {
        Some(c) => c,
        None => return 0.0,
    };

    let total = if importance { usable_total(set) } else { None };
    match total {
        Some(total) => candidate.score / total,
        None => 1.0 / set.len() as Float,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::NeeCacheConfig;
    use crate::core::rng::LcgRng;

    fn set_with_scores(scores: &[Float]) -> CandidateSet {
        let config = NeeCacheConfig::default();
        let mut rng = LcgRng::new(0);
        let mut set = CandidateSet::new(scores.len().max(1));
        for (i, &s) in scores.iter().enumerate() {
            set.offer(TriangleId::new(0, i as u32), s, &config, &mut rng);
        }
        set
    }

    #[test]
    fn test_empty_set_yields_nothing() {
        let set = CandidateSet::new(4);
        assert!(sample(&set, true, 0.5).is_none());
        assert!(sample(&set, false, 0.5).is_none());
        assert_eq!(selection_probability(&set, TriangleId::new(0, 0), true), 0.0);
    }

    #[test]
    fn test_importance_sampling_frequencies() {
        let set = set_with_scores(&[2.0, 2.0, 4.0]);
        let mut rng = LcgRng::new(2024);
        let trials = 100000;
        let mut hits = [0usize; 3];
        for _ in 0..trials {
            let s = sample(&set, true, rng.next_f32()).expect("expected a sample");
            hits[s.triangle_id.primitive as usize] += 1;
            let expected = if s.triangle_id.primitive == 2 { 0.5 } else { 0.25 };
            assert!((s.selection_probability - expected).abs() < 1e-6);
        }
        let freq = hits[2] as f32 / trials as f32;
        assert!((freq - 0.5).abs() < 0.01, "frequency = {}", freq);
        assert!((hits[0] as f32 / trials as f32 - 0.25).abs() < 0.01);
    }

    #[test]
    fn test_uniform_sampling() {
        let set = set_with_scores(&[1.0, 100.0, 1.0, 1.0]);
        let mut hits = [0usize; 4];
        let mut rng = LcgRng::new(5);
        let trials = 40000;
        for _ in 0..trials {
            let s = sample(&set, false, rng.next_f32()).expect("expected a sample");
            assert_eq!(s.selection_probability, 0.25);
            hits[s.triangle_id.primitive as usize] += 1;
        }
        for h in hits.iter() {
            assert!((*h as f32 / trials as f32 - 0.25).abs() < 0.015);
        }
    }

    #[test]
    fn test_zero_sum_falls_back_to_uniform() {
        let set = set_with_scores(&[0.0, 0.0]);
        let s = sample(&set, true, 0.75).expect("expected a sample");
        assert_eq!(s.triangle_id, TriangleId::new(0, 1));
        assert_eq!(s.selection_probability, 0.5);
        assert_eq!(selection_probability(&set, TriangleId::new(0, 0), true), 0.5);
    }

    #[test]
    fn test_zero_score_candidates_are_never_picked() {
        let set = set_with_scores(&[0.0, 3.0, 0.0]);
        for i in 0..100 {
            let u = i as Float / 100.0;
            let s = sample(&set, true, u).expect("expected a sample");
            assert_eq!(s.triangle_id, TriangleId::new(0, 1));
            assert_eq!(s.selection_probability, 1.0);
        }
        let s = sample(&set, true, 0.99999994).expect("expected a sample");
        assert_eq!(s.triangle_id, TriangleId::new(0, 1));
    }

    #[test]
    fn test_probability_query_matches_sampler() {
        let set = set_with_scores(&[1.0, 3.0]);
        assert!((selection_probability(&set, TriangleId::new(0, 1), true) - 0.75).abs() < 1e-6);
        assert_eq!(selection_probability(&set, TriangleId::new(0, 1), false), 0.5);
        assert_eq!(selection_probability(&set, TriangleId::new(0, 9), true), 0.0);
    }
}
