// Copyright @yucwang 2026

use rayon::prelude::*;

use crate::cache::cell::{CellGrid, CellIndex};
use crate::cache::sampler::SampleResult;
use crate::cache::score::{HitContext, ScoreEstimator};
use crate::cache::storage::NeeCache;
use crate::core::config::NeeCacheConfig;
use crate::core::emitter::{EmitterTable, TriangleId};
use crate::core::rng::LcgRng;
use crate::math::constants::{Float, Vector3f};
use crate::math::spectrum::RGBSpectrum;

// Keeps the sampling random stream of a point apart from its update stream.
const SAMPLE_STREAM: u64 = 1 << 63;

/// Emissive triangle hit by the path segment that produced a shading point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Observation {
    pub triangle_id: TriangleId,
    pub radiance_estimate: Option<RGBSpectrum>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShadingPoint {
    pub position: Vector3f,
    /// 0 for primary hits.
    pub bounce: u32,
    pub observation: Option<Observation>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameContext {
    pub frame_index: u64,
    /// Center of the cached volume, usually the camera position.
    pub domain_center: Vector3f,
}

impl Default for FrameContext {
    fn default() -> Self {
        Self { frame_index: 0, domain_center: Vector3f::zeros() }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointResult {
    pub cell: Option<CellIndex>,
    /// Whether the cache strategy ran for this point. When false, NEE comes
    /// entirely from the complementary strategy.
    pub cache_active: bool,
    pub sample: Option<SampleResult>,
}

impl PointResult {
    fn disabled() -> Self {
        Self { cell: None, cache_active: false, sample: None }
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct FrameStats {
    pub points: usize,
    pub offers: usize,
    pub admitted: usize,
    pub rejected: usize,
    pub unknown_triangles: usize,
    pub aged: usize,
    pub culled: usize,
    pub sampled: usize,
    pub empty: usize,
    pub gated: usize,
    /// The options failed validation and the frame was skipped.
    pub invalid_config: bool,
}

pub struct FrameOutput {
    pub results: Vec<PointResult>,
    pub stats: FrameStats,
}

#[derive(Clone, Copy, PartialEq)]
enum OfferOutcome {
    NoObservation,
    Admitted,
    Rejected,
    UnknownTriangle,
}

/// Runs the per-frame update and sampling pass over a batch of shading points.
///
/// A frame goes through three phases, each parallel over its items:
/// lookup and offer per point, aging per cell, then sampling per point.
pub struct CacheDriver {
    cache: NeeCache,
    frames: u64,
}

impl CacheDriver {
    pub fn new(config: &NeeCacheConfig) -> Self {
        log::info!(
            "Allocating NEE cache: {}^3 cells, {} candidates per cell.",
            config.resolution,
            config.candidate_capacity
        );
        Self { cache: NeeCache::from_config(config), frames: 0 }
    }

    pub fn cache(&self) -> &NeeCache {
        &self.cache
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Forgets every candidate, e.g. after a scene reload or device reset.
    pub fn reset(&mut self) {
        log::info!("Resetting NEE cache after {} frames.", self.frames);
        self.cache.clear();
        self.frames = 0;
    }

    pub fn grid(config: &NeeCacheConfig, frame: &FrameContext) -> CellGrid {
        CellGrid::from_config(config, frame.domain_center)
    }

    pub fn run_frame(
        &mut self,
        config: &NeeCacheConfig,
        frame: &FrameContext,
        points: &[ShadingPoint],
        emitters: &dyn EmitterTable,
    ) -> FrameOutput {
        let mut stats = FrameStats { points: points.len(), ..FrameStats::default() };
        if !config.enable {
            log::trace!("NEE cache disabled, skipping frame {}.", frame.frame_index);
            return FrameOutput { results: vec![PointResult::disabled(); points.len()], stats };
        }

        if let Err(e) = config.validate() {
            log::warn!("Skipping NEE cache frame {}: {}.", frame.frame_index, e);
            stats.invalid_config = true;
            return FrameOutput { results: vec![PointResult::disabled(); points.len()], stats };
        }

        if self.cache.resolution() != config.resolution {
            log::info!(
                "NEE cache resolution changed to {}^3 cells, reallocating.",
                config.resolution
            );
            self.cache = NeeCache::from_config(config);
        } else if self.cache.capacity() != config.candidate_capacity {
            log::info!(
                "NEE cache capacity changed from {} to {} candidates per cell.",
                self.cache.capacity(),
                config.candidate_capacity
            );
            self.cache.set_capacity(config.candidate_capacity);
        }

        let grid = Self::grid(config, frame);
        let estimator = ScoreEstimator::new(config);
        let cache = &self.cache;

        let updates: Vec<(CellIndex, OfferOutcome)> = points
            .par_iter()
            .enumerate()
            .map(|(i, point)| {
                let cell = grid.resolve_cell(&point.position, config.enable_jittering, frame.frame_index);
                let outcome = match point.observation {
                    None => OfferOutcome::NoObservation,
                    Some(observation) => match emitters.triangle(observation.triangle_id) {
                        None => OfferOutcome::UnknownTriangle,
                        Some(triangle) => {
                            let score = estimator.estimate(&HitContext {
                                triangle_id: observation.triangle_id,
                                triangle,
                                radiance_estimate: observation.radiance_estimate,
                                cell_center: grid.cell_center(cell),
                                cell_size: grid.cell_size(),
                            });
                            let mut rng = LcgRng::for_point(frame.frame_index, i as u64);
                            if cache.offer(cell, observation.triangle_id, score, config, &mut rng) {
                                OfferOutcome::Admitted
                            } else {
                                OfferOutcome::Rejected
                            }
                        }
                    },
                };
                (cell, outcome)
            })
            .collect();

        let tick_stats = cache.tick_all(config);
        stats.aged = tick_stats.aged;
        stats.culled = tick_stats.culled;

        let results: Vec<PointResult> = points
            .par_iter()
            .zip(updates.par_iter())
            .enumerate()
            .map(|(i, (point, &(cell, _)))| {
                if !config.sampling_enabled_for_bounce(point.bounce) {
                    return PointResult { cell: Some(cell), cache_active: false, sample: None };
                }
                let mut rng = LcgRng::for_point(frame.frame_index, i as u64 ^ SAMPLE_STREAM);
                let sample = cache.sample(cell, config.enable_importance_sampling, rng.next_f32());
                PointResult { cell: Some(cell), cache_active: true, sample }
            })
            .collect();

        for (_, outcome) in updates.iter() {
            match outcome {
                OfferOutcome::NoObservation => {}
                OfferOutcome::Admitted => {
                    stats.offers += 1;
                    stats.admitted += 1;
                }
                OfferOutcome::Rejected => {
                    stats.offers += 1;
                    stats.rejected += 1;
                }
                OfferOutcome::UnknownTriangle => stats.unknown_triangles += 1,
            }
        }
        for result in results.iter() {
            match (result.cache_active, result.sample.is_some()) {
                (false, _) => stats.gated += 1,
                (true, true) => stats.sampled += 1,
                (true, false) => stats.empty += 1,
            }
        }
        if stats.unknown_triangles > 0 {
            log::warn!(
                "Frame {}: {} observations referenced triangles missing from the emitter table.",
                frame.frame_index,
                stats.unknown_triangles
            );
        }
        log::debug!("NEE cache frame {}: {:?}", frame.frame_index, stats);

        self.frames += 1;
        FrameOutput { results, stats }
    }

    /// Probability that the cache strategy of `point` would have picked
    /// `triangle_id`, for weighting a BSDF sample that hit it.
    pub fn selection_probability(&self, config: &NeeCacheConfig, point: &PointResult, triangle_id: TriangleId) -> Float {
        match (point.cache_active, point.cell) {
            (true, Some(cell)) => {
                self.cache.selection_probability(cell, triangle_id, config.enable_importance_sampling)
            }
            _ => 0.0,
        }
    }
}
