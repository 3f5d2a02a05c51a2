// Copyright @yucwang 2026

use crate::core::config::NeeCacheConfig;
use crate::core::emitter::TriangleId;
use crate::emitters::triangle::TriangleLight;
use crate::math::constants::{Float, Vector3f};
use crate::math::spectrum::RGBSpectrum;

pub const MAX_SCORE: Float = 1.0e20;

// Scores are ranked and summed, so they must stay finite and non-negative.
pub fn sanitize_score(score: Float) -> Float {
    if score.is_nan() || score <= 0.0 {
        0.0
    } else {
        score.min(MAX_SCORE)
    }
}

// Relative bonus per e-fold of the emissive texture footprint.
const FOOTPRINT_BONUS: Float = 0.1;
// Cells are larger than a shading point, so grazing angles still count a little.
const MIN_COSINE: Float = 0.1;

/// An emissive triangle seen from a cell.
pub struct HitContext<'a> {
    pub triangle_id: TriangleId,
    pub triangle: &'a TriangleLight,
    /// Radiance measured by the shading stage; falls back to the triangle's own.
    pub radiance_estimate: Option<RGBSpectrum>,
    pub cell_center: Vector3f,
    pub cell_size: Float,
}

/// Ranks triangles by an approximation of their direct-lighting contribution to a cell.
pub struct ScoreEstimator {
    footprint_bonus: Float,
}

impl ScoreEstimator {
    pub fn new(config: &NeeCacheConfig) -> Self {
        let footprint = config.emissive_texture_sample_footprint_size.max(0.0);
        Self { footprint_bonus: 1.0 + FOOTPRINT_BONUS * footprint.ln_1p() }
    }

    pub fn estimate(&self, hit: &HitContext) -> Float {
        let radiance = hit.radiance_estimate.unwrap_or_else(|| hit.triangle.radiance());
        let luminance = radiance.luminance().max(0.0);

        let score = luminance * self.footprint_bonus * geometric_term(hit);
        let score = sanitize_score(score);
        if score == 0.0 {
            log::trace!("Triangle {} scored zero for cell at {:?}.", hit.triangle_id, hit.cell_center);
        }
        score
    }
}

// Projected area of the triangle over the squared distance to the cell center,
// with the distance floored at half a cell.
fn geometric_term(hit: &HitContext) -> Float {
    let to_cell = hit.cell_center - hit.triangle.centroid();
    let min_distance = 0.5 * hit.cell_size;
    let dist2 = to_cell.norm_squared().max(min_distance * min_distance);

    let normal = hit.triangle.geometric_normal();
    let dist = to_cell.norm();
    let cosine = if dist > 0.0 { (normal.dot(&to_cell) / dist).abs() } else { 1.0 };

    hit.triangle.area() * cosine.max(MIN_COSINE) / dist2
}
