// Copyright @yucwang 2026

use crate::core::config::MisHeuristic;
use crate::math::constants::{Float, Vector3f};

/// One direction drawn by a lighting strategy, evaluated by the shading stage.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StrategySample {
    /// Unweighted integrand, e.g. `f * Le * cos`.
    pub value: Vector3f,
    /// Solid-angle pdf of the strategy that drew the direction.
    pub pdf: Float,
    /// Solid-angle pdf the complementary strategy assigns to the same direction.
    pub other_pdf: Float,
}

impl StrategySample {
    pub fn estimate(&self) -> Vector3f {
        if self.pdf > 0.0 { self.value / self.pdf } else { Vector3f::zeros() }
    }
}

pub fn mis_weight(pdf: Float, other_pdf: Float, heuristic: MisHeuristic) -> Float {
    let (a, b) = match heuristic {
        MisHeuristic::Balance => (pdf, other_pdf.max(0.0)),
        MisHeuristic::Power => (pdf * pdf, other_pdf.max(0.0) * other_pdf.max(0.0)),
    };
    if a <= 0.0 || !(a + b).is_finite() {
        return 0.0;
    }
    a / (a + b)
}

/// Converts an area-measure pdf on a light to a solid-angle pdf at the receiver.
pub fn solid_angle_pdf(area_pdf: Float, distance: Float, cos_light: Float) -> Float {
    let cos_light = cos_light.abs();
    if cos_light <= 1e-6 || area_pdf <= 0.0 {
        return 0.0;
    }
    area_pdf * distance * distance / cos_light
}

/// Direct lighting estimate from the cache strategy and the BSDF strategy.
///
/// With `enable_mis` both samples are weighted by `heuristic`. Without it the
/// cache sample is used on its own, and the BSDF sample only counts when the
/// cache produced nothing. Anything non-finite collapses to zero.
pub fn combine(
    cache: Option<&StrategySample>,
    bsdf: Option<&StrategySample>,
    enable_mis: bool,
    heuristic: MisHeuristic,
) -> Vector3f {
    let result = if enable_mis {
        let mut sum = Vector3f::zeros();
        if let Some(s) = cache {
            sum += s.estimate() * mis_weight(s.pdf, s.other_pdf, heuristic);
        }
        if let Some(s) = bsdf {
            sum += s.estimate() * mis_weight(s.pdf, s.other_pdf, heuristic);
        }
        sum
    } else {
        match (cache, bsdf) {
            (Some(s), _) => s.estimate(),
            (None, Some(s)) => s.estimate(),
            (None, None) => Vector3f::zeros(),
        }
    };

    if result.iter().all(|v| v.is_finite()) {
        result
    } else {
        log::debug!("Dropping non-finite MIS contribution {:?}.", result);
        Vector3f::zeros()
    }
}
