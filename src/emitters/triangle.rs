// Copyright @yucwang 2023

use crate::math::aabb::AABB;
use crate::math::constants::{ EPSILON, Float, Vector2f, Vector3f };
use crate::math::spectrum::RGBSpectrum;
use crate::math::warp::square_to_triangle;

/// Emissive triangle with uniform radiance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TriangleLight {
    p0: Vector3f,
    p1: Vector3f,
    p2: Vector3f,
    radiance: RGBSpectrum,
}

impl TriangleLight {
    pub fn new(p0: Vector3f, p1: Vector3f, p2: Vector3f, radiance: RGBSpectrum) -> Self {
        TriangleLight { p0, p1, p2, radiance }
    }

    pub fn vertices(&self) -> (Vector3f, Vector3f, Vector3f) {
        (self.p0, self.p1, self.p2)
    }

    pub fn radiance(&self) -> RGBSpectrum {
        self.radiance
    }

    pub fn area(&self) -> Float {
        0.5 * ((self.p1 - self.p0).cross(&(self.p2 - self.p0))).norm()
    }

    pub fn centroid(&self) -> Vector3f {
        (self.p0 + self.p1 + self.p2) / 3.0
    }

    // Zero for degenerate triangles
    pub fn geometric_normal(&self) -> Vector3f {
        let n = (self.p1 - self.p0).cross(&(self.p2 - self.p0));
        let len = n.norm();
        if len > 0.0 { n / len } else { Vector3f::zeros() }
    }

    pub fn bounding_box(&self) -> AABB {
        let mut bound = AABB::new(self.p0, self.p1);
        bound.expand_by_point(&self.p2);

        bound
    }

    /// Uniform point on the triangle and its area-measure pdf.
    pub fn sample_position(&self, u: &Vector2f) -> (Vector3f, Float) {
        let b = square_to_triangle(u);
        let p = self.p0 * b.x + self.p1 * b.y + self.p2 * b.z;
        let area = self.area();
        let pdf = if area > 0.0 { 1.0 / area } else { 0.0 };
        (p, pdf)
    }

    /// Distance along `dir` (unit length) to the hit point, if any, within `(EPSILON, t_max)`.
    pub fn intersect(&self, origin: &Vector3f, dir: &Vector3f, t_max: Float) -> Option<Float> {
        let edge0 = self.p1 - self.p0;
        let edge1 = self.p2 - self.p0;
        let geo_normal = edge0.cross(&edge1);
        if geo_normal.norm() <= 0.0 {
            return None;
        }
        let geo_normal = geo_normal.normalize();

        let n_dot_dir = geo_normal.dot(dir);
        if n_dot_dir > -EPSILON && n_dot_dir < EPSILON {
            return None;
        }

        let plane_d = geo_normal.dot(&self.p0);
        let t = (plane_d - geo_normal.dot(origin)) / n_dot_dir;
        if t <= EPSILON || t >= t_max {
            return None;
        }

        let p = origin + t * dir;
        if self.is_in_triangle(&p) { Some(t) } else { None }
    }

    fn is_in_triangle(&self, p: &Vector3f) -> bool {
        let edge0 = self.p1 - self.p0;
        let edge1 = self.p2 - self.p0;
        let geo_normal = edge0.cross(&edge1);

        let n0 = (self.p1 - self.p0).cross(&(p - self.p0));
        let n1 = (self.p2 - self.p1).cross(&(p - self.p1));
        let n2 = (self.p0 - self.p2).cross(&(p - self.p2));

        (n0.dot(&geo_normal) >= 0.0) && (n1.dot(&geo_normal) >= 0.0) && (n2.dot(&geo_normal) >= 0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_triangle() -> TriangleLight {
        TriangleLight::new(
            Vector3f::new(-1.0, -1.0, 2.0),
            Vector3f::new(1.0, -1.0, 2.0),
            Vector3f::new(0.0, 1.0, 2.0),
            RGBSpectrum::new(5.0, 5.0, 5.0),
        )
    }

    #[test]
    fn test_triangle_geometry() {
        let tri = make_triangle();
        assert!((tri.area() - 2.0).abs() < 1e-5);
        assert!((tri.geometric_normal() - Vector3f::new(0.0, 0.0, 1.0)).norm() < 1e-5);
        let c = tri.centroid();
        assert!((c.z - 2.0).abs() < 1e-6);
        assert!(tri.bounding_box().contains(&c));
    }

    #[test]
    fn test_triangle_intersect() {
        let tri = make_triangle();
        let origin = Vector3f::zeros();
        let t = tri.intersect(&origin, &Vector3f::new(0.0, 0.0, 1.0), Float::MAX);
        assert!((t.expect("expected a hit") - 2.0).abs() < 1e-5);

        assert!(tri.intersect(&origin, &Vector3f::new(0.0, 0.0, -1.0), Float::MAX).is_none());
        assert!(tri.intersect(&origin, &Vector3f::new(0.0, 0.0, 1.0), 1.0).is_none());
        let away = Vector3f::new(1.0, 1.0, 1.0).normalize();
        assert!(tri.intersect(&origin, &away, Float::MAX).is_none());
    }

    #[test]
    fn test_sample_position_lies_on_triangle() {
        let tri = make_triangle();
        let (p, pdf) = tri.sample_position(&Vector2f::new(0.25, 0.75));
        assert!((p.z - 2.0).abs() < 1e-5);
        assert!((pdf - 0.5).abs() < 1e-5);
        let dir = (p - Vector3f::zeros()).normalize();
        assert!(tri.intersect(&Vector3f::zeros(), &dir, Float::MAX).is_some());
    }
}
