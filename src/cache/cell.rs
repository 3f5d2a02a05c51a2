// Copyright @yucwang 2026

use crate::core::config::NeeCacheConfig;
use crate::core::rng::LcgRng;
use crate::math::aabb::AABB;
use crate::math::constants::{Float, Vector3f};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CellIndex(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CellCoord {
    pub x: usize,
    pub y: usize,
    pub z: usize,
}

/// Regular grid of `resolution^3` cells covering `center ± range` on every axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CellGrid {
    center: Vector3f,
    range: Float,
    resolution: usize,
}

impl CellGrid {
    pub fn new(center: Vector3f, range: Float, resolution: usize) -> Self {
        Self { center, range, resolution: resolution.max(1) }
    }

    pub fn from_config(config: &NeeCacheConfig, center: Vector3f) -> Self {
        Self::new(center, config.range, config.resolution)
    }

    pub fn resolution(&self) -> usize {
        self.resolution
    }

    pub fn cell_count(&self) -> usize {
        self.resolution * self.resolution * self.resolution
    }

    pub fn cell_size(&self) -> Float {
        2.0 * self.range / self.resolution as Float
    }

    pub fn bounds(&self) -> AABB {
        AABB::from_center(self.center, self.range)
    }

    /// Cell containing `position`. Positions outside the domain land in the
    /// nearest boundary cell.
    ///
    /// With `jitter`, each axis is shifted by a uniform offset in `[-0.5, 0.5)`
    /// cells before quantization, so lookups near a cell border spread over both
    /// neighbours in proportion to their distance. The offset only depends on the
    /// position and `frame_index`.
    pub fn resolve_cell(&self, position: &Vector3f, jitter: bool, frame_index: u64) -> CellIndex {
        let origin = self.center - Vector3f::new(self.range, self.range, self.range);
        let scale = self.resolution as Float / (2.0 * self.range);
        let mut rng = if jitter { Some(LcgRng::for_position(position, frame_index)) } else { None };

        let mut cell = [0usize; 3];
        for idx in 0..3 {
            let mut c = (position[idx] - origin[idx]) * scale;
            if let Some(rng) = rng.as_mut() {
                c += rng.next_f32() - 0.5;
            }
            cell[idx] = self.clamp_axis(c);
        }

        self.coord_to_index(CellCoord { x: cell[0], y: cell[1], z: cell[2] })
    }

    fn clamp_axis(&self, c: Float) -> usize {
        let max = (self.resolution - 1) as i64;
        // NaN casts to 0, infinities saturate
        (c.floor() as i64).clamp(0, max) as usize
    }

    pub fn coord_to_index(&self, coord: CellCoord) -> CellIndex {
        let r = self.resolution;
        CellIndex(coord.z * r * r + coord.y * r + coord.x)
    }

    pub fn index_to_coord(&self, index: CellIndex) -> CellCoord {
        let r = self.resolution;
        let mut offset = index.0;
        let z = offset / (r * r);
        offset -= z * r * r;
        let y = offset / r;
        offset -= y * r;
        CellCoord { x: offset, y, z }
    }

    pub fn cell_center(&self, index: CellIndex) -> Vector3f {
        let coord = self.index_to_coord(index);
        let size = self.cell_size();
        let origin = self.center - Vector3f::new(self.range, self.range, self.range);
        origin + Vector3f::new(
            (coord.x as Float + 0.5) * size,
            (coord.y as Float + 0.5) * size,
            (coord.z as Float + 0.5) * size,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid() -> CellGrid {
        CellGrid::new(Vector3f::zeros(), 10.0, 10)
    }

    #[test]
    fn test_resolve_cell_quantizes() {
        let grid = grid();
        assert_eq!(grid.cell_size(), 2.0);
        let idx = grid.resolve_cell(&Vector3f::new(-9.5, 0.5, 9.5), false, 0);
        assert_eq!(grid.index_to_coord(idx), CellCoord { x: 0, y: 5, z: 9 });

        let center = grid.cell_center(idx);
        assert!((center - Vector3f::new(-9.0, 1.0, 9.0)).norm() < 1e-5);
        assert_eq!(grid.resolve_cell(&center, false, 0), idx);
    }

    #[test]
    fn test_index_roundtrip_covers_grid() {
        let grid = grid();
        for i in 0..grid.cell_count() {
            let coord = grid.index_to_coord(CellIndex(i));
            assert_eq!(grid.coord_to_index(coord), CellIndex(i));
        }
    }

    #[test]
    fn test_far_positions_clamp_to_boundary_cell() {
        let grid = grid();
        let boundary = grid.resolve_cell(&Vector3f::new(10.0, -10.0, 3.0), false, 0);
        let far = grid.resolve_cell(&Vector3f::new(1.0e9, -1.0e9, 3.0), false, 0);
        assert_eq!(boundary, far);
        assert_eq!(grid.index_to_coord(far), CellCoord { x: 9, y: 0, z: 6 });

        let inf = grid.resolve_cell(&Vector3f::new(Float::INFINITY, Float::NEG_INFINITY, Float::NAN), false, 0);
        assert!(inf.0 < grid.cell_count());
        for frame in 0..32 {
            let jittered = grid.resolve_cell(&Vector3f::new(1.0e9, -1.0e9, 3.0), true, frame);
            assert!(jittered.0 < grid.cell_count());
        }
    }

    #[test]
    fn test_domain_follows_center() {
        let moved = CellGrid::new(Vector3f::new(100.0, 0.0, 0.0), 10.0, 10);
        let idx = moved.resolve_cell(&Vector3f::new(100.5, 0.5, 0.5), false, 0);
        assert_eq!(moved.index_to_coord(idx), CellCoord { x: 5, y: 5, z: 5 });
        assert!(moved.bounds().contains(&Vector3f::new(109.0, 0.0, 0.0)));
    }

    #[test]
    fn test_jitter_stays_within_neighbouring_cells() {
        let grid = grid();
        // x sits a quarter cell past a border, y and z at cell centers
        let p = Vector3f::new(0.5, 1.0, 1.0);
        let mut low = 0;
        let mut high = 0;
        for frame in 0..4000 {
            let coord = grid.index_to_coord(grid.resolve_cell(&p, true, frame));
            assert_eq!((coord.y, coord.z), (5, 5));
            match coord.x {
                4 => low += 1,
                5 => high += 1,
                other => panic!("jitter moved more than one cell: {}", other),
            }
        }
        // fraction 0.25 past the border: about a quarter of lookups fall back
        let ratio = low as f32 / (low + high) as f32;
        assert!((ratio - 0.25).abs() < 0.05, "ratio = {}", ratio);
    }

    #[test]
    fn test_jitter_is_reproducible_within_a_frame() {
        let grid = grid();
        let p = Vector3f::new(0.9, -3.1, 4.0);
        assert_eq!(grid.resolve_cell(&p, true, 17), grid.resolve_cell(&p, true, 17));
    }
}
