// Copyright @yucwang 2026

use rayon::prelude::*;

use crate::cache::candidate::Candidate;
use crate::cache::cell::{CellCoord, CellGrid, CellIndex};
use crate::cache::storage::NeeCache;
use crate::math::constants::Float;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CellStats {
    pub index: CellIndex,
    pub coord: CellCoord,
    pub candidate_count: usize,
    pub total_score: Float,
    pub max_score: Float,
}

/// Point-in-time view over the occupied cells of a cache.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CacheSnapshot {
    pub occupied_cells: usize,
    pub total_candidates: usize,
    /// Occupied cells only, in index order.
    pub cells: Vec<CellStats>,
}

impl CacheSnapshot {
    pub fn mean_candidates_per_occupied_cell(&self) -> Float {
        if self.occupied_cells == 0 {
            0.0
        } else {
            self.total_candidates as Float / self.occupied_cells as Float
        }
    }

    pub fn cell(&self, index: CellIndex) -> Option<&CellStats> {
        self.cells
            .binary_search_by_key(&index, |s| s.index)
            .ok()
            .map(|i| &self.cells[i])
    }
}

/// Collects per-cell statistics. Each cell is read under its own lock, so the
/// snapshot is only consistent per cell when taken during a frame.
pub fn snapshot(cache: &NeeCache, grid: &CellGrid) -> CacheSnapshot {
    let cells: Vec<CellStats> = cache
        .cells()
        .par_iter()
        .enumerate()
        .filter_map(|(i, slot)| {
            let set = slot.lock();
            if set.is_empty() {
                return None;
            }
            let index = CellIndex(i);
            Some(CellStats {
                index,
                coord: grid.index_to_coord(index),
                candidate_count: set.len(),
                total_score: set.total_score(),
                max_score: set.iter().map(|c| c.score).fold(0.0, Float::max),
            })
        })
        .collect();

    CacheSnapshot {
        occupied_cells: cells.len(),
        total_candidates: cells.iter().map(|c| c.candidate_count).sum(),
        cells,
    }
}

/// Copy of the candidates of one cell, empty for indices outside the cache.
pub fn cell_candidates(cache: &NeeCache, cell: CellIndex) -> Vec<Candidate> {
    cache.with_cell(cell, |set| set.as_slice().to_vec()).unwrap_or_default()
}

/// Row-major `resolution x resolution` image of the cells at depth `z`, with
/// `(candidate count, total score, max score)` per pixel.
pub fn z_slice(cache: &NeeCache, grid: &CellGrid, z: usize) -> Vec<(Float, Float, Float)> {
    let resolution = grid.resolution();
    let z = z.min(resolution - 1);
    let mut pixels = Vec::with_capacity(resolution * resolution);
    for y in 0..resolution {
        for x in 0..resolution {
            let cell = grid.coord_to_index(CellCoord { x, y, z });
            let pixel = cache
                .with_cell(cell, |set| {
                    let max = set.iter().map(|c| c.score).fold(0.0, Float::max);
                    (set.len() as Float, set.total_score(), max)
                })
                .unwrap_or((0.0, 0.0, 0.0));
            pixels.push(pixel);
        }
    }
    pixels
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::NeeCacheConfig;
    use crate::core::emitter::TriangleId;
    use crate::core::rng::LcgRng;
    use crate::math::constants::Vector3f;

    fn populated() -> (NeeCache, CellGrid) {
        let config = NeeCacheConfig::default();
        let cache = NeeCache::new(4, 4);
        let grid = CellGrid::new(Vector3f::zeros(), 4.0, 4);
        let mut rng = LcgRng::new(3);
        let a = grid.coord_to_index(CellCoord { x: 1, y: 2, z: 3 });
        let b = grid.coord_to_index(CellCoord { x: 0, y: 0, z: 3 });
        cache.offer(a, TriangleId::new(0, 0), 1.0, &config, &mut rng);
        cache.offer(a, TriangleId::new(0, 1), 3.0, &config, &mut rng);
        cache.offer(b, TriangleId::new(2, 5), 0.5, &config, &mut rng);
        (cache, grid)
    }

    #[test]
    fn test_snapshot_counts() {
        let (cache, grid) = populated();
        let snap = snapshot(&cache, &grid);
        assert_eq!(snap.occupied_cells, 2);
        assert_eq!(snap.total_candidates, 3);
        assert!((snap.mean_candidates_per_occupied_cell() - 1.5).abs() < 1e-6);

        let a = grid.coord_to_index(CellCoord { x: 1, y: 2, z: 3 });
        let stats = snap.cell(a).expect("cell is occupied");
        assert_eq!(stats.coord, CellCoord { x: 1, y: 2, z: 3 });
        assert_eq!(stats.candidate_count, 2);
        assert!((stats.total_score - 4.0).abs() < 1e-6);
        assert_eq!(stats.max_score, 3.0);
        assert!(snap.cell(CellIndex(1)).is_none());
    }

    #[test]
    fn test_empty_snapshot() {
        let cache = NeeCache::new(2, 2);
        let grid = CellGrid::new(Vector3f::zeros(), 1.0, 2);
        let snap = snapshot(&cache, &grid);
        assert_eq!(snap, CacheSnapshot::default());
        assert_eq!(snap.mean_candidates_per_occupied_cell(), 0.0);
    }

    #[test]
    fn test_cell_candidates_copy() {
        let (cache, grid) = populated();
        let b = grid.coord_to_index(CellCoord { x: 0, y: 0, z: 3 });
        let candidates = cell_candidates(&cache, b);
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].triangle_id, TriangleId::new(2, 5));
        assert!(cell_candidates(&cache, CellIndex(1000)).is_empty());
    }

    #[test]
    fn test_z_slice() {
        let (cache, grid) = populated();
        let slice = z_slice(&cache, &grid, 3);
        assert_eq!(slice.len(), 16);
        assert_eq!(slice[2 * 4 + 1], (2.0, 4.0, 3.0));
        assert_eq!(slice[0], (1.0, 0.5, 0.5));
        assert_eq!(slice[5], (0.0, 0.0, 0.0));
        // out of range depths clamp to the last slice
        assert_eq!(z_slice(&cache, &grid, 99), slice);
        assert!(z_slice(&cache, &grid, 0).iter().all(|p| p.0 == 0.0));
    }
}
