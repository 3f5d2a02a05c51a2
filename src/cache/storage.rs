// Copyright @yucwang 2026

use parking_lot::Mutex;
use rayon::prelude::*;

use crate::cache::aging::{tick, TickStats};
use crate::cache::candidate::CandidateSet;
use crate::cache::cell::CellIndex;
use crate::cache::sampler::{self, SampleResult};
use crate::core::config::NeeCacheConfig;
use crate::core::emitter::TriangleId;
use crate::core::rng::LcgRng;
use crate::math::constants::Float;

/// Preallocated cell slots, one candidate set each.
///
/// Every slot sits behind its own lock, held only for one offer, one sample or
/// one aging step, so shading points in different cells never contend. Indices
/// outside the arena are treated as empty cells.
pub struct NeeCache {
    cells: Vec<Mutex<CandidateSet>>,
    resolution: usize,
    capacity: usize,
}

impl NeeCache {
    pub fn new(resolution: usize, capacity: usize) -> Self {
        let cell_count = resolution * resolution * resolution;
        let cells = (0..cell_count).map(|_| Mutex::new(CandidateSet::new(capacity))).collect();
        Self { cells, resolution, capacity }
    }

    pub fn from_config(config: &NeeCacheConfig) -> Self {
        Self::new(config.resolution, config.candidate_capacity)
    }

    pub fn resolution(&self) -> usize {
        self.resolution
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    /// Changes the per-cell capacity in place. Shrinking keeps the highest
    /// scoring candidates of every cell.
    pub fn set_capacity(&mut self, capacity: usize) {
        self.capacity = capacity;
        self.cells.par_iter_mut().for_each(|slot| slot.get_mut().set_capacity(capacity));
    }

    pub fn offer(
        &self,
        cell: CellIndex,
        triangle_id: TriangleId,
        score: Float,
        config: &NeeCacheConfig,
        rng: &mut LcgRng,
    ) -> bool {
        match self.cells.get(cell.0) {
            Some(slot) => slot.lock().offer(triangle_id, score, config, rng),
            None => false,
        }
    }

    pub fn sample(&self, cell: CellIndex, importance: bool, u: Float) -> Option<SampleResult> {
        self.cells.get(cell.0).and_then(|slot| sampler::sample(&slot.lock(), importance, u))
    }

    pub fn selection_probability(&self, cell: CellIndex, triangle_id: TriangleId, importance: bool) -> Float {
        self.cells
            .get(cell.0)
            .map_or(0.0, |slot| sampler::selection_probability(&slot.lock(), triangle_id, importance))
    }

    /// Runs `f` on a cell's candidates while holding its lock.
    pub fn with_cell<R>(&self, cell: CellIndex, f: impl FnOnce(&CandidateSet) -> R) -> Option<R> {
        self.cells.get(cell.0).map(|slot| f(&*slot.lock()))
    }

    /// Ages every cell once; must run after the frame's offers and before its samples.
    pub fn tick_all(&self, config: &NeeCacheConfig) -> TickStats {
        self.cells
            .par_iter()
            .map(|slot| {
                let mut set = slot.lock();
                if set.is_empty() {
                    TickStats::default()
                } else {
                    tick(&mut set, config)
                }
            })
            .reduce(TickStats::default, |a, b| a + b)
    }

    pub fn clear(&self) {
        self.cells.par_iter().for_each(|slot| slot.lock().clear());
    }

    pub(crate) fn cells(&self) -> &[Mutex<CandidateSet>] {
        &self.cells
    }
}
