// Copyright @yucwang 2026

use smallvec::SmallVec;

use crate::cache::score::sanitize_score;
use crate::core::config::{NeeCacheConfig, ReplacementPolicy};
use crate::core::emitter::TriangleId;
use crate::core::rng::LcgRng;
use crate::math::constants::Float;

// Slots stored inline before spilling to the heap; covers the default capacity.
pub const INLINE_CANDIDATES: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Candidate {
    pub triangle_id: TriangleId,
    pub score: Float,
    /// Frames since the candidate was last observed.
    pub age: u32,
    pub(crate) reinforced: bool,
}

impl Candidate {
    fn new(triangle_id: TriangleId, score: Float) -> Self {
        Self { triangle_id, score, age: 0, reinforced: true }
    }

    pub fn reinforced(&self) -> bool {
        self.reinforced
    }
}

/// Bounded set of light candidates owned by one cell.
///
/// Holds at most `capacity` entries, each with a distinct triangle id and a
/// non-negative score.
#[derive(Debug, Clone)]
pub struct CandidateSet {
    candidates: SmallVec<[Candidate; INLINE_CANDIDATES]>,
    capacity: usize,
}

impl CandidateSet {
    pub fn new(capacity: usize) -> Self {
        Self { candidates: SmallVec::new(), capacity: capacity.max(1) }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.candidates.len() >= self.capacity
    }

    pub fn iter(&self) -> impl Iterator<Item = &Candidate> {
        self.candidates.iter()
    }

    pub fn as_slice(&self) -> &[Candidate] {
        &self.candidates
    }

    pub fn get(&self, triangle_id: TriangleId) -> Option<&Candidate> {
        self.candidates.iter().find(|c| c.triangle_id == triangle_id)
    }

    pub fn total_score(&self) -> Float {
        self.candidates.iter().map(|c| c.score).sum()
    }

    pub fn clear(&mut self) {
        self.candidates.clear();
    }

    /// Proposes `triangle_id` with `proposed_score`. Returns whether the triangle
    /// is a member of the set afterwards.
    pub fn offer(
        &mut self,
        triangle_id: TriangleId,
        proposed_score: Float,
        config: &NeeCacheConfig,
        rng: &mut LcgRng,
    ) -> bool {
        let score = sanitize_score(proposed_score);

        if let Some(existing) = self.candidates.iter_mut().find(|c| c.triangle_id == triangle_id) {
            let blend = config.score_blend_factor;
            existing.score = sanitize_score(existing.score + blend * (score - existing.score));
            existing.age = 0;
            existing.reinforced = true;
            return true;
        }

        if !self.is_full() {
            self.candidates.push(Candidate::new(triangle_id, score));
            return true;
        }

        let victim = match config.replacement_policy() {
            ReplacementPolicy::Greedy => {
                let slot = self.lowest_score_slot();
                if score <= self.candidates[slot].score {
                    return false;
                }
                slot
            }
            ReplacementPolicy::Random => rng.next_index(self.candidates.len()),
        };

        log::trace!(
            "Evicting {} (score {}) for {} (score {}).",
            self.candidates[victim].triangle_id,
            self.candidates[victim].score,
            triangle_id,
            score
        );
        self.candidates[victim] = Candidate::new(triangle_id, score);
        true
    }

    fn lowest_score_slot(&self) -> usize {
        let mut slot = 0;
        for (idx, candidate) in self.candidates.iter().enumerate() {
            if candidate.score < self.candidates[slot].score {
                slot = idx;
            }
        }
        slot
    }

    pub(crate) fn candidates_mut(&mut self) -> &mut SmallVec<[Candidate; INLINE_CANDIDATES]> {
        &mut self.candidates
    }

    /// Resizes the set, dropping the lowest scoring candidates if it shrinks.
    pub fn set_capacity(&mut self, capacity: usize) {
        self.capacity = capacity.max(1);
        while self.candidates.len() > self.capacity {
            let slot = self.lowest_score_slot();
            self.candidates.swap_remove(slot);
        }
    }
}
