// Copyright @yucwang 2026

use std::collections::HashMap;
use std::fmt;

use crate::emitters::triangle::TriangleLight;

/// Stable reference to one emissive triangle: the surface (mesh instance) it
/// belongs to and its primitive index within that surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TriangleId {
    pub surface: u32,
    pub primitive: u32,
}

impl TriangleId {
    pub fn new(surface: u32, primitive: u32) -> Self {
        Self { surface, primitive }
    }
}

impl fmt::Display for TriangleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.surface, self.primitive)
    }
}

/// Scene-side lookup of emissive triangles by id.
pub trait EmitterTable: Sync {
    fn triangle(&self, id: TriangleId) -> Option<&TriangleLight>;
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Default)]
pub struct EmitterList {
    triangles: Vec<(TriangleId, TriangleLight)>,
    index: HashMap<TriangleId, usize>,
}

impl EmitterList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces the triangle stored under `id`.
    pub fn insert(&mut self, id: TriangleId, triangle: TriangleLight) {
        match self.index.get(&id) {
            Some(&slot) => self.triangles[slot].1 = triangle,
            None => {
                self.index.insert(id, self.triangles.len());
                self.triangles.push((id, triangle));
            }
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &(TriangleId, TriangleLight)> {
        self.triangles.iter()
    }
}

impl EmitterTable for EmitterList {
    fn triangle(&self, id: TriangleId) -> Option<&TriangleLight> {
        self.index.get(&id).map(|&slot| &self.triangles[slot].1)
    }

    fn len(&self) -> usize {
        self.triangles.len()
    }
}
