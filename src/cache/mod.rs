// Copyright @yucwang 2026

pub mod aging;
pub mod candidate;
pub mod cell;
pub mod diagnostics;
pub mod driver;
pub mod mis;
pub mod sampler;
pub mod score;
pub mod storage;

pub use self::cell::{CellGrid, CellIndex};
pub use self::driver::{CacheDriver, FrameContext, FrameOutput, FrameStats, Observation, PointResult, ShadingPoint};
pub use self::storage::NeeCache;
