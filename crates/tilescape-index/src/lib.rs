//! Spatial indexing for entity neighborhood queries.
//!
//! [`SpatialHashGrid`] is the raw uniform bucket hash keyed by entity ids;
//! [`SpatialIndexManager`] layers kind tagging, operation counters and
//! nearest/filtered queries on top of it.

use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};
use thiserror::Error;

mod grid;
mod manager;

pub use grid::{CellKey, GridStats, SpatialHashGrid};
pub use manager::{IndexStats, OperationCounters, QueryFilter, SpatialEntity, SpatialIndexManager};

/// Errors emitted by spatial index implementations.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum IndexError {
    /// Indicates configuration values that cannot be used (e.g., non-positive cell size).
    #[error("invalid configuration: {0}")]
    InvalidConfig(&'static str),
    /// A position with a NaN or infinite coordinate was offered to the index.
    #[error("position ({x}, {y}) is not finite")]
    NonFinitePosition { x: f32, y: f32 },
}

/// Common behaviour exposed by neighborhood indices.
pub trait NeighborhoodIndex<K> {
    /// Drop all contents and re-insert the given `(id, position)` pairs.
    fn rebuild(&mut self, entries: &[(K, (f32, f32))]) -> Result<(), IndexError>;

    /// Visit every id within `radius_sq` (squared distance) of `center`.
    fn neighbors_within(
        &self,
        center: (f32, f32),
        radius_sq: f32,
        visitor: &mut dyn FnMut(K, OrderedFloat<f32>),
    );
}

/// Tunables for [`SpatialIndexManager`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IndexConfig {
    /// Edge length of each grid cell used for bucketing entities.
    pub cell_size: f32,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self { cell_size: 64.0 }
    }
}

impl IndexConfig {
    pub fn validate(&self) -> Result<(), IndexError> {
        validate_cell_size(self.cell_size)
    }
}

pub(crate) fn validate_cell_size(cell_size: f32) -> Result<(), IndexError> {
    if !cell_size.is_finite() || cell_size <= 0.0 {
        return Err(IndexError::InvalidConfig(
            "cell_size must be finite and positive",
        ));
    }
    Ok(())
}
