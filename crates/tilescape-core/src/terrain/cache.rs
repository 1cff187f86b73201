use std::sync::Arc;

use crate::{Tile, TilePos};

/// Tiles inside the camera's view, captured under one converter state.
#[derive(Debug, Clone, PartialEq)]
pub struct TerrainSnapshot {
    update_id: u64,
    min: TilePos,
    max: TilePos,
    tiles: Vec<(TilePos, Tile)>,
}

impl TerrainSnapshot {
    pub(crate) fn new(update_id: u64, min: TilePos, max: TilePos, tiles: Vec<(TilePos, Tile)>) -> Self {
        Self {
            update_id,
            min,
            max,
            tiles,
        }
    }

    /// Converter `update_id` the snapshot was taken under.
    #[must_use]
    pub const fn update_id(&self) -> u64 {
        self.update_id
    }

    /// Inclusive relative tile bounds that were scanned.
    #[must_use]
    pub const fn bounds(&self) -> (TilePos, TilePos) {
        (self.min, self.max)
    }

    /// Visible tiles with their relative coordinates, row-major.
    #[must_use]
    pub fn tiles(&self) -> &[(TilePos, Tile)] {
        &self.tiles
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }
}

/// Render cache state. `Empty` always means recompute.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum TerrainCache {
    #[default]
    Empty,
    Valid(Arc<TerrainSnapshot>),
}

impl TerrainCache {
    /// The cached snapshot, if it was taken under `update_id`.
    #[must_use]
    pub fn fresh(&self, update_id: u64) -> Option<&Arc<TerrainSnapshot>> {
        match self {
            TerrainCache::Valid(snapshot) if snapshot.update_id == update_id => Some(snapshot),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_valid(&self) -> bool {
        matches!(self, TerrainCache::Valid(_))
    }

    pub fn invalidate(&mut self) {
        *self = TerrainCache::Empty;
    }
}
