//! Chunked tile terrain for Tilescape worlds.
//!
//! A [`TerrainGrid`] owns a dense [`Grid`] of [`Chunk`]s, each of which owns a
//! square [`Grid`] of [`Tile`]s. Tiles are addressed either by array
//! coordinates (origin at the first tile of the first chunk) or by relative
//! coordinates centered on the middle chunk. The grid also owns the camera
//! transform used to map tiles onto a canvas and caches the visible window.

use thiserror::Error;
use tilescape_render::ViewError;

mod chunk;
mod config;
mod grid;
mod material;
mod terrain;

pub use chunk::Chunk;
pub use config::{GenerationMode, NoiseSettings, TerrainConfig};
pub use grid::Grid;
pub use material::{Material, MaterialPalette, NoiseBand, Tile};
pub use terrain::{SparseApplyReport, TerrainCache, TerrainGrid, TerrainSnapshot};

pub use tilescape_render::{CoordinateConverter, ViewConfig};

/// Cell address inside a [`Grid`]. Signed so that negative probes report
/// [`TerrainError::OutOfBounds`] instead of wrapping.
pub type GridPos = (i64, i64);
/// Tile address across the whole world.
pub type TilePos = (i64, i64);
/// Chunk address inside the chunk grid.
pub type ChunkCoord = (i64, i64);
/// Tile address inside one chunk.
pub type LocalPos = (i64, i64);

/// Errors raised by terrain construction and tile access.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum TerrainError {
    /// A coordinate fell outside a grid of the reported size.
    #[error("position ({x}, {y}) is outside a {width}x{height} grid")]
    OutOfBounds {
        x: i64,
        y: i64,
        width: usize,
        height: usize,
    },
    /// Indicates an invalid configuration value.
    #[error("invalid configuration: {0}")]
    InvalidConfig(&'static str),
    /// A weight outside the material's declared range.
    #[error("weight {weight} is outside the range allowed for {material}")]
    InvalidWeight { material: Material, weight: f32 },
    /// A material that is not part of the terrain's palette.
    #[error("material {0} is not in the terrain palette")]
    InvalidMaterial(Material),
    #[error("unknown material name {0:?}")]
    UnknownMaterial(String),
    /// A bulk write supplied the wrong number of tiles.
    #[error("expected {expected} tiles, got {actual}")]
    TileCountMismatch { expected: usize, actual: usize },
    #[error(transparent)]
    Render(#[from] ViewError),
}
