use serde::{Deserialize, Serialize};
use serde_json::Value;
use tilescape_core::{ChunkCoord, LocalPos, Material, TerrainError, TerrainGrid, Tile, TilePos};
use tracing::{info, warn};

use crate::format::{DenseTerrain, DenseTile, DocumentFormat, SparseTerrain, TerrainDocument};
use crate::ImportError;

/// What an import changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportReport {
    pub format: DocumentFormat,
    /// Tiles written from the document.
    pub placed: usize,
    /// Listed tiles ignored because they fall outside the target.
    pub skipped: usize,
}

/// Tile access an importer needs from the terrain it writes into.
pub trait TerrainTarget {
    /// Chunks per axis.
    fn grid_size(&self) -> (u32, u32);
    fn chunk_size(&self) -> u32;
    fn tile_size(&self) -> f64;
    /// Resolve an array tile coordinate into chunk and local offset.
    fn conv_arr_to_access(&self, pos: TilePos) -> (ChunkCoord, LocalPos);
    /// Whether tiles of `material` may be written.
    fn accepts(&self, material: Material) -> bool;
    fn set_chunk_tile(
        &mut self,
        chunk: ChunkCoord,
        local: LocalPos,
        tile: Tile,
    ) -> Result<(), ImportError>;

    /// Native bulk load for sparse documents.
    fn import_sparse(&mut self, document: &SparseTerrain) -> Result<ImportReport, ImportError> {
        let _ = document;
        Err(ImportError::UnsupportedOperation(
            "target has no native sparse import",
        ))
    }
}

impl TerrainTarget for TerrainGrid {
    fn grid_size(&self) -> (u32, u32) {
        TerrainGrid::grid_size(self)
    }

    fn chunk_size(&self) -> u32 {
        TerrainGrid::chunk_size(self)
    }

    fn tile_size(&self) -> f64 {
        TerrainGrid::tile_size(self)
    }

    fn conv_arr_to_access(&self, pos: TilePos) -> (ChunkCoord, LocalPos) {
        TerrainGrid::conv_arr_to_access(self, pos)
    }

    fn accepts(&self, material: Material) -> bool {
        self.palette().contains(material)
    }

    fn set_chunk_tile(
        &mut self,
        chunk: ChunkCoord,
        local: LocalPos,
        tile: Tile,
    ) -> Result<(), ImportError> {
        let pos = self.conv_access_to_arr(chunk, local)?;
        self.set_arr_tile(pos, tile)?;
        Ok(())
    }

    fn import_sparse(&mut self, document: &SparseTerrain) -> Result<ImportReport, ImportError> {
        warn_on_tile_size(document.metadata.tile_size, self.tile_size());
        let default_material = document
            .metadata
            .default_material
            .unwrap_or_else(|| self.palette().default_material());
        let tiles: Vec<(TilePos, Material)> = document
            .tiles
            .iter()
            .map(|tile| ((tile.x, tile.y), tile.material))
            .collect();
        let applied = self.apply_sparse(default_material, &tiles)?;
        Ok(ImportReport {
            format: DocumentFormat::Sparse,
            placed: applied.placed,
            skipped: applied.skipped,
        })
    }
}

/// Validate, parse and load a terrain document into `target`.
pub fn import_from_json<T>(target: &mut T, value: &Value) -> Result<ImportReport, ImportError>
where
    T: TerrainTarget + ?Sized,
{
    let report = match TerrainDocument::parse(value)? {
        TerrainDocument::Sparse(document) => target.import_sparse(&document)?,
        TerrainDocument::Dense(document) => import_dense(target, &document)?,
    };
    info!(
        format = ?report.format,
        placed = report.placed,
        skipped = report.skipped,
        "imported terrain",
    );
    Ok(report)
}

/// Parse JSON text, then [`import_from_json`].
pub fn import_from_str<T>(target: &mut T, text: &str) -> Result<ImportReport, ImportError>
where
    T: TerrainTarget + ?Sized,
{
    let value: Value = serde_json::from_str(text)?;
    import_from_json(target, &value)
}

/// Stage every dense tile, then write them all.
///
/// Dimensions, tile count, materials and weights are checked before the
/// first write, so a rejected document leaves the target untouched.
fn import_dense<T>(target: &mut T, document: &DenseTerrain) -> Result<ImportReport, ImportError>
where
    T: TerrainTarget + ?Sized,
{
    let (grid_x, grid_y) = target.grid_size();
    let chunk_size = target.chunk_size();
    let metadata = &document.metadata;
    check_dimension("gridSizeX", grid_x, metadata.grid_size_x)?;
    check_dimension("gridSizeY", grid_y, metadata.grid_size_y)?;
    if let Some(found) = metadata.chunk_size {
        check_dimension("chunkSize", chunk_size, found)?;
    }
    warn_on_tile_size(metadata.tile_size, target.tile_size());

    let per_chunk = (chunk_size as usize) * (chunk_size as usize);
    let expected = (grid_x as usize) * (grid_y as usize) * per_chunk;
    if document.tiles.len() != expected {
        return Err(ImportError::InvalidFormat(vec![format!(
            "Expected {expected} tiles, found {}",
            document.tiles.len()
        )]));
    }

    let size = i64::from(chunk_size);
    let mut staged = Vec::with_capacity(expected);
    for (idx, entry) in document.tiles.iter().enumerate() {
        let material = entry.material();
        if !target.accepts(material) {
            return Err(TerrainError::InvalidMaterial(material).into());
        }
        let tile = match *entry {
            DenseTile::Name(material) => Tile::of(material),
            DenseTile::Weighted { material, weight } => Tile::new(material, weight)?,
        };
        let chunk_idx = (idx / per_chunk) as i64;
        let within = (idx % per_chunk) as i64;
        let chunk = (chunk_idx % i64::from(grid_x), chunk_idx / i64::from(grid_x));
        let arr = (chunk.0 * size + within % size, chunk.1 * size + within / size);
        let (chunk, local) = target.conv_arr_to_access(arr);
        staged.push((chunk, local, tile));
    }

    let placed = staged.len();
    for (chunk, local, tile) in staged {
        target.set_chunk_tile(chunk, local, tile)?;
    }
    Ok(ImportReport {
        format: DocumentFormat::Dense,
        placed,
        skipped: 0,
    })
}

fn check_dimension(field: &'static str, expected: u32, found: u32) -> Result<(), ImportError> {
    if expected == found {
        Ok(())
    } else {
        Err(ImportError::DimensionMismatch {
            field,
            expected,
            found,
        })
    }
}

fn warn_on_tile_size(document: Option<f64>, target: f64) {
    match document {
        Some(found) if found != target => warn!(
            document = found,
            terrain = target,
            "ignoring tile size from import; keeping terrain tile size",
        ),
        _ => {}
    }
}
