use serde::Serialize;
use serde_json::Value;
use tilescape_core::{Material, TerrainGrid};
use tracing::info;

use crate::format::{
    DENSE_VERSION, DenseMetadata, DenseTerrain, DenseTile, SPARSE_VERSION, SparseMetadata,
    SparseTerrain, SparseTile, TileBounds,
};
use crate::ImportError;

/// List every tile whose material differs from `default_material`, keyed by
/// relative coordinates.
#[must_use]
pub fn export_sparse(terrain: &TerrainGrid, default_material: Material) -> SparseTerrain {
    let tiles: Vec<SparseTile> = terrain
        .tiles()
        .filter(|(_, tile)| tile.material() != default_material)
        .filter_map(|(pos, tile)| {
            let (x, y) = terrain.arr_to_relative(pos).ok()?;
            Some(SparseTile {
                x,
                y,
                material: tile.material(),
            })
        })
        .collect();
    let (width, height) = terrain.world_extent();
    info!(tiles = tiles.len(), %default_material, "exported sparse terrain");
    SparseTerrain {
        version: SPARSE_VERSION.to_owned(),
        metadata: SparseMetadata {
            tile_size: Some(terrain.tile_size()),
            default_material: Some(default_material),
            max_map_size: u32::try_from(width.max(height)).ok(),
            bounds: TileBounds::enclosing(tiles.iter().map(|tile| (tile.x, tile.y))),
        },
        tile_count: Some(tiles.len()),
        tiles,
    }
}

/// Every tile in chunk order, weights included.
#[must_use]
pub fn export_dense(terrain: &TerrainGrid) -> DenseTerrain {
    let (grid_size_x, grid_size_y) = terrain.grid_size();
    let tiles: Vec<DenseTile> = terrain
        .tiles()
        .map(|(_, tile)| DenseTile::Weighted {
            material: tile.material(),
            weight: tile.weight(),
        })
        .collect();
    info!(tiles = tiles.len(), grid_size_x, grid_size_y, "exported dense terrain");
    DenseTerrain {
        metadata: DenseMetadata {
            version: DENSE_VERSION.to_owned(),
            grid_size_x,
            grid_size_y,
            chunk_size: Some(terrain.chunk_size()),
            tile_size: Some(terrain.tile_size()),
        },
        tiles,
    }
}

pub fn to_value<T: Serialize>(document: &T) -> Result<Value, ImportError> {
    Ok(serde_json::to_value(document)?)
}

pub fn to_string_pretty<T: Serialize>(document: &T) -> Result<String, ImportError> {
    Ok(serde_json::to_string_pretty(document)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tilescape_core::{GenerationMode, TerrainConfig, Tile};

    fn flat_terrain() -> TerrainGrid {
        TerrainGrid::new(TerrainConfig {
            generation_mode: GenerationMode::Flat,
            seed: Some(4),
            ..TerrainConfig::default()
        })
        .expect("terrain")
    }

    #[test]
    fn sparse_export_lists_only_non_default_tiles() {
        let mut terrain = flat_terrain();
        terrain.set_tile((0, 0), Tile::of(Material::Stone)).expect("set");
        terrain.set_tile((-3, 5), Tile::of(Material::Water)).expect("set");

        let sparse = export_sparse(&terrain, Material::Grass);
        assert_eq!(sparse.tile_count, Some(2));
        // chunk order: (-3, 5) lives in chunk (0, 1), (0, 0) in chunk (1, 1)
        assert_eq!(
            sparse.tiles,
            vec![
                SparseTile {
                    x: -3,
                    y: 5,
                    material: Material::Water
                },
                SparseTile {
                    x: 0,
                    y: 0,
                    material: Material::Stone
                },
            ]
        );
        assert_eq!(
            sparse.metadata.bounds,
            Some(TileBounds {
                min_x: -3,
                min_y: 0,
                max_x: 0,
                max_y: 5
            })
        );
        assert_eq!(sparse.metadata.max_map_size, Some(24));
    }

    #[test]
    fn sparse_json_uses_camel_case_keys() {
        let terrain = flat_terrain();
        let value = to_value(&export_sparse(&terrain, Material::Grass)).expect("json");
        assert_eq!(value["version"], "1.0");
        assert_eq!(value["tileCount"], 0);
        assert_eq!(value["metadata"]["defaultMaterial"], "grass");
        assert_eq!(value["metadata"]["maxMapSize"], 24);
        assert!(value["metadata"]["bounds"].is_null());
    }

    #[test]
    fn dense_export_matches_terrain_shape() {
        let terrain = flat_terrain();
        let dense = export_dense(&terrain);
        assert_eq!(dense.tiles.len(), terrain.tile_count());
        assert_eq!(dense.metadata.chunk_size, Some(8));
        let value = to_value(&dense).expect("json");
        assert_eq!(value["metadata"]["gridSizeX"], 3);
        assert!(value.get("version").is_none(), "dense keeps version in metadata");
        let text = to_string_pretty(&dense).expect("text");
        assert!(text.contains("\"gridSizeY\": 3"));
    }
}
