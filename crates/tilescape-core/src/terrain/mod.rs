//! World-level terrain: the chunk grid, tile addressing, camera and cache.

use std::sync::Arc;

use rand::{Rng, rngs::SmallRng};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tilescape_render::CoordinateConverter;
use tracing::{debug, info, warn};

use crate::{
    Chunk, ChunkCoord, GenerationMode, Grid, LocalPos, Material, MaterialPalette, TerrainConfig,
    TerrainError, Tile, TilePos,
};

mod cache;

pub use cache::{TerrainCache, TerrainSnapshot};

/// Outcome of [`TerrainGrid::apply_sparse`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SparseApplyReport {
    /// Listed tiles written to the terrain.
    pub placed: usize,
    /// Listed tiles that fell outside the world and were ignored.
    pub skipped: usize,
}

/// The whole world: a grid of generated chunks plus the camera looking at it.
///
/// Two coordinate systems address tiles. Array coordinates start at the first
/// tile of chunk `(0, 0)`; relative coordinates put the origin on the first
/// tile of the center chunk, `floor((grid_size - 1) / 2)` on each axis. The
/// converter and the render cache work in relative coordinates.
#[derive(Debug)]
pub struct TerrainGrid {
    config: TerrainConfig,
    chunks: Grid<Chunk>,
    center_chunk: ChunkCoord,
    seed: u64,
    rng: SmallRng,
    converter: CoordinateConverter,
    cache: TerrainCache,
}

impl TerrainGrid {
    /// Validate `config`, then build and generate every chunk.
    pub fn new(config: TerrainConfig) -> Result<Self, TerrainError> {
        config.validate()?;
        let seed = config.resolve_seed();
        let converter = CoordinateConverter::new(config.canvas_size, config.tile_size)?;
        let (width, height) = (config.grid_size_x as usize, config.grid_size_y as usize);
        let chunk_size = config.chunk_size as usize;

        let coords: Vec<ChunkCoord> = (0..height as i64)
            .flat_map(|y| (0..width as i64).map(move |x| (x, y)))
            .collect();
        let chunks = coords
            .into_par_iter()
            .map(|origin| {
                Chunk::new(
                    origin,
                    chunk_size,
                    config.generation_mode,
                    seed,
                    config.palette.clone(),
                    config.noise,
                )
            })
            .collect::<Result<Vec<_>, _>>()?;
        let chunks = Grid::from_vec(width, height, chunks)?;

        let center_chunk = (
            (i64::from(config.grid_size_x) - 1) / 2,
            (i64::from(config.grid_size_y) - 1) / 2,
        );
        info!(
            chunks_x = width,
            chunks_y = height,
            chunk_size,
            seed,
            mode = ?config.generation_mode,
            "built terrain",
        );
        Ok(Self {
            config,
            chunks,
            center_chunk,
            seed,
            rng: TerrainConfig::seeded_rng(seed),
            converter,
            cache: TerrainCache::Empty,
        })
    }

    /// Split an array coordinate into chunk coordinate and local offset.
    #[must_use]
    pub fn conv_arr_to_access(&self, (x, y): TilePos) -> (ChunkCoord, LocalPos) {
        let size = self.chunk_size() as i64;
        (
            (x.div_euclid(size), y.div_euclid(size)),
            (x.rem_euclid(size), y.rem_euclid(size)),
        )
    }

    /// Inverse of [`Self::conv_arr_to_access`]. Fails with `OutOfBounds`
    /// when the result does not fit in a [`TilePos`].
    pub fn conv_access_to_arr(
        &self,
        chunk: ChunkCoord,
        local: LocalPos,
    ) -> Result<TilePos, TerrainError> {
        let size = i64::from(self.chunk_size());
        let axis = |chunk: i64, local: i64| chunk.checked_mul(size)?.checked_add(local);
        match (axis(chunk.0, local.0), axis(chunk.1, local.1)) {
            (Some(x), Some(y)) => Ok((x, y)),
            _ => Err(self.out_of_bounds(local)),
        }
    }

    /// Relative coordinate to array coordinate. Fails with `OutOfBounds`
    /// when the shift overflows.
    pub fn relative_to_arr(&self, pos: TilePos) -> Result<TilePos, TerrainError> {
        let (dx, dy) = self.center_offset();
        match (pos.0.checked_add(dx), pos.1.checked_add(dy)) {
            (Some(x), Some(y)) => Ok((x, y)),
            _ => Err(self.out_of_bounds(pos)),
        }
    }

    pub fn arr_to_relative(&self, pos: TilePos) -> Result<TilePos, TerrainError> {
        let (dx, dy) = self.center_offset();
        match (pos.0.checked_sub(dx), pos.1.checked_sub(dy)) {
            (Some(x), Some(y)) => Ok((x, y)),
            _ => Err(self.out_of_bounds(pos)),
        }
    }

    pub fn arr_tile(&self, pos: TilePos) -> Result<&Tile, TerrainError> {
        let (chunk, local) = self.conv_arr_to_access(pos);
        match self.chunks.get(chunk) {
            Ok(chunk) => chunk.tile(local),
            Err(_) => Err(self.out_of_bounds(pos)),
        }
    }

    /// Write a tile by array coordinate. The material must be in the palette.
    pub fn set_arr_tile(&mut self, pos: TilePos, tile: Tile) -> Result<(), TerrainError> {
        self.config.palette.check(tile.material())?;
        let (chunk, local) = self.conv_arr_to_access(pos);
        if !self.chunks.contains(chunk) {
            return Err(self.out_of_bounds(pos));
        }
        self.chunks.get_mut(chunk)?.set_tile(local, tile)?;
        self.cache.invalidate();
        Ok(())
    }

    /// Read a tile by relative coordinate.
    pub fn tile(&self, pos: TilePos) -> Result<&Tile, TerrainError> {
        self.relative_to_arr(pos)
            .and_then(|arr| self.arr_tile(arr))
            .map_err(|_| self.out_of_bounds(pos))
    }

    /// Write a tile by relative coordinate.
    pub fn set_tile(&mut self, pos: TilePos, tile: Tile) -> Result<(), TerrainError> {
        let arr = self.relative_to_arr(pos)?;
        match self.set_arr_tile(arr, tile) {
            Err(TerrainError::OutOfBounds { .. }) => Err(self.out_of_bounds(pos)),
            other => other,
        }
    }

    pub fn chunk(&self, coord: ChunkCoord) -> Result<&Chunk, TerrainError> {
        self.chunks.get(coord)
    }

    #[must_use]
    pub fn chunks(&self) -> &Grid<Chunk> {
        &self.chunks
    }

    /// Chunks per axis.
    #[must_use]
    pub fn grid_size(&self) -> (u32, u32) {
        (self.config.grid_size_x, self.config.grid_size_y)
    }

    #[must_use]
    pub fn chunk_size(&self) -> u32 {
        self.config.chunk_size
    }

    /// Tile edge length in pixels at zoom 1.
    #[must_use]
    pub fn tile_size(&self) -> f64 {
        self.converter.tile_size()
    }

    /// World size in tiles per axis.
    #[must_use]
    pub fn world_extent(&self) -> (usize, usize) {
        let size = self.chunk_size() as usize;
        (self.chunks.width() * size, self.chunks.height() * size)
    }

    /// World size in pixels per axis at zoom 1.
    #[must_use]
    pub fn grid_size_pixels(&self) -> (f64, f64) {
        let (width, height) = self.world_extent();
        (
            width as f64 * self.tile_size(),
            height as f64 * self.tile_size(),
        )
    }

    #[must_use]
    pub fn tile_count(&self) -> usize {
        let (width, height) = self.world_extent();
        width * height
    }

    #[must_use]
    pub const fn center_chunk(&self) -> ChunkCoord {
        self.center_chunk
    }

    #[must_use]
    pub const fn seed(&self) -> u64 {
        self.seed
    }

    #[must_use]
    pub fn generation_mode(&self) -> GenerationMode {
        self.config.generation_mode
    }

    #[must_use]
    pub fn palette(&self) -> &MaterialPalette {
        &self.config.palette
    }

    #[must_use]
    pub fn config(&self) -> &TerrainConfig {
        &self.config
    }

    #[must_use]
    pub fn converter(&self) -> &CoordinateConverter {
        &self.converter
    }

    /// Mutable camera access. Changes bump the converter's `update_id`,
    /// which the render cache checks on the next [`Self::visible_tiles`].
    pub fn converter_mut(&mut self) -> &mut CoordinateConverter {
        &mut self.converter
    }

    /// Put the camera on the relative origin and snap it to the pixel grid.
    pub fn set_grid_to_center(&mut self) -> Result<(), TerrainError> {
        self.converter.set_center_pos((0.0, 0.0))?;
        self.converter.align_to_canvas();
        Ok(())
    }

    /// Canvas position of the center of the tile at relative `pos`.
    #[must_use]
    pub fn tile_to_canvas(&self, (x, y): TilePos) -> (f64, f64) {
        self.converter.to_canvas((x as f64 + 0.5, y as f64 + 0.5))
    }

    /// Relative coordinate of the tile under a canvas pixel.
    #[must_use]
    pub fn canvas_to_tile(&self, canvas: (f64, f64)) -> TilePos {
        let (wx, wy) = self.converter.to_world(canvas);
        (wx.floor() as i64, wy.floor() as i64)
    }

    pub fn tile_at_canvas(&self, canvas: (f64, f64)) -> Result<&Tile, TerrainError> {
        self.tile(self.canvas_to_tile(canvas))
    }

    /// Tiles under the current view, rebuilt when the cache is empty or the
    /// camera moved since the last snapshot.
    pub fn visible_tiles(&mut self) -> Arc<TerrainSnapshot> {
        let update_id = self.converter.update_id();
        if let Some(snapshot) = self.cache.fresh(update_id) {
            return Arc::clone(snapshot);
        }
        let snapshot = Arc::new(self.build_snapshot(update_id));
        debug!(update_id, tiles = snapshot.len(), "rebuilt terrain cache");
        self.cache = TerrainCache::Valid(Arc::clone(&snapshot));
        snapshot
    }

    pub fn invalidate_cache(&mut self) {
        self.cache.invalidate();
    }

    /// True when the next [`Self::visible_tiles`] call would be served from cache.
    #[must_use]
    pub fn is_cache_valid(&self) -> bool {
        self.cache.fresh(self.converter.update_id()).is_some()
    }

    #[must_use]
    pub fn cache(&self) -> &TerrainCache {
        &self.cache
    }

    /// Draw a fresh seed from the terrain RNG and regenerate every chunk.
    pub fn randomize(&mut self) -> u64 {
        self.seed = self.rng.random();
        self.regenerate_chunks();
        info!(seed = self.seed, "randomized terrain");
        self.seed
    }

    /// Switch generation mode and regenerate with the current seed.
    pub fn regenerate(&mut self, mode: GenerationMode) -> Result<(), TerrainError> {
        mode.validate()?;
        for chunk in self.chunks.values_mut() {
            chunk.set_mode(mode)?;
        }
        self.config.generation_mode = mode;
        self.regenerate_chunks();
        info!(seed = self.seed, mode = ?mode, "regenerated terrain");
        Ok(())
    }

    /// Reset every tile to `default_material`, then write the listed tiles.
    ///
    /// Coordinates are relative. Every material is checked against the palette
    /// before anything changes; tiles outside the world are skipped and counted.
    pub fn apply_sparse(
        &mut self,
        default_material: Material,
        tiles: &[(TilePos, Material)],
    ) -> Result<SparseApplyReport, TerrainError> {
        self.config.palette.check(default_material)?;
        let mut staged = Vec::with_capacity(tiles.len());
        let mut report = SparseApplyReport::default();
        for &(pos, material) in tiles {
            self.config.palette.check(material)?;
            let access = self
                .relative_to_arr(pos)
                .map(|arr| self.conv_arr_to_access(arr));
            match access {
                Ok((chunk, local)) if self.chunks.contains(chunk) => {
                    staged.push((chunk, local, material));
                }
                _ => {
                    warn!(x = pos.0, y = pos.1, %material, "skipping sparse tile outside terrain");
                    report.skipped += 1;
                }
            }
        }

        let fill = Tile::of(default_material);
        for chunk in self.chunks.values_mut() {
            chunk.fill(fill)?;
        }
        for (chunk, local, material) in staged {
            self.chunks
                .get_mut(chunk)?
                .set_tile(local, Tile::of(material))?;
            report.placed += 1;
        }
        self.cache.invalidate();
        debug!(placed = report.placed, skipped = report.skipped, "applied sparse tiles");
        Ok(report)
    }

    /// Every tile with its array coordinate, chunk by chunk in row-major
    /// order and row-major within each chunk.
    pub fn tiles(&self) -> impl Iterator<Item = (TilePos, &Tile)> + '_ {
        let size = i64::from(self.chunk_size());
        self.chunks.iter().flat_map(move |(coord, chunk)| {
            chunk.tiles().iter().map(move |((lx, ly), tile)| {
                ((coord.0 * size + lx, coord.1 * size + ly), tile)
            })
        })
    }

    /// Overwrite every tile, in [`Self::tiles`] order.
    ///
    /// The count and every material are checked first, so an error leaves
    /// the terrain unchanged.
    pub fn replace_all(&mut self, tiles: Vec<Tile>) -> Result<(), TerrainError> {
        let expected = self.tile_count();
        if tiles.len() != expected {
            return Err(TerrainError::TileCountMismatch {
                expected,
                actual: tiles.len(),
            });
        }
        for tile in &tiles {
            self.config.palette.check(tile.material())?;
        }
        let mut source = tiles.into_iter();
        for chunk in self.chunks.values_mut() {
            for (slot, tile) in chunk.tiles_mut().values_mut().iter_mut().zip(&mut source) {
                *slot = tile;
            }
        }
        self.cache.invalidate();
        Ok(())
    }

    fn regenerate_chunks(&mut self) {
        let seed = self.seed;
        self.chunks
            .values_mut()
            .par_iter_mut()
            .for_each(|chunk| chunk.regenerate(seed));
        self.cache.invalidate();
    }

    /// Scans only the part of the visible range that overlaps the world.
    fn build_snapshot(&self, update_id: u64) -> TerrainSnapshot {
        let (min_x, min_y, max_x, max_y) = self.converter.visible_tile_range();
        let (dx, dy) = self.center_offset();
        let (width, height) = self.world_extent();
        let (width, height) = (width as i64, height as i64);
        let (lo_x, hi_x) = (min_x.max(-dx), max_x.min(width - 1 - dx));
        let (lo_y, hi_y) = (min_y.max(-dy), max_y.min(height - 1 - dy));

        let mut tiles = Vec::new();
        if lo_x <= hi_x && lo_y <= hi_y {
            tiles.reserve(((hi_x - lo_x + 1) * (hi_y - lo_y + 1)) as usize);
            for y in lo_y..=hi_y {
                for x in lo_x..=hi_x {
                    if let Ok(tile) = self.tile((x, y)) {
                        tiles.push(((x, y), *tile));
                    }
                }
            }
        }
        TerrainSnapshot::new(update_id, (min_x, min_y), (max_x, max_y), tiles)
    }

    /// Array position of the relative origin.
    fn center_offset(&self) -> TilePos {
        let size = i64::from(self.chunk_size());
        (self.center_chunk.0 * size, self.center_chunk.1 * size)
    }

    fn out_of_bounds(&self, (x, y): TilePos) -> TerrainError {
        let (width, height) = self.world_extent();
        TerrainError::OutOfBounds {
            x,
            y,
            width,
            height,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn terrain(mode: GenerationMode) -> TerrainGrid {
        TerrainGrid::new(TerrainConfig {
            generation_mode: mode,
            seed: Some(1234),
            ..TerrainConfig::default()
        })
        .expect("terrain")
    }

    #[test]
    fn three_by_three_world_resolves_addresses() {
        let terrain = terrain(GenerationMode::Flat);
        assert_eq!(terrain.world_extent(), (24, 24));
        assert_eq!(terrain.conv_arr_to_access((10, 10)), ((1, 1), (2, 2)));
        assert_eq!(terrain.conv_access_to_arr((1, 1), (2, 2)), Ok((10, 10)));
        assert_eq!(terrain.center_chunk(), (1, 1));
        assert_eq!(terrain.grid_size_pixels(), (768.0, 768.0));
    }

    #[test]
    fn out_of_range_reads_and_writes_fail() {
        let mut terrain = terrain(GenerationMode::Flat);
        assert!(matches!(
            terrain.arr_tile((24, 0)),
            Err(TerrainError::OutOfBounds { x: 24, y: 0, .. })
        ));
        assert!(matches!(
            terrain.arr_tile((-1, 3)),
            Err(TerrainError::OutOfBounds { .. })
        ));
        assert!(matches!(
            terrain.set_tile((16, 0), Tile::of(Material::Dirt)),
            Err(TerrainError::OutOfBounds { x: 16, y: 0, .. })
        ));
    }

    #[test]
    fn relative_coordinates_center_on_middle_chunk() {
        let mut terrain = terrain(GenerationMode::Flat);
        terrain.set_tile((0, 0), Tile::of(Material::Stone)).expect("set");
        assert_eq!(
            terrain.arr_tile((8, 8)).expect("tile").material(),
            Material::Stone
        );
        assert_eq!(terrain.tile((-8, -8)).map(|t| t.material()), Ok(Material::Grass));
        assert!(terrain.tile((-9, 0)).is_err());
        assert_eq!(terrain.arr_to_relative((8, 8)), Ok((0, 0)));
    }

    #[test]
    fn writes_outside_palette_are_rejected() {
        let mut terrain = TerrainGrid::new(TerrainConfig {
            palette: MaterialPalette::new(vec![Material::Sand]).expect("palette"),
            generation_mode: GenerationMode::Flat,
            seed: Some(1),
            ..TerrainConfig::default()
        })
        .expect("terrain");
        assert_eq!(
            terrain.set_arr_tile((0, 0), Tile::of(Material::Water)),
            Err(TerrainError::InvalidMaterial(Material::Water))
        );
    }

    #[test]
    fn cache_tracks_edits_and_camera_moves() {
        let mut terrain = terrain(GenerationMode::Flat);
        assert!(!terrain.is_cache_valid());
        let first = terrain.visible_tiles();
        assert!(terrain.is_cache_valid());
        assert!(Arc::ptr_eq(&first, &terrain.visible_tiles()));

        terrain.set_tile((0, 0), Tile::of(Material::Dirt)).expect("set");
        assert!(!terrain.is_cache_valid());
        let second = terrain.visible_tiles();
        assert!(!Arc::ptr_eq(&first, &second));

        terrain.converter_mut().pan_by((1.0, 0.0)).expect("pan");
        assert!(!terrain.is_cache_valid());
        assert!(terrain.visible_tiles().update_id() > second.update_id());

        terrain.invalidate_cache();
        assert_eq!(terrain.cache(), &TerrainCache::Empty);
    }

    #[test]
    fn visible_tiles_cover_the_whole_small_world() {
        let mut terrain = terrain(GenerationMode::Flat);
        terrain.set_grid_to_center().expect("center");
        // 800x600 at 32px spans about 25x19 tiles around the relative origin,
        // which runs past the world's left edge at x = -8
        let snapshot = terrain.visible_tiles();
        let (min, max) = snapshot.bounds();
        assert!(min.0 < -8 && max.0 >= 12);
        assert!(min.1 <= -8 && max.1 >= 8);
        assert!(snapshot.tiles().iter().any(|(pos, _)| *pos == (-8, 0)));
        assert!(snapshot.tiles().iter().all(|(pos, _)| pos.0 >= -8));
        assert!(
            snapshot
                .tiles()
                .iter()
                .all(|(pos, _)| terrain.tile(*pos).is_ok())
        );
    }

    #[test]
    fn randomize_changes_seed_and_clears_cache() {
        let mut terrain = terrain(GenerationMode::Perlin);
        let before: Vec<Tile> = terrain.tiles().map(|(_, t)| *t).collect();
        let _ = terrain.visible_tiles();
        let seed = terrain.randomize();
        assert_eq!(terrain.seed(), seed);
        assert!(!terrain.is_cache_valid());
        let after: Vec<Tile> = terrain.tiles().map(|(_, t)| *t).collect();
        assert_ne!(before, after);
    }

    #[test]
    fn regenerate_switches_mode() {
        let mut terrain = terrain(GenerationMode::Perlin);
        terrain.regenerate(GenerationMode::Flat).expect("regenerate");
        assert_eq!(terrain.generation_mode(), GenerationMode::Flat);
        assert!(terrain.tiles().all(|(_, t)| t.material() == Material::Grass));
        assert!(
            terrain
                .regenerate(GenerationMode::Columns { band_width: 0 })
                .is_err()
        );
    }

    #[test]
    fn canvas_round_trip_through_tiles() {
        let terrain = terrain(GenerationMode::Flat);
        let canvas = terrain.tile_to_canvas((3, -2));
        assert_eq!(terrain.canvas_to_tile(canvas), (3, -2));
        assert!(terrain.tile_at_canvas(canvas).is_ok());
        assert!(terrain.tile_at_canvas((-10_000.0, 0.0)).is_err());
    }

    #[test]
    fn extreme_coordinates_are_out_of_bounds() {
        let mut terrain = terrain(GenerationMode::Flat);
        assert!(matches!(
            terrain.tile_at_canvas((1e300, 0.0)),
            Err(TerrainError::OutOfBounds { .. })
        ));
        assert!(matches!(
            terrain.tile_at_canvas((0.0, -1e300)),
            Err(TerrainError::OutOfBounds { .. })
        ));
        assert!(matches!(
            terrain.tile((i64::MAX, i64::MIN)),
            Err(TerrainError::OutOfBounds { x: i64::MAX, y: i64::MIN, .. })
        ));
        assert!(matches!(
            terrain.set_tile((i64::MAX, 0), Tile::of(Material::Dirt)),
            Err(TerrainError::OutOfBounds { x: i64::MAX, y: 0, .. })
        ));
        assert!(terrain.relative_to_arr((i64::MAX, 0)).is_err());
        assert!(terrain.arr_to_relative((0, i64::MIN)).is_err());
        assert!(terrain.conv_access_to_arr((i64::MAX, 0), (0, 0)).is_err());

        let report = terrain
            .apply_sparse(Material::Grass, &[((i64::MAX, i64::MAX), Material::Stone)])
            .expect("apply");
        assert_eq!(report, SparseApplyReport { placed: 0, skipped: 1 });
    }

    #[test]
    fn zoomed_out_snapshot_reads_only_world_tiles() {
        let mut terrain = terrain(GenerationMode::Flat);
        let converter = terrain.converter_mut();
        converter.set_tile_size(0.001).expect("tile size");
        converter.set_zoom(0.25).expect("zoom");
        let (min_x, _, max_x, _) = terrain.converter().visible_tile_range();
        assert!(max_x - min_x > 1_000_000);

        let snapshot = terrain.visible_tiles();
        assert_eq!(snapshot.len(), terrain.tile_count());
        assert_eq!(snapshot.bounds().0.0, min_x);

        terrain
            .converter_mut()
            .set_center_pos((1e15, -1e15))
            .expect("move");
        assert!(terrain.visible_tiles().is_empty());
    }

    #[test]
    fn apply_sparse_fills_then_places() {
        let mut terrain = terrain(GenerationMode::Perlin);
        let report = terrain
            .apply_sparse(
                Material::Sand,
                &[((0, 0), Material::Stone), ((100, 100), Material::Water)],
            )
            .expect("apply");
        assert_eq!(report, SparseApplyReport { placed: 1, skipped: 1 });
        assert_eq!(terrain.tile((0, 0)).map(|t| t.material()), Ok(Material::Stone));
        let sand = terrain
            .tiles()
            .filter(|(_, t)| t.material() == Material::Sand)
            .count();
        assert_eq!(sand, terrain.tile_count() - 1);
    }

    #[test]
    fn apply_sparse_validates_before_writing() {
        let mut terrain = TerrainGrid::new(TerrainConfig {
            palette: MaterialPalette::new(vec![Material::Grass, Material::Dirt]).expect("palette"),
            generation_mode: GenerationMode::Checkerboard,
            seed: Some(8),
            ..TerrainConfig::default()
        })
        .expect("terrain");
        let before: Vec<Tile> = terrain.tiles().map(|(_, t)| *t).collect();
        let result = terrain.apply_sparse(
            Material::Grass,
            &[((0, 0), Material::Dirt), ((1, 0), Material::Water)],
        );
        assert_eq!(result, Err(TerrainError::InvalidMaterial(Material::Water)));
        let after: Vec<Tile> = terrain.tiles().map(|(_, t)| *t).collect();
        assert_eq!(before, after);
    }

    #[test]
    fn tiles_iterate_in_chunk_order_and_replace_all_matches() {
        let mut terrain = terrain(GenerationMode::Flat);
        let positions: Vec<TilePos> = terrain.tiles().map(|(pos, _)| pos).collect();
        assert_eq!(positions.len(), 576);
        assert_eq!(&positions[..3], &[(0, 0), (1, 0), (2, 0)]);
        assert_eq!(positions[8], (0, 1));
        assert_eq!(positions[64], (8, 0));

        let mut replacement = vec![Tile::of(Material::Grass); 576];
        replacement[64] = Tile::of(Material::Moss);
        terrain.replace_all(replacement).expect("replace");
        assert_eq!(terrain.arr_tile((8, 0)).map(|t| t.material()), Ok(Material::Moss));

        assert_eq!(
            terrain.replace_all(vec![Tile::of(Material::Grass); 3]),
            Err(TerrainError::TileCountMismatch {
                expected: 576,
                actual: 3
            })
        );
    }
}
