use noise::{NoiseFn, Perlin};
use rand::{SeedableRng, rngs::SmallRng};
use tracing::debug;

use crate::{
    ChunkCoord, GenerationMode, Grid, LocalPos, Material, MaterialPalette, NoiseSettings,
    TerrainError, Tile, TilePos,
};

/// Square block of tiles; the unit of generation.
#[derive(Debug, Clone, PartialEq)]
pub struct Chunk {
    origin: ChunkCoord,
    size: usize,
    tiles: Grid<Tile>,
    mode: GenerationMode,
    seed: u64,
    palette: MaterialPalette,
    noise: NoiseSettings,
}

impl Chunk {
    /// Build the chunk at `origin` and generate its tiles.
    pub fn new(
        origin: ChunkCoord,
        size: usize,
        mode: GenerationMode,
        seed: u64,
        palette: MaterialPalette,
        noise: NoiseSettings,
    ) -> Result<Self, TerrainError> {
        mode.validate()?;
        let mut chunk = Self {
            origin,
            size,
            tiles: Grid::new(size, size, Tile::of(palette.default_material()))?,
            mode,
            seed,
            palette,
            noise,
        };
        chunk.generate();
        Ok(chunk)
    }

    /// Regenerate every tile from the chunk's seed, origin and mode.
    ///
    /// Weights come from an RNG keyed on `(seed, origin)` and are drawn in
    /// row-major order, so identical inputs give identical tiles.
    pub fn generate(&mut self) {
        let mut rng = SmallRng::seed_from_u64(chunk_seed(self.seed, self.origin));
        let perlin = Perlin::new(fold_seed(self.seed));
        let (world_x, world_y) = self.world_origin();
        let size = self.size;
        for (idx, tile) in self.tiles.values_mut().iter_mut().enumerate() {
            let x = world_x + (idx % size) as i64;
            let y = world_y + (idx / size) as i64;
            let material = sample_material(self.mode, &self.palette, &self.noise, &perlin, x, y);
            *tile = Tile::random(material, &mut rng);
        }
        debug!(
            chunk_x = self.origin.0,
            chunk_y = self.origin.1,
            mode = ?self.mode,
            "generated chunk",
        );
    }

    /// Replace the seed and regenerate.
    pub fn regenerate(&mut self, seed: u64) {
        self.seed = seed;
        self.generate();
    }

    /// Switch generation mode; takes effect on the next generation.
    pub fn set_mode(&mut self, mode: GenerationMode) -> Result<(), TerrainError> {
        mode.validate()?;
        self.mode = mode;
        Ok(())
    }

    pub fn tile(&self, local: LocalPos) -> Result<&Tile, TerrainError> {
        self.tiles.get(local)
    }

    /// Write one tile. The material must be in this chunk's palette.
    pub fn set_tile(&mut self, local: LocalPos, tile: Tile) -> Result<(), TerrainError> {
        self.palette.check(tile.material())?;
        self.tiles.set(local, tile)
    }

    pub fn fill(&mut self, tile: Tile) -> Result<(), TerrainError> {
        self.palette.check(tile.material())?;
        self.tiles.fill(tile);
        Ok(())
    }

    #[inline]
    #[must_use]
    pub const fn origin(&self) -> ChunkCoord {
        self.origin
    }

    #[inline]
    #[must_use]
    pub const fn size(&self) -> usize {
        self.size
    }

    /// Array coordinate of this chunk's first tile.
    #[must_use]
    pub fn world_origin(&self) -> TilePos {
        let size = self.size as i64;
        (self.origin.0 * size, self.origin.1 * size)
    }

    #[must_use]
    pub fn tiles(&self) -> &Grid<Tile> {
        &self.tiles
    }

    pub(crate) fn tiles_mut(&mut self) -> &mut Grid<Tile> {
        &mut self.tiles
    }

    #[must_use]
    pub const fn mode(&self) -> GenerationMode {
        self.mode
    }

    #[must_use]
    pub const fn seed(&self) -> u64 {
        self.seed
    }
}

fn sample_material(
    mode: GenerationMode,
    palette: &MaterialPalette,
    settings: &NoiseSettings,
    perlin: &Perlin,
    x: i64,
    y: i64,
) -> Material {
    match mode {
        GenerationMode::Perlin => palette.for_noise(fractal_noise(perlin, settings, x, y)),
        GenerationMode::Columns { band_width } => {
            palette.cycle(x.div_euclid(i64::from(band_width)))
        }
        GenerationMode::Checkerboard => palette.cycle((x + y).rem_euclid(2)),
        GenerationMode::Flat => palette.default_material(),
    }
}

/// Octave sum of Perlin samples at the tile center, normalised to `[-1, 1]`.
fn fractal_noise(perlin: &Perlin, settings: &NoiseSettings, x: i64, y: i64) -> f64 {
    let (sx, sy) = (x as f64 + 0.5, y as f64 + 0.5);
    let mut amplitude = 1.0;
    let mut frequency = settings.base_frequency;
    let mut total = 0.0;
    let mut max_value = 0.0;
    for _ in 0..settings.octaves {
        total += perlin.get([sx * frequency, sy * frequency]) * amplitude;
        max_value += amplitude;
        amplitude *= settings.persistence;
        frequency *= settings.lacunarity;
    }
    (total / max_value).clamp(-1.0, 1.0)
}

/// Mix the terrain seed with a chunk coordinate (splitmix64 finaliser).
fn chunk_seed(seed: u64, (cx, cy): ChunkCoord) -> u64 {
    let mut z = seed
        ^ (cx as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15)
        ^ (cy as u64).wrapping_mul(0xC2B2_AE3D_27D4_EB4F);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

fn fold_seed(seed: u64) -> u32 {
    (seed ^ (seed >> 32)) as u32
}
