use rand::{SeedableRng, rngs::SmallRng};
use serde::{Deserialize, Serialize};

use crate::{MaterialPalette, TerrainError};

/// How chunk tiles are chosen during generation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum GenerationMode {
    /// Fractal Perlin noise mapped through the palette's noise bands.
    #[default]
    Perlin,
    /// Vertical stripes `band_width` tiles wide, cycling through the palette.
    Columns { band_width: u32 },
    /// Alternate the first two palette materials on coordinate parity.
    Checkerboard,
    /// The palette's default material everywhere.
    Flat,
}

impl GenerationMode {
    pub fn validate(&self) -> Result<(), TerrainError> {
        if let GenerationMode::Columns { band_width: 0 } = self {
            return Err(TerrainError::InvalidConfig(
                "column band_width must be non-zero",
            ));
        }
        Ok(())
    }
}

/// Octave parameters for fractal Perlin generation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NoiseSettings {
    /// Frequency of the first octave, in cycles per tile.
    pub base_frequency: f64,
    pub octaves: u32,
    /// Amplitude multiplier between successive octaves.
    pub persistence: f64,
    /// Frequency multiplier between successive octaves.
    pub lacunarity: f64,
}

impl Default for NoiseSettings {
    fn default() -> Self {
        Self {
            base_frequency: 0.08,
            octaves: 4,
            persistence: 0.5,
            lacunarity: 2.0,
        }
    }
}

impl NoiseSettings {
    pub fn validate(&self) -> Result<(), TerrainError> {
        if !self.base_frequency.is_finite() || self.base_frequency <= 0.0 {
            return Err(TerrainError::InvalidConfig(
                "noise base_frequency must be finite and positive",
            ));
        }
        if self.octaves == 0 || self.octaves > 16 {
            return Err(TerrainError::InvalidConfig(
                "noise octaves must be in 1..=16",
            ));
        }
        if !self.persistence.is_finite() || self.persistence <= 0.0 {
            return Err(TerrainError::InvalidConfig(
                "noise persistence must be finite and positive",
            ));
        }
        if !self.lacunarity.is_finite() || self.lacunarity <= 0.0 {
            return Err(TerrainError::InvalidConfig(
                "noise lacunarity must be finite and positive",
            ));
        }
        Ok(())
    }
}

/// Static configuration for a [`crate::TerrainGrid`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TerrainConfig {
    /// Chunks along the X axis.
    pub grid_size_x: u32,
    /// Chunks along the Y axis.
    pub grid_size_y: u32,
    /// Tiles along each edge of a chunk.
    pub chunk_size: u32,
    /// Edge length of one tile in canvas pixels at zoom 1.
    pub tile_size: f64,
    /// Canvas width and height in pixels.
    pub canvas_size: (f64, f64),
    pub generation_mode: GenerationMode,
    /// Optional RNG seed for reproducible terrain.
    pub seed: Option<u64>,
    pub palette: MaterialPalette,
    pub noise: NoiseSettings,
}

impl Default for TerrainConfig {
    fn default() -> Self {
        Self {
            grid_size_x: 3,
            grid_size_y: 3,
            chunk_size: 8,
            tile_size: 32.0,
            canvas_size: (800.0, 600.0),
            generation_mode: GenerationMode::Perlin,
            seed: None,
            palette: MaterialPalette::default(),
            noise: NoiseSettings::default(),
        }
    }
}

impl TerrainConfig {
    /// Check every field, reporting the first problem found.
    pub fn validate(&self) -> Result<(), TerrainError> {
        if self.grid_size_x == 0 || self.grid_size_y == 0 {
            return Err(TerrainError::InvalidConfig(
                "grid dimensions must be non-zero",
            ));
        }
        if self.chunk_size == 0 {
            return Err(TerrainError::InvalidConfig("chunk_size must be non-zero"));
        }
        if !self.tile_size.is_finite() || self.tile_size <= 0.0 {
            return Err(TerrainError::InvalidConfig(
                "tile_size must be finite and positive",
            ));
        }
        let (width, height) = self.canvas_size;
        if !(width.is_finite() && height.is_finite()) || width <= 0.0 || height <= 0.0 {
            return Err(TerrainError::InvalidConfig(
                "canvas_size must be finite and positive",
            ));
        }
        self.generation_mode.validate()?;
        self.noise.validate()
    }

    /// Returns the configured seed, drawing one from entropy if absent.
    #[must_use]
    pub fn resolve_seed(&self) -> u64 {
        self.seed.unwrap_or_else(rand::random)
    }

    pub(crate) fn seeded_rng(seed: u64) -> SmallRng {
        SmallRng::seed_from_u64(seed)
    }
}
