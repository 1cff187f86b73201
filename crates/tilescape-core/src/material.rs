use std::fmt;
use std::ops::RangeInclusive;
use std::str::FromStr;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::TerrainError;

/// Ground materials a tile can be made of.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Material {
    Grass,
    Dirt,
    Sand,
    Stone,
    Moss,
    Water,
}

impl Material {
    pub const ALL: [Material; 6] = [
        Material::Grass,
        Material::Dirt,
        Material::Sand,
        Material::Stone,
        Material::Moss,
        Material::Water,
    ];

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Material::Grass => "grass",
            Material::Dirt => "dirt",
            Material::Sand => "sand",
            Material::Stone => "stone",
            Material::Moss => "moss",
            Material::Water => "water",
        }
    }

    /// Traversal weights a tile of this material may carry.
    #[must_use]
    pub fn weight_range(self) -> RangeInclusive<f32> {
        match self {
            Material::Grass => 1.0..=2.0,
            Material::Dirt => 1.5..=3.0,
            Material::Sand => 2.0..=4.0,
            Material::Stone => 5.0..=10.0,
            Material::Moss => 1.0..=1.5,
            Material::Water => 8.0..=12.0,
        }
    }

    #[must_use]
    pub fn default_weight(self) -> f32 {
        *self.weight_range().start()
    }

    /// Slice of normalised noise space that Perlin generation maps to this material.
    #[must_use]
    pub const fn noise_band(self) -> NoiseBand {
        match self {
            Material::Water => NoiseBand::new(f64::NEG_INFINITY, -0.35),
            Material::Sand => NoiseBand::new(-0.35, -0.2),
            Material::Grass => NoiseBand::new(-0.2, 0.25),
            Material::Moss => NoiseBand::new(0.25, 0.4),
            Material::Dirt => NoiseBand::new(0.4, 0.55),
            Material::Stone => NoiseBand::new(0.55, f64::INFINITY),
        }
    }
}

impl fmt::Display for Material {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Material {
    type Err = TerrainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Material::ALL
            .into_iter()
            .find(|material| material.name() == s)
            .ok_or_else(|| TerrainError::UnknownMaterial(s.to_owned()))
    }
}

/// Half-open interval `[low, high)` of noise values.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NoiseBand {
    pub low: f64,
    pub high: f64,
}

impl NoiseBand {
    #[must_use]
    pub const fn new(low: f64, high: f64) -> Self {
        Self { low, high }
    }

    #[inline]
    #[must_use]
    pub fn contains(&self, value: f64) -> bool {
        self.low <= value && value < self.high
    }
}

/// One cell of terrain.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tile {
    material: Material,
    weight: f32,
}

impl Tile {
    /// Build a tile, rejecting weights outside the material's range.
    pub fn new(material: Material, weight: f32) -> Result<Self, TerrainError> {
        if !material.weight_range().contains(&weight) {
            return Err(TerrainError::InvalidWeight { material, weight });
        }
        Ok(Self { material, weight })
    }

    /// A tile of `material` carrying its default weight.
    #[must_use]
    pub fn of(material: Material) -> Self {
        Self {
            material,
            weight: material.default_weight(),
        }
    }

    /// A tile of `material` with a weight drawn uniformly from its range.
    pub fn random<R: Rng>(material: Material, rng: &mut R) -> Self {
        Self {
            material,
            weight: rng.random_range(material.weight_range()),
        }
    }

    #[inline]
    #[must_use]
    pub const fn material(&self) -> Material {
        self.material
    }

    #[inline]
    #[must_use]
    pub const fn weight(&self) -> f32 {
        self.weight
    }
}

/// Ordered set of materials a terrain is allowed to contain.
///
/// The first entry is the default material; pattern generators cycle
/// through the list in order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Material>", into = "Vec<Material>")]
pub struct MaterialPalette(Vec<Material>);

impl MaterialPalette {
    pub fn new(materials: Vec<Material>) -> Result<Self, TerrainError> {
        if materials.is_empty() {
            return Err(TerrainError::InvalidConfig(
                "material palette must not be empty",
            ));
        }
        for (idx, material) in materials.iter().enumerate() {
            if materials[..idx].contains(material) {
                return Err(TerrainError::InvalidConfig(
                    "material palette must not repeat materials",
                ));
            }
        }
        Ok(Self(materials))
    }

    #[must_use]
    pub fn default_material(&self) -> Material {
        self.0[0]
    }

    #[must_use]
    pub fn materials(&self) -> &[Material] {
        &self.0
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always false; palettes are non-empty by construction.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn contains(&self, material: Material) -> bool {
        self.0.contains(&material)
    }

    /// Error unless `material` belongs to the palette.
    pub fn check(&self, material: Material) -> Result<(), TerrainError> {
        if self.contains(material) {
            Ok(())
        } else {
            Err(TerrainError::InvalidMaterial(material))
        }
    }

    /// Entry at `index`, wrapping in both directions.
    #[must_use]
    pub fn cycle(&self, index: i64) -> Material {
        self.0[index.rem_euclid(self.0.len() as i64) as usize]
    }

    /// First palette material whose noise band holds `value`, else the default.
    #[must_use]
    pub fn for_noise(&self, value: f64) -> Material {
        self.0
            .iter()
            .copied()
            .find(|material| material.noise_band().contains(value))
            .unwrap_or_else(|| self.default_material())
    }
}

impl Default for MaterialPalette {
    fn default() -> Self {
        Self(Material::ALL.to_vec())
    }
}

impl TryFrom<Vec<Material>> for MaterialPalette {
    type Error = TerrainError;

    fn try_from(materials: Vec<Material>) -> Result<Self, Self::Error> {
        Self::new(materials)
    }
}

impl From<MaterialPalette> for Vec<Material> {
    fn from(palette: MaterialPalette) -> Self {
        palette.0
    }
}
