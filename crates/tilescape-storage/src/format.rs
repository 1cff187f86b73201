use serde::{Deserialize, Serialize};
use serde_json::Value;
use tilescape_core::Material;

use crate::ImportError;

pub const SPARSE_VERSION: &str = "1.0";
pub const DENSE_VERSION: &str = "1.0";

/// Inclusive relative-coordinate box around the listed tiles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TileBounds {
    pub min_x: i64,
    pub min_y: i64,
    pub max_x: i64,
    pub max_y: i64,
}

impl TileBounds {
    /// Smallest box holding every point, or `None` for no points.
    pub fn enclosing(points: impl IntoIterator<Item = (i64, i64)>) -> Option<Self> {
        points.into_iter().fold(None, |bounds, (x, y)| {
            Some(match bounds {
                None => Self {
                    min_x: x,
                    min_y: y,
                    max_x: x,
                    max_y: y,
                },
                Some(b) => Self {
                    min_x: b.min_x.min(x),
                    min_y: b.min_y.min(y),
                    max_x: b.max_x.max(x),
                    max_y: b.max_y.max(y),
                },
            })
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SparseMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tile_size: Option<f64>,
    /// Material of every unlisted tile; the target's palette default if absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_material: Option<Material>,
    /// Longest world side in tiles.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_map_size: Option<u32>,
    /// Written as `null` when no tile is listed.
    #[serde(default)]
    pub bounds: Option<TileBounds>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SparseTile {
    pub x: i64,
    pub y: i64,
    pub material: Material,
}

/// Sparse terrain document: only tiles that differ from the default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SparseTerrain {
    pub version: String,
    pub metadata: SparseMetadata,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tile_count: Option<usize>,
    pub tiles: Vec<SparseTile>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DenseMetadata {
    pub version: String,
    pub grid_size_x: u32,
    pub grid_size_y: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chunk_size: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tile_size: Option<f64>,
}

/// One dense entry: a bare material name or a material with an explicit weight.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DenseTile {
    Name(Material),
    Weighted { material: Material, weight: f32 },
}

impl DenseTile {
    #[must_use]
    pub const fn material(&self) -> Material {
        match *self {
            DenseTile::Name(material) | DenseTile::Weighted { material, .. } => material,
        }
    }
}

/// Dense terrain document: every tile, chunk by chunk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DenseTerrain {
    pub metadata: DenseMetadata,
    pub tiles: Vec<DenseTile>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentFormat {
    Sparse,
    Dense,
}

/// Result of [`validate_import`]; `valid` is true exactly when `errors` is empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub valid: bool,
    pub errors: Vec<String>,
}

/// A parsed terrain document of either shape.
#[derive(Debug, Clone, PartialEq)]
pub enum TerrainDocument {
    Sparse(SparseTerrain),
    Dense(DenseTerrain),
}

impl TerrainDocument {
    /// Validate `value`, then deserialize it into the detected shape.
    pub fn parse(value: &Value) -> Result<Self, ImportError> {
        let report = validate_import(value);
        if !report.valid {
            return Err(ImportError::InvalidFormat(report.errors));
        }
        if detect_sparse_format(value) {
            Ok(Self::Sparse(SparseTerrain::deserialize(value)?))
        } else {
            Ok(Self::Dense(DenseTerrain::deserialize(value)?))
        }
    }

    #[must_use]
    pub const fn format(&self) -> DocumentFormat {
        match self {
            TerrainDocument::Sparse(_) => DocumentFormat::Sparse,
            TerrainDocument::Dense(_) => DocumentFormat::Dense,
        }
    }
}

/// Sparse documents carry a top-level `version`; dense ones keep it in
/// `metadata`. A `null` version counts as absent.
#[must_use]
pub fn detect_sparse_format(value: &Value) -> bool {
    value.get("version").is_some_and(|version| !version.is_null())
}

/// Structural checks for either format. Never fails; problems are listed in the report.
#[must_use]
pub fn validate_import(value: &Value) -> ValidationReport {
    let mut errors = Vec::new();
    let metadata = value.get("metadata").and_then(Value::as_object);

    if detect_sparse_format(value) {
        if metadata.is_none() {
            errors.push("Missing metadata".to_owned());
        }
    } else {
        match metadata {
            None => errors.push("Missing metadata".to_owned()),
            Some(metadata) => {
                if !metadata.contains_key("version") {
                    errors.push("Missing version".to_owned());
                }
                for key in ["gridSizeX", "gridSizeY"] {
                    let positive = metadata
                        .get(key)
                        .and_then(Value::as_u64)
                        .is_some_and(|size| size > 0 && size <= u64::from(u32::MAX));
                    if !positive {
                        errors.push(format!("Invalid {key}"));
                    }
                }
            }
        }
    }

    if !value.get("tiles").is_some_and(Value::is_array) {
        errors.push("Missing tiles array".to_owned());
    }

    ValidationReport {
        valid: errors.is_empty(),
        errors,
    }
}
