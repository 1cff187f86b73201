//! JSON import and export for Tilescape terrain.
//!
//! Two document shapes are understood. The sparse format lists only tiles
//! that differ from a default material, keyed by relative coordinates; the
//! dense format enumerates every tile in chunk order. Both are read from and
//! written to `serde_json` values or strings; nothing here touches the
//! filesystem.

use thiserror::Error;
use tilescape_core::TerrainError;

mod export;
mod format;
mod import;

pub use export::{export_dense, export_sparse, to_string_pretty, to_value};
pub use format::{
    DENSE_VERSION, DenseMetadata, DenseTerrain, DenseTile, DocumentFormat, SPARSE_VERSION,
    SparseMetadata, SparseTerrain, SparseTile, TerrainDocument, TileBounds, ValidationReport,
    detect_sparse_format, validate_import,
};
pub use import::{ImportReport, TerrainTarget, import_from_json, import_from_str};

/// Errors raised while importing a terrain document.
#[derive(Debug, Error)]
pub enum ImportError {
    /// The document failed structural validation.
    #[error("invalid terrain document: {}", .0.join("; "))]
    InvalidFormat(Vec<String>),
    /// The target cannot perform the requested kind of import.
    #[error("unsupported operation: {0}")]
    UnsupportedOperation(&'static str),
    /// The document's shape does not match the target terrain.
    #[error("{field} mismatch: terrain has {expected}, document has {found}")]
    DimensionMismatch {
        field: &'static str,
        expected: u32,
        found: u32,
    },
    #[error("malformed terrain JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Terrain(#[from] TerrainError),
}
