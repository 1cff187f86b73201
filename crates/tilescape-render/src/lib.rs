//! Viewport math for Tilescape: mapping world-tile positions to canvas pixels.
//!
//! Nothing in this crate draws; it only owns the camera state that drawing
//! layers and picking code read from.

mod camera;

pub use camera::{ConverterSnapshot, CoordinateConverter, ViewConfig, ViewError, ViewSpan};
