use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// Errors raised when a camera parameter cannot be applied.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ViewError {
    /// A size, zoom, or position that is non-finite or out of range.
    #[error("invalid view parameter: {0}")]
    InvalidParameter(&'static str),
}

/// Static limits applied to interactive camera changes.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ViewConfig {
    pub min_zoom: f64,
    pub max_zoom: f64,
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            min_zoom: 0.25,
            max_zoom: 4.0,
        }
    }
}

impl ViewConfig {
    /// Validates zoom bounds.
    pub fn validate(&self) -> Result<(), ViewError> {
        if !self.min_zoom.is_finite() || !self.max_zoom.is_finite() || self.min_zoom <= 0.0 {
            return Err(ViewError::InvalidParameter("zoom bounds must be finite and positive"));
        }
        if self.min_zoom > self.max_zoom {
            return Err(ViewError::InvalidParameter("min_zoom cannot exceed max_zoom"));
        }
        Ok(())
    }
}

/// World-space rectangle currently covered by the canvas.
///
/// `top_left` has the larger Y because world Y grows upwards.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ViewSpan {
    pub top_left: (f64, f64),
    pub bottom_right: (f64, f64),
}

impl ViewSpan {
    /// Whether a world position lies inside the span (edges included).
    #[must_use]
    pub fn contains(&self, point: (f64, f64)) -> bool {
        point.0 >= self.top_left.0
            && point.0 <= self.bottom_right.0
            && point.1 <= self.top_left.1
            && point.1 >= self.bottom_right.1
    }
}

#[derive(Clone, Debug)]
struct ConverterState {
    cam_position: (f64, f64),
    canvas_size: (f64, f64),
    tile_size: f64,
    zoom: f64,
    canvas_center: (f64, f64),
    view_span: ViewSpan,
    update_id: u64,
}

/// Serializable copy of the converter state, for diagnostics and tests.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ConverterSnapshot {
    pub cam_position: (f64, f64),
    pub canvas_size: (f64, f64),
    pub tile_size: f64,
    pub zoom: f64,
    pub canvas_center: (f64, f64),
    pub view_span: ViewSpan,
    pub update_id: u64,
}

/// Camera/viewport transform between world-tile space and canvas pixels.
///
/// World Y increases upwards while canvas Y increases downwards. Every
/// mutator recomputes the derived fields and bumps `update_id`, which
/// dependent caches compare against to detect staleness.
#[derive(Clone, Debug)]
pub struct CoordinateConverter {
    config: ViewConfig,
    state: ConverterState,
}

impl CoordinateConverter {
    /// Build a converter centred on the world origin.
    pub fn new(canvas_size: (f64, f64), tile_size: f64) -> Result<Self, ViewError> {
        Self::with_config(ViewConfig::default(), canvas_size, tile_size)
    }

    pub fn with_config(
        config: ViewConfig,
        canvas_size: (f64, f64),
        tile_size: f64,
    ) -> Result<Self, ViewError> {
        config.validate()?;
        check_canvas_size(canvas_size)?;
        check_tile_size(tile_size)?;
        let mut converter = Self {
            config,
            state: ConverterState {
                cam_position: (0.0, 0.0),
                canvas_size,
                tile_size,
                zoom: 1.0,
                canvas_center: (0.0, 0.0),
                view_span: ViewSpan::default(),
                update_id: 0,
            },
        };
        converter.refresh();
        Ok(converter)
    }

    #[inline]
    #[must_use]
    pub fn cam_position(&self) -> (f64, f64) {
        self.state.cam_position
    }

    #[inline]
    #[must_use]
    pub fn canvas_size(&self) -> (f64, f64) {
        self.state.canvas_size
    }

    #[inline]
    #[must_use]
    pub fn canvas_center(&self) -> (f64, f64) {
        self.state.canvas_center
    }

    #[inline]
    #[must_use]
    pub fn tile_size(&self) -> f64 {
        self.state.tile_size
    }

    #[inline]
    #[must_use]
    pub fn zoom(&self) -> f64 {
        self.state.zoom
    }

    #[inline]
    #[must_use]
    pub fn view_span(&self) -> ViewSpan {
        self.state.view_span
    }

    /// Monotonic counter incremented by every mutator.
    #[inline]
    #[must_use]
    pub fn update_id(&self) -> u64 {
        self.state.update_id
    }

    /// On-screen edge length of one tile.
    #[inline]
    #[must_use]
    pub fn pixels_per_tile(&self) -> f64 {
        self.state.tile_size * self.state.zoom
    }

    #[must_use]
    pub fn config(&self) -> ViewConfig {
        self.config
    }

    /// Map a world-tile position to canvas pixels.
    #[must_use]
    pub fn to_canvas(&self, pos: (f64, f64)) -> (f64, f64) {
        let scale = self.pixels_per_tile();
        let center = self.state.canvas_center;
        let cam = self.state.cam_position;
        (
            center.0 + (pos.0 - cam.0) * scale,
            center.1 - (pos.1 - cam.1) * scale,
        )
    }

    /// Map canvas pixels back to a world-tile position; inverse of [`Self::to_canvas`].
    #[must_use]
    pub fn to_world(&self, canvas: (f64, f64)) -> (f64, f64) {
        let scale = self.pixels_per_tile();
        let center = self.state.canvas_center;
        let cam = self.state.cam_position;
        (
            cam.0 + (canvas.0 - center.0) / scale,
            cam.1 - (canvas.1 - center.1) / scale,
        )
    }

    /// Move the camera so that `pos` sits at the canvas center.
    pub fn set_center_pos(&mut self, pos: (f64, f64)) -> Result<(), ViewError> {
        if !pos.0.is_finite() || !pos.1.is_finite() {
            return Err(ViewError::InvalidParameter("camera position must be finite"));
        }
        self.state.cam_position = pos;
        self.refresh();
        Ok(())
    }

    pub fn set_canvas_size(&mut self, size: (f64, f64)) -> Result<(), ViewError> {
        check_canvas_size(size)?;
        self.state.canvas_size = size;
        self.refresh();
        Ok(())
    }

    pub fn set_tile_size(&mut self, tile_size: f64) -> Result<(), ViewError> {
        check_tile_size(tile_size)?;
        self.state.tile_size = tile_size;
        self.refresh();
        Ok(())
    }

    /// Set the zoom factor, clamped to the configured `[min_zoom, max_zoom]`.
    pub fn set_zoom(&mut self, zoom: f64) -> Result<(), ViewError> {
        if !zoom.is_finite() || zoom <= 0.0 {
            return Err(ViewError::InvalidParameter("zoom must be finite and positive"));
        }
        self.state.zoom = zoom.clamp(self.config.min_zoom, self.config.max_zoom);
        self.refresh();
        Ok(())
    }

    /// Shift the camera by a canvas-space drag of `delta` pixels.
    pub fn pan_by(&mut self, delta: (f64, f64)) -> Result<(), ViewError> {
        let scale = self.pixels_per_tile();
        let cam = self.state.cam_position;
        self.set_center_pos((cam.0 - delta.0 / scale, cam.1 + delta.1 / scale))
    }

    /// Zoom by `factor` while keeping the world point under `anchor` fixed on screen.
    pub fn zoom_at(&mut self, anchor: (f64, f64), factor: f64) -> Result<(), ViewError> {
        if !factor.is_finite() || factor <= 0.0 {
            return Err(ViewError::InvalidParameter("zoom factor must be finite and positive"));
        }
        if !anchor.0.is_finite() || !anchor.1.is_finite() {
            return Err(ViewError::InvalidParameter("zoom anchor must be finite"));
        }
        let world = self.to_world(anchor);
        let zoom = (self.state.zoom * factor).clamp(self.config.min_zoom, self.config.max_zoom);
        let scale = self.state.tile_size * zoom;
        let center = self.state.canvas_center;
        self.state.zoom = zoom;
        self.state.cam_position = (
            world.0 - (anchor.0 - center.0) / scale,
            world.1 + (anchor.1 - center.1) / scale,
        );
        self.refresh();
        Ok(())
    }

    /// Nudge the camera so the world origin falls on a whole pixel.
    ///
    /// Chunk edges are multiples of the tile size away from the origin, so
    /// this keeps them on pixel boundaries while the zoom is integral.
    pub fn align_to_canvas(&mut self) {
        let origin = self.to_canvas((0.0, 0.0));
        let snapped = (origin.0.round(), origin.1.round());
        let scale = self.pixels_per_tile();
        let center = self.state.canvas_center;
        self.state.cam_position = (
            (center.0 - snapped.0) / scale,
            (snapped.1 - center.1) / scale,
        );
        self.refresh();
        debug!(
            cam_x = self.state.cam_position.0,
            cam_y = self.state.cam_position.1,
            update_id = self.state.update_id,
            "aligned world origin to canvas pixel grid",
        );
    }

    /// Inclusive integer tile bounds `(min_x, min_y, max_x, max_y)` touched by the view.
    #[must_use]
    pub fn visible_tile_range(&self) -> (i64, i64, i64, i64) {
        let span = self.state.view_span;
        (
            span.top_left.0.floor() as i64,
            span.bottom_right.1.floor() as i64,
            span.bottom_right.0.floor() as i64,
            span.top_left.1.floor() as i64,
        )
    }

    #[must_use]
    pub fn snapshot(&self) -> ConverterSnapshot {
        ConverterSnapshot {
            cam_position: self.state.cam_position,
            canvas_size: self.state.canvas_size,
            tile_size: self.state.tile_size,
            zoom: self.state.zoom,
            canvas_center: self.state.canvas_center,
            view_span: self.state.view_span,
            update_id: self.state.update_id,
        }
    }

    fn refresh(&mut self) {
        self.state.canvas_center = (
            self.state.canvas_size.0 * 0.5,
            self.state.canvas_size.1 * 0.5,
        );
        self.state.view_span = ViewSpan {
            top_left: self.to_world((0.0, 0.0)),
            bottom_right: self.to_world(self.state.canvas_size),
        };
        self.state.update_id += 1;
    }
}

fn check_canvas_size(size: (f64, f64)) -> Result<(), ViewError> {
    if !size.0.is_finite() || !size.1.is_finite() || size.0 <= 0.0 || size.1 <= 0.0 {
        return Err(ViewError::InvalidParameter("canvas size must be finite and positive"));
    }
    Ok(())
}

fn check_tile_size(tile_size: f64) -> Result<(), ViewError> {
    if !tile_size.is_finite() || tile_size <= 0.0 {
        return Err(ViewError::InvalidParameter("tile size must be finite and positive"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const CANVAS: (f64, f64) = (800.0, 600.0);

    fn approx_eq(a: f64, b: f64, eps: f64) -> bool {
        (a - b).abs() <= eps
    }

    fn default_converter() -> CoordinateConverter {
        CoordinateConverter::new(CANVAS, 32.0).expect("converter")
    }

    #[test]
    fn origin_camera_maps_tiles_around_canvas_center() {
        let converter = default_converter();
        assert_eq!(converter.canvas_center(), (400.0, 300.0));
        assert_eq!(converter.to_canvas((5.0, 0.0)), (560.0, 300.0));
        assert_eq!(converter.to_canvas((0.0, 2.0)), (400.0, 236.0));
        assert_eq!(converter.to_world((560.0, 300.0)), (5.0, 0.0));
    }

    #[test]
    fn every_mutator_bumps_update_id() {
        let mut converter = default_converter();
        let mut last = converter.update_id();
        converter.set_center_pos((3.0, -2.0)).expect("center");
        assert!(converter.update_id() > last);
        last = converter.update_id();
        converter.set_canvas_size((1024.0, 768.0)).expect("canvas");
        assert!(converter.update_id() > last);
        last = converter.update_id();
        converter.set_tile_size(16.0).expect("tile size");
        assert!(converter.update_id() > last);
        last = converter.update_id();
        converter.set_zoom(2.0).expect("zoom");
        assert!(converter.update_id() > last);
        last = converter.update_id();
        converter.align_to_canvas();
        assert!(converter.update_id() > last);
    }

    #[test]
    fn rejected_parameters_leave_state_untouched() {
        let mut converter = default_converter();
        let before = converter.snapshot();
        assert!(converter.set_tile_size(0.0).is_err());
        assert!(converter.set_canvas_size((f64::NAN, 10.0)).is_err());
        assert!(converter.set_zoom(-1.0).is_err());
        assert!(converter.set_center_pos((f64::INFINITY, 0.0)).is_err());
        assert_eq!(converter.snapshot(), before);
    }

    #[test]
    fn view_span_tracks_camera_and_zoom() {
        let mut converter = default_converter();
        let span = converter.view_span();
        assert!(approx_eq(span.top_left.0, -12.5, 1e-9));
        assert!(approx_eq(span.top_left.1, 9.375, 1e-9));
        assert!(approx_eq(span.bottom_right.0, 12.5, 1e-9));
        assert!(approx_eq(span.bottom_right.1, -9.375, 1e-9));

        converter.set_zoom(2.0).expect("zoom");
        let zoomed = converter.view_span();
        assert!(approx_eq(zoomed.bottom_right.0, 6.25, 1e-9));
        assert!(zoomed.contains((0.0, 0.0)));
        assert!(!zoomed.contains((7.0, 0.0)));
    }

    #[test]
    fn zoom_is_clamped_to_config_bounds() {
        let mut converter = default_converter();
        converter.set_zoom(100.0).expect("zoom");
        assert_eq!(converter.zoom(), ViewConfig::default().max_zoom);
        converter.set_zoom(0.001).expect("zoom");
        assert_eq!(converter.zoom(), ViewConfig::default().min_zoom);
    }

    #[test]
    fn zoom_at_keeps_anchor_fixed() {
        let mut converter = default_converter();
        converter.set_center_pos((2.5, 1.0)).expect("center");
        let anchor = (123.0, 456.0);
        let before = converter.to_world(anchor);
        converter.zoom_at(anchor, 1.5).expect("zoom_at");
        let after = converter.to_world(anchor);
        assert!(approx_eq(before.0, after.0, 1e-9));
        assert!(approx_eq(before.1, after.1, 1e-9));
        assert!(approx_eq(converter.zoom(), 1.5, 1e-12));
    }

    #[test]
    fn pan_moves_world_with_the_cursor() {
        let mut converter = default_converter();
        let grabbed = converter.to_world((400.0, 300.0));
        converter.pan_by((64.0, -32.0)).expect("pan");
        let moved = converter.to_canvas(grabbed);
        assert!(approx_eq(moved.0, 464.0, 1e-9));
        assert!(approx_eq(moved.1, 268.0, 1e-9));
    }

    #[test]
    fn align_to_canvas_snaps_origin_to_whole_pixels() {
        let mut converter = CoordinateConverter::new((801.0, 601.0), 32.0).expect("converter");
        converter.set_center_pos((0.013, -0.27)).expect("center");
        converter.align_to_canvas();
        let origin = converter.to_canvas((0.0, 0.0));
        assert!(approx_eq(origin.0, origin.0.round(), 1e-9), "x = {}", origin.0);
        assert!(approx_eq(origin.1, origin.1.round(), 1e-9), "y = {}", origin.1);
    }

    #[test]
    fn visible_tile_range_covers_span() {
        let converter = default_converter();
        assert_eq!(converter.visible_tile_range(), (-13, -10, 12, 9));
    }
}
