use proptest::prelude::*;
use tilescape_render::{CoordinateConverter, ViewConfig};

const VIEWPORT: (f64, f64) = (800.0, 600.0);

fn approx_eq(a: f64, b: f64, epsilon: f64) -> bool {
    (a - b).abs() <= epsilon
}

#[test]
fn scenario_tile_maps_to_expected_pixel() {
    let converter = CoordinateConverter::new(VIEWPORT, 32.0).expect("converter");
    let canvas = converter.to_canvas((5.0, 0.0));
    assert!(approx_eq(canvas.0, 560.0, 1e-9), "expected x≈560, got {}", canvas.0);
    assert!(approx_eq(canvas.1, 300.0, 1e-9), "expected y≈300, got {}", canvas.1);

    let world = converter.to_world((560.0, 300.0));
    assert!(approx_eq(world.0, 5.0, 1e-9), "expected x≈5, got {}", world.0);
    assert!(approx_eq(world.1, 0.0, 1e-9), "expected y≈0, got {}", world.1);
}

#[test]
fn canvas_corners_match_view_span() {
    let mut converter = CoordinateConverter::new(VIEWPORT, 24.0).expect("converter");
    converter.set_center_pos((40.0, -12.0)).expect("center");
    let span = converter.view_span();
    let top_left = converter.to_canvas(span.top_left);
    let bottom_right = converter.to_canvas(span.bottom_right);
    assert!(approx_eq(top_left.0, 0.0, 1e-6) && approx_eq(top_left.1, 0.0, 1e-6));
    assert!(approx_eq(bottom_right.0, VIEWPORT.0, 1e-6));
    assert!(approx_eq(bottom_right.1, VIEWPORT.1, 1e-6));
}

#[test]
fn world_y_points_up_on_canvas() {
    let converter = CoordinateConverter::new(VIEWPORT, 32.0).expect("converter");
    let lower = converter.to_canvas((0.0, 0.0));
    let higher = converter.to_canvas((0.0, 1.0));
    assert!(higher.1 < lower.1, "higher world Y should be drawn closer to the top");
}

proptest! {
    #[test]
    fn screen_world_round_trip(
        tx in -5_000i32..5_000,
        ty in -5_000i32..5_000,
        cam_x in -2_000.0f64..2_000.0,
        cam_y in -2_000.0f64..2_000.0,
        width in 64.0f64..4_096.0,
        height in 64.0f64..4_096.0,
        tile_size in 4.0f64..128.0,
        zoom in 0.25f64..4.0,
    ) {
        let mut converter = CoordinateConverter::with_config(
            ViewConfig::default(),
            (width, height),
            tile_size,
        ).expect("converter");
        converter.set_center_pos((cam_x, cam_y)).expect("center");
        converter.set_zoom(zoom).expect("zoom");

        let tile = (f64::from(tx), f64::from(ty));
        let screen = converter.to_canvas(tile);
        let recovered = converter.to_world(screen);
        prop_assert!(approx_eq(recovered.0, tile.0, 0.01), "x: {} vs {}", recovered.0, tile.0);
        prop_assert!(approx_eq(recovered.1, tile.1, 0.01), "y: {} vs {}", recovered.1, tile.1);

        let again = converter.to_canvas(recovered);
        prop_assert!(approx_eq(again.0, screen.0, 0.01));
        prop_assert!(approx_eq(again.1, screen.1, 0.01));
    }

    #[test]
    fn update_id_strictly_increases(steps in proptest::collection::vec(0u8..4, 1..32)) {
        let mut converter = CoordinateConverter::new(VIEWPORT, 32.0).expect("converter");
        let mut last = converter.update_id();
        for step in steps {
            match step {
                0 => converter.set_center_pos((1.5, -2.0)).expect("center"),
                1 => converter.set_canvas_size((640.0, 480.0)).expect("canvas"),
                2 => converter.set_tile_size(20.0).expect("tile size"),
                _ => converter.align_to_canvas(),
            }
            prop_assert!(converter.update_id() > last);
            last = converter.update_id();
        }
    }
}
