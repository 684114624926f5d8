use image_cropper::geometry::{
    DisplayRect, ImageGeometry, NativeRect, Size, clamp_display, clamp_native, display_to_native,
};
use proptest::prelude::*;

const EPSILON: f64 = 1e-6;

fn geometry_strategy() -> impl Strategy<Value = ImageGeometry> {
    (1u32..=8000, 1u32..=8000, 1.0f64..=4000.0, 1.0f64..=4000.0).prop_map(|(nw, nh, dw, dh)| {
        ImageGeometry::new(Size::from_pixels(nw, nh), Size::new(dw, dh))
    })
}

/// 百分比选区：分量落在 [0, 100] 且不越过右/下边界。
fn percent_rect_strategy() -> impl Strategy<Value = DisplayRect> {
    (0.0f64..=100.0, 0.0f64..=100.0, 0.0f64..=1.0, 0.0f64..=1.0).prop_map(|(x, y, fw, fh)| {
        DisplayRect::percent(x, y, (100.0 - x) * fw, (100.0 - y) * fh)
    })
}

fn inside(rect: &NativeRect, bounds: Size) -> bool {
    rect.x >= 0.0
        && rect.y >= 0.0
        && rect.width >= 0.0
        && rect.height >= 0.0
        && rect.right() <= bounds.width + EPSILON
        && rect.bottom() <= bounds.height + EPSILON
}

proptest! {
    #[test]
    fn percent_rects_map_inside_natural_bounds(
        geometry in geometry_strategy(),
        rect in percent_rect_strategy(),
    ) {
        let native = display_to_native(&rect, &geometry).expect("geometry is ready");

        prop_assert!(inside(&native, geometry.natural));
    }

    #[test]
    fn any_rect_maps_inside_natural_bounds(
        geometry in geometry_strategy(),
        x in -5000.0f64..5000.0,
        y in -5000.0f64..5000.0,
        w in -100.0f64..10000.0,
        h in -100.0f64..10000.0,
    ) {
        let native = display_to_native(&DisplayRect::pixel(x, y, w, h), &geometry)
            .expect("geometry is ready");

        prop_assert!(inside(&native, geometry.natural));
    }

    #[test]
    fn clamp_native_is_contained_and_idempotent(
        x in -1.0e5f64..1.0e5,
        y in -1.0e5f64..1.0e5,
        w in -1.0e5f64..1.0e5,
        h in -1.0e5f64..1.0e5,
        bw in 0u32..10000,
        bh in 0u32..10000,
    ) {
        let bounds = Size::from_pixels(bw, bh);

        let once = clamp_native(&NativeRect::new(x, y, w, h), bounds);
        let twice = clamp_native(&once, bounds);

        prop_assert!(inside(&once, bounds));
        prop_assert!((once.x - twice.x).abs() <= EPSILON);
        prop_assert!((once.y - twice.y).abs() <= EPSILON);
        prop_assert!((once.width - twice.width).abs() <= EPSILON);
        prop_assert!((once.height - twice.height).abs() <= EPSILON);
    }

    #[test]
    fn pixel_bounds_never_exceed_integer_bounds(
        x in -1.0e4f64..1.0e4,
        y in -1.0e4f64..1.0e4,
        w in 0.0f64..1.0e4,
        h in 0.0f64..1.0e4,
        bw in 1u32..5000,
        bh in 1u32..5000,
    ) {
        let clamped = clamp_native(&NativeRect::new(x, y, w, h), Size::from_pixels(bw, bh));
        let bounds = clamped.to_pixel_bounds();

        prop_assert!(u64::from(bounds.x) + u64::from(bounds.width) <= u64::from(bw));
        prop_assert!(u64::from(bounds.y) + u64::from(bounds.height) <= u64::from(bh));
    }

    #[test]
    fn clamped_display_rects_stay_in_percent_range(
        x in -200.0f64..200.0,
        y in -200.0f64..200.0,
        w in -50.0f64..300.0,
        h in -50.0f64..300.0,
    ) {
        let clamped = clamp_display(&DisplayRect::percent(x, y, w, h), Size::new(640.0, 480.0));

        prop_assert!(clamped.x >= 0.0 && clamped.y >= 0.0);
        prop_assert!(clamped.x + clamped.width <= 100.0 + EPSILON);
        prop_assert!(clamped.y + clamped.height <= 100.0 + EPSILON);
    }
}

#[test]
fn documented_scale_case() {
    let geometry = ImageGeometry::new(Size::new(2000.0, 1000.0), Size::new(1000.0, 500.0));

    let native = display_to_native(&DisplayRect::percent(25.0, 25.0, 50.0, 50.0), &geometry)
        .expect("geometry is ready");

    assert_eq!(native, NativeRect::new(500.0, 250.0, 1000.0, 500.0));
}
