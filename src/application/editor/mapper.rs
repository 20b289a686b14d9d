// SPDX-License-Identifier: MPL-2.0
//! Coordinate and selection mapping.
//!
//! Converts pointer input from screen space into canvas space, builds
//! selection rectangles from drag gestures, and turns a selection into the
//! percentage-based region hint that generation providers understand.

use crate::domain::geometry::{
    CanvasPoint, CanvasSize, DisplayRect, LayerBounds, PixelRegion, RelativeRegion, ScreenPoint,
    SelectionRect,
};
use crate::domain::{Bitmap, Layer, LayerId};

// =============================================================================
// Screen -> canvas
// =============================================================================

/// Ratio between canvas pixels and display pixels on each axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScaleFactor {
    pub x: f32,
    pub y: f32,
}

impl ScaleFactor {
    pub const IDENTITY: Self = Self { x: 1.0, y: 1.0 };

    /// Factor that maps `display` onto `canvas`.
    ///
    /// A degenerate display rectangle maps with identity scale.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn between(display: DisplayRect, canvas: CanvasSize) -> Self {
        let axis = |canvas_len: u32, display_len: f32| {
            if display_len.is_finite() && display_len > 0.0 {
                canvas_len as f32 / display_len
            } else {
                1.0
            }
        };
        Self {
            x: axis(canvas.width, display.width),
            y: axis(canvas.height, display.height),
        }
    }
}

impl Default for ScaleFactor {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Maps a pointer position into canvas space without clamping.
///
/// Used by the move tool, where the pointer may leave the canvas.
#[must_use]
pub fn screen_to_canvas_unclamped(
    pointer: ScreenPoint,
    display: DisplayRect,
    scale: ScaleFactor,
) -> CanvasPoint {
    CanvasPoint::new(
        (pointer.x - display.left) * scale.x,
        (pointer.y - display.top) * scale.y,
    )
}

/// Maps a pointer position into canvas space, clamped to
/// `[0, width] x [0, height]`.
#[must_use]
pub fn screen_to_canvas(
    pointer: ScreenPoint,
    display: DisplayRect,
    scale: ScaleFactor,
    canvas: CanvasSize,
) -> CanvasPoint {
    canvas.clamp(screen_to_canvas_unclamped(pointer, display, scale))
}

// =============================================================================
// Selection
// =============================================================================

/// Selection spanned by a drag from `start` to `current`, both clamped to the
/// canvas first. Works for drags in every direction.
#[must_use]
pub fn update_selection(start: CanvasPoint, current: CanvasPoint, canvas: CanvasSize) -> SelectionRect {
    SelectionRect::from_corners(canvas.clamp(start), canvas.clamp(current))
}

/// Percentage-relative region of `selection` within `bounds`.
///
/// Each component is `round(100 * (value - origin) / dimension)`. A zero-sized
/// layer yields [`RelativeRegion::FULL`].
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
pub fn to_relative_region(selection: &SelectionRect, bounds: &LayerBounds) -> RelativeRegion {
    if bounds.width == 0 || bounds.height == 0 {
        return RelativeRegion::FULL;
    }
    let w = bounds.width as f32;
    let h = bounds.height as f32;
    let pct = |value: f32, dim: f32| (100.0 * value / dim).round() as i32;

    RelativeRegion {
        x: pct(selection.x - bounds.x, w),
        y: pct(selection.y - bounds.y, h),
        width: pct(selection.width, w),
        height: pct(selection.height, h),
    }
}

/// Region hint for a request, or `None` when the selection is absent or too
/// small to count. A `None` means "operate on the whole image".
#[must_use]
pub fn region_hint(selection: Option<&SelectionRect>, bounds: &LayerBounds) -> Option<RelativeRegion> {
    selection
        .filter(|sel| sel.is_meaningful())
        .map(|sel| to_relative_region(sel, bounds))
}

/// Pixel rectangle of `selection` inside the layer's own bitmap.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn selection_to_layer_region(selection: &SelectionRect, layer: &Layer) -> PixelRegion {
    let origin = layer.position();
    PixelRegion::new(
        (selection.x - origin.x).round() as i64,
        (selection.y - origin.y).round() as i64,
        selection.width.round().max(0.0) as u32,
        selection.height.round().max(0.0) as u32,
    )
}

/// Draws `region` of `source` into a fresh bitmap of exactly the region's
/// size. The source is left untouched.
#[must_use]
pub fn crop_to_canvas(source: &Bitmap, region: PixelRegion) -> Bitmap {
    source.crop(region)
}

// =============================================================================
// Gestures
// =============================================================================

/// In-progress rectangle selection drag.
#[derive(Debug, Clone, Default)]
pub struct SelectionGesture {
    anchor: Option<CanvasPoint>,
}

impl SelectionGesture {
    /// Starts a drag. Returns the initial zero-sized selection.
    pub fn start(&mut self, point: CanvasPoint, canvas: CanvasSize) -> SelectionRect {
        let anchor = canvas.clamp(point);
        self.anchor = Some(anchor);
        SelectionRect::from_corners(anchor, anchor)
    }

    /// Updates the drag. Returns `None` when no drag is active.
    #[must_use]
    pub fn update(&self, point: CanvasPoint, canvas: CanvasSize) -> Option<SelectionRect> {
        self.anchor.map(|anchor| update_selection(anchor, point, canvas))
    }

    pub fn finish(&mut self) {
        self.anchor = None;
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.anchor.is_some()
    }
}

/// In-progress layer move.
///
/// Keeps the grab point fixed relative to the layer: the offset between
/// pointer and layer origin is captured on press and preserved while moving.
/// Resulting positions are not clamped.
#[derive(Debug, Clone, Default)]
pub struct LayerDrag {
    target: Option<(LayerId, CanvasPoint)>,
}

impl LayerDrag {
    pub fn start(&mut self, layer: &Layer, pointer: CanvasPoint) {
        let origin = layer.position();
        let offset = CanvasPoint::new(pointer.x - origin.x, pointer.y - origin.y);
        self.target = Some((layer.id(), offset));
    }

    /// New position for the dragged layer, or `None` when idle.
    #[must_use]
    pub fn update(&self, pointer: CanvasPoint) -> Option<(LayerId, CanvasPoint)> {
        self.target.map(|(id, offset)| {
            (
                id,
                CanvasPoint::new(pointer.x - offset.x, pointer.y - offset.y),
            )
        })
    }

    pub fn stop(&mut self) {
        self.target = None;
    }

    #[must_use]
    pub fn is_dragging(&self) -> bool {
        self.target.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::assert_abs_diff_eq;

    const CANVAS: CanvasSize = CanvasSize::new(800, 600);

    #[test]
    fn screen_to_canvas_applies_offset_and_scale() {
        let display = DisplayRect::new(100.0, 50.0, 400.0, 300.0);
        let scale = ScaleFactor::between(display, CANVAS);
        assert_abs_diff_eq!(scale.x, 2.0);

        let point = screen_to_canvas(ScreenPoint::new(300.0, 200.0), display, scale, CANVAS);
        assert_abs_diff_eq!(point.x, 400.0);
        assert_abs_diff_eq!(point.y, 300.0);
    }

    #[test]
    fn screen_to_canvas_clamps_outside_pointer() {
        let display = DisplayRect::new(0.0, 0.0, 800.0, 600.0);
        let point = screen_to_canvas(
            ScreenPoint::new(-20.0, 9000.0),
            display,
            ScaleFactor::IDENTITY,
            CANVAS,
        );
        assert_eq!(point, CanvasPoint::new(0.0, 600.0));
    }

    #[test]
    fn degenerate_display_uses_identity_scale() {
        let scale = ScaleFactor::between(DisplayRect::new(0.0, 0.0, 0.0, f32::NAN), CANVAS);
        assert_eq!(scale, ScaleFactor::IDENTITY);
    }

    #[test]
    fn update_selection_handles_every_drag_direction() {
        let anchor = CanvasPoint::new(100.0, 100.0);
        for (dx, dy) in [(50.0, 30.0), (-50.0, 30.0), (50.0, -30.0), (-50.0, -30.0)] {
            let sel = update_selection(anchor, CanvasPoint::new(100.0 + dx, 100.0 + dy), CANVAS);
            assert_abs_diff_eq!(sel.width, 50.0);
            assert_abs_diff_eq!(sel.height, 30.0);
            assert!(sel.x >= 0.0 && sel.y >= 0.0);
        }
    }

    #[test]
    fn update_selection_clamps_to_canvas() {
        let sel = update_selection(
            CanvasPoint::new(700.0, 500.0),
            CanvasPoint::new(1000.0, 1000.0),
            CANVAS,
        );
        assert_eq!(sel, SelectionRect::new(700.0, 500.0, 100.0, 100.0));
    }

    #[test]
    fn full_cover_selection_is_full_region() {
        let bounds = LayerBounds {
            x: 50.0,
            y: 20.0,
            width: 400,
            height: 300,
        };
        let sel = SelectionRect::new(50.0, 20.0, 400.0, 300.0);
        assert_eq!(to_relative_region(&sel, &bounds), RelativeRegion::FULL);
    }

    #[test]
    fn relative_region_rounds_percentages() {
        let bounds = LayerBounds {
            x: 0.0,
            y: 0.0,
            width: 300,
            height: 300,
        };
        let sel = SelectionRect::new(100.0, 50.0, 100.0, 200.0);
        assert_eq!(
            to_relative_region(&sel, &bounds),
            RelativeRegion {
                x: 33,
                y: 17,
                width: 33,
                height: 67
            }
        );
    }

    #[test]
    fn zero_sized_layer_maps_to_full_region() {
        let bounds = LayerBounds::default();
        let sel = SelectionRect::new(1.0, 1.0, 10.0, 10.0);
        assert_eq!(to_relative_region(&sel, &bounds), RelativeRegion::FULL);
    }

    #[test]
    fn tiny_selection_yields_no_hint() {
        let bounds = LayerBounds {
            x: 0.0,
            y: 0.0,
            width: 100,
            height: 100,
        };
        assert!(region_hint(Some(&SelectionRect::new(10.0, 10.0, 4.0, 80.0)), &bounds).is_none());
        assert!(region_hint(None, &bounds).is_none());
        assert!(region_hint(Some(&SelectionRect::new(10.0, 10.0, 6.0, 6.0)), &bounds).is_some());
    }

    #[test]
    fn selection_region_is_relative_to_layer_origin() {
        let layer = Layer::new("l", Bitmap::transparent(100, 100))
            .with_position(CanvasPoint::new(20.0, 10.0));
        let region = selection_to_layer_region(&SelectionRect::new(30.0, 30.0, 40.0, 20.0), &layer);
        assert_eq!(region, PixelRegion::new(10, 20, 40, 20));
    }

    #[test]
    fn crop_to_canvas_matches_region_size() {
        let source = Bitmap::filled(10, 10, [9, 9, 9, 255]);
        let cropped = crop_to_canvas(&source, PixelRegion::new(8, 8, 5, 5));
        assert_eq!(cropped.dimensions(), (5, 5));
        assert_eq!(cropped.pixel(0, 0), Some([9, 9, 9, 255]));
        assert_eq!(cropped.pixel(4, 4), Some([0, 0, 0, 0]));
    }

    #[test]
    fn selection_gesture_lifecycle() {
        let mut gesture = SelectionGesture::default();
        assert!(gesture.update(CanvasPoint::new(1.0, 1.0), CANVAS).is_none());

        let initial = gesture.start(CanvasPoint::new(-5.0, 10.0), CANVAS);
        assert_eq!(initial, SelectionRect::new(0.0, 10.0, 0.0, 0.0));

        let sel = gesture.update(CanvasPoint::new(20.0, 30.0), CANVAS);
        assert_eq!(sel, Some(SelectionRect::new(0.0, 10.0, 20.0, 20.0)));

        gesture.finish();
        assert!(!gesture.is_active());
    }

    #[test]
    fn layer_drag_preserves_grab_offset() {
        let layer = Layer::new("l", Bitmap::transparent(10, 10))
            .with_position(CanvasPoint::new(100.0, 100.0));
        let mut drag = LayerDrag::default();
        drag.start(&layer, CanvasPoint::new(105.0, 103.0));

        let (id, pos) = drag.update(CanvasPoint::new(20.0, -7.5)).unwrap();
        assert_eq!(id, layer.id());
        assert_eq!(pos, CanvasPoint::new(15.0, -10.5));

        drag.stop();
        assert!(drag.update(CanvasPoint::new(0.0, 0.0)).is_none());
    }
}
