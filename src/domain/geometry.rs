// SPDX-License-Identifier: MPL-2.0
//! Canvas-space geometry value objects.
//!
//! All positions are in canvas pixels. Layer offsets and selection corners are
//! real numbers because pointer input is fractional once the display scale is
//! applied; pixel regions used for cropping are integral.

/// Selection thresholds.
pub mod selection_bounds {
    /// A selection must exceed this many pixels on both axes to count as a
    /// region. Anything smaller means "operate on the whole image".
    pub const MIN_MEANINGFUL_PX: f32 = 5.0;
}

// =============================================================================
// CanvasSize
// =============================================================================

/// Workspace dimensions for the currently open project.
///
/// `(0, 0)` means no document is open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CanvasSize {
    pub width: u32,
    pub height: u32,
}

impl CanvasSize {
    #[must_use]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    #[must_use]
    pub const fn empty() -> Self {
        Self::new(0, 0)
    }

    /// Returns whether either axis is zero.
    #[must_use]
    pub fn is_empty(self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Returns the size grown (never shrunk) to contain `width` x `height`.
    #[must_use]
    pub fn grown_to_fit(self, width: u32, height: u32) -> Self {
        Self::new(self.width.max(width), self.height.max(height))
    }

    /// Center point of the canvas.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn center(self) -> CanvasPoint {
        CanvasPoint::new(self.width as f32 / 2.0, self.height as f32 / 2.0)
    }

    /// Clamps a point into `[0, width] x [0, height]`.
    ///
    /// Non-finite coordinates collapse to the origin before clamping.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn clamp(self, point: CanvasPoint) -> CanvasPoint {
        let finite = |v: f32| if v.is_finite() { v } else { 0.0 };
        CanvasPoint::new(
            finite(point.x).clamp(0.0, self.width as f32),
            finite(point.y).clamp(0.0, self.height as f32),
        )
    }
}

// =============================================================================
// Points
// =============================================================================

/// A position in canvas space.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CanvasPoint {
    pub x: f32,
    pub y: f32,
}

impl CanvasPoint {
    #[must_use]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// A pointer position in screen (display) space.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ScreenPoint {
    pub x: f32,
    pub y: f32,
}

impl ScreenPoint {
    #[must_use]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// On-screen rectangle occupied by the displayed canvas.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DisplayRect {
    pub left: f32,
    pub top: f32,
    pub width: f32,
    pub height: f32,
}

impl DisplayRect {
    #[must_use]
    pub const fn new(left: f32, top: f32, width: f32, height: f32) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }
}

// =============================================================================
// SelectionRect
// =============================================================================

/// Rectangular selection in canvas space. Width and height are never negative.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SelectionRect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl SelectionRect {
    /// Creates a selection, folding negative extents into non-negative ones.
    #[must_use]
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self::from_corners(CanvasPoint::new(x, y), CanvasPoint::new(x + width, y + height))
    }

    /// Rectangle spanned by two arbitrary corners.
    #[must_use]
    pub fn from_corners(a: CanvasPoint, b: CanvasPoint) -> Self {
        Self {
            x: a.x.min(b.x),
            y: a.y.min(b.y),
            width: (b.x - a.x).abs(),
            height: (b.y - a.y).abs(),
        }
    }

    /// Whether the selection is large enough to describe a region.
    #[must_use]
    pub fn is_meaningful(&self) -> bool {
        self.width > selection_bounds::MIN_MEANINGFUL_PX
            && self.height > selection_bounds::MIN_MEANINGFUL_PX
    }

    #[must_use]
    pub fn center(&self) -> CanvasPoint {
        CanvasPoint::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }
}

// =============================================================================
// LayerBounds
// =============================================================================

/// Canvas-space rectangle covered by a layer's bitmap.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LayerBounds {
    pub x: f32,
    pub y: f32,
    pub width: u32,
    pub height: u32,
}

impl LayerBounds {
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn center(&self) -> CanvasPoint {
        CanvasPoint::new(
            self.x + self.width as f32 / 2.0,
            self.y + self.height as f32 / 2.0,
        )
    }
}

// =============================================================================
// RelativeRegion
// =============================================================================

/// Resolution-independent region hint, in whole percentages of the target
/// layer's dimensions.
///
/// Values are not clamped: a selection that spills past the layer yields
/// negative offsets or extents above 100.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RelativeRegion {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl RelativeRegion {
    /// Region covering the whole layer.
    pub const FULL: Self = Self {
        x: 0,
        y: 0,
        width: 100,
        height: 100,
    };
}

// =============================================================================
// PixelRegion
// =============================================================================

/// Integral rectangle in a bitmap's own pixel space. The origin may be
/// negative when the rectangle starts outside the bitmap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PixelRegion {
    pub x: i64,
    pub y: i64,
    pub width: u32,
    pub height: u32,
}

impl PixelRegion {
    #[must_use]
    pub const fn new(x: i64, y: i64, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canvas_grows_per_axis_and_never_shrinks() {
        let canvas = CanvasSize::new(800, 600);
        assert_eq!(canvas.grown_to_fit(400, 400), CanvasSize::new(800, 600));
        assert_eq!(canvas.grown_to_fit(1000, 1000), CanvasSize::new(1000, 1000));
        assert_eq!(canvas.grown_to_fit(900, 10), CanvasSize::new(900, 600));
    }

    #[test]
    fn canvas_clamp_handles_non_finite() {
        let canvas = CanvasSize::new(100, 50);
        assert_eq!(
            canvas.clamp(CanvasPoint::new(f32::NAN, f32::INFINITY)),
            CanvasPoint::new(0.0, 0.0)
        );
        assert_eq!(
            canvas.clamp(CanvasPoint::new(150.0, -3.0)),
            CanvasPoint::new(100.0, 0.0)
        );
    }

    #[test]
    fn selection_from_corners_is_direction_independent() {
        let a = CanvasPoint::new(10.0, 40.0);
        let b = CanvasPoint::new(30.0, 20.0);
        let expected = SelectionRect {
            x: 10.0,
            y: 20.0,
            width: 20.0,
            height: 20.0,
        };
        assert_eq!(SelectionRect::from_corners(a, b), expected);
        assert_eq!(SelectionRect::from_corners(b, a), expected);
    }

    #[test]
    fn selection_threshold_is_exclusive() {
        assert!(!SelectionRect::new(0.0, 0.0, 5.0, 50.0).is_meaningful());
        assert!(!SelectionRect::new(0.0, 0.0, 50.0, 4.0).is_meaningful());
        assert!(SelectionRect::new(0.0, 0.0, 5.5, 5.5).is_meaningful());
    }

    #[test]
    fn empty_canvas_is_empty() {
        assert!(CanvasSize::empty().is_empty());
        assert!(CanvasSize::new(10, 0).is_empty());
        assert!(!CanvasSize::new(1, 1).is_empty());
    }
}
