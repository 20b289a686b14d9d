// SPDX-License-Identifier: MPL-2.0
//! Layer model.
//!
//! A [`Layer`] is a named, positioned, orderable bitmap. Its pixels are fixed
//! at creation; edits produce new layers. Position, opacity, visibility and
//! name are the only mutable attributes.

use super::bitmap::Bitmap;
use super::geometry::{CanvasPoint, LayerBounds};
use std::fmt;

// =============================================================================
// LayerId
// =============================================================================

/// Opaque, process-unique layer identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LayerId(u64);

impl LayerId {
    /// Creates a new unique layer ID.
    pub fn new() -> Self {
        use std::sync::atomic::{AtomicU64, Ordering};
        static COUNTER: AtomicU64 = AtomicU64::new(1);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for LayerId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for LayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "layer-{}", self.0)
    }
}

// =============================================================================
// Opacity
// =============================================================================

/// Opacity bounds.
pub mod opacity_bounds {
    /// Fully transparent.
    pub const MIN: f32 = 0.0;
    /// Fully opaque.
    pub const MAX: f32 = 1.0;
}

/// Layer opacity, guaranteed to be within `[0.0, 1.0]`.
///
/// Out-of-range values are clamped; NaN is treated as fully opaque.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Opacity(f32);

impl Opacity {
    pub const OPAQUE: Self = Self(opacity_bounds::MAX);

    #[must_use]
    pub fn new(value: f32) -> Self {
        if value.is_nan() {
            return Self::OPAQUE;
        }
        Self(value.clamp(opacity_bounds::MIN, opacity_bounds::MAX))
    }

    #[must_use]
    pub fn value(self) -> f32 {
        self.0
    }

    /// Whether drawing with this opacity has no visible effect.
    #[must_use]
    pub fn is_transparent(self) -> bool {
        self.0 <= opacity_bounds::MIN
    }
}

impl Default for Opacity {
    fn default() -> Self {
        Self::OPAQUE
    }
}

// =============================================================================
// Layer
// =============================================================================

/// One raster layer in the editor's stack.
#[derive(Debug, Clone)]
pub struct Layer {
    id: LayerId,
    name: String,
    visible: bool,
    opacity: Opacity,
    bitmap: Bitmap,
    preview: Option<Bitmap>,
    position: CanvasPoint,
    z_index: usize,
    cost: Option<f64>,
    prompt: Option<String>,
}

impl Layer {
    /// Creates a visible, opaque layer at the canvas origin.
    pub fn new(name: impl Into<String>, bitmap: Bitmap) -> Self {
        Self {
            id: LayerId::new(),
            name: name.into(),
            visible: true,
            opacity: Opacity::OPAQUE,
            bitmap,
            preview: None,
            position: CanvasPoint::default(),
            z_index: 0,
            cost: None,
            prompt: None,
        }
    }

    #[must_use]
    pub fn with_position(mut self, position: CanvasPoint) -> Self {
        self.position = position;
        self
    }

    #[must_use]
    pub fn with_preview(mut self, preview: Bitmap) -> Self {
        self.preview = Some(preview);
        self
    }

    #[must_use]
    pub fn with_cost(mut self, cost: Option<f64>) -> Self {
        self.cost = cost;
        self
    }

    #[must_use]
    pub fn with_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.prompt = Some(prompt.into());
        self
    }

    #[must_use]
    pub fn id(&self) -> LayerId {
        self.id
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn is_visible(&self) -> bool {
        self.visible
    }

    #[must_use]
    pub fn opacity(&self) -> Opacity {
        self.opacity
    }

    #[must_use]
    pub fn bitmap(&self) -> &Bitmap {
        &self.bitmap
    }

    #[must_use]
    pub fn preview(&self) -> Option<&Bitmap> {
        self.preview.as_ref()
    }

    #[must_use]
    pub fn position(&self) -> CanvasPoint {
        self.position
    }

    /// Stacking order index; 0 is the bottom of the stack.
    #[must_use]
    pub fn z_index(&self) -> usize {
        self.z_index
    }

    #[must_use]
    pub fn cost(&self) -> Option<f64> {
        self.cost
    }

    #[must_use]
    pub fn prompt(&self) -> Option<&str> {
        self.prompt.as_deref()
    }

    /// Canvas-space rectangle covered by this layer.
    #[must_use]
    pub fn bounds(&self) -> LayerBounds {
        LayerBounds {
            x: self.position.x,
            y: self.position.y,
            width: self.bitmap.width(),
            height: self.bitmap.height(),
        }
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    pub fn set_opacity(&mut self, opacity: Opacity) {
        self.opacity = opacity;
    }

    pub fn set_position(&mut self, position: CanvasPoint) {
        self.position = position;
    }

    /// Only the layer stack assigns stacking indices.
    pub(crate) fn set_z_index(&mut self, z_index: usize) {
        self.z_index = z_index;
    }
}
