// SPDX-License-Identifier: MPL-2.0
//! Domain layer - Core editing types with ZERO external dependencies.
//!
//! This module contains pure value objects and business rules for the layered
//! editor. It depends only on `std` so every rule can be tested without a
//! codec, a network client or a filesystem.
//!
//! # Modules
//!
//! - [`bitmap`]: Pixel storage ([`Bitmap`](bitmap::Bitmap))
//! - [`geometry`]: Canvas-space value objects ([`CanvasSize`](geometry::CanvasSize),
//!   [`SelectionRect`](geometry::SelectionRect), [`RelativeRegion`](geometry::RelativeRegion))
//! - [`layer`]: Layers ([`Layer`](layer::Layer), [`LayerId`](layer::LayerId),
//!   [`Opacity`](layer::Opacity))
//! - [`generation`]: Generation options ([`AspectRatio`](generation::AspectRatio),
//!   [`ResolutionTier`](generation::ResolutionTier), [`GenerationModel`](generation::GenerationModel),
//!   [`CostTable`](generation::CostTable))

pub mod bitmap;
pub mod generation;
pub mod geometry;
pub mod layer;

pub use bitmap::Bitmap;
pub use generation::{AspectRatio, CostTable, GenerationModel, Provider, ResolutionTier};
pub use geometry::{
    CanvasPoint, CanvasSize, DisplayRect, LayerBounds, PixelRegion, RelativeRegion, ScreenPoint,
    SelectionRect,
};
pub use layer::{Layer, LayerId, Opacity};
