// SPDX-License-Identifier: MPL-2.0
//! Ordered layer collection.
//!
//! [`LayerStack`] owns every layer and keeps the stacking invariant: the
//! slice order is the draw order (bottom first) and `z_index` values are
//! exactly `0..len` matching that order after every mutation.

use crate::domain::{CanvasPoint, Layer, LayerId, Opacity};

/// The editor's layers, bottom of the stack first.
#[derive(Debug, Clone, Default)]
pub struct LayerStack {
    layers: Vec<Layer>,
}

impl LayerStack {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a stack from layers listed bottom first.
    #[must_use]
    pub fn from_layers(layers: Vec<Layer>) -> Self {
        let mut stack = Self { layers };
        stack.reindex();
        stack
    }

    #[must_use]
    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    pub fn iter(&self) -> impl Iterator<Item = &Layer> {
        self.layers.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.layers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    #[must_use]
    pub fn get(&self, id: LayerId) -> Option<&Layer> {
        self.layers.iter().find(|layer| layer.id() == id)
    }

    #[must_use]
    pub fn contains(&self, id: LayerId) -> bool {
        self.get(id).is_some()
    }

    /// Topmost layer.
    #[must_use]
    pub fn top(&self) -> Option<&Layer> {
        self.layers.last()
    }

    fn position_of(&self, id: LayerId) -> Option<usize> {
        self.layers.iter().position(|layer| layer.id() == id)
    }

    fn get_mut(&mut self, id: LayerId) -> Option<&mut Layer> {
        self.layers.iter_mut().find(|layer| layer.id() == id)
    }

    /// Appends a layer on top and returns its id.
    pub fn add(&mut self, mut layer: Layer) -> LayerId {
        layer.set_z_index(self.layers.len());
        let id = layer.id();
        self.layers.push(layer);
        id
    }

    /// Swaps the layer with the one above it. Returns `false` when the layer
    /// is already on top or unknown.
    pub fn move_up(&mut self, id: LayerId) -> bool {
        match self.position_of(id) {
            Some(index) if index + 1 < self.layers.len() => {
                self.layers.swap(index, index + 1);
                self.reindex();
                true
            }
            _ => false,
        }
    }

    /// Swaps the layer with the one below it. Returns `false` when the layer
    /// is already at the bottom or unknown.
    pub fn move_down(&mut self, id: LayerId) -> bool {
        match self.position_of(id) {
            Some(index) if index > 0 => {
                self.layers.swap(index, index - 1);
                self.reindex();
                true
            }
            _ => false,
        }
    }

    /// Removes and returns a layer.
    pub fn remove(&mut self, id: LayerId) -> Option<Layer> {
        let index = self.position_of(id)?;
        let layer = self.layers.remove(index);
        self.reindex();
        Some(layer)
    }

    /// Flips visibility. Returns the new state, or `None` for unknown ids.
    pub fn toggle_visibility(&mut self, id: LayerId) -> Option<bool> {
        let layer = self.get_mut(id)?;
        let visible = !layer.is_visible();
        layer.set_visible(visible);
        Some(visible)
    }

    /// Sets opacity, clamped into `[0, 1]`.
    pub fn set_opacity(&mut self, id: LayerId, value: f32) -> bool {
        self.get_mut(id)
            .map(|layer| layer.set_opacity(Opacity::new(value)))
            .is_some()
    }

    pub fn set_position(&mut self, id: LayerId, position: CanvasPoint) -> bool {
        self.get_mut(id)
            .map(|layer| layer.set_position(position))
            .is_some()
    }

    pub fn rename(&mut self, id: LayerId, name: impl Into<String>) -> bool {
        let name = name.into();
        self.get_mut(id).map(|layer| layer.set_name(name)).is_some()
    }

    /// Replaces every layer (document import).
    pub fn replace_all(&mut self, layers: Vec<Layer>) {
        self.layers = layers;
        self.reindex();
    }

    pub fn clear(&mut self) {
        self.layers.clear();
    }

    fn reindex(&mut self) {
        for (index, layer) in self.layers.iter_mut().enumerate() {
            layer.set_z_index(index);
        }
    }
}
