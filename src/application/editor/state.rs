// SPDX-License-Identifier: MPL-2.0
//! Editor state and its command choke-point.
//!
//! [`EditorState`] is the single owner of everything the editor shows: the
//! layer stack, canvas size, active and reference layers, the current
//! selection and tool. All interactive mutation goes through
//! [`EditorState::apply`] with an [`EditorCommand`], so the invariants below
//! hold after every command:
//!
//! - the active layer, when set, exists in the stack and is not a reference
//! - reference ids all exist in the stack
//! - an empty stack has a `(0, 0)` canvas and no selection

use super::mapper::{update_selection, LayerDrag, SelectionGesture};
use super::stack::LayerStack;
use crate::application::port::ImportedDocument;
use crate::domain::{
    AspectRatio, Bitmap, CanvasPoint, CanvasSize, Layer, LayerId, ResolutionTier, SelectionRect,
};
use chrono::{DateTime, Utc};

// =============================================================================
// Tool and options
// =============================================================================

/// Interaction mode of the canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ToolMode {
    /// Drag out a rectangle selection.
    Select,
    /// Prompt edits the active layer.
    #[default]
    Edit,
    /// Prompt asks a question about the active layer.
    Analyze,
    /// Drag the active layer around.
    Move,
}

impl ToolMode {
    #[must_use]
    pub fn i18n_key(self) -> &'static str {
        match self {
            ToolMode::Select => "tool-select",
            ToolMode::Edit => "tool-edit",
            ToolMode::Analyze => "tool-analyze",
            ToolMode::Move => "tool-move",
        }
    }
}

/// User-selected generation options.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GenerationOptions {
    pub style_instruction: Option<String>,
    pub aspect_ratio: Option<AspectRatio>,
    pub resolution: Option<ResolutionTier>,
    /// Send only the selected part of the active layer instead of the whole
    /// layer plus a region hint.
    pub crop_to_selection: bool,
}

impl GenerationOptions {
    /// Whether the user asked for a specific output shape, in which case the
    /// result keeps its natural size instead of being fit to the target.
    #[must_use]
    pub fn overrides_output_size(&self) -> bool {
        self.aspect_ratio.is_some() || self.resolution.is_some()
    }
}

/// One answer from the analysis tool.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisResult {
    pub text: String,
    pub timestamp: DateTime<Utc>,
}

// =============================================================================
// Commands
// =============================================================================

/// Every interactive mutation of the editor.
#[derive(Debug, Clone)]
pub enum EditorCommand {
    /// Appends a prepared layer on top, activates it and clears the selection.
    AddLayer(Layer),
    /// Pastes a bitmap: grows the canvas to fit and centers the new layer.
    AddImageLayer { name: String, bitmap: Bitmap },
    /// Replaces the whole document.
    LoadDocument(ImportedDocument),
    SelectLayer(Option<LayerId>),
    ToggleReference(LayerId),
    MoveUp(LayerId),
    MoveDown(LayerId),
    DeleteLayer(LayerId),
    ToggleVisibility(LayerId),
    SetOpacity(LayerId, f32),
    MoveLayer(LayerId, CanvasPoint),
    RenameLayer(LayerId, String),
    SetSelection(Option<SelectionRect>),
    SetTool(ToolMode),
    SetOptions(GenerationOptions),
    /// Pointer pressed at a canvas-space position (not clamped).
    PointerPressed(CanvasPoint),
    PointerMoved(CanvasPoint),
    PointerReleased,
}

// =============================================================================
// EditorState
// =============================================================================

/// Explicit application state of the layered editor.
#[derive(Debug, Clone, Default)]
pub struct EditorState {
    stack: LayerStack,
    canvas: CanvasSize,
    active: Option<LayerId>,
    references: Vec<LayerId>,
    selection: Option<SelectionRect>,
    tool: ToolMode,
    options: GenerationOptions,
    analysis_results: Vec<AnalysisResult>,
    selection_gesture: SelectionGesture,
    layer_drag: LayerDrag,
}

impl EditorState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn stack(&self) -> &LayerStack {
        &self.stack
    }

    #[must_use]
    pub fn layers(&self) -> &[Layer] {
        self.stack.layers()
    }

    #[must_use]
    pub fn canvas(&self) -> CanvasSize {
        self.canvas
    }

    #[must_use]
    pub fn active_layer_id(&self) -> Option<LayerId> {
        self.active
    }

    #[must_use]
    pub fn active_layer(&self) -> Option<&Layer> {
        self.active.and_then(|id| self.stack.get(id))
    }

    #[must_use]
    pub fn reference_ids(&self) -> &[LayerId] {
        &self.references
    }

    #[must_use]
    pub fn is_reference(&self, id: LayerId) -> bool {
        self.references.contains(&id)
    }

    /// Reference layers in stacking order, bottom first.
    pub fn reference_layers(&self) -> impl Iterator<Item = &Layer> {
        self.stack.iter().filter(|layer| self.is_reference(layer.id()))
    }

    #[must_use]
    pub fn selection(&self) -> Option<&SelectionRect> {
        self.selection.as_ref()
    }

    #[must_use]
    pub fn tool(&self) -> ToolMode {
        self.tool
    }

    #[must_use]
    pub fn options(&self) -> &GenerationOptions {
        &self.options
    }

    /// Analysis answers, newest first.
    #[must_use]
    pub fn analysis_results(&self) -> &[AnalysisResult] {
        &self.analysis_results
    }

    /// Applies a command. Returns whether anything changed.
    pub fn apply(&mut self, command: EditorCommand) -> bool {
        match command {
            EditorCommand::AddLayer(layer) => {
                self.push_layer(layer);
                true
            }
            EditorCommand::AddImageLayer { name, bitmap } => {
                self.add_image_layer(Layer::new(name, bitmap));
                true
            }
            EditorCommand::LoadDocument(document) => {
                self.load_document(document);
                true
            }
            EditorCommand::SelectLayer(id) => self.select_layer(id),
            EditorCommand::ToggleReference(id) => self.toggle_reference(id),
            EditorCommand::MoveUp(id) => self.stack.move_up(id),
            EditorCommand::MoveDown(id) => self.stack.move_down(id),
            EditorCommand::DeleteLayer(id) => self.delete_layer(id),
            EditorCommand::ToggleVisibility(id) => self.stack.toggle_visibility(id).is_some(),
            EditorCommand::SetOpacity(id, value) => self.stack.set_opacity(id, value),
            EditorCommand::MoveLayer(id, position) => self.stack.set_position(id, position),
            EditorCommand::RenameLayer(id, name) => self.stack.rename(id, name),
            EditorCommand::SetSelection(selection) => {
                self.selection = selection.map(|sel| self.clamp_selection(sel));
                true
            }
            EditorCommand::SetTool(tool) => {
                self.set_tool(tool);
                true
            }
            EditorCommand::SetOptions(options) => {
                let changed = self.options != options;
                self.options = options;
                changed
            }
            EditorCommand::PointerPressed(point) => self.pointer_pressed(point),
            EditorCommand::PointerMoved(point) => self.pointer_moved(point),
            EditorCommand::PointerReleased => {
                let was_active = self.selection_gesture.is_active() || self.layer_drag.is_dragging();
                self.selection_gesture.finish();
                self.layer_drag.stop();
                was_active
            }
        }
    }

    // ---- command handlers ----

    fn push_layer(&mut self, layer: Layer) -> LayerId {
        let id = self.stack.add(layer);
        self.active = Some(id);
        self.references.retain(|r| *r != id);
        self.selection = None;
        id
    }

    /// Grows the canvas to fit `layer`, centers it and activates it.
    pub(crate) fn add_image_layer(&mut self, mut layer: Layer) -> LayerId {
        let (w, h) = layer.bitmap().dimensions();
        self.canvas = self.canvas.grown_to_fit(w, h);
        layer.set_position(centered_origin(self.canvas, w, h));
        self.push_layer(layer)
    }

    fn load_document(&mut self, document: ImportedDocument) {
        self.stack.replace_all(document.layers);
        self.canvas = if self.stack.is_empty() {
            CanvasSize::empty()
        } else {
            document.size
        };
        self.active = self.stack.top().map(Layer::id);
        self.references.clear();
        self.selection = None;
        self.selection_gesture.finish();
        self.layer_drag.stop();
    }

    fn select_layer(&mut self, id: Option<LayerId>) -> bool {
        let id = id.filter(|id| self.stack.contains(*id));
        if let Some(id) = id {
            self.references.retain(|r| *r != id);
        }
        let changed = self.active != id;
        self.active = id;
        changed
    }

    fn toggle_reference(&mut self, id: LayerId) -> bool {
        if !self.stack.contains(id) {
            return false;
        }
        if let Some(index) = self.references.iter().position(|r| *r == id) {
            self.references.remove(index);
        } else {
            self.references.push(id);
            if self.active == Some(id) {
                self.active = None;
            }
        }
        true
    }

    fn delete_layer(&mut self, id: LayerId) -> bool {
        if self.stack.remove(id).is_none() {
            return false;
        }
        if self.active == Some(id) {
            self.active = None;
        }
        self.references.retain(|r| *r != id);
        if self.stack.is_empty() {
            self.canvas = CanvasSize::empty();
            self.selection = None;
        }
        true
    }

    fn set_tool(&mut self, tool: ToolMode) {
        self.tool = tool;
        self.selection = None;
        self.selection_gesture.finish();
        self.layer_drag.stop();
    }

    fn pointer_pressed(&mut self, point: CanvasPoint) -> bool {
        match self.tool {
            ToolMode::Select if !self.canvas.is_empty() => {
                self.selection = Some(self.selection_gesture.start(point, self.canvas));
                true
            }
            ToolMode::Move => match self.active.and_then(|id| self.stack.get(id)) {
                Some(layer) => {
                    self.layer_drag.start(layer, point);
                    false
                }
                None => false,
            },
            _ => false,
        }
    }

    fn pointer_moved(&mut self, point: CanvasPoint) -> bool {
        if let Some(selection) = self.selection_gesture.update(point, self.canvas) {
            self.selection = Some(selection);
            return true;
        }
        match self.layer_drag.update(point) {
            Some((id, position)) => self.stack.set_position(id, position),
            None => false,
        }
    }

    fn clamp_selection(&self, selection: SelectionRect) -> SelectionRect {
        update_selection(
            CanvasPoint::new(selection.x, selection.y),
            CanvasPoint::new(selection.x + selection.width, selection.y + selection.height),
            self.canvas,
        )
    }

    // ---- orchestrator hooks ----

    pub(crate) fn set_canvas(&mut self, canvas: CanvasSize) {
        self.canvas = canvas;
    }

    /// Appends a generation result and applies the post-generation rules.
    pub(crate) fn accept_generated(&mut self, layer: Layer) -> LayerId {
        let id = self.push_layer(layer);
        if self.tool == ToolMode::Select {
            self.tool = ToolMode::Edit;
            self.selection_gesture.finish();
        }
        id
    }

    pub(crate) fn push_analysis(&mut self, text: String) {
        self.analysis_results.insert(
            0,
            AnalysisResult {
                text,
                timestamp: Utc::now(),
            },
        );
    }
}

/// Origin that centers a `width` x `height` bitmap on `canvas`.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn centered_origin(canvas: CanvasSize, width: u32, height: u32) -> CanvasPoint {
    CanvasPoint::new(
        (canvas.width as f32 - width as f32) / 2.0,
        (canvas.height as f32 - height as f32) / 2.0,
    )
}
