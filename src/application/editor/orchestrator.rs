// SPDX-License-Identifier: MPL-2.0
//! Generation and analysis use cases.
//!
//! The orchestrator turns the current [`EditorState`] into a
//! [`GenerationRequest`], hands it to an [`ImageGenerator`] and turns the
//! response into a new layer. At most one request is in flight: while busy,
//! new submissions are rejected rather than queued.
//!
//! A generation runs in three steps so a front end can drive them from its
//! own event loop:
//!
//! 1. [`GenerationOrchestrator::begin`] validates input and captures
//!    everything the request needs (bitmaps are cheap `Arc` clones)
//! 2. [`GenerationOrchestrator::dispatch`] performs the single await
//! 3. [`GenerationOrchestrator::complete`] places the result, or reports the
//!    failure, and always returns to idle
//!
//! [`GenerationOrchestrator::generate`] chains the three.

use super::mapper::{crop_to_canvas, region_hint, selection_to_layer_region};
use super::state::EditorState;
use crate::application::port::{
    BitmapCodec, GenerationError, GenerationErrorKind, GenerationOutcome, GenerationRequest,
    HistoryError, HistoryStore, ImageAnalyzer, ImageFormat, ImageGenerator, NewHistoryRecord,
};
use crate::config::defaults;
use crate::domain::{Bitmap, CanvasPoint, CanvasSize, Layer, LayerId};
use crate::notifications::Notification;
use std::sync::Arc;

/// Number of prompt characters kept in generated layer names.
const NAME_PROMPT_CHARS: usize = 15;

/// Text stored when the analyzer answers with nothing.
const EMPTY_ANALYSIS: &str = "No analysis generated.";

// =============================================================================
// Phase and rejection
// =============================================================================

/// Where the orchestrator is in the request lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Idle,
    BuildingRequest,
    AwaitingResponse,
}

/// Input problems detected before any request is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum GenerationRejected {
    #[error("another request is still in progress")]
    Busy,
    #[error("prompt is empty")]
    EmptyPrompt,
    #[error("no active layer")]
    NoActiveLayer,
}

impl GenerationRejected {
    #[must_use]
    pub fn i18n_key(self) -> &'static str {
        match self {
            GenerationRejected::Busy => "notification-generation-busy",
            GenerationRejected::EmptyPrompt => "notification-prompt-empty",
            GenerationRejected::NoActiveLayer => "notification-no-active-layer",
        }
    }
}

// =============================================================================
// Pending request
// =============================================================================

/// How the response bitmap lands on the canvas.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Placement {
    /// Stretch to exactly this footprint.
    Fit {
        origin: CanvasPoint,
        width: u32,
        height: u32,
    },
    /// Keep natural size, centered on the anchor (canvas center if `None`).
    Center(Option<CanvasPoint>),
}

/// A request built from editor state, waiting to be dispatched.
#[derive(Debug, Clone)]
pub struct PendingGeneration {
    request: GenerationRequest,
    placement: Placement,
    edits_layer: bool,
}

impl PendingGeneration {
    #[must_use]
    pub fn request(&self) -> &GenerationRequest {
        &self.request
    }
}

// =============================================================================
// Reports
// =============================================================================

/// Outcome of one generation action.
#[derive(Debug, Clone)]
pub enum GenerationReport {
    Rejected(GenerationRejected),
    Failed(GenerationError),
    Created {
        layer_id: LayerId,
        cost: Option<f64>,
        /// Set when the layer was created but could not be recorded.
        history_warning: Option<&'static str>,
    },
}

impl GenerationReport {
    /// User-facing notifications for this outcome.
    #[must_use]
    pub fn notifications(&self) -> Vec<Notification> {
        match self {
            GenerationReport::Rejected(reason) => vec![Notification::warning(reason.i18n_key())],
            GenerationReport::Failed(err) => vec![failure_notification(err)],
            GenerationReport::Created {
                cost,
                history_warning,
                ..
            } => {
                let mut notifications = vec![match cost {
                    Some(cost) => Notification::success("notification-generation-success-cost")
                        .with_arg("cost", format!("{cost:.4}")),
                    None => Notification::success("notification-generation-success"),
                }];
                if let Some(key) = history_warning {
                    notifications.push(Notification::warning(*key));
                }
                notifications
            }
        }
    }

    #[must_use]
    pub fn layer_id(&self) -> Option<LayerId> {
        match self {
            GenerationReport::Created { layer_id, .. } => Some(*layer_id),
            _ => None,
        }
    }
}

/// Outcome of one analysis action.
#[derive(Debug, Clone, PartialEq)]
pub enum AnalysisReport {
    Rejected(GenerationRejected),
    Failed(GenerationError),
    Answered(String),
}

impl AnalysisReport {
    #[must_use]
    pub fn notification(&self) -> Notification {
        match self {
            AnalysisReport::Rejected(reason) => Notification::warning(reason.i18n_key()),
            AnalysisReport::Failed(err) => failure_notification(err),
            AnalysisReport::Answered(_) => Notification::success("notification-analysis-success"),
        }
    }
}

fn failure_notification(err: &GenerationError) -> Notification {
    let notification = Notification::error(err.i18n_key()).with_arg("message", err.message.clone());
    match err.kind {
        GenerationErrorKind::Api { status } => notification.with_arg("status", status.to_string()),
        _ => notification,
    }
}

// =============================================================================
// GenerationOrchestrator
// =============================================================================

/// Drives generation and analysis requests against the editor state.
pub struct GenerationOrchestrator<G> {
    generator: G,
    codec: Arc<dyn BitmapCodec>,
    history: Option<Box<dyn HistoryStore>>,
    phase: Phase,
    thumbnail_edge: u32,
}

impl<G: ImageGenerator> GenerationOrchestrator<G> {
    pub fn new(generator: G, codec: Arc<dyn BitmapCodec>) -> Self {
        Self {
            generator,
            codec,
            history: None,
            phase: Phase::Idle,
            thumbnail_edge: defaults::THUMBNAIL_MAX_EDGE,
        }
    }

    /// Records every successful generation in `store`.
    #[must_use]
    pub fn with_history(mut self, store: Box<dyn HistoryStore>) -> Self {
        self.history = Some(store);
        self
    }

    #[must_use]
    pub fn with_thumbnail_edge(mut self, max_edge: u32) -> Self {
        self.thumbnail_edge = max_edge.max(1);
        self
    }

    #[must_use]
    pub fn phase(&self) -> Phase {
        self.phase
    }

    #[must_use]
    pub fn is_busy(&self) -> bool {
        self.phase != Phase::Idle
    }

    #[must_use]
    pub fn generator(&self) -> &G {
        &self.generator
    }

    #[must_use]
    pub fn codec(&self) -> &Arc<dyn BitmapCodec> {
        &self.codec
    }

    #[must_use]
    pub fn history(&self) -> Option<&dyn HistoryStore> {
        self.history.as_deref()
    }

    /// Validates input and builds the request from the current state.
    ///
    /// On success the orchestrator is busy until [`Self::complete`] is called.
    ///
    /// # Errors
    ///
    /// Rejects when a request is already in flight or the prompt is blank.
    pub fn begin(
        &mut self,
        state: &EditorState,
        prompt: &str,
    ) -> Result<PendingGeneration, GenerationRejected> {
        if self.is_busy() {
            return Err(GenerationRejected::Busy);
        }
        let prompt = prompt.trim();
        if prompt.is_empty() {
            return Err(GenerationRejected::EmptyPrompt);
        }

        self.phase = Phase::BuildingRequest;
        let pending = build_request(state, prompt);
        tracing::debug!(
            edit = pending.request.is_edit(),
            references = pending.request.reference_images.len(),
            region = ?pending.request.region_hint,
            "generation request built"
        );
        self.phase = Phase::AwaitingResponse;
        Ok(pending)
    }

    /// Sends a pending request. This is the only suspension point.
    pub async fn dispatch(
        &self,
        pending: &PendingGeneration,
    ) -> Result<GenerationOutcome, GenerationError> {
        self.generator.generate(&pending.request).await
    }

    /// Applies a response to the editor and returns to idle.
    ///
    /// On failure the layer stack is left untouched.
    pub fn complete(
        &mut self,
        state: &mut EditorState,
        pending: PendingGeneration,
        result: Result<GenerationOutcome, GenerationError>,
    ) -> GenerationReport {
        self.phase = Phase::Idle;

        let outcome = match result {
            Ok(outcome) if outcome.image.is_empty() => {
                let err = GenerationError::new(
                    GenerationErrorKind::EmptyResponse,
                    "provider returned an empty image",
                );
                tracing::warn!(error = %err, "generation failed");
                return GenerationReport::Failed(err);
            }
            Ok(outcome) => outcome,
            Err(err) => {
                tracing::warn!(kind = ?err.kind, error = %err, "generation failed");
                return GenerationReport::Failed(err);
            }
        };

        let placed = self.place(state, pending.placement, outcome.image.clone());
        let (image, position) = match placed {
            Ok(placed) => placed,
            Err(err) => {
                tracing::warn!(error = %err, "generated image could not be placed");
                return GenerationReport::Failed(err);
            }
        };

        let mut layer = Layer::new(
            layer_name(pending.edits_layer, &pending.request.prompt),
            image.clone(),
        )
        .with_position(position)
        .with_cost(outcome.cost_estimate)
        .with_prompt(pending.request.prompt.clone());
        let preview = self.thumbnail(&image);
        if let Some(preview) = preview.clone() {
            layer = layer.with_preview(preview);
        }
        let layer_id = state.accept_generated(layer);
        tracing::info!(%layer_id, cost = ?outcome.cost_estimate, "generated layer added");

        let history_warning = self
            .record_history(&pending.request, &outcome, preview.as_ref())
            .err()
            .map(|err| {
                tracing::warn!(error = %err, "generation not recorded in history");
                err.i18n_key()
            });

        GenerationReport::Created {
            layer_id,
            cost: outcome.cost_estimate,
            history_warning,
        }
    }

    /// Runs a whole generation: begin, dispatch, complete.
    pub async fn generate(&mut self, state: &mut EditorState, prompt: &str) -> GenerationReport {
        let pending = match self.begin(state, prompt) {
            Ok(pending) => pending,
            Err(reason) => return GenerationReport::Rejected(reason),
        };
        let result = self.dispatch(&pending).await;
        self.complete(state, pending, result)
    }

    /// Asks `analyzer` about the active layer.
    pub async fn analyze<A: ImageAnalyzer>(
        &mut self,
        analyzer: &A,
        state: &mut EditorState,
        prompt: &str,
    ) -> AnalysisReport {
        if self.is_busy() {
            return AnalysisReport::Rejected(GenerationRejected::Busy);
        }
        let Some(image) = state.active_layer().map(|layer| layer.bitmap().clone()) else {
            return AnalysisReport::Rejected(GenerationRejected::NoActiveLayer);
        };
        let prompt = prompt.trim();
        if prompt.is_empty() {
            return AnalysisReport::Rejected(GenerationRejected::EmptyPrompt);
        }

        self.phase = Phase::AwaitingResponse;
        let result = analyzer.analyze(&image, prompt).await;
        self.phase = Phase::Idle;

        match result {
            Ok(text) => {
                let text = if text.trim().is_empty() {
                    EMPTY_ANALYSIS.to_string()
                } else {
                    text
                };
                state.push_analysis(text.clone());
                AnalysisReport::Answered(text)
            }
            Err(err) => {
                tracing::warn!(kind = ?err.kind, error = %err, "analysis failed");
                AnalysisReport::Failed(err)
            }
        }
    }

    fn place(
        &self,
        state: &mut EditorState,
        placement: Placement,
        image: Bitmap,
    ) -> Result<(Bitmap, CanvasPoint), GenerationError> {
        match placement {
            Placement::Fit {
                origin,
                width,
                height,
            } => {
                let image = if image.dimensions() == (width, height) {
                    image
                } else {
                    self.codec
                        .resize(&image, width, height)
                        .map_err(|err| GenerationError::decode(err.to_string()))?
                };
                // The target may have been deleted while the request was in flight.
                if state.canvas().is_empty() {
                    state.set_canvas(CanvasSize::new(width, height));
                    return Ok((image, CanvasPoint::new(0.0, 0.0)));
                }
                Ok((image, origin))
            }
            Placement::Center(anchor) => {
                let (w, h) = image.dimensions();
                if state.canvas().is_empty() {
                    state.set_canvas(CanvasSize::new(w, h));
                    return Ok((image, CanvasPoint::new(0.0, 0.0)));
                }
                let center = anchor.unwrap_or_else(|| state.canvas().center());
                #[allow(clippy::cast_precision_loss)]
                let origin = CanvasPoint::new(center.x - w as f32 / 2.0, center.y - h as f32 / 2.0);
                Ok((image, origin))
            }
        }
    }

    fn thumbnail(&self, image: &Bitmap) -> Option<Bitmap> {
        match self.codec.thumbnail(image, self.thumbnail_edge) {
            Ok(preview) => Some(preview),
            Err(err) => {
                tracing::debug!(error = %err, "thumbnail generation failed");
                None
            }
        }
    }

    fn record_history(
        &mut self,
        request: &GenerationRequest,
        outcome: &GenerationOutcome,
        preview: Option<&Bitmap>,
    ) -> Result<(), HistoryError> {
        let Some(store) = self.history.as_mut() else {
            return Ok(());
        };
        let encode = |bitmap: &Bitmap| {
            self.codec
                .encode(bitmap, ImageFormat::Png)
                .map_err(|err| HistoryError::Corrupted(err.to_string()))
        };
        let image_png = encode(&outcome.image)?;
        let thumbnail_png = preview.map(encode).transpose()?;
        let model = self.generator.model();

        store.append(NewHistoryRecord {
            prompt: request.prompt.clone(),
            model: model.billing_key(request.is_edit()),
            cost: outcome.cost_estimate,
            width: outcome.image.width(),
            height: outcome.image.height(),
            aspect_ratio: request.aspect_ratio.map(|a| a.as_str().to_string()),
            resolution: request
                .resolution_for(model)
                .map(|r| r.as_str().to_string()),
            request_id: outcome.request_id.clone(),
            image_png,
            thumbnail_png,
        })?;
        Ok(())
    }
}

/// Captures everything the request needs from `state`.
fn build_request(state: &EditorState, prompt: &str) -> PendingGeneration {
    let options = state.options();
    let selection = state.selection().filter(|sel| sel.is_meaningful());

    let mut request = GenerationRequest::new(prompt);
    request.reference_images = state
        .reference_layers()
        .map(|layer| layer.bitmap().clone())
        .collect();
    request.style_instruction = options.style_instruction.clone();
    request.aspect_ratio = options.aspect_ratio;
    request.resolution = options.resolution;

    let Some(active) = state.active_layer() else {
        return PendingGeneration {
            request,
            placement: Placement::Center(selection.map(|sel| sel.center())),
            edits_layer: false,
        };
    };

    let bounds = active.bounds();
    let cropped = selection
        .filter(|_| options.crop_to_selection)
        .map(|sel| selection_to_layer_region(sel, active))
        .filter(|region| !region.is_empty());

    let fit = match cropped {
        Some(region) => {
            request.base_image = Some(crop_to_canvas(active.bitmap(), region));
            #[allow(clippy::cast_precision_loss)]
            let origin = CanvasPoint::new(
                bounds.x + region.x as f32,
                bounds.y + region.y as f32,
            );
            Placement::Fit {
                origin,
                width: region.width,
                height: region.height,
            }
        }
        None => {
            request.base_image = Some(active.bitmap().clone());
            request.region_hint = region_hint(selection, &bounds);
            Placement::Fit {
                origin: active.position(),
                width: bounds.width,
                height: bounds.height,
            }
        }
    };

    let placement = if options.overrides_output_size() {
        Placement::Center(Some(bounds.center()))
    } else {
        fit
    };

    PendingGeneration {
        request,
        placement,
        edits_layer: true,
    }
}

fn layer_name(edits_layer: bool, prompt: &str) -> String {
    let label = if edits_layer { "Edit" } else { "Generate" };
    let prefix: String = prompt.chars().take(NAME_PROMPT_CHARS).collect();
    format!("{label}: {prefix}...")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::editor::{EditorCommand, GenerationOptions};
    use crate::application::port::{HistoryPage, HistoryRecord};
    use crate::domain::{AspectRatio, GenerationModel, SelectionRect};
    use crate::test_utils::{assert_abs_diff_eq, MemoryHistory, StubCodec};
    use std::sync::Mutex;

    /// Generator that records requests and replays a scripted result.
    struct ScriptedGenerator {
        result: Result<GenerationOutcome, GenerationError>,
        seen: Mutex<Vec<GenerationRequest>>,
    }

    impl ScriptedGenerator {
        fn ok(width: u32, height: u32) -> Self {
            Self {
                result: Ok(GenerationOutcome {
                    image: Bitmap::filled(width, height, [0, 0, 255, 255]),
                    cost_estimate: Some(0.0396),
                    request_id: Some("req-1".into()),
                }),
                seen: Mutex::new(Vec::new()),
            }
        }

        fn failing(err: GenerationError) -> Self {
            Self {
                result: Err(err),
                seen: Mutex::new(Vec::new()),
            }
        }

        fn last_request(&self) -> GenerationRequest {
            self.seen.lock().unwrap().last().cloned().unwrap()
        }
    }

    impl ImageGenerator for ScriptedGenerator {
        fn model(&self) -> GenerationModel {
            GenerationModel::NanoBanana
        }

        async fn generate(
            &self,
            request: &GenerationRequest,
        ) -> Result<GenerationOutcome, GenerationError> {
            self.seen.lock().unwrap().push(request.clone());
            self.result.clone()
        }
    }

    struct FixedAnalyzer(Result<String, GenerationError>);

    impl ImageAnalyzer for FixedAnalyzer {
        async fn analyze(&self, _image: &Bitmap, _prompt: &str) -> Result<String, GenerationError> {
            self.0.clone()
        }
    }

    struct BrokenHistory;

    impl HistoryStore for BrokenHistory {
        fn append(&mut self, _record: NewHistoryRecord) -> Result<HistoryRecord, HistoryError> {
            Err(HistoryError::Corrupted("disk full".into()))
        }

        fn list(&self, page: usize, page_size: usize) -> Result<HistoryPage, HistoryError> {
            Ok(crate::application::port::history::paginate(&[], page, page_size))
        }

        fn load_image(&self, record: &HistoryRecord) -> Result<Vec<u8>, HistoryError> {
            Err(HistoryError::NotFound(record.id))
        }
    }

    fn orchestrator(generator: ScriptedGenerator) -> GenerationOrchestrator<ScriptedGenerator> {
        GenerationOrchestrator::new(generator, Arc::new(StubCodec))
    }

    fn state_with_layer(width: u32, height: u32) -> (EditorState, LayerId) {
        let mut state = EditorState::new();
        state.apply(EditorCommand::AddImageLayer {
            name: "base".into(),
            bitmap: Bitmap::filled(width, height, [255, 0, 0, 255]),
        });
        let id = state.active_layer_id().unwrap();
        (state, id)
    }

    #[tokio::test]
    async fn edit_without_selection_stretches_to_active_layer() {
        let (mut state, base) = state_with_layer(800, 600);
        let origin = state.active_layer().unwrap().position();
        let mut orch = orchestrator(ScriptedGenerator::ok(1024, 1024));

        let report = orch.generate(&mut state, "make it blue").await;

        let id = report.layer_id().expect("layer created");
        let layer = state.stack().get(id).unwrap();
        assert_eq!(layer.bitmap().dimensions(), (800, 600));
        assert_eq!(layer.position(), origin);
        assert_eq!(layer.name(), "Edit: make it blue...");
        assert_eq!(layer.cost(), Some(0.0396));
        assert!(layer.preview().is_some());
        assert_eq!(state.active_layer_id(), Some(id));
        assert_eq!(state.layers().len(), 2);
        assert!(state.stack().contains(base));

        let request = orch.generator().last_request();
        assert!(request.is_edit());
        assert!(request.region_hint.is_none());
        assert!(!orch.is_busy());
    }

    #[tokio::test]
    async fn tiny_selection_is_treated_as_no_selection() {
        let (mut state, _) = state_with_layer(200, 200);
        state.apply(EditorCommand::SetSelection(Some(SelectionRect::new(
            10.0, 10.0, 4.0, 50.0,
        ))));
        let mut orch = orchestrator(ScriptedGenerator::ok(200, 200));

        orch.generate(&mut state, "sky").await;

        let request = orch.generator().last_request();
        assert!(request.region_hint.is_none());
        assert_eq!(
            request.base_image.map(|b| b.dimensions()),
            Some((200, 200))
        );
    }

    #[tokio::test]
    async fn meaningful_selection_becomes_region_hint() {
        let (mut state, _) = state_with_layer(200, 100);
        state.apply(EditorCommand::SetSelection(Some(SelectionRect::new(
            50.0, 25.0, 100.0, 50.0,
        ))));
        let mut orch = orchestrator(ScriptedGenerator::ok(200, 100));

        orch.generate(&mut state, "a cat").await;

        let request = orch.generator().last_request();
        let hint = request.region_hint.expect("region hint");
        assert_eq!((hint.x, hint.y, hint.width, hint.height), (25, 25, 50, 50));
        assert!(state.selection().is_none());
    }

    #[tokio::test]
    async fn crop_to_selection_sends_crop_and_fits_to_it() {
        let (mut state, _) = state_with_layer(200, 100);
        state.apply(EditorCommand::SetOptions(GenerationOptions {
            crop_to_selection: true,
            ..GenerationOptions::default()
        }));
        state.apply(EditorCommand::SetSelection(Some(SelectionRect::new(
            20.0, 10.0, 60.0, 40.0,
        ))));
        let mut orch = orchestrator(ScriptedGenerator::ok(512, 512));

        let report = orch.generate(&mut state, "door").await;

        let request = orch.generator().last_request();
        assert!(request.region_hint.is_none());
        assert_eq!(request.base_image.map(|b| b.dimensions()), Some((60, 40)));

        let layer = state.stack().get(report.layer_id().unwrap()).unwrap();
        assert_eq!(layer.bitmap().dimensions(), (60, 40));
        assert_abs_diff_eq!(layer.position().x, 20.0);
        assert_abs_diff_eq!(layer.position().y, 10.0);
    }

    #[tokio::test]
    async fn aspect_ratio_override_keeps_natural_size_centered_on_active() {
        let (mut state, _) = state_with_layer(400, 400);
        state.apply(EditorCommand::SetOptions(GenerationOptions {
            aspect_ratio: Some(AspectRatio::Landscape16x9),
            ..GenerationOptions::default()
        }));
        let mut orch = orchestrator(ScriptedGenerator::ok(160, 90));

        let report = orch.generate(&mut state, "wide").await;

        let layer = state.stack().get(report.layer_id().unwrap()).unwrap();
        assert_eq!(layer.bitmap().dimensions(), (160, 90));
        assert_abs_diff_eq!(layer.position().x, 120.0);
        assert_abs_diff_eq!(layer.position().y, 155.0);
        assert_eq!(state.canvas(), CanvasSize::new(400, 400));
    }

    #[tokio::test]
    async fn text_to_image_on_empty_canvas_adopts_result_size() {
        let mut state = EditorState::new();
        let mut orch = orchestrator(ScriptedGenerator::ok(300, 200));

        let report = orch.generate(&mut state, "a forest at night with fireflies").await;

        let layer = state.stack().get(report.layer_id().unwrap()).unwrap();
        assert_eq!(state.canvas(), CanvasSize::new(300, 200));
        assert_eq!(layer.position(), CanvasPoint::new(0.0, 0.0));
        assert_eq!(layer.name(), "Generate: a forest at nig...");
        assert!(!orch.generator().last_request().is_edit());
    }

    #[tokio::test]
    async fn text_to_image_centers_on_canvas_without_active_layer() {
        let (mut state, _) = state_with_layer(400, 300);
        state.apply(EditorCommand::SelectLayer(None));
        let mut orch = orchestrator(ScriptedGenerator::ok(100, 100));

        let report = orch.generate(&mut state, "moon").await;

        let layer = state.stack().get(report.layer_id().unwrap()).unwrap();
        assert_abs_diff_eq!(layer.position().x, 150.0);
        assert_abs_diff_eq!(layer.position().y, 100.0);
    }

    #[tokio::test]
    async fn failure_leaves_stack_untouched_and_clears_busy() {
        let (mut state, _) = state_with_layer(100, 100);
        let mut orch = orchestrator(ScriptedGenerator::failing(GenerationError::network(
            "connection reset",
        )));

        let report = orch.generate(&mut state, "anything").await;

        match report {
            GenerationReport::Failed(err) => {
                assert_eq!(err.kind, GenerationErrorKind::Network);
                assert_eq!(err.message, "connection reset");
            }
            other => panic!("expected failure, got {other:?}"),
        }
        assert_eq!(state.layers().len(), 1);
        assert!(!orch.is_busy());
        assert_eq!(orch.phase(), Phase::Idle);
    }

    #[tokio::test]
    async fn result_for_deleted_target_resizes_empty_canvas() {
        let (mut state, base) = state_with_layer(300, 200);
        let mut orch = orchestrator(ScriptedGenerator::ok(512, 512));

        let pending = orch.begin(&state, "make it blue").unwrap();
        state.apply(EditorCommand::DeleteLayer(base));
        assert!(state.canvas().is_empty());
        let result = orch.dispatch(&pending).await;
        let report = orch.complete(&mut state, pending, result);

        let id = report.layer_id().expect("layer created");
        let layer = state.stack().get(id).unwrap();
        assert_eq!(layer.bitmap().dimensions(), (300, 200));
        assert_eq!(layer.position(), CanvasPoint::new(0.0, 0.0));
        assert_eq!(state.canvas(), CanvasSize::new(300, 200));
        let flat = crate::application::editor::compositor::render(state.layers(), state.canvas());
        assert_eq!(flat.dimensions(), (300, 200));
    }

    #[tokio::test]
    async fn empty_image_is_a_failure() {
        let (mut state, _) = state_with_layer(100, 100);
        let mut orch = orchestrator(ScriptedGenerator::ok(0, 0));

        let report = orch.generate(&mut state, "nothing").await;

        assert!(matches!(
            report,
            GenerationReport::Failed(GenerationError {
                kind: GenerationErrorKind::EmptyResponse,
                ..
            })
        ));
        assert_eq!(state.layers().len(), 1);
    }

    #[test]
    fn input_errors_are_rejected_before_building() {
        let (state, _) = state_with_layer(10, 10);
        let mut orch = orchestrator(ScriptedGenerator::ok(10, 10));

        assert_eq!(
            orch.begin(&state, "   ").unwrap_err(),
            GenerationRejected::EmptyPrompt
        );
        assert!(!orch.is_busy());

        let _pending = orch.begin(&state, "first").unwrap();
        assert!(orch.is_busy());
        assert_eq!(orch.begin(&state, "second").unwrap_err(), GenerationRejected::Busy);
    }

    #[test]
    fn references_are_captured_at_begin() {
        let (mut state, first) = state_with_layer(10, 10);
        state.apply(EditorCommand::AddImageLayer {
            name: "second".into(),
            bitmap: Bitmap::filled(10, 10, [0, 255, 0, 255]),
        });
        state.apply(EditorCommand::ToggleReference(first));
        let mut orch = orchestrator(ScriptedGenerator::ok(10, 10));

        let pending = orch.begin(&state, "blend").unwrap();
        state.apply(EditorCommand::DeleteLayer(first));

        assert_eq!(pending.request().reference_images.len(), 1);
        assert_eq!(
            pending.request().reference_images[0].pixel(0, 0),
            Some([255, 0, 0, 255])
        );
    }

    #[tokio::test]
    async fn successful_generation_is_recorded_in_history() {
        let (mut state, _) = state_with_layer(64, 64);
        let mut orch =
            orchestrator(ScriptedGenerator::ok(64, 64)).with_history(Box::new(MemoryHistory::default()));

        orch.generate(&mut state, "record me").await;

        let page = orch.history().unwrap().list(1, 20).unwrap();
        assert_eq!(page.total, 1);
        let record = &page.records[0];
        assert_eq!(record.prompt, "record me");
        assert_eq!(record.model, "fal-ai/nano-banana/edit");
        assert_eq!(record.request_id.as_deref(), Some("req-1"));
        assert_eq!((record.width, record.height), (64, 64));
    }

    #[tokio::test]
    async fn history_failure_does_not_undo_generation() {
        let (mut state, _) = state_with_layer(32, 32);
        let mut orch = orchestrator(ScriptedGenerator::ok(32, 32)).with_history(Box::new(BrokenHistory));

        let report = orch.generate(&mut state, "keep me").await;

        match &report {
            GenerationReport::Created {
                history_warning, ..
            } => assert_eq!(*history_warning, Some("notification-history-corrupted")),
            other => panic!("expected layer, got {other:?}"),
        }
        assert_eq!(state.layers().len(), 2);
        assert_eq!(report.notifications().len(), 2);
    }

    #[tokio::test]
    async fn analysis_requires_active_layer_and_stores_answers() {
        let mut state = EditorState::new();
        let mut orch = orchestrator(ScriptedGenerator::ok(1, 1));
        let analyzer = FixedAnalyzer(Ok("A red square.".into()));

        assert_eq!(
            orch.analyze(&analyzer, &mut state, "").await,
            AnalysisReport::Rejected(GenerationRejected::NoActiveLayer)
        );

        let (mut state, _) = state_with_layer(8, 8);
        assert_eq!(
            orch.analyze(&analyzer, &mut state, "   ").await,
            AnalysisReport::Rejected(GenerationRejected::EmptyPrompt)
        );
        assert!(state.analysis_results().is_empty());

        let report = orch.analyze(&analyzer, &mut state, "what colour is it?").await;
        assert_eq!(report, AnalysisReport::Answered("A red square.".into()));

        let blank = FixedAnalyzer(Ok("  ".into()));
        orch.analyze(&blank, &mut state, "what is it?").await;

        let texts: Vec<_> = state.analysis_results().iter().map(|r| r.text.as_str()).collect();
        assert_eq!(texts, vec![EMPTY_ANALYSIS, "A red square."]);
        assert!(!orch.is_busy());
    }

    #[test]
    fn failure_notification_carries_status_and_message() {
        let report = GenerationReport::Failed(GenerationError::from_status(400, "bad prompt"));
        let notifications = report.notifications();
        assert_eq!(notifications.len(), 1);
        assert_eq!(
            notifications[0].message_key(),
            "notification-generation-api-error"
        );
        assert_eq!(notifications[0].arg("status"), Some("400"));
        assert_eq!(notifications[0].arg("message"), Some("bad prompt"));
    }
}
