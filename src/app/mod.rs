// SPDX-License-Identifier: MPL-2.0
//! Application root: wires settings, session state, localization and
//! notifications around one [`EditorState`].
//!
//! The command-line front end drives the editor through [`App`]. Every
//! outcome is reported as a notification; nothing here aborts on a failed
//! action.

pub mod paths;
pub mod persisted_state;

use crate::application::editor::{
    ingest, AnalysisReport, EditorCommand, EditorState, GenerationOrchestrator,
    GenerationOptions, GenerationReport,
};
use crate::application::port::{
    BitmapCodec, HistoryError, HistoryPage, HistoryStore, ImageFormat,
};
use crate::config::{self, defaults, Config};
use crate::domain::{AspectRatio, GenerationModel, LayerId, ResolutionTier, SelectionRect};
use crate::i18n::fluent::I18n;
use crate::infrastructure::{
    analyzer_from_config, ConfiguredGenerator, FileHistoryStore, ImageFileImporter, ImageRsCodec,
};
use crate::notifications::{Manager, Notification};
use persisted_state::AppState;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Runtime flags, usually parsed from the command line.
#[derive(Debug, Clone, Default)]
pub struct Flags {
    /// Optional locale override in BCP-47 form (e.g. `zh-CN`, `en-US`).
    pub lang: Option<String>,
    /// Optional data directory override (state and history).
    /// Takes precedence over `NANO_LAYER_DATA_DIR`.
    pub data_dir: Option<String>,
    /// Optional config directory override (for settings.toml).
    /// Takes precedence over `NANO_LAYER_CONFIG_DIR`.
    pub config_dir: Option<String>,
    pub model: Option<GenerationModel>,
    pub aspect_ratio: Option<AspectRatio>,
    pub resolution: Option<ResolutionTier>,
    pub style_instruction: Option<String>,
    pub crop_to_selection: bool,
}

pub struct App {
    config: Config,
    state: AppState,
    i18n: I18n,
    notifications: Manager,
    editor: EditorState,
    codec: Arc<dyn BitmapCodec>,
    model: GenerationModel,
    /// Data directory override for state and history; `None` uses the
    /// resolved app data dir.
    data_dir: Option<PathBuf>,
}

impl std::fmt::Debug for App {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("App")
            .field("model", &self.model)
            .field("layers", &self.editor.layers().len())
            .field("locale", self.i18n.current_locale())
            .finish_non_exhaustive()
    }
}

impl App {
    /// Loads settings and session state, then applies `flags`.
    pub fn new(flags: &Flags) -> Self {
        paths::init_cli_overrides(flags.data_dir.clone(), flags.config_dir.clone());

        let mut startup_warnings = Vec::new();
        let config = match config::load() {
            Ok(config) => config,
            Err(err) => {
                tracing::warn!(error = %err, "cannot load settings, using defaults");
                startup_warnings.push(err.i18n_key().to_string());
                Config::default()
            }
        }
        .with_env_overrides();

        let (state, state_warning) = AppState::load();
        startup_warnings.extend(state_warning);

        let mut app = Self::from_parts(config, state, flags, None);
        for key in startup_warnings {
            app.notifications.push(Notification::warning(key));
        }
        app
    }

    /// Builds an app from already loaded parts. `data_dir` overrides where
    /// state and history are written.
    pub fn from_parts(
        config: Config,
        state: AppState,
        flags: &Flags,
        data_dir: Option<PathBuf>,
    ) -> Self {
        let i18n = I18n::new(flags.lang.clone(), &config);
        let model = resolve_model(flags.model, &config, &state);

        let mut options = state.generation_options();
        if flags.aspect_ratio.is_some() {
            options.aspect_ratio = flags.aspect_ratio;
        }
        if flags.resolution.is_some() {
            options.resolution = flags.resolution;
        }
        if let Some(style) = &flags.style_instruction {
            options.style_instruction = Some(style.clone()).filter(|s| !s.trim().is_empty());
        }
        if flags.crop_to_selection {
            options.crop_to_selection = true;
        }

        let mut editor = EditorState::new();
        editor.apply(EditorCommand::SetOptions(options));

        Self {
            config,
            state,
            i18n,
            notifications: Manager::new(),
            editor,
            codec: Arc::new(ImageRsCodec),
            model,
            data_dir,
        }
    }

    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    #[must_use]
    pub fn i18n(&self) -> &I18n {
        &self.i18n
    }

    #[must_use]
    pub fn editor(&self) -> &EditorState {
        &self.editor
    }

    #[must_use]
    pub fn model(&self) -> GenerationModel {
        self.model
    }

    #[must_use]
    pub fn options(&self) -> &GenerationOptions {
        self.editor.options()
    }

    /// Applies an editor command directly.
    pub fn apply(&mut self, command: EditorCommand) -> bool {
        self.editor.apply(command)
    }

    /// Replaces the document with an image file.
    pub fn open_document(&mut self, path: &Path) -> bool {
        match ingest::import_document(&mut self.editor, &ImageFileImporter::new(), path) {
            Ok(()) => {
                self.state.set_last_open_directory_from_file(path);
                self.persist_state();
                true
            }
            Err(err) => {
                self.notifications.push(
                    Notification::error(err.i18n_key())
                        .with_arg("path", path.display().to_string()),
                );
                false
            }
        }
    }

    /// Adds an image file as a new layer on top of the stack.
    pub fn paste_file(&mut self, path: &Path) -> Option<LayerId> {
        let bytes = match std::fs::read(path) {
            Ok(bytes) => bytes,
            Err(err) => {
                tracing::warn!(path = %path.display(), error = %err, "cannot read image");
                self.notifications
                    .push(Notification::error("notification-import-io-error"));
                return None;
            }
        };
        let name = path
            .file_stem()
            .and_then(|stem| stem.to_str())
            .unwrap_or("image");
        match ingest::paste_bytes(
            &mut self.editor,
            self.codec.as_ref(),
            name,
            &bytes,
            defaults::THUMBNAIL_MAX_EDGE,
        ) {
            Ok(id) => Some(id),
            Err(err) => {
                self.notifications.push(Notification::error(err.i18n_key()));
                None
            }
        }
    }

    /// Pastes an image file and marks it as a reference layer.
    pub fn add_reference(&mut self, path: &Path) -> Option<LayerId> {
        let id = self.paste_file(path)?;
        self.editor.apply(EditorCommand::ToggleReference(id));
        Some(id)
    }

    pub fn select_layer(&mut self, id: Option<LayerId>) -> bool {
        self.editor.apply(EditorCommand::SelectLayer(id))
    }

    pub fn set_selection(&mut self, selection: Option<SelectionRect>) {
        self.editor.apply(EditorCommand::SetSelection(selection));
    }

    /// Flattens the canvas and writes it to `path`; the format follows the
    /// file extension, PNG when unknown.
    pub fn export_to(&mut self, path: &Path) -> bool {
        let format = path
            .extension()
            .and_then(|ext| ext.to_str())
            .and_then(ImageFormat::from_extension)
            .unwrap_or_default();
        let bytes = match ingest::export(&self.editor, self.codec.as_ref(), format) {
            Ok(bytes) => bytes,
            Err(err) => {
                self.notifications.push(Notification::error(err.i18n_key()));
                return false;
            }
        };
        if let Err(err) = std::fs::write(path, bytes) {
            tracing::warn!(path = %path.display(), error = %err, "export failed");
            self.notifications.push(Notification::error("error-io"));
            return false;
        }
        self.notifications.push(
            Notification::success("notification-export-success")
                .with_arg("path", path.display().to_string()),
        );
        self.state.set_last_export_directory_from_file(path);
        self.persist_state();
        true
    }

    /// Runs one generation with the current model and options.
    pub async fn generate(&mut self, prompt: &str) -> Option<LayerId> {
        let mut orchestrator = self.orchestrator()?;
        match FileHistoryStore::open_in_data_dir(self.data_dir.clone()) {
            Ok(store) => orchestrator = orchestrator.with_history(Box::new(store)),
            Err(err) => {
                tracing::warn!(error = %err, "history unavailable");
                self.notifications.push(Notification::warning(err.i18n_key()));
            }
        }

        let report = orchestrator.generate(&mut self.editor, prompt).await;
        self.show_generation_report(&report);
        let layer_id = report.layer_id();
        if layer_id.is_some() {
            let options = self.editor.options().clone();
            self.state.remember_generation_options(&options);
            self.state.last_model = Some(self.model.id().to_string());
            self.persist_state();
        }
        layer_id
    }

    /// Asks Gemini about the active layer.
    pub async fn analyze(&mut self, prompt: &str) -> Option<String> {
        let analyzer = match analyzer_from_config(&self.config) {
            Ok(analyzer) => analyzer,
            Err(err) => {
                self.notifications.push(
                    Notification::error(err.i18n_key()).with_arg("message", err.message),
                );
                return None;
            }
        };
        let mut orchestrator = self.orchestrator()?;
        let report = orchestrator
            .analyze(&analyzer, &mut self.editor, prompt)
            .await;
        self.notifications.push(report.notification());
        match report {
            AnalysisReport::Answered(text) => Some(text),
            _ => None,
        }
    }

    /// One page of the generation history, newest first.
    pub fn history_page(&mut self, page: usize) -> Option<HistoryPage> {
        let page_size = self.config.history_page_size();
        let result = FileHistoryStore::open_in_data_dir(self.data_dir.clone())
            .and_then(|store| store.list(page, page_size));
        match result {
            Ok(page) => Some(page),
            Err(err) => {
                self.notifications.push(Notification::error(err.i18n_key()));
                None
            }
        }
    }

    /// Adds a stored generation to the canvas as a new layer.
    pub fn restore_history(&mut self, id: u64) -> Option<LayerId> {
        let result = FileHistoryStore::open_in_data_dir(self.data_dir.clone())
            .map_err(ingest::LoadError::from)
            .and_then(|store| {
                let record = store
                    .get(id)
                    .cloned()
                    .ok_or(HistoryError::NotFound(id))?;
                ingest::load_history_record(
                    &mut self.editor,
                    &store,
                    self.codec.as_ref(),
                    &record,
                    defaults::THUMBNAIL_MAX_EDGE,
                )
            });
        match result {
            Ok(layer_id) => Some(layer_id),
            Err(err) => {
                self.notifications.push(Notification::error(err.i18n_key()));
                None
            }
        }
    }

    /// A successful generation supersedes earlier generation failures.
    fn show_generation_report(&mut self, report: &GenerationReport) {
        if report.layer_id().is_some() {
            self.notifications.clear_generation_errors();
        }
        for notification in report.notifications() {
            self.notifications.push(notification);
        }
    }

    /// Resolves every pending notification to text and clears them.
    pub fn take_messages(&mut self) -> Vec<String> {
        let mut lines = Vec::new();
        while self.notifications.visible_count() > 0 {
            lines.extend(self.notifications.render(&self.i18n));
            let ids: Vec<_> = self.notifications.visible().map(Notification::id).collect();
            for id in ids {
                self.notifications.dismiss(id);
            }
        }
        lines
    }

    fn orchestrator(&mut self) -> Option<GenerationOrchestrator<ConfiguredGenerator>> {
        match ConfiguredGenerator::from_config(&self.config, Some(self.model)) {
            Ok(generator) => Some(
                GenerationOrchestrator::new(generator, Arc::clone(&self.codec))
                    .with_thumbnail_edge(defaults::THUMBNAIL_MAX_EDGE),
            ),
            Err(err) => {
                self.notifications.push(
                    Notification::error(err.i18n_key()).with_arg("message", err.message),
                );
                None
            }
        }
    }

    fn persist_state(&mut self) {
        if let Some(key) = self.state.save_to(self.data_dir.clone()) {
            self.notifications.push(Notification::warning(key));
        }
    }
}

/// CLI model > configured model > last used model > provider default.
fn resolve_model(cli: Option<GenerationModel>, config: &Config, state: &AppState) -> GenerationModel {
    if let Some(model) = cli {
        return model;
    }
    if config.model.is_none() {
        if let Some(model) = state.last_model.as_deref().and_then(|m| m.parse().ok()) {
            return model;
        }
    }
    config.generation_model()
}
