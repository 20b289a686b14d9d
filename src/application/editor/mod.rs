// SPDX-License-Identifier: MPL-2.0
//! Layered editor core.
//!
//! - [`mapper`]: screen/canvas coordinates, selections and region hints
//! - [`compositor`]: flattens the layer stack into one bitmap
//! - [`stack`]: ordered layers with dense z-indices
//! - [`state`]: editor state and the [`EditorCommand`] choke-point
//! - [`orchestrator`]: generation and analysis requests
//! - [`ingest`]: paste, import, history loading and export

pub mod compositor;
pub mod ingest;
pub mod mapper;
pub mod orchestrator;
pub mod stack;
pub mod state;

pub use ingest::LoadError;
pub use orchestrator::{
    AnalysisReport, GenerationOrchestrator, GenerationRejected, GenerationReport,
    PendingGeneration, Phase,
};
pub use stack::LayerStack;
pub use state::{
    centered_origin, AnalysisResult, EditorCommand, EditorState, GenerationOptions, ToolMode,
};
