// SPDX-License-Identifier: MPL-2.0
//! Application layer - Use cases and orchestration.
//!
//! - [`port`]: Trait definitions (interfaces) for dependency inversion
//! - [`editor`]: Editor state, layer stack, compositing and generation use cases
//!
//! # Dependency Rule
//!
//! - Application layer depends on domain layer (uses domain types)
//! - Infrastructure layer implements application layer ports
//! - The binary wires infrastructure adapters into the editor
//!
//! # Example
//!
//! ```ignore
//! use nano_layer::application::editor::{EditorState, GenerationOrchestrator};
//! use nano_layer::infrastructure::{FalClient, ImageRsCodec};
//!
//! let mut state = EditorState::new();
//! let mut orchestrator = GenerationOrchestrator::new(fal_client, Arc::new(ImageRsCodec));
//! let report = orchestrator.generate(&mut state, "a lighthouse at dusk").await;
//! ```

pub mod editor;
pub mod port;
