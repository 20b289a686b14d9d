// SPDX-License-Identifier: MPL-2.0
//! `nano_layer` is a layered image editing engine driven by remote
//! generative models.
//!
//! Layers are stacked on a canvas, composited into one image and edited by
//! prompt through fal.ai or Gemini. Results land back on the canvas as new
//! layers and are recorded in a local generation history.
//!
//! The crate is split the usual way: pure [`domain`] types, [`application`]
//! use cases behind port traits, and [`infrastructure`] adapters for the
//! codec, the HTTP providers and the file system.

#![doc(html_root_url = "https://docs.rs/nano_layer/0.1.0")]

pub mod app;
pub mod application;
pub mod config;
pub mod domain;
pub mod error;
pub mod i18n;
pub mod infrastructure;
pub mod notifications;

#[cfg(test)]
pub(crate) mod test_utils;
