// SPDX-License-Identifier: MPL-2.0
//! Internationalization (i18n) support for the application.
//!
//! Localization uses the Fluent system with translation files embedded at
//! build time from `assets/i18n/`.
//!
//! # Features
//!
//! - Automatic locale detection from CLI, config, or system settings
//! - Message arguments for notifications (`{ $status }`, `{ $path }`)
//! - Fallback to `en-US` when a locale is unavailable

pub mod fluent;
