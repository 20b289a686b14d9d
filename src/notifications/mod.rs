// SPDX-License-Identifier: MPL-2.0
//! User-facing notifications.
//!
//! Outcomes of editor actions (generation finished, import failed, history
//! unavailable) are reported as [`Notification`]s carrying an i18n key and
//! arguments. Text is resolved only when displayed, so a language switch
//! re-renders pending notifications in the new locale.
//!
//! # Components
//!
//! - [`notification`] - Core `Notification` struct with severity levels
//! - [`manager`] - `Manager` for queuing and lifecycle management
//!
//! # Usage
//!
//! ```ignore
//! use nano_layer::notifications::{Manager, Notification};
//!
//! let mut manager = Manager::new();
//! manager.push(Notification::success("notification-export-success").with_arg("path", "out.png"));
//! for line in manager.render(&i18n) {
//!     println!("{line}");
//! }
//! ```

mod manager;
mod notification;

pub use manager::Manager;
pub use notification::{Notification, NotificationId, Severity};
