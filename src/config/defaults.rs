// SPDX-License-Identifier: MPL-2.0
//! Centralized default values for all configuration constants.
//!
//! This module serves as the single source of truth for default values
//! used across the application. Constants are organized by category.
//!
//! # Categories
//!
//! - **Selection**: Minimum selection size treated as a region
//! - **Thumbnails**: Layer preview size
//! - **History**: Page size bounds for browsing past generations
//! - **Network**: Request timeout bounds and provider endpoints

use crate::domain::geometry::selection_bounds;

// ==========================================================================
// Selection Defaults
// ==========================================================================

/// Selections must be larger than this on both axes to be sent as a region.
pub const MIN_SELECTION_PX: f32 = selection_bounds::MIN_MEANINGFUL_PX;

// ==========================================================================
// Thumbnail Defaults
// ==========================================================================

/// Longest edge of a layer preview, in pixels.
pub const THUMBNAIL_MAX_EDGE: u32 = 80;

// ==========================================================================
// History Defaults
// ==========================================================================

/// Default number of history records per page.
pub const DEFAULT_HISTORY_PAGE_SIZE: usize = 20;

/// Minimum history page size.
pub const MIN_HISTORY_PAGE_SIZE: usize = 1;

/// Maximum history page size.
pub const MAX_HISTORY_PAGE_SIZE: usize = 100;

// ==========================================================================
// Network Defaults
// ==========================================================================

/// Default timeout for one generation request (in seconds).
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 120;

/// Minimum request timeout (in seconds).
pub const MIN_REQUEST_TIMEOUT_SECS: u64 = 5;

/// Maximum request timeout (in seconds).
pub const MAX_REQUEST_TIMEOUT_SECS: u64 = 600;

/// Default fal.ai synchronous endpoint.
pub const DEFAULT_FAL_BASE_URL: &str = "https://fal.run";

/// Default Gemini REST endpoint.
pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Model used for image analysis.
pub const ANALYSIS_MODEL: &str = "gemini-3-pro-preview";

// ==========================================================================
// Compile-time Validation
// ==========================================================================

const _: () = {
    assert!(MIN_SELECTION_PX > 0.0);
    assert!(THUMBNAIL_MAX_EDGE > 0);

    assert!(MIN_HISTORY_PAGE_SIZE > 0);
    assert!(MAX_HISTORY_PAGE_SIZE >= MIN_HISTORY_PAGE_SIZE);
    assert!(DEFAULT_HISTORY_PAGE_SIZE >= MIN_HISTORY_PAGE_SIZE);
    assert!(DEFAULT_HISTORY_PAGE_SIZE <= MAX_HISTORY_PAGE_SIZE);

    assert!(MIN_REQUEST_TIMEOUT_SECS > 0);
    assert!(MAX_REQUEST_TIMEOUT_SECS >= MIN_REQUEST_TIMEOUT_SECS);
    assert!(DEFAULT_REQUEST_TIMEOUT_SECS >= MIN_REQUEST_TIMEOUT_SECS);
    assert!(DEFAULT_REQUEST_TIMEOUT_SECS <= MAX_REQUEST_TIMEOUT_SECS);
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selection_threshold_matches_domain() {
        assert_eq!(MIN_SELECTION_PX, 5.0);
    }

    #[test]
    fn history_defaults_are_valid() {
        assert_eq!(DEFAULT_HISTORY_PAGE_SIZE, 20);
        assert!(DEFAULT_HISTORY_PAGE_SIZE <= MAX_HISTORY_PAGE_SIZE);
    }

    #[test]
    fn timeout_defaults_are_valid() {
        assert_eq!(DEFAULT_REQUEST_TIMEOUT_SECS, 120);
        assert!(DEFAULT_REQUEST_TIMEOUT_SECS >= MIN_REQUEST_TIMEOUT_SECS);
    }

    #[test]
    fn endpoints_have_no_trailing_slash() {
        assert!(!DEFAULT_FAL_BASE_URL.ends_with('/'));
        assert!(!DEFAULT_GEMINI_BASE_URL.ends_with('/'));
    }
}
