// SPDX-License-Identifier: MPL-2.0
//! Generation history port definition.
//!
//! The history log is append-only: the editor records each successful
//! generation and browses past ones page by page. There is no update or
//! delete.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A generation to be recorded. The store assigns id, timestamp and
/// content references.
#[derive(Debug, Clone)]
pub struct NewHistoryRecord {
    pub prompt: String,
    /// Billing key of the model, e.g. `fal-ai/nano-banana/edit`.
    pub model: String,
    pub cost: Option<f64>,
    pub width: u32,
    pub height: u32,
    pub aspect_ratio: Option<String>,
    pub resolution: Option<String>,
    pub request_id: Option<String>,
    /// Full-size result, PNG encoded.
    pub image_png: Vec<u8>,
    /// Preview, PNG encoded.
    pub thumbnail_png: Option<Vec<u8>>,
}

/// A stored generation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryRecord {
    pub id: u64,
    pub prompt: String,
    pub model: String,
    /// Content hash of the full-size image.
    pub image_ref: String,
    pub thumbnail_ref: Option<String>,
    pub cost: Option<f64>,
    pub width: u32,
    pub height: u32,
    #[serde(default)]
    pub aspect_ratio: Option<String>,
    #[serde(default)]
    pub resolution: Option<String>,
    #[serde(default)]
    pub request_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// One page of history, newest first.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryPage {
    pub records: Vec<HistoryRecord>,
    /// Number of records in the whole log.
    pub total: usize,
    /// 1-based page number.
    pub page: usize,
    pub page_size: usize,
}

impl HistoryPage {
    /// Number of pages needed for `total` records.
    #[must_use]
    pub fn page_count(&self) -> usize {
        if self.page_size == 0 {
            return 0;
        }
        self.total.div_ceil(self.page_size)
    }

    #[must_use]
    pub fn has_next(&self) -> bool {
        self.page < self.page_count()
    }
}

/// Errors from a history store.
#[derive(Debug, thiserror::Error)]
pub enum HistoryError {
    #[error("History I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("History index is corrupted: {0}")]
    Corrupted(String),

    #[error("History record not found: {0}")]
    NotFound(u64),
}

impl HistoryError {
    /// Returns the i18n key for this error.
    #[must_use]
    pub fn i18n_key(&self) -> &'static str {
        match self {
            HistoryError::Io(_) => "notification-history-io-error",
            HistoryError::Corrupted(_) => "notification-history-corrupted",
            HistoryError::NotFound(_) => "notification-history-not-found",
        }
    }
}

/// Port for the generation log.
pub trait HistoryStore: Send {
    /// Records a generation and returns the stored record.
    ///
    /// # Errors
    ///
    /// Returns a [`HistoryError`] if the record cannot be persisted.
    fn append(&mut self, record: NewHistoryRecord) -> Result<HistoryRecord, HistoryError>;

    /// Lists records newest first. `page` is 1-based; page 0 is treated as 1.
    ///
    /// # Errors
    ///
    /// Returns a [`HistoryError`] if the log cannot be read.
    fn list(&self, page: usize, page_size: usize) -> Result<HistoryPage, HistoryError>;

    /// Loads the full-size PNG bytes of a record.
    ///
    /// # Errors
    ///
    /// Returns a [`HistoryError`] if the image is missing or unreadable.
    fn load_image(&self, record: &HistoryRecord) -> Result<Vec<u8>, HistoryError>;
}

/// Slices `records` (oldest first) into a newest-first page.
#[must_use]
pub fn paginate(records: &[HistoryRecord], page: usize, page_size: usize) -> HistoryPage {
    let page = page.max(1);
    let records_page = records
        .iter()
        .rev()
        .skip((page - 1).saturating_mul(page_size))
        .take(page_size)
        .cloned()
        .collect();
    HistoryPage {
        records: records_page,
        total: records.len(),
        page,
        page_size,
    }
}
