// SPDX-License-Identifier: MPL-2.0
//! On-disk [`HistoryStore`].
//!
//! Layout under the history directory:
//!
//! ```text
//! history/
//! ├── index.cbor          # ordered records + next id
//! └── images/
//!     └── <blake3>.png    # content-addressed full images and thumbnails
//! ```
//!
//! Images are named by content hash, so regenerating an identical image
//! reuses the existing file.

use crate::application::port::history::paginate;
use crate::application::port::{
    HistoryError, HistoryPage, HistoryRecord, HistoryStore, NewHistoryRecord,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

const INDEX_FILE: &str = "index.cbor";
const IMAGES_DIR: &str = "images";

#[derive(Debug, Default, Serialize, Deserialize)]
struct HistoryIndex {
    next_id: u64,
    records: Vec<HistoryRecord>,
}

/// History kept in a directory, oldest record first in the index.
#[derive(Debug)]
pub struct FileHistoryStore {
    root: PathBuf,
    index: HistoryIndex,
}

impl FileHistoryStore {
    /// Opens (or creates) the store rooted at `root`.
    ///
    /// # Errors
    ///
    /// Returns [`HistoryError::Io`] if the directory cannot be created and
    /// [`HistoryError::Corrupted`] if an existing index cannot be parsed.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, HistoryError> {
        let root = root.into();
        fs::create_dir_all(root.join(IMAGES_DIR))?;
        let index = match fs::File::open(root.join(INDEX_FILE)) {
            Ok(file) => ciborium::de::from_reader(file)
                .map_err(|e| HistoryError::Corrupted(e.to_string()))?,
            Err(err) if err.kind() == ErrorKind::NotFound => HistoryIndex::default(),
            Err(err) => return Err(err.into()),
        };
        tracing::debug!(
            root = %root.display(),
            records = index.records.len(),
            "history opened"
        );
        Ok(Self { root, index })
    }

    /// Opens the store in the `history` directory of the app data dir, or
    /// of `data_dir` when given.
    ///
    /// # Errors
    ///
    /// See [`Self::open`]. Also fails with [`HistoryError::Io`] when no data
    /// directory can be determined.
    pub fn open_in_data_dir(data_dir: Option<PathBuf>) -> Result<Self, HistoryError> {
        let dir = crate::app::paths::get_history_dir_with_override(data_dir).ok_or_else(|| {
            HistoryError::Io(std::io::Error::new(
                ErrorKind::NotFound,
                "no data directory available",
            ))
        })?;
        Self::open(dir)
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.index.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.index.records.is_empty()
    }

    /// Looks up a record by id.
    #[must_use]
    pub fn get(&self, id: u64) -> Option<&HistoryRecord> {
        self.index.records.iter().find(|r| r.id == id)
    }

    /// Reads the thumbnail of a record, if one was stored.
    ///
    /// # Errors
    ///
    /// Returns [`HistoryError::Io`] if the file exists but cannot be read.
    pub fn load_thumbnail(&self, record: &HistoryRecord) -> Result<Option<Vec<u8>>, HistoryError> {
        let Some(reference) = &record.thumbnail_ref else {
            return Ok(None);
        };
        match fs::read(self.image_path(reference)) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    fn image_path(&self, reference: &str) -> PathBuf {
        self.root.join(IMAGES_DIR).join(format!("{reference}.png"))
    }

    /// Writes `bytes` under their content hash and returns the hash.
    fn store_blob(&self, bytes: &[u8]) -> Result<String, HistoryError> {
        let hash = blake3::hash(bytes).to_hex().to_string();
        let path = self.image_path(&hash);
        if !path.exists() {
            fs::write(&path, bytes)?;
        }
        Ok(hash)
    }

    /// Writes the index to a temporary file and renames it into place.
    fn save_index(&self) -> Result<(), HistoryError> {
        let tmp = self.root.join(format!("{INDEX_FILE}.tmp"));
        let file = fs::File::create(&tmp)?;
        ciborium::ser::into_writer(&self.index, file)
            .map_err(|e| HistoryError::Io(std::io::Error::other(e.to_string())))?;
        fs::rename(&tmp, self.root.join(INDEX_FILE))?;
        Ok(())
    }
}

impl HistoryStore for FileHistoryStore {
    fn append(&mut self, record: NewHistoryRecord) -> Result<HistoryRecord, HistoryError> {
        let image_ref = self.store_blob(&record.image_png)?;
        let thumbnail_ref = record
            .thumbnail_png
            .as_deref()
            .map(|bytes| self.store_blob(bytes))
            .transpose()?;

        let id = self.index.next_id.max(self.index.records.len() as u64) + 1;
        let stored = HistoryRecord {
            id,
            prompt: record.prompt,
            model: record.model,
            image_ref,
            thumbnail_ref,
            cost: record.cost,
            width: record.width,
            height: record.height,
            aspect_ratio: record.aspect_ratio,
            resolution: record.resolution,
            request_id: record.request_id,
            created_at: Utc::now(),
        };
        self.index.next_id = id;
        self.index.records.push(stored.clone());
        if let Err(err) = self.save_index() {
            self.index.records.pop();
            return Err(err);
        }
        tracing::info!(id, model = %stored.model, "history record appended");
        Ok(stored)
    }

    fn list(&self, page: usize, page_size: usize) -> Result<HistoryPage, HistoryError> {
        Ok(paginate(&self.index.records, page, page_size))
    }

    fn load_image(&self, record: &HistoryRecord) -> Result<Vec<u8>, HistoryError> {
        match fs::read(self.image_path(&record.image_ref)) {
            Ok(bytes) => Ok(bytes),
            Err(err) if err.kind() == ErrorKind::NotFound => Err(HistoryError::NotFound(record.id)),
            Err(err) => Err(err.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn new_record(prompt: &str, image: &[u8]) -> NewHistoryRecord {
        NewHistoryRecord {
            prompt: prompt.into(),
            model: "fal-ai/nano-banana".into(),
            cost: Some(0.0396),
            width: 4,
            height: 3,
            aspect_ratio: Some("4:3".into()),
            resolution: None,
            request_id: Some("req-1".into()),
            image_png: image.to_vec(),
            thumbnail_png: Some(b"thumb".to_vec()),
        }
    }

    #[test]
    fn records_survive_reopen_newest_first() {
        let dir = tempdir().expect("create temp dir");
        {
            let mut store = FileHistoryStore::open(dir.path()).unwrap();
            store.append(new_record("first", b"one")).unwrap();
            store.append(new_record("second", b"two")).unwrap();
        }

        let store = FileHistoryStore::open(dir.path()).unwrap();
        let page = store.list(1, 10).unwrap();
        let prompts: Vec<_> = page.records.iter().map(|r| r.prompt.as_str()).collect();
        assert_eq!(prompts, vec!["second", "first"]);
        assert_eq!(page.records[0].id, 2);
        assert_eq!(store.get(1).map(|r| r.prompt.as_str()), Some("first"));
        assert_eq!(page.records[1].aspect_ratio.as_deref(), Some("4:3"));
        assert_eq!(store.load_image(&page.records[1]).unwrap(), b"one");
        assert_eq!(
            store.load_thumbnail(&page.records[0]).unwrap().as_deref(),
            Some(b"thumb".as_slice())
        );
    }

    #[test]
    fn identical_images_share_one_file() {
        let dir = tempdir().expect("create temp dir");
        let mut store = FileHistoryStore::open(dir.path()).unwrap();
        let a = store.append(new_record("a", b"same")).unwrap();
        let b = store.append(new_record("b", b"same")).unwrap();

        assert_eq!(a.image_ref, b.image_ref);
        assert_ne!(a.id, b.id);
        assert_eq!(a.image_ref, blake3::hash(b"same").to_hex().to_string());
    }

    #[test]
    fn deleted_image_is_not_found() {
        let dir = tempdir().expect("create temp dir");
        let mut store = FileHistoryStore::open(dir.path()).unwrap();
        let record = store.append(new_record("gone", b"bytes")).unwrap();
        fs::remove_file(store.image_path(&record.image_ref)).unwrap();

        let err = store.load_image(&record).unwrap_err();
        assert!(matches!(err, HistoryError::NotFound(id) if id == record.id));
    }

    #[test]
    fn corrupted_index_is_reported() {
        let dir = tempdir().expect("create temp dir");
        fs::write(dir.path().join(INDEX_FILE), b"\xff\x00not cbor").unwrap();

        let err = FileHistoryStore::open(dir.path()).unwrap_err();
        assert_eq!(err.i18n_key(), "notification-history-corrupted");
    }

    #[test]
    fn empty_store_lists_empty_first_page() {
        let dir = tempdir().expect("create temp dir");
        let store = FileHistoryStore::open(dir.path().join("nested")).unwrap();
        assert!(store.is_empty());
        let page = store.list(1, 20).unwrap();
        assert!(page.records.is_empty());
        assert_eq!(page.page_count(), 0);
    }
}
