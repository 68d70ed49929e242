use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;

use kassenbon_core::Receipt;

use crate::StoreError;

/// Result of merging one receipt into the dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Added,
    Updated,
}

/// In-memory receipt dataset bound to a JSON file on disk.
///
/// Loading and saving are explicit; nothing writes to disk until
/// [`ReceiptStore::save`] is called.
#[derive(Debug)]
pub struct ReceiptStore {
    path: PathBuf,
    receipts: Vec<Receipt>,
}

impl ReceiptStore {
    /// Loads the dataset from `path`. A missing file is an empty dataset,
    /// not an error — first run starts from nothing.
    ///
    /// # Errors
    ///
    /// - [`StoreError::Io`] if the file exists but cannot be read.
    /// - [`StoreError::Json`] if its contents are not a receipt collection.
    pub fn load(path: &Path) -> Result<Self, StoreError> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "dataset file missing, starting empty");
            return Ok(Self {
                path: path.to_path_buf(),
                receipts: Vec::new(),
            });
        }
        let raw = fs::read_to_string(path).map_err(|source| StoreError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let receipts = serde_json::from_str(&raw).map_err(|source| StoreError::Json {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self {
            path: path.to_path_buf(),
            receipts,
        })
    }

    /// Writes the dataset back to its file, pretty-printed.
    ///
    /// # Errors
    ///
    /// - [`StoreError::Json`] if serialization fails.
    /// - [`StoreError::Io`] if the file cannot be written.
    pub fn save(&self) -> Result<(), StoreError> {
        let raw = serde_json::to_string_pretty(&self.receipts).map_err(|source| {
            StoreError::Json {
                path: self.path.clone(),
                source,
            }
        })?;
        fs::write(&self.path, raw).map_err(|source| StoreError::Io {
            path: self.path.clone(),
            source,
        })
    }

    /// Merges one receipt by vendor id: replaces the existing record or
    /// appends a new one.
    pub fn upsert(&mut self, receipt: Receipt) -> UpsertOutcome {
        if let Some(existing) = self.receipts.iter_mut().find(|r| r.id == receipt.id) {
            *existing = receipt;
            UpsertOutcome::Updated
        } else {
            self.receipts.push(receipt);
            UpsertOutcome::Added
        }
    }

    /// Sorts the dataset newest-first by purchase date. Records with an
    /// unparsable date sink to the end, keeping their relative order.
    pub fn sort_by_date_desc(&mut self) {
        self.receipts.sort_by(|a, b| {
            match (
                parse_purchase_date(&a.purchase_date),
                parse_purchase_date(&b.purchase_date),
            ) {
                (Some(da), Some(db)) => db.cmp(&da),
                (Some(_), None) => std::cmp::Ordering::Less,
                (None, Some(_)) => std::cmp::Ordering::Greater,
                (None, None) => std::cmp::Ordering::Equal,
            }
        });
    }

    /// Ids already present in the dataset, for skip-fetched filtering.
    #[must_use]
    pub fn existing_ids(&self) -> HashSet<String> {
        self.receipts.iter().map(|r| r.id.clone()).collect()
    }

    #[must_use]
    pub fn receipts(&self) -> &[Receipt] {
        &self.receipts
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.receipts.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.receipts.is_empty()
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Parses a stored purchase date, with or without time of day.
#[must_use]
pub fn parse_purchase_date(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if let Ok(stamp) = NaiveDateTime::parse_from_str(raw, "%d.%m.%Y %H:%M") {
        return Some(stamp);
    }
    chrono::NaiveDate::parse_from_str(raw, "%d.%m.%Y")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}
