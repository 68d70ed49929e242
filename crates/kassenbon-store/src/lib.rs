//! JSON-file persistence for the receipt dataset.
//!
//! The dataset is one pretty-printed JSON array of receipts, newest first.
//! Records merge by vendor id: fetching the same ticket twice updates the
//! existing entry in place instead of duplicating it.

pub mod store;

pub use store::{parse_purchase_date, ReceiptStore, UpsertOutcome};

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("cannot access dataset file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("dataset file {path} is not a valid receipt collection: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}
