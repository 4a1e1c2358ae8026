//! Transaction-log stores.
//!
//! A store performs one unbounded read of the transaction log. Failing to
//! reach it is fatal for the run.

mod file;
mod openhim;

use std::sync::Arc;

use async_trait::async_trait;

use crate::config::{StoreConfig, StoreSource};
use crate::error::{ReplayError, StoreError};
use crate::record::TransactionRecord;

pub use file::ExportFileStore;
pub use openhim::OpenHimStore;

/// Source of logged transactions.
///
/// Implementations return every record in the store's natural order.
#[async_trait]
pub trait TransactionStore: Send + Sync {
    /// Reads all logged transactions.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Connection` when the store is unreachable and
    /// `StoreError::Decode` when a document cannot be read as a transaction.
    async fn fetch_transactions(&self) -> Result<Vec<TransactionRecord>, StoreError>;

    /// Short description for logs.
    fn describe(&self) -> String;
}

pub type DynTransactionStore = Arc<dyn TransactionStore>;

/// Builds the store named by `store.source`.
pub fn from_config(config: &StoreConfig) -> Result<DynTransactionStore, ReplayError> {
    match config.source {
        StoreSource::Openhim => {
            let url = config
                .url
                .as_deref()
                .filter(|u| !u.is_empty())
                .ok_or_else(|| ReplayError::Config("store.url is required for openhim".into()))?;
            let credentials = match (&config.username, &config.password) {
                (Some(u), Some(p)) => Some((u.clone(), p.clone())),
                _ => None,
            };
            Ok(Arc::new(
                OpenHimStore::new(url, credentials).with_page_size(config.page_size),
            ))
        }
        StoreSource::File => {
            let path = config
                .path
                .clone()
                .ok_or_else(|| ReplayError::Config("store.path is required for file".into()))?;
            Ok(Arc::new(ExportFileStore::new(path)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_store_per_source() {
        let mut cfg = StoreConfig {
            url: Some("http://localhost:8080".into()),
            ..Default::default()
        };
        let store = from_config(&cfg).unwrap();
        assert!(store.describe().contains("http://localhost:8080"));

        cfg.source = StoreSource::File;
        assert!(matches!(from_config(&cfg), Err(ReplayError::Config(_))));

        cfg.path = Some("transactions.json".into());
        let store = from_config(&cfg).unwrap();
        assert!(store.describe().contains("transactions.json"));
    }
}
