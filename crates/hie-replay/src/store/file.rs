use std::path::PathBuf;

use async_trait::async_trait;
use tracing::debug;

use super::TransactionStore;
use crate::error::StoreError;
use crate::record::TransactionRecord;

/// Reads a transaction-log export.
///
/// Accepts either a JSON array of documents or one document per line.
pub struct ExportFileStore {
    path: PathBuf,
}

impl ExportFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl TransactionStore for ExportFileStore {
    async fn fetch_transactions(&self) -> Result<Vec<TransactionRecord>, StoreError> {
        let content = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|e| StoreError::connection(format!("{}: {e}", self.path.display())))?;
        let records = parse_export(&content)?;
        debug!(path = %self.path.display(), total = records.len(), "read transaction export");
        Ok(records)
    }

    fn describe(&self) -> String {
        format!("export file {}", self.path.display())
    }
}

fn parse_export(content: &str) -> Result<Vec<TransactionRecord>, StoreError> {
    if content.trim_start().starts_with('[') {
        return serde_json::from_str(content).map_err(|e| StoreError::decode(e.to_string()));
    }
    content
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(idx, line)| {
            serde_json::from_str(line).map_err(|e| StoreError::Decode {
                line: Some(idx + 1),
                message: e.to_string(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[tokio::test]
    async fn reads_json_array_export() {
        let dir = tempfile::tempdir().expect("tmp dir");
        let path = dir.path().join("transactions.json");
        fs::write(
            &path,
            r#"[
                {"_id": "a", "request": {"path": "/fhir/QuestionnaireResponse", "body": "{}"}},
                {"_id": "b", "request": null}
            ]"#,
        )
        .expect("write export");

        let records = ExportFileStore::new(&path).fetch_transactions().await.unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].display_id(), "a");
        assert!(records[1].request.is_none());
    }

    #[tokio::test]
    async fn reads_line_delimited_export() {
        let dir = tempfile::tempdir().expect("tmp dir");
        let path = dir.path().join("transactions.ndjson");
        fs::write(
            &path,
            "{\"_id\":{\"$oid\":\"a\"},\"request\":{\"path\":\"/custom/QuestionnaireResponse\"}}\n\n{\"_id\":{\"$oid\":\"b\"}}\n",
        )
        .expect("write export");

        let records = ExportFileStore::new(&path).fetch_transactions().await.unwrap();
        let ids: Vec<_> = records.iter().map(|r| r.display_id()).collect();
        assert_eq!(ids, vec!["a", "b"]);
    }

    #[tokio::test]
    async fn reports_bad_line_number() {
        let dir = tempfile::tempdir().expect("tmp dir");
        let path = dir.path().join("transactions.ndjson");
        fs::write(&path, "{\"_id\":\"a\"}\n{oops\n").expect("write export");

        let err = ExportFileStore::new(&path).fetch_transactions().await.unwrap_err();
        assert!(matches!(err, StoreError::Decode { line: Some(2), .. }));
    }

    #[tokio::test]
    async fn missing_file_is_connection_error() {
        let dir = tempfile::tempdir().expect("tmp dir");
        let store = ExportFileStore::new(dir.path().join("absent.json"));
        assert!(store.fetch_transactions().await.unwrap_err().is_connection());
    }
}
