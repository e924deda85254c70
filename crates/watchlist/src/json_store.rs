use std::path::{Path, PathBuf};

use async_trait::async_trait;
use scoring_core::{DataResult, WatchlistEntry, WatchlistStore};

/// Whole list as one JSON array in a single file.
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl WatchlistStore for JsonFileStore {
    /// A missing or empty file is an empty list.
    async fn load(&self) -> DataResult<Vec<WatchlistEntry>> {
        let contents = match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        if contents.trim().is_empty() {
            return Ok(Vec::new());
        }
        Ok(serde_json::from_str(&contents)?)
    }

    /// Written to a sibling temp file first, then renamed over the target.
    async fn save(&self, entries: &[WatchlistEntry]) -> DataResult<()> {
        let json = serde_json::to_string_pretty(entries)?;

        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        tokio::fs::write(&tmp, json).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scoring_core::DataError;

    fn temp_path() -> PathBuf {
        std::env::temp_dir().join(format!("watchlist-{}.json", uuid::Uuid::new_v4()))
    }

    #[tokio::test]
    async fn test_missing_file_is_empty() {
        let store = JsonFileStore::new(temp_path());
        assert!(store.load().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_save_and_load() {
        let path = temp_path();
        let store = JsonFileStore::new(&path);
        let entries = vec![
            WatchlistEntry::new("SAP.DE", "SAP SE", 72),
            WatchlistEntry::new("MSFT", "Microsoft Corporation", 66),
        ];

        store.save(&entries).await.unwrap();
        assert_eq!(store.load().await.unwrap(), entries);

        std::fs::remove_file(&path).ok();
    }

    #[tokio::test]
    async fn test_reads_legacy_rows() {
        let path = temp_path();
        std::fs::write(&path, r#"[{"symbol":"AAPL","name":"Apple Inc","score":61}]"#).unwrap();

        let entries = JsonFileStore::new(&path).load().await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].score, 61);

        std::fs::remove_file(&path).ok();
    }

    #[tokio::test]
    async fn test_corrupt_file_is_an_error() {
        let path = temp_path();
        std::fs::write(&path, "{not json").unwrap();

        let err = JsonFileStore::new(&path).load().await.unwrap_err();
        assert!(matches!(err, DataError::Parse(_)));

        std::fs::remove_file(&path).ok();
    }
}
