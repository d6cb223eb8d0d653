use std::path::PathBuf;

use anyhow::{Context, Result};
use async_trait::async_trait;
use tracing::{debug, info};

use crate::fetch::{BasicClient, HttpClient, fetch_bytes};
use crate::parser::parse_records;
use crate::services::record_source::{RawCountryRecord, RawRecordSource};

/// Downloads the JSON document over HTTP on every fetch.
pub struct HttpRecordSource<C> {
    client: C,
    url: String,
}

impl<C: HttpClient> HttpRecordSource<C> {
    pub fn new(client: C, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }
}

#[async_trait]
impl<C: HttpClient> RawRecordSource for HttpRecordSource<C> {
    fn location(&self) -> &str {
        &self.url
    }

    async fn fetch_records(&self) -> Result<Vec<RawCountryRecord>> {
        info!(url = %self.url, "Downloading data");
        let fetch_start = std::time::Instant::now();
        let bytes = fetch_bytes(&self.client, &self.url).await?;
        info!(
            bytes = bytes.len(),
            elapsed_ms = fetch_start.elapsed().as_millis() as u64,
            "Data successfully downloaded"
        );
        parse_records(&bytes)
    }
}

/// Reads the JSON document from a local file.
pub struct FileRecordSource {
    path: PathBuf,
    display: String,
}

impl FileRecordSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let display = path.display().to_string();
        Self { path, display }
    }
}

#[async_trait]
impl RawRecordSource for FileRecordSource {
    fn location(&self) -> &str {
        &self.display
    }

    async fn fetch_records(&self) -> Result<Vec<RawCountryRecord>> {
        let bytes = tokio::fs::read(&self.path)
            .await
            .with_context(|| format!("failed to read '{}'", self.display))?;
        debug!(path = %self.display, bytes = bytes.len(), "Data file read");
        parse_records(&bytes)
    }
}

/// Picks an HTTP source for `http(s)://` locations and a file source otherwise.
pub fn source_for(location: &str) -> Result<Box<dyn RawRecordSource>> {
    if location.starts_with("http") {
        Ok(Box::new(HttpRecordSource::new(BasicClient::new()?, location)))
    } else {
        Ok(Box::new(FileRecordSource::new(location)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::fs;

    fn temp_path(name: &str) -> String {
        format!("{}/{}", env::temp_dir().display(), name)
    }

    #[tokio::test]
    async fn test_file_source_reads_records() {
        let path = temp_path("covid_metrics_test_source.json");
        fs::write(
            &path,
            r#"{"CZE": {"location": "Czechia", "population": 10708982.0,
                "data": [{"date": "2021-03-01", "new_cases": 5.0}]}}"#,
        )
        .unwrap();

        let source = source_for(&path).unwrap();
        assert_eq!(source.location(), path);

        let records = source.fetch_records().await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].name, "Czechia");

        fs::remove_file(&path).unwrap();
    }

    #[tokio::test]
    async fn test_file_source_missing_file() {
        let source = FileRecordSource::new(temp_path("covid_metrics_does_not_exist.json"));
        assert!(source.fetch_records().await.is_err());
    }

    #[test]
    fn test_source_for_url() {
        let source = source_for("https://example.org/data.json").unwrap();
        assert_eq!(source.location(), "https://example.org/data.json");
    }
}
