//! Output formatting and export of rankings and dashboards.
//!
//! Supports pretty-printing, JSON serialization, and CSV export.

use std::fmt::Debug;
use std::fs::File;
use std::path::Path;

use anyhow::{Context, Result};
use csv::WriterBuilder;
use serde::Serialize;
use tracing::{debug, info};

use crate::analyzers::catalog::MetricsCatalog;

/// One row of an exported ranking.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankingRow {
    pub rank: usize,
    pub key: String,
    pub name: String,
    pub value: f64,
}

/// Attaches positions and display names to a ranking from
/// [`MetricsCatalog::rank`].
pub fn ranking_rows(catalog: &MetricsCatalog, ranked: &[(String, f64)]) -> Vec<RankingRow> {
    ranked
        .iter()
        .enumerate()
        .map(|(i, (key, value))| RankingRow {
            rank: i + 1,
            key: key.clone(),
            name: catalog
                .lookup(key)
                .map(|e| e.name().to_string())
                .unwrap_or_else(|_| key.clone()),
            value: *value,
        })
        .collect()
}

/// Logs a value using Rust's debug pretty-print format.
pub fn print_pretty(value: &impl Debug) {
    debug!("{:#?}", value);
}

/// Logs a value as pretty-printed JSON.
pub fn print_json(value: &impl Serialize) -> Result<()> {
    info!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Writes ranking rows to a CSV file, replacing any existing file.
pub fn write_ranking_csv(path: &Path, rows: &[RankingRow]) -> Result<()> {
    debug!(path = %path.display(), rows = rows.len(), "Writing ranking CSV");

    let file = File::create(path).with_context(|| format!("failed to create '{}'", path.display()))?;
    let mut writer = WriterBuilder::new().has_headers(true).from_writer(file);

    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;

    Ok(())
}

/// Writes `value` as pretty-printed JSON to `path`, creating parent
/// directories as needed.
pub fn write_json(path: &Path, value: &impl Serialize) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let body = serde_json::to_vec_pretty(value)?;
    std::fs::write(path, body).with_context(|| format!("failed to write '{}'", path.display()))?;
    debug!(path = %path.display(), "JSON written");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::fs;

    fn temp_path(name: &str) -> std::path::PathBuf {
        env::temp_dir().join(name)
    }

    fn rows() -> Vec<RankingRow> {
        vec![
            RankingRow {
                rank: 1,
                key: "SVK".to_string(),
                name: "Slovakia".to_string(),
                value: 812.5,
            },
            RankingRow {
                rank: 2,
                key: "CZE".to_string(),
                name: "Czechia".to_string(),
                value: 640.25,
            },
        ]
    }

    #[test]
    fn test_print_pretty_does_not_panic() {
        print_pretty(&rows());
    }

    #[test]
    fn test_print_json_does_not_panic() {
        print_json(&rows()).unwrap();
    }

    #[test]
    fn test_write_ranking_csv() {
        let path = temp_path("covid_metrics_test_ranking.csv");
        let _ = fs::remove_file(&path);

        write_ranking_csv(&path, &rows()).unwrap();
        // A second write replaces the first
        write_ranking_csv(&path, &rows()).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<_> = content.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "rank,key,name,value");
        assert_eq!(lines[1], "1,SVK,Slovakia,812.5");

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_write_json() {
        let path = temp_path("covid_metrics_test_out/rows.json");
        write_json(&path, &rows()).unwrap();

        let parsed: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(parsed[1]["key"], "CZE");

        fs::remove_file(&path).unwrap();
    }
}
