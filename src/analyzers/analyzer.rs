use anyhow::Result;
use tracing::info;

use crate::analyzers::catalog::{BuildReport, ExcludedCountry, MetricsCatalog};
use crate::analyzers::types::MetricsParams;
use crate::services::record_source::RawRecordSource;

/// Pulls all records from `source` and builds a fresh catalog.
///
/// Only acquisition errors are returned; per-country failures end up in
/// [`BuildReport::excluded`].
#[tracing::instrument(skip(source), fields(location = %source.location()))]
pub async fn analyze(source: &dyn RawRecordSource, params: MetricsParams) -> Result<BuildReport> {
    let records = source.fetch_records().await?;
    info!(countries = records.len(), "Raw records loaded, computing metrics");

    let report = MetricsCatalog::build(records, params);
    log_summary(report.catalog.len(), &report.excluded);

    Ok(report)
}

/// Re-reads `source` and swaps the catalog contents for the new build.
#[tracing::instrument(skip(catalog, source), fields(location = %source.location()))]
pub async fn refresh(
    catalog: &mut MetricsCatalog,
    source: &dyn RawRecordSource,
) -> Result<Vec<ExcludedCountry>> {
    let records = source.fetch_records().await?;
    let excluded = catalog.refresh(records);
    log_summary(catalog.len(), &excluded);
    Ok(excluded)
}

fn log_summary(computed: usize, excluded: &[ExcludedCountry]) {
    let warnings = excluded.iter().filter(|e| e.reason.is_warning()).count();
    info!(
        computed,
        skipped = warnings,
        failed = excluded.len() - warnings,
        "Processing countries finished"
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::record_source::{DailyRecord, RawCountryRecord};

    struct StaticSource(Vec<RawCountryRecord>);

    #[async_trait::async_trait]
    impl RawRecordSource for StaticSource {
        fn location(&self) -> &str {
            "memory"
        }

        async fn fetch_records(&self) -> Result<Vec<RawCountryRecord>> {
            Ok(self.0.clone())
        }
    }

    fn record(key: &str, population: Option<f64>) -> RawCountryRecord {
        RawCountryRecord {
            key: key.to_string(),
            name: key.to_string(),
            population,
            days: (1..=7)
                .map(|d| DailyRecord {
                    date: format!("2021-04-{d:02}"),
                    new_cases: d as f64,
                    new_vaccinations: 1.0,
                })
                .collect(),
            decode_error: None,
        }
    }

    const PARAMS: MetricsParams = MetricsParams {
        norm_population: 100_000,
        window: 3,
    };

    #[tokio::test]
    async fn test_analyze_builds_catalog() {
        let source = StaticSource(vec![record("AAA", Some(1000.0)), record("BBB", None)]);
        let report = analyze(&source, PARAMS).await.unwrap();

        assert_eq!(report.catalog.len(), 1);
        assert_eq!(report.excluded.len(), 1);
        assert_eq!(report.excluded[0].key, "BBB");
    }

    #[tokio::test]
    async fn test_refresh_swaps_contents() {
        let first = StaticSource(vec![record("AAA", Some(1000.0))]);
        let mut catalog = analyze(&first, PARAMS).await.unwrap().catalog;

        let second = StaticSource(vec![record("BBB", Some(1000.0)), record("CCC", Some(0.0))]);
        let excluded = refresh(&mut catalog, &second).await.unwrap();

        assert_eq!(catalog.keys().collect::<Vec<_>>(), vec!["BBB"]);
        assert_eq!(excluded.len(), 1);
    }
}
