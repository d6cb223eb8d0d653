//! Point-in-time collection of computed country metrics, with lookup and
//! ranking.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::Serialize;
use tracing::{debug, warn};

use crate::analyzers::engine::compute_with;
use crate::analyzers::error::{CatalogError, MetricsError};
use crate::analyzers::types::{CountryEntry, MetricsParams};
use crate::services::record_source::RawCountryRecord;

/// Scalar a ranking is ordered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RankBy {
    /// Last value of the rolling cumulative incidence.
    CumulativeIncidenceLatest,
    ProgressScore,
    CumulativeSum,
}

impl RankBy {
    fn value(self, entry: &CountryEntry) -> f64 {
        match self {
            RankBy::CumulativeIncidenceLatest => entry.metrics.latest_incidence(),
            RankBy::ProgressScore => entry.metrics.progress_score(),
            RankBy::CumulativeSum => entry.metrics.cumulative_sum(),
        }
    }
}

/// Why a country was left out of the catalog.
#[derive(Debug, Clone, PartialEq)]
pub enum Exclusion {
    /// No population figure in the source. Warning only.
    MissingPopulation,
    /// Population reported as zero. Warning only.
    ZeroPopulation,
    /// Validation or computation failed.
    Failed(MetricsError),
}

impl Exclusion {
    /// `true` for the population warnings, `false` for real failures.
    pub fn is_warning(&self) -> bool {
        matches!(self, Exclusion::MissingPopulation | Exclusion::ZeroPopulation)
    }
}

impl fmt::Display for Exclusion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Exclusion::MissingPopulation => f.write_str("population missing"),
            Exclusion::ZeroPopulation => f.write_str("population is 0"),
            Exclusion::Failed(e) => write!(f, "{e}"),
        }
    }
}

/// A country that did not make it into the catalog.
#[derive(Debug, Clone, PartialEq)]
pub struct ExcludedCountry {
    pub key: String,
    pub name: String,
    pub reason: Exclusion,
}

/// Result of a catalog build: the catalog plus everything that was left out.
#[derive(Debug)]
pub struct BuildReport {
    pub catalog: MetricsCatalog,
    pub excluded: Vec<ExcludedCountry>,
}

/// Immutable mapping of country key to computed entry.
///
/// Replaced wholesale by [`MetricsCatalog::refresh`]; entries are never
/// mutated individually.
#[derive(Debug, Clone)]
pub struct MetricsCatalog {
    params: MetricsParams,
    entries: BTreeMap<String, CountryEntry>,
}

impl MetricsCatalog {
    /// Computes metrics for every record. Countries without a usable
    /// population or whose computation fails are excluded and reported.
    pub fn build(records: Vec<RawCountryRecord>, params: MetricsParams) -> BuildReport {
        let mut entries = BTreeMap::new();
        let mut excluded = Vec::new();

        for record in records {
            let key = record.key.clone();
            let name = record.name.clone();

            match build_entry(record, &params) {
                Ok(entry) => {
                    debug!(country = %key, "Country metrics computed");
                    entries.insert(key, entry);
                }
                Err(reason) => {
                    if reason.is_warning() {
                        warn!(country = %key, name = %name, reason = %reason, "Country skipped");
                    } else {
                        warn!(country = %key, name = %name, error = %reason, "Country metrics failed");
                    }
                    excluded.push(ExcludedCountry { key, name, reason });
                }
            }
        }

        BuildReport {
            catalog: MetricsCatalog { params, entries },
            excluded,
        }
    }

    /// Rebuilds the catalog from fresh records with the same parameters,
    /// replacing the previous contents entirely. Returns the new exclusions.
    pub fn refresh(&mut self, records: Vec<RawCountryRecord>) -> Vec<ExcludedCountry> {
        let report = Self::build(records, self.params);
        *self = report.catalog;
        report.excluded
    }

    pub fn lookup(&self, key: &str) -> Result<&CountryEntry, CatalogError> {
        self.entries
            .get(key)
            .ok_or_else(|| CatalogError::NotFound(key.to_string()))
    }

    /// Orders countries by `by`, highest first; equal values fall back to
    /// ascending key. With `subset`, only those keys are ranked and keys
    /// absent from the catalog are skipped.
    pub fn rank(&self, by: RankBy, subset: Option<&BTreeSet<String>>) -> Vec<(String, f64)> {
        let mut ranked: Vec<(String, f64)> = match subset {
            Some(keys) => keys
                .iter()
                .filter_map(|key| match self.entries.get(key) {
                    Some(entry) => Some((key.clone(), by.value(entry))),
                    None => {
                        warn!(country = %key, "Ranked country not in catalog");
                        None
                    }
                })
                .collect(),
            None => self
                .entries
                .iter()
                .map(|(key, entry)| (key.clone(), by.value(entry)))
                .collect(),
        };

        ranked.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        ranked
    }

    pub fn params(&self) -> MetricsParams {
        self.params
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &CountryEntry> {
        self.entries.values()
    }
}

fn build_entry(record: RawCountryRecord, params: &MetricsParams) -> Result<CountryEntry, Exclusion> {
    if let Some(reason) = &record.decode_error {
        return Err(Exclusion::Failed(MetricsError::validation(format!(
            "country '{}' could not be decoded: {reason}",
            record.key
        ))));
    }

    let population = match record.population {
        None => return Err(Exclusion::MissingPopulation),
        Some(p) if p == 0.0 => return Err(Exclusion::ZeroPopulation),
        Some(p) => p,
    };

    let series = record.into_series(population).map_err(Exclusion::Failed)?;
    let metrics = compute_with(&series, params).map_err(Exclusion::Failed)?;

    Ok(CountryEntry { series, metrics })
}
