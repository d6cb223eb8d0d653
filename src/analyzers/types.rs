//! Data types used by the metrics pipeline.

use chrono::NaiveDate;
use serde::Serialize;

use crate::analyzers::error::MetricsError;

/// Label format used for dates on charts (`DD.MM.`).
pub const DATE_LABEL_FORMAT: &str = "%d.%m.";

/// Parameters shared by every per-country computation of one refresh.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MetricsParams {
    /// Reference population all counts are rescaled to.
    pub norm_population: u64,
    /// Number of trailing days summed into one rolling value.
    pub window: usize,
}

/// A validated daily time series for one country.
///
/// `dates`, `daily_cases` and `daily_vaccinations` are index-aligned and of
/// equal length; `population` is non-zero.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RawCountrySeries {
    key: String,
    name: String,
    population: u64,
    dates: Vec<NaiveDate>,
    daily_cases: Vec<f64>,
    daily_vaccinations: Vec<f64>,
}

impl RawCountrySeries {
    pub fn new(
        key: impl Into<String>,
        name: impl Into<String>,
        population: u64,
        dates: Vec<NaiveDate>,
        daily_cases: Vec<f64>,
        daily_vaccinations: Vec<f64>,
    ) -> Result<Self, MetricsError> {
        let key = key.into();

        if population == 0 {
            return Err(MetricsError::validation(format!(
                "country '{key}' has a population of 0"
            )));
        }

        if daily_cases.len() != dates.len() || daily_vaccinations.len() != dates.len() {
            return Err(MetricsError::validation(format!(
                "country '{key}' has mismatched series lengths: {} dates, {} case counts, {} vaccination counts",
                dates.len(),
                daily_cases.len(),
                daily_vaccinations.len()
            )));
        }

        if let Some(i) = daily_cases
            .iter()
            .chain(daily_vaccinations.iter())
            .position(|v| !v.is_finite())
        {
            return Err(MetricsError::validation(format!(
                "country '{key}' has a non-finite daily value at position {i}"
            )));
        }

        Ok(Self {
            key,
            name: name.into(),
            population,
            dates,
            daily_cases,
            daily_vaccinations,
        })
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn population(&self) -> u64 {
        self.population
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn daily_cases(&self) -> &[f64] {
        &self.daily_cases
    }

    pub fn daily_vaccinations(&self) -> &[f64] {
        &self.daily_vaccinations
    }

    /// Number of days in the series.
    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    /// Dates rendered as chart labels, e.g. `07.03.`.
    pub fn date_labels(&self) -> Vec<String> {
        self.dates
            .iter()
            .map(|d| d.format(DATE_LABEL_FORMAT).to_string())
            .collect()
    }
}

/// Derived metrics for one country. Immutable once computed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CountryMetrics {
    pub(crate) normalized_vaccination_cumulative: Vec<f64>,
    pub(crate) rolling_cumulative_incidence: Vec<f64>,
    pub(crate) cumulative_sum: f64,
    pub(crate) progress_score: f64,
}

impl CountryMetrics {
    /// Running total of vaccinations per `norm_population`, one value per day.
    pub fn normalized_vaccination_cumulative(&self) -> &[f64] {
        &self.normalized_vaccination_cumulative
    }

    /// Trailing-window case sums per `norm_population`; element `k` ends on
    /// day `k + window` of the source series.
    pub fn rolling_cumulative_incidence(&self) -> &[f64] {
        &self.rolling_cumulative_incidence
    }

    pub fn cumulative_sum(&self) -> f64 {
        self.cumulative_sum
    }

    /// Median day-over-day change in percent. Positive means incidence fell.
    /// `f64::INFINITY` when there was no prior incidence to compare against.
    pub fn progress_score(&self) -> f64 {
        self.progress_score
    }

    /// Most recent rolling incidence value.
    pub fn latest_incidence(&self) -> f64 {
        self.rolling_cumulative_incidence
            .last()
            .copied()
            .unwrap_or_default()
    }
}

/// A catalog entry: the validated source series together with its metrics.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CountryEntry {
    pub series: RawCountrySeries,
    pub metrics: CountryMetrics,
}

impl CountryEntry {
    pub fn key(&self) -> &str {
        self.series.key()
    }

    pub fn name(&self) -> &str {
        self.series.name()
    }
}
