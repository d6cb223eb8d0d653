//! Trait and types for the supplier of raw per-country time series.

use anyhow::Result;
use chrono::NaiveDate;

use crate::analyzers::error::MetricsError;
use crate::analyzers::types::RawCountrySeries;

/// Input date format of daily records (`YYYY-MM-DD`).
pub const RECORD_DATE_FORMAT: &str = "%Y-%m-%d";

/// One day of raw data. Absent counts are already defaulted to zero.
#[derive(Debug, Clone, PartialEq)]
pub struct DailyRecord {
    pub date: String,
    pub new_cases: f64,
    pub new_vaccinations: f64,
}

/// Unvalidated data for one country as delivered by a [`RawRecordSource`].
#[derive(Debug, Clone, PartialEq)]
pub struct RawCountryRecord {
    pub key: String,
    pub name: String,
    pub population: Option<f64>,
    pub days: Vec<DailyRecord>,
    /// Set when the source could not decode this country's entry; the
    /// catalog excludes such records as failed.
    pub decode_error: Option<String>,
}

impl RawCountryRecord {
    /// A placeholder for an entry the source could not decode.
    pub fn malformed(key: impl Into<String>, name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            name: name.into(),
            population: None,
            days: Vec::new(),
            decode_error: Some(reason.into()),
        }
    }

    /// Validates the record into a [`RawCountrySeries`] using `population`.
    ///
    /// # Errors
    ///
    /// [`MetricsError::Validation`] if the population is not a positive finite
    /// number or a date does not parse.
    pub fn into_series(self, population: f64) -> Result<RawCountrySeries, MetricsError> {
        if !population.is_finite() || population < 1.0 {
            return Err(MetricsError::validation(format!(
                "country '{}' has invalid population {population}",
                self.key
            )));
        }

        let mut dates = Vec::with_capacity(self.days.len());
        let mut daily_cases = Vec::with_capacity(self.days.len());
        let mut daily_vaccinations = Vec::with_capacity(self.days.len());

        for day in self.days {
            let date = NaiveDate::parse_from_str(&day.date, RECORD_DATE_FORMAT).map_err(|e| {
                MetricsError::validation(format!(
                    "country '{}' has invalid date '{}': {e}",
                    self.key, day.date
                ))
            })?;
            dates.push(date);
            daily_cases.push(day.new_cases);
            daily_vaccinations.push(day.new_vaccinations);
        }

        RawCountrySeries::new(
            self.key,
            self.name,
            population.round() as u64,
            dates,
            daily_cases,
            daily_vaccinations,
        )
    }
}

/// Abstraction over where raw country data comes from (HTTP, local file).
#[async_trait::async_trait]
pub trait RawRecordSource: Send + Sync {
    /// Human-readable location of the data, for logs.
    fn location(&self) -> &str;

    /// Returns every country record the source holds, ordered by key.
    async fn fetch_records(&self) -> Result<Vec<RawCountryRecord>>;
}
