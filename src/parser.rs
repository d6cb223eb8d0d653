//! JSON parser for OWID-style per-country time series.

use std::collections::BTreeMap;

use anyhow::{Context, Result};
use serde::Deserialize;
use serde_json::Value;
use tracing::warn;

use crate::services::record_source::{DailyRecord, RawCountryRecord};

#[derive(Deserialize)]
struct CountryJson {
    #[serde(default)]
    population: Option<f64>,
    #[serde(default)]
    data: Vec<DayJson>,
}

#[derive(Deserialize)]
struct DayJson {
    date: String,
    #[serde(default)]
    new_cases: Option<f64>,
    #[serde(default)]
    new_vaccinations: Option<f64>,
}

/// Decodes the raw JSON document into one record per country, ordered by key.
///
/// Missing `new_cases` / `new_vaccinations` default to 0, a missing
/// `location` falls back to the key. Unknown fields are ignored. A country
/// entry that does not decode becomes a [`RawCountryRecord::malformed`]
/// record so the remaining countries are still processed.
///
/// # Errors
///
/// Returns an error if the bytes are not a JSON object.
pub fn parse_records(bytes: &[u8]) -> Result<Vec<RawCountryRecord>> {
    let countries: BTreeMap<String, Value> =
        serde_json::from_slice(bytes).context("failed to decode country records")?;

    let records = countries
        .into_iter()
        .map(|(key, value)| {
            let name = value
                .get("location")
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or_else(|| key.clone());

            match serde_json::from_value::<CountryJson>(value) {
                Ok(country) => RawCountryRecord {
                    name,
                    key,
                    population: country.population,
                    days: country
                        .data
                        .into_iter()
                        .map(|day| DailyRecord {
                            date: day.date,
                            new_cases: day.new_cases.unwrap_or(0.0),
                            new_vaccinations: day.new_vaccinations.unwrap_or(0.0),
                        })
                        .collect(),
                    decode_error: None,
                },
                Err(e) => {
                    warn!(country = %key, error = %e, "Country entry could not be decoded");
                    RawCountryRecord::malformed(key, name, e.to_string())
                }
            }
        })
        .collect();

    Ok(records)
}
