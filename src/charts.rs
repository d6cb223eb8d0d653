//! Chart datasets for the dashboard.
//!
//! Nothing here computes metrics; the functions only slice, round, order and
//! colour what the [`MetricsCatalog`] already holds.

use std::collections::BTreeSet;

use chrono::{DateTime, Local};
use serde::Serialize;
use tracing::warn;

use crate::analyzers::catalog::{MetricsCatalog, RankBy};
use crate::analyzers::error::CatalogError;
use crate::analyzers::types::CountryEntry;
use crate::analyzers::utility::{round2, tail};
use crate::config::Config;

pub const IMPROVING_COLOR: &str = "rgb(0, 153, 0)";
pub const WORSENING_COLOR: &str = "rgb(255, 0, 0)";

/// Format of the dashboard's `updated` stamp.
pub const UPDATED_FORMAT: &str = "%d/%m/%Y %H:%M";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BarChart {
    pub title: String,
    pub x: Vec<String>,
    pub y: Vec<f64>,
    pub colors: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LineSeries {
    pub name: String,
    pub x: Vec<String>,
    pub y: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LineChart {
    pub title: String,
    pub series: Vec<LineSeries>,
}

/// Entry of the country picker.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CountryOption {
    pub key: String,
    pub name: String,
}

/// Everything the dashboard page renders.
#[derive(Debug, Clone, Serialize)]
pub struct Dashboard {
    pub title: String,
    pub updated: String,
    pub countries: Vec<CountryOption>,
    pub default_country: String,
    pub progress: BarChart,
    pub daily_cases: BarChart,
    pub current_incidence: BarChart,
    pub total_sum: BarChart,
    pub incidence_lines: LineChart,
    pub vaccination_lines: LineChart,
    pub source_code_url: String,
    pub data_url: String,
}

impl Dashboard {
    /// Assembles all charts for the configured countries.
    ///
    /// When the default country was excluded from the catalog, the daily
    /// cases chart shows the first configured country that is present, or
    /// failing that the first country of the catalog.
    ///
    /// # Errors
    ///
    /// [`CatalogError::NotFound`] if the catalog holds no country at all.
    pub fn build(
        catalog: &MetricsCatalog,
        config: &Config,
        updated: DateTime<Local>,
    ) -> Result<Self, CatalogError> {
        let keys = &config.countries;

        let countries: Vec<CountryOption> = entries_for(catalog, keys)
            .map(|e| CountryOption {
                key: e.key().to_string(),
                name: e.name().to_string(),
            })
            .collect();

        let default_country = if catalog.lookup(&config.default_country).is_ok() {
            config.default_country.clone()
        } else {
            let fallback = countries
                .first()
                .map(|c| c.key.clone())
                .or_else(|| catalog.keys().next().map(str::to_string))
                .ok_or_else(|| CatalogError::NotFound(config.default_country.clone()))?;
            warn!(
                country = %config.default_country,
                fallback = %fallback,
                "Default country not in catalog, using fallback"
            );
            fallback
        };

        Ok(Self {
            title: "Covid19-related data".to_string(),
            updated: updated.format(UPDATED_FORMAT).to_string(),
            countries,
            progress: progress_chart(catalog, keys),
            daily_cases: daily_cases_chart(catalog, config, &default_country)?,
            default_country,
            current_incidence: current_incidence_chart(catalog, config, keys),
            total_sum: total_sum_chart(catalog, config, keys),
            incidence_lines: incidence_line_chart(catalog, config, keys),
            vaccination_lines: vaccination_line_chart(catalog, config, keys),
            source_code_url: config.source_code_url.clone(),
            data_url: config.data_url.clone(),
        })
    }
}

/// Daily new cases of one country over the last `days_back` days.
pub fn daily_cases_chart(
    catalog: &MetricsCatalog,
    config: &Config,
    key: &str,
) -> Result<BarChart, CatalogError> {
    let entry = catalog.lookup(key)?;
    let labels = entry.series.date_labels();
    let x = tail(&labels, config.days_back).to_vec();
    let y = tail(entry.series.daily_cases(), config.days_back).to_vec();

    Ok(BarChart {
        title: format!("Daily New Cases - {}", entry.name()),
        colors: vec![config.default_color.clone(); x.len()],
        x,
        y,
    })
}

/// Latest rolling incidence per country, highest first.
pub fn current_incidence_chart(
    catalog: &MetricsCatalog,
    config: &Config,
    keys: &[String],
) -> BarChart {
    let params = catalog.params();
    ranked_bar_chart(
        catalog,
        keys,
        RankBy::CumulativeIncidenceLatest,
        format!(
            "{}-day Cumulative Number of Cases per {}",
            params.window, params.norm_population
        ),
        |key, _| config.color_for(key).to_string(),
    )
}

/// Progress score per country, green when improving, red when worsening.
pub fn progress_chart(catalog: &MetricsCatalog, keys: &[String]) -> BarChart {
    ranked_bar_chart(
        catalog,
        keys,
        RankBy::ProgressScore,
        format!(
            "Progress of Individual Countries Within the Last {} days [%]",
            catalog.params().window
        ),
        |_, value| {
            if value < 0.0 {
                WORSENING_COLOR.to_string()
            } else {
                IMPROVING_COLOR.to_string()
            }
        },
    )
}

pub fn total_sum_chart(catalog: &MetricsCatalog, config: &Config, keys: &[String]) -> BarChart {
    ranked_bar_chart(
        catalog,
        keys,
        RankBy::CumulativeSum,
        format!(
            "Total Sum of Cumulative Number of Cases per {}",
            catalog.params().norm_population
        ),
        |key, _| config.color_for(key).to_string(),
    )
}

/// Rolling incidence over the last `days_back` days, one line per country.
pub fn incidence_line_chart(
    catalog: &MetricsCatalog,
    config: &Config,
    keys: &[String],
) -> LineChart {
    let params = catalog.params();
    let series = entries_for(catalog, keys)
        .map(|entry| {
            let labels = entry.series.date_labels();
            // rolling[k] ends on day k + window
            let aligned = &labels[params.window..];
            LineSeries {
                name: entry.name().to_string(),
                x: tail(aligned, config.days_back).to_vec(),
                y: tail(entry.metrics.rolling_cumulative_incidence(), config.days_back).to_vec(),
            }
        })
        .collect();

    LineChart {
        title: format!(
            "{}-day Cumulative Number of Cases per {}",
            params.window, params.norm_population
        ),
        series,
    }
}

pub fn vaccination_line_chart(
    catalog: &MetricsCatalog,
    config: &Config,
    keys: &[String],
) -> LineChart {
    let series = entries_for(catalog, keys)
        .map(|entry| {
            let labels = entry.series.date_labels();
            LineSeries {
                name: entry.name().to_string(),
                x: tail(&labels, config.days_back).to_vec(),
                y: tail(
                    entry.metrics.normalized_vaccination_cumulative(),
                    config.days_back,
                )
                .to_vec(),
            }
        })
        .collect();

    LineChart {
        title: format!(
            "Number of Vaccinations Carried Out per {}",
            catalog.params().norm_population
        ),
        series,
    }
}

fn ranked_bar_chart(
    catalog: &MetricsCatalog,
    keys: &[String],
    by: RankBy,
    title: String,
    color: impl Fn(&str, f64) -> String,
) -> BarChart {
    let subset: BTreeSet<String> = keys.iter().cloned().collect();
    let ranked = catalog.rank(by, Some(&subset));

    let mut chart = BarChart {
        title,
        x: Vec::with_capacity(ranked.len()),
        y: Vec::with_capacity(ranked.len()),
        colors: Vec::with_capacity(ranked.len()),
    };

    for (key, value) in ranked {
        // rank() only returns keys present in the catalog
        let name = catalog
            .lookup(&key)
            .map(|e| e.name().to_string())
            .unwrap_or_else(|_| key.clone());
        let value = round2(value);
        chart.colors.push(color(&key, value));
        chart.x.push(name);
        chart.y.push(value);
    }

    chart
}

/// Catalog entries for `keys` in the given order; unknown keys are skipped.
fn entries_for<'a>(
    catalog: &'a MetricsCatalog,
    keys: &'a [String],
) -> impl Iterator<Item = &'a CountryEntry> + 'a {
    keys.iter().filter_map(move |key| match catalog.lookup(key) {
        Ok(entry) => Some(entry),
        Err(e) => {
            warn!(country = %key, error = %e, "Country left out of chart");
            None
        }
    })
}
