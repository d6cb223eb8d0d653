//! Runtime configuration.
//!
//! Stored as a JSON object on disk; every field is optional:
//! ```json
//! {
//!   "data_url": "https://covid.ourworldindata.org/data/owid-covid-data.json",
//!   "days_back": 60,
//!   "norm_population": 100000,
//!   "cumulative_days": 14,
//!   "default_country": "CZE",
//!   "countries": ["CZE", "SVK", "AUT"],
//!   "country_colors": { "CZE": "rgb(255, 0, 0)" }
//! }
//! ```

use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::analyzers::types::MetricsParams;

pub const DEFAULT_DATA_URL: &str = "https://covid.ourworldindata.org/data/owid-covid-data.json";
pub const DEFAULT_SOURCE_CODE_URL: &str = "https://github.com/covid-metrics/covid_metrics";

/// Environment variable overriding [`Config::data_url`].
pub const DATA_URL_ENV: &str = "DATA_URL";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// URL or local path of the raw JSON document.
    pub data_url: String,
    pub source_code_url: String,
    /// Trailing days shown on daily and line charts.
    pub days_back: usize,
    /// Reference population for normalization.
    pub norm_population: u64,
    /// Rolling window, in days.
    pub cumulative_days: usize,
    pub default_color: String,
    /// Country shown on the daily new cases chart.
    pub default_country: String,
    /// Countries charted and ranked by default.
    pub countries: Vec<String>,
    pub country_colors: HashMap<String, String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_url: DEFAULT_DATA_URL.to_string(),
            source_code_url: DEFAULT_SOURCE_CODE_URL.to_string(),
            days_back: 60,
            norm_population: 100_000,
            cumulative_days: 14,
            default_color: "rgb(55, 83, 109)".to_string(),
            default_country: "CZE".to_string(),
            countries: ["CZE", "SVK", "POL", "AUT", "DEU", "HUN", "GBR", "ISR", "USA"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            country_colors: HashMap::from([
                ("CZE".to_string(), "rgb(255, 0, 0)".to_string()),
                ("SVK".to_string(), "rgb(0, 102, 204)".to_string()),
            ]),
        }
    }
}

impl Config {
    /// Loads the config from a JSON file at `path`.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config '{}'", path.display()))?;
        let config: Config = serde_json::from_str(&content)
            .with_context(|| format!("failed to parse config '{}'", path.display()))?;
        Ok(config.normalized())
    }

    /// Like [`Config::load`], but falls back to defaults when the file does
    /// not exist.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            info!(path = %path.display(), "Config file not found, using defaults");
            Ok(Self::default())
        }
    }

    /// Applies overrides from the process environment.
    pub fn with_env(mut self) -> Self {
        if let Ok(url) = std::env::var(DATA_URL_ENV) {
            if !url.is_empty() {
                self.data_url = url;
            }
        }
        self
    }

    /// Country keys are matched upper-case.
    fn normalized(mut self) -> Self {
        self.default_country = self.default_country.to_uppercase();
        for key in &mut self.countries {
            *key = key.trim().to_uppercase();
        }
        self.country_colors = self
            .country_colors
            .into_iter()
            .map(|(k, v)| (k.to_uppercase(), v))
            .collect();
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.cumulative_days == 0 {
            bail!("cumulative_days must be at least 1");
        }
        if self.norm_population == 0 {
            bail!("norm_population must be positive");
        }
        if self.days_back == 0 {
            bail!("days_back must be at least 1");
        }
        if !self.countries.contains(&self.default_country) {
            bail!(
                "default_country '{}' is not in the countries list",
                self.default_country
            );
        }
        Ok(())
    }

    pub fn metrics_params(&self) -> MetricsParams {
        MetricsParams {
            norm_population: self.norm_population,
            window: self.cumulative_days,
        }
    }

    /// Configured colour of `key`, or the default colour.
    pub fn color_for(&self, key: &str) -> &str {
        self.country_colors
            .get(key)
            .map(String::as_str)
            .unwrap_or(&self.default_color)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::fs;

    fn temp_path(name: &str) -> std::path::PathBuf {
        env::temp_dir().join(name)
    }

    #[test]
    fn test_defaults_are_valid() {
        Config::default().validate().unwrap();
    }

    #[test]
    fn test_load_partial_file() {
        let path = temp_path("covid_metrics_test_config.json");
        fs::write(
            &path,
            r#"{"cumulative_days": 7, "default_country": "svk",
                "countries": ["cze", " svk"], "country_colors": {"svk": "blue"}}"#,
        )
        .unwrap();

        let config = Config::load(&path).unwrap();
        fs::remove_file(&path).unwrap();

        assert_eq!(config.cumulative_days, 7);
        assert_eq!(config.norm_population, 100_000);
        assert_eq!(config.countries, vec!["CZE", "SVK"]);
        assert_eq!(config.default_country, "SVK");
        assert_eq!(config.color_for("SVK"), "blue");
        assert_eq!(config.color_for("CZE"), config.default_color);
        config.validate().unwrap();
    }

    #[test]
    fn test_load_or_default_without_file() {
        let config = Config::load_or_default(&temp_path("covid_metrics_missing_config.json")).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let config = Config {
            cumulative_days: 0,
            ..Config::default()
        };
        assert!(config.validate().is_err());

        let config = Config {
            default_country: "XYZ".to_string(),
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_metrics_params() {
        let params = Config::default().metrics_params();
        assert_eq!(params.norm_population, 100_000);
        assert_eq!(params.window, 14);
    }
}
