//! Per-country metrics: normalized vaccination totals, rolling incidence and
//! the progress score.

use crate::analyzers::error::MetricsError;
use crate::analyzers::types::{CountryMetrics, MetricsParams, RawCountrySeries};
use crate::analyzers::utility::{median, normalize};

/// Computes every derived metric for one country.
///
/// # Errors
///
/// [`MetricsError::Validation`] when `window` or `norm_population` is zero or
/// `window` is not shorter than the series; [`MetricsError::InsufficientHistory`]
/// when the series holds fewer than `2 * window + 1` days.
pub fn compute(
    series: &RawCountrySeries,
    norm_population: u64,
    window: usize,
) -> Result<CountryMetrics, MetricsError> {
    let n = series.len();

    if window == 0 {
        return Err(MetricsError::validation("rolling window must be at least 1 day"));
    }
    if norm_population == 0 {
        return Err(MetricsError::validation("normalization population must be positive"));
    }
    if window >= n {
        return Err(MetricsError::validation(format!(
            "country '{}' has {n} days of data, window of {window} needs more",
            series.key()
        )));
    }
    let required = 2 * window + 1;
    if n < required {
        return Err(MetricsError::InsufficientHistory { required, actual: n });
    }

    let population = series.population();
    let normalized_vaccination_cumulative =
        normalize_vaccination(series.daily_vaccinations(), norm_population, population);
    let rolling_cumulative_incidence =
        rolling_incidence(series.daily_cases(), window, norm_population, population);
    let cumulative_sum = rolling_cumulative_incidence.iter().sum();
    let progress_score = progress_score(&rolling_cumulative_incidence, window)?;

    Ok(CountryMetrics {
        normalized_vaccination_cumulative,
        rolling_cumulative_incidence,
        cumulative_sum,
        progress_score,
    })
}

/// Same as [`compute`] with the parameters of one refresh.
pub fn compute_with(
    series: &RawCountrySeries,
    params: &MetricsParams,
) -> Result<CountryMetrics, MetricsError> {
    compute(series, params.norm_population, params.window)
}

/// Running total of daily vaccinations, rescaled to `norm_population`.
pub fn normalize_vaccination(daily: &[f64], norm_population: u64, population: u64) -> Vec<f64> {
    daily
        .iter()
        .scan(0.0, |acc, &v| {
            *acc += normalize(v, norm_population, population);
            Some(*acc)
        })
        .collect()
}

/// Trailing `window`-day sums of `daily`, rescaled to `norm_population`.
///
/// One value per index `i` in `window..len`, each covering `i-window+1..=i`,
/// so the output has `len - window` elements.
pub fn rolling_incidence(
    daily: &[f64],
    window: usize,
    norm_population: u64,
    population: u64,
) -> Vec<f64> {
    (window..daily.len())
        .map(|i| {
            let sum: f64 = daily[i + 1 - window..=i].iter().sum();
            normalize(sum, norm_population, population)
        })
        .collect()
}

/// Median of the signed percentage change over the last `window` pairs of
/// `rolling`, most recent pair first.
///
/// A pair whose earlier value is zero contributes `f64::INFINITY`.
pub fn progress_score(rolling: &[f64], window: usize) -> Result<f64, MetricsError> {
    let samples = progress_samples(rolling, window)?;
    median(&samples).ok_or_else(|| MetricsError::validation("no progress samples"))
}

/// The per-pair percentage changes behind [`progress_score`], most recent
/// pair first.
pub fn progress_samples(rolling: &[f64], window: usize) -> Result<Vec<f64>, MetricsError> {
    let len = rolling.len();
    if window == 0 || len < window + 1 {
        return Err(MetricsError::InsufficientHistory {
            required: window + 1,
            actual: len,
        });
    }

    Ok((0..window)
        .map(|j| {
            let curr = rolling[len - 1 - j];
            let prev = rolling[len - 2 - j];
            change_sample(prev, curr)
        })
        .collect())
}

fn change_sample(prev: f64, curr: f64) -> f64 {
    if prev == 0.0 {
        return f64::INFINITY;
    }
    let ratio = 100.0 * curr / prev;
    if ratio < 100.0 {
        100.0 - ratio
    } else {
        -(ratio - 100.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn series(population: u64, cases: Vec<f64>, vaccinations: Vec<f64>) -> RawCountrySeries {
        let start = NaiveDate::from_ymd_opt(2021, 1, 1).unwrap();
        let dates = (0..cases.len())
            .map(|i| start + chrono::Days::new(i as u64))
            .collect();
        RawCountrySeries::new("TST", "Testland", population, dates, cases, vaccinations).unwrap()
    }

    #[test]
    fn test_rolling_incidence_known_values() {
        let s = series(100, vec![10.0, 20.0, 30.0, 40.0, 50.0], vec![0.0; 5]);
        let m = compute(&s, 1_000_000, 2).unwrap();

        assert_eq!(m.rolling_cumulative_incidence(), &[500_000.0, 700_000.0, 900_000.0]);
        assert_eq!(m.cumulative_sum(), 2_100_000.0);
        assert_eq!(m.latest_incidence(), 900_000.0);
    }

    #[test]
    fn test_progress_for_rising_incidence() {
        let s = series(100, vec![10.0, 20.0, 30.0, 40.0, 50.0], vec![0.0; 5]);
        let m = compute(&s, 1_000_000, 2).unwrap();

        // pairs: 900k/700k -> -28.57..., 700k/500k -> -40
        let expected = (-(900_000.0 * 100.0 / 700_000.0 - 100.0) - 40.0) / 2.0;
        assert!((m.progress_score() - expected).abs() < 1e-9);
        assert!(m.progress_score() < 0.0);
    }

    #[test]
    fn test_output_lengths() {
        let s = series(1000, vec![1.0; 12], vec![2.0; 12]);
        let m = compute(&s, 100_000, 5).unwrap();

        assert_eq!(m.rolling_cumulative_incidence().len(), 12 - 5);
        assert_eq!(m.normalized_vaccination_cumulative().len(), 12);
    }

    #[test]
    fn test_vaccination_is_running_total() {
        let s = series(200, vec![0.0; 5], vec![10.0, 0.0, 20.0, 5.0, 0.0]);
        let m = compute(&s, 1000, 2).unwrap();

        assert_eq!(
            m.normalized_vaccination_cumulative(),
            &[50.0, 50.0, 150.0, 175.0, 175.0]
        );
        assert!(
            m.normalized_vaccination_cumulative()
                .windows(2)
                .all(|w| w[0] <= w[1])
        );
    }

    #[test]
    fn test_scaling_invariance() {
        let cases = vec![3.0, 7.0, 11.0, 2.0, 9.0, 4.0, 13.0];
        let vacc = vec![1.0, 4.0, 0.0, 8.0, 2.0, 6.0, 5.0];

        let a = compute(&series(37, cases.clone(), vacc.clone()), 100_000, 3).unwrap();
        let b = compute(&series(74, cases, vacc), 200_000, 3).unwrap();

        assert_eq!(a, b);
    }

    #[test]
    fn test_zero_incidence_gives_infinite_progress() {
        let s = series(100, vec![0.0; 9], vec![0.0; 9]);
        let m = compute(&s, 100_000, 3).unwrap();
        assert_eq!(m.progress_score(), f64::INFINITY);
    }

    #[test]
    fn test_strictly_decreasing_incidence_has_positive_progress() {
        let cases = vec![100.0, 90.0, 80.0, 70.0, 60.0, 50.0, 40.0, 30.0, 20.0];
        let m = compute(&series(500, cases, vec![0.0; 9]), 100_000, 3).unwrap();

        let rolling = m.rolling_cumulative_incidence();
        assert!(rolling.windows(2).all(|w| w[1] < w[0]));

        let samples = progress_samples(rolling, 3).unwrap();
        assert_eq!(samples.len(), 3);
        assert!(samples.iter().all(|&s| s > 0.0 && s.is_finite()));
        assert!(m.progress_score() > 0.0);
    }

    #[test]
    fn test_flat_incidence_scores_zero() {
        let m = compute(&series(100, vec![5.0; 7], vec![0.0; 7]), 100_000, 3).unwrap();
        assert_eq!(m.progress_score(), 0.0);
    }

    #[test]
    fn test_progress_uses_most_recent_pairs() {
        // Only the last two pairs (40 -> 20 -> 10) matter for window = 2.
        let rolling = [0.0, 80.0, 40.0, 20.0, 10.0];
        assert_eq!(progress_score(&rolling, 2).unwrap(), 50.0);
    }

    #[test]
    fn test_progress_samples_order_and_sentinel() {
        let rolling = [0.0, 10.0, 5.0, 4.0];
        assert_eq!(progress_samples(&rolling, 3).unwrap(), vec![20.0, 50.0, f64::INFINITY]);
        assert!(progress_samples(&rolling, 4).is_err());
    }

    #[test]
    fn test_progress_mixes_infinity_into_median() {
        let rolling = [0.0, 10.0, 5.0];
        // samples: 10 -> 5 = 50, 0 -> 10 = inf; median of two = inf
        assert_eq!(progress_score(&rolling, 2).unwrap(), f64::INFINITY);

        let rolling = [0.0, 10.0, 5.0, 4.0];
        // samples: 20, 50, inf
        assert_eq!(progress_score(&rolling, 3).unwrap(), 50.0);
    }

    #[test]
    fn test_window_not_shorter_than_series_is_validation_error() {
        let s = series(100, vec![1.0; 4], vec![0.0; 4]);
        assert!(matches!(compute(&s, 100_000, 4), Err(MetricsError::Validation(_))));
        assert!(matches!(compute(&s, 100_000, 6), Err(MetricsError::Validation(_))));
    }

    #[test]
    fn test_short_history_is_insufficient() {
        let s = series(100, vec![1.0; 4], vec![0.0; 4]);
        assert_eq!(
            compute(&s, 100_000, 2),
            Err(MetricsError::InsufficientHistory { required: 5, actual: 4 })
        );
    }

    #[test]
    fn test_zero_parameters_rejected() {
        let s = series(100, vec![1.0; 4], vec![0.0; 4]);
        assert!(matches!(compute(&s, 100_000, 0), Err(MetricsError::Validation(_))));
        assert!(matches!(compute(&s, 0, 1), Err(MetricsError::Validation(_))));
    }
}
