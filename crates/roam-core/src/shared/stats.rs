//! Statistical utilities backing the testable-property scenarios (spec §8
//! scenarios 5-6): Modified Z-score anomaly detection and the
//! Mann-Kendall trend test. Neither has its own C1-C11 component; both
//! are small, pure numeric routines consumed by file-stats and
//! co-change analysis in [`crate::features::git_history`].

/// One flagged point: its index in the input series and its Modified
/// Z-score.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Anomaly {
    pub index: usize,
    pub z_score: f64,
}

/// Median of a slice of `f64`. Returns 0.0 for an empty slice.
fn median(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap());
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}

/// Flags points whose Modified Z-score exceeds `threshold` in absolute
/// value. Uses the median/MAD formulation: `M_i = 0.6745 * (x_i -
/// median) / MAD`, which is robust to the same outliers it is meant to
/// detect (unlike a mean/stddev z-score).
pub fn modified_z_anomalies(series: &[f64], threshold: f64) -> Vec<Anomaly> {
    if series.len() < 2 {
        return Vec::new();
    }
    let center = median(series);
    let deviations: Vec<f64> = series.iter().map(|x| (x - center).abs()).collect();
    let mad = median(&deviations);

    if mad == 0.0 {
        // All deviations identical (often all zero) — fall back to mean
        // absolute deviation so a single genuine outlier is still
        // detectable rather than producing a division by zero.
        let mean_abs_dev: f64 = deviations.iter().sum::<f64>() / deviations.len() as f64;
        if mean_abs_dev == 0.0 {
            return Vec::new();
        }
        return series
            .iter()
            .enumerate()
            .filter_map(|(i, x)| {
                let z = 0.7979 * (x - center) / mean_abs_dev;
                (z.abs() > threshold).then_some(Anomaly { index: i, z_score: z })
            })
            .collect();
    }

    series
        .iter()
        .enumerate()
        .filter_map(|(i, x)| {
            let z = 0.6745 * (x - center) / mad;
            (z.abs() > threshold).then_some(Anomaly { index: i, z_score: z })
        })
        .collect()
}

/// Trend direction reported by [`mann_kendall`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trend {
    Increasing,
    Decreasing,
    NoTrend,
}

/// Result of the Mann-Kendall trend test.
#[derive(Debug, Clone, Copy)]
pub struct MannKendallResult {
    pub s: f64,
    pub tau: f64,
    pub z: f64,
    pub p_value: f64,
    pub trend: Trend,
}

/// Standard normal CDF via the Abramowitz & Stegun 7.1.26 approximation
/// to `erf`, accurate to ~1.5e-7 — ample for a p-value threshold test.
fn normal_cdf(x: f64) -> f64 {
    let t = 1.0 / (1.0 + 0.3275911 * (x.abs() / std::f64::consts::SQRT_2));
    let y = 1.0
        - (((((1.061405429 * t - 1.453152027) * t) + 1.421413741) * t - 0.284496736) * t
            + 0.254829592)
            * t
            * (-x.abs() * x.abs() / 2.0).exp();
    let erf = y.copysign(x);
    0.5 * (1.0 + erf)
}

/// Mann-Kendall trend test (spec §8 scenario 6): ties are not assumed
/// present in the callers' series (complexity/churn trends over commits),
/// so the variance term omits the tie-correction sum.
pub fn mann_kendall(series: &[f64]) -> MannKendallResult {
    let n = series.len();
    if n < 2 {
        return MannKendallResult {
            s: 0.0,
            tau: 0.0,
            z: 0.0,
            p_value: 1.0,
            trend: Trend::NoTrend,
        };
    }

    let mut s = 0.0;
    for i in 0..n {
        for j in (i + 1)..n {
            s += (series[j] - series[i]).signum();
        }
    }

    let n_f = n as f64;
    let variance = n_f * (n_f - 1.0) * (2.0 * n_f + 5.0) / 18.0;
    let z = if s > 0.0 {
        (s - 1.0) / variance.sqrt()
    } else if s < 0.0 {
        (s + 1.0) / variance.sqrt()
    } else {
        0.0
    };

    let p_value = 2.0 * (1.0 - normal_cdf(z.abs()));
    let tau = s / (n_f * (n_f - 1.0) / 2.0);

    let trend = if p_value < 0.05 && s > 0.0 {
        Trend::Increasing
    } else if p_value < 0.05 && s < 0.0 {
        Trend::Decreasing
    } else {
        Trend::NoTrend
    };

    MannKendallResult {
        s,
        tau,
        z,
        p_value,
        trend,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn modified_z_flags_the_spec_example_series() {
        let series = [1.0, 2.0, 1.0, 2.0, 1.0, 2.0, 100.0];
        let anomalies = modified_z_anomalies(&series, 3.0);
        assert!(anomalies.iter().any(|a| a.index == 6 && a.z_score.abs() > 3.0));
    }

    #[test]
    fn modified_z_empty_for_uniform_series() {
        let series = [5.0; 10];
        assert!(modified_z_anomalies(&series, 3.0).is_empty());
    }

    #[test]
    fn mann_kendall_increasing_series() {
        let series: Vec<f64> = (1..=10).map(|x| x as f64).collect();
        let result = mann_kendall(&series);
        assert_eq!(result.trend, Trend::Increasing);
        assert!(result.tau > 0.0);
        assert!(result.p_value < 0.05);
    }

    #[test]
    fn mann_kendall_decreasing_series() {
        let series: Vec<f64> = (1..=10).rev().map(|x| x as f64).collect();
        let result = mann_kendall(&series);
        assert_eq!(result.trend, Trend::Decreasing);
        assert!(result.tau < 0.0);
    }

    #[test]
    fn mann_kendall_flat_series_has_no_trend() {
        let series = [5.0; 8];
        let result = mann_kendall(&series);
        assert_eq!(result.trend, Trend::NoTrend);
        assert_eq!(result.s, 0.0);
    }
}
