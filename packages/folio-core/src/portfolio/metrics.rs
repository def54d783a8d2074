//! Benchmark-relative risk and performance metrics.
//!
//! Inputs are daily simple returns. Annualization uses 252 trading days
//! throughout; alpha is compounded, volatility and tracking error scale by
//! the square root of time. All moments are sample moments (n - 1).

use crate::types::{MetricsResult, ReturnPoint};
use std::collections::HashMap;

/// Trading days per year used for annualization.
pub const TRADING_DAYS: f64 = 252.0;

/// Fewer paired daily returns than this yields an all-zero result.
pub const MIN_PAIRED_OBSERVATIONS: usize = 10;

const EPSILON: f64 = 1e-12;

/// Pair portfolio and benchmark returns that fall on the same date.
///
/// Portfolio order is kept; portfolio dates missing from the benchmark are
/// dropped.
pub fn pair_by_date(portfolio: &[ReturnPoint], benchmark: &[ReturnPoint]) -> Vec<(f64, f64)> {
    let by_date: HashMap<_, _> = benchmark.iter().map(|p| (p.date, p.ret)).collect();

    portfolio
        .iter()
        .filter_map(|p| by_date.get(&p.date).map(|&rb| (p.ret, rb)))
        .collect()
}

/// Arithmetic mean; 0 for an empty slice.
pub fn mean(xs: &[f64]) -> f64 {
    if xs.is_empty() {
        return 0.0;
    }
    xs.iter().sum::<f64>() / xs.len() as f64
}

/// Sample variance around `mean`; 0 with fewer than two observations.
pub fn sample_variance(xs: &[f64], mean: f64) -> f64 {
    if xs.len() < 2 {
        return 0.0;
    }
    xs.iter().map(|x| (x - mean) * (x - mean)).sum::<f64>() / (xs.len() - 1) as f64
}

/// Sample covariance; 0 with fewer than two observations.
pub fn sample_covariance(xs: &[f64], ys: &[f64], mean_x: f64, mean_y: f64) -> f64 {
    let n = xs.len().min(ys.len());
    if n < 2 {
        return 0.0;
    }
    xs.iter()
        .zip(ys)
        .map(|(x, y)| (x - mean_x) * (y - mean_y))
        .sum::<f64>()
        / (n - 1) as f64
}

/// Convert an annual rate to its compounded daily equivalent.
pub fn daily_risk_free(annual_rate: f64) -> f64 {
    (1.0 + annual_rate).powf(1.0 / TRADING_DAYS) - 1.0
}

/// Annualized Sharpe ratio from daily moments.
pub fn sharpe_ratio(mean: f64, variance: f64, daily_rf: f64) -> f64 {
    (mean - daily_rf) / (variance.sqrt() + EPSILON) * TRADING_DAYS.sqrt()
}

/// Compute the full metrics set for a portfolio against a benchmark.
///
/// The two series are aligned by date first. With fewer than
/// [`MIN_PAIRED_OBSERVATIONS`] pairs every field is zero. Degenerate
/// inputs never produce NaN or infinity: zero benchmark variance gives a
/// zero beta, R² is clamped to [0, 1], and any non-finite statistic is
/// reported as zero.
pub fn compute_metrics(
    portfolio: &[ReturnPoint],
    benchmark: &[ReturnPoint],
    risk_free_annual: f64,
) -> MetricsResult {
    let paired = pair_by_date(portfolio, benchmark);
    if paired.len() < MIN_PAIRED_OBSERVATIONS {
        tracing::debug!(
            "Only {} paired observations, need {}",
            paired.len(),
            MIN_PAIRED_OBSERVATIONS
        );
        return MetricsResult::default();
    }

    let (rp, rb): (Vec<f64>, Vec<f64>) = paired.into_iter().unzip();

    let mean_p = mean(&rp);
    let mean_b = mean(&rb);
    let var_p = sample_variance(&rp, mean_p);
    let var_b = sample_variance(&rb, mean_b);
    let cov = sample_covariance(&rp, &rb, mean_p, mean_b);

    // Regression of portfolio on benchmark
    let beta = if var_b > 0.0 { cov / var_b } else { 0.0 };
    let alpha_daily = mean_p - beta * mean_b;
    let r_squared = (cov * cov) / (var_b * var_p + EPSILON);
    let r_squared = if r_squared.is_finite() {
        r_squared.clamp(0.0, 1.0)
    } else {
        0.0
    };

    let volatility_annual = var_p.sqrt() * TRADING_DAYS.sqrt();
    let alpha_annual = (1.0 + alpha_daily).powf(TRADING_DAYS) - 1.0;

    // Residual after removing the benchmark exposure
    let excess: Vec<f64> = rp.iter().zip(&rb).map(|(p, b)| p - beta * b).collect();
    let var_excess = sample_variance(&excess, mean(&excess));
    let tracking_error_annual = var_excess.sqrt() * TRADING_DAYS.sqrt();

    let rf_daily = daily_risk_free(risk_free_annual);
    let sharpe_portfolio = sharpe_ratio(mean_p, var_p, rf_daily);
    let sharpe_benchmark = sharpe_ratio(mean_b, var_b, rf_daily);

    let information_ratio = if tracking_error_annual > 0.0 {
        ((mean_p - mean_b) * TRADING_DAYS) / tracking_error_annual
    } else {
        0.0
    };

    MetricsResult {
        alpha_annual: finite_or_zero(alpha_annual),
        beta: finite_or_zero(beta),
        r_squared,
        volatility_annual: finite_or_zero(volatility_annual),
        tracking_error_annual: finite_or_zero(tracking_error_annual),
        information_ratio: finite_or_zero(information_ratio),
        sharpe_portfolio: finite_or_zero(sharpe_portfolio),
        sharpe_benchmark: finite_or_zero(sharpe_benchmark),
    }
}

fn finite_or_zero(x: f64) -> f64 {
    if x.is_finite() {
        x
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::{assert_abs_diff_eq, assert_relative_eq};
    use chrono::{Days, NaiveDate};

    fn series(returns: &[f64]) -> Vec<ReturnPoint> {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        returns
            .iter()
            .enumerate()
            .map(|(i, &r)| ReturnPoint::new(start + Days::new(i as u64), r, 0.0))
            .collect()
    }

    const BENCH: [f64; 12] = [
        0.010, -0.020, 0.015, 0.003, -0.007, 0.012, -0.004, 0.008, -0.011, 0.006, 0.002, -0.001,
    ];
    // 1.2 * BENCH + 0.0005 + idiosyncratic noise
    const PORT: [f64; 12] = [
        0.0145, -0.0245, 0.0185, 0.0071, -0.0099, 0.0159, -0.0073, 0.0121, -0.0127, 0.0067,
        0.0039, -0.0027,
    ];

    #[test]
    fn test_moments() {
        let xs = [1.0, 2.0, 3.0, 4.0];
        let m = mean(&xs);
        assert_eq!(m, 2.5);
        // sum of squared deviations = 5, / (n - 1)
        assert_relative_eq!(sample_variance(&xs, m), 5.0 / 3.0);
        assert_relative_eq!(sample_covariance(&xs, &xs, m, m), 5.0 / 3.0);

        assert_eq!(mean(&[]), 0.0);
        assert_eq!(sample_variance(&[1.0], 1.0), 0.0);
        assert_eq!(sample_covariance(&[1.0], &[2.0], 1.0, 2.0), 0.0);
    }

    #[test]
    fn test_daily_risk_free_compounds() {
        let daily = daily_risk_free(0.02);
        assert_relative_eq!((1.0 + daily).powf(252.0), 1.02, epsilon = 1e-12);
        assert_eq!(daily_risk_free(0.0), 0.0);
    }

    #[test]
    fn test_reference_values() {
        let m = compute_metrics(&series(&PORT), &series(&BENCH), 0.02);

        assert_relative_eq!(m.beta, 1.28745219712822, max_relative = 1e-9);
        assert_relative_eq!(m.alpha_annual, 0.10749960033618033, max_relative = 1e-9);
        assert_relative_eq!(m.r_squared, 0.9849391197061034, max_relative = 1e-9);
        assert_relative_eq!(m.volatility_annual, 0.21100559234295194, max_relative = 1e-9);
        assert_relative_eq!(m.tracking_error_annual, 0.025849506200123655, max_relative = 1e-9);
        assert_relative_eq!(m.information_ratio, 6.986593809638657, max_relative = 1e-9);
        assert_relative_eq!(m.sharpe_portfolio, 2.0558535428870237, max_relative = 1e-9);
        assert_relative_eq!(m.sharpe_benchmark, 1.556605670195582, max_relative = 1e-9);
    }

    #[test]
    fn test_fewer_than_ten_pairs_is_all_zero() {
        let m = compute_metrics(&series(&PORT[..9]), &series(&BENCH), 0.02);
        assert!(m.is_zero());

        // 12 portfolio points but only 9 shared dates
        let mut bench = series(&BENCH);
        bench.truncate(9);
        let m = compute_metrics(&series(&PORT), &bench, 0.02);
        assert!(m.is_zero());
    }

    #[test]
    fn test_alignment_uses_only_shared_dates() {
        let portfolio = series(&PORT);
        // drop two benchmark days, leaving exactly ten pairs
        let benchmark: Vec<ReturnPoint> = series(&BENCH)
            .into_iter()
            .enumerate()
            .filter(|(i, _)| *i != 3 && *i != 7)
            .map(|(_, p)| p)
            .collect();

        let paired = pair_by_date(&portfolio, &benchmark);
        assert_eq!(paired.len(), 10);
        assert_eq!(paired[3], (PORT[4], BENCH[4]));

        let m = compute_metrics(&portfolio, &benchmark, 0.02);
        assert!(!m.is_zero());
    }

    #[test]
    fn test_identical_series() {
        let m = compute_metrics(&series(&BENCH), &series(&BENCH), 0.02);

        assert_eq!(m.beta, 1.0);
        assert_abs_diff_eq!(m.alpha_annual, 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!(m.r_squared, 1.0, epsilon = 1e-3);
        assert_eq!(m.tracking_error_annual, 0.0);
        assert_eq!(m.information_ratio, 0.0);
        assert_relative_eq!(m.sharpe_portfolio, m.sharpe_benchmark);
    }

    #[test]
    fn test_volatility_annualization() {
        // alternating +/-a with zero mean has sample std of exactly 0.01
        let a = 0.01 * (251.0_f64 / 252.0).sqrt();
        let returns: Vec<f64> = (0..252).map(|i| if i % 2 == 0 { a } else { -a }).collect();
        let bench: Vec<f64> = (0..252).map(|i| ((i % 5) as f64 - 2.0) * 0.001).collect();

        let m = compute_metrics(&series(&returns), &series(&bench), 0.0);
        assert_relative_eq!(m.volatility_annual, 0.01 * 252.0_f64.sqrt(), max_relative = 1e-9);
        assert_abs_diff_eq!(m.volatility_annual, 0.1587, epsilon = 1e-4);
    }

    #[test]
    fn test_flat_benchmark_is_guarded() {
        let flat = [0.0; 12];
        let m = compute_metrics(&series(&PORT), &series(&flat), 0.02);

        assert_eq!(m.beta, 0.0);
        assert_eq!(m.r_squared, 0.0);
        assert!(m.sharpe_benchmark.is_finite());
        assert!(m.sharpe_benchmark < 0.0);
        assert_relative_eq!(m.volatility_annual, 0.21100559234295194, max_relative = 1e-9);
        // with zero beta the residual is the portfolio itself
        assert_relative_eq!(m.tracking_error_annual, m.volatility_annual);
    }

    #[test]
    fn test_flat_portfolio_is_guarded() {
        let flat = [0.0; 12];
        let m = compute_metrics(&series(&flat), &series(&BENCH), 0.02);

        assert_eq!(m.beta, 0.0);
        assert_eq!(m.r_squared, 0.0);
        assert_eq!(m.volatility_annual, 0.0);
        assert!(m.sharpe_portfolio.is_finite());
        for v in [
            m.alpha_annual,
            m.tracking_error_annual,
            m.information_ratio,
            m.sharpe_benchmark,
        ] {
            assert!(v.is_finite());
        }
    }

    #[test]
    fn test_alpha_is_compounded_not_scaled() {
        // portfolio = benchmark + 0.001 every day: beta 1, daily alpha 0.001
        let shifted: Vec<f64> = BENCH.iter().map(|b| b + 0.001).collect();
        let m = compute_metrics(&series(&shifted), &series(&BENCH), 0.0);

        assert_relative_eq!(m.beta, 1.0, epsilon = 1e-9);
        assert_relative_eq!(m.alpha_annual, 1.001_f64.powf(252.0) - 1.0, max_relative = 1e-6);
        assert!(m.alpha_annual > 0.001 * 252.0);
    }
}
