//! Trend analysis over statistics-store history (spec §2's "Trend
//! analyzer" component), grounded on `original_source`'s `trends.py`.
//! The original leans on numpy/scipy/sklearn/pandas for ARIMA-grade
//! seasonality and exponential-smoothing forecasts; none of those are part
//! of this crate's dependency stack, and `SPEC_FULL.md`'s supplement scopes
//! this down to the signals that matter for the advisor's feedback loop: a
//! moving average, day-over-day delta, a naive standard-deviation anomaly
//! flag, and a linear-regression trend/forecast. Seasonality detection is
//! dropped rather than faked with an under-powered approximation.

use crate::stats::store::StatisticsStore;
use chrono::{DateTime, Duration, Utc};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrendType {
    Increasing,
    Decreasing,
    Stable,
    Fluctuating,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Anomaly {
    pub timestamp: DateTime<Utc>,
    pub value: f64,
    pub expected_value: f64,
    pub deviation: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TrendAnalysis {
    pub trend_type: TrendType,
    pub slope: f64,
    pub r_squared: f64,
    pub anomalies: Vec<Anomaly>,
    pub growth_rate_per_day: f64,
    pub forecast_next: Option<f64>,
}

fn mean(xs: &[f64]) -> f64 {
    if xs.is_empty() {
        0.0
    } else {
        xs.iter().sum::<f64>() / xs.len() as f64
    }
}

fn stddev(xs: &[f64], m: f64) -> f64 {
    if xs.len() < 2 {
        return 0.0;
    }
    let var = xs.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (xs.len() - 1) as f64;
    var.sqrt()
}

/// Ordinary least squares of `y` against `x = 0..n`, returning
/// `(slope, intercept, r_squared)`.
fn linear_regression(ys: &[f64]) -> (f64, f64, f64) {
    let n = ys.len() as f64;
    if ys.len() < 2 {
        return (0.0, ys.first().copied().unwrap_or(0.0), 0.0);
    }
    let xs: Vec<f64> = (0..ys.len()).map(|i| i as f64).collect();
    let x_mean = mean(&xs);
    let y_mean = mean(ys);
    let mut cov = 0.0;
    let mut var_x = 0.0;
    for (x, y) in xs.iter().zip(ys.iter()) {
        cov += (x - x_mean) * (y - y_mean);
        var_x += (x - x_mean).powi(2);
    }
    let slope = if var_x == 0.0 { 0.0 } else { cov / var_x };
    let intercept = y_mean - slope * x_mean;

    let mut ss_res = 0.0;
    let mut ss_tot = 0.0;
    for (x, y) in xs.iter().zip(ys.iter()) {
        let pred = slope * x + intercept;
        ss_res += (y - pred).powi(2);
        ss_tot += (y - y_mean).powi(2);
    }
    let r_squared = if ss_tot == 0.0 { 1.0 } else { 1.0 - ss_res / ss_tot };
    let _ = n;
    (slope, intercept, r_squared)
}

fn classify_trend(series: &[f64], slope: f64) -> TrendType {
    let m = mean(series);
    let sd = stddev(series, m);
    let cv = if m != 0.0 { sd / m.abs() } else { f64::INFINITY };
    if cv > 0.5 {
        return TrendType::Fluctuating;
    }
    if slope.abs() < 0.01 {
        return TrendType::Stable;
    }
    if slope > 0.0 {
        TrendType::Increasing
    } else {
        TrendType::Decreasing
    }
}

/// Flags samples more than 3 standard deviations from the series mean
/// (`trends.py`'s `_detect_anomalies`, z-score > 3).
fn detect_anomalies(timestamps: &[DateTime<Utc>], values: &[f64]) -> Vec<Anomaly> {
    let m = mean(values);
    let sd = stddev(values, m);
    if sd == 0.0 {
        return Vec::new();
    }
    timestamps
        .iter()
        .zip(values.iter())
        .filter_map(|(t, v)| {
            let z = (v - m).abs() / sd;
            if z > 3.0 {
                Some(Anomaly {
                    timestamp: *t,
                    value: *v,
                    expected_value: m,
                    deviation: z,
                })
            } else {
                None
            }
        })
        .collect()
}

fn analyze_series(timestamps: &[DateTime<Utc>], values: &[f64]) -> TrendAnalysis {
    let (slope, intercept, r_squared) = linear_regression(values);
    let trend_type = classify_trend(values, slope);
    let anomalies = detect_anomalies(timestamps, values);
    let growth_rate_per_day = if values.len() >= 2 && values[0] != 0.0 {
        (values[values.len() - 1] - values[0]) / values[0]
    } else {
        0.0
    };
    let forecast_next = if values.len() >= 2 {
        Some(slope * values.len() as f64 + intercept)
    } else {
        None
    };
    TrendAnalysis {
        trend_type,
        slope,
        r_squared,
        anomalies,
        growth_rate_per_day,
        forecast_next,
    }
}

/// Analyzes statistics-store history for an index (spec §2's trend
/// analyzer). Each `analyze_*` call mirrors one of `trends.py`'s
/// `analyze_performance_trends` / `analyze_growth_patterns` /
/// `analyze_condition_effectiveness` entry points.
pub struct TrendAnalyzer<'a> {
    store: &'a StatisticsStore,
}

impl<'a> TrendAnalyzer<'a> {
    pub fn new(store: &'a StatisticsStore) -> Self {
        TrendAnalyzer { store }
    }

    fn history(&self, index_name: &str, days: u32, now: DateTime<Utc>) -> Vec<crate::stats::IndexStats> {
        self.store.stats_history(index_name, Some(now - Duration::days(days as i64)), Some(now))
    }

    pub fn analyze_performance_trends(&self, index_name: &str, days: u32, now: DateTime<Utc>) -> Option<TrendAnalysis> {
        let history = self.history(index_name, days, now);
        if history.is_empty() {
            return None;
        }
        let timestamps: Vec<_> = history.iter().map(|s| s.created_at).collect();
        let read_times: Vec<_> = history.iter().map(|s| s.usage.avg_read_time_ms).collect();
        Some(analyze_series(&timestamps, &read_times))
    }

    pub fn analyze_growth_patterns(&self, index_name: &str, days: u32, now: DateTime<Utc>) -> Option<TrendAnalysis> {
        let history = self.history(index_name, days, now);
        if history.is_empty() {
            return None;
        }
        let timestamps: Vec<_> = history.iter().map(|s| s.created_at).collect();
        let entries: Vec<_> = history.iter().map(|s| s.size.total_entries as f64).collect();
        Some(analyze_series(&timestamps, &entries))
    }

    pub fn analyze_condition_effectiveness(&self, index_name: &str, days: u32, now: DateTime<Utc>) -> Option<TrendAnalysis> {
        let history = self.history(index_name, days, now);
        if history.is_empty() || !history.iter().all(|s| s.condition.is_some()) {
            return None;
        }
        let timestamps: Vec<_> = history.iter().map(|s| s.created_at).collect();
        let fp: Vec<_> = history.iter().map(|s| s.condition.as_ref().unwrap().false_positive_rate).collect();
        Some(analyze_series(&timestamps, &fp))
    }
}

#[cfg(test)]
mod trends_test;
