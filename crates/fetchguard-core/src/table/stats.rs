//! Descriptive statistics for numeric columns.

use serde::Serialize;

use super::{ColumnType, Table};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnStats {
    pub count: usize,
    pub mean: f64,
    pub median: f64,
    /// Sample standard deviation; `None` with fewer than two values.
    pub std: Option<f64>,
    pub min: f64,
    pub max: f64,
    pub q25: f64,
    pub q75: f64,
}

impl ColumnStats {
    /// `None` for an empty slice.
    pub fn from_values(values: &[f64]) -> Option<ColumnStats> {
        if values.is_empty() {
            return None;
        }
        let mut sorted = values.to_vec();
        sorted.sort_by(f64::total_cmp);

        let n = sorted.len();
        let mean = sorted.iter().sum::<f64>() / n as f64;
        let std = (n > 1).then(|| {
            let ss: f64 = sorted.iter().map(|x| (x - mean).powi(2)).sum();
            (ss / (n - 1) as f64).sqrt()
        });

        Some(ColumnStats {
            count: n,
            mean,
            median: quantile(&sorted, 0.5),
            std,
            min: sorted[0],
            max: sorted[n - 1],
            q25: quantile(&sorted, 0.25),
            q75: quantile(&sorted, 0.75),
        })
    }
}

/// Quantile of sorted, non-empty data with linear interpolation between
/// the two nearest ranks.
pub fn quantile(sorted: &[f64], q: f64) -> f64 {
    let pos = (sorted.len() - 1) as f64 * q.clamp(0.0, 1.0);
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    sorted[lo] + (sorted[hi] - sorted[lo]) * (pos - lo as f64)
}

impl Table {
    /// Statistics for each named column that is numeric and has at least one
    /// value. Text, empty and unknown columns are skipped.
    pub fn statistics(&self, columns: &[&str]) -> Vec<(String, ColumnStats)> {
        let mut out = Vec::new();
        for name in columns {
            if self.column_type(name) != Some(ColumnType::Number) {
                tracing::debug!("statistics: skipping non-numeric column {:?}", name);
                continue;
            }
            let values: Vec<f64> = match self.column(name) {
                Some(cells) => cells.filter_map(|v| v.as_f64()).collect(),
                None => continue,
            };
            if let Some(stats) = ColumnStats::from_values(&values) {
                out.push((name.to_string(), stats));
            }
        }
        out
    }
}
