//! Column Statistics Computation

use std::collections::BTreeMap;

/// Scaling statistics for one numeric column
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ColumnStatistics {
    pub mean: f64,
    /// Population standard deviation
    pub std_dev: f64,
}

impl ColumnStatistics {
    /// Compute statistics from a slice of values
    pub fn compute(values: &[f64]) -> Self {
        if values.is_empty() {
            return Self::default();
        }

        let n = values.len() as f64;
        let mean = values.iter().sum::<f64>() / n;
        let m2: f64 = values.iter().map(|v| (v - mean) * (v - mean)).sum();

        Self {
            mean,
            std_dev: (m2 / n).sqrt(),
        }
    }
}

/// Median; the mean of the two middle values for even counts
pub fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        Some((sorted[mid - 1] + sorted[mid]) / 2.0)
    } else {
        Some(sorted[mid])
    }
}

/// Most frequent level; ties go to the lexicographically smallest
pub fn mode<'a>(levels: impl IntoIterator<Item = &'a str>) -> Option<String> {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for level in levels {
        *counts.entry(level).or_default() += 1;
    }
    let mut best: Option<(&str, usize)> = None;
    for (level, count) in counts {
        if best.map_or(true, |(_, c)| count > c) {
            best = Some((level, count));
        }
    }
    best.map(|(level, _)| level.to_string())
}
