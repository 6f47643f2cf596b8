use itertools::Itertools;

use crate::pmf::cdf;

const MODE_TOLERANCE: f64 = 1e-12;
/// Slack for a CDF that should reach exactly one half but rounds just below.
const MEDIAN_TOLERANCE: f64 = 1e-9;

/// Summary of a PMF whose first entry sits at `start_x`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Stats {
    pub mean: f64,
    pub variance: f64,
    pub stddev: f64,
    pub median: i64,
    pub mode: Vec<i64>,
}

impl Stats {
    #[must_use]
    pub fn of(start_x: i64, pmf: &[f64]) -> Self {
        if pmf.is_empty() {
            return Self::default();
        }

        let xs = || (start_x..).map(|x| x as f64).zip(pmf.iter().copied());
        let mean: f64 = xs().map(|(x, p)| x * p).sum();
        let variance: f64 = xs().map(|(x, p)| (x - mean).powi(2) * p).sum();

        let median_idx = cdf(pmf)
            .iter()
            .position(|&c| c >= 0.5 - MEDIAN_TOLERANCE)
            .unwrap_or(pmf.len() - 1);

        let peak = pmf.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let mode = pmf
            .iter()
            .positions(|&p| peak - p <= MODE_TOLERANCE)
            .map(|i| start_x + i as i64)
            .collect();

        Self {
            mean,
            variance,
            stddev: variance.sqrt(),
            median: start_x + median_idx as i64,
            mode,
        }
    }
}
