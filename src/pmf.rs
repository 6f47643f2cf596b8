//! Dense probability vectors and the per-die combinators.
//!
//! Every vector here is indexed from the minimum of the variable it describes:
//! index 0 of a single die is face 1, index 0 of a running sum is the number of
//! dice rolled so far, and so on.

use crate::set::IntegerSet;

/// A single fair die: `sides` entries of `1/sides`.
#[must_use]
pub fn uniform(sides: u32) -> Vec<f64> {
    vec![1.0 / f64::from(sides); sides as usize]
}

/// `Pr(X ≤ x)` as a running prefix sum.
#[must_use]
pub fn cdf(pmf: &[f64]) -> Vec<f64> {
    pmf.iter()
        .scan(0.0, |acc, &p| {
            *acc += p;
            Some(*acc)
        })
        .collect()
}

/// `Pr(X ≥ x)`; entry 0 is always 1.
///
/// Clamped to `0..=1` since `1 - prefix` goes slightly negative past the tail.
#[must_use]
pub fn ccdf(pmf: &[f64]) -> Vec<f64> {
    pmf.iter()
        .scan(0.0_f64, |below, &p| {
            let value = (1.0 - *below).clamp(0.0, 1.0);
            *below += p;
            Some(value)
        })
        .collect()
}

/// Adds one `sides`-sided die to a running sum.
///
/// Sliding window over `acc`: each output is the mean of the `sides` inputs
/// that can reach it, so the cost stays linear in the support. Subtracting
/// inputs back out of the window leaves rounding residue in the tails, which
/// is clamped at zero.
#[must_use]
pub fn combine_sum(acc: &[f64], sides: u32) -> Vec<f64> {
    let width = sides as usize;
    let support = acc.len() + width - 1;
    let scale = f64::from(sides);
    let mut out = Vec::with_capacity(support);
    let mut window = 0.0;
    for z in 0..support {
        if z < acc.len() {
            window += acc[z];
        }
        if z >= width {
            window -= acc[z - width];
        }
        out.push((window / scale).max(0.0));
    }
    out
}

/// Folds one `sides`-sided die into a running maximum.
#[must_use]
pub fn combine_max(acc: &[f64], sides: u32) -> Vec<f64> {
    let width = sides as usize;
    let scale = f64::from(sides);
    let below = cdf(acc);
    (0..acc.len().max(width))
        .map(|z| match (z < acc.len(), z < width) {
            // old max is z and the die shows at most z, or old max is below and the die shows z
            (true, true) => (acc[z] * z as f64 + below[z]) / scale,
            (true, false) => acc[z],
            (false, true) => 1.0 / scale,
            (false, false) => unreachable!(),
        })
        .collect()
}

/// Folds one `sides`-sided die into a running minimum.
#[must_use]
pub fn combine_min(acc: &[f64], sides: u32) -> Vec<f64> {
    let width = sides as usize;
    let scale = f64::from(sides);
    let above = ccdf(acc);
    (0..acc.len().min(width))
        .map(|z| (acc[z] * (width - z - 1) as f64 + above[z]) / scale)
        .collect()
}

/// Chance that one roll of a `sides`-sided die lands in `set`.
#[must_use]
pub fn prob_in_set(sides: u32, set: &IntegerSet) -> f64 {
    set.count_reachable(sides) as f64 / f64::from(sides)
}

/// Binomial(`count`, `pr`) over `0..=count` successes.
///
/// Uses the ratio `pmf[i] / pmf[i-1] = pr*(count-i+1) / (i*(1-pr))`, summed in
/// log space so `(1-pr)^count` cannot underflow for large pools.
#[must_use]
pub fn binomial(count: u32, pr: f64) -> Vec<f64> {
    let n = count as usize;
    let mut out = vec![0.0; n + 1];
    if pr >= 1.0 {
        out[n] = 1.0;
        return out;
    }
    if pr <= 0.0 {
        out[0] = 1.0;
        return out;
    }

    let odds = (pr / (1.0 - pr)).ln();
    let mut log_p = f64::from(count) * (1.0 - pr).ln();
    out[0] = log_p.exp();
    for i in 1..=n {
        log_p += odds + ((n - i + 1) as f64 / i as f64).ln();
        out[i] = log_p.exp();
    }
    out
}

/// Full discrete convolution of two independent variables.
#[must_use]
pub fn convolve(a: &[f64], b: &[f64]) -> Vec<f64> {
    if a.is_empty() || b.is_empty() {
        return Vec::new();
    }
    let mut out = vec![0.0; a.len() + b.len() - 1];
    for (i, &x) in a.iter().enumerate() {
        if x == 0.0 {
            continue;
        }
        for (j, &y) in b.iter().enumerate() {
            out[i + j] += x * y;
        }
    }
    out
}
