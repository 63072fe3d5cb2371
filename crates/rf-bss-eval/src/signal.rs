//! Sample-array helpers shared by the decomposition and the search

use crate::{BssEvalError, Result};

/// Inner product of two equal-length signals
pub fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

/// Sum of squared samples
pub fn energy(signal: &[f64]) -> f64 {
    signal.iter().map(|s| s * s).sum()
}

/// Mean of a signal (0.0 for an empty slice)
pub fn mean(signal: &[f64]) -> f64 {
    if signal.is_empty() {
        return 0.0;
    }
    signal.iter().sum::<f64>() / signal.len() as f64
}

/// Copy of `signal` with its DC offset removed
pub fn demeaned(signal: &[f64]) -> Vec<f64> {
    let m = mean(signal);
    signal.iter().map(|s| s - m).collect()
}

/// Energy ratio in dB.
///
/// Zero denominator gives +inf, 0/0 gives NaN.
pub fn ratio_db(numerator: f64, denominator: f64) -> f64 {
    10.0 * (numerator / denominator).log10()
}

/// Sample-wise sum of a set of equal-length signals
pub fn mix<S: AsRef<[f64]>>(signals: &[S]) -> Result<Vec<f64>> {
    let first = signals.first().ok_or(BssEvalError::NoSources)?.as_ref();
    let mut out = first.to_vec();
    for s in &signals[1..] {
        let s = s.as_ref();
        check_len(s, out.len())?;
        for (o, x) in out.iter_mut().zip(s) {
            *o += x;
        }
    }
    Ok(out)
}

/// `mixture - target`, i.e. everything in the mixture that is not the target
pub fn residual(mixture: &[f64], target: &[f64]) -> Result<Vec<f64>> {
    check_len(target, mixture.len())?;
    Ok(mixture.iter().zip(target).map(|(m, t)| m - t).collect())
}

/// Peak absolute sample difference
pub fn peak_diff(a: &[f64], b: &[f64]) -> f64 {
    a.iter()
        .zip(b)
        .map(|(x, y)| (x - y).abs())
        .fold(0.0, f64::max)
}

/// Fail with `ShapeMismatch` unless `signal` has `expected` samples
pub fn check_len(signal: &[f64], expected: usize) -> Result<()> {
    if signal.len() != expected {
        return Err(BssEvalError::ShapeMismatch {
            expected,
            got: signal.len(),
        });
    }
    Ok(())
}

/// Fail with `SignalTooShort` for fewer than two samples
pub fn check_min_len(signal: &[f64]) -> Result<()> {
    if signal.len() < 2 {
        return Err(BssEvalError::SignalTooShort { len: signal.len() });
    }
    Ok(())
}
