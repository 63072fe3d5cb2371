//! Scale-invariant distortion decomposition
//!
//! An estimate is split into three orthogonal-ish parts relative to a stack
//! of reference components:
//!
//! - `e_true`: the (optionally rescaled) target component
//! - `e_interf`: the rest of the error that lies in the span of the references
//! - `e_artif`: whatever the references cannot explain
//!
//! SDR, SIR and SAR are the energy ratios of `e_true` against the total error,
//! the interference part and the artifact part. Every signal is demeaned on a
//! private copy first, so caller buffers are never touched.

use crate::config::EvalConfig;
use crate::metrics::MetricTriple;
use crate::signal::{check_len, check_min_len, demeaned, dot, energy, ratio_db};
use crate::{BssEvalError, Result};
use nalgebra::{DMatrix, DVector};

/// Score `estimated` against `target`, with `residual` as the only other
/// reference component (typically `mixture - target`).
pub fn decompose(
    estimated: &[f64],
    target: &[f64],
    residual: &[f64],
    scaling: bool,
) -> Result<MetricTriple> {
    decompose_with_config(
        estimated,
        target,
        residual,
        &EvalConfig::default().with_scaling(scaling),
    )
}

/// [`decompose`] with scaling mode and singularity threshold from `config`
pub fn decompose_with_config(
    estimated: &[f64],
    target: &[f64],
    residual: &[f64],
    config: &EvalConfig,
) -> Result<MetricTriple> {
    decompose_against(estimated, &[target, residual], 0, config)
}

/// Score `estimated` against component `target_index` of an arbitrary
/// reference stack. All components take part in the interference projection.
pub fn decompose_against(
    estimated: &[f64],
    references: &[&[f64]],
    target_index: usize,
    config: &EvalConfig,
) -> Result<MetricTriple> {
    if references.is_empty() {
        return Err(BssEvalError::NoSources);
    }
    if target_index >= references.len() {
        return Err(BssEvalError::TargetOutOfRange {
            index: target_index,
            count: references.len(),
        });
    }

    let num_samples = references[0].len();
    check_len(estimated, num_samples)?;
    for reference in references {
        check_len(reference, num_samples)?;
    }
    check_min_len(estimated)?;

    let estimated = demeaned(estimated);
    let refs: Vec<Vec<f64>> = references.iter().map(|r| demeaned(r)).collect();
    let target = &refs[target_index];

    let num_refs = refs.len();
    let rss = DMatrix::from_fn(num_refs, num_refs, |i, j| dot(&refs[i], &refs[j]));
    let condition = reciprocal_condition(&rss);
    // Also catches NaN from non-finite input
    if !(condition > config.singular_tolerance) {
        log::trace!("Gram matrix rejected, reciprocal condition {condition:e}");
        return Err(BssEvalError::SingularGramMatrix { condition });
    }

    let scale = if config.scaling {
        dot(target, &estimated) / rss[(target_index, target_index)]
    } else {
        1.0
    };

    let e_true: Vec<f64> = target.iter().map(|s| scale * s).collect();
    let e_res: Vec<f64> = estimated.iter().zip(&e_true).map(|(e, t)| e - t).collect();

    let target_energy = energy(&e_true);
    let sdr = ratio_db(target_energy, energy(&e_res));

    let rsr = DVector::from_fn(num_refs, |i, _| dot(&refs[i], &e_res));
    let coeffs = rss
        .lu()
        .solve(&rsr)
        .ok_or(BssEvalError::SingularGramMatrix { condition })?;

    let mut e_interf = vec![0.0; num_samples];
    for (b, reference) in coeffs.iter().zip(&refs) {
        for (out, s) in e_interf.iter_mut().zip(reference) {
            *out += b * s;
        }
    }
    let e_artif: Vec<f64> = e_res.iter().zip(&e_interf).map(|(r, i)| r - i).collect();

    let sir = ratio_db(target_energy, energy(&e_interf));
    let sar = ratio_db(target_energy, energy(&e_artif));

    Ok(MetricTriple::new(sdr, sir, sar))
}

/// Reciprocal condition of the correlation form of the Gram matrix.
///
/// Each entry is scaled by `sqrt(Rss[i][i] * Rss[j][j])` so that only collinearity
/// counts, not the energy ratio between components. A silent component gives 0.0.
fn reciprocal_condition(matrix: &DMatrix<f64>) -> f64 {
    let n = matrix.nrows();
    let norms: Vec<f64> = matrix.diagonal().iter().map(|d| d.sqrt()).collect();
    if norms.iter().any(|&norm| !(norm > 0.0)) {
        return 0.0;
    }
    let normalized = DMatrix::from_fn(n, n, |i, j| matrix[(i, j)] / norms[i] / norms[j]);

    let singular_values = normalized.singular_values();
    let max = singular_values.iter().copied().fold(0.0, f64::max);
    let min = singular_values.iter().copied().fold(f64::INFINITY, f64::min);
    if max > 0.0 {
        min / max
    } else {
        0.0
    }
}
