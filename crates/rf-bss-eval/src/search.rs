//! Permutation search over estimate-to-reference assignments

use crate::config::EvalConfig;
use crate::decompose::decompose_with_config;
use crate::metrics::{mean_of, EvaluationResult, MetricTriple, SourceScore};
use crate::permutation::Permutations;
use crate::signal::{check_len, check_min_len, mix, peak_diff, residual};
use crate::{BssEvalError, Result};
use rayon::prelude::*;

/// Exhaustive assignment search.
///
/// Every one of the N! permutations is scored by its mean SDR and the first
/// maximum in lexicographic order wins. Each (estimate, reference) pairing is
/// decomposed once and shared by all permutations that use it.
#[derive(Debug, Clone, Default)]
pub struct AssignmentSearch {
    config: EvalConfig,
}

impl AssignmentSearch {
    pub fn new(config: EvalConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EvalConfig {
        &self.config
    }

    /// Find the best assignment of `estimates` to `references`.
    ///
    /// `mixture` should be the sample-wise sum of `references`.
    pub fn search<R, E>(
        &self,
        mixture: &[f64],
        references: &[R],
        estimates: &[E],
    ) -> Result<EvaluationResult>
    where
        R: AsRef<[f64]> + Sync,
        E: AsRef<[f64]> + Sync,
    {
        let matrix = score_matrix(mixture, references, estimates, &self.config)?;
        let num_sources = matrix.len();

        let score =
            |p: &Vec<usize>| mean_of(p.iter().enumerate().map(|(k, &j)| matrix[k][j].sdr));
        // Sequential path streams permutations; parallel path materializes all N! of them
        let best = if self.config.parallel {
            let permutations: Vec<Vec<usize>> = Permutations::new(num_sources).collect();
            let scores: Vec<f64> = permutations.par_iter().map(score).collect();
            select_best(permutations.into_iter().zip(scores))
        } else {
            select_best(Permutations::new(num_sources).map(|p| {
                let s = score(&p);
                (p, s)
            }))
        };
        let (permutation, mean_sdr, permutations_evaluated) =
            best.ok_or(BssEvalError::NoSources)?;

        if mean_sdr.is_nan() {
            log::warn!("Every assignment scored NaN (silent reference?), keeping {permutation:?}");
        }
        log::debug!(
            "Best of {} assignments for {} sources: {:?} ({:.2} dB)",
            permutations_evaluated,
            num_sources,
            permutation,
            mean_sdr
        );

        let mut sources: Vec<SourceScore> = permutation
            .iter()
            .enumerate()
            .map(|(k, &j)| SourceScore {
                label: EvaluationResult::label_for(j),
                reference_index: j,
                estimate_index: k,
                metrics: matrix[k][j],
            })
            .collect();
        sources.sort_by_key(|s| s.reference_index);

        Ok(EvaluationResult {
            sources,
            permutation,
            mean_sdr,
            permutations_evaluated,
        })
    }
}

/// Best-assignment triples, ordered by reference index (default settings)
pub fn search_best_assignment<R, E>(
    mixture: &[f64],
    references: &[R],
    estimates: &[E],
) -> Result<Vec<MetricTriple>>
where
    R: AsRef<[f64]> + Sync,
    E: AsRef<[f64]> + Sync,
{
    Ok(AssignmentSearch::default()
        .search(mixture, references, estimates)?
        .triples())
}

/// Search with the mixture rebuilt as the sum of `references`
pub fn evaluate<R, E>(
    references: &[R],
    estimates: &[E],
    config: &EvalConfig,
) -> Result<EvaluationResult>
where
    R: AsRef<[f64]> + Sync,
    E: AsRef<[f64]> + Sync,
{
    config.validate()?;
    check_counts(references.len(), estimates.len(), config.max_sources)?;
    let mixture = mix(references)?;
    AssignmentSearch::new(config.clone()).search(&mixture, references, estimates)
}

/// Triples for every pairing: `matrix[k][j]` scores estimate `k` against reference `j`.
pub fn score_matrix<R, E>(
    mixture: &[f64],
    references: &[R],
    estimates: &[E],
    config: &EvalConfig,
) -> Result<Vec<Vec<MetricTriple>>>
where
    R: AsRef<[f64]> + Sync,
    E: AsRef<[f64]> + Sync,
{
    config.validate()?;
    check_counts(references.len(), estimates.len(), config.max_sources)?;
    check_min_len(mixture)?;
    for reference in references {
        check_len(reference.as_ref(), mixture.len())?;
    }
    for estimate in estimates {
        check_len(estimate.as_ref(), mixture.len())?;
    }

    if let Some(tolerance) = config.mixture_tolerance {
        let diff = peak_diff(mixture, &mix(references)?);
        if diff > tolerance {
            log::warn!(
                "Mixture differs from the sum of references by {diff:.3e} (tolerance {tolerance:.3e})"
            );
        }
    }

    let num_sources = references.len();
    let residuals = references
        .iter()
        .map(|r| residual(mixture, r.as_ref()))
        .collect::<Result<Vec<_>>>()?;

    let pair = |index: usize| {
        let (k, j) = (index / num_sources, index % num_sources);
        decompose_with_config(
            estimates[k].as_ref(),
            references[j].as_ref(),
            &residuals[j],
            config,
        )
    };
    let flat: Vec<MetricTriple> = if config.parallel {
        (0..num_sources * num_sources)
            .into_par_iter()
            .map(pair)
            .collect::<Result<_>>()?
    } else {
        (0..num_sources * num_sources)
            .map(pair)
            .collect::<Result<_>>()?
    };

    Ok(flat.chunks(num_sources).map(<[MetricTriple]>::to_vec).collect())
}

fn check_counts(references: usize, estimates: usize, max_sources: usize) -> Result<()> {
    if references != estimates {
        return Err(BssEvalError::CountMismatch {
            references,
            estimates,
        });
    }
    if references == 0 {
        return Err(BssEvalError::NoSources);
    }
    if references > max_sources {
        return Err(BssEvalError::TooManySources {
            count: references,
            max: max_sources,
        });
    }
    Ok(())
}

/// First maximum with its score and the number of candidates seen.
///
/// NaN loses to any number; if every score is NaN the first candidate is kept.
fn select_best<T: std::fmt::Debug>(
    scored: impl IntoIterator<Item = (T, f64)>,
) -> Option<(T, f64, usize)> {
    let mut best: Option<(T, f64)> = None;
    let mut count = 0;
    for (candidate, score) in scored {
        count += 1;
        log::trace!("permutation {candidate:?}: mean SDR {score:.3} dB");
        let replace = match &best {
            None => true,
            Some((_, current)) => score > *current || (current.is_nan() && !score.is_nan()),
        };
        if replace {
            best = Some((candidate, score));
        }
    }
    best.map(|(candidate, score)| (candidate, score, count))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp(n: usize) -> Vec<f64> {
        (0..n).map(|i| i as f64 / n as f64).collect()
    }

    fn zigzag(n: usize) -> Vec<f64> {
        (0..n).map(|i| if i % 2 == 0 { 1.0 } else { -1.0 }).collect()
    }

    fn best_index(scores: &[f64]) -> usize {
        select_best(scores.iter().copied().enumerate()).unwrap().0
    }

    #[test]
    fn test_select_best_first_max() {
        assert_eq!(best_index(&[1.0, 3.0, 3.0, 2.0]), 1);
        assert_eq!(best_index(&[f64::INFINITY, f64::INFINITY]), 0);
        assert_eq!(best_index(&[f64::NAN, -5.0, f64::NAN, 0.0]), 3);
        assert_eq!(best_index(&[f64::NAN, f64::NAN]), 0);
        assert_eq!(best_index(&[f64::NEG_INFINITY, -1.0]), 1);
        assert!(select_best(std::iter::empty::<(usize, f64)>()).is_none());
    }

    #[test]
    fn test_select_best_streams_permutations() {
        // Score favours the reversed permutation, which comes last
        let scored = Permutations::new(5).map(|p| {
            let s = -p.iter().enumerate().map(|(k, &j)| (k * j) as f64).sum::<f64>();
            (p, s)
        });
        let (best, score, count) = select_best(scored).unwrap();
        assert_eq!(best, vec![4, 3, 2, 1, 0]);
        assert_eq!(score, -10.0);
        assert_eq!(count, 120);
    }

    #[test]
    fn test_count_checks() {
        assert_eq!(
            check_counts(2, 3, 6),
            Err(BssEvalError::CountMismatch {
                references: 2,
                estimates: 3
            })
        );
        assert_eq!(check_counts(0, 0, 6), Err(BssEvalError::NoSources));
        assert_eq!(
            check_counts(7, 7, 6),
            Err(BssEvalError::TooManySources { count: 7, max: 6 })
        );
        assert!(check_counts(6, 6, 6).is_ok());
    }

    #[test]
    fn test_single_source() {
        // Residual of a lone source is all zeros, so the Gram matrix is singular
        let refs = vec![ramp(64)];
        let err = evaluate(&refs, &refs, &EvalConfig::default()).unwrap_err();
        assert!(matches!(err, BssEvalError::SingularGramMatrix { .. }));

        // With background noise in the mixture the single identity permutation is scored
        let noise = zigzag(64);
        let mixture: Vec<f64> = refs[0].iter().zip(&noise).map(|(r, n)| r + n).collect();
        let result = AssignmentSearch::new(EvalConfig::default().with_mixture_tolerance(None))
            .search(&mixture, &refs, &refs)
            .unwrap();
        assert_eq!(result.permutation, vec![0]);
        assert_eq!(result.permutations_evaluated, 1);
        assert!(result.sources[0].metrics.is_perfect());
    }

    #[test]
    fn test_score_matrix_shape() {
        let refs = vec![ramp(32), zigzag(32)];
        let mixture = mix(&refs).unwrap();
        let matrix = score_matrix(&mixture, &refs, &refs, &EvalConfig::default()).unwrap();

        assert_eq!(matrix.len(), 2);
        assert!(matrix.iter().all(|row| row.len() == 2));
        assert!(matrix[0][0].is_perfect());
        assert!(matrix[1][1].is_perfect());
        assert!(matrix[0][1].sdr < 0.0);
    }

    #[test]
    fn test_length_mismatch_aborts() {
        let refs = vec![ramp(32), zigzag(32)];
        let mixture = mix(&refs).unwrap();
        let estimates = vec![ramp(32), zigzag(31)];

        let err = AssignmentSearch::default()
            .search(&mixture, &refs, &estimates)
            .unwrap_err();
        assert_eq!(
            err,
            BssEvalError::ShapeMismatch {
                expected: 32,
                got: 31
            }
        );
    }

    #[test]
    fn test_zero_source_bound_is_invalid_config() {
        let refs = vec![ramp(32), zigzag(32)];
        let config = EvalConfig::default().with_max_sources(0);
        assert!(matches!(
            evaluate(&refs, &refs, &config),
            Err(BssEvalError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_invalid_config_rejected() {
        let refs = vec![ramp(32), zigzag(32)];
        let config = EvalConfig::default().with_singular_tolerance(f64::NAN);
        assert!(matches!(
            evaluate(&refs, &refs, &config),
            Err(BssEvalError::InvalidConfig(_))
        ));
    }
}
