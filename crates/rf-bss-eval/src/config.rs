//! Configuration for separation evaluation

use crate::{BssEvalError, Result};
use serde::{Deserialize, Serialize};

/// Configuration for decomposition and assignment search
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvalConfig {
    /// Least-squares scale the target before measuring distortion
    pub scaling: bool,

    /// Maximum number of sources accepted by the permutation search
    pub max_sources: usize,

    /// Evaluate permutations on the rayon pool
    pub parallel: bool,

    /// Reciprocal condition of the normalized Gram matrix at or below which it is singular
    pub singular_tolerance: f64,

    /// Peak |mixture - sum(references)| tolerated before warning (None = skip check)
    pub mixture_tolerance: Option<f64>,
}

impl Default for EvalConfig {
    fn default() -> Self {
        Self {
            scaling: true,
            max_sources: 6,              // 720 permutations
            parallel: false,
            singular_tolerance: 1e-10,
            mixture_tolerance: Some(1e-6),
        }
    }
}

impl EvalConfig {
    /// Scale-invariant measures (speech separation convention)
    pub fn scale_invariant() -> Self {
        Self::default()
    }

    /// Plain projection without target rescaling
    pub fn unscaled() -> Self {
        Self {
            scaling: false,
            ..Default::default()
        }
    }

    /// Scale-invariant measures, permutations evaluated in parallel
    pub fn parallel() -> Self {
        Self {
            parallel: true,
            ..Default::default()
        }
    }

    /// Builder pattern: set scaling mode
    pub fn with_scaling(mut self, scaling: bool) -> Self {
        self.scaling = scaling;
        self
    }

    /// Builder pattern: set source bound.
    ///
    /// Search time grows as N!. The parallel path also holds all N! permutations in
    /// memory at once (about 40 million vectors at N = 11); the sequential path streams them.
    pub fn with_max_sources(mut self, max: usize) -> Self {
        self.max_sources = max;
        self
    }

    /// Builder pattern: enable/disable parallel search
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Builder pattern: set singularity threshold
    pub fn with_singular_tolerance(mut self, tolerance: f64) -> Self {
        self.singular_tolerance = tolerance;
        self
    }

    /// Builder pattern: set or disable the mixture consistency check
    pub fn with_mixture_tolerance(mut self, tolerance: Option<f64>) -> Self {
        self.mixture_tolerance = tolerance;
        self
    }

    /// Reject out-of-range settings
    pub fn validate(&self) -> Result<()> {
        if self.max_sources == 0 {
            return Err(BssEvalError::InvalidConfig(
                "max_sources must be at least 1".into(),
            ));
        }
        if !self.singular_tolerance.is_finite() || self.singular_tolerance < 0.0 {
            return Err(BssEvalError::InvalidConfig(format!(
                "singular_tolerance must be finite and non-negative, got {}",
                self.singular_tolerance
            )));
        }
        if let Some(tol) = self.mixture_tolerance {
            if !tol.is_finite() || tol < 0.0 {
                return Err(BssEvalError::InvalidConfig(format!(
                    "mixture_tolerance must be finite and non-negative, got {tol}"
                )));
            }
        }
        Ok(())
    }
}
