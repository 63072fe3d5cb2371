//! # rf-bss-eval
//!
//! Blind source separation scoring for regression testing of separators.
//!
//! ## Features
//!
//! - **Decomposition**: scale-invariant SDR / SIR / SAR via orthogonal projection
//! - **Assignment Search**: exhaustive permutation search over estimate-to-reference pairings
//! - **Parallel Search**: optional rayon fan-out with the same tie-break as the sequential path
//! - **Report Generation**: JSON, Markdown and plain text batch reports
//!
//! ## Example
//!
//! ```rust,ignore
//! use rf_bss_eval::{AssignmentSearch, EvalConfig};
//!
//! let search = AssignmentSearch::new(EvalConfig::default());
//! let result = search.search(&mixture, &references, &estimates)?;
//!
//! for source in &result.sources {
//!     println!("{}: SDR {:.2} dB", source.label, source.metrics.sdr);
//! }
//! ```
//!
//! The search is factorial in the number of sources. It is meant for the
//! 2-4 speaker case and refuses more than [`EvalConfig::max_sources`].

pub mod config;
pub mod decompose;
pub mod metrics;
pub mod permutation;
pub mod report;
pub mod search;
pub mod signal;

pub use config::EvalConfig;
pub use decompose::{decompose, decompose_against, decompose_with_config};
pub use metrics::{EvaluationResult, MetricTriple, SourceScore};
pub use permutation::{factorial, Permutations};
pub use report::{EvalReport, ReportFormat};
pub use search::{evaluate, score_matrix, search_best_assignment, AssignmentSearch};

use thiserror::Error;

/// Errors that can occur during separation evaluation
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BssEvalError {
    /// Signal lengths disagree
    #[error("Signal length mismatch: expected {expected} samples, got {got}")]
    ShapeMismatch { expected: usize, got: usize },

    /// Reference and estimate sets have different sizes
    #[error("Source count mismatch: {references} references, {estimates} estimates")]
    CountMismatch { references: usize, estimates: usize },

    /// Reference components are linearly dependent
    #[error("Singular Gram matrix (reciprocal condition {condition:.3e})")]
    SingularGramMatrix { condition: f64 },

    /// Signal too short to carry time-varying structure
    #[error("Signal too short: {len} samples (need at least 2)")]
    SignalTooShort { len: usize },

    /// Empty reference set
    #[error("No sources to evaluate")]
    NoSources,

    /// Permutation search would be too large
    #[error("Too many sources for permutation search: {count} (max {max})")]
    TooManySources { count: usize, max: usize },

    /// Target index outside the reference stack
    #[error("Target index {index} out of range for {count} reference components")]
    TargetOutOfRange { index: usize, count: usize },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

pub type Result<T> = std::result::Result<T, BssEvalError>;

/// Evaluate estimates against references with default settings.
///
/// The mixture is taken to be the sample-wise sum of `references`.
pub fn quick_evaluate(references: &[Vec<f64>], estimates: &[Vec<f64>]) -> Result<EvaluationResult> {
    evaluate(references, estimates, &EvalConfig::default())
}
