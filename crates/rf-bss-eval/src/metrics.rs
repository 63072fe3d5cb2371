//! Separation metrics

use serde::{Deserialize, Serialize};

/// SDR / SIR / SAR for one estimate against one reference, in dB.
///
/// Values may be +inf (perfect on that axis) or NaN (silent target).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricTriple {
    /// Signal-to-distortion ratio
    #[serde(with = "db_value")]
    pub sdr: f64,

    /// Signal-to-interference ratio
    #[serde(with = "db_value")]
    pub sir: f64,

    /// Signal-to-artifact ratio
    #[serde(with = "db_value")]
    pub sar: f64,
}

impl MetricTriple {
    pub fn new(sdr: f64, sir: f64, sar: f64) -> Self {
        Self { sdr, sir, sar }
    }

    /// Estimate reconstructs the scaled target exactly
    pub fn is_perfect(&self) -> bool {
        self.sdr == f64::INFINITY
    }

    /// No NaN in any of the three ratios
    pub fn is_defined(&self) -> bool {
        !(self.sdr.is_nan() || self.sir.is_nan() || self.sar.is_nan())
    }
}

/// Metrics for one reference source at the chosen assignment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceScore {
    /// `s1`, `s2`, ... by reference position
    pub label: String,

    /// Position in the reference set
    pub reference_index: usize,

    /// Estimate matched to this reference
    pub estimate_index: usize,

    pub metrics: MetricTriple,
}

/// Outcome of an assignment search
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationResult {
    /// One entry per reference, ordered by reference index
    pub sources: Vec<SourceScore>,

    /// `permutation[k]` is the reference matched to estimate `k`
    pub permutation: Vec<usize>,

    /// Score of the winning permutation
    #[serde(with = "db_value")]
    pub mean_sdr: f64,

    /// Number of permutations scored
    pub permutations_evaluated: usize,
}

impl EvaluationResult {
    /// Label for a reference position
    pub fn label_for(reference_index: usize) -> String {
        format!("s{}", reference_index + 1)
    }

    /// Look up a source by label
    pub fn get(&self, label: &str) -> Option<&MetricTriple> {
        self.sources
            .iter()
            .find(|s| s.label == label)
            .map(|s| &s.metrics)
    }

    /// Triples in reference order
    pub fn triples(&self) -> Vec<MetricTriple> {
        self.sources.iter().map(|s| s.metrics).collect()
    }

    pub fn mean_sir(&self) -> f64 {
        mean_of(self.sources.iter().map(|s| s.metrics.sir))
    }

    pub fn mean_sar(&self) -> f64 {
        mean_of(self.sources.iter().map(|s| s.metrics.sar))
    }

    /// Whether the search kept the estimates in reference order
    pub fn is_identity(&self) -> bool {
        self.permutation.iter().enumerate().all(|(k, &j)| k == j)
    }

    /// Get human-readable summary
    pub fn summary(&self) -> String {
        let parts: Vec<String> = self
            .sources
            .iter()
            .map(|s| {
                format!(
                    "{} <- est{}: SDR {:.2} dB, SIR {:.2} dB, SAR {:.2} dB",
                    s.label, s.estimate_index, s.metrics.sdr, s.metrics.sir, s.metrics.sar
                )
            })
            .collect();
        format!("Mean SDR {:.2} dB | {}", self.mean_sdr, parts.join(" | "))
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

pub(crate) fn mean_of(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, count) = values.fold((0.0, 0usize), |(s, c), v| (s + v, c + 1));
    if count == 0 {
        f64::NAN
    } else {
        sum / count as f64
    }
}

/// dB values with non-finite values kept as strings (JSON has no inf/NaN)
pub(crate) mod db_value {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
        if value.is_nan() {
            serializer.serialize_str("nan")
        } else if *value == f64::INFINITY {
            serializer.serialize_str("inf")
        } else if *value == f64::NEG_INFINITY {
            serializer.serialize_str("-inf")
        } else {
            serializer.serialize_f64(*value)
        }
    }

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Repr {
        Number(f64),
        Text(String),
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
        match Repr::deserialize(deserializer)? {
            Repr::Number(v) => Ok(v),
            Repr::Text(s) => match s.as_str() {
                "nan" | "NaN" => Ok(f64::NAN),
                "inf" | "Infinity" => Ok(f64::INFINITY),
                "-inf" | "-Infinity" => Ok(f64::NEG_INFINITY),
                other => Err(serde::de::Error::custom(format!(
                    "invalid dB value: {other}"
                ))),
            },
        }
    }
}
