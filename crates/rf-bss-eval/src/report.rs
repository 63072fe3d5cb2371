//! Report generation for batches of separation evaluations

use crate::metrics::{EvaluationResult, MetricTriple};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::Write;
use std::path::Path;

/// Report format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportFormat {
    /// Plain text report
    Text,
    /// JSON report
    Json,
    /// Markdown report
    Markdown,
}

/// One evaluated item (track, utterance, ...)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportEntry {
    pub name: String,
    pub result: EvaluationResult,
}

/// Summary statistics of one metric over a batch
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricStats {
    /// Mean over finite values
    #[serde(with = "crate::metrics::db_value")]
    pub mean: f64,

    /// Median over finite values
    #[serde(with = "crate::metrics::db_value")]
    pub median: f64,

    /// Number of finite values
    pub finite: usize,

    /// Number of +inf values (perfect on this axis)
    pub infinite: usize,

    /// Number of NaN or -inf values
    pub undefined: usize,
}

impl MetricStats {
    fn from_values(values: &[f64]) -> Self {
        let mut finite: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
        finite.sort_by(f64::total_cmp);

        let infinite = values.iter().filter(|&&v| v == f64::INFINITY).count();
        let undefined = values.len() - finite.len() - infinite;

        let (mean, median) = if finite.is_empty() {
            (f64::NAN, f64::NAN)
        } else {
            let mean = finite.iter().sum::<f64>() / finite.len() as f64;
            let mid = finite.len() / 2;
            let median = if finite.len() % 2 == 0 {
                (finite[mid - 1] + finite[mid]) / 2.0
            } else {
                finite[mid]
            };
            (mean, median)
        };

        Self {
            mean,
            median,
            finite: finite.len(),
            infinite,
            undefined,
        }
    }
}

/// Per-source aggregate over every entry of a report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceAggregate {
    pub label: String,
    pub sdr: MetricStats,
    pub sir: MetricStats,
    pub sar: MetricStats,
}

/// Report generator
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvalReport {
    /// Report title
    pub title: String,

    /// Creation time (RFC 3339, UTC)
    pub timestamp: String,

    /// Evaluated items in insertion order
    pub entries: Vec<ReportEntry>,
}

impl EvalReport {
    /// Create a new report
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            timestamp: chrono::Utc::now().to_rfc3339(),
            entries: Vec::new(),
        }
    }

    /// Add an evaluated item
    pub fn add(&mut self, name: impl Into<String>, result: EvaluationResult) {
        self.entries.push(ReportEntry {
            name: name.into(),
            result,
        });
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Statistics per source label, in label order (`s1`, `s2`, ... `s10`)
    pub fn aggregate(&self) -> Vec<SourceAggregate> {
        let mut by_index: BTreeMap<usize, (String, Vec<MetricTriple>)> = BTreeMap::new();
        for entry in &self.entries {
            for source in &entry.result.sources {
                by_index
                    .entry(source.reference_index)
                    .or_insert_with(|| (source.label.clone(), Vec::new()))
                    .1
                    .push(source.metrics);
            }
        }

        by_index
            .into_values()
            .map(|(label, triples)| {
                let sdr: Vec<f64> = triples.iter().map(|m| m.sdr).collect();
                let sir: Vec<f64> = triples.iter().map(|m| m.sir).collect();
                let sar: Vec<f64> = triples.iter().map(|m| m.sar).collect();
                SourceAggregate {
                    label,
                    sdr: MetricStats::from_values(&sdr),
                    sir: MetricStats::from_values(&sir),
                    sar: MetricStats::from_values(&sar),
                }
            })
            .collect()
    }

    /// Generate report in specified format
    pub fn generate(&self, format: ReportFormat) -> String {
        match format {
            ReportFormat::Text => self.to_text(),
            ReportFormat::Json => self.to_json(),
            ReportFormat::Markdown => self.to_markdown(),
        }
    }

    /// Save report to file
    pub fn save<P: AsRef<Path>>(&self, path: P, format: ReportFormat) -> std::io::Result<()> {
        let content = self.generate(format);
        let mut file = std::fs::File::create(path)?;
        file.write_all(content.as_bytes())
    }

    fn to_text(&self) -> String {
        let mut output = String::new();

        output.push_str(&format!("{}\n", self.title));
        output.push_str(&format!("{}\n\n", "=".repeat(self.title.len())));
        output.push_str(&format!("Timestamp: {}\n", self.timestamp));
        output.push_str(&format!("Items: {}\n\n", self.entries.len()));

        output.push_str("Results:\n");
        output.push_str(&"-".repeat(80));
        output.push('\n');
        for entry in &self.entries {
            output.push_str(&format!("[{}] {}\n", entry.name, entry.result.summary()));
        }
        output.push_str(&"-".repeat(80));
        output.push('\n');

        output.push_str("Aggregate (median over finite values):\n");
        for agg in self.aggregate() {
            output.push_str(&format!(
                "  {}: SDR {:.2} dB, SIR {:.2} dB, SAR {:.2} dB\n",
                agg.label, agg.sdr.median, agg.sir.median, agg.sar.median
            ));
        }

        output
    }

    fn to_json(&self) -> String {
        #[derive(Serialize)]
        struct JsonReport<'a> {
            #[serde(flatten)]
            report: &'a EvalReport,
            aggregate: Vec<SourceAggregate>,
        }

        let json = JsonReport {
            report: self,
            aggregate: self.aggregate(),
        };
        serde_json::to_string_pretty(&json).unwrap_or_else(|err| {
            log::error!("Failed to serialize report: {err}");
            "{}".into()
        })
    }

    fn to_markdown(&self) -> String {
        let mut output = String::new();

        output.push_str(&format!("# {}\n\n", self.title));
        output.push_str(&format!("**Timestamp:** {}\n\n", self.timestamp));

        output.push_str("## Summary\n\n");
        output.push_str("| Source | SDR median | SIR median | SAR median | Perfect | Undefined |\n");
        output.push_str("|--------|------------|------------|------------|---------|-----------|\n");
        for agg in self.aggregate() {
            output.push_str(&format!(
                "| {} | {:.2} | {:.2} | {:.2} | {} | {} |\n",
                agg.label,
                agg.sdr.median,
                agg.sir.median,
                agg.sar.median,
                agg.sdr.infinite,
                agg.sdr.undefined
            ));
        }
        output.push('\n');

        output.push_str("## Results\n\n");
        for entry in &self.entries {
            output.push_str(&format!(
                "### `{}` (mean SDR {:.2} dB)\n\n",
                entry.name, entry.result.mean_sdr
            ));
            output.push_str("| Source | Estimate | SDR | SIR | SAR |\n");
            output.push_str("|--------|----------|-----|-----|-----|\n");
            for source in &entry.result.sources {
                output.push_str(&format!(
                    "| {} | {} | {:.2} | {:.2} | {:.2} |\n",
                    source.label,
                    source.estimate_index,
                    source.metrics.sdr,
                    source.metrics.sir,
                    source.metrics.sar
                ));
            }
            output.push('\n');
        }

        output
    }
}
