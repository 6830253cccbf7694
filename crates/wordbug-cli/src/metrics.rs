//! Aggregate attack metrics.
//!
//! | Metric | Definition |
//! |--------|------------|
//! | Original accuracy | (successful + failed) / (successful + failed + skipped) |
//! | Accuracy under attack | failed / (successful + failed + skipped) |
//! | Attack success rate | successful / (successful + failed) |
//! | Perturbed words | mean fraction of words changed, successful attacks only |
//! | Words per input | mean word count over attacked and skipped samples |
//! | Queries | mean oracle queries over attacked samples |
//!
//! Cancelled and errored samples are counted but excluded from every rate.

use serde::{Deserialize, Serialize};

use crate::runner::{SampleOutcome, SampleRecord};

/// Summary statistics for one attack run over a dataset.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AttackSummary {
    /// Attacks that flipped the prediction.
    pub successful: usize,
    /// Attacks that ran out of words.
    pub failed: usize,
    /// Samples the oracle already misclassified.
    pub skipped: usize,
    /// Runs stopped by cancellation.
    pub cancelled: usize,
    /// Runs aborted by an oracle error.
    pub errored: usize,
    /// Oracle accuracy before the attack.
    pub original_accuracy: f64,
    /// Oracle accuracy after the attack.
    pub accuracy_under_attack: f64,
    /// Fraction of attacked samples whose prediction flipped.
    pub attack_success_rate: f64,
    /// Mean fraction of words perturbed by successful attacks.
    pub avg_perturbed_word_ratio: f64,
    /// Mean number of words per input.
    pub avg_num_words: f64,
    /// Mean number of oracle queries per attacked sample.
    pub avg_queries: f64,
}

impl AttackSummary {
    /// Compute the summary from per-sample records.
    #[must_use]
    pub fn from_records(records: &[SampleRecord]) -> Self {
        let mut summary = Self::default();
        let mut perturbed_ratio_sum = 0.0;
        let mut words_sum = 0usize;
        let mut queries_sum = 0usize;

        for record in records {
            match &record.outcome {
                SampleOutcome::Attacked(result) => {
                    if result.is_success() {
                        summary.successful += 1;
                        perturbed_ratio_sum += result.perturbed_word_ratio();
                    } else {
                        summary.failed += 1;
                    }
                    queries_sum += result.queries;
                    words_sum += record.num_words;
                }
                SampleOutcome::Skipped { .. } => {
                    summary.skipped += 1;
                    words_sum += record.num_words;
                }
                SampleOutcome::Cancelled => summary.cancelled += 1,
                SampleOutcome::Error { .. } => summary.errored += 1,
            }
        }

        let attacked = summary.successful + summary.failed;
        let counted = attacked + summary.skipped;
        summary.original_accuracy = ratio(attacked as f64, counted);
        summary.accuracy_under_attack = ratio(summary.failed as f64, counted);
        summary.attack_success_rate = ratio(summary.successful as f64, attacked);
        summary.avg_perturbed_word_ratio = ratio(perturbed_ratio_sum, summary.successful);
        summary.avg_num_words = ratio(words_sum as f64, counted);
        summary.avg_queries = ratio(queries_sum as f64, attacked);
        summary
    }

    /// Total samples seen.
    #[must_use]
    pub fn total(&self) -> usize {
        self.successful + self.failed + self.skipped + self.cancelled + self.errored
    }

    /// Format the summary as a two-column table.
    #[must_use]
    pub fn to_table(&self) -> String {
        let rows = [
            ("Number of successful attacks", self.successful.to_string()),
            ("Number of failed attacks", self.failed.to_string()),
            ("Number of skipped attacks", self.skipped.to_string()),
            ("Number of cancelled attacks", self.cancelled.to_string()),
            ("Number of errored attacks", self.errored.to_string()),
            ("Original accuracy", pct(self.original_accuracy)),
            ("Accuracy under attack", pct(self.accuracy_under_attack)),
            ("Attack success rate", pct(self.attack_success_rate)),
            ("Average perturbed word %", pct(self.avg_perturbed_word_ratio)),
            ("Average num. words per input", format!("{:.2}", self.avg_num_words)),
            ("Avg num queries", format!("{:.2}", self.avg_queries)),
        ];

        let mut out = String::new();
        out.push_str(&format!("| {:<30} | {:>10} |\n", "Attack Results", ""));
        out.push_str(&format!("|{:-<32}|{:->12}|\n", "", ""));
        for (name, value) in rows {
            out.push_str(&format!("| {name:<30} | {value:>10} |\n"));
        }
        out
    }
}

fn ratio(numerator: f64, denominator: usize) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator / denominator as f64
    }
}

fn pct(fraction: f64) -> String {
    format!("{:.2}%", fraction * 100.0)
}
