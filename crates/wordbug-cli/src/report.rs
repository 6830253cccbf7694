//! JSON reports and human-readable rendering of attack results.

use serde::Serialize;
use std::fmt::Write as _;
use std::path::Path;
use wordbug_attack::QueryStats;
use wordbug_core::{AttackResult, OracleConfig, RecipeConfig, Result};

use crate::metrics::AttackSummary;
use crate::runner::SampleRecord;

/// Everything written to the `--output` file.
#[derive(Debug, Clone, Serialize)]
pub struct AttackReport {
    /// RFC 3339 timestamp of the run.
    pub timestamp: String,
    /// Oracle implementation name.
    pub oracle: String,
    /// Recipe the searcher was built from.
    pub recipe: RecipeConfig,
    /// Aggregate metrics.
    pub summary: AttackSummary,
    /// Oracle usage over the whole run.
    pub query_stats: QueryStats,
    /// Per-sample records, in dataset order.
    pub samples: Vec<SampleRecord>,
}

impl AttackReport {
    /// Assemble a report stamped with the current time.
    #[must_use]
    pub fn new(
        oracle: &str,
        recipe: &RecipeConfig,
        query_stats: QueryStats,
        samples: Vec<SampleRecord>,
    ) -> Self {
        Self {
            timestamp: chrono::Utc::now().to_rfc3339(),
            oracle: oracle.to_string(),
            recipe: recipe.clone(),
            summary: AttackSummary::from_records(&samples),
            query_stats,
            samples,
        }
    }

    /// Write the report as pretty-printed JSON, creating parent directories.
    ///
    /// # Errors
    ///
    /// Returns an I/O or serialization error.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}

/// Render one attack result for the terminal.
#[must_use]
pub fn format_attack_result(result: &AttackResult, labels: &OracleConfig) -> String {
    let original_label = result.original_label();
    let final_label = result.final_label();

    let mut out = String::new();
    let _ = writeln!(
        out,
        "{} ({:.0}%) --> {} ({:.0}%)  [{:?}, {} queries]",
        labels.label_name(original_label),
        result.original_prediction.confidence(original_label) * 100.0,
        labels.label_name(final_label),
        result.final_prediction.confidence(final_label) * 100.0,
        result.status,
        result.queries,
    );
    let _ = writeln!(out);
    let _ = writeln!(out, "{}", result.original_text);
    let _ = writeln!(out);
    let _ = writeln!(out, "{}", result.perturbed_text);
    if !result.trail.is_empty() {
        let _ = writeln!(out);
        for p in &result.trail {
            let _ = writeln!(
                out,
                "  word {:>3}: {} -> {} ({})",
                p.position, p.original_word, p.replacement, p.operator
            );
        }
    }
    out
}

/// Render query statistics on one line.
#[must_use]
pub fn format_query_stats(stats: &QueryStats) -> String {
    format!(
        "Oracle: {} queries in {} calls ({} errors); latency p50={:?} p95={:?} p99={:?}",
        stats.queries, stats.calls, stats.errors, stats.p50, stats.p95, stats.p99
    )
}
