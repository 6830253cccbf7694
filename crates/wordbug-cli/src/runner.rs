//! Concurrent attack runner over a dataset.
//!
//! Each sample is one independent attack run. Runs execute on a
//! [`JoinSet`], at most `runner.max_concurrent_attacks` at a time, and share
//! the oracle and the searcher. A sample whose ground truth the oracle
//! already gets wrong is skipped rather than attacked.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{error, info, warn};
use wordbug_attack::GreedySearcher;
use wordbug_core::{
    AttackResult, AttackStatus, Oracle, OracleConfig, Prediction, Text, WordbugConfig,
    WordbugError,
};

use crate::dataset::AttackSample;
use crate::shutdown::ShutdownCoordinator;

/// What happened to one sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum SampleOutcome {
    /// The attack ran to completion (success or failure).
    Attacked(AttackResult),
    /// The oracle was already wrong on the original text.
    Skipped {
        /// Oracle output for the original text.
        prediction: Prediction,
    },
    /// Cancellation stopped the run.
    Cancelled,
    /// The oracle failed.
    Error {
        /// Error message.
        message: String,
    },
}

/// Result for a single dataset sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SampleRecord {
    /// Position of the sample in the dataset.
    pub index: usize,
    /// Sample ID.
    pub sample_id: String,
    /// Resolved ground-truth label, if any.
    pub ground_truth: Option<usize>,
    /// Number of words in the original text.
    pub num_words: usize,
    /// What happened.
    #[serde(flatten)]
    pub outcome: SampleOutcome,
    /// Wall-clock time for the sample in milliseconds.
    pub duration_ms: u64,
}

impl SampleRecord {
    /// The attack result, if the sample was attacked.
    #[must_use]
    pub fn attack_result(&self) -> Option<&AttackResult> {
        match &self.outcome {
            SampleOutcome::Attacked(result) => Some(result),
            _ => None,
        }
    }
}

/// Runs DeepWordBug over many samples concurrently.
pub struct AttackRunner {
    searcher: Arc<GreedySearcher>,
    oracle: Arc<dyn Oracle>,
    oracle_config: Arc<OracleConfig>,
    max_concurrent: usize,
    shutdown: ShutdownCoordinator,
}

impl AttackRunner {
    /// Create a runner for `searcher` against `oracle`.
    #[must_use]
    pub fn new(
        searcher: GreedySearcher,
        oracle: Arc<dyn Oracle>,
        config: &WordbugConfig,
        shutdown: ShutdownCoordinator,
    ) -> Self {
        Self {
            searcher: Arc::new(searcher),
            oracle,
            oracle_config: Arc::new(config.oracle.clone()),
            max_concurrent: config.runner.max_concurrent_attacks.max(1),
            shutdown,
        }
    }

    /// Attack every sample, returning records in dataset order.
    pub async fn run(&self, samples: Vec<AttackSample>) -> Vec<SampleRecord> {
        let total = samples.len();
        info!(
            samples = total,
            max_concurrent = self.max_concurrent,
            oracle = self.oracle.name(),
            "Starting attack run"
        );

        let semaphore = Arc::new(Semaphore::new(self.max_concurrent));
        let mut tasks = JoinSet::new();

        for (index, sample) in samples.into_iter().enumerate() {
            let semaphore = Arc::clone(&semaphore);
            let searcher = Arc::clone(&self.searcher);
            let oracle = Arc::clone(&self.oracle);
            let oracle_config = Arc::clone(&self.oracle_config);
            let shutdown = self.shutdown.clone();

            tasks.spawn(async move {
                let _permit = semaphore.acquire_owned().await;
                let _guard = shutdown.track_task();
                attack_sample(
                    index,
                    sample,
                    &searcher,
                    oracle.as_ref(),
                    &oracle_config,
                    &shutdown,
                )
                .await
            });
        }

        let mut records = Vec::with_capacity(total);
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(record) => {
                    info!(
                        done = records.len() + 1,
                        total,
                        sample_id = %record.sample_id,
                        outcome = outcome_label(&record.outcome),
                        "Sample finished"
                    );
                    records.push(record);
                }
                Err(e) => error!(error = %e, "Attack task failed to complete"),
            }
        }
        records.sort_by_key(|r| r.index);
        records
    }
}

async fn attack_sample(
    index: usize,
    sample: AttackSample,
    searcher: &GreedySearcher,
    oracle: &dyn Oracle,
    oracle_config: &OracleConfig,
    shutdown: &ShutdownCoordinator,
) -> SampleRecord {
    let started = std::time::Instant::now();
    let text = Text::new(sample.text);
    let ground_truth = sample.label.as_ref().and_then(|label| {
        let resolved = label.resolve(oracle_config);
        if resolved.is_none() {
            warn!(sample_id = %sample.id, ?label, "Unknown ground-truth label; attacking anyway");
        }
        resolved
    });

    let outcome = if shutdown.is_shutting_down() {
        SampleOutcome::Cancelled
    } else {
        match oracle
            .predict(text.as_str())
            .await
            .and_then(|prediction| prediction.validate().map(|()| prediction))
        {
            Err(e) => SampleOutcome::Error {
                message: e.to_string(),
            },
            Ok(prediction) if ground_truth.is_some_and(|gt| gt != prediction.label()) => {
                warn!(
                    sample_id = %sample.id,
                    ground_truth = ?ground_truth,
                    predicted = prediction.label(),
                    "Oracle already misclassifies sample; skipping"
                );
                SampleOutcome::Skipped { prediction }
            }
            Ok(prediction) => match searcher
                .attack_from_prediction(oracle, &text, prediction, &shutdown.token())
                .await
            {
                Ok(mut result) => {
                    result.queries += 1;
                    SampleOutcome::Attacked(result)
                }
                Err(WordbugError::Cancelled) => SampleOutcome::Cancelled,
                Err(e) => SampleOutcome::Error {
                    message: e.to_string(),
                },
            },
        }
    };

    SampleRecord {
        index,
        sample_id: sample.id,
        ground_truth,
        num_words: text.num_words(),
        outcome,
        duration_ms: started.elapsed().as_millis() as u64,
    }
}

/// Short name for an outcome, used in logs and tables.
#[must_use]
pub fn outcome_label(outcome: &SampleOutcome) -> &'static str {
    match outcome {
        SampleOutcome::Attacked(result) => match result.status {
            AttackStatus::Success => "success",
            AttackStatus::Failure => "failure",
        },
        SampleOutcome::Skipped { .. } => "skipped",
        SampleOutcome::Cancelled => "cancelled",
        SampleOutcome::Error { .. } => "error",
    }
}
