//! Greedy word-swap search guided by word importance ranking.
//!
//! [`GreedySearcher`] walks the ranked word positions once, in order. At each
//! position it generates character-level candidates for the current text,
//! drops those outside the edit-distance budget (measured against the
//! original), scores the survivors in one oracle batch, and then:
//!
//! 1. commits the strongest label-flipping candidate and stops, or
//! 2. commits the candidate that lowers the original label's confidence
//!    the most, if it beats the current text, and moves on, or
//! 3. keeps the current text and moves on.
//!
//! Running out of positions yields a [`AttackStatus::Failure`] carrying the
//! best text found. Oracle errors abort the run.

use tokio_util::sync::CancellationToken;
use tracing::{debug, info};
use wordbug_core::{
    AttackResult, AttackStatus, Oracle, Prediction, Result, Text, WordbugError,
};

use crate::constraint::ConstraintFilter;
use crate::query_batch;
use crate::ranking::ImportanceRanker;
use crate::transformation::{Candidate, TransformationEngine};

/// Greedy adversarial search over ranked word positions.
#[derive(Debug)]
pub struct GreedySearcher {
    engine: TransformationEngine,
    filter: ConstraintFilter,
    ranker: ImportanceRanker,
    max_depth: Option<usize>,
}

impl GreedySearcher {
    /// Assemble a searcher from its components.
    #[must_use]
    pub fn new(
        engine: TransformationEngine,
        filter: ConstraintFilter,
        ranker: ImportanceRanker,
    ) -> Self {
        Self {
            engine,
            filter,
            ranker,
            max_depth: None,
        }
    }

    /// Cap the number of committed perturbations.
    #[must_use]
    pub fn with_max_depth(mut self, max_depth: Option<usize>) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// The transformation engine.
    #[must_use]
    pub fn engine(&self) -> &TransformationEngine {
        &self.engine
    }

    /// The constraint filter.
    #[must_use]
    pub fn filter(&self) -> &ConstraintFilter {
        &self.filter
    }

    /// Attack `text`, querying the oracle for its original prediction first.
    ///
    /// # Errors
    ///
    /// Returns [`WordbugError::Oracle`] if any oracle call fails or returns
    /// malformed output.
    pub async fn attack(&self, oracle: &dyn Oracle, text: &Text) -> Result<AttackResult> {
        self.attack_with_cancellation(oracle, text, &CancellationToken::new())
            .await
    }

    /// Attack `text`, stopping at the next word boundary once `cancel` fires.
    ///
    /// # Errors
    ///
    /// Returns [`WordbugError::Oracle`] on oracle failure and
    /// [`WordbugError::Cancelled`] if cancellation was observed.
    pub async fn attack_with_cancellation(
        &self,
        oracle: &dyn Oracle,
        text: &Text,
        cancel: &CancellationToken,
    ) -> Result<AttackResult> {
        let original = query_batch(oracle, &[text.as_str().to_string()], None)
            .await?
            .pop()
            .ok_or_else(|| WordbugError::Oracle("oracle returned no prediction".to_string()))?;
        let mut result = self
            .attack_from_prediction(oracle, text, original, cancel)
            .await?;
        result.queries += 1;
        Ok(result)
    }

    /// Attack `text` given the oracle's already-known prediction for it.
    ///
    /// The returned query count excludes the query that produced
    /// `original_prediction`.
    ///
    /// # Errors
    ///
    /// Returns [`WordbugError::Oracle`] on oracle failure and
    /// [`WordbugError::Cancelled`] if cancellation was observed.
    pub async fn attack_from_prediction(
        &self,
        oracle: &dyn Oracle,
        text: &Text,
        original_prediction: Prediction,
        cancel: &CancellationToken,
    ) -> Result<AttackResult> {
        original_prediction.validate()?;
        let label = original_prediction.label();
        let base_confidence = original_prediction.confidence(label);

        info!(
            oracle = oracle.name(),
            words = text.num_words(),
            label,
            confidence = base_confidence,
            "Starting greedy word swap attack"
        );

        let ranking = self
            .ranker
            .rank(oracle, text, &original_prediction)
            .await?;
        let mut queries = ranking.len();

        let mut current = text.clone();
        let mut current_prediction = original_prediction.clone();
        let mut trail = Vec::new();

        for ranked in &ranking {
            if cancel.is_cancelled() {
                info!(committed = trail.len(), "Attack cancelled between word positions");
                return Err(WordbugError::Cancelled);
            }
            if self.max_depth.is_some_and(|max| trail.len() >= max) {
                debug!(max_depth = ?self.max_depth, "Depth limit reached");
                break;
            }

            let pool = self.engine.generate(&current, ranked.position);
            let generated = pool.len();
            let survivors = self.filter.retain_permitted(text, pool);
            if survivors.is_empty() {
                debug!(
                    position = ranked.position,
                    generated, "No admissible candidates at position"
                );
                continue;
            }

            let texts: Vec<String> = survivors
                .iter()
                .map(|c| c.text.as_str().to_string())
                .collect();
            let predictions =
                query_batch(oracle, &texts, Some(original_prediction.num_labels())).await?;
            queries += predictions.len();

            let mut scored: Vec<(Candidate, Prediction)> =
                survivors.into_iter().zip(predictions).collect();

            if let Some(idx) = lowest_confidence(&scored, label, |p| p.label() != label) {
                let (candidate, prediction) = scored.swap_remove(idx);
                debug!(
                    position = candidate.perturbation.position,
                    replacement = %candidate.perturbation.replacement,
                    operator = %candidate.perturbation.operator,
                    new_label = prediction.label(),
                    "Committed label-flipping perturbation"
                );
                trail.push(candidate.perturbation);
                info!(perturbations = trail.len(), queries, "Attack succeeded");
                return Ok(AttackResult {
                    status: AttackStatus::Success,
                    original_text: text.clone(),
                    perturbed_text: candidate.text,
                    trail,
                    original_prediction,
                    final_prediction: prediction,
                    queries,
                });
            }

            if let Some(idx) = lowest_confidence(&scored, label, |_| true) {
                let best = scored[idx].1.confidence(label);
                if best < current_prediction.confidence(label) {
                    let (candidate, prediction) = scored.swap_remove(idx);
                    debug!(
                        position = candidate.perturbation.position,
                        replacement = %candidate.perturbation.replacement,
                        operator = %candidate.perturbation.operator,
                        confidence = best,
                        "Committed perturbation"
                    );
                    trail.push(candidate.perturbation);
                    current = candidate.text;
                    current_prediction = prediction;
                }
            }
        }

        info!(perturbations = trail.len(), queries, "Attack exhausted word positions");
        Ok(AttackResult {
            status: AttackStatus::Failure,
            original_text: text.clone(),
            perturbed_text: current,
            trail,
            original_prediction,
            final_prediction: current_prediction,
            queries,
        })
    }
}

/// Index of the entry with the lowest confidence in `label` among those
/// matching `keep`. The earliest entry wins ties.
fn lowest_confidence(
    scored: &[(Candidate, Prediction)],
    label: usize,
    keep: impl Fn(&Prediction) -> bool,
) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (idx, (_, prediction)) in scored.iter().enumerate() {
        if !keep(prediction) {
            continue;
        }
        let confidence = prediction.confidence(label);
        if best.map_or(true, |(_, b)| confidence < b) {
            best = Some((idx, confidence));
        }
    }
    best.map(|(idx, _)| idx)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
