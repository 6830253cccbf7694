//! Word importance ranking (WIR).
//!
//! [`ImportanceRanker`] scores each word by how much the oracle's confidence
//! in the current label drops when that word is removed. The ranking is
//! computed once per attack run with exactly one probe query per word, in a
//! single batch.

use serde::{Deserialize, Serialize};
use tracing::debug;
use wordbug_core::{Oracle, Prediction, ProbeStrategy, Result, Text};

use crate::query_batch;

/// A word position and its importance score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RankedPosition {
    /// Word position in the original text.
    pub position: usize,
    /// Confidence drop in the original label when the word is removed.
    pub importance: f64,
}

/// Ranks word positions by their influence on the oracle's decision.
#[derive(Debug, Clone, Default)]
pub struct ImportanceRanker {
    probe: ProbeStrategy,
}

impl ImportanceRanker {
    /// Create a ranker that removes words with `probe`.
    #[must_use]
    pub fn new(probe: ProbeStrategy) -> Self {
        Self { probe }
    }

    /// The configured probing strategy.
    #[must_use]
    pub fn probe(&self) -> &ProbeStrategy {
        &self.probe
    }

    /// Build the probe text for `position`.
    #[must_use]
    pub fn probe_text(&self, text: &Text, position: usize) -> Option<Text> {
        match &self.probe {
            ProbeStrategy::Placeholder { token } => text.replace_word(position, token),
            ProbeStrategy::Delete => text.delete_word(position),
        }
    }

    /// Rank every word of `text` by importance for the label of `original`,
    /// the oracle's prediction for the unmodified text.
    ///
    /// Positions are ordered by descending importance, ties
    /// by ascending position. Texts without words rank to an empty list
    /// without querying the oracle.
    ///
    /// # Errors
    ///
    /// Propagates oracle failures and malformed oracle output.
    pub async fn rank(
        &self,
        oracle: &dyn Oracle,
        text: &Text,
        original: &Prediction,
    ) -> Result<Vec<RankedPosition>> {
        if text.is_empty() {
            return Ok(Vec::new());
        }

        let probes: Vec<String> = (0..text.num_words())
            .filter_map(|i| self.probe_text(text, i))
            .map(String::from)
            .collect();
        let predictions = query_batch(oracle, &probes, Some(original.num_labels())).await?;
        let label = original.label();
        let base_confidence = original.confidence(label);

        let mut ranking: Vec<RankedPosition> = predictions
            .iter()
            .enumerate()
            .map(|(position, prediction)| RankedPosition {
                position,
                importance: base_confidence - prediction.confidence(label),
            })
            .collect();
        sort_ranking(&mut ranking);

        debug!(
            words = ranking.len(),
            top_position = ranking.first().map(|r| r.position),
            top_importance = ranking.first().map(|r| r.importance),
            "Ranked word importance"
        );
        Ok(ranking)
    }
}

/// Sort by descending importance, then ascending position.
pub fn sort_ranking(ranking: &mut [RankedPosition]) {
    ranking.sort_by(|a, b| {
        b.importance
            .total_cmp(&a.importance)
            .then(a.position.cmp(&b.position))
    });
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
