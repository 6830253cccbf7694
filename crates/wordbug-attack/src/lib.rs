//! Black-box adversarial attacks on text classifiers.
//!
//! This crate implements the DeepWordBug attack: a greedy, word-importance
//! ranked search over character-level word mutations under a hard
//! Levenshtein edit-distance budget.
//!
//! # Components
//!
//! - [`ImportanceRanker`]: orders word positions by how much removing each
//!   word lowers the oracle's confidence in its current label.
//! - [`TransformationEngine`]: unions swap, substitution, deletion and
//!   insertion candidates for one word.
//! - [`ConstraintFilter`]: drops candidates too far from the original text.
//! - [`GreedySearcher`]: drives the search and commits replacements.
//! - [`DeepWordBug`]: builds a searcher from a [`RecipeConfig`].
//!
//! Oracles implement [`wordbug_core::Oracle`]. [`LexiconOracle`] is a small
//! deterministic classifier for offline runs, and [`OracleStats`] wraps any
//! oracle to count queries and track latency.
//!
//! # Example
//!
//! ```
//! use wordbug_attack::{DeepWordBug, LexiconOracle};
//! use wordbug_core::{RecipeConfig, Text};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let searcher = DeepWordBug::build(&RecipeConfig::default()).unwrap();
//! let oracle = LexiconOracle::sentiment();
//! let result = searcher
//!     .attack(&oracle, &Text::new("The movie was bad"))
//!     .await
//!     .unwrap();
//! assert!(result.trail.len() <= 4);
//! # }
//! ```
//!
//! [`RecipeConfig`]: wordbug_core::RecipeConfig

pub mod constraint;
pub mod lexicon;
pub mod oracle_stats;
pub mod ranking;
pub mod recipe;
pub mod search;
pub mod transformation;

pub use constraint::{levenshtein, Constraint, ConstraintFilter, LevenshteinEditDistance};
pub use lexicon::LexiconOracle;
pub use oracle_stats::{OracleStats, QueryStats};
pub use ranking::{ImportanceRanker, RankedPosition};
pub use recipe::DeepWordBug;
pub use search::GreedySearcher;
pub use transformation::{Candidate, TransformationEngine};

use wordbug_core::{Oracle, Prediction, Result, WordbugError};

/// Score `texts` in one batch and check the oracle's output shape.
///
/// When `num_labels` is given, every prediction must score exactly that many
/// labels. Empty batches return immediately without calling the oracle.
pub(crate) async fn query_batch(
    oracle: &dyn Oracle,
    texts: &[String],
    num_labels: Option<usize>,
) -> Result<Vec<Prediction>> {
    if texts.is_empty() {
        return Ok(Vec::new());
    }
    let predictions = oracle.predict_batch(texts).await?;
    if predictions.len() != texts.len() {
        return Err(WordbugError::Oracle(format!(
            "{} returned {} predictions for {} texts",
            oracle.name(),
            predictions.len(),
            texts.len()
        )));
    }
    for prediction in &predictions {
        prediction.validate()?;
        if let Some(expected) = num_labels {
            if prediction.num_labels() != expected {
                return Err(WordbugError::Oracle(format!(
                    "{} scored {} labels, expected {}",
                    oracle.name(),
                    prediction.num_labels(),
                    expected
                )));
            }
        }
    }
    Ok(predictions)
}
