//! The DeepWordBug attack recipe.
//!
//! Gao, Lanchantin, Soffa, Qi. *Black-box Generation of Adversarial Text
//! Sequences to Evade Deep Learning Classifiers.* arXiv:1801.04354.
//!
//! Either all four character operators composed together, or substitution
//! alone, searched greedily in word-importance order under a Levenshtein
//! budget (30 in the paper's experiments).

use tracing::info;
use wordbug_core::{CharOperator, RecipeConfig, Result};

use crate::constraint::{ConstraintFilter, LevenshteinEditDistance};
use crate::ranking::ImportanceRanker;
use crate::search::GreedySearcher;
use crate::transformation::TransformationEngine;

/// Builder for DeepWordBug searchers.
pub struct DeepWordBug;

impl DeepWordBug {
    /// Operators selected by the `use_all_transformations` flag.
    #[must_use]
    pub fn operators(use_all_transformations: bool) -> Vec<CharOperator> {
        if use_all_transformations {
            CharOperator::ALL.to_vec()
        } else {
            vec![CharOperator::RandomSubstitution]
        }
    }

    /// Build a searcher for `config`.
    ///
    /// The edit-distance constraint is always attached to the search.
    ///
    /// # Errors
    ///
    /// Returns [`wordbug_core::WordbugError::Config`] if the configuration
    /// is invalid. No oracle is contacted.
    pub fn build(config: &RecipeConfig) -> Result<GreedySearcher> {
        config.validate()?;

        let operators = Self::operators(config.use_all_transformations);
        let engine = TransformationEngine::new(operators, config.seed)?;
        let filter = ConstraintFilter::new().with(LevenshteinEditDistance::new(
            config.max_edit_distance,
        )?);
        let ranker = ImportanceRanker::new(config.probe.clone());

        info!(
            operators = ?engine.operators(),
            max_edit_distance = config.max_edit_distance,
            seed = config.seed,
            max_depth = ?config.max_depth,
            "Built DeepWordBug searcher"
        );

        Ok(GreedySearcher::new(engine, filter, ranker).with_max_depth(config.max_depth))
    }
}
