//! Deterministic bag-of-words classifier.
//!
//! [`LexiconOracle`] scores a text by summing per-label word weights on top
//! of a per-label bias and applying a softmax. Words are matched
//! case-insensitively on exact token equality, so a single character edit is
//! enough to hide a word from it. It ships with a small two-class sentiment
//! lexicon and can load larger ones from JSON:
//!
//! ```json
//! {
//!   "labels": ["negative", "positive"],
//!   "bias": [0.0, 0.1],
//!   "weights": { "bad": [1.1, -1.1], "great": [-1.2, 1.2] }
//! }
//! ```

use std::collections::HashMap;
use std::path::Path;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use wordbug_core::{Oracle, Prediction, Result, Text, WordbugError};

/// Built-in sentiment words: `(word, negative weight)`. Positive weight is the
/// negation.
const SENTIMENT_WORDS: &[(&str, f64)] = &[
    ("bad", 1.1),
    ("awful", 1.4),
    ("terrible", 1.4),
    ("boring", 1.0),
    ("dull", 0.9),
    ("worst", 1.5),
    ("poor", 0.9),
    ("waste", 1.2),
    ("disappointing", 1.2),
    ("mess", 0.8),
    ("good", -1.0),
    ("great", -1.2),
    ("excellent", -1.4),
    ("wonderful", -1.3),
    ("best", -1.3),
    ("fun", -0.8),
    ("brilliant", -1.4),
    ("enjoyable", -1.0),
    ("masterpiece", -1.5),
    ("charming", -0.9),
];

/// Serialized lexicon format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LexiconSpec {
    /// Label names, indexed by label id.
    pub labels: Vec<String>,
    /// Per-label bias added to every text.
    #[serde(default)]
    pub bias: Vec<f64>,
    /// Per-word, per-label weights.
    pub weights: HashMap<String, Vec<f64>>,
}

/// A bag-of-words softmax classifier.
#[derive(Debug, Clone)]
pub struct LexiconOracle {
    labels: Vec<String>,
    bias: Vec<f64>,
    weights: HashMap<String, Vec<f64>>,
}

impl LexiconOracle {
    /// Build from a lexicon spec.
    ///
    /// Word keys are lowercased. A missing bias defaults to zeros.
    ///
    /// # Errors
    ///
    /// Returns [`WordbugError::Config`] if there are no labels or any weight
    /// vector has the wrong length.
    pub fn from_spec(spec: LexiconSpec) -> Result<Self> {
        let num_labels = spec.labels.len();
        if num_labels == 0 {
            return Err(WordbugError::Config(
                "lexicon must define at least one label".to_string(),
            ));
        }
        let bias = if spec.bias.is_empty() {
            vec![0.0; num_labels]
        } else {
            spec.bias
        };
        if bias.len() != num_labels {
            return Err(WordbugError::Config(format!(
                "lexicon bias has {} entries for {} labels",
                bias.len(),
                num_labels
            )));
        }
        let mut weights = HashMap::with_capacity(spec.weights.len());
        for (word, w) in spec.weights {
            if w.len() != num_labels {
                return Err(WordbugError::Config(format!(
                    "lexicon word '{word}' has {} weights for {} labels",
                    w.len(),
                    num_labels
                )));
            }
            weights.insert(word.to_lowercase(), w);
        }
        Ok(Self {
            labels: spec.labels,
            bias,
            weights,
        })
    }

    /// Load a JSON lexicon from `path`.
    ///
    /// # Errors
    ///
    /// Returns an I/O, serialization, or configuration error.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let spec: LexiconSpec = serde_json::from_str(&contents)?;
        Self::from_spec(spec)
    }

    /// The built-in two-class sentiment lexicon (`negative`, `positive`).
    ///
    /// The slight positive bias means a text with no known words leans
    /// positive.
    #[must_use]
    pub fn sentiment() -> Self {
        let weights = SENTIMENT_WORDS
            .iter()
            .map(|&(word, negative)| (word.to_string(), vec![negative, -negative]))
            .collect();
        Self {
            labels: vec!["negative".to_string(), "positive".to_string()],
            bias: vec![0.0, 0.1],
            weights,
        }
    }

    /// Label names, indexed by label id.
    #[must_use]
    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// Score a text synchronously.
    #[must_use]
    pub fn score(&self, text: &str) -> Prediction {
        let mut logits = self.bias.clone();
        for word in Text::new(text).words() {
            if let Some(w) = self.weights.get(&word.to_lowercase()) {
                for (logit, weight) in logits.iter_mut().zip(w) {
                    *logit += weight;
                }
            }
        }
        Prediction::new(softmax(&logits))
    }
}

#[async_trait]
impl Oracle for LexiconOracle {
    async fn predict(&self, text: &str) -> Result<Prediction> {
        Ok(self.score(text))
    }

    async fn predict_batch(&self, texts: &[String]) -> Result<Vec<Prediction>> {
        Ok(texts.iter().map(|t| self.score(t)).collect())
    }

    fn name(&self) -> &'static str {
        "LexiconOracle"
    }
}

fn softmax(logits: &[f64]) -> Vec<f64> {
    let max = logits.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let exps: Vec<f64> = logits.iter().map(|l| (l - max).exp()).collect();
    let sum: f64 = exps.iter().sum();
    exps.into_iter().map(|e| e / sum).collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_softmax_sums_to_one() {
        let probs = softmax(&[1.0, 2.0, 3.0]);
        let total: f64 = probs.iter().sum();
        assert!((total - 1.0).abs() < 1e-12);
        assert!(probs[2] > probs[1] && probs[1] > probs[0]);
    }

    #[test]
    fn test_sentiment_negative_review() {
        let oracle = LexiconOracle::sentiment();
        let p = oracle.score("The movie was bad");
        assert_eq!(p.label(), 0);
        assert!(p.confidence(0) > 0.85 && p.confidence(0) < 0.95);
    }

    #[test]
    fn test_sentiment_is_case_insensitive() {
        let oracle = LexiconOracle::sentiment();
        assert_eq!(oracle.score("GREAT fun"), oracle.score("great fun"));
        assert_eq!(oracle.score("great fun").label(), 1);
    }

    #[test]
    fn test_unknown_words_lean_positive() {
        let oracle = LexiconOracle::sentiment();
        let p = oracle.score("The movie was bd");
        assert_eq!(p.label(), 1);
    }

    #[test]
    fn test_from_spec_rejects_bad_shapes() {
        let spec = LexiconSpec {
            labels: vec!["a".to_string(), "b".to_string()],
            bias: vec![],
            weights: HashMap::from([("x".to_string(), vec![1.0])]),
        };
        assert!(matches!(
            LexiconOracle::from_spec(spec),
            Err(WordbugError::Config(_))
        ));

        let spec = LexiconSpec {
            labels: vec![],
            bias: vec![],
            weights: HashMap::new(),
        };
        assert!(LexiconOracle::from_spec(spec).is_err());
    }

    #[test]
    fn test_from_json_file_three_labels() {
        let mut f = NamedTempFile::new().unwrap();
        f.write_all(
            br#"{
                "labels": ["sports", "politics", "tech"],
                "weights": {
                    "Goal": [2.0, 0.0, 0.0],
                    "vote": [0.0, 2.0, 0.0],
                    "rust": [0.0, 0.0, 2.0]
                }
            }"#,
        )
        .unwrap();
        let oracle = LexiconOracle::from_json_file(f.path()).unwrap();
        assert_eq!(oracle.labels().len(), 3);
        assert_eq!(oracle.score("a late goal").label(), 0);
        assert_eq!(oracle.score("rust is fast").label(), 2);
    }

    #[test]
    fn test_from_json_file_missing() {
        let result = LexiconOracle::from_json_file(Path::new("/nonexistent/lexicon.json"));
        assert!(matches!(result, Err(WordbugError::Io(_))));
    }

    #[tokio::test]
    async fn test_batch_matches_single_predictions() {
        let oracle = LexiconOracle::sentiment();
        let texts = vec!["bad".to_string(), "great".to_string()];
        let batch = oracle.predict_batch(&texts).await.unwrap();
        assert_eq!(batch[0], oracle.predict("bad").await.unwrap());
        assert_eq!(batch[1], oracle.predict("great").await.unwrap());
    }
}
