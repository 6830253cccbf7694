//! Core types, traits, and errors for wordbug
//!
//! This crate contains foundational types and traits shared across all wordbug components.
//! It provides the data structures for representing texts, oracle predictions, perturbation
//! trails, and attack results, plus the oracle capability interface and configuration.

use async_trait::async_trait;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, LazyLock};

// ---------------------------------------------------------------------------
// Text
// ---------------------------------------------------------------------------

/// Word tokens: runs of word characters, with inner apostrophes kept ("don't").
static WORD_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\w+(?:'\w+)*").expect("word regex"));

/// An immutable piece of text with its word token spans.
///
/// Every edit returns a new `Text`; the original is never modified. Word
/// positions are stable across [`Text::replace_word`], so a position in the
/// original text addresses the same word in every perturbed descendant.
///
/// Equality and hashing look at the string only. Serialization keeps just
/// the string and re-tokenizes on the way back, so a descendant whose
/// replacement splits into several words comes back with a fresh layout.
///
/// # Example
///
/// ```
/// use wordbug_core::Text;
///
/// let text = Text::new("The movie was bad");
/// assert_eq!(text.num_words(), 4);
///
/// let edited = text.replace_word(3, "bar").unwrap();
/// assert_eq!(edited.as_str(), "The movie was bar");
/// assert_eq!(text.as_str(), "The movie was bad");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct Text {
    raw: String,
    /// Byte ranges of each word in `raw`, in left-to-right order.
    spans: Vec<(usize, usize)>,
}

impl Text {
    /// Tokenize `raw` into a new text.
    pub fn new(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        let spans = WORD_RE
            .find_iter(&raw)
            .map(|m| (m.start(), m.end()))
            .collect();
        Self { raw, spans }
    }

    /// The full reconstructed string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Number of word tokens.
    #[must_use]
    pub fn num_words(&self) -> usize {
        self.spans.len()
    }

    /// Whether the text has no word tokens.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }

    /// The word at `position`, if any.
    #[must_use]
    pub fn word(&self, position: usize) -> Option<&str> {
        self.spans
            .get(position)
            .map(|&(start, end)| &self.raw[start..end])
    }

    /// Iterate over all words in order.
    pub fn words(&self) -> impl Iterator<Item = &str> + '_ {
        self.spans.iter().map(|&(start, end)| &self.raw[start..end])
    }

    /// Return a new text with the word at `position` replaced by `replacement`.
    ///
    /// The replacement occupies exactly one word slot regardless of its
    /// content, so positions of all other words are preserved. Returns
    /// `None` if `position` is out of range.
    #[must_use]
    pub fn replace_word(&self, position: usize, replacement: &str) -> Option<Self> {
        let &(start, end) = self.spans.get(position)?;

        let mut raw = String::with_capacity(self.raw.len() + replacement.len());
        raw.push_str(&self.raw[..start]);
        raw.push_str(replacement);
        raw.push_str(&self.raw[end..]);

        let new_end = start + replacement.len();
        let spans = self
            .spans
            .iter()
            .enumerate()
            .map(|(i, &(s, e))| match i.cmp(&position) {
                std::cmp::Ordering::Less => (s, e),
                std::cmp::Ordering::Equal => (start, new_end),
                std::cmp::Ordering::Greater => (s - end + new_end, e - end + new_end),
            })
            .collect();

        Some(Self { raw, spans })
    }

    /// Return a new text with the word at `position` removed, together with
    /// the whitespace that separated it from its neighbour.
    ///
    /// Returns `None` if `position` is out of range.
    #[must_use]
    pub fn delete_word(&self, position: usize) -> Option<Self> {
        let &(start, end) = self.spans.get(position)?;
        let bytes = self.raw.as_bytes();

        let mut cut_end = end;
        while cut_end < bytes.len() && bytes[cut_end].is_ascii_whitespace() {
            cut_end += 1;
        }
        let mut cut_start = start;
        if cut_end == end {
            while cut_start > 0 && bytes[cut_start - 1].is_ascii_whitespace() {
                cut_start -= 1;
            }
        }

        let mut raw = String::with_capacity(self.raw.len());
        raw.push_str(&self.raw[..cut_start]);
        raw.push_str(&self.raw[cut_end..]);
        Some(Self::new(raw))
    }

    /// Word positions at which `self` and `other` differ.
    ///
    /// Only meaningful for texts that share a word layout (a text and one of
    /// its [`Text::replace_word`] descendants). Extra positions in the
    /// longer text count as differences.
    #[must_use]
    pub fn changed_positions(&self, other: &Text) -> Vec<usize> {
        let longest = self.num_words().max(other.num_words());
        (0..longest)
            .filter(|&i| self.word(i) != other.word(i))
            .collect()
    }
}

impl PartialEq for Text {
    fn eq(&self, other: &Self) -> bool {
        self.raw == other.raw
    }
}

impl Eq for Text {}

impl std::hash::Hash for Text {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.raw.hash(state);
    }
}

impl std::fmt::Display for Text {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.raw)
    }
}

impl From<String> for Text {
    fn from(raw: String) -> Self {
        Self::new(raw)
    }
}

impl From<&str> for Text {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

impl From<Text> for String {
    fn from(text: Text) -> Self {
        text.raw
    }
}

// ---------------------------------------------------------------------------
// Predictions
// ---------------------------------------------------------------------------

/// Output of one oracle query: a confidence per label.
///
/// The predicted label is the argmax of `scores`; ties go to the lowest index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    /// Confidence per label, indexed by label id.
    pub scores: Vec<f64>,
}

impl Prediction {
    /// Wrap a score vector.
    #[must_use]
    pub fn new(scores: Vec<f64>) -> Self {
        Self { scores }
    }

    /// Check that the prediction is usable: non-empty and all scores finite.
    ///
    /// # Errors
    ///
    /// Returns [`WordbugError::Oracle`] describing the malformed output.
    pub fn validate(&self) -> Result<()> {
        if self.scores.is_empty() {
            return Err(WordbugError::Oracle(
                "prediction has an empty score vector".to_string(),
            ));
        }
        if let Some(bad) = self.scores.iter().find(|s| !s.is_finite()) {
            return Err(WordbugError::Oracle(format!(
                "prediction contains a non-finite score: {bad}"
            )));
        }
        Ok(())
    }

    /// The predicted label (argmax, lowest index on ties).
    #[must_use]
    pub fn label(&self) -> usize {
        let mut best = 0;
        for (i, score) in self.scores.iter().enumerate().skip(1) {
            if *score > self.scores[best] {
                best = i;
            }
        }
        best
    }

    /// Confidence assigned to `label`, or `0.0` if the label is unknown.
    #[must_use]
    pub fn confidence(&self, label: usize) -> f64 {
        self.scores.get(label).copied().unwrap_or(0.0)
    }

    /// Number of labels scored.
    #[must_use]
    pub fn num_labels(&self) -> usize {
        self.scores.len()
    }
}

// ---------------------------------------------------------------------------
// Perturbations
// ---------------------------------------------------------------------------

/// A character-level mutation operator applied to a single word.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CharOperator {
    /// Swap two adjacent characters.
    NeighboringSwap,
    /// Replace one character with a random letter.
    RandomSubstitution,
    /// Delete one character.
    RandomDeletion,
    /// Insert a random letter.
    RandomInsertion,
}

impl CharOperator {
    /// All operators, in recipe order.
    pub const ALL: [CharOperator; 4] = [
        CharOperator::NeighboringSwap,
        CharOperator::RandomSubstitution,
        CharOperator::RandomDeletion,
        CharOperator::RandomInsertion,
    ];

    /// Shortest word (in chars) this operator can mutate.
    #[must_use]
    pub fn min_word_len(self) -> usize {
        match self {
            Self::NeighboringSwap | Self::RandomDeletion => 2,
            Self::RandomSubstitution | Self::RandomInsertion => 1,
        }
    }
}

impl std::fmt::Display for CharOperator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NeighboringSwap => write!(f, "neighboring_swap"),
            Self::RandomSubstitution => write!(f, "random_substitution"),
            Self::RandomDeletion => write!(f, "random_deletion"),
            Self::RandomInsertion => write!(f, "random_insertion"),
        }
    }
}

/// One committed word replacement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Perturbation {
    /// Word position in the original text.
    pub position: usize,
    /// The word before replacement.
    pub original_word: String,
    /// The word after replacement.
    pub replacement: String,
    /// Operator that produced the replacement.
    pub operator: CharOperator,
}

// ---------------------------------------------------------------------------
// Attack results
// ---------------------------------------------------------------------------

/// Terminal status of an attack run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttackStatus {
    /// The oracle's decision was flipped.
    Success,
    /// Words (or depth) ran out before the decision flipped.
    Failure,
}

/// Outcome of one attack run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttackResult {
    /// Whether the attack flipped the prediction.
    pub status: AttackStatus,
    /// The unperturbed input.
    pub original_text: Text,
    /// The final text: adversarial on success, best attempt on failure.
    pub perturbed_text: Text,
    /// Committed perturbations, in commit order.
    pub trail: Vec<Perturbation>,
    /// Oracle output for the original text.
    pub original_prediction: Prediction,
    /// Oracle output for the final text.
    pub final_prediction: Prediction,
    /// Total oracle queries spent, including ranking probes.
    pub queries: usize,
}

impl AttackResult {
    /// Whether the attack succeeded.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status == AttackStatus::Success
    }

    /// Label the oracle originally assigned.
    #[must_use]
    pub fn original_label(&self) -> usize {
        self.original_prediction.label()
    }

    /// Label the oracle assigns to the final text.
    #[must_use]
    pub fn final_label(&self) -> usize {
        self.final_prediction.label()
    }

    /// Fraction of words perturbed, in `[0.0, 1.0]`.
    #[must_use]
    pub fn perturbed_word_ratio(&self) -> f64 {
        let words = self.original_text.num_words();
        if words == 0 {
            return 0.0;
        }
        self.original_text
            .changed_positions(&self.perturbed_text)
            .len() as f64
            / words as f64
    }
}

// ---------------------------------------------------------------------------
// Oracle
// ---------------------------------------------------------------------------

/// A black-box text classifier queried only through its outputs.
///
/// Implementations must be pure functions of their input text: the same text
/// always yields the same prediction within a run.
#[async_trait]
pub trait Oracle: Send + Sync {
    /// Score a single text.
    async fn predict(&self, text: &str) -> Result<Prediction>;

    /// Score many texts. Oracles that support multi-example calls should
    /// override this to send one request.
    async fn predict_batch(&self, texts: &[String]) -> Result<Vec<Prediction>> {
        let mut predictions = Vec::with_capacity(texts.len());
        for text in texts {
            predictions.push(self.predict(text).await?);
        }
        Ok(predictions)
    }

    /// Get the oracle name.
    fn name(&self) -> &'static str;
}

#[async_trait]
impl<O: Oracle + ?Sized> Oracle for Arc<O> {
    async fn predict(&self, text: &str) -> Result<Prediction> {
        (**self).predict(text).await
    }

    async fn predict_batch(&self, texts: &[String]) -> Result<Vec<Prediction>> {
        (**self).predict_batch(texts).await
    }

    fn name(&self) -> &'static str {
        (**self).name()
    }
}

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Edit-distance budget used by the DeepWordBug experiments.
pub const DEFAULT_MAX_EDIT_DISTANCE: f64 = 30.0;

/// Placeholder substituted for a word when measuring its importance.
pub const DEFAULT_UNKNOWN_TOKEN: &str = "[UNK]";

/// How a word is removed when probing its importance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ProbeStrategy {
    /// Replace the word with a placeholder token.
    Placeholder {
        /// The placeholder text.
        #[serde(default = "default_unknown_token")]
        token: String,
    },
    /// Remove the word entirely.
    Delete,
}

impl Default for ProbeStrategy {
    fn default() -> Self {
        Self::Placeholder {
            token: default_unknown_token(),
        }
    }
}

fn default_unknown_token() -> String {
    DEFAULT_UNKNOWN_TOKEN.to_string()
}

/// Knobs of the DeepWordBug attack recipe.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecipeConfig {
    /// Compose all four character operators (`true`) or use substitution only.
    #[serde(default = "default_true")]
    pub use_all_transformations: bool,
    /// Maximum Levenshtein distance between the original and any candidate.
    #[serde(default = "default_max_edit_distance")]
    pub max_edit_distance: f64,
    /// Seed for the randomized character operators.
    #[serde(default)]
    pub seed: u64,
    /// Maximum number of committed perturbations (`None` = unlimited).
    #[serde(default)]
    pub max_depth: Option<usize>,
    /// Importance probing strategy.
    #[serde(default)]
    pub probe: ProbeStrategy,
}

impl Default for RecipeConfig {
    fn default() -> Self {
        Self {
            use_all_transformations: true,
            max_edit_distance: DEFAULT_MAX_EDIT_DISTANCE,
            seed: 0,
            max_depth: None,
            probe: ProbeStrategy::default(),
        }
    }
}

impl RecipeConfig {
    /// Check the recipe for construction-time errors.
    ///
    /// # Errors
    ///
    /// Returns [`WordbugError::Config`] if the edit-distance budget is
    /// negative or not finite, or if the placeholder token is empty.
    pub fn validate(&self) -> Result<()> {
        if !self.max_edit_distance.is_finite() || self.max_edit_distance < 0.0 {
            return Err(WordbugError::Config(format!(
                "max_edit_distance must be a finite, non-negative number (got {})",
                self.max_edit_distance
            )));
        }
        if let ProbeStrategy::Placeholder { token } = &self.probe {
            if token.is_empty() {
                return Err(WordbugError::Config(
                    "probe placeholder token must not be empty".to_string(),
                ));
            }
        }
        Ok(())
    }
}

fn default_true() -> bool {
    true
}

fn default_max_edit_distance() -> f64 {
    DEFAULT_MAX_EDIT_DISTANCE
}

/// Which oracle backend the runner talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OracleKind {
    /// Built-in (or file-loaded) bag-of-words classifier.
    Lexicon,
    /// Remote classifier behind an HTTP endpoint.
    Http,
}

/// Oracle backend configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OracleConfig {
    /// Backend kind.
    #[serde(default = "default_oracle_kind")]
    pub kind: OracleKind,
    /// Endpoint URL for the HTTP oracle.
    #[serde(default)]
    pub endpoint: Option<String>,
    /// Request timeout for the HTTP oracle in milliseconds.
    #[serde(default = "default_oracle_timeout_ms")]
    pub timeout_ms: u64,
    /// Optional JSON lexicon file for the lexicon oracle.
    #[serde(default)]
    pub lexicon_path: Option<String>,
    /// Display names for label ids.
    #[serde(default = "default_labels")]
    pub labels: Vec<String>,
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            kind: default_oracle_kind(),
            endpoint: None,
            timeout_ms: default_oracle_timeout_ms(),
            lexicon_path: None,
            labels: default_labels(),
        }
    }
}

impl OracleConfig {
    /// Display name for a label id, falling back to the numeric id.
    #[must_use]
    pub fn label_name(&self, label: usize) -> String {
        self.labels
            .get(label)
            .cloned()
            .unwrap_or_else(|| label.to_string())
    }

    /// Resolve a display name (or numeric string) back to a label id.
    #[must_use]
    pub fn label_id(&self, name: &str) -> Option<usize> {
        self.labels
            .iter()
            .position(|l| l.eq_ignore_ascii_case(name))
            .or_else(|| name.parse().ok())
    }

    /// Check the oracle configuration for construction-time errors.
    ///
    /// # Errors
    ///
    /// Returns [`WordbugError::Config`] if the HTTP oracle has no endpoint.
    pub fn validate(&self) -> Result<()> {
        if self.kind == OracleKind::Http && self.endpoint.as_deref().unwrap_or("").is_empty() {
            return Err(WordbugError::Config(
                "oracle.endpoint is required when oracle.kind is \"http\"".to_string(),
            ));
        }
        Ok(())
    }
}

fn default_oracle_kind() -> OracleKind {
    OracleKind::Lexicon
}

fn default_oracle_timeout_ms() -> u64 {
    30_000
}

fn default_labels() -> Vec<String> {
    vec!["negative".to_string(), "positive".to_string()]
}

/// Attack runner configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunnerConfig {
    /// How many independent attack runs may execute at once.
    #[serde(default = "default_max_concurrent_attacks")]
    pub max_concurrent_attacks: usize,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            max_concurrent_attacks: default_max_concurrent_attacks(),
        }
    }
}

fn default_max_concurrent_attacks() -> usize {
    4
}

/// Top-level wordbug configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WordbugConfig {
    /// Attack recipe.
    #[serde(default)]
    pub recipe: RecipeConfig,
    /// Target classifier.
    #[serde(default)]
    pub oracle: OracleConfig,
    /// Runner settings.
    #[serde(default)]
    pub runner: RunnerConfig,
}

impl WordbugConfig {
    /// Validate every section.
    ///
    /// # Errors
    ///
    /// Returns the first [`WordbugError::Config`] found.
    pub fn validate(&self) -> Result<()> {
        self.recipe.validate()?;
        self.oracle.validate()?;
        if self.runner.max_concurrent_attacks == 0 {
            return Err(WordbugError::Config(
                "runner.max_concurrent_attacks must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors that cross an attack run boundary.
///
/// Rejected candidates and exhausted searches are not errors; they surface as
/// filtered candidate sets and [`AttackStatus::Failure`] results.
#[derive(thiserror::Error, Debug)]
pub enum WordbugError {
    /// The oracle failed or returned malformed output.
    #[error("Oracle error: {0}")]
    Oracle(String),

    /// Invalid configuration, caught before any oracle call.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The run observed a cancellation request between word positions.
    #[error("Attack cancelled")]
    Cancelled,

    /// Serialization / deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience alias for `std::result::Result<T, WordbugError>`.
pub type Result<T> = std::result::Result<T, WordbugError>;

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_tokenizes_words() {
        let text = Text::new("The movie, honestly, wasn't bad!");
        let words: Vec<&str> = text.words().collect();
        assert_eq!(words, vec!["The", "movie", "honestly", "wasn't", "bad"]);
    }

    #[test]
    fn test_text_empty() {
        let text = Text::new("   ");
        assert!(text.is_empty());
        assert_eq!(text.word(0), None);
    }

    #[test]
    fn test_replace_word_preserves_other_positions() {
        let text = Text::new("a quick fox");
        let edited = text.replace_word(1, "[UNK]").unwrap();
        assert_eq!(edited.as_str(), "a [UNK] fox");
        assert_eq!(edited.num_words(), 3);
        assert_eq!(edited.word(1), Some("[UNK]"));
        assert_eq!(edited.word(2), Some("fox"));

        let again = edited.replace_word(2, "fx").unwrap();
        assert_eq!(again.as_str(), "a [UNK] fx");
        assert_eq!(again.word(0), Some("a"));
    }

    #[test]
    fn test_replace_word_out_of_range() {
        let text = Text::new("one two");
        assert!(text.replace_word(2, "x").is_none());
    }

    #[test]
    fn test_replace_word_multibyte() {
        let text = Text::new("café au lait");
        let edited = text.replace_word(0, "cafe").unwrap();
        assert_eq!(edited.as_str(), "cafe au lait");
        assert_eq!(edited.word(2), Some("lait"));
    }

    #[test]
    fn test_delete_word() {
        let text = Text::new("The movie was bad");
        assert_eq!(text.delete_word(0).unwrap().as_str(), "movie was bad");
        assert_eq!(text.delete_word(3).unwrap().as_str(), "The movie was");
        assert_eq!(text.delete_word(1).unwrap().as_str(), "The was bad");
    }

    #[test]
    fn test_changed_positions() {
        let text = Text::new("the movie was bad");
        let edited = text
            .replace_word(1, "mvie")
            .and_then(|t| t.replace_word(3, "bd"))
            .unwrap();
        assert_eq!(text.changed_positions(&edited), vec![1, 3]);
        assert!(text.changed_positions(&text).is_empty());
    }

    #[test]
    fn test_text_serializes_as_string() {
        let text = Text::new("hello world");
        let json = serde_json::to_string(&text).unwrap();
        assert_eq!(json, "\"hello world\"");
        let back: Text = serde_json::from_str(&json).unwrap();
        assert_eq!(back, text);
    }

    #[test]
    fn test_split_replacement_survives_serde_round_trip() {
        let edited = Text::new("x'y'z").replace_word(0, "x''z").unwrap();
        assert_eq!(edited.num_words(), 1);

        let json = serde_json::to_string(&edited).unwrap();
        let back: Text = serde_json::from_str(&json).unwrap();
        assert_eq!(back, edited);
        assert_eq!(back.num_words(), 2);
    }

    #[test]
    fn test_prediction_label_argmax() {
        let p = Prediction::new(vec![0.1, 0.7, 0.2]);
        assert_eq!(p.label(), 1);
        assert!((p.confidence(1) - 0.7).abs() < f64::EPSILON);
        assert_eq!(p.confidence(9), 0.0);
    }

    #[test]
    fn test_prediction_label_ties_go_to_lowest_index() {
        let p = Prediction::new(vec![0.5, 0.5]);
        assert_eq!(p.label(), 0);
    }

    #[test]
    fn test_prediction_validate() {
        assert!(Prediction::new(vec![0.4, 0.6]).validate().is_ok());
        assert!(matches!(
            Prediction::new(vec![]).validate(),
            Err(WordbugError::Oracle(_))
        ));
        assert!(matches!(
            Prediction::new(vec![f64::NAN, 0.2]).validate(),
            Err(WordbugError::Oracle(_))
        ));
    }

    #[test]
    fn test_char_operator_serde() {
        let json = serde_json::to_string(&CharOperator::RandomSubstitution).unwrap();
        assert_eq!(json, "\"random_substitution\"");
        assert_eq!(
            CharOperator::NeighboringSwap.to_string(),
            "neighboring_swap"
        );
    }

    #[test]
    fn test_recipe_config_defaults() {
        let config = RecipeConfig::default();
        assert!(config.use_all_transformations);
        assert_eq!(config.max_edit_distance, 30.0);
        assert_eq!(config.max_depth, None);
        assert_eq!(
            config.probe,
            ProbeStrategy::Placeholder {
                token: "[UNK]".to_string()
            }
        );
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_recipe_config_rejects_negative_budget() {
        let config = RecipeConfig {
            max_edit_distance: -1.0,
            ..RecipeConfig::default()
        };
        assert!(matches!(config.validate(), Err(WordbugError::Config(_))));

        let config = RecipeConfig {
            max_edit_distance: f64::INFINITY,
            ..RecipeConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_wordbug_config_from_partial_yaml() {
        let yaml = r#"
recipe:
  use_all_transformations: false
  seed: 7
  probe:
    kind: delete
oracle:
  kind: http
  endpoint: "http://localhost:8080/predict"
"#;
        let config: WordbugConfig = serde_yaml::from_str(yaml).unwrap();
        assert!(!config.recipe.use_all_transformations);
        assert_eq!(config.recipe.seed, 7);
        assert_eq!(config.recipe.max_edit_distance, 30.0);
        assert_eq!(config.recipe.probe, ProbeStrategy::Delete);
        assert_eq!(config.oracle.kind, OracleKind::Http);
        assert_eq!(config.oracle.timeout_ms, 30_000);
        assert_eq!(config.runner.max_concurrent_attacks, 4);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_http_oracle_requires_endpoint() {
        let config = WordbugConfig {
            oracle: OracleConfig {
                kind: OracleKind::Http,
                ..OracleConfig::default()
            },
            ..WordbugConfig::default()
        };
        assert!(matches!(config.validate(), Err(WordbugError::Config(_))));
    }

    #[test]
    fn test_label_names() {
        let oracle = OracleConfig::default();
        assert_eq!(oracle.label_name(0), "negative");
        assert_eq!(oracle.label_name(5), "5");
        assert_eq!(oracle.label_id("Positive"), Some(1));
        assert_eq!(oracle.label_id("1"), Some(1));
        assert_eq!(oracle.label_id("neutral"), None);
    }

    struct ConstantOracle;

    #[async_trait]
    impl Oracle for ConstantOracle {
        async fn predict(&self, _text: &str) -> Result<Prediction> {
            Ok(Prediction::new(vec![0.25, 0.75]))
        }

        fn name(&self) -> &'static str {
            "ConstantOracle"
        }
    }

    #[tokio::test]
    async fn test_default_predict_batch_calls_predict_per_text() {
        let oracle = Arc::new(ConstantOracle);
        let texts = vec!["a".to_string(), "b".to_string(), "c".to_string()];
        let predictions = oracle.predict_batch(&texts).await.unwrap();
        assert_eq!(predictions.len(), 3);
        assert!(predictions.iter().all(|p| p.label() == 1));
        assert_eq!(oracle.name(), "ConstantOracle");
    }

    #[test]
    fn test_attack_result_perturbed_ratio() {
        let original = Text::new("the movie was bad");
        let perturbed = original.replace_word(3, "bd").unwrap();
        let result = AttackResult {
            status: AttackStatus::Success,
            original_text: original,
            perturbed_text: perturbed,
            trail: vec![],
            original_prediction: Prediction::new(vec![0.9, 0.1]),
            final_prediction: Prediction::new(vec![0.4, 0.6]),
            queries: 10,
        };
        assert!(result.is_success());
        assert_eq!(result.original_label(), 0);
        assert_eq!(result.final_label(), 1);
        assert!((result.perturbed_word_ratio() - 0.25).abs() < 1e-12);
    }
}
