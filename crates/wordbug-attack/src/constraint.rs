//! Candidate constraints.
//!
//! A [`Constraint`] decides whether a candidate is close enough to the
//! *original* text to be admissible. [`ConstraintFilter`] requires every
//! configured constraint to agree. Rejection is silent: rejected candidates
//! simply drop out of the pool.

use wordbug_core::{Result, Text, WordbugError};

use crate::transformation::Candidate;

/// A pure accept/reject predicate between the original text and a candidate.
pub trait Constraint: Send + Sync + std::fmt::Debug {
    /// Short identifier for logs.
    fn name(&self) -> &'static str;

    /// Whether `candidate` is admissible relative to `original`.
    fn permits(&self, original: &Text, candidate: &Text) -> bool;
}

// ---------------------------------------------------------------------------
// Levenshtein edit distance
// ---------------------------------------------------------------------------

/// Character-level Levenshtein distance between two strings.
///
/// Runs in `O(n * m)` time and keeps a single row sized to the shorter
/// string.
#[must_use]
pub fn levenshtein(a: &str, b: &str) -> usize {
    let a_chars: Vec<char> = a.chars().collect();
    let b_chars: Vec<char> = b.chars().collect();
    let (long, short) = if a_chars.len() >= b_chars.len() {
        (a_chars, b_chars)
    } else {
        (b_chars, a_chars)
    };
    if short.is_empty() {
        return long.len();
    }

    let mut row: Vec<usize> = (0..=short.len()).collect();
    for (i, lc) in long.iter().enumerate() {
        let mut diagonal = row[0];
        row[0] = i + 1;
        for (j, sc) in short.iter().enumerate() {
            let substitution = diagonal + usize::from(lc != sc);
            diagonal = row[j + 1];
            row[j + 1] = substitution.min(row[j] + 1).min(diagonal + 1);
        }
    }
    row[short.len()]
}

/// Accepts candidates within a maximum edit distance of the original.
///
/// The distance is always measured against the original, so the budget is
/// shared by every perturbation committed during a run.
#[derive(Debug, Clone, PartialEq)]
pub struct LevenshteinEditDistance {
    max_distance: f64,
}

impl LevenshteinEditDistance {
    /// Create the constraint with budget `max_distance`.
    ///
    /// # Errors
    ///
    /// Returns [`WordbugError::Config`] for negative or non-finite budgets.
    pub fn new(max_distance: f64) -> Result<Self> {
        if !max_distance.is_finite() || max_distance < 0.0 {
            return Err(WordbugError::Config(format!(
                "edit distance budget must be finite and non-negative (got {max_distance})"
            )));
        }
        Ok(Self { max_distance })
    }

    /// The configured budget.
    #[must_use]
    pub fn max_distance(&self) -> f64 {
        self.max_distance
    }

    /// Distance between the reconstructed strings of two texts.
    #[must_use]
    pub fn distance(&self, a: &Text, b: &Text) -> usize {
        levenshtein(a.as_str(), b.as_str())
    }
}

impl Constraint for LevenshteinEditDistance {
    fn name(&self) -> &'static str {
        "levenshtein_edit_distance"
    }

    fn permits(&self, original: &Text, candidate: &Text) -> bool {
        self.distance(original, candidate) as f64 <= self.max_distance
    }
}

// ---------------------------------------------------------------------------
// ConstraintFilter
// ---------------------------------------------------------------------------

/// Conjunction of constraints applied to candidate pools.
#[derive(Debug, Default)]
pub struct ConstraintFilter {
    constraints: Vec<Box<dyn Constraint>>,
}

impl ConstraintFilter {
    /// A filter with no constraints (accepts everything).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a constraint.
    #[must_use]
    pub fn with(mut self, constraint: impl Constraint + 'static) -> Self {
        self.constraints.push(Box::new(constraint));
        self
    }

    /// Names of configured constraints.
    #[must_use]
    pub fn names(&self) -> Vec<&'static str> {
        self.constraints.iter().map(|c| c.name()).collect()
    }

    /// Whether every constraint accepts `candidate`.
    #[must_use]
    pub fn permits(&self, original: &Text, candidate: &Text) -> bool {
        self.constraints
            .iter()
            .all(|c| c.permits(original, candidate))
    }

    /// Keep the admissible candidates, preserving their order.
    #[must_use]
    pub fn retain_permitted(&self, original: &Text, candidates: Vec<Candidate>) -> Vec<Candidate> {
        candidates
            .into_iter()
            .filter(|c| self.permits(original, &c.text))
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use wordbug_core::{CharOperator, Perturbation};

    fn candidate(original: &Text, position: usize, replacement: &str) -> Candidate {
        Candidate {
            text: original.replace_word(position, replacement).unwrap(),
            perturbation: Perturbation {
                position,
                original_word: original.word(position).unwrap().to_string(),
                replacement: replacement.to_string(),
                operator: CharOperator::RandomSubstitution,
            },
        }
    }

    #[test]
    fn test_levenshtein_identical_strings() {
        assert_eq!(levenshtein("kitten", "kitten"), 0);
        assert_eq!(levenshtein("", ""), 0);
    }

    #[test]
    fn test_levenshtein_classic_example() {
        assert_eq!(levenshtein("kitten", "sitting"), 3);
        assert_eq!(levenshtein("sitting", "kitten"), 3);
    }

    #[test]
    fn test_levenshtein_against_empty() {
        assert_eq!(levenshtein("abc", ""), 3);
        assert_eq!(levenshtein("", "abcd"), 4);
    }

    #[test]
    fn test_levenshtein_counts_transposition_as_two() {
        assert_eq!(levenshtein("ab", "ba"), 2);
    }

    #[test]
    fn test_levenshtein_counts_chars_not_bytes() {
        assert_eq!(levenshtein("café", "cafe"), 1);
    }

    #[test]
    fn test_budget_validation() {
        assert!(LevenshteinEditDistance::new(0.0).is_ok());
        assert!(matches!(
            LevenshteinEditDistance::new(-3.0),
            Err(WordbugError::Config(_))
        ));
        assert!(LevenshteinEditDistance::new(f64::NAN).is_err());
    }

    #[test]
    fn test_permits_within_budget() {
        let constraint = LevenshteinEditDistance::new(1.0).unwrap();
        let original = Text::new("the movie was bad");
        assert!(constraint.permits(&original, &original.replace_word(3, "bar").unwrap()));
        assert!(!constraint.permits(&original, &original.replace_word(3, "bxx").unwrap()));
    }

    #[test]
    fn test_zero_budget_rejects_every_change() {
        let constraint = LevenshteinEditDistance::new(0.0).unwrap();
        let original = Text::new("the movie was bad");
        assert!(constraint.permits(&original, &original));
        assert!(!constraint.permits(&original, &original.replace_word(3, "bar").unwrap()));
    }

    #[test]
    fn test_budget_is_cumulative_against_original() {
        let constraint = LevenshteinEditDistance::new(2.0).unwrap();
        let original = Text::new("good good good");
        let step1 = original.replace_word(0, "goxd").unwrap();
        let step2 = step1.replace_word(1, "goxd").unwrap();
        let step3 = step2.replace_word(2, "goxd").unwrap();
        assert!(constraint.permits(&original, &step1));
        assert!(constraint.permits(&original, &step2));
        // Each step is one edit from the last, but three from the original.
        assert!(constraint.permits(&step2, &step3));
        assert!(!constraint.permits(&original, &step3));
    }

    #[test]
    fn test_empty_filter_accepts_everything() {
        let filter = ConstraintFilter::new();
        let original = Text::new("abc");
        assert!(filter.permits(&original, &Text::new("something else entirely")));
        assert!(filter.names().is_empty());
    }

    #[test]
    fn test_filter_preserves_order_and_is_order_independent() {
        let filter = ConstraintFilter::new().with(LevenshteinEditDistance::new(1.0).unwrap());
        let original = Text::new("the movie was bad");
        let pool = vec![
            candidate(&original, 3, "bar"),
            candidate(&original, 3, "xyz"),
            candidate(&original, 1, "movie"),
            candidate(&original, 0, "th"),
        ];

        let kept = filter.retain_permitted(&original, pool.clone());
        let kept_strings: Vec<&str> = kept.iter().map(|c| c.text.as_str()).collect();
        assert_eq!(
            kept_strings,
            vec!["the movie was bar", "the movie was bad", "th movie was bad"]
        );

        let mut reversed = pool;
        reversed.reverse();
        let mut kept_reversed: Vec<String> = filter
            .retain_permitted(&original, reversed)
            .into_iter()
            .map(|c| c.text.to_string())
            .collect();
        kept_reversed.sort();
        let mut kept_sorted: Vec<String> = kept_strings.iter().map(|s| s.to_string()).collect();
        kept_sorted.sort();
        assert_eq!(kept_reversed, kept_sorted);
    }

    #[test]
    fn test_filter_names() {
        let filter = ConstraintFilter::new().with(LevenshteinEditDistance::new(30.0).unwrap());
        assert_eq!(filter.names(), vec!["levenshtein_edit_distance"]);
    }
}
