//! Character-level word transformations.
//!
//! [`TransformationEngine`] turns one word of a [`Text`] into a pool of
//! candidate texts by running every configured [`CharOperator`] on it and
//! taking the union of the results.
//!
//! # Operators
//!
//! | Operator | Output for a word of `n` chars |
//! |----------|-------------------------------|
//! | `NeighboringSwap` | up to `n - 1` adjacent-pair swaps |
//! | `RandomSubstitution` | `n` single-letter substitutions |
//! | `RandomDeletion` | `n` single-char deletions |
//! | `RandomInsertion` | `n + 1` single-letter insertions |
//!
//! Random letters are drawn from `a..=z` with an RNG seeded from the engine
//! seed, the operator, the word position, and the word itself, so the same
//! `(seed, text, position)` always yields the same candidates.

use std::collections::HashSet;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use wordbug_core::{CharOperator, Perturbation, Result, Text, WordbugError};

// ---------------------------------------------------------------------------
// Candidate
// ---------------------------------------------------------------------------

/// A speculative perturbed text, not yet committed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    /// The full perturbed text.
    pub text: Text,
    /// The single-word change that produced it.
    pub perturbation: Perturbation,
}

// ---------------------------------------------------------------------------
// Operators
// ---------------------------------------------------------------------------

/// Apply `operator` to `word`, returning every variant it produces.
///
/// Words shorter than [`CharOperator::min_word_len`] yield nothing. The
/// output may contain duplicates; callers deduplicate.
pub fn mutate_word(operator: CharOperator, word: &str, rng: &mut ChaCha8Rng) -> Vec<String> {
    let chars: Vec<char> = word.chars().collect();
    if chars.len() < operator.min_word_len() {
        return Vec::new();
    }

    match operator {
        CharOperator::NeighboringSwap => (0..chars.len() - 1)
            .filter(|&i| chars[i] != chars[i + 1])
            .map(|i| {
                let mut swapped = chars.clone();
                swapped.swap(i, i + 1);
                swapped.into_iter().collect()
            })
            .collect(),
        CharOperator::RandomSubstitution => (0..chars.len())
            .map(|i| {
                let mut substituted = chars.clone();
                substituted[i] = random_letter_except(rng, chars[i]);
                substituted.into_iter().collect()
            })
            .collect(),
        CharOperator::RandomDeletion => (0..chars.len())
            .map(|i| {
                chars
                    .iter()
                    .enumerate()
                    .filter(|&(j, _)| j != i)
                    .map(|(_, c)| *c)
                    .collect()
            })
            .collect(),
        CharOperator::RandomInsertion => (0..=chars.len())
            .map(|i| {
                let mut inserted = chars.clone();
                inserted.insert(i, random_letter(rng));
                inserted.into_iter().collect()
            })
            .collect(),
    }
}

fn random_letter(rng: &mut ChaCha8Rng) -> char {
    (b'a' + rng.gen_range(0..26u8)) as char
}

/// Draw a lowercase letter that differs from `except` (when `except` is one).
fn random_letter_except(rng: &mut ChaCha8Rng, except: char) -> char {
    if !except.is_ascii_lowercase() {
        return random_letter(rng);
    }
    let mut letter = b'a' + rng.gen_range(0..25u8);
    if letter >= except as u8 {
        letter += 1;
    }
    letter as char
}

// ---------------------------------------------------------------------------
// TransformationEngine
// ---------------------------------------------------------------------------

/// Generates candidate texts for one word position from a set of operators.
#[derive(Debug, Clone)]
pub struct TransformationEngine {
    operators: Vec<CharOperator>,
    seed: u64,
}

impl TransformationEngine {
    /// Create an engine composing `operators` in the given order.
    ///
    /// # Errors
    ///
    /// Returns [`WordbugError::Config`] if `operators` is empty.
    pub fn new(operators: Vec<CharOperator>, seed: u64) -> Result<Self> {
        if operators.is_empty() {
            return Err(WordbugError::Config(
                "transformation engine needs at least one operator".to_string(),
            ));
        }
        Ok(Self { operators, seed })
    }

    /// Configured operators, in composition order.
    #[must_use]
    pub fn operators(&self) -> &[CharOperator] {
        &self.operators
    }

    /// Generate the deduplicated candidate pool for the word at `position`.
    ///
    /// No candidate is textually identical to `text`, and no two candidates
    /// are identical to each other; when operators collide the first one in
    /// composition order keeps the candidate. Out-of-range positions yield
    /// an empty pool.
    #[must_use]
    pub fn generate(&self, text: &Text, position: usize) -> Vec<Candidate> {
        let Some(word) = text.word(position) else {
            return Vec::new();
        };

        let mut seen: HashSet<String> = HashSet::new();
        seen.insert(text.as_str().to_string());

        let mut candidates = Vec::new();
        for (op_index, &operator) in self.operators.iter().enumerate() {
            let mut rng = self.rng_for(op_index, position, word);
            for replacement in mutate_word(operator, word, &mut rng) {
                if replacement == word {
                    continue;
                }
                let Some(perturbed) = text.replace_word(position, &replacement) else {
                    continue;
                };
                if !seen.insert(perturbed.as_str().to_string()) {
                    continue;
                }
                candidates.push(Candidate {
                    text: perturbed,
                    perturbation: Perturbation {
                        position,
                        original_word: word.to_string(),
                        replacement,
                        operator,
                    },
                });
            }
        }
        candidates
    }

    /// Upper bound on candidates for a word of `word_len` chars.
    #[must_use]
    pub fn max_candidates(&self, word_len: usize) -> usize {
        self.operators
            .iter()
            .filter(|op| word_len >= op.min_word_len())
            .map(|op| match op {
                CharOperator::NeighboringSwap => word_len - 1,
                CharOperator::RandomSubstitution | CharOperator::RandomDeletion => word_len,
                CharOperator::RandomInsertion => word_len + 1,
            })
            .sum()
    }

    fn rng_for(&self, op_index: usize, position: usize, word: &str) -> ChaCha8Rng {
        let mut state = self.seed;
        state = splitmix64(state ^ op_index as u64);
        state = splitmix64(state ^ position as u64);
        state = splitmix64(state ^ fnv1a(word.as_bytes()));
        ChaCha8Rng::seed_from_u64(state)
    }
}

fn splitmix64(mut x: u64) -> u64 {
    x = x.wrapping_add(0x9E37_79B9_7F4A_7C15);
    x = (x ^ (x >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    x = (x ^ (x >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    x ^ (x >> 31)
}

fn fnv1a(bytes: &[u8]) -> u64 {
    bytes.iter().fold(0xCBF2_9CE4_8422_2325, |hash, &b| {
        (hash ^ u64::from(b)).wrapping_mul(0x0000_0100_0000_01B3)
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
