//! Attack dataset loading.
//!
//! Datasets are either a JSON array or JSON Lines, one sample per element:
//!
//! ```json
//! {"id": "r1", "text": "The movie was bad", "label": "negative"}
//! ```
//!
//! `id` defaults to the sample's index. `label` is the optional ground truth,
//! given as a label name or a numeric id.

use serde::{Deserialize, Serialize};
use std::path::Path;
use wordbug_core::OracleConfig;

/// Ground-truth label as written in a dataset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SampleLabel {
    /// Numeric label id.
    Id(usize),
    /// Label name, resolved against the configured label names.
    Name(String),
}

impl SampleLabel {
    /// Resolve to a label id using the oracle's label names.
    #[must_use]
    pub fn resolve(&self, oracle: &OracleConfig) -> Option<usize> {
        match self {
            Self::Id(id) => Some(*id),
            Self::Name(name) => oracle.label_id(name),
        }
    }
}

/// A single text to attack.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttackSample {
    /// Identifier carried into the report.
    #[serde(default)]
    pub id: String,
    /// The input text.
    pub text: String,
    /// Ground truth label, if known.
    #[serde(default)]
    pub label: Option<SampleLabel>,
}

/// Loads attack datasets from JSON or JSON Lines files.
pub struct DatasetLoader;

impl DatasetLoader {
    /// Load a dataset from a file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_from_file(path: &Path) -> Result<Vec<AttackSample>, String> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read {}: {}", path.display(), e))?;
        Self::load_from_str(&content).map_err(|e| format!("{}: {}", path.display(), e))
    }

    /// Load from a string, detecting a JSON array by its leading `[`.
    ///
    /// # Errors
    ///
    /// Returns an error naming the first malformed line or element.
    pub fn load_from_str(content: &str) -> Result<Vec<AttackSample>, String> {
        let mut samples: Vec<AttackSample> = if content.trim_start().starts_with('[') {
            serde_json::from_str(content).map_err(|e| format!("Failed to parse JSON: {e}"))?
        } else {
            content
                .lines()
                .enumerate()
                .filter(|(_, line)| !line.trim().is_empty())
                .map(|(n, line)| {
                    serde_json::from_str(line)
                        .map_err(|e| format!("Failed to parse line {}: {e}", n + 1))
                })
                .collect::<Result<_, _>>()?
        };

        for (index, sample) in samples.iter_mut().enumerate() {
            if sample.id.is_empty() {
                sample.id = index.to_string();
            }
        }
        Ok(samples)
    }
}
