//! Dataset runner for DeepWordBug attacks.
//!
//! Loads a dataset, builds the configured oracle, attacks every sample
//! concurrently, and reports per-sample outcomes with aggregate metrics.

pub mod config;
pub mod dataset;
pub mod http_oracle;
pub mod metrics;
pub mod report;
pub mod runner;
pub mod shutdown;

use std::path::Path;
use std::sync::Arc;
use tracing::info;
use wordbug_attack::LexiconOracle;
use wordbug_core::{Oracle, OracleConfig, OracleKind, Result};

use crate::http_oracle::HttpOracle;

/// Build the oracle named by the `oracle` config section.
///
/// # Errors
///
/// Returns a configuration error for an HTTP oracle without an endpoint,
/// or an I/O / serialization / configuration error for a bad lexicon file.
pub fn build_oracle(config: &OracleConfig) -> Result<Arc<dyn Oracle>> {
    config.validate()?;
    let oracle: Arc<dyn Oracle> = match config.kind {
        OracleKind::Lexicon => match &config.lexicon_path {
            Some(path) => {
                info!(path = %path, "Loading lexicon oracle");
                Arc::new(LexiconOracle::from_json_file(Path::new(path))?)
            }
            None => Arc::new(LexiconOracle::sentiment()),
        },
        OracleKind::Http => {
            let oracle = HttpOracle::from_config(config)?;
            info!(endpoint = %oracle.endpoint(), "Using HTTP oracle");
            Arc::new(oracle)
        }
    };
    Ok(oracle)
}
