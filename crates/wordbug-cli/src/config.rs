//! YAML configuration loading for the attack runner.
//!
//! Loads [`WordbugConfig`] from a YAML file on disk, falling back to defaults
//! when no file is specified.

use std::path::{Path, PathBuf};
use tracing::info;
use wordbug_core::WordbugConfig;

/// Environment variable naming a config file when `--config` is absent.
pub const CONFIG_ENV_VAR: &str = "WORDBUG_CONFIG";

/// Load and validate a [`WordbugConfig`] from a YAML file at `path`.
///
/// # Errors
///
/// Returns an error if the file cannot be read, the YAML is invalid, or the
/// configuration fails validation.
pub fn load_config(path: &Path) -> anyhow::Result<WordbugConfig> {
    let contents = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("Failed to read config file {}: {}", path.display(), e))?;
    let config: WordbugConfig = serde_yaml::from_str(&contents)
        .map_err(|e| anyhow::anyhow!("Failed to parse config YAML: {}", e))?;
    config.validate()?;
    Ok(config)
}

/// Resolve the effective configuration: the `--config` flag, else
/// [`CONFIG_ENV_VAR`], else defaults.
///
/// # Errors
///
/// Returns an error if a config file was named but could not be loaded.
pub fn resolve_config(cli_path: Option<PathBuf>) -> anyhow::Result<WordbugConfig> {
    let path = cli_path.or_else(|| std::env::var(CONFIG_ENV_VAR).ok().map(PathBuf::from));
    match path {
        Some(path) => {
            info!(path = %path.display(), "Loading configuration from file");
            load_config(&path)
        }
        None => {
            info!("No config file specified, using defaults");
            Ok(WordbugConfig::default())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;
    use wordbug_core::{OracleKind, ProbeStrategy};

    /// Helper to write YAML to a temp file and return the path.
    fn write_yaml(yaml: &str) -> NamedTempFile {
        let mut f = NamedTempFile::new().unwrap();
        f.write_all(yaml.as_bytes()).unwrap();
        f
    }

    #[test]
    fn test_load_config_full() {
        let yaml = r#"
recipe:
  use_all_transformations: false
  max_edit_distance: 12
  seed: 99
  max_depth: 3
  probe:
    kind: delete
oracle:
  kind: http
  endpoint: "http://127.0.0.1:8000/classify"
  timeout_ms: 5000
  labels: ["neg", "pos"]
runner:
  max_concurrent_attacks: 8
"#;
        let f = write_yaml(yaml);
        let config = load_config(f.path()).unwrap();
        assert!(!config.recipe.use_all_transformations);
        assert_eq!(config.recipe.max_edit_distance, 12.0);
        assert_eq!(config.recipe.seed, 99);
        assert_eq!(config.recipe.max_depth, Some(3));
        assert_eq!(config.recipe.probe, ProbeStrategy::Delete);
        assert_eq!(config.oracle.kind, OracleKind::Http);
        assert_eq!(config.oracle.timeout_ms, 5000);
        assert_eq!(config.oracle.label_name(1), "pos");
        assert_eq!(config.runner.max_concurrent_attacks, 8);
    }

    #[test]
    fn test_load_config_partial_uses_defaults() {
        let f = write_yaml("recipe:\n  seed: 7\n");
        let config = load_config(f.path()).unwrap();
        assert_eq!(config.recipe.seed, 7);
        assert_eq!(config.recipe.max_edit_distance, 30.0);
        assert!(config.recipe.use_all_transformations);
        assert_eq!(config.oracle.kind, OracleKind::Lexicon);
        assert_eq!(config.runner.max_concurrent_attacks, 4);
    }

    #[test]
    fn test_load_config_rejects_negative_budget() {
        let f = write_yaml("recipe:\n  max_edit_distance: -1\n");
        assert!(load_config(f.path()).is_err());
    }

    #[test]
    fn test_load_config_rejects_http_without_endpoint() {
        let f = write_yaml("oracle:\n  kind: http\n");
        let err = load_config(f.path()).unwrap_err();
        assert!(err.to_string().contains("endpoint"));
    }

    #[test]
    fn test_load_config_missing_file() {
        let result = load_config(Path::new("/nonexistent/config.yaml"));
        assert!(result.is_err());
    }

    #[test]
    fn test_load_config_invalid_yaml() {
        let f = write_yaml("recipe: [not, a, map");
        assert!(load_config(f.path()).is_err());
    }

    #[test]
    fn test_resolve_config_prefers_cli_path() {
        let f = write_yaml("runner:\n  max_concurrent_attacks: 2\n");
        let config = resolve_config(Some(f.path().to_path_buf())).unwrap();
        assert_eq!(config.runner.max_concurrent_attacks, 2);
    }
}
