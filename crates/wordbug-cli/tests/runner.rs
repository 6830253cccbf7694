//! End-to-end dataset runs with the lexicon oracle.

use std::io::Write;
use std::sync::Arc;
use tempfile::NamedTempFile;
use wordbug_attack::{DeepWordBug, OracleStats};
use wordbug_cli::config::load_config;
use wordbug_cli::dataset::DatasetLoader;
use wordbug_cli::metrics::AttackSummary;
use wordbug_cli::report::AttackReport;
use wordbug_cli::runner::{AttackRunner, SampleOutcome};
use wordbug_cli::shutdown::ShutdownCoordinator;
use wordbug_cli::build_oracle;
use wordbug_core::{Oracle, WordbugConfig};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn write_file(contents: &str) -> NamedTempFile {
    let mut f = NamedTempFile::new().unwrap();
    f.write_all(contents.as_bytes()).unwrap();
    f
}

const REVIEWS: &str = r#"{"id": "r1", "text": "The movie was bad", "label": "negative"}
{"id": "r2", "text": "A great and charming film", "label": "positive"}
{"id": "r3", "text": "Awful", "label": "positive"}
{"id": "r4", "text": "", "label": 1}
"#;

async fn run(config: &WordbugConfig, dataset: &str) -> AttackReport {
    let samples = DatasetLoader::load_from_str(dataset).unwrap();
    let oracle = Arc::new(OracleStats::new(build_oracle(&config.oracle).unwrap()));
    let runner = AttackRunner::new(
        DeepWordBug::build(&config.recipe).unwrap(),
        Arc::clone(&oracle) as Arc<dyn Oracle>,
        config,
        ShutdownCoordinator::new(),
    );
    let records = runner.run(samples).await;
    AttackReport::new(oracle.name(), &config.recipe, oracle.stats(), records)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_dataset_run_summary() {
    let report = run(&WordbugConfig::default(), REVIEWS).await;
    let summary: &AttackSummary = &report.summary;

    assert_eq!(report.samples.len(), 4);
    assert_eq!(summary.total(), 4);
    // r3 is negative per the lexicon but labelled positive.
    assert_eq!(summary.skipped, 1);
    assert!(matches!(
        report.samples[2].outcome,
        SampleOutcome::Skipped { .. }
    ));
    assert_eq!(summary.successful + summary.failed, 3);
    assert_eq!(summary.errored, 0);

    let r1 = report.samples[0].attack_result().unwrap();
    assert!(r1.is_success());
    assert_eq!(r1.trail[0].position, 3);

    // The empty text has no words to perturb.
    let r4 = report.samples[3].attack_result().unwrap();
    assert!(!r4.is_success());
    assert_eq!(r4.queries, 1);
}

#[tokio::test]
async fn test_query_stats_match_record_queries() {
    let report = run(&WordbugConfig::default(), REVIEWS).await;
    let attacked: usize = report
        .samples
        .iter()
        .filter_map(|r| r.attack_result())
        .map(|r| r.queries)
        .sum();
    let skipped = report.summary.skipped;
    assert_eq!(report.query_stats.queries, attacked + skipped);
}

#[tokio::test]
async fn test_zero_budget_config_fails_everything() {
    let config_file = write_file("recipe:\n  max_edit_distance: 0\n");
    let config = load_config(config_file.path()).unwrap();
    let report = run(&config, REVIEWS).await;
    assert_eq!(report.summary.successful, 0);
    assert_eq!(report.summary.attack_success_rate, 0.0);
    for record in &report.samples {
        if let Some(result) = record.attack_result() {
            assert!(result.trail.is_empty());
            assert_eq!(result.perturbed_text, result.original_text);
        }
    }
}

#[tokio::test]
async fn test_custom_lexicon_from_config() {
    let lexicon = write_file(
        r#"{"labels": ["ham", "spam"], "bias": [0.2, 0.0], "weights": {"free": [-1.5, 1.5], "winner": [-1.5, 1.5]}}"#,
    );
    let config_file = write_file(&format!(
        "oracle:\n  kind: lexicon\n  lexicon_path: \"{}\"\n  labels: [ham, spam]\nrunner:\n  max_concurrent_attacks: 1\n",
        lexicon.path().display()
    ));
    let config = load_config(config_file.path()).unwrap();
    let report = run(
        &config,
        r#"[{"id": "m1", "text": "You are a winner", "label": "spam"}]"#,
    )
    .await;

    assert_eq!(report.oracle, "LexiconOracle");
    let result = report.samples[0].attack_result().unwrap();
    assert!(result.is_success());
    assert_eq!(result.trail[0].original_word, "winner");
    assert_eq!(config.oracle.label_name(result.final_label()), "ham");
}

#[tokio::test]
async fn test_report_file_contents() {
    let report = run(&WordbugConfig::default(), REVIEWS).await;
    let out = tempfile::tempdir().unwrap();
    let path = out.path().join("report.json");
    report.save(&path).unwrap();

    let json: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    let samples = json["samples"].as_array().unwrap();
    assert_eq!(samples.len(), 4);
    assert_eq!(samples[0]["sample_id"], "r1");
    assert_eq!(samples[0]["outcome"], "attacked");
    assert_eq!(samples[0]["status"], "success");
    assert_eq!(samples[2]["outcome"], "skipped");
    assert_eq!(json["summary"]["skipped"], 1);
}
