//! CLI command tests
//!
//! Commands run against temp files with the embedded rules and no AI backend.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use clap::Parser;
use finsmart_core::config::DEFAULT_CONFIG;
use finsmart_core::{
    FallbackReason, MemoryStore, ParseSource, Priority, RecommendationSource, RecommendationType,
};
use tempfile::TempDir;

use crate::cli::{Cli, Commands, PromptsAction};
use crate::commands::{self, BatchOutcome};

const RECEIPT: &str = "INDOMARET CABANG SUDIRMAN\n\
12/03/2024 14:35\n\
Indomie Goreng 2 3.500 7.000\n\
Sabun Lifebuoy 1 4.500 4.500\n\
Kopi Kapal Api   Rp 12.000\n\
HARGA JUAL : 23.500\n\
VOUCHER : (3.500)\n\
TOTAL : 20.000\n\
TUNAI : 50.000\n\
KEMBALI : 30.000\n";

const STORE: &str = r#"{
  "users": {
    "u1": {
      "categories": [
        {"id": "salary", "name": "Gaji", "type": "income"},
        {"id": "food", "name": "Makanan", "type": "expense"},
        {"id": "drink", "name": "Minuman", "type": "expense"},
        {"id": "home", "name": "Rumah Tangga", "type": "expense"},
        {"id": "transport", "name": "Transportation", "type": "expense"}
      ],
      "transactions": [
        {"id": "t1", "amount": 10000000, "date": "2024-03-01", "categoryId": "salary"},
        {"id": "t2", "amount": 2500000, "date": "2024-03-05", "categoryId": "transport"},
        {"id": "t3", "amount": 500000, "date": "2024-03-10", "categoryId": "food"}
      ],
      "goals": [
        {"id": "laptop", "name": "Laptop", "targetAmount": 12000000, "currentAmount": 0,
         "targetDate": "2024-09-30"}
      ]
    }
  }
}"#;

struct Fixture {
    dir: TempDir,
}

impl Fixture {
    fn new() -> Self {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("rules.toml"), DEFAULT_CONFIG).unwrap();
        fs::write(dir.path().join("store.json"), STORE).unwrap();
        fs::write(dir.path().join("receipt.txt"), RECEIPT).unwrap();
        Self { dir }
    }

    fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    fn config(&self) -> PathBuf {
        self.path("rules.toml")
    }

    fn write(&self, name: &str, content: &str) -> PathBuf {
        let path = self.path(name);
        fs::write(&path, content).unwrap();
        path
    }
}

fn day(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

// ========== Argument Parsing Tests ==========

#[test]
fn test_parse_args_with_global_flags() {
    let cli = Cli::try_parse_from([
        "finsmart",
        "parse",
        "--file",
        "r.txt",
        "--user",
        "u1",
        "--today",
        "2024-03-30",
        "--config",
        "rules.toml",
        "-v",
    ])
    .unwrap();

    assert!(cli.verbose);
    assert_eq!(cli.config.as_deref(), Some(Path::new("rules.toml")));
    match cli.command {
        Commands::Parse {
            file,
            data,
            user,
            ocr,
            today,
            no_ai,
        } => {
            assert_eq!(file, PathBuf::from("r.txt"));
            assert!(data.is_none());
            assert_eq!(user, "u1");
            assert!(!ocr);
            assert_eq!(today, Some(day(2024, 3, 30)));
            assert!(!no_ai);
        }
        _ => panic!("expected parse command"),
    }
}

#[test]
fn test_user_defaults() {
    let cli = Cli::try_parse_from(["finsmart", "recommend", "--data", "s.json"]).unwrap();
    match cli.command {
        Commands::Recommend { user, window, .. } => {
            assert_eq!(user, "default");
            assert!(window.is_none());
        }
        _ => panic!("expected recommend command"),
    }
}

#[test]
fn test_invalid_date_rejected() {
    let result = Cli::try_parse_from([
        "finsmart", "insights", "--data", "s.json", "--today", "30/03/2024",
    ]);
    assert!(result.is_err());
}

#[test]
fn test_prompts_subcommand_optional() {
    let cli = Cli::try_parse_from(["finsmart", "prompts"]).unwrap();
    assert!(matches!(cli.command, Commands::Prompts { action: None }));

    let cli = Cli::try_parse_from(["finsmart", "prompts", "show", "parse_transactions"]).unwrap();
    match cli.command {
        Commands::Prompts {
            action: Some(PromptsAction::Show { id }),
        } => assert_eq!(id, "parse_transactions"),
        _ => panic!("expected prompts show"),
    }
}

#[test]
fn test_mime_for_extension() {
    assert_eq!(commands::mime_for(Path::new("r.PNG")), "image/png");
    assert_eq!(commands::mime_for(Path::new("r.jpeg")), "image/jpeg");
    assert_eq!(commands::mime_for(Path::new("r.webp")), "image/webp");
    assert_eq!(commands::mime_for(Path::new("r.txt")), "text/plain");
    assert_eq!(commands::mime_for(Path::new("receipt")), "text/plain");
}

// ========== Parse Command Tests ==========

#[tokio::test]
async fn test_run_parse_rule_based() {
    let fx = Fixture::new();
    let config = fx.config();
    let store = fx.path("store.json");

    let result = commands::run_parse(
        Some(config.as_path()),
        &fx.path("receipt.txt"),
        Some(store.as_path()),
        "u1",
        false,
        Some(day(2024, 3, 30)),
        true,
    )
    .await
    .unwrap();

    assert_eq!(result.source, ParseSource::RuleBased);
    assert_eq!(result.fallback, Some(FallbackReason::NotConfigured));
    assert_eq!(result.transactions.len(), 3);
    assert_eq!(result.receipt_total, Some(20_000));
    assert_eq!(result.receipt_date, Some(day(2024, 3, 12)));
}

#[tokio::test]
async fn test_run_parse_without_store_has_no_categories() {
    let fx = Fixture::new();
    let config = fx.config();

    let result = commands::run_parse(
        Some(config.as_path()),
        &fx.path("receipt.txt"),
        None,
        "u1",
        false,
        Some(day(2024, 3, 30)),
        true,
    )
    .await
    .unwrap();

    assert_eq!(result.transactions.len(), 3);
    assert!(result.transactions.iter().all(|t| t.category_id.is_none()));
}

#[tokio::test]
async fn test_run_parse_empty_file() {
    let fx = Fixture::new();
    let config = fx.config();
    let empty = fx.write("empty.txt", "   \n\n");

    let result = commands::run_parse(Some(config.as_path()), &empty, None, "u1", false, None, true)
        .await
        .unwrap();

    assert!(result.transactions.is_empty());
    assert_eq!(result.source, ParseSource::Empty);
}

#[tokio::test]
async fn test_run_parse_image_without_ocr_is_empty() {
    let fx = Fixture::new();
    let config = fx.config();
    let image = fx.write("receipt.png", "not really an image");

    let result = commands::run_parse(Some(config.as_path()), &image, None, "u1", false, None, true)
        .await
        .unwrap();

    assert!(result.transactions.is_empty());
}

#[tokio::test]
async fn test_run_parse_missing_file_errors() {
    let fx = Fixture::new();
    let config = fx.config();
    let result = commands::run_parse(
        Some(config.as_path()),
        &fx.path("missing.txt"),
        None,
        "u1",
        false,
        None,
        true,
    )
    .await;
    assert!(result.is_err());
}

// ========== Recommend / Insights Tests ==========

#[tokio::test]
async fn test_run_recommend_orders_by_priority() {
    let fx = Fixture::new();
    let config = fx.config();

    let report = commands::run_recommend(
        Some(config.as_path()),
        &fx.path("store.json"),
        "u1",
        Some(30),
        Some(day(2024, 3, 30)),
        true,
    )
    .await
    .unwrap();

    assert_eq!(report.source, RecommendationSource::Rules);
    assert_eq!(report.fallback, Some(FallbackReason::NotConfigured));
    let records = &report.records;
    assert!(!records.is_empty());
    assert_eq!(records[0].kind, RecommendationType::SpendingOptimization);
    assert_eq!(records[0].category.as_deref(), Some("Transportation"));
    assert_eq!(records[0].priority, Priority::High);
    assert!(records
        .windows(2)
        .all(|w| w[0].priority >= w[1].priority));
}

#[tokio::test]
async fn test_run_recommend_unknown_user_is_empty() {
    let fx = Fixture::new();
    let config = fx.config();
    let report = commands::run_recommend(
        Some(config.as_path()),
        &fx.path("store.json"),
        "nobody",
        None,
        Some(day(2024, 3, 30)),
        true,
    )
    .await
    .unwrap();
    assert!(report.records.is_empty());
}

#[tokio::test]
async fn test_run_recommend_zero_window_rejected() {
    let fx = Fixture::new();
    let config = fx.config();
    let result = commands::run_recommend(
        Some(config.as_path()),
        &fx.path("store.json"),
        "u1",
        Some(0),
        None,
        true,
    )
    .await;
    assert!(result.is_err());
}

#[tokio::test]
async fn test_run_insights_from_data() {
    let fx = Fixture::new();
    let config = fx.config();

    let report = commands::run_insights(
        Some(config.as_path()),
        &fx.path("store.json"),
        "u1",
        Some(day(2024, 3, 30)),
        true,
    )
    .await
    .unwrap();

    assert!(!report.insights.is_empty());
    assert!(report.insights.len() <= 3);
    assert_eq!(report.fallback, Some(FallbackReason::NotConfigured));
}

// ========== Batch Command Tests ==========

const BATCH: &str = r#"[
  {"amount": 1000000, "date": "2024-03-25", "categoryId": "salary",
   "goalAllocations": [{"goalId": "laptop", "amount": 400000}]},
  {"amount": 50000, "date": "2024-03-26", "categoryId": "food", "description": "Makan siang"}
]"#;

#[test]
fn test_run_batch_dry_run_writes_nothing() {
    let fx = Fixture::new();
    let store = fx.path("store.json");
    let items = fx.write("batch.json", BATCH);

    let outcome = commands::run_batch(&store, "u1", &items, true).unwrap();
    match outcome {
        BatchOutcome::DryRun { plan } => {
            assert_eq!(plan.transactions.len(), 2);
            assert_eq!(plan.total_amount(), 1_050_000);
            assert_eq!(plan.goal_increments.get("laptop"), Some(&400_000));
        }
        BatchOutcome::Applied { .. } => panic!("dry run applied"),
    }

    assert_eq!(fs::read_to_string(&store).unwrap(), STORE);
}

#[test]
fn test_run_batch_applies_and_saves() {
    let fx = Fixture::new();
    let store = fx.path("store.json");
    let items = fx.write("batch.json", BATCH);

    let outcome = commands::run_batch(&store, "u1", &items, false).unwrap();
    match outcome {
        BatchOutcome::Applied { created } => assert_eq!(created.len(), 2),
        BatchOutcome::DryRun { .. } => panic!("expected apply"),
    }

    let user = MemoryStore::open(&store).unwrap().user("u1").unwrap().unwrap();
    assert_eq!(user.transactions.len(), 5);
    assert_eq!(user.goals[0].current_amount, 400_000);
}

#[test]
fn test_run_batch_rejected_leaves_store() {
    let fx = Fixture::new();
    let store = fx.path("store.json");
    let items = fx.write(
        "batch.json",
        r#"[{"amount": 100000, "date": "2024-03-25",
             "goalAllocations": [{"goalId": "laptop", "amount": 150000}]}]"#,
    );

    assert!(commands::run_batch(&store, "u1", &items, false).is_err());
    assert_eq!(fs::read_to_string(&store).unwrap(), STORE);
}

#[test]
fn test_run_batch_malformed_file() {
    let fx = Fixture::new();
    let items = fx.write("batch.json", "{not json");
    assert!(commands::run_batch(&fx.path("store.json"), "u1", &items, true).is_err());
}

// ========== Config / Prompts Tests ==========

#[test]
fn test_cmd_config() {
    let fx = Fixture::new();
    let config = fx.config();
    assert!(commands::cmd_config(Some(config.as_path()), false).is_ok());
    assert!(commands::cmd_config(None, true).is_ok());
}

#[test]
fn test_cmd_config_invalid_file() {
    let fx = Fixture::new();
    let bad = fx.write("bad.toml", "[recommendations]\nwindow_days = 0\n");
    assert!(commands::cmd_config(Some(bad.as_path()), false).is_err());
}

#[test]
fn test_missing_config_file_is_error() {
    let fx = Fixture::new();
    let missing = fx.path("missing.toml");
    assert!(commands::cmd_config(Some(missing.as_path()), false).is_err());

    let err = commands::load_rules(Some(missing.as_path())).unwrap_err();
    assert!(format!("{:#}", err).contains("missing.toml"));
}

#[test]
fn test_cmd_prompts() {
    assert!(commands::cmd_prompts_list().is_ok());
    assert!(commands::cmd_prompts_show("parse_transactions").is_ok());
    assert!(commands::cmd_prompts_show("financial_insights").is_ok());
    assert!(commands::cmd_prompts_show("recommendations").is_ok());
    assert!(commands::cmd_prompts_show("nonexistent").is_err());
    assert!(commands::cmd_prompts_path().is_ok());
}
