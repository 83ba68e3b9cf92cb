//! 저장소의 기본 설정 파일 로드 테스트.

use std::path::PathBuf;

use regime_core::{AppConfig, EngineConfig, LogConfig, LogFormat, RebalanceFrequency};

fn default_config_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../config/default.toml")
}

#[test]
fn test_default_file_matches_builtin_defaults() {
    let app = AppConfig::load(default_config_path()).unwrap();
    assert_eq!(app.engine, EngineConfig::default());
    assert_eq!(app.logging.level, "info");
    assert_eq!(app.engine.backtest.rebalance_frequency, RebalanceFrequency::Monthly);
    assert_eq!(app.engine.backtest.stop_loss.stages.len(), 3);
}

#[test]
fn test_logging_section_maps_to_log_config() {
    let app = AppConfig::from_toml_str(
        r#"
        [logging]
        level = "warn"
        format = "compact"
        "#,
    )
    .unwrap();
    let log = LogConfig::from(&app.logging);
    assert_eq!(log.level, "warn");
    assert_eq!(log.format, LogFormat::Compact);
}

#[test]
fn test_missing_file_is_config_error() {
    let err = AppConfig::load("does/not/exist.toml").unwrap_err();
    assert!(!err.is_validation());
}
