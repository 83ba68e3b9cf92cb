//! 백테스트 명령어.
//!
//! 피처/가격 CSV로 레짐 동적 배분 전략과 고정 비중 벤치마크를 비교합니다.
//!
//! # 사용 예시
//!
//! ```bash
//! # 기본 벤치마크(SPY, QQQ, 60/40)와 비교
//! regime backtest --prices data/prices.csv --features data/features.csv
//!
//! # 특정 기간, 일별 이력 저장
//! regime backtest --prices data/prices.csv --features data/features.csv \
//!     -f 2020-01-01 -t 2022-12-31 --history out/history.csv -o out/report.json
//! ```

use std::path::{Path, PathBuf};

use anyhow::{anyhow, Result};
use chrono::NaiveDate;
use tracing::info;

use regime_analytics::{BacktestEngine, BacktestReport, StrategySpec};
use regime_core::EngineConfig;

use crate::commands::load_backtest_data;
use crate::csv_io;

/// 기본 비교 대상
pub const DEFAULT_BENCHMARKS: [&str; 3] = ["spy", "qqq", "60-40"];

/// 백테스트 CLI 설정
#[derive(Debug, Clone)]
pub struct BacktestCliConfig {
    /// 가격 CSV
    pub prices_path: PathBuf,
    /// 피처 CSV
    pub features_path: PathBuf,
    /// 시작일 (옵션)
    pub start_date: Option<NaiveDate>,
    /// 종료일 (옵션)
    pub end_date: Option<NaiveDate>,
    /// 비교 벤치마크 프리셋 키
    pub benchmarks: Vec<String>,
    /// 동적 전략 일별 이력 CSV (옵션)
    pub history_path: Option<PathBuf>,
    /// 결과 저장 경로 (옵션, `.json`이면 JSON)
    pub output_path: Option<PathBuf>,
}

/// 전략 목록 구성: 동적 전략이 항상 첫 번째
fn strategies(benchmarks: &[String]) -> Result<Vec<StrategySpec>> {
    let mut list = vec![StrategySpec::Dynamic];
    for key in benchmarks {
        let spec = StrategySpec::preset(key)?;
        if !list.contains(&spec) {
            list.push(spec);
        }
    }
    Ok(list)
}

/// 백테스트 실행
pub async fn run_backtest(engine: EngineConfig, config: BacktestCliConfig) -> Result<Vec<BacktestReport>> {
    let data = load_backtest_data(
        &config.prices_path,
        &config.features_path,
        config.start_date,
        config.end_date,
    )?;
    let strategies = strategies(&config.benchmarks)?;
    info!(
        days = data.len(),
        strategies = strategies.len(),
        "running backtest"
    );

    let engine = BacktestEngine::new(engine)?;
    let reports = tokio::task::spawn_blocking(move || engine.run_all(&data, &strategies))
        .await
        .map_err(|e| anyhow!("백테스트 작업이 중단되었습니다: {}", e))??;

    for report in &reports {
        println!("\n{}", report.summary());
    }
    println!("\n{}", comparison_table(&reports));

    let dynamic = reports
        .first()
        .ok_or_else(|| anyhow!("백테스트 결과가 없습니다"))?;

    if let Some(attribution) = &dynamic.attribution {
        println!("\n레짐별 성과 ({})", dynamic.strategy);
        println!("───────────────────────────────────────");
        for stats in &attribution.stats {
            println!(
                "{:<22} {:>5} 일 | 평균 {:>7.3}% | 중앙값 {:>7.3}% | 누적 {:>8.2}%",
                stats.regime.label(),
                stats.days,
                stats.mean_return * 100.0,
                stats.median_return * 100.0,
                stats.cumulative_return * 100.0,
            );
        }
        println!("레짐 전환: {} 회", attribution.transitions.switches());
    }

    if let Some(path) = &config.history_path {
        csv_io::write_history(csv_io::create(path)?, &dynamic.history)?;
        info!(path = %path.display(), "history saved");
    }

    if let Some(path) = &config.output_path {
        save_reports(&reports, path)?;
        info!(path = %path.display(), "report saved");
    }

    Ok(reports)
}

/// 전략 비교표
pub fn comparison_table(reports: &[BacktestReport]) -> String {
    let mut lines = vec![
        format!(
            "{:<22} {:>9} {:>8} {:>8} {:>8} {:>9} {:>9}",
            "전략", "총수익", "CAGR", "샤프", "소르티노", "MDD", "회전율"
        ),
        "═══════════════════════════════════════════════════════════════════════════".to_string(),
    ];
    for report in reports {
        let m = &report.metrics;
        lines.push(format!(
            "{:<22} {:>8.2}% {:>7.2}% {:>8.2} {:>8.2} {:>8.2}% {:>9.2}",
            report.strategy,
            m.total_return * 100.0,
            m.cagr * 100.0,
            m.sharpe_ratio,
            m.sortino_ratio,
            m.max_drawdown * 100.0,
            report.total_turnover,
        ));
    }
    lines.join("\n")
}

fn save_reports(reports: &[BacktestReport], path: &Path) -> Result<()> {
    let content = if path.extension().is_some_and(|ext| ext == "json") {
        serde_json::to_string_pretty(reports)?
    } else {
        reports
            .iter()
            .map(BacktestReport::summary)
            .collect::<Vec<_>>()
            .join("\n\n")
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, content)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strategies_start_with_dynamic() {
        let keys: Vec<String> = DEFAULT_BENCHMARKS.iter().map(|s| s.to_string()).collect();
        let list = strategies(&keys).unwrap();
        assert_eq!(list.len(), 4);
        assert_eq!(list[0], StrategySpec::Dynamic);
        assert_eq!(list[1].name(), "S&P 500 (SPY)");
    }

    #[test]
    fn test_strategies_skip_duplicates() {
        let keys = vec!["spy".to_string(), "SPY".to_string(), "dynamic".to_string()];
        let list = strategies(&keys).unwrap();
        assert_eq!(list.len(), 2);
    }

    #[test]
    fn test_unknown_benchmark_rejected() {
        assert!(strategies(&["bitcoin".to_string()]).is_err());
    }
}
