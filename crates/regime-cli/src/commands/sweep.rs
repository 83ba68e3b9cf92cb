//! 거래 비용 스윕 명령어.
//!
//! ```bash
//! regime sweep --prices data/prices.csv --features data/features.csv --cost-bps 0,5,10,25,50
//! ```

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use chrono::NaiveDate;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use regime_analytics::{run_sweep, StrategySpec, SweepCase, SweepOutcome};
use regime_core::EngineConfig;

use crate::commands::load_backtest_data;

/// 스윕 CLI 설정
#[derive(Debug, Clone)]
pub struct SweepCliConfig {
    pub prices_path: PathBuf,
    pub features_path: PathBuf,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    /// 전략 키 (`dynamic`, `spy`, `qqq`, `60-40`)
    pub strategy: String,
    /// 거래 비용 목록 (bp)
    pub costs_bps: Vec<f64>,
}

/// 비용별로 백테스트를 병렬 실행하고 결과표를 출력합니다.
pub async fn run_cost_sweep(engine: EngineConfig, config: SweepCliConfig) -> Result<Vec<SweepOutcome>> {
    let data = Arc::new(load_backtest_data(
        &config.prices_path,
        &config.features_path,
        config.start_date,
        config.end_date,
    )?);
    let strategy = StrategySpec::preset(&config.strategy)?;
    let cases = SweepCase::cost_grid(&engine, &config.costs_bps);

    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} [{elapsed_precise}] {msg}")?);
    pb.enable_steady_tick(Duration::from_millis(120));
    pb.set_message(format!("{} 케이스 실행 중...", cases.len()));

    let outcomes = run_sweep(data, strategy, cases).await;
    pb.finish_with_message("스윕 완료");

    let failed = outcomes.iter().filter(|o| o.result.is_err()).count();
    info!(cases = outcomes.len(), failed, "sweep finished");

    println!("\n{}", sweep_table(&outcomes));
    Ok(outcomes)
}

/// 스윕 결과표
pub fn sweep_table(outcomes: &[SweepOutcome]) -> String {
    let mut lines = vec![
        format!(
            "{:<14} {:>9} {:>8} {:>8} {:>9} {:>12}",
            "케이스", "총수익", "CAGR", "샤프", "MDD", "거래 비용"
        ),
        "═══════════════════════════════════════════════════════════════".to_string(),
    ];
    for outcome in outcomes {
        match &outcome.result {
            Ok(report) => {
                let m = &report.metrics;
                lines.push(format!(
                    "{:<14} {:>8.2}% {:>7.2}% {:>8.2} {:>8.2}% {:>12}",
                    outcome.label,
                    m.total_return * 100.0,
                    m.cagr * 100.0,
                    m.sharpe_ratio,
                    m.max_drawdown * 100.0,
                    report.trading_cost,
                ));
            }
            Err(e) => lines.push(format!("{:<14} 실패: {}", outcome.label, e)),
        }
    }
    lines.join("\n")
}
