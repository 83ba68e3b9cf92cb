//! 파라미터 스윕.
//!
//! 같은 데이터와 전략을 여러 설정으로 동시에 실행합니다. 백테스트는
//! CPU 작업이므로 각 케이스를 `spawn_blocking`으로 blocking thread pool에서
//! 실행하고 `join_all`로 모읍니다. 실행 간 공유 가변 상태는 없습니다.

use std::sync::Arc;

use futures::future::join_all;
use tracing::{info, warn};

use regime_core::{EngineConfig, RegimeError, RegimeResult};

use super::data::BacktestData;
use super::engine::{BacktestEngine, StrategySpec};
use super::report::BacktestReport;

/// 스윕 케이스 하나.
#[derive(Debug, Clone)]
pub struct SweepCase {
    /// 결과 표시용 이름
    pub label: String,
    /// 엔진 설정
    pub config: EngineConfig,
}

impl SweepCase {
    pub fn new(label: impl Into<String>, config: EngineConfig) -> Self {
        Self {
            label: label.into(),
            config,
        }
    }

    /// 거래 비용(bp)만 바꾼 케이스 목록.
    pub fn cost_grid(base: &EngineConfig, costs_bps: &[f64]) -> Vec<Self> {
        costs_bps
            .iter()
            .map(|&bps| {
                let mut config = base.clone();
                config.backtest.cost_bps = bps;
                Self::new(format!("cost {}bp", bps), config)
            })
            .collect()
    }
}

/// 케이스별 실행 결과. 한 케이스의 실패가 다른 케이스를 막지 않습니다.
#[derive(Debug)]
pub struct SweepOutcome {
    pub label: String,
    pub result: RegimeResult<BacktestReport>,
}

/// 모든 케이스를 병렬 실행합니다. 결과는 입력 순서를 유지합니다.
pub async fn run_sweep(
    data: Arc<BacktestData>,
    strategy: StrategySpec,
    cases: Vec<SweepCase>,
) -> Vec<SweepOutcome> {
    info!(cases = cases.len(), strategy = strategy.name(), "sweep started");

    let tasks = cases.into_iter().map(|case| {
        let data = Arc::clone(&data);
        let strategy = strategy.clone();
        async move {
            let label = case.label;
            let config = case.config;
            let result = tokio::task::spawn_blocking(move || {
                BacktestEngine::new(config)?.run(&data, &strategy)
            })
            .await
            .map_err(|e| RegimeError::Internal(format!("스윕 태스크 실행 실패: {}", e)))
            .and_then(|result| result);

            if let Err(e) = &result {
                warn!(case = %label, error = %e, "sweep case failed");
            }
            SweepOutcome { label, result }
        }
    });

    let outcomes = join_all(tasks).await;
    info!(
        succeeded = outcomes.iter().filter(|o| o.result.is_ok()).count(),
        "sweep finished"
    );
    outcomes
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cost_grid_only_changes_cost() {
        let base = EngineConfig::default();
        let cases = SweepCase::cost_grid(&base, &[0.0, 10.0, 50.0]);

        assert_eq!(cases.len(), 3);
        assert_eq!(cases[2].label, "cost 50bp");
        assert_eq!(cases[2].config.backtest.cost_bps, 50.0);
        assert_eq!(cases[2].config.classifier, base.classifier);
        assert_eq!(
            cases[0].config.backtest.confirmation_days,
            base.backtest.confirmation_days
        );
    }
}
