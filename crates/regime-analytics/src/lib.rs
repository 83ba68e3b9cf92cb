//! 피처 추출, 백테스팅 및 성과 분석.
//!
//! 이 크레이트는 다음을 제공합니다:
//! - 가격/거시 시계열로부터 피처 테이블 생성
//! - 레짐 전략과 고정 비중 벤치마크의 일별 백테스트
//! - 성과 지표, 레짐별 귀속 분석, 레짐 전이 행렬
//! - 월별/연도별 수익률, 낙폭 시계열, 상관행렬
//!
//! # Re-exports
//!
//! - [`backtest`]: 백테스트 엔진 (BacktestEngine, BacktestReport 등)
//! - [`performance`]: 성과 지표 (PerformanceAnalyzer, PerformanceMetrics 등)
//! - [`portfolio`]: 기간별 수익률과 낙폭 시계열

pub mod backtest;
pub mod correlation;
pub mod features;
pub mod performance;
pub mod portfolio;

// Backtest 모듈 re-exports
pub use backtest::{
    run_sweep, AllocationRecord, BacktestData, BacktestEngine, BacktestReport, ProxyResolver,
    SignalState, StrategySpec, SweepCase, SweepOutcome,
};

// Performance 모듈 re-exports
pub use performance::{
    NavPoint, PerformanceAnalyzer, PerformanceMetrics, RegimeAttribution, RegimeStats,
    TransitionMatrix, DEFAULT_RISK_FREE_RATE, TRADING_DAYS_PER_YEAR,
};

// Portfolio 모듈 re-exports
pub use portfolio::{
    drawdown_series, monthly_returns, yearly_returns, DrawdownPoint, MonthlyReturn, YearlyReturn,
};

pub use correlation::{calculate_correlation, correlation_matrix, prices_to_returns, CorrelationMatrix};
pub use features::{FeatureExtractor, MarketSeries};
