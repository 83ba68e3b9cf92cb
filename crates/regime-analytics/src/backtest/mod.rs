//! 백테스팅 모듈
//!
//! 과거 가격과 피처로 레짐 전략과 벤치마크를 일별 시뮬레이션합니다.
//!
//! # 주요 구성요소
//!
//! - [`BacktestData`]: 날짜가 맞춰진 가격/피처 입력
//! - [`BacktestEngine`]: 백테스트 실행 엔진
//! - [`BacktestReport`]: 백테스트 결과 리포트
//! - [`run_sweep`]: 여러 설정의 병렬 실행

pub mod data;
pub mod engine;
pub mod proxy;
pub mod report;
pub mod state;
pub mod sweep;

pub use data::BacktestData;
pub use engine::{BacktestEngine, StrategySpec};
pub use proxy::ProxyResolver;
pub use report::{AllocationRecord, BacktestReport};
pub use state::SignalState;
pub use sweep::{run_sweep, SweepCase, SweepOutcome};
