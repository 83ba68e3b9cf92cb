//! # Regime Strategy
//!
//! 레짐 분류기와 레짐 기반 자산배분 엔진입니다.
//!
//! - [`classifier`]: 피처 행 → 레짐 (우선순위 규칙)
//! - [`allocation`]: 레짐 + 신호 → 목표 비중 (기본 테이블 + 틸트 단계)
//! - [`presets`]: 비교용 고정 비중 포트폴리오

pub mod allocation;
pub mod classifier;
pub mod presets;

pub use allocation::{AllocationEngine, AllocationSignals, TiltPass};
pub use classifier::{Classification, RegimeClassifier, Trigger};
pub use presets::FixedPortfolio;
