//! 성과 분석 모듈
//!
//! 전략 NAV 시계열의 성과를 측정하고 레짐별로 나누어 분석합니다.
//!
//! # 모듈 구성
//!
//! - [`metrics`]: 성과 지표 계산 (CAGR, 샤프비율, 최대낙폭 등)
//! - [`attribution`]: 레짐별 수익 귀속 및 레짐 전이 행렬

pub mod attribution;
pub mod metrics;

pub use attribution::*;
pub use metrics::*;
