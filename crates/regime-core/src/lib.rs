//! # Regime Core
//!
//! 레짐 기반 자산배분 엔진의 핵심 도메인 모델 및 타입을 제공합니다.
//!
//! 이 크레이트는 시스템 전반에서 사용되는 기본 타입을 제공합니다:
//! - 자산 유니버스 및 고정 크기 비중 맵
//! - 시장 레짐 분류 값
//! - 피처 행(Feature Row) 및 가격 테이블
//! - 엔진 설정 관리
//! - 로깅 인프라
//! - 에러 타입

pub mod config;
pub mod domain;
pub mod error;
pub mod logging;

pub use config::*;
pub use domain::*;
pub use error::*;
pub use logging::*;
