//! 레짐 엔진의 에러 타입.
//!
//! 입력 검증, 분류, 배분, 시뮬레이션, 성과 분석 전반에서 사용되는
//! 에러를 정의합니다. 모든 에러는 문제가 된 날짜/필드/값을 담습니다.

use chrono::NaiveDate;
use thiserror::Error;

/// 레짐 엔진 에러.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RegimeError {
    /// 피처 행에 필수 필드가 없음
    #[error("피처 누락: {date} 의 '{field}' 값이 없습니다")]
    MissingFeature { date: NaiveDate, field: String },

    /// 피처 값이 유한한 수가 아님
    #[error("잘못된 피처 값: {date} 의 '{field}' = {value}")]
    InvalidFeature {
        date: NaiveDate,
        field: String,
        value: f64,
    },

    /// 알 수 없는 레짐 토큰
    #[error("알 수 없는 레짐: {0}")]
    InvalidRegime(String),

    /// 계산에 필요한 데이터 부족
    #[error("데이터 부족: 최소 {required}개 필요, 실제 {actual}개")]
    InsufficientData { required: usize, actual: usize },

    /// 날짜가 엄격하게 증가하지 않음
    #[error("날짜 순서 오류: 인덱스 {index} 에서 {previous} 다음에 {current}")]
    NonMonotonicDates {
        index: usize,
        previous: NaiveDate,
        current: NaiveDate,
    },

    /// 입력 테이블 정렬 불일치
    #[error("입력 정렬 불일치: {0}")]
    MisalignedInput(String),

    /// 필요한 가격이 없음
    #[error("가격 누락: {date} 의 {asset} 가격이 없습니다")]
    MissingPrice { date: NaiveDate, asset: String },

    /// 가격이 양의 유한수가 아님
    #[error("잘못된 가격: {date} 의 {asset} = {value}")]
    InvalidPrice {
        date: NaiveDate,
        asset: String,
        value: f64,
    },

    /// NAV 값이 양의 유한수가 아님
    #[error("잘못된 NAV: {date} = {value}")]
    InvalidNav { date: NaiveDate, value: f64 },

    /// 설정 에러
    #[error("설정 에러: {0}")]
    Config(String),

    /// 직렬화 에러
    #[error("직렬화 에러: {0}")]
    Serialization(String),

    /// 내부 에러
    #[error("내부 에러: {0}")]
    Internal(String),
}

/// 레짐 엔진 작업을 위한 Result 타입.
pub type RegimeResult<T> = Result<T, RegimeError>;

impl RegimeError {
    /// 입력 데이터 검증 실패인지 확인합니다.
    ///
    /// 호스트는 이 경우 입력을 고쳐 다시 실행해야 하며,
    /// 설정/직렬화 에러와 구분해서 보고합니다.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            RegimeError::MissingFeature { .. }
                | RegimeError::InvalidFeature { .. }
                | RegimeError::InsufficientData { .. }
                | RegimeError::NonMonotonicDates { .. }
                | RegimeError::MisalignedInput(_)
                | RegimeError::MissingPrice { .. }
                | RegimeError::InvalidPrice { .. }
                | RegimeError::InvalidNav { .. }
        )
    }

    /// 문제가 된 날짜 (있는 경우).
    pub fn date(&self) -> Option<NaiveDate> {
        match self {
            RegimeError::MissingFeature { date, .. }
            | RegimeError::InvalidFeature { date, .. }
            | RegimeError::MissingPrice { date, .. }
            | RegimeError::InvalidPrice { date, .. }
            | RegimeError::InvalidNav { date, .. } => Some(*date),
            RegimeError::NonMonotonicDates { current, .. } => Some(*current),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for RegimeError {
    fn from(err: serde_json::Error) -> Self {
        RegimeError::Serialization(err.to_string())
    }
}

impl From<config::ConfigError> for RegimeError {
    fn from(err: config::ConfigError) -> Self {
        RegimeError::Config(err.to_string())
    }
}
