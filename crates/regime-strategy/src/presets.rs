//! 비교용 고정 비중 포트폴리오.
//!
//! 동적 전략과 같은 가격 데이터, 같은 시뮬레이터로 실행되는 벤치마크입니다.

use serde::{Deserialize, Serialize};

use regime_core::{Asset, RegimeError, RegimeResult, WeightMap};

/// 이름이 붙은 고정 비중 포트폴리오.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FixedPortfolio {
    /// 표시 이름
    pub name: String,
    /// 합계 1로 정규화된 비중
    pub weights: WeightMap,
}

impl FixedPortfolio {
    /// 비중을 정규화해 포트폴리오를 생성합니다.
    ///
    /// 비중 합계가 0이거나 음수 비중이 있으면 설정 에러입니다.
    pub fn new(name: impl Into<String>, weights: WeightMap) -> RegimeResult<Self> {
        let name = name.into();
        if weights.iter().any(|(_, w)| !w.is_finite() || w < 0.0) {
            return Err(RegimeError::Config(format!(
                "{}: 비중은 0 이상의 유한한 수여야 합니다",
                name
            )));
        }
        let weights = weights
            .normalized()
            .ok_or_else(|| RegimeError::Config(format!("{}: 비중 합계가 0입니다", name)))?;
        Ok(Self { name, weights })
    }

    fn single(name: &str, pairs: &[(Asset, f64)]) -> Self {
        Self {
            name: name.to_string(),
            weights: WeightMap::from_pairs(pairs),
        }
    }

    /// S&P 500 (SPY 100%)
    pub fn spy() -> Self {
        Self::single("S&P 500 (SPY)", &[(Asset::Spy, 1.0)])
    }

    /// Nasdaq 100 (QQQ 100%)
    pub fn qqq() -> Self {
        Self::single("Nasdaq 100 (QQQ)", &[(Asset::Qqq, 1.0)])
    }

    /// 60/40 (SPY 60% / TLT 40%)
    pub fn balanced_60_40() -> Self {
        Self::single("60/40 Balanced", &[(Asset::Spy, 0.6), (Asset::Tlt, 0.4)])
    }

    /// 프리셋 키로 조회합니다 (`spy`, `qqq`, `60-40`).
    pub fn preset(key: &str) -> RegimeResult<Self> {
        match key.trim().to_lowercase().as_str() {
            "spy" => Ok(Self::spy()),
            "qqq" => Ok(Self::qqq()),
            "60-40" | "60/40" | "balanced" => Ok(Self::balanced_60_40()),
            other => Err(RegimeError::Config(format!("알 수 없는 벤치마크: {}", other))),
        }
    }
}
