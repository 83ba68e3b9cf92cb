//! Regime - 거시/시장 레짐 분류 값.
//!
//! 분류기는 피처 행 하나를 아래 여섯 가지 레짐 중 하나로 매핑합니다.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::RegimeError;

/// 레짐 수
pub const REGIME_COUNT: usize = 6;

/// 거시/시장 레짐.
///
/// # 분류 우선순위 (먼저 일치하는 규칙이 이김)
///
/// 1. **InflationShock**: 금리 급등 또는 (경기침체 + 주식/채권 상관 붕괴)
/// 2. **DeflationRecession**: (추세 하락 + VIX 경기침체 수준) 또는 경기침체 단독
/// 3. **ExtremeAccumulation**: VIX 패닉 수준
/// 4. **CautiousTrend**: 추세 하락
/// 5. **CautiousVolatility**: VIX 경계 수준
/// 6. **Neutral**: 그 외
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[derive(Default)]
pub enum Regime {
    /// 인플레이션 쇼크
    InflationShock,
    /// 디플레이션 / 경기침체
    DeflationRecession,
    /// 극단적 공포 - 역발상 매집
    ExtremeAccumulation,
    /// 추세 하락 경계
    CautiousTrend,
    /// 변동성 경계
    CautiousVolatility,
    /// 중립
    #[default]
    Neutral,
}

impl Regime {
    /// 전체 레짐 (분류 우선순위 순)
    pub const ALL: [Regime; REGIME_COUNT] = [
        Regime::InflationShock,
        Regime::DeflationRecession,
        Regime::ExtremeAccumulation,
        Regime::CautiousTrend,
        Regime::CautiousVolatility,
        Regime::Neutral,
    ];

    /// 행렬/테이블 인덱스 (0..6)
    pub fn index(self) -> usize {
        self as usize
    }

    /// 분류 우선순위 (1이 가장 먼저 평가됨)
    pub fn priority(self) -> u8 {
        self.index() as u8 + 1
    }

    /// 방어적 운용이 필요한 레짐인지
    pub fn needs_caution(self) -> bool {
        !matches!(self, Self::Neutral | Self::ExtremeAccumulation)
    }

    /// 위험 자산 확대(오버라이드) 레짐인지
    pub fn is_risk_on_override(self) -> bool {
        self == Self::ExtremeAccumulation
    }

    /// 설명 문자열
    pub fn description(self) -> &'static str {
        match self {
            Self::InflationShock => "인플레이션 쇼크",
            Self::DeflationRecession => "디플레이션/경기침체",
            Self::ExtremeAccumulation => "극단적 공포 - 역발상 매집",
            Self::CautiousTrend => "추세 하락 경계",
            Self::CautiousVolatility => "변동성 경계",
            Self::Neutral => "중립",
        }
    }

    /// 레이블 (직렬화 토큰과 동일)
    pub fn label(self) -> &'static str {
        match self {
            Self::InflationShock => "INFLATION_SHOCK",
            Self::DeflationRecession => "DEFLATION_RECESSION",
            Self::ExtremeAccumulation => "EXTREME_ACCUMULATION",
            Self::CautiousTrend => "CAUTIOUS_TREND",
            Self::CautiousVolatility => "CAUTIOUS_VOLATILITY",
            Self::Neutral => "NEUTRAL",
        }
    }
}

impl fmt::Display for Regime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl FromStr for Regime {
    type Err = RegimeError;

    /// `INFLATION_SHOCK`, `inflation_shock`, `inflation-shock` 모두 허용합니다.
    /// 알 수 없는 토큰은 중립으로 대체하지 않고 에러를 반환합니다.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let token = s.trim().to_uppercase().replace('-', "_");
        Regime::ALL
            .into_iter()
            .find(|regime| regime.label() == token)
            .ok_or_else(|| RegimeError::InvalidRegime(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_priority_order() {
        assert_eq!(Regime::InflationShock.priority(), 1);
        assert_eq!(Regime::Neutral.priority(), 6);
        assert!(Regime::ExtremeAccumulation.priority() < Regime::CautiousTrend.priority());
    }

    #[test]
    fn test_from_str_accepts_variants() {
        assert_eq!(
            "extreme-accumulation".parse::<Regime>().unwrap(),
            Regime::ExtremeAccumulation
        );
        assert_eq!("NEUTRAL".parse::<Regime>().unwrap(), Regime::Neutral);
        assert_eq!(
            "bull_market".parse::<Regime>(),
            Err(RegimeError::InvalidRegime("bull_market".to_string()))
        );
    }

    #[test]
    fn test_serde_token_matches_display() {
        for regime in Regime::ALL {
            let json = serde_json::to_string(&regime).unwrap();
            assert_eq!(json, format!("\"{}\"", regime));
        }
    }

    #[test]
    fn test_caution_flags() {
        assert!(Regime::CautiousTrend.needs_caution());
        assert!(!Regime::Neutral.needs_caution());
        assert!(Regime::ExtremeAccumulation.is_risk_on_override());
    }
}
