//! 레짐 분류기.
//!
//! 피처 행 하나를 여섯 레짐 중 하나로 매핑하는 순수 함수입니다.
//! 규칙은 고정된 우선순위로 평가되며 먼저 일치한 규칙이 이깁니다.
//!
//! | 순위 | 조건 | 레짐 |
//! |------|------|------|
//! | 1 | 금리 급등, 또는 경기침체 + 상관 붕괴 | InflationShock |
//! | 2 | 추세 하락 + VIX 경기침체 수준, 또는 경기침체 단독 | DeflationRecession |
//! | 3 | VIX 패닉 수준 | ExtremeAccumulation |
//! | 4 | 추세 하락 | CautiousTrend |
//! | 5 | VIX 경계 수준 | CautiousVolatility |
//! | 6 | 그 외 | Neutral |

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use regime_core::{ClassifierThresholds, FeatureRow, FeatureTable, Regime};

/// 분류에 쓰인 개별 조건.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Trigger {
    /// 장기 금리 급등
    RateShock,
    /// Sahm 경기침체 신호
    Recession,
    /// 주식/채권 상관 붕괴
    CorrelationBroken,
    /// 대표 성장 자산 추세 하락
    TrendDown,
    /// VIX 경기침체 수준 초과
    VixRecession,
    /// VIX 패닉 수준 초과
    VixPanic,
    /// VIX 경계 수준 초과
    VixElevated,
}

impl Trigger {
    /// 레이블 (직렬화 토큰과 동일)
    pub fn label(self) -> &'static str {
        match self {
            Self::RateShock => "RATE_SHOCK",
            Self::Recession => "RECESSION",
            Self::CorrelationBroken => "CORRELATION_BROKEN",
            Self::TrendDown => "TREND_DOWN",
            Self::VixRecession => "VIX_RECESSION",
            Self::VixPanic => "VIX_PANIC",
            Self::VixElevated => "VIX_ELEVATED",
        }
    }

    /// 설명 문자열
    pub fn description(self) -> &'static str {
        match self {
            Self::RateShock => "장기 금리 급등",
            Self::Recession => "Sahm 경기침체 신호",
            Self::CorrelationBroken => "주식/채권 상관 붕괴",
            Self::TrendDown => "성장 자산 장기 추세 하회",
            Self::VixRecession => "VIX 경기침체 수준",
            Self::VixPanic => "VIX 패닉 수준",
            Self::VixElevated => "VIX 경계 수준",
        }
    }
}

/// 분류 결과와 발동된 조건 목록.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    pub date: NaiveDate,
    pub regime: Regime,
    pub triggers: Vec<Trigger>,
}

/// 우선순위 규칙 기반 레짐 분류기.
#[derive(Debug, Clone, Default)]
pub struct RegimeClassifier {
    thresholds: ClassifierThresholds,
}

/// 행 하나에서 평가한 불리언 신호들.
#[derive(Debug, Clone, Copy)]
struct Signals {
    rate_shock: bool,
    recession: bool,
    correlation_broken: bool,
    trend_down: bool,
    vix_recession: bool,
    vix_panic: bool,
    vix_elevated: bool,
}

impl RegimeClassifier {
    /// 새 분류기를 생성합니다.
    pub fn new(thresholds: ClassifierThresholds) -> Self {
        Self { thresholds }
    }

    /// 사용 중인 임계값
    pub fn thresholds(&self) -> &ClassifierThresholds {
        &self.thresholds
    }

    fn signals(&self, row: &FeatureRow) -> Signals {
        let t = &self.thresholds;
        Signals {
            rate_shock: row.yield_roc > t.rate_shock_roc,
            recession: row.sahm_gap >= t.sahm_recession,
            correlation_broken: row.stock_bond_correlation > t.correlation_broken,
            trend_down: row.trend_down(),
            vix_recession: row.vix > t.vix_recession,
            vix_panic: row.vix > t.vix_panic,
            vix_elevated: row.vix > t.vix_elevated,
        }
    }

    /// 피처 행을 레짐으로 분류합니다.
    pub fn classify(&self, row: &FeatureRow) -> Regime {
        let s = self.signals(row);

        if s.rate_shock || (s.recession && s.correlation_broken) {
            Regime::InflationShock
        } else if (s.trend_down && s.vix_recession) || s.recession {
            Regime::DeflationRecession
        } else if s.vix_panic {
            Regime::ExtremeAccumulation
        } else if s.trend_down {
            Regime::CautiousTrend
        } else if s.vix_elevated {
            Regime::CautiousVolatility
        } else {
            Regime::Neutral
        }
    }

    /// 분류 결과와 함께 발동된 조건을 반환합니다.
    pub fn explain(&self, row: &FeatureRow) -> Classification {
        let s = self.signals(row);
        let triggers = [
            (s.rate_shock, Trigger::RateShock),
            (s.recession, Trigger::Recession),
            (s.correlation_broken, Trigger::CorrelationBroken),
            (s.trend_down, Trigger::TrendDown),
            (s.vix_recession, Trigger::VixRecession),
            (s.vix_panic, Trigger::VixPanic),
            (s.vix_elevated, Trigger::VixElevated),
        ]
        .into_iter()
        .filter_map(|(on, trigger)| on.then_some(trigger))
        .collect();

        Classification {
            date: row.date,
            regime: self.classify(row),
            triggers,
        }
    }

    /// 테이블 전체를 분류합니다.
    pub fn classify_table(&self, table: &FeatureTable) -> Vec<(NaiveDate, Regime)> {
        table
            .rows()
            .iter()
            .map(|row| (row.date, self.classify(row)))
            .collect()
    }
}
