//! 틸트 단계에 전달되는 연속/불리언 신호.

use serde::{Deserialize, Serialize};

use regime_core::{AssetMap, FeatureRow};

/// 배분 신호.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllocationSignals {
    /// 현재 VIX
    pub vix: f64,
    /// 최근 VIX 최고치
    pub vix_peak: f64,
    /// 장단기 금리차 (%p)
    pub yield_curve_spread: f64,
    /// Sahm 갭
    pub sahm_gap: f64,
    /// 주식/채권 상관계수
    pub stock_bond_correlation: f64,
    /// 12개월 모멘텀
    pub momentum_12m: f64,
    /// 종목별 이동평균 대비 괴리
    pub trend_gap: AssetMap<f64>,
    /// 종목별 추세 하회 여부
    pub below_trend: AssetMap<bool>,
    /// 추세 위 종목 비율
    pub breadth: f64,
    /// 원자재 추세 약세
    pub commodity_trend_weak: bool,
    /// 가치주 우위
    pub value_over_growth: bool,
}

impl From<&FeatureRow> for AllocationSignals {
    fn from(row: &FeatureRow) -> Self {
        Self {
            vix: row.vix,
            vix_peak: row.vix_peak,
            yield_curve_spread: row.yield_curve_spread,
            sahm_gap: row.sahm_gap,
            stock_bond_correlation: row.stock_bond_correlation,
            momentum_12m: row.momentum_12m,
            trend_gap: row.trend_gap,
            below_trend: row.below_trend,
            breadth: row.breadth(),
            commodity_trend_weak: row.commodity_trend_weak,
            value_over_growth: row.value_over_growth,
        }
    }
}

impl Default for AllocationSignals {
    /// 어떤 틸트도 발동하지 않는 중립 신호
    fn default() -> Self {
        Self {
            vix: 15.0,
            vix_peak: 15.0,
            yield_curve_spread: 1.0,
            sahm_gap: 0.0,
            stock_bond_correlation: -0.2,
            momentum_12m: 0.05,
            trend_gap: AssetMap::filled(0.0),
            below_trend: AssetMap::filled(false),
            breadth: 1.0,
            commodity_trend_weak: false,
            value_over_growth: false,
        }
    }
}
