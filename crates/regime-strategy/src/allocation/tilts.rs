//! 틸트 단계.
//!
//! 각 단계는 `WeightMap → WeightMap` 순수 변환이며 고정된 순서로 적용됩니다.
//! 단계는 이미 비중이 있는 종목들 사이, 또는 두 싱크(헤지, 채권)로만
//! 비중을 옮길 수 있고 총 비중을 늘리지 않습니다.

use regime_core::{AllocationParams, Asset, ClassifierThresholds, Regime, RiskCategory, WeightMap};

use super::signals::AllocationSignals;

/// 틸트 단계에 전달되는 읽기 전용 컨텍스트.
#[derive(Debug, Clone, Copy)]
pub struct TiltContext<'a> {
    pub regime: Regime,
    pub signals: &'a AllocationSignals,
    pub params: &'a AllocationParams,
    pub thresholds: &'a ClassifierThresholds,
}

/// 비중 조정 단계.
pub trait TiltPass: Send + Sync {
    /// 단계 이름 (로그용)
    fn name(&self) -> &'static str;

    /// 주어진 레짐에서 실행되는지 여부.
    ///
    /// 기본값은 극단적 공포 레짐에서 건너뛰는 것입니다.
    fn runs_in(&self, regime: Regime) -> bool {
        !regime.is_risk_on_override()
    }

    /// 비중을 조정합니다.
    fn apply(&self, weights: WeightMap, ctx: &TiltContext<'_>) -> WeightMap;
}

/// 대상이 싱크이거나 이미 보유 중일 때만 비율만큼 옮깁니다.
fn move_fraction(weights: &mut WeightMap, from: Asset, to: Asset, fraction: f64) {
    if to.is_sink() || weights.holds(to) {
        weights.shift_fraction(from, to, fraction);
    }
}

/// 보유 중인 특정 카테고리 종목들
fn held_where(weights: &WeightMap, pred: impl Fn(RiskCategory) -> bool) -> Vec<Asset> {
    weights
        .held()
        .filter(|(asset, _)| pred(asset.category()))
        .map(|(asset, _)| asset)
        .collect()
}

// ============================================================================
// 1. 추세 필터
// ============================================================================

/// 장기 이동평균 아래의 위험 자산 비중을 줄입니다.
///
/// 주식/대체 자산은 채권 싱크로, 원자재는 헤지 싱크로 이동합니다.
pub struct TrendFilter;

impl TiltPass for TrendFilter {
    fn name(&self) -> &'static str {
        "trend_filter"
    }

    fn apply(&self, mut weights: WeightMap, ctx: &TiltContext<'_>) -> WeightMap {
        for asset in held_where(&weights, RiskCategory::is_risk_asset) {
            if !ctx.signals.below_trend[asset] {
                continue;
            }
            let sink = if asset.category() == RiskCategory::Commodity {
                Asset::HEDGE_SINK
            } else {
                Asset::BOND_SINK
            };
            move_fraction(&mut weights, asset, sink, ctx.params.trend_cut);
        }
        weights
    }
}

// ============================================================================
// 2. 모멘텀
// ============================================================================

/// 12개월 모멘텀이 음수일 때 이동평균 아래의 성장주를 헤지로 옮깁니다.
pub struct MomentumTilt;

impl TiltPass for MomentumTilt {
    fn name(&self) -> &'static str {
        "momentum"
    }

    fn apply(&self, mut weights: WeightMap, ctx: &TiltContext<'_>) -> WeightMap {
        if ctx.signals.momentum_12m >= 0.0 {
            return weights;
        }
        for asset in held_where(&weights, |c| c == RiskCategory::EquityGrowth) {
            if ctx.signals.trend_gap[asset] < 0.0 {
                move_fraction(&mut weights, asset, Asset::HEDGE_SINK, ctx.params.momentum_cut);
            }
        }
        weights
    }
}

// ============================================================================
// 3. 금리 역전 (주식)
// ============================================================================

/// 장단기 금리가 역전되면 주식 일부를 채권 싱크로 옮깁니다.
pub struct YieldCurveEquityTilt;

impl TiltPass for YieldCurveEquityTilt {
    fn name(&self) -> &'static str {
        "yield_curve_equity"
    }

    fn apply(&self, mut weights: WeightMap, ctx: &TiltContext<'_>) -> WeightMap {
        if ctx.signals.yield_curve_spread >= 0.0 {
            return weights;
        }
        for asset in held_where(&weights, RiskCategory::is_equity) {
            move_fraction(&mut weights, asset, Asset::BOND_SINK, ctx.params.inversion_cut);
        }
        weights
    }
}

// ============================================================================
// 4. 경기침체 근접
// ============================================================================

/// Sahm 갭이 경계 수준과 경기침체 수준 사이에 있으면 비례해서 주식을 줄입니다.
pub struct RecessionGapTilt;

impl RecessionGapTilt {
    fn fraction(ctx: &TiltContext<'_>) -> f64 {
        let watch = ctx.params.sahm_watch;
        let span = ctx.thresholds.sahm_recession - watch;
        let progress = if span > 0.0 {
            (ctx.signals.sahm_gap - watch) / span
        } else if ctx.signals.sahm_gap >= watch {
            1.0
        } else {
            0.0
        };
        progress.clamp(0.0, 1.0) * ctx.params.recession_tilt_max
    }
}

impl TiltPass for RecessionGapTilt {
    fn name(&self) -> &'static str {
        "recession_gap"
    }

    fn apply(&self, mut weights: WeightMap, ctx: &TiltContext<'_>) -> WeightMap {
        let fraction = Self::fraction(ctx);
        if fraction <= 0.0 {
            return weights;
        }
        let target = if weights.holds(Asset::Tlt) {
            Asset::Tlt
        } else {
            Asset::BOND_SINK
        };
        for asset in held_where(&weights, RiskCategory::is_equity) {
            move_fraction(&mut weights, asset, target, fraction);
        }
        weights
    }
}

// ============================================================================
// 5. 주식/채권 상관
// ============================================================================

/// 주식/채권 상관이 양수면 장기채의 헤지 역할이 약해진 것으로 보고
/// 일부를 헤지 싱크로 옮깁니다.
pub struct CorrelationHedgeTilt;

impl TiltPass for CorrelationHedgeTilt {
    fn name(&self) -> &'static str {
        "correlation_hedge"
    }

    fn runs_in(&self, _regime: Regime) -> bool {
        true
    }

    fn apply(&self, mut weights: WeightMap, ctx: &TiltContext<'_>) -> WeightMap {
        let corr = ctx.signals.stock_bond_correlation;
        if corr > 0.0 {
            let fraction = corr.min(1.0) * ctx.params.correlation_hedge_scale;
            move_fraction(&mut weights, Asset::Tlt, Asset::HEDGE_SINK, fraction);
        }
        weights
    }
}

// ============================================================================
// 6. 채권 듀레이션
// ============================================================================

/// 커브 모양에 따라 장기채와 중기채 사이 비중을 조정합니다.
pub struct BondDurationTilt;

impl TiltPass for BondDurationTilt {
    fn name(&self) -> &'static str {
        "bond_duration"
    }

    fn runs_in(&self, _regime: Regime) -> bool {
        true
    }

    fn apply(&self, mut weights: WeightMap, ctx: &TiltContext<'_>) -> WeightMap {
        let spread = ctx.signals.yield_curve_spread;
        if spread < 0.0 {
            move_fraction(
                &mut weights,
                Asset::Tlt,
                Asset::BOND_SINK,
                ctx.params.inverted_duration_cut,
            );
        } else if spread > ctx.params.steep_curve {
            move_fraction(
                &mut weights,
                Asset::BOND_SINK,
                Asset::Tlt,
                ctx.params.steep_duration_shift,
            );
        }
        weights
    }
}

// ============================================================================
// 7. 원자재 추세
// ============================================================================

/// 원자재 바스켓 추세가 약하면 금(없으면 헤지)으로 옮깁니다.
pub struct CommodityTrendTilt;

impl TiltPass for CommodityTrendTilt {
    fn name(&self) -> &'static str {
        "commodity_trend"
    }

    fn runs_in(&self, _regime: Regime) -> bool {
        true
    }

    fn apply(&self, mut weights: WeightMap, ctx: &TiltContext<'_>) -> WeightMap {
        if ctx.signals.commodity_trend_weak && weights.holds(Asset::Dbc) {
            let target = if weights.holds(Asset::Gld) {
                Asset::Gld
            } else {
                Asset::HEDGE_SINK
            };
            move_fraction(&mut weights, Asset::Dbc, target, 1.0);
        }
        weights
    }
}

// ============================================================================
// 8. 가치/성장 스타일
// ============================================================================

/// 가치주가 성장주보다 강하면 나스닥 비중 일부를 가치주로 옮깁니다.
///
/// 대표 성장 자산은 건드리지 않습니다.
pub struct ValueGrowthTilt;

impl TiltPass for ValueGrowthTilt {
    fn name(&self) -> &'static str {
        "value_growth"
    }

    fn runs_in(&self, _regime: Regime) -> bool {
        true
    }

    fn apply(&self, mut weights: WeightMap, ctx: &TiltContext<'_>) -> WeightMap {
        if ctx.signals.value_over_growth {
            move_fraction(&mut weights, Asset::Qqq, Asset::Vtv, ctx.params.style_shift);
        }
        weights
    }
}

// ============================================================================
// 9. 최근 변동성 급등
// ============================================================================

/// 최근 VIX가 경기침체 수준을 넘었고 아직 경계 수준 위면 성장주를 줄입니다.
pub struct VolatilityPeakTilt;

impl TiltPass for VolatilityPeakTilt {
    fn name(&self) -> &'static str {
        "volatility_peak"
    }

    fn apply(&self, mut weights: WeightMap, ctx: &TiltContext<'_>) -> WeightMap {
        let s = ctx.signals;
        if s.vix_peak > ctx.thresholds.vix_recession && s.vix > ctx.thresholds.vix_elevated {
            for asset in held_where(&weights, |c| c == RiskCategory::EquityGrowth) {
                move_fraction(&mut weights, asset, Asset::HEDGE_SINK, ctx.params.vol_peak_cut);
            }
        }
        weights
    }
}

// ============================================================================
// 10. 시장 폭
// ============================================================================

/// 추세 위 종목 비율이 하한보다 낮으면 부족분에 비례해 주식을 줄입니다.
pub struct BreadthTilt;

impl TiltPass for BreadthTilt {
    fn name(&self) -> &'static str {
        "breadth"
    }

    fn apply(&self, mut weights: WeightMap, ctx: &TiltContext<'_>) -> WeightMap {
        let shortfall = ctx.params.breadth_floor - ctx.signals.breadth;
        if shortfall <= 0.0 {
            return weights;
        }
        let fraction = shortfall * ctx.params.breadth_scale;
        for asset in held_where(&weights, RiskCategory::is_equity) {
            move_fraction(&mut weights, asset, Asset::BOND_SINK, fraction);
        }
        weights
    }
}

// ============================================================================
// 11. 집중도 상한
// ============================================================================

/// 싱크가 아닌 단일 종목 비중을 상한으로 자릅니다.
pub struct ConcentrationCap;

impl TiltPass for ConcentrationCap {
    fn name(&self) -> &'static str {
        "concentration_cap"
    }

    fn apply(&self, mut weights: WeightMap, ctx: &TiltContext<'_>) -> WeightMap {
        let cap = ctx.params.max_single;
        for asset in Asset::ALL {
            let excess = weights[asset] - cap;
            if !asset.is_sink() && excess > 0.0 {
                weights.shift(asset, Asset::BOND_SINK, excess);
            }
        }
        weights
    }
}

// ============================================================================
// 12. 현금 버퍼
// ============================================================================

/// 경계 레짐에서 VIX가 경계 수준을 넘으면 전체 비중을 줄여 현금을 남깁니다.
pub struct CashBuffer;

impl TiltPass for CashBuffer {
    fn name(&self) -> &'static str {
        "cash_buffer"
    }

    fn apply(&self, mut weights: WeightMap, ctx: &TiltContext<'_>) -> WeightMap {
        if ctx.regime != Regime::Neutral && ctx.signals.vix > ctx.thresholds.vix_elevated {
            weights.scale_all(1.0 - ctx.params.cash_buffer);
        }
        weights
    }
}

/// 고정된 적용 순서의 전체 단계 목록.
pub fn default_passes() -> Vec<Box<dyn TiltPass>> {
    vec![
        Box::new(TrendFilter),
        Box::new(MomentumTilt),
        Box::new(YieldCurveEquityTilt),
        Box::new(RecessionGapTilt),
        Box::new(CorrelationHedgeTilt),
        Box::new(BondDurationTilt),
        Box::new(CommodityTrendTilt),
        Box::new(ValueGrowthTilt),
        Box::new(VolatilityPeakTilt),
        Box::new(BreadthTilt),
        Box::new(ConcentrationCap),
        Box::new(CashBuffer),
    ]
}
