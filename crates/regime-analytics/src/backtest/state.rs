//! 실행 단위 시뮬레이션 상태.
//!
//! 한 번의 백테스트 실행 안에서만 존재하며 실행 간에 공유되지 않습니다.
//!
//! - [`RegimeTracker`]: 레짐 확정 지연과 전환 평활
//! - [`RiskOverlay`]: 변동성 타게팅과 낙폭 손절

use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, info};

use regime_core::{
    Asset, BacktestConfig, Regime, RiskCategory, StopLossConfig, VolTargetConfig, WeightMap,
};

use crate::performance::metrics::{annualization, sample_std};

/// 날짜별 신호 상태.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalState {
    /// 아직 판단 없음 (첫날)
    NoSignal,
    /// 새 레짐 후보를 확인 중
    Confirming,
    /// 확정 레짐 유지
    Confirmed,
    /// 전환 평활 진행 중
    Transitioning,
}

impl SignalState {
    pub fn label(self) -> &'static str {
        match self {
            Self::NoSignal => "no_signal",
            Self::Confirming => "confirming",
            Self::Confirmed => "confirmed",
            Self::Transitioning => "transitioning",
        }
    }
}

impl fmt::Display for SignalState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

// ============================================================================
// 레짐 확정 / 전환
// ============================================================================

#[derive(Debug, Clone)]
struct Transition {
    origin: WeightMap,
    step: usize,
}

/// 하루치 확정 결과.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrackerStep {
    /// 확정 레짐
    pub confirmed: Regime,
    /// 오늘 확정 레짐이 바뀌었는지 (최초 확정 제외)
    pub switched: bool,
}

/// 레짐 확정 지연과 전환 평활 상태.
#[derive(Debug, Clone)]
pub struct RegimeTracker {
    confirmation_days: usize,
    accumulation_confirmation_days: usize,
    transition_days: usize,
    confirmed: Option<Regime>,
    pending: Option<(Regime, usize)>,
    transition: Option<Transition>,
    last_target: WeightMap,
    /// 확정 레짐으로 마지막에 계산한 평활 전 목표
    last_fresh: WeightMap,
}

impl RegimeTracker {
    pub fn new(config: &BacktestConfig) -> Self {
        Self {
            confirmation_days: config.confirmation_days,
            accumulation_confirmation_days: config.accumulation_confirmation_days,
            transition_days: config.transition_days,
            confirmed: None,
            pending: None,
            transition: None,
            last_target: WeightMap::empty(),
            last_fresh: WeightMap::empty(),
        }
    }

    /// 현재 확정 레짐
    pub fn confirmed(&self) -> Option<Regime> {
        self.confirmed
    }

    /// 후보 확인 중에는 직전 목표를 유지합니다.
    ///
    /// 확정되지 않은 후보 레짐의 피처로 다시 배분하지 않도록, 확인 중인
    /// 날은 마지막으로 계산한 평활 전 목표를 반환합니다.
    pub fn held_target(&self) -> Option<WeightMap> {
        self.pending.map(|_| self.last_fresh)
    }

    /// 레짐 후보 확인에 필요한 연속 일수
    fn required_days(&self, regime: Regime) -> usize {
        if regime.is_risk_on_override() {
            self.accumulation_confirmation_days
        } else {
            self.confirmation_days
        }
    }

    /// 하루치 원시 레짐을 관측합니다.
    ///
    /// 첫 관측은 평활 없이 바로 확정됩니다. 이후에는 같은 후보가
    /// 필요한 일수만큼 연속으로 관측되어야 전환하며, 확정 레짐으로
    /// 되돌아오면 후보 카운터가 초기화됩니다.
    pub fn observe(&mut self, raw: Regime) -> TrackerStep {
        let current = match self.confirmed {
            None => {
                self.confirmed = Some(raw);
                debug!(regime = %raw, "initial regime confirmed");
                return TrackerStep {
                    confirmed: raw,
                    switched: false,
                };
            }
            Some(current) => current,
        };

        if raw == current {
            self.pending = None;
            return TrackerStep {
                confirmed: current,
                switched: false,
            };
        }

        let count = match self.pending {
            Some((candidate, count)) if candidate == raw => count + 1,
            _ => 1,
        };

        if count >= self.required_days(raw) {
            self.confirmed = Some(raw);
            self.pending = None;
            if self.transition_days > 0 {
                self.transition = Some(Transition {
                    origin: self.last_target,
                    step: 0,
                });
            }
            debug!(from = %current, to = %raw, days = count, "regime switch confirmed");
            TrackerStep {
                confirmed: raw,
                switched: true,
            }
        } else {
            self.pending = Some((raw, count));
            TrackerStep {
                confirmed: current,
                switched: false,
            }
        }
    }

    /// 전환 중이면 직전 목표와 새 목표를 선형 보간합니다.
    ///
    /// 전환 k일째의 진행률은 `k / transition_days`이며, 마지막 날
    /// 새 목표에 도달하면 전환이 끝납니다. 반환값은 (목표, 전환 중 여부).
    pub fn blend(&mut self, fresh: WeightMap) -> (WeightMap, bool) {
        self.last_fresh = fresh;
        let transition_days = self.transition_days;
        let (target, active) = match self.transition.as_mut() {
            Some(transition) => {
                transition.step += 1;
                let progress = transition.step as f64 / transition_days as f64;
                let blended = WeightMap::blend(&transition.origin, &fresh, progress);
                if transition.step >= transition_days {
                    self.transition = None;
                    debug!("transition complete");
                }
                (blended, true)
            }
            None => (fresh, false),
        };
        self.last_target = target;
        (target, active)
    }

    /// 기록용 신호 상태
    pub fn state(&self, transitioning: bool) -> SignalState {
        if transitioning {
            SignalState::Transitioning
        } else if self.pending.is_some() {
            SignalState::Confirming
        } else if self.confirmed.is_some() {
            SignalState::Confirmed
        } else {
            SignalState::NoSignal
        }
    }
}

// ============================================================================
// 위험 오버레이
// ============================================================================

/// 변동성 타게팅과 낙폭 손절 상태.
///
/// 모든 입력은 판단 시점 이전(t-1까지)의 순수익률과 NAV입니다.
#[derive(Debug, Clone)]
pub struct RiskOverlay {
    vol_target: VolTargetConfig,
    stop_loss: StopLossConfig,
    returns: Vec<f64>,
    peak: f64,
    stop_active: bool,
}

impl RiskOverlay {
    pub fn new(config: &BacktestConfig, initial_nav: f64) -> Self {
        Self {
            vol_target: config.vol_target.clone(),
            stop_loss: config.stop_loss.clone(),
            returns: Vec::new(),
            peak: initial_nav,
            stop_active: false,
        }
    }

    /// 하루가 끝난 뒤 순수익률과 NAV를 기록합니다.
    pub fn record(&mut self, net_return: f64, nav: f64) {
        self.returns.push(net_return);
        self.peak = self.peak.max(nav);
    }

    /// 손절 모드 여부
    pub fn stop_active(&self) -> bool {
        self.stop_active
    }

    /// 실현 변동성 기반 위험 자산 배수.
    ///
    /// 기간이 다 차지 않으면 1, 실현 변동성이 0이면 최대 배수입니다.
    pub fn vol_scale(&self) -> f64 {
        let cfg = &self.vol_target;
        if !cfg.enabled || cfg.window < 2 || self.returns.len() < cfg.window {
            return 1.0;
        }
        let window = &self.returns[self.returns.len() - cfg.window..];
        let realized = sample_std(window) * annualization();
        if realized <= 0.0 {
            return cfg.max_scale;
        }
        (cfg.target / realized).clamp(cfg.min_scale, cfg.max_scale)
    }

    /// 현재 NAV의 고점 대비 낙폭 (양수)
    pub fn drawdown(&self, nav: f64) -> f64 {
        if self.peak <= 0.0 {
            return 0.0;
        }
        (1.0 - nav / self.peak).max(0.0)
    }

    /// 손절 모드를 갱신하고 적용할 축소 비율을 반환합니다.
    ///
    /// 진입 낙폭 이상에서 손절 모드에 들어가고, 해제 낙폭 미만으로
    /// 회복하면 해제합니다. 모드 중에는 낙폭 단계에 맞는 비율을 씁니다.
    pub fn update_stop(&mut self, nav: f64) -> Option<f64> {
        let cfg = &self.stop_loss;
        if !cfg.enabled {
            return None;
        }

        let drawdown = self.drawdown(nav);
        if self.stop_active {
            if drawdown < cfg.recovery_drawdown {
                self.stop_active = false;
                info!(drawdown_pct = drawdown * 100.0, "stop-loss released");
            }
        } else if drawdown >= cfg.trigger_drawdown {
            self.stop_active = true;
            info!(drawdown_pct = drawdown * 100.0, "stop-loss engaged");
        }

        self.stop_active.then(|| cfg.ratio_for(drawdown))
    }
}

/// 위험 자산(주식/원자재/대체)에 배수를 적용합니다.
pub fn scale_risk_assets(weights: &mut WeightMap, factor: f64) {
    for asset in Asset::ALL {
        if asset.category().is_risk_asset() {
            weights.scale(asset, factor);
        }
    }
}

/// 헤지/원자재를 제외한 모든 종목에 손절 비율을 적용합니다.
pub fn scale_for_stop_loss(weights: &mut WeightMap, ratio: f64) {
    for asset in Asset::ALL {
        if !matches!(
            asset.category(),
            RiskCategory::Hedge | RiskCategory::Commodity
        ) {
            weights.scale(asset, ratio);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tracker(transition_days: usize) -> RegimeTracker {
        RegimeTracker::new(&BacktestConfig::default().with_transition_days(transition_days))
    }

    #[test]
    fn test_first_observation_confirms_immediately() {
        let mut t = tracker(5);
        let step = t.observe(Regime::CautiousTrend);
        assert_eq!(step.confirmed, Regime::CautiousTrend);
        assert!(!step.switched);
        assert_eq!(t.state(false), SignalState::Confirmed);
    }

    #[test]
    fn test_switch_needs_consecutive_days() {
        let mut t = tracker(5);
        t.observe(Regime::Neutral);
        for _ in 0..4 {
            let step = t.observe(Regime::CautiousTrend);
            assert_eq!(step.confirmed, Regime::Neutral);
            assert_eq!(t.state(false), SignalState::Confirming);
        }
        let step = t.observe(Regime::CautiousTrend);
        assert!(step.switched);
        assert_eq!(step.confirmed, Regime::CautiousTrend);
    }

    #[test]
    fn test_revert_resets_counter() {
        let mut t = tracker(5);
        t.observe(Regime::Neutral);
        for _ in 0..4 {
            t.observe(Regime::CautiousTrend);
        }
        t.observe(Regime::Neutral);
        assert_eq!(t.state(false), SignalState::Confirmed);
        for _ in 0..4 {
            assert_eq!(t.observe(Regime::CautiousTrend).confirmed, Regime::Neutral);
        }
    }

    #[test]
    fn test_different_candidate_restarts_counter() {
        let mut t = tracker(5);
        t.observe(Regime::Neutral);
        for _ in 0..3 {
            t.observe(Regime::CautiousTrend);
        }
        for _ in 0..4 {
            assert_eq!(t.observe(Regime::CautiousVolatility).confirmed, Regime::Neutral);
        }
        assert!(t.observe(Regime::CautiousVolatility).switched);
    }

    #[test]
    fn test_accumulation_confirms_faster() {
        let mut t = tracker(5);
        t.observe(Regime::Neutral);
        assert!(!t.observe(Regime::ExtremeAccumulation).switched);
        assert!(t.observe(Regime::ExtremeAccumulation).switched);
    }

    #[test]
    fn test_blend_walks_linearly_to_new_target() {
        let old = WeightMap::from_pairs(&[(Asset::Iwy, 1.0)]);
        let new = WeightMap::from_pairs(&[(Asset::Tlt, 1.0)]);

        let mut t = RegimeTracker::new(
            &BacktestConfig::default()
                .with_confirmation_days(1, 1)
                .with_transition_days(4),
        );
        t.observe(Regime::Neutral);
        assert_eq!(t.blend(old), (old, false));

        assert!(t.observe(Regime::CautiousTrend).switched);
        let progress: Vec<f64> = (0..4)
            .map(|_| {
                let (target, active) = t.blend(new);
                assert!(active);
                target[Asset::Tlt]
            })
            .collect();
        assert_eq!(progress, vec![0.25, 0.5, 0.75, 1.0]);

        assert_eq!(t.blend(new), (new, false));
    }

    #[test]
    fn test_pending_candidate_holds_last_target() {
        let calm = WeightMap::from_pairs(&[(Asset::Iwy, 0.6), (Asset::Tlt, 0.4)]);
        let mut t = tracker(5);
        t.observe(Regime::Neutral);
        assert_eq!(t.held_target(), None);
        t.blend(calm);

        t.observe(Regime::ExtremeAccumulation);
        assert_eq!(t.held_target(), Some(calm));
        assert_eq!(t.blend(calm), (calm, false));

        t.observe(Regime::Neutral);
        assert_eq!(t.held_target(), None);
    }

    #[test]
    fn test_zero_transition_days_switches_directly() {
        let new = WeightMap::from_pairs(&[(Asset::Tlt, 1.0)]);
        let mut t = RegimeTracker::new(
            &BacktestConfig::default()
                .with_confirmation_days(1, 1)
                .with_transition_days(0),
        );
        t.observe(Regime::Neutral);
        t.observe(Regime::CautiousTrend);
        assert_eq!(t.blend(new), (new, false));
    }

    #[test]
    fn test_vol_scale_needs_full_window() {
        let config = BacktestConfig::default();
        let mut overlay = RiskOverlay::new(&config, 100.0);
        for _ in 0..config.vol_target.window - 1 {
            overlay.record(0.03, 100.0);
        }
        assert_eq!(overlay.vol_scale(), 1.0);
    }

    #[test]
    fn test_vol_scale_clamped() {
        let config = BacktestConfig::default();
        let mut overlay = RiskOverlay::new(&config, 100.0);
        for i in 0..config.vol_target.window {
            overlay.record(if i % 2 == 0 { 0.04 } else { -0.04 }, 100.0);
        }
        // 연율 변동성 ~65% → 0.10 / 0.65 는 최소 배수로 잘림
        assert_eq!(overlay.vol_scale(), config.vol_target.min_scale);
    }

    #[test]
    fn test_zero_realized_vol_uses_max_scale() {
        let config = BacktestConfig::default();
        let mut overlay = RiskOverlay::new(&config, 100.0);
        for _ in 0..config.vol_target.window {
            overlay.record(0.0, 100.0);
        }
        assert_eq!(overlay.vol_scale(), config.vol_target.max_scale);
    }

    #[test]
    fn test_stop_loss_hysteresis() {
        let config = BacktestConfig::default();
        let mut overlay = RiskOverlay::new(&config, 100.0);

        assert_eq!(overlay.update_stop(90.0), None);
        assert_eq!(overlay.update_stop(85.0), Some(0.7));
        assert_eq!(overlay.update_stop(75.0), Some(0.5));
        assert_eq!(overlay.update_stop(65.0), Some(0.3));
        // 해제 수준 위에서는 가장 완만한 단계 유지
        assert_eq!(overlay.update_stop(90.0), Some(0.7));
        assert_eq!(overlay.update_stop(93.0), None);
        assert!(!overlay.stop_active());
    }

    #[test]
    fn test_stop_loss_disabled() {
        let config = BacktestConfig::default().with_risk_overlays(false);
        let mut overlay = RiskOverlay::new(&config, 100.0);
        assert_eq!(overlay.update_stop(50.0), None);
    }

    #[test]
    fn test_scaling_targets_right_categories() {
        let mut weights = WeightMap::from_pairs(&[
            (Asset::Iwy, 0.4),
            (Asset::Tlt, 0.2),
            (Asset::Dbc, 0.2),
            (Asset::Wtmf, 0.2),
        ]);
        scale_for_stop_loss(&mut weights, 0.5);
        assert_eq!(weights[Asset::Iwy], 0.2);
        assert_eq!(weights[Asset::Tlt], 0.1);
        assert_eq!(weights[Asset::Dbc], 0.2);
        assert_eq!(weights[Asset::Wtmf], 0.2);

        scale_risk_assets(&mut weights, 0.5);
        assert_eq!(weights[Asset::Iwy], 0.1);
        assert_eq!(weights[Asset::Tlt], 0.1);
        assert_eq!(weights[Asset::Dbc], 0.1);
    }
}
