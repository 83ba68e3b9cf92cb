//! 설정 관리.
//!
//! 엔진 전체 설정은 불변 [`EngineConfig`] 하나로 묶여 분류기, 배분 엔진,
//! 피처 추출기, 시뮬레이터에 참조로 전달됩니다. 실행 중에 바뀌지 않으며
//! 전역 상태에서 읽지 않습니다.

use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{RegimeError, RegimeResult};

/// 애플리케이션 설정.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AppConfig {
    /// 로깅 설정
    #[serde(default)]
    pub logging: LoggingConfig,
    /// 엔진 설정
    #[serde(default)]
    pub engine: EngineConfig,
}

/// 로깅 설정.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// 로그 레벨
    pub level: String,
    /// 로그 형식 (pretty, json, compact)
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

/// 엔진 설정 묶음.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct EngineConfig {
    /// 레짐 분류 임계값
    #[serde(default)]
    pub classifier: ClassifierThresholds,
    /// 틸트 단계 파라미터
    #[serde(default)]
    pub allocation: AllocationParams,
    /// 피처 추출 윈도우
    #[serde(default)]
    pub features: FeatureConfig,
    /// 백테스트 설정
    #[serde(default)]
    pub backtest: BacktestConfig,
}

impl EngineConfig {
    /// 전체 설정 검증
    pub fn validate(&self) -> RegimeResult<()> {
        self.classifier.validate()?;
        self.allocation.validate()?;
        self.features.validate()?;
        self.backtest.validate()
    }

    /// 백테스트 설정을 교체한 복사본
    pub fn with_backtest(mut self, backtest: BacktestConfig) -> Self {
        self.backtest = backtest;
        self
    }
}

fn config_error(message: impl Into<String>) -> RegimeError {
    RegimeError::Config(message.into())
}

fn ensure_fraction(name: &str, value: f64) -> RegimeResult<()> {
    if !(0.0..=1.0).contains(&value) {
        return Err(config_error(format!(
            "{}은(는) 0과 1 사이여야 합니다: {}",
            name, value
        )));
    }
    Ok(())
}

// ============================================================================
// 분류 임계값
// ============================================================================

/// 레짐 분류 임계값.
///
/// "초과"는 엄격한 `>` 비교이며, 경기침체 신호만 `>=` 로 판정합니다.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ClassifierThresholds {
    /// 금리 급등 판정 변화율
    #[serde(default = "default_rate_shock_roc")]
    pub rate_shock_roc: f64,
    /// 경기침체 판정 Sahm 갭
    #[serde(default = "default_sahm_recession")]
    pub sahm_recession: f64,
    /// 주식/채권 상관 붕괴 판정 상관계수
    #[serde(default = "default_correlation_broken")]
    pub correlation_broken: f64,
    /// 경기침체 수준 VIX
    #[serde(default = "default_vix_recession")]
    pub vix_recession: f64,
    /// 패닉 수준 VIX
    #[serde(default = "default_vix_panic")]
    pub vix_panic: f64,
    /// 경계 수준 VIX
    #[serde(default = "default_vix_elevated")]
    pub vix_elevated: f64,
}

fn default_rate_shock_roc() -> f64 {
    0.25
}
fn default_sahm_recession() -> f64 {
    0.50
}
fn default_correlation_broken() -> f64 {
    0.30
}
fn default_vix_recession() -> f64 {
    40.0
}
fn default_vix_panic() -> f64 {
    30.0
}
fn default_vix_elevated() -> f64 {
    20.0
}

impl Default for ClassifierThresholds {
    fn default() -> Self {
        Self {
            rate_shock_roc: default_rate_shock_roc(),
            sahm_recession: default_sahm_recession(),
            correlation_broken: default_correlation_broken(),
            vix_recession: default_vix_recession(),
            vix_panic: default_vix_panic(),
            vix_elevated: default_vix_elevated(),
        }
    }
}

impl ClassifierThresholds {
    /// 임계값 검증
    pub fn validate(&self) -> RegimeResult<()> {
        let all = [
            self.rate_shock_roc,
            self.sahm_recession,
            self.correlation_broken,
            self.vix_recession,
            self.vix_panic,
            self.vix_elevated,
        ];
        if all.iter().any(|v| !v.is_finite()) {
            return Err(config_error("분류 임계값은 유한한 수여야 합니다"));
        }
        if self.vix_elevated > self.vix_panic {
            return Err(config_error(format!(
                "VIX 경계 수준({})은 패닉 수준({}) 이하여야 합니다",
                self.vix_elevated, self.vix_panic
            )));
        }
        Ok(())
    }
}

// ============================================================================
// 틸트 파라미터
// ============================================================================

/// 배분 틸트 단계 파라미터.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct AllocationParams {
    /// 추세 하회 종목에서 덜어내는 비율
    #[serde(default = "default_trend_cut")]
    pub trend_cut: f64,
    /// 12개월 모멘텀 음수일 때 성장주에서 덜어내는 비율
    #[serde(default = "default_momentum_cut")]
    pub momentum_cut: f64,
    /// 장단기 금리 역전 시 주식에서 덜어내는 비율
    #[serde(default = "default_inversion_cut")]
    pub inversion_cut: f64,
    /// 경기침체 근접 경계 Sahm 갭 (이 값부터 틸트 시작)
    #[serde(default = "default_sahm_watch")]
    pub sahm_watch: f64,
    /// 경기침체 근접 틸트 최대 비율
    #[serde(default = "default_recession_tilt_max")]
    pub recession_tilt_max: f64,
    /// 양의 주식/채권 상관 시 장기채에서 헤지로 옮기는 배수
    #[serde(default = "default_correlation_hedge_scale")]
    pub correlation_hedge_scale: f64,
    /// 금리 역전 시 장기채 → 중기채 이동 비율
    #[serde(default = "default_inverted_duration_cut")]
    pub inverted_duration_cut: f64,
    /// 가파른 커브 판정 금리차 (%p)
    #[serde(default = "default_steep_curve")]
    pub steep_curve: f64,
    /// 가파른 커브에서 중기채 → 장기채 이동 비율
    #[serde(default = "default_steep_duration_shift")]
    pub steep_duration_shift: f64,
    /// 가치/성장 스타일 틸트 비율
    #[serde(default = "default_style_shift")]
    pub style_shift: f64,
    /// 최근 VIX 급등 후 성장주에서 덜어내는 비율
    #[serde(default = "default_vol_peak_cut")]
    pub vol_peak_cut: f64,
    /// 시장 폭 하한
    #[serde(default = "default_breadth_floor")]
    pub breadth_floor: f64,
    /// 시장 폭 부족분 대비 덜어내는 배수
    #[serde(default = "default_breadth_scale")]
    pub breadth_scale: f64,
    /// 싱크가 아닌 단일 종목 최대 비중
    #[serde(default = "default_max_single")]
    pub max_single: f64,
    /// 경계 레짐 현금 버퍼
    #[serde(default = "default_cash_buffer")]
    pub cash_buffer: f64,
}

fn default_trend_cut() -> f64 {
    0.5
}
fn default_momentum_cut() -> f64 {
    0.2
}
fn default_inversion_cut() -> f64 {
    0.1
}
fn default_sahm_watch() -> f64 {
    0.30
}
fn default_recession_tilt_max() -> f64 {
    0.15
}
fn default_correlation_hedge_scale() -> f64 {
    0.5
}
fn default_inverted_duration_cut() -> f64 {
    0.3
}
fn default_steep_curve() -> f64 {
    1.5
}
fn default_steep_duration_shift() -> f64 {
    0.2
}
fn default_style_shift() -> f64 {
    0.3
}
fn default_vol_peak_cut() -> f64 {
    0.15
}
fn default_breadth_floor() -> f64 {
    0.4
}
fn default_breadth_scale() -> f64 {
    0.5
}
fn default_max_single() -> f64 {
    0.40
}
fn default_cash_buffer() -> f64 {
    0.05
}

impl Default for AllocationParams {
    fn default() -> Self {
        Self {
            trend_cut: default_trend_cut(),
            momentum_cut: default_momentum_cut(),
            inversion_cut: default_inversion_cut(),
            sahm_watch: default_sahm_watch(),
            recession_tilt_max: default_recession_tilt_max(),
            correlation_hedge_scale: default_correlation_hedge_scale(),
            inverted_duration_cut: default_inverted_duration_cut(),
            steep_curve: default_steep_curve(),
            steep_duration_shift: default_steep_duration_shift(),
            style_shift: default_style_shift(),
            vol_peak_cut: default_vol_peak_cut(),
            breadth_floor: default_breadth_floor(),
            breadth_scale: default_breadth_scale(),
            max_single: default_max_single(),
            cash_buffer: default_cash_buffer(),
        }
    }
}

impl AllocationParams {
    /// 파라미터 검증
    pub fn validate(&self) -> RegimeResult<()> {
        ensure_fraction("trend_cut", self.trend_cut)?;
        ensure_fraction("momentum_cut", self.momentum_cut)?;
        ensure_fraction("inversion_cut", self.inversion_cut)?;
        ensure_fraction("recession_tilt_max", self.recession_tilt_max)?;
        ensure_fraction("correlation_hedge_scale", self.correlation_hedge_scale)?;
        ensure_fraction("inverted_duration_cut", self.inverted_duration_cut)?;
        ensure_fraction("steep_duration_shift", self.steep_duration_shift)?;
        ensure_fraction("style_shift", self.style_shift)?;
        ensure_fraction("vol_peak_cut", self.vol_peak_cut)?;
        ensure_fraction("breadth_floor", self.breadth_floor)?;
        ensure_fraction("breadth_scale", self.breadth_scale)?;
        ensure_fraction("max_single", self.max_single)?;
        ensure_fraction("cash_buffer", self.cash_buffer)?;
        if !self.sahm_watch.is_finite() || !self.steep_curve.is_finite() {
            return Err(config_error("sahm_watch/steep_curve는 유한한 수여야 합니다"));
        }
        Ok(())
    }
}

// ============================================================================
// 피처 윈도우
// ============================================================================

/// 피처 추출 윈도우 (거래일 기준).
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct FeatureConfig {
    /// 장기 이동평균 기간
    #[serde(default = "default_trend_window")]
    pub trend_window: usize,
    /// 모멘텀 기간 (12개월)
    #[serde(default = "default_momentum_window")]
    pub momentum_window: usize,
    /// 주식/채권 상관 기간
    #[serde(default = "default_correlation_window")]
    pub correlation_window: usize,
    /// 금리 변화율 기간
    #[serde(default = "default_yield_roc_window")]
    pub yield_roc_window: usize,
    /// VIX 최고치 탐색 기간
    #[serde(default = "default_vix_peak_window")]
    pub vix_peak_window: usize,
    /// Sahm 실업률 평균 기간 (3개월)
    #[serde(default = "default_sahm_average_window")]
    pub sahm_average_window: usize,
    /// Sahm 최저치 탐색 기간 (12개월)
    #[serde(default = "default_sahm_lookback")]
    pub sahm_lookback: usize,
    /// 가치/성장, 원자재 상대 수익률 기간
    #[serde(default = "default_relative_window")]
    pub relative_window: usize,
}

fn default_trend_window() -> usize {
    200
}
fn default_momentum_window() -> usize {
    252
}
fn default_correlation_window() -> usize {
    63
}
fn default_yield_roc_window() -> usize {
    126
}
fn default_vix_peak_window() -> usize {
    21
}
fn default_sahm_average_window() -> usize {
    63
}
fn default_sahm_lookback() -> usize {
    252
}
fn default_relative_window() -> usize {
    126
}

impl Default for FeatureConfig {
    fn default() -> Self {
        Self {
            trend_window: default_trend_window(),
            momentum_window: default_momentum_window(),
            correlation_window: default_correlation_window(),
            yield_roc_window: default_yield_roc_window(),
            vix_peak_window: default_vix_peak_window(),
            sahm_average_window: default_sahm_average_window(),
            sahm_lookback: default_sahm_lookback(),
            relative_window: default_relative_window(),
        }
    }
}

impl FeatureConfig {
    /// 모든 피처가 채워지기 위한 최소 선행 거래일 수
    pub fn warmup(&self) -> usize {
        [
            self.trend_window.saturating_sub(1),
            self.momentum_window,
            self.correlation_window,
            self.yield_roc_window,
            self.vix_peak_window.saturating_sub(1),
            self.sahm_average_window.saturating_sub(1) + self.sahm_lookback,
            self.relative_window,
        ]
        .into_iter()
        .max()
        .unwrap_or(0)
    }

    /// 윈도우 검증
    pub fn validate(&self) -> RegimeResult<()> {
        let windows = [
            ("trend_window", self.trend_window),
            ("momentum_window", self.momentum_window),
            ("correlation_window", self.correlation_window),
            ("yield_roc_window", self.yield_roc_window),
            ("vix_peak_window", self.vix_peak_window),
            ("sahm_average_window", self.sahm_average_window),
            ("sahm_lookback", self.sahm_lookback),
            ("relative_window", self.relative_window),
        ];
        for (name, value) in windows {
            if value == 0 {
                return Err(config_error(format!("{}은(는) 1 이상이어야 합니다", name)));
            }
        }
        if self.correlation_window < 2 {
            return Err(config_error("correlation_window는 2 이상이어야 합니다"));
        }
        Ok(())
    }
}

// ============================================================================
// 백테스트
// ============================================================================

/// 리밸런싱 주기.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RebalanceFrequency {
    /// 매 거래일
    Daily,
    /// ISO 주가 바뀌는 첫 거래일
    Weekly,
    /// 월이 바뀌는 첫 거래일
    #[default]
    Monthly,
    /// 분기가 바뀌는 첫 거래일
    Quarterly,
}

impl RebalanceFrequency {
    /// `previous` → `current` 사이에 주기 경계를 넘었는지 확인합니다.
    pub fn crosses_boundary(self, previous: NaiveDate, current: NaiveDate) -> bool {
        match self {
            Self::Daily => true,
            Self::Weekly => previous.iso_week() != current.iso_week(),
            Self::Monthly => (previous.year(), previous.month()) != (current.year(), current.month()),
            Self::Quarterly => {
                (previous.year(), previous.month0() / 3) != (current.year(), current.month0() / 3)
            }
        }
    }
}

impl std::str::FromStr for RebalanceFrequency {
    type Err = RegimeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "daily" | "d" => Ok(Self::Daily),
            "weekly" | "w" => Ok(Self::Weekly),
            "monthly" | "m" => Ok(Self::Monthly),
            "quarterly" | "q" => Ok(Self::Quarterly),
            _ => Err(config_error(format!("알 수 없는 리밸런싱 주기: {}", s))),
        }
    }
}

/// 변동성 타게팅 설정.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct VolTargetConfig {
    /// 활성화 여부
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// 목표 연율 변동성
    #[serde(default = "default_vol_target")]
    pub target: f64,
    /// 실현 변동성 계산 기간 (거래일)
    #[serde(default = "default_vol_window")]
    pub window: usize,
    /// 최소 배수
    #[serde(default = "default_vol_min_scale")]
    pub min_scale: f64,
    /// 최대 배수 (1 초과는 레버리지)
    #[serde(default = "default_vol_max_scale")]
    pub max_scale: f64,
}

fn default_true() -> bool {
    true
}
fn default_vol_target() -> f64 {
    0.10
}
fn default_vol_window() -> usize {
    20
}
fn default_vol_min_scale() -> f64 {
    0.5
}
fn default_vol_max_scale() -> f64 {
    1.0
}

impl Default for VolTargetConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            target: default_vol_target(),
            window: default_vol_window(),
            min_scale: default_vol_min_scale(),
            max_scale: default_vol_max_scale(),
        }
    }
}

/// 낙폭 단계별 축소 비율.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct StopLossStage {
    /// 이 단계가 적용되는 최소 낙폭 (양수, 0.2 = -20%)
    pub drawdown: f64,
    /// 비헤지/비원자재 종목에 곱할 비율
    pub ratio: f64,
}

/// 낙폭 손절 설정.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct StopLossConfig {
    /// 활성화 여부
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// 손절 모드 진입 낙폭
    #[serde(default = "default_stop_trigger")]
    pub trigger_drawdown: f64,
    /// 손절 모드 해제 낙폭 (진입보다 얕음)
    #[serde(default = "default_stop_recovery")]
    pub recovery_drawdown: f64,
    /// 단계 (깊은 낙폭부터)
    #[serde(default = "default_stop_stages")]
    pub stages: Vec<StopLossStage>,
}

fn default_stop_trigger() -> f64 {
    0.15
}
fn default_stop_recovery() -> f64 {
    0.08
}
fn default_stop_stages() -> Vec<StopLossStage> {
    vec![
        StopLossStage {
            drawdown: 0.30,
            ratio: 0.3,
        },
        StopLossStage {
            drawdown: 0.20,
            ratio: 0.5,
        },
        StopLossStage {
            drawdown: 0.15,
            ratio: 0.7,
        },
    ]
}

impl Default for StopLossConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            trigger_drawdown: default_stop_trigger(),
            recovery_drawdown: default_stop_recovery(),
            stages: default_stop_stages(),
        }
    }
}

impl StopLossConfig {
    /// 낙폭(양수)에 해당하는 축소 비율.
    ///
    /// 가장 깊은 단계부터 확인하며, 어느 단계에도 미치지 않으면
    /// 가장 완만한 단계 비율을 사용합니다.
    pub fn ratio_for(&self, drawdown: f64) -> f64 {
        self.stages
            .iter()
            .find(|stage| drawdown >= stage.drawdown)
            .or_else(|| self.stages.last())
            .map_or(1.0, |stage| stage.ratio)
    }
}

/// 백테스트 설정.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct BacktestConfig {
    /// 초기 자본금
    #[serde(default = "default_initial_capital")]
    pub initial_capital: Decimal,
    /// 무위험 이자율 (연율)
    #[serde(default = "default_risk_free_rate")]
    pub risk_free_rate: f64,
    /// 일반 레짐 전환 확정에 필요한 연속 일수
    #[serde(default = "default_confirmation_days")]
    pub confirmation_days: usize,
    /// 극단적 공포 레짐 전환 확정에 필요한 연속 일수
    #[serde(default = "default_accumulation_confirmation_days")]
    pub accumulation_confirmation_days: usize,
    /// 전환 평활 기간 (0이면 즉시 전환)
    #[serde(default = "default_transition_days")]
    pub transition_days: usize,
    /// 리밸런싱 주기
    #[serde(default)]
    pub rebalance_frequency: RebalanceFrequency,
    /// 리밸런싱 허용 밴드 (종목별 절대 비중 차이)
    #[serde(default = "default_rebalance_band")]
    pub rebalance_band: f64,
    /// 거래 비용 (bp, 회전율 기준)
    #[serde(default = "default_cost_bps")]
    pub cost_bps: f64,
    /// 상장 이전 구간 프록시 대체 사용 여부
    #[serde(default = "default_true")]
    pub use_proxies: bool,
    /// 변동성 타게팅
    #[serde(default)]
    pub vol_target: VolTargetConfig,
    /// 낙폭 손절
    #[serde(default)]
    pub stop_loss: StopLossConfig,
}

fn default_initial_capital() -> Decimal {
    Decimal::new(10_000, 0)
}
fn default_risk_free_rate() -> f64 {
    0.03
}
fn default_confirmation_days() -> usize {
    5
}
fn default_accumulation_confirmation_days() -> usize {
    2
}
fn default_transition_days() -> usize {
    5
}
fn default_rebalance_band() -> f64 {
    0.05
}
fn default_cost_bps() -> f64 {
    10.0
}

impl Default for BacktestConfig {
    fn default() -> Self {
        Self {
            initial_capital: default_initial_capital(),
            risk_free_rate: default_risk_free_rate(),
            confirmation_days: default_confirmation_days(),
            accumulation_confirmation_days: default_accumulation_confirmation_days(),
            transition_days: default_transition_days(),
            rebalance_frequency: RebalanceFrequency::default(),
            rebalance_band: default_rebalance_band(),
            cost_bps: default_cost_bps(),
            use_proxies: true,
            vol_target: VolTargetConfig::default(),
            stop_loss: StopLossConfig::default(),
        }
    }
}

impl BacktestConfig {
    /// 새로운 백테스트 설정을 생성합니다.
    pub fn new(initial_capital: Decimal) -> Self {
        Self {
            initial_capital,
            ..Default::default()
        }
    }

    /// 거래 비용 설정
    pub fn with_cost_bps(mut self, cost_bps: f64) -> Self {
        self.cost_bps = cost_bps;
        self
    }

    /// 리밸런싱 주기 설정
    pub fn with_rebalance_frequency(mut self, frequency: RebalanceFrequency) -> Self {
        self.rebalance_frequency = frequency;
        self
    }

    /// 리밸런싱 밴드 설정
    pub fn with_rebalance_band(mut self, band: f64) -> Self {
        self.rebalance_band = band;
        self
    }

    /// 확정 일수 설정 (일반, 극단적 공포)
    pub fn with_confirmation_days(mut self, standard: usize, accumulation: usize) -> Self {
        self.confirmation_days = standard;
        self.accumulation_confirmation_days = accumulation;
        self
    }

    /// 전환 평활 기간 설정
    pub fn with_transition_days(mut self, days: usize) -> Self {
        self.transition_days = days;
        self
    }

    /// 프록시 대체 사용 설정
    pub fn with_proxies(mut self, enabled: bool) -> Self {
        self.use_proxies = enabled;
        self
    }

    /// 리스크 오버레이(변동성 타게팅, 낙폭 손절) 일괄 설정
    pub fn with_risk_overlays(mut self, enabled: bool) -> Self {
        self.vol_target.enabled = enabled;
        self.stop_loss.enabled = enabled;
        self
    }

    /// 설정 검증
    pub fn validate(&self) -> RegimeResult<()> {
        if self.initial_capital <= Decimal::ZERO {
            return Err(config_error("초기 자본은 0보다 커야 합니다"));
        }
        if !self.cost_bps.is_finite() || self.cost_bps < 0.0 {
            return Err(config_error("거래 비용은 0 이상이어야 합니다"));
        }
        if self.confirmation_days == 0 || self.accumulation_confirmation_days == 0 {
            return Err(config_error("확정 일수는 1 이상이어야 합니다"));
        }
        if !self.risk_free_rate.is_finite() {
            return Err(config_error("무위험 이자율은 유한한 수여야 합니다"));
        }
        ensure_fraction("rebalance_band", self.rebalance_band)?;

        let vol = &self.vol_target;
        if vol.enabled {
            if vol.window < 2 {
                return Err(config_error("변동성 계산 기간은 2 이상이어야 합니다"));
            }
            if vol.target <= 0.0 || !vol.target.is_finite() {
                return Err(config_error("목표 변동성은 0보다 커야 합니다"));
            }
            if vol.min_scale < 0.0 || vol.min_scale > vol.max_scale {
                return Err(config_error(format!(
                    "변동성 배수 범위가 잘못되었습니다: [{}, {}]",
                    vol.min_scale, vol.max_scale
                )));
            }
        }

        let stop = &self.stop_loss;
        if stop.enabled {
            if stop.stages.is_empty() {
                return Err(config_error("손절 단계가 비어있습니다"));
            }
            if stop.recovery_drawdown >= stop.trigger_drawdown {
                return Err(config_error(format!(
                    "손절 해제 낙폭({})은 진입 낙폭({})보다 얕아야 합니다",
                    stop.recovery_drawdown, stop.trigger_drawdown
                )));
            }
            for pair in stop.stages.windows(2) {
                if pair[0].drawdown <= pair[1].drawdown {
                    return Err(config_error("손절 단계는 깊은 낙폭부터 정렬되어야 합니다"));
                }
            }
            for stage in &stop.stages {
                ensure_fraction("stop_loss.ratio", stage.ratio)?;
            }
        }
        Ok(())
    }
}

impl AppConfig {
    /// 파일과 환경 변수에서 설정을 로드합니다.
    ///
    /// 환경 변수는 `REGIME__ENGINE__BACKTEST__COST_BPS=5` 형식으로
    /// 파일 값을 덮어씁니다.
    pub fn load<P: AsRef<Path>>(path: P) -> RegimeResult<Self> {
        let builder = config::Config::builder()
            .set_default("logging.level", "info")?
            .set_default("logging.format", "pretty")?
            .add_source(config::File::from(path.as_ref()))
            .add_source(
                config::Environment::with_prefix("REGIME")
                    .separator("__")
                    .try_parsing(true),
            );

        let config: AppConfig = builder.build()?.try_deserialize()?;
        config.engine.validate()?;
        Ok(config)
    }

    /// 기본 경로에서 설정을 로드합니다.
    pub fn load_default() -> RegimeResult<Self> {
        Self::load("config/default.toml")
    }

    /// TOML 문자열에서 설정을 로드합니다 (환경 변수 미적용).
    pub fn from_toml_str(source: &str) -> RegimeResult<Self> {
        let config: AppConfig = config::Config::builder()
            .add_source(config::File::from_str(source, config::FileFormat::Toml))
            .build()?
            .try_deserialize()?;
        config.engine.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_default_config_is_valid() {
        assert!(EngineConfig::default().validate().is_ok());
    }

    #[test]
    fn test_backtest_config_validation() {
        assert!(BacktestConfig::new(dec!(-1)).validate().is_err());
        assert!(BacktestConfig::default().with_cost_bps(-1.0).validate().is_err());
        assert!(BacktestConfig::default()
            .with_confirmation_days(0, 2)
            .validate()
            .is_err());

        let mut config = BacktestConfig::default();
        config.stop_loss.recovery_drawdown = 0.2;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_stop_loss_ratio_most_severe_first() {
        let stop = StopLossConfig::default();
        assert_eq!(stop.ratio_for(0.35), 0.3);
        assert_eq!(stop.ratio_for(0.22), 0.5);
        assert_eq!(stop.ratio_for(0.15), 0.7);
        // 진입 이후 회복 중인 얕은 낙폭은 가장 완만한 단계
        assert_eq!(stop.ratio_for(0.10), 0.7);
    }

    #[test]
    fn test_rebalance_boundaries() {
        let fri = date(2024, 1, 5);
        let mon = date(2024, 1, 8);
        let tue = date(2024, 1, 9);
        assert!(RebalanceFrequency::Weekly.crosses_boundary(fri, mon));
        assert!(!RebalanceFrequency::Weekly.crosses_boundary(mon, tue));
        assert!(RebalanceFrequency::Monthly.crosses_boundary(date(2024, 1, 31), date(2024, 2, 1)));
        assert!(!RebalanceFrequency::Quarterly.crosses_boundary(date(2024, 1, 31), date(2024, 2, 1)));
        assert!(RebalanceFrequency::Quarterly.crosses_boundary(date(2024, 3, 28), date(2024, 4, 1)));
        assert!(RebalanceFrequency::Daily.crosses_boundary(mon, tue));
    }

    #[test]
    fn test_feature_warmup() {
        let features = FeatureConfig::default();
        // Sahm: 63일 평균 + 252일 최저치 탐색
        assert_eq!(features.warmup(), 62 + 252);
    }

    #[test]
    fn test_load_from_toml_with_defaults() {
        let config = AppConfig::from_toml_str(
            r#"
            [logging]
            level = "debug"
            format = "json"

            [engine.backtest]
            cost_bps = 5.0
            rebalance_frequency = "weekly"

            [engine.classifier]
            vix_panic = 32.0
            "#,
        )
        .unwrap();

        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.engine.backtest.cost_bps, 5.0);
        assert_eq!(
            config.engine.backtest.rebalance_frequency,
            RebalanceFrequency::Weekly
        );
        assert_eq!(config.engine.classifier.vix_panic, 32.0);
        assert_eq!(config.engine.classifier.vix_recession, 40.0);
        assert_eq!(config.engine.backtest.confirmation_days, 5);
    }

    #[test]
    fn test_invalid_file_config_is_rejected() {
        let result = AppConfig::from_toml_str(
            r#"
            [engine.backtest]
            rebalance_band = 1.5
            "#,
        );
        assert!(matches!(result, Err(RegimeError::Config(_))));
    }
}
