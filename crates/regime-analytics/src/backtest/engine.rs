//! 백테스팅 엔진
//!
//! 레짐 전략과 고정 비중 벤치마크를 같은 일별 시뮬레이터로 실행합니다.
//!
//! # 시점 모델
//!
//! 날짜 인덱스 `t = 0..N`. 첫날은 전부 현금입니다. `t ≥ 1`의 판단은
//! `t-1`까지의 피처/NAV/수익률만 사용하고(전일 종가 판단 → 당일 실행),
//! 적용 비중은 `t`일의 종가 대비 수익률을 얻습니다.
//!
//! # 사용 예시
//!
//! ```rust,ignore
//! use regime_analytics::backtest::{BacktestData, BacktestEngine, StrategySpec};
//! use regime_core::EngineConfig;
//!
//! let data = BacktestData::new(prices, features, None, None)?;
//! let engine = BacktestEngine::new(EngineConfig::default())?;
//!
//! let report = engine.run(&data, &StrategySpec::Dynamic)?;
//! println!("{}", report.summary());
//! ```

use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;
use tracing::{debug, info};
use uuid::Uuid;

use regime_core::{
    backtest_span, Asset, EngineConfig, FeatureRow, Regime, RegimeError, RegimeResult, WeightMap,
};
use regime_strategy::{AllocationEngine, AllocationSignals, FixedPortfolio, RegimeClassifier};

use super::data::BacktestData;
use super::proxy::ProxyResolver;
use super::report::{AllocationRecord, BacktestReport};
use super::state::{scale_for_stop_loss, scale_risk_assets, RegimeTracker, RiskOverlay, SignalState};
use crate::performance::{NavPoint, PerformanceAnalyzer};

/// bp → 비율
const BPS: f64 = 10_000.0;

/// 실행할 전략.
#[derive(Debug, Clone, PartialEq)]
pub enum StrategySpec {
    /// 레짐 기반 동적 배분
    Dynamic,
    /// 고정 비중 벤치마크
    Fixed(FixedPortfolio),
}

impl StrategySpec {
    /// 전략 이름
    pub fn name(&self) -> &str {
        match self {
            Self::Dynamic => "Regime Dynamic",
            Self::Fixed(portfolio) => &portfolio.name,
        }
    }

    /// 키로 전략을 조회합니다 (`dynamic`, `spy`, `qqq`, `60-40`).
    pub fn preset(key: &str) -> RegimeResult<Self> {
        match key.trim().to_lowercase().as_str() {
            "dynamic" | "regime" => Ok(Self::Dynamic),
            other => FixedPortfolio::preset(other).map(Self::Fixed),
        }
    }
}

// ============================================================================
// 목표 비중 정책
// ============================================================================

/// 하루치 배분 판단.
#[derive(Debug, Clone)]
struct Decision {
    raw_regime: Option<Regime>,
    regime: Option<Regime>,
    state: SignalState,
    target: WeightMap,
    transitioning: bool,
    overlays: bool,
}

/// 전일 피처로 오늘의 목표 비중을 정하는 정책.
trait TargetPolicy {
    fn decide(&mut self, lagged: &FeatureRow) -> Decision;
}

/// 분류 → 확정 지연 → 배분 → 전환 평활.
struct RegimePolicy<'a> {
    classifier: &'a RegimeClassifier,
    allocator: &'a AllocationEngine,
    tracker: RegimeTracker,
}

impl TargetPolicy for RegimePolicy<'_> {
    fn decide(&mut self, lagged: &FeatureRow) -> Decision {
        let raw = self.classifier.classify(lagged);
        let step = self.tracker.observe(raw);
        // 후보 확인 중에는 확정되지 않은 피처로 다시 배분하지 않음
        let fresh = match self.tracker.held_target() {
            Some(held) => held,
            None => self
                .allocator
                .allocate(step.confirmed, &AllocationSignals::from(lagged)),
        };
        let (target, transitioning) = self.tracker.blend(fresh);

        Decision {
            raw_regime: Some(raw),
            regime: Some(step.confirmed),
            state: self.tracker.state(transitioning),
            target,
            transitioning,
            overlays: true,
        }
    }
}

/// 항상 같은 비중.
struct FixedPolicy {
    weights: WeightMap,
}

impl TargetPolicy for FixedPolicy {
    fn decide(&mut self, _lagged: &FeatureRow) -> Decision {
        Decision {
            raw_regime: None,
            regime: None,
            state: SignalState::Confirmed,
            target: self.weights,
            transitioning: false,
            overlays: false,
        }
    }
}

// ============================================================================
// 엔진
// ============================================================================

/// 백테스트 엔진.
///
/// 설정은 생성 시 검증되며 실행 중 바뀌지 않습니다. 실행 상태는
/// 매 실행마다 새로 만들어지므로 같은 엔진으로 여러 전략을 돌릴 수 있습니다.
#[derive(Debug)]
pub struct BacktestEngine {
    config: EngineConfig,
    classifier: RegimeClassifier,
    allocator: AllocationEngine,
}

impl BacktestEngine {
    /// 설정을 검증하고 엔진을 생성합니다.
    pub fn new(config: EngineConfig) -> RegimeResult<Self> {
        config.validate()?;
        Ok(Self {
            classifier: RegimeClassifier::new(config.classifier.clone()),
            allocator: AllocationEngine::new(config.allocation.clone(), config.classifier.clone()),
            config,
        })
    }

    /// 엔진 설정
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    fn policy(&self, strategy: &StrategySpec) -> Box<dyn TargetPolicy + '_> {
        match strategy {
            StrategySpec::Dynamic => Box::new(RegimePolicy {
                classifier: &self.classifier,
                allocator: &self.allocator,
                tracker: RegimeTracker::new(&self.config.backtest),
            }),
            StrategySpec::Fixed(portfolio) => Box::new(FixedPolicy {
                weights: portfolio.weights,
            }),
        }
    }

    /// 여러 전략을 같은 데이터로 실행합니다.
    pub fn run_all(
        &self,
        data: &BacktestData,
        strategies: &[StrategySpec],
    ) -> RegimeResult<Vec<BacktestReport>> {
        strategies.iter().map(|s| self.run(data, s)).collect()
    }

    /// 백테스트를 실행합니다.
    ///
    /// # 에러
    ///
    /// - 보유할 종목과 대체 체인 어디에도 가격이 없으면 `MissingPrice`
    /// - NAV가 0 이하로 떨어지면 `InvalidNav`
    pub fn run(&self, data: &BacktestData, strategy: &StrategySpec) -> RegimeResult<BacktestReport> {
        let run_id = Uuid::new_v4();
        let span = backtest_span!("backtest", strategy.name(), run_id);
        let _guard = span.enter();

        let cfg = &self.config.backtest;
        let prices = data.prices();
        let rows = data.rows();
        let dates = data.dates();
        let n = data.len();

        let initial = cfg.initial_capital.to_f64().ok_or_else(|| {
            RegimeError::Config(format!("초기 자본을 변환할 수 없습니다: {}", cfg.initial_capital))
        })?;

        info!(days = n, start = %dates[0], end = %dates[n - 1], "backtest started");

        let resolver = ProxyResolver::new(prices, cfg.use_proxies);
        let mut policy = self.policy(strategy);
        let mut overlay = RiskOverlay::new(cfg, initial);

        let mut nav = initial;
        let mut gross = initial;
        let mut holdings = WeightMap::empty();
        let mut invested = false;
        let mut total_turnover = 0.0;
        let mut total_cost_rate = 0.0;
        let mut cost_value = 0.0;

        let mut nav_points = Vec::with_capacity(n);
        let mut gross_points = Vec::with_capacity(n);
        let mut history = Vec::with_capacity(n);

        nav_points.push(NavPoint::new(dates[0], nav));
        gross_points.push(NavPoint::new(dates[0], gross));
        history.push(AllocationRecord {
            date: dates[0],
            regime: None,
            raw_regime: None,
            state: SignalState::NoSignal,
            target: WeightMap::empty(),
            weights: WeightMap::empty(),
            turnover: 0.0,
            cost: 0.0,
            rebalanced: false,
            vol_scale: 1.0,
            stop_loss: false,
            nav,
        });

        for t in 1..n {
            let date = dates[t];
            let decision = policy.decide(&rows[t - 1]);

            // 위험 오버레이 (t-1까지의 정보만 사용)
            let mut desired = decision.target;
            let mut vol_scale = 1.0;
            let mut stop_applied = false;
            if decision.overlays {
                vol_scale = overlay.vol_scale();
                if vol_scale != 1.0 {
                    scale_risk_assets(&mut desired, vol_scale);
                }
                if let Some(ratio) = overlay.update_stop(nav) {
                    if decision.regime != Some(Regime::ExtremeAccumulation) {
                        scale_for_stop_loss(&mut desired, ratio);
                        stop_applied = true;
                    }
                }
            }

            let desired = resolver.redirect(&desired, t)?;

            // 리밸런싱 판단
            let cadence_due = cfg.rebalance_frequency.crosses_boundary(dates[t - 1], date);
            let band_exceeded = holdings.max_abs_diff(&desired) > cfg.rebalance_band;
            let rebalance = !invested || decision.transitioning || (cadence_due && band_exceeded);

            let applied = if rebalance { desired } else { holdings };
            let turnover = if rebalance {
                applied.turnover_from(&holdings)
            } else {
                0.0
            };
            let cost = turnover * cfg.cost_bps / BPS;

            // 당일 수익률
            let mut legs: Vec<(Asset, f64, f64)> = Vec::with_capacity(Asset::ALL.len());
            for (asset, weight) in applied.held() {
                let r = prices
                    .daily_return(asset, t)
                    .ok_or_else(|| RegimeError::MissingPrice {
                        date,
                        asset: asset.to_string(),
                    })?;
                legs.push((asset, weight, r));
            }
            let gross_return: f64 = legs.iter().map(|(_, w, r)| w * r).sum();
            let net_return = gross_return - cost;

            cost_value += cost * nav;
            nav *= 1.0 + net_return;
            gross *= 1.0 + gross_return;
            if !nav.is_finite() || nav <= 0.0 {
                return Err(RegimeError::InvalidNav { date, value: nav });
            }

            // 다음 날 보유 비중 (매수 후 보유 드리프트)
            let mut drifted = WeightMap::empty();
            let growth = 1.0 + gross_return;
            if growth > 0.0 {
                for (asset, weight, r) in &legs {
                    drifted[*asset] = weight * (1.0 + r) / growth;
                }
            }

            if rebalance {
                invested = true;
                debug!(%date, turnover, weights = %applied, "rebalanced");
            }

            overlay.record(net_return, nav);
            total_turnover += turnover;
            total_cost_rate += cost;

            nav_points.push(NavPoint::new(date, nav));
            gross_points.push(NavPoint::new(date, gross));
            history.push(AllocationRecord {
                date,
                regime: decision.regime,
                raw_regime: decision.raw_regime,
                state: decision.state,
                target: decision.target,
                weights: applied,
                turnover,
                cost,
                rebalanced: rebalance,
                // 오버레이는 리밸런싱한 날에만 실제 비중에 반영됨
                vol_scale: if rebalance { vol_scale } else { 1.0 },
                stop_loss: stop_applied && rebalance,
                nav,
            });

            holdings = drifted;
        }

        let analyzer = PerformanceAnalyzer::new(cfg.risk_free_rate);
        let (mut metrics, attribution) = match strategy {
            StrategySpec::Dynamic => {
                let regimes: Vec<Option<Regime>> = history.iter().map(|r| r.regime).collect();
                let (metrics, attribution) = analyzer.analyze_with_regimes(&nav_points, &regimes)?;
                (metrics, Some(attribution))
            }
            StrategySpec::Fixed(_) => (analyzer.analyze(&nav_points)?, None),
        };
        metrics.total_turnover = total_turnover;
        metrics.cost_drag = total_cost_rate;

        info!(
            final_nav = nav,
            total_return = metrics.total_return,
            sharpe = metrics.sharpe_ratio,
            "backtest finished"
        );

        Ok(BacktestReport {
            run_id,
            strategy: strategy.name().to_string(),
            nav: nav_points,
            gross_nav: gross_points,
            history,
            metrics,
            attribution,
            total_turnover,
            initial_capital: cfg.initial_capital,
            trading_cost: to_money(cost_value),
            final_balance: to_money(nav),
        })
    }
}

/// 통화 금액 (소수점 2자리)
fn to_money(value: f64) -> Decimal {
    Decimal::from_f64(value).unwrap_or_default().round_dp(2)
}
