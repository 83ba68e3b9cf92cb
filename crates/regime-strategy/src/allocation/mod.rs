//! 레짐 기반 자산배분 엔진.
//!
//! 레짐 기본 테이블에서 시작해 고정된 순서의 틸트 단계를 차례로 적용합니다.
//! 각 단계는 직전 단계의 출력을 입력으로 받습니다.
//!
//! # 사용 예시
//!
//! ```rust,ignore
//! use regime_strategy::{AllocationEngine, AllocationSignals};
//! use regime_core::Regime;
//!
//! let engine = AllocationEngine::default();
//! let weights = engine.allocate(Regime::CautiousTrend, &AllocationSignals::from(&row));
//! println!("{}", weights);
//! ```

pub mod base;
pub mod signals;
pub mod tilts;

pub use base::{accumulation_tier, base_weights, ACCUMULATION_TIERS};
pub use signals::AllocationSignals;
pub use tilts::{default_passes, TiltContext, TiltPass};

use tracing::trace;

use regime_core::{AllocationParams, ClassifierThresholds, Regime, RegimeResult, WeightMap};

/// 자산배분 엔진.
pub struct AllocationEngine {
    params: AllocationParams,
    thresholds: ClassifierThresholds,
    passes: Vec<Box<dyn TiltPass>>,
}

impl Default for AllocationEngine {
    fn default() -> Self {
        Self::new(AllocationParams::default(), ClassifierThresholds::default())
    }
}

impl std::fmt::Debug for AllocationEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<&str> = self.passes.iter().map(|p| p.name()).collect();
        f.debug_struct("AllocationEngine")
            .field("params", &self.params)
            .field("passes", &names)
            .finish()
    }
}

impl AllocationEngine {
    /// 기본 단계 목록으로 엔진을 생성합니다.
    pub fn new(params: AllocationParams, thresholds: ClassifierThresholds) -> Self {
        Self {
            params,
            thresholds,
            passes: default_passes(),
        }
    }

    /// 적용 순서대로의 단계 이름
    pub fn pass_names(&self) -> Vec<&'static str> {
        self.passes.iter().map(|p| p.name()).collect()
    }

    /// 레짐과 신호로 목표 비중을 계산합니다.
    ///
    /// 결과의 모든 비중은 0 이상이며 합계는 1 이하입니다.
    pub fn allocate(&self, regime: Regime, signals: &AllocationSignals) -> WeightMap {
        let ctx = TiltContext {
            regime,
            signals,
            params: &self.params,
            thresholds: &self.thresholds,
        };

        self.passes
            .iter()
            .filter(|pass| pass.runs_in(regime))
            .fold(base_weights(regime, signals.vix), |weights, pass| {
                let next = pass.apply(weights, &ctx);
                if next != weights {
                    trace!(pass = pass.name(), %regime, "tilt applied: {}", next);
                }
                next
            })
    }

    /// 레짐 토큰을 해석한 뒤 목표 비중을 계산합니다.
    ///
    /// 알 수 없는 토큰은 중립으로 대체하지 않고 `InvalidRegime` 에러입니다.
    pub fn allocate_token(&self, token: &str, signals: &AllocationSignals) -> RegimeResult<WeightMap> {
        let regime: Regime = token.parse()?;
        Ok(self.allocate(regime, signals))
    }
}
