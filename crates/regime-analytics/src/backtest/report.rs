//! 백테스트 결과 리포트.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use regime_core::{Regime, RegimeResult, WeightMap};

use super::state::SignalState;
use crate::performance::{NavPoint, PerformanceMetrics, RegimeAttribution};

/// 날짜별 배분 기록.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllocationRecord {
    /// 날짜
    pub date: NaiveDate,
    /// 적용된 확정 레짐 (고정 비중 전략과 첫날은 없음)
    pub regime: Option<Regime>,
    /// 전일 피처로 분류한 원시 레짐
    pub raw_regime: Option<Regime>,
    /// 신호 상태
    pub state: SignalState,
    /// 전환 평활 후, 오버레이 적용 전 목표 비중
    pub target: WeightMap,
    /// 실제 적용 비중
    pub weights: WeightMap,
    /// 편도 회전율
    pub turnover: f64,
    /// 거래 비용 (NAV 대비 비율)
    pub cost: f64,
    /// 리밸런싱 여부
    pub rebalanced: bool,
    /// 리밸런싱한 날 적용된 변동성 타게팅 배수 (그 외 1.0)
    pub vol_scale: f64,
    /// 리밸런싱한 날 손절 축소가 비중에 반영되었는지
    pub stop_loss: bool,
    /// 종가 기준 NAV
    pub nav: f64,
}

/// 백테스트 결과 리포트.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BacktestReport {
    /// 실행 ID
    pub run_id: Uuid,
    /// 전략 이름
    pub strategy: String,
    /// 비용 차감 NAV
    pub nav: Vec<NavPoint>,
    /// 비용 미차감 NAV
    pub gross_nav: Vec<NavPoint>,
    /// 날짜별 배분 기록
    pub history: Vec<AllocationRecord>,
    /// 성과 지표
    pub metrics: PerformanceMetrics,
    /// 레짐 귀속 분석 (동적 전략만)
    pub attribution: Option<RegimeAttribution>,
    /// 누적 회전율
    pub total_turnover: f64,
    /// 초기 자본
    pub initial_capital: Decimal,
    /// 누적 거래 비용 (통화)
    pub trading_cost: Decimal,
    /// 최종 잔고
    pub final_balance: Decimal,
}

impl BacktestReport {
    /// 날짜별 확정 레짐
    pub fn regimes(&self) -> Vec<Option<Regime>> {
        self.history.iter().map(|r| r.regime).collect()
    }

    /// 리밸런싱 횟수
    pub fn rebalance_count(&self) -> usize {
        self.history.iter().filter(|r| r.rebalanced).count()
    }

    /// 첫 날짜와 마지막 날짜
    pub fn period(&self) -> Option<(NaiveDate, NaiveDate)> {
        Some((self.nav.first()?.date, self.nav.last()?.date))
    }

    /// JSON 직렬화
    pub fn to_json(&self) -> RegimeResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// 요약 문자열 반환
    pub fn summary(&self) -> String {
        let (start, end) = self
            .period()
            .map(|(s, e)| (s.to_string(), e.to_string()))
            .unwrap_or_default();
        let m = &self.metrics;

        format!(
            "백테스트 결과 요약: {}\n\
             ═══════════════════════════════════════\n\
             기간: {} → {} ({} 거래일)\n\
             ───────────────────────────────────────\n\
             초기 자본: {}\n\
             최종 자산: {}\n\
             총 수익률: {:.2}%\n\
             CAGR: {:.2}%\n\
             ───────────────────────────────────────\n\
             샤프 비율: {:.2}\n\
             소르티노 비율: {:.2}\n\
             최대 낙폭: {:.2}%\n\
             낙폭 지속: {} 일 ({} 거래일)\n\
             칼마 비율: {:.2}\n\
             연 변동성: {:.2}%\n\
             ───────────────────────────────────────\n\
             리밸런싱: {} 회\n\
             누적 회전율: {:.2}\n\
             총 거래 비용: {}\n\
             ═══════════════════════════════════════",
            self.strategy,
            start,
            end,
            m.periods,
            self.initial_capital,
            self.final_balance,
            m.total_return * 100.0,
            m.cagr * 100.0,
            m.sharpe_ratio,
            m.sortino_ratio,
            m.max_drawdown * 100.0,
            m.max_drawdown_duration_days,
            m.max_drawdown_duration_periods,
            m.calmar_ratio,
            m.annualized_volatility * 100.0,
            self.rebalance_count(),
            self.total_turnover,
            self.trading_cost,
        )
    }
}
