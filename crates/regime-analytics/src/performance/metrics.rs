//! 성과 지표 계산 모듈
//!
//! NAV 시계열로부터 전략 성과를 측정하는 지표를 제공합니다:
//! - CAGR / 단순 연율 수익률: 기간 수익률의 연 환산
//! - 샤프 비율 (Sharpe Ratio): 위험 대비 초과 수익률
//! - 소르티노 비율 (Sortino Ratio): 하방 위험 대비 초과 수익률
//! - 최대 낙폭 (Maximum Drawdown)과 낙폭 지속 기간
//! - 칼마 비율 (Calmar Ratio): CAGR / |MDD|
//! - 승률, 손익비
//!
//! # 사용 예시
//!
//! ```rust,ignore
//! use regime_analytics::performance::{NavPoint, PerformanceAnalyzer};
//!
//! let analyzer = PerformanceAnalyzer::default(); // 무위험 이자율 3%
//! let metrics = analyzer.analyze(&nav)?;
//!
//! println!("CAGR: {:.2}%", metrics.cagr * 100.0);
//! println!("샤프 비율: {:.2}", metrics.sharpe_ratio);
//! ```

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use regime_core::{RegimeError, RegimeResult};

/// 연간 거래일 수 (연율화 계산에 사용)
pub const TRADING_DAYS_PER_YEAR: u32 = 252;

/// 기본 무위험 이자율 (연간, 0.03 = 3%)
pub const DEFAULT_RISK_FREE_RATE: f64 = 0.03;

/// 연 환산에 사용하는 달력 일수
const CALENDAR_DAYS_PER_YEAR: f64 = 365.0;

/// NAV 시계열의 한 점.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NavPoint {
    /// 날짜
    pub date: NaiveDate,
    /// 포트폴리오 가치
    pub value: f64,
}

impl NavPoint {
    pub fn new(date: NaiveDate, value: f64) -> Self {
        Self { date, value }
    }
}

/// 성과 지표
///
/// 모든 수익률/낙폭은 비율(0.1 = 10%)입니다.
///
/// ## 수익률 지표
/// - `total_return`: 총 수익률
/// - `simple_annual_return`: 총 수익률 / 연수
/// - `cagr`: 연평균 복리 수익률
///
/// ## 위험 지표
/// - `max_drawdown`: 최대 낙폭 (음수)
/// - `annualized_volatility`: 연율 변동성
/// - `sharpe_ratio`, `sortino_ratio`, `calmar_ratio`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PerformanceMetrics {
    /// 시작 가치
    pub start_value: f64,

    /// 최종 가치
    pub final_value: f64,

    /// 총 수익률
    pub total_return: f64,

    /// 단순 연율 수익률 (총 수익률 / 연수)
    pub simple_annual_return: f64,

    /// 연평균 복리 수익률
    ///
    /// 공식: (최종 / 시작)^(365 / 달력 일수) - 1
    pub cagr: f64,

    /// 최대 낙폭 (고점 대비 최저 비율, 0 이하)
    pub max_drawdown: f64,

    /// 최대 낙폭 지속 기간 (달력 일수, 고점 → 회복 또는 마지막 날짜)
    pub max_drawdown_duration_days: i64,

    /// 최대 낙폭 지속 기간 (고점 아래에 머문 거래일 수)
    pub max_drawdown_duration_periods: usize,

    /// 연율 변동성 (일간 수익률 표본 표준편차 × √252)
    pub annualized_volatility: f64,

    /// 샤프 비율
    ///
    /// 공식: (평균 일간 수익률 - 무위험/252) / 표준편차 × √252
    pub sharpe_ratio: f64,

    /// 소르티노 비율
    ///
    /// 공식: 평균 초과 수익률 × 252 / (√(음수 수익률²의 평균) × √252)
    pub sortino_ratio: f64,

    /// 칼마 비율 (CAGR / |MDD|)
    pub calmar_ratio: f64,

    /// 승률 (수익이 난 날의 비율)
    pub win_rate: f64,

    /// 손익비 (평균 수익 / |평균 손실|)
    pub win_loss_ratio: f64,

    /// 누적 회전율 (시뮬레이터가 채움)
    pub total_turnover: f64,

    /// 누적 거래 비용 (일별 NAV 대비 비용 비율의 합, 시뮬레이터가 채움).
    ///
    /// 통화 금액은 `BacktestReport::trading_cost`에 있습니다.
    pub cost_drag: f64,

    /// 일간 수익률 개수
    pub periods: usize,
}

impl PerformanceMetrics {
    /// 한 줄 요약 (로그 출력용)
    pub fn summary(&self) -> String {
        format!(
            "총수익: {:.2}% | CAGR: {:.2}% | 샤프: {:.2} | 소르티노: {:.2} | MDD: {:.2}% | 변동성: {:.2}%",
            self.total_return * 100.0,
            self.cagr * 100.0,
            self.sharpe_ratio,
            self.sortino_ratio,
            self.max_drawdown * 100.0,
            self.annualized_volatility * 100.0,
        )
    }
}

/// 성과 분석기.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PerformanceAnalyzer {
    risk_free_rate: f64,
}

impl Default for PerformanceAnalyzer {
    fn default() -> Self {
        Self::new(DEFAULT_RISK_FREE_RATE)
    }
}

impl PerformanceAnalyzer {
    /// 연간 무위험 이자율로 분석기를 생성합니다.
    pub fn new(risk_free_rate: f64) -> Self {
        Self { risk_free_rate }
    }

    /// 무위험 이자율
    pub fn risk_free_rate(&self) -> f64 {
        self.risk_free_rate
    }

    /// NAV 시계열의 성과 지표를 계산합니다.
    ///
    /// # 에러
    ///
    /// - 점이 2개 미만이면 `InsufficientData`
    /// - 유한한 양수가 아닌 값은 `InvalidNav`
    /// - 날짜가 증가하지 않으면 `NonMonotonicDates`
    pub fn analyze(&self, nav: &[NavPoint]) -> RegimeResult<PerformanceMetrics> {
        validate_nav(nav)?;

        let values: Vec<f64> = nav.iter().map(|p| p.value).collect();
        let returns = daily_returns(&values);

        let (first, last) = (nav[0], nav[nav.len() - 1]);
        let total_return = last.value / first.value - 1.0;
        let days = (last.date - first.date).num_days();

        let (cagr, simple_annual_return) = if days > 0 {
            let years = days as f64 / CALENDAR_DAYS_PER_YEAR;
            (
                (last.value / first.value).powf(CALENDAR_DAYS_PER_YEAR / days as f64) - 1.0,
                total_return / years,
            )
        } else {
            (0.0, 0.0)
        };

        let max_drawdown = calculate_max_drawdown(&values);
        let (duration_days, duration_periods) = drawdown_durations(nav);

        let std_dev = sample_std(&returns);
        let calmar_ratio = if max_drawdown < 0.0 {
            cagr / max_drawdown.abs()
        } else {
            0.0
        };

        Ok(PerformanceMetrics {
            start_value: first.value,
            final_value: last.value,
            total_return,
            simple_annual_return,
            cagr,
            max_drawdown,
            max_drawdown_duration_days: duration_days,
            max_drawdown_duration_periods: duration_periods,
            annualized_volatility: std_dev * annualization(),
            sharpe_ratio: calculate_sharpe_ratio(&returns, self.risk_free_rate),
            sortino_ratio: calculate_sortino_ratio(&returns, self.risk_free_rate),
            calmar_ratio,
            win_rate: win_rate(&returns),
            win_loss_ratio: win_loss_ratio(&returns),
            total_turnover: 0.0,
            cost_drag: 0.0,
            periods: returns.len(),
        })
    }
}

/// NAV 입력 검증
pub(crate) fn validate_nav(nav: &[NavPoint]) -> RegimeResult<()> {
    if nav.len() < 2 {
        return Err(RegimeError::InsufficientData {
            required: 2,
            actual: nav.len(),
        });
    }
    for point in nav {
        if !point.value.is_finite() || point.value <= 0.0 {
            return Err(RegimeError::InvalidNav {
                date: point.date,
                value: point.value,
            });
        }
    }
    regime_core::ensure_increasing(nav.iter().map(|p| p.date))
}

pub(crate) fn annualization() -> f64 {
    (TRADING_DAYS_PER_YEAR as f64).sqrt()
}

/// 가치 시계열의 일간 수익률 (길이: values.len() - 1)
pub fn daily_returns(values: &[f64]) -> Vec<f64> {
    values.windows(2).map(|w| w[1] / w[0] - 1.0).collect()
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// 표본 표준편차 (n - 1). 값이 2개 미만이면 0.
pub(crate) fn sample_std(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let m = mean(values);
    let variance =
        values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    variance.sqrt()
}

/// 최대 낙폭을 계산합니다 (0 이하의 비율).
///
/// 예: 100 → 120(고점) → 90(저점) → 130 이면 MDD = 90/120 - 1 = -25%
pub fn calculate_max_drawdown(values: &[f64]) -> f64 {
    let mut peak = match values.first() {
        Some(v) => *v,
        None => return 0.0,
    };
    let mut max_drawdown = 0.0_f64;

    for &value in values {
        if value > peak {
            peak = value;
        }
        if peak > 0.0 {
            max_drawdown = max_drawdown.min(value / peak - 1.0);
        }
    }

    max_drawdown
}

/// 가장 긴 수면 아래 구간의 (달력 일수, 거래일 수).
///
/// 고점과 같거나 높은 값은 회복으로 봅니다. 끝까지 회복하지 못한
/// 구간은 마지막 날짜까지를 지속 기간으로 계산합니다.
fn drawdown_durations(nav: &[NavPoint]) -> (i64, usize) {
    let mut peak_index = 0;
    let mut peak_value = nav[0].value;
    let mut max_days = 0_i64;
    let mut max_periods = 0_usize;

    for (i, point) in nav.iter().enumerate().skip(1) {
        if point.value >= peak_value {
            let periods = i - peak_index - 1;
            if periods > 0 {
                max_days = max_days.max((point.date - nav[peak_index].date).num_days());
                max_periods = max_periods.max(periods);
            }
            peak_index = i;
            peak_value = point.value;
        }
    }

    let last = nav.len() - 1;
    if last > peak_index {
        max_days = max_days.max((nav[last].date - nav[peak_index].date).num_days());
        max_periods = max_periods.max(last - peak_index);
    }

    (max_days, max_periods)
}

/// 샤프 비율을 계산합니다.
///
/// Sharpe = (평균 일간 수익률 - 무위험/252) / 표준편차 × √252
///
/// 수익률이 2개 미만이거나 표준편차가 0이면 0입니다.
pub fn calculate_sharpe_ratio(returns: &[f64], risk_free_rate: f64) -> f64 {
    let std_dev = sample_std(returns);
    if std_dev == 0.0 {
        return 0.0;
    }
    let excess = mean(returns) - risk_free_rate / TRADING_DAYS_PER_YEAR as f64;
    excess / std_dev * annualization()
}

/// 소르티노 비율을 계산합니다.
///
/// Sortino = 평균 초과 수익률 × 252 / (하방 편차 × √252)
///
/// 하방 편차 = √(음수 수익률²의 평균). 음수 수익률이 없으면 0입니다.
pub fn calculate_sortino_ratio(returns: &[f64], risk_free_rate: f64) -> f64 {
    let negatives: Vec<f64> = returns.iter().copied().filter(|r| *r < 0.0).collect();
    if negatives.is_empty() {
        return 0.0;
    }

    let downside_dev = (negatives.iter().map(|r| r * r).sum::<f64>() / negatives.len() as f64).sqrt();
    if downside_dev == 0.0 {
        return 0.0;
    }

    let excess = mean(returns) - risk_free_rate / TRADING_DAYS_PER_YEAR as f64;
    excess * TRADING_DAYS_PER_YEAR as f64 / (downside_dev * annualization())
}

/// 수익이 난 날의 비율
fn win_rate(returns: &[f64]) -> f64 {
    if returns.is_empty() {
        return 0.0;
    }
    returns.iter().filter(|r| **r > 0.0).count() as f64 / returns.len() as f64
}

/// 평균 수익 / |평균 손실|. 수익 또는 손실이 없으면 0.
fn win_loss_ratio(returns: &[f64]) -> f64 {
    let wins: Vec<f64> = returns.iter().copied().filter(|r| *r > 0.0).collect();
    let losses: Vec<f64> = returns.iter().copied().filter(|r| *r < 0.0).collect();
    if wins.is_empty() || losses.is_empty() {
        return 0.0;
    }
    mean(&wins) / mean(&losses).abs()
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 하루 간격의 NAV 시계열 생성
    fn nav_series(values: &[f64]) -> Vec<NavPoint> {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        values
            .iter()
            .enumerate()
            .map(|(i, v)| NavPoint::new(start + chrono::Duration::days(i as i64), *v))
            .collect()
    }

    #[test]
    fn test_insufficient_points() {
        let err = PerformanceAnalyzer::default()
            .analyze(&nav_series(&[100.0]))
            .unwrap_err();
        assert_eq!(
            err,
            RegimeError::InsufficientData {
                required: 2,
                actual: 1
            }
        );
    }

    #[test]
    fn test_invalid_nav_rejected() {
        let nav = nav_series(&[100.0, 0.0, 101.0]);
        let err = PerformanceAnalyzer::default().analyze(&nav).unwrap_err();
        assert!(matches!(err, RegimeError::InvalidNav { value, .. } if value == 0.0));

        let nav = nav_series(&[100.0, f64::NAN]);
        assert!(PerformanceAnalyzer::default().analyze(&nav).is_err());
    }

    #[test]
    fn test_non_monotonic_dates() {
        let mut nav = nav_series(&[100.0, 101.0, 102.0]);
        nav.swap(1, 2);
        let err = PerformanceAnalyzer::default().analyze(&nav).unwrap_err();
        assert!(matches!(err, RegimeError::NonMonotonicDates { index: 2, .. }));
    }

    #[test]
    fn test_max_drawdown() {
        let mdd = calculate_max_drawdown(&[100.0, 120.0, 90.0, 130.0]);
        assert!((mdd + 0.25).abs() < 1e-12);
        assert_eq!(calculate_max_drawdown(&[100.0, 101.0, 102.0]), 0.0);
        assert_eq!(calculate_max_drawdown(&[]), 0.0);
    }

    #[test]
    fn test_drawdown_duration_recovered() {
        // 고점 index 1, 회복 index 4 → 수면 아래 2거래일, 달력 3일
        let nav = nav_series(&[100.0, 110.0, 105.0, 100.0, 111.0, 112.0]);
        let metrics = PerformanceAnalyzer::default().analyze(&nav).unwrap();
        assert_eq!(metrics.max_drawdown_duration_periods, 2);
        assert_eq!(metrics.max_drawdown_duration_days, 3);
    }

    #[test]
    fn test_drawdown_duration_never_recovers() {
        let nav = nav_series(&[100.0, 99.0, 98.0, 97.0, 96.0]);
        let metrics = PerformanceAnalyzer::default().analyze(&nav).unwrap();
        assert_eq!(metrics.max_drawdown_duration_periods, 4);
        assert_eq!(metrics.max_drawdown_duration_days, 4);
    }

    #[test]
    fn test_cagr_one_year() {
        let start = NaiveDate::from_ymd_opt(2023, 1, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let nav = vec![NavPoint::new(start, 100.0), NavPoint::new(end, 110.0)];
        let metrics = PerformanceAnalyzer::default().analyze(&nav).unwrap();

        assert!((metrics.total_return - 0.10).abs() < 1e-12);
        assert!((metrics.cagr - 0.10).abs() < 1e-12);
        assert!((metrics.simple_annual_return - 0.10).abs() < 1e-12);
    }

    #[test]
    fn test_flat_series_zero_ratios() {
        let nav = nav_series(&[100.0; 10]);
        let metrics = PerformanceAnalyzer::default().analyze(&nav).unwrap();

        assert_eq!(metrics.annualized_volatility, 0.0);
        assert_eq!(metrics.sharpe_ratio, 0.0);
        assert_eq!(metrics.sortino_ratio, 0.0);
        assert_eq!(metrics.calmar_ratio, 0.0);
        assert_eq!(metrics.win_rate, 0.0);
        assert_eq!(metrics.win_loss_ratio, 0.0);
        assert_eq!(metrics.max_drawdown_duration_periods, 0);
    }

    #[test]
    fn test_sharpe_sign_follows_excess_return() {
        let rising = [0.01, 0.02, -0.005, 0.015, 0.01];
        let falling = [-0.01, -0.02, 0.005, -0.015, -0.01];
        assert!(calculate_sharpe_ratio(&rising, 0.03) > 0.0);
        assert!(calculate_sharpe_ratio(&falling, 0.03) < 0.0);
    }

    #[test]
    fn test_sortino_uses_downside_only() {
        let returns = [0.02, -0.01, 0.03, -0.01];
        let sortino = calculate_sortino_ratio(&returns, 0.0);
        // 평균 0.0075, 하방 편차 0.01
        let expected = 0.0075 * 252.0 / (0.01 * 252f64.sqrt());
        assert!((sortino - expected).abs() < 1e-9);
        assert_eq!(calculate_sortino_ratio(&[0.01, 0.02], 0.0), 0.0);
    }

    #[test]
    fn test_win_statistics() {
        let nav = nav_series(&[100.0, 102.0, 101.0, 104.0, 103.0]);
        let metrics = PerformanceAnalyzer::new(0.0).analyze(&nav).unwrap();

        assert!((metrics.win_rate - 0.5).abs() < 1e-12);
        assert!(metrics.win_loss_ratio > 1.0);
        assert_eq!(metrics.periods, 4);
        assert_eq!(metrics.final_value, 103.0);
    }

    #[test]
    fn test_calmar_ratio() {
        let start = NaiveDate::from_ymd_opt(2023, 1, 1).unwrap();
        let nav = vec![
            NavPoint::new(start, 100.0),
            NavPoint::new(start + chrono::Duration::days(100), 80.0),
            NavPoint::new(start + chrono::Duration::days(365), 110.0),
        ];
        let metrics = PerformanceAnalyzer::default().analyze(&nav).unwrap();
        assert!((metrics.max_drawdown + 0.2).abs() < 1e-12);
        assert!((metrics.calmar_ratio - metrics.cagr / 0.2).abs() < 1e-12);
    }
}
