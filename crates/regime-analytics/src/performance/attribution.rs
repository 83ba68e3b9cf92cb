//! 레짐별 성과 귀속과 레짐 전이 행렬.
//!
//! 날짜 `t`의 일간 수익률은 그날 적용된 확정 레짐에 귀속됩니다.
//! 레짐이 없는 날(첫날, 고정 비중 전략)은 집계에서 제외됩니다.

use serde::{Deserialize, Serialize};

use regime_core::{Regime, RegimeError, RegimeResult, REGIME_COUNT};

use super::metrics::{daily_returns, validate_nav, NavPoint, PerformanceAnalyzer, PerformanceMetrics};

/// 한 레짐의 수익률 통계.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegimeStats {
    /// 레짐
    pub regime: Regime,
    /// 해당 레짐이 적용된 일수
    pub days: usize,
    /// 평균 일간 수익률
    pub mean_return: f64,
    /// 중앙값 일간 수익률
    pub median_return: f64,
    /// 누적 수익률 (복리)
    pub cumulative_return: f64,
}

/// 6×6 레짐 전이 행렬.
///
/// `counts[from][to]`는 연속한 두 날짜의 레짐 쌍 개수입니다.
/// 같은 레짐이 이어진 경우(대각선)도 포함합니다.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TransitionMatrix {
    pub counts: [[u32; REGIME_COUNT]; REGIME_COUNT],
}

impl TransitionMatrix {
    /// 레짐 시퀀스에서 전이 행렬을 만듭니다. `None` 구간은 건너뜁니다.
    pub fn from_sequence(regimes: &[Option<Regime>]) -> Self {
        let mut matrix = Self::default();
        for pair in regimes.windows(2) {
            if let (Some(from), Some(to)) = (pair[0], pair[1]) {
                matrix.counts[from.index()][to.index()] += 1;
            }
        }
        matrix
    }

    /// 전이 횟수
    pub fn count(&self, from: Regime, to: Regime) -> u32 {
        self.counts[from.index()][to.index()]
    }

    /// 레짐이 실제로 바뀐 횟수 (대각선 제외)
    pub fn switches(&self) -> u32 {
        Regime::ALL
            .iter()
            .flat_map(|from| Regime::ALL.iter().map(move |to| (*from, *to)))
            .filter(|(from, to)| from != to)
            .map(|(from, to)| self.count(from, to))
            .sum()
    }

    /// 행 확률. 관측이 없는 행은 모두 0입니다.
    pub fn probabilities(&self) -> [[f64; REGIME_COUNT]; REGIME_COUNT] {
        let mut probs = [[0.0; REGIME_COUNT]; REGIME_COUNT];
        for (row, counts) in self.counts.iter().enumerate() {
            let total: u32 = counts.iter().sum();
            if total == 0 {
                continue;
            }
            for (col, count) in counts.iter().enumerate() {
                probs[row][col] = *count as f64 / total as f64;
            }
        }
        probs
    }
}

/// 레짐 귀속 분석 결과.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RegimeAttribution {
    /// 관측된 레짐별 통계 (우선순위 순)
    pub stats: Vec<RegimeStats>,
    /// 레짐 전이 행렬
    pub transitions: TransitionMatrix,
}

impl RegimeAttribution {
    /// 특정 레짐의 통계
    pub fn get(&self, regime: Regime) -> Option<&RegimeStats> {
        self.stats.iter().find(|s| s.regime == regime)
    }
}

fn median(values: &mut [f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.sort_by(|a, b| a.total_cmp(b));
    let mid = values.len() / 2;
    if values.len() % 2 == 0 {
        (values[mid - 1] + values[mid]) / 2.0
    } else {
        values[mid]
    }
}

/// NAV와 날짜별 레짐으로 귀속 분석을 수행합니다.
///
/// # 에러
///
/// - 길이가 다르면 `MisalignedInput`
/// - NAV 검증 실패 시 `analyze`와 같은 에러
pub fn attribute(nav: &[NavPoint], regimes: &[Option<Regime>]) -> RegimeResult<RegimeAttribution> {
    if nav.len() != regimes.len() {
        return Err(RegimeError::MisalignedInput(format!(
            "NAV {}개와 레짐 {}개의 길이가 다릅니다",
            nav.len(),
            regimes.len()
        )));
    }
    validate_nav(nav)?;

    let values: Vec<f64> = nav.iter().map(|p| p.value).collect();
    let returns = daily_returns(&values);

    let mut buckets: [Vec<f64>; REGIME_COUNT] = Default::default();
    for (r, regime) in returns.iter().zip(&regimes[1..]) {
        if let Some(regime) = regime {
            buckets[regime.index()].push(*r);
        }
    }

    let stats = Regime::ALL
        .iter()
        .filter_map(|regime| {
            let bucket = &mut buckets[regime.index()];
            if bucket.is_empty() {
                return None;
            }
            let days = bucket.len();
            let mean_return = bucket.iter().sum::<f64>() / days as f64;
            let cumulative_return = bucket.iter().fold(1.0, |acc, r| acc * (1.0 + r)) - 1.0;
            Some(RegimeStats {
                regime: *regime,
                days,
                mean_return,
                median_return: median(bucket),
                cumulative_return,
            })
        })
        .collect();

    Ok(RegimeAttribution {
        stats,
        transitions: TransitionMatrix::from_sequence(regimes),
    })
}

impl PerformanceAnalyzer {
    /// 성과 지표와 레짐 귀속 분석을 함께 계산합니다.
    pub fn analyze_with_regimes(
        &self,
        nav: &[NavPoint],
        regimes: &[Option<Regime>],
    ) -> RegimeResult<(PerformanceMetrics, RegimeAttribution)> {
        let attribution = attribute(nav, regimes)?;
        let metrics = self.analyze(nav)?;
        Ok((metrics, attribution))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn nav_series(values: &[f64]) -> Vec<NavPoint> {
        let start = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        values
            .iter()
            .enumerate()
            .map(|(i, v)| NavPoint::new(start + chrono::Duration::days(i as i64), *v))
            .collect()
    }

    #[test]
    fn test_length_mismatch() {
        let nav = nav_series(&[100.0, 101.0]);
        let err = attribute(&nav, &[None]).unwrap_err();
        assert!(matches!(err, RegimeError::MisalignedInput(_)));
    }

    #[test]
    fn test_returns_attributed_to_applied_regime() {
        use Regime::*;
        let nav = nav_series(&[100.0, 110.0, 99.0, 99.0, 108.9]);
        let regimes = [None, Some(Neutral), Some(Neutral), Some(CautiousTrend), Some(CautiousTrend)];

        let result = attribute(&nav, &regimes).unwrap();
        assert_eq!(result.stats.len(), 2);

        let neutral = result.get(Neutral).unwrap();
        assert_eq!(neutral.days, 2);
        assert!((neutral.mean_return - 0.0).abs() < 1e-12);
        assert!((neutral.cumulative_return - (-0.01)).abs() < 1e-12);

        let cautious = result.get(CautiousTrend).unwrap();
        assert_eq!(cautious.days, 2);
        assert!((cautious.median_return - 0.05).abs() < 1e-12);
        assert!((cautious.cumulative_return - 0.10).abs() < 1e-12);

        assert!(result.get(InflationShock).is_none());
    }

    #[test]
    fn test_transition_matrix() {
        use Regime::*;
        let seq = [None, Some(Neutral), Some(Neutral), Some(CautiousTrend), Some(Neutral)];
        let matrix = TransitionMatrix::from_sequence(&seq);

        assert_eq!(matrix.count(Neutral, Neutral), 1);
        assert_eq!(matrix.count(Neutral, CautiousTrend), 1);
        assert_eq!(matrix.count(CautiousTrend, Neutral), 1);
        assert_eq!(matrix.switches(), 2);

        let probs = matrix.probabilities();
        assert!((probs[Neutral.index()][Neutral.index()] - 0.5).abs() < 1e-12);
        assert!((probs[CautiousTrend.index()][Neutral.index()] - 1.0).abs() < 1e-12);
        assert_eq!(probs[InflationShock.index()], [0.0; REGIME_COUNT]);
    }

    #[test]
    fn test_median_even_and_odd() {
        assert_eq!(median(&mut [3.0, 1.0, 2.0]), 2.0);
        assert_eq!(median(&mut [4.0, 1.0, 3.0, 2.0]), 2.5);
        assert_eq!(median(&mut []), 0.0);
    }

    #[test]
    fn test_analyze_with_regimes() {
        let nav = nav_series(&[100.0, 101.0, 102.0]);
        let regimes = [None, Some(Regime::Neutral), Some(Regime::Neutral)];
        let (metrics, attribution) = PerformanceAnalyzer::default()
            .analyze_with_regimes(&nav, &regimes)
            .unwrap();
        assert_eq!(metrics.periods, 2);
        assert_eq!(attribution.get(Regime::Neutral).unwrap().days, 2);
    }
}
