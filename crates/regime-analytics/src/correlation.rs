//! 상관계수 계산 모듈.
//!
//! 종목 간 일간 수익률의 상관관계를 계산합니다.
//! 피처 추출의 주식/채권 상관과 자산군 분산 점검에 사용됩니다.
//!
//! # 주요 기능
//!
//! - **Pearson 상관계수**: 두 시계열 간 선형 상관관계 측정
//! - **상관행렬**: 여러 종목 간 상관관계를 N×N 행렬로 표현
//!
//! # 예시
//!
//! ```rust,ignore
//! use regime_analytics::correlation::calculate_correlation;
//!
//! let returns_a = vec![0.01, -0.02, 0.015, 0.005];
//! let returns_b = vec![0.008, -0.015, 0.012, 0.003];
//!
//! let corr = calculate_correlation(&returns_a, &returns_b);
//! println!("상관계수: {:.4}", corr.unwrap_or(0.0));
//! ```

use serde::{Deserialize, Serialize};

use regime_core::{Asset, PriceTable, RegimeError, RegimeResult};

/// 상관행렬 계산에 필요한 최소 수익률 개수
const MIN_MATRIX_RETURNS: usize = 5;

/// 상관행렬 결과.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorrelationMatrix {
    /// 종목 목록 (행/열 순서)
    pub assets: Vec<Asset>,
    /// 상관계수 행렬 (N×N, -1.0 ~ 1.0)
    pub matrix: Vec<Vec<f64>>,
    /// 분석 기간 (가격 데이터 일수)
    pub period: usize,
}

impl CorrelationMatrix {
    /// 두 종목 간 상관계수 조회
    pub fn get(&self, a: Asset, b: Asset) -> Option<f64> {
        let i = self.assets.iter().position(|x| *x == a)?;
        let j = self.assets.iter().position(|x| *x == b)?;
        Some(self.matrix[i][j])
    }
}

/// Pearson 상관계수 계산.
///
/// # 반환
///
/// 상관계수 (-1.0 ~ 1.0). 길이가 다르거나 2개 미만이거나,
/// 한쪽의 분산이 0이면 None
pub fn calculate_correlation(x: &[f64], y: &[f64]) -> Option<f64> {
    if x.len() != y.len() || x.len() < 2 {
        return None;
    }

    let n = x.len() as f64;

    // 평균 계산
    let mean_x = x.iter().sum::<f64>() / n;
    let mean_y = y.iter().sum::<f64>() / n;

    // 공분산 및 분산 계산
    let mut cov = 0.0;
    let mut var_x = 0.0;
    let mut var_y = 0.0;

    for (xi, yi) in x.iter().zip(y) {
        let dx = xi - mean_x;
        let dy = yi - mean_y;
        cov += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }

    // 변동 없음
    if var_x == 0.0 || var_y == 0.0 {
        return None;
    }

    Some((cov / (var_x.sqrt() * var_y.sqrt())).clamp(-1.0, 1.0))
}

/// 가격 시계열을 수익률로 변환.
///
/// # 반환
///
/// 일간 수익률 벡터 (길이: prices.len() - 1)
pub fn prices_to_returns(prices: &[f64]) -> Vec<f64> {
    if prices.len() < 2 {
        return Vec::new();
    }

    prices
        .windows(2)
        .map(|w| if w[0] == 0.0 { 0.0 } else { w[1] / w[0] - 1.0 })
        .collect()
}

/// 가격 테이블의 종목들로 상관행렬을 계산합니다.
///
/// 모든 종목이 가격을 가진 공통 구간(가장 늦은 상장일 이후)만 사용합니다.
///
/// # 에러
///
/// - 가격이 전혀 없는 종목은 `MissingPrice`
/// - 공통 구간의 수익률이 5개 미만이면 `InsufficientData`
pub fn correlation_matrix(prices: &PriceTable, assets: &[Asset]) -> RegimeResult<CorrelationMatrix> {
    let mut start = 0;
    for &asset in assets {
        let inception = prices.inception(asset).ok_or_else(|| RegimeError::MissingPrice {
            date: prices.date(0).unwrap_or_default(),
            asset: asset.to_string(),
        })?;
        start = start.max(inception);
    }

    let period = prices.len().saturating_sub(start);
    if period < MIN_MATRIX_RETURNS + 1 {
        return Err(RegimeError::InsufficientData {
            required: MIN_MATRIX_RETURNS + 1,
            actual: period,
        });
    }

    let returns: Vec<Vec<f64>> = assets
        .iter()
        .map(|&asset| {
            let column: Vec<f64> = prices.column(asset)[start..].iter().flatten().copied().collect();
            prices_to_returns(&column)
        })
        .collect();

    let n = assets.len();
    let mut matrix = vec![vec![0.0; n]; n];
    for i in 0..n {
        matrix[i][i] = 1.0;
        for j in (i + 1)..n {
            let corr = calculate_correlation(&returns[i], &returns[j]).unwrap_or(0.0);
            matrix[i][j] = corr;
            matrix[j][i] = corr;
        }
    }

    Ok(CorrelationMatrix {
        assets: assets.to_vec(),
        matrix,
        period,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use regime_core::AssetMap;

    /// 모든 종목이 같은 값을 가지는 테스트용 가격 테이블
    fn table(spy: &[f64], tlt: &[f64]) -> PriceTable {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let dates = (0..spy.len())
            .map(|i| start + chrono::Duration::days(i as i64))
            .collect();
        let prices = AssetMap::from_fn(|asset| match asset {
            Asset::Spy => spy.iter().map(|p| Some(*p)).collect(),
            Asset::Tlt => tlt.iter().map(|p| Some(*p)).collect(),
            _ => vec![None; spy.len()],
        });
        PriceTable::new(dates, prices).unwrap()
    }

    #[test]
    fn test_perfect_positive_correlation() {
        let x = vec![1.0, 2.0, 3.0, 4.0, 5.0];
        let y = vec![2.0, 4.0, 6.0, 8.0, 10.0];
        let corr = calculate_correlation(&x, &y).unwrap();
        assert!((corr - 1.0).abs() < 1e-10);
    }

    #[test]
    fn test_perfect_negative_correlation() {
        let x = vec![1.0, 2.0, 3.0, 4.0, 5.0];
        let y = vec![10.0, 8.0, 6.0, 4.0, 2.0];
        let corr = calculate_correlation(&x, &y).unwrap();
        assert!((corr + 1.0).abs() < 1e-10);
    }

    #[test]
    fn test_zero_variance_returns_none() {
        let x = vec![1.0, 1.0, 1.0];
        let y = vec![1.0, 2.0, 3.0];
        assert!(calculate_correlation(&x, &y).is_none());
    }

    #[test]
    fn test_length_mismatch_returns_none() {
        assert!(calculate_correlation(&[1.0, 2.0], &[1.0]).is_none());
        assert!(calculate_correlation(&[1.0], &[1.0]).is_none());
    }

    #[test]
    fn test_prices_to_returns() {
        let returns = prices_to_returns(&[100.0, 110.0, 99.0]);
        assert_eq!(returns.len(), 2);
        assert!((returns[0] - 0.10).abs() < 1e-12);
        assert!((returns[1] + 0.10).abs() < 1e-12);
        assert!(prices_to_returns(&[100.0]).is_empty());
    }

    #[test]
    fn test_correlation_matrix_symmetric() {
        let spy = [100.0, 101.0, 99.0, 102.0, 103.0, 101.0, 104.0];
        let tlt = [50.0, 49.5, 50.2, 49.0, 48.8, 49.6, 48.5];
        let result = correlation_matrix(&table(&spy, &tlt), &[Asset::Spy, Asset::Tlt]).unwrap();

        assert_eq!(result.period, 7);
        assert_eq!(result.matrix[0][0], 1.0);
        assert_eq!(result.matrix[0][1], result.matrix[1][0]);
        assert!(result.get(Asset::Spy, Asset::Tlt).unwrap() < 0.0);
        assert!(result.get(Asset::Spy, Asset::Gld).is_none());
    }

    #[test]
    fn test_correlation_matrix_missing_asset() {
        let spy = [100.0; 7];
        let err = correlation_matrix(&table(&spy, &spy), &[Asset::Spy, Asset::Gld]).unwrap_err();
        assert!(matches!(err, RegimeError::MissingPrice { .. }));
    }

    #[test]
    fn test_correlation_matrix_insufficient() {
        let spy = [100.0, 101.0, 102.0];
        let err = correlation_matrix(&table(&spy, &spy), &[Asset::Spy, Asset::Tlt]).unwrap_err();
        assert!(matches!(
            err,
            RegimeError::InsufficientData {
                required: 6,
                actual: 3
            }
        ));
    }
}
