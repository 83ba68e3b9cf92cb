//! 백테스트 입력 데이터.

use chrono::NaiveDate;

use regime_core::{FeatureRow, FeatureTable, PriceTable, RegimeError, RegimeResult};

/// 날짜가 정렬된 가격 테이블과 피처 테이블 쌍.
///
/// 두 테이블은 같은 날짜열을 가지며 최소 2개 날짜를 포함합니다.
#[derive(Debug, Clone)]
pub struct BacktestData {
    prices: PriceTable,
    features: FeatureTable,
}

impl BacktestData {
    /// 기간을 잘라 정렬을 검증합니다.
    ///
    /// 피처 테이블을 `[start, end]`로 자른 뒤, 가격 테이블을 피처의 첫/마지막
    /// 날짜 구간으로 맞춥니다. 그 구간의 날짜가 하나라도 다르면 실패합니다.
    ///
    /// # 에러
    ///
    /// - 날짜 불일치는 `MisalignedInput`
    /// - 2개 미만의 날짜는 `InsufficientData`
    pub fn new(
        prices: PriceTable,
        features: FeatureTable,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> RegimeResult<Self> {
        let features = features.between(start, end);
        let (first, last) = match (features.rows().first(), features.rows().last()) {
            (Some(first), Some(last)) => (first.date, last.date),
            _ => {
                return Err(RegimeError::InsufficientData {
                    required: 2,
                    actual: 0,
                })
            }
        };
        let prices = prices.between(Some(first), Some(last))?;

        if prices.len() != features.len() {
            return Err(RegimeError::MisalignedInput(format!(
                "가격 {}일과 피처 {}일의 날짜 수가 다릅니다 ({} ~ {})",
                prices.len(),
                features.len(),
                first,
                last
            )));
        }
        for (i, (date, row)) in prices.dates().iter().zip(features.rows()).enumerate() {
            if *date != row.date {
                return Err(RegimeError::MisalignedInput(format!(
                    "{}번째 날짜 불일치: 가격 {} / 피처 {}",
                    i, date, row.date
                )));
            }
        }
        if prices.len() < 2 {
            return Err(RegimeError::InsufficientData {
                required: 2,
                actual: prices.len(),
            });
        }

        Ok(Self { prices, features })
    }

    /// 가격 테이블
    pub fn prices(&self) -> &PriceTable {
        &self.prices
    }

    /// 피처 테이블
    pub fn features(&self) -> &FeatureTable {
        &self.features
    }

    /// 피처 행
    pub fn rows(&self) -> &[FeatureRow] {
        self.features.rows()
    }

    /// 날짜 목록
    pub fn dates(&self) -> &[NaiveDate] {
        self.prices.dates()
    }

    /// 날짜 수
    pub fn len(&self) -> usize {
        self.prices.len()
    }

    /// 비어있는지 확인 (검증된 데이터는 항상 false)
    pub fn is_empty(&self) -> bool {
        self.prices.is_empty()
    }
}
