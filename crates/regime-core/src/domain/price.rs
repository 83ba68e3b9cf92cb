//! 종목별 수정 종가 테이블.
//!
//! 모든 종목 열은 같은 날짜 인덱스를 공유합니다. 상장 이전 구간은
//! `None`이며, 한 번 시작된 열에는 빈 칸이 있을 수 없습니다.

use chrono::NaiveDate;

use super::asset::{Asset, AssetMap};
use crate::error::{RegimeError, RegimeResult};

/// 날짜 정렬된 가격 테이블.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceTable {
    dates: Vec<NaiveDate>,
    prices: AssetMap<Vec<Option<f64>>>,
    /// 종목별 첫 가격 인덱스 (상장일)
    inception: AssetMap<Option<usize>>,
}

impl PriceTable {
    /// 입력을 검증하고 테이블을 생성합니다.
    ///
    /// # 에러
    ///
    /// - 날짜가 엄격히 증가하지 않으면 `NonMonotonicDates`
    /// - 열 길이가 날짜 수와 다르면 `MisalignedInput`
    /// - 양의 유한수가 아닌 가격은 `InvalidPrice`
    /// - 시작된 열 중간의 빈 칸은 `MissingPrice`
    pub fn new(dates: Vec<NaiveDate>, prices: AssetMap<Vec<Option<f64>>>) -> RegimeResult<Self> {
        super::ensure_increasing(dates.iter().copied())?;

        let mut inception = AssetMap::filled(None);
        for (asset, column) in prices.iter() {
            if column.len() != dates.len() {
                return Err(RegimeError::MisalignedInput(format!(
                    "{} 가격 열 길이 {} != 날짜 수 {}",
                    asset,
                    column.len(),
                    dates.len()
                )));
            }

            let mut started = None;
            for (i, value) in column.iter().enumerate() {
                match (*value, started) {
                    (Some(p), _) if !p.is_finite() || p <= 0.0 => {
                        return Err(RegimeError::InvalidPrice {
                            date: dates[i],
                            asset: asset.to_string(),
                            value: p,
                        });
                    }
                    (Some(_), None) => started = Some(i),
                    (None, Some(_)) => {
                        return Err(RegimeError::MissingPrice {
                            date: dates[i],
                            asset: asset.to_string(),
                        });
                    }
                    _ => {}
                }
            }
            inception[asset] = started;
        }

        Ok(Self {
            dates,
            prices,
            inception,
        })
    }

    /// 날짜별 행으로 테이블을 생성합니다.
    pub fn from_rows(rows: Vec<(NaiveDate, AssetMap<Option<f64>>)>) -> RegimeResult<Self> {
        let dates = rows.iter().map(|(d, _)| *d).collect();
        let prices = AssetMap::from_fn(|asset| rows.iter().map(|(_, row)| row[asset]).collect());
        Self::new(dates, prices)
    }

    /// 날짜 목록
    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    /// 날짜 수
    pub fn len(&self) -> usize {
        self.dates.len()
    }

    /// 비어있는지 확인
    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    /// 인덱스의 날짜
    pub fn date(&self, index: usize) -> Option<NaiveDate> {
        self.dates.get(index).copied()
    }

    /// 날짜의 인덱스
    pub fn position(&self, date: NaiveDate) -> Option<usize> {
        self.dates.binary_search(&date).ok()
    }

    /// 종목 가격
    pub fn price(&self, asset: Asset, index: usize) -> Option<f64> {
        self.prices[asset].get(index).copied().flatten()
    }

    /// 종목 가격 열
    pub fn column(&self, asset: Asset) -> &[Option<f64>] {
        &self.prices[asset]
    }

    /// 종목의 첫 가격 인덱스
    pub fn inception(&self, asset: Asset) -> Option<usize> {
        self.inception[asset]
    }

    /// `[from, to]` 구간 전체에 가격이 있는지 확인합니다.
    pub fn covers(&self, asset: Asset, from: usize, to: usize) -> bool {
        to < self.len() && self.inception[asset].map_or(false, |start| start <= from)
    }

    /// `index - 1` → `index` 일간 수익률
    pub fn daily_return(&self, asset: Asset, index: usize) -> Option<f64> {
        if index == 0 {
            return None;
        }
        let prev = self.price(asset, index - 1)?;
        let curr = self.price(asset, index)?;
        Some(curr / prev - 1.0)
    }

    /// 주어진 종목들이 전체 구간 가격을 가지는지 확인합니다.
    pub fn require_complete(&self, assets: &[Asset]) -> RegimeResult<()> {
        for &asset in assets {
            if self.is_empty() {
                continue;
            }
            if self.inception[asset] != Some(0) {
                return Err(RegimeError::MissingPrice {
                    date: self.dates[0],
                    asset: asset.to_string(),
                });
            }
        }
        Ok(())
    }

    /// `[start, end]` 날짜 구간으로 자른 테이블
    pub fn between(&self, start: Option<NaiveDate>, end: Option<NaiveDate>) -> RegimeResult<Self> {
        let from = start.map_or(0, |s| self.dates.partition_point(|d| *d < s));
        let to = end.map_or(self.len(), |e| self.dates.partition_point(|d| *d <= e));
        let to = to.max(from);
        let dates = self.dates[from..to].to_vec();
        let prices = self.prices.map(|_, column| column[from..to].to_vec());
        Self::new(dates, prices)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, d).unwrap()
    }

    fn row(value: Option<f64>) -> AssetMap<Option<f64>> {
        AssetMap::filled(value)
    }

    #[test]
    fn test_late_inception_is_allowed() {
        let mut rows = vec![(day(1), row(Some(10.0))), (day(2), row(Some(11.0)))];
        rows[0].1[Asset::Wtmf] = None;
        let table = PriceTable::from_rows(rows).unwrap();
        assert_eq!(table.inception(Asset::Wtmf), Some(1));
        assert!(!table.covers(Asset::Wtmf, 0, 1));
        assert!(table.covers(Asset::Spy, 0, 1));
        assert!((table.daily_return(Asset::Spy, 1).unwrap() - 0.1).abs() < 1e-12);
        assert!(table.daily_return(Asset::Wtmf, 1).is_none());
    }

    #[test]
    fn test_gap_is_rejected() {
        let mut rows = vec![
            (day(1), row(Some(10.0))),
            (day(2), row(Some(10.0))),
            (day(3), row(Some(10.0))),
        ];
        rows[1].1[Asset::Gld] = None;
        assert_eq!(
            PriceTable::from_rows(rows),
            Err(RegimeError::MissingPrice {
                date: day(2),
                asset: "GLD".to_string()
            })
        );
    }

    #[test]
    fn test_non_positive_price_is_rejected() {
        let mut rows = vec![(day(1), row(Some(10.0)))];
        rows[0].1[Asset::Tlt] = Some(0.0);
        assert!(matches!(
            PriceTable::from_rows(rows),
            Err(RegimeError::InvalidPrice { .. })
        ));
    }

    #[test]
    fn test_column_length_mismatch() {
        let mut prices = AssetMap::from_fn(|_| vec![Some(1.0), Some(1.0)]);
        prices[Asset::Vnq] = vec![Some(1.0)];
        assert!(matches!(
            PriceTable::new(vec![day(1), day(2)], prices),
            Err(RegimeError::MisalignedInput(_))
        ));
    }

    #[test]
    fn test_require_complete() {
        let mut rows = vec![(day(1), row(Some(10.0))), (day(2), row(Some(10.0)))];
        rows[0].1[Asset::Dbc] = None;
        let table = PriceTable::from_rows(rows).unwrap();
        assert!(table.require_complete(&[Asset::Spy, Asset::Tlt]).is_ok());
        assert!(table.require_complete(&Asset::ALL).is_err());
    }

    #[test]
    fn test_between_recomputes_inception() {
        let mut rows = vec![
            (day(1), row(Some(10.0))),
            (day(2), row(Some(10.0))),
            (day(3), row(Some(10.0))),
        ];
        rows[0].1[Asset::Dbc] = None;
        let table = PriceTable::from_rows(rows).unwrap();
        let tail = table.between(Some(day(2)), None).unwrap();
        assert_eq!(tail.len(), 2);
        assert_eq!(tail.inception(Asset::Dbc), Some(0));
    }
}
