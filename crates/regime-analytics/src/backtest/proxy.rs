//! 장기 이력 대체 종목 해석.
//!
//! 상장 이전 구간에서는 자산의 대체 체인(예: IWY → QQQ → SPY)을 따라
//! 가격이 있는 첫 종목을 사용합니다. 피처 추출과 시뮬레이터가 같은
//! 체인을 공유합니다.

use tracing::trace;

use regime_core::{Asset, PriceTable, RegimeError, RegimeResult, WeightMap};

/// 가격 테이블 위의 대체 종목 해석기.
#[derive(Debug, Clone, Copy)]
pub struct ProxyResolver<'a> {
    prices: &'a PriceTable,
    enabled: bool,
}

impl<'a> ProxyResolver<'a> {
    pub fn new(prices: &'a PriceTable, enabled: bool) -> Self {
        Self { prices, enabled }
    }

    /// 대체 사용 여부
    pub fn enabled(&self) -> bool {
        self.enabled
    }

    fn candidates(&self, asset: Asset) -> impl Iterator<Item = Asset> + '_ {
        let chain: &[Asset] = if self.enabled {
            asset.proxy_chain()
        } else {
            &[]
        };
        std::iter::once(asset).chain(chain.iter().copied())
    }

    /// `[from, to]` 구간 전체 가격이 있는 첫 종목 (자신 포함)
    pub fn resolve_window(&self, asset: Asset, from: usize, to: usize) -> Option<Asset> {
        self.candidates(asset)
            .find(|candidate| self.prices.covers(*candidate, from, to))
    }

    /// `index - 1`과 `index` 두 날짜 가격이 모두 있는 첫 종목 (자신 포함)
    pub fn resolve_day(&self, asset: Asset, index: usize) -> Option<Asset> {
        if index == 0 {
            return None;
        }
        self.resolve_window(asset, index - 1, index)
    }

    /// 가격이 없는 종목의 비중을 대체 종목으로 옮깁니다.
    ///
    /// # 에러
    ///
    /// 자신과 체인 어디에도 가격이 없으면 `MissingPrice`
    pub fn redirect(&self, weights: &WeightMap, index: usize) -> RegimeResult<WeightMap> {
        let mut out = *weights;
        for (asset, weight) in weights.held() {
            let resolved = self.resolve_day(asset, index).ok_or_else(|| RegimeError::MissingPrice {
                date: self.prices.date(index).unwrap_or_default(),
                asset: asset.to_string(),
            })?;
            if resolved != asset {
                out.shift(asset, resolved, weight);
                trace!(%asset, proxy = %resolved, weight, "proxy substitution");
            }
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use regime_core::AssetMap;

    /// IWY는 index 2부터, QQQ는 index 1부터 상장, 나머지는 전 구간
    fn staggered_table() -> PriceTable {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let dates = (0..4).map(|i| start + chrono::Duration::days(i)).collect();
        let prices = AssetMap::from_fn(|asset| {
            let listed = match asset {
                Asset::Iwy => 2,
                Asset::Qqq => 1,
                _ => 0,
            };
            (0..4).map(|i| (i >= listed).then_some(100.0)).collect()
        });
        PriceTable::new(dates, prices).unwrap()
    }

    #[test]
    fn test_resolve_walks_chain() {
        let table = staggered_table();
        let resolver = ProxyResolver::new(&table, true);

        assert_eq!(resolver.resolve_day(Asset::Iwy, 1), Some(Asset::Spy));
        assert_eq!(resolver.resolve_day(Asset::Iwy, 2), Some(Asset::Qqq));
        assert_eq!(resolver.resolve_day(Asset::Iwy, 3), Some(Asset::Iwy));
        assert_eq!(resolver.resolve_day(Asset::Iwy, 0), None);
    }

    #[test]
    fn test_disabled_resolver_has_no_fallback() {
        let table = staggered_table();
        let resolver = ProxyResolver::new(&table, false);
        assert_eq!(resolver.resolve_day(Asset::Iwy, 2), None);
        assert_eq!(resolver.resolve_day(Asset::Spy, 2), Some(Asset::Spy));
    }

    #[test]
    fn test_redirect_moves_weight() {
        let table = staggered_table();
        let resolver = ProxyResolver::new(&table, true);
        let weights = WeightMap::from_pairs(&[(Asset::Iwy, 0.5), (Asset::Qqq, 0.2), (Asset::Tlt, 0.3)]);

        let redirected = resolver.redirect(&weights, 2).unwrap();
        assert_eq!(redirected[Asset::Iwy], 0.0);
        assert!((redirected[Asset::Qqq] - 0.7).abs() < 1e-12);
        assert_eq!(redirected[Asset::Tlt], 0.3);
        assert!((redirected.total() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_redirect_without_proxy_fails() {
        let table = staggered_table();
        let resolver = ProxyResolver::new(&table, false);
        let weights = WeightMap::from_pairs(&[(Asset::Iwy, 1.0)]);

        let err = resolver.redirect(&weights, 1).unwrap_err();
        assert!(matches!(err, RegimeError::MissingPrice { ref asset, .. } if asset == "IWY"));
    }
}
