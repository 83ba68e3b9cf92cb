//! 피처 추출.
//!
//! 종목 가격과 거시 시계열(VIX, 장단기 금리, 실업률)로부터 날짜별
//! [`FeatureRow`]를 계산합니다. 각 행은 그 날짜까지의 데이터만 사용합니다.
//!
//! 상장 이전 구간은 시뮬레이터와 같은 대체 체인으로 채웁니다. 전체 선행
//! 기간을 채울 수 없는 날짜는 결과에서 제외됩니다.
//!
//! # 사용 예시
//!
//! ```rust,ignore
//! use regime_analytics::features::{FeatureExtractor, MarketSeries};
//! use regime_core::FeatureConfig;
//!
//! let series = MarketSeries::new(prices, vix, long_yield, short_yield, unemployment)?;
//! let table = FeatureExtractor::new(FeatureConfig::default()).extract(&series)?;
//! ```

use chrono::NaiveDate;
use tracing::{debug, info};

use regime_core::{
    Asset, AssetMap, FeatureConfig, FeatureRow, FeatureTable, PriceTable, RegimeError,
    RegimeResult,
};

use crate::backtest::ProxyResolver;
use crate::correlation::calculate_correlation;

/// 가격 테이블과 같은 날짜에 정렬된 거시 시계열.
#[derive(Debug, Clone)]
pub struct MarketSeries {
    prices: PriceTable,
    vix: Vec<f64>,
    long_yield: Vec<f64>,
    short_yield: Vec<f64>,
    unemployment: Vec<f64>,
}

impl MarketSeries {
    /// 길이와 유한성을 검증합니다.
    ///
    /// # 에러
    ///
    /// - 길이가 가격 날짜 수와 다르면 `MisalignedInput`
    /// - 비유한 값은 `InvalidFeature`
    pub fn new(
        prices: PriceTable,
        vix: Vec<f64>,
        long_yield: Vec<f64>,
        short_yield: Vec<f64>,
        unemployment: Vec<f64>,
    ) -> RegimeResult<Self> {
        let columns = [
            ("vix", &vix),
            ("long_yield", &long_yield),
            ("short_yield", &short_yield),
            ("unemployment", &unemployment),
        ];
        for (field, column) in columns {
            if column.len() != prices.len() {
                return Err(RegimeError::MisalignedInput(format!(
                    "{} 길이({})가 가격 날짜 수({})와 다릅니다",
                    field,
                    column.len(),
                    prices.len()
                )));
            }
            if let Some((i, value)) = column.iter().enumerate().find(|(_, v)| !v.is_finite()) {
                return Err(RegimeError::InvalidFeature {
                    date: prices.date(i).unwrap_or_default(),
                    field: field.to_string(),
                    value: *value,
                });
            }
        }

        Ok(Self {
            prices,
            vix,
            long_yield,
            short_yield,
            unemployment,
        })
    }

    /// 가격 테이블
    pub fn prices(&self) -> &PriceTable {
        &self.prices
    }

    /// 날짜 목록
    pub fn dates(&self) -> &[NaiveDate] {
        self.prices.dates()
    }

    /// 날짜 수
    pub fn len(&self) -> usize {
        self.prices.len()
    }

    /// 비어있는지 확인
    pub fn is_empty(&self) -> bool {
        self.prices.is_empty()
    }
}

/// 피처 추출기.
#[derive(Debug, Clone)]
pub struct FeatureExtractor {
    config: FeatureConfig,
    use_proxies: bool,
}

impl Default for FeatureExtractor {
    fn default() -> Self {
        Self::new(FeatureConfig::default())
    }
}

impl FeatureExtractor {
    pub fn new(config: FeatureConfig) -> Self {
        Self {
            config,
            use_proxies: true,
        }
    }

    /// 대체 종목 사용 여부 설정
    pub fn with_proxies(mut self, enabled: bool) -> Self {
        self.use_proxies = enabled;
        self
    }

    /// 추출 설정
    pub fn config(&self) -> &FeatureConfig {
        &self.config
    }

    /// 피처 테이블을 계산합니다.
    ///
    /// # 에러
    ///
    /// - 윈도우 설정이 잘못되면 `Config`
    /// - 선행 기간보다 데이터가 짧으면 `InsufficientData`
    pub fn extract(&self, series: &MarketSeries) -> RegimeResult<FeatureTable> {
        self.config.validate()?;

        let warmup = self.config.warmup();
        let n = series.len();
        if n <= warmup {
            return Err(RegimeError::InsufficientData {
                required: warmup + 1,
                actual: n,
            });
        }

        let resolver = ProxyResolver::new(&series.prices, self.use_proxies);
        let sahm_average = rolling_mean(&series.unemployment, self.config.sahm_average_window);

        let mut rows = Vec::with_capacity(n - warmup);
        let mut skipped = 0usize;
        for i in warmup..n {
            match self.row_at(series, &resolver, &sahm_average, i) {
                Some(row) => rows.push(row),
                None => skipped += 1,
            }
        }

        info!(
            rows = rows.len(),
            skipped,
            warmup,
            "features extracted"
        );
        FeatureTable::new(rows)
    }

    /// 날짜 `i`의 피처 행. 가격이 부족하면 `None`.
    fn row_at(
        &self,
        series: &MarketSeries,
        resolver: &ProxyResolver<'_>,
        sahm_average: &[Option<f64>],
        i: usize,
    ) -> Option<FeatureRow> {
        let cfg = &self.config;
        let prices = &series.prices;
        let date = prices.date(i)?;

        // 성장 지수 수준, 12개월 모멘텀
        let growth = resolver.resolve_window(Asset::PRIMARY_GROWTH, i - cfg.momentum_window, i)?;
        let growth_index_level = prices.price(growth, i)?;
        let momentum_12m = growth_index_level / prices.price(growth, i - cfg.momentum_window)? - 1.0;

        // 장기 추세
        let mut below_trend = AssetMap::filled(false);
        let mut trend_gap = AssetMap::filled(0.0);
        for asset in Asset::ALL {
            let gap = self.trend_gap(prices, resolver, asset, i);
            let Some(gap) = gap else {
                debug!(%date, %asset, "trend window unavailable");
                return None;
            };
            trend_gap[asset] = gap;
            below_trend[asset] = gap < 0.0;
        }

        // 장기 금리 변화율
        let base = series.long_yield[i - cfg.yield_roc_window];
        let yield_roc = if base == 0.0 {
            0.0
        } else {
            series.long_yield[i] / base - 1.0
        };

        // 주식/채권 상관
        let from = i - cfg.correlation_window;
        let spy = window_returns(prices, resolver.resolve_window(Asset::Spy, from, i)?, from, i)?;
        let tlt = window_returns(prices, resolver.resolve_window(Asset::Tlt, from, i)?, from, i)?;
        let stock_bond_correlation = calculate_correlation(&spy, &tlt).unwrap_or(0.0);

        // Sahm 갭: 현재 평균 - 직전 lookback 구간 평균의 최저치
        let current = sahm_average[i]?;
        let trough = sahm_average[i - cfg.sahm_lookback..i]
            .iter()
            .flatten()
            .copied()
            .fold(f64::INFINITY, f64::min);
        let sahm_gap = if trough.is_finite() { current - trough } else { 0.0 };

        let vix = series.vix[i];
        let vix_peak = series.vix[i + 1 - cfg.vix_peak_window..=i]
            .iter()
            .copied()
            .fold(f64::NEG_INFINITY, f64::max);

        let commodity_return = self.relative_return(prices, resolver, Asset::Dbc, i)?;
        let commodity_trend_weak = below_trend[Asset::Dbc] && commodity_return < 0.0;

        let value_return = self.relative_return(prices, resolver, Asset::Vtv, i)?;
        let growth_return = self.relative_return(prices, resolver, Asset::PRIMARY_GROWTH, i)?;

        Some(FeatureRow {
            date,
            growth_index_level,
            momentum_12m,
            vix,
            vix_peak,
            yield_roc,
            stock_bond_correlation,
            sahm_gap,
            yield_curve_spread: series.long_yield[i] - series.short_yield[i],
            below_trend,
            trend_gap,
            commodity_trend_weak,
            value_over_growth: value_return > growth_return,
        })
    }

    /// 가격 / SMA(trend_window) - 1
    fn trend_gap(
        &self,
        prices: &PriceTable,
        resolver: &ProxyResolver<'_>,
        asset: Asset,
        i: usize,
    ) -> Option<f64> {
        let from = i + 1 - self.config.trend_window;
        let source = resolver.resolve_window(asset, from, i)?;
        let window = &prices.column(source)[from..=i];
        let sum: f64 = window.iter().flatten().sum();
        let sma = sum / window.len() as f64;
        if sma <= 0.0 {
            return None;
        }
        Some(prices.price(source, i)? / sma - 1.0)
    }

    /// relative_window 기간 수익률
    fn relative_return(
        &self,
        prices: &PriceTable,
        resolver: &ProxyResolver<'_>,
        asset: Asset,
        i: usize,
    ) -> Option<f64> {
        let from = i - self.config.relative_window;
        let source = resolver.resolve_window(asset, from, i)?;
        Some(prices.price(source, i)? / prices.price(source, from)? - 1.0)
    }
}

/// `[from, to]` 구간 일간 수익률 (`to - from`개)
fn window_returns(prices: &PriceTable, asset: Asset, from: usize, to: usize) -> Option<Vec<f64>> {
    ((from + 1)..=to)
        .map(|j| prices.daily_return(asset, j))
        .collect()
}

/// 후행 이동평균. 기간이 차지 않은 앞부분은 `None`.
fn rolling_mean(values: &[f64], window: usize) -> Vec<Option<f64>> {
    let mut out = vec![None; values.len()];
    if window == 0 || values.len() < window {
        return out;
    }
    let mut sum: f64 = values[..window].iter().sum();
    out[window - 1] = Some(sum / window as f64);
    for i in window..values.len() {
        sum += values[i] - values[i - window];
        out[i] = Some(sum / window as f64);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_config() -> FeatureConfig {
        FeatureConfig {
            trend_window: 5,
            momentum_window: 6,
            correlation_window: 4,
            yield_roc_window: 3,
            vix_peak_window: 3,
            sahm_average_window: 2,
            sahm_lookback: 4,
            relative_window: 3,
        }
    }

    fn dates(n: usize) -> Vec<NaiveDate> {
        let start = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
        (0..n).map(|i| start + chrono::Duration::days(i as i64)).collect()
    }

    /// 종목별 가격 생성 함수로 만든 시계열 (거시 값은 일정)
    fn series(n: usize, price: impl Fn(Asset, usize) -> Option<f64>) -> MarketSeries {
        let table = PriceTable::new(
            dates(n),
            AssetMap::from_fn(|asset| (0..n).map(|i| price(asset, i)).collect()),
        )
        .unwrap();
        MarketSeries::new(
            table,
            vec![15.0; n],
            vec![4.0; n],
            vec![3.0; n],
            vec![4.0; n],
        )
        .unwrap()
    }

    #[test]
    fn test_warmup_rows_excluded() {
        let cfg = small_config();
        let warmup = cfg.warmup();
        let table = FeatureExtractor::new(cfg)
            .extract(&series(20, |_, i| Some(100.0 + i as f64)))
            .unwrap();

        assert_eq!(table.len(), 20 - warmup);
        assert_eq!(table.rows()[0].date, dates(20)[warmup]);
    }

    #[test]
    fn test_short_history_is_insufficient() {
        let cfg = small_config();
        let warmup = cfg.warmup();
        let err = FeatureExtractor::new(cfg)
            .extract(&series(warmup, |_, _| Some(100.0)))
            .unwrap_err();
        assert!(matches!(err, RegimeError::InsufficientData { .. }));
    }

    #[test]
    fn test_rising_prices_are_above_trend() {
        let table = FeatureExtractor::new(small_config())
            .extract(&series(20, |_, i| Some(100.0 * 1.01f64.powi(i as i32))))
            .unwrap();

        let row = table.rows().last().unwrap();
        assert!(!row.trend_down());
        assert!(row.trend_gap[Asset::Spy] > 0.0);
        assert!(row.momentum_12m > 0.0);
        assert_eq!(row.yield_curve_spread, 1.0);
        assert_eq!(row.yield_roc, 0.0);
        assert_eq!(row.sahm_gap, 0.0);
        assert_eq!(row.vix_peak, 15.0);
        assert!(!row.commodity_trend_weak);
    }

    #[test]
    fn test_falling_commodity_is_weak() {
        let table = FeatureExtractor::new(small_config())
            .extract(&series(20, |asset, i| {
                let drift = if asset == Asset::Dbc { 0.98f64 } else { 1.0 };
                Some(100.0 * drift.powi(i as i32))
            }))
            .unwrap();

        let row = table.rows().last().unwrap();
        assert!(row.below_trend[Asset::Dbc]);
        assert!(row.commodity_trend_weak);
    }

    #[test]
    fn test_value_over_growth() {
        let table = FeatureExtractor::new(small_config())
            .extract(&series(20, |asset, i| {
                let drift = if asset == Asset::Vtv { 1.01f64 } else { 1.0 };
                Some(100.0 * drift.powi(i as i32))
            }))
            .unwrap();
        assert!(table.rows().iter().all(|r| r.value_over_growth));
    }

    #[test]
    fn test_growth_level_uses_proxy_before_listing() {
        // IWY는 index 15부터 상장, QQQ가 대신 사용됨
        let table = FeatureExtractor::new(small_config())
            .extract(&series(20, |asset, i| match asset {
                Asset::Iwy if i < 15 => None,
                Asset::Qqq => Some(200.0),
                _ => Some(100.0),
            }))
            .unwrap();

        let first = &table.rows()[0];
        assert_eq!(first.growth_index_level, 200.0);

        // 대체 없이는 모멘텀 기간이 상장 이후로 채워질 때부터 행이 생김
        let disabled = FeatureExtractor::new(small_config())
            .with_proxies(false)
            .extract(&series(25, |asset, i| match asset {
                Asset::Iwy if i < 15 => None,
                _ => Some(100.0),
            }))
            .unwrap();
        assert_eq!(disabled.len(), 4);
        assert_eq!(disabled.rows()[0].date, dates(25)[21]);
    }

    #[test]
    fn test_sahm_gap_rises_with_unemployment() {
        let n = 20;
        let table = PriceTable::new(
            dates(n),
            AssetMap::from_fn(|_| vec![Some(100.0); n]),
        )
        .unwrap();
        let unemployment: Vec<f64> = (0..n).map(|i| if i < 17 { 4.0 } else { 5.0 }).collect();
        let series = MarketSeries::new(table, vec![15.0; n], vec![4.0; n], vec![3.0; n], unemployment)
            .unwrap();

        let rows = FeatureExtractor::new(small_config()).extract(&series).unwrap();
        let last = rows.rows().last().unwrap();
        assert!((last.sahm_gap - 1.0).abs() < 1e-12);
        // 평탄한 가격: 상관 분산 없음 → 0
        assert_eq!(last.stock_bond_correlation, 0.0);
    }

    #[test]
    fn test_misaligned_macro_rejected() {
        let table = PriceTable::new(dates(5), AssetMap::from_fn(|_| vec![Some(1.0); 5])).unwrap();
        let err = MarketSeries::new(table, vec![15.0; 4], vec![4.0; 5], vec![3.0; 5], vec![4.0; 5])
            .unwrap_err();
        assert!(matches!(err, RegimeError::MisalignedInput(_)));
    }

    #[test]
    fn test_non_finite_macro_rejected() {
        let table = PriceTable::new(dates(3), AssetMap::from_fn(|_| vec![Some(1.0); 3])).unwrap();
        let err = MarketSeries::new(
            table,
            vec![15.0, f64::NAN, 15.0],
            vec![4.0; 3],
            vec![3.0; 3],
            vec![4.0; 3],
        )
        .unwrap_err();
        assert!(matches!(err, RegimeError::InvalidFeature { ref field, .. } if field == "vix"));
    }

    #[test]
    fn test_rolling_mean() {
        let means = rolling_mean(&[1.0, 2.0, 3.0, 4.0], 2);
        assert_eq!(means, vec![None, Some(1.5), Some(2.5), Some(3.5)]);
    }
}
