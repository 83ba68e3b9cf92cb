//! CLI 명령어 구현 모듈.

pub mod backtest;
pub mod classify;
pub mod extract;
pub mod sweep;

use std::path::Path;

use anyhow::Result;
use chrono::NaiveDate;
use tracing::info;

use regime_analytics::BacktestData;

use crate::csv_io;

/// 가격/피처 CSV를 읽고 기간을 맞춥니다.
pub fn load_backtest_data(
    prices_path: &Path,
    features_path: &Path,
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
) -> Result<BacktestData> {
    let prices = csv_io::read_prices(csv_io::open(prices_path)?)?;
    let features = csv_io::read_features(csv_io::open(features_path)?)?;
    info!(
        price_days = prices.len(),
        feature_days = features.len(),
        "inputs loaded"
    );

    let data = BacktestData::new(prices, features, from, to)?;
    Ok(data)
}

/// `YYYY-MM-DD` 인자 파서 (clap용)
pub fn parse_date(value: &str) -> std::result::Result<NaiveDate, String> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|e| format!("날짜 형식이 잘못되었습니다 (YYYY-MM-DD): {} ({})", value, e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_date() {
        assert_eq!(
            parse_date("2020-03-16").unwrap(),
            NaiveDate::from_ymd_opt(2020, 3, 16).unwrap()
        );
        assert!(parse_date("16/03/2020").is_err());
    }
}
