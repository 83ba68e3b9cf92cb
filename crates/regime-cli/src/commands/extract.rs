//! 피처 추출 명령어.
//!
//! ```bash
//! regime extract --prices data/prices.csv --macro data/macro.csv -o data/features.csv
//! ```

use std::path::PathBuf;

use anyhow::Result;
use tracing::info;

use regime_analytics::FeatureExtractor;
use regime_core::EngineConfig;

use crate::csv_io;

/// 피처 추출 설정
#[derive(Debug, Clone)]
pub struct ExtractConfig {
    /// 가격 CSV
    pub prices_path: PathBuf,
    /// 거시 지표 CSV
    pub macro_path: PathBuf,
    /// 출력 피처 CSV
    pub output_path: PathBuf,
}

/// 피처를 추출해 CSV로 저장하고 행 수를 반환합니다.
pub fn run_extract(engine: &EngineConfig, config: &ExtractConfig) -> Result<usize> {
    let prices = csv_io::read_prices(csv_io::open(&config.prices_path)?)?;
    let series = csv_io::read_market_series(prices, csv_io::open(&config.macro_path)?)?;

    let extractor = FeatureExtractor::new(engine.features.clone())
        .with_proxies(engine.backtest.use_proxies);
    let table = extractor.extract(&series)?;

    csv_io::write_features(csv_io::create(&config.output_path)?, &table)?;
    info!(
        rows = table.len(),
        output = %config.output_path.display(),
        "features written"
    );
    Ok(table.len())
}
