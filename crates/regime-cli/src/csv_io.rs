//! CSV 입출력.
//!
//! 모든 파일은 첫 열이 `date`(YYYY-MM-DD)인 헤더 포함 CSV입니다.
//!
//! - 가격: `date,SPY,QQQ,...`. 빈 칸은 해당 날짜에 가격 없음(상장 이전)
//! - 거시: `date,vix,long_yield,short_yield,unemployment`
//! - 피처: 스칼라 피처 열 + 종목별 `below_trend_<SYM>`, `trend_gap_<SYM>`

use std::collections::HashMap;
use std::fs::File;
use std::io::{self, BufReader, BufWriter};
use std::path::Path;

use anyhow::{anyhow, bail, Context, Result};
use chrono::NaiveDate;
use serde::Deserialize;

use regime_analytics::{AllocationRecord, MarketSeries};
use regime_core::{
    Asset, AssetMap, FeatureRow, FeatureTable, PriceTable, RawFeatureRow, RegimeError,
};
use regime_strategy::Classification;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// 스칼라 피처 열 이름 (순서 고정)
const SCALAR_COLUMNS: [&str; 10] = [
    "growth_index_level",
    "momentum_12m",
    "vix",
    "vix_peak",
    "yield_roc",
    "stock_bond_correlation",
    "sahm_gap",
    "yield_curve_spread",
    "commodity_trend_weak",
    "value_over_growth",
];

pub fn open(path: &Path) -> Result<BufReader<File>> {
    let file = File::open(path).with_context(|| format!("파일을 열 수 없습니다: {}", path.display()))?;
    Ok(BufReader::new(file))
}

pub fn create(path: &Path) -> Result<BufWriter<File>> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("디렉토리를 만들 수 없습니다: {}", parent.display()))?;
    }
    let file =
        File::create(path).with_context(|| format!("파일을 만들 수 없습니다: {}", path.display()))?;
    Ok(BufWriter::new(file))
}

fn parse_date(value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), DATE_FORMAT)
        .with_context(|| format!("날짜 형식이 잘못되었습니다 (YYYY-MM-DD): {:?}", value))
}

/// 빈 칸이 아닌 셀
fn cell<'r>(record: &'r csv::StringRecord, index: Option<usize>) -> Option<&'r str> {
    index
        .and_then(|i| record.get(i))
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

fn parse_number(date: NaiveDate, field: &str, value: Option<&str>) -> Result<Option<f64>> {
    value
        .map(|v| {
            v.parse::<f64>()
                .with_context(|| format!("{} {}: 숫자가 아닙니다: {:?}", date, field, v))
        })
        .transpose()
}

fn parse_flag(date: NaiveDate, field: &str, value: Option<&str>) -> Result<Option<bool>> {
    value
        .map(|v| match v.to_lowercase().as_str() {
            "true" | "1" => Ok(true),
            "false" | "0" => Ok(false),
            _ => Err(anyhow!("{} {}: 불리언이 아닙니다: {:?}", date, field, v)),
        })
        .transpose()
}

// ============================================================================
// 가격
// ============================================================================

/// 가격 CSV를 읽습니다. 파일에 없는 종목은 전 구간 가격 없음입니다.
pub fn read_prices<R: io::Read>(reader: R) -> Result<PriceTable> {
    let mut csv_reader = csv::Reader::from_reader(reader);
    let headers = csv_reader.headers()?.clone();
    if headers.get(0).map(str::trim) != Some("date") {
        bail!("가격 CSV의 첫 열은 date여야 합니다");
    }

    let mut columns = Vec::with_capacity(headers.len() - 1);
    for (i, name) in headers.iter().enumerate().skip(1) {
        let asset: Asset = name.parse()?;
        columns.push((i, asset));
    }

    let mut rows = Vec::new();
    for result in csv_reader.records() {
        let record = result?;
        let date = parse_date(record.get(0).unwrap_or_default())?;
        let mut prices = AssetMap::filled(None);
        for &(i, asset) in &columns {
            prices[asset] = parse_number(date, asset.symbol(), cell(&record, Some(i)))?;
        }
        rows.push((date, prices));
    }

    Ok(PriceTable::from_rows(rows)?)
}

// ============================================================================
// 거시 지표
// ============================================================================

#[derive(Debug, Deserialize)]
struct MacroRecord {
    date: NaiveDate,
    vix: f64,
    long_yield: f64,
    short_yield: f64,
    unemployment: f64,
}

/// 거시 CSV를 읽어 가격 테이블과 결합합니다.
///
/// 두 파일의 날짜가 정확히 같아야 합니다.
pub fn read_market_series<R: io::Read>(prices: PriceTable, reader: R) -> Result<MarketSeries> {
    let mut csv_reader = csv::Reader::from_reader(reader);
    let records = csv_reader
        .deserialize()
        .collect::<std::result::Result<Vec<MacroRecord>, _>>()?;

    if records.len() != prices.len() {
        return Err(RegimeError::MisalignedInput(format!(
            "거시 지표 {}행과 가격 {}행의 날짜 수가 다릅니다",
            records.len(),
            prices.len()
        ))
        .into());
    }
    if let Some((record, date)) = records
        .iter()
        .zip(prices.dates())
        .find(|(record, date)| record.date != **date)
    {
        return Err(RegimeError::MisalignedInput(format!(
            "거시 지표 날짜 {}와 가격 날짜 {}가 다릅니다",
            record.date, date
        ))
        .into());
    }

    let column = |f: fn(&MacroRecord) -> f64| records.iter().map(f).collect::<Vec<_>>();
    Ok(MarketSeries::new(
        prices,
        column(|r| r.vix),
        column(|r| r.long_yield),
        column(|r| r.short_yield),
        column(|r| r.unemployment),
    )?)
}

// ============================================================================
// 피처
// ============================================================================

fn below_trend_column(asset: Asset) -> String {
    format!("below_trend_{}", asset.symbol())
}

fn trend_gap_column(asset: Asset) -> String {
    format!("trend_gap_{}", asset.symbol())
}

/// 피처 CSV를 읽습니다. 빈 칸이나 없는 열은 `MissingFeature`로 실패합니다.
pub fn read_features<R: io::Read>(reader: R) -> Result<FeatureTable> {
    let mut csv_reader = csv::Reader::from_reader(reader);
    let index: HashMap<String, usize> = csv_reader
        .headers()?
        .iter()
        .enumerate()
        .map(|(i, name)| (name.trim().to_string(), i))
        .collect();
    let col = |name: &str| index.get(name).copied();

    let mut raw_rows = Vec::new();
    for result in csv_reader.records() {
        let record = result?;
        let date_cell = cell(&record, col("date")).ok_or_else(|| anyhow!("date 열이 없습니다"))?;
        let date = parse_date(date_cell)?;
        let num = |name: &str| parse_number(date, name, cell(&record, col(name)));
        let flag = |name: &str| parse_flag(date, name, cell(&record, col(name)));

        let mut raw = RawFeatureRow::new(date);
        raw.growth_index_level = num("growth_index_level")?;
        raw.momentum_12m = num("momentum_12m")?;
        raw.vix = num("vix")?;
        raw.vix_peak = num("vix_peak")?;
        raw.yield_roc = num("yield_roc")?;
        raw.stock_bond_correlation = num("stock_bond_correlation")?;
        raw.sahm_gap = num("sahm_gap")?;
        raw.yield_curve_spread = num("yield_curve_spread")?;
        raw.commodity_trend_weak = flag("commodity_trend_weak")?;
        raw.value_over_growth = flag("value_over_growth")?;
        for asset in Asset::ALL {
            raw.below_trend[asset] = flag(&below_trend_column(asset))?;
            raw.trend_gap[asset] = num(&trend_gap_column(asset))?;
        }
        raw_rows.push(raw);
    }

    Ok(FeatureTable::from_raw(&raw_rows)?)
}

fn feature_record(row: &FeatureRow) -> Vec<String> {
    let mut record = vec![
        row.date.format(DATE_FORMAT).to_string(),
        row.growth_index_level.to_string(),
        row.momentum_12m.to_string(),
        row.vix.to_string(),
        row.vix_peak.to_string(),
        row.yield_roc.to_string(),
        row.stock_bond_correlation.to_string(),
        row.sahm_gap.to_string(),
        row.yield_curve_spread.to_string(),
        row.commodity_trend_weak.to_string(),
        row.value_over_growth.to_string(),
    ];
    for asset in Asset::ALL {
        record.push(row.below_trend[asset].to_string());
        record.push(row.trend_gap[asset].to_string());
    }
    record
}

/// 피처 테이블을 CSV로 씁니다.
pub fn write_features<W: io::Write>(writer: W, table: &FeatureTable) -> Result<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);

    let mut header = vec!["date".to_string()];
    header.extend(SCALAR_COLUMNS.iter().map(|c| c.to_string()));
    for asset in Asset::ALL {
        header.push(below_trend_column(asset));
        header.push(trend_gap_column(asset));
    }
    csv_writer.write_record(&header)?;

    for row in table.rows() {
        csv_writer.write_record(feature_record(row))?;
    }
    csv_writer.flush()?;
    Ok(())
}

// ============================================================================
// 결과
// ============================================================================

/// 날짜별 분류 결과를 씁니다 (`date,regime,triggers`).
pub fn write_classifications<W: io::Write>(writer: W, rows: &[Classification]) -> Result<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    csv_writer.write_record(["date", "regime", "triggers"])?;
    for c in rows {
        let triggers: Vec<&str> = c.triggers.iter().map(|t| t.label()).collect();
        csv_writer.write_record([
            c.date.format(DATE_FORMAT).to_string(),
            c.regime.label().to_string(),
            triggers.join("|"),
        ])?;
    }
    csv_writer.flush()?;
    Ok(())
}

/// 배분 기록을 씁니다. 종목별 실제 비중은 `w_<SYM>` 열입니다.
pub fn write_history<W: io::Write>(writer: W, history: &[AllocationRecord]) -> Result<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);

    let mut header: Vec<String> = [
        "date",
        "regime",
        "raw_regime",
        "state",
        "rebalanced",
        "turnover",
        "cost",
        "vol_scale",
        "stop_loss",
        "nav",
    ]
    .iter()
    .map(|c| c.to_string())
    .collect();
    header.extend(Asset::ALL.iter().map(|a| format!("w_{}", a.symbol())));
    csv_writer.write_record(&header)?;

    let label = |r: Option<regime_core::Regime>| r.map(|r| r.label()).unwrap_or_default().to_string();
    for record in history {
        let mut row = vec![
            record.date.format(DATE_FORMAT).to_string(),
            label(record.regime),
            label(record.raw_regime),
            record.state.label().to_string(),
            record.rebalanced.to_string(),
            format!("{:.6}", record.turnover),
            format!("{:.8}", record.cost),
            format!("{:.4}", record.vol_scale),
            record.stop_loss.to_string(),
            format!("{:.2}", record.nav),
        ];
        row.extend(Asset::ALL.iter().map(|&a| format!("{:.6}", record.weights[a])));
        csv_writer.write_record(&row)?;
    }
    csv_writer.flush()?;
    Ok(())
}
