//! 피처 행(Feature Row).
//!
//! 날짜 하나에 대한 시장/거시 지표 스냅샷입니다. 외부에서 받은 행은
//! [`RawFeatureRow`]로 들어와 [`RawFeatureRow::validate`]를 통과해야
//! 분류기와 배분 엔진에 전달될 수 있습니다.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::asset::{Asset, AssetMap};
use crate::error::{RegimeError, RegimeResult};

/// 검증된 피처 행.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureRow {
    /// 날짜
    pub date: NaiveDate,
    /// 대표 성장 지수 가격 수준
    pub growth_index_level: f64,
    /// 12개월 모멘텀 (비율, 0.1 = 10%)
    pub momentum_12m: f64,
    /// VIX 수준
    pub vix: f64,
    /// 최근 구간 VIX 최고치
    pub vix_peak: f64,
    /// 장기 금리 변화율 (비율)
    pub yield_roc: f64,
    /// 주식/채권 일간 수익률 롤링 상관계수
    pub stock_bond_correlation: f64,
    /// Sahm 실업률 갭 (%p)
    pub sahm_gap: f64,
    /// 장단기 금리차 (%p, 10Y - 2Y)
    pub yield_curve_spread: f64,
    /// 종목별 장기 이동평균 하회 여부
    pub below_trend: AssetMap<bool>,
    /// 종목별 이동평균 대비 괴리 (가격/MA - 1)
    pub trend_gap: AssetMap<f64>,
    /// 원자재 추세 약세 여부
    pub commodity_trend_weak: bool,
    /// 가치주가 성장주보다 강한지 여부
    pub value_over_growth: bool,
}

impl FeatureRow {
    /// 대표 성장 자산의 추세 하락 여부
    pub fn trend_down(&self) -> bool {
        self.below_trend[Asset::PRIMARY_GROWTH]
    }

    /// 추세 위에 있는 종목 비율 (0.0 ~ 1.0)
    pub fn breadth(&self) -> f64 {
        let above = self.below_trend.iter().filter(|(_, below)| !**below).count();
        above as f64 / Asset::ALL.len() as f64
    }
}

/// 검증 전 피처 행. 모든 필드가 선택적입니다.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawFeatureRow {
    pub date: Option<NaiveDate>,
    pub growth_index_level: Option<f64>,
    pub momentum_12m: Option<f64>,
    pub vix: Option<f64>,
    pub vix_peak: Option<f64>,
    pub yield_roc: Option<f64>,
    pub stock_bond_correlation: Option<f64>,
    pub sahm_gap: Option<f64>,
    pub yield_curve_spread: Option<f64>,
    pub below_trend: AssetMap<Option<bool>>,
    pub trend_gap: AssetMap<Option<f64>>,
    pub commodity_trend_weak: Option<bool>,
    pub value_over_growth: Option<bool>,
}

fn require_number(date: NaiveDate, field: &str, value: Option<f64>) -> RegimeResult<f64> {
    let value = value.ok_or_else(|| RegimeError::MissingFeature {
        date,
        field: field.to_string(),
    })?;
    if !value.is_finite() {
        return Err(RegimeError::InvalidFeature {
            date,
            field: field.to_string(),
            value,
        });
    }
    Ok(value)
}

fn require_flag(date: NaiveDate, field: &str, value: Option<bool>) -> RegimeResult<bool> {
    value.ok_or_else(|| RegimeError::MissingFeature {
        date,
        field: field.to_string(),
    })
}

impl RawFeatureRow {
    /// 빈 행 (날짜만 설정)
    pub fn new(date: NaiveDate) -> Self {
        Self {
            date: Some(date),
            ..Default::default()
        }
    }

    /// 누락/비유한 값을 검사하고 [`FeatureRow`]로 변환합니다.
    ///
    /// 누락된 값을 0이나 기본값으로 채우지 않습니다.
    pub fn validate(&self) -> RegimeResult<FeatureRow> {
        let date = self
            .date
            .ok_or_else(|| RegimeError::MisalignedInput("피처 행에 날짜가 없습니다".to_string()))?;

        let mut below_trend = AssetMap::filled(false);
        let mut trend_gap = AssetMap::filled(0.0);
        for asset in Asset::ALL {
            below_trend[asset] = require_flag(
                date,
                &format!("below_trend.{}", asset),
                self.below_trend[asset],
            )?;
            trend_gap[asset] =
                require_number(date, &format!("trend_gap.{}", asset), self.trend_gap[asset])?;
        }

        Ok(FeatureRow {
            date,
            growth_index_level: require_number(date, "growth_index_level", self.growth_index_level)?,
            momentum_12m: require_number(date, "momentum_12m", self.momentum_12m)?,
            vix: require_number(date, "vix", self.vix)?,
            vix_peak: require_number(date, "vix_peak", self.vix_peak)?,
            yield_roc: require_number(date, "yield_roc", self.yield_roc)?,
            stock_bond_correlation: require_number(
                date,
                "stock_bond_correlation",
                self.stock_bond_correlation,
            )?,
            sahm_gap: require_number(date, "sahm_gap", self.sahm_gap)?,
            yield_curve_spread: require_number(date, "yield_curve_spread", self.yield_curve_spread)?,
            below_trend,
            trend_gap,
            commodity_trend_weak: require_flag(
                date,
                "commodity_trend_weak",
                self.commodity_trend_weak,
            )?,
            value_over_growth: require_flag(date, "value_over_growth", self.value_over_growth)?,
        })
    }
}

impl From<&FeatureRow> for RawFeatureRow {
    fn from(row: &FeatureRow) -> Self {
        Self {
            date: Some(row.date),
            growth_index_level: Some(row.growth_index_level),
            momentum_12m: Some(row.momentum_12m),
            vix: Some(row.vix),
            vix_peak: Some(row.vix_peak),
            yield_roc: Some(row.yield_roc),
            stock_bond_correlation: Some(row.stock_bond_correlation),
            sahm_gap: Some(row.sahm_gap),
            yield_curve_spread: Some(row.yield_curve_spread),
            below_trend: row.below_trend.map(|_, v| Some(*v)),
            trend_gap: row.trend_gap.map(|_, v| Some(*v)),
            commodity_trend_weak: Some(row.commodity_trend_weak),
            value_over_growth: Some(row.value_over_growth),
        }
    }
}

/// 날짜순 피처 테이블.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeatureTable {
    rows: Vec<FeatureRow>,
}

impl FeatureTable {
    /// 날짜가 엄격히 증가하는지 검사하고 테이블을 생성합니다.
    pub fn new(rows: Vec<FeatureRow>) -> RegimeResult<Self> {
        super::ensure_increasing(rows.iter().map(|r| r.date))?;
        Ok(Self { rows })
    }

    /// 검증 전 행들로 테이블을 생성합니다.
    pub fn from_raw(rows: &[RawFeatureRow]) -> RegimeResult<Self> {
        let rows = rows
            .iter()
            .map(RawFeatureRow::validate)
            .collect::<RegimeResult<Vec<_>>>()?;
        Self::new(rows)
    }

    /// 행 목록
    pub fn rows(&self) -> &[FeatureRow] {
        &self.rows
    }

    /// 행 수
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// 비어있는지 확인
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// 날짜 목록
    pub fn dates(&self) -> Vec<NaiveDate> {
        self.rows.iter().map(|r| r.date).collect()
    }

    /// 특정 날짜의 행
    pub fn get(&self, date: NaiveDate) -> Option<&FeatureRow> {
        self.rows
            .binary_search_by_key(&date, |r| r.date)
            .ok()
            .map(|i| &self.rows[i])
    }

    /// `[start, end]` 구간으로 자른 테이블
    pub fn between(&self, start: Option<NaiveDate>, end: Option<NaiveDate>) -> FeatureTable {
        let rows = self
            .rows
            .iter()
            .filter(|r| start.map_or(true, |s| r.date >= s) && end.map_or(true, |e| r.date <= e))
            .cloned()
            .collect();
        FeatureTable { rows }
    }
}
