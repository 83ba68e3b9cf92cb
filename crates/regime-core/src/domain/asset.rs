//! 자산 유니버스.
//!
//! 엔진이 다루는 종목은 컴파일 타임에 고정된 닫힌 집합입니다.
//! 모든 비중/가격/플래그는 [`AssetMap`]으로 종목별 고정 슬롯에 저장되므로
//! 문자열 키 조회나 런타임 키 누락이 발생하지 않습니다.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Index, IndexMut};
use std::str::FromStr;

use crate::error::RegimeError;

/// 유니버스 종목 수.
pub const ASSET_COUNT: usize = 10;

/// 위험 카테고리.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RiskCategory {
    /// 성장주
    EquityGrowth,
    /// 가치주
    EquityValue,
    /// 채권
    Bond,
    /// 원자재 (금 포함)
    Commodity,
    /// 방어 헤지 (매니지드 퓨처스)
    Hedge,
    /// 대체 자산 (리츠)
    Alternative,
}

impl RiskCategory {
    /// 주식 계열 여부
    pub fn is_equity(self) -> bool {
        matches!(self, Self::EquityGrowth | Self::EquityValue)
    }

    /// 변동성 타게팅 대상이 되는 위험 자산 여부
    pub fn is_risk_asset(self) -> bool {
        matches!(
            self,
            Self::EquityGrowth | Self::EquityValue | Self::Commodity | Self::Alternative
        )
    }

    /// 설명 문자열
    pub fn description(self) -> &'static str {
        match self {
            Self::EquityGrowth => "성장주",
            Self::EquityValue => "가치주",
            Self::Bond => "채권",
            Self::Commodity => "원자재",
            Self::Hedge => "방어 헤지",
            Self::Alternative => "대체 자산",
        }
    }
}

/// 유니버스 종목.
///
/// 선언 순서가 [`AssetMap`]의 슬롯 순서입니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Asset {
    /// Russell Top 200 Growth - 대표 성장 자산
    Iwy,
    /// Nasdaq 100
    Qqq,
    /// S&P 500 - 주식 계열 최종 프록시
    Spy,
    /// 미국 대형 가치주
    Vtv,
    /// 미국 장기 국채 - 채권 계열 최종 프록시
    Tlt,
    /// 미국 중기 국채 - 채권 싱크
    Ief,
    /// 금 - 원자재 계열 최종 프록시
    Gld,
    /// 원자재 바스켓
    Dbc,
    /// 매니지드 퓨처스 - 방어 헤지 싱크
    Wtmf,
    /// 미국 리츠
    Vnq,
}

impl Asset {
    /// 전체 종목 (슬롯 순서).
    pub const ALL: [Asset; ASSET_COUNT] = [
        Asset::Iwy,
        Asset::Qqq,
        Asset::Spy,
        Asset::Vtv,
        Asset::Tlt,
        Asset::Ief,
        Asset::Gld,
        Asset::Dbc,
        Asset::Wtmf,
        Asset::Vnq,
    ];

    /// 대표 성장 자산 (레짐 추세 판단 및 EA 오버라이드 기준)
    pub const PRIMARY_GROWTH: Asset = Asset::Iwy;
    /// 방어 헤지 싱크
    pub const HEDGE_SINK: Asset = Asset::Wtmf;
    /// 채권 싱크
    pub const BOND_SINK: Asset = Asset::Ief;

    /// [`AssetMap`] 슬롯 인덱스
    pub fn index(self) -> usize {
        self as usize
    }

    /// 티커 심볼
    pub fn symbol(self) -> &'static str {
        match self {
            Self::Iwy => "IWY",
            Self::Qqq => "QQQ",
            Self::Spy => "SPY",
            Self::Vtv => "VTV",
            Self::Tlt => "TLT",
            Self::Ief => "IEF",
            Self::Gld => "GLD",
            Self::Dbc => "DBC",
            Self::Wtmf => "WTMF",
            Self::Vnq => "VNQ",
        }
    }

    /// 종목 이름
    pub fn name(self) -> &'static str {
        match self {
            Self::Iwy => "iShares Russell Top 200 Growth",
            Self::Qqq => "Invesco QQQ (Nasdaq 100)",
            Self::Spy => "SPDR S&P 500",
            Self::Vtv => "Vanguard Value",
            Self::Tlt => "iShares 20+ Year Treasury",
            Self::Ief => "iShares 7-10 Year Treasury",
            Self::Gld => "SPDR Gold Shares",
            Self::Dbc => "Invesco DB Commodity Index",
            Self::Wtmf => "WisdomTree Managed Futures",
            Self::Vnq => "Vanguard Real Estate",
        }
    }

    /// 위험 카테고리
    pub fn category(self) -> RiskCategory {
        match self {
            Self::Iwy | Self::Qqq | Self::Spy => RiskCategory::EquityGrowth,
            Self::Vtv => RiskCategory::EquityValue,
            Self::Tlt | Self::Ief => RiskCategory::Bond,
            Self::Gld | Self::Dbc => RiskCategory::Commodity,
            Self::Wtmf => RiskCategory::Hedge,
            Self::Vnq => RiskCategory::Alternative,
        }
    }

    /// 상장 이전 구간을 대체할 프록시 체인 (구체적인 것부터).
    ///
    /// 체인의 마지막 종목은 항상 전체 이력을 가져야 하는 루트 프록시입니다.
    pub fn proxy_chain(self) -> &'static [Asset] {
        match self {
            Self::Iwy => &[Asset::Qqq, Asset::Spy],
            Self::Qqq | Self::Vtv | Self::Vnq => &[Asset::Spy],
            Self::Ief => &[Asset::Tlt],
            Self::Wtmf => &[Asset::Ief, Asset::Tlt],
            Self::Dbc => &[Asset::Gld],
            Self::Spy | Self::Tlt | Self::Gld => &[],
        }
    }

    /// 프록시 없이 전체 이력이 필요한 루트 종목 여부
    pub fn is_root(self) -> bool {
        self.proxy_chain().is_empty()
    }

    /// 싱크(헤지/채권) 여부
    pub fn is_sink(self) -> bool {
        self == Self::HEDGE_SINK || self == Self::BOND_SINK
    }
}

impl fmt::Display for Asset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

impl FromStr for Asset {
    type Err = RegimeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_uppercase();
        Asset::ALL
            .into_iter()
            .find(|asset| asset.symbol() == upper)
            .ok_or_else(|| RegimeError::MisalignedInput(format!("알 수 없는 종목: {}", s)))
    }
}

/// 종목별 고정 슬롯 맵.
///
/// 유니버스 전 종목에 대해 항상 값이 존재합니다.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AssetMap<T> {
    slots: [T; ASSET_COUNT],
}

impl<T: Copy> AssetMap<T> {
    /// 모든 슬롯을 같은 값으로 채웁니다.
    pub fn filled(value: T) -> Self {
        Self {
            slots: [value; ASSET_COUNT],
        }
    }
}

impl<T> AssetMap<T> {
    /// 종목별 함수로 맵을 생성합니다.
    pub fn from_fn(mut f: impl FnMut(Asset) -> T) -> Self {
        Self {
            slots: Asset::ALL.map(&mut f),
        }
    }

    /// (종목, 값) 순회
    pub fn iter(&self) -> impl Iterator<Item = (Asset, &T)> {
        Asset::ALL.into_iter().zip(self.slots.iter())
    }

    /// 값 변환
    pub fn map<U>(&self, mut f: impl FnMut(Asset, &T) -> U) -> AssetMap<U> {
        AssetMap::from_fn(|asset| f(asset, &self.slots[asset.index()]))
    }

    /// 슬롯 값들
    pub fn values(&self) -> &[T; ASSET_COUNT] {
        &self.slots
    }
}

impl<T: Default> Default for AssetMap<T> {
    fn default() -> Self {
        Self::from_fn(|_| T::default())
    }
}

impl<T> Index<Asset> for AssetMap<T> {
    type Output = T;

    fn index(&self, asset: Asset) -> &T {
        &self.slots[asset.index()]
    }
}

impl<T> IndexMut<Asset> for AssetMap<T> {
    fn index_mut(&mut self, asset: Asset) -> &mut T {
        &mut self.slots[asset.index()]
    }
}
